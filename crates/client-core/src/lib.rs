//! Data-access and presentation-state core of the workouts client.
//!
//! Requests run through [`RequestExecutor`], which classifies every outcome
//! into an [`Either`] of [`NetworkError`] or data. Results are folded into a
//! [`PresentationState`] published on a replaying [`StateHolder`], and UI
//! code consumes them inside a [`Lifecycle`] window.

/// Async state slot with replay-1 subscriptions.
pub mod channel;
/// Repository traits and use cases.
pub mod domain;
/// Two-variant result type used across the request pipeline.
pub mod either;
/// Mapping from presentation states to view effects.
pub mod effects;
/// Stable error taxonomy.
pub mod error;
/// Request executor and local stream helpers.
pub mod executor;
/// Lifecycle-scoped state observation.
pub mod lifecycle;
/// Presentation state model.
pub mod state;
/// Publishing of request results into a state holder.
pub mod state_machine;
/// Transport response contract.
pub mod transport;
/// Domain models.
pub mod types;

pub use channel::{StateHolder, StateObserver, StateSubscription};
pub use domain::{
    GetVideoByIdUseCase, GetWorkoutListUseCase, ObserveSavedWorkoutsUseCase,
    SavedWorkoutRepository, VideoRepository, WorkoutRepository,
};
pub use effects::{
    ViewEffect, consumer_failure, content_visible, effects_for,
    loading_indicator_visible, surface_error,
};
pub use either::Either;
pub use error::{
    AppError, NetworkError, SERVER_ERROR_FALLBACK, UNEXPECTED_ERROR_FALLBACK,
    UNKNOWN_ERROR_MESSAGE, UnknownAppError,
};
pub use executor::{
    DataMapper, LocalStream, RemoteStream, RequestExecutor, classify_response, local_request,
    local_request_for_list, local_request_without_mapping,
};
pub use lifecycle::{
    DEFAULT_MIN_VISIBILITY, Lifecycle, ObservationHandle, StateCallbacks, Visibility,
    collect_while_active, observe_while_active,
};
pub use state::PresentationState;
pub use state_machine::{InFlightPolicy, PresentationStateMachine, run_and_publish};
pub use transport::{ByteStream, ErrorBody, IntoByteStream, TransportResponse};
pub use types::{Video, Workout};
