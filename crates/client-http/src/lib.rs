//! HTTP side of the workouts client.
//!
//! [`HttpTransport`] turns `reqwest` responses into the executor's
//! [`client_core::TransportResponse`] contract; the repositories here pair the
//! API wrappers with a [`client_core::RequestExecutor`].

pub mod api;
pub mod config;
pub mod models;
pub mod repository;
pub mod transport;

use client_core::RequestExecutor;

pub use api::{VideoApi, WorkoutsApi};
pub use config::{ClientBuildError, DEFAULT_REQUEST_TIMEOUT, HttpClientConfig};
pub use models::{DurationValue, SavedWorkoutRecord, VideoData, WorkoutData, resolve_link};
pub use repository::{HttpVideoRepository, HttpWorkoutRepository, LocalSavedWorkoutRepository};
pub use transport::{HttpTransport, TransportError};

/// Remote repositories sharing one transport and executor.
#[derive(Debug, Clone)]
pub struct WorkoutsClient {
    pub videos: HttpVideoRepository,
    pub workouts: HttpWorkoutRepository,
}

impl WorkoutsClient {
    pub fn new(
        config: &HttpClientConfig,
        executor: RequestExecutor,
    ) -> Result<Self, ClientBuildError> {
        let transport = HttpTransport::new(config)?;
        Ok(Self {
            videos: HttpVideoRepository::new(VideoApi::new(transport.clone()), executor.clone()),
            workouts: HttpWorkoutRepository::new(WorkoutsApi::new(transport), executor),
        })
    }
}
