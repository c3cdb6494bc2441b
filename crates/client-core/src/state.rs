use serde::{Deserialize, Serialize};

use crate::{
    either::Either,
    error::{AppError, NetworkError},
};

/// Presentation-facing state of one logical operation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub enum PresentationState<T> {
    /// No operation has been issued yet.
    Idle,
    /// The operation is in flight.
    Loading,
    /// The latest attempt failed.
    Error(AppError),
    /// The latest attempt produced data.
    Success(T),
}

impl<T> Default for PresentationState<T> {
    fn default() -> Self {
        Self::Idle
    }
}

impl<T> PresentationState<T> {
    /// Fold an executor result into a terminal state.
    pub fn from_result<S>(result: Either<NetworkError, S>, mapper: impl FnOnce(S) -> T) -> Self {
        result.fold(
            |error| Self::Error(AppError::Network(error)),
            |value| Self::Success(mapper(value)),
        )
    }

    /// Payload of a `Success` state.
    pub fn success_value(&self) -> Option<&T> {
        match self {
            Self::Success(data) => Some(data),
            Self::Idle | Self::Loading | Self::Error(_) => None,
        }
    }

    /// `true` for `Error` and `Success`.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Error(_) | Self::Success(_))
    }

    /// Stable variant name for logs.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Loading => "loading",
            Self::Error(_) => "error",
            Self::Success(_) => "success",
        }
    }
}
