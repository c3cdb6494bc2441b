use serde::{Deserialize, Serialize};

/// Outcome of a data operation: exactly one of a failure or a success.
///
/// There is no default value and no boolean view; consumers either match on
/// the variants or go through [`Either::fold`].
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub enum Either<E, T> {
    /// The operation failed with `E`.
    Failure(E),
    /// The operation produced `T`.
    Success(T),
}

impl<E, T> Either<E, T> {
    /// Collapse both variants into a single value.
    pub fn fold<R>(self, on_failure: impl FnOnce(E) -> R, on_success: impl FnOnce(T) -> R) -> R {
        match self {
            Self::Failure(error) => on_failure(error),
            Self::Success(value) => on_success(value),
        }
    }

    /// Transform the success payload, leaving a failure untouched.
    pub fn map_success<S>(self, f: impl FnOnce(T) -> S) -> Either<E, S> {
        match self {
            Self::Failure(error) => Either::Failure(error),
            Self::Success(value) => Either::Success(f(value)),
        }
    }

    /// Convert into a standard `Result` so `?` can be used at call sites.
    pub fn into_result(self) -> Result<T, E> {
        self.fold(Err, Ok)
    }
}

impl<E, T> From<Result<T, E>> for Either<E, T> {
    fn from(result: Result<T, E>) -> Self {
        match result {
            Ok(value) => Self::Success(value),
            Err(error) => Self::Failure(error),
        }
    }
}

impl<E, T> From<Either<E, T>> for Result<T, E> {
    fn from(either: Either<E, T>) -> Self {
        either.into_result()
    }
}
