use std::{any::Any, fmt::Display, future::Future};

use futures::{
    StreamExt,
    stream::{self, BoxStream, Stream},
};
use tokio::{runtime::Handle, task::JoinError};
use tracing::{debug, warn};

use crate::{
    either::Either,
    error::{NetworkError, SERVER_ERROR_FALLBACK, UNKNOWN_ERROR_MESSAGE},
    transport::{ByteStream, ErrorBody, IntoByteStream, TransportResponse},
};

/// Cold, single-element stream produced by every remote request.
pub type RemoteStream<T> = BoxStream<'static, Either<NetworkError, T>>;

/// Continuous stream of local records, without a failure wrapper.
pub type LocalStream<T> = BoxStream<'static, T>;

/// Conversion from a wire/storage model into its domain model.
pub trait DataMapper<D> {
    fn map_to_domain(self) -> D;
}

/// Classify a transport response into a failure or its body.
pub fn classify_response<T>(response: TransportResponse<T>) -> Either<NetworkError, T> {
    let (code, successful, body, error_body, status_message) = response.into_parts();

    match (successful, body) {
        (true, Some(body)) => Either::Success(body),
        (true, None) => {
            debug!(code, "successful response without body");
            Either::Failure(NetworkError::EmptyBody)
        }
        (false, _) => {
            let message = match error_body {
                ErrorBody::Text(text) => text,
                ErrorBody::Absent => UNKNOWN_ERROR_MESSAGE.to_owned(),
                ErrorBody::Unreadable(_) => status_message
                    .filter(|message| !message.is_empty())
                    .unwrap_or_else(|| SERVER_ERROR_FALLBACK.to_owned()),
            };
            debug!(code, message = %message, "api failure response");
            Either::Failure(NetworkError::api_with_code(message, code))
        }
    }
}

/// Runs request closures on a background runtime and classifies their outcome.
///
/// Every `network_request*` method returns a cold [`RemoteStream`]: nothing is
/// sent until the stream is polled, and it yields exactly one item. Errors
/// returned by the closure and panics raised while requesting or mapping are
/// contained and reported as [`NetworkError::Unexpected`].
#[derive(Debug, Clone)]
pub struct RequestExecutor {
    handle: Handle,
}

impl RequestExecutor {
    /// Create an executor that runs requests on `handle`.
    pub fn new(handle: Handle) -> Self {
        Self { handle }
    }

    /// Core request operation; `on_success` projects the decoded body.
    pub fn network_request<T, S, E, F, Fut, M>(&self, request: F, on_success: M) -> RemoteStream<S>
    where
        T: Send + 'static,
        S: Send + 'static,
        E: Display + Send + 'static,
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = Result<TransportResponse<T>, E>> + Send + 'static,
        M: FnOnce(T) -> S + Send + 'static,
    {
        let handle = self.handle.clone();
        stream::once(async move {
            let task = handle.spawn(async move {
                let response = match request().await {
                    Ok(response) => response,
                    Err(err) => {
                        let message = err.to_string();
                        warn!(error = %message, "request failed before a response was received");
                        return Either::Failure(NetworkError::unexpected(message));
                    }
                };
                classify_response(response).map_success(on_success)
            });

            match task.await {
                Ok(result) => result,
                Err(err) => {
                    let message = join_error_message(err);
                    warn!(error = %message, "request task did not complete");
                    Either::Failure(NetworkError::unexpected(message))
                }
            }
        })
        .boxed()
    }

    /// Pass the body through unchanged (primitive or raw payloads).
    pub fn network_request_without_mapping<T, E, F, Fut>(&self, request: F) -> RemoteStream<T>
    where
        T: Send + 'static,
        E: Display + Send + 'static,
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = Result<TransportResponse<T>, E>> + Send + 'static,
    {
        self.network_request(request, |body| body)
    }

    /// Map the body into its domain model.
    pub fn network_request_with_mapping<T, S, E, F, Fut>(&self, request: F) -> RemoteStream<S>
    where
        T: DataMapper<S> + Send + 'static,
        S: Send + 'static,
        E: Display + Send + 'static,
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = Result<TransportResponse<T>, E>> + Send + 'static,
    {
        self.network_request(request, <T as DataMapper<S>>::map_to_domain)
    }

    /// Map every element of a list body, preserving order and count.
    pub fn network_request_for_list<T, S, E, F, Fut>(&self, request: F) -> RemoteStream<Vec<S>>
    where
        T: DataMapper<S> + Send + 'static,
        S: Send + 'static,
        E: Display + Send + 'static,
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = Result<TransportResponse<Vec<T>>, E>> + Send + 'static,
    {
        self.network_request_list_mapped(request, <T as DataMapper<S>>::map_to_domain)
    }

    /// Like [`Self::network_request_for_list`] with a caller-supplied mapper.
    pub fn network_request_list_mapped<T, S, E, F, Fut, M>(
        &self,
        request: F,
        mapper: M,
    ) -> RemoteStream<Vec<S>>
    where
        T: Send + 'static,
        S: Send + 'static,
        E: Display + Send + 'static,
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = Result<TransportResponse<Vec<T>>, E>> + Send + 'static,
        M: FnMut(T) -> S + Send + 'static,
    {
        self.network_request(request, move |items: Vec<T>| {
            items.into_iter().map(mapper).collect()
        })
    }

    /// Discard the body; only the outcome matters.
    pub fn network_request_unit<T, E, F, Fut>(&self, request: F) -> RemoteStream<()>
    where
        T: Send + 'static,
        E: Display + Send + 'static,
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = Result<TransportResponse<T>, E>> + Send + 'static,
    {
        self.network_request(request, |_| ())
    }

    /// Hand the raw body to the caller as a byte stream.
    pub fn network_request_byte_stream<T, E, F, Fut>(&self, request: F) -> RemoteStream<ByteStream>
    where
        T: IntoByteStream + Send + 'static,
        E: Display + Send + 'static,
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = Result<TransportResponse<T>, E>> + Send + 'static,
    {
        self.network_request(request, IntoByteStream::into_byte_stream)
    }
}

/// Map every record of a local stream; absent records stay absent.
pub fn local_request<T, S, M>(
    source: impl Stream<Item = Option<T>> + Send + 'static,
    mut mapper: M,
) -> LocalStream<Option<S>>
where
    T: 'static,
    S: 'static,
    M: FnMut(T) -> S + Send + 'static,
{
    source.map(move |record| record.map(&mut mapper)).boxed()
}

/// Map every element of each emitted list; absent elements stay absent.
pub fn local_request_for_list<T, S, M>(
    source: impl Stream<Item = Vec<Option<T>>> + Send + 'static,
    mut mapper: M,
) -> LocalStream<Vec<Option<S>>>
where
    T: 'static,
    S: 'static,
    M: FnMut(T) -> S + Send + 'static,
{
    source
        .map(move |records| {
            records
                .into_iter()
                .map(|record| record.map(&mut mapper))
                .collect()
        })
        .boxed()
}

/// Expose a local stream unchanged.
pub fn local_request_without_mapping<T: 'static>(
    source: impl Stream<Item = T> + Send + 'static,
) -> LocalStream<T> {
    source.boxed()
}

pub(crate) fn panic_message(payload: Box<dyn Any + Send>) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_owned()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unexpected panic".to_owned()
    }
}

fn join_error_message(err: JoinError) -> String {
    if err.is_panic() {
        panic_message(err.into_panic())
    } else {
        "request task was cancelled".to_owned()
    }
}
