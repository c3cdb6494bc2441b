use std::io;

use bytes::Bytes;
use futures::{StreamExt, stream::BoxStream};

/// Raw response payload handed to the caller, who takes ownership of it.
pub type ByteStream = BoxStream<'static, Result<Bytes, io::Error>>;

/// Body types that can be exposed as a [`ByteStream`].
pub trait IntoByteStream {
    fn into_byte_stream(self) -> ByteStream;
}

impl IntoByteStream for ByteStream {
    fn into_byte_stream(self) -> ByteStream {
        self
    }
}

impl IntoByteStream for Bytes {
    fn into_byte_stream(self) -> ByteStream {
        futures::stream::once(async move { Ok(self) }).boxed()
    }
}

impl IntoByteStream for Vec<u8> {
    fn into_byte_stream(self) -> ByteStream {
        Bytes::from(self).into_byte_stream()
    }
}

/// Error payload of a failed response, as far as the transport could read it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ErrorBody {
    /// The response carried no error body.
    Absent,
    /// The error body was read as text.
    Text(String),
    /// Reading the error body failed with the given reason.
    Unreadable(String),
}

/// Transport-level outcome of one request.
///
/// This is the narrow contract between the request executor and whatever
/// client actually performs I/O: a success flag, an optional decoded body, the
/// status code, and the error body/status message for failed responses.
#[derive(Debug)]
pub struct TransportResponse<T> {
    code: u16,
    successful: bool,
    body: Option<T>,
    error_body: ErrorBody,
    status_message: Option<String>,
}

impl<T> TransportResponse<T> {
    /// Successful response with an optional decoded body.
    pub fn success(code: u16, body: Option<T>) -> Self {
        Self {
            code,
            successful: true,
            body,
            error_body: ErrorBody::Absent,
            status_message: None,
        }
    }

    /// Failed response with whatever error details the transport could read.
    pub fn failure(code: u16, error_body: ErrorBody, status_message: Option<String>) -> Self {
        Self {
            code,
            successful: false,
            body: None,
            error_body,
            status_message,
        }
    }

    /// Attach the status line's reason phrase.
    pub fn with_status_message(mut self, message: impl Into<String>) -> Self {
        self.status_message = Some(message.into());
        self
    }

    pub fn is_successful(&self) -> bool {
        self.successful
    }

    pub fn code(&self) -> u16 {
        self.code
    }

    pub fn body(&self) -> Option<&T> {
        self.body.as_ref()
    }

    pub fn error_body(&self) -> &ErrorBody {
        &self.error_body
    }

    pub fn status_message(&self) -> Option<&str> {
        self.status_message.as_deref()
    }

    pub(crate) fn into_parts(self) -> (u16, bool, Option<T>, ErrorBody, Option<String>) {
        (
            self.code,
            self.successful,
            self.body,
            self.error_body,
            self.status_message,
        )
    }
}
