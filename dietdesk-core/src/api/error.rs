//! Errors from talking to the backend.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ApiError {
    /// The request never produced a response (connect, TLS, timeout).
    #[error("HTTP error: {0}")]
    Transport(#[from] reqwest::Error),

    /// Non-2xx status.
    #[error("Server returned status {status}: {message}")]
    Status { status: u16, message: String },

    /// The envelope said `success: false`.
    #[error("{message}")]
    Rejected { message: String },

    /// A successful response without the expected payload.
    #[error("Response did not include {0}")]
    MissingData(&'static str),

    #[error("Invalid response body: {0}")]
    Decode(String),
}
