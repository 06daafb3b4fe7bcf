//! Error types shared by the icon, its backends and the event loop.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    /// The icon is not in a state that allows the requested operation.
    #[error("Invalid state: {0}")]
    InvalidState(String),

    /// The active backend does not support the requested operation.
    #[error("Not implemented: {0}")]
    NotImplemented(&'static str),

    /// The native toolkit reported a failure.
    #[error("Toolkit error: {0}")]
    Toolkit(String),

    #[error("Notification error: {0}")]
    Notification(String),

    #[error("Invalid option `{key}`: {reason}")]
    InvalidOption { key: String, reason: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),
}

pub type Result<T> = std::result::Result<T, Error>;
