use thiserror::Error;

/// Failures surfaced by the attendance engine.
///
/// Messages are operator-facing: whatever the remote service or the camera
/// reported is carried through verbatim so the shell can display it as-is.
#[derive(Debug, Error)]
pub enum Error {
    /// Transport failure or non-2xx response from the remote service.
    #[error("{0}")]
    Fetch(String),

    /// The remote service answered but reported an application-level failure.
    #[error("{0}")]
    Service(String),

    /// The submitted employee id matched nothing in the directory cache.
    #[error("Employee with ID \"{0}\" not found.")]
    NotFound(String),

    /// The capture device is unavailable, denied, or failed mid-capture.
    #[error("{0}")]
    Camera(String),

    /// Required operator input is missing or malformed.
    #[error("{0}")]
    Validation(String),
}

impl From<reqwest::Error> for Error {
    fn from(err: reqwest::Error) -> Self {
        Error::Fetch(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, Error>;
