//! Errors reported by platform collaborators
//!
//! None of these ever cross the coordinator's public boundary; they are logged
//! and recorded in `Diagnostics`.

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PlatformError {
    /// The user or the OS refused the capability (notifications off, no background time)
    #[error("permission denied: {0}")]
    PermissionDenied(String),

    /// The platform does not offer this surface at all
    #[error("not supported on this platform")]
    Unsupported,

    /// Transiently busy, a later attempt may succeed
    #[error("platform busy")]
    Busy,

    #[error("platform unavailable: {0}")]
    Unavailable(String),
}
