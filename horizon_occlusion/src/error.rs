//! Error types for the Horizon occlusion crate
//!
//! The culling path itself never fails: missing rasterizer support, empty
//! geometry and numeric degeneracy all degrade to "visible". Errors are only
//! produced at the edges of the API (scene graph construction, explicit
//! buffer creation).

use std::fmt;

/// Result type for Horizon operations
pub type Result<T> = std::result::Result<T, Error>;

/// Horizon errors
#[derive(Debug, Clone)]
pub enum Error {
    /// A node key is unknown, removed, or not valid for the requested operation
    InvalidNode(String),

    /// A parameter is out of its accepted domain
    InvalidParameter(String),

    /// Initialization failed (rasterizer, buffers)
    InitializationFailed(String),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::InvalidNode(msg) => write!(f, "Invalid node: {}", msg),
            Error::InvalidParameter(msg) => write!(f, "Invalid parameter: {}", msg),
            Error::InitializationFailed(msg) => write!(f, "Initialization failed: {}", msg),
        }
    }
}

impl std::error::Error for Error {}

/// Log an error and build an `Error` value.
///
/// The first argument picks the variant constructor, the second is the log source.
///
/// ```ignore
/// let err = horizon_err!(InvalidNode, "horizon::SceneGraph", "unknown key {:?}", key);
/// ```
#[macro_export]
macro_rules! horizon_err {
    ($variant:ident, $source:expr, $($arg:tt)*) => {{
        let message = format!($($arg)*);
        $crate::horizon_error!($source, "{}", message);
        $crate::error::Error::$variant(message)
    }};
}

/// Log an error and return it from the current function.
#[macro_export]
macro_rules! horizon_bail {
    ($variant:ident, $source:expr, $($arg:tt)*) => {
        return Err($crate::horizon_err!($variant, $source, $($arg)*))
    };
}

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;
