use std::fmt::{self, Debug, Display, Formatter};

/// An error raised while discovering or binding the OpenCL library
#[derive(thiserror::Error, Clone, Copy, PartialEq, Eq)]
pub enum LoadError {
    /// No candidate path produced a library that passes the probe check
    #[error("no usable OpenCL library found ({tried} candidate path(s) tried)")]
    LibraryOpen {
        /// Number of candidate paths attempted
        tried: usize,
    },

    /// The operation needs a loaded library, and none is loaded
    #[error("no OpenCL library is currently loaded")]
    NotLoaded,
}

impl LoadError {
    /// The conventional numeric status for this error: `-2` when no library
    /// could be opened, `-1` when the loader has not been initialized.
    /// Success is conventionally `0`.
    pub fn status_code(&self) -> i32 {
        match self {
            LoadError::LibraryOpen { .. } => -2,
            LoadError::NotLoaded => -1,
        }
    }
}

impl Debug for LoadError {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        <Self as Display>::fmt(self, f)
    }
}

/// A loader result type
pub type Result<T> = std::result::Result<T, LoadError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_codes_are_stable() {
        assert_eq!(LoadError::LibraryOpen { tried: 3 }.status_code(), -2);
        assert_eq!(LoadError::NotLoaded.status_code(), -1);
    }

    #[test]
    fn errors_display_with_context() {
        let err = LoadError::LibraryOpen { tried: 6 };
        assert_eq!(
            err.to_string(),
            "no usable OpenCL library found (6 candidate path(s) tried)"
        );
        assert_eq!(format!("{:?}", err), err.to_string());
    }
}
