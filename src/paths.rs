//! Candidate locations of the system OpenCL library.
//!
//! Discovery walks [`DEFAULT_PATHS`] in order and settles on the first entry
//! that both opens and passes the probe check. Known vendor and distribution
//! locations come first; a bare file name comes last so the system linker
//! search gets the final word.

/// Environment variable overriding the candidate list. When set, its value
/// is the only path tried.
pub const OPENCL_LIBRARY_ENV: &str = "OPENCL_LIBRARY";

/// Default candidate paths for this platform, in the order they are tried
#[cfg(target_os = "windows")]
pub const DEFAULT_PATHS: &[&str] = &["OpenCL.dll"];

/// Default candidate paths for this platform, in the order they are tried
#[cfg(target_os = "android")]
pub const DEFAULT_PATHS: &[&str] = &[
    "/system/lib64/libOpenCL.so",
    "/system/vendor/lib64/libOpenCL.so",
    "/system/vendor/lib64/egl/libGLES_mali.so",
    "/system/vendor/lib64/libPVROCL.so",
    "/data/data/org.pocl.libs/files/lib64/libpocl.so",
    "/system/lib/libOpenCL.so",
    "/system/vendor/lib/libOpenCL.so",
    "/system/vendor/lib/egl/libGLES_mali.so",
    "/system/vendor/lib/libPVROCL.so",
    "/data/data/org.pocl.libs/files/lib/libpocl.so",
    "libOpenCL.so",
];

/// Default candidate paths for this platform, in the order they are tried
#[cfg(target_os = "linux")]
pub const DEFAULT_PATHS: &[&str] = &[
    "/usr/lib/libOpenCL.so",
    "/usr/local/lib/libOpenCL.so",
    "/usr/local/lib/libpocl.so",
    "/usr/lib64/libOpenCL.so",
    "/usr/lib32/libOpenCL.so",
    "libOpenCL.so",
];

/// Default candidate paths for this platform, in the order they are tried
#[cfg(target_os = "macos")]
pub const DEFAULT_PATHS: &[&str] = &[
    "/System/Library/Frameworks/OpenCL.framework/OpenCL",
    "libOpenCL.so",
];

/// Default candidate paths for this platform, in the order they are tried
#[cfg(not(any(
    target_os = "windows",
    target_os = "android",
    target_os = "linux",
    target_os = "macos"
)))]
pub const DEFAULT_PATHS: &[&str] = &["libOpenCL.so"];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn candidate_list_is_usable() {
        assert!(!DEFAULT_PATHS.is_empty());
        assert!(DEFAULT_PATHS.iter().all(|path| !path.is_empty()));
    }

    #[test]
    fn bare_name_comes_last() {
        let last = DEFAULT_PATHS.last().unwrap();
        assert!(!last.contains('/'));
    }
}
