//! Behavior of the `OPENCL_LIBRARY` override. Kept in its own test binary,
//! as a single test, so nothing else races the process environment.

use ocl_loader::{paths, ClLoader, LoadError};
use std::env;

#[test]
fn override_substitutes_for_the_default_list() {
    let mut cl = ClLoader::new();

    // The override is the only candidate tried, with no fallback to the
    // default list.
    env::set_var(paths::OPENCL_LIBRARY_ENV, "/nonexistent/libOpenCL.so");
    assert_eq!(cl.load(), Err(LoadError::LibraryOpen { tried: 1 }));
    assert!(!cl.is_loaded());

    #[cfg(target_os = "linux")]
    {
        // Pointing the override at a real library that is not OpenCL must
        // still fail the probe check.
        env::set_var(paths::OPENCL_LIBRARY_ENV, "libm.so.6");
        assert_eq!(cl.load(), Err(LoadError::LibraryOpen { tried: 1 }));
        assert!(!cl.is_loaded());
    }

    env::remove_var(paths::OPENCL_LIBRARY_ENV);
}
