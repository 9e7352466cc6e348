//! Loader behavior against the real system, written to pass with or without
//! an OpenCL installation.

use ocl_loader::{ClLoader, LoadError};

#[test]
fn load_reports_consistent_state() {
    let mut cl = ClLoader::new();
    match cl.load() {
        Ok(()) => {
            assert!(cl.is_loaded());
            assert!(cl.loaded_path().is_some());
            // A library only passes the probe check if it exports this
            assert!(cl.api().clCreateContext.is_some());
            assert!(cl.api().resolved_count() >= 1);
        }
        Err(LoadError::LibraryOpen { .. }) => {
            assert!(!cl.is_loaded());
            assert!(cl.loaded_path().is_none());
            assert_eq!(cl.api().resolved_count(), 0);
        }
        Err(e) => panic!("unexpected error: {}", e),
    }
}

#[test]
fn convenience_entry_matches_loader_state() {
    match ocl_loader::load_opencl() {
        Ok(cl) => assert!(cl.is_loaded()),
        Err(LoadError::LibraryOpen { .. }) => {}
        Err(e) => panic!("unexpected error: {}", e),
    }
}

#[test]
fn missing_paths_fail_without_loading() {
    let mut cl = ClLoader::new();
    let err = cl
        .load_from(&[
            "/nonexistent/libOpenCL.so",
            "/also/nonexistent/libOpenCL.so",
        ])
        .unwrap_err();
    assert_eq!(err, LoadError::LibraryOpen { tried: 2 });
    assert_eq!(err.status_code(), -2);
    assert!(!cl.is_loaded());
}

#[test]
fn empty_candidate_list_is_a_controlled_failure() {
    let mut cl = ClLoader::new();
    assert_eq!(cl.load_from(&[]), Err(LoadError::LibraryOpen { tried: 0 }));
    assert!(!cl.is_loaded());
}

#[test]
fn unload_without_load_is_harmless() {
    let mut cl = ClLoader::new();
    cl.unload();
    cl.unload();
    assert!(!cl.is_loaded());
    assert_eq!(cl.rebind(), Err(LoadError::NotLoaded));
    assert_eq!(LoadError::NotLoaded.status_code(), -1);
}

#[cfg(target_os = "linux")]
#[test]
fn library_without_the_probe_symbol_is_rejected() {
    // libm exists on effectively every Linux host and is certainly not
    // OpenCL, so it must be rejected even though it opens fine.
    let mut cl = ClLoader::new();
    let result = cl.load_from(&["libm.so.6", "/usr/lib/x86_64-linux-gnu/libm.so.6"]);
    assert_eq!(result, Err(LoadError::LibraryOpen { tried: 2 }));
    assert!(!cl.is_loaded());
}
