//! Platform backends for opening dynamic libraries and resolving symbols.
//!
//! The loader talks to the operating system only through [`LibraryBackend`],
//! so tests can substitute a scripted backend and exercise the full load and
//! unload lifecycle without a real OpenCL installation. Production code uses
//! [`NativeBackend`], a thin layer over the `dlopen` crate.

use dlopen::raw::Library;
use libc::c_void;
use std::ffi::CStr;
use std::ptr::NonNull;

/// Address of a resolved symbol
pub type SymbolAddr = NonNull<c_void>;

/// Low level dynamic library access used by the loader
pub trait LibraryBackend {
    /// An open library handle. Dropping it releases the library.
    type Library;

    /// Open the library at `path`, which may be a bare file name subject to
    /// the platform's usual search rules
    fn open(&self, path: &str) -> Result<Self::Library, dlopen::Error>;

    /// Look up `name` in `library`, returning its address or `None` when the
    /// library does not export it
    fn resolve(&self, library: &Self::Library, name: &CStr) -> Option<SymbolAddr>;

    /// Check whether `library` exports `name`
    fn probe(&self, library: &Self::Library, name: &CStr) -> bool {
        self.resolve(library, name).is_some()
    }

    /// Release `library`
    fn close(&self, library: Self::Library) {
        drop(library);
    }
}

/// The operating system's dynamic linker
#[derive(Debug, Default, Clone, Copy)]
pub struct NativeBackend;

impl LibraryBackend for NativeBackend {
    type Library = Library;

    fn open(&self, path: &str) -> Result<Library, dlopen::Error> {
        Library::open(path)
    }

    fn resolve(&self, library: &Library, name: &CStr) -> Option<SymbolAddr> {
        // dlopen reports a missing symbol and a null one as errors alike
        unsafe { library.symbol_cstr::<*mut c_void>(name) }
            .ok()
            .and_then(NonNull::new)
    }
}

#[cfg(all(test, target_os = "linux"))]
mod tests {
    use super::*;
    use std::ffi::CStr;

    // A library present on effectively every Linux host that is certainly
    // not an OpenCL implementation.
    const LIBM_CANDIDATES: &[&str] = &[
        "libm.so.6",
        "/usr/lib/x86_64-linux-gnu/libm.so.6",
        "/usr/lib64/libm.so.6",
    ];

    fn open_libm() -> Option<Library> {
        LIBM_CANDIDATES.iter().find_map(|path| Library::open(path).ok())
    }

    #[test]
    fn resolves_exported_symbols() {
        let lib = match open_libm() {
            Some(lib) => lib,
            None => return,
        };
        let backend = NativeBackend;
        let cos = CStr::from_bytes_with_nul(b"cos\0").unwrap();
        assert!(backend.resolve(&lib, cos).is_some());
        assert!(backend.probe(&lib, cos));
    }

    #[test]
    fn rejects_missing_symbols() {
        let lib = match open_libm() {
            Some(lib) => lib,
            None => return,
        };
        let backend = NativeBackend;
        let probe = crate::raw::PROBE_SYMBOL.as_cstr();
        assert!(backend.resolve(&lib, probe).is_none());
        assert!(!backend.probe(&lib, probe));
    }

    #[test]
    fn open_fails_for_missing_file() {
        let backend = NativeBackend;
        assert!(backend.open("/nonexistent/libocl_loader_probe.so").is_err());
    }
}
