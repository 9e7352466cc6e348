//! Library discovery, the probe check, and entry point binding.

use crate::backend::{LibraryBackend, NativeBackend};
use crate::error::{LoadError, Result};
use crate::paths;
use crate::raw::{ClApi, API_COUNT, PROBE_SYMBOL};
use log::{debug, info, warn};
use std::env;
use std::fmt::{self, Debug, Formatter};

/// A loaded (or not yet loaded) OpenCL library and its entry point table.
///
/// The loader owns all of its state: dropping it closes the library, and two
/// loaders in one process are independent of each other. Call
/// [`load`](ClLoader::load) or [`load_from`](ClLoader::load_from) before
/// using the table returned by [`api`](ClLoader::api).
///
/// The backend parameter exists so tests can substitute a scripted
/// [`LibraryBackend`]; everywhere else the default [`NativeBackend`] is the
/// one to use.
pub struct ClLoader<B: LibraryBackend = NativeBackend> {
    backend: B,
    library: Option<B::Library>,
    loaded_path: Option<String>,
    api: ClApi,
}

impl ClLoader<NativeBackend> {
    /// Create a loader backed by the operating system's dynamic linker, with
    /// nothing loaded yet
    pub fn new() -> Self {
        Self::with_backend(NativeBackend)
    }
}

impl Default for ClLoader<NativeBackend> {
    fn default() -> Self {
        Self::new()
    }
}

impl<B: LibraryBackend> ClLoader<B> {
    /// Create a loader on a custom backend, with nothing loaded yet
    pub fn with_backend(backend: B) -> Self {
        Self {
            backend,
            library: None,
            loaded_path: None,
            api: ClApi::UNBOUND,
        }
    }

    /// Load the system OpenCL library and bind its entry points.
    ///
    /// Candidate paths come from [`paths::DEFAULT_PATHS`] unless the
    /// [`paths::OPENCL_LIBRARY_ENV`] environment variable is set, in which
    /// case its value is the only candidate tried. Any previously loaded
    /// library is released first.
    pub fn load(&mut self) -> Result<()> {
        match env::var(paths::OPENCL_LIBRARY_ENV) {
            Ok(path) => {
                debug!(
                    "{} set, trying {:?} as the only candidate",
                    paths::OPENCL_LIBRARY_ENV,
                    path
                );
                self.load_from(&[path.as_str()])
            }
            Err(env::VarError::NotUnicode(_)) => {
                warn!(
                    "{} is set but not valid unicode, no candidates to try",
                    paths::OPENCL_LIBRARY_ENV
                );
                self.load_from(&[])
            }
            Err(env::VarError::NotPresent) => self.load_from(paths::DEFAULT_PATHS),
        }
    }

    /// Load the OpenCL library from the first usable path in `paths` and
    /// bind its entry points.
    ///
    /// Paths are tried strictly in order. A path is usable when it opens and
    /// the probe check confirms it is actually an OpenCL library; unusable
    /// candidates are skipped and closed. Any previously loaded library is
    /// released up front, so a failed call leaves the loader unloaded rather
    /// than holding its old state.
    pub fn load_from(&mut self, paths: &[&str]) -> Result<()> {
        self.unload();

        let (path, library) = self.discover(paths)?;
        self.api.bind_all(&self.backend, &library);
        info!(
            "loaded OpenCL from {} ({}/{} entry points bound)",
            path,
            self.api.resolved_count(),
            API_COUNT
        );
        self.library = Some(library);
        self.loaded_path = Some(path);
        Ok(())
    }

    /// Walk `paths` in order and return the first library that opens and
    /// passes the probe check
    fn discover(&self, paths: &[&str]) -> Result<(String, B::Library)> {
        for path in paths {
            let library = match self.backend.open(path) {
                Ok(library) => library,
                Err(e) => {
                    debug!("candidate {}: {}", path, e);
                    continue;
                }
            };
            if !self.backend.probe(&library, PROBE_SYMBOL.as_cstr()) {
                debug!(
                    "candidate {}: opened but does not export {:?}",
                    path,
                    PROBE_SYMBOL.as_cstr()
                );
                self.backend.close(library);
                continue;
            }
            return Ok((path.to_string(), library));
        }
        Err(LoadError::LibraryOpen { tried: paths.len() })
    }

    /// Re-run entry point binding against the already loaded library,
    /// returning [`LoadError::NotLoaded`] when nothing is loaded
    pub fn rebind(&mut self) -> Result<()> {
        match &self.library {
            Some(library) => {
                self.api.bind_all(&self.backend, library);
                Ok(())
            }
            None => Err(LoadError::NotLoaded),
        }
    }

    /// Release the loaded library, if any, clearing the entry point table
    /// first. Calling this with nothing loaded is a no-op.
    pub fn unload(&mut self) {
        self.api.clear();
        self.loaded_path = None;
        if let Some(library) = self.library.take() {
            debug!("closing OpenCL library");
            self.backend.close(library);
        }
    }

    /// The entry point table. Every slot is empty until a load succeeds.
    pub fn api(&self) -> &ClApi {
        &self.api
    }

    /// Whether a library is currently loaded
    pub fn is_loaded(&self) -> bool {
        self.library.is_some()
    }

    /// The path the loaded library was opened from, or `None` when nothing
    /// is loaded
    pub fn loaded_path(&self) -> Option<&str> {
        self.loaded_path.as_deref()
    }
}

impl<B: LibraryBackend> Drop for ClLoader<B> {
    fn drop(&mut self) {
        self.unload();
    }
}

impl<B: LibraryBackend> Debug for ClLoader<B> {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        f.debug_struct("ClLoader")
            .field("loaded_path", &self.loaded_path)
            .field("bound", &self.api.resolved_count())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::ClLoader;
    use crate::backend::{LibraryBackend, SymbolAddr};
    use crate::error::LoadError;
    use crate::raw::PROBE_SYMBOL;
    use std::collections::HashMap;
    use std::ffi::CStr;
    use std::io;
    use std::ptr::NonNull;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    /// A scripted backend: a map of path to exported symbol names, plus a
    /// live handle count to catch leaked libraries.
    #[derive(Default)]
    struct FakeBackend {
        libs: HashMap<&'static str, Vec<&'static str>>,
        open_handles: Arc<AtomicUsize>,
    }

    struct FakeLibrary {
        symbols: Vec<&'static str>,
        open_handles: Arc<AtomicUsize>,
    }

    impl Drop for FakeLibrary {
        fn drop(&mut self) {
            self.open_handles.fetch_sub(1, Ordering::SeqCst);
        }
    }

    impl FakeBackend {
        fn with_lib(mut self, path: &'static str, symbols: &[&'static str]) -> Self {
            self.libs.insert(path, symbols.to_vec());
            self
        }

        fn handle_counter(&self) -> Arc<AtomicUsize> {
            Arc::clone(&self.open_handles)
        }
    }

    impl LibraryBackend for FakeBackend {
        type Library = FakeLibrary;

        fn open(&self, path: &str) -> Result<FakeLibrary, dlopen::Error> {
            match self.libs.get(path) {
                Some(symbols) => {
                    self.open_handles.fetch_add(1, Ordering::SeqCst);
                    Ok(FakeLibrary {
                        symbols: symbols.clone(),
                        open_handles: Arc::clone(&self.open_handles),
                    })
                }
                None => Err(dlopen::Error::OpeningLibraryError(io::Error::new(
                    io::ErrorKind::NotFound,
                    path.to_string(),
                ))),
            }
        }

        fn resolve(&self, library: &FakeLibrary, name: &CStr) -> Option<SymbolAddr> {
            if library.symbols.iter().any(|s| s.as_bytes() == name.to_bytes()) {
                Some(NonNull::dangling())
            } else {
                None
            }
        }
    }

    const REAL: &[&str] = &["clCreateContext", "clGetPlatformIDs", "clGetDeviceIDs"];

    #[test]
    fn binds_first_usable_candidate() {
        let backend = FakeBackend::default().with_lib("/gpu/libOpenCL.so", REAL);
        let mut cl = ClLoader::with_backend(backend);
        cl.load_from(&["/nonexistent/libOpenCL.so", "/gpu/libOpenCL.so"])
            .unwrap();

        assert!(cl.is_loaded());
        assert_eq!(cl.loaded_path(), Some("/gpu/libOpenCL.so"));
        assert!(cl.api().clCreateContext.is_some());
        assert!(cl.api().clGetPlatformIDs.is_some());
        assert!(cl.api().clCreateBuffer.is_none());
        assert_eq!(cl.api().resolved_count(), REAL.len());
    }

    #[test]
    fn skips_imposters_and_closes_them() {
        let backend = FakeBackend::default()
            .with_lib("/fake/libOpenCL.so", &["unrelatedEntryPoint"])
            .with_lib("/real/libOpenCL.so", REAL);
        let handles = backend.handle_counter();
        let mut cl = ClLoader::with_backend(backend);

        cl.load_from(&["/fake/libOpenCL.so", "/real/libOpenCL.so"])
            .unwrap();
        assert_eq!(cl.loaded_path(), Some("/real/libOpenCL.so"));
        assert_eq!(handles.load(Ordering::SeqCst), 1);

        cl.unload();
        assert_eq!(handles.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn fails_when_no_candidate_is_usable() {
        let backend = FakeBackend::default().with_lib("/fake/libOpenCL.so", &["notOpenCL"]);
        let handles = backend.handle_counter();
        let mut cl = ClLoader::with_backend(backend);

        let err = cl
            .load_from(&["/fake/libOpenCL.so", "/missing/libOpenCL.so"])
            .unwrap_err();
        assert_eq!(err, LoadError::LibraryOpen { tried: 2 });
        assert!(!cl.is_loaded());
        assert!(cl.loaded_path().is_none());
        assert_eq!(cl.api().resolved_count(), 0);
        assert_eq!(handles.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn empty_candidate_list_fails_without_attempts() {
        let mut cl = ClLoader::with_backend(FakeBackend::default());
        assert_eq!(cl.load_from(&[]), Err(LoadError::LibraryOpen { tried: 0 }));
        assert!(!cl.is_loaded());
    }

    #[test]
    fn reload_replaces_previous_library_without_leaking() {
        let backend = FakeBackend::default()
            .with_lib("/a/libOpenCL.so", &["clCreateContext", "clFlush"])
            .with_lib("/b/libOpenCL.so", &["clCreateContext", "clFinish"]);
        let handles = backend.handle_counter();
        let mut cl = ClLoader::with_backend(backend);

        cl.load_from(&["/a/libOpenCL.so"]).unwrap();
        assert!(cl.api().clFlush.is_some());
        assert!(cl.api().clFinish.is_none());
        assert_eq!(handles.load(Ordering::SeqCst), 1);

        cl.load_from(&["/b/libOpenCL.so"]).unwrap();
        assert_eq!(cl.loaded_path(), Some("/b/libOpenCL.so"));
        assert!(cl.api().clFlush.is_none());
        assert!(cl.api().clFinish.is_some());
        assert_eq!(handles.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn failed_reload_leaves_loader_unloaded() {
        let backend = FakeBackend::default().with_lib("/a/libOpenCL.so", REAL);
        let handles = backend.handle_counter();
        let mut cl = ClLoader::with_backend(backend);
        cl.load_from(&["/a/libOpenCL.so"]).unwrap();

        let err = cl.load_from(&["/missing/libOpenCL.so"]).unwrap_err();
        assert_eq!(err, LoadError::LibraryOpen { tried: 1 });
        assert!(!cl.is_loaded());
        assert!(cl.loaded_path().is_none());
        assert_eq!(cl.api().resolved_count(), 0);
        assert_eq!(handles.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn unload_is_idempotent() {
        let backend = FakeBackend::default().with_lib("/a/libOpenCL.so", REAL);
        let handles = backend.handle_counter();
        let mut cl = ClLoader::with_backend(backend);

        cl.unload();
        cl.load_from(&["/a/libOpenCL.so"]).unwrap();
        cl.unload();
        cl.unload();

        assert!(!cl.is_loaded());
        assert!(cl.loaded_path().is_none());
        assert_eq!(cl.api().resolved_count(), 0);
        assert_eq!(handles.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn dropping_the_loader_closes_the_library() {
        let backend = FakeBackend::default().with_lib("/a/libOpenCL.so", REAL);
        let handles = backend.handle_counter();
        let mut cl = ClLoader::with_backend(backend);

        cl.load_from(&["/a/libOpenCL.so"]).unwrap();
        assert_eq!(handles.load(Ordering::SeqCst), 1);

        drop(cl);
        assert_eq!(handles.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn rebind_requires_a_loaded_library() {
        let mut cl = ClLoader::with_backend(FakeBackend::default());
        assert_eq!(cl.rebind(), Err(LoadError::NotLoaded));

        let backend = FakeBackend::default().with_lib("/a/libOpenCL.so", REAL);
        let mut cl = ClLoader::with_backend(backend);
        cl.load_from(&["/a/libOpenCL.so"]).unwrap();
        cl.rebind().unwrap();
        assert_eq!(cl.api().resolved_count(), REAL.len());
    }

    #[test]
    fn probe_only_library_binds_just_the_probe() {
        let backend =
            FakeBackend::default().with_lib("/min/libOpenCL.so", &["clCreateContext"]);
        let mut cl = ClLoader::with_backend(backend);

        cl.load_from(&["/min/libOpenCL.so"]).unwrap();
        assert_eq!(cl.api().resolved_count(), 1);
        assert!(cl.api().is_bound(PROBE_SYMBOL.as_cstr()));
    }
}
