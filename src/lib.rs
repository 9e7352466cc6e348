//! Runtime discovery and binding of the system OpenCL library.
//!
//! No OpenCL library is linked at build time. At runtime a [`ClLoader`]
//! walks a platform specific list of candidate paths, keeps the first
//! library that both opens and passes a probe check, and fills an entry
//! point table with whatever symbols that library exports.
//!
//! ```no_run
//! use ocl_loader::ClLoader;
//!
//! let mut cl = ClLoader::new();
//! cl.load()?;
//! println!("using {}", cl.loaded_path().unwrap_or("?"));
//!
//! if let Some(get_platform_ids) = cl.api().clGetPlatformIDs {
//!     let mut count = 0;
//!     unsafe { get_platform_ids(0, std::ptr::null_mut(), &mut count) };
//!     println!("{} OpenCL platform(s)", count);
//! }
//! # Ok::<(), ocl_loader::LoadError>(())
//! ```

pub extern crate dlopen;

#[macro_use]
mod macros;

pub mod backend;
mod error;
mod loader;
pub mod paths;
pub mod raw;

pub use backend::{LibraryBackend, NativeBackend, SymbolAddr};
pub use error::*;
pub use loader::ClLoader;
pub use raw::ClApi;

/// Load the system OpenCL library with a fresh loader, returning the loader
/// ready for use
pub fn load_opencl() -> Result<ClLoader> {
    let mut loader = ClLoader::new();
    loader.load()?;
    Ok(loader)
}
