/// Create a new opaque type
macro_rules! opaque_type {
    ( $name:ident ) => {
        #[doc(hidden)]
        pub struct $name {
            _opaque: (),
        }
    };

    ( $( $name:ident),* $(,)? ) => {
        $( opaque_type!{$name} )*
    };
}

/// Define OpenCL error code constants and a function to get the name of an
/// error code
macro_rules! error_codes {
    ( $($name:ident = $value:expr),* $(,)? ) => {
        $( pub const $name: i32 = $value; )*

        /// Get the name of an OpenCL error code, returning `None` if the error
        /// code is unknown
        pub fn error_name(code: i32) -> Option<&'static str> {
            match code {
                $($name => Some(stringify!($name)),)*
                _ => None,
            }
        }
    };
}

/// Define the OpenCL entry point table: a struct with one individually
/// optional function pointer slot per entry point, plus the parallel list of
/// symbol names used to fill it
macro_rules! cl_api {
    (
        $(
            fn $fname:ident ( $( $pname:ident : $pty:ty ),* $(,)? ) $( -> $rty:ty )? ;
        )*
    ) => {
        /// Entry points of the currently bound OpenCL library.
        ///
        /// Each slot is named after the symbol it binds. A `Some` slot may be
        /// called with the signature its name implies; a `None` slot means the
        /// bound library does not export that symbol and must not be invoked.
        #[allow(non_snake_case)]
        #[derive(Clone, Copy)]
        pub struct ClApi {
            $(
                pub $fname: Option<unsafe extern "C" fn ( $( $pname : $pty ),* ) $( -> $rty )?>,
            )*
        }

        /// Symbol name of every [`ClApi`] slot, in slot order
        pub const API_NAMES: &[::const_cstr::ConstCStr] = &[
            $( ::const_cstr::ConstCStr { val: concat!(stringify!($fname), "\0") }, )*
        ];

        /// Number of slots in the entry point table
        pub const API_COUNT: usize = API_NAMES.len();

        impl ClApi {
            /// A table with every slot empty
            pub const UNBOUND: ClApi = ClApi {
                $( $fname: None, )*
            };

            /// Reset every slot to empty
            pub(crate) fn clear(&mut self) {
                *self = ClApi::UNBOUND;
            }

            /// Clear the table, then walk [`API_NAMES`] in slot order, binding
            /// every symbol the backend resolves in `library` and leaving the
            /// rest empty
            pub(crate) fn bind_all<B>(&mut self, backend: &B, library: &B::Library)
            where
                B: crate::backend::LibraryBackend,
            {
                self.clear();
                let mut names = API_NAMES.iter();
                $(
                    // names and slots expand from the same list, so the
                    // iterator cannot run dry
                    if let Some(name) = names.next() {
                        self.$fname = backend
                            .resolve(library, name.as_cstr())
                            .map(|addr| unsafe { ::std::mem::transmute(addr.as_ptr()) });
                    }
                )*
            }

            /// Get the untyped address bound at `index`, which parallels
            /// [`API_NAMES`], returning `None` for empty or out of range slots
            pub fn slot(&self, index: usize) -> Option<crate::backend::SymbolAddr> {
                let mut i = 0usize;
                $(
                    if i == index {
                        return self
                            .$fname
                            .and_then(|f| ::std::ptr::NonNull::new(f as *const () as *mut _));
                    }
                    i += 1;
                )*
                let _ = i;
                None
            }

            /// Check whether the entry point called `name` is bound
            pub fn is_bound(&self, name: &::std::ffi::CStr) -> bool {
                $(
                    if name.to_bytes() == stringify!($fname).as_bytes() {
                        return self.$fname.is_some();
                    }
                )*
                false
            }

            /// Number of bound slots
            pub fn resolved_count(&self) -> usize {
                0usize $( + self.$fname.is_some() as usize )*
            }
        }

        impl ::std::fmt::Debug for ClApi {
            fn fmt(&self, f: &mut ::std::fmt::Formatter) -> ::std::fmt::Result {
                f.debug_struct("ClApi")
                    $( .field(stringify!($fname), &self.$fname.map(|p| p as *const ())) )*
                    .finish()
            }
        }
    };
}
