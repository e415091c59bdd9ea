/* -------------------------------------------------------- *\
 *                                                          *
 *  This file is licensed as MIT. See LICENSE for details.  *
 *                                                          *
\* ---------------------------------------------------------*/

//! `symbind_core` loads shared libraries at run time and calls their exported functions through
//! handles that carry a caller-declared signature.
//!
//! Two ways of binding a symbol are provided:
//!
//! - **Static signatures**: [`Library::resolve`] binds an export to an `extern "C" fn` pointer
//!   type. The returned [`Callable`] borrows the [`Library`], so the borrow checker rejects any
//!   attempt to unload the library while the callable is still reachable.
//!
//! - **Runtime signatures**: [`Library::resolve_dynamic`] and [`BoundLibrary`] take a
//!   [`ForeignFunction`] description (usually read from a JSON [`Manifest`]) and perform the call
//!   through libffi with [`Value`] arguments.
//!
//! In both cases the signature is an assertion made by the caller. Nothing in a shared library
//! records the parameter or return types of its exports, so a mismatch cannot be detected and
//! calling through a mis-typed handle is undefined behaviour. This is why resolution is `unsafe`.
//!
//! # Example
//! ```no_run
//! use symbind_core::Library;
//!
//! # fn main() -> symbind_core::Result<()> {
//! let library = Library::open("libarith.so")?;
//! // SAFETY: `add` is exported as `extern "C" fn(i32, i32) -> i32`.
//! let add = unsafe { library.resolve::<extern "C" fn(i32, i32) -> i32>("add")? };
//! assert_eq!(add.call((50, 120)), 170);
//! # Ok(())
//! # }
//! ```

pub use crate::{
	error::{Error, Result},
	ffi::{
		Callable, DynamicCallable, ForeignFunction, Library, NativeType, SafeSignature, Signature,
		UnknownNativeType, Value,
	},
	manifest::{BoundLibrary, Manifest},
	registry::{LibraryRid, Registry},
};

mod error;
mod ffi;
mod manifest;
mod registry;

#[macro_export]
macro_rules! log {
	($level:tt, $patter:expr $(, $values:expr)* $(,)?) => {
		log::$level!(
			target: "symbind::core",
			$patter $(, $values)*
		)
	};
}
