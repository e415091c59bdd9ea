use super::{
	error::format_load_error, DynamicCallable, ForeignFunction, SafeSignature, Signature, Symbol,
};
use crate::{log, Error, Result};
use std::{
	ffi::{c_void, OsStr},
	fmt,
	marker::PhantomData,
};

/// An owned handle to a shared library mapped into the process.
///
/// The mapping is released exactly once, when the handle is closed or dropped. Every callable
/// resolved from a library borrows it, so the library cannot be released while one of them is
/// still reachable:
///
/// ```compile_fail
/// use symbind_core::Library;
///
/// let library = Library::open("libarith.so").unwrap();
/// let add = unsafe { library.resolve::<extern "C" fn(i32, i32) -> i32>("add").unwrap() };
/// library.close();
/// add.call((50, 120));
/// ```
pub struct Library {
	name: String,
	raw: dlopen::raw::Library,
}

impl Drop for Library {
	fn drop(&mut self) {
		log!(trace, "Drop `Library` {}", self.name);
	}
}

impl fmt::Debug for Library {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("Library").field("name", &self.name).finish_non_exhaustive()
	}
}

impl Library {
	/// Loads the library named by `path`.
	///
	/// `path` is handed to the platform loader as-is: a bare file name goes through the regular
	/// search path, anything containing a separator is opened directly. An empty identifier is
	/// rejected: some loaders resolve it to the main program. Use [`Library::open_self`] for that.
	pub fn open<P: AsRef<OsStr>>(path: P) -> Result<Self> {
		let name = path.as_ref().to_string_lossy().into_owned();
		if name.trim().is_empty() {
			return Err(Error::Load { library: name, reason: "empty library identifier".to_string() })
		}
		log!(debug, "Loading library `{}`", name);

		let raw = dlopen::raw::Library::open(path.as_ref()).map_err(|e| Error::Load {
			reason: format_load_error(e, &name),
			library: name.clone(),
		})?;

		Ok(Self { name, raw })
	}

	/// Opens the image of the running process, so its exported symbols and those of the
	/// libraries it already links against can be resolved.
	pub fn open_self() -> Result<Self> {
		let name = "<self>".to_string();
		log!(debug, "Loading process image");

		let raw = dlopen::raw::Library::open_self().map_err(|e| Error::Load {
			reason: format_load_error(e, &name),
			library: name.clone(),
		})?;

		Ok(Self { name, raw })
	}

	pub fn name(&self) -> &str {
		&self.name
	}

	/// Whether the library exports `symbol`. Only the address is looked up.
	pub fn contains(&self, symbol: &str) -> bool {
		self.address(symbol).is_ok()
	}

	/// Binds the export `symbol` to the signature `S`.
	///
	/// # Safety
	///
	/// `S` must match the calling convention, parameter list and return type the export was
	/// compiled with. The loader only knows the address, so a mismatch is not detected here and
	/// calling the result is undefined behaviour.
	///
	/// When `S` is a safe `extern "C" fn`, the export must also be sound for every value of its
	/// parameter types, raw pointers included. Exports with preconditions are bound as
	/// `unsafe extern "C" fn` and called through [`Callable::call_unchecked`].
	pub unsafe fn resolve<S: Signature>(&self, symbol: &str) -> Result<Callable<'_, S>> {
		let address = self.address(symbol)?;
		log!(debug, "Resolved `{}` in `{}` at {:p}", symbol, self.name, address);

		// SAFETY: `Signature` is only implemented for function pointers, which have the size
		// of a data pointer.
		let func = std::mem::transmute_copy::<*mut c_void, S>(&address);

		Ok(Callable { name: symbol.to_string(), func, _library: PhantomData })
	}

	/// Binds `key` using a signature described at run time. The export looked up is
	/// `def.name` when set, `key` otherwise.
	///
	/// # Safety
	///
	/// As for [`Library::resolve`]: `def` must describe the export exactly. Beyond that, the
	/// export must be sound for every value of its non-pointer parameter types. Signatures with
	/// `pointer` parameters can only be called through [`DynamicCallable::call_unchecked`].
	pub unsafe fn resolve_dynamic(
		&self,
		key: &str,
		def: &ForeignFunction,
	) -> Result<DynamicCallable<'_>> {
		Ok(DynamicCallable::new(self.symbol(key, def)?))
	}

	pub(crate) fn symbol(&self, key: &str, def: &ForeignFunction) -> Result<Symbol> {
		let export = def.export_name(key);
		let address = self.address(export)?;
		log!(debug, "Resolved `{}` ({}) in `{}` at {:p}", key, export, self.name, address);

		Symbol::new(key, address, def)
	}

	/// Unloads the library.
	pub fn close(self) {
		drop(self)
	}

	fn address(&self, symbol: &str) -> Result<*mut c_void> {
		if symbol.is_empty() || symbol.contains('\0') {
			return Err(Error::InvalidSymbolName(symbol.to_string()))
		}

		// SAFETY: the address is only read back as a pointer; nothing is dereferenced.
		unsafe { self.raw.symbol::<*mut c_void>(symbol) }.map_err(|e| {
			log!(debug, "Lookup of `{}` in `{}` failed: {}", symbol, self.name, e);
			Error::SymbolNotFound { library: self.name.clone(), symbol: symbol.to_string() }
		})
	}
}

/// An export bound to a static signature.
///
/// Only produced by [`Library::resolve`], and only usable while the library it came from is
/// loaded. The raw function pointer is never handed out.
pub struct Callable<'lib, S: Signature> {
	name: String,
	func: S,
	_library: PhantomData<&'lib Library>,
}

impl<'lib, S: SafeSignature> Callable<'lib, S> {
	/// Calls the export with `args` given as a tuple.
	#[inline]
	pub fn call(&self, args: S::Args) -> S::Output {
		self.func.invoke(args)
	}
}

impl<'lib, S: Signature> Callable<'lib, S> {
	/// Calls an export bound as `unsafe extern "C" fn`.
	///
	/// # Safety
	///
	/// The preconditions of the export must hold for `args`.
	#[inline]
	pub unsafe fn call_unchecked(&self, args: S::Args) -> S::Output {
		self.func.invoke_unchecked(args)
	}

	pub fn name(&self) -> &str {
		&self.name
	}
}

impl<S: Signature> fmt::Debug for Callable<'_, S> {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("Callable")
			.field("name", &self.name)
			.field("signature", &std::any::type_name::<S>())
			.finish()
	}
}
