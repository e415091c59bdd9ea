use super::{Library, NativeType, Value};
use crate::{log, Error, Result};
use libffi::{
	middle::{Arg, Cif, CodePtr},
	raw::{ffi_arg, ffi_sarg},
};
use serde::{Deserialize, Serialize};
use std::{ffi::c_void, marker::PhantomData};

/// Runtime description of an export's signature.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ForeignFunction {
	/// Export name when it differs from the key the function is bound under.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub name: Option<String>,
	#[serde(default)]
	pub parameters: Vec<NativeType>,
	#[serde(default = "void")]
	pub result: NativeType,
}

fn void() -> NativeType {
	NativeType::Void
}

impl ForeignFunction {
	pub fn new(parameters: Vec<NativeType>, result: NativeType) -> Self {
		Self { name: None, parameters, result }
	}

	/// The export to look up for a function bound under `key`.
	pub fn export_name<'a>(&'a self, key: &'a str) -> &'a str {
		self.name.as_deref().unwrap_or(key)
	}
}

/// A resolved export with a prepared libffi call interface.
///
/// Holds a raw code address and no lifetime; every public path that hands one out ties it to
/// the owning [`Library`].
pub(crate) struct Symbol {
	name: String,
	cif: Cif,
	ptr: CodePtr,
	parameter_types: Vec<NativeType>,
	result_type: NativeType,
}

impl Symbol {
	pub(crate) fn new(name: &str, ptr: *mut c_void, def: &ForeignFunction) -> Result<Self> {
		if let Some(index) = def.parameters.iter().position(|ty| *ty == NativeType::Void) {
			return Err(Error::VoidParameter { symbol: name.to_string(), index })
		}

		let cif = Cif::new(def.parameters.iter().map(NativeType::ffi_type), def.result.ffi_type());

		Ok(Self {
			name: name.to_string(),
			cif,
			ptr: CodePtr(ptr),
			parameter_types: def.parameters.clone(),
			result_type: def.result,
		})
	}

	pub(crate) fn name(&self) -> &str {
		&self.name
	}

	/// Index of the first `pointer` parameter. Such calls are only sound for addresses the
	/// export accepts, which cannot be checked.
	pub(crate) fn pointer_parameter(&self) -> Option<usize> {
		self.parameter_types.iter().position(|ty| *ty == NativeType::Pointer)
	}

	/// Calls the export, refusing signatures with `pointer` parameters.
	///
	/// # Safety
	///
	/// The owning library must still be loaded and the declared signature must match the
	/// export.
	pub(crate) unsafe fn call_checked(&self, args: &[Value]) -> Result<Value> {
		if let Some(index) = self.pointer_parameter() {
			return Err(Error::PointerArgument { symbol: self.name.clone(), index })
		}
		self.call(args)
	}

	fn check_args(&self, args: &[Value]) -> Result<()> {
		if args.len() != self.parameter_types.len() {
			return Err(Error::ArityMismatch {
				symbol: self.name.clone(),
				expected: self.parameter_types.len(),
				found: args.len(),
			})
		}

		for (index, (expected, arg)) in self.parameter_types.iter().zip(args).enumerate() {
			if arg.native_type() != *expected {
				return Err(Error::ArgumentMismatch {
					symbol: self.name.clone(),
					index,
					expected: *expected,
					found: arg.native_type(),
				})
			}
		}

		Ok(())
	}

	/// Calls the export with `args`.
	///
	/// # Safety
	///
	/// The owning library must still be loaded, the declared signature must match the export
	/// and every pointer argument must satisfy the export's preconditions. Only the arguments
	/// are checked against the declaration.
	pub(crate) unsafe fn call(&self, args: &[Value]) -> Result<Value> {
		self.check_args(args)?;

		let call_args: Vec<Arg> = args.iter().map(Value::as_arg).collect();
		log!(trace, "calling `{}` with {:?}", self.name, args);

		// Integer results narrower than a register come back widened to `ffi_arg`.
		let value = match self.result_type {
			NativeType::Void => {
				self.cif.call::<()>(self.ptr, &call_args);
				Value::Void
			},
			NativeType::Bool => Value::Bool(self.cif.call::<ffi_arg>(self.ptr, &call_args) as u8 != 0),
			NativeType::U8 => Value::U8(self.cif.call::<ffi_arg>(self.ptr, &call_args) as u8),
			NativeType::I8 => Value::I8(self.cif.call::<ffi_sarg>(self.ptr, &call_args) as i8),
			NativeType::U16 => Value::U16(self.cif.call::<ffi_arg>(self.ptr, &call_args) as u16),
			NativeType::I16 => Value::I16(self.cif.call::<ffi_sarg>(self.ptr, &call_args) as i16),
			NativeType::U32 => Value::U32(self.cif.call::<ffi_arg>(self.ptr, &call_args) as u32),
			NativeType::I32 => Value::I32(self.cif.call::<ffi_sarg>(self.ptr, &call_args) as i32),
			NativeType::U64 => Value::U64(self.cif.call::<u64>(self.ptr, &call_args)),
			NativeType::I64 => Value::I64(self.cif.call::<i64>(self.ptr, &call_args)),
			NativeType::USize => Value::USize(self.cif.call::<usize>(self.ptr, &call_args)),
			NativeType::ISize => Value::ISize(self.cif.call::<isize>(self.ptr, &call_args)),
			NativeType::F32 => Value::F32(self.cif.call::<f32>(self.ptr, &call_args)),
			NativeType::F64 => Value::F64(self.cif.call::<f64>(self.ptr, &call_args)),
			NativeType::Pointer =>
				Value::Pointer(self.cif.call::<*mut c_void>(self.ptr, &call_args) as usize),
		};

		Ok(value)
	}
}

// SAFETY: the call interface is immutable after construction and the code pointer is only
// read. Both stay valid while the owning library is loaded, which callers guarantee.
unsafe impl Send for Symbol {}
// SAFETY: see `Send`.
unsafe impl Sync for Symbol {}

/// A callable bound with a runtime signature, borrowed from its [`Library`].
pub struct DynamicCallable<'lib> {
	symbol: Symbol,
	_library: PhantomData<&'lib Library>,
}

impl<'lib> DynamicCallable<'lib> {
	pub(crate) fn new(symbol: Symbol) -> Self {
		Self { symbol, _library: PhantomData }
	}

	pub fn name(&self) -> &str {
		self.symbol.name()
	}

	pub fn parameters(&self) -> &[NativeType] {
		&self.symbol.parameter_types
	}

	pub fn result(&self) -> NativeType {
		self.symbol.result_type
	}

	/// Calls the export. Fails without calling when `args` does not match the declared
	/// parameters, or with [`Error::PointerArgument`] when the signature takes a pointer.
	pub fn call(&self, args: &[Value]) -> Result<Value> {
		// SAFETY: `'lib` keeps the library loaded; the signature was asserted by the caller of
		// `Library::resolve_dynamic`.
		unsafe { self.symbol.call_checked(args) }
	}

	/// Calls the export, including signatures with `pointer` parameters.
	///
	/// # Safety
	///
	/// Every pointer argument must be valid for whatever the export does with it.
	pub unsafe fn call_unchecked(&self, args: &[Value]) -> Result<Value> {
		self.symbol.call(args)
	}
}

impl std::fmt::Debug for DynamicCallable<'_> {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("DynamicCallable")
			.field("name", &self.symbol.name)
			.field("parameters", &self.symbol.parameter_types)
			.field("result", &self.symbol.result_type)
			.finish()
	}
}
