use crate::{ffi::Symbol, log, Error, ForeignFunction, Library, Result, Value};
use serde::{Deserialize, Serialize};
use std::{
	collections::{BTreeMap, HashMap},
	fs,
	path::Path,
	str::FromStr,
};

/// Describes a library and the functions to bind from it.
///
/// ```json
/// {
///   "library": "libm.so.6",
///   "symbols": {
///     "cos": { "parameters": ["f64"], "result": "f64" },
///     "absolute": { "name": "abs", "parameters": ["i32"], "result": "i32" }
///   }
/// }
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Manifest {
	pub library: String,
	#[serde(default)]
	pub symbols: BTreeMap<String, ForeignFunction>,
}

impl Manifest {
	pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
		fs::read_to_string(path)?.parse()
	}
}

impl FromStr for Manifest {
	type Err = Error;

	fn from_str(s: &str) -> Result<Self> {
		Ok(serde_json::from_str(s)?)
	}
}

/// A library together with every function of a [`Manifest`], resolved up front.
///
/// The symbols are owned next to the library and dropped before it, so they never outlive the
/// mapping they point into.
pub struct BoundLibrary {
	symbols: HashMap<String, (ForeignFunction, Symbol)>,
	library: Library,
}

impl BoundLibrary {
	/// Loads `manifest.library` and resolves all of its symbols. Fails on the first symbol
	/// that cannot be resolved.
	///
	/// # Safety
	///
	/// Every signature in the manifest must match its export, and each export must be sound for
	/// every value of its non-pointer parameter types. See [`Library::resolve_dynamic`].
	pub unsafe fn bind(manifest: &Manifest) -> Result<Self> {
		Self::bind_library(Library::open(&manifest.library)?, &manifest.symbols)
	}

	/// Resolves `symbols` from an already loaded library.
	///
	/// # Safety
	///
	/// Same contract as [`BoundLibrary::bind`].
	pub unsafe fn bind_library(
		library: Library,
		symbols: &BTreeMap<String, ForeignFunction>,
	) -> Result<Self> {
		let symbols = symbols
			.iter()
			.map(|(key, def)| Ok((key.clone(), (def.clone(), library.symbol(key, def)?))))
			.collect::<Result<HashMap<_, _>>>()?;

		log!(debug, "Bound {} symbol(s) from `{}`", symbols.len(), library.name());

		Ok(Self { symbols, library })
	}

	/// Calls the function bound under `key`. Functions taking a `pointer` fail with
	/// [`Error::PointerArgument`]; use [`BoundLibrary::call_unchecked`] for them.
	pub fn call(&self, key: &str, args: &[Value]) -> Result<Value> {
		// SAFETY: the library is owned by `self`; the signature was asserted in `bind`.
		unsafe { self.symbol(key)?.call_checked(args) }
	}

	/// Calls the function bound under `key`, including functions taking pointers.
	///
	/// # Safety
	///
	/// Every pointer argument must be valid for whatever the export does with it.
	pub unsafe fn call_unchecked(&self, key: &str, args: &[Value]) -> Result<Value> {
		self.symbol(key)?.call(args)
	}

	fn symbol(&self, key: &str) -> Result<&Symbol> {
		self.symbols.get(key).map(|(_, symbol)| symbol).ok_or_else(|| Error::SymbolNotFound {
			library: self.library.name().to_string(),
			symbol: key.to_string(),
		})
	}

	/// The signature `key` was bound with.
	pub fn get(&self, key: &str) -> Option<&ForeignFunction> {
		self.symbols.get(key).map(|(def, _)| def)
	}

	pub fn symbols(&self) -> impl Iterator<Item = &str> {
		self.symbols.keys().map(String::as_str)
	}

	pub fn library(&self) -> &Library {
		&self.library
	}

	/// Drops every bound symbol, then unloads the library.
	pub fn close(self) {
		drop(self)
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::NativeType;

	const MANIFEST: &str = r#"{
		"library": "libm.so.6",
		"symbols": {
			"cos": { "parameters": ["f64"], "result": "f64" },
			"absolute": { "name": "abs", "parameters": ["i32"], "result": "i32" },
			"tick": {}
		}
	}"#;

	#[test]
	fn parse_manifest() {
		let manifest: Manifest = MANIFEST.parse().unwrap();

		assert_eq!(manifest.library, "libm.so.6");
		assert_eq!(manifest.symbols.len(), 3);

		let absolute = &manifest.symbols["absolute"];
		assert_eq!(absolute.export_name("absolute"), "abs");
		assert_eq!(absolute.parameters, vec![NativeType::I32]);
		assert_eq!(manifest.symbols["tick"].result, NativeType::Void);
	}

	#[test]
	fn reject_malformed_manifest() {
		assert!(matches!("{}".parse::<Manifest>(), Err(Error::Manifest(_))));
		assert!(matches!(
			r#"{ "library": "x", "symbols": { "f": { "result": "int" } } }"#.parse::<Manifest>(),
			Err(Error::Manifest(_))
		));
	}

	#[test]
	fn manifest_from_missing_file() {
		assert!(matches!(Manifest::from_path("/nonexistent/symbind.json"), Err(Error::Io(_))));
	}

	#[test]
	fn bind_missing_library() {
		let manifest: Manifest =
			r#"{ "library": "./libsymbind-missing.so", "symbols": {} }"#.parse().unwrap();
		let err = unsafe { BoundLibrary::bind(&manifest) }.err().unwrap();
		assert!(matches!(err, Error::Load { .. }));
	}
}
