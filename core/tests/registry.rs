use std::collections::BTreeMap;
use symbind_core::{BoundLibrary, Error, ForeignFunction, Library, Manifest, NativeType, Registry, Value};

mod common;

#[test]
fn scoped_library_is_unloaded_on_success() {
	let registry = Registry::new();

	let sum = registry
		.with_library(common::fixture(), |library| {
			let add = unsafe { library.resolve::<extern "C" fn(i32, i32) -> i32>("add")? };
			Ok(add.call((50, 120)))
		})
		.unwrap();

	assert_eq!(sum, 170);
	assert!(registry.is_empty());
}

#[test]
fn scoped_library_is_unloaded_on_error() {
	let registry = Registry::new();

	let err = registry
		.with_library(common::fixture(), |library| {
			unsafe { library.resolve::<extern "C" fn()>("doesNotExist")? };
			Ok(())
		})
		.unwrap_err();

	assert!(matches!(err, Error::SymbolNotFound { .. }));
	assert!(registry.is_empty());
}

#[test]
fn registry_hands_out_shared_libraries() {
	let registry = Registry::new();
	let rid = registry.load(common::fixture()).unwrap();

	let library = registry.get(rid).unwrap();
	registry.unload(rid).unwrap();

	// The registry's reference is gone, ours keeps the mapping alive.
	let add = unsafe { library.resolve::<extern "C" fn(i32, i32) -> i32>("add") }.unwrap();
	assert_eq!(add.call((1, 1)), 2);
}

#[test]
fn global_registry_is_shared() {
	let rid = Registry::global().load(common::fixture()).unwrap();
	assert!(Registry::global().get(rid).is_ok());
	Registry::global().unload(rid).unwrap();
	assert!(matches!(Registry::global().get(rid), Err(Error::UnknownLibrary(_))));
}

#[test]
fn bind_manifest_and_call() {
	let manifest: Manifest = format!(
		r#"{{
			"library": {},
			"symbols": {{
				"add": {{ "parameters": ["i32", "i32"], "result": "i32" }},
				"double": {{ "name": "scale", "parameters": ["f64", "f64"], "result": "f64" }},
				"answer": {{ "result": "u16" }}
			}}
		}}"#,
		serde_json::to_string(&common::fixture().to_string_lossy()).unwrap()
	)
	.parse()
	.unwrap();

	let bound = unsafe { BoundLibrary::bind(&manifest) }.unwrap();

	assert_eq!(bound.call("add", &[Value::I32(50), Value::I32(120)]).unwrap(), Value::I32(170));
	assert_eq!(bound.call("double", &[Value::F64(2.5), Value::F64(2.0)]).unwrap(), Value::F64(5.0));
	assert_eq!(bound.call("answer", &[]).unwrap(), Value::U16(42));
	assert_eq!(bound.get("double").unwrap().export_name("double"), "scale");

	let mut keys: Vec<_> = bound.symbols().collect();
	keys.sort_unstable();
	assert_eq!(keys, vec!["add", "answer", "double"]);

	assert!(matches!(bound.call("doesNotExist", &[]), Err(Error::SymbolNotFound { .. })));
	bound.close();
}

#[test]
fn bound_pointer_functions_need_unchecked_call() {
	let library = Library::open(common::fixture()).unwrap();
	let mut symbols = BTreeMap::new();
	symbols.insert(
		"store".to_string(),
		ForeignFunction::new(vec![NativeType::Pointer, NativeType::I32], NativeType::Void),
	);
	let bound = unsafe { BoundLibrary::bind_library(library, &symbols) }.unwrap();

	let err = bound.call("store", &[Value::Pointer(0), Value::I32(25)]).unwrap_err();
	assert!(matches!(err, Error::PointerArgument { index: 0, .. }));

	let mut target = 5;
	let address = &mut target as *mut i32 as usize;
	unsafe { bound.call_unchecked("store", &[Value::Pointer(address), Value::I32(25)]) }.unwrap();
	assert_eq!(target, 25);
}

#[test]
fn binding_fails_when_any_symbol_is_missing() {
	let library = Library::open(common::fixture()).unwrap();
	let mut symbols = BTreeMap::new();
	symbols.insert("add".to_string(), ForeignFunction::new(vec![NativeType::I32; 2], NativeType::I32));
	symbols.insert("doesNotExist".to_string(), ForeignFunction::new(vec![], NativeType::Void));

	let err = unsafe { BoundLibrary::bind_library(library, &symbols) }.err().unwrap();
	assert!(matches!(err, Error::SymbolNotFound { ref symbol, .. } if symbol == "doesNotExist"));
}
