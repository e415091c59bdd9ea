//! Compiled as a `cdylib` by the integration tests and also included into them as a module,
//! so results through the loader can be compared with direct calls.

#![allow(dead_code)]

#[no_mangle]
pub extern "C" fn add(a: i32, b: i32) -> i32 {
	a.wrapping_add(b)
}

#[no_mangle]
pub extern "C" fn scale(value: f64, factor: f64) -> f64 {
	value * factor
}

#[no_mangle]
pub extern "C" fn negate(value: i8) -> i8 {
	value.wrapping_neg()
}

#[no_mangle]
pub extern "C" fn is_even(value: u64) -> bool {
	value % 2 == 0
}

#[no_mangle]
pub extern "C" fn answer() -> u16 {
	42
}

/// Stores `value` behind `target`.
///
/// # Safety
///
/// `target` must be valid for writes.
#[no_mangle]
pub unsafe extern "C" fn store(target: *mut i32, value: i32) {
	*target = value;
}
