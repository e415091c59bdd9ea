/// A function pointer type an export can be bound to.
///
/// Implemented for `extern "C" fn` and `unsafe extern "C" fn` pointers taking up to eight
/// arguments. Arguments are passed as a tuple, so `extern "C" fn(i32, i32) -> i32` is called
/// with `(50, 120)` and a one-argument function with `(x,)`.
///
/// # Safety
///
/// Implementors must be plain function pointers: exactly the size of a data pointer and valid
/// to produce from a symbol address.
pub unsafe trait Signature: Copy + Send + Sync + 'static {
	type Args;
	type Output;

	/// Number of parameters in the signature.
	const ARITY: usize;

	/// # Safety
	///
	/// The preconditions of the bound function must hold for `args`.
	unsafe fn invoke_unchecked(self, args: Self::Args) -> Self::Output;
}

/// A [`Signature`] declared as safe to call with any argument values.
///
/// Only `extern "C" fn` pointers implement it. Exports with preconditions, such as functions
/// dereferencing a pointer argument, are bound as `unsafe extern "C" fn` instead.
pub trait SafeSignature: Signature {
	fn invoke(self, args: Self::Args) -> Self::Output;
}

macro_rules! count {
	() => { 0 };
	($head:ident $($tail:ident)*) => { 1 + count!($($tail)*) };
}

macro_rules! impl_signature {
	($($arg:ident: $ty:ident),*) => {
		unsafe impl<R: 'static, $($ty: 'static),*> Signature for extern "C" fn($($ty),*) -> R {
			type Args = ($($ty,)*);
			type Output = R;

			const ARITY: usize = count!($($ty)*);

			#[inline]
			unsafe fn invoke_unchecked(self, ($($arg,)*): Self::Args) -> R {
				self($($arg),*)
			}
		}

		impl<R: 'static, $($ty: 'static),*> SafeSignature for extern "C" fn($($ty),*) -> R {
			#[inline]
			fn invoke(self, ($($arg,)*): Self::Args) -> R {
				self($($arg),*)
			}
		}

		unsafe impl<R: 'static, $($ty: 'static),*> Signature for unsafe extern "C" fn($($ty),*) -> R {
			type Args = ($($ty,)*);
			type Output = R;

			const ARITY: usize = count!($($ty)*);

			#[inline]
			unsafe fn invoke_unchecked(self, ($($arg,)*): Self::Args) -> R {
				self($($arg),*)
			}
		}
	};
}

impl_signature!();
impl_signature!(a: A);
impl_signature!(a: A, b: B);
impl_signature!(a: A, b: B, c: C);
impl_signature!(a: A, b: B, c: C, d: D);
impl_signature!(a: A, b: B, c: C, d: D, e: E);
impl_signature!(a: A, b: B, c: C, d: D, e: E, f: F);
impl_signature!(a: A, b: B, c: C, d: D, e: E, f: F, g: G);
impl_signature!(a: A, b: B, c: C, d: D, e: E, f: F, g: G, h: H);

#[cfg(test)]
mod tests {
	use super::*;

	extern "C" fn add(a: i32, b: i32) -> i32 {
		a + b
	}

	extern "C" fn answer() -> u16 {
		42
	}

	extern "C" fn mix(a: u8, b: f64, c: i64) -> f64 {
		a as f64 + b + c as f64
	}

	unsafe extern "C" fn store(target: *mut i32, value: i32) {
		*target = value;
	}

	#[test]
	fn invoke_spreads_tuple_arguments() {
		let f: extern "C" fn(i32, i32) -> i32 = add;
		assert_eq!(f.invoke((50, 120)), 170);

		let f: extern "C" fn() -> u16 = answer;
		assert_eq!(f.invoke(()), 42);

		let f: extern "C" fn(u8, f64, i64) -> f64 = mix;
		assert_eq!(f.invoke((1, 0.5, -3)), -1.5);
	}

	#[test]
	fn unsafe_functions_are_invoked_unchecked() {
		let f: unsafe extern "C" fn(*mut i32, i32) = store;
		let mut target = 1;

		unsafe { f.invoke_unchecked((&mut target as *mut i32, 25)) };
		assert_eq!(target, 25);
	}

	#[test]
	fn arity() {
		assert_eq!(<extern "C" fn() -> u16 as Signature>::ARITY, 0);
		assert_eq!(<extern "C" fn(i32, i32) -> i32 as Signature>::ARITY, 2);
		assert_eq!(<unsafe extern "C" fn(*mut i32, i32) as Signature>::ARITY, 2);
		assert_eq!(<extern "C" fn(u8, f64, i64) -> f64 as Signature>::ARITY, 3);
	}
}
