use crate::{Error, Result};
use libffi::middle::{Arg, Type};
use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};

/// Scalar types a runtime-declared signature can name.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NativeType {
	Void,
	Bool,
	U8,
	I8,
	U16,
	I16,
	U32,
	I32,
	U64,
	I64,
	USize,
	ISize,
	F32,
	F64,
	Pointer,
}

impl NativeType {
	pub fn as_str(&self) -> &'static str {
		match self {
			NativeType::Void => "void",
			NativeType::Bool => "bool",
			NativeType::U8 => "u8",
			NativeType::I8 => "i8",
			NativeType::U16 => "u16",
			NativeType::I16 => "i16",
			NativeType::U32 => "u32",
			NativeType::I32 => "i32",
			NativeType::U64 => "u64",
			NativeType::I64 => "i64",
			NativeType::USize => "usize",
			NativeType::ISize => "isize",
			NativeType::F32 => "f32",
			NativeType::F64 => "f64",
			NativeType::Pointer => "pointer",
		}
	}

	pub(crate) fn ffi_type(&self) -> Type {
		match self {
			NativeType::Void => Type::void(),
			NativeType::Bool | NativeType::U8 => Type::u8(),
			NativeType::I8 => Type::i8(),
			NativeType::U16 => Type::u16(),
			NativeType::I16 => Type::i16(),
			NativeType::U32 => Type::u32(),
			NativeType::I32 => Type::i32(),
			NativeType::U64 => Type::u64(),
			NativeType::I64 => Type::i64(),
			NativeType::USize => Type::usize(),
			NativeType::ISize => Type::isize(),
			NativeType::F32 => Type::f32(),
			NativeType::F64 => Type::f64(),
			NativeType::Pointer => Type::pointer(),
		}
	}
}

impl fmt::Display for NativeType {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

#[derive(Debug, PartialEq, Eq)]
pub struct UnknownNativeType(pub String);

impl fmt::Display for UnknownNativeType {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "unknown native type `{}`", self.0)
	}
}

impl std::error::Error for UnknownNativeType {}

impl FromStr for NativeType {
	type Err = UnknownNativeType;

	fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
		Ok(match s.trim().to_ascii_lowercase().as_str() {
			"void" => NativeType::Void,
			"bool" => NativeType::Bool,
			"u8" => NativeType::U8,
			"i8" => NativeType::I8,
			"u16" => NativeType::U16,
			"i16" => NativeType::I16,
			"u32" => NativeType::U32,
			"i32" => NativeType::I32,
			"u64" => NativeType::U64,
			"i64" => NativeType::I64,
			"usize" => NativeType::USize,
			"isize" => NativeType::ISize,
			"f32" => NativeType::F32,
			"f64" => NativeType::F64,
			"pointer" | "ptr" => NativeType::Pointer,
			_ => return Err(UnknownNativeType(s.to_string())),
		})
	}
}

/// A typed argument or return value of a runtime-declared call.
///
/// Pointers travel as plain addresses; the invoker never dereferences them.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Value {
	Void,
	Bool(bool),
	U8(u8),
	I8(i8),
	U16(u16),
	I16(i16),
	U32(u32),
	I32(i32),
	U64(u64),
	I64(i64),
	USize(usize),
	ISize(isize),
	F32(f32),
	F64(f64),
	Pointer(usize),
}

impl Value {
	pub fn native_type(&self) -> NativeType {
		match self {
			Value::Void => NativeType::Void,
			Value::Bool(_) => NativeType::Bool,
			Value::U8(_) => NativeType::U8,
			Value::I8(_) => NativeType::I8,
			Value::U16(_) => NativeType::U16,
			Value::I16(_) => NativeType::I16,
			Value::U32(_) => NativeType::U32,
			Value::I32(_) => NativeType::I32,
			Value::U64(_) => NativeType::U64,
			Value::I64(_) => NativeType::I64,
			Value::USize(_) => NativeType::USize,
			Value::ISize(_) => NativeType::ISize,
			Value::F32(_) => NativeType::F32,
			Value::F64(_) => NativeType::F64,
			Value::Pointer(_) => NativeType::Pointer,
		}
	}

	/// Parses `raw` as a value of `native_type`.
	///
	/// Integers and pointers accept a `0x` prefix for hexadecimal input, optionally preceded by
	/// a sign (`-0x5`). Unsigned hex digits fill a signed type as two's complement, so `0xff`
	/// is `-1` as an `i8`.
	pub fn parse(native_type: NativeType, raw: &str) -> Result<Self> {
		let invalid = || Error::InvalidValue { value: raw.to_string(), native_type };
		let text = raw.trim();

		let (negative, unsigned) = match text.strip_prefix('-') {
			Some(rest) => (true, rest),
			None => (false, text.strip_prefix('+').unwrap_or(text)),
		};
		let hex = unsigned
			.strip_prefix("0x")
			.or_else(|| unsigned.strip_prefix("0X"))
			.filter(|digits| !digits.starts_with(['+', '-']))
			.map(|digits| {
				let magnitude = i128::from_str_radix(digits, 16).map_err(|_| invalid())?;
				Ok::<_, Error>(if negative { -magnitude } else { magnitude })
			})
			.transpose()?;

		macro_rules! int {
			($ty:ty) => {
				match hex {
					Some(n) => <$ty>::try_from(n).map_err(|_| invalid())?,
					None => text.parse::<$ty>().map_err(|_| invalid())?,
				}
			};
			($ty:ty, $unsigned:ty) => {
				match hex {
					Some(n) if n >= 0 => <$unsigned>::try_from(n).map_err(|_| invalid())? as $ty,
					Some(n) => <$ty>::try_from(n).map_err(|_| invalid())?,
					None => text.parse::<$ty>().map_err(|_| invalid())?,
				}
			};
		}

		Ok(match native_type {
			NativeType::Void => return Err(invalid()),
			NativeType::Bool => match text {
				"true" | "1" => Value::Bool(true),
				"false" | "0" => Value::Bool(false),
				_ => return Err(invalid()),
			},
			NativeType::U8 => Value::U8(int!(u8)),
			NativeType::I8 => Value::I8(int!(i8, u8)),
			NativeType::U16 => Value::U16(int!(u16)),
			NativeType::I16 => Value::I16(int!(i16, u16)),
			NativeType::U32 => Value::U32(int!(u32)),
			NativeType::I32 => Value::I32(int!(i32, u32)),
			NativeType::U64 => Value::U64(int!(u64)),
			NativeType::I64 => Value::I64(int!(i64, u64)),
			NativeType::USize => Value::USize(int!(usize)),
			NativeType::ISize => Value::ISize(int!(isize, usize)),
			NativeType::F32 => Value::F32(text.parse().map_err(|_| invalid())?),
			NativeType::F64 => Value::F64(text.parse().map_err(|_| invalid())?),
			NativeType::Pointer => match text {
				"null" => Value::Pointer(0),
				_ => Value::Pointer(int!(usize)),
			},
		})
	}

	/// Borrow the value as a libffi argument. `Void` has no representation and must be rejected
	/// before reaching this point.
	pub(crate) fn as_arg(&self) -> Arg {
		match self {
			Value::Void => unreachable!("void arguments are rejected by signature checks"),
			Value::Bool(value) => Arg::new(value),
			Value::U8(value) => Arg::new(value),
			Value::I8(value) => Arg::new(value),
			Value::U16(value) => Arg::new(value),
			Value::I16(value) => Arg::new(value),
			Value::U32(value) => Arg::new(value),
			Value::I32(value) => Arg::new(value),
			Value::U64(value) => Arg::new(value),
			Value::I64(value) => Arg::new(value),
			Value::USize(value) => Arg::new(value),
			Value::ISize(value) => Arg::new(value),
			Value::F32(value) => Arg::new(value),
			Value::F64(value) => Arg::new(value),
			Value::Pointer(address) => Arg::new(address),
		}
	}
}

impl fmt::Display for Value {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Value::Void => f.write_str("void"),
			Value::Bool(value) => write!(f, "{value}"),
			Value::U8(value) => write!(f, "{value}"),
			Value::I8(value) => write!(f, "{value}"),
			Value::U16(value) => write!(f, "{value}"),
			Value::I16(value) => write!(f, "{value}"),
			Value::U32(value) => write!(f, "{value}"),
			Value::I32(value) => write!(f, "{value}"),
			Value::U64(value) => write!(f, "{value}"),
			Value::I64(value) => write!(f, "{value}"),
			Value::USize(value) => write!(f, "{value}"),
			Value::ISize(value) => write!(f, "{value}"),
			Value::F32(value) => write!(f, "{value}"),
			Value::F64(value) => write!(f, "{value}"),
			Value::Pointer(address) => write!(f, "{address:#x}"),
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn native_type_names() {
		assert_eq!("i32".parse::<NativeType>(), Ok(NativeType::I32));
		assert_eq!(" USIZE ".parse::<NativeType>(), Ok(NativeType::USize));
		assert_eq!("ptr".parse::<NativeType>(), Ok(NativeType::Pointer));
		assert_eq!("int".parse::<NativeType>(), Err(UnknownNativeType("int".into())));
		assert_eq!(NativeType::ISize.to_string(), "isize");
	}

	#[test]
	fn native_type_serde_is_lowercase() {
		let types: Vec<NativeType> =
			serde_json::from_str(r#"["i32", "usize", "pointer", "void"]"#).unwrap();
		assert_eq!(
			types,
			vec![NativeType::I32, NativeType::USize, NativeType::Pointer, NativeType::Void]
		);
		assert_eq!(serde_json::to_string(&NativeType::F64).unwrap(), r#""f64""#);
	}

	#[test]
	fn parse_values() {
		assert_eq!(Value::parse(NativeType::I32, "-50").unwrap(), Value::I32(-50));
		assert_eq!(Value::parse(NativeType::U8, "0xff").unwrap(), Value::U8(255));
		assert_eq!(Value::parse(NativeType::Bool, "1").unwrap(), Value::Bool(true));
		assert_eq!(Value::parse(NativeType::F64, "2.5").unwrap(), Value::F64(2.5));
		assert_eq!(Value::parse(NativeType::Pointer, "null").unwrap(), Value::Pointer(0));
	}

	#[test]
	fn parse_rejects_out_of_range_and_void() {
		assert!(matches!(
			Value::parse(NativeType::U8, "256"),
			Err(Error::InvalidValue { native_type: NativeType::U8, .. })
		));
		assert!(matches!(Value::parse(NativeType::Void, ""), Err(Error::InvalidValue { .. })));
		assert!(matches!(Value::parse(NativeType::Bool, "yes"), Err(Error::InvalidValue { .. })));
	}

	#[test]
	fn parse_signed_hex() {
		assert_eq!(Value::parse(NativeType::I32, "-0x5").unwrap(), Value::I32(-5));
		assert_eq!(Value::parse(NativeType::I32, "+0x10").unwrap(), Value::I32(16));
		assert_eq!(Value::parse(NativeType::I8, "0xff").unwrap(), Value::I8(-1));
		assert_eq!(Value::parse(NativeType::I8, "-0x80").unwrap(), Value::I8(i8::MIN));
		assert_eq!(Value::parse(NativeType::I64, "0xffffffffffffffff").unwrap(), Value::I64(-1));
		assert_eq!(Value::parse(NativeType::Pointer, "0x1000").unwrap(), Value::Pointer(0x1000));

		for (native_type, raw) in [
			(NativeType::U8, "-0x5"),
			(NativeType::I8, "-0x81"),
			(NativeType::I8, "0x100"),
			(NativeType::I32, "0x-5"),
			(NativeType::I32, "--0x5"),
			(NativeType::Pointer, "-0x1"),
		] {
			assert!(
				matches!(Value::parse(native_type, raw), Err(Error::InvalidValue { .. })),
				"{raw} should not parse as {native_type}"
			);
		}
	}

	#[test]
	fn display_matches_native_text() {
		assert_eq!(Value::I32(170).to_string(), "170");
		assert_eq!(Value::Pointer(0x1000).to_string(), "0x1000");
		assert_eq!(Value::Void.to_string(), "void");
		assert_eq!(Value::U16(7).native_type(), NativeType::U16);
	}
}
