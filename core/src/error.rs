use crate::{LibraryRid, NativeType};
use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

/// Failures reported by the invoker.
///
/// Calling through a stale or mis-typed handle is not represented here: it cannot be detected
/// at run time and is either prevented by ownership or undefined behaviour.
#[derive(Debug, Error)]
pub enum Error {
	/// The library could not be located or mapped into the process.
	#[error("unable to load library `{library}`: {reason}")]
	Load { library: String, reason: String },

	/// The library is loaded but does not export the requested name.
	#[error("symbol `{symbol}` not found in `{library}`")]
	SymbolNotFound { library: String, symbol: String },

	#[error("invalid symbol name {0:?}")]
	InvalidSymbolName(String),

	#[error("`{symbol}` expects {expected} argument(s), got {found}")]
	ArityMismatch { symbol: String, expected: usize, found: usize },

	#[error("argument {index} of `{symbol}` expects `{expected}`, got `{found}`")]
	ArgumentMismatch { symbol: String, index: usize, expected: NativeType, found: NativeType },

	/// A checked call was attempted on a signature with a `pointer` parameter.
	#[error("parameter {index} of `{symbol}` is a pointer; the call must be made unchecked")]
	PointerArgument { symbol: String, index: usize },

	#[error("parameter {index} of `{symbol}` is declared as `void`")]
	VoidParameter { symbol: String, index: usize },

	#[error("unable to parse `{value}` as `{native_type}`")]
	InvalidValue { value: String, native_type: NativeType },

	#[error("no library registered with rid {0}")]
	UnknownLibrary(LibraryRid),

	#[error("invalid manifest: {0}")]
	Manifest(#[from] serde_json::Error),

	#[error(transparent)]
	Io(#[from] std::io::Error),
}

impl Error {
	/// Whether this is one of the lookup failures (`Load` or `SymbolNotFound`) a caller is
	/// expected to report and recover from.
	pub fn is_lookup(&self) -> bool {
		matches!(self, Error::Load { .. } | Error::SymbolNotFound { .. })
	}
}
