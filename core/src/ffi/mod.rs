mod error;
mod library;
mod native;
mod signature;
mod symbol;

pub use library::{Callable, Library};
pub use native::{NativeType, UnknownNativeType, Value};
pub use signature::{SafeSignature, Signature};
pub use symbol::{DynamicCallable, ForeignFunction};
pub(crate) use symbol::Symbol;
