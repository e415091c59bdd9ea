use crate::{log, Error, Library, Result};
use once_cell::sync::Lazy;
use parking_lot::RwLock;
use std::{
	collections::BTreeMap,
	ffi::OsStr,
	sync::{
		atomic::{AtomicU32, Ordering},
		Arc,
	},
};

/// Id of a library held by a [`Registry`].
pub type LibraryRid = u32;

static GLOBAL: Lazy<Registry> = Lazy::new(Registry::new);

/// Table of the libraries a program keeps loaded, keyed by [`LibraryRid`].
///
/// Entries are handed out as `Arc<Library>`. [`Registry::unload`] only drops the table's
/// reference: the mapping is released once the last user lets go, so an unload never races a
/// call already in progress.
#[derive(Default)]
pub struct Registry {
	next_rid: AtomicU32,
	libraries: RwLock<BTreeMap<LibraryRid, Arc<Library>>>,
}

impl Registry {
	pub fn new() -> Self {
		Self::default()
	}

	/// The process-wide registry.
	pub fn global() -> &'static Registry {
		&GLOBAL
	}

	pub fn load<P: AsRef<OsStr>>(&self, path: P) -> Result<LibraryRid> {
		Ok(self.insert(Library::open(path)?))
	}

	pub fn load_self(&self) -> Result<LibraryRid> {
		Ok(self.insert(Library::open_self()?))
	}

	fn insert(&self, library: Library) -> LibraryRid {
		let rid = self.next_rid.fetch_add(1, Ordering::Relaxed);
		log!(debug, "Registered `{}` as rid {}", library.name(), rid);
		self.libraries.write().insert(rid, Arc::new(library));
		rid
	}

	pub fn get(&self, rid: LibraryRid) -> Result<Arc<Library>> {
		self.libraries.read().get(&rid).cloned().ok_or(Error::UnknownLibrary(rid))
	}

	/// Removes `rid` from the table.
	pub fn unload(&self, rid: LibraryRid) -> Result<()> {
		let library = self.libraries.write().remove(&rid).ok_or(Error::UnknownLibrary(rid))?;
		log!(debug, "Unregistered `{}` (rid {})", library.name(), rid);
		Ok(())
	}

	/// Loads `path`, runs `f` with it and unloads it again, whether `f` succeeds or not.
	pub fn with_library<P, T, F>(&self, path: P, f: F) -> Result<T>
	where
		P: AsRef<OsStr>,
		F: FnOnce(&Library) -> Result<T>,
	{
		let rid = self.load(path)?;
		let guard = Scope { registry: self, rid };
		let library = self.get(guard.rid)?;
		f(&library)
	}

	pub fn len(&self) -> usize {
		self.libraries.read().len()
	}

	pub fn is_empty(&self) -> bool {
		self.libraries.read().is_empty()
	}

	pub fn rids(&self) -> Vec<LibraryRid> {
		self.libraries.read().keys().copied().collect()
	}
}

struct Scope<'a> {
	registry: &'a Registry,
	rid: LibraryRid,
}

impl Drop for Scope<'_> {
	fn drop(&mut self) {
		// Already gone if `f` unloaded it itself.
		let _ = self.registry.unload(self.rid);
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn load_get_unload() {
		let registry = Registry::new();
		let rid = registry.load_self().unwrap();

		assert_eq!(registry.len(), 1);
		assert_eq!(registry.get(rid).unwrap().name(), "<self>");

		registry.unload(rid).unwrap();
		assert!(registry.is_empty());
		assert!(matches!(registry.get(rid), Err(Error::UnknownLibrary(r)) if r == rid));
		assert!(matches!(registry.unload(rid), Err(Error::UnknownLibrary(_))));
	}

	#[test]
	fn rids_are_not_reused() {
		let registry = Registry::new();
		let first = registry.load_self().unwrap();
		registry.unload(first).unwrap();
		let second = registry.load_self().unwrap();

		assert_ne!(first, second);
		assert_eq!(registry.rids(), vec![second]);
	}

	#[test]
	fn held_library_survives_unload() {
		let registry = Registry::new();
		let rid = registry.load_self().unwrap();
		let library = registry.get(rid).unwrap();

		registry.unload(rid).unwrap();
		assert!(registry.is_empty());
		assert_eq!(library.name(), "<self>");
	}

	#[test]
	fn failed_load_registers_nothing() {
		let registry = Registry::new();
		assert!(matches!(registry.load("./libsymbind-missing.so"), Err(Error::Load { .. })));
		assert!(registry.is_empty());
	}
}
