use once_cell::sync::Lazy;
use std::{
	env,
	path::{Path, PathBuf},
	process::Command,
};
use tempfile::TempDir;

const FIXTURE_SOURCE: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/tests/fixtures/arith.rs");

static FIXTURE: Lazy<(TempDir, PathBuf)> = Lazy::new(|| {
	let dir = tempfile::tempdir().expect("temp dir");
	let path = dir
		.path()
		.join(format!("{}symbind_arith{}", env::consts::DLL_PREFIX, env::consts::DLL_SUFFIX));

	let rustc = env::var_os("RUSTC").unwrap_or_else(|| "rustc".into());
	let status = Command::new(rustc)
		.args(["--crate-type", "cdylib", "--edition", "2021", "--crate-name", "symbind_arith"])
		.arg("-o")
		.arg(&path)
		.arg(FIXTURE_SOURCE)
		.status()
		.expect("run rustc");
	assert!(status.success(), "failed to build {FIXTURE_SOURCE}");

	(dir, path)
});

/// Path of the fixture library, built on first use.
pub fn fixture() -> &'static Path {
	&FIXTURE.1
}
