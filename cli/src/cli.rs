/* -------------------------------------------------------- *\
 *                                                          *
 *  This file is licensed as MIT. See LICENSE for details.  *
 *                                                          *
\* ---------------------------------------------------------*/

use crate::{
	util::display::{write_json_to_stdout, write_to_stdout_ignore_sigpipe},
	version,
};
use anyhow::{Context, Result};
use clap::Parser;
use console::style;
use serde::Serialize;
use std::{
	path::{Path, PathBuf},
	process::ExitCode,
};
use symbind_core::{BoundLibrary, Error, ForeignFunction, Library, Manifest, NativeType, Value};

/// Call functions exported by shared libraries.
///
/// Signatures given on the command line or in a manifest are trusted as-is. A signature that
/// does not match the real export makes the call undefined behaviour.
#[derive(Debug, Parser)]
#[command(name = "symbind", version = version::symbind())]
pub struct Cli {
	#[clap(subcommand)]
	pub subcommand: Subcommand,
	/// Print results as JSON.
	#[arg(long, global = true, default_value_t = false)]
	pub json: bool,
}

#[derive(Debug, Parser)]
pub enum Subcommand {
	/// Resolve a symbol with the given signature and call it.
	Call(CallCmd),
	/// Bind every symbol of a manifest and call one of them.
	Run(RunCmd),
	/// Check which symbols a library exports.
	Check(CheckCmd),
}

#[derive(Debug, Parser)]
pub struct CallCmd {
	/// Library to load. The running process when omitted.
	#[arg(long)]
	pub library: Option<PathBuf>,
	pub symbol: String,
	/// Parameter types, comma separated (e.g. `i32,i32`).
	#[arg(long, value_delimiter = ',')]
	pub params: Vec<NativeType>,
	/// Return type.
	#[arg(long, default_value = "void")]
	pub result: NativeType,
	/// Allow `pointer` parameters. The addresses are passed to the export unchecked.
	#[arg(long, default_value_t = false)]
	pub unchecked: bool,
	#[arg(allow_hyphen_values = true)]
	pub args: Vec<String>,
}

#[derive(Debug, Parser)]
pub struct RunCmd {
	pub manifest: PathBuf,
	/// Key of the symbol in the manifest.
	pub symbol: String,
	/// Allow `pointer` parameters. The addresses are passed to the export unchecked.
	#[arg(long, default_value_t = false)]
	pub unchecked: bool,
	#[arg(allow_hyphen_values = true)]
	pub args: Vec<String>,
}

#[derive(Debug, Parser)]
pub struct CheckCmd {
	/// Library to load. The running process when omitted.
	#[arg(long)]
	pub library: Option<PathBuf>,
	#[arg(required = true)]
	pub symbols: Vec<String>,
}

impl CallCmd {
	pub fn run(&self, json: bool) -> Result<()> {
		let library = open(self.library.as_deref())?;
		let def = ForeignFunction::new(self.params.clone(), self.result);
		let args = parse_args(&self.symbol, &def.parameters, &self.args)?;

		// SAFETY: the signature comes from the user, see the command help.
		let callable = unsafe { library.resolve_dynamic(&self.symbol, &def) }
			.with_context(|| format!("unable to bind `{}`", self.symbol))?;

		let value = if self.unchecked {
			// SAFETY: `--unchecked` hands the user's addresses to the export as-is.
			unsafe { callable.call_unchecked(&args)? }
		} else {
			callable.call(&args)?
		};
		log::debug!("`{}` returned {:?}", self.symbol, value);
		print_value(&value, json)
	}
}

impl RunCmd {
	pub fn run(&self, json: bool) -> Result<()> {
		let manifest = Manifest::from_path(&self.manifest)
			.with_context(|| format!("unable to read manifest {}", self.manifest.display()))?;

		// SAFETY: the manifest's signatures are trusted, see the command help.
		let bound = unsafe { BoundLibrary::bind(&manifest) }
			.with_context(|| format!("unable to bind {}", self.manifest.display()))?;

		let def = bound.get(&self.symbol).ok_or_else(|| Error::SymbolNotFound {
			library: manifest.library.clone(),
			symbol: self.symbol.clone(),
		})?;
		let args = parse_args(&self.symbol, &def.parameters, &self.args)?;

		let value = if self.unchecked {
			// SAFETY: `--unchecked` hands the user's addresses to the export as-is.
			unsafe { bound.call_unchecked(&self.symbol, &args)? }
		} else {
			bound.call(&self.symbol, &args)?
		};
		print_value(&value, json)
	}
}

#[derive(Debug, Serialize)]
struct CheckReport<'a> {
	library: &'a str,
	found: Vec<&'a str>,
	missing: Vec<&'a str>,
}

impl CheckCmd {
	/// Reports every requested symbol. Returns whether all of them resolved.
	pub fn run(&self, json: bool) -> Result<bool> {
		let library = open(self.library.as_deref())?;
		let (found, missing): (Vec<_>, Vec<_>) =
			self.symbols.iter().map(String::as_str).partition(|symbol| library.contains(symbol));

		let all_found = missing.is_empty();

		if json {
			write_json_to_stdout(&CheckReport { library: library.name(), found, missing })?;
			return Ok(all_found)
		}

		for symbol in &self.symbols {
			if found.contains(&symbol.as_str()) {
				log::info!("  {} {}", style("+").green().bold(), symbol);
			} else {
				log::warn!("  {} {} not found in `{}`", style("-").red().bold(), symbol, library.name());
			}
		}

		Ok(all_found)
	}
}

pub fn exit_code(success: bool) -> ExitCode {
	if success {
		ExitCode::SUCCESS
	} else {
		ExitCode::FAILURE
	}
}

fn open(library: Option<&Path>) -> Result<Library> {
	let library = match library {
		Some(path) => Library::open(path)?,
		None => Library::open_self()?,
	};
	log::debug!("Loaded `{}`", library.name());
	Ok(library)
}

fn parse_args(symbol: &str, parameters: &[NativeType], raw: &[String]) -> Result<Vec<Value>> {
	if parameters.len() != raw.len() {
		return Err(Error::ArityMismatch {
			symbol: symbol.to_string(),
			expected: parameters.len(),
			found: raw.len(),
		}
		.into())
	}

	parameters
		.iter()
		.zip(raw)
		.map(|(native_type, raw)| Ok(Value::parse(*native_type, raw)?))
		.collect()
}

fn print_value(value: &Value, json: bool) -> Result<()> {
	if json {
		return write_json_to_stdout(value)
	}

	write_to_stdout_ignore_sigpipe(format!("{value}\n").as_bytes())?;
	Ok(())
}
