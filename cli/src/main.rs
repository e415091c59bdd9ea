/* -------------------------------------------------------- *\
 *                                                          *
 *  This file is licensed as MIT. See LICENSE for details.  *
 *                                                          *
\* ---------------------------------------------------------*/

use clap::Parser;
use cli::{exit_code, Cli, Subcommand};
use std::{env, process::ExitCode};

mod cli;
mod logger;
mod util;
mod version;

pub fn main() -> Result<ExitCode, anyhow::Error> {
	let cli = Cli::parse();

	setup_panic_hook();
	logger::init();

	match cli.subcommand {
		Subcommand::Call(call) => call.run(cli.json).map(|_| ExitCode::SUCCESS),
		Subcommand::Run(run) => run.run(cli.json).map(|_| ExitCode::SUCCESS),
		Subcommand::Check(check) => check.run(cli.json).map(exit_code),
	}
}

fn setup_panic_hook() {
	let orig_hook = std::panic::take_hook();
	std::panic::set_hook(Box::new(move |panic_info| {
		eprintln!("\n============================================================");
		eprintln!("symbind has panicked. This is a bug in symbind. Please report this");
		eprintln!("at https://github.com/symbind/symbind/issues/new.");
		eprintln!("If you can reliably reproduce this panic, include the");
		eprintln!("reproduction steps and re-run with the RUST_BACKTRACE=1 env");
		eprintln!("var set and include the backtrace in your report.");
		eprintln!();
		eprintln!("Platform: {} {}", env::consts::OS, env::consts::ARCH);
		eprintln!("Target: {}", version::TARGET);
		eprintln!("Version: {}", version::symbind());
		eprintln!("Args: {:?}", env::args().collect::<Vec<_>>());
		eprintln!();
		orig_hook(panic_info);
		std::process::exit(1);
	}));
}
