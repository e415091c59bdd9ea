use std::io::Write;

pub(crate) fn init() {
	let logger = env_logger::Builder::from_env(env_logger::Env::default())
		.filter_module("symbind", log::LevelFilter::Info)
		.format(|buf, record| {
			let mut target = record.target().to_string();
			if let Some(line_no) = record.line() {
				target.push(':');
				target.push_str(&line_no.to_string());
			}
			if record.level() <= log::Level::Info {
				// Print ERROR, WARN and INFO logs as they are
				writeln!(buf, "{}", record.args())
			} else {
				// Add prefix to DEBUG or TRACE logs
				writeln!(buf, "{} RS - {} - {}", record.level(), target, record.args())
			}
		})
		.build();

	let max_level = logger.filter();

	let r = log::set_boxed_logger(Box::new(logger));
	if r.is_ok() {
		log::set_max_level(max_level);
	}

	r.expect("Could not install logger.");
}
