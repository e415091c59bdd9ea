use std::io::Write;

pub fn write_to_stdout_ignore_sigpipe(bytes: &[u8]) -> Result<(), std::io::Error> {
	use std::io::ErrorKind;

	match std::io::stdout().write_all(bytes) {
		Ok(()) => Ok(()),
		Err(e) => match e.kind() {
			ErrorKind::BrokenPipe => Ok(()),
			_ => Err(e),
		},
	}
}

pub fn write_json_to_stdout<T>(value: &T) -> Result<(), anyhow::Error>
where
	T: ?Sized + serde::ser::Serialize,
{
	let mut writer = std::io::BufWriter::new(std::io::stdout());
	serde_json::to_writer_pretty(&mut writer, value)?;
	writeln!(&mut writer)?;
	Ok(())
}
