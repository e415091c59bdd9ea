#[cfg(not(target_os = "windows"))]
pub(crate) fn format_load_error(e: dlopen::Error, _library: &str) -> String {
	e.to_string()
}

#[cfg(target_os = "windows")]
pub(crate) fn format_load_error(e: dlopen::Error, library: &str) -> String {
	match e {
		dlopen::Error::OpeningLibraryError(io) => match io.raw_os_error() {
			Some(code) => system_message(code as u32, library).unwrap_or_else(|| io.to_string()),
			None => io.to_string(),
		},
		e => e.to_string(),
	}
}

/// This calls FormatMessageW with library path as replacement for the insert sequences.
/// Unlike libstd which passes the FORMAT_MESSAGE_IGNORE_INSERTS flag without any arguments.
///
/// https://github.com/denoland/deno/issues/11632
#[cfg(target_os = "windows")]
fn system_message(code: u32, library: &str) -> Option<String> {
	use std::{ffi::OsStr, os::windows::ffi::OsStrExt, ptr};
	use winapi::{
		shared::{minwindef::DWORD, winerror::ERROR_INSUFFICIENT_BUFFER},
		um::{
			errhandlingapi::GetLastError,
			winbase::{FormatMessageW, FORMAT_MESSAGE_ARGUMENT_ARRAY, FORMAT_MESSAGE_FROM_SYSTEM},
			winnt::{LANG_SYSTEM_DEFAULT, MAKELANGID, SUBLANG_SYS_DEFAULT},
		},
	};

	let lang_id = MAKELANGID(LANG_SYSTEM_DEFAULT, SUBLANG_SYS_DEFAULT) as DWORD;
	let path: Vec<u16> = OsStr::new(library).encode_wide().chain(Some(0)).collect();
	let inserts = [path.as_ptr()];
	let mut buf = vec![0u16; 512];

	loop {
		// SAFETY: `buf` is writable for `buf.len()` units and `inserts` outlives the call.
		let length = unsafe {
			FormatMessageW(
				FORMAT_MESSAGE_FROM_SYSTEM | FORMAT_MESSAGE_ARGUMENT_ARRAY,
				ptr::null_mut(),
				code as DWORD,
				lang_id,
				buf.as_mut_ptr(),
				buf.len() as DWORD,
				inserts.as_ptr() as _,
			)
		};

		if length != 0 {
			return Some(String::from_utf16_lossy(&buf[..length as usize]).trim_end().to_string())
		}
		// SAFETY: reads the calling thread's last error code.
		if unsafe { GetLastError() } != ERROR_INSUFFICIENT_BUFFER {
			return None
		}
		buf.resize(buf.len() * 2, 0);
	}
}
