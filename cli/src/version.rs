pub const TARGET: &str = env!("TARGET");

pub fn symbind() -> &'static str {
	if is_canary() {
		concat!(env!("CARGO_PKG_VERSION"), "+", env!("GIT_COMMIT_HASH_SHORT"))
	} else {
		env!("CARGO_PKG_VERSION")
	}
}

pub fn is_canary() -> bool {
	option_env!("SYMBIND_CANARY").is_some()
}
