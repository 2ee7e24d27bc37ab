use std::{
	error::Error,
	fmt::Write as _,
	path::{Path, PathBuf},
};

use ldap_directory::{Config, Directory, ReloadConfig};
use tracing_subscriber::{filter::LevelFilter, EnvFilter};

pub const BASE_DN: &str = "dc=example,dc=org";

pub fn init_tracing() {
	let tracing_filter = EnvFilter::default().add_directive(LevelFilter::DEBUG.into());
	let _ = tracing_subscriber::fmt().with_env_filter(tracing_filter).with_test_writer().try_init();
}

pub fn user_dn(cn: &str) -> String {
	format!("cn={cn},ou=users,{BASE_DN}")
}

/// A users document with `count` users named `{prefix}-{n}`, all sharing the
/// same plain text password.
pub fn users_document(prefix: &str, count: usize) -> String {
	let mut document = String::from("users:\n");
	for n in 0..count {
		let cn = format!("{prefix}-{n}");
		let _ = writeln!(document, "  - dn: {}", user_dn(&cn));
		let _ = writeln!(document, "    uid: {cn}");
		let _ = writeln!(document, "    description: {prefix}");
		let _ = writeln!(document, "    objectClass: [inetOrgPerson, posixAccount]");
		let _ = writeln!(document, "    userPassword: {prefix}pw");
	}
	document
}

pub fn write_users(dir: &Path, contents: &str) -> Result<PathBuf, Box<dyn Error>> {
	let path = dir.join("users.yaml");
	std::fs::write(&path, contents)?;
	Ok(path)
}

pub fn directory_for(users_file: PathBuf, interval: u64) -> Directory {
	Directory::new(Config {
		base_dn: BASE_DN.to_owned(),
		users_file,
		reload: ReloadConfig { enabled: true, interval },
	})
}
