//! This build script works out a version string for the binary, so the
//! start-up log says exactly which build programmed the DAC.

use std::env;
use std::path::PathBuf;

fn main() {
	let out = &PathBuf::from(env::var_os("OUT_DIR").unwrap());

	// Generate a file containing the program version
	let mut output;
	if let Ok(version_output) = std::process::Command::new("git")
		.current_dir(env::var_os("CARGO_MANIFEST_DIR").unwrap())
		.args(["describe", "--tags", "--dirty"])
		.output()
	{
		if version_output.status.success() {
			// Remove the trailing newline
			output = version_output.stdout;
			output.pop();
		} else {
			output = String::from(env!("CARGO_PKG_VERSION")).into_bytes();
		}
	} else {
		output = String::from(env!("CARGO_PKG_VERSION")).into_bytes();
	}

	// Write the file
	std::fs::write(out.join("version.txt"), output).expect("writing version file");

	println!("cargo:rerun-if-changed=.git/HEAD");
}
