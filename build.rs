//! Records the compiler version reported in crash diagnostics

use std::env;
use std::process::Command;

fn main() {
    let rustc = env::var("RUSTC").unwrap_or_else(|_| "rustc".to_string());
    let version = Command::new(rustc)
        .arg("--version")
        .output()
        .ok()
        .filter(|output| output.status.success())
        .and_then(|output| String::from_utf8(output.stdout).ok());

    if let Some(version) = version {
        println!("cargo:rustc-env=LOGFAN_RUSTC_VERSION={}", version.trim());
    }
    println!("cargo:rerun-if-env-changed=RUSTC");
}
