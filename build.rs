use std::env;
use std::fs;
use std::path::Path;
use std::process::Command;

/// Application flash/RAM windows left free by the SoftDevice for each chip
fn memory_layout() -> &'static str {
    if env::var_os("CARGO_FEATURE_NRF52832").is_some() {
        // S132 7.x
        "MEMORY\n{\n  FLASH : ORIGIN = 0x00026000, LENGTH = 360K\n  RAM : ORIGIN = 0x20006000, LENGTH = 40K\n}\n"
    } else if env::var_os("CARGO_FEATURE_NRF52820").is_some() {
        "MEMORY\n{\n  FLASH : ORIGIN = 0x00027000, LENGTH = 100K\n  RAM : ORIGIN = 0x20004000, LENGTH = 16K\n}\n"
    } else if env::var_os("CARGO_FEATURE_NRF52833").is_some() {
        "MEMORY\n{\n  FLASH : ORIGIN = 0x00027000, LENGTH = 356K\n  RAM : ORIGIN = 0x20008000, LENGTH = 96K\n}\n"
    } else {
        // nRF52840 + S140 7.x
        "MEMORY\n{\n  FLASH : ORIGIN = 0x00027000, LENGTH = 868K\n  RAM : ORIGIN = 0x20020000, LENGTH = 128K\n}\n"
    }
}

/// Short git hash, falling back to the build profile outside a checkout
fn build_tag() -> String {
    let profile = env::var("PROFILE").unwrap_or_else(|_| "dev".into());
    match Command::new("git").args(["rev-parse", "--short", "HEAD"]).output() {
        Ok(output) if output.status.success() => {
            let hash = String::from_utf8_lossy(&output.stdout).trim().to_string();
            format!("{hash}-{profile}")
        }
        _ => profile,
    }
}

fn main() {
    let out_dir = env::var("OUT_DIR").unwrap();
    fs::write(Path::new(&out_dir).join("memory.x"), memory_layout()).unwrap();

    // Tell the linker where to find memory.x
    println!("cargo:rustc-link-search={}", out_dir);

    println!("cargo:rustc-link-arg=--nmagic");
    println!("cargo:rustc-link-arg=-Tlink.x");
    println!("cargo:rustc-link-arg=-Tdefmt.x");

    println!("cargo:rustc-env=ENRF_BUILD_TAG={}", build_tag());

    println!("cargo:rerun-if-changed=build.rs");
    println!("cargo:rerun-if-changed=.git/HEAD");
}
