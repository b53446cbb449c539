use std::fs;
use std::path::Path;

fn main() {
    println!("cargo:rerun-if-changed=src");

    // Delete stale log file if it exists
    if Path::new("huddle.log").exists() {
        if fs::remove_file("huddle.log").is_ok() {
            println!("cargo:warning=Deleted huddle.log");
        }
    }
}
