//! Command-line entry point for `skillforge`.
//!
//! All work happens in the library crate so it can be tested without
//! spawning the binary.

fn main() -> anyhow::Result<()> {
    skillforge::run()
}
