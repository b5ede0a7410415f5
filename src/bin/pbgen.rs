//! Generate Rust decoder source from a compiled Protocol Buffers schema.
//!
//! Usage:
//!   pbgen schema.pbs > schema_pb.rs
//!
//! The input is a `FileDescriptorSet` as written by
//! `protoc --descriptor_set_out`. Generated source goes to stdout; it is
//! buffered until the whole schema has decoded, so a failed run writes
//! nothing. Diagnostics go to stderr and the exit code is non-zero on any
//! I/O or decode failure.

use anyhow::{bail, Context};
use pbwire::{generate_file, DecodeMessage, FileDescriptorSet};
use std::io::Write;

fn main() -> anyhow::Result<()> {
    let args: Vec<String> = std::env::args().skip(1).collect();
    if args.len() != 1 {
        bail!("usage: pbgen <schema.pbs>");
    }
    let path = &args[0];

    let bytes = std::fs::read(path).with_context(|| format!("reading {}", path))?;
    let set = FileDescriptorSet::decode(&bytes)
        .with_context(|| format!("decoding descriptor set {}", path))?;

    if set.file.len() > 1 {
        eprintln!(
            "pbgen: {} files in descriptor set, generating code for the first only",
            set.file.len()
        );
    }

    let source = generate_file(&set, path);
    std::io::stdout().write_all(source.as_bytes())?;
    Ok(())
}
