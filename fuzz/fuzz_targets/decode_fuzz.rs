//! Decoder fuzz target: feed arbitrary bytes to the descriptor-set decoder.
//! The decoder must not panic; it returns Ok(FileDescriptorSet) or a
//! DecodeError. Build with: cargo fuzz run decode_fuzz (requires nightly and
//! cargo fuzz).

#![cfg_attr(fuzzing, no_main)]

#[cfg(fuzzing)]
use libfuzzer_sys::fuzz_target;

#[cfg(fuzzing)]
fuzz_target!(|data: &[u8]| {
    use pbwire::{DecodeMessage, FileDescriptorSet};
    let _ = FileDescriptorSet::decode(data);
});

#[cfg(not(fuzzing))]
fn main() {
    eprintln!("Build with: cargo fuzz run decode_fuzz");
}
