//! # pbwire — Protocol Buffers wire-format decoder and Rust code generator
//!
//! A two-part toolchain for consuming Protocol Buffers binary data:
//!
//! - **Decoder** ([`decoder`]): a pull parser over an immutable byte window.
//!   Primitive readers (varint, little-endian fixed-width), a field-tag
//!   iterator, type-directed value parsers per scalar domain, and field
//!   helpers that write through `&mut` references and track presence.
//! - **Descriptor model** ([`descriptor`]): the subset of the standard
//!   compiled-schema messages (`FileDescriptorSet` down to
//!   `FieldDescriptorProto`) needed for generation, decoded with the
//!   decoder itself.
//! - **Generator** ([`generator`]): emits, for every message in a compiled
//!   schema, a Rust record plus a decode routine dispatching on field
//!   numbers to the decoder's entry points.
//!
//! The `pbgen` binary ties these together: it reads a descriptor file
//! produced by `protoc --descriptor_set_out`, decodes it, and prints the
//! generated Rust source to stdout.
//!
//! ## Scope
//!
//! Decode only: there is no encoder, no support for the packed layout of
//! repeated scalars, and group fields are recognized in tags but rejected.
//!
//! ## Example
//!
//! ```ignore
//! use pbwire::{DecodeMessage, FileDescriptorSet, generate_file};
//!
//! let bytes = std::fs::read("schema.pbs")?;
//! let set = FileDescriptorSet::decode(&bytes)?;
//! print!("{}", generate_file(&set, "schema.pbs"));
//! ```

pub mod decoder;
pub mod descriptor;
pub mod generator;

pub use decoder::{
    ByteArrayValue, DecodeError, DecodeMessage, FloatValue, IntegralValue, ProtoDecoder,
    WireType, ZigzagValue, DEFAULT_DEPTH_LIMIT,
};
pub use descriptor::{
    DescriptorProto, FieldDescriptorProto, FieldType, FileDescriptorProto, FileDescriptorSet,
    Label,
};
pub use generator::generate_file;
