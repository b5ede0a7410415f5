//! Pull-style decoder for the Protocol Buffers wire format.
//!
//! The decoder is built in three layers:
//!
//! - **Primitive readers** ([`read_varint`](ProtoDecoder::read_varint),
//!   [`read_fixed32`](ProtoDecoder::read_fixed32), ...) grab raw values from
//!   the input window.
//! - **Value parsers** (`parse_*_value`) read one field value given its wire
//!   type, checking that the wire type is acceptable for the target domain.
//! - **Field helpers** (`parse_*_field` / `parse_repeated_*_field`) write the
//!   value through a `&mut` reference and set the field's presence flag, or
//!   append to a repeated field's `Vec`. Generated decode routines call these.
//!
//! ## Design
//!
//! - **Zero-copy:** the decoder borrows the byte window for its lifetime and
//!   only advances a cursor. [`parse_bytearray_value`](ProtoDecoder::parse_bytearray_value)
//!   returns a view into the window; owned copies are made only by the
//!   bytearray field helpers and when appending repeated values.
//! - **Linear consumption:** the cursor never moves backwards and every
//!   advance is bounds-checked against the window end.
//! - **Submessages:** [`parse_submessage`](ProtoDecoder::parse_submessage)
//!   reads the length prefix and returns a fresh decoder scoped to the inner
//!   byte range. The parent cursor is advanced past the payload at that
//!   moment, so sibling fields remain parseable even if the sub-decoder is
//!   never fully consumed. Nesting is bounded by a depth limit
//!   (default [`DEFAULT_DEPTH_LIMIT`]).
//!
//! ## Message loop protocol
//!
//! ```ignore
//! let mut pb = ProtoDecoder::new(window);
//! while let Some((field_num, wire_type)) = pb.next_field()? {
//!     match field_num {
//!         1 => pb.parse_integral_field(wire_type, &mut msg.size, &mut msg.has_size)?,
//!         _ => pb.skip_field(wire_type)?,
//!     }
//! }
//! ```
//!
//! `next_field` returns `Ok(None)` exactly when the cursor sits on the window
//! end; a partial trailing tag fails with [`DecodeError::UnexpectedEnd`].
//! Required-field checks run after the loop, from the generated routine.

use byteorder::{ByteOrder, LittleEndian};

/// Default bound on submessage nesting.
pub const DEFAULT_DEPTH_LIMIT: u32 = 100;

/// Wire type: the low 3 bits of a field tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum WireType {
    Varint = 0,
    Fixed64 = 1,
    Len = 2,
    StartGroup = 3,
    EndGroup = 4,
    Fixed32 = 5,
}

impl WireType {
    /// Maps a raw 3-bit code to a wire type. Codes 6 and 7 are unassigned.
    pub fn from_code(code: u8) -> Result<WireType, DecodeError> {
        match code {
            0 => Ok(WireType::Varint),
            1 => Ok(WireType::Fixed64),
            2 => Ok(WireType::Len),
            3 => Ok(WireType::StartGroup),
            4 => Ok(WireType::EndGroup),
            5 => Ok(WireType::Fixed32),
            _ => Err(DecodeError::UnsupportedWireType(code)),
        }
    }
}

/// Decode failure. All variants are fatal to the current decode; the decoder
/// does not resynchronize after an error.
#[derive(Debug, thiserror::Error)]
pub enum DecodeError {
    #[error("unexpected end of buffer")]
    UnexpectedEnd,
    #[error("varint longer than 10 bytes")]
    VarintTooLong,
    #[error("can't parse {domain} value with wire type {wire_type:?}")]
    TypeMismatch {
        domain: &'static str,
        wire_type: WireType,
    },
    #[error("unsupported wire type {0}")]
    UnsupportedWireType(u8),
    #[error("decoded message has no required field {message}.{field}")]
    MissingRequired {
        message: &'static str,
        field: &'static str,
    },
    #[error("message nesting exceeds decoder depth limit")]
    DepthLimitExceeded,
}

/// Scalars an integral wire value narrows into. Narrowing keeps the low-order
/// bits of the raw 64-bit word; sign bits are preserved by reinterpretation,
/// not by sign extension.
pub trait IntegralValue: Copy {
    fn from_raw(raw: u64) -> Self;
}

impl IntegralValue for u64 {
    fn from_raw(raw: u64) -> u64 {
        raw
    }
}

impl IntegralValue for u32 {
    fn from_raw(raw: u64) -> u32 {
        raw as u32
    }
}

impl IntegralValue for i64 {
    fn from_raw(raw: u64) -> i64 {
        raw as i64
    }
}

impl IntegralValue for i32 {
    fn from_raw(raw: u64) -> i32 {
        raw as i32
    }
}

impl IntegralValue for bool {
    fn from_raw(raw: u64) -> bool {
        raw != 0
    }
}

/// Scalars a ZigZag-decoded signed value narrows into.
pub trait ZigzagValue: Copy {
    fn from_signed(value: i64) -> Self;
}

impl ZigzagValue for i64 {
    fn from_signed(value: i64) -> i64 {
        value
    }
}

impl ZigzagValue for i32 {
    fn from_signed(value: i64) -> i32 {
        value as i32
    }
}

/// IEEE-754 scalars; a 32-bit wire value widens losslessly, a 64-bit wire
/// value narrows by cast.
pub trait FloatValue: Copy {
    fn from_f32(value: f32) -> Self;
    fn from_f64(value: f64) -> Self;
}

impl FloatValue for f32 {
    fn from_f32(value: f32) -> f32 {
        value
    }
    fn from_f64(value: f64) -> f32 {
        value as f32
    }
}

impl FloatValue for f64 {
    fn from_f32(value: f32) -> f64 {
        value as f64
    }
    fn from_f64(value: f64) -> f64 {
        value
    }
}

/// Owned targets for length-delimited payloads. Strings take the bytes as
/// UTF-8, replacing invalid sequences.
pub trait ByteArrayValue {
    fn from_wire_bytes(bytes: &[u8]) -> Self;
}

impl ByteArrayValue for Vec<u8> {
    fn from_wire_bytes(bytes: &[u8]) -> Vec<u8> {
        bytes.to_vec()
    }
}

impl ByteArrayValue for String {
    fn from_wire_bytes(bytes: &[u8]) -> String {
        String::from_utf8_lossy(bytes).into_owned()
    }
}

/// A message record that can be decoded from the wire format.
///
/// Generated records implement [`merge_from`](DecodeMessage::merge_from) with
/// a dispatch loop over field numbers; [`decode`](DecodeMessage::decode) is
/// the top-level entry point over a byte window.
pub trait DecodeMessage: Default {
    /// Decodes fields from `pb` into `self` until the window is exhausted,
    /// then runs required-field checks.
    fn merge_from(&mut self, pb: &mut ProtoDecoder<'_>) -> Result<(), DecodeError>;

    /// Decodes a full message from a byte window.
    fn decode(window: &[u8]) -> Result<Self, DecodeError> {
        let mut msg = Self::default();
        let mut pb = ProtoDecoder::new(window);
        msg.merge_from(&mut pb)?;
        Ok(msg)
    }
}

/// Pull decoder over an immutable byte window.
///
/// Scoped to a single window and consumed linearly. Stateless beyond the
/// cursor: a sub-decoder produced for a submessage is fully independent of
/// its parent after creation.
pub struct ProtoDecoder<'a> {
    data: &'a [u8],
    pos: usize,
    depth_remaining: u32,
}

impl<'a> ProtoDecoder<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        ProtoDecoder {
            data,
            pos: 0,
            depth_remaining: DEFAULT_DEPTH_LIMIT,
        }
    }

    /// Decoder with a custom submessage nesting bound.
    pub fn with_depth_limit(data: &'a [u8], depth_limit: u32) -> Self {
        ProtoDecoder {
            data,
            pos: 0,
            depth_remaining: depth_limit,
        }
    }

    pub fn position(&self) -> usize {
        self.pos
    }

    pub fn remaining(&self) -> &'a [u8] {
        &self.data[self.pos..]
    }

    fn advance(&mut self, n: usize) -> Result<(), DecodeError> {
        if self.data.len() - self.pos < n {
            return Err(DecodeError::UnexpectedEnd);
        }
        self.pos += n;
        Ok(())
    }

    /// Reads one varint, LSB-first, up to 10 bytes.
    pub fn read_varint(&mut self) -> Result<u64, DecodeError> {
        let mut value = 0u64;
        let mut shift = 0u32;
        loop {
            if self.pos == self.data.len() {
                return Err(DecodeError::UnexpectedEnd);
            }
            if shift >= 64 {
                return Err(DecodeError::VarintTooLong);
            }
            let byte = self.data[self.pos];
            self.pos += 1;
            value |= ((byte & 0x7f) as u64) << shift;
            if byte & 0x80 == 0 {
                return Ok(value);
            }
            shift += 7;
        }
    }

    // Fixed-width reads are little-endian regardless of host byte order.

    pub fn read_fixed16(&mut self) -> Result<u16, DecodeError> {
        if self.data.len() - self.pos < 2 {
            return Err(DecodeError::UnexpectedEnd);
        }
        let v = LittleEndian::read_u16(&self.data[self.pos..]);
        self.pos += 2;
        Ok(v)
    }

    pub fn read_fixed32(&mut self) -> Result<u32, DecodeError> {
        if self.data.len() - self.pos < 4 {
            return Err(DecodeError::UnexpectedEnd);
        }
        let v = LittleEndian::read_u32(&self.data[self.pos..]);
        self.pos += 4;
        Ok(v)
    }

    pub fn read_fixed64(&mut self) -> Result<u64, DecodeError> {
        if self.data.len() - self.pos < 8 {
            return Err(DecodeError::UnexpectedEnd);
        }
        let v = LittleEndian::read_u64(&self.data[self.pos..]);
        self.pos += 8;
        Ok(v)
    }

    pub fn read_f32(&mut self) -> Result<f32, DecodeError> {
        Ok(f32::from_bits(self.read_fixed32()?))
    }

    pub fn read_f64(&mut self) -> Result<f64, DecodeError> {
        Ok(f64::from_bits(self.read_fixed64()?))
    }

    /// Reads the next field tag. Returns `Ok(None)` iff the cursor is exactly
    /// at the window end; a window ending mid-tag fails with `UnexpectedEnd`.
    pub fn next_field(&mut self) -> Result<Option<(u32, WireType)>, DecodeError> {
        if self.pos == self.data.len() {
            return Ok(None);
        }
        let tag = self.read_varint()?;
        let wire_type = WireType::from_code((tag & 7) as u8)?;
        Ok(Some(((tag >> 3) as u32, wire_type)))
    }

    /// Advances past one value of the given wire type without interpreting it.
    /// Group markers carry no skippable payload and fail.
    pub fn skip_field(&mut self, wire_type: WireType) -> Result<(), DecodeError> {
        match wire_type {
            WireType::Varint => {
                self.read_varint()?;
            }
            WireType::Fixed32 => self.advance(4)?,
            WireType::Fixed64 => self.advance(8)?,
            WireType::Len => {
                self.read_length_delimited()?;
            }
            WireType::StartGroup | WireType::EndGroup => {
                return Err(DecodeError::UnsupportedWireType(wire_type as u8));
            }
        }
        Ok(())
    }

    fn read_length_delimited(&mut self) -> Result<&'a [u8], DecodeError> {
        let len =
            usize::try_from(self.read_varint()?).map_err(|_| DecodeError::UnexpectedEnd)?;
        if self.data.len() - self.pos < len {
            return Err(DecodeError::UnexpectedEnd);
        }
        let view = &self.data[self.pos..self.pos + len];
        self.pos += len;
        Ok(view)
    }

    /// Raw integer parse: sign bits are preserved in the low-order bytes and
    /// the caller narrows to the target width by truncation. A 32-bit fixed
    /// value is zero-extended.
    pub fn parse_integral_value(&mut self, wire_type: WireType) -> Result<u64, DecodeError> {
        match wire_type {
            WireType::Varint => self.read_varint(),
            WireType::Fixed64 => self.read_fixed64(),
            WireType::Fixed32 => Ok(self.read_fixed32()? as u64),
            _ => Err(DecodeError::TypeMismatch {
                domain: "integral",
                wire_type,
            }),
        }
    }

    /// ZigZag-decoded signed integer. A fixed-width value is reinterpreted as
    /// two's-complement signed of the same width, not ZigZag-decoded.
    pub fn parse_zigzag_value(&mut self, wire_type: WireType) -> Result<i64, DecodeError> {
        match wire_type {
            WireType::Varint => {
                let n = self.read_varint()?;
                Ok(((n >> 1) as i64) ^ -((n & 1) as i64))
            }
            WireType::Fixed64 => Ok(self.read_fixed64()? as i64),
            WireType::Fixed32 => Ok(self.read_fixed32()? as i32 as i64),
            _ => Err(DecodeError::TypeMismatch {
                domain: "zigzag",
                wire_type,
            }),
        }
    }

    /// IEEE-754 value: FIXED32 reads an f32, FIXED64 an f64; the result is
    /// converted to the target width.
    pub fn parse_fp_value<T: FloatValue>(&mut self, wire_type: WireType) -> Result<T, DecodeError> {
        match wire_type {
            WireType::Fixed64 => Ok(T::from_f64(self.read_f64()?)),
            WireType::Fixed32 => Ok(T::from_f32(self.read_f32()?)),
            _ => Err(DecodeError::TypeMismatch {
                domain: "fp",
                wire_type,
            }),
        }
    }

    /// Length-delimited payload as a view into the window, valid for the
    /// window's lifetime.
    pub fn parse_bytearray_value(&mut self, wire_type: WireType) -> Result<&'a [u8], DecodeError> {
        if wire_type != WireType::Len {
            return Err(DecodeError::TypeMismatch {
                domain: "bytearray",
                wire_type,
            });
        }
        self.read_length_delimited()
    }

    /// Reads a length-prefixed submessage and returns a decoder scoped to the
    /// inner byte range. The parent cursor advances past the payload now.
    pub fn parse_submessage(&mut self, wire_type: WireType) -> Result<ProtoDecoder<'a>, DecodeError> {
        if wire_type != WireType::Len {
            return Err(DecodeError::TypeMismatch {
                domain: "message",
                wire_type,
            });
        }
        if self.depth_remaining == 0 {
            return Err(DecodeError::DepthLimitExceeded);
        }
        let view = self.read_length_delimited()?;
        Ok(ProtoDecoder {
            data: view,
            pos: 0,
            depth_remaining: self.depth_remaining - 1,
        })
    }

    // Field helpers: write through the target reference and set the presence
    // flag, or append to the repeated field. One pair per domain.

    pub fn parse_integral_field<T: IntegralValue>(
        &mut self,
        wire_type: WireType,
        field: &mut T,
        has_field: &mut bool,
    ) -> Result<(), DecodeError> {
        *field = T::from_raw(self.parse_integral_value(wire_type)?);
        *has_field = true;
        Ok(())
    }

    pub fn parse_repeated_integral_field<T: IntegralValue>(
        &mut self,
        wire_type: WireType,
        field: &mut Vec<T>,
    ) -> Result<(), DecodeError> {
        field.push(T::from_raw(self.parse_integral_value(wire_type)?));
        Ok(())
    }

    pub fn parse_zigzag_field<T: ZigzagValue>(
        &mut self,
        wire_type: WireType,
        field: &mut T,
        has_field: &mut bool,
    ) -> Result<(), DecodeError> {
        *field = T::from_signed(self.parse_zigzag_value(wire_type)?);
        *has_field = true;
        Ok(())
    }

    pub fn parse_repeated_zigzag_field<T: ZigzagValue>(
        &mut self,
        wire_type: WireType,
        field: &mut Vec<T>,
    ) -> Result<(), DecodeError> {
        field.push(T::from_signed(self.parse_zigzag_value(wire_type)?));
        Ok(())
    }

    pub fn parse_fp_field<T: FloatValue>(
        &mut self,
        wire_type: WireType,
        field: &mut T,
        has_field: &mut bool,
    ) -> Result<(), DecodeError> {
        *field = self.parse_fp_value(wire_type)?;
        *has_field = true;
        Ok(())
    }

    pub fn parse_repeated_fp_field<T: FloatValue>(
        &mut self,
        wire_type: WireType,
        field: &mut Vec<T>,
    ) -> Result<(), DecodeError> {
        field.push(self.parse_fp_value(wire_type)?);
        Ok(())
    }

    pub fn parse_bytearray_field<T: ByteArrayValue>(
        &mut self,
        wire_type: WireType,
        field: &mut T,
        has_field: &mut bool,
    ) -> Result<(), DecodeError> {
        *field = T::from_wire_bytes(self.parse_bytearray_value(wire_type)?);
        *has_field = true;
        Ok(())
    }

    pub fn parse_repeated_bytearray_field<T: ByteArrayValue>(
        &mut self,
        wire_type: WireType,
        field: &mut Vec<T>,
    ) -> Result<(), DecodeError> {
        field.push(T::from_wire_bytes(self.parse_bytearray_value(wire_type)?));
        Ok(())
    }

    pub fn parse_message_field<M: DecodeMessage>(
        &mut self,
        wire_type: WireType,
        field: &mut M,
        has_field: &mut bool,
    ) -> Result<(), DecodeError> {
        let mut sub = self.parse_submessage(wire_type)?;
        field.merge_from(&mut sub)?;
        *has_field = true;
        Ok(())
    }

    pub fn parse_repeated_message_field<M: DecodeMessage>(
        &mut self,
        wire_type: WireType,
        field: &mut Vec<M>,
    ) -> Result<(), DecodeError> {
        let mut sub = self.parse_submessage(wire_type)?;
        let mut value = M::default();
        value.merge_from(&mut sub)?;
        field.push(value);
        Ok(())
    }
}

#[cfg(test)]
pub(crate) fn encode_varint(mut val: u64) -> Vec<u8> {
    let mut bytes = Vec::with_capacity(10);
    loop {
        let byte = (val & 0x7f) as u8;
        val >>= 7;
        if val == 0 {
            bytes.push(byte);
            break;
        }
        bytes.push(byte | 0x80);
    }
    bytes
}
