//! Compiled-schema model: the subset of the standard descriptor messages the
//! generator consumes.
//!
//! A compiled schema (`protoc --descriptor_set_out`) is itself a Protocol
//! Buffers message, so these records are decoded with the same
//! [`ProtoDecoder`] the generated code uses. Each `merge_from` body below has
//! the exact shape the generator emits; this module is the hand-maintained
//! bootstrap of that output.

use crate::decoder::{DecodeError, DecodeMessage, ProtoDecoder};

/// Field cardinality, from `FieldDescriptorProto.label`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Label {
    Optional = 1,
    Required = 2,
    Repeated = 3,
}

impl Label {
    pub fn from_i32(value: i32) -> Option<Label> {
        match value {
            1 => Some(Label::Optional),
            2 => Some(Label::Required),
            3 => Some(Label::Repeated),
            _ => None,
        }
    }
}

/// Declared field type, from `FieldDescriptorProto.type`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldType {
    Double = 1,
    Float = 2,
    Int64 = 3,
    Uint64 = 4,
    Int32 = 5,
    Fixed64 = 6,
    Fixed32 = 7,
    Bool = 8,
    String = 9,
    Group = 10,
    Message = 11,
    Bytes = 12,
    Uint32 = 13,
    Enum = 14,
    Sfixed32 = 15,
    Sfixed64 = 16,
    Sint32 = 17,
    Sint64 = 18,
}

impl FieldType {
    pub fn from_i32(value: i32) -> Option<FieldType> {
        match value {
            1 => Some(FieldType::Double),
            2 => Some(FieldType::Float),
            3 => Some(FieldType::Int64),
            4 => Some(FieldType::Uint64),
            5 => Some(FieldType::Int32),
            6 => Some(FieldType::Fixed64),
            7 => Some(FieldType::Fixed32),
            8 => Some(FieldType::Bool),
            9 => Some(FieldType::String),
            10 => Some(FieldType::Group),
            11 => Some(FieldType::Message),
            12 => Some(FieldType::Bytes),
            13 => Some(FieldType::Uint32),
            14 => Some(FieldType::Enum),
            15 => Some(FieldType::Sfixed32),
            16 => Some(FieldType::Sfixed64),
            17 => Some(FieldType::Sint32),
            18 => Some(FieldType::Sint64),
            _ => None,
        }
    }
}

/// Top-level container of a compiled schema: an ordered list of files.
#[derive(Debug, Default, Clone)]
pub struct FileDescriptorSet {
    pub file: Vec<FileDescriptorProto>,
}

impl DecodeMessage for FileDescriptorSet {
    fn merge_from(&mut self, pb: &mut ProtoDecoder<'_>) -> Result<(), DecodeError> {
        while let Some((field_num, wire_type)) = pb.next_field()? {
            match field_num {
                1 => pb.parse_repeated_message_field(wire_type, &mut self.file)?,
                _ => pb.skip_field(wire_type)?,
            }
        }
        Ok(())
    }
}

/// One `.proto` file: its name, package, and declared messages.
#[derive(Debug, Default, Clone)]
pub struct FileDescriptorProto {
    pub name: String,
    pub package: String,
    pub message_type: Vec<DescriptorProto>,

    pub has_name: bool,
    pub has_package: bool,
}

impl DecodeMessage for FileDescriptorProto {
    fn merge_from(&mut self, pb: &mut ProtoDecoder<'_>) -> Result<(), DecodeError> {
        while let Some((field_num, wire_type)) = pb.next_field()? {
            match field_num {
                1 => pb.parse_bytearray_field(wire_type, &mut self.name, &mut self.has_name)?,
                2 => pb.parse_bytearray_field(wire_type, &mut self.package, &mut self.has_package)?,
                4 => pb.parse_repeated_message_field(wire_type, &mut self.message_type)?,
                _ => pb.skip_field(wire_type)?,
            }
        }
        Ok(())
    }
}

/// One message declaration.
#[derive(Debug, Default, Clone)]
pub struct DescriptorProto {
    pub name: String,
    pub field: Vec<FieldDescriptorProto>,

    pub has_name: bool,
}

impl DecodeMessage for DescriptorProto {
    fn merge_from(&mut self, pb: &mut ProtoDecoder<'_>) -> Result<(), DecodeError> {
        while let Some((field_num, wire_type)) = pb.next_field()? {
            match field_num {
                1 => pb.parse_bytearray_field(wire_type, &mut self.name, &mut self.has_name)?,
                2 => pb.parse_repeated_message_field(wire_type, &mut self.field)?,
                _ => pb.skip_field(wire_type)?,
            }
        }
        Ok(())
    }
}

/// One field declaration. `label` and `field_type` stay raw `i32`; use
/// [`Label::from_i32`] / [`FieldType::from_i32`] to interpret them, so an
/// unknown enum value survives decode and the generator can emit a
/// placeholder for it. For MESSAGE and ENUM fields `type_name` carries the
/// leading-dot qualified name of the referenced type. `has_default_value` is
/// the presence flag of the textual `default_value`.
#[derive(Debug, Default, Clone)]
pub struct FieldDescriptorProto {
    pub name: String,
    pub number: i32,
    pub label: i32,
    pub field_type: i32,
    pub type_name: String,
    pub default_value: String,

    pub has_name: bool,
    pub has_number: bool,
    pub has_label: bool,
    pub has_field_type: bool,
    pub has_type_name: bool,
    pub has_default_value: bool,
}

impl DecodeMessage for FieldDescriptorProto {
    fn merge_from(&mut self, pb: &mut ProtoDecoder<'_>) -> Result<(), DecodeError> {
        while let Some((field_num, wire_type)) = pb.next_field()? {
            match field_num {
                1 => pb.parse_bytearray_field(wire_type, &mut self.name, &mut self.has_name)?,
                3 => pb.parse_integral_field(wire_type, &mut self.number, &mut self.has_number)?,
                4 => pb.parse_integral_field(wire_type, &mut self.label, &mut self.has_label)?,
                5 => pb.parse_integral_field(
                    wire_type,
                    &mut self.field_type,
                    &mut self.has_field_type,
                )?,
                6 => pb.parse_bytearray_field(
                    wire_type,
                    &mut self.type_name,
                    &mut self.has_type_name,
                )?,
                7 => pb.parse_bytearray_field(
                    wire_type,
                    &mut self.default_value,
                    &mut self.has_default_value,
                )?,
                _ => pb.skip_field(wire_type)?,
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decoder::encode_varint;

    fn tag(field_num: u32, wire_type: u8) -> Vec<u8> {
        encode_varint(((field_num << 3) | wire_type as u32) as u64)
    }

    fn len_delimited(field_num: u32, payload: &[u8]) -> Vec<u8> {
        let mut out = tag(field_num, 2);
        out.extend(encode_varint(payload.len() as u64));
        out.extend_from_slice(payload);
        out
    }

    fn varint_field(field_num: u32, value: u64) -> Vec<u8> {
        let mut out = tag(field_num, 0);
        out.extend(encode_varint(value));
        out
    }

    #[test]
    fn decode_single_field_descriptor() {
        let mut field = len_delimited(1, b"size");
        field.extend(varint_field(3, 1));
        field.extend(varint_field(4, Label::Required as u64));
        field.extend(varint_field(5, FieldType::Int64 as u64));

        let decoded = FieldDescriptorProto::decode(&field).expect("decode");
        assert_eq!(decoded.name, "size");
        assert_eq!(decoded.number, 1);
        assert_eq!(Label::from_i32(decoded.label), Some(Label::Required));
        assert_eq!(FieldType::from_i32(decoded.field_type), Some(FieldType::Int64));
        assert!(!decoded.has_default_value);
        assert!(!decoded.has_type_name);
    }

    #[test]
    fn decode_nested_descriptor_set() {
        let mut field = len_delimited(1, b"id");
        field.extend(varint_field(3, 1));
        field.extend(varint_field(4, Label::Optional as u64));
        field.extend(varint_field(5, FieldType::Uint32 as u64));

        let mut message = len_delimited(1, b"Ping");
        message.extend(len_delimited(2, &field));

        let mut file = len_delimited(1, b"ping.proto");
        file.extend(len_delimited(4, &message));

        let set_bytes = len_delimited(1, &file);

        let set = FileDescriptorSet::decode(&set_bytes).expect("decode");
        assert_eq!(set.file.len(), 1);
        assert_eq!(set.file[0].name, "ping.proto");
        assert_eq!(set.file[0].message_type.len(), 1);
        let msg = &set.file[0].message_type[0];
        assert_eq!(msg.name, "Ping");
        assert_eq!(msg.field.len(), 1);
        assert_eq!(msg.field[0].name, "id");
    }

    #[test]
    fn unknown_descriptor_fields_are_skipped() {
        // A descriptor from a newer toolchain: extra field 99 (varint) ahead
        // of the ones we model.
        let mut field = varint_field(99, 7);
        field.extend(len_delimited(1, b"x"));
        field.extend(varint_field(3, 12));

        let decoded = FieldDescriptorProto::decode(&field).expect("decode");
        assert_eq!(decoded.name, "x");
        assert_eq!(decoded.number, 12);
    }

    #[test]
    fn unknown_enum_values_survive_decode() {
        let mut field = len_delimited(1, b"future");
        field.extend(varint_field(5, 200));
        let decoded = FieldDescriptorProto::decode(&field).expect("decode");
        assert_eq!(decoded.field_type, 200);
        assert_eq!(FieldType::from_i32(decoded.field_type), None);
    }
}
