//! Emit Rust source from a decoded compiled schema.
//!
//! For each message declared in the first file of a [`FileDescriptorSet`],
//! the generator emits a record definition (fields, then one presence flag
//! per non-repeated field), a `Default` impl carrying the schema's declared
//! default values, and a [`DecodeMessage`](crate::decoder::DecodeMessage)
//! impl whose body is a `match` over field numbers dispatching to the
//! decoder entry point for the field's declared type and cardinality.
//!
//! Messages are emitted in declaration order and fields in descriptor order;
//! Rust item order is not significant, so no reordering is needed for
//! references between sibling messages. Anything the generator cannot
//! express (group fields, a type code it does not know) is emitted as a
//! recognizable `?group` / `?type` placeholder rather than silently dropped.
//!
//! Output is accumulated in a `String` and returned whole, so a caller can
//! withhold it from the output sink until generation has succeeded.

use crate::descriptor::{
    DescriptorProto, FieldDescriptorProto, FieldType, FileDescriptorSet, Label,
};

/// Decoder entry-point family the field dispatches to: `parse_<domain>_field`
/// or `parse_repeated_<domain>_field`.
fn domain_token(field: &FieldDescriptorProto) -> &'static str {
    match FieldType::from_i32(field.field_type) {
        Some(FieldType::Double | FieldType::Float) => "fp",
        Some(FieldType::Sint32 | FieldType::Sint64) => "zigzag",
        Some(FieldType::String | FieldType::Bytes) => "bytearray",
        Some(FieldType::Message) => "message",
        Some(FieldType::Group) => "?group",
        _ => "integral",
    }
}

/// Rust type for a single (non-repeated) value of the field.
fn base_type(field: &FieldDescriptorProto) -> String {
    match FieldType::from_i32(field.field_type) {
        Some(FieldType::Int32 | FieldType::Sint32 | FieldType::Sfixed32) => "i32".to_string(),
        Some(FieldType::Int64 | FieldType::Sint64 | FieldType::Sfixed64) => "i64".to_string(),
        Some(FieldType::Uint32 | FieldType::Fixed32) => "u32".to_string(),
        Some(FieldType::Uint64 | FieldType::Fixed64) => "u64".to_string(),
        Some(FieldType::Double) => "f64".to_string(),
        Some(FieldType::Float) => "f32".to_string(),
        Some(FieldType::Bool) => "bool".to_string(),
        Some(FieldType::Enum) => "i32".to_string(),
        Some(FieldType::String) => "String".to_string(),
        Some(FieldType::Bytes) => "Vec<u8>".to_string(),
        Some(FieldType::Message) => referenced_record_name(&field.type_name),
        Some(FieldType::Group) => "?group".to_string(),
        None => "?type".to_string(),
    }
}

/// Record name for a MESSAGE field: `type_name` arrives as a leading-dot
/// qualified name (".pkg.Outer"); all records land flat in one output file,
/// so only the last path segment is referenced.
fn referenced_record_name(type_name: &str) -> String {
    let qualified = type_name.trim_start_matches('.');
    match qualified.rsplit('.').next() {
        Some(last) if !last.is_empty() => last.to_string(),
        _ => qualified.to_string(),
    }
}

/// Declared type of the struct field, `Vec`-wrapped for REPEATED.
fn field_decl_type(field: &FieldDescriptorProto) -> String {
    let base = base_type(field);
    if Label::from_i32(field.label) == Some(Label::Repeated) {
        format!("Vec<{}>", base)
    } else {
        base
    }
}

/// Initializer expression for the field in the emitted `Default` impl. A
/// declared schema default is emitted textually: quoted for STRING/BYTES,
/// verbatim for everything else.
fn default_initializer(field: &FieldDescriptorProto) -> String {
    if Label::from_i32(field.label) == Some(Label::Repeated) {
        return "Vec::new()".to_string();
    }
    let field_type = FieldType::from_i32(field.field_type);
    if field.has_default_value {
        return match field_type {
            Some(FieldType::String) => format!("{:?}.to_string()", field.default_value),
            Some(FieldType::Bytes) => format!("b{:?}.to_vec()", field.default_value),
            _ => field.default_value.clone(),
        };
    }
    match field_type {
        Some(FieldType::Double | FieldType::Float) => "0.0".to_string(),
        Some(FieldType::Bool) => "false".to_string(),
        Some(FieldType::String) => "String::new()".to_string(),
        Some(FieldType::Bytes) => "Vec::new()".to_string(),
        Some(FieldType::Message) => format!("{}::default()", base_type(field)),
        Some(FieldType::Group) => "?group".to_string(),
        None => "?type".to_string(),
        _ => "0".to_string(),
    }
}

fn dispatch_arm(field: &FieldDescriptorProto) -> String {
    let domain = domain_token(field);
    if Label::from_i32(field.label) == Some(Label::Repeated) {
        format!(
            "                {} => pb.parse_repeated_{}_field(wire_type, &mut self.{})?,\n",
            field.number, domain, field.name
        )
    } else {
        format!(
            "                {0} => pb.parse_{1}_field(wire_type, &mut self.{2}, &mut self.has_{2})?,\n",
            field.number, domain, field.name
        )
    }
}

fn required_check(message_name: &str, field_name: &str) -> String {
    [
        format!("        if !self.has_{} {{", field_name),
        "            return Err(DecodeError::MissingRequired {".to_string(),
        format!("                message: {:?},", message_name),
        format!("                field: {:?},", field_name),
        "            });".to_string(),
        "        }".to_string(),
        String::new(),
    ]
    .join("\n")
}

/// Record definition plus decode routine for one message.
fn message_source(message: &DescriptorProto) -> String {
    let mut fields_defs = String::new();
    let mut has_defs = String::new();
    let mut default_inits = String::new();
    let mut has_inits = String::new();
    let mut decode_cases = String::new();
    let mut required_checks = String::new();
    let mut any_declared_default = false;

    for field in &message.field {
        let repeated = Label::from_i32(field.label) == Some(Label::Repeated);

        fields_defs.push_str(&format!(
            "    pub {}: {},\n",
            field.name,
            field_decl_type(field)
        ));
        if !repeated {
            has_defs.push_str(&format!("    pub has_{}: bool,\n", field.name));
            has_inits.push_str(&format!("            has_{}: false,\n", field.name));
        }

        if field.has_default_value {
            any_declared_default = true;
        }
        default_inits.push_str(&format!(
            "            {}: {},\n",
            field.name,
            default_initializer(field)
        ));

        decode_cases.push_str(&dispatch_arm(field));

        if Label::from_i32(field.label) == Some(Label::Required) {
            required_checks.push_str(&required_check(&message.name, &field.name));
        }
    }

    // Without declared defaults the all-zero derive is exactly right; with
    // them the initializers must be spelled out.
    let mut out = String::new();
    if any_declared_default {
        out.push_str("#[derive(Debug, Clone)]\n");
    } else {
        out.push_str("#[derive(Debug, Clone, Default)]\n");
    }
    out.push_str(&format!("pub struct {} {{\n", message.name));
    out.push_str(&fields_defs);
    if !has_defs.is_empty() {
        out.push('\n');
        out.push_str(&has_defs);
    }
    out.push_str("}\n\n");

    if any_declared_default {
        out.push_str(&format!(
            "impl Default for {name} {{\n    fn default() -> Self {{\n        {name} {{\n",
            name = message.name
        ));
        out.push_str(&default_inits);
        out.push_str(&has_inits);
        out.push_str("        }\n    }\n}\n\n");
    }

    out.push_str(&format!("impl DecodeMessage for {} {{\n", message.name));
    out.push_str(
        "    fn merge_from(&mut self, pb: &mut ProtoDecoder<'_>) -> Result<(), DecodeError> {\n",
    );
    out.push_str("        while let Some((field_num, wire_type)) = pb.next_field()? {\n");
    out.push_str("            match field_num {\n");
    out.push_str(&decode_cases);
    out.push_str("                _ => pb.skip_field(wire_type)?,\n");
    out.push_str("            }\n");
    out.push_str("        }\n");
    out.push_str(&required_checks);
    out.push_str("        Ok(())\n    }\n}\n");
    out
}

fn file_prologue(source_name: &str) -> String {
    format!(
        "// Generated by pbgen from {}. Do not edit.\n\n\
         use pbwire::{{DecodeError, DecodeMessage, ProtoDecoder}};\n",
        source_name
    )
}

/// Emits the full output file for the first file in the set. Additional
/// files in the set are ignored; a set with no files yields just the
/// prologue.
pub fn generate_file(set: &FileDescriptorSet, source_name: &str) -> String {
    let mut out = file_prologue(source_name);
    let file = match set.file.first() {
        Some(f) => f,
        None => return out,
    };
    for message_type in &file.message_type {
        out.push('\n');
        out.push_str(&message_source(message_type));
    }
    out
}
