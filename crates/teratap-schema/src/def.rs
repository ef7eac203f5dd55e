/// Wire type of a single schema field.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TypeTag {
    Int8,
    Uint8,
    Int16,
    Uint16,
    Int32,
    Uint32,
    Int64,
    Uint64,
    Float,
    Double,
    Bool,
    /// Length-prefixed blob.
    Byte,
    /// Null-terminated UTF-16LE text.
    String,
    /// Signed 16-bit heading, scaled to radians.
    Angle,
    /// Three little-endian `f32` components.
    Vec3,
    /// Three little-endian `i16` components.
    Offset3d,
    /// Bit-packed 32-bit skill identifier.
    SkillId32,
    /// Array link header: element count plus offset of the first element.
    Ref,
    /// Forward pointer to where a later field's data lives.
    OffsetRef,
    /// A scattered array; decoded by chasing its link header.
    Array,
    /// Placeholder that decodes to nothing.
    Null,
    /// A tag this decoder does not know. Kept so decoding can fail soft.
    Unknown(String),
}

impl TypeTag {
    /// Map a def-text tag to its type. Unrecognized tags are preserved
    /// verbatim rather than rejected at compile time.
    pub fn parse(tag: &str) -> Self {
        match tag {
            "int8" => Self::Int8,
            "uint8" => Self::Uint8,
            "int16" => Self::Int16,
            "uint16" => Self::Uint16,
            "int32" => Self::Int32,
            "uint32" => Self::Uint32,
            "int64" => Self::Int64,
            "uint64" => Self::Uint64,
            "float" => Self::Float,
            "double" => Self::Double,
            "bool" => Self::Bool,
            "byte" => Self::Byte,
            "string" => Self::String,
            "angle" => Self::Angle,
            "vec3" => Self::Vec3,
            "offset3d" => Self::Offset3d,
            "skillid32" => Self::SkillId32,
            "ref" => Self::Ref,
            "offset" => Self::OffsetRef,
            "array" => Self::Array,
            "#" => Self::Null,
            other => Self::Unknown(other.to_string()),
        }
    }

    /// The def-text spelling of this tag.
    pub fn as_str(&self) -> &str {
        match self {
            Self::Int8 => "int8",
            Self::Uint8 => "uint8",
            Self::Int16 => "int16",
            Self::Uint16 => "uint16",
            Self::Int32 => "int32",
            Self::Uint32 => "uint32",
            Self::Int64 => "int64",
            Self::Uint64 => "uint64",
            Self::Float => "float",
            Self::Double => "double",
            Self::Bool => "bool",
            Self::Byte => "byte",
            Self::String => "string",
            Self::Angle => "angle",
            Self::Vec3 => "vec3",
            Self::Offset3d => "offset3d",
            Self::SkillId32 => "skillid32",
            Self::Ref => "ref",
            Self::OffsetRef => "offset",
            Self::Array => "array",
            Self::Null => "#",
            Self::Unknown(tag) => tag,
        }
    }
}

impl std::fmt::Display for TypeTag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One field of a message schema, in wire order.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldDef {
    pub name: String,
    pub tag: TypeTag,
    /// Element layout for `array` fields; empty for everything else.
    pub elements: Vec<FieldDef>,
}

impl FieldDef {
    /// A field with no element layout.
    pub fn scalar(name: impl Into<String>, tag: TypeTag) -> Self {
        Self {
            name: name.into(),
            tag,
            elements: Vec::new(),
        }
    }
}

/// The ordered field layout of one message.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct MessageSchema {
    pub fields: Vec<FieldDef>,
}
