//! The type model: the closed `DataType` set used to annotate
//! expressions, and the structured `TypeDef` descriptors stored in the
//! symbol table for user-defined types.
//!
//! Type definitions are never round-tripped through source text: a
//! declaration like `array[1..3, 'a'..'z'] of real` becomes an
//! [`TypeDef::Array`] with its dimension metadata attached, which is all
//! the emitter needs to flatten indices.

use std::fmt;

/// The closed set of expression-level data types.
#[derive(Clone, Debug, PartialEq)]
pub enum DataType {
    Integer,
    Real,
    Boolean,
    Char,
    Byte,
    String,
    /// Any pointer value; the pointee travels alongside in [`Ty`].
    Pointer,
    /// Text file handle.
    Text,
    /// Untyped or typed binary file handle.
    File,
    /// A user-named type; the name is declaration-cased.
    Custom(String),
    /// Procedures and proper statements.
    Void,
    /// Typing failed; an error diagnostic was recorded alongside.
    Unknown,
}

impl DataType {
    /// Integer, Real or Byte.
    pub fn is_numeric(&self) -> bool {
        matches!(self, DataType::Integer | DataType::Real | DataType::Byte)
    }

    /// Integer-like (usable with `div`, `mod`, `shl`, `shr`).
    pub fn is_integral(&self) -> bool {
        matches!(self, DataType::Integer | DataType::Byte)
    }

    /// Ordinal without consulting type descriptors: integer, byte, char,
    /// boolean. Enums and subranges are decided by the analyser from
    /// their descriptor.
    pub fn is_plain_ordinal(&self) -> bool {
        matches!(
            self,
            DataType::Integer | DataType::Byte | DataType::Char | DataType::Boolean
        )
    }

    /// The Pascal-facing name, for diagnostics.
    pub fn name(&self) -> String {
        match self {
            DataType::Integer => "integer".to_string(),
            DataType::Real => "real".to_string(),
            DataType::Boolean => "boolean".to_string(),
            DataType::Char => "char".to_string(),
            DataType::Byte => "byte".to_string(),
            DataType::String => "string".to_string(),
            DataType::Pointer => "pointer".to_string(),
            DataType::Text => "text".to_string(),
            DataType::File => "file".to_string(),
            DataType::Custom(name) => name.clone(),
            DataType::Void => "void".to_string(),
            DataType::Unknown => "<unknown>".to_string(),
        }
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name())
    }
}

/// One dimension of an array type.
#[derive(Clone, Debug, PartialEq)]
pub enum Dimension {
    /// Numeric bounds, inclusive.
    IntRange(i64, i64),
    /// Character bounds, inclusive.
    CharRange(char, char),
    /// An enumeration domain; cardinality comes from the enum's
    /// descriptor.
    EnumRange(String),
}

/// A field of a record descriptor. Variant-part fields are flattened
/// into the same list as the fixed fields.
#[derive(Clone, Debug, PartialEq)]
pub struct RecordField {
    pub name: String,
    pub ty: TypeDef,
}

/// Structured descriptor of a type definition.
#[derive(Clone, Debug, PartialEq)]
pub enum TypeDef {
    /// A built-in type.
    Builtin(DataType),
    /// A reference to another named user type (lowercased key).
    Named(String),
    /// `^T`.
    Pointer(Box<TypeDef>),
    /// `array[...] of T` with resolved dimensions.
    Array {
        dims: Vec<Dimension>,
        elem: Box<TypeDef>,
    },
    /// `set of T`.
    Set(Box<TypeDef>),
    /// `record ... end` with the variant part flattened in.
    Record { fields: Vec<RecordField> },
    /// `string[N]`.
    BoundedString(u32),
    /// An ordinal subrange; values behave as the base type.
    Subrange { base: DataType, lo: i64, hi: i64 },
    /// An enumeration; `ord` of each value is its position.
    Enum(Vec<String>),
    /// `file of T`.
    FileOf(Box<TypeDef>),
}

impl TypeDef {
    /// Returns true for set descriptors.
    pub fn is_set(&self) -> bool {
        matches!(self, TypeDef::Set(_))
    }

    /// Returns true for record descriptors.
    pub fn is_record(&self) -> bool {
        matches!(self, TypeDef::Record { .. })
    }

    /// Looks up a record field case-insensitively.
    pub fn field(&self, name: &str) -> Option<&RecordField> {
        match self {
            TypeDef::Record { fields } => fields
                .iter()
                .find(|f| f.name.eq_ignore_ascii_case(name)),
            _ => None,
        }
    }
}

/// A resolved expression or symbol type: the closed [`DataType`] plus
/// the pointer pointee and the structural descriptor for custom types.
#[derive(Clone, Debug)]
pub struct Ty {
    pub data: DataType,
    /// Pointee type name, for pointer values (None for `nil`).
    pub pointee: Option<String>,
    /// Resolved descriptor for custom types.
    pub def: Option<TypeDef>,
}

impl Ty {
    /// A plain built-in type.
    pub fn simple(data: DataType) -> Self {
        Self {
            data,
            pointee: None,
            def: None,
        }
    }

    /// The `Unknown` annotation used after a typing error.
    pub fn unknown() -> Self {
        Self::simple(DataType::Unknown)
    }

    /// A pointer to the named type.
    pub fn pointer_to(pointee: impl Into<String>) -> Self {
        Self {
            data: DataType::Pointer,
            pointee: Some(pointee.into()),
            def: None,
        }
    }

    /// A custom type with its descriptor.
    pub fn custom(name: impl Into<String>, def: TypeDef) -> Self {
        Self {
            data: DataType::Custom(name.into()),
            pointee: None,
            def: Some(def),
        }
    }

    pub fn is_unknown(&self) -> bool {
        self.data == DataType::Unknown
    }

    /// String or bounded string.
    pub fn is_string_like(&self) -> bool {
        self.data == DataType::String || self.is_bounded_string()
    }

    pub fn is_bounded_string(&self) -> bool {
        matches!(self.def, Some(TypeDef::BoundedString(_)))
    }

    pub fn is_set(&self) -> bool {
        matches!(self.def, Some(TypeDef::Set(_)))
    }

    pub fn is_record(&self) -> bool {
        matches!(self.def, Some(TypeDef::Record { .. }))
    }

    pub fn is_enum(&self) -> bool {
        matches!(self.def, Some(TypeDef::Enum(_)))
    }

    pub fn is_array(&self) -> bool {
        matches!(self.def, Some(TypeDef::Array { .. }))
    }

    /// File handle of either flavour.
    pub fn is_file(&self) -> bool {
        matches!(self.data, DataType::Text | DataType::File)
            || matches!(self.def, Some(TypeDef::FileOf(_)))
    }

    /// Legal as loop variable, case selector or set element.
    pub fn is_ordinal(&self) -> bool {
        self.data.is_plain_ordinal() || self.is_enum()
    }
}
