//! Type metadata that filters and sorts are compiled against.
//!
//! A [`Filterable`] type describes its members through a [`TypeShape`] and
//! exposes their runtime values as [`FieldValue`]s. Use
//! `#[derive(Filterable)]` rather than implementing the traits by hand.

use std::fmt;

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, Utc};
use smol_str::SmolStr;

/// Scalar member types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScalarType {
    String,
    Int,
    Float,
    Bool,
    Date,
    DateTime,
    DateTimeOffset,
}

impl ScalarType {
    /// Whether `gt`/`gte`/`lt`/`lte` apply.
    pub const fn is_orderable(self) -> bool {
        !matches!(self, Self::Bool)
    }

    /// Human readable name.
    pub const fn name(self) -> &'static str {
        match self {
            Self::String => "string",
            Self::Int => "integer",
            Self::Float => "float",
            Self::Bool => "boolean",
            Self::Date => "date",
            Self::DateTime => "date-time",
            Self::DateTimeOffset => "date-time with offset",
        }
    }
}

impl fmt::Display for ScalarType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Declared type of a member.
#[derive(Debug, Clone)]
pub enum FieldType {
    Scalar(ScalarType),
    /// A nested filterable type.
    Object(fn() -> TypeShape),
    /// A sequence of values.
    Collection(Box<FieldType>),
}

impl FieldType {
    /// Whether the member holds a collection.
    pub fn is_collection(&self) -> bool {
        matches!(self, Self::Collection(_))
    }

    /// The element type with every collection layer removed.
    pub fn element(&self) -> &FieldType {
        match self {
            Self::Collection(inner) => inner.element(),
            other => other,
        }
    }

    /// Scalar type of the element, if it is one.
    pub fn scalar(&self) -> Option<ScalarType> {
        match self.element() {
            Self::Scalar(scalar) => Some(*scalar),
            _ => None,
        }
    }

    /// Shape of the element, if it is an object.
    pub fn object_shape(&self) -> Option<TypeShape> {
        match self.element() {
            Self::Object(shape) => Some(shape()),
            _ => None,
        }
    }

    /// Human readable name, used in error messages.
    pub fn type_name(&self) -> String {
        match self {
            Self::Scalar(scalar) => scalar.name().to_string(),
            Self::Object(shape) => shape().name.to_string(),
            Self::Collection(inner) => format!("{}[]", inner.type_name()),
        }
    }
}

/// A member of a [`TypeShape`].
#[derive(Debug, Clone)]
pub struct FieldShape {
    pub name: &'static str,
    pub field_type: FieldType,
}

impl FieldShape {
    /// Describe a member.
    pub fn new(name: &'static str, field_type: FieldType) -> Self {
        Self { name, field_type }
    }
}

/// Members of a filterable type.
#[derive(Debug, Clone)]
pub struct TypeShape {
    pub name: &'static str,
    pub fields: Vec<FieldShape>,
}

impl TypeShape {
    /// Describe a type.
    pub fn new(name: &'static str, fields: Vec<FieldShape>) -> Self {
        Self { name, fields }
    }

    /// Look up a member by exact name.
    pub fn field(&self, name: &str) -> Option<&FieldShape> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Member names, in declaration order.
    pub fn field_names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.fields.iter().map(|f| f.name)
    }
}

/// Runtime value of a member.
#[derive(Clone)]
pub enum FieldValue<'a> {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(&'a str),
    Date(NaiveDate),
    DateTime(NaiveDateTime),
    DateTimeOffset(DateTime<FixedOffset>),
    Object(&'a dyn Filterable),
    List(Vec<FieldValue<'a>>),
}

impl FieldValue<'_> {
    /// Check if this is a null value.
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }
}

impl fmt::Debug for FieldValue<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => f.write_str("Null"),
            Self::Bool(v) => f.debug_tuple("Bool").field(v).finish(),
            Self::Int(v) => f.debug_tuple("Int").field(v).finish(),
            Self::Float(v) => f.debug_tuple("Float").field(v).finish(),
            Self::Str(v) => f.debug_tuple("Str").field(v).finish(),
            Self::Date(v) => f.debug_tuple("Date").field(v).finish(),
            Self::DateTime(v) => f.debug_tuple("DateTime").field(v).finish(),
            Self::DateTimeOffset(v) => f.debug_tuple("DateTimeOffset").field(v).finish(),
            Self::Object(_) => f.write_str("Object(..)"),
            Self::List(v) => f.debug_tuple("List").field(v).finish(),
        }
    }
}

/// A type filters can be compiled against.
pub trait Filterable {
    /// Static description of the members.
    fn shape() -> TypeShape
    where
        Self: Sized;

    /// Value of the member called `name`, [`FieldValue::Null`] when unknown.
    fn field(&self, name: &str) -> FieldValue<'_>;
}

/// A type usable as a member of a [`Filterable`] type.
pub trait Member {
    /// Declared type.
    fn field_type() -> FieldType;

    /// Runtime value.
    fn to_value(&self) -> FieldValue<'_>;
}

macro_rules! impl_member {
    ($($ty:ty => $scalar:ident, $variant:ident);* $(;)?) => {
        $(
            impl Member for $ty {
                fn field_type() -> FieldType {
                    FieldType::Scalar(ScalarType::$scalar)
                }

                fn to_value(&self) -> FieldValue<'_> {
                    FieldValue::$variant((*self).into())
                }
            }
        )*
    };
}

impl_member! {
    bool => Bool, Bool;
    i8 => Int, Int;
    i16 => Int, Int;
    i32 => Int, Int;
    i64 => Int, Int;
    u8 => Int, Int;
    u16 => Int, Int;
    u32 => Int, Int;
    f32 => Float, Float;
    f64 => Float, Float;
    NaiveDate => Date, Date;
    NaiveDateTime => DateTime, DateTime;
    DateTime<FixedOffset> => DateTimeOffset, DateTimeOffset;
}

impl Member for u64 {
    fn field_type() -> FieldType {
        FieldType::Scalar(ScalarType::Int)
    }

    fn to_value(&self) -> FieldValue<'_> {
        i64::try_from(*self)
            .map(FieldValue::Int)
            .unwrap_or(FieldValue::Float(*self as f64))
    }
}

impl Member for DateTime<Utc> {
    fn field_type() -> FieldType {
        FieldType::Scalar(ScalarType::DateTimeOffset)
    }

    fn to_value(&self) -> FieldValue<'_> {
        FieldValue::DateTimeOffset(self.fixed_offset())
    }
}

impl Member for String {
    fn field_type() -> FieldType {
        FieldType::Scalar(ScalarType::String)
    }

    fn to_value(&self) -> FieldValue<'_> {
        FieldValue::Str(self)
    }
}

impl Member for SmolStr {
    fn field_type() -> FieldType {
        FieldType::Scalar(ScalarType::String)
    }

    fn to_value(&self) -> FieldValue<'_> {
        FieldValue::Str(self.as_str())
    }
}

impl Member for &'static str {
    fn field_type() -> FieldType {
        FieldType::Scalar(ScalarType::String)
    }

    fn to_value(&self) -> FieldValue<'_> {
        FieldValue::Str(self)
    }
}

impl<T: Member> Member for Option<T> {
    fn field_type() -> FieldType {
        T::field_type()
    }

    fn to_value(&self) -> FieldValue<'_> {
        match self {
            Some(value) => value.to_value(),
            None => FieldValue::Null,
        }
    }
}

impl<T: Member> Member for Vec<T> {
    fn field_type() -> FieldType {
        FieldType::Collection(Box::new(T::field_type()))
    }

    fn to_value(&self) -> FieldValue<'_> {
        FieldValue::List(self.iter().map(Member::to_value).collect())
    }
}

impl<T: Member> Member for Box<T> {
    fn field_type() -> FieldType {
        T::field_type()
    }

    fn to_value(&self) -> FieldValue<'_> {
        T::to_value(self)
    }
}
