use std::fmt;

use crate::{MajorType, SemanticType, Value, header};

/// The type of an item as seen by type assertions and error reports.
///
/// Most variants describe one concrete kind of item. [`Integer`](ValueType::Integer),
/// [`Tagged`](ValueType::Tagged) and [`Any`](ValueType::Any) are wider
/// classes that are only useful as expectations.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum ValueType {
    Unsigned,
    Negative,
    /// Unsigned, negative, or a big integer tag.
    Integer,
    Bytes,
    Text,
    Sequence,
    Dictionary,
    /// Any tagged item.
    Tagged,
    /// A tagged item with the given resolved meaning.
    Semantic(SemanticType),
    Float,
    Bool,
    Null,
    Undefined,
    Simple,
    Any,
}

impl ValueType {
    /// The most specific type describing `value`.
    pub fn of(value: &Value<'_>) -> Self {
        match value.major_type() {
            MajorType::Unsigned => Self::Unsigned,
            MajorType::Negative => Self::Negative,
            MajorType::Bytes => Self::Bytes,
            MajorType::Text => Self::Text,
            MajorType::Sequence => Self::Sequence,
            MajorType::Dictionary => Self::Dictionary,
            MajorType::Tag => match value.semantic_type() {
                SemanticType::Unknown | SemanticType::Untagged => Self::Tagged,
                semantic => Self::Semantic(semantic),
            },
            MajorType::Simple => Self::of_simple(value.selector()),
        }
    }

    pub(crate) fn of_major(major: MajorType) -> Self {
        match major {
            MajorType::Unsigned => Self::Unsigned,
            MajorType::Negative => Self::Negative,
            MajorType::Bytes => Self::Bytes,
            MajorType::Text => Self::Text,
            MajorType::Sequence => Self::Sequence,
            MajorType::Dictionary => Self::Dictionary,
            MajorType::Tag => Self::Tagged,
            MajorType::Simple => Self::Simple,
        }
    }

    fn of_simple(selector: u8) -> Self {
        match selector {
            header::SIMPLE_FALSE | header::SIMPLE_TRUE => Self::Bool,
            header::SIMPLE_NULL => Self::Null,
            header::SIMPLE_UNDEFINED => Self::Undefined,
            header::FLOAT_HALF | header::FLOAT_SINGLE | header::FLOAT_DOUBLE => Self::Float,
            _ => Self::Simple,
        }
    }

    /// Returns `true` if `value` satisfies this type.
    pub fn accepts(self, value: &Value<'_>) -> bool {
        let actual = Self::of(value);
        match self {
            Self::Any => true,
            Self::Integer => matches!(
                actual,
                Self::Unsigned | Self::Negative | Self::Semantic(SemanticType::BigInteger)
            ),
            Self::Tagged => value.major_type() == MajorType::Tag,
            Self::Semantic(SemanticType::Unknown) => {
                value.major_type() == MajorType::Tag
                    && value.semantic_type() == SemanticType::Unknown
            }
            expected => expected == actual,
        }
    }
}

impl fmt::Display for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValueType::Unsigned => f.write_str("unsigned integer"),
            ValueType::Negative => f.write_str("negative integer"),
            ValueType::Integer => f.write_str("integer"),
            ValueType::Bytes => f.write_str("byte string"),
            ValueType::Text => f.write_str("text string"),
            ValueType::Sequence => f.write_str("sequence"),
            ValueType::Dictionary => f.write_str("dictionary"),
            ValueType::Tagged => f.write_str("tagged value"),
            ValueType::Semantic(semantic) => write!(f, "{semantic} tag"),
            ValueType::Float => f.write_str("float"),
            ValueType::Bool => f.write_str("bool"),
            ValueType::Null => f.write_str("null"),
            ValueType::Undefined => f.write_str("undefined"),
            ValueType::Simple => f.write_str("simple value"),
            ValueType::Any => f.write_str("any"),
        }
    }
}
