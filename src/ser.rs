//! `serde::Serialize` for decoded and lazy items.
//!
//! Tags have no counterpart in the serde data model: a tagged item
//! serializes as its content, except big integers, which serialize as the
//! number they encode. Null and undefined both become unit.

use serde::{
    Serialize, Serializer,
    ser::{Error as _, SerializeMap, SerializeSeq},
};

use crate::{Error, MAX_NESTING, MajorType, Object, SemanticType, Selection, Value};

fn serialize_integer<S: Serializer>(n: i128, serializer: S) -> Result<S::Ok, S::Error> {
    if let Ok(n) = i64::try_from(n) {
        serializer.serialize_i64(n)
    } else if let Ok(n) = u64::try_from(n) {
        serializer.serialize_u64(n)
    } else {
        serializer.serialize_i128(n)
    }
}

impl Serialize for Object {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Object::Null | Object::Undefined => serializer.serialize_unit(),
            Object::Bool(b) => serializer.serialize_bool(*b),
            Object::Integer(n) => serialize_integer(*n, serializer),
            Object::Float(f) => serializer.serialize_f64(*f),
            Object::Bytes(bytes) => serializer.serialize_bytes(bytes),
            Object::Text(text) => serializer.serialize_str(text),
            Object::Sequence(items) => serializer.collect_seq(items),
            Object::Dictionary(entries) => {
                let mut map = serializer.serialize_map(Some(entries.len()))?;
                for (key, value) in entries {
                    map.serialize_entry(key, value)?;
                }
                map.end()
            }
            Object::Tagged(_, content) => content.serialize(serializer),
            Object::Simple(value) => serializer.serialize_u8(*value),
        }
    }
}

impl Serialize for Value<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        Nested {
            value: self,
            depth: 0,
        }
        .serialize(serializer)
    }
}

/// A value being serialized `depth` levels below the top-level item.
struct Nested<'a, 's> {
    value: &'a Value<'s>,
    depth: usize,
}

impl Nested<'_, '_> {
    #[inline]
    fn child<'a, 's>(&self, value: &'a Value<'s>) -> Nested<'a, 's> {
        Nested {
            value,
            depth: self.depth + 1,
        }
    }
}

impl Serialize for Nested<'_, '_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let value = self.value;
        if self.depth > MAX_NESTING {
            return Err(S::Error::custom(Error::DepthLimit {
                offset: value.offset(),
            }));
        }
        match value.major_type() {
            MajorType::Unsigned => {
                serializer.serialize_u64(value.as_u64().map_err(S::Error::custom)?)
            }
            MajorType::Negative => {
                serialize_integer(value.as_i128().map_err(S::Error::custom)?, serializer)
            }
            MajorType::Bytes => {
                serializer.serialize_bytes(&value.as_bytes().map_err(S::Error::custom)?)
            }
            MajorType::Text => {
                serializer.serialize_str(&value.as_text().map_err(S::Error::custom)?)
            }
            MajorType::Sequence => {
                let sequence = value.sequence().map_err(S::Error::custom)?;
                let mut seq = serializer.serialize_seq(Some(sequence.len()))?;
                for item in &sequence {
                    seq.serialize_element(&self.child(&item.map_err(S::Error::custom)?))?;
                }
                seq.end()
            }
            MajorType::Dictionary => {
                let dictionary = value.dictionary().map_err(S::Error::custom)?;
                let mut map = serializer.serialize_map(Some(dictionary.len()))?;
                for entry in &dictionary {
                    let (key, value) = entry.map_err(S::Error::custom)?;
                    map.serialize_entry(&self.child(&key), &self.child(&value))?;
                }
                map.end()
            }
            MajorType::Tag => {
                if value.semantic_type() == SemanticType::BigInteger {
                    if let Ok(n) = value.as_i128() {
                        return serialize_integer(n, serializer);
                    }
                }
                let content = value.tagged().map_err(S::Error::custom)?;
                self.child(&content).serialize(serializer)
            }
            MajorType::Simple => {
                if value.is_null() || value.is_undefined() {
                    serializer.serialize_unit()
                } else if let Ok(b) = value.as_bool() {
                    serializer.serialize_bool(b)
                } else if let Ok(f) = value.as_f64() {
                    serializer.serialize_f64(f)
                } else {
                    serializer.serialize_u8(value.as_simple().map_err(S::Error::custom)?)
                }
            }
        }
    }
}

impl Serialize for Selection<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Selection::Absent => serializer.serialize_none(),
            Selection::Value(value) => value.serialize(serializer),
            Selection::Object(object) => object.serialize(serializer),
            Selection::Sequence(items) => serializer.collect_seq(items),
            Selection::Dictionary(entries) => {
                let mut map = serializer.serialize_map(Some(entries.len()))?;
                for (key, value) in entries {
                    map.serialize_entry(key, value)?;
                }
                map.end()
            }
        }
    }
}
