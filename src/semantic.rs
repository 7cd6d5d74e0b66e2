//! Semantic-tag resolution.
//!
//! A tagged item's meaning is resolved by an ordered list of
//! [`TagResolver`]s held in a [`TagRegistry`]. The first resolver that
//! recognizes a tag wins; tags nobody recognizes resolve to
//! [`SemanticType::Unknown`] and stay readable as opaque tagged values.

use std::{
    fmt,
    sync::{Arc, LazyLock},
};

use crate::{MajorType, Object, Reader, Result, Value};

/// The refined meaning of an item.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum SemanticType {
    /// The item carries no semantic tag.
    Untagged,
    DateTime,
    BigInteger,
    Fraction,
    Uri,
    /// A byte string holding another encoded item.
    EncodedItem,
    /// A tag no registered resolver recognizes.
    Unknown,
}

impl fmt::Display for SemanticType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            SemanticType::Untagged => "untagged",
            SemanticType::DateTime => "date-time",
            SemanticType::BigInteger => "big integer",
            SemanticType::Fraction => "fraction",
            SemanticType::Uri => "uri",
            SemanticType::EncodedItem => "encoded item",
            SemanticType::Unknown => "unknown",
        })
    }
}

/// Resolves and decodes tagged items.
///
/// Resolvers must be stateless with respect to evaluation: one registry is
/// shared by every run that reads through it.
pub trait TagResolver: Send + Sync + fmt::Debug {
    /// Returns the semantic type of the tag item at `offset` carrying tag
    /// number `tag`, or `None` if this resolver does not handle it.
    fn resolve(&self, reader: &Reader<'_>, offset: usize, tag: u64) -> Option<SemanticType>;

    /// Decodes a tagged value this resolver handles into a native object.
    ///
    /// Returns `Ok(None)` to leave the value as an opaque tagged object.
    fn decode(&self, value: &Value<'_>) -> Result<Option<Object>> {
        let _ = value;
        Ok(None)
    }
}

/// An ordered list of tag resolvers.
#[derive(Clone, Debug, Default)]
pub struct TagRegistry {
    resolvers: Vec<Arc<dyn TagResolver>>,
}

static STANDARD: LazyLock<TagRegistry> = LazyLock::new(TagRegistry::standard);

impl TagRegistry {
    /// A registry that resolves nothing; every tag is [`SemanticType::Unknown`].
    pub fn empty() -> Self {
        Self::default()
    }

    /// A registry holding [`StandardTags`].
    pub fn standard() -> Self {
        Self::empty().with_resolver(StandardTags)
    }

    /// The process-wide standard registry used by [`Reader::new`].
    pub fn standard_ref() -> &'static TagRegistry {
        &STANDARD
    }

    /// Appends a resolver; earlier resolvers take precedence.
    pub fn with_resolver(mut self, resolver: impl TagResolver + 'static) -> Self {
        self.resolvers.push(Arc::new(resolver));
        self
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.resolvers.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.resolvers.is_empty()
    }

    pub fn resolve(&self, reader: &Reader<'_>, offset: usize, tag: u64) -> SemanticType {
        self.resolvers
            .iter()
            .find_map(|resolver| resolver.resolve(reader, offset, tag))
            .unwrap_or(SemanticType::Unknown)
    }

    pub fn decode(&self, value: &Value<'_>) -> Result<Option<Object>> {
        for resolver in &self.resolvers {
            if let Some(object) = resolver.decode(value)? {
                return Ok(Some(object));
            }
        }
        Ok(None)
    }
}

/// Classifies the commonly registered tags.
///
/// | tag | content | semantic type |
/// |-----|---------|---------------|
/// | 0 | text | date-time |
/// | 1 | integer or float | date-time |
/// | 2, 3 | bytes | big integer |
/// | 4, 5 | sequence | fraction |
/// | 24 | bytes | encoded item |
/// | 32 | text | uri |
///
/// A known tag whose content has the wrong major type is left unresolved.
/// Big integers that fit in `i128` decode to [`Object::Integer`].
#[derive(Clone, Copy, Debug, Default)]
pub struct StandardTags;

impl TagResolver for StandardTags {
    fn resolve(&self, reader: &Reader<'_>, offset: usize, tag: u64) -> Option<SemanticType> {
        let (semantic, expected): (SemanticType, &[MajorType]) = match tag {
            0 => (SemanticType::DateTime, &[MajorType::Text]),
            1 => (
                SemanticType::DateTime,
                &[MajorType::Unsigned, MajorType::Negative, MajorType::Simple],
            ),
            2 | 3 => (SemanticType::BigInteger, &[MajorType::Bytes]),
            4 | 5 => (SemanticType::Fraction, &[MajorType::Sequence]),
            24 => (SemanticType::EncodedItem, &[MajorType::Bytes]),
            32 => (SemanticType::Uri, &[MajorType::Text]),
            _ => return None,
        };
        let content = reader.content_header(offset).ok()?;
        expected.contains(&content.major).then_some(semantic)
    }

    fn decode(&self, value: &Value<'_>) -> Result<Option<Object>> {
        if value.semantic_type() != SemanticType::BigInteger {
            return Ok(None);
        }
        match value.as_i128() {
            Ok(n) => Ok(Some(Object::Integer(n))),
            Err(crate::Error::IntegerOverflow { .. }) => Ok(None),
            Err(e) => Err(e),
        }
    }
}
