mod container;
mod decoder;
mod error;
pub mod geometry;
pub mod header;
mod key;
mod kind;
mod object;
pub mod query;
mod semantic;
#[cfg(feature = "serde")]
mod ser;
pub mod source;
mod util;
mod value;

pub use container::*;
pub use decoder::*;
pub use error::*;
pub use header::{Header, MajorType};
pub use key::*;
pub use kind::*;
pub use object::*;
pub use query::{
    Query, QueryBuilder, Selection, extract, read, read_all, read_with,
};
pub use semantic::*;
pub use source::{ByteSource, ChunkedSource};
pub(crate) use util::cold_path;
pub use value::*;
