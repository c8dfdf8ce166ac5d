//! Chapter addressing: identifiers, selections and request targets.

mod identifier;
mod resolver;

pub use identifier::{
    ChapterIdentifier, ChapterNumber, ChapterSelection, IdentifierError, MAX_RANGE_LEN,
};
pub use resolver::{ChapterResolver, ChapterTarget, ID_PLACEHOLDER, ResolverSettings};
