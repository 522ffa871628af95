//! Typed identifiers for content aggregates

use kernel::id::{Id, markers};

pub type PostId = Id<markers::Post>;
pub type CategoryId = Id<markers::Category>;
pub type AuthorId = Id<markers::Author>;
