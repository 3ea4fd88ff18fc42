//! Storage for Quill.
//!
//! Two persistence units with deliberately different shapes:
//!
//! - **entries**: one independent owner-only record file per entry,
//!   overwritten unconditionally, deleted idempotently.
//! - **collection**: one document holding every journal's metadata and
//!   the default-journal pointer, always saved wholesale.
//!
//! An entry and its journal reference each other (record carries the
//! journal name, journal carries the ID list) with no shared transaction,
//! so the two sides are only mutated together through [`crate::vault`].

pub mod collection;
pub mod entries;
pub mod types;

// Re-export public types
pub use collection::CollectionStore;
pub use entries::EntryStore;
pub use types::{Collection, EntryRecord, JournalMeta};
