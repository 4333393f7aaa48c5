pub mod config;
pub mod diff;
pub mod digest;
pub mod identifiers;
pub mod language;
pub mod report;

pub use digest::{parse_diff_patch, Change, ChangeKind, DigestError, Hunk, Identifier};
pub use language::{is_language_supported, Language};
