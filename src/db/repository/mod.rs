pub mod catalog;
pub mod module;
pub mod requirement;

pub use catalog::*;
pub use module::*;
pub use requirement::*;

/// Timestamp format used for all TEXT-encoded datetimes in the store.
pub(crate) const DATETIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";
