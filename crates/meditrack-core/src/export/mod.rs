//! Export functionality: whole-database backups.

mod backup;

pub use backup::*;
