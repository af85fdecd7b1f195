//! Core contracts for dsgen.
//!
//! This crate defines the benchmark table catalog, row ranges, the session
//! configuration and row text formatting shared by the generator and the CLI.

pub mod error;
pub mod format;
pub mod range;
pub mod session;
pub mod table;

pub use error::{CoreError, Result};
pub use format::RowFormat;
pub use range::RowRange;
pub use session::{OutputConfig, Session, session_json_schema};
pub use table::{ChildTable, Table, TableFamily, TableRole};
