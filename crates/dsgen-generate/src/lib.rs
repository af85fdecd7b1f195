//! Table generation and output fan-out for dsgen.
//!
//! A [`TableGenerator`] turns a table and a row range into output files: it
//! opens one destination per table of the family, drains a [`RowProducer`]
//! and routes every row of a [`RowGroup`] to its destination. The [`Driver`]
//! expands a whole [`dsgen_core::Session`] into generator calls.

pub mod driver;
pub mod engine;
pub mod errors;
pub mod output;
pub mod producer;
pub mod resolver;
pub mod synthetic;

pub use driver::{Driver, RunReport, TableReport, TableStatus};
pub use engine::TableGenerator;
pub use errors::{CloseFailure, GenerationError, ProducerError};
pub use output::{Destination, DestinationSink, FileSink, MemorySink, SinkEvent};
pub use producer::{GenerationRequest, RowGroup, RowGroups, RowProducer};
pub use resolver::{destination_tables, resolve_location};
pub use synthetic::SyntheticRowProducer;
