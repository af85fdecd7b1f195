use std::io;

use thiserror::Error;

use dsgen_core::{CoreError, RowRange, Table, TableRole};

/// Errors raised by a [`crate::RowProducer`] while producing rows.
#[derive(Debug, Error)]
pub enum ProducerError {
    #[error("invalid row range {range} for table {table}")]
    InvalidRange { table: Table, range: RowRange },
    #[error("{0}")]
    Other(String),
}

/// A destination that could not be closed.
#[derive(Debug, Error)]
#[error("failed to close {role} destination {location} of table {table}: {source}")]
pub struct CloseFailure {
    pub table: Table,
    pub role: TableRole,
    pub location: String,
    #[source]
    pub source: io::Error,
}

/// Errors emitted while generating tables.
#[derive(Debug, Error)]
pub enum GenerationError {
    #[error("failed to open destination {location} for table {table}: {source}")]
    DestinationOpen {
        table: Table,
        location: String,
        #[source]
        source: io::Error,
    },
    #[error("row production failed for table {table}: {source}")]
    RowProduction {
        table: Table,
        #[source]
        source: ProducerError,
    },
    #[error("failed to write {role} row of table {table}: {source}")]
    Write {
        table: Table,
        role: TableRole,
        #[source]
        source: io::Error,
    },
    #[error("row {row} of table {table} has child rows but no child destination is open")]
    UnexpectedChildRows { table: Table, row: u64 },
    #[error("failed to close {} destination(s): {}", .0.len(), join_failures(.0))]
    Close(Vec<CloseFailure>),
    #[error(
        "{primary}; additionally failed to close {} destination(s): {}",
        .close_failures.len(),
        join_failures(.close_failures)
    )]
    WithCloseFailures {
        primary: Box<GenerationError>,
        close_failures: Vec<CloseFailure>,
    },
    #[error("generation worker panicked: {0}")]
    WorkerPanicked(String),
    #[error(transparent)]
    Core(#[from] CoreError),
    #[error("io error: {0}")]
    Io(#[from] io::Error),
}

impl GenerationError {
    /// Close failures carried by this error, if any.
    pub fn close_failures(&self) -> &[CloseFailure] {
        match self {
            GenerationError::Close(failures) => failures,
            GenerationError::WithCloseFailures { close_failures, .. } => close_failures,
            _ => &[],
        }
    }
}

fn join_failures(failures: &[CloseFailure]) -> String {
    failures
        .iter()
        .map(|failure| failure.to_string())
        .collect::<Vec<_>>()
        .join("; ")
}
