use std::time::Instant;

use tracing::{debug, error, info, warn};

use dsgen_core::{OutputConfig, RowRange, Table, TableRole};

use crate::errors::{CloseFailure, GenerationError};
use crate::output::{Destination, DestinationSink};
use crate::producer::{GenerationRequest, RowProducer};
use crate::resolver::{destination_tables, resolve_location};

/// Generates row ranges of a table into its destinations.
///
/// One call runs to completion on the calling thread. Several generators
/// may run concurrently on disjoint ranges as long as their output
/// configurations resolve to distinct locations.
#[derive(Debug, Clone)]
pub struct TableGenerator<P, S> {
    producer: P,
    sink: S,
    output: OutputConfig,
}

#[derive(Debug, Default, Clone, Copy)]
struct GenerationStats {
    groups: u64,
    child_rows: u64,
}

impl<P: RowProducer, S: DestinationSink> TableGenerator<P, S> {
    pub fn new(producer: P, sink: S, output: OutputConfig) -> Self {
        Self {
            producer,
            sink,
            output,
        }
    }

    pub fn output(&self) -> &OutputConfig {
        &self.output
    }

    /// Generate rows `starting_row..=ending_row` of `table`.
    ///
    /// A child table outside a family run is skipped: its rows are written
    /// while generating the parent. Inside a family run a child table is
    /// produced from its parent's row groups and only the child rows are
    /// written. Destinations are opened in append mode and are all closed
    /// before this returns, whatever happened.
    pub fn generate_table(
        &self,
        table: Table,
        starting_row: u64,
        ending_row: u64,
    ) -> Result<(), GenerationError> {
        let family_run = self.output.family_run;
        if table.is_child() && !family_run {
            debug!(table = %table, "child table is generated with its parent, skipping");
            return Ok(());
        }

        let range = RowRange::new(starting_row, ending_row);
        let start = Instant::now();
        info!(table = %table, range = %range, family_run, "generating table");

        let mut destinations = OpenDestinations::new();
        let outcome = self.fill(table, range, &mut destinations);
        let close_failures = destinations.close_all();
        for failure in &close_failures {
            warn!(
                table = %failure.table,
                role = %failure.role,
                location = %failure.location,
                error = %failure.source,
                "failed to close destination"
            );
        }

        match (outcome, close_failures.is_empty()) {
            (Ok(stats), true) => {
                info!(
                    table = %table,
                    range = %range,
                    groups = stats.groups,
                    child_rows = stats.child_rows,
                    duration_ms = start.elapsed().as_millis() as u64,
                    "table generated"
                );
                Ok(())
            }
            (Ok(_), false) => Err(GenerationError::Close(close_failures)),
            (Err(err), no_close_failures) => {
                error!(table = %table, range = %range, error = %err, "table generation failed");
                if no_close_failures {
                    Err(err)
                } else {
                    Err(GenerationError::WithCloseFailures {
                        primary: Box::new(err),
                        close_failures,
                    })
                }
            }
        }
    }

    fn fill(
        &self,
        table: Table,
        range: RowRange,
        destinations: &mut OpenDestinations<S::Destination>,
    ) -> Result<GenerationStats, GenerationError> {
        for (role, member) in destination_tables(table, self.output.family_run) {
            let location = resolve_location(member, &self.output);
            let destination = self.sink.open(&location).map_err(|source| {
                GenerationError::DestinationOpen {
                    table: member,
                    location: location.clone(),
                    source,
                }
            })?;
            debug!(table = %member, role = %role, location = %location, "destination opened");
            destinations.insert(role, member, location, destination);
        }

        let request = GenerationRequest::new(table, range, self.output.clone());
        let mut stats = GenerationStats::default();
        for group in self.producer.produce(&request) {
            let group = group.map_err(|source| GenerationError::RowProduction { table, source })?;

            let child = match destinations.child.as_mut() {
                Some(child) => Some(child),
                None if group.children.is_empty() => None,
                None => {
                    return Err(GenerationError::UnexpectedChildRows {
                        table,
                        row: group.row_number,
                    });
                }
            };

            // No parent destination when a child table is requested on its own.
            if let Some(parent) = destinations.parent.as_mut() {
                parent.write(TableRole::Parent, &group.parent)?;
            }
            if let Some(child) = child {
                for text in &group.children {
                    child.write(TableRole::Child, text)?;
                }
            }

            stats.groups += 1;
            stats.child_rows += group.children.len() as u64;
        }

        Ok(stats)
    }
}

struct OpenDestination<D> {
    table: Table,
    location: String,
    destination: D,
}

impl<D: Destination> OpenDestination<D> {
    fn write(&mut self, role: TableRole, text: &str) -> Result<(), GenerationError> {
        self.destination
            .write(text)
            .map_err(|source| GenerationError::Write {
                table: self.table,
                role,
                source,
            })
    }
}

/// Destinations of one call, keyed by role.
///
/// Anything still open when the guard is dropped gets closed, so an early
/// return or a panic never leaks a destination.
struct OpenDestinations<D: Destination> {
    parent: Option<OpenDestination<D>>,
    child: Option<OpenDestination<D>>,
}

impl<D: Destination> OpenDestinations<D> {
    fn new() -> Self {
        Self {
            parent: None,
            child: None,
        }
    }

    fn slot(&mut self, role: TableRole) -> &mut Option<OpenDestination<D>> {
        match role {
            TableRole::Parent => &mut self.parent,
            TableRole::Child => &mut self.child,
        }
    }

    fn insert(&mut self, role: TableRole, table: Table, location: String, destination: D) {
        *self.slot(role) = Some(OpenDestination {
            table,
            location,
            destination,
        });
    }

    /// Close every open destination, parent first, collecting all failures.
    fn close_all(&mut self) -> Vec<CloseFailure> {
        let mut failures = Vec::new();
        for role in [TableRole::Parent, TableRole::Child] {
            let Some(open) = self.slot(role).take() else {
                continue;
            };
            let bytes = open.destination.bytes_written();
            match open.destination.close() {
                Ok(()) => {
                    debug!(
                        table = %open.table,
                        location = %open.location,
                        bytes,
                        "destination closed"
                    );
                }
                Err(source) => failures.push(CloseFailure {
                    table: open.table,
                    role,
                    location: open.location,
                    source,
                }),
            }
        }
        failures
    }
}

impl<D: Destination> Drop for OpenDestinations<D> {
    fn drop(&mut self) {
        for failure in self.close_all() {
            warn!(
                table = %failure.table,
                location = %failure.location,
                error = %failure.source,
                "failed to close destination during unwind"
            );
        }
    }
}
