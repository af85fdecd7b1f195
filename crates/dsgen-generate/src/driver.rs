use std::any::Any;
use std::collections::BTreeMap;
use std::time::Instant;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{debug, info, warn};

use dsgen_core::{OutputConfig, RowRange, Session, Table};

use crate::engine::TableGenerator;
use crate::errors::GenerationError;
use crate::output::DestinationSink;
use crate::producer::RowProducer;
use crate::resolver::{destination_tables, resolve_location};

/// Outcome of one table chunk.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TableStatus {
    Generated,
    /// Child table outside a family run; written by its parent instead.
    Skipped,
}

/// Summary of a generated table chunk.
#[derive(Debug, Clone, Serialize)]
pub struct TableReport {
    pub table: Table,
    pub chunk: u64,
    pub range: RowRange,
    pub locations: Vec<String>,
    pub status: TableStatus,
    pub duration_ms: u64,
}

/// Report for a generation run.
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub run_id: String,
    pub started_at: DateTime<Utc>,
    pub scale: f64,
    pub parallelism: u64,
    pub family_run: bool,
    pub tables: Vec<TableReport>,
    pub duration_ms: u64,
}

impl RunReport {
    pub fn generated(&self) -> impl Iterator<Item = &TableReport> {
        self.tables
            .iter()
            .filter(|report| report.status == TableStatus::Generated)
    }
}

#[derive(Debug, Clone)]
struct Job {
    table: Table,
    chunk: u64,
    range: RowRange,
    output: OutputConfig,
    locations: Vec<String>,
}

/// Runs a whole [`Session`]: picks tables and chunks, then hands each one
/// to a [`TableGenerator`].
#[derive(Debug, Clone)]
pub struct Driver<P, S> {
    producer: P,
    sink: S,
}

impl<P, S> Driver<P, S>
where
    P: RowProducer + Sync,
    S: DestinationSink + Sync,
{
    pub fn new(producer: P, sink: S) -> Self {
        Self { producer, sink }
    }

    pub fn run(&self, session: &Session) -> Result<RunReport, GenerationError> {
        session.validate()?;

        let run_id = uuid::Uuid::new_v4().to_string();
        let started_at = Utc::now();
        let start = Instant::now();
        let chunks = session.chunks();
        let tables = select_tables(session);

        info!(
            run_id = %run_id,
            tables = tables.len(),
            scale = session.scale,
            parallelism = session.parallelism,
            chunks = ?chunks,
            family_run = session.family_run,
            "generation run started"
        );

        let mut reports = Vec::new();
        let mut jobs: BTreeMap<u64, Vec<Job>> = BTreeMap::new();
        for table in tables {
            let total = table.row_count(session.scale);
            for &chunk in &chunks {
                let range = RowRange::for_chunk(total, session.parallelism, chunk);
                if table.is_child() && !session.family_run {
                    warn!(table = %table, "child table is only generated with its parent, skipping");
                    reports.push(TableReport {
                        table,
                        chunk,
                        range,
                        locations: Vec::new(),
                        status: TableStatus::Skipped,
                        duration_ms: 0,
                    });
                    continue;
                }

                let output = session.output_config(chunk);
                let locations = destination_tables(table, output.family_run)
                    .map(|(_, member)| resolve_location(member, &output))
                    .collect();
                jobs.entry(chunk).or_default().push(Job {
                    table,
                    chunk,
                    range,
                    output,
                    locations,
                });
            }
        }

        if session.overwrite {
            self.remove_existing(jobs.values().flatten())?;
        }

        let generated = if jobs.len() > 1 {
            self.run_chunks_concurrently(jobs)?
        } else {
            jobs.into_values()
                .flatten()
                .map(|job| self.run_job(job))
                .collect::<Result<Vec<_>, _>>()?
        };
        reports.extend(generated);
        reports.sort_by_key(|report| (report.table, report.chunk));

        let report = RunReport {
            run_id,
            started_at,
            scale: session.scale,
            parallelism: session.parallelism,
            family_run: session.family_run,
            tables: reports,
            duration_ms: start.elapsed().as_millis() as u64,
        };

        info!(
            run_id = %report.run_id,
            generated = report.generated().count(),
            duration_ms = report.duration_ms,
            "generation run completed"
        );

        Ok(report)
    }

    fn remove_existing<'a>(
        &self,
        jobs: impl Iterator<Item = &'a Job>,
    ) -> Result<(), GenerationError> {
        for job in jobs {
            for location in &job.locations {
                if self.sink.remove(location)? {
                    debug!(location = %location, "removed existing output");
                }
            }
        }
        Ok(())
    }

    fn run_job(&self, job: Job) -> Result<TableReport, GenerationError> {
        let start = Instant::now();
        let generator = TableGenerator::new(&self.producer, &self.sink, job.output);
        generator.generate_table(job.table, job.range.start, job.range.end)?;
        Ok(TableReport {
            table: job.table,
            chunk: job.chunk,
            range: job.range,
            locations: job.locations,
            status: TableStatus::Generated,
            duration_ms: start.elapsed().as_millis() as u64,
        })
    }

    /// One worker thread per chunk; chunks write to distinct locations.
    fn run_chunks_concurrently(
        &self,
        jobs: BTreeMap<u64, Vec<Job>>,
    ) -> Result<Vec<TableReport>, GenerationError> {
        let results: Vec<Result<Vec<TableReport>, GenerationError>> =
            std::thread::scope(|scope| {
                let handles: Vec<_> = jobs
                    .into_iter()
                    .map(|(chunk, jobs)| {
                        scope.spawn(move || {
                            debug!(chunk, jobs = jobs.len(), "chunk worker started");
                            jobs.into_iter()
                                .map(|job| self.run_job(job))
                                .collect::<Result<Vec<_>, _>>()
                        })
                    })
                    .collect();

                handles
                    .into_iter()
                    .map(|handle| {
                        handle.join().unwrap_or_else(|panic| {
                            Err(GenerationError::WorkerPanicked(panic_message(panic)))
                        })
                    })
                    .collect()
            });

        let mut reports = Vec::new();
        let mut first_error = None;
        for result in results {
            match result {
                Ok(chunk_reports) => reports.extend(chunk_reports),
                Err(err) if first_error.is_none() => first_error = Some(err),
                Err(err) => warn!(error = %err, "additional chunk failure"),
            }
        }

        match first_error {
            Some(err) => Err(err),
            None => Ok(reports),
        }
    }
}

fn select_tables(session: &Session) -> Vec<Table> {
    match session.table {
        Some(table) => vec![table],
        None if session.family_run => Table::roots().collect(),
        None => Table::ALL.to_vec(),
    }
}

fn panic_message(panic: Box<dyn Any + Send>) -> String {
    if let Some(message) = panic.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = panic.downcast_ref::<String>() {
        message.clone()
    } else {
        "panic during generation".to_string()
    }
}
