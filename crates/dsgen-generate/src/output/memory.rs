use std::collections::{BTreeMap, BTreeSet};
use std::io;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use super::{Destination, DestinationSink};

/// Operation observed by a [`MemorySink`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SinkEvent {
    Open(String),
    Write { location: String, text: String },
    /// Recorded for every close attempt, including failed ones.
    Close(String),
    Remove(String),
}

#[derive(Debug, Default)]
struct MemoryState {
    events: Vec<SinkEvent>,
    contents: BTreeMap<String, String>,
    fail_open: BTreeSet<String>,
    fail_write_after: BTreeMap<String, usize>,
    fail_close: BTreeSet<String>,
}

/// In-process sink keeping file contents and an ordered event log.
///
/// Clones share the same state, so a test can hand one clone to a generator
/// and inspect the other afterwards. Failures can be injected per location.
#[derive(Debug, Clone, Default)]
pub struct MemorySink {
    state: Arc<Mutex<MemoryState>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every open of `location` fail.
    pub fn failing_open(self, location: impl Into<String>) -> Self {
        self.lock().fail_open.insert(location.into());
        self
    }

    /// Let `writes` writes to `location` succeed per destination, then fail.
    pub fn failing_write_after(self, location: impl Into<String>, writes: usize) -> Self {
        self.lock().fail_write_after.insert(location.into(), writes);
        self
    }

    /// Make every close of `location` fail.
    pub fn failing_close(self, location: impl Into<String>) -> Self {
        self.lock().fail_close.insert(location.into());
        self
    }

    /// Seed `location` with existing content.
    pub fn with_contents(self, location: impl Into<String>, text: impl Into<String>) -> Self {
        self.lock().contents.insert(location.into(), text.into());
        self
    }

    pub fn events(&self) -> Vec<SinkEvent> {
        self.lock().events.clone()
    }

    pub fn contents(&self, location: &str) -> Option<String> {
        self.lock().contents.get(location).cloned()
    }

    pub fn locations(&self) -> Vec<String> {
        self.lock().contents.keys().cloned().collect()
    }

    pub fn opened(&self) -> Vec<String> {
        self.lock()
            .events
            .iter()
            .filter_map(|event| match event {
                SinkEvent::Open(location) => Some(location.clone()),
                _ => None,
            })
            .collect()
    }

    pub fn closed(&self) -> Vec<String> {
        self.lock()
            .events
            .iter()
            .filter_map(|event| match event {
                SinkEvent::Close(location) => Some(location.clone()),
                _ => None,
            })
            .collect()
    }

    /// Texts written to `location`, in order.
    pub fn writes(&self, location: &str) -> Vec<String> {
        self.lock()
            .events
            .iter()
            .filter_map(|event| match event {
                SinkEvent::Write { location: target, text } if target == location => {
                    Some(text.clone())
                }
                _ => None,
            })
            .collect()
    }

    fn lock(&self) -> MutexGuard<'_, MemoryState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl DestinationSink for MemorySink {
    type Destination = MemoryDestination;

    fn open(&self, location: &str) -> io::Result<MemoryDestination> {
        let mut state = self.lock();
        if state.fail_open.contains(location) {
            return Err(io::Error::new(
                io::ErrorKind::PermissionDenied,
                format!("cannot open {location}"),
            ));
        }
        state.events.push(SinkEvent::Open(location.to_string()));
        state.contents.entry(location.to_string()).or_default();
        let write_limit = state.fail_write_after.get(location).copied();
        Ok(MemoryDestination {
            location: location.to_string(),
            state: Arc::clone(&self.state),
            writes: 0,
            write_limit,
            bytes: 0,
        })
    }

    fn remove(&self, location: &str) -> io::Result<bool> {
        let mut state = self.lock();
        state.events.push(SinkEvent::Remove(location.to_string()));
        Ok(state.contents.remove(location).is_some())
    }
}

/// Destination handed out by [`MemorySink`].
#[derive(Debug)]
pub struct MemoryDestination {
    location: String,
    state: Arc<Mutex<MemoryState>>,
    writes: usize,
    write_limit: Option<usize>,
    bytes: u64,
}

impl MemoryDestination {
    fn lock(&self) -> MutexGuard<'_, MemoryState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Destination for MemoryDestination {
    fn write(&mut self, text: &str) -> io::Result<()> {
        if self.write_limit.is_some_and(|limit| self.writes >= limit) {
            return Err(io::Error::new(
                io::ErrorKind::StorageFull,
                format!("no space left for {}", self.location),
            ));
        }
        let mut state = self.lock();
        state.events.push(SinkEvent::Write {
            location: self.location.clone(),
            text: text.to_string(),
        });
        state
            .contents
            .entry(self.location.clone())
            .or_default()
            .push_str(text);
        drop(state);
        self.writes += 1;
        self.bytes = self.bytes.saturating_add(text.len() as u64);
        Ok(())
    }

    fn bytes_written(&self) -> u64 {
        self.bytes
    }

    fn close(self) -> io::Result<()> {
        let mut state = self.lock();
        state.events.push(SinkEvent::Close(self.location.clone()));
        if state.fail_close.contains(&self.location) {
            return Err(io::Error::other(format!("cannot close {}", self.location)));
        }
        Ok(())
    }
}
