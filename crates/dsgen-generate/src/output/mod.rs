//! Destination sinks receiving generated rows.

pub mod file;
pub mod memory;

pub use file::{FileDestination, FileSink};
pub use memory::{MemoryDestination, MemorySink, SinkEvent};

use std::io;

/// An open, appendable output bound to one table.
pub trait Destination {
    fn write(&mut self, text: &str) -> io::Result<()>;

    /// Bytes accepted by [`Destination::write`] so far.
    fn bytes_written(&self) -> u64;

    /// Flush and release the destination.
    fn close(self) -> io::Result<()>;
}

/// Opens destinations by location.
pub trait DestinationSink {
    type Destination: Destination;

    /// Open `location` for appending, creating it when absent.
    fn open(&self, location: &str) -> io::Result<Self::Destination>;

    /// Remove `location`; returns whether something was removed.
    fn remove(&self, location: &str) -> io::Result<bool>;
}

impl<T: DestinationSink + ?Sized> DestinationSink for &T {
    type Destination = T::Destination;

    fn open(&self, location: &str) -> io::Result<Self::Destination> {
        (**self).open(location)
    }

    fn remove(&self, location: &str) -> io::Result<bool> {
        (**self).remove(location)
    }
}
