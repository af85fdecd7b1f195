use std::fs::{File, OpenOptions};
use std::io::{self, BufWriter, Write};

use super::{Destination, DestinationSink};

pub const WRITER_BUFFER_SIZE: usize = 256 * 1024;

/// Sink writing ISO-8859-1 encoded files.
#[derive(Debug, Clone, Copy, Default)]
pub struct FileSink;

impl FileSink {
    pub fn new() -> Self {
        Self
    }
}

impl DestinationSink for FileSink {
    type Destination = FileDestination;

    fn open(&self, location: &str) -> io::Result<FileDestination> {
        let file = OpenOptions::new().create(true).append(true).open(location)?;
        Ok(FileDestination {
            writer: BufWriter::with_capacity(WRITER_BUFFER_SIZE, file),
            encoded: Vec::new(),
            bytes: 0,
        })
    }

    fn remove(&self, location: &str) -> io::Result<bool> {
        match std::fs::remove_file(location) {
            Ok(()) => Ok(true),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(false),
            Err(err) => Err(err),
        }
    }
}

/// Buffered append-mode file.
pub struct FileDestination {
    writer: BufWriter<File>,
    encoded: Vec<u8>,
    bytes: u64,
}

impl Destination for FileDestination {
    fn write(&mut self, text: &str) -> io::Result<()> {
        self.encoded.clear();
        encode_latin1(text, &mut self.encoded);
        self.writer.write_all(&self.encoded)?;
        self.bytes = self.bytes.saturating_add(self.encoded.len() as u64);
        Ok(())
    }

    fn bytes_written(&self) -> u64 {
        self.bytes
    }

    fn close(self) -> io::Result<()> {
        let file = self.writer.into_inner().map_err(|err| err.into_error())?;
        file.sync_data()
    }
}

/// Encode `text` as ISO-8859-1, replacing unmappable characters with `?`.
pub fn encode_latin1(text: &str, out: &mut Vec<u8>) {
    out.reserve(text.len());
    out.extend(text.chars().map(|ch| u8::try_from(u32::from(ch)).unwrap_or(b'?')));
}
