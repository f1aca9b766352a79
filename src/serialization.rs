//! Writers for bound objects.
//!
//! The CLI uses these to emit results; they accept anything `Serialize`.

use serde::Serialize;
use std::io::Write;

/// Failure while writing bound objects
#[derive(Debug)]
pub enum WriteError {
    Encode(serde_json::Error),
    Io(std::io::Error),
}

impl From<serde_json::Error> for WriteError {
    fn from(err: serde_json::Error) -> Self {
        WriteError::Encode(err)
    }
}

impl From<std::io::Error> for WriteError {
    fn from(err: std::io::Error) -> Self {
        WriteError::Io(err)
    }
}

impl std::fmt::Display for WriteError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            WriteError::Encode(e) => write!(f, "failed to encode output: {}", e),
            WriteError::Io(e) => write!(f, "failed to write output: {}", e),
        }
    }
}

impl std::error::Error for WriteError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            WriteError::Encode(e) => Some(e),
            WriteError::Io(e) => Some(e),
        }
    }
}

/// Writes one JSON document per line.
pub struct NdjsonWriter<W: Write> {
    writer: W,
}

impl<W: Write> NdjsonWriter<W> {
    pub fn new(writer: W) -> Self {
        Self { writer }
    }

    pub fn write<T: Serialize>(&mut self, value: &T) -> Result<(), WriteError> {
        serde_json::to_writer(&mut self.writer, value)?;
        self.writer.write_all(b"\n")?;
        Ok(())
    }

    pub fn flush(&mut self) -> Result<(), WriteError> {
        self.writer.flush()?;
        Ok(())
    }
}

/// Writes bound objects as the elements of one JSON array.
///
/// The opening bracket is written on creation; call [`finish`](Self::finish)
/// to close the array.
pub struct JsonArrayWriter<W: Write> {
    writer: W,
    written: usize,
}

impl<W: Write> JsonArrayWriter<W> {
    pub fn new(mut writer: W) -> Result<Self, WriteError> {
        writer.write_all(b"[")?;
        Ok(Self { writer, written: 0 })
    }

    pub fn write<T: Serialize>(&mut self, value: &T) -> Result<(), WriteError> {
        if self.written > 0 {
            self.writer.write_all(b",")?;
        }
        serde_json::to_writer(&mut self.writer, value)?;
        self.written += 1;
        Ok(())
    }

    /// Close the array and return the number of elements written.
    pub fn finish(mut self) -> Result<usize, WriteError> {
        self.writer.write_all(b"]\n")?;
        self.writer.flush()?;
        Ok(self.written)
    }
}

/// Writes a single pretty-printed JSON document followed by a newline.
pub fn write_pretty<W: Write, T: Serialize>(
    mut writer: W,
    value: &T,
) -> Result<(), WriteError> {
    serde_json::to_writer_pretty(&mut writer, value)?;
    writeln!(writer)?;
    writer.flush()?;
    Ok(())
}
