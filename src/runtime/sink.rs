use std::io::{self, Write};

/// A blocking, one-byte-at-a-time output device.
///
/// This is the whole output contract of the VM: no return value and no
/// backpressure. Program output and nothing else flows through it.
pub trait ByteSink {
    fn emit_byte(&mut self, byte: u8);

    fn emit_bytes(&mut self, bytes: &[u8]) {
        for &b in bytes {
            self.emit_byte(b);
        }
    }
}

impl ByteSink for Vec<u8> {
    fn emit_byte(&mut self, byte: u8) {
        self.push(byte);
    }
}

impl<S: ByteSink + ?Sized> ByteSink for &mut S {
    fn emit_byte(&mut self, byte: u8) {
        (**self).emit_byte(byte);
    }
}

/// Adapts any [`Write`] into a [`ByteSink`].
///
/// The sink cannot report failures to its caller, so the first I/O error is
/// kept and later bytes are dropped. Check [`IoSink::finish`] once the run is
/// over.
pub struct IoSink<W: Write> {
    writer: W,
    error: Option<io::Error>,
}

impl<W: Write> IoSink<W> {
    pub fn new(writer: W) -> Self {
        IoSink {
            writer,
            error: None,
        }
    }

    /// Flushes and returns the writer, or the first error seen.
    pub fn finish(mut self) -> io::Result<W> {
        if let Some(err) = self.error.take() {
            return Err(err);
        }
        self.writer.flush()?;
        Ok(self.writer)
    }
}

impl<W: Write> ByteSink for IoSink<W> {
    fn emit_byte(&mut self, byte: u8) {
        if self.error.is_some() {
            return;
        }
        if let Err(err) = self.writer.write_all(&[byte]) {
            log::warn!("output sink failed: {}", err);
            self.error = Some(err);
        }
    }
}
