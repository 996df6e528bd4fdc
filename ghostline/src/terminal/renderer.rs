const DEFAULT_BUFFER_CAPACITY: usize = 4096;
use std::io::{self, Write};

/// Buffered terminal writer that batches escape sequences and hands them to
/// the underlying stream in a single write on flush.
#[derive(Debug)]
pub struct TerminalRenderer<W: Write> {
    buffer: Vec<u8>,
    out: W,
}

impl TerminalRenderer<io::Stderr> {
    /// Renderer drawing on stderr, leaving stdout for submitted lines.
    pub fn stderr() -> Self {
        Self::new(io::stderr())
    }
}

impl<W: Write> TerminalRenderer<W> {
    pub fn new(out: W) -> Self {
        Self::with_capacity(out, DEFAULT_BUFFER_CAPACITY)
    }

    pub fn with_capacity(out: W, capacity: usize) -> Self {
        TerminalRenderer {
            buffer: Vec::with_capacity(capacity.max(1)),
            out,
        }
    }

    /// Bytes queued but not yet flushed.
    pub fn pending(&self) -> &[u8] {
        &self.buffer
    }

    pub fn get_ref(&self) -> &W {
        &self.out
    }

    /// Write buffered bytes to the stream and clear the buffer.
    pub fn flush(&mut self) -> io::Result<()> {
        if self.buffer.is_empty() {
            return Ok(());
        }
        self.out.write_all(&self.buffer)?;
        self.out.flush()?;
        self.buffer.clear();
        Ok(())
    }
}

impl<W: Write> Write for TerminalRenderer<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.buffer.extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        TerminalRenderer::flush(self)
    }
}
