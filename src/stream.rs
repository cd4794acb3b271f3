//! Single-pass byte stream with pushback
//!
//! The PJL scanner reads ahead to recognise language-entry lines and then
//! returns its unused lookahead with [`PushbackStream::unread`], so the body
//! parser sees the stream starting at the exact boundary.

use std::fs::File;
use std::io::{self, BufReader, Read};
use std::path::Path;

use crate::error::{Error, Result};

/// Readable byte stream supporting LIFO reinsertion of already-read bytes.
///
/// Not seekable. Holding `&mut PushbackStream` is the exclusive right to
/// read from it; the scanner and the body parsers take turns through that
/// borrow.
pub struct PushbackStream {
    inner: Box<dyn Read>,
    // Pushed-back bytes, stored reversed: the last element is the next byte.
    pending: Vec<u8>,
    position: u64,
    eof: bool,
}

impl PushbackStream {
    /// Open a pushback stream over a file
    pub fn open(path: &Path) -> Result<Self> {
        let file = File::open(path).map_err(|source| Error::StreamOpen {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(Self::new(BufReader::new(file)))
    }

    /// Wrap any reader
    pub fn new(reader: impl Read + 'static) -> Self {
        Self {
            inner: Box::new(reader),
            pending: Vec::new(),
            position: 0,
            eof: false,
        }
    }

    /// Read a single byte, `None` at end of stream
    pub fn read_byte(&mut self) -> io::Result<Option<u8>> {
        if let Some(byte) = self.pending.pop() {
            self.position += 1;
            return Ok(Some(byte));
        }
        if self.eof {
            return Ok(None);
        }
        let mut buf = [0u8; 1];
        loop {
            match self.inner.read(&mut buf) {
                Ok(0) => {
                    self.eof = true;
                    return Ok(None);
                }
                Ok(_) => {
                    self.position += 1;
                    return Ok(Some(buf[0]));
                }
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e),
            }
        }
    }

    /// Look at the next byte without consuming it
    pub fn peek_byte(&mut self) -> io::Result<Option<u8>> {
        let byte = self.read_byte()?;
        if let Some(b) = byte {
            self.unread(&[b]);
        }
        Ok(byte)
    }

    /// Push bytes back so the next reads return them first, in order.
    ///
    /// Successive calls stack: the most recently unread buffer is read first.
    pub fn unread(&mut self, bytes: &[u8]) {
        self.pending.extend(bytes.iter().rev());
        self.position = self.position.saturating_sub(bytes.len() as u64);
    }

    /// True when no byte remains, pending or underlying
    pub fn is_at_eof(&mut self) -> io::Result<bool> {
        Ok(self.peek_byte()?.is_none())
    }

    /// Bytes consumed so far, net of pushback
    pub fn position(&self) -> u64 {
        self.position
    }

    /// Read `n` bytes, failing with `UnexpectedEof` if the stream ends first
    pub fn read_vec(&mut self, n: usize) -> io::Result<Vec<u8>> {
        let mut buf = vec![0u8; n];
        self.read_exact(&mut buf)?;
        Ok(buf)
    }

    /// Discard `n` bytes
    pub fn skip(&mut self, n: u64) -> io::Result<()> {
        let from_pending = (n as usize).min(self.pending.len());
        let keep = self.pending.len() - from_pending;
        self.pending.truncate(keep);
        self.position += from_pending as u64;

        let rest = n - from_pending as u64;
        if rest > 0 {
            let copied = io::copy(&mut (&mut self.inner).take(rest), &mut io::sink())?;
            self.position += copied;
            if copied < rest {
                self.eof = true;
                return Err(io::Error::new(
                    io::ErrorKind::UnexpectedEof,
                    "stream ended inside skipped data",
                ));
            }
        }
        Ok(())
    }
}

impl Read for PushbackStream {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if buf.is_empty() {
            return Ok(0);
        }
        if !self.pending.is_empty() {
            let n = buf.len().min(self.pending.len());
            for slot in buf.iter_mut().take(n) {
                // pending is non-empty for each of the n iterations
                *slot = self.pending.pop().unwrap_or_default();
            }
            self.position += n as u64;
            return Ok(n);
        }
        if self.eof {
            return Ok(0);
        }
        let n = self.inner.read(buf)?;
        if n == 0 {
            self.eof = true;
        }
        self.position += n as u64;
        Ok(n)
    }
}

impl std::fmt::Debug for PushbackStream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PushbackStream")
            .field("pending", &self.pending.len())
            .field("position", &self.position)
            .field("eof", &self.eof)
            .finish()
    }
}
