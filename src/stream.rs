use std::fs::File;
use std::io::{self, BufRead, BufReader, Read, Seek, SeekFrom};
use std::path::Path;

use crate::error::Error;
use crate::lines::{LineIter, Separator};

/// Sequential byte source the line iterator pulls from.
///
/// Wraps any `BufRead` and tracks how far the cursor has moved plus how many
/// lines have been produced from it. The stream is owned by the caller;
/// iterators only borrow it.
#[derive(Debug)]
pub struct Stream<R> {
    inner: R,
    position: u64,
    lineno: u64,
}

impl<R: BufRead> Stream<R> {
    pub fn new(inner: R) -> Self {
        Self {
            inner,
            position: 0,
            lineno: 0,
        }
    }

    /// Bytes available at the cursor. Empty means end of stream.
    /// Blocks until the underlying reader yields data or signals EOF.
    pub fn read_chunk(&mut self) -> io::Result<&[u8]> {
        self.inner.fill_buf()
    }

    /// Advance the cursor past `n` bytes of the last chunk.
    pub fn consume(&mut self, n: usize) {
        self.inner.consume(n);
        self.position += n as u64;
    }

    /// Bytes consumed since construction or the last rewind.
    #[must_use]
    pub fn cursor_position(&self) -> u64 {
        self.position
    }

    /// Lines produced from this stream so far.
    #[must_use]
    pub fn lineno(&self) -> u64 {
        self.lineno
    }

    pub fn set_lineno(&mut self, lineno: u64) {
        self.lineno = lineno;
    }

    pub(crate) fn bump_lineno(&mut self) -> u64 {
        self.lineno += 1;
        self.lineno
    }

    /// Iterate lines from the current cursor. See [`LineIter::new`].
    pub fn each_line(
        &mut self,
        separator: Separator,
        limit: Option<usize>,
    ) -> Result<LineIter<'_, R>, Error> {
        LineIter::new(self, separator, limit)
    }

    pub fn get_ref(&self) -> &R {
        &self.inner
    }

    pub fn into_inner(self) -> R {
        self.inner
    }
}

impl<R: BufRead + Seek> Stream<R> {
    /// Move the cursor back to byte 0 and reset the line counter.
    pub fn rewind(&mut self) -> io::Result<()> {
        self.inner.seek(SeekFrom::Start(0))?;
        self.position = 0;
        self.lineno = 0;
        Ok(())
    }
}

impl<R: Read> Stream<BufReader<R>> {
    pub fn from_reader(reader: R) -> Self {
        Self::new(BufReader::new(reader))
    }
}

impl Stream<BufReader<File>> {
    /// Open `path` positioned at byte 0.
    pub fn open(path: &Path) -> Result<Self, Error> {
        let file = File::open(path).map_err(|e| Error::from_path(path, e))?;
        Ok(Self::from_reader(file))
    }
}
