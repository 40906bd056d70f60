pub mod separator;

use std::borrow::Cow;
use std::io::{self, BufRead};
use std::iter::FusedIterator;

pub use separator::Separator;

use crate::error::Error;
use crate::stream::Stream;

/// One produced line. Includes the separator bytes when the line ended on a
/// separator match.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Line {
    bytes: Vec<u8>,
    number: u64,
    offset: u64,
    sep_len: usize,
}

impl Line {
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    #[must_use]
    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// 1-indexed position of this line in its stream.
    #[must_use]
    pub fn number(&self) -> u64 {
        self.number
    }

    /// Stream offset of the first byte.
    #[must_use]
    pub fn offset(&self) -> u64 {
        self.offset
    }

    /// Did this line end on a separator (as opposed to the limit or EOF)?
    #[must_use]
    pub fn is_terminated(&self) -> bool {
        self.sep_len > 0
    }

    /// Line bytes without the trailing separator.
    #[must_use]
    pub fn chomped(&self) -> &[u8] {
        &self.bytes[..self.bytes.len() - self.sep_len]
    }

    /// Lossy UTF-8 view of the full line.
    #[must_use]
    pub fn text(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.bytes)
    }
}

impl AsRef<[u8]> for Line {
    fn as_ref(&self) -> &[u8] {
        &self.bytes
    }
}

/// Where a [`LineIter`] is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum State {
    /// Constructed, nothing pulled yet.
    Ready,
    /// A pull is in progress, or the last pull failed with an I/O error.
    Reading,
    /// The last pull produced a line.
    Emitting,
    /// End of stream reached. Terminal.
    Exhausted,
}

/// Lazy, single-pass iterator over the lines of a [`Stream`].
///
/// Borrows the stream mutably for its whole lifetime, so no other reader can
/// interleave. Dropping it between pulls leaves the cursor right after the
/// last emitted line. After an I/O error, the bytes of the unfinished line
/// that were already pulled stay consumed.
#[derive(Debug)]
pub struct LineIter<'s, R> {
    stream: &'s mut Stream<R>,
    separator: Separator,
    limit: Option<usize>,
    pending: Vec<u8>,
    origin: u64,
    next_offset: u64,
    state: State,
}

/// Iterate with the default separator and no limit.
pub fn iterate<R: BufRead>(stream: &mut Stream<R>) -> LineIter<'_, R> {
    LineIter::build(stream, Separator::default(), None)
}

impl<'s, R: BufRead> LineIter<'s, R> {
    /// Fails with [`Error::InvalidArgument`] for a zero limit, before any
    /// byte is read.
    pub fn new(
        stream: &'s mut Stream<R>,
        separator: Separator,
        limit: Option<usize>,
    ) -> Result<Self, Error> {
        if limit == Some(0) {
            return Err(Error::InvalidArgument {
                argument: "limit",
                reason: "must be greater than zero".into(),
            });
        }
        Ok(Self::build(stream, separator, limit))
    }

    fn build(stream: &'s mut Stream<R>, separator: Separator, limit: Option<usize>) -> Self {
        let origin = stream.cursor_position();
        tracing::debug!(%separator, ?limit, origin, "line iterator ready");
        Self {
            stream,
            separator,
            limit,
            pending: Vec::new(),
            origin,
            next_offset: origin,
            state: State::Ready,
        }
    }

    #[must_use]
    pub fn state(&self) -> State {
        self.state
    }

    #[must_use]
    pub fn separator(&self) -> &Separator {
        &self.separator
    }

    #[must_use]
    pub fn limit(&self) -> Option<usize> {
        self.limit
    }

    /// Bytes this iterator has pulled from the stream.
    #[must_use]
    pub fn consumed(&self) -> u64 {
        self.stream.cursor_position() - self.origin
    }

    /// Pull until a separator match, the limit, or end of stream.
    /// `Ok(None)` only when nothing at all was left.
    fn read_line(&mut self) -> io::Result<Option<Line>> {
        loop {
            let room = self
                .limit
                .map_or(usize::MAX, |limit| limit - self.pending.len());
            if room == 0 {
                tracing::trace!(limit = ?self.limit, "line cut at limit");
                return Ok(Some(self.emit(false)));
            }

            let chunk = self.stream.read_chunk()?;
            if chunk.is_empty() {
                if self.pending.is_empty() {
                    return Ok(None);
                }
                return Ok(Some(self.emit(false)));
            }

            let window = &chunk[..chunk.len().min(room)];
            if let Some(end) = self.separator.find_end(&self.pending, window) {
                self.pending.extend_from_slice(&window[..end]);
                self.stream.consume(end);
                return Ok(Some(self.emit(true)));
            }
            let taken = window.len();
            self.pending.extend_from_slice(window);
            self.stream.consume(taken);
        }
    }

    fn emit(&mut self, terminated: bool) -> Line {
        let bytes = std::mem::take(&mut self.pending);
        let offset = self.next_offset;
        self.next_offset += bytes.len() as u64;
        let number = self.stream.bump_lineno();
        let sep_len = if terminated { self.separator.byte_len() } else { 0 };
        tracing::trace!(number, offset, len = bytes.len(), terminated, "line");
        Line {
            bytes,
            number,
            offset,
            sep_len,
        }
    }
}

impl<R: BufRead> Iterator for LineIter<'_, R> {
    type Item = Result<Line, Error>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.state == State::Exhausted {
            return None;
        }
        self.state = State::Reading;
        match self.read_line() {
            Ok(Some(line)) => {
                self.state = State::Emitting;
                Some(Ok(line))
            }
            Ok(None) => {
                self.state = State::Exhausted;
                tracing::debug!(
                    consumed = self.consumed(),
                    lines = self.stream.lineno(),
                    "line iterator exhausted"
                );
                None
            }
            Err(e) => {
                tracing::warn!(
                    error = %e,
                    position = self.stream.cursor_position(),
                    "read failed"
                );
                Some(Err(Error::Io(e)))
            }
        }
    }
}

impl<R: BufRead> FusedIterator for LineIter<'_, R> {}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{BufReader, Cursor, Read};

    fn collect(input: &[u8], separator: Separator, limit: Option<usize>) -> Vec<Vec<u8>> {
        let mut stream = Stream::new(Cursor::new(input.to_vec()));
        LineIter::new(&mut stream, separator, limit)
            .unwrap()
            .map(|line| line.unwrap().into_bytes())
            .collect()
    }

    /// Counts calls to `read` so tests can prove nothing was touched.
    #[derive(Debug)]
    struct CountingReader<'a> {
        data: &'a [u8],
        reads: usize,
    }

    impl Read for CountingReader<'_> {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            self.reads += 1;
            self.data.read(buf)
        }
    }

    /// Yields `data`, then one error, then `rest`.
    #[derive(Debug)]
    struct FlakyReader {
        data: Vec<u8>,
        failed: bool,
        rest: Vec<u8>,
    }

    impl Read for FlakyReader {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            if !self.data.is_empty() {
                let n = self.data.len().min(buf.len());
                buf[..n].copy_from_slice(&self.data[..n]);
                self.data.drain(..n);
                return Ok(n);
            }
            if !self.failed {
                self.failed = true;
                return Err(io::Error::new(io::ErrorKind::ConnectionReset, "link down"));
            }
            let n = self.rest.len().min(buf.len());
            buf[..n].copy_from_slice(&self.rest[..n]);
            self.rest.drain(..n);
            Ok(n)
        }
    }

    #[test]
    fn default_separator_keeps_newlines() {
        let lines = collect(b"one\ntwo\nthree\n", Separator::default(), None);
        assert_eq!(lines, vec![b"one\n".to_vec(), b"two\n".to_vec(), b"three\n".to_vec()]);
    }

    #[test]
    fn final_line_without_separator() {
        let lines = collect(b"one\ntwo", Separator::default(), None);
        assert_eq!(lines, vec![b"one\n".to_vec(), b"two".to_vec()]);
    }

    #[test]
    fn empty_stream_yields_nothing() {
        assert!(collect(b"", Separator::default(), None).is_empty());
        assert!(collect(b"", Separator::None, Some(3)).is_empty());
    }

    #[test]
    fn single_terminated_line() {
        let lines = collect(b"only\n", Separator::default(), None);
        assert_eq!(lines, vec![b"only\n".to_vec()]);
    }

    #[test]
    fn blank_lines_are_kept() {
        let lines = collect(b"\n\na\n", Separator::default(), None);
        assert_eq!(lines, vec![b"\n".to_vec(), b"\n".to_vec(), b"a\n".to_vec()]);
    }

    #[test]
    fn limit_splits_long_records() {
        let lines = collect(b"abcdefgh", Separator::default(), Some(3));
        assert_eq!(lines, vec![b"abc".to_vec(), b"def".to_vec(), b"gh".to_vec()]);
    }

    #[test]
    fn limit_and_separator_interleave() {
        let lines = collect(b"ab\ncdefg\nh", Separator::default(), Some(4));
        assert_eq!(
            lines,
            vec![b"ab\n".to_vec(), b"cdef".to_vec(), b"g\n".to_vec(), b"h".to_vec()]
        );
    }

    #[test]
    fn separator_exactly_at_limit() {
        let lines = collect(b"abc\nd", Separator::default(), Some(4));
        assert_eq!(lines, vec![b"abc\n".to_vec(), b"d".to_vec()]);
    }

    #[test]
    fn zero_limit_fails_before_reading() {
        let mut stream = Stream::from_reader(CountingReader {
            data: b"abc\n",
            reads: 0,
        });
        let err = LineIter::new(&mut stream, Separator::default(), Some(0)).unwrap_err();
        assert!(matches!(err, Error::InvalidArgument { argument: "limit", .. }));
        assert_eq!(stream.cursor_position(), 0);
        assert_eq!(stream.get_ref().get_ref().reads, 0);
    }

    #[test]
    fn limit_smaller_than_separator_is_hard_cap() {
        let sep = Separator::Bytes(b"\r\n".to_vec());
        let lines = collect(b"a\r\nb\r\n", sep, Some(1));
        assert_eq!(
            lines,
            vec![
                b"a".to_vec(),
                b"\r".to_vec(),
                b"\n".to_vec(),
                b"b".to_vec(),
                b"\r".to_vec(),
                b"\n".to_vec(),
            ]
        );
    }

    #[test]
    fn multi_byte_separator_across_buffer_refills() {
        let input = b"alpha<->beta<-><->gamma<-";
        let sep = Separator::Bytes(b"<->".to_vec());
        let mut stream = Stream::new(BufReader::with_capacity(1, &input[..]));
        let lines: Vec<Vec<u8>> = LineIter::new(&mut stream, sep.clone(), None)
            .unwrap()
            .map(|l| l.unwrap().into_bytes())
            .collect();
        assert_eq!(lines, collect(input, sep, None));
        assert_eq!(
            lines,
            vec![
                b"alpha<->".to_vec(),
                b"beta<->".to_vec(),
                b"<->".to_vec(),
                b"gamma<-".to_vec(),
            ]
        );
    }

    #[test]
    fn no_separator_reads_everything_at_once() {
        let lines = collect(b"a\nb\nc", Separator::None, None);
        assert_eq!(lines, vec![b"a\nb\nc".to_vec()]);
    }

    #[test]
    fn no_separator_still_honours_limit() {
        let lines = collect(b"a\nb\nc", Separator::None, Some(2));
        assert_eq!(lines, vec![b"a\n".to_vec(), b"b\n".to_vec(), b"c".to_vec()]);
    }

    #[test]
    fn line_metadata() {
        let mut stream = Stream::new(Cursor::new(b"ab\ncd".to_vec()));
        let lines: Vec<Line> = iterate(&mut stream).map(Result::unwrap).collect();

        assert_eq!(lines[0].number(), 1);
        assert_eq!(lines[0].offset(), 0);
        assert!(lines[0].is_terminated());
        assert_eq!(lines[0].chomped(), b"ab");

        assert_eq!(lines[1].number(), 2);
        assert_eq!(lines[1].offset(), 3);
        assert!(!lines[1].is_terminated());
        assert_eq!(lines[1].chomped(), b"cd");
        assert_eq!(lines[1].text(), "cd");

        assert_eq!(stream.lineno(), 2);
        assert_eq!(stream.cursor_position(), 5);
    }

    #[test]
    fn line_is_usable_as_byte_slice() {
        fn total_len<T: AsRef<[u8]>>(items: &[T]) -> usize {
            items.iter().map(|item| item.as_ref().len()).sum()
        }

        let mut stream = Stream::new(Cursor::new(b"ab\ncd".to_vec()));
        let lines: Vec<Line> = iterate(&mut stream).map(Result::unwrap).collect();
        assert_eq!(lines[0].as_ref(), b"ab\n");
        assert_eq!(total_len(&lines), 5);
    }

    #[test]
    fn state_transitions() {
        let mut stream = Stream::new(Cursor::new(b"x\n".to_vec()));
        let mut iter = iterate(&mut stream);
        assert_eq!(iter.state(), State::Ready);
        assert!(iter.next().is_some());
        assert_eq!(iter.state(), State::Emitting);
        assert!(iter.next().is_none());
        assert_eq!(iter.state(), State::Exhausted);
        assert!(iter.next().is_none());
        assert_eq!(iter.state(), State::Exhausted);
    }

    #[test]
    fn io_error_propagates_and_keeps_partial_bytes() {
        let reader = FlakyReader {
            data: b"ab\ncd".to_vec(),
            failed: false,
            rest: b"ef\n".to_vec(),
        };
        let mut stream = Stream::from_reader(reader);
        let mut iter = iterate(&mut stream);

        assert_eq!(iter.next().unwrap().unwrap().as_bytes(), b"ab\n");
        let err = iter.next().unwrap().unwrap_err();
        match err {
            Error::Io(e) => assert_eq!(e.kind(), io::ErrorKind::ConnectionReset),
            other => panic!("expected Io, got {other:?}"),
        }
        assert_eq!(iter.state(), State::Reading);
        assert_eq!(iter.next().unwrap().unwrap().as_bytes(), b"cdef\n");
        assert!(iter.next().is_none());
    }

    #[test]
    fn resumes_from_current_cursor() {
        let mut stream = Stream::new(Cursor::new(b"one\ntwo\nthree\n".to_vec()));
        {
            let mut iter = iterate(&mut stream);
            assert_eq!(iter.next().unwrap().unwrap().as_bytes(), b"one\n");
        }
        let rest: Vec<Line> = iterate(&mut stream).map(Result::unwrap).collect();
        assert_eq!(rest.len(), 2);
        assert_eq!(rest[0].number(), 2);
        assert_eq!(rest[0].offset(), 4);
    }

    #[test]
    fn rewind_then_iterate_again() {
        let mut stream = Stream::new(Cursor::new(b"a\nb\n".to_vec()));
        let first: Vec<Line> = iterate(&mut stream).map(Result::unwrap).collect();
        stream.rewind().unwrap();
        let second: Vec<Line> = iterate(&mut stream).map(Result::unwrap).collect();
        assert_eq!(first, second);
    }
}
