use std::borrow::Cow;
use std::io::{self, Write};

use serde::Serialize;

use crate::config::OutputMode;
use crate::lines::Line;

/// Width of the number column in numbered mode. Streams have no known line
/// count up front, so the column is fixed.
const NUMBER_WIDTH: usize = 6;

/// One line as emitted in JSON mode.
#[derive(Debug, Serialize)]
struct LineRecord<'a> {
    number: u64,
    offset: u64,
    len: usize,
    terminated: bool,
    text: Cow<'a, str>,
}

/// Streams produced lines to `out` one at a time.
pub struct Renderer<W> {
    out: W,
    mode: OutputMode,
    chomp: bool,
}

impl<W: Write> Renderer<W> {
    pub fn new(out: W, mode: OutputMode, chomp: bool) -> Self {
        Self { out, mode, chomp }
    }

    pub fn write_line(&mut self, line: &Line) -> io::Result<()> {
        match self.mode {
            OutputMode::Raw => {
                if self.chomp {
                    self.out.write_all(line.chomped())?;
                    self.out.write_all(b"\n")
                } else {
                    self.out.write_all(line.as_bytes())
                }
            }
            OutputMode::Numbered => {
                let text = String::from_utf8_lossy(line.chomped());
                writeln!(self.out, "{:>NUMBER_WIDTH$}  {text}", line.number())
            }
            OutputMode::Json => {
                let bytes = if self.chomp {
                    line.chomped()
                } else {
                    line.as_bytes()
                };
                let record = LineRecord {
                    number: line.number(),
                    offset: line.offset(),
                    len: line.len(),
                    terminated: line.is_terminated(),
                    text: String::from_utf8_lossy(bytes),
                };
                serde_json::to_writer(&mut self.out, &record)?;
                self.out.write_all(b"\n")
            }
        }
    }

    /// Flush and hand back the writer.
    pub fn finish(mut self) -> io::Result<W> {
        self.out.flush()?;
        Ok(self.out)
    }
}
