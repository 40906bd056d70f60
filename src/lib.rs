#![warn(clippy::pedantic)]
#![allow(
    clippy::cast_possible_truncation,  // byte counts as u64 — we target 64-bit
    clippy::module_name_repetitions,   // Rust naming conventions
    clippy::missing_errors_doc,        // error variants are documented on `Error`
    clippy::missing_panics_doc,        // same
)]

pub mod config;
pub mod error;
pub mod format;
pub mod lines;
pub mod stream;

use std::io::{BufRead, Write};

use config::OutputMode;
use error::Error;
use format::Renderer;
use lines::{LineIter, Separator};
use stream::Stream;

pub use lines::{Line, iterate};

/// Everything that shapes one iteration run.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Options {
    pub separator: Separator,
    pub limit: Option<usize>,
    pub chomp: bool,
    pub output: OutputMode,
}

/// The single public entry point for the CLI:
/// validate → iterate → render each line as it arrives.
/// Returns the number of lines written.
pub fn run<R: BufRead, W: Write>(
    stream: &mut Stream<R>,
    options: &Options,
    out: W,
) -> Result<u64, Error> {
    let iter = LineIter::new(stream, options.separator.clone(), options.limit)?;
    let mut renderer = Renderer::new(out, options.output, options.chomp);
    let mut count = 0;
    for line in iter {
        renderer.write_line(&line?)?;
        count += 1;
    }
    renderer.finish()?;
    Ok(count)
}
