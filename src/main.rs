use std::io;
use std::path::PathBuf;
use std::process;

use clap::{CommandFactory, Parser};
use clap_complete::Shell;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

use eachline::Options;
use eachline::config::{Config, OutputMode};
use eachline::error::Error;
use eachline::lines::Separator;
use eachline::stream::Stream;

/// eachline — print the lines of a file or stdin, split on any separator,
/// optionally capped at a maximum length.
#[derive(Parser)]
#[command(
    name = "eachline",
    version = concat!(env!("CARGO_PKG_VERSION"), " (", env!("EACHLINE_BUILD_COMMIT"), ")"),
    about
)]
struct Cli {
    /// File to read. Reads stdin when absent or "-".
    file: Option<PathBuf>,

    /// Line separator, with escapes (\n, \r\n, \t, \0, \\, \xHH).
    #[arg(short, long, conflicts_with = "no_separator")]
    separator: Option<String>,

    /// Treat the whole input as one line (still capped by --limit).
    #[arg(long)]
    no_separator: bool,

    /// Maximum bytes per line. Must be greater than zero.
    #[arg(short, long, value_name = "N", allow_hyphen_values = true)]
    limit: Option<String>,

    /// Drop the separator from each printed line.
    #[arg(long)]
    chomp: bool,

    /// Output mode. Overrides the config file.
    #[arg(long, value_enum)]
    output: Option<OutputMode>,

    /// Shorthand for --output numbered.
    #[arg(short, long, conflicts_with_all = ["output", "json"])]
    number: bool,

    /// Shorthand for --output json.
    #[arg(long, conflicts_with = "output")]
    json: bool,

    /// Config file. Defaults to ./eachline.toml when present.
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Log iterator activity to stderr.
    #[arg(short, long)]
    verbose: bool,

    /// Print shell completions for the given shell.
    #[arg(long, value_name = "SHELL")]
    completions: Option<Shell>,
}

fn main() {
    let cli = Cli::parse();

    // Shell completions
    if let Some(shell) = cli.completions {
        clap_complete::generate(shell, &mut Cli::command(), "eachline", &mut io::stdout());
        return;
    }

    init_logging(cli.verbose);

    if let Err(e) = run(cli) {
        // A closed pipe (`eachline big.log | head`) is a normal way to stop.
        if let Error::Io(ref io_err) = e
            && io_err.kind() == io::ErrorKind::BrokenPipe
        {
            return;
        }
        eprintln!("{e}");
        process::exit(e.exit_code());
    }
}

fn run(cli: Cli) -> Result<(), Error> {
    let config = Config::load(cli.config.as_deref())?;
    let options = resolve_options(&cli, &config)?;

    let stdout = io::stdout().lock();
    let lines = match cli.file {
        Some(ref path) if path.as_os_str() != "-" => {
            let mut stream = Stream::open(path)?;
            eachline::run(&mut stream, &options, stdout)?
        }
        _ => {
            let mut stream = Stream::new(io::stdin().lock());
            eachline::run(&mut stream, &options, stdout)?
        }
    };
    tracing::debug!(lines, "done");
    Ok(())
}

/// Merge config file values with command-line flags. Flags win.
fn resolve_options(cli: &Cli, config: &Config) -> Result<Options, Error> {
    let separator = if cli.no_separator {
        Separator::None
    } else {
        match cli.separator {
            Some(ref text) => Separator::parse_escaped(text)?,
            None => config.separator()?,
        }
    };

    let output = if cli.number {
        OutputMode::Numbered
    } else if cli.json {
        OutputMode::Json
    } else {
        cli.output.unwrap_or(config.output)
    };

    Ok(Options {
        separator,
        limit: match cli.limit {
            Some(ref text) => Some(Config::parse_limit(text)?),
            None => config.limit,
        },
        chomp: cli.chomp || config.chomp,
        output,
    })
}

/// `RUST_LOG` wins; otherwise `warn`, or `debug` under --verbose.
fn init_logging(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(
            fmt::layer()
                .with_writer(io::stderr)
                .with_target(false),
        )
        .try_init();
}

