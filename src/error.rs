use std::path::PathBuf;

/// Every error eachline can produce. Displayed as user-facing messages.
#[derive(Debug)]
pub enum Error {
    /// Malformed invocation, caught before any byte is read.
    InvalidArgument {
        argument: &'static str,
        reason: String,
    },
    /// Read failure from the underlying stream, passed through untouched.
    Io(std::io::Error),
    NotFound {
        path: PathBuf,
    },
    PermissionDenied {
        path: PathBuf,
    },
    Config {
        path: PathBuf,
        reason: String,
    },
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidArgument { argument, reason } => {
                write!(f, "invalid argument `{argument}`: {reason}")
            }
            Self::Io(source) => write!(f, "read error: {source}"),
            Self::NotFound { path } => write!(f, "not found: {}", path.display()),
            Self::PermissionDenied { path } => {
                write!(f, "{} [permission denied]", path.display())
            }
            Self::Config { path, reason } => {
                write!(f, "config error in {}: {reason}", path.display())
            }
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(source) => Some(source),
            _ => None,
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(source: std::io::Error) -> Self {
        Self::Io(source)
    }
}

impl Error {
    /// Exit code for the CLI.
    #[must_use]
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::NotFound { .. } | Self::Io(_) => 2,
            Self::InvalidArgument { .. } | Self::Config { .. } => 3,
            Self::PermissionDenied { .. } => 4,
        }
    }

    /// Map an open/metadata failure on `path` to the matching variant.
    pub(crate) fn from_path(path: &std::path::Path, e: std::io::Error) -> Self {
        match e.kind() {
            std::io::ErrorKind::NotFound => Self::NotFound {
                path: path.to_path_buf(),
            },
            std::io::ErrorKind::PermissionDenied => Self::PermissionDenied {
                path: path.to_path_buf(),
            },
            _ => Self::Io(e),
        }
    }
}
