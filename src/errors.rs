//
// Errors
//
use std::error;
use std::fmt;
use std::io;
use std::path::PathBuf;
use std::result;

/// Type alias for collocate errors
pub type Result<X> = result::Result<X, Error>;

/// Wrapper for many kinds of errors occuring while building frequency tables
#[derive(Debug)]
pub enum Error {
    InvalidDimensions(String),
    InvalidLabels(String),
    InvalidSettings(String),
    IOError(io::Error),
    Serialization(bincode::Error),
    Settings(serde_json::Error),
    Regex(regex::Error),
    ThreadPool(rayon::ThreadPoolBuildError),
    /// A build that only makes sense with an explicit filter was given none
    MissingFilterVocabulary(&'static str),
    /// Reading or writing a hand-off artifact in the scratch directory failed
    ScratchIO(PathBuf, Box<Error>),
    WorkerPanicked(usize),
    Other(String),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            Error::InvalidDimensions(ref info) => write!(f, "Dimension Mismatch: {}", info),
            Error::InvalidLabels(ref info) => write!(f, "Invalid matrix labels: {}", info),
            Error::InvalidSettings(ref info) => write!(f, "Invalid settings: {}", info),
            Error::IOError(ref err) => write!(f, "IO error: {}", err),
            Error::Serialization(ref err) => write!(f, "Serialization error: {}", err),
            Error::Settings(ref err) => write!(f, "Could not read settings: {}", err),
            Error::Regex(ref err) => write!(f, "Bad line pattern: {}", err),
            Error::ThreadPool(ref err) => write!(f, "Could not start workers: {}", err),
            Error::MissingFilterVocabulary(role) => write!(
                f,
                "A {} vocabulary is required for this build but none was given. \
                Pass one explicitly (an empty list is fine, it still acts as a filter).",
                role
            ),
            Error::ScratchIO(ref path, ref err) => {
                write!(f, "Scratch artifact {} unusable: {}", path.display(), err)
            }
            Error::WorkerPanicked(worker) => write!(f, "Worker #{} panicked", worker),
            Error::Other(ref info) => write!(f, "{}", info),
        }
    }
}

impl error::Error for Error {
    fn source(&self) -> Option<&(dyn error::Error + 'static)> {
        match *self {
            Error::IOError(ref err) => Some(err),
            Error::Serialization(ref err) => Some(err),
            Error::Settings(ref err) => Some(err),
            Error::Regex(ref err) => Some(err),
            Error::ThreadPool(ref err) => Some(err),
            Error::ScratchIO(_, ref err) => Some(err.as_ref()),
            _ => None,
        }
    }
}

//
// Convert everything else into Error
//
impl From<io::Error> for Error {
    fn from(err: io::Error) -> Self {
        Error::IOError(err)
    }
}
impl From<bincode::Error> for Error {
    fn from(err: bincode::Error) -> Self {
        Error::Serialization(err)
    }
}
impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Settings(err)
    }
}
impl From<regex::Error> for Error {
    fn from(err: regex::Error) -> Self {
        Error::Regex(err)
    }
}
impl From<rayon::ThreadPoolBuildError> for Error {
    fn from(err: rayon::ThreadPoolBuildError) -> Self {
        Error::ThreadPool(err)
    }
}
impl From<walkdir::Error> for Error {
    fn from(err: walkdir::Error) -> Self {
        Error::IOError(err.into())
    }
}
impl From<tempfile::PersistError> for Error {
    fn from(err: tempfile::PersistError) -> Self {
        Error::IOError(err.error)
    }
}

//
// Convert Error into a general io Error
//
impl From<Error> for io::Error {
    fn from(err: Error) -> Self {
        io::Error::new(io::ErrorKind::Other, err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error as StdError;

    #[test]
    fn scratch_errors_keep_their_cause() {
        let inner = Error::IOError(io::Error::new(io::ErrorKind::NotFound, "gone"));
        let err = Error::ScratchIO(PathBuf::from("/tmp/x/part"), Box::new(inner));
        assert!(err.to_string().contains("/tmp/x/part"));
        assert!(err.source().is_some());
    }

    #[test]
    fn missing_filter_names_the_role() {
        let err = Error::MissingFilterVocabulary("query");
        assert!(err.to_string().contains("query vocabulary"));
    }
}
