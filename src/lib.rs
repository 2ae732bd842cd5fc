//! Windowed co-occurrence extraction from tagged corpora
//!
//! Reads corpora with one token per line, slides a window over every segment and counts which
//! collocates occur around which types. Builds can be split across workers and merged again; the
//! result is the same either way. The included binaries are thin wrappers over `CorpusHandler`.

#[macro_use]
extern crate log;
pub mod errors;
pub mod farm;
pub mod intern;
pub mod window;
pub mod vocab;
pub mod matrix;
pub mod persist;
pub mod settings;
pub mod formatter;
pub mod corpus;
pub mod scan;
pub mod coordinator;
pub mod cooccur;
pub mod tokens;
pub mod handlers;
pub mod numpy;
pub mod cli;

pub use crate::cooccur::Cooccurrences;
pub use crate::coordinator::Outcome;
pub use crate::errors::{Error, Result};
pub use crate::handlers::CorpusHandler;
pub use crate::matrix::LabeledMatrix;
pub use crate::settings::Settings;
pub use crate::tokens::{TokenPositions, TypeNodes};
pub use crate::vocab::Vocab;
