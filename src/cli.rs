//! Command line flags shared by the binaries
use crate::errors::*;
use crate::settings::Settings;
use crate::vocab::Vocab;
use clap::Args;
use std::path::{Path, PathBuf};

/// Where the corpus is and how to read it; flags override the settings file
#[derive(Args, Debug, Default)]
pub struct CorpusArgs {
    /// JSON settings file; defaults are used for anything it leaves out
    #[arg(short, long)]
    pub settings: Option<PathBuf>,

    /// Directory holding the corpus files
    #[arg(short, long)]
    pub corpus: Option<PathBuf>,

    /// File listing the corpus files to use, one per line
    #[arg(long)]
    pub fnames: Option<PathBuf>,

    /// Number of parallel workers
    #[arg(short, long)]
    pub workers: Option<usize>,

    #[arg(long)]
    pub left_span: Option<usize>,

    #[arg(long)]
    pub right_span: Option<usize>,

    /// Directory for intermediate files of parallel builds
    #[arg(long)]
    pub scratch: Option<PathBuf>,
}

impl CorpusArgs {
    pub fn settings(&self) -> Result<Settings> {
        let mut settings = match self.settings {
            Some(ref path) => Settings::load(path)?,
            None => Settings::default(),
        };
        if let Some(ref corpus) = self.corpus {
            settings.corpus_path = corpus.clone();
        }
        if let Some(workers) = self.workers {
            settings.workers = workers;
        }
        if let Some(span) = self.left_span {
            settings.left_span = span;
        }
        if let Some(span) = self.right_span {
            settings.right_span = span;
        }
        if let Some(ref scratch) = self.scratch {
            settings.scratch_path = Some(scratch.clone());
        }
        Ok(settings)
    }

    pub fn fnames(&self) -> Option<&Path> {
        self.fnames.as_deref()
    }
}

/// A list file read as a filter, if one was named
pub fn filter_from(path: Option<&Path>) -> Result<Option<Vocab>> {
    path.map(Vocab::read_list).transpose()
}
