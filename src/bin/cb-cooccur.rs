//! Find windowed type/collocate cooccurrences
//!
//! Saves the matrix and both vocabularies next to each other as `<output>.wcmx`,
//! `<output>.targets` and `<output>.contexts`, and optionally a numpy copy of the matrix.

// argument parsing
use clap::Parser;
// logging
#[macro_use]
extern crate log;
// lastly, this library
use collocate::cli::{filter_from, CorpusArgs};
use collocate::errors::*;
use collocate::{numpy, CorpusHandler};
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(version, about = "Find windowed type/collocate cooccurrences")]
struct Cli {
    #[command(flatten)]
    corpus: CorpusArgs,

    /// Only count these types (one per line), instead of all of them
    #[arg(long)]
    targets: Option<PathBuf>,

    /// Only count these collocates (one per line), instead of all of them
    #[arg(long)]
    contexts: Option<PathBuf>,

    /// Also export the matrix as <output>.npy with .rows and .cols label files
    #[arg(long)]
    numpy: bool,

    /// Prefix of the output files
    output: PathBuf,
}

fn with_extension(prefix: &Path, extension: &str) -> PathBuf {
    let mut name = prefix.as_os_str().to_owned();
    name.push(".");
    name.push(extension);
    PathBuf::from(name)
}

pub fn main() {
    // Main can't return a Result, and the ? operator needs the enclosing function to return Result
    inner_main().expect("Could not recover. Exiting.");
}
pub fn inner_main() -> Result<()> {
    env_logger::init();
    let args = Cli::parse();
    let handler = CorpusHandler::new(args.corpus.settings()?)?;
    let files = handler.files(args.corpus.fnames())?;
    let targets = filter_from(args.targets.as_deref())?;
    let contexts = filter_from(args.contexts.as_deref())?;

    let outcome = handler.build_col_freq(&files, targets, contexts)?;
    if !outcome.is_complete() {
        error!("Saving anyway, but worker(s) {:?} are missing from the counts", outcome.failed_workers);
    }
    let cooc = outcome.result;
    cooc.matrix.save(with_extension(&args.output, "wcmx"))?;
    cooc.targets.save(with_extension(&args.output, "targets"))?;
    cooc.contexts.save(with_extension(&args.output, "contexts"))?;
    if args.numpy {
        numpy::export(&cooc.matrix, &args.output)?;
    }
    info!(
        "Cooccurrences of {} targets with {} contexts saved to {}.*",
        cooc.targets.len(),
        cooc.contexts.len(),
        args.output.display()
    );
    Ok(())
}
