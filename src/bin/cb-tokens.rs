//! Collect the collocates around every occurrence of some query types
//!
//! By default this writes a token by collocate matrix of relative positions; with `--nodes` it
//! saves the occurrences themselves, grouped by type.

// argument parsing
use clap::Parser;
// logging
#[macro_use]
extern crate log;
// lastly, this library
use collocate::cli::{filter_from, CorpusArgs};
use collocate::errors::*;
use collocate::{numpy, CorpusHandler};
use std::path::PathBuf;

#[derive(Parser)]
#[command(version, about = "Collect the windowed collocates of every token of some types")]
struct Cli {
    #[command(flatten)]
    corpus: CorpusArgs,

    /// The query types, one per line
    #[arg(long)]
    queries: PathBuf,

    /// Only keep these collocates (one per line)
    #[arg(long)]
    contexts: Option<PathBuf>,

    /// Save the token nodes rather than the position matrix
    #[arg(long)]
    nodes: bool,

    /// Also export the position matrix as <output>.npy with .rows and .cols label files
    #[arg(long, conflicts_with = "nodes")]
    numpy: bool,

    /// Where to save the result
    output: PathBuf,
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
    let queries = filter_from(Some(args.queries.as_path()))?;
    let contexts = filter_from(args.contexts.as_deref())?;

    if args.nodes {
        let nodes = handler
            .retrieve_token_nodes(&files, queries, contexts)?
            .into_result();
        nodes.save(&args.output)?;
        info!(
            "Saved {} tokens of {} types to {}",
            nodes.token_count(),
            nodes.len(),
            args.output.display()
        );
    } else {
        let tokens = handler.retrieve_tokens(&files, queries, contexts)?.into_result();
        tokens.matrix.save(&args.output)?;
        if args.numpy {
            numpy::export(&tokens.matrix, &args.output)?;
        }
        info!(
            "Saved positions of {} tokens among {} collocates to {}",
            tokens.matrix.shape().0,
            tokens.matrix.shape().1,
            args.output.display()
        );
    }
    Ok(())
}
