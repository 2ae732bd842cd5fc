//! Count how often every type occurs in a tagged corpus

// argument parsing
use clap::Parser;
// logging
#[macro_use]
extern crate log;
// lastly, this library
use collocate::cli::CorpusArgs;
use collocate::errors::*;
use collocate::CorpusHandler;
use std::path::PathBuf;

#[derive(Parser)]
#[command(version, about = "Count the frequency of every type in a tagged corpus")]
struct Cli {
    #[command(flatten)]
    corpus: CorpusArgs,

    /// Also write `type<TAB>count` lines here, most frequent first
    #[arg(long)]
    tsv: Option<PathBuf>,

    /// Leave out types seen fewer times than this
    #[arg(long, default_value_t = 1)]
    min_freq: u64,

    /// Where to save the frequency list
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
    info!("Counting types in {} files", files.len());

    let mut freq = handler.build_item_freq(&files)?.into_result();
    if args.min_freq > 1 {
        freq = freq.min_freq(args.min_freq);
        info!("{} types occur at least {} times", freq.len(), args.min_freq);
    }
    freq.save(&args.output)?;
    if let Some(ref tsv) = args.tsv {
        freq.write_tsv(tsv)?;
    }
    info!("Saved {} types ({} tokens) to {}", freq.len(), freq.total(), args.output.display());
    Ok(())
}
