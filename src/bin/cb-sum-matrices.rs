//! Merge many saved cooccurrence matrices into one
//!
//! Labels are matched by name, so the inputs may come from different corpora or different
//! vocabularies.

// argument parsing
use clap::Parser;
// logging
#[macro_use]
extern crate log;
use rayon::prelude::*;
// lastly, this library
use collocate::errors::*;
use collocate::{numpy, LabeledMatrix};
use std::path::PathBuf;

#[derive(Parser)]
#[command(version, about = "Merge saved cooccurrence matrices")]
struct Cli {
    /// How many matrices to read at once
    #[arg(long, default_value_t = 64)]
    batch: usize,

    /// Also export the sum as <output>.npy with .rows and .cols label files
    #[arg(long)]
    numpy: bool,

    /// File in which to store the resulting matrix
    output: PathBuf,

    /// Files containing matrices to add
    #[arg(required = true)]
    addends: Vec<PathBuf>,
}

pub fn main() {
    // Main can't return a Result, and the ? operator needs the enclosing function to return Result
    inner_main().expect("Could not recover. Exiting.");
}
pub fn inner_main() -> Result<()> {
    env_logger::init();
    let args = Cli::parse();
    let mut mats = args.addends.clone();
    mats.sort();
    info!("{} files, output goes to {}", mats.len(), args.output.display());

    let mut accum = LabeledMatrix::<u64>::empty();
    // Only a batch of matrices is in memory at a time
    for names in mats.chunks(args.batch.max(1)) {
        info!("Working on {:?}", names);
        let batch = names
            .par_iter()
            .map(|name| {
                LabeledMatrix::<u64>::load(name).map_err(|err| {
                    Error::Other(format!("Failed to open matrix {}: {}", name.display(), err))
                })
            })
            .try_reduce(LabeledMatrix::empty, |lmat, rmat| Ok(lmat.merge(&rmat)))?;
        accum = accum.merge(&batch);
    }

    let (h, w) = accum.shape();
    accum.save(&args.output)?;
    if args.numpy {
        numpy::export(&accum, &args.output)?;
    }
    info!("Saved the {}x{} sum ({} cells) to {}", h, w, accum.nnz(), args.output.display());
    Ok(())
}
