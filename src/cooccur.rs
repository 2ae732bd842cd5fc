//! Type by collocate co-occurrence counts
use crate::coordinator::Partial;
use crate::errors::*;
use crate::farm::{cell, new_plain, uncell, PlainMap};
use crate::formatter::CorpusFormatter;
use crate::intern::Interner;
use crate::matrix::LabeledMatrix;
use crate::scan::{Item, WindowSink};
use crate::vocab::Vocab;
use crate::window::Window;
use serde::{Deserialize, Serialize};

/// Counts, for every target type, the collocates seen within the window around it
///
/// Either vocabulary may be growable, in which case it tallies what passes through it, or fixed,
/// in which case anything outside it is skipped.
pub struct CooccurrenceAccumulator {
    targets: Vocab,
    contexts: Vocab,
    rows: Interner,
    cols: Interner,
    counts: PlainMap<u64, u64>,
    overflowed: bool,
}

impl CooccurrenceAccumulator {
    pub fn new(targets: Vocab, contexts: Vocab) -> Self {
        CooccurrenceAccumulator {
            targets,
            contexts,
            rows: Interner::new(),
            cols: Interner::new(),
            counts: new_plain(),
            overflowed: false,
        }
    }

    pub fn targets(&self) -> &Vocab {
        &self.targets
    }

    pub fn contexts(&self) -> &Vocab {
        &self.contexts
    }

    /// Freeze both vocabularies and lay the counts out over them
    pub fn finish(self) -> Result<Cooccurrences> {
        if self.overflowed {
            return Err(Error::InvalidDimensions(format!(
                "more than {} distinct labels on one axis",
                u32::MAX
            )));
        }
        let targets = self.targets.into_fixed();
        let contexts = self.contexts.into_fixed();
        let row_labels = targets.snapshot_items();
        let col_labels = contexts.snapshot_items();
        let row_pos = self.rows.positions_in(&row_labels);
        let col_pos = self.cols.positions_in(&col_labels);

        let mut triplets = Vec::with_capacity(self.counts.len());
        for (&key, &count) in &self.counts {
            let (r, c) = uncell(key);
            match (row_pos[r as usize], col_pos[c as usize]) {
                (Some(r), Some(c)) => triplets.push((r, c, count)),
                _ => {
                    return Err(Error::Other(format!(
                        "{:?} / {:?} was counted but is missing from the vocabularies",
                        self.rows.resolve(r),
                        self.cols.resolve(c)
                    )))
                }
            }
        }
        Ok(Cooccurrences {
            matrix: LabeledMatrix::from_triplets(row_labels, col_labels, triplets)?,
            targets,
            contexts,
        })
    }
}

impl WindowSink for CooccurrenceAccumulator {
    fn emit(&mut self, formatter: &CorpusFormatter, _fid: &str, center: &Item, window: &Window<Item>) {
        let target = formatter.type_of(&center.matched);
        if !self.targets.consider(&target) {
            return;
        }
        let row = match self.rows.intern(&target) {
            Some(row) => row,
            None => {
                self.overflowed = true;
                return;
            }
        };
        for (_, item) in window.left_items().chain(window.right_items()) {
            let colloc = formatter.colloc_of(&item.matched);
            if self.contexts.consider(&colloc) {
                match self.cols.intern(&colloc) {
                    Some(col) => *self.counts.entry(cell(row, col)).or_insert(0) += 1,
                    None => self.overflowed = true,
                }
            }
        }
    }
}

/// A co-occurrence matrix and the vocabularies it is laid out over
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Cooccurrences {
    pub matrix: LabeledMatrix<u64>,
    /// Rows; counts are how often each type was a window center
    pub targets: Vocab,
    /// Columns; counts are how often each collocate was counted, when it was growing
    pub contexts: Vocab,
}

impl Partial for Cooccurrences {
    fn merge_all(parts: Vec<Self>) -> Self {
        let matrix = {
            let refs: Vec<&LabeledMatrix<u64>> = parts.iter().map(|p| &p.matrix).collect();
            LabeledMatrix::merge_all(&refs)
        };
        let (targets, contexts): (Vec<Vocab>, Vec<Vocab>) =
            parts.into_iter().map(|p| (p.targets, p.contexts)).unzip();
        Cooccurrences {
            matrix,
            targets: Vocab::merge_all(targets),
            contexts: Vocab::merge_all(contexts),
        }
    }
}
