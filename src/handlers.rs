//! Corpus wide builds
//!
//! A `CorpusHandler` holds the settings and formatter for one corpus and runs every build through
//! a `Coordinator`, so each of them works the same on one worker or many. Filters handed in by
//! the caller are always fixed; a missing filter means "grow it from the corpus".
use crate::coordinator::{Coordinator, Filters, Outcome};
use crate::cooccur::{CooccurrenceAccumulator, Cooccurrences};
use crate::corpus::corpus_files;
use crate::errors::*;
use crate::formatter::CorpusFormatter;
use crate::scan::{scan_files, Item, WindowSink};
use crate::settings::Settings;
use crate::tokens::{TokenNodeAccumulator, TokenPositionAccumulator, TokenPositions, TypeNodes};
use crate::vocab::Vocab;
use crate::window::Window;
use std::path::{Path, PathBuf};

/// Counts the type of every content line
#[derive(Default)]
pub struct ItemCounter {
    items: Vocab,
}

impl ItemCounter {
    pub fn finish(self) -> Vocab {
        self.items
    }
}

impl WindowSink for ItemCounter {
    fn emit(&mut self, formatter: &CorpusFormatter, _fid: &str, center: &Item, _window: &Window<Item>) {
        self.items.consider(&formatter.type_of(&center.matched));
    }
}

/// A caller supplied vocabulary filters even when empty
fn as_filter(vocab: Option<Vocab>) -> Vocab {
    vocab.map(Vocab::into_fixed).unwrap_or_default()
}

pub struct CorpusHandler {
    settings: Settings,
    formatter: CorpusFormatter,
}

impl CorpusHandler {
    pub fn new(settings: Settings) -> Result<CorpusHandler> {
        let formatter = CorpusFormatter::new(&settings)?;
        Ok(CorpusHandler { settings, formatter })
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn formatter(&self) -> &CorpusFormatter {
        &self.formatter
    }

    /// The files named in `fnames`, or the whole corpus
    pub fn files(&self, fnames: Option<&Path>) -> Result<Vec<PathBuf>> {
        corpus_files(&self.settings, fnames)
    }

    fn coordinator(&self, role: &str) -> Coordinator {
        Coordinator::new(self.settings.worker_count(), self.settings.scratch_dir(role))
    }

    /// Scan a group of files, logging the ones that could not be read
    fn scan<S: WindowSink>(&self, group: &[PathBuf], left_span: usize, right_span: usize, sink: &mut S) {
        let failed = scan_files(group, &self.formatter, left_span, right_span, sink);
        if failed > 0 {
            warn!("{} of {} files were skipped", failed, group.len());
        }
    }

    /// Frequency of every type in the corpus
    pub fn build_item_freq(&self, files: &[PathBuf]) -> Result<Outcome<Vocab>> {
        info!("Building item frequency list of {} files", files.len());
        let outcome = self.coordinator("item.freq").run(
            files,
            Filters::default(),
            |_: Filters, group: &[PathBuf]| {
                let mut counter = ItemCounter::default();
                self.scan(group, 0, 0, &mut counter);
                Ok(counter.finish())
            },
        )?;
        info!("Found {} types", outcome.result.len());
        Ok(outcome)
    }

    /// Co-occurrence counts of targets (rows) with collocates (columns)
    pub fn build_col_freq(
        &self,
        files: &[PathBuf],
        targets: Option<Vocab>,
        contexts: Option<Vocab>,
    ) -> Result<Outcome<Cooccurrences>> {
        let (l, r) = (self.settings.left_span, self.settings.right_span);
        let filters = Filters::new(as_filter(targets), as_filter(contexts));
        info!(
            "Building collocate frequencies of {} files, window {}-{}, target filter: {}, context filter: {}",
            files.len(),
            l,
            r,
            filters.targets.filter_present(),
            filters.contexts.filter_present()
        );
        let outcome = self.coordinator("col.freq").run(
            files,
            filters,
            |filters: Filters, group: &[PathBuf]| {
                let mut acc = CooccurrenceAccumulator::new(filters.targets, filters.contexts);
                self.scan(group, l, r, &mut acc);
                acc.finish()
            },
        )?;
        let (h, w) = outcome.result.matrix.shape();
        info!("Built a {}x{} matrix with {} cells", h, w, outcome.result.matrix.nnz());
        Ok(outcome)
    }

    /// Relative positions of collocates around every occurrence of the queries
    pub fn retrieve_tokens(
        &self,
        files: &[PathBuf],
        queries: Option<Vocab>,
        contexts: Option<Vocab>,
    ) -> Result<Outcome<TokenPositions>> {
        let queries = queries.ok_or(Error::MissingFilterVocabulary("query"))?;
        let (l, r) = (self.settings.left_span, self.settings.right_span);
        info!("Retrieving tokens of {} queries in {} files", queries.len(), files.len());
        let outcome = self.coordinator("tok.pos").run(
            files,
            Filters::new(queries.into_fixed(), as_filter(contexts)),
            |filters: Filters, group: &[PathBuf]| {
                let mut acc = TokenPositionAccumulator::new(filters.targets, filters.contexts);
                self.scan(group, l, r, &mut acc);
                acc.finish()
            },
        )?;
        info!("Found {} tokens", outcome.result.matrix.shape().0);
        Ok(outcome)
    }

    /// Every occurrence of the queries with the collocates around it
    pub fn retrieve_token_nodes(
        &self,
        files: &[PathBuf],
        queries: Option<Vocab>,
        contexts: Option<Vocab>,
    ) -> Result<Outcome<TypeNodes>> {
        let queries = queries.ok_or(Error::MissingFilterVocabulary("query"))?;
        let (l, r) = (self.settings.left_span, self.settings.right_span);
        info!("Retrieving token nodes of {} queries in {} files", queries.len(), files.len());
        let outcome = self.coordinator("tok.nodes").run(
            files,
            Filters::new(queries.into_fixed(), as_filter(contexts)),
            |filters: Filters, group: &[PathBuf]| {
                let mut acc = TokenNodeAccumulator::new(filters.targets, filters.contexts);
                self.scan(group, l, r, &mut acc);
                Ok(acc.finish())
            },
        )?;
        info!("Found {} tokens", outcome.result.token_count());
        Ok(outcome)
    }
}
