//! Feeding corpus lines through a window
//!
//! A `Scanner` owns the window for one file. Content lines enter the window on the right; each
//! time an item reaches the center it is handed to a `WindowSink` together with the window, so
//! every item is emitted exactly once with whatever context surrounds it. Segment boundaries and
//! the end of the file drain the window before it is replaced by an empty one.
use crate::corpus::file_id;
use crate::errors::*;
use crate::formatter::{CorpusFormatter, Match};
use crate::window::Window;
use std::fs;
use std::path::{Path, PathBuf};

/// A parsed content line and its (1-based) line number
#[derive(Clone, Debug, PartialEq)]
pub struct Item {
    pub matched: Match,
    pub lid: usize,
}

/// Receives every window whose center holds an item
pub trait WindowSink {
    fn emit(&mut self, formatter: &CorpusFormatter, fid: &str, center: &Item, window: &Window<Item>);
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum State {
    Streaming,
    Flushing,
    Done,
}

pub struct Scanner<'f, 's, S: WindowSink> {
    formatter: &'f CorpusFormatter,
    sink: &'s mut S,
    fid: String,
    window: Window<Item>,
    state: State,
}

impl<'f, 's, S: WindowSink> Scanner<'f, 's, S> {
    pub fn new(
        formatter: &'f CorpusFormatter,
        sink: &'s mut S,
        fid: &str,
        left_span: usize,
        right_span: usize,
    ) -> Self {
        Scanner {
            formatter,
            sink,
            fid: fid.to_string(),
            window: Window::new(left_span, right_span),
            state: State::Streaming,
        }
    }

    pub fn state(&self) -> State {
        self.state
    }

    fn emit_center(&mut self) {
        if let Some(center) = self.window.center() {
            self.sink.emit(self.formatter, &self.fid, center, &self.window);
        }
    }

    /// Take one raw line
    pub fn feed(&mut self, lid: usize, raw: &str) {
        if self.state == State::Done {
            warn!("{}: line {} arrived after the end of the file", self.fid, lid);
            return;
        }
        let matched = self.formatter.match_line(raw);
        // A boundary can also be content (a "." closing a sentence); it then starts the next window
        if self.formatter.is_segment_boundary(raw) {
            self.flush();
        }
        if let Some(matched) = matched {
            self.window.advance(Some(Item { matched, lid }));
            self.emit_center();
        }
    }

    /// Drain the window at a segment boundary and start over with an empty one
    pub fn flush(&mut self) {
        self.state = State::Flushing;
        if self.window.center().is_none() {
            // A segment shorter than the right span: nothing has reached the center yet
            while self.window.center().is_none() && self.window.has_pending() {
                self.window.advance(None);
            }
            self.emit_center();
        }
        while self.window.center().is_some() {
            self.window.advance(None);
            self.emit_center();
        }
        self.window = Window::new(self.window.left_span(), self.window.right_span());
        self.state = State::Streaming;
    }

    /// Flush whatever is left; later lines are ignored
    pub fn finish(&mut self) {
        if self.state != State::Done {
            self.flush();
            self.state = State::Done;
        }
    }
}

/// Scan text that is already in memory
pub fn scan_text<S: WindowSink>(
    text: &str,
    fid: &str,
    formatter: &CorpusFormatter,
    left_span: usize,
    right_span: usize,
    sink: &mut S,
) {
    let mut scanner = Scanner::new(formatter, sink, fid, left_span, right_span);
    for (i, line) in text.lines().enumerate() {
        scanner.feed(i + 1, line);
    }
    scanner.finish();
}

/// Scan one corpus file
///
/// The whole file is read before any line is scanned, so a file that can't be read or decoded
/// contributes nothing.
pub fn scan_file<S: WindowSink>(
    path: &Path,
    formatter: &CorpusFormatter,
    left_span: usize,
    right_span: usize,
    sink: &mut S,
) -> Result<()> {
    let text = fs::read_to_string(path)?;
    scan_text(&text, &file_id(path), formatter, left_span, right_span, sink);
    Ok(())
}

/// Scan files in order, logging and skipping those that fail. Returns how many failed.
pub fn scan_files<S: WindowSink>(
    files: &[PathBuf],
    formatter: &CorpusFormatter,
    left_span: usize,
    right_span: usize,
    sink: &mut S,
) -> usize {
    let mut failed = 0;
    for path in files {
        debug!("Scanning {}", path.display());
        if let Err(err) = scan_file(path, formatter, left_span, right_span, sink) {
            error!("{} error: {}", path.display(), err);
            failed += 1;
        }
    }
    failed
}
