//! Shared corpus fixtures

#![allow(dead_code)]

use collocate::{CorpusHandler, Settings};
use std::fs;
use std::path::{Path, PathBuf};

/// Settings for corpora with one `word/POS` token per line
pub fn settings(root: &Path, workers: usize, left_span: usize, right_span: usize) -> Settings {
    Settings {
        corpus_path: root.join("corpus"),
        output_path: root.join("out"),
        left_span,
        right_span,
        line_machine: r"^(\w+)/(\w+)$".to_string(),
        line_format: "word,pos".to_string(),
        type_format: "word/pos".to_string(),
        colloc_format: "word/pos".to_string(),
        token_format: "word/pos/fid/lid".to_string(),
        workers,
        ..Settings::default()
    }
}

pub fn handler(root: &Path, workers: usize, left_span: usize, right_span: usize) -> CorpusHandler {
    CorpusHandler::new(settings(root, workers, left_span, right_span)).unwrap()
}

/// Write one file per document under `root/corpus`, returning their paths in order
pub fn write_corpus(root: &Path, docs: &[String]) -> Vec<PathBuf> {
    let dir = root.join("corpus");
    fs::create_dir_all(&dir).unwrap();
    docs.iter()
        .enumerate()
        .map(|(i, doc)| {
            let path = dir.join(format!("doc{:03}.txt", i));
            fs::write(&path, doc).unwrap();
            path
        })
        .collect()
}

/// Write each document into its own subdirectory of `root/corpus`, reusing a few file names
///
/// Files in different directories then share a file id, and so do their token labels.
pub fn write_nested_corpus(root: &Path, docs: &[String]) -> Vec<PathBuf> {
    docs.iter()
        .enumerate()
        .map(|(i, doc)| {
            let dir = root.join("corpus").join(format!("part{:02}", i));
            fs::create_dir_all(&dir).unwrap();
            let path = dir.join(format!("doc{}.txt", i % 2));
            fs::write(&path, doc).unwrap();
            path
        })
        .collect()
}

/// Segments of tokens as corpus text, with a boundary line after each segment
pub fn segments_text(segments: &[Vec<String>]) -> String {
    let mut text = String::new();
    for segment in segments {
        for token in segment {
            text.push_str(token);
            text.push('\n');
        }
        text.push_str("</s>\n");
    }
    text
}
