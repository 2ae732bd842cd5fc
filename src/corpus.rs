//! Finding the files of a corpus
use crate::errors::*;
use crate::settings::Settings;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// The files to process: those listed in `fnames`, or everything under the corpus path
pub fn corpus_files(settings: &Settings, fnames: Option<&Path>) -> Result<Vec<PathBuf>> {
    match fnames {
        Some(list) => read_fnames(list, &settings.corpus_path),
        None => walk(&settings.corpus_path),
    }
}

/// Read a file holding one corpus file name per line
///
/// Relative names are taken relative to `base`; blank lines are skipped.
pub fn read_fnames<P: AsRef<Path>>(list: P, base: &Path) -> Result<Vec<PathBuf>> {
    let list = list.as_ref();
    let reader = BufReader::new(File::open(list).map_err(|err| {
        error!("Cannot open file list {}", list.display());
        Error::IOError(err)
    })?);
    let mut files = vec![];
    for line in reader.lines() {
        let line = line?;
        let name = line.trim();
        if name.is_empty() {
            continue;
        }
        let path = Path::new(name);
        files.push(if path.is_absolute() { path.to_path_buf() } else { base.join(path) });
    }
    Ok(files)
}

/// Every regular file below `dir`, in sorted order
///
/// Symbolic links are not followed, so each file is listed once.
pub fn walk<P: AsRef<Path>>(dir: P) -> Result<Vec<PathBuf>> {
    let mut files = vec![];
    for entry in WalkDir::new(dir).follow_links(false) {
        let entry = entry?;
        if entry.file_type().is_file() {
            files.push(entry.into_path());
        }
    }
    files.sort();
    Ok(files)
}

/// Short id of a corpus file used in tokens: its name up to the first dot
pub fn file_id(path: &Path) -> String {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    match name.find('.') {
        Some(dot) => name[..dot].to_string(),
        None => name,
    }
}
