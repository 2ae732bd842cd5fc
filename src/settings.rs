//! Build settings
//!
//! Everything a build needs to know about the corpus format and the window, loadable from a JSON
//! file. Keys left out of the file keep their defaults; keys it does not know are an error.
use crate::errors::*;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case", deny_unknown_fields)]
pub struct Settings {
    /// Directory holding the corpus files
    pub corpus_path: PathBuf,
    /// Where results are written
    pub output_path: PathBuf,
    /// Parent of the per-build scratch directories; `output_path/tmp` when unset
    pub scratch_path: Option<PathBuf>,
    pub left_span: usize,
    pub right_span: usize,
    /// One capture group per field of a content line
    pub line_machine: String,
    /// Comma separated names of the captured fields, in order
    pub line_format: String,
    /// Lines matching this end a segment (sentence, article..)
    pub separator_line_machine: String,
    /// Slash separated field names making up the type of a line
    pub type_format: String,
    pub colloc_format: String,
    /// Like the type format, but may also use `fid` and `lid`
    pub token_format: String,
    pub workers: usize,
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            corpus_path: PathBuf::from("."),
            output_path: PathBuf::from("."),
            scratch_path: None,
            left_span: 4,
            right_span: 4,
            line_machine: r"^([^\t]+)\t([^\t]+)\t([^\t]+)$".to_string(),
            line_format: "word,pos,lemma".to_string(),
            separator_line_machine: r"^</s>$".to_string(),
            type_format: "lemma/pos".to_string(),
            colloc_format: "lemma/pos".to_string(),
            token_format: "lemma/pos/fid/lid".to_string(),
            workers: 1,
        }
    }
}

impl Settings {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Settings> {
        let settings: Settings = serde_json::from_reader(BufReader::new(File::open(path)?))?;
        settings.validate()?;
        Ok(settings)
    }

    /// Field names of a content line
    pub fn fields(&self) -> Vec<&str> {
        self.line_format.split(',').map(str::trim).collect()
    }

    /// Check the templates only mention known fields
    pub fn validate(&self) -> Result<()> {
        let fields = self.fields();
        if fields.iter().any(|f| f.is_empty()) {
            return Err(Error::InvalidSettings(format!(
                "line-format {:?} has an empty field name",
                self.line_format
            )));
        }
        let check = |name: &str, template: &str, positional: bool| -> Result<()> {
            for part in template.split('/') {
                let known = fields.contains(&part) || (positional && (part == "fid" || part == "lid"));
                if !known {
                    return Err(Error::InvalidSettings(format!(
                        "{} {:?} uses {:?} which is not one of the fields {:?}",
                        name, template, part, fields
                    )));
                }
            }
            Ok(())
        };
        check("type-format", &self.type_format, false)?;
        check("colloc-format", &self.colloc_format, false)?;
        check("token-format", &self.token_format, true)?;
        Ok(())
    }

    /// Worker count with zero read as one
    pub fn worker_count(&self) -> usize {
        self.workers.max(1)
    }

    /// Scratch directory of one kind of build, e.g. `col.freq`
    pub fn scratch_dir(&self, role: &str) -> PathBuf {
        self.scratch_path
            .clone()
            .unwrap_or_else(|| self.output_path.join("tmp"))
            .join(role)
    }
}
