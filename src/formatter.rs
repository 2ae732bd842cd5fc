//! Turning corpus lines into types, collocates and tokens
use crate::errors::*;
use crate::settings::Settings;
use regex::Regex;
use serde::{Deserialize, Serialize};

/// The captured fields of one content line
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Match {
    fields: Vec<String>,
}

impl Match {
    pub fn new(fields: Vec<String>) -> Self {
        Match { fields }
    }

    pub fn field(&self, i: usize) -> &str {
        self.fields.get(i).map(String::as_str).unwrap_or("")
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
enum Part {
    Field(usize),
    Fid,
    Lid,
}

/// A slash separated list of parts, like `lemma/pos/fid/lid`
#[derive(Clone, Debug)]
struct Template(Vec<Part>);

impl Template {
    fn parse(template: &str, fields: &[&str]) -> Result<Template> {
        template
            .split('/')
            .map(|name| match name {
                "fid" => Ok(Part::Fid),
                "lid" => Ok(Part::Lid),
                _ => fields
                    .iter()
                    .position(|f| *f == name)
                    .map(Part::Field)
                    .ok_or_else(|| {
                        Error::InvalidSettings(format!("unknown field {:?} in {:?}", name, template))
                    }),
            })
            .collect::<Result<Vec<Part>>>()
            .map(Template)
    }

    fn render(&self, m: &Match, fid: &str, lid: usize) -> String {
        let mut out = String::new();
        for (i, part) in self.0.iter().enumerate() {
            if i > 0 {
                out.push('/');
            }
            match *part {
                Part::Field(f) => out.push_str(m.field(f)),
                Part::Fid => out.push_str(fid),
                Part::Lid => out.push_str(&lid.to_string()),
            }
        }
        out
    }
}

/// Regex driven line parser for tagged corpora
#[derive(Clone, Debug)]
pub struct CorpusFormatter {
    line_machine: Regex,
    separator: Regex,
    type_format: Template,
    colloc_format: Template,
    token_format: Template,
}

impl CorpusFormatter {
    pub fn new(settings: &Settings) -> Result<CorpusFormatter> {
        settings.validate()?;
        let fields = settings.fields();
        let line_machine = Regex::new(&settings.line_machine)?;
        // captures_len counts the implicit whole-match group too
        if line_machine.captures_len() - 1 < fields.len() {
            return Err(Error::InvalidSettings(format!(
                "line-machine {:?} captures {} groups but line-format names {} fields",
                settings.line_machine,
                line_machine.captures_len() - 1,
                fields.len()
            )));
        }
        Ok(CorpusFormatter {
            line_machine,
            separator: Regex::new(&settings.separator_line_machine)?,
            type_format: Template::parse(&settings.type_format, &fields)?,
            colloc_format: Template::parse(&settings.colloc_format, &fields)?,
            token_format: Template::parse(&settings.token_format, &fields)?,
        })
    }

    /// Parse a content line, `None` for anything else
    pub fn match_line(&self, raw: &str) -> Option<Match> {
        let caps = self.line_machine.captures(raw.trim())?;
        let fields = (1..caps.len())
            .map(|i| caps.get(i).map(|c| c.as_str().to_string()).unwrap_or_default())
            .collect();
        Some(Match::new(fields))
    }

    pub fn is_segment_boundary(&self, raw: &str) -> bool {
        self.separator.is_match(raw.trim())
    }

    pub fn type_of(&self, m: &Match) -> String {
        self.type_format.render(m, "", 0)
    }

    pub fn colloc_of(&self, m: &Match) -> String {
        self.colloc_format.render(m, "", 0)
    }

    pub fn token_of(&self, m: &Match, fid: &str, lid: usize) -> String {
        self.token_format.render(m, fid, lid)
    }
}
