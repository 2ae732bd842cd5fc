//! Frequency lists that double as filters
//!
//! A vocabulary is either still growing (every item it is shown gets counted and accepted) or
//! fixed (it only answers membership and never changes). Which one is decided once, when a build
//! starts, and a vocabulary handed in by the caller is always fixed, even if it is empty.
use crate::errors::*;
use crate::farm::{new_farm, FarmMap};
use crate::persist;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::Path;

pub type Counts = FarmMap<String, u64>;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum Vocab {
    /// Counts everything it considers
    Growable(Counts),
    /// Allow-list; considering an item never mutates it
    Fixed(Counts),
}

impl Default for Vocab {
    fn default() -> Self {
        Vocab::growable()
    }
}

impl Vocab {
    pub fn growable() -> Self {
        Vocab::Growable(new_farm())
    }

    /// A filter over `items`, each with a count of zero
    pub fn fixed<I, S>(items: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Vocab::Fixed(items.into_iter().map(|s| (s.into(), 0)).collect())
    }

    pub fn from_counts<I, S>(counts: I, filter_present: bool) -> Self
    where
        I: IntoIterator<Item = (S, u64)>,
        S: Into<String>,
    {
        let counts = counts.into_iter().map(|(s, c)| (s.into(), c)).collect();
        if filter_present {
            Vocab::Fixed(counts)
        } else {
            Vocab::Growable(counts)
        }
    }

    /// Read a newline separated list of items as a filter
    pub fn read_list<P: AsRef<Path>>(path: P) -> Result<Self> {
        let mut items = vec![];
        for line in BufReader::new(File::open(path)?).lines() {
            let line = line?;
            let item = line.trim();
            if !item.is_empty() {
                items.push(item.to_string());
            }
        }
        Ok(Vocab::fixed(items))
    }

    fn counts(&self) -> &Counts {
        match *self {
            Vocab::Growable(ref c) | Vocab::Fixed(ref c) => c,
        }
    }

    pub fn filter_present(&self) -> bool {
        matches!(*self, Vocab::Fixed(_))
    }

    pub fn contains(&self, item: &str) -> bool {
        self.counts().contains_key(item)
    }

    /// Show an item to the vocabulary, returning whether it is accepted
    ///
    /// A growable vocabulary counts the item and always accepts it. A fixed one only tests
    /// membership.
    pub fn consider(&mut self, item: &str) -> bool {
        match *self {
            Vocab::Growable(ref mut c) => {
                match c.get_mut(item) {
                    Some(n) => *n += 1,
                    None => {
                        c.insert(item.to_owned(), 1);
                    }
                }
                true
            }
            Vocab::Fixed(ref c) => c.contains_key(item),
        }
    }

    /// Stop growing; later `consider` calls only filter
    pub fn into_fixed(self) -> Self {
        match self {
            Vocab::Growable(c) => Vocab::Fixed(c),
            fixed => fixed,
        }
    }

    pub fn count(&self, item: &str) -> u64 {
        self.counts().get(item).cloned().unwrap_or(0)
    }

    pub fn len(&self) -> usize {
        self.counts().len()
    }

    pub fn is_empty(&self) -> bool {
        self.counts().is_empty()
    }

    pub fn total(&self) -> u64 {
        self.counts().values().sum()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, u64)> + '_ {
        self.counts().iter().map(|(k, &v)| (k.as_str(), v))
    }

    /// All items in ascending order
    pub fn snapshot_items(&self) -> Vec<String> {
        let mut items: Vec<String> = self.counts().keys().cloned().collect();
        items.sort();
        items
    }

    /// Key-wise sum; the result filters if either side did
    pub fn merge(&self, other: &Vocab) -> Vocab {
        let mut counts = self.counts().clone();
        for (k, &v) in other.counts() {
            *counts.entry(k.clone()).or_insert(0) += v;
        }
        if self.filter_present() || other.filter_present() {
            Vocab::Fixed(counts)
        } else {
            Vocab::Growable(counts)
        }
    }

    pub fn merge_all(vocabs: Vec<Vocab>) -> Vocab {
        let mut iter = vocabs.into_iter();
        let first = match iter.next() {
            Some(v) => v,
            None => return Vocab::growable(),
        };
        iter.fold(first, |acc, v| acc.merge(&v))
    }

    /// Content equality, whatever the order the entries were stored in
    pub fn equal(&self, other: &Vocab) -> bool {
        self == other
    }

    /// Only the items seen at least `min` times, as a filter
    pub fn min_freq(&self, min: u64) -> Vocab {
        Vocab::Fixed(
            self.counts()
                .iter()
                .filter(|&(_, &v)| v >= min)
                .map(|(k, &v)| (k.clone(), v))
                .collect(),
        )
    }

    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        persist::save(self, path)
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<Vocab> {
        persist::load(path)
    }

    /// Write `item<TAB>count` lines, most frequent first
    pub fn write_tsv<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let mut entries: Vec<(&str, u64)> = self.iter().collect();
        entries.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(b.0)));
        let mut writer = BufWriter::new(File::create(path)?);
        for (item, count) in entries {
            writeln!(writer, "{}\t{}", item, count)?;
        }
        writer.flush()?;
        Ok(())
    }
}
