//! String to dense id tables, one per axis of a build
use crate::farm::{new_farm, FarmMap};

pub struct Interner {
    ids: FarmMap<String, u32>,
    strings: Vec<String>,
    limit: usize,
}

impl Default for Interner {
    fn default() -> Self {
        Interner::new()
    }
}

impl Interner {
    pub fn new() -> Self {
        Interner {
            ids: new_farm(),
            strings: vec![],
            limit: u32::MAX as usize,
        }
    }

    /// An interner that hands out at most `limit` ids
    pub fn with_limit(limit: usize) -> Self {
        Interner {
            limit: limit.min(u32::MAX as usize),
            ..Interner::new()
        }
    }

    /// Id of `s`, assigning the next one on first sight
    ///
    /// `None` once every id is taken; the string is then not recorded.
    pub fn intern(&mut self, s: &str) -> Option<u32> {
        if let Some(&id) = self.ids.get(s) {
            return Some(id);
        }
        if self.strings.len() >= self.limit {
            return None;
        }
        let id = u32::try_from(self.strings.len()).ok()?;
        self.strings.push(s.to_owned());
        self.ids.insert(s.to_owned(), id);
        Some(id)
    }

    pub fn get(&self, s: &str) -> Option<u32> {
        self.ids.get(s).cloned()
    }

    pub fn resolve(&self, id: u32) -> &str {
        &self.strings[id as usize]
    }

    pub fn len(&self) -> usize {
        self.strings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.strings.is_empty()
    }

    /// For every id, its position in `labels` (which must be sorted)
    ///
    /// Strings missing from `labels` map to `None`.
    pub fn positions_in(&self, labels: &[String]) -> Vec<Option<usize>> {
        self.strings
            .iter()
            .map(|s| labels.binary_search(s).ok())
            .collect()
    }

    /// The interned strings in ascending order
    pub fn sorted(&self) -> Vec<String> {
        let mut out = self.strings.clone();
        out.sort();
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_are_dense_and_stable() {
        let mut i = Interner::new();
        assert_eq!(i.intern("b"), Some(0));
        assert_eq!(i.intern("a"), Some(1));
        assert_eq!(i.intern("b"), Some(0));
        assert_eq!(i.len(), 2);
        assert_eq!(i.resolve(1), "a");
        assert_eq!(i.get("c"), None);
    }

    #[test]
    fn full_tables_refuse_new_strings() {
        let mut i = Interner::with_limit(2);
        assert_eq!(i.intern("a"), Some(0));
        assert_eq!(i.intern("b"), Some(1));
        assert_eq!(i.intern("c"), None);
        assert_eq!(i.intern("a"), Some(0));
        assert_eq!(i.len(), 2);
        assert_eq!(i.get("c"), None);
    }

    #[test]
    fn positions_follow_sorted_labels() {
        let mut i = Interner::new();
        i.intern("z");
        i.intern("a");
        i.intern("q");
        let labels = vec!["a".to_string(), "z".to_string()];
        assert_eq!(i.positions_in(&labels), vec![Some(1), Some(0), None]);
        assert_eq!(i.sorted(), vec!["a", "q", "z"]);
    }
}
