//! Token level retrieval
//!
//! Two views on the occurrences of a set of query types. `TokenPositionAccumulator` gives every
//! occurrence (token) its own row and records where each collocate sat relative to it: negative
//! offsets on the left, positive on the right. `TokenNodeAccumulator` keeps the occurrences
//! themselves, grouped per query type, each with the collocates it was found with.
use crate::coordinator::Partial;
use crate::errors::*;
use crate::farm::{cell, new_plain, uncell, PlainMap};
use crate::formatter::{CorpusFormatter, Match};
use crate::intern::Interner;
use crate::matrix::LabeledMatrix;
use crate::persist;
use crate::scan::{Item, WindowSink};
use crate::vocab::Vocab;
use crate::window::Window;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

/// Token by collocate matrix of relative positions
pub struct TokenPositionAccumulator {
    queries: Vocab,
    contexts: Vocab,
    rows: Interner,
    cols: Interner,
    cells: PlainMap<u64, i32>,
    overflowed: bool,
}

impl TokenPositionAccumulator {
    /// `queries` decides which center types are kept; it is only ever read
    pub fn new(queries: Vocab, contexts: Vocab) -> Self {
        TokenPositionAccumulator {
            queries,
            contexts,
            rows: Interner::new(),
            cols: Interner::new(),
            cells: new_plain(),
            overflowed: false,
        }
    }

    pub fn finish(self) -> Result<TokenPositions> {
        if self.overflowed {
            return Err(Error::InvalidDimensions(format!(
                "more than {} distinct tokens or collocates",
                u32::MAX
            )));
        }
        let contexts = self.contexts.into_fixed();
        let row_labels = self.rows.sorted();
        let col_labels = contexts.snapshot_items();
        let row_pos = self.rows.positions_in(&row_labels);
        let col_pos = self.cols.positions_in(&col_labels);

        let mut triplets = Vec::with_capacity(self.cells.len());
        for (&key, &offset) in &self.cells {
            let (r, c) = uncell(key);
            match (row_pos[r as usize], col_pos[c as usize]) {
                (Some(r), Some(c)) => triplets.push((r, c, offset)),
                _ => {
                    return Err(Error::Other(format!(
                        "{:?} was seen near {:?} but is missing from the context vocabulary",
                        self.cols.resolve(c),
                        self.rows.resolve(r)
                    )))
                }
            }
        }
        Ok(TokenPositions {
            matrix: LabeledMatrix::from_triplets(row_labels, col_labels, triplets)?,
            contexts,
        })
    }
}

/// Which of two positions recorded under the same token label is kept
///
/// Token labels collide when files in different directories share a name. The position nearer
/// the center wins, the left one on a tie, so the choice never depends on which file came first.
pub fn nearer(a: i32, b: i32) -> i32 {
    if (a.abs(), a) <= (b.abs(), b) {
        a
    } else {
        b
    }
}

impl WindowSink for TokenPositionAccumulator {
    fn emit(&mut self, formatter: &CorpusFormatter, fid: &str, center: &Item, window: &Window<Item>) {
        if !self.queries.contains(&formatter.type_of(&center.matched)) {
            return;
        }
        let row = match self.rows.intern(&formatter.token_of(&center.matched, fid, center.lid)) {
            Some(row) => row,
            None => {
                self.overflowed = true;
                return;
            }
        };
        let mut seen: PlainMap<u64, i32> = new_plain();
        for (offset, item) in window.left_items().chain(window.right_items()) {
            let colloc = formatter.colloc_of(&item.matched);
            if self.contexts.consider(&colloc) {
                match self.cols.intern(&colloc) {
                    // A collocate seen twice around one token keeps its last position
                    Some(col) => {
                        seen.insert(cell(row, col), offset);
                    }
                    None => self.overflowed = true,
                }
            }
        }
        for (key, offset) in seen {
            self.cells
                .entry(key)
                .and_modify(|kept| *kept = nearer(*kept, offset))
                .or_insert(offset);
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct TokenPositions {
    pub matrix: LabeledMatrix<i32>,
    pub contexts: Vocab,
}

impl Partial for TokenPositions {
    fn merge_all(parts: Vec<Self>) -> Self {
        let matrix = {
            let refs: Vec<&LabeledMatrix<i32>> = parts.iter().map(|p| &p.matrix).collect();
            // Positions are not counts; a cell in several parts keeps one of them
            LabeledMatrix::merge_all_with(&refs, nearer)
        };
        TokenPositions {
            matrix,
            contexts: Vocab::merge_all(parts.into_iter().map(|p| p.contexts).collect()),
        }
    }
}

/// A collocate found around a token
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ItemNode {
    pub lid: usize,
    /// Slots from the center, negative on the left
    pub offset: i32,
    pub matched: Match,
    pub colloc: String,
}

/// One occurrence of a query type
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TokenNode {
    pub fid: String,
    pub lid: usize,
    pub token: String,
    pub matched: Match,
    /// Farthest first
    pub left: Vec<ItemNode>,
    /// Nearest first
    pub right: Vec<ItemNode>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TypeNode {
    pub type_str: String,
    pub tokens: Vec<TokenNode>,
}

impl TypeNode {
    pub fn new(type_str: &str) -> Self {
        TypeNode {
            type_str: type_str.to_string(),
            tokens: vec![],
        }
    }

    pub fn append_token(&mut self, token: TokenNode) {
        self.tokens.push(token);
    }

    /// Take over the tokens of another node of the same type
    pub fn merge(&mut self, other: TypeNode) {
        debug_assert_eq!(self.type_str, other.type_str);
        self.tokens.extend(other.tokens);
    }

    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }
}

/// Type nodes by type string
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct TypeNodes(pub BTreeMap<String, TypeNode>);

impl TypeNodes {
    /// An empty node for every query
    pub fn seeded(queries: &Vocab) -> Self {
        TypeNodes(
            queries
                .snapshot_items()
                .into_iter()
                .map(|q| {
                    let node = TypeNode::new(&q);
                    (q, node)
                })
                .collect(),
        )
    }

    pub fn get(&self, type_str: &str) -> Option<&TypeNode> {
        self.0.get(type_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = &TypeNode> + '_ {
        self.0.values()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Tokens over all types
    pub fn token_count(&self) -> usize {
        self.iter().map(TypeNode::len).sum()
    }

    fn node_mut(&mut self, type_str: &str) -> &mut TypeNode {
        self.0
            .entry(type_str.to_string())
            .or_insert_with(|| TypeNode::new(type_str))
    }

    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        persist::save(self, path)
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<TypeNodes> {
        persist::load(path)
    }
}

impl Partial for TypeNodes {
    fn merge_all(parts: Vec<Self>) -> Self {
        let mut merged = TypeNodes::default();
        for part in parts {
            for (type_str, node) in part.0 {
                merged.node_mut(&type_str).merge(node);
            }
        }
        merged
    }
}

/// Collects a `TokenNode` for every occurrence of a query type
///
/// Contexts are never counted here. A fixed context vocabulary only narrows which collocates are
/// attached.
pub struct TokenNodeAccumulator {
    queries: Vocab,
    contexts: Vocab,
    nodes: TypeNodes,
}

impl TokenNodeAccumulator {
    pub fn new(queries: Vocab, contexts: Vocab) -> Self {
        TokenNodeAccumulator {
            nodes: TypeNodes::seeded(&queries),
            queries,
            contexts,
        }
    }

    fn item_node(&self, formatter: &CorpusFormatter, offset: i32, item: &Item) -> Option<ItemNode> {
        let colloc = formatter.colloc_of(&item.matched);
        if self.contexts.filter_present() && !self.contexts.contains(&colloc) {
            return None;
        }
        Some(ItemNode {
            lid: item.lid,
            offset,
            matched: item.matched.clone(),
            colloc,
        })
    }

    pub fn finish(self) -> TypeNodes {
        self.nodes
    }
}

impl WindowSink for TokenNodeAccumulator {
    fn emit(&mut self, formatter: &CorpusFormatter, fid: &str, center: &Item, window: &Window<Item>) {
        let type_str = formatter.type_of(&center.matched);
        if !self.queries.contains(&type_str) {
            return;
        }
        let left = window
            .left_items()
            .filter_map(|(offset, item)| self.item_node(formatter, offset, item))
            .collect();
        let right = window
            .right_items()
            .filter_map(|(offset, item)| self.item_node(formatter, offset, item))
            .collect();
        let token = TokenNode {
            fid: fid.to_string(),
            lid: center.lid,
            token: formatter.token_of(&center.matched, fid, center.lid),
            matched: center.matched.clone(),
            left,
            right,
        };
        self.nodes.node_mut(&type_str).append_token(token);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scan::scan_text;
    use crate::settings::Settings;

    fn formatter() -> CorpusFormatter {
        CorpusFormatter::new(&Settings {
            line_machine: r"^(\w+)/(\w+)$".to_string(),
            line_format: "word,pos".to_string(),
            type_format: "word/pos".to_string(),
            colloc_format: "word".to_string(),
            token_format: "word/fid/lid".to_string(),
            ..Settings::default()
        })
        .unwrap()
    }

    const TEXT: &str = "the/DT\ncat/NN\nsat/VBD\n</s>\na/DT\ncat/NN\n";

    #[test]
    fn positions_are_signed_offsets() {
        let mut acc = TokenPositionAccumulator::new(Vocab::fixed(vec!["cat/NN"]), Vocab::growable());
        scan_text(TEXT, "doc", &formatter(), 2, 2, &mut acc);
        let t = acc.finish().unwrap();
        assert_eq!(t.matrix.row_labels(), &["cat/doc/2".to_string(), "cat/doc/6".to_string()][..]);
        assert_eq!(t.matrix.get("cat/doc/2", "the"), Some(-1));
        assert_eq!(t.matrix.get("cat/doc/2", "sat"), Some(1));
        assert_eq!(t.matrix.get("cat/doc/6", "a"), Some(-1));
        assert_eq!(t.matrix.get("cat/doc/6", "sat"), Some(0));
        assert_eq!(t.contexts.snapshot_items(), vec!["a", "sat", "the"]);
    }

    #[test]
    fn repeated_collocates_keep_the_last_position() {
        let mut acc = TokenPositionAccumulator::new(Vocab::fixed(vec!["cat/NN"]), Vocab::growable());
        scan_text("x/A\ncat/NN\nx/A\n", "d", &formatter(), 1, 1, &mut acc);
        let t = acc.finish().unwrap();
        assert_eq!(t.matrix.get("cat/d/2", "x"), Some(1));
        assert_eq!(t.contexts.count("x"), 2);
    }

    #[test]
    fn shared_token_labels_keep_the_nearer_position() {
        assert_eq!(nearer(-1, 2), -1);
        assert_eq!(nearer(2, -1), -1);
        assert_eq!(nearer(1, -1), -1);
        assert_eq!(nearer(-3, -3), -3);

        // Same file id from two directories: the token label is the same
        let mut acc = TokenPositionAccumulator::new(Vocab::fixed(vec!["cat/NN"]), Vocab::growable());
        scan_text("x/A\ny/B\ncat/NN\n", "doc", &formatter(), 2, 2, &mut acc);
        scan_text("y/B\nx/A\ncat/NN\n", "doc", &formatter(), 2, 2, &mut acc);
        let whole = acc.finish().unwrap();
        assert_eq!(whole.matrix.row("cat/doc/3"), vec![("x", -1), ("y", -1)]);

        let part = |text: &str| {
            let mut acc = TokenPositionAccumulator::new(Vocab::fixed(vec!["cat/NN"]), Vocab::growable());
            scan_text(text, "doc", &formatter(), 2, 2, &mut acc);
            acc.finish().unwrap()
        };
        let a = part("x/A\ny/B\ncat/NN\n");
        let b = part("y/B\nx/A\ncat/NN\n");
        assert_eq!(TokenPositions::merge_all(vec![a.clone(), b.clone()]).matrix, whole.matrix);
        assert_eq!(TokenPositions::merge_all(vec![b, a]).matrix, whole.matrix);
    }

    #[test]
    fn running_out_of_token_ids_is_an_error() {
        let mut acc = TokenPositionAccumulator::new(Vocab::fixed(vec!["cat/NN"]), Vocab::growable());
        acc.rows = Interner::with_limit(1);
        scan_text(TEXT, "doc", &formatter(), 1, 1, &mut acc);
        assert!(matches!(acc.finish(), Err(Error::InvalidDimensions(_))));
    }

    #[test]
    fn fixed_contexts_filter_positions() {
        let mut acc =
            TokenPositionAccumulator::new(Vocab::fixed(vec!["cat/NN"]), Vocab::fixed(vec!["sat"]));
        scan_text(TEXT, "doc", &formatter(), 2, 2, &mut acc);
        let t = acc.finish().unwrap();
        assert_eq!(t.matrix.col_labels(), &["sat".to_string()][..]);
        assert_eq!(t.matrix.nnz(), 1);
    }

    #[test]
    fn nodes_group_tokens_by_type() {
        let queries = Vocab::fixed(vec!["cat/NN", "dog/NN"]);
        let mut acc = TokenNodeAccumulator::new(queries, Vocab::growable());
        scan_text(TEXT, "doc", &formatter(), 1, 1, &mut acc);
        let nodes = acc.finish();
        assert_eq!(nodes.len(), 2);
        assert!(nodes.get("dog/NN").unwrap().is_empty());
        let cats = &nodes.get("cat/NN").unwrap().tokens;
        assert_eq!(cats.len(), 2);
        assert_eq!(cats[0].token, "cat/doc/2");
        assert_eq!(cats[0].left[0].colloc, "the");
        assert_eq!(cats[0].left[0].offset, -1);
        assert_eq!(cats[0].right[0].colloc, "sat");
        assert_eq!(cats[0].right[0].lid, 3);
        assert_eq!(cats[1].left.len(), 1);
        assert!(cats[1].right.is_empty());
    }

    #[test]
    fn fixed_contexts_narrow_attached_items() {
        let mut acc =
            TokenNodeAccumulator::new(Vocab::fixed(vec!["cat/NN"]), Vocab::fixed(Vec::<String>::new()));
        scan_text(TEXT, "doc", &formatter(), 1, 1, &mut acc);
        let nodes = acc.finish();
        assert_eq!(nodes.token_count(), 2);
        assert!(nodes.iter().flat_map(|n| &n.tokens).all(|t| t.left.is_empty() && t.right.is_empty()));
    }

    #[test]
    fn merging_concatenates_tokens() {
        let scan = |text: &str, fid: &str| {
            let mut acc = TokenNodeAccumulator::new(Vocab::fixed(vec!["cat/NN"]), Vocab::growable());
            scan_text(text, fid, &formatter(), 1, 1, &mut acc);
            acc.finish()
        };
        let merged = TypeNodes::merge_all(vec![scan("cat/NN\n", "a"), scan("x/A\ncat/NN\n", "b")]);
        let cats = &merged.get("cat/NN").unwrap().tokens;
        let fids: Vec<&str> = cats.iter().map(|t| t.fid.as_str()).collect();
        assert_eq!(fids, vec!["a", "b"]);
    }
}
