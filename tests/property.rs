//! Property-based tests using proptest.
//!
//! Builds are checked against each other (one worker against many, one merge order against
//! another) and against counts worked out directly from the generated corpora.

mod common;

use collocate::coordinator::Partial;
use collocate::cooccur::CooccurrenceAccumulator;
use collocate::formatter::CorpusFormatter;
use collocate::scan::scan_text;
use collocate::tokens::TypeNodes;
use collocate::{LabeledMatrix, Vocab};
use common::{handler, segments_text, settings, write_corpus, write_nested_corpus};
use proptest::prelude::*;
use std::cmp::min;

// ============================================================================
// STRATEGIES
// ============================================================================

fn token_strategy() -> impl Strategy<Value = String> {
    prop::sample::select(vec!["a/X", "b/Y", "c/X", "d/Z", "a/Y"]).prop_map(str::to_string)
}

/// Corpus lines: mostly tokens, some boundaries and some lines that are not content at all
fn line_strategy() -> impl Strategy<Value = String> {
    prop_oneof![
        8 => token_strategy(),
        1 => Just("</s>".to_string()),
        1 => Just("<doc id=1>".to_string()),
    ]
}

fn document_strategy() -> impl Strategy<Value = String> {
    prop::collection::vec(line_strategy(), 0..25).prop_map(|lines| lines.join("\n"))
}

fn corpus_strategy() -> impl Strategy<Value = Vec<String>> {
    prop::collection::vec(document_strategy(), 1..7)
}

fn segments_strategy() -> impl Strategy<Value = Vec<Vec<String>>> {
    prop::collection::vec(prop::collection::vec(token_strategy(), 0..12), 1..5)
}

const LABELS: [&str; 5] = ["p", "q", "r", "s", "t"];

/// A small matrix over a random subset of labels
fn matrix_strategy() -> impl Strategy<Value = LabeledMatrix<u64>> {
    (
        any::<u8>(),
        any::<u8>(),
        prop::collection::vec((0..5usize, 0..5usize, 1..10u64), 0..12),
    )
        .prop_map(|(row_mask, col_mask, cells)| {
            let labels = |mask: u8| -> Vec<String> {
                LABELS
                    .iter()
                    .enumerate()
                    .filter(|&(i, _)| mask & (1 << i) != 0)
                    .map(|(_, l)| l.to_string())
                    .collect()
            };
            let (rows, cols) = (labels(row_mask), labels(col_mask));
            let triplets = if rows.is_empty() || cols.is_empty() {
                vec![]
            } else {
                cells
                    .into_iter()
                    .map(|(r, c, v)| (r % rows.len(), c % cols.len(), v))
                    .collect()
            };
            LabeledMatrix::from_triplets(rows, cols, triplets).unwrap()
        })
}

/// Tokens in a stable order, since workers may hand them back in any order
///
/// Files in different directories can share an id, so whole tokens break ties.
fn sorted_nodes(mut nodes: TypeNodes) -> TypeNodes {
    for node in nodes.0.values_mut() {
        node.tokens
            .sort_by_cached_key(|t| (t.fid.clone(), t.lid, format!("{:?}", t)));
    }
    nodes
}

// ============================================================================
// PARTITION AND MERGE
// ============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(24))]

    /// Property: splitting the corpus over workers does not change the counts.
    #[test]
    fn prop_workers_agree_on_cooccurrences(
        docs in corpus_strategy(),
        workers in 2..5usize,
        left in 0..4usize,
        right in 0..4usize,
    ) {
        let dir = tempfile::tempdir().unwrap();
        let files = write_corpus(dir.path(), &docs);
        let single = handler(dir.path(), 1, left, right)
            .build_col_freq(&files, None, None)
            .unwrap();
        let split = handler(dir.path(), workers, left, right)
            .build_col_freq(&files, None, None)
            .unwrap();
        prop_assert!(split.is_complete());
        prop_assert_eq!(single.result, split.result);
    }

    /// Property: the same holds with filters, and for token nodes up to token order.
    #[test]
    fn prop_workers_agree_on_tokens(
        docs in corpus_strategy(),
        workers in 2..5usize,
    ) {
        let dir = tempfile::tempdir().unwrap();
        let files = write_corpus(dir.path(), &docs);
        let queries = || Some(Vocab::fixed(vec!["a/X", "d/Z"]));
        let contexts = || Some(Vocab::fixed(vec!["b/Y", "a/Y", "a/X"]));

        let one = handler(dir.path(), 1, 2, 2);
        let many = handler(dir.path(), workers, 2, 2);
        prop_assert_eq!(
            one.build_col_freq(&files, queries(), contexts()).unwrap().result,
            many.build_col_freq(&files, queries(), contexts()).unwrap().result
        );
        prop_assert_eq!(
            one.retrieve_tokens(&files, queries(), None).unwrap().result,
            many.retrieve_tokens(&files, queries(), None).unwrap().result
        );
        prop_assert_eq!(
            sorted_nodes(one.retrieve_token_nodes(&files, queries(), contexts()).unwrap().result),
            sorted_nodes(many.retrieve_token_nodes(&files, queries(), contexts()).unwrap().result)
        );
    }

    /// Property: files sharing an id across directories do not make workers disagree.
    #[test]
    fn prop_workers_agree_on_shared_file_ids(
        docs in prop::collection::vec(document_strategy(), 2..7),
        workers in 2..5usize,
        left in 1..4usize,
        right in 1..4usize,
    ) {
        let dir = tempfile::tempdir().unwrap();
        write_nested_corpus(dir.path(), &docs);
        let queries = || Some(Vocab::fixed(vec!["a/X", "c/X"]));

        let one = handler(dir.path(), 1, left, right);
        let many = handler(dir.path(), workers, left, right);
        let files = one.files(None).unwrap();
        prop_assert_eq!(files.len(), docs.len());

        let single = one.retrieve_tokens(&files, queries(), None).unwrap();
        let split = many.retrieve_tokens(&files, queries(), None).unwrap();
        prop_assert!(split.is_complete());
        prop_assert_eq!(single.result, split.result);
        prop_assert_eq!(
            sorted_nodes(one.retrieve_token_nodes(&files, queries(), None).unwrap().result),
            sorted_nodes(many.retrieve_token_nodes(&files, queries(), None).unwrap().result)
        );
    }

    /// Property: merging is associative and commutative.
    #[test]
    fn prop_merge_ignores_order(
        a in matrix_strategy(),
        b in matrix_strategy(),
        c in matrix_strategy(),
    ) {
        let abc = LabeledMatrix::merge_all(&[&a, &b, &c]);
        prop_assert_eq!(&abc, &a.merge(&b).merge(&c));
        prop_assert_eq!(&abc, &a.merge(&b.merge(&c)));
        prop_assert_eq!(&abc, &LabeledMatrix::merge_all(&[&c, &a, &b]));
        prop_assert_eq!(abc.total(), a.total() + b.total() + c.total());
    }

    /// Property: matrix merges and vocabulary merges agree with a single scan.
    #[test]
    fn prop_partial_results_merge_to_the_whole(segments in segments_strategy(), split in 0..5usize) {
        let formatter = CorpusFormatter::new(&settings(std::path::Path::new("."), 1, 2, 1)).unwrap();
        let count = |segments: &[Vec<String>]| {
            let mut acc = CooccurrenceAccumulator::new(Vocab::growable(), Vocab::growable());
            scan_text(&segments_text(segments), "doc", &formatter, 2, 1, &mut acc);
            acc.finish().unwrap()
        };
        let split = min(split, segments.len());
        let (head, tail) = segments.split_at(split);
        let merged = collocate::Cooccurrences::merge_all(vec![count(tail), count(head)]);
        prop_assert_eq!(merged, count(&segments[..]));
    }
}

// ============================================================================
// WINDOW COUNTS
// ============================================================================

proptest! {
    /// Property: every center pairs with exactly the tokens within its span, inside its segment.
    #[test]
    fn prop_emission_count_matches_spans(
        segments in segments_strategy(),
        left in 0..5usize,
        right in 0..5usize,
    ) {
        let formatter = CorpusFormatter::new(&settings(std::path::Path::new("."), 1, left, right)).unwrap();
        let mut acc = CooccurrenceAccumulator::new(Vocab::growable(), Vocab::growable());
        scan_text(&segments_text(&segments), "doc", &formatter, left, right, &mut acc);
        let cooc = acc.finish().unwrap();

        let expected: u64 = segments
            .iter()
            .map(|seg| {
                let n = seg.len();
                (0..n).map(|i| (min(i, left) + min(n - 1 - i, right)) as u64).sum::<u64>()
            })
            .sum();
        prop_assert_eq!(cooc.matrix.total(), expected);
        prop_assert_eq!(cooc.contexts.total(), expected);
        let centers: usize = segments.iter().map(Vec::len).sum();
        prop_assert_eq!(cooc.targets.total(), centers as u64);
    }

    /// Property: a growable vocabulary counts, a fixed one never changes.
    #[test]
    fn prop_consider_counts_only_when_growing(items in prop::collection::vec(token_strategy(), 0..30)) {
        let mut growing = Vocab::growable();
        let mut fixed = Vocab::fixed(vec!["a/X"]);
        let before = fixed.clone();
        for item in &items {
            prop_assert!(growing.consider(item));
            prop_assert_eq!(fixed.consider(item), item == "a/X");
        }
        prop_assert_eq!(growing.total(), items.len() as u64);
        prop_assert!(!growing.filter_present());
        prop_assert!(fixed.equal(&before));
    }
}
