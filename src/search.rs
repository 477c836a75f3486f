//! Keyword search over the content tree.
//!
//! Containment matching: a question matches when the normalized query is a
//! substring of any normalized whitespace token of its question or answer
//! text. Deliberately looser than token equality so partial and compound
//! word matches are captured; over-matching is an accepted trade-off.

use crate::content::{ContentTree, Question};
use crate::normalize::Normalizer;

/// Hard cap on the number of hits returned.
pub const MAX_RESULTS: usize = 5;

/// Scan the tree in traversal order and return the first matches, capped
/// at [`MAX_RESULTS`]. Not relevance-ranked: first match wins.
///
/// An empty query normalizes to the empty string, which is a substring of
/// every token, so it matches the whole tree (first 5 returned). Callers
/// that consider an empty keyword invalid must reject it before calling;
/// the dialogue engine does.
pub fn search<'t>(tree: &'t ContentTree, normalizer: &Normalizer, query: &str) -> Vec<&'t Question> {
    let needle = normalizer.lemma(query);

    let mut hits = Vec::new();
    for question in tree.iter_questions() {
        if question_matches(normalizer, question, &needle) {
            hits.push(question);
            if hits.len() == MAX_RESULTS {
                break;
            }
        }
    }
    hits
}

fn question_matches(normalizer: &Normalizer, question: &Question, needle: &str) -> bool {
    question
        .question
        .split_whitespace()
        .chain(question.answer.split_whitespace())
        .any(|token| normalizer.lemma(token).contains(needle))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::tests::sample_tree;

    #[test]
    fn matches_inflected_question_text() {
        let tree = sample_tree();
        let n = Normalizer::russian();
        // Query in a different grammatical form than the stored text.
        let hits = search(&tree, &n, "экзаменах");
        assert!(!hits.is_empty());
        assert!(hits.iter().all(|q| q.question.contains("экзамен")
            || q.answer.contains("кзамен")));
    }

    #[test]
    fn matches_answer_text_too() {
        let tree = sample_tree();
        let n = Normalizer::russian();
        // "паспорт" appears only in an answer.
        let hits = search(&tree, &n, "паспорт");
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].id, 1);
    }

    #[test]
    fn substring_containment_not_equality() {
        let tree = sample_tree();
        let n = Normalizer::russian();
        // A fragment of a longer word still matches.
        let hits = search(&tree, &n, "экзам");
        assert!(!hits.is_empty());
    }

    #[test]
    fn results_capped_and_traversal_ordered() {
        let tree = sample_tree();
        let n = Normalizer::russian();
        let hits = search(&tree, &n, "экзамен");
        assert!(hits.len() <= MAX_RESULTS);
        let ids: Vec<u32> = hits.iter().map(|q| q.id).collect();
        let mut sorted = ids.clone();
        sorted.sort_unstable();
        assert_eq!(ids, sorted, "hits must follow tree traversal order");
    }

    #[test]
    fn empty_query_matches_everything_capped() {
        let tree = sample_tree();
        let n = Normalizer::russian();
        let hits = search(&tree, &n, "");
        assert_eq!(hits.len(), MAX_RESULTS);
        let ids: Vec<u32> = hits.iter().map(|q| q.id).collect();
        assert_eq!(ids, vec![1, 2, 3, 4, 5]);
    }

    #[test]
    fn zero_hits_is_empty_not_error() {
        let tree = sample_tree();
        let n = Normalizer::russian();
        assert!(search(&tree, &n, "космонавтика").is_empty());
    }

    #[test]
    fn every_hit_resolves_by_id() {
        let tree = sample_tree();
        let n = Normalizer::russian();
        for q in search(&tree, &n, "документ") {
            assert!(tree.question_by_id(q.id).is_ok());
        }
    }
}
