//! Basis PSD templates
//!
//! A basis is the mean PSD of every sample of one syllable label, used as a
//! reference fingerprint when classifying new syllables.

use crate::error::{PsdError, Result};
use serde::Serialize;

/// Labels that mark unidentifiable syllables; never used as a basis
pub const RESERVED_LABELS: [char; 2] = ['0', 'x'];

/// Mean PSD of one syllable label
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BasisTemplate {
    pub label: char,
    pub mean_power: Vec<f64>,
    /// Number of samples averaged
    pub count: usize,
}

/// Basis templates in label order
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct BasisSet {
    pub templates: Vec<BasisTemplate>,
}

impl BasisSet {
    pub fn len(&self) -> usize {
        self.templates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.templates.is_empty()
    }

    pub fn labels(&self) -> Vec<char> {
        self.templates.iter().map(|t| t.label).collect()
    }

    pub fn powers(&self) -> Vec<Vec<f64>> {
        self.templates.iter().map(|t| t.mean_power.clone()).collect()
    }

    pub fn get(&self, label: char) -> Option<&BasisTemplate> {
        self.templates.iter().find(|t| t.label == label)
    }
}

/// Indices of every occurrence of `label` in `notes`
pub fn find_label(notes: &str, label: char) -> Vec<usize> {
    notes
        .chars()
        .enumerate()
        .filter(|&(_, c)| c == label)
        .map(|(i, _)| i)
        .collect()
}

/// Distinct labels in order of first appearance
pub fn unique_labels(labels: impl IntoIterator<Item = char>) -> Vec<char> {
    let mut seen = Vec::new();
    for label in labels {
        if !seen.contains(&label) {
            seen.push(label);
        }
    }
    seen
}

/// Build basis templates from cached PSDs.
///
/// Labels are enumerated alphabetically (distinct labels of the sorted note
/// string). Reserved labels and labels outside `vocabulary` are dropped; a
/// label needs at least `min_count` samples to get a basis.
pub fn build_basis(
    psd_list: &[Vec<f64>],
    notes: &str,
    vocabulary: &str,
    min_count: usize,
) -> Result<BasisSet> {
    let note_count = notes.chars().count();
    if psd_list.len() != note_count {
        return Err(PsdError::Shape(format!(
            "{} PSD vectors but {} notes",
            psd_list.len(),
            note_count
        )));
    }
    if let Some(first) = psd_list.first() {
        if let Some(bad) = psd_list.iter().position(|p| p.len() != first.len()) {
            return Err(PsdError::Shape(format!(
                "PSD vector {} has length {}, expected {}",
                bad,
                psd_list[bad].len(),
                first.len()
            )));
        }
    }

    let mut sorted: Vec<char> = notes.chars().collect();
    sorted.sort_unstable();

    let mut templates = Vec::new();

    for label in unique_labels(sorted) {
        if RESERVED_LABELS.contains(&label) || !vocabulary.contains(label) {
            continue;
        }

        let indices = find_label(notes, label);
        if indices.len() < min_count {
            log::debug!(
                "No basis for '{}': {} samples < {}",
                label,
                indices.len(),
                min_count
            );
            continue;
        }

        templates.push(BasisTemplate {
            label,
            mean_power: mean_of(psd_list, &indices),
            count: indices.len(),
        });
    }

    Ok(BasisSet { templates })
}

/// Elementwise mean of the selected rows (`indices` non-empty)
fn mean_of(rows: &[Vec<f64>], indices: &[usize]) -> Vec<f64> {
    let width = rows[indices[0]].len();
    let mut sum = vec![0.0; width];
    for &i in indices {
        for (acc, v) in sum.iter_mut().zip(rows[i].iter()) {
            *acc += v;
        }
    }
    let n = indices.len() as f64;
    sum.into_iter().map(|s| s / n).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rows(n: usize) -> Vec<Vec<f64>> {
        (0..n).map(|i| vec![i as f64, 10.0 * i as f64]).collect()
    }

    #[test]
    fn test_threshold_filters_labels() {
        let basis = build_basis(&rows(6), "AABBBC", "ABC", 2).unwrap();

        assert_eq!(basis.labels(), vec!['A', 'B']);
        assert_eq!(basis.get('A').unwrap().mean_power, vec![0.5, 5.0]);
        assert_eq!(basis.get('B').unwrap().mean_power, vec![3.0, 30.0]);
        assert_eq!(basis.get('B').unwrap().count, 3);
        assert!(basis.get('C').is_none());
    }

    #[test]
    fn test_labels_enumerated_alphabetically() {
        // First-occurrence order would be c, a, b
        let basis = build_basis(&rows(6), "cabcab", "abc", 1).unwrap();
        assert_eq!(basis.labels(), vec!['a', 'b', 'c']);
        assert_eq!(basis.powers()[0], vec![2.5, 25.0]);
    }

    #[test]
    fn test_reserved_labels_always_excluded() {
        let basis = build_basis(&rows(6), "000xxa", "0xa", 1).unwrap();
        assert_eq!(basis.labels(), vec!['a']);
    }

    #[test]
    fn test_vocabulary_filters_labels() {
        let basis = build_basis(&rows(4), "aabb", "b", 1).unwrap();
        assert_eq!(basis.labels(), vec!['b']);
    }

    #[test]
    fn test_mismatched_lengths_are_shape_errors() {
        assert!(matches!(
            build_basis(&rows(3), "ab", "ab", 1),
            Err(PsdError::Shape(_))
        ));

        let ragged = vec![vec![1.0, 2.0], vec![1.0]];
        assert!(matches!(
            build_basis(&ragged, "ab", "ab", 1),
            Err(PsdError::Shape(_))
        ));
    }

    #[test]
    fn test_empty_input() {
        assert!(build_basis(&[], "", "abc", 1).unwrap().is_empty());
    }

    #[test]
    fn test_find_label_and_unique() {
        assert_eq!(find_label("abcabc", 'b'), vec![1, 4]);
        assert_eq!(find_label("a*b*", '*'), vec![1, 3]);
        assert!(find_label("abc", 'z').is_empty());
        assert_eq!(unique_labels("cabbac".chars()), vec!['c', 'a', 'b']);
    }
}
