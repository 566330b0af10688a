//! TF-IDF cosine similarity between short documents.
//!
//! Each call fits a fresh vocabulary over the documents it is given; nothing is
//! cached between calls.

use std::collections::HashMap;
use std::sync::LazyLock;

use regex::Regex;
use thiserror::Error;

static TOKEN_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b\w\w+\b").expect("token pattern is valid"));

#[derive(Debug, Error, PartialEq)]
pub enum SimilarityError {
    #[error("empty vocabulary: documents contain no tokens of two or more characters")]
    EmptyVocabulary,

    #[error("document index {0} out of range")]
    OutOfRange(usize),
}

/// L2-normalised TF-IDF rows for a small set of documents.
#[derive(Debug)]
pub struct TfidfMatrix {
    rows: Vec<HashMap<usize, f64>>,
}

impl TfidfMatrix {
    /// Fits the vocabulary on `docs` and returns one weighted row per document.
    ///
    /// Term frequency is the raw count; idf is `ln((1 + n) / (1 + df)) + 1`.
    pub fn fit_transform(docs: &[&str]) -> Result<Self, SimilarityError> {
        let mut vocabulary: HashMap<String, usize> = HashMap::new();
        let mut counts: Vec<HashMap<usize, f64>> = Vec::with_capacity(docs.len());

        for doc in docs {
            let lower = doc.to_lowercase();
            let mut row: HashMap<usize, f64> = HashMap::new();
            for token in TOKEN_RE.find_iter(&lower) {
                let next_id = vocabulary.len();
                let id = *vocabulary.entry(token.as_str().to_string()).or_insert(next_id);
                *row.entry(id).or_insert(0.0) += 1.0;
            }
            counts.push(row);
        }

        if vocabulary.is_empty() {
            return Err(SimilarityError::EmptyVocabulary);
        }

        let mut document_frequency = vec![0_usize; vocabulary.len()];
        for row in &counts {
            for id in row.keys() {
                document_frequency[*id] += 1;
            }
        }

        let n = docs.len() as f64;
        let idf: Vec<f64> = document_frequency
            .iter()
            .map(|df| ((1.0 + n) / (1.0 + *df as f64)).ln() + 1.0)
            .collect();

        let rows = counts
            .into_iter()
            .map(|mut row| {
                for (id, weight) in row.iter_mut() {
                    *weight *= idf[*id];
                }
                let norm = row.values().map(|w| w * w).sum::<f64>().sqrt();
                if norm > 0.0 {
                    row.values_mut().for_each(|w| *w /= norm);
                }
                row
            })
            .collect();

        Ok(Self { rows })
    }

    /// Cosine similarity between two fitted documents, in `[0, 1]`.
    pub fn cosine(&self, a: usize, b: usize) -> Result<f64, SimilarityError> {
        let row_a = self.rows.get(a).ok_or(SimilarityError::OutOfRange(a))?;
        let row_b = self.rows.get(b).ok_or(SimilarityError::OutOfRange(b))?;

        let (small, large) = if row_a.len() <= row_b.len() {
            (row_a, row_b)
        } else {
            (row_b, row_a)
        };
        let dot: f64 = small
            .iter()
            .filter_map(|(id, w)| large.get(id).map(|other| w * other))
            .sum();

        Ok(dot.clamp(0.0, 1.0))
    }
}

/// Fits TF-IDF jointly on two texts and returns their cosine similarity.
pub fn tfidf_cosine(a: &str, b: &str) -> Result<f64, SimilarityError> {
    TfidfMatrix::fit_transform(&[a, b])?.cosine(0, 1)
}
