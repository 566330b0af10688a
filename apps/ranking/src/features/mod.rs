// Candidate feature extraction: degree parsing, experience, education rank,
// TF-IDF similarity and the 6-field feature vector.

pub mod degree;
pub mod education;
pub mod experience;
pub mod similarity;
pub mod transform;
