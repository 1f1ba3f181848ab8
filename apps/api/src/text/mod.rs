// Text preparation for embedding: markup stripping, filtering, stopwords, lemmas.
// Everything here is pure and deterministic.

pub mod lemmatizer;
pub mod normalizer;
pub mod stopwords;

pub use normalizer::normalize;
