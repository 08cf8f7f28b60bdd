use serde::{Deserialize, Serialize};

/// One catalog entry from `data/book_summaries.json`. `title` is the unique
/// key joining the catalog and the vector index.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BookRecord {
    pub title: String,
    /// Short thematic description; the text that gets embedded.
    pub short: String,
    /// Complete summary returned to the reader.
    pub full: String,
}

/// A catalog entry returned by nearest-neighbor search for a query,
/// annotated with its cosine distance (smaller = more similar).
#[derive(Debug, Clone)]
pub struct Candidate {
    pub title: String,
    pub short: String,
    pub full: String,
    pub distance: f32,
}
