use crate::error::Result;
use config::Environment;
use serde::Deserialize;

/// Runtime configuration, read from `APP_*` environment variables (a `.env`
/// file is honored). Every knob has a default except the OpenAI API key.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub host: String,
    pub port: u16,

    pub openai_api_key: String,
    pub openai_base_url: String,
    pub embedding_model: String,
    pub chooser_model: String,

    pub chroma_url: String,
    pub chroma_collection: String,

    pub catalog_path: String,

    /// How many candidates to pull from the vector index per query.
    pub retrieval_k: usize,
    /// Cosine distance above which the best match counts as "too far".
    pub distance_threshold: f32,
    /// Queries at or below this many characters count as "very short".
    pub short_query_max_chars: usize,
    /// Comma-separated block-list for the input validator.
    pub blocked_words: String,
}

impl Config {
    pub fn load() -> Result<Self> {
        let settings = config::Config::builder()
            .set_default("host", "127.0.0.1")?
            .set_default("port", 8000)?
            .set_default("openai_base_url", "https://api.openai.com/v1")?
            .set_default("embedding_model", "text-embedding-3-small")?
            .set_default("chooser_model", "gpt-4o-mini")?
            .set_default("chroma_url", "http://localhost:8001")?
            .set_default("chroma_collection", "books")?
            .set_default("catalog_path", "data/book_summaries.json")?
            .set_default("retrieval_k", 6)?
            .set_default("distance_threshold", 0.75)?
            .set_default("short_query_max_chars", 3)?
            .set_default("blocked_words", "idiot,stupid,fuck,shit")?
            .add_source(Environment::with_prefix("APP"))
            .build()?;

        Ok(settings.try_deserialize()?)
    }

    /// The block-list as a normalized (trimmed, lowercased) word list.
    pub fn blocked_word_list(&self) -> Vec<String> {
        self.blocked_words
            .split(',')
            .map(|word| word.trim().to_lowercase())
            .filter(|word| !word.is_empty())
            .collect()
    }
}
