use std::sync::Arc;
use tracing::info;

use crate::config::Config;
use crate::error::{ApiError, Result};
use crate::models::Recommendation;
use crate::services::catalog::CatalogStore;
use crate::services::chooser::OpenAiChooser;
use crate::services::chroma::ChromaIndex;
use crate::services::embedding::OpenAiEmbedder;
use crate::services::retriever::Retriever;
use crate::services::selector::{AbstainReason, SelectionOutcome, Selector};
use crate::services::validation::{InputValidator, ValidationResult};

/// The per-request pipeline shared by the HTTP handler and the interactive
/// CLI: validate, retrieve, select, assemble. Holds no mutable state, so one
/// instance serves concurrent requests.
pub struct LibrarianService {
    validator: InputValidator,
    retriever: Retriever,
    selector: Selector,
    catalog: CatalogStore,
    retrieval_k: usize,
}

impl LibrarianService {
    pub fn new(
        validator: InputValidator,
        retriever: Retriever,
        selector: Selector,
        catalog: CatalogStore,
        retrieval_k: usize,
    ) -> Self {
        Self {
            validator,
            retriever,
            selector,
            catalog,
            retrieval_k,
        }
    }

    /// Wire the production collaborators from configuration: OpenAI clients
    /// for embedding and choosing, the Chroma collection, and the on-disk
    /// catalog.
    pub async fn from_config(config: &Config) -> Result<Self> {
        let embedder = Arc::new(OpenAiEmbedder::new(
            &config.openai_api_key,
            &config.openai_base_url,
            &config.embedding_model,
        ));
        let index = Arc::new(ChromaIndex::connect(&config.chroma_url, &config.chroma_collection).await?);
        let chooser = Arc::new(OpenAiChooser::new(
            &config.openai_api_key,
            &config.openai_base_url,
            &config.chooser_model,
        ));

        let validator = InputValidator::new(config.blocked_word_list());
        let retriever = Retriever::new(embedder, index);
        let selector = Selector::new(
            chooser,
            config.distance_threshold,
            config.short_query_max_chars,
        );
        let catalog = CatalogStore::load(&config.catalog_path)?;

        info!(
            "Librarian ready: {} catalog records, k={}, threshold={}",
            catalog.len(),
            config.retrieval_k,
            config.distance_threshold
        );

        Ok(Self::new(
            validator,
            retriever,
            selector,
            catalog,
            config.retrieval_k,
        ))
    }

    /// One recommendation for a free-text request, or a categorized
    /// rejection. Infrastructure failures surface as errors; they are never
    /// folded into a rejection.
    pub async fn recommend(&self, raw_query: &str) -> Result<Recommendation> {
        let query = raw_query.trim();
        if query.is_empty() {
            return Err(ApiError::EmptyInput);
        }

        match self.validator.validate(query) {
            ValidationResult::Inappropriate => return Err(ApiError::InappropriateInput),
            ValidationResult::Gibberish => return Err(ApiError::GibberishInput),
            ValidationResult::Valid => {}
        }

        let (candidates, best_distance) = self.retriever.retrieve(query, self.retrieval_k).await?;
        if candidates.is_empty() {
            return Err(ApiError::NoCandidates);
        }

        match self.selector.select(query, &candidates, best_distance).await? {
            SelectionOutcome::Chosen(title) => Ok(self.assemble(query, &title)),
            SelectionOutcome::Abstained(AbstainReason::NoCloseMatch) => {
                Err(ApiError::NoCloseMatch)
            }
        }
    }

    /// Join the chosen title to its stored summary and a templated reason.
    fn assemble(&self, query: &str, title: &str) -> Recommendation {
        Recommendation {
            title: title.to_string(),
            reason: format!(
                "Selected based on theme similarity to your request: \"{}\".",
                query
            ),
            summary: self.catalog.summary_by_title(title),
        }
    }
}
