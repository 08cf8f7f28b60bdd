use crate::{
    config::Config,
    error::Result,
    services::{
        catalog::CatalogStore,
        chroma::{ChromaIndex, IndexedEntry},
        embedding::OpenAiEmbedder,
    },
};
use indicatif::{ProgressBar, ProgressStyle};
use log::{debug, info, warn};

const BATCH_SIZE: usize = 64;

/// Rebuild the vector collection from the on-disk catalog: drop the old
/// collection, recreate it with cosine space, embed every record's `short`
/// text and add the entries. Offline only; the serving path never mutates
/// the index.
pub async fn run(config: &Config) -> Result<()> {
    info!("Rebuilding vector index from {}", config.catalog_path);

    let catalog = CatalogStore::load(&config.catalog_path)?;
    if catalog.is_empty() {
        warn!("Catalog is empty; nothing to index");
        return Ok(());
    }

    let embedder = OpenAiEmbedder::new(
        &config.openai_api_key,
        &config.openai_base_url,
        &config.embedding_model,
    );
    let index = ChromaIndex::recreate(&config.chroma_url, &config.chroma_collection).await?;

    let records = catalog.records();
    let total_batches = (records.len() + BATCH_SIZE - 1) / BATCH_SIZE;
    let progress = ProgressBar::new(records.len() as u64);
    progress.set_style(
        ProgressStyle::default_bar()
            .template("{bar:40} {pos}/{len} {msg}")
            .progress_chars("=> "),
    );

    let mut indexed = 0usize;
    for (batch_index, batch) in records.chunks(BATCH_SIZE).enumerate() {
        let texts: Vec<String> = batch.iter().map(|record| record.short.clone()).collect();
        let embeddings = embedder.embed_batch(&texts).await?;

        let entries: Vec<IndexedEntry> = batch
            .iter()
            .zip(embeddings)
            .map(|(record, embedding)| IndexedEntry {
                id: record.title.clone(),
                embedding,
                document: record.short.clone(),
                metadata: serde_json::json!({ "title": record.title, "full": record.full }),
            })
            .collect();

        index.add(&entries).await?;
        indexed += entries.len();
        progress.inc(entries.len() as u64);
        debug!("Indexed batch {} of {}", batch_index + 1, total_batches);
    }

    progress.finish_with_message("done");
    info!(
        "Indexed {} books into Chroma collection {:?}",
        indexed,
        index.collection_name()
    );

    Ok(())
}
