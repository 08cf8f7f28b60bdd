use std::collections::HashMap;
use std::fs;

use tracing::{info, warn};

use crate::error::Result;
use crate::models::BookRecord;

/// In-memory catalog of book records loaded from `data/book_summaries.json`,
/// keyed by exact title. Immutable after load; the index rebuild script
/// re-derives the vector index from these records wholesale.
pub struct CatalogStore {
    records: Vec<BookRecord>,
    by_title: HashMap<String, usize>,
}

impl CatalogStore {
    pub fn load(path: &str) -> Result<Self> {
        let raw = fs::read_to_string(path)?;
        let records: Vec<BookRecord> = serde_json::from_str(&raw)?;
        let catalog = Self::from_records(records);
        info!("Loaded {} catalog records from {}", catalog.len(), path);
        Ok(catalog)
    }

    /// Duplicate titles are a data defect: the later record wins, keeping
    /// the first occurrence's position, and a warning is logged.
    pub fn from_records(raw: Vec<BookRecord>) -> Self {
        let mut records: Vec<BookRecord> = Vec::with_capacity(raw.len());
        let mut by_title: HashMap<String, usize> = HashMap::with_capacity(raw.len());

        for record in raw {
            match by_title.get(&record.title) {
                Some(&slot) => {
                    warn!(
                        "Duplicate catalog title {:?}; keeping the later record",
                        record.title
                    );
                    records[slot] = record;
                }
                None => {
                    by_title.insert(record.title.clone(), records.len());
                    records.push(record);
                }
            }
        }

        Self { records, by_title }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// All records in catalog order, for the bulk indexer.
    pub fn records(&self) -> &[BookRecord] {
        &self.records
    }

    pub fn get(&self, title: &str) -> Option<&BookRecord> {
        self.by_title.get(title).map(|&slot| &self.records[slot])
    }

    /// Full summary for an exact title. An absent title is tolerated with a
    /// fixed message rather than an error, so index/catalog drift degrades
    /// the answer instead of failing the request.
    pub fn summary_by_title(&self, title: &str) -> String {
        match self.get(title) {
            Some(record) => record.full.clone(),
            None => format!("I couldn't find a summary for \"{}\".", title),
        }
    }
}
