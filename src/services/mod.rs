pub mod catalog;
pub mod chooser;
pub mod chroma;
pub mod embedding;
pub mod librarian;
pub mod retriever;
pub mod selector;
pub mod validation;

// Re-export public types
pub use catalog::CatalogStore;
pub use chooser::{OpenAiChooser, TitleChooser};
pub use chroma::{ChromaIndex, IndexedEntry, ScoredEntry, VectorIndex};
pub use embedding::{Embedder, OpenAiEmbedder};
pub use librarian::LibrarianService;
pub use retriever::Retriever;
pub use selector::{AbstainReason, SelectionOutcome, Selector};
pub use validation::{InputValidator, ValidationResult};
