use serde::{Deserialize, Serialize};

// Re-export types from book.rs
pub use book::{BookRecord, Candidate};

mod book;

/// Request structure for the chat endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatRequest {
    /// Free-text description of the book the user is looking for
    pub query: String,
}

/// A single recommendation: the chosen title, why it was chosen, and the
/// stored summary
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Recommendation {
    pub title: String,
    pub reason: String,
    pub summary: String,
}

/// Health check response structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    /// Status of the service
    pub status: String,
    /// Current timestamp in RFC3339 format
    pub timestamp: String,
}
