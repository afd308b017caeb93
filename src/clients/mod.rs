pub mod document_ai_client;

pub use document_ai_client::{DocumentAiClient, DocumentExtractor, ExtractError};
