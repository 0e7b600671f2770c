use crate::error::{ResearchError, Result};
use log::debug;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};
use uuid::Uuid;

pub const DEFAULT_FILENAME: &str = "document.txt";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    pub text: String,
    pub filename: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentReceipt {
    pub document_id: String,
    pub filename: String,
    /// Length of the stored text in characters.
    pub text_length: usize,
    pub status: String,
    pub message: String,
}

/// In-memory holding area for uploaded text until it is analyzed.
#[derive(Debug)]
pub struct DocumentStore {
    documents: Mutex<HashMap<Uuid, Document>>,
    max_text_length: usize,
}

impl DocumentStore {
    pub fn new(max_text_length: usize) -> Self {
        Self {
            documents: Mutex::new(HashMap::new()),
            max_text_length,
        }
    }

    pub fn max_text_length(&self) -> usize {
        self.max_text_length
    }

    pub fn create(&self, text: impl Into<String>, filename: Option<&str>) -> Result<DocumentReceipt> {
        let text = text.into();
        if text.trim().is_empty() {
            return Err(ResearchError::EmptyText);
        }

        let length = text.chars().count();
        if length > self.max_text_length {
            return Err(ResearchError::TextTooLarge {
                length,
                max_length: self.max_text_length,
            });
        }

        let filename = filename
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .unwrap_or(DEFAULT_FILENAME)
            .to_string();
        let id = Uuid::new_v4();

        self.lock()?.insert(
            id,
            Document {
                text,
                filename: filename.clone(),
            },
        );
        debug!("Stored document {} ({}, {} chars)", id, filename, length);

        Ok(DocumentReceipt {
            document_id: id.to_string(),
            filename,
            text_length: length,
            status: "ready".to_string(),
            message: "Text received successfully".to_string(),
        })
    }

    pub fn get(&self, document_id: &str) -> Result<Document> {
        let id = parse_id(document_id)?;
        self.lock()?
            .get(&id)
            .cloned()
            .ok_or_else(|| ResearchError::DocumentNotFound(document_id.to_string()))
    }

    pub fn remove(&self, document_id: &str) -> Result<Document> {
        let id = parse_id(document_id)?;
        self.lock()?
            .remove(&id)
            .ok_or_else(|| ResearchError::DocumentNotFound(document_id.to_string()))
    }

    pub fn len(&self) -> usize {
        self.documents.lock().map(|docs| docs.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lock(&self) -> Result<MutexGuard<'_, HashMap<Uuid, Document>>> {
        self.documents.lock().map_err(|_| ResearchError::StorePoisoned)
    }
}

// Ids that are not UUIDs can never have been issued.
fn parse_id(document_id: &str) -> Result<Uuid> {
    Uuid::parse_str(document_id.trim())
        .map_err(|_| ResearchError::DocumentNotFound(document_id.to_string()))
}
