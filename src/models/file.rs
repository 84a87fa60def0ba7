//! Uploaded file models.

use serde::{Deserialize, Serialize};

/// Folders a tenant may upload into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FileFolder {
    Motorcycles,
    Models,
    Tickets,
    Documents,
}

impl FileFolder {
    pub fn as_str(self) -> &'static str {
        match self {
            FileFolder::Motorcycles => "motorcycles",
            FileFolder::Models => "models",
            FileFolder::Tickets => "tickets",
            FileFolder::Documents => "documents",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim() {
            "motorcycles" => Some(FileFolder::Motorcycles),
            "models" => Some(FileFolder::Models),
            "tickets" => Some(FileFolder::Tickets),
            "documents" => Some(FileFolder::Documents),
            _ => None,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct UploadedFile {
    pub key: String,
    pub content_type: String,
    pub size_bytes: usize,
}

#[derive(Debug, Deserialize)]
pub struct FileUrlQuery {
    pub key: String,
}

#[derive(Debug, Serialize)]
pub struct FileUrlResponse {
    pub url: String,
    pub expires_in_seconds: u64,
}
