use std::{io, path::Path};

use async_trait::async_trait;

#[derive(Debug, Default, Clone)]
pub struct TokioFs;

impl TokioFs {
    pub fn new() -> Self {
        Self
    }
}

// Dependency to read manifests and variable files
#[async_trait]
pub trait FileReader {
    async fn exists(&self, path: &Path) -> bool;
    async fn read_to_string(&self, path: &Path) -> io::Result<String>;
}

#[async_trait]
impl FileReader for TokioFs {
    async fn exists(&self, path: &Path) -> bool {
        tokio::fs::try_exists(path).await.unwrap_or(false)
    }

    async fn read_to_string(&self, path: &Path) -> io::Result<String> {
        tokio::fs::read_to_string(path).await
    }
}
