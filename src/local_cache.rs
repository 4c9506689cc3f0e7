use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{debug, warn};

use crate::error::CacheError;
use crate::models::Session;

pub const CACHE_FILE_NAME: &str = "recipe_chat_sessions.json";

/// Whole-list mirror of the sessions on local disk.
///
/// Every save rewrites the single blob. That is fine for a handful of sessions
/// with bounded histories; there is no incremental update path.
#[derive(Debug, Clone)]
pub struct LocalCache {
    path: PathBuf,
}

impl LocalCache {
    pub fn new(cache_dir: impl AsRef<Path>) -> Self {
        Self {
            path: cache_dir.as_ref().join(CACHE_FILE_NAME),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub async fn save(&self, sessions: &[Session]) -> Result<(), CacheError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).await?;
        }
        let blob = serde_json::to_vec_pretty(sessions)?;

        // Write beside the target then rename, so a crash never leaves half a blob.
        let tmp_path = self.path.with_extension("json.tmp");
        fs::write(&tmp_path, blob).await?;
        fs::rename(&tmp_path, &self.path).await?;
        debug!("Saved {} sessions to {:?}", sessions.len(), self.path);
        Ok(())
    }

    pub async fn load(&self) -> Vec<Session> {
        match self.try_load().await {
            Ok(sessions) => sessions,
            Err(e) => {
                warn!("Ignoring unreadable session cache {:?}: {}", self.path, e);
                Vec::new()
            }
        }
    }

    async fn try_load(&self) -> Result<Vec<Session>, CacheError> {
        let bytes = match fs::read(&self.path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };
        Ok(serde_json::from_slice(&bytes)?)
    }
}
