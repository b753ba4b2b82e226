//! Persistence boundary: the injectable session store, JSON save files,
//! and the import/export envelope shared with the companion app.
//!
//! The engine itself never debounces or schedules writes; callers decide
//! when to flush. Everything here is best-effort and outside the engine's
//! consistency guarantees.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use std::sync::Mutex;
use thiserror::Error;
use tokio::fs;
use tracing::debug;
use uuid::Uuid;

use crate::character::{now_timestamp, CharacterDefinition, CharacterSession};

/// Errors from an injected session store.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("storage backend failure: {0}")]
    Backend(String),
}

/// Key-value session storage, keyed by the owning definition's id.
///
/// Implementations are external collaborators (browser storage, disk,
/// memory); the engine only calls `get` once at load and `put` after
/// settled changes.
pub trait CharacterStore {
    fn get(&self, definition_id: Uuid) -> Result<Option<CharacterSession>, StoreError>;
    fn put(&self, session: &CharacterSession) -> Result<(), StoreError>;
}

/// In-memory store used by tests and as a default backend.
#[derive(Debug, Default)]
pub struct MemoryStore {
    sessions: Mutex<HashMap<Uuid, CharacterSession>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl CharacterStore for MemoryStore {
    fn get(&self, definition_id: Uuid) -> Result<Option<CharacterSession>, StoreError> {
        let sessions = self
            .sessions
            .lock()
            .map_err(|_| StoreError::Backend("memory store lock poisoned".to_string()))?;
        Ok(sessions.get(&definition_id).cloned())
    }

    fn put(&self, session: &CharacterSession) -> Result<(), StoreError> {
        let mut sessions = self
            .sessions
            .lock()
            .map_err(|_| StoreError::Backend("memory store lock poisoned".to_string()))?;
        sessions.insert(session.definition_id, session.clone());
        Ok(())
    }
}

/// Errors from save-file operations.
#[derive(Debug, Error)]
pub enum PersistError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Version mismatch: expected {expected}, found {found}")]
    VersionMismatch { expected: u32, found: u32 },
}

/// Current save file version.
const CHARACTER_SAVE_VERSION: u32 = 1;

/// The `{definition, session}` pair the external import/export
/// collaborator exchanges. Purely structural, with no versioning and no
/// metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExportedCharacter {
    pub definition: CharacterDefinition,
    pub session: CharacterSession,
}

/// Summary fields for listing save files without loading them fully.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CharacterMetadata {
    pub name: String,
    pub race: String,
    /// Class display, e.g. "Fighter 5" or "Fighter 5 / Rogue 1".
    pub class: String,
    pub level: u32,
    #[serde(default)]
    pub saved_at: String,
}

/// A complete on-disk character save.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SavedCharacter {
    /// Save format version for compatibility checking.
    pub version: u32,
    pub saved_at: String,
    pub metadata: CharacterMetadata,
    pub definition: CharacterDefinition,
    pub session: CharacterSession,
}

impl SavedCharacter {
    pub fn new(definition: CharacterDefinition, session: CharacterSession) -> Self {
        let saved_at = now_timestamp();
        let class = definition
            .classes
            .iter()
            .map(|c| format!("{} {}", c.name, c.level))
            .collect::<Vec<_>>()
            .join(" / ");
        let metadata = CharacterMetadata {
            name: definition.name.clone(),
            race: definition.race.clone(),
            class,
            level: definition.total_level(),
            saved_at: saved_at.clone(),
        };

        Self {
            version: CHARACTER_SAVE_VERSION,
            saved_at,
            metadata,
            definition,
            session,
        }
    }

    /// Save to a JSON file.
    pub async fn save_json(&self, path: impl AsRef<Path>) -> Result<(), PersistError> {
        debug!(path = %path.as_ref().display(), "saving character");
        let content = serde_json::to_string_pretty(self)?;
        fs::write(path, content).await?;
        Ok(())
    }

    /// Load from a JSON file, rejecting unknown save versions.
    pub async fn load_json(path: impl AsRef<Path>) -> Result<Self, PersistError> {
        let content = fs::read_to_string(path).await?;
        let saved: Self = serde_json::from_str(&content)?;

        if saved.version != CHARACTER_SAVE_VERSION {
            return Err(PersistError::VersionMismatch {
                expected: CHARACTER_SAVE_VERSION,
                found: saved.version,
            });
        }

        Ok(saved)
    }

    /// Read only the metadata of a save file.
    pub async fn peek_metadata(path: impl AsRef<Path>) -> Result<CharacterMetadata, PersistError> {
        let content = fs::read_to_string(path).await?;

        #[derive(Deserialize)]
        struct Partial {
            version: u32,
            metadata: CharacterMetadata,
        }

        let partial: Partial = serde_json::from_str(&content)?;

        if partial.version != CHARACTER_SAVE_VERSION {
            return Err(PersistError::VersionMismatch {
                expected: CHARACTER_SAVE_VERSION,
                found: partial.version,
            });
        }

        Ok(partial.metadata)
    }

    /// The export pair for this save.
    pub fn export(&self) -> ExportedCharacter {
        ExportedCharacter {
            definition: self.definition.clone(),
            session: self.session.clone(),
        }
    }
}

/// A save file found on disk.
#[derive(Debug, Clone)]
pub struct CharacterSaveInfo {
    pub path: String,
    pub metadata: CharacterMetadata,
}

/// List all character save files in a directory, sorted by name. A
/// missing directory is created and treated as empty.
pub async fn list_character_saves(
    dir: impl AsRef<Path>,
) -> Result<Vec<CharacterSaveInfo>, PersistError> {
    let mut saves = Vec::new();

    let dir_path = dir.as_ref();
    if !dir_path.exists() {
        fs::create_dir_all(dir_path).await?;
        return Ok(saves);
    }

    let mut entries = fs::read_dir(dir_path).await?;
    while let Some(entry) = entries.next_entry().await? {
        let path = entry.path();
        if path.extension().map(|e| e == "json").unwrap_or(false) {
            if let Ok(metadata) = SavedCharacter::peek_metadata(&path).await {
                saves.push(CharacterSaveInfo {
                    path: path.to_string_lossy().to_string(),
                    metadata,
                });
            }
        }
    }

    saves.sort_by(|a, b| a.metadata.name.cmp(&b.metadata.name));
    Ok(saves)
}

/// Generate a save path for a character name, replacing anything
/// non-alphanumeric with underscores.
pub fn character_save_path(dir: impl AsRef<Path>, name: &str) -> std::path::PathBuf {
    let sanitized = name
        .chars()
        .map(|c| if c.is_alphanumeric() { c } else { '_' })
        .collect::<String>();
    dir.as_ref().join(format!("{sanitized}.json"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::character::sample_character;

    fn saved_fixture() -> SavedCharacter {
        let definition = sample_character();
        let session = CharacterSession::new_for(&definition);
        SavedCharacter::new(definition, session)
    }

    #[test]
    fn test_memory_store_round_trip() {
        let definition = sample_character();
        let session = CharacterSession::new_for(&definition);
        let store = MemoryStore::new();

        assert!(store.get(definition.id).unwrap().is_none());
        store.put(&session).unwrap();
        assert_eq!(store.get(definition.id).unwrap().unwrap(), session);
    }

    #[test]
    fn test_saved_character_metadata() {
        let saved = saved_fixture();
        assert_eq!(saved.version, CHARACTER_SAVE_VERSION);
        assert_eq!(saved.metadata.name, "Branwen Oakmantle");
        assert_eq!(saved.metadata.class, "Fighter 5");
        assert_eq!(saved.metadata.level, 5);
    }

    #[test]
    fn test_export_pair_round_trips_as_json() {
        let saved = saved_fixture();
        let export = saved.export();

        let json = serde_json::to_string(&export).unwrap();
        let back: ExportedCharacter = serde_json::from_str(&json).unwrap();
        assert_eq!(back, export);
        // The envelope is exactly {definition, session}.
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert!(value.get("definition").is_some());
        assert!(value.get("session").is_some());
    }

    #[test]
    fn test_character_save_path_sanitizes() {
        let path = character_save_path("saves", "Bob's Character!");
        let text = path.to_string_lossy();
        assert!(text.contains("Bob_s_Character_"));
        assert!(text.ends_with(".json"));
        assert!(!text.contains('!'));
    }

    #[tokio::test]
    async fn test_save_and_load_json() {
        let temp_dir = tempfile::TempDir::new().expect("temp dir");
        let path = temp_dir.path().join("branwen.json");

        let saved = saved_fixture();
        saved.save_json(&path).await.expect("save should succeed");
        assert!(path.exists());

        let loaded = SavedCharacter::load_json(&path).await.expect("load");
        assert_eq!(loaded.definition, saved.definition);
        assert_eq!(loaded.session, saved.session);
    }

    #[tokio::test]
    async fn test_version_mismatch_is_surfaced() {
        let temp_dir = tempfile::TempDir::new().expect("temp dir");
        let path = temp_dir.path().join("old.json");

        let mut saved = saved_fixture();
        saved.version = 99;
        let content = serde_json::to_string(&saved).unwrap();
        tokio::fs::write(&path, content).await.unwrap();

        let result = SavedCharacter::load_json(&path).await;
        assert!(matches!(
            result,
            Err(PersistError::VersionMismatch {
                expected: 1,
                found: 99
            })
        ));
    }

    #[tokio::test]
    async fn test_peek_metadata_without_full_load() {
        let temp_dir = tempfile::TempDir::new().expect("temp dir");
        let path = temp_dir.path().join("peek.json");

        saved_fixture().save_json(&path).await.unwrap();
        let metadata = SavedCharacter::peek_metadata(&path).await.unwrap();
        assert_eq!(metadata.name, "Branwen Oakmantle");
    }

    #[tokio::test]
    async fn test_list_saves_sorted_by_name() {
        let temp_dir = tempfile::TempDir::new().expect("temp dir");
        let dir = temp_dir.path().join("characters");
        std::fs::create_dir_all(&dir).unwrap();

        for name in ["Charlie", "Alpha", "Beta"] {
            let mut definition = sample_character();
            definition.name = name.to_string();
            let session = CharacterSession::new_for(&definition);
            let saved = SavedCharacter::new(definition, session);
            saved
                .save_json(character_save_path(&dir, name))
                .await
                .unwrap();
        }

        let saves = list_character_saves(&dir).await.unwrap();
        let names: Vec<_> = saves.iter().map(|s| s.metadata.name.as_str()).collect();
        assert_eq!(names, vec!["Alpha", "Beta", "Charlie"]);
    }

    #[tokio::test]
    async fn test_list_saves_creates_missing_dir() {
        let temp_dir = tempfile::TempDir::new().expect("temp dir");
        let dir = temp_dir.path().join("nonexistent");

        let saves = list_character_saves(&dir).await.unwrap();
        assert!(saves.is_empty());
        assert!(dir.exists());
    }
}
