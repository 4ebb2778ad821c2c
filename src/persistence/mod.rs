//! Progression persistence
//!
//! Features:
//! - Versioned JSON envelope
//! - Write to tmp, then rotate (old save → backup, tmp → save)
//! - Corrupt save falls back to the backup
//! - Non-blocking load handle for the host loop
//!
//! Read at tier start: current tier and character base stats.
//! Written at tier completion: next tier and accumulated progression.

use std::path::{Path, PathBuf};
use std::sync::mpsc::{self, Receiver, TryRecvError};

use serde::{Deserialize, Serialize};

use crate::error::SimError;
use crate::sim::controller::PlayerStats;
use crate::sim::weapons::WeaponSlot;

/// Envelope format version
pub const SAVE_VERSION: u32 = 1;

/// Progression carried between runs and tiers
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Progress {
    /// Tier the next run starts on
    pub tier: u32,
    pub character: String,
    /// Base stat overrides for the character, if any were earned
    pub stats: Option<PlayerStats>,
    pub max_health: Option<f32>,
    /// Empty keeps the character's starting loadout
    pub weapons: Vec<WeaponSlot>,
    pub level: u32,
    pub currency: u32,
    pub best_tier: u32,
}

impl Default for Progress {
    fn default() -> Self {
        Self {
            tier: 1,
            character: "ranger".into(),
            stats: None,
            max_health: None,
            weapons: Vec::new(),
            level: 1,
            currency: 0,
            best_tier: 1,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct Envelope {
    version: u32,
    progress: Progress,
}

/// Storage for progression
pub trait ProgressStore {
    /// `Ok(None)` when nothing has been saved yet
    fn load(&self) -> Result<Option<Progress>, SimError>;
    fn save(&mut self, progress: &Progress) -> Result<(), SimError>;
}

/// JSON file with a rotating backup
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn sibling(&self, ext: &str) -> PathBuf {
        self.path.with_extension(ext)
    }

    fn read(path: &Path) -> Result<Option<Progress>, SimError> {
        let json = match std::fs::read_to_string(path) {
            Ok(json) => json,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        let envelope: Envelope = serde_json::from_str(&json)?;
        if envelope.version > SAVE_VERSION {
            return Err(SimError::Persistence(format!(
                "save version {} is newer than supported {SAVE_VERSION}",
                envelope.version
            )));
        }
        Ok(Some(envelope.progress))
    }
}

impl ProgressStore for JsonFileStore {
    fn load(&self) -> Result<Option<Progress>, SimError> {
        match Self::read(&self.path) {
            Ok(progress) => Ok(progress),
            Err(err) => {
                log::warn!("save {} unreadable ({err}), trying backup", self.path.display());
                Self::read(&self.sibling("bak"))
            }
        }
    }

    fn save(&mut self, progress: &Progress) -> Result<(), SimError> {
        let envelope = Envelope {
            version: SAVE_VERSION,
            progress: progress.clone(),
        };
        let json = serde_json::to_string_pretty(&envelope)?;
        if let Some(dir) = self.path.parent().filter(|d| !d.as_os_str().is_empty()) {
            std::fs::create_dir_all(dir)?;
        }

        let tmp = self.sibling("tmp");
        std::fs::write(&tmp, json)?;
        if self.path.exists() {
            std::fs::rename(&self.path, self.sibling("bak"))?;
        }
        std::fs::rename(&tmp, &self.path)?;
        log::info!("progress saved: tier {}", progress.tier);
        Ok(())
    }
}

/// In-memory store for tests and headless runs
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    saved: Option<Progress>,
    pub save_count: u32,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(progress: Progress) -> Self {
        Self {
            saved: Some(progress),
            save_count: 0,
        }
    }

    pub fn saved(&self) -> Option<&Progress> {
        self.saved.as_ref()
    }
}

impl ProgressStore for MemoryStore {
    fn load(&self) -> Result<Option<Progress>, SimError> {
        Ok(self.saved.clone())
    }

    fn save(&mut self, progress: &Progress) -> Result<(), SimError> {
        self.saved = Some(progress.clone());
        self.save_count += 1;
        Ok(())
    }
}

/// Result of polling a [`PendingLoad`]
#[derive(Debug, Clone, PartialEq)]
pub enum LoadPoll {
    Pending,
    /// Finished; `None` means start fresh
    Ready(Option<Progress>),
}

/// Load running off the host loop; poll it each frame, never wait on it
#[derive(Debug)]
pub struct PendingLoad {
    rx: Option<Receiver<Result<Option<Progress>, SimError>>>,
}

impl PendingLoad {
    /// Load from `store` on a background thread
    pub fn spawn<S>(store: S) -> Self
    where
        S: ProgressStore + Send + 'static,
    {
        let (tx, rx) = mpsc::channel();
        std::thread::spawn(move || {
            // Receiver may be gone if the host shut down first
            let _ = tx.send(store.load());
        });
        Self { rx: Some(rx) }
    }

    /// Already resolved
    pub fn ready(result: Result<Option<Progress>, SimError>) -> Self {
        let (tx, rx) = mpsc::channel();
        let _ = tx.send(result);
        Self { rx: Some(rx) }
    }

    /// Returns `Ready` exactly once; `Pending` before and after
    pub fn poll(&mut self) -> LoadPoll {
        let Some(rx) = &self.rx else {
            return LoadPoll::Pending;
        };
        let outcome = match rx.try_recv() {
            Ok(Ok(progress)) => progress,
            Ok(Err(err)) => {
                log::warn!("progress load failed ({err}), starting fresh");
                None
            }
            Err(TryRecvError::Empty) => return LoadPoll::Pending,
            Err(TryRecvError::Disconnected) => {
                log::warn!("progress loader exited without a result");
                None
            }
        };
        self.rx = None;
        LoadPoll::Ready(outcome)
    }

    pub fn is_finished(&self) -> bool {
        self.rx.is_none()
    }
}
