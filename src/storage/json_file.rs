//! JSON file backed ladder storage
//!
//! The whole ladder lives in one JSON document. Every mutation takes a
//! sidecar lock file, re-reads the document so changes made by other
//! handles or processes are seen, applies the change to that fresh copy,
//! writes it to a temporary file and renames it over the original. Version
//! checks therefore run against what is on disk, and a stale handle gets a
//! `ConcurrencyConflict` instead of overwriting someone else's match.

use super::{
    CommittedMatch, HistoryLimit, HistoryStore, LadderStore, LadderTables, MatchCommit,
    MatchStore, PlayerStore,
};
use crate::error::{LadderError, Result};
use crate::types::{Match, MatchId, Player, PlayerId, RatingChangeRecord};
use anyhow::Context;
use std::fs::{self, OpenOptions};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::RwLock;
use std::thread;
use std::time::Duration;
use tracing::{debug, info, warn};

/// How many times to try for the lock before giving up
const LOCK_ATTEMPTS: u32 = 200;

/// Pause between lock attempts
const LOCK_RETRY_DELAY: Duration = Duration::from_millis(10);

/// Exclusive writer lock, held while the lock file exists
struct FileLock {
    path: PathBuf,
}

impl FileLock {
    fn acquire(path: PathBuf) -> Result<Self> {
        for _ in 0..LOCK_ATTEMPTS {
            match OpenOptions::new().write(true).create_new(true).open(&path) {
                Ok(_) => return Ok(Self { path }),
                Err(e) if e.kind() == ErrorKind::AlreadyExists => thread::sleep(LOCK_RETRY_DELAY),
                Err(e) => {
                    return Err(LadderError::Storage {
                        message: format!("Failed to create lock {}: {}", path.display(), e),
                    }
                    .into())
                }
            }
        }

        warn!("Gave up waiting for {}", path.display());
        Err(LadderError::Storage {
            message: format!(
                "Ladder file is locked by another writer (remove {} if no writer is running)",
                path.display()
            ),
        }
        .into())
    }
}

impl Drop for FileLock {
    fn drop(&mut self) {
        if let Err(e) = fs::remove_file(&self.path) {
            warn!("Failed to remove lock {}: {}", self.path.display(), e);
        }
    }
}

fn load_tables(path: &Path) -> Result<LadderTables> {
    if !path.exists() {
        return Ok(LadderTables::default());
    }

    let raw = fs::read_to_string(path)
        .with_context(|| format!("Failed to read ladder file {}", path.display()))?;
    let tables = serde_json::from_str(&raw)
        .with_context(|| format!("Invalid ladder file {}", path.display()))?;
    Ok(tables)
}

/// Ladder storage persisted to a JSON file
#[derive(Debug)]
pub struct JsonFileLadderStore {
    path: PathBuf,
    tables: RwLock<LadderTables>,
}

impl JsonFileLadderStore {
    /// Open the store at `path`, starting empty if the file does not exist
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();

        let tables = load_tables(&path)?;
        if path.exists() {
            info!(
                "Loaded ladder from {} ({} players, {} matches)",
                path.display(),
                tables.players.len(),
                tables.matches.len()
            );
        } else {
            info!("Starting new ladder at {}", path.display());
        }

        Ok(Self {
            path,
            tables: RwLock::new(tables),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Sidecar file marking an in-progress write
    pub fn lock_path(&self) -> PathBuf {
        let mut name = self.path.as_os_str().to_owned();
        name.push(".lock");
        PathBuf::from(name)
    }

    fn save(&self, tables: &LadderTables) -> Result<()> {
        let encoded = serde_json::to_string_pretty(tables)?;
        let tmp = self.path.with_extension("json.tmp");

        fs::write(&tmp, encoded).map_err(|e| LadderError::Storage {
            message: format!("Failed to write {}: {}", tmp.display(), e),
        })?;
        fs::rename(&tmp, &self.path).map_err(|e| LadderError::Storage {
            message: format!("Failed to replace {}: {}", self.path.display(), e),
        })?;

        debug!("Saved ladder to {}", self.path.display());
        Ok(())
    }

    fn read<T>(&self, f: impl FnOnce(&LadderTables) -> Result<T>) -> Result<T> {
        let tables = self
            .tables
            .read()
            .map_err(|_| LadderError::lock_poisoned("ladder file read"))?;
        f(&tables)
    }

    fn mutate<T>(&self, f: impl FnOnce(&mut LadderTables) -> Result<T>) -> Result<T> {
        let mut tables = self
            .tables
            .write()
            .map_err(|_| LadderError::lock_poisoned("ladder file write"))?;
        let _lock = FileLock::acquire(self.lock_path())?;

        // Start from the document on disk, not from what this handle loaded
        let current = load_tables(&self.path)?;
        let mut next = current.clone();

        let out = match f(&mut next).and_then(|out| self.save(&next).map(|()| out)) {
            Ok(out) => out,
            Err(e) => {
                *tables = current;
                return Err(e);
            }
        };
        *tables = next;

        Ok(out)
    }
}

impl PlayerStore for JsonFileLadderStore {
    fn create_player(&self, player: Player) -> Result<Player> {
        self.mutate(|tables| tables.insert_player(player))
    }

    fn get_player_by_name(&self, name: &str) -> Result<Option<Player>> {
        self.read(|tables| Ok(tables.player_by_name(name).cloned()))
    }

    fn get_player(&self, player_id: &PlayerId) -> Result<Option<Player>> {
        self.read(|tables| Ok(tables.player(player_id).cloned()))
    }

    fn get_all_players(&self) -> Result<Vec<Player>> {
        self.read(|tables| Ok(tables.players.clone()))
    }

    fn update_player(&self, player: Player) -> Result<Player> {
        self.mutate(|tables| tables.update_player(player))
    }

    fn delete_player(&self, player_id: &PlayerId) -> Result<bool> {
        self.mutate(|tables| tables.delete_player(player_id))
    }
}

impl MatchStore for JsonFileLadderStore {
    fn create_match(&self, record: Match) -> Result<Match> {
        self.mutate(|tables| Ok(tables.insert_match(record)))
    }

    fn get_match(&self, match_id: &MatchId) -> Result<Option<Match>> {
        self.read(|tables| Ok(tables.matches.iter().find(|m| &m.id == match_id).cloned()))
    }

    fn get_all_matches(&self) -> Result<Vec<Match>> {
        self.read(|tables| Ok(tables.matches_latest_first(|_| true)))
    }

    fn get_matches_by_player(&self, player_id: &PlayerId) -> Result<Vec<Match>> {
        self.read(|tables| Ok(tables.matches_latest_first(|m| m.involves(*player_id))))
    }
}

impl HistoryStore for JsonFileLadderStore {
    fn append_history(&self, record: RatingChangeRecord) -> Result<RatingChangeRecord> {
        self.mutate(|tables| tables.append_history(record))
    }

    fn get_history_by_player(
        &self,
        player_id: &PlayerId,
        limit: HistoryLimit,
    ) -> Result<Vec<RatingChangeRecord>> {
        self.read(|tables| Ok(tables.history_for(player_id, limit)))
    }
}

impl LadderStore for JsonFileLadderStore {
    fn commit_match(&self, commit: MatchCommit) -> Result<CommittedMatch> {
        self.mutate(|tables| tables.commit_match(commit))
    }
}
