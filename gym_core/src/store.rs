//! Stats and saved-workout persistence with file locking.
//!
//! Both stores live in one data directory as JSON documents. Reads take a
//! shared lock; writes go to a locked temp file that is synced and renamed
//! over the original. Read-modify-write updates additionally hold an
//! exclusive lock on a `<file>.lock` sidecar for their whole duration.
//! Missing or corrupted documents load as empty.

use crate::{Error, Result, SavedWorkout, UserStats};
use fs2::FileExt;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fs::{File, OpenOptions};
use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use uuid::Uuid;

/// Lifetime stats storage
pub trait StatsStore {
    fn load_stats(&self) -> Result<UserStats>;
    fn save_stats(&self, stats: &UserStats) -> Result<()>;

    /// Load, modify and save the stats as one step; returns the saved value
    fn update_stats<F>(&self, f: F) -> Result<UserStats>
    where
        F: FnOnce(&mut UserStats),
        Self: Sized;
}

/// Named saved-workout storage
pub trait WorkoutStore {
    /// A user's saved workouts, newest first
    fn list_saved_workouts(&self, user_id: &str) -> Result<Vec<SavedWorkout>>;
    fn get_saved_workout(&self, id: Uuid) -> Result<Option<SavedWorkout>>;
    fn save_workout(&self, record: &SavedWorkout) -> Result<()>;
    /// Returns whether a record was removed
    fn delete_workout(&self, id: Uuid) -> Result<bool>;
    /// Returns the new completion count
    fn increment_times_completed(&self, id: Uuid) -> Result<u32>;
}

const STATS_FILE: &str = "stats.json";
const SAVED_WORKOUTS_FILE: &str = "saved_workouts.json";

/// JSON documents under a single data directory
#[derive(Clone, Debug)]
pub struct JsonFileStore {
    dir: PathBuf,
}

impl JsonFileStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn stats_path(&self) -> PathBuf {
        self.dir.join(STATS_FILE)
    }

    pub fn saved_workouts_path(&self) -> PathBuf {
        self.dir.join(SAVED_WORKOUTS_FILE)
    }

    fn load_saved(&self) -> Result<Vec<SavedWorkout>> {
        load_json(&self.saved_workouts_path())
    }

    /// Load the saved-workout list, modify it, and write it back
    fn update_saved<T, F>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&mut Vec<SavedWorkout>) -> Result<T>,
    {
        let path = self.saved_workouts_path();
        with_update_lock(&path, || {
            let mut records = load_json::<Vec<SavedWorkout>>(&path)?;
            let result = f(&mut records)?;
            save_json(&path, &records)?;
            Ok(result)
        })
    }
}

impl StatsStore for JsonFileStore {
    fn load_stats(&self) -> Result<UserStats> {
        load_json(&self.stats_path())
    }

    fn save_stats(&self, stats: &UserStats) -> Result<()> {
        save_json(&self.stats_path(), stats)
    }

    fn update_stats<F>(&self, f: F) -> Result<UserStats>
    where
        F: FnOnce(&mut UserStats),
    {
        let path = self.stats_path();
        with_update_lock(&path, || {
            let mut stats = load_json::<UserStats>(&path)?;
            f(&mut stats);
            save_json(&path, &stats)?;
            Ok(stats)
        })
    }
}

impl WorkoutStore for JsonFileStore {
    fn list_saved_workouts(&self, user_id: &str) -> Result<Vec<SavedWorkout>> {
        let mut records: Vec<_> = self
            .load_saved()?
            .into_iter()
            .filter(|r| r.user_id == user_id)
            .collect();
        records.sort_by(|a, b| b.saved_at.cmp(&a.saved_at));
        Ok(records)
    }

    fn get_saved_workout(&self, id: Uuid) -> Result<Option<SavedWorkout>> {
        Ok(self.load_saved()?.into_iter().find(|r| r.id == id))
    }

    fn save_workout(&self, record: &SavedWorkout) -> Result<()> {
        self.update_saved(|records| {
            match records.iter_mut().find(|r| r.id == record.id) {
                Some(existing) => *existing = record.clone(),
                None => records.push(record.clone()),
            }
            Ok(())
        })?;
        tracing::info!("Saved workout '{}' ({})", record.name, record.id);
        Ok(())
    }

    fn delete_workout(&self, id: Uuid) -> Result<bool> {
        self.update_saved(|records| {
            let before = records.len();
            records.retain(|r| r.id != id);
            Ok(records.len() != before)
        })
    }

    fn increment_times_completed(&self, id: Uuid) -> Result<u32> {
        self.update_saved(|records| {
            let record = records
                .iter_mut()
                .find(|r| r.id == id)
                .ok_or_else(|| Error::Persistence(format!("no saved workout with id {}", id)))?;
            record.times_completed += 1;
            Ok(record.times_completed)
        })
    }
}

/// Run `f` while holding an exclusive lock on the sidecar `<path>.lock`
///
/// The document itself is replaced by rename on every save, so the lock has
/// to live on a file that stays put.
fn with_update_lock<T, F>(path: &Path, f: F) -> Result<T>
where
    F: FnOnce() -> Result<T>,
{
    let parent = path
        .parent()
        .ok_or_else(|| Error::Persistence(format!("{:?} has no parent directory", path)))?;
    std::fs::create_dir_all(parent)?;

    let mut lock_name = path.as_os_str().to_owned();
    lock_name.push(".lock");
    let lock = OpenOptions::new()
        .create(true)
        .truncate(false)
        .write(true)
        .open(PathBuf::from(lock_name))?;
    lock.lock_exclusive()?;

    let result = f();
    if let Err(e) = lock.unlock() {
        tracing::warn!("Unable to unlock {:?}.lock: {}", path, e);
    }
    result
}

/// Load a JSON document with shared locking
///
/// Returns the default value if the file doesn't exist, can't be read, or
/// doesn't parse.
pub fn load_json<T>(path: &Path) -> Result<T>
where
    T: DeserializeOwned + Default,
{
    if !path.exists() {
        tracing::debug!("No file at {:?}, using defaults", path);
        return Ok(T::default());
    }

    let file = match File::open(path) {
        Ok(f) => f,
        Err(e) => {
            tracing::warn!("Unable to open {:?}: {}. Using defaults.", path, e);
            return Ok(T::default());
        }
    };

    if let Err(e) = file.lock_shared() {
        tracing::warn!("Unable to lock {:?}: {}. Using defaults.", path, e);
        return Ok(T::default());
    }

    let mut contents = String::new();
    let mut reader = std::io::BufReader::new(&file);
    if let Err(e) = reader.read_to_string(&mut contents) {
        let _ = file.unlock();
        tracing::warn!("Failed to read {:?}: {}. Using defaults.", path, e);
        return Ok(T::default());
    }

    file.unlock()?;

    match serde_json::from_str::<T>(&contents) {
        Ok(value) => {
            tracing::debug!("Loaded {:?}", path);
            Ok(value)
        }
        Err(e) => {
            tracing::warn!("Failed to parse {:?}: {}. Using defaults.", path, e);
            Ok(T::default())
        }
    }
}

/// Atomically write a JSON document under an exclusive lock
pub fn save_json<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    let parent = path
        .parent()
        .ok_or_else(|| Error::Persistence(format!("{:?} has no parent directory", path)))?;
    std::fs::create_dir_all(parent)?;

    // Same directory so the rename stays on one filesystem
    let temp = NamedTempFile::new_in(parent)?;
    temp.as_file().lock_exclusive()?;

    {
        let mut writer = std::io::BufWriter::new(temp.as_file());
        let contents = serde_json::to_string(value)?;
        writer.write_all(contents.as_bytes())?;
        writer.flush()?;
    }

    temp.as_file().sync_all()?;
    temp.as_file().unlock()?;

    temp.persist(path).map_err(|e| Error::Io(e.error))?;

    tracing::debug!("Saved {:?}", path);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generator::generate_workout_default;
    use crate::{EnergyLevel, Equipment, SpaceType, WorkoutPreferences};
    use chrono::{Duration, NaiveDate, Utc};

    fn record(user: &str, name: &str) -> SavedWorkout {
        let prefs = WorkoutPreferences {
            time_minutes: 3,
            space_type: SpaceType::Normal,
            energy_level: EnergyLevel::Medium,
            equipment: Equipment::None,
        };
        SavedWorkout::new(user, name, generate_workout_default(&prefs))
    }

    #[test]
    fn test_stats_roundtrip() {
        let temp_dir = tempfile::tempdir().unwrap();
        let store = JsonFileStore::new(temp_dir.path());

        let stats = UserStats {
            streak: 3,
            total_workouts: 10,
            total_minutes: 31,
            last_workout_date: NaiveDate::from_ymd_opt(2024, 5, 6),
        };
        store.save_stats(&stats).unwrap();

        assert_eq!(store.load_stats().unwrap(), stats);
    }

    #[test]
    fn test_missing_and_corrupted_stats_load_default() {
        let temp_dir = tempfile::tempdir().unwrap();
        let store = JsonFileStore::new(temp_dir.path().join("never-created"));
        assert_eq!(store.load_stats().unwrap(), UserStats::default());

        let store = JsonFileStore::new(temp_dir.path());
        std::fs::write(store.stats_path(), "{ invalid json }").unwrap();
        assert_eq!(store.load_stats().unwrap(), UserStats::default());
    }

    #[test]
    fn test_saved_workouts_listed_per_user_newest_first() {
        let temp_dir = tempfile::tempdir().unwrap();
        let store = JsonFileStore::new(temp_dir.path());

        let mut older = record("alice", "Morning");
        older.saved_at = Utc::now() - Duration::days(2);
        let newer = record("alice", "Evening");
        let other = record("bob", "Bob's");

        store.save_workout(&older).unwrap();
        store.save_workout(&newer).unwrap();
        store.save_workout(&other).unwrap();

        let listed = store.list_saved_workouts("alice").unwrap();
        let names: Vec<_> = listed.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["Evening", "Morning"]);
        assert_eq!(listed[1], older);
    }

    #[test]
    fn test_save_same_id_replaces() {
        let temp_dir = tempfile::tempdir().unwrap();
        let store = JsonFileStore::new(temp_dir.path());

        let mut saved = record("alice", "Quick");
        store.save_workout(&saved).unwrap();
        saved.name = "Quicker".into();
        store.save_workout(&saved).unwrap();

        let listed = store.list_saved_workouts("alice").unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].name, "Quicker");
    }

    #[test]
    fn test_delete_and_increment() {
        let temp_dir = tempfile::tempdir().unwrap();
        let store = JsonFileStore::new(temp_dir.path());

        let saved = record("alice", "Desk break");
        store.save_workout(&saved).unwrap();

        assert_eq!(store.increment_times_completed(saved.id).unwrap(), 1);
        assert_eq!(store.increment_times_completed(saved.id).unwrap(), 2);
        assert_eq!(
            store.get_saved_workout(saved.id).unwrap().unwrap().times_completed,
            2
        );

        assert!(store.delete_workout(saved.id).unwrap());
        assert!(!store.delete_workout(saved.id).unwrap());
        assert!(store.get_saved_workout(saved.id).unwrap().is_none());
        assert!(matches!(
            store.increment_times_completed(saved.id),
            Err(Error::Persistence(_))
        ));
    }

    #[test]
    fn test_atomic_save_leaves_no_temp_files() {
        let temp_dir = tempfile::tempdir().unwrap();
        let store = JsonFileStore::new(temp_dir.path());

        store.save_stats(&UserStats::default()).unwrap();

        let extras: Vec<_> = std::fs::read_dir(temp_dir.path())
            .unwrap()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_name() != STATS_FILE)
            .collect();
        assert!(
            extras.is_empty(),
            "Expected only {}, found extras: {:?}",
            STATS_FILE,
            extras
        );
    }

    #[test]
    fn test_concurrent_updates_keep_every_record() {
        let temp_dir = tempfile::tempdir().unwrap();
        let store = JsonFileStore::new(temp_dir.path().join("data"));

        let records: Vec<_> = (0..16)
            .map(|i| record("alice", &format!("Workout {}", i)))
            .collect();

        std::thread::scope(|s| {
            for r in &records {
                let store = store.clone();
                s.spawn(move || store.save_workout(r).unwrap());
            }
        });
        assert_eq!(store.list_saved_workouts("alice").unwrap().len(), 16);

        let target = records[0].id;
        std::thread::scope(|s| {
            for _ in 0..8 {
                let store = store.clone();
                s.spawn(move || store.increment_times_completed(target).unwrap());
            }
        });
        assert_eq!(
            store.get_saved_workout(target).unwrap().unwrap().times_completed,
            8
        );
    }

    #[test]
    fn test_concurrent_stats_updates_are_all_counted() {
        let temp_dir = tempfile::tempdir().unwrap();
        let store = JsonFileStore::new(temp_dir.path());
        let today = NaiveDate::from_ymd_opt(2024, 5, 6).unwrap();

        std::thread::scope(|s| {
            for _ in 0..8 {
                let store = store.clone();
                s.spawn(move || {
                    store
                        .update_stats(|stats| stats.record_completion(today, 120))
                        .unwrap()
                });
            }
        });

        let stats = store.load_stats().unwrap();
        assert_eq!(stats.total_workouts, 8);
        assert_eq!(stats.total_minutes, 16);
        assert_eq!(stats.streak, 1);
    }

    #[test]
    fn test_saved_workout_json_uses_interchange_names() {
        let temp_dir = tempfile::tempdir().unwrap();
        let store = JsonFileStore::new(temp_dir.path());
        store.save_workout(&record("alice", "Shape")).unwrap();

        let raw = std::fs::read_to_string(store.saved_workouts_path()).unwrap();
        let value: serde_json::Value = serde_json::from_str(&raw).unwrap();
        let first = &value[0];
        assert!(first["savedAt"].is_string());
        assert_eq!(first["timesCompleted"], 0);
        assert!(first["workout"]["totalDurationSeconds"].is_u64());
        assert!(first["workout"]["exercises"][0]["durationSeconds"].is_u64());
    }
}
