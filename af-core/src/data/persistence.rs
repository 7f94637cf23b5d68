//! JSON persistence for fan curves
//!
//! One file per `(profile, name)` under `<root>/<profile>/<name>.json`. Writes go to a
//! temporary file in the same directory and are renamed over the target, so a reader
//! sees either the old record or the new one, never a partial write.

use std::collections::HashMap;
use std::ffi::OsString;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::constants::{limits, paths};
use crate::data::types::{Curve, CurvePoint, CurveRecord, Profile};
use crate::data::validation::{validate_curve, validate_curve_name, validate_curve_points, CurveWarning};
use crate::engine::CurvePreset;
use crate::error::{AsusfanError, Result};
use crate::guard::{ActiveCurveGuard, ActiveCurveState};

/// On-disk shape of a curve record
#[derive(Debug, Clone, Serialize, Deserialize)]
struct CurveFile {
    name: String,
    profile: Profile,
    points: Vec<CurvePoint>,
    created_at: u64,
    updated_at: u64,
    #[serde(default)]
    is_preset: bool,
}

impl From<&CurveRecord> for CurveFile {
    fn from(record: &CurveRecord) -> Self {
        Self {
            name: record.curve.name().to_string(),
            profile: record.curve.profile(),
            points: record.curve.points().to_vec(),
            created_at: record.created_at,
            updated_at: record.updated_at,
            is_preset: record.is_preset,
        }
    }
}

/// Whether the caller confirmed deleting a curve that is applied to hardware
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeleteConfirmation {
    Unconfirmed,
    Confirmed,
}

type KeyLock = Arc<Mutex<()>>;

/// Durable store of curve records
pub struct CurveStore {
    root: PathBuf,
    locks: Mutex<HashMap<(Profile, String), KeyLock>>,
}

impl CurveStore {
    /// Open a store rooted at `root` (created lazily on first write)
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            locks: Mutex::new(HashMap::new()),
        }
    }

    /// Open the store at the default location under the user config dir
    pub fn open_default() -> Result<Self> {
        Ok(Self::new(default_curves_dir()?))
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Directory holding one profile's curves
    pub fn profile_dir(&self, profile: Profile) -> PathBuf {
        self.root.join(profile.as_str())
    }

    /// File path of a curve record
    pub fn record_path(&self, profile: Profile, name: &str) -> PathBuf {
        self.profile_dir(profile)
            .join(format!("{}.{}", name, paths::CURVE_EXTENSION))
    }

    fn key_lock(&self, profile: Profile, name: &str) -> KeyLock {
        self.locks
            .lock()
            .entry((profile, name.to_string()))
            .or_default()
            .clone()
    }

    /// Validate and atomically write a record
    ///
    /// The record is written exactly as given; callers that edit an existing record
    /// should build it with [`CurveRecord::revised`]. Returns the curve's warnings.
    pub fn save(&self, record: &CurveRecord) -> Result<Vec<CurveWarning>> {
        let warnings = validate_curve(&record.curve)?;

        let lock = self.key_lock(record.profile(), record.name());
        let _guard = lock.lock();

        let path = self.write_record(record)?;
        info!("Saved curve {}/{} to {:?}", record.profile(), record.name(), path);
        Ok(warnings)
    }

    /// Write a record only if its key is free
    ///
    /// The existence check and the write happen under the key lock, so of two
    /// concurrent creates for one key exactly one succeeds and the other gets
    /// `CurveExists`.
    pub fn create(&self, record: &CurveRecord) -> Result<Vec<CurveWarning>> {
        let warnings = validate_curve(&record.curve)?;

        let profile = record.profile();
        let name = record.name();
        let lock = self.key_lock(profile, name);
        let _guard = lock.lock();

        if self.record_path(profile, name).is_file() {
            return Err(AsusfanError::CurveExists {
                profile: profile.to_string(),
                name: name.to_string(),
            });
        }

        let path = self.write_record(record)?;
        info!("Created curve {}/{} at {:?}", profile, name, path);
        Ok(warnings)
    }

    /// Replace an unreadable record, keeping the old file as `<name>.json.corrupt`
    ///
    /// Returns the new record's warnings and where the old file went (`None` if the
    /// key had no file by the time the lock was taken).
    pub fn replace_corrupt(&self, record: &CurveRecord) -> Result<(Vec<CurveWarning>, Option<PathBuf>)> {
        let warnings = validate_curve(&record.curve)?;

        let profile = record.profile();
        let name = record.name();
        let lock = self.key_lock(profile, name);
        let _guard = lock.lock();

        let path = self.record_path(profile, name);
        let preserved = if path.is_file() {
            let kept = vacant_path(suffixed(&path, paths::CORRUPT_SUFFIX));
            fs::rename(&path, &kept).map_err(|e| AsusfanError::WriteFailure {
                path: path.clone(),
                source: e,
            })?;
            warn!("Moved corrupt curve {}/{} to {:?}", profile, name, kept);
            Some(kept)
        } else {
            None
        };

        self.write_record(record)?;
        info!("Replaced corrupt curve {}/{}", profile, name);
        Ok((warnings, preserved))
    }

    /// Put raw bytes back at a key's path, used to roll back a failed re-apply
    pub(crate) fn restore(&self, profile: Profile, name: &str, bytes: &[u8]) -> Result<()> {
        let lock = self.key_lock(profile, name);
        let _guard = lock.lock();
        write_atomic(&self.record_path(profile, name), bytes)
    }

    /// Caller holds the key lock
    fn write_record(&self, record: &CurveRecord) -> Result<PathBuf> {
        let dir = self.profile_dir(record.profile());
        fs::create_dir_all(&dir).map_err(|e| AsusfanError::WriteFailure {
            path: dir.clone(),
            source: e,
        })?;

        let json = serde_json::to_string_pretty(&CurveFile::from(record))?;
        let path = self.record_path(record.profile(), record.name());
        write_atomic(&path, json.as_bytes())?;
        Ok(path)
    }

    /// Load a record
    ///
    /// Fails with `NotFound` when absent and `CorruptRecord` when the file cannot be
    /// parsed, does not validate, or belongs to a different key. Corrupt files are left
    /// in place for manual recovery.
    pub fn load(&self, profile: Profile, name: &str) -> Result<CurveRecord> {
        validate_curve_name(name)?;
        let path = self.record_path(profile, name);

        if !path.exists() {
            return Err(AsusfanError::NotFound {
                profile: profile.to_string(),
                name: name.to_string(),
            });
        }

        let size = fs::metadata(&path)
            .map_err(|e| AsusfanError::FileRead { path: path.clone(), source: e })?
            .len();
        if size > limits::MAX_RECORD_SIZE {
            return Err(corrupt(
                &path,
                format!("file is {} bytes (max {})", size, limits::MAX_RECORD_SIZE),
            ));
        }

        let contents = fs::read_to_string(&path)
            .map_err(|e| AsusfanError::FileRead { path: path.clone(), source: e })?;

        let file: CurveFile = serde_json::from_str(&contents)
            .map_err(|e| corrupt(&path, format!("invalid JSON: {}", e)))?;

        if file.profile != profile || file.name != name {
            return Err(corrupt(
                &path,
                format!("record is for {}/{}", file.profile, file.name),
            ));
        }

        validate_curve_name(&file.name).map_err(|e| corrupt(&path, e.to_string()))?;
        validate_curve_points(&file.points).map_err(|e| corrupt(&path, e.to_string()))?;
        let curve =
            Curve::new(file.name, file.profile, file.points).map_err(|e| corrupt(&path, e.to_string()))?;

        debug!("Loaded curve {}/{} from {:?}", profile, name, path);
        Ok(CurveRecord {
            curve,
            created_at: file.created_at,
            updated_at: file.updated_at,
            is_preset: file.is_preset,
        })
    }

    /// True when a record file exists for the key
    pub fn exists(&self, profile: Profile, name: &str) -> bool {
        validate_curve_name(name).is_ok() && self.record_path(profile, name).is_file()
    }

    /// Sorted curve names stored for a profile
    pub fn list(&self, profile: Profile) -> Result<Vec<String>> {
        let dir = self.profile_dir(profile);
        if !dir.exists() {
            return Ok(Vec::new());
        }

        let entries = fs::read_dir(&dir)
            .map_err(|e| AsusfanError::FileRead { path: dir.clone(), source: e })?;

        let mut names = Vec::new();
        for entry in entries {
            let path = entry?.path();
            if path.extension().and_then(|e| e.to_str()) != Some(paths::CURVE_EXTENSION) {
                continue;
            }
            if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                if validate_curve_name(stem).is_ok() {
                    names.push(stem.to_string());
                }
            }
        }

        names.sort();
        Ok(names)
    }

    /// Load every readable record of a profile, skipping corrupt ones
    pub fn load_all(&self, profile: Profile) -> Result<Vec<CurveRecord>> {
        let mut records = Vec::new();
        for name in self.list(profile)? {
            match self.load(profile, &name) {
                Ok(record) => records.push(record),
                Err(e @ AsusfanError::CorruptRecord { .. }) => {
                    warn!("Skipping curve {}/{}: {}", profile, name, e);
                }
                Err(e) => return Err(e),
            }
        }
        Ok(records)
    }

    /// Delete a record
    ///
    /// `applied` must be freshly obtained from the device adapter. Deleting the curve
    /// currently applied to hardware is refused unless confirmed. The file is moved to
    /// `<name>.json.deleted` rather than unlinked; if that exists from an earlier
    /// delete, a numbered name (`.deleted.1`, `.deleted.2`, ...) is used instead.
    pub fn delete(
        &self,
        profile: Profile,
        name: &str,
        applied: &ActiveCurveState,
        confirmation: DeleteConfirmation,
    ) -> Result<()> {
        validate_curve_name(name)?;

        if ActiveCurveGuard::is_active(profile, name, applied)
            && confirmation != DeleteConfirmation::Confirmed
        {
            warn!("Refusing to delete active curve {}/{}", profile, name);
            return Err(AsusfanError::ActiveCurveDeleteRefused {
                profile: profile.to_string(),
                name: name.to_string(),
            });
        }

        let lock = self.key_lock(profile, name);
        let _guard = lock.lock();

        let path = self.record_path(profile, name);
        if !path.exists() {
            return Err(AsusfanError::NotFound {
                profile: profile.to_string(),
                name: name.to_string(),
            });
        }

        let trash = vacant_path(suffixed(&path, paths::DELETED_SUFFIX));
        fs::rename(&path, &trash).map_err(|e| AsusfanError::WriteFailure {
            path: path.clone(),
            source: e,
        })?;

        info!("Deleted curve {}/{} (kept as {:?})", profile, name, trash);
        Ok(())
    }

    /// Copy the preset library into a profile on first use
    ///
    /// Runs once per profile; a marker file records that seeding happened so presets
    /// the user deleted are not recreated. Existing curves with a preset's name are
    /// left alone. Returns the names written.
    pub fn seed_presets(&self, profile: Profile) -> Result<Vec<String>> {
        let dir = self.profile_dir(profile);
        let marker = dir.join(paths::SEEDED_MARKER);
        if marker.exists() {
            debug!("Presets already seeded for {}", profile);
            return Ok(Vec::new());
        }

        let mut written = Vec::new();
        for preset in CurvePreset::ALL {
            match self.create(&CurveRecord::new(preset.curve(profile)?, true)) {
                Ok(_) => written.push(preset.name().to_string()),
                Err(AsusfanError::CurveExists { .. }) => continue,
                Err(e) => return Err(e),
            }
        }

        fs::create_dir_all(&dir).map_err(|e| AsusfanError::WriteFailure {
            path: dir.clone(),
            source: e,
        })?;
        write_atomic(&marker, b"")?;

        info!("Seeded {} presets for {}", written.len(), profile);
        Ok(written)
    }
}

/// Default curve directory: `<config_dir>/asusfan/curves`
pub fn default_curves_dir() -> Result<PathBuf> {
    paths::user_config_dir()
        .map(|dir| dir.join(paths::CURVES_DIR))
        .ok_or_else(|| AsusfanError::config("cannot determine user config directory"))
}

/// `path` with `.suffix` appended to the full file name
fn suffixed(path: &Path, suffix: &str) -> PathBuf {
    let mut name = OsString::from(path.as_os_str());
    name.push(".");
    name.push(suffix);
    PathBuf::from(name)
}

/// `base` if nothing is there yet, otherwise the first free `base.N`
fn vacant_path(base: PathBuf) -> PathBuf {
    if !base.exists() {
        return base;
    }
    let mut n = 1u32;
    loop {
        let candidate = suffixed(&base, &n.to_string());
        if !candidate.exists() {
            return candidate;
        }
        n += 1;
    }
}

fn corrupt(path: &Path, reason: String) -> AsusfanError {
    warn!("Corrupt curve record {:?}: {}", path, reason);
    AsusfanError::corrupt(path, reason)
}

/// Write to a temp file beside `path`, sync, then rename over `path`
pub(crate) fn write_atomic(path: &Path, bytes: &[u8]) -> Result<()> {
    let file_name = path
        .file_name()
        .and_then(|n| n.to_str())
        .ok_or_else(|| AsusfanError::config(format!("invalid target path {:?}", path)))?;
    let temp_path = path.with_file_name(format!(".{}.tmp", file_name));

    let write_err = |p: &Path| {
        let p = p.to_path_buf();
        move |e| AsusfanError::WriteFailure { path: p, source: e }
    };

    let mut file = fs::File::create(&temp_path).map_err(write_err(&temp_path))?;
    file.write_all(bytes).map_err(write_err(&temp_path))?;
    file.sync_all().map_err(write_err(&temp_path))?;
    drop(file);

    if let Err(e) = fs::rename(&temp_path, path) {
        let _ = fs::remove_file(&temp_path);
        return Err(AsusfanError::WriteFailure {
            path: path.to_path_buf(),
            source: e,
        });
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, Ordering};
    use tempfile::TempDir;

    fn test_curve(name: &str, profile: Profile) -> Curve {
        Curve::new(
            name,
            profile,
            vec![
                CurvePoint::new(40.0, 20),
                CurvePoint::new(60.0, 50),
                CurvePoint::new(80.0, 100),
            ],
        )
        .unwrap()
    }

    fn test_store() -> (TempDir, CurveStore) {
        let dir = TempDir::new().unwrap();
        let store = CurveStore::new(dir.path().join("curves"));
        (dir, store)
    }

    #[test]
    fn test_save_and_load_round_trip() {
        let (_dir, store) = test_store();
        let record = CurveRecord {
            curve: test_curve("Gaming", Profile::Performance),
            created_at: 1_700_000_000,
            updated_at: 1_700_000_500,
            is_preset: false,
        };

        store.save(&record).unwrap();
        assert_eq!(store.load(Profile::Performance, "Gaming").unwrap(), record);
    }

    #[test]
    fn test_load_missing_is_not_found() {
        let (_dir, store) = test_store();
        assert!(matches!(
            store.load(Profile::Quiet, "Nope"),
            Err(AsusfanError::NotFound { .. })
        ));
    }

    #[test]
    fn test_corrupt_record_is_preserved() {
        let (_dir, store) = test_store();
        let path = store.record_path(Profile::Quiet, "Broken");
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, "{ not json").unwrap();

        match store.load(Profile::Quiet, "Broken") {
            Err(AsusfanError::CorruptRecord { path: reported, .. }) => assert_eq!(reported, path),
            other => panic!("expected CorruptRecord, got {:?}", other),
        }
        assert!(path.exists());
    }

    #[test]
    fn test_invalid_points_on_disk_are_corrupt() {
        let (_dir, store) = test_store();
        let path = store.record_path(Profile::Quiet, "Unsorted");
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(
            &path,
            r#"{"name":"Unsorted","profile":"quiet","points":[{"temperature":70,"speed":50},{"temperature":30,"speed":20}],"created_at":1,"updated_at":1,"is_preset":false}"#,
        )
        .unwrap();

        assert!(matches!(
            store.load(Profile::Quiet, "Unsorted"),
            Err(AsusfanError::CorruptRecord { .. })
        ));
    }

    #[test]
    fn test_mismatched_key_is_corrupt() {
        let (_dir, store) = test_store();
        store.save(&CurveRecord::new(test_curve("Moved", Profile::Quiet), false)).unwrap();
        fs::rename(
            store.record_path(Profile::Quiet, "Moved"),
            store.record_path(Profile::Quiet, "Other"),
        )
        .unwrap();

        assert!(matches!(
            store.load(Profile::Quiet, "Other"),
            Err(AsusfanError::CorruptRecord { .. })
        ));
    }

    #[test]
    fn test_list_is_sorted_and_per_profile() {
        let (_dir, store) = test_store();
        for name in ["Zeta", "Alpha", "Mid"] {
            store.save(&CurveRecord::new(test_curve(name, Profile::Balanced), false)).unwrap();
        }
        store.save(&CurveRecord::new(test_curve("Elsewhere", Profile::Quiet), false)).unwrap();

        assert_eq!(store.list(Profile::Balanced).unwrap(), vec!["Alpha", "Mid", "Zeta"]);
        assert_eq!(store.list(Profile::Quiet).unwrap(), vec!["Elsewhere"]);
        assert!(store.list(Profile::Performance).unwrap().is_empty());
    }

    #[test]
    fn test_no_temp_files_left_behind() {
        let (_dir, store) = test_store();
        store.save(&CurveRecord::new(test_curve("Clean", Profile::Balanced), false)).unwrap();
        store.save(&CurveRecord::new(test_curve("Clean", Profile::Balanced), false)).unwrap();

        let leftovers: Vec<_> = fs::read_dir(store.profile_dir(Profile::Balanced))
            .unwrap()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_name().to_string_lossy().ends_with(".tmp"))
            .collect();
        assert!(leftovers.is_empty());
    }

    #[test]
    fn test_delete_active_requires_confirmation() {
        let (_dir, store) = test_store();
        store.save(&CurveRecord::new(test_curve("Live", Profile::Balanced), false)).unwrap();
        let applied = ActiveCurveState::single(Profile::Balanced, Some("Live".to_string()));

        assert!(matches!(
            store.delete(Profile::Balanced, "Live", &applied, DeleteConfirmation::Unconfirmed),
            Err(AsusfanError::ActiveCurveDeleteRefused { .. })
        ));
        assert!(store.exists(Profile::Balanced, "Live"));

        store
            .delete(Profile::Balanced, "Live", &applied, DeleteConfirmation::Confirmed)
            .unwrap();
        assert!(!store.exists(Profile::Balanced, "Live"));
    }

    #[test]
    fn test_delete_keeps_recoverable_copy() {
        let (_dir, store) = test_store();
        store.save(&CurveRecord::new(test_curve("Old", Profile::Quiet), false)).unwrap();
        store
            .delete(Profile::Quiet, "Old", &ActiveCurveState::default(), DeleteConfirmation::Unconfirmed)
            .unwrap();

        assert!(store.profile_dir(Profile::Quiet).join("Old.json.deleted").exists());
        assert!(store.list(Profile::Quiet).unwrap().is_empty());
        assert!(matches!(
            store.delete(Profile::Quiet, "Old", &ActiveCurveState::default(), DeleteConfirmation::Unconfirmed),
            Err(AsusfanError::NotFound { .. })
        ));
    }

    #[test]
    fn test_repeated_deletes_keep_every_copy() {
        let (_dir, store) = test_store();
        let none = ActiveCurveState::default();
        let first = test_curve("Old", Profile::Quiet);
        let second = first
            .with_points(vec![CurvePoint::new(40.0, 20), CurvePoint::new(80.0, 90)])
            .unwrap();

        store.save(&CurveRecord::new(first, false)).unwrap();
        store.delete(Profile::Quiet, "Old", &none, DeleteConfirmation::Unconfirmed).unwrap();
        store.save(&CurveRecord::new(second, false)).unwrap();
        store.delete(Profile::Quiet, "Old", &none, DeleteConfirmation::Unconfirmed).unwrap();

        let dir = store.profile_dir(Profile::Quiet);
        let top_speed = |file: &str| {
            let json: serde_json::Value =
                serde_json::from_str(&fs::read_to_string(dir.join(file)).unwrap()).unwrap();
            let points = json["points"].as_array().unwrap().clone();
            points.last().unwrap()["speed"].as_u64().unwrap()
        };
        assert_eq!(top_speed("Old.json.deleted"), 100);
        assert_eq!(top_speed("Old.json.deleted.1"), 90);
        assert!(store.list(Profile::Quiet).unwrap().is_empty());
    }

    #[test]
    fn test_create_refuses_existing_key() {
        let (_dir, store) = test_store();
        let record = CurveRecord::new(test_curve("Once", Profile::Balanced), false);
        store.create(&record).unwrap();

        assert!(matches!(store.create(&record), Err(AsusfanError::CurveExists { .. })));
        assert_eq!(store.list(Profile::Balanced).unwrap(), vec!["Once"]);
    }

    #[test]
    fn test_replace_corrupt_moves_old_file_aside() {
        let (_dir, store) = test_store();
        let path = store.record_path(Profile::Quiet, "Hand");
        fs::create_dir_all(path.parent().unwrap()).unwrap();

        for garbage in ["{ first", "{ second"] {
            fs::write(&path, garbage).unwrap();
            let (_, preserved) = store
                .replace_corrupt(&CurveRecord::new(test_curve("Hand", Profile::Quiet), false))
                .unwrap();
            assert_eq!(fs::read_to_string(preserved.unwrap()).unwrap(), garbage);
        }

        let dir = store.profile_dir(Profile::Quiet);
        assert_eq!(fs::read_to_string(dir.join("Hand.json.corrupt")).unwrap(), "{ first");
        assert_eq!(fs::read_to_string(dir.join("Hand.json.corrupt.1")).unwrap(), "{ second");
        assert!(store.load(Profile::Quiet, "Hand").is_ok());
        assert_eq!(store.list(Profile::Quiet).unwrap(), vec!["Hand"]);
    }

    #[test]
    fn test_concurrent_saves_and_loads_on_one_key() {
        let (_dir, store) = test_store();
        let shared = |top: u8| {
            let points = vec![
                CurvePoint::new(40.0, 20),
                CurvePoint::new(60.0, 50),
                CurvePoint::new(80.0, top),
            ];
            CurveRecord::new(Curve::new("Shared", Profile::Balanced, points).unwrap(), false)
        };
        let written: [u8; 5] = [100, 60, 70, 80, 90];
        store.save(&shared(written[0])).unwrap();
        let done = AtomicBool::new(false);

        std::thread::scope(|s| {
            let writers: Vec<_> = written[1..]
                .iter()
                .map(|&top| {
                    let (store, shared) = (&store, &shared);
                    s.spawn(move || {
                        for _ in 0..50 {
                            store.save(&shared(top)).unwrap();
                        }
                    })
                })
                .collect();

            let readers: Vec<_> = (0..2)
                .map(|_| {
                    let (store, done, written) = (&store, &done, &written);
                    s.spawn(move || {
                        let mut loads = 0;
                        loop {
                            let record = store.load(Profile::Balanced, "Shared").unwrap();
                            let top = record.curve.points()[2].speed;
                            assert!(written.contains(&top), "unexpected top speed {}", top);
                            loads += 1;
                            if done.load(Ordering::Acquire) {
                                return loads;
                            }
                        }
                    })
                })
                .collect();

            for writer in writers {
                writer.join().unwrap();
            }
            done.store(true, Ordering::Release);
            for reader in readers {
                assert!(reader.join().unwrap() > 0);
            }
        });

        let last = store.load(Profile::Balanced, "Shared").unwrap();
        assert!(written[1..].contains(&last.curve.points()[2].speed));
    }

    #[test]
    fn test_seed_presets_runs_once() {
        let (_dir, store) = test_store();
        let written = store.seed_presets(Profile::Quiet).unwrap();
        assert_eq!(written.len(), CurvePreset::ALL.len());

        let record = store.load(Profile::Quiet, CurvePreset::Balanced.name()).unwrap();
        assert!(record.is_preset);

        store
            .delete(
                Profile::Quiet,
                CurvePreset::Balanced.name(),
                &ActiveCurveState::default(),
                DeleteConfirmation::Unconfirmed,
            )
            .unwrap();
        assert!(store.seed_presets(Profile::Quiet).unwrap().is_empty());
        assert!(!store.exists(Profile::Quiet, CurvePreset::Balanced.name()));
    }

    #[test]
    fn test_load_all_skips_corrupt() {
        let (_dir, store) = test_store();
        store.save(&CurveRecord::new(test_curve("Good", Profile::Balanced), false)).unwrap();
        fs::write(store.record_path(Profile::Balanced, "Bad"), "[]").unwrap();

        let records = store.load_all(Profile::Balanced).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].name(), "Good");
    }
}
