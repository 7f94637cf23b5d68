//! Active curve protection
//!
//! The curve currently applied to hardware may not be overwritten or deleted without an
//! explicit decision from the caller. "Currently applied" is always asked of the device
//! at the time of the operation; nothing here caches it.

use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;

use tracing::{debug, info, warn};

use crate::data::{
    validate_curve, Curve, CurveRecord, CurveStore, CurveWarning, DeleteConfirmation, Profile,
};
use crate::device::DeviceClient;
use crate::error::{AsusfanError, Result};

/// Applied curve per profile, as reported by the device
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ActiveCurveState {
    applied: HashMap<Profile, String>,
}

impl ActiveCurveState {
    pub fn single(profile: Profile, name: Option<String>) -> Self {
        let mut state = Self::default();
        state.set(profile, name);
        state
    }

    pub fn set(&mut self, profile: Profile, name: Option<String>) {
        match name {
            Some(name) => {
                self.applied.insert(profile, name);
            }
            None => {
                self.applied.remove(&profile);
            }
        }
    }

    pub fn get(&self, profile: Profile) -> Option<&str> {
        self.applied.get(&profile).map(String::as_str)
    }
}

pub struct ActiveCurveGuard;

impl ActiveCurveGuard {
    pub fn is_active(profile: Profile, name: &str, applied: &ActiveCurveState) -> bool {
        applied.get(profile) == Some(name)
    }
}

/// Caller's decision when a save would replace an existing curve
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OverwriteChoice {
    /// Store under a new name instead; the existing curve is untouched
    SaveAs(String),
    /// Drop the edit
    Discard,
    /// Overwrite, then re-apply if the curve is active
    Force,
}

/// What a save actually did
///
/// `preserved` is set when the record being replaced could not be read; it names the
/// file the old bytes were moved to.
#[derive(Debug, Clone, PartialEq)]
pub enum SaveOutcome {
    Created {
        warnings: Vec<CurveWarning>,
    },
    Updated {
        warnings: Vec<CurveWarning>,
        preserved: Option<PathBuf>,
    },
    SavedAs {
        name: String,
        warnings: Vec<CurveWarning>,
    },
    Discarded,
    /// Overwrote the active curve and pushed it to the device
    Reapplied {
        warnings: Vec<CurveWarning>,
        preserved: Option<PathBuf>,
    },
}

/// Curve save/apply/delete workflow with active-curve protection
pub struct CurveService {
    store: CurveStore,
    device: DeviceClient,
}

impl CurveService {
    pub fn new(store: CurveStore, device: DeviceClient) -> Self {
        Self { store, device }
    }

    pub fn store(&self) -> &CurveStore {
        &self.store
    }

    pub fn device(&self) -> &DeviceClient {
        &self.device
    }

    /// Save `curve`, consulting `choice` if a curve with the same key exists
    ///
    /// New keys are written without asking the device. Replacing the applied curve
    /// with no choice fails with `ActiveCurveOverwriteRefused` and leaves the store as
    /// it was.
    pub fn save_curve(&self, curve: Curve, choice: Option<OverwriteChoice>) -> Result<SaveOutcome> {
        validate_curve(&curve)?;
        let profile = curve.profile();

        match self.store.create(&CurveRecord::new(curve.clone(), false)) {
            Ok(warnings) => return Ok(SaveOutcome::Created { warnings }),
            Err(AsusfanError::CurveExists { .. }) => {}
            Err(e) => return Err(e),
        }

        match choice {
            Some(OverwriteChoice::Discard) => {
                debug!("Discarded edit of {}/{}", profile, curve.name());
                Ok(SaveOutcome::Discarded)
            }
            Some(OverwriteChoice::SaveAs(new_name)) => {
                let renamed = curve.renamed(new_name)?;
                let name = renamed.name().to_string();
                let warnings = self.store.create(&CurveRecord::new(renamed, false))?;
                Ok(SaveOutcome::SavedAs { name, warnings })
            }
            Some(OverwriteChoice::Force) => self.force_overwrite(curve),
            None => {
                let applied = self.device.active_state(profile)?;
                if ActiveCurveGuard::is_active(profile, curve.name(), &applied) {
                    warn!("Refusing to overwrite active curve {}/{}", profile, curve.name());
                    return Err(AsusfanError::ActiveCurveOverwriteRefused {
                        profile: profile.to_string(),
                        name: curve.name().to_string(),
                    });
                }
                let (warnings, preserved) = self.overwrite(curve)?;
                Ok(SaveOutcome::Updated { warnings, preserved })
            }
        }
    }

    fn force_overwrite(&self, curve: Curve) -> Result<SaveOutcome> {
        let profile = curve.profile();
        let applied = self.device.active_state(profile)?;
        if !ActiveCurveGuard::is_active(profile, curve.name(), &applied) {
            let (warnings, preserved) = self.overwrite(curve)?;
            return Ok(SaveOutcome::Updated { warnings, preserved });
        }

        let path = self.store.record_path(profile, curve.name());
        let previous = fs::read(&path).map_err(|e| AsusfanError::FileRead {
            path: path.clone(),
            source: e,
        })?;

        let (warnings, preserved) = self.overwrite(curve.clone())?;
        match self.device.apply(&curve) {
            Ok(()) => Ok(SaveOutcome::Reapplied { warnings, preserved }),
            // A timed-out apply can still land on the device, so the new record stays
            Err(AsusfanError::DeviceQueryTimeout { timeout_ms, .. }) => {
                warn!(
                    "Re-applying {}/{} timed out after {} ms, keeping the new record",
                    profile,
                    curve.name(),
                    timeout_ms
                );
                Err(AsusfanError::ApplyOutcomeUnknown {
                    profile: profile.to_string(),
                    name: curve.name().to_string(),
                    timeout_ms,
                })
            }
            Err(e) => {
                warn!(
                    "Re-applying {}/{} failed, restoring previous record: {}",
                    profile,
                    curve.name(),
                    e
                );
                self.store.restore(profile, curve.name(), &previous)?;
                Err(e)
            }
        }
    }

    fn overwrite(&self, curve: Curve) -> Result<(Vec<CurveWarning>, Option<PathBuf>)> {
        match self.store.load(curve.profile(), curve.name()) {
            Ok(existing) => Ok((self.store.save(&existing.revised(curve))?, None)),
            Err(AsusfanError::CorruptRecord { .. }) => {
                self.store.replace_corrupt(&CurveRecord::new(curve, false))
            }
            Err(e) => Err(e),
        }
    }

    /// Load a stored curve and push it to the device
    pub fn apply_curve(&self, profile: Profile, name: &str) -> Result<Curve> {
        let record = self.store.load(profile, name)?;
        self.device.apply(&record.curve)?;
        Ok(record.curve)
    }

    /// Delete a stored curve, refusing the applied one unless confirmed
    pub fn delete_curve(
        &self,
        profile: Profile,
        name: &str,
        confirmation: DeleteConfirmation,
    ) -> Result<()> {
        let applied = self.device.active_state(profile)?;
        self.store.delete(profile, name, &applied, confirmation)
    }

    /// Copy presets into `profile` on first use
    pub fn seed(&self, profile: Profile) -> Result<Vec<String>> {
        let written = self.store.seed_presets(profile)?;
        if !written.is_empty() {
            info!("Seeded presets for {}: {}", profile, written.join(", "));
        }
        Ok(written)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::CurvePoint;
    use crate::device::{DeviceTimeouts, MockDeviceAdapter};
    use std::sync::{Arc, Barrier, Mutex};
    use std::time::Duration;
    use tempfile::TempDir;

    fn curve(name: &str, top: u8) -> Curve {
        Curve::new(
            name,
            Profile::Balanced,
            vec![CurvePoint::new(40.0, 20), CurvePoint::new(80.0, top)],
        )
        .unwrap()
    }

    fn service(mock: MockDeviceAdapter) -> (TempDir, CurveService) {
        let dir = TempDir::new().unwrap();
        let store = CurveStore::new(dir.path());
        let device = DeviceClient::new(Arc::new(mock), DeviceTimeouts::default());
        (dir, CurveService::new(store, device))
    }

    fn active(name: &'static str) -> MockDeviceAdapter {
        let mut mock = MockDeviceAdapter::new();
        mock.expect_get_active_curve()
            .returning(move |_| Ok(Some(name.to_string())));
        mock
    }

    #[test]
    fn test_is_active() {
        let state = ActiveCurveState::single(Profile::Quiet, Some("Night".to_string()));
        assert!(ActiveCurveGuard::is_active(Profile::Quiet, "Night", &state));
        assert!(!ActiveCurveGuard::is_active(Profile::Balanced, "Night", &state));
        assert!(!ActiveCurveGuard::is_active(Profile::Quiet, "Day", &state));
    }

    #[test]
    fn test_new_curve_skips_device_query() {
        let mut mock = MockDeviceAdapter::new();
        mock.expect_get_active_curve().never();
        let (_dir, svc) = service(mock);

        let outcome = svc.save_curve(curve("Fresh", 90), None).unwrap();
        assert!(matches!(outcome, SaveOutcome::Created { .. }));
        assert!(svc.store().exists(Profile::Balanced, "Fresh"));
    }

    #[test]
    fn test_overwrite_active_without_choice_is_refused() {
        let (_dir, svc) = service(active("Live"));
        svc.save_curve(curve("Live", 90), None).unwrap();
        let path = svc.store().record_path(Profile::Balanced, "Live");
        let before = fs::read(&path).unwrap();

        let err = svc.save_curve(curve("Live", 100), None).unwrap_err();
        assert!(matches!(err, AsusfanError::ActiveCurveOverwriteRefused { .. }));
        assert_eq!(fs::read(&path).unwrap(), before);
    }

    #[test]
    fn test_overwrite_inactive_is_allowed() {
        let (_dir, svc) = service(active("SomethingElse"));
        svc.save_curve(curve("Spare", 90), None).unwrap();

        let outcome = svc.save_curve(curve("Spare", 100), None).unwrap();
        assert!(matches!(outcome, SaveOutcome::Updated { .. }));
        let stored = svc.store().load(Profile::Balanced, "Spare").unwrap();
        assert_eq!(stored.curve.points()[1].speed, 100);
    }

    #[test]
    fn test_save_as_and_discard() {
        let (_dir, svc) = service(active("Live"));
        svc.save_curve(curve("Live", 90), None).unwrap();
        svc.save_curve(curve("Other", 90), None).unwrap();

        let outcome = svc
            .save_curve(curve("Live", 100), Some(OverwriteChoice::SaveAs("Live v2".to_string())))
            .unwrap();
        assert!(matches!(outcome, SaveOutcome::SavedAs { ref name, .. } if name == "Live v2"));
        assert_eq!(svc.store().load(Profile::Balanced, "Live").unwrap().curve.points()[1].speed, 90);

        let err = svc
            .save_curve(curve("Live", 100), Some(OverwriteChoice::SaveAs("Other".to_string())))
            .unwrap_err();
        assert!(matches!(err, AsusfanError::CurveExists { .. }));

        let outcome = svc.save_curve(curve("Live", 100), Some(OverwriteChoice::Discard)).unwrap();
        assert_eq!(outcome, SaveOutcome::Discarded);
        assert_eq!(svc.store().load(Profile::Balanced, "Live").unwrap().curve.points()[1].speed, 90);
    }

    #[test]
    fn test_force_overwrites_and_reapplies() {
        let mut mock = active("Live");
        mock.expect_apply_curve()
            .withf(|p, c| *p == Profile::Balanced && c.points()[1].speed == 100)
            .times(1)
            .returning(|_, _| Ok(()));
        let (_dir, svc) = service(mock);
        svc.save_curve(curve("Live", 90), None).unwrap();

        let outcome = svc.save_curve(curve("Live", 100), Some(OverwriteChoice::Force)).unwrap();
        assert!(matches!(outcome, SaveOutcome::Reapplied { .. }));
        assert_eq!(svc.store().load(Profile::Balanced, "Live").unwrap().curve.points()[1].speed, 100);
    }

    #[test]
    fn test_force_restores_record_when_apply_fails() {
        let mut mock = active("Live");
        mock.expect_apply_curve()
            .returning(|_, _| Err(AsusfanError::device("fan controller busy")));
        let (_dir, svc) = service(mock);
        svc.save_curve(curve("Live", 90), None).unwrap();
        let path = svc.store().record_path(Profile::Balanced, "Live");
        let before = fs::read(&path).unwrap();

        let err = svc.save_curve(curve("Live", 100), Some(OverwriteChoice::Force)).unwrap_err();
        assert!(matches!(err, AsusfanError::Device(_)));
        assert_eq!(fs::read(&path).unwrap(), before);
    }

    #[test]
    fn test_force_apply_timeout_keeps_new_record() {
        let hardware = Arc::new(Mutex::new(Vec::new()));
        let seen = hardware.clone();
        let mut mock = active("Live");
        mock.expect_apply_curve().returning(move |_, c| {
            std::thread::sleep(Duration::from_millis(150));
            seen.lock().unwrap().push(c.points()[1].speed);
            Ok(())
        });
        let dir = TempDir::new().unwrap();
        let device = DeviceClient::new(
            Arc::new(mock),
            DeviceTimeouts {
                query: Duration::from_secs(2),
                apply: Duration::from_millis(20),
            },
        );
        let svc = CurveService::new(CurveStore::new(dir.path()), device);
        svc.save_curve(curve("Live", 90), None).unwrap();

        let err = svc.save_curve(curve("Live", 100), Some(OverwriteChoice::Force)).unwrap_err();
        assert!(matches!(err, AsusfanError::ApplyOutcomeUnknown { timeout_ms: 20, .. }));
        assert!(err.is_recoverable());

        // Let the abandoned apply finish, then storage and hardware must agree
        std::thread::sleep(Duration::from_millis(400));
        assert_eq!(*hardware.lock().unwrap(), vec![100]);
        assert_eq!(svc.store().load(Profile::Balanced, "Live").unwrap().curve.points()[1].speed, 100);
    }

    #[test]
    fn test_overwriting_corrupt_record_preserves_it() {
        let (_dir, svc) = service(active("SomethingElse"));
        let path = svc.store().record_path(Profile::Balanced, "Hand");
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, "{ hand-edited but broken").unwrap();

        let kept = match svc.save_curve(curve("Hand", 80), None).unwrap() {
            SaveOutcome::Updated { preserved: Some(kept), .. } => kept,
            other => panic!("expected the old file to be preserved, got {:?}", other),
        };
        assert_eq!(kept, path.with_file_name("Hand.json.corrupt"));
        assert_eq!(fs::read_to_string(&kept).unwrap(), "{ hand-edited but broken");
        assert_eq!(svc.store().load(Profile::Balanced, "Hand").unwrap().curve.points()[1].speed, 80);
        assert_eq!(svc.store().list(Profile::Balanced).unwrap(), vec!["Hand"]);
    }

    #[test]
    fn test_concurrent_saves_of_new_name_create_once() {
        let mut mock = MockDeviceAdapter::new();
        mock.expect_get_active_curve().returning(|_| Ok(None));
        let (_dir, svc) = service(mock);

        for round in 0..20 {
            let name = format!("Race {}", round);
            let barrier = Barrier::new(2);
            let outcomes: Vec<SaveOutcome> = std::thread::scope(|s| {
                let handles: Vec<_> = [70u8, 90]
                    .into_iter()
                    .map(|top| {
                        let (svc, barrier, name) = (&svc, &barrier, &name);
                        s.spawn(move || {
                            barrier.wait();
                            svc.save_curve(curve(name, top), None).unwrap()
                        })
                    })
                    .collect();
                handles.into_iter().map(|h| h.join().unwrap()).collect()
            });

            let created = outcomes
                .iter()
                .filter(|o| matches!(o, SaveOutcome::Created { .. }))
                .count();
            assert_eq!(created, 1, "round {}: {:?}", round, outcomes);
            assert!(outcomes.iter().any(|o| matches!(o, SaveOutcome::Updated { .. })));
        }
    }

    #[test]
    fn test_device_timeout_blocks_overwrite() {
        let mut mock = MockDeviceAdapter::new();
        mock.expect_get_active_curve().returning(|_| {
            std::thread::sleep(Duration::from_millis(500));
            Ok(None)
        });
        let dir = TempDir::new().unwrap();
        let device = DeviceClient::new(
            Arc::new(mock),
            DeviceTimeouts {
                query: Duration::from_millis(20),
                apply: Duration::from_millis(20),
            },
        );
        let svc = CurveService::new(CurveStore::new(dir.path()), device);
        svc.store().save(&CurveRecord::new(curve("Slow", 90), false)).unwrap();

        let err = svc.save_curve(curve("Slow", 100), None).unwrap_err();
        assert!(matches!(err, AsusfanError::DeviceQueryTimeout { .. }));
        assert_eq!(svc.store().load(Profile::Balanced, "Slow").unwrap().curve.points()[1].speed, 90);
    }

    #[test]
    fn test_delete_active_through_service() {
        let (_dir, svc) = service(active("Live"));
        svc.save_curve(curve("Live", 90), None).unwrap();

        assert!(matches!(
            svc.delete_curve(Profile::Balanced, "Live", DeleteConfirmation::Unconfirmed),
            Err(AsusfanError::ActiveCurveDeleteRefused { .. })
        ));
        svc.delete_curve(Profile::Balanced, "Live", DeleteConfirmation::Confirmed)
            .unwrap();
        assert!(!svc.store().exists(Profile::Balanced, "Live"));
    }

    #[test]
    fn test_apply_loads_from_store() {
        let mut mock = MockDeviceAdapter::new();
        mock.expect_apply_curve()
            .withf(|p, c| *p == Profile::Balanced && c.name() == "Stored")
            .times(1)
            .returning(|_, _| Ok(()));
        let (_dir, svc) = service(mock);
        svc.save_curve(curve("Stored", 80), None).unwrap();

        let applied = svc.apply_curve(Profile::Balanced, "Stored").unwrap();
        assert_eq!(applied.name(), "Stored");
        assert!(matches!(
            svc.apply_curve(Profile::Balanced, "Missing"),
            Err(AsusfanError::NotFound { .. })
        ));
    }
}
