//! Device Adapter
//!
//! Seam between curve management and whatever actually programs the fans. Adapter
//! calls may block for a long time, so [`DeviceClient`] runs each one on a helper
//! thread and waits at most a configured timeout for the result.

use std::sync::mpsc;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use tracing::{debug, info, warn};

use crate::constants::device as device_const;
use crate::data::{Curve, Profile};
use crate::error::{AsusfanError, Result};
use crate::guard::ActiveCurveState;
use crate::settings::Preferences;

/// Hardware-facing operations
#[cfg_attr(test, mockall::automock)]
pub trait DeviceAdapter: Send + Sync {
    /// Name of the curve currently applied for `profile`, if any
    fn get_active_curve(&self, profile: Profile) -> Result<Option<String>>;

    /// Program `curve` into the hardware for `profile`
    fn apply_curve(&self, profile: Profile, curve: &Curve) -> Result<()>;

    /// Profiles the hardware supports
    fn get_profiles(&self) -> Result<Vec<Profile>>;
}

/// Upper bounds on adapter calls
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeviceTimeouts {
    pub query: Duration,
    pub apply: Duration,
}

impl Default for DeviceTimeouts {
    fn default() -> Self {
        Self {
            query: Duration::from_millis(device_const::DEFAULT_QUERY_TIMEOUT_MS),
            apply: Duration::from_millis(device_const::DEFAULT_APPLY_TIMEOUT_MS),
        }
    }
}

impl DeviceTimeouts {
    pub fn from_preferences(prefs: &Preferences) -> Self {
        Self {
            query: Duration::from_millis(prefs.device_query_timeout_ms),
            apply: Duration::from_millis(prefs.device_apply_timeout_ms),
        }
    }
}

/// Timeout-bounded access to a [`DeviceAdapter`]
///
/// A call that overruns its timeout fails with `DeviceQueryTimeout`; the helper thread
/// is left to finish on its own and its result is dropped.
#[derive(Clone)]
pub struct DeviceClient {
    adapter: Arc<dyn DeviceAdapter>,
    timeouts: DeviceTimeouts,
}

impl DeviceClient {
    pub fn new(adapter: Arc<dyn DeviceAdapter>, timeouts: DeviceTimeouts) -> Self {
        Self { adapter, timeouts }
    }

    pub fn timeouts(&self) -> DeviceTimeouts {
        self.timeouts
    }

    /// Applied curve name for `profile`
    pub fn active_curve(&self, profile: Profile) -> Result<Option<String>> {
        let adapter = Arc::clone(&self.adapter);
        run_bounded("get_active_curve", self.timeouts.query, move || {
            adapter.get_active_curve(profile)
        })
    }

    /// Fresh snapshot of the applied curve for one profile
    pub fn active_state(&self, profile: Profile) -> Result<ActiveCurveState> {
        Ok(ActiveCurveState::single(profile, self.active_curve(profile)?))
    }

    /// Fresh snapshot of the applied curve for every supported profile
    pub fn active_state_all(&self) -> Result<ActiveCurveState> {
        let mut state = ActiveCurveState::default();
        for profile in self.profiles()? {
            state.set(profile, self.active_curve(profile)?);
        }
        Ok(state)
    }

    pub fn profiles(&self) -> Result<Vec<Profile>> {
        let adapter = Arc::clone(&self.adapter);
        run_bounded("get_profiles", self.timeouts.query, move || adapter.get_profiles())
    }

    /// Apply `curve` to its own profile
    pub fn apply(&self, curve: &Curve) -> Result<()> {
        let adapter = Arc::clone(&self.adapter);
        let curve = curve.clone();
        let profile = curve.profile();
        let name = curve.name().to_string();

        run_bounded("apply_curve", self.timeouts.apply, move || {
            adapter.apply_curve(profile, &curve)
        })?;

        info!("Applied curve {}/{}", profile, name);
        Ok(())
    }
}

fn run_bounded<T, F>(operation: &str, timeout: Duration, call: F) -> Result<T>
where
    T: Send + 'static,
    F: FnOnce() -> Result<T> + Send + 'static,
{
    let (tx, rx) = mpsc::channel();

    thread::Builder::new()
        .name(format!("asusfan-{}", operation))
        .spawn(move || {
            // Receiver is gone after a timeout
            let _ = tx.send(call());
        })?;

    debug!("Waiting up to {:?} for {}", timeout, operation);
    match rx.recv_timeout(timeout) {
        Ok(result) => result,
        Err(mpsc::RecvTimeoutError::Timeout) => {
            warn!("{} timed out after {:?}", operation, timeout);
            Err(AsusfanError::DeviceQueryTimeout {
                operation: operation.to_string(),
                timeout_ms: timeout.as_millis() as u64,
            })
        }
        Err(mpsc::RecvTimeoutError::Disconnected) => Err(AsusfanError::device(format!(
            "{} ended without a result",
            operation
        ))),
    }
}
