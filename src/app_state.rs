// =============================================================================
// Shared server state
// =============================================================================
//
// Held behind `Arc<AppState>` by every handler. The engine config is the only
// mutable piece: analysis requests snapshot it under a read lock and never
// hold the lock across an await point.
//
//   - AtomicU64 config version, bumped on every accepted update.
//   - parking_lot::RwLock around the active EngineConfig.
//   - parking_lot::Mutex held across swap + save, so the file on disk is
//     always the most recently installed config.
// =============================================================================

use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::{Mutex, RwLock};
use tracing::{info, warn};

use crate::config::EngineConfig;
use crate::error::ValidationError;
use crate::market_data::BybitClient;

pub struct AppState {
    /// Incremented whenever the active config is replaced.
    pub config_version: AtomicU64,

    pub config: RwLock<EngineConfig>,

    /// Where accepted config updates are persisted. `None` keeps them in
    /// memory only.
    pub config_path: Option<PathBuf>,

    /// Serialises config replacement and persistence.
    persist_lock: Mutex<()>,

    pub bybit: BybitClient,
}

impl AppState {
    pub fn new(config: EngineConfig, config_path: Option<PathBuf>, bybit: BybitClient) -> Self {
        Self {
            config_version: AtomicU64::new(1),
            config: RwLock::new(config),
            config_path,
            persist_lock: Mutex::new(()),
            bybit,
        }
    }

    /// Clone of the active config.
    pub fn config_snapshot(&self) -> EngineConfig {
        self.config.read().clone()
    }

    pub fn current_config_version(&self) -> u64 {
        self.config_version.load(Ordering::SeqCst)
    }

    /// Validate and install `next`. Persistence is best-effort.
    pub fn replace_config(&self, next: EngineConfig) -> Result<u64, ValidationError> {
        next.validate()?;
        let _persist = self.persist_lock.lock();

        {
            let mut active = self.config.write();
            *active = next.clone();
        }
        let version = self.config_version.fetch_add(1, Ordering::SeqCst) + 1;
        info!(version, length = next.length, vwap_window = next.vwap_window, "engine config replaced");

        if let Some(path) = &self.config_path {
            if let Err(e) = next.save(path) {
                warn!(error = %e, "failed to persist engine config");
            }
        }
        Ok(version)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn state() -> AppState {
        AppState::new(EngineConfig::default(), None, BybitClient::new().unwrap())
    }

    #[test]
    fn replace_bumps_version() {
        let st = state();
        assert_eq!(st.current_config_version(), 1);

        let v = st
            .replace_config(EngineConfig {
                length: 40,
                ..EngineConfig::default()
            })
            .unwrap();
        assert_eq!(v, 2);
        assert_eq!(st.config_snapshot().length, 40);
    }

    #[test]
    fn concurrent_updates_persist_the_last_installed_config() {
        let dir = std::env::temp_dir().join(format!("lrc-engine-state-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("engine_config.json");

        let st = AppState::new(
            EngineConfig::default(),
            Some(path.clone()),
            BybitClient::new().unwrap(),
        );
        std::thread::scope(|scope| {
            for length in 10..26 {
                let st = &st;
                scope.spawn(move || {
                    st.replace_config(EngineConfig {
                        length,
                        ..EngineConfig::default()
                    })
                    .unwrap();
                });
            }
        });

        assert_eq!(st.current_config_version(), 17);
        assert_eq!(EngineConfig::load(&path).unwrap(), st.config_snapshot());

        std::fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn invalid_update_leaves_config_untouched() {
        let st = state();
        let err = st
            .replace_config(EngineConfig {
                length: 0,
                ..EngineConfig::default()
            })
            .unwrap_err();
        assert_eq!(err, ValidationError::InvalidLength { length: 0 });
        assert_eq!(st.config_snapshot(), EngineConfig::default());
        assert_eq!(st.current_config_version(), 1);
    }
}
