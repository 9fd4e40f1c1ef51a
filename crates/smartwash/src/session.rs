//! One setup/unload cycle of a config entry, with write-back of whatever
//! the integration changed (subscription id, refreshed token, migration).

use std::path::PathBuf;
use std::sync::Arc;

use tracing::{debug, warn};

use smartwash_core::{DeviceRegistry, Integration};

use crate::cli::GlobalOpts;
use crate::config;
use crate::error::CliError;

pub struct Session {
    integration: Integration,
    entry_name: String,
    config_file: PathBuf,
    /// The token came from `--token` and must not be written back.
    token_override: bool,
}

impl Session {
    /// Resolve the active entry and run setup.
    pub async fn connect(global: &GlobalOpts) -> Result<Self, CliError> {
        let cfg = config::load(global)?;
        let entry_name = config::active_entry_name(global, &cfg);
        let entry = config::resolve_entry(&cfg, &entry_name, global)?;
        debug!(entry = %entry_name, location = %entry.location_id, "setting up entry");

        let session = Self {
            integration: Integration::new(entry, Arc::new(DeviceRegistry::new())),
            entry_name,
            config_file: config::config_file(global),
            token_override: global.token.is_some(),
        };

        if let Err(e) = session.integration.setup().await {
            session.persist().await;
            return Err(e.into());
        }
        Ok(session)
    }

    pub fn integration(&self) -> &Integration {
        &self.integration
    }

    /// Unload the entry and persist its final state.
    pub async fn close(self) -> Result<(), CliError> {
        let result = self.integration.unload().await;
        self.persist().await;
        result.map_err(CliError::from)
    }

    /// Write the entry back to the config file. Entries that only exist
    /// as CLI flags are skipped; failures are logged, never fatal.
    async fn persist(&self) {
        let mut cfg = match smartwash_config::load_config_from(&self.config_file) {
            Ok(cfg) => cfg,
            Err(e) => {
                warn!(error = %e, "could not reload config for write-back");
                return;
            }
        };
        if !cfg.entries.contains_key(&self.entry_name) {
            return;
        }

        let mut entry = self.integration.entry();
        if self.token_override {
            entry.token = None;
        } else if let Some(token) = self.integration.current_token().await {
            entry.token = Some(token);
        }

        match config::record_entry(&mut cfg, &self.entry_name, &entry) {
            Ok(true) => {
                if let Err(e) = config::save_config_to(&cfg, &self.config_file) {
                    warn!(error = %e, "could not save config");
                } else {
                    debug!(entry = %self.entry_name, "config entry updated");
                }
            }
            Ok(false) => {}
            Err(e) => warn!(error = %e, "could not record config entry"),
        }
    }
}
