//! Shared helper functions for CLI commands

use std::io::{self, IsTerminal};

use dialoguer::{theme::ColorfulTheme, Confirm};
use miette::{bail, miette, IntoDiagnostic, Result};

use crate::cli::{GlobalOpts, OutputFormat};
use crate::core::actor::EffectiveActor;
use crate::core::config::Config;
use crate::services::Services;
use crate::store::Store;

/// Configuration with command-line overrides applied
pub fn load_config(global: &GlobalOpts) -> Result<Config> {
    let mut config = Config::load()?;
    if let Some(db) = &global.db {
        config.database = Some(db.clone());
    }
    Ok(config)
}

/// Everything a command needs to call the services
pub struct Session {
    pub services: Services,
    pub format: OutputFormat,
    actor_id: Option<i64>,
}

impl Session {
    pub fn open(global: &GlobalOpts) -> Result<Self> {
        let config = load_config(global)?;
        let path = config.database_path();
        tracing::debug!(path = %path.display(), "opening database");
        let store = Store::open(&path).into_diagnostic()?;
        let services = Services::new(store, config)?;
        Ok(Self {
            services,
            format: global.format,
            actor_id: global.actor,
        })
    }

    /// The caller, resolved from `--as`
    pub fn actor(&self) -> Result<EffectiveActor> {
        let id = self
            .actor_id
            .ok_or_else(|| miette!("No caller given; pass --as <ACCOUNT_ID> or set AGRILINK_ACTOR"))?;
        Ok(EffectiveActor::resolve(self.services.store(), id)?)
    }

    /// The caller if one was given
    pub fn optional_actor(&self) -> Result<Option<EffectiveActor>> {
        match self.actor_id {
            Some(_) => self.actor().map(Some),
            None => Ok(None),
        }
    }
}

/// Ask before a destructive action unless `--yes` was given
pub fn confirm(prompt: &str, yes: bool) -> Result<bool> {
    if yes {
        return Ok(true);
    }
    if !io::stdin().is_terminal() {
        bail!("Refusing to continue without a terminal; pass --yes to confirm");
    }
    Confirm::with_theme(&ColorfulTheme::default())
        .with_prompt(prompt)
        .default(false)
        .interact()
        .into_diagnostic()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_yes_skips_prompt() {
        assert!(confirm("Delete everything?", true).unwrap());
    }

    #[test]
    fn test_db_flag_overrides_config() {
        let global = GlobalOpts {
            actor: None,
            format: OutputFormat::Json,
            db: Some("/tmp/override.db".into()),
            verbose: 0,
        };
        let config = load_config(&global).unwrap();
        assert_eq!(config.database_path(), std::path::PathBuf::from("/tmp/override.db"));
    }
}
