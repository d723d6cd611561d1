//! `agrilink init` - create a workspace

use std::path::PathBuf;

use clap::Args;
use console::style;
use miette::{bail, IntoDiagnostic, Result};

use crate::cli::GlobalOpts;
use crate::core::config::{default_workspace_config, CONFIG_FILE, DATABASE_FILE, WORKSPACE_DIR};
use crate::store::Store;

#[derive(Debug, Args)]
pub struct InitArgs {
    /// Directory to initialize (defaults to the current directory)
    pub path: Option<PathBuf>,

    /// Overwrite an existing config.yaml
    #[arg(long)]
    pub force: bool,
}

impl InitArgs {
    pub fn run(&self, global: &GlobalOpts) -> Result<()> {
        let root = match &self.path {
            Some(path) => path.clone(),
            None => std::env::current_dir().into_diagnostic()?,
        };
        let dir = root.join(WORKSPACE_DIR);
        let config_path = dir.join(CONFIG_FILE);

        if config_path.exists() && !self.force {
            bail!(
                "Workspace already initialized at {}\n\
                 Use --force to overwrite its config.",
                config_path.display()
            );
        }

        std::fs::create_dir_all(&dir).into_diagnostic()?;
        std::fs::write(&config_path, default_workspace_config()).into_diagnostic()?;

        let db_path = match &global.db {
            Some(path) => path.clone(),
            None => dir.join(DATABASE_FILE),
        };
        Store::open(&db_path).into_diagnostic()?;
        tracing::info!(path = %db_path.display(), "database ready");

        println!(
            "{} Initialized agrilink workspace in {}",
            style("✓").green(),
            style(dir.display()).cyan()
        );
        println!("\nNext steps:");
        println!("  agrilink account create --email admin@example.com --first-name Ada --last-name Admin --role super-admin");
        println!("  agrilink --as 1 account whoami");

        Ok(())
    }
}
