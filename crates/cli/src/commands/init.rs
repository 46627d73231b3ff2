//! docrepo init command

use std::path::PathBuf;

use clap::Args;
use shared::StoreConfig;

use crate::context::DEFAULT_CONFIG_FILE;

#[derive(Debug, Args)]
pub struct InitCommand {
    /// Directory to initialize
    #[arg(default_value = ".")]
    pub directory: PathBuf,

    /// Overwrite an existing configuration
    #[arg(long)]
    pub force: bool,
}

impl InitCommand {
    pub fn run(&self) -> anyhow::Result<PathBuf> {
        std::fs::create_dir_all(&self.directory)?;

        let path = self.directory.join(DEFAULT_CONFIG_FILE);
        if path.exists() && !self.force {
            anyhow::bail!("{} already exists (use --force to overwrite)", path.display());
        }

        std::fs::write(&path, serde_json::to_string_pretty(&StoreConfig::default())?)?;
        Ok(path)
    }
}
