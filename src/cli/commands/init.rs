use crate::config::{InvoiceReviewConfig, CONFIG_FILE};
use anyhow::{anyhow, Result};
use std::path::PathBuf;

/// Writes a default configuration file.
///
/// An existing file is left untouched unless `force` is set.
pub struct InitCommand {
    pub force: bool,
    path: PathBuf,
}

impl InitCommand {
    pub fn new(force: bool) -> Self {
        Self {
            force,
            path: PathBuf::from(CONFIG_FILE),
        }
    }

    pub fn with_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.path = path.into();
        self
    }

    pub async fn execute(&self) -> Result<()> {
        println!("⚙️  Initializing invoice-review configuration");
        println!();

        if self.path.exists() && !self.force {
            return Err(anyhow!(
                "{} already exists. Use --force to overwrite",
                self.path.display()
            ));
        }

        InvoiceReviewConfig::default().save_to_file(&self.path)?;
        println!("✅ Wrote {}", self.path.display());
        println!();
        println!("Next steps:");
        println!("  1. Set api.base_url to your invoice service");
        println!("  2. Export INVOICE_REVIEW_TOKEN if the service requires a token");
        println!("  3. Run 'invoice-review list'");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_init_refuses_to_overwrite_without_force() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE);

        InitCommand::new(false).with_path(&path).execute().await.unwrap();
        let written = std::fs::read_to_string(&path).unwrap();
        assert!(written.contains("base_url"));

        std::fs::write(&path, "# edited").unwrap();
        assert!(InitCommand::new(false).with_path(&path).execute().await.is_err());
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "# edited");

        InitCommand::new(true).with_path(&path).execute().await.unwrap();
        assert!(std::fs::read_to_string(&path).unwrap().contains("[api]"));
    }
}
