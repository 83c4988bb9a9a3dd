//! Command-line interface.
//!
//! `vault-aws-credential-protocol` is meant to be wired into `~/.aws/config`:
//!
//! ```ini
//! [profile deploy]
//! credential_process = vault-aws-credential-protocol --mount aws --role deploy
//! ```

use crate::backends::vault::{VaultBackend, VaultSession};
use crate::cache::{resolve_cache_dir, CredentialCache};
use crate::config::DEFAULT_SESSION_NAME;
use crate::{Config, CredentialError, CredentialProvider, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::debug;

/// Grab AWS creds from Vault and expose them in the AWS Credential Protocol format.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "vault-aws-credential-protocol",
    version,
    long_about = None,
    subcommand_negates_reqs = true
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Command>,

    /// Path to where the AWS secrets engine is mounted. If located outside of
    /// the root namespace, prefix the path with that namespace.
    #[arg(short, long, required = true, env = "VAULT_AWS_MOUNT", value_name = "VAULT_MOUNT_PATH")]
    pub mount: Option<String>,

    /// Name of the desired role on the given AWS secrets engine
    #[arg(short, long, required = true, env = "VAULT_AWS_ROLE", value_name = "VAULT_ROLE_NAME")]
    pub role: Option<String>,

    /// Skip reading creds from, and writing creds to cache
    #[arg(long)]
    pub no_cache: bool,

    /// STS session name to request
    #[arg(long, env = "VAULT_AWS_SESSION_NAME", default_value = DEFAULT_SESSION_NAME)]
    pub session_name: String,

    /// Cache directory [default: <user cache dir>/vault-aws-credential-protocol]
    #[arg(long, global = true, env = "VAULT_AWS_CACHE_DIR", value_name = "DIR")]
    pub cache_dir: Option<PathBuf>,

    /// Log debug output to stderr (overridden by RUST_LOG)
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Subcommand)]
pub enum Command {
    /// Remove every cached credential
    ClearCache,
}

impl Cli {
    /// Default log directive when `RUST_LOG` is unset.
    pub fn log_level(&self) -> &'static str {
        if self.verbose {
            "debug"
        } else {
            "warn"
        }
    }

    /// Builds the request configuration from the parsed flags.
    ///
    /// # Errors
    ///
    /// Returns [`CredentialError::InvalidArgument`] when `--mount` or `--role`
    /// is missing or any value fails validation.
    pub fn config(&self) -> Result<Config> {
        let mount = self
            .mount
            .clone()
            .ok_or_else(|| CredentialError::InvalidArgument("--mount is required".to_string()))?;
        let role = self
            .role
            .clone()
            .ok_or_else(|| CredentialError::InvalidArgument("--role is required".to_string()))?;

        let mut config = Config::new(mount, role)
            .with_session_name(self.session_name.clone())
            .with_cache(!self.no_cache);
        if let Some(dir) = &self.cache_dir {
            config = config.with_cache_dir(dir.clone());
        }

        config.validate()?;
        Ok(config)
    }

    /// Runs the selected command.
    ///
    /// Returns the text to print on stdout, if any.
    pub async fn run(&self) -> Result<Option<String>> {
        match self.command {
            Some(Command::ClearCache) => {
                self.clear_cache().await?;
                Ok(None)
            }
            None => {
                let record = self.fetch().await?;
                Ok(Some(record.to_json()?))
            }
        }
    }

    async fn fetch(&self) -> Result<crate::CredentialRecord> {
        let config = self.config()?;

        let session = VaultSession::from_env().await?;
        debug!(address = session.address(), "using vault");

        let mut provider = CredentialProvider::new(VaultBackend::new(session).await?);
        if let Some(cache) = config.cache()? {
            provider = provider.with_cache(cache);
        }

        provider.fetch(&config).await
    }

    async fn clear_cache(&self) -> Result<()> {
        let dir = resolve_cache_dir(self.cache_dir.as_deref())?;

        debug!(dir = %dir.display(), "clearing cache");
        CredentialCache::new(&dir)
            .clear()
            .await
            .map_err(|e| CredentialError::op("clear", dir.display().to_string(), e))
    }
}
