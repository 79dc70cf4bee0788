//! CLI commands using clap

use crate::application::ConfigError;
use crate::application::dto::{SignerConfig, retry_delay_from_secs};
use crate::domain::entities::SignatureProfile;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// Environment variable holding the key password
pub const PASSWORD_ENV: &str = "CADES_KEY_PASSWORD";

/// cades-batch - Batch document signer
///
/// Signs every unsigned document under a folder with detached long-term
/// signatures written next to each document as `<name>.p7s`.
#[derive(Parser)]
#[command(name = "cades-batch")]
#[command(
    version,
    about = "Batch-sign documents with detached long-term signatures",
    long_about = None
)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Sign every unsigned document under a folder
    Sign(SignArgs),

    /// List the documents that still need a signature
    Scan {
        /// Folder to scan
        #[arg(short, long)]
        root: PathBuf,

        /// Extensions to look for (pdf, xml, ...)
        #[arg(short, long, value_delimiter = ',', default_values_t = default_extensions())]
        ext: Vec<String>,
    },

    /// Delete every signature file under a folder
    Clean {
        /// Folder to clean
        #[arg(short, long)]
        root: PathBuf,

        /// Do not ask for confirmation
        #[arg(short = 'y', long)]
        yes: bool,
    },
}

#[derive(Args, Debug)]
pub struct SignArgs {
    /// Folder with the documents to sign
    #[arg(short, long)]
    pub root: PathBuf,

    /// TOML configuration file
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Private key file (PKCS#8, PEM or DER)
    #[arg(short, long)]
    pub key: Option<PathBuf>,

    /// Signing certificate (PEM or DER)
    #[arg(long)]
    pub cert: Option<PathBuf>,

    /// Key password; prompted for when absent
    #[arg(long, env = PASSWORD_ENV, hide_env_values = true)]
    pub password: Option<String>,

    /// Write signatures under this folder, mirroring the input layout
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Number of signing workers
    #[arg(short, long)]
    pub workers: Option<usize>,

    /// Attempts per document
    #[arg(long)]
    pub attempts: Option<u32>,

    /// Base retry delay in seconds (grows linearly per attempt)
    #[arg(long)]
    pub retry_delay: Option<f64>,

    /// Extensions to sign (pdf, xml, ...)
    #[arg(short, long, value_delimiter = ',')]
    pub ext: Option<Vec<String>>,

    /// Produce basic signatures without validation data
    #[arg(long)]
    pub basic: bool,

    /// JSON ledger recording pending and signed documents
    #[arg(long)]
    pub ledger: Option<PathBuf>,
}

impl SignArgs {
    /// Builds the signer configuration: file first, then flags
    pub fn to_config(&self) -> Result<SignerConfig, ConfigError> {
        let mut config = match (&self.config, &self.key) {
            (Some(path), _) => SignerConfig::from_toml_file(path)?,
            (None, Some(key)) => SignerConfig::new(key),
            (None, None) => {
                return Err(ConfigError::InvalidValue {
                    field: "key_file_path",
                    reason: "pass --key or a --config file naming one".to_string(),
                });
            }
        };

        if let Some(key) = &self.key {
            config.key_file_path = key.clone();
        }
        if let Some(cert) = &self.cert {
            config.cert_file_path = Some(cert.clone());
        }
        if let Some(workers) = self.workers {
            config.max_workers = workers;
        }
        if let Some(attempts) = self.attempts {
            config.max_attempts = attempts;
        }
        if let Some(delay) = self.retry_delay {
            config.retry_delay_base = retry_delay_from_secs(delay)?;
        }
        if let Some(ext) = &self.ext {
            config.extensions = ext.clone();
        }
        if self.basic {
            config.signature_profile = SignatureProfile::Basic;
        }

        config.validate()?;
        Ok(config)
    }
}

fn default_extensions() -> Vec<String> {
    vec!["pdf".to_string(), "xml".to_string()]
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(args).unwrap()
    }

    #[test]
    fn test_sign_flags_override_defaults() {
        let cli = parse(&[
            "cades-batch",
            "sign",
            "--root",
            "docs",
            "--key",
            "k.pem",
            "--cert",
            "c.pem",
            "--workers",
            "4",
            "--attempts",
            "5",
            "--retry-delay",
            "0.5",
            "--ext",
            "pdf,docx",
            "--basic",
            "--password",
            "pw",
        ]);
        let Commands::Sign(args) = cli.command else {
            panic!("expected sign");
        };

        let config = args.to_config().unwrap();
        assert_eq!(config.key_file_path, PathBuf::from("k.pem"));
        assert_eq!(config.cert_file_path, Some(PathBuf::from("c.pem")));
        assert_eq!(config.max_workers, 4);
        assert_eq!(config.max_attempts, 5);
        assert_eq!(config.retry_delay_base, Duration::from_millis(500));
        assert_eq!(config.normalized_extensions(), vec![".docx", ".pdf"]);
        assert_eq!(config.signature_profile, SignatureProfile::Basic);
        assert_eq!(args.password.as_deref(), Some("pw"));
    }

    #[test]
    fn test_huge_retry_delay_is_rejected() {
        let cli = parse(&[
            "cades-batch",
            "sign",
            "--root",
            "docs",
            "--key",
            "k.pem",
            "--retry-delay",
            "1e300",
        ]);
        let Commands::Sign(args) = cli.command else {
            panic!("expected sign");
        };
        assert!(matches!(
            args.to_config(),
            Err(ConfigError::InvalidValue { field: "retry_delay_secs", .. })
        ));
    }

    #[test]
    fn test_sign_requires_key_source() {
        let cli = parse(&["cades-batch", "sign", "--root", "docs"]);
        let Commands::Sign(args) = cli.command else {
            panic!("expected sign");
        };
        assert!(matches!(
            args.to_config(),
            Err(ConfigError::InvalidValue { field: "key_file_path", .. })
        ));
    }

    #[test]
    fn test_zero_workers_rejected() {
        let cli = parse(&["cades-batch", "sign", "--root", "d", "--key", "k", "--workers", "0"]);
        let Commands::Sign(args) = cli.command else {
            panic!("expected sign");
        };
        assert!(args.to_config().is_err());
    }

    #[test]
    fn test_scan_default_extensions() {
        let cli = parse(&["cades-batch", "scan", "--root", "docs"]);
        match cli.command {
            Commands::Scan { ext, .. } => assert_eq!(ext, vec!["pdf", "xml"]),
            _ => panic!("expected scan"),
        }
    }
}
