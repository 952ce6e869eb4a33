use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::Context;
use serde::Deserialize;

use crate::cli::SyncArgs;
use crate::download::SyncConfig;
use crate::types::SyncPolicy;

/// On-disk job description, e.g.
/// `{"orderId": "O1", "fname": ["a.jpg", "b.jpg"], "policy": "full-scan"}`.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct FileConfig {
    #[serde(default)]
    order_id: Option<String>,
    #[serde(default, rename = "fname")]
    fnames: Vec<String>,
    #[serde(default)]
    policy: Option<SyncPolicy>,
}

/// Resolved settings for one sync run.
#[derive(Debug)]
pub struct Config {
    pub order_id: String,
    pub fnames: BTreeSet<String>,
    pub directory: PathBuf,
    pub history_file: PathBuf,
    pub audit_file: PathBuf,
    pub fallback_dir_name: String,
    pub api_base: String,
    pub content_base: String,
    pub timeout: Duration,
    pub policy: SyncPolicy,
}

pub(crate) fn expand_tilde(path: &str) -> PathBuf {
    if let Some(stripped) = path.strip_prefix("~/") {
        if let Some(home) = dirs::home_dir() {
            return home.join(stripped);
        }
    }
    PathBuf::from(path)
}

/// Read the config file. A missing file is only tolerated when the order id
/// comes from the command line.
fn load_file_config(path: &Path, order_id_given: bool) -> anyhow::Result<FileConfig> {
    let raw = match std::fs::read_to_string(path) {
        Ok(raw) => raw,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound && order_id_given => {
            tracing::debug!("No config file at {}, using command line only", path.display());
            return Ok(FileConfig::default());
        }
        Err(e) => {
            return Err(e)
                .with_context(|| format!("Failed to read config file {}", path.display()))
        }
    };
    serde_json::from_str(&raw)
        .with_context(|| format!("Failed to parse config file {}", path.display()))
}

impl Config {
    pub fn from_cli(cli: SyncArgs) -> anyhow::Result<Self> {
        let config_path = expand_tilde(&cli.config);
        let file = load_file_config(&config_path, cli.order_id.is_some())?;

        let order_id = cli
            .order_id
            .or(file.order_id)
            .map(|id| id.trim().to_string())
            .unwrap_or_default();
        if order_id.is_empty() {
            anyhow::bail!(
                "No order id given: set \"orderId\" in {} or pass --order-id",
                config_path.display()
            );
        }

        let fnames = if cli.fnames.is_empty() {
            file.fnames
        } else {
            cli.fnames
        };
        let fnames: BTreeSet<String> = fnames.into_iter().filter(|f| !f.is_empty()).collect();

        Ok(Self {
            order_id,
            fnames,
            directory: expand_tilde(&cli.directory),
            history_file: expand_tilde(&cli.ledger.history_file),
            audit_file: expand_tilde(&cli.audit_file),
            fallback_dir_name: cli.fallback_dir_name,
            api_base: cli.api_base,
            content_base: cli.content_base,
            timeout: Duration::from_secs(cli.timeout_secs),
            policy: cli.policy.or(file.policy).unwrap_or_default(),
        })
    }

    pub fn sync_config(&self) -> SyncConfig {
        SyncConfig {
            order_id: self.order_id.clone(),
            requested: self.fnames.clone(),
            policy: self.policy,
            download_root: self.directory.clone(),
            fallback_dir_name: self.fallback_dir_name.clone(),
            audit_path: self.audit_file.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::{Cli, Command};
    use clap::Parser;

    fn sync_args(config: &Path, extra: &[&str]) -> SyncArgs {
        let mut argv = vec!["orderpd-rs", "--config", config.to_str().unwrap()];
        argv.extend_from_slice(extra);
        match Cli::try_parse_from(argv).unwrap().effective_command() {
            Command::Sync(args) => args,
            other => panic!("expected sync, got {:?}", other),
        }
    }

    fn write_config(dir: &Path, body: &str) -> PathBuf {
        let path = dir.join("config.json");
        std::fs::write(&path, body).unwrap();
        path
    }

    #[test]
    fn test_expand_tilde_with_home() {
        let result = expand_tilde("~/Pictures");
        if let Some(home) = dirs::home_dir() {
            assert_eq!(result, home.join("Pictures"));
        }
    }

    #[test]
    fn test_expand_tilde_no_prefix() {
        assert_eq!(expand_tilde("downloads"), PathBuf::from("downloads"));
        assert_eq!(expand_tilde("/srv/photos"), PathBuf::from("/srv/photos"));
    }

    #[test]
    fn test_reads_config_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_config(
            dir.path(),
            r#"{"orderId": "O1", "fname": ["b.jpg", "a.jpg", "a.jpg"]}"#,
        );
        let cfg = Config::from_cli(sync_args(&path, &[])).unwrap();
        assert_eq!(cfg.order_id, "O1");
        assert_eq!(cfg.fnames.iter().collect::<Vec<_>>(), ["a.jpg", "b.jpg"]);
        assert_eq!(cfg.policy, SyncPolicy::EarlyStop);
        assert_eq!(cfg.timeout, Duration::from_secs(30));
    }

    #[test]
    fn test_cli_overrides_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_config(
            dir.path(),
            r#"{"orderId": "O1", "fname": ["a.jpg"], "policy": "early-stop"}"#,
        );
        let args = sync_args(
            &path,
            &["--order-id", "O2", "--fname", "z.jpg", "--policy", "full-scan"],
        );
        let cfg = Config::from_cli(args).unwrap();
        assert_eq!(cfg.order_id, "O2");
        assert!(cfg.fnames.contains("z.jpg"));
        assert_eq!(cfg.fnames.len(), 1);
        assert_eq!(cfg.policy, SyncPolicy::FullScan);
    }

    #[test]
    fn test_policy_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_config(dir.path(), r#"{"orderId": "O1", "policy": "full-scan"}"#);
        let cfg = Config::from_cli(sync_args(&path, &[])).unwrap();
        assert_eq!(cfg.policy, SyncPolicy::FullScan);
        assert!(cfg.fnames.is_empty());
    }

    #[test]
    fn test_missing_file_allowed_with_order_id() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("absent.json");
        let cfg = Config::from_cli(sync_args(&path, &["-o", "O9", "-f", "a.jpg"])).unwrap();
        assert_eq!(cfg.order_id, "O9");
    }

    #[test]
    fn test_missing_file_without_order_id_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("absent.json");
        let err = Config::from_cli(sync_args(&path, &[])).unwrap_err();
        assert!(err.to_string().contains("Failed to read config file"));
    }

    #[test]
    fn test_malformed_file_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_config(dir.path(), "{not json");
        let err = Config::from_cli(sync_args(&path, &["--order-id", "O1"])).unwrap_err();
        assert!(err.to_string().contains("Failed to parse config file"));
    }

    #[test]
    fn test_blank_order_id_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_config(dir.path(), r#"{"orderId": "  ", "fname": ["a.jpg"]}"#);
        let err = Config::from_cli(sync_args(&path, &[])).unwrap_err();
        assert!(err.to_string().contains("No order id"));
    }

    #[test]
    fn test_sync_config_carries_settings() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_config(dir.path(), r#"{"orderId": "O1", "fname": ["a.jpg"]}"#);
        let args = sync_args(
            &path,
            &["--directory", "out", "--audit-file", "scan.jsonl", "--fallback-dir-name", "misc"],
        );
        let cfg = Config::from_cli(args).unwrap();
        let sync = cfg.sync_config();
        assert_eq!(sync.order_id, "O1");
        assert_eq!(sync.download_root, PathBuf::from("out"));
        assert_eq!(sync.audit_path, PathBuf::from("scan.jsonl"));
        assert_eq!(sync.fallback_dir_name, "misc");
        assert!(sync.requested.contains("a.jpg"));
    }
}
