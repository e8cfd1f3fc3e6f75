//! Startup configuration: command line and environment via clap, with an
//! optional YAML file supplying defaults for anything not given there.

use std::{
    path::{Path, PathBuf},
    time::Duration,
};

use clap::Parser;
use reqwest::Url;
use serde::Deserialize;

use crate::{error::ConfigError, table_format::parse_columns};

pub const DEFAULT_CONFIG_FILE: &str = ".nomad-tui.yaml";

pub const JOB_COLUMN_KEYS: &[&str] = &["id", "name", "type", "namespace", "priority", "status", "submitted"];
pub const TASK_COLUMN_KEYS: &[&str] = &[
    "job", "node", "alloc_id", "alloc_name", "task", "state", "started", "finished",
];

const DEFAULT_JOB_COLUMNS: &str = "ID,Type,Namespace,Priority,Status,Submitted";
const DEFAULT_TASK_COLUMNS: &str = "Node,Alloc ID,Alloc Name,Task,State,Started,Finished";
const DEFAULT_ALL_TASK_COLUMNS: &str = "Job,Node,Alloc ID,Alloc Name,Task,State,Started";
const DEFAULT_EVENT_TOPICS: &str = "Job,Allocation,Deployment,Evaluation";
const DEFAULT_LOG_OFFSET: u64 = 1_000_000;
const DEFAULT_UPDATE_SECS: u64 = 2;

/// nomad-tui - browse jobs, tasks, logs and events of a Nomad cluster
#[derive(Parser, Debug, Default)]
#[command(name = "nomad-tui")]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Cluster HTTP address, e.g. http://127.0.0.1:4646
    #[arg(long, env = "NOMAD_ADDR")]
    pub address: Option<String>,

    /// ACL token sent as X-Nomad-Token
    #[arg(long, env = "NOMAD_TOKEN", hide_env_values = true)]
    pub token: Option<String>,

    /// Namespace filter, `*` for all
    #[arg(long, env = "NOMAD_NAMESPACE")]
    pub namespace: Option<String>,

    #[arg(long, env = "NOMAD_REGION")]
    pub region: Option<String>,

    /// PEM CA bundle used to verify the server
    #[arg(long, env = "NOMAD_CACERT")]
    pub ca_cert: Option<PathBuf>,

    #[arg(long, env = "NOMAD_CLIENT_CERT")]
    pub client_cert: Option<PathBuf>,

    #[arg(long, env = "NOMAD_CLIENT_KEY")]
    pub client_key: Option<PathBuf>,

    #[arg(long, env = "NOMAD_TLS_SERVER_NAME")]
    pub tls_server_name: Option<String>,

    /// Skip TLS certificate verification
    #[arg(long, env = "NOMAD_SKIP_VERIFY")]
    pub skip_verify: Option<bool>,

    /// Comma separated event stream topics
    #[arg(long, env = "NOMAD_TUI_EVENT_TOPICS")]
    pub event_topics: Option<String>,

    #[arg(long, env = "NOMAD_TUI_EVENT_NAMESPACE")]
    pub event_namespace: Option<String>,

    /// Bytes from the end of the log to load on entry
    #[arg(long, env = "NOMAD_TUI_LOG_OFFSET")]
    pub log_offset: Option<u64>,

    /// Follow logs after the initial snapshot
    #[arg(long, env = "NOMAD_TUI_LOG_TAIL")]
    pub log_tail: Option<bool>,

    /// Poll interval in seconds, 0 disables polling
    #[arg(long, env = "NOMAD_TUI_UPDATE")]
    pub update: Option<u64>,

    #[arg(long, env = "NOMAD_TUI_JOB_COLUMNS")]
    pub job_columns: Option<String>,

    #[arg(long, env = "NOMAD_TUI_TASK_COLUMNS")]
    pub task_columns: Option<String>,

    #[arg(long, env = "NOMAD_TUI_ALL_TASK_COLUMNS")]
    pub all_task_columns: Option<String>,

    /// Hide table headers and the help bar
    #[arg(long)]
    pub compact: bool,

    /// Start with line wrapping enabled
    #[arg(long)]
    pub wrap: bool,

    /// Focus the filter on every page entry
    #[arg(long)]
    pub start_filtering: bool,

    /// Open on the all-tasks page instead of jobs
    #[arg(long)]
    pub start_all_tasks: bool,

    /// Directory for nomad-tui.log
    #[arg(long, env = "NOMAD_TUI_LOG_DIR")]
    pub log_dir: Option<PathBuf>,

    /// YAML config file, defaults to ~/.nomad-tui.yaml
    #[arg(long, env = "NOMAD_TUI_CONFIG")]
    pub config: Option<PathBuf>,
}

/// Defaults read from the YAML config file. Every field is optional.
#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct FileConfig {
    pub address: Option<String>,
    pub token: Option<String>,
    pub namespace: Option<String>,
    pub region: Option<String>,
    pub ca_cert: Option<PathBuf>,
    pub client_cert: Option<PathBuf>,
    pub client_key: Option<PathBuf>,
    pub tls_server_name: Option<String>,
    pub skip_verify: Option<bool>,
    pub event_topics: Option<String>,
    pub event_namespace: Option<String>,
    pub log_offset: Option<u64>,
    pub log_tail: Option<bool>,
    pub update: Option<u64>,
    pub job_columns: Option<String>,
    pub task_columns: Option<String>,
    pub all_task_columns: Option<String>,
    pub compact: Option<bool>,
    pub wrap: Option<bool>,
    pub start_filtering: Option<bool>,
    pub start_all_tasks: Option<bool>,
    pub log_dir: Option<PathBuf>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TlsConfig {
    pub ca_cert: Option<PathBuf>,
    pub client_cert: Option<PathBuf>,
    pub client_key: Option<PathBuf>,
    pub server_name: Option<String>,
    pub skip_verify: bool,
}

/// Validated, immutable configuration shared as `Arc<Config>`.
#[derive(Debug, Clone)]
pub struct Config {
    pub address: Url,
    pub token: Option<String>,
    pub namespace: String,
    pub region: Option<String>,
    pub tls: TlsConfig,
    pub event_topics: Vec<String>,
    pub event_namespace: String,
    pub log_offset: u64,
    pub log_tail: bool,
    pub update_interval: Option<Duration>,
    pub job_columns: Vec<String>,
    pub task_columns: Vec<String>,
    pub all_task_columns: Vec<String>,
    pub compact: bool,
    pub wrap: bool,
    pub start_filtering: bool,
    pub start_all_tasks: bool,
    pub log_dir: PathBuf,
}

impl Config {
    /// Reads the config file (if any) and merges it under the parsed arguments.
    pub fn load(args: Args) -> Result<Self, ConfigError> {
        let explicit = args.config.is_some();
        let path = args
            .config
            .clone()
            .or_else(|| dirs::home_dir().map(|home| home.join(DEFAULT_CONFIG_FILE)));
        let file = match path {
            Some(path) => read_file_config(&path, explicit)?,
            None => FileConfig::default(),
        };
        Self::merge(args, file)
    }

    /// Command line and environment values win over file values.
    pub fn merge(args: Args, file: FileConfig) -> Result<Self, ConfigError> {
        let raw_address = args
            .address
            .or(file.address)
            .filter(|a| !a.trim().is_empty())
            .ok_or(ConfigError::MissingAddress)?;
        let address = parse_address(&raw_address)?;

        let columns = |page: &'static str, raw: Option<String>, default: &str, known: &[&str]| {
            let raw = raw.unwrap_or_else(|| default.to_string());
            parse_columns(&raw, known).map_err(|reason| ConfigError::Columns { page, reason })
        };

        let event_topics = args
            .event_topics
            .or(file.event_topics)
            .unwrap_or_else(|| DEFAULT_EVENT_TOPICS.to_string())
            .split(',')
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .map(str::to_string)
            .collect();

        let update_secs = args.update.or(file.update).unwrap_or(DEFAULT_UPDATE_SECS);

        Ok(Config {
            address,
            token: args.token.or(file.token).filter(|t| !t.is_empty()),
            namespace: args
                .namespace
                .or(file.namespace)
                .unwrap_or_else(|| "*".to_string()),
            region: args.region.or(file.region),
            tls: TlsConfig {
                ca_cert: args.ca_cert.or(file.ca_cert),
                client_cert: args.client_cert.or(file.client_cert),
                client_key: args.client_key.or(file.client_key),
                server_name: args.tls_server_name.or(file.tls_server_name),
                skip_verify: args.skip_verify.or(file.skip_verify).unwrap_or(false),
            },
            event_topics,
            event_namespace: args
                .event_namespace
                .or(file.event_namespace)
                .unwrap_or_else(|| "default".to_string()),
            log_offset: args.log_offset.or(file.log_offset).unwrap_or(DEFAULT_LOG_OFFSET),
            log_tail: args.log_tail.or(file.log_tail).unwrap_or(true),
            update_interval: (update_secs > 0).then(|| Duration::from_secs(update_secs)),
            job_columns: columns(
                "jobs",
                args.job_columns.or(file.job_columns),
                DEFAULT_JOB_COLUMNS,
                JOB_COLUMN_KEYS,
            )?,
            task_columns: columns(
                "tasks",
                args.task_columns.or(file.task_columns),
                DEFAULT_TASK_COLUMNS,
                TASK_COLUMN_KEYS,
            )?,
            all_task_columns: columns(
                "all tasks",
                args.all_task_columns.or(file.all_task_columns),
                DEFAULT_ALL_TASK_COLUMNS,
                TASK_COLUMN_KEYS,
            )?,
            compact: args.compact || file.compact.unwrap_or(false),
            wrap: args.wrap || file.wrap.unwrap_or(false),
            start_filtering: args.start_filtering || file.start_filtering.unwrap_or(false),
            start_all_tasks: args.start_all_tasks || file.start_all_tasks.unwrap_or(false),
            log_dir: args
                .log_dir
                .or(file.log_dir)
                .unwrap_or_else(std::env::temp_dir),
        })
    }

    /// Address with the scheme swapped for the websocket equivalent.
    pub fn websocket_base(&self) -> Url {
        let mut url = self.address.clone();
        let scheme = if url.scheme() == "https" { "wss" } else { "ws" };
        // http(s) -> ws(s) is always a valid scheme change for a parsed http url.
        let _ = url.set_scheme(scheme);
        url
    }
}

fn parse_address(raw: &str) -> Result<Url, ConfigError> {
    let url = Url::parse(raw.trim())
        .map_err(|e| ConfigError::InvalidAddress(raw.to_string(), e.to_string()))?;
    match url.scheme() {
        "http" | "https" => Ok(url),
        other => Err(ConfigError::InvalidAddress(
            raw.to_string(),
            format!("unsupported scheme {other:?}"),
        )),
    }
}

fn read_file_config(path: &Path, explicit: bool) -> Result<FileConfig, ConfigError> {
    let content = match std::fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound && !explicit => {
            return Ok(FileConfig::default());
        }
        Err(e) => {
            return Err(ConfigError::File {
                path: path.display().to_string(),
                reason: e.to_string(),
            })
        }
    };
    if content.trim().is_empty() {
        return Ok(FileConfig::default());
    }
    serde_yaml::from_str(&content).map_err(|e| ConfigError::File {
        path: path.display().to_string(),
        reason: e.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn args_with_address(addr: &str) -> Args {
        Args {
            address: Some(addr.to_string()),
            ..Default::default()
        }
    }

    #[test]
    fn test_missing_address_is_fatal() {
        let err = Config::merge(Args::default(), FileConfig::default()).unwrap_err();
        assert!(matches!(err, ConfigError::MissingAddress));
    }

    #[test]
    fn test_invalid_scheme_rejected() {
        let err = Config::merge(args_with_address("ftp://host"), FileConfig::default()).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidAddress(..)));
    }

    #[test]
    fn test_defaults() {
        let config = Config::merge(args_with_address("http://127.0.0.1:4646"), FileConfig::default()).unwrap();
        assert_eq!(config.namespace, "*");
        assert_eq!(config.event_namespace, "default");
        assert_eq!(config.event_topics.len(), 4);
        assert_eq!(config.log_offset, 1_000_000);
        assert!(config.log_tail);
        assert_eq!(config.update_interval, Some(Duration::from_secs(2)));
        assert_eq!(config.job_columns[0], "ID");
        assert!(!config.compact);
    }

    #[test]
    fn test_args_override_file() {
        let file = FileConfig {
            address: Some("http://file:4646".into()),
            namespace: Some("ops".into()),
            update: Some(0),
            wrap: Some(true),
            ..Default::default()
        };
        let mut args = args_with_address("https://cli:4646");
        args.namespace = Some("web".into());
        let config = Config::merge(args, file).unwrap();
        assert_eq!(config.address.host_str(), Some("cli"));
        assert_eq!(config.namespace, "web");
        assert_eq!(config.update_interval, None);
        assert!(config.wrap);
        assert_eq!(config.websocket_base().scheme(), "wss");
    }

    #[test]
    fn test_bad_columns_rejected() {
        let mut args = args_with_address("http://h:4646");
        args.job_columns = Some("ID,Bogus".into());
        let err = Config::merge(args, FileConfig::default()).unwrap_err();
        assert!(matches!(err, ConfigError::Columns { page: "jobs", .. }));
    }

    #[test]
    fn test_yaml_file_is_read() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "address: http://yaml:4646\nlog-tail: false\ncompact: true").unwrap();
        let args = Args {
            config: Some(file.path().to_path_buf()),
            ..Default::default()
        };
        let config = Config::load(args).unwrap();
        assert_eq!(config.address.host_str(), Some("yaml"));
        assert!(!config.log_tail);
        assert!(config.compact);
    }

    #[test]
    fn test_explicit_missing_file_is_error() {
        let args = Args {
            address: Some("http://h:4646".into()),
            config: Some(PathBuf::from("/definitely/not/here.yaml")),
            ..Default::default()
        };
        assert!(matches!(Config::load(args), Err(ConfigError::File { .. })));
    }
}
