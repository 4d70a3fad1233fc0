use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    pub monitor: MonitorConfig,
    pub probe: ProbeConfig,
    pub logs: LogsConfig,
    pub targets: TargetsConfig,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct MonitorConfig {
    /// Sleep between the end of one cycle and the start of the next.
    pub interval_secs: u64,
    /// Total observation window.
    pub duration_secs: u64,
    pub max_concurrent_probes: usize,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            interval_secs: 5,
            duration_secs: 7 * 24 * 60 * 60,
            max_concurrent_probes: 64,
        }
    }
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ProbeMethod {
    Icmp,
    Tcp,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ProbeConfig {
    pub method: ProbeMethod,
    pub timeout_ms: u64,
    pub tcp_port: u16,
    pub ping_program: String,
}

impl Default for ProbeConfig {
    fn default() -> Self {
        Self {
            method: ProbeMethod::Icmp,
            timeout_ms: 1000,
            tcp_port: 80,
            ping_program: "ping".to_string(),
        }
    }
}

impl ProbeConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct LogsConfig {
    pub dir: String,
    pub general_file: String,
    pub clear_general_on_start: bool,
    pub echo_console: bool,
}

impl Default for LogsConfig {
    fn default() -> Self {
        Self {
            dir: "~/.stawatch/logs".to_string(),
            general_file: "stability_test_log.txt".to_string(),
            clear_general_on_start: true,
            echo_console: true,
        }
    }
}

impl LogsConfig {
    pub fn dir_path(&self) -> PathBuf {
        PathBuf::from(shellexpand::tilde(&self.dir).to_string())
    }
}

#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct TargetsConfig {
    pub stations: Vec<String>,
    /// Re-read at the start of every cycle when set.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file: Option<String>,
}

impl TargetsConfig {
    pub fn file_path(&self) -> Option<PathBuf> {
        self.file
            .as_deref()
            .filter(|f| !f.trim().is_empty())
            .map(|f| PathBuf::from(shellexpand::tilde(f).to_string()))
    }
}

impl Config {
    pub const DEFAULT_FILE: &'static str = "stawatch.toml";

    pub fn load_from(path: &Path) -> Result<Self> {
        let s = std::fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
        let cfg: Config = toml::from_str(&s).with_context(|| format!("parse {}", path.display()))?;
        Ok(cfg)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)
                    .with_context(|| format!("create {}", parent.display()))?;
            }
        }
        let s = toml::to_string_pretty(self).with_context(|| "serialize toml")?;
        std::fs::write(path, s).with_context(|| format!("write {}", path.display()))?;
        Ok(())
    }

    /// An explicit path must exist; otherwise fall back to `./stawatch.toml`
    /// and then to built-in defaults.
    pub fn load_or_default(explicit: Option<&Path>) -> Result<Self> {
        match explicit {
            Some(path) => Self::load_from(path),
            None => {
                let local = Path::new(Self::DEFAULT_FILE);
                if local.exists() {
                    Self::load_from(local)
                } else {
                    Ok(Self::default())
                }
            }
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.monitor.interval_secs == 0 {
            return Err(anyhow!("monitor.interval_secs must be at least 1"));
        }
        if self.monitor.max_concurrent_probes == 0 {
            return Err(anyhow!("monitor.max_concurrent_probes must be at least 1"));
        }
        if self.probe.timeout_ms == 0 {
            return Err(anyhow!("probe.timeout_ms must be at least 1"));
        }
        if self.logs.general_file.trim().is_empty() {
            return Err(anyhow!("logs.general_file must not be empty"));
        }
        Ok(())
    }

    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.monitor.interval_secs)
    }

    pub fn duration(&self) -> Duration {
        Duration::from_secs(self.monitor.duration_secs)
    }
}
