use anyhow::{Context, Result};
use async_trait::async_trait;
use std::process::Stdio;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

use stawatch_core::StationId;

use crate::config::{ProbeConfig, ProbeMethod};

/// Extra time granted to `ping` beyond its own timeout before it is killed.
const PING_GUARD: Duration = Duration::from_secs(2);

/// A single pass/fail reachability sample.
///
/// `Ok(false)` is an ordinary answer (timeout, unreachable, refused). `Err`
/// means the check itself could not run; the coordinator counts it as down.
#[async_trait]
pub trait Prober: Send + Sync {
    async fn probe(&self, station: &StationId) -> Result<bool>;
}

/// Command-line dialect of the system `ping`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PingFlavor {
    /// `ping -n 1 -w <ms>`
    Windows,
    /// `ping -c 1 -W <ms>` (macOS, FreeBSD, DragonFly)
    Bsd,
    /// `ping -c 1 -W <secs>` (Linux iputils, busybox)
    Unix,
}

impl PingFlavor {
    pub fn host() -> Self {
        if cfg!(windows) {
            PingFlavor::Windows
        } else if cfg!(any(
            target_os = "macos",
            target_os = "ios",
            target_os = "freebsd",
            target_os = "dragonfly"
        )) {
            PingFlavor::Bsd
        } else {
            PingFlavor::Unix
        }
    }

    pub fn args(&self, timeout: Duration) -> Vec<String> {
        match self {
            PingFlavor::Windows => vec![
                "-n".into(),
                "1".into(),
                "-w".into(),
                timeout.as_millis().max(1).to_string(),
            ],
            PingFlavor::Bsd => vec![
                "-c".into(),
                "1".into(),
                "-W".into(),
                timeout.as_millis().max(1).to_string(),
            ],
            PingFlavor::Unix => {
                let secs = timeout.as_millis().div_ceil(1000).max(1);
                vec!["-c".into(), "1".into(), "-W".into(), secs.to_string()]
            }
        }
    }
}

/// One ICMP echo via the system `ping`; exit status 0 means reachable.
#[derive(Clone, Debug)]
pub struct PingProber {
    program: String,
    timeout: Duration,
    flavor: PingFlavor,
}

impl PingProber {
    pub fn new(program: impl Into<String>, timeout: Duration) -> Self {
        Self {
            program: program.into(),
            timeout,
            flavor: PingFlavor::host(),
        }
    }

    pub fn with_flavor(mut self, flavor: PingFlavor) -> Self {
        self.flavor = flavor;
        self
    }
}

#[async_trait]
impl Prober for PingProber {
    async fn probe(&self, station: &StationId) -> Result<bool> {
        let mut child = tokio::process::Command::new(&self.program)
            .args(self.flavor.args(self.timeout))
            .arg(station.as_str())
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .kill_on_drop(true)
            .spawn()
            .with_context(|| format!("spawn {}", self.program))?;

        match tokio::time::timeout(self.timeout + PING_GUARD, child.wait()).await {
            Ok(status) => {
                let status = status.with_context(|| format!("wait for {}", self.program))?;
                Ok(status.success())
            }
            Err(_) => {
                debug!(station = %station, "ping did not exit in time; killing it");
                let _ = child.kill().await;
                Ok(false)
            }
        }
    }
}

/// TCP connect check, for networks where ICMP is filtered.
#[derive(Clone, Debug)]
pub struct TcpProber {
    port: u16,
    timeout: Duration,
}

impl TcpProber {
    pub fn new(port: u16, timeout: Duration) -> Self {
        Self { port, timeout }
    }

    fn address(&self, station: &StationId) -> String {
        let host = station.as_str();
        if host.contains(':') && !host.starts_with('[') {
            format!("[{host}]:{}", self.port)
        } else {
            format!("{host}:{}", self.port)
        }
    }
}

#[async_trait]
impl Prober for TcpProber {
    async fn probe(&self, station: &StationId) -> Result<bool> {
        let addr = self.address(station);
        match tokio::time::timeout(self.timeout, tokio::net::TcpStream::connect(&addr)).await {
            Ok(Ok(_stream)) => Ok(true),
            Ok(Err(e)) => {
                debug!(%addr, error = %e, "tcp connect failed");
                Ok(false)
            }
            Err(_) => Ok(false),
        }
    }
}

pub fn prober_from_config(cfg: &ProbeConfig) -> Arc<dyn Prober> {
    match cfg.method {
        ProbeMethod::Icmp => Arc::new(PingProber::new(cfg.ping_program.clone(), cfg.timeout())),
        ProbeMethod::Tcp => Arc::new(TcpProber::new(cfg.tcp_port, cfg.timeout())),
    }
}
