use std::{fs, path::{Path, PathBuf}};

use anyhow::{Context, Result};
use serde::Deserialize;
use tokio::time::Duration;

/// The character device exposed by the uart driver
pub const DEVICE_PATH: &str = "/dev/rpi_uart";
/// Where every execute is appended
pub const HISTORY_PATH: &str = "comandos_logs.csv";
/// Where the latest pushed setpoint is written
pub const STATE_PATH: &str = "current_state.csv";

/// How many times a command is written before giving up
pub const MAX_ATTEMPTS: u32 = 3;
/// How long to wait between failed attempts
pub const RETRY_BACKOFF: Duration = Duration::from_millis(500);
/// How long a single write may take before the handle is considered dead
pub const WRITE_TIMEOUT: Duration = Duration::from_secs(1);
/// Time given to the microcontroller after a successful send
pub const RESPONSE_GRACE: Duration = Duration::from_millis(200);
/// Pause before the reply is read
pub const PRE_READ_DELAY: Duration = Duration::from_millis(100);
/// How long the reply read may wait for data
pub const POLL_TIMEOUT: Duration = Duration::from_millis(100);
/// Largest reply read in one go
pub const READ_BUFFER_SIZE: usize = 1024;
/// The microcontroller only recognizes a frame once it sees this
pub const LINE_TERMINATOR: &str = "\n";

/// Runtime configuration of the bridge.
///
/// Every field falls back to the constants above when missing from the toml file.
#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct BridgeConfig{
    #[serde(default = "BridgeConfig::default_device")]
    pub device: PathBuf,
    #[serde(default = "BridgeConfig::default_history")]
    pub history: PathBuf,
    #[serde(default = "BridgeConfig::default_state")]
    pub state: PathBuf,
    #[serde(default = "BridgeConfig::default_attempts")]
    pub attempts: u32,
    #[serde(default = "BridgeConfig::default_backoff_ms")]
    pub backoff_ms: u64,
    #[serde(default = "BridgeConfig::default_grace_ms")]
    pub grace_ms: u64,
    #[serde(default = "BridgeConfig::default_pre_read_ms")]
    pub pre_read_ms: u64,
    #[serde(default = "BridgeConfig::default_poll_ms")]
    pub poll_ms: u64,
}

impl BridgeConfig{
    fn default_device() -> PathBuf {
        PathBuf::from(DEVICE_PATH)
    }
    fn default_history() -> PathBuf {
        PathBuf::from(HISTORY_PATH)
    }
    fn default_state() -> PathBuf {
        PathBuf::from(STATE_PATH)
    }
    fn default_attempts() -> u32 {
        MAX_ATTEMPTS
    }
    fn default_backoff_ms() -> u64 {
        RETRY_BACKOFF.as_millis() as u64
    }
    fn default_grace_ms() -> u64 {
        RESPONSE_GRACE.as_millis() as u64
    }
    fn default_pre_read_ms() -> u64 {
        PRE_READ_DELAY.as_millis() as u64
    }
    fn default_poll_ms() -> u64 {
        POLL_TIMEOUT.as_millis() as u64
    }

    /// Reads the config from `path` if it exists, otherwise returns the defaults
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let txt = fs::read_to_string(path)
            .with_context(|| format!("reading config {}", path.display()))?;
        Self::parse(&txt).with_context(|| format!("parsing config {}", path.display()))
    }

    pub fn parse(txt: &str) -> Result<Self> {
        let mut cfg: BridgeConfig = toml::from_str(txt)?;
        if cfg.attempts == 0 {
            cfg.attempts = Self::default_attempts();
        }
        if cfg.device.as_os_str().is_empty() {
            cfg.device = Self::default_device();
        }
        Ok(cfg)
    }

    pub fn backoff(&self) -> Duration {
        Duration::from_millis(self.backoff_ms)
    }
    pub fn grace(&self) -> Duration {
        Duration::from_millis(self.grace_ms)
    }
    pub fn pre_read(&self) -> Duration {
        Duration::from_millis(self.pre_read_ms)
    }
    pub fn poll(&self) -> Duration {
        Duration::from_millis(self.poll_ms)
    }
}

impl Default for BridgeConfig{
    fn default() -> Self {
        Self{
            device: Self::default_device(),
            history: Self::default_history(),
            state: Self::default_state(),
            attempts: Self::default_attempts(),
            backoff_ms: Self::default_backoff_ms(),
            grace_ms: Self::default_grace_ms(),
            pre_read_ms: Self::default_pre_read_ms(),
            poll_ms: Self::default_poll_ms(),
        }
    }
}
