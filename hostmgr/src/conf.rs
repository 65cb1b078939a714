//! The config for the host manager
use std::path::{Path, PathBuf};

/// Helps serde default the pod hold timeout to 3 minutes
fn default_hold_timeout() -> u64 {
    180
}

/// Helps serde default the lease timeout to 5 minutes
fn default_placing_timeout() -> u64 {
    300
}

/// Helps serde default a value to false
fn default_false() -> bool {
    false
}

/// Helps serde default the sweep interval to 10 seconds
fn default_sweep_interval() -> u64 {
    10
}

/// Convert seconds to a duration capping anything too large to represent
///
/// # Arguments
///
/// * `secs` - The number of seconds to convert
fn saturating_seconds(secs: u64) -> chrono::Duration {
    i64::try_from(secs)
        .ok()
        .and_then(chrono::Duration::try_seconds)
        .unwrap_or(chrono::Duration::MAX)
}

/// The settings for the host cache
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct HostCacheConf {
    /// How long in seconds a host stays held for a pod
    #[serde(default = "default_hold_timeout")]
    pub hold_timeout: u64,
    /// How long in seconds a lease may stay outstanding before it can be reclaimed
    #[serde(default = "default_placing_timeout")]
    pub placing_timeout: u64,
    /// Whether hosts with gpus should only match filters that request gpus
    #[serde(default = "default_false")]
    pub exclusive_gpu: bool,
}

impl Default for HostCacheConf {
    fn default() -> Self {
        HostCacheConf {
            hold_timeout: default_hold_timeout(),
            placing_timeout: default_placing_timeout(),
            exclusive_gpu: false,
        }
    }
}

impl HostCacheConf {
    /// How long a host stays held for a pod
    #[must_use]
    pub fn hold_timeout(&self) -> chrono::Duration {
        saturating_seconds(self.hold_timeout)
    }

    /// How long a lease may stay outstanding
    #[must_use]
    pub fn placing_timeout(&self) -> chrono::Duration {
        saturating_seconds(self.placing_timeout)
    }
}

/// The log level to set
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Copy, Default)]
pub enum LogLevel {
    /// Do not log any info
    Off,
    /// Log at the error level
    Error,
    /// Log at the warning level
    Warn,
    /// Log at the info level
    #[default]
    Info,
    /// Log at the debug level
    Debug,
    /// Log at the tracing level
    Trace,
}

impl LogLevel {
    /// Cast this log level to a tracing filter
    #[must_use]
    pub fn to_filter(&self) -> tracing_subscriber::filter::LevelFilter {
        match self {
            LogLevel::Off => tracing_subscriber::filter::LevelFilter::OFF,
            LogLevel::Error => tracing_subscriber::filter::LevelFilter::ERROR,
            LogLevel::Warn => tracing_subscriber::filter::LevelFilter::WARN,
            LogLevel::Info => tracing_subscriber::filter::LevelFilter::INFO,
            LogLevel::Debug => tracing_subscriber::filter::LevelFilter::DEBUG,
            LogLevel::Trace => tracing_subscriber::filter::LevelFilter::TRACE,
        }
    }
}

impl std::fmt::Display for LogLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "{self:?}")
    }
}

/// The settings for logging to stdout/stderr
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Default)]
pub struct Tracing {
    /// The log level to use for stdout/stderr
    #[serde(default)]
    pub level: LogLevel,
}

/// The config for the host manager
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Conf {
    /// The settings for the host cache
    #[serde(default)]
    pub cache: HostCacheConf,
    /// The settings for tracing
    #[serde(default)]
    pub tracing: Tracing,
    /// How many seconds to wait between expiry sweeps
    #[serde(default = "default_sweep_interval")]
    pub sweep_interval: u64,
    /// The path to load our host inventory from
    #[serde(default)]
    pub inventory: Option<PathBuf>,
}

impl Default for Conf {
    fn default() -> Self {
        Conf {
            cache: HostCacheConf::default(),
            tracing: Tracing::default(),
            sweep_interval: default_sweep_interval(),
            inventory: None,
        }
    }
}

impl Conf {
    /// Creates a new [Conf] object
    ///
    /// # Arguments
    ///
    /// * `path` - The path to use when reading the config file
    pub fn new<P: AsRef<Path>>(path: P) -> Result<Self, config::ConfigError> {
        config::Config::builder()
            // load from a file first
            .add_source(config::File::from(path.as_ref()).format(config::FileFormat::Yaml))
            // then overlay any environment args ontop
            .add_source(
                config::Environment::with_prefix("hostmgr")
                    .prefix_separator("__")
                    .separator("__"),
            )
            .build()?
            .try_deserialize()
    }

    /// Creates a new [Conf] object from a yaml string
    ///
    /// # Arguments
    ///
    /// * `raw` - The yaml to parse
    pub fn from_yaml(raw: &str) -> Result<Self, config::ConfigError> {
        config::Config::builder()
            .add_source(config::File::from_str(raw, config::FileFormat::Yaml))
            .build()?
            .try_deserialize()
    }

    /// How long to wait between expiry sweeps
    #[must_use]
    pub fn sweep_interval(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.sweep_interval.max(1))
    }
}
