//! # Configuration Module
//!
//! Handles loading and validating configuration from TOML files.
//!
//! Every field has a default, so an empty file (or no file at all) yields a
//! usable configuration. Command line flags are merged on top in `cli`.

use serde::de::Error;
use serde::Deserialize;
use std::fs;
use std::path::Path;
use std::time::Duration;

use crate::error::{MeterError, Result};
use crate::j7c::protocol::J7C_DEVICE_NAME;

/// Main configuration structure
#[derive(Debug, Deserialize, Clone, Default, PartialEq)]
pub struct Config {
    #[serde(default)]
    pub device: DeviceConfig,

    #[serde(default)]
    pub output: OutputConfig,
}

/// Device discovery and connection configuration
#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct DeviceConfig {
    /// Target MAC address; discovery is used when absent
    #[serde(default)]
    pub address: Option<String>,

    /// Advertised name to match during discovery
    #[serde(default = "default_device_name")]
    pub name: String,

    /// Keep polling until a device shows up
    #[serde(default)]
    pub wait: bool,

    /// Reconnect after the connection is lost
    #[serde(default)]
    pub reconnect: bool,

    /// Bluetooth adapter identifier
    #[serde(default = "default_adapter")]
    pub adapter: String,

    #[serde(default = "default_scan_time_s")]
    pub scan_time_s: u64,

    #[serde(default = "default_retry_interval_ms")]
    pub retry_interval_ms: u64,
}

/// Output configuration
#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct OutputConfig {
    #[serde(default)]
    pub mode: OutputMode,

    /// File path, `-`, `/dev/stdout`, `tcp://host:port` or `udp://host:port`
    #[serde(default = "default_target")]
    pub target: String,

    /// Append to an existing file instead of truncating it
    #[serde(default)]
    pub append: bool,

    #[serde(default)]
    pub csv: CsvOptions,

    #[serde(default)]
    pub json: JsonOptions,

    #[serde(default)]
    pub raw: RawOptions,
}

/// Output encodings
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum OutputMode {
    /// Human readable block per sample
    #[default]
    Text,
    /// One delimited record per sample
    Csv,
    /// One JSON object per sample
    Json,
    /// Hex dump of the raw frame
    Raw,
    /// InfluxDB line protocol (not available yet)
    #[value(name = "influxdb")]
    InfluxDb,
}

/// Delimited output options
#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct CsvOptions {
    #[serde(default = "default_csv_delimiter")]
    pub delimiter: String,

    /// Emit the column header line before the first record
    #[serde(default = "default_csv_header")]
    pub header: bool,
}

/// JSON output options
#[derive(Debug, Deserialize, Clone, Default, PartialEq)]
pub struct JsonOptions {
    #[serde(default)]
    pub pretty: bool,
}

/// Raw output options
#[derive(Debug, Deserialize, Clone, Default, PartialEq)]
pub struct RawOptions {
    /// Emit a byte offset line before the first frame
    #[serde(default)]
    pub header: bool,

    /// Separate bytes with spaces
    #[serde(default)]
    pub pretty: bool,
}

// Default value functions
fn default_device_name() -> String { J7C_DEVICE_NAME.to_string() }
fn default_adapter() -> String { "hci0".to_string() }
fn default_scan_time_s() -> u64 { 2 }
fn default_retry_interval_ms() -> u64 { 1000 }

fn default_target() -> String { "/dev/stdout".to_string() }
fn default_csv_delimiter() -> String { ";".to_string() }
fn default_csv_header() -> bool { true }

impl Default for DeviceConfig {
    fn default() -> Self {
        Self {
            address: None,
            name: default_device_name(),
            wait: false,
            reconnect: false,
            adapter: default_adapter(),
            scan_time_s: default_scan_time_s(),
            retry_interval_ms: default_retry_interval_ms(),
        }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            mode: OutputMode::default(),
            target: default_target(),
            append: false,
            csv: CsvOptions::default(),
            json: JsonOptions::default(),
            raw: RawOptions::default(),
        }
    }
}

impl Default for CsvOptions {
    fn default() -> Self {
        Self {
            delimiter: default_csv_delimiter(),
            header: default_csv_header(),
        }
    }
}

impl DeviceConfig {
    /// How long one discovery scan runs
    pub fn scan_window(&self) -> Duration {
        Duration::from_secs(self.scan_time_s)
    }

    /// Pause between discovery / connection attempts
    pub fn retry_interval(&self) -> Duration {
        Duration::from_millis(self.retry_interval_ms)
    }
}

/// Check for a colon separated 6-byte MAC address
fn is_mac_address(address: &str) -> bool {
    let parts: Vec<&str> = address.split(':').collect();
    parts.len() == 6
        && parts
            .iter()
            .all(|p| p.len() == 2 && p.chars().all(|c| c.is_ascii_hexdigit()))
}

impl Config {
    /// Load configuration from a TOML file
    ///
    /// # Arguments
    ///
    /// * `path` - Path to the configuration file
    ///
    /// # Errors
    ///
    /// Returns error if:
    /// - File cannot be read
    /// - TOML parsing fails
    /// - Validation fails
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use j7c_monitor::config::Config;
    ///
    /// let config = Config::load("config/default.toml")?;
    /// # Ok::<(), Box<dyn std::error::Error>>(())
    /// ```
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let contents = fs::read_to_string(path)?;
        let config: Config = toml::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate configuration values
    ///
    /// # Errors
    ///
    /// - `Config` if any value is out of range
    /// - `NotImplemented` if an output mode without an encoder is selected
    pub fn validate(&self) -> Result<()> {
        if self.output.mode == OutputMode::InfluxDb {
            return Err(MeterError::NotImplemented("InfluxDB output".to_string()));
        }

        if let Some(address) = &self.device.address {
            if !is_mac_address(address) {
                return Err(MeterError::Config(toml::de::Error::custom(format!(
                    "device address '{}' is not a MAC address (AA:BB:CC:DD:EE:FF)",
                    address
                ))));
            }
        }

        if self.device.name.is_empty() {
            return Err(MeterError::Config(
                toml::de::Error::custom("device name cannot be empty")
            ));
        }

        if self.device.adapter.is_empty() {
            return Err(MeterError::Config(
                toml::de::Error::custom("adapter cannot be empty")
            ));
        }

        if self.device.scan_time_s == 0 || self.device.scan_time_s > 300 {
            return Err(MeterError::Config(
                toml::de::Error::custom("scan_time_s must be between 1 and 300")
            ));
        }

        if self.device.retry_interval_ms == 0 || self.device.retry_interval_ms > 60000 {
            return Err(MeterError::Config(
                toml::de::Error::custom("retry_interval_ms must be between 1 and 60000")
            ));
        }

        if self.output.target.is_empty() {
            return Err(MeterError::Config(
                toml::de::Error::custom("output target cannot be empty")
            ));
        }

        if self.output.csv.delimiter.is_empty() {
            return Err(MeterError::Config(
                toml::de::Error::custom("csv delimiter cannot be empty")
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();

        assert!(config.validate().is_ok());
        assert_eq!(config.device.name, "UC96_BLE");
        assert_eq!(config.device.adapter, "hci0");
        assert_eq!(config.device.scan_window(), Duration::from_secs(2));
        assert_eq!(config.device.retry_interval(), Duration::from_secs(1));
        assert_eq!(config.output.mode, OutputMode::Text);
        assert_eq!(config.output.target, "/dev/stdout");
        assert_eq!(config.output.csv.delimiter, ";");
        assert!(config.output.csv.header);
        assert!(!config.output.raw.header);
    }

    #[test]
    fn test_load_config_from_file() {
        use std::io::Write;
        use tempfile::NamedTempFile;

        let toml_content = r#"
[device]
address = "AA:BB:CC:DD:EE:FF"
reconnect = true

[output]
mode = "csv"
target = "/tmp/j7c.csv"

[output.csv]
delimiter = ","
header = false
"#;

        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file.write_all(toml_content.as_bytes()).unwrap();
        temp_file.flush().unwrap();

        let config = Config::load(temp_file.path()).unwrap();
        assert_eq!(config.device.address.as_deref(), Some("AA:BB:CC:DD:EE:FF"));
        assert!(config.device.reconnect);
        assert!(!config.device.wait);
        assert_eq!(config.output.mode, OutputMode::Csv);
        assert_eq!(config.output.csv.delimiter, ",");
        assert!(!config.output.csv.header);
        assert!(!config.output.json.pretty);
    }

    #[test]
    fn test_shipped_default_file_matches_defaults() {
        let path = concat!(env!("CARGO_MANIFEST_DIR"), "/config/default.toml");
        let config = Config::load(path).unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_load_empty_file_uses_defaults() {
        let temp_file = tempfile::NamedTempFile::new().unwrap();
        let config = Config::load(temp_file.path()).unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_load_missing_file() {
        let result = Config::load("/nonexistent/j7c-monitor.toml");
        assert!(matches!(result, Err(MeterError::Io(_))));
    }

    #[test]
    fn test_load_unknown_mode() {
        let result: std::result::Result<Config, _> = toml::from_str("[output]\nmode = \"xml\"\n");
        assert!(result.is_err());
    }

    #[test]
    fn test_influxdb_is_not_implemented() {
        let mut config = Config::default();
        config.output.mode = OutputMode::InfluxDb;

        match config.validate() {
            Err(MeterError::NotImplemented(what)) => assert!(what.contains("InfluxDB")),
            other => panic!("Expected NotImplemented, got: {:?}", other),
        }
    }

    #[test]
    fn test_influxdb_parses_from_toml() {
        let config: Config = toml::from_str("[output]\nmode = \"influxdb\"\n").unwrap();
        assert_eq!(config.output.mode, OutputMode::InfluxDb);
    }

    #[test]
    fn test_invalid_address() {
        let mut config = Config::default();
        config.device.address = Some("AA:BB:CC".to_string());
        assert!(matches!(config.validate(), Err(MeterError::Config(_))));

        config.device.address = Some("aa:bb:cc:dd:ee:fg".to_string());
        assert!(config.validate().is_err());

        config.device.address = Some("aa:bb:cc:dd:ee:ff".to_string());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_empty_device_name() {
        let mut config = Config::default();
        config.device.name = String::new();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_empty_adapter() {
        let mut config = Config::default();
        config.device.adapter = String::new();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_scan_time_zero() {
        let mut config = Config::default();
        config.device.scan_time_s = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_scan_time_too_high() {
        let mut config = Config::default();
        config.device.scan_time_s = 301;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_retry_interval_zero() {
        let mut config = Config::default();
        config.device.retry_interval_ms = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_retry_interval_too_high() {
        let mut config = Config::default();
        config.device.retry_interval_ms = 60001;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_empty_target() {
        let mut config = Config::default();
        config.output.target = String::new();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_empty_delimiter() {
        let mut config = Config::default();
        config.output.csv.delimiter = String::new();
        assert!(config.validate().is_err());
    }
}
