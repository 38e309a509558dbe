//! # Command Line Interface
//!
//! Flags mirror the config file; a flag that is given overrides the file.

use std::path::PathBuf;

use clap::{ArgAction, Parser};

use crate::config::{Config, OutputMode};
use crate::error::Result;

/// Receive measurement values from a J7-C USB power monitor using BLE
#[derive(Parser, Debug, Default)]
#[command(name = "j7c-monitor", version, about, long_about = None)]
pub struct Args {
    /// Increase output verbosity. Repeat for higher verbosity (max. 5)
    #[arg(short, long, action = ArgAction::Count, conflicts_with = "quiet")]
    pub verbose: u8,

    /// Suppress non-data output messages
    #[arg(short, long)]
    pub quiet: bool,

    /// TOML configuration file
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Target device MAC address. If no address is given the first compatible device found will be used
    #[arg(short, long, value_name = "MAC", help_heading = "Device control")]
    pub device: Option<String>,

    /// Wait for device to appear
    #[arg(short, long, help_heading = "Device control")]
    pub wait: bool,

    /// Wait and reconnect when losing connection
    #[arg(short, long, help_heading = "Device control")]
    pub reconnect: bool,

    /// HCI used for communication [default: hci0]
    #[arg(short = 'H', long, value_name = "HCI", help_heading = "Device control")]
    pub hci: Option<String>,

    /// Time in seconds to scan for devices [default: 2]
    #[arg(short = 'T', long, value_name = "SECONDS", help_heading = "Device control")]
    pub scantime: Option<u64>,

    /// Output type [default: text]
    #[arg(short, long, value_enum, ignore_case = true, help_heading = "Output options")]
    pub mode: Option<OutputMode>,

    /// Output file, device or network address ([tcp|udp]://[host_or_ip]:port) [default: /dev/stdout]
    #[arg(short = 'O', long, value_name = "TARGET", help_heading = "Output options")]
    pub output: Option<String>,

    /// Append output if it is a file
    #[arg(short, long, help_heading = "Output options")]
    pub append: bool,

    /// CSV delimiter [default: ;]
    #[arg(long, value_name = "DELIMITER", help_heading = "Output options for CSV")]
    pub csv_delimiter: Option<String>,

    /// Omit CSV header
    #[arg(long, help_heading = "Output options for CSV")]
    pub csv_no_header: bool,

    /// Use pretty-print for JSON output
    #[arg(long, help_heading = "Output options for JSON")]
    pub json_pretty: bool,

    /// Add address header
    #[arg(long, help_heading = "Output options for RAW")]
    pub raw_header: bool,

    /// Use pretty-print for RAW output
    #[arg(long, help_heading = "Output options for RAW")]
    pub raw_pretty: bool,
}

impl Args {
    /// Diagnostic level 0 (errors only) to 5; 1 when neither flag is given
    pub fn verbosity(&self) -> u8 {
        if self.quiet {
            0
        } else {
            self.verbose.clamp(1, 5)
        }
    }

    /// Load the config file (if any), apply flags and validate the result
    ///
    /// # Errors
    ///
    /// Returns error if the file cannot be loaded or the merged
    /// configuration is invalid
    pub fn to_config(&self) -> Result<Config> {
        let base = match &self.config {
            Some(path) => Config::load(path)?,
            None => Config::default(),
        };
        let config = self.apply(base);
        config.validate()?;
        Ok(config)
    }

    /// Overlay the given flags on `config`
    pub fn apply(&self, mut config: Config) -> Config {
        if let Some(device) = &self.device {
            config.device.address = Some(device.clone());
        }
        config.device.wait |= self.wait;
        config.device.reconnect |= self.reconnect;
        if let Some(hci) = &self.hci {
            config.device.adapter = hci.clone();
        }
        if let Some(scantime) = self.scantime {
            config.device.scan_time_s = scantime;
        }

        if let Some(mode) = self.mode {
            config.output.mode = mode;
        }
        if let Some(output) = &self.output {
            config.output.target = output.clone();
        }
        config.output.append |= self.append;
        if let Some(delimiter) = &self.csv_delimiter {
            config.output.csv.delimiter = delimiter.clone();
        }
        if self.csv_no_header {
            config.output.csv.header = false;
        }
        config.output.json.pretty |= self.json_pretty;
        config.output.raw.header |= self.raw_header;
        config.output.raw.pretty |= self.raw_pretty;

        config
    }
}
