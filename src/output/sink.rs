//! # Output Sinks
//!
//! Destinations for formatted lines. A target string selects the sink:
//! - `-` or `/dev/stdout`: standard output
//! - `tcp://host:port`: one TCP stream, lines newline terminated
//! - `udp://host:port`: one datagram per line
//! - anything else: a file, truncated once on open unless appending

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tokio::fs::OpenOptions;
use tokio::io::{AsyncWrite, AsyncWriteExt, BufWriter};
use tokio::net::{TcpStream, UdpSocket};
use tracing::{debug, info, trace};

use crate::error::Result;

/// Ordered line sink
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait OutputSink: Send {
    /// Write every line, newline terminated, before returning
    async fn write_lines(&mut self, lines: &[String]) -> Result<()>;
}

/// Sink over any async byte stream
pub struct StreamSink {
    writer: Box<dyn AsyncWrite + Send + Unpin>,
    /// Echo written lines to the trace log (set for non-stdout targets)
    echo: bool,
}

impl std::fmt::Debug for StreamSink {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StreamSink")
            .field("echo", &self.echo)
            .finish_non_exhaustive()
    }
}

impl StreamSink {
    pub fn new(writer: Box<dyn AsyncWrite + Send + Unpin>, echo: bool) -> Self {
        Self { writer, echo }
    }
}

#[async_trait]
impl OutputSink for StreamSink {
    async fn write_lines(&mut self, lines: &[String]) -> Result<()> {
        for line in lines {
            self.writer.write_all(line.as_bytes()).await?;
            self.writer.write_all(b"\n").await?;
            if self.echo {
                trace!("{}", line);
            }
        }
        self.writer.flush().await?;
        Ok(())
    }
}

/// Sink sending each line as its own UDP datagram
#[derive(Debug)]
pub struct UdpSink {
    socket: UdpSocket,
}

#[async_trait]
impl OutputSink for UdpSink {
    async fn write_lines(&mut self, lines: &[String]) -> Result<()> {
        for line in lines {
            self.socket.send(format!("{}\n", line).as_bytes()).await?;
            trace!("{}", line);
        }
        Ok(())
    }
}

/// In-memory sink; clones share the same buffer
#[derive(Debug, Clone, Default)]
pub struct MemorySink {
    lines: Arc<Mutex<Vec<String>>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of every line written so far
    pub fn lines(&self) -> Vec<String> {
        self.lines
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }
}

#[async_trait]
impl OutputSink for MemorySink {
    async fn write_lines(&mut self, lines: &[String]) -> Result<()> {
        self.lines
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .extend_from_slice(lines);
        Ok(())
    }
}

/// Open the sink named by `target`
///
/// # Arguments
///
/// * `target` - Path or URL, see module docs
/// * `append` - Keep existing file contents (files only)
///
/// # Errors
///
/// Returns `Io` if the file cannot be opened or the remote end is unreachable
///
/// # Examples
///
/// ```no_run
/// use j7c_monitor::output::sink::{open_sink, OutputSink};
///
/// #[tokio::main]
/// async fn main() -> anyhow::Result<()> {
///     let mut sink = open_sink("capture.csv", true).await?;
///     sink.write_lines(&["hello".to_string()]).await?;
///     Ok(())
/// }
/// ```
pub async fn open_sink(target: &str, append: bool) -> Result<Box<dyn OutputSink>> {
    if target == "-" || target == "/dev/stdout" {
        debug!("Writing output to stdout");
        return Ok(Box::new(StreamSink::new(Box::new(tokio::io::stdout()), false)));
    }

    if let Some(address) = target.strip_prefix("tcp://") {
        let stream = TcpStream::connect(address).await?;
        stream.set_nodelay(true)?;
        info!("Streaming output to tcp://{}", address);
        return Ok(Box::new(StreamSink::new(Box::new(stream), true)));
    }

    if let Some(address) = target.strip_prefix("udp://") {
        let socket = UdpSocket::bind("0.0.0.0:0").await?;
        socket.connect(address).await?;
        info!("Sending output to udp://{}", address);
        return Ok(Box::new(UdpSink { socket }));
    }

    if append {
        debug!("Appending output to {}", target);
    } else {
        debug!("Overwriting output file {}", target);
    }

    let file = OpenOptions::new()
        .create(true)
        .write(true)
        .append(append)
        .truncate(!append)
        .open(target)
        .await?;

    Ok(Box::new(StreamSink::new(Box::new(BufWriter::new(file)), true)))
}
