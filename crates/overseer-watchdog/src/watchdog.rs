//! Stream scan loops.

use std::sync::Arc;

use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncRead, BufReader};
use tokio::process::Child;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use overseer_core::config::{defaults, WatchdogConfig};
use overseer_core::errors::OverseerResult;
use overseer_core::models::{ErrorEvent, Severity, StreamSource};

use crate::callback::EventCallback;
use crate::registry::PatternRegistry;

/// What one scan loop saw before its stream closed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanSummary {
    pub source: StreamSource,
    pub lines: u64,
    pub matches: u64,
    /// Deliveries refused by a closed channel.
    pub undelivered: u64,
    /// Set when the loop stopped on a read error rather than EOF.
    pub read_error: Option<String>,
}

impl ScanSummary {
    fn new(source: StreamSource) -> Self {
        Self {
            source,
            lines: 0,
            matches: 0,
            undelivered: 0,
            read_error: None,
        }
    }
}

#[derive(Debug)]
pub struct Watchdog {
    registry: PatternRegistry,
    callbacks: Vec<EventCallback>,
    max_line_bytes: usize,
}

impl Default for Watchdog {
    fn default() -> Self {
        Self::with_registry(PatternRegistry::empty())
    }
}

impl Watchdog {
    pub fn with_registry(registry: PatternRegistry) -> Self {
        Self {
            registry,
            callbacks: Vec::new(),
            max_line_bytes: defaults::DEFAULT_MAX_LINE_BYTES,
        }
    }

    pub fn from_config(config: &WatchdogConfig) -> OverseerResult<Self> {
        let mut watchdog = Self::with_registry(PatternRegistry::from_config(config)?);
        watchdog.max_line_bytes = config.max_line_bytes.max(1);
        Ok(watchdog)
    }

    pub fn registry(&self) -> &PatternRegistry {
        &self.registry
    }

    /// Append a rule after every existing one.
    pub fn add_pattern(
        &mut self,
        pattern: &str,
        error_type: impl Into<String>,
        severity: Severity,
    ) -> OverseerResult<()> {
        self.registry.add(pattern, error_type, severity)
    }

    pub fn add_callback(&mut self, callback: EventCallback) {
        self.callbacks.push(callback);
    }

    pub fn callback_count(&self) -> usize {
        self.callbacks.len()
    }

    /// Match one line without delivering anything.
    pub fn scan_line(&self, line: &str, source: &StreamSource, stream_line: u64) -> Option<ErrorEvent> {
        self.registry.scan(line, source, stream_line)
    }

    /// Read `reader` to EOF, delivering each match to every callback
    /// before the next line is read.
    pub async fn scan_reader<R>(&self, reader: R, source: StreamSource) -> ScanSummary
    where
        R: AsyncRead + Unpin,
    {
        let mut summary = ScanSummary::new(source);
        let mut reader = BufReader::new(reader);
        let mut buf = Vec::new();

        loop {
            buf.clear();
            match read_line_bounded(&mut reader, &mut buf, self.max_line_bytes).await {
                Ok(0) => break,
                Ok(_) => {}
                Err(e) => {
                    warn!(source = %summary.source, error = %e, "stream read failed");
                    summary.read_error = Some(e.to_string());
                    break;
                }
            }
            summary.lines += 1;

            let text = String::from_utf8_lossy(&buf);
            let line = text.trim_end_matches(['\n', '\r']);

            let Some(event) = self.registry.scan(line, &summary.source, summary.lines) else {
                continue;
            };
            summary.matches += 1;
            debug!(
                source = %summary.source,
                line = summary.lines,
                error_type = %event.error_type,
                severity = event.severity.as_str(),
                "pattern matched"
            );
            for callback in &self.callbacks {
                if !callback.dispatch(&event).await {
                    summary.undelivered += 1;
                }
            }
        }

        debug!(
            source = %summary.source,
            lines = summary.lines,
            matches = summary.matches,
            "stream closed"
        );
        summary
    }

    /// Spawn a dedicated scan loop for one stream.
    pub fn monitor_stream<R>(self: &Arc<Self>, reader: R, source: StreamSource) -> JoinHandle<ScanSummary>
    where
        R: AsyncRead + Unpin + Send + 'static,
    {
        let watchdog = Arc::clone(self);
        tokio::spawn(async move { watchdog.scan_reader(reader, source).await })
    }

    /// Attach to a child's piped stdout and stderr. Streams that were not
    /// piped, or were already taken, are skipped.
    pub fn monitor_child(self: &Arc<Self>, child: &mut Child) -> Vec<JoinHandle<ScanSummary>> {
        let mut handles = Vec::with_capacity(2);
        if let Some(stdout) = child.stdout.take() {
            handles.push(self.monitor_stream(stdout, StreamSource::Stdout));
        }
        if let Some(stderr) = child.stderr.take() {
            handles.push(self.monitor_stream(stderr, StreamSource::Stderr));
        }
        if handles.is_empty() {
            warn!("child has no piped output to monitor");
        }
        handles
    }
}

/// Read through the next newline, keeping at most `max` bytes of it in
/// `buf`. The rest of an overlong line is consumed and dropped. Returns the
/// number of bytes consumed from the stream, 0 at EOF.
async fn read_line_bounded<R>(reader: &mut R, buf: &mut Vec<u8>, max: usize) -> std::io::Result<usize>
where
    R: AsyncBufRead + Unpin,
{
    let mut consumed = 0;
    loop {
        let (used, done) = {
            let available = reader.fill_buf().await?;
            if available.is_empty() {
                return Ok(consumed);
            }
            let (used, done) = match available.iter().position(|&b| b == b'\n') {
                Some(i) => (i + 1, true),
                None => (available.len(), false),
            };
            let room = max.saturating_sub(buf.len());
            buf.extend_from_slice(&available[..used.min(room)]);
            (used, done)
        };
        reader.consume(used);
        consumed += used;
        if done {
            return Ok(consumed);
        }
    }
}
