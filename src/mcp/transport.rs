//! Newline-delimited JSON transport.
//!
//! Each message is one JSON-RPC object on a single line:
//!
//! ```text
//! {"jsonrpc":"2.0","id":1,"method":"initialize","params":{...}}\n
//! {"jsonrpc":"2.0","id":1,"result":{...}}\n
//! ```
//!
//! [`LineTransport`] works over any reader/writer pair so the server loop can
//! be driven from memory in tests; [`StdioTransport`] is the stdin/stdout
//! instance. Stdout carries only protocol messages.

use std::fs::{self, File, OpenOptions};
use std::io::{BufRead, BufReader, BufWriter, Stdin, Stdout, Write};
use std::path::{Path, PathBuf};

use chrono::{SecondsFormat, Utc};
use serde_json::{json, Value};

use crate::QaSphereResult;

use super::protocol::{JsonRpcError, JsonRpcRequest, JsonRpcResponse};

/// A line read from the client.
#[derive(Debug)]
pub enum Incoming {
    Request(JsonRpcRequest),
    /// The line could not be decoded. Answered with this error and a null id.
    Malformed(JsonRpcError),
}

/// Appends every protocol message to a JSONL file.
///
/// Entries look like `{"type":"received","timestamp":"...","message":{...}}`.
/// Write failures are logged and otherwise ignored.
#[derive(Debug)]
pub struct TrafficLog {
    path: PathBuf,
    file: File,
}

impl TrafficLog {
    /// Opens (or creates) the log file and records the connection.
    pub fn open(path: impl AsRef<Path>) -> QaSphereResult<Self> {
        let path = path.as_ref().to_path_buf();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        let file = OpenOptions::new().create(true).append(true).open(&path)?;

        let mut log = Self { path, file };
        log.write("connection_info", "message", json!("Traffic log initialized"));
        Ok(log)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn received(&mut self, message: &Value) {
        self.write("received", "message", message.clone());
    }

    pub fn sent(&mut self, message: &Value) {
        self.write("sent", "message", message.clone());
    }

    pub fn error(&mut self, error: &str) {
        self.write("error", "error", json!(error));
    }

    pub fn close(&mut self) {
        self.write("close", "message", json!("Connection closed"));
    }

    fn write(&mut self, kind: &str, field: &str, payload: Value) {
        let mut entry = json!({
            "type": kind,
            "timestamp": Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
        });
        entry[field] = payload;

        let result = writeln!(self.file, "{}", entry).and_then(|_| self.file.flush());
        if let Err(e) = result {
            tracing::warn!(path = %self.path.display(), error = %e, "Failed to write traffic log");
        }
    }
}

/// Line-oriented JSON-RPC transport.
pub struct LineTransport<R, W> {
    reader: R,
    writer: W,
    traffic: Option<TrafficLog>,
}

/// Transport over the process's stdin and stdout.
pub type StdioTransport = LineTransport<BufReader<Stdin>, BufWriter<Stdout>>;

impl StdioTransport {
    pub fn stdio() -> Self {
        LineTransport::new(BufReader::new(std::io::stdin()), BufWriter::new(std::io::stdout()))
    }
}

impl<R: BufRead, W: Write> LineTransport<R, W> {
    pub fn new(reader: R, writer: W) -> Self {
        Self {
            reader,
            writer,
            traffic: None,
        }
    }

    /// Records all traffic to `log`.
    pub fn with_traffic_log(mut self, log: TrafficLog) -> Self {
        self.traffic = Some(log);
        self
    }

    /// Reads the next message. Blank lines are skipped; `None` means EOF.
    pub fn read_message(&mut self) -> QaSphereResult<Option<Incoming>> {
        loop {
            let mut buf = Vec::new();
            if self.reader.read_until(b'\n', &mut buf)? == 0 {
                return Ok(None);
            }

            let line = match String::from_utf8(buf) {
                Ok(line) => line,
                Err(e) => return Ok(Some(self.reject_non_utf8(e))),
            };

            let trimmed = line.trim();
            if trimmed.is_empty() {
                continue;
            }

            return Ok(Some(self.decode(trimmed)));
        }
    }

    fn reject_non_utf8(&mut self, error: std::string::FromUtf8Error) -> Incoming {
        tracing::warn!(error = %error, "Received a line that is not valid UTF-8");
        if let Some(log) = self.traffic.as_mut() {
            log.error(&format!("Parse error: {}", error));
        }
        Incoming::Malformed(JsonRpcError::parse_error().with_data(json!(error.to_string())))
    }

    fn decode(&mut self, line: &str) -> Incoming {
        let value: Value = match serde_json::from_str(line) {
            Ok(value) => value,
            Err(e) => {
                tracing::warn!(error = %e, "Received invalid JSON");
                if let Some(log) = self.traffic.as_mut() {
                    log.error(&format!("Parse error: {}", e));
                }
                return Incoming::Malformed(JsonRpcError::parse_error().with_data(json!(e.to_string())));
            }
        };

        if let Some(log) = self.traffic.as_mut() {
            log.received(&value);
        }

        match serde_json::from_value::<JsonRpcRequest>(value) {
            Ok(request) => {
                tracing::debug!(method = %request.method, id = ?request.id, "Received request");
                Incoming::Request(request)
            }
            Err(e) => {
                tracing::warn!(error = %e, "Received invalid JSON-RPC request");
                Incoming::Malformed(JsonRpcError::invalid_request().with_data(json!(e.to_string())))
            }
        }
    }

    /// Writes a response as one compact line and flushes.
    pub fn write_response(&mut self, response: &JsonRpcResponse) -> QaSphereResult<()> {
        let value = serde_json::to_value(response)?;
        if let Some(log) = self.traffic.as_mut() {
            log.sent(&value);
        }

        writeln!(self.writer, "{}", value)?;
        self.writer.flush()?;

        tracing::debug!(id = ?response.id, is_error = response.is_error(), "Sent response");
        Ok(())
    }

    /// Records the end of the session in the traffic log.
    pub fn close(&mut self) {
        if let Some(log) = self.traffic.as_mut() {
            log.close();
        }
    }

    pub fn writer(&self) -> &W {
        &self.writer
    }
}
