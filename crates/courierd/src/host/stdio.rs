//! Line-delimited JSON host.
//!
//! Each input line is a request packet; each output line is a response or
//! event packet. The host announces itself with a `started` event before it
//! reads anything.

use std::fmt;
use std::io::{self, BufRead, BufReader};
use std::sync::Arc;

use courier_config::TransportMode;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use tracing::{debug, info, warn};

use super::worker::Worker;
use super::{
    Flow, HOST_TARGET, HostReleaseError, HostStartError, RELEASE_GRACE, TransportHost,
};
use crate::cancellation::CancellationSignal;
use crate::composition::ServiceComposition;
use crate::composition::builtins::{CHECK_READINESS, STOP_SERVER};
use crate::settings::RuntimeSettings;
use crate::streams::{ConsoleInput, ConsoleStreams, SharedWriter};

const WORKER_NAME: &str = "courier-stdio";
const CHECK_ALIVE: &str = "/checkalivestatus";

/// Host speaking line-delimited JSON over the console.
pub struct StdioHost {
    input: Option<ConsoleInput>,
    output: SharedWriter,
    settings: Arc<RuntimeSettings>,
    composition: Arc<ServiceComposition>,
    cancellation: CancellationSignal,
    worker: Option<Worker>,
}

impl StdioHost {
    /// Takes ownership of `streams` and prepares to serve `composition`.
    #[must_use]
    pub fn new(
        streams: ConsoleStreams,
        settings: Arc<RuntimeSettings>,
        composition: Arc<ServiceComposition>,
        cancellation: CancellationSignal,
    ) -> Self {
        let (input, output) = streams.into_parts();
        Self {
            input: Some(input),
            output,
            settings,
            composition,
            cancellation,
            worker: None,
        }
    }
}

impl fmt::Debug for StdioHost {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("StdioHost")
            .field("started", &self.input.is_none())
            .field("settings", &self.settings)
            .field("modules", &self.composition.len())
            .field("worker", &self.worker)
            .finish_non_exhaustive()
    }
}

impl TransportHost for StdioHost {
    fn mode(&self) -> TransportMode {
        TransportMode::Stdio
    }

    fn start(&mut self) -> Result<(), HostStartError> {
        let input = self.input.take().ok_or(HostStartError::AlreadyStarted)?;
        let mut session = Session {
            output: self.output.clone(),
            settings: Arc::clone(&self.settings),
            composition: Arc::clone(&self.composition),
            cancellation: self.cancellation.clone(),
            seq: 0,
        };
        session.announce().map_err(HostStartError::output)?;
        let worker = Worker::spawn(WORKER_NAME, &self.cancellation, move || {
            session.serve(BufReader::new(input));
        })?;
        self.worker = Some(worker);
        Ok(())
    }

    fn release(self) -> Result<(), HostReleaseError> {
        let flushed = self.output.flush().map_err(|source| HostReleaseError::Output {
            source: Arc::new(source),
        });
        let joined = self
            .worker
            .map_or(Ok(()), |worker| worker.release(RELEASE_GRACE));
        flushed.and(joined)
    }
}

#[derive(Debug, Deserialize)]
struct RequestPacket {
    #[serde(rename = "Seq", default)]
    seq: u64,
    #[serde(rename = "Command")]
    command: String,
}

#[derive(Debug, Serialize)]
struct ResponsePacket<'a> {
    #[serde(rename = "Type")]
    kind: &'static str,
    #[serde(rename = "Seq")]
    seq: u64,
    #[serde(rename = "Request_seq")]
    request_seq: u64,
    #[serde(rename = "Command")]
    command: &'a str,
    #[serde(rename = "Running")]
    running: bool,
    #[serde(rename = "Success")]
    success: bool,
    #[serde(rename = "Message")]
    message: Option<String>,
    #[serde(rename = "Body")]
    body: Value,
}

#[derive(Debug, Serialize)]
struct EventPacket<'a> {
    #[serde(rename = "Type")]
    kind: &'static str,
    #[serde(rename = "Seq")]
    seq: u64,
    #[serde(rename = "Event")]
    event: &'a str,
    #[serde(rename = "Body")]
    body: Value,
}

struct Session {
    output: SharedWriter,
    settings: Arc<RuntimeSettings>,
    composition: Arc<ServiceComposition>,
    cancellation: CancellationSignal,
    seq: u64,
}

impl Session {
    fn announce(&mut self) -> io::Result<()> {
        let body = json!({
            "IndexOrigin": self.settings.flags().index_origin(),
            "TargetDirectory": self.settings.environment().target_directory().as_str(),
            "Modules": self.composition.len(),
        });
        self.emit_event("started", body)
    }

    fn serve<R: BufRead>(mut self, mut reader: R) {
        let mut buffer = Vec::new();
        while !self.cancellation.is_signaled() {
            buffer.clear();
            match reader.read_until(b'\n', &mut buffer) {
                Ok(0) => break,
                Ok(_) => {}
                Err(error) => {
                    warn!(target: HOST_TARGET, mode = "stdio", error = %error, "console read failed");
                    break;
                }
            }
            // Invalid UTF-8 degrades to a malformed request, not a dead session.
            let line = String::from_utf8_lossy(&buffer);
            if line.trim().is_empty() {
                continue;
            }
            match self.handle_line(&line) {
                Ok(Flow::Continue) => {}
                Ok(Flow::Stop) => break,
                Err(error) => {
                    warn!(target: HOST_TARGET, mode = "stdio", error = %error, "console write failed");
                    break;
                }
            }
        }
        if self.cancellation.signal() {
            info!(target: HOST_TARGET, mode = "stdio", "request loop ended; shutdown requested");
        }
    }

    fn handle_line(&mut self, line: &str) -> io::Result<Flow> {
        let request: RequestPacket = match serde_json::from_str(line) {
            Ok(request) => request,
            Err(error) => {
                self.emit_event("error", json!({ "Message": format!("malformed request: {error}") }))?;
                return Ok(Flow::Continue);
            }
        };

        let composition = Arc::clone(&self.composition);
        let Some(module) = composition.lookup(&request.command) else {
            let message = format!("unknown command '{}'", request.command);
            self.respond(&request, false, Some(message), Value::Null)?;
            return Ok(Flow::Continue);
        };
        debug!(
            target: HOST_TARGET,
            command = %request.command,
            module = module.name(),
            "routing request"
        );

        match request.command.as_str() {
            STOP_SERVER => {
                self.respond_stopping(&request)?;
                Ok(Flow::Stop)
            }
            CHECK_READINESS | CHECK_ALIVE => {
                self.respond(&request, true, None, Value::Bool(true))?;
                Ok(Flow::Continue)
            }
            _ => {
                let body = json!({ "Module": module.name(), "Version": module.version() });
                self.respond(&request, true, None, body)?;
                Ok(Flow::Continue)
            }
        }
    }

    fn respond(
        &mut self,
        request: &RequestPacket,
        success: bool,
        message: Option<String>,
        body: Value,
    ) -> io::Result<()> {
        let packet = ResponsePacket {
            kind: "response",
            seq: self.next_seq(),
            request_seq: request.seq,
            command: &request.command,
            running: true,
            success,
            message,
            body,
        };
        self.write(&packet)
    }

    fn respond_stopping(&mut self, request: &RequestPacket) -> io::Result<()> {
        let packet = ResponsePacket {
            kind: "response",
            seq: self.next_seq(),
            request_seq: request.seq,
            command: &request.command,
            running: false,
            success: true,
            message: None,
            body: Value::Null,
        };
        self.write(&packet)
    }

    fn emit_event(&mut self, event: &str, body: Value) -> io::Result<()> {
        let packet = EventPacket {
            kind: "event",
            seq: self.next_seq(),
            event,
            body,
        };
        self.write(&packet)
    }

    fn write<T: Serialize>(&self, packet: &T) -> io::Result<()> {
        let line = serde_json::to_string(packet).map_err(io::Error::other)?;
        self.output.write_line(&line)
    }

    const fn next_seq(&mut self) -> u64 {
        self.seq += 1;
        self.seq
    }
}
