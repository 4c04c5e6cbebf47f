//! Language Server Protocol host.
//!
//! Serves the lifecycle subset of LSP (`initialize`, `shutdown`, `exit`) and
//! routes document requests to the built-in module that exports the matching
//! capability key. Plugins are never consulted in this mode.

use std::fmt;
use std::io::{self, BufRead, BufReader};
use std::sync::Arc;

use courier_config::TransportMode;
use lsp_types::{
    CompletionOptions, InitializeResult, OneOf, PositionEncodingKind, ServerCapabilities,
    ServerInfo, SignatureHelpOptions, TextDocumentSyncCapability, TextDocumentSyncKind,
};
use serde_json::{Value, json};
use tracing::{debug, info, warn};

use super::framing::{self, FramingError};
use super::jsonrpc::{
    INVALID_REQUEST, IncomingMessage, METHOD_NOT_FOUND, OutgoingResponse, PARSE_ERROR,
};
use super::worker::Worker;
use super::{
    Flow, HOST_TARGET, HostReleaseError, HostStartError, RELEASE_GRACE, TransportHost,
};
use crate::cancellation::CancellationSignal;
use crate::composition::ServiceComposition;
use crate::settings::RuntimeSettings;
use crate::streams::{ConsoleInput, ConsoleStreams, SharedWriter};

const WORKER_NAME: &str = "courier-lsp";

/// LSP methods routed to capability keys.
const METHOD_ROUTES: &[(&str, &str)] = &[
    ("textDocument/definition", "/gotodefinition"),
    ("textDocument/implementation", "/findimplementations"),
    ("textDocument/references", "/findusages"),
    ("workspace/symbol", "/findsymbols"),
    ("textDocument/formatting", "/codeformat"),
    ("textDocument/rangeFormatting", "/formatRange"),
    ("textDocument/onTypeFormatting", "/formatAfterKeystroke"),
    ("textDocument/completion", "/completion"),
    ("textDocument/signatureHelp", "/signatureHelp"),
    ("textDocument/diagnostic", "/diagnostics"),
];

/// Host speaking LSP over the console.
pub struct LspHost {
    input: Option<ConsoleInput>,
    output: SharedWriter,
    settings: Arc<RuntimeSettings>,
    composition: Arc<ServiceComposition>,
    cancellation: CancellationSignal,
    worker: Option<Worker>,
}

impl LspHost {
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

impl fmt::Debug for LspHost {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("LspHost")
            .field("started", &self.input.is_none())
            .field("settings", &self.settings)
            .field("modules", &self.composition.len())
            .field("worker", &self.worker)
            .finish_non_exhaustive()
    }
}

impl TransportHost for LspHost {
    fn mode(&self) -> TransportMode {
        TransportMode::Lsp
    }

    fn start(&mut self) -> Result<(), HostStartError> {
        let input = self.input.take().ok_or(HostStartError::AlreadyStarted)?;
        let session = Session {
            output: self.output.clone(),
            settings: Arc::clone(&self.settings),
            composition: Arc::clone(&self.composition),
            cancellation: self.cancellation.clone(),
            shutdown_requested: false,
        };
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

struct Session {
    output: SharedWriter,
    settings: Arc<RuntimeSettings>,
    composition: Arc<ServiceComposition>,
    cancellation: CancellationSignal,
    shutdown_requested: bool,
}

impl Session {
    fn serve<R: BufRead>(mut self, mut reader: R) {
        while !self.cancellation.is_signaled() {
            let payload = match framing::read_frame(&mut reader) {
                Ok(Some(payload)) => payload,
                Ok(None) => {
                    debug!(target: HOST_TARGET, mode = "lsp", "console input closed");
                    break;
                }
                Err(error) => {
                    log_framing_error(&error);
                    break;
                }
            };
            match self.handle(&payload) {
                Ok(Flow::Continue) => {}
                Ok(Flow::Stop) => break,
                Err(error) => {
                    warn!(target: HOST_TARGET, mode = "lsp", error = %error, "console write failed");
                    break;
                }
            }
        }
        if self.cancellation.signal() {
            info!(
                target: HOST_TARGET,
                mode = "lsp",
                clean = self.shutdown_requested,
                "request loop ended; shutdown requested"
            );
        }
    }

    fn handle(&mut self, payload: &[u8]) -> io::Result<Flow> {
        let message: IncomingMessage = match serde_json::from_slice(payload) {
            Ok(message) => message,
            Err(error) => {
                let response =
                    OutgoingResponse::failure(Value::Null, PARSE_ERROR, error.to_string());
                self.send(&response)?;
                return Ok(Flow::Continue);
            }
        };
        let Some(method) = message.method else {
            // A response to a server-initiated request; none are sent.
            return Ok(Flow::Continue);
        };
        match message.id {
            None => Ok(self.notification(&method)),
            Some(id) => {
                self.request(id, &method)?;
                Ok(Flow::Continue)
            }
        }
    }

    fn notification(&self, method: &str) -> Flow {
        if method == "exit" {
            return Flow::Stop;
        }
        debug!(target: HOST_TARGET, method, "notification ignored");
        Flow::Continue
    }

    fn request(&mut self, id: Value, method: &str) -> io::Result<()> {
        if self.shutdown_requested {
            let response =
                OutgoingResponse::failure(id, INVALID_REQUEST, "server is shutting down");
            return self.send(&response);
        }
        let response = match method {
            "initialize" => {
                let result = serde_json::to_value(self.initialize_result())
                    .map_err(io::Error::other)?;
                OutgoingResponse::success(id, result)
            }
            "shutdown" => {
                self.shutdown_requested = true;
                OutgoingResponse::success(id, Value::Null)
            }
            other => match self.route(other) {
                Some(module) => {
                    debug!(target: HOST_TARGET, method = other, module, "routing request");
                    OutgoingResponse::success(id, Value::Null)
                }
                None => OutgoingResponse::failure(
                    id,
                    METHOD_NOT_FOUND,
                    format!("method '{other}' is not supported"),
                ),
            },
        };
        self.send(&response)
    }

    fn route(&self, method: &str) -> Option<&str> {
        METHOD_ROUTES
            .iter()
            .find(|(candidate, _)| *candidate == method)
            .and_then(|(_, key)| self.composition.lookup(key))
            .map(|module| module.name())
    }

    fn provides(&self, method: &str) -> bool {
        self.route(method).is_some()
    }

    fn initialize_result(&self) -> InitializeResult {
        let capabilities = ServerCapabilities {
            position_encoding: Some(PositionEncodingKind::UTF16),
            text_document_sync: self
                .composition
                .provides("/updatebuffer")
                .then_some(TextDocumentSyncCapability::Kind(TextDocumentSyncKind::FULL)),
            definition_provider: enabled(self.provides("textDocument/definition")),
            references_provider: enabled(self.provides("textDocument/references")),
            workspace_symbol_provider: enabled(self.provides("workspace/symbol")),
            document_formatting_provider: enabled(self.provides("textDocument/formatting")),
            document_range_formatting_provider: enabled(self.provides("textDocument/rangeFormatting")),
            completion_provider: self
                .provides("textDocument/completion")
                .then(CompletionOptions::default),
            signature_help_provider: self
                .provides("textDocument/signatureHelp")
                .then(SignatureHelpOptions::default),
            experimental: Some(json!({
                "indexOrigin": self.settings.flags().index_origin(),
            })),
            ..ServerCapabilities::default()
        };
        InitializeResult {
            capabilities,
            server_info: Some(ServerInfo {
                name: env!("CARGO_PKG_NAME").to_owned(),
                version: Some(env!("CARGO_PKG_VERSION").to_owned()),
            }),
        }
    }

    fn send(&self, response: &OutgoingResponse) -> io::Result<()> {
        let payload = serde_json::to_vec(response).map_err(io::Error::other)?;
        framing::write_frame(&self.output, &payload)
    }
}

fn enabled<T>(provided: bool) -> Option<OneOf<bool, T>> {
    provided.then_some(OneOf::Left(true))
}

fn log_framing_error(error: &FramingError) {
    warn!(target: HOST_TARGET, mode = "lsp", error = %error, "malformed frame; closing transport");
}
