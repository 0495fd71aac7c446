use anyhow::{Context, Result};
use serde::Serialize;
use serde_json::{json, Value};
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::{TcpListener, TcpStream};
use token_series::{LmdbSnapshotStore, SeriesPipeline};

use crate::config::ServerConfig;
use crate::error::RpcError;
use crate::handler::{SeriesQueryHandler, SharedStore};
use crate::protocol::*;

/// JSON-RPC server for token metric series
pub struct RpcServer {
    config: ServerConfig,
    handler: Arc<SeriesQueryHandler>,
}

impl RpcServer {
    /// Create a new RPC server over the configured LMDB store
    pub fn new(config: ServerConfig) -> Result<Self> {
        tracing::info!("Opening snapshot store...");

        config
            .series
            .validate()
            .context("Invalid series configuration")?;

        let store = LmdbSnapshotStore::open_read_only(&config.lmdb_path)
            .context("Failed to open snapshot store")?;

        tracing::info!("✅ Snapshot store opened at {}", config.lmdb_path);

        Ok(Self::with_store(config, Arc::new(store)))
    }

    /// Create a server over any snapshot store
    pub fn with_store(config: ServerConfig, store: SharedStore) -> Self {
        let pipeline = SeriesPipeline::new(store, config.series.clone());
        let handler = Arc::new(SeriesQueryHandler::new(pipeline, config.history_limit));
        Self { config, handler }
    }

    /// Start the server and handle connections
    pub async fn run(&self) -> Result<()> {
        let addr = format!("{}:{}", self.config.host, self.config.port);
        let listener = TcpListener::bind(&addr)
            .await
            .context(format!("Failed to bind to {}", addr))?;

        tracing::info!("✅ Token series JSON-RPC Server listening on {}", addr);
        self.serve(listener).await
    }

    /// Accept connections on an already bound listener
    pub async fn serve(&self, listener: TcpListener) -> Result<()> {
        tracing::info!("Ready to accept connections");

        loop {
            match listener.accept().await {
                Ok((socket, addr)) => {
                    tracing::debug!("New connection from {}", addr);
                    let handler = Arc::clone(&self.handler);

                    tokio::spawn(async move {
                        if let Err(e) = handle_connection(socket, handler).await {
                            tracing::error!("Connection error from {}: {}", addr, e);
                        }
                    });
                }
                Err(e) => {
                    tracing::error!("Failed to accept connection: {}", e);
                }
            }
        }
    }
}

/// Handle a single TCP connection
async fn handle_connection(
    mut socket: TcpStream,
    handler: Arc<SeriesQueryHandler>,
) -> Result<()> {
    let (reader, mut writer) = socket.split();
    let mut reader = BufReader::new(reader);
    let mut line = String::new();

    loop {
        line.clear();
        let bytes_read = reader.read_line(&mut line).await?;

        if bytes_read == 0 {
            // Connection closed
            break;
        }

        if line.trim().is_empty() {
            continue;
        }

        tracing::debug!("Received request: {}", line.trim());

        let response = process_request(&line, &handler).await;

        let response_json = serde_json::to_string(&response)?;
        writer.write_all(response_json.as_bytes()).await?;
        writer.write_all(b"\n").await?;
        writer.flush().await?;

        tracing::debug!("Sent response");
    }

    Ok(())
}

/// Process a JSON-RPC request
async fn process_request(line: &str, handler: &SeriesQueryHandler) -> Value {
    let request: JsonRpcRequest = match serde_json::from_str(line) {
        Ok(req) => req,
        Err(e) => {
            return create_error_response(None, RpcError::ParseError(e.to_string()));
        }
    };

    if request.jsonrpc != "2.0" {
        return create_error_response(
            request.id,
            RpcError::InvalidRequest("JSON-RPC version must be 2.0".to_string()),
        );
    }

    match request.method.as_str() {
        "series.ohlc" => {
            let params: OhlcQueryRequest = match parse_params(request.params) {
                Ok(p) => p,
                Err(e) => return create_error_response(request.id, e),
            };
            respond(request.id, handler.handle_ohlc(params).await)
        }
        "series.latest" => respond(request.id, handler.handle_latest().await),
        "series.history" => {
            // Params are optional for history
            let params = match request.params {
                None | Some(Value::Null) => HistoryRequest::default(),
                Some(params) => match parse_params(Some(params)) {
                    Ok(p) => p,
                    Err(e) => return create_error_response(request.id, e),
                },
            };
            respond(request.id, handler.handle_history(params).await)
        }
        _ => create_error_response(
            request.id,
            RpcError::MethodNotFound(request.method.clone()),
        ),
    }
}

fn parse_params<T: serde::de::DeserializeOwned>(params: Option<Value>) -> Result<T, RpcError> {
    match params {
        Some(params) => serde_json::from_value(params)
            .map_err(|e| RpcError::InvalidParams(format!("Invalid params: {}", e))),
        None => Err(RpcError::InvalidParams("Missing params".to_string())),
    }
}

fn respond<T: Serialize>(id: Option<Value>, result: Result<T, RpcError>) -> Value {
    let result = result.and_then(|value| {
        serde_json::to_value(value)
            .map_err(|e| RpcError::InternalError(format!("Failed to serialize result: {}", e)))
    });

    match result {
        Ok(result) => create_success_response(id, result),
        Err(e) => {
            tracing::warn!("Request failed: {}", e);
            create_error_response(id, e)
        }
    }
}

/// Create a success response
fn create_success_response(id: Option<Value>, result: Value) -> Value {
    json!({
        "jsonrpc": "2.0",
        "id": id,
        "result": result,
    })
}

/// Create an error response
fn create_error_response(id: Option<Value>, error: RpcError) -> Value {
    let mut error_object = json!({
        "code": error.code(),
        "message": error.to_string(),
    });
    if let Some(data) = error.data() {
        error_object["data"] = data;
    }

    json!({
        "jsonrpc": "2.0",
        "id": id,
        "error": error_object,
    })
}
