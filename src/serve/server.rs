// HTTP surface for a configured agent executor
use std::sync::{Arc, Mutex};

use anyhow::Error;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::Json;
use axum::routing::{get, post};
use axum::Router;
use log::{error, info};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tokio::net::TcpListener;
use tower_http::cors::CorsLayer;

use crate::agents::AgentExecutor;

#[derive(Debug, Deserialize)]
struct InvokeRequest {
    input: String,
}

#[derive(Debug, Serialize)]
struct InvokeResponse {
    output: String,
}

struct ServerState {
    executor: AgentExecutor,
}

// Exposes one executor over HTTP: GET /health, POST /invoke. When the
// executor carries a memory, consecutive /invoke calls share one
// conversation.
pub struct AgentServer {
    address: String,
    executor: AgentExecutor,
    server_handle: Arc<Mutex<Option<tokio::task::JoinHandle<()>>>>,
}

impl AgentServer {
    pub fn new(executor: AgentExecutor) -> Self {
        Self {
            address: "127.0.0.1:6000".to_string(),
            executor,
            server_handle: Arc::new(Mutex::new(None)),
        }
    }

    pub fn with_address(mut self, address: impl Into<String>) -> Self {
        self.address = address.into();
        self
    }

    /// Router over the executor, also usable for embedding in a larger app
    pub fn router(&self) -> Router {
        let state = Arc::new(ServerState {
            executor: self.executor.clone(),
        });

        Router::new()
            .route("/health", get(health_handler))
            .route("/invoke", post(invoke_handler))
            .layer(CorsLayer::permissive())
            .with_state(state)
    }

    /// Bind the address and serve in a background task
    pub async fn start(&self) -> Result<(), Error> {
        let listener = TcpListener::bind(&self.address).await?;
        info!("Agent server listening on {}", self.address);

        let router = self.router();
        let handle = tokio::spawn(async move {
            if let Err(e) = axum::serve(listener, router).await {
                error!("Agent server stopped: {}", e);
            }
        });

        let mut server_handle = self
            .server_handle
            .lock()
            .map_err(|_| Error::msg("Server handle lock poisoned"))?;
        *server_handle = Some(handle);
        Ok(())
    }

    /// Abort the serve task if one is running
    pub fn stop(&self) {
        if let Ok(mut server_handle) = self.server_handle.lock() {
            if let Some(handle) = server_handle.take() {
                handle.abort();
                info!("Agent server stopped");
            }
        }
    }
}

#[axum::debug_handler]
async fn health_handler() -> &'static str {
    "ok"
}

#[axum::debug_handler]
async fn invoke_handler(
    State(state): State<Arc<ServerState>>,
    Json(payload): Json<InvokeRequest>,
) -> Result<Json<InvokeResponse>, (StatusCode, Json<Value>)> {
    match state.executor.run(&payload.input).await {
        Ok(output) => Ok(Json(InvokeResponse { output })),
        Err(e) => {
            error!("Agent invocation failed: {}", e);
            Err((
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "error": e.to_string() })),
            ))
        }
    }
}
