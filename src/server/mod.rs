//! HTTP server module
//!
//! Accept loop and per-request dispatch: `POST /upload` goes to the upload
//! handler, `GET`/`HEAD` to the static root, everything else is a 405.
//! Request tasks share only immutable state (config, the store adapter).

use crate::config::Config;
use crate::metrics::{self, server::MetricsServer};
use crate::router::{Route, RouterError};
use crate::static_files::StaticFiles;
use crate::store::ObjectStore;
use crate::upload::{UploadHandler, UploadResponse};
use bytes::Bytes;
use http_body_util::{BodyExt, Full, LengthLimitError, Limited};
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper::{Method, Request, Response, StatusCode};
use hyper_util::rt::TokioIo;
use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::Arc;
use thiserror::Error;
use tokio::net::TcpListener;
use tokio::sync::oneshot;
use tracing::info;

/// Server errors
#[derive(Error, Debug)]
pub enum ServerError {
    #[error("Failed to bind to address: {0}")]
    BindError(String),

    #[error("Server error: {0}")]
    RuntimeError(String),
}

/// Immutable per-process state shared by all request tasks
struct AppState {
    upload: UploadHandler,
    statics: StaticFiles,
    max_upload_bytes: usize,
}

/// HTTP Server
pub struct Server {
    config: Config,
    addr: SocketAddr,
    state: Arc<AppState>,
    shutdown_tx: Option<oneshot::Sender<()>>,
    server_handle: Option<tokio::task::JoinHandle<()>>,
}

impl Server {
    /// Create a new server instance
    pub fn new(config: Config, store: Arc<dyn ObjectStore>) -> Result<Self, ServerError> {
        let addr: SocketAddr = config
            .server
            .address
            .parse()
            .map_err(|e| ServerError::BindError(format!("{}", e)))?;

        let state = Arc::new(AppState {
            upload: UploadHandler::new(store, config.server.max_upload_bytes),
            statics: StaticFiles::new(config.server.static_dir.clone()),
            max_upload_bytes: config.server.max_upload_bytes,
        });

        Ok(Self {
            config,
            addr,
            state,
            shutdown_tx: None,
            server_handle: None,
        })
    }

    /// Start the server in the background.
    ///
    /// Returns the actual bound address (useful when binding port 0).
    pub async fn start(&mut self) -> Result<SocketAddr, ServerError> {
        let listener = TcpListener::bind(self.addr)
            .await
            .map_err(|e| ServerError::BindError(e.to_string()))?;
        let addr = listener
            .local_addr()
            .map_err(|e| ServerError::BindError(e.to_string()))?;

        let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();
        self.shutdown_tx = Some(shutdown_tx);

        let state = self.state.clone();
        let handle = tokio::spawn(async move {
            run_server(listener, state, shutdown_rx).await;
        });
        self.server_handle = Some(handle);

        info!("Listening on {}", addr);
        Ok(addr)
    }

    /// Stop a server started with [`Server::start`]
    pub async fn shutdown(&mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
        if let Some(handle) = self.server_handle.take() {
            let _ = handle.await;
        }
    }

    /// Run the server until ctrl-c
    pub async fn run(mut self) -> Result<(), ServerError> {
        let mut metrics_server = if self.config.metrics.enabled {
            let mut server = MetricsServer::new(format!("0.0.0.0:{}", self.config.metrics.port));
            let addr = server
                .start()
                .await
                .map_err(|e| ServerError::BindError(e.to_string()))?;
            info!("Metrics server listening on {}", addr);
            Some(server)
        } else {
            None
        };

        self.start().await?;

        tokio::signal::ctrl_c()
            .await
            .map_err(|e| ServerError::RuntimeError(e.to_string()))?;

        info!("Shutting down server");
        self.shutdown().await;
        if let Some(ref mut metrics_server) = metrics_server {
            metrics_server.shutdown().await;
        }
        Ok(())
    }
}

/// Accept loop
async fn run_server(
    listener: TcpListener,
    state: Arc<AppState>,
    mut shutdown_rx: oneshot::Receiver<()>,
) {
    loop {
        tokio::select! {
            _ = &mut shutdown_rx => {
                break;
            }
            result = listener.accept() => {
                match result {
                    Ok((stream, _)) => {
                        let io = TokioIo::new(stream);
                        let state = state.clone();
                        tokio::spawn(async move {
                            let service = service_fn(move |req| {
                                let state = state.clone();
                                async move {
                                    Ok::<_, Infallible>(handle_request(state, req).await)
                                }
                            });
                            let _ = http1::Builder::new()
                                .serve_connection(io, service)
                                .await;
                        });
                    }
                    Err(_) => continue,
                }
            }
        }
    }
}

/// Dispatch one request
async fn handle_request(
    state: Arc<AppState>,
    req: Request<hyper::body::Incoming>,
) -> Response<Full<Bytes>> {
    let method = req.method().clone();
    let path = req.uri().path().to_string();

    let route = match Route::parse(method.as_str(), &path) {
        Ok(route) => route,
        Err(RouterError::MethodNotAllowed(detail)) => {
            tracing::info!(method = %method, path = %path, "Method not allowed");
            metrics::record_http_request("none", StatusCode::METHOD_NOT_ALLOWED.as_u16());
            return json_response(
                StatusCode::METHOD_NOT_ALLOWED,
                format!("{{\"message\":\"{}\"}}", detail),
            );
        }
    };

    let response = match &route {
        Route::Upload => upload_response(&state, req).await,
        Route::Static { path } => state.statics.serve(path, method != Method::HEAD).await,
    };

    metrics::record_http_request(route.label(), response.status().as_u16());
    response
}

/// Collect the upload body and run it through the handler
async fn upload_response(
    state: &AppState,
    req: Request<hyper::body::Incoming>,
) -> Response<Full<Bytes>> {
    let content_type = req
        .headers()
        .get(hyper::header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(|v| v.to_string());

    // A declared length over the cap is rejected before reading any frame
    let declared_length = req
        .headers()
        .get(hyper::header::CONTENT_LENGTH)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.parse::<usize>().ok());
    if let Some(length) = declared_length {
        if length > state.max_upload_bytes {
            tracing::info!(
                declared = length,
                limit = state.max_upload_bytes,
                "Rejected oversized upload by declared length"
            );
            metrics::record_error("payload_too_large");
            let outcome = UploadResponse::too_large(state.max_upload_bytes);
            return json_response(outcome.status, outcome.body);
        }
    }

    // The cap also bounds what gets buffered; Limited stops collection the
    // moment the body grows past it
    let body = match Limited::new(req.into_body(), state.max_upload_bytes)
        .collect()
        .await
    {
        Ok(collected) => collected.to_bytes(),
        Err(e) if e.is::<LengthLimitError>() => {
            tracing::info!(
                limit = state.max_upload_bytes,
                "Rejected oversized upload mid-body"
            );
            metrics::record_error("payload_too_large");
            let outcome = UploadResponse::too_large(state.max_upload_bytes);
            return json_response(outcome.status, outcome.body);
        }
        Err(e) => {
            tracing::info!(error = %e, "Failed to read upload body");
            return json_response(
                StatusCode::BAD_REQUEST,
                r#"{"message":"Invalid upload request","error":{"code":"bad_body","message":"failed to read request body"}}"#.into(),
            );
        }
    };

    let outcome = state.upload.handle(content_type.as_deref(), body).await;
    json_response(outcome.status, outcome.body)
}

fn json_response(status: StatusCode, body: String) -> Response<Full<Bytes>> {
    // Static header set; construction cannot fail
    Response::builder()
        .status(status)
        .header("Content-Type", "application/json")
        .body(Full::new(Bytes::from(body)))
        .unwrap()
}
