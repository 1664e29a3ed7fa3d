//! Development server implementation.

use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;

use axum::{
    body::Body,
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        State,
    },
    http::{header, StatusCode},
    middleware::map_response,
    response::{IntoResponse, Response},
    routing::get,
    Router,
};
use tower_http::services::ServeDir;

use crate::livereload::{
    client_script, inject_client, ReloadHub, ReloadMessage, LIVERELOAD_PATH,
    LIVERELOAD_SCRIPT_PATH,
};
use crate::watcher::{FileWatcher, WatchEvent, WatchRules};

/// Page opened in the browser when it exists.
const START_PAGE: &str = "src/html/index.html";

/// Configuration for the development server.
#[derive(Debug, Clone)]
pub struct DevServerConfig {
    /// Theme root to serve
    pub root: PathBuf,

    /// Port to listen on. There is no fallback if it is taken.
    pub port: u16,

    /// Host to bind to
    pub host: String,

    /// Open browser on start
    pub open: bool,

    /// How often the watcher polls the filesystem
    pub poll_interval: Duration,
}

impl Default for DevServerConfig {
    fn default() -> Self {
        Self {
            root: PathBuf::from("."),
            port: 3000,
            host: "127.0.0.1".to_string(),
            open: true,
            poll_interval: Duration::from_millis(300),
        }
    }
}

/// Errors that can occur with the server.
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    #[error("Invalid address {0}")]
    InvalidAddress(String),

    #[error("Port {port} is unavailable: {source}")]
    PortUnavailable {
        port: u16,
        #[source]
        source: std::io::Error,
    },

    #[error("File watch error: {0}")]
    WatchError(#[from] notify::Error),

    #[error("Server error: {0}")]
    Serve(std::io::Error),
}

/// Development server.
pub struct DevServer {
    config: DevServerConfig,
}

impl DevServer {
    /// Create a new development server.
    pub fn new(config: DevServerConfig) -> Self {
        Self { config }
    }

    /// Start the development server. Runs until the process is stopped.
    pub async fn start(self) -> Result<(), ServerError> {
        let addr: SocketAddr = format!("{}:{}", self.config.host, self.config.port)
            .parse()
            .map_err(|_| {
                ServerError::InvalidAddress(format!("{}:{}", self.config.host, self.config.port))
            })?;

        // Bind first so a taken port fails before anything else starts
        let listener = tokio::net::TcpListener::bind(addr)
            .await
            .map_err(|e| ServerError::PortUnavailable {
                port: self.config.port,
                source: e,
            })?;

        let hub = ReloadHub::new();

        let rules = WatchRules {
            html_dir: self.config.root.join("src/html"),
        };
        let (watcher, mut rx) = FileWatcher::new(
            &self.config.root.join("src"),
            rules,
            self.config.poll_interval,
        )?;

        let watch_hub = hub.clone();
        let root = self.config.root.clone();
        tokio::spawn(async move {
            while let Some(event) = rx.recv().await {
                handle_watch_event(&watch_hub, &root, event);
            }
            // Keep watcher alive
            drop(watcher);
        });

        let app = router(self.config.root.clone(), hub);

        let url = if self.config.root.join(START_PAGE).is_file() {
            format!("http://{}/{}", addr, START_PAGE)
        } else {
            format!("http://{}", addr)
        };
        tracing::info!("Dev server running at {}", url);

        if self.config.open {
            if let Err(e) = open::that(&url) {
                tracing::warn!("Failed to open browser: {}", e);
            }
        }

        axum::serve(listener, app).await.map_err(ServerError::Serve)?;

        Ok(())
    }
}

/// Routes for serving `root` with live reload.
pub fn router(root: PathBuf, hub: ReloadHub) -> Router {
    Router::new()
        .route(LIVERELOAD_PATH, get(ws_handler))
        .route(LIVERELOAD_SCRIPT_PATH, get(script_handler))
        .fallback_service(ServeDir::new(root))
        .layer(map_response(inject_into_html))
        .with_state(hub)
}

/// Handle file watch events.
fn handle_watch_event(hub: &ReloadHub, root: &Path, event: WatchEvent) {
    match event {
        WatchEvent::MarkupChanged(path) | WatchEvent::ScriptChanged(path) => {
            tracing::info!("Changed: {}", path.display());
            hub.send(ReloadMessage::Reload);
        }
        WatchEvent::StyleChanged(path) => {
            tracing::info!("Stylesheet changed: {}", path.display());
            let relative = path.strip_prefix(root).unwrap_or(&path);
            hub.send(ReloadMessage::Stylesheet {
                path: relative.to_string_lossy().replace('\\', "/"),
            });
        }
    }
}

/// Handler for the live reload WebSocket endpoint.
async fn ws_handler(ws: WebSocketUpgrade, State(hub): State<ReloadHub>) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_ws(socket, hub))
}

/// Forward reload messages to one browser until it goes away.
async fn handle_ws(mut socket: WebSocket, hub: ReloadHub) {
    let mut rx = hub.subscribe();

    if send_json(&mut socket, &ReloadMessage::Connected).await.is_err() {
        return;
    }

    while let Ok(msg) = rx.recv().await {
        if send_json(&mut socket, &msg).await.is_err() {
            break;
        }
    }
}

async fn send_json(socket: &mut WebSocket, msg: &ReloadMessage) -> Result<(), axum::Error> {
    let json = serde_json::to_string(msg).map_err(axum::Error::new)?;
    socket.send(Message::Text(json.into())).await
}

/// Handler for the client script.
async fn script_handler() -> impl IntoResponse {
    (
        [(header::CONTENT_TYPE, "application/javascript")],
        client_script(),
    )
}

/// Add the client script to every HTML response.
async fn inject_into_html(response: Response) -> Response {
    let is_html = response.status() == StatusCode::OK
        && response
            .headers()
            .get(header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .is_some_and(|v| v.starts_with("text/html"));

    if !is_html {
        return response;
    }

    let (mut parts, body) = response.into_parts();
    let bytes = match axum::body::to_bytes(body, usize::MAX).await {
        Ok(bytes) => bytes,
        Err(e) => {
            tracing::warn!("Failed to read HTML response: {}", e);
            return Response::from_parts(parts, Body::empty());
        }
    };

    let html = inject_client(&String::from_utf8_lossy(&bytes));
    parts.headers.remove(header::CONTENT_LENGTH);

    Response::from_parts(parts, Body::from(html))
}
