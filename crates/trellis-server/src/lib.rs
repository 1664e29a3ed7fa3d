//! Development server with live reload for trellis themes.
//!
//! Serves the theme sources, polls them for changes, and tells connected
//! browsers to reload over a WebSocket.

pub mod livereload;
pub mod server;
pub mod watcher;

pub use livereload::{ReloadHub, ReloadMessage};
pub use server::{router, DevServer, DevServerConfig, ServerError};
pub use watcher::{FileWatcher, WatchEvent, WatchRules};
