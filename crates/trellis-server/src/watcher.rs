//! Polling file watcher for live reload.

use std::path::{Path, PathBuf};
use std::sync::mpsc;
use std::time::{Duration, Instant};

use notify::{PollWatcher, RecursiveMode, Watcher};
use tokio::sync::mpsc as async_mpsc;

/// Events emitted by the file watcher.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WatchEvent {
    /// Markup under the HTML source directory changed
    MarkupChanged(PathBuf),

    /// Script source changed
    ScriptChanged(PathBuf),

    /// Stylesheet source changed
    StyleChanged(PathBuf),
}

/// Which paths are worth reloading for.
#[derive(Debug, Clone)]
pub struct WatchRules {
    /// `src/html`: markup is only watched here
    pub html_dir: PathBuf,
}

impl WatchRules {
    /// Classify a changed path. Returns `None` for paths nobody cares about.
    pub fn classify(&self, path: &Path) -> Option<WatchEvent> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase)?;

        match ext.as_str() {
            "html" if path.starts_with(&self.html_dir) => {
                Some(WatchEvent::MarkupChanged(path.to_path_buf()))
            }
            "js" => Some(WatchEvent::ScriptChanged(path.to_path_buf())),
            "css" | "scss" => Some(WatchEvent::StyleChanged(path.to_path_buf())),
            _ => None,
        }
    }
}

/// File watcher that polls the filesystem.
pub struct FileWatcher {
    _watcher: PollWatcher,
}

impl FileWatcher {
    /// Watch `root` recursively, polling every `interval`.
    ///
    /// Returns the watcher and a channel to receive events. Events stop when the
    /// watcher is dropped.
    pub fn new(
        root: &Path,
        rules: WatchRules,
        interval: Duration,
    ) -> Result<(Self, async_mpsc::Receiver<WatchEvent>), notify::Error> {
        let (sync_tx, sync_rx) = mpsc::channel();
        let (async_tx, async_rx) = async_mpsc::channel(100);

        let config = notify::Config::default().with_poll_interval(interval);
        let mut watcher = PollWatcher::new(
            move |res: notify::Result<notify::Event>| {
                if let Ok(event) = res {
                    let _ = sync_tx.send(event);
                }
            },
            config,
        )?;

        watcher.watch(root, RecursiveMode::Recursive)?;

        std::thread::spawn(move || {
            let debounce = Duration::from_millis(100);
            let mut last: Option<(WatchEvent, Instant)> = None;

            while let Ok(event) = sync_rx.recv() {
                if !is_content_change(&event.kind) {
                    continue;
                }

                for path in event.paths {
                    let Some(watch_event) = rules.classify(&path) else {
                        continue;
                    };

                    // Polling reports create+modify pairs for the same file
                    let now = Instant::now();
                    if let Some((prev, at)) = &last {
                        if *prev == watch_event && now.duration_since(*at) < debounce {
                            continue;
                        }
                    }
                    last = Some((watch_event.clone(), now));

                    if async_tx.blocking_send(watch_event).is_err() {
                        return;
                    }
                }
            }
        });

        Ok((Self { _watcher: watcher }, async_rx))
    }
}

fn is_content_change(kind: &notify::EventKind) -> bool {
    use notify::EventKind;

    matches!(
        kind,
        EventKind::Create(_) | EventKind::Modify(_) | EventKind::Remove(_)
    )
}
