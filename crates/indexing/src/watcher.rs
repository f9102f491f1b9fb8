use mdl_index_common::{IndexError, Result};
use notify::{EventKind, RecommendedWatcher, RecursiveMode};
use notify_debouncer_full::{new_debouncer, DebounceEventResult, Debouncer, RecommendedCache};
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{debug, error, info};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MdlEvent {
    Changed(PathBuf),
    Removed(PathBuf),
}

/// Watches a single MDL file.
///
/// The parent directory is watched rather than the file, so editors that save by
/// replacing the file keep producing events. Each debounced batch touching the file
/// yields one event, decided by whether the file exists afterwards.
pub struct MdlWatcher {
    path: PathBuf,
    rx: mpsc::UnboundedReceiver<MdlEvent>,
    _debouncer: Debouncer<RecommendedWatcher, RecommendedCache>,
}

impl MdlWatcher {
    pub fn new(path: impl AsRef<Path>, debounce: Duration) -> Result<Self> {
        let path = path.as_ref();
        let file_name: OsString = path
            .file_name()
            .ok_or_else(|| IndexError::Config(format!("not a file path: {}", path.display())))?
            .to_os_string();
        let parent = match path.parent() {
            Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
            _ => PathBuf::from("."),
        };
        let path = parent.canonicalize()?.join(&file_name);

        let (tx, rx) = mpsc::unbounded_channel();
        let target = path.clone();
        let mut debouncer = new_debouncer(debounce, None, move |result: DebounceEventResult| match result {
            Ok(events) => {
                let touched = events.iter().any(|event| {
                    !matches!(event.kind, EventKind::Access(_))
                        && event.paths.iter().any(|p| p.file_name() == Some(file_name.as_os_str()))
                });
                if !touched {
                    return;
                }
                let event = if target.exists() {
                    MdlEvent::Changed(target.clone())
                } else {
                    MdlEvent::Removed(target.clone())
                };
                debug!("MDL event: {:?}", event);
                let _ = tx.send(event);
            }
            Err(errors) => {
                for error in errors {
                    error!("Watch error: {:?}", error);
                }
            }
        })
        .map_err(|e| IndexError::Unknown(format!("failed to create watcher: {}", e)))?;

        debouncer
            .watch(&parent, RecursiveMode::NonRecursive)
            .map_err(|e| IndexError::Unknown(format!("failed to watch {}: {}", parent.display(), e)))?;
        info!("Watching MDL file: {}", path.display());

        Ok(Self {
            path,
            rx,
            _debouncer: debouncer,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Next change to the file; `None` once the watcher has shut down.
    pub async fn next_event(&mut self) -> Option<MdlEvent> {
        self.rx.recv().await
    }
}
