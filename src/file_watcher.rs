use std::path::{Path, PathBuf};
use std::sync::mpsc;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use notify::{RecursiveMode, Watcher};

// AIDEV-NOTE: Editors often write in bursts (truncate+write, or write to a temp file
// then rename), so a change is reported only after events have been quiet this long.
const STABILITY_DELAY: Duration = Duration::from_millis(100);

pub struct FileWatcher {
    _watcher: notify::RecommendedWatcher,
    receiver: mpsc::Receiver<notify::Event>,
    file_name: Option<std::ffi::OsString>,
    last_event: Option<Instant>,
}

impl FileWatcher {
    /// Watches the parent directory so replace-by-rename saves are seen
    pub fn new(file_path: &Path) -> Result<Self> {
        let (tx, rx) = mpsc::channel();

        let mut watcher =
            notify::recommended_watcher(move |event: Result<notify::Event, notify::Error>| {
                match event {
                    Ok(event) if event.kind.is_modify() || event.kind.is_create() => {
                        let _ = tx.send(event);
                    }
                    Ok(_) => {}
                    Err(e) => log::warn!("File watch error: {e}"),
                }
            })
            .context("Failed to create file watcher")?;

        let directory = watch_directory(file_path);
        watcher
            .watch(&directory, RecursiveMode::NonRecursive)
            .with_context(|| format!("Failed to watch {}", directory.display()))?;

        Ok(Self {
            _watcher: watcher,
            receiver: rx,
            file_name: file_path.file_name().map(ToOwned::to_owned),
            last_event: None,
        })
    }

    fn concerns_file(&self, event: &notify::Event) -> bool {
        match &self.file_name {
            Some(name) => event.paths.iter().any(|p| p.file_name() == Some(name.as_os_str())),
            None => true,
        }
    }

    /// True once per burst of changes, after the burst has settled
    pub fn check_for_changes(&mut self, now: Instant) -> bool {
        while let Ok(event) = self.receiver.try_recv() {
            if self.concerns_file(&event) {
                self.last_event = Some(now);
            }
        }
        settled(&mut self.last_event, now)
    }
}

fn watch_directory(file_path: &Path) -> PathBuf {
    match file_path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    }
}

fn settled(last_event: &mut Option<Instant>, now: Instant) -> bool {
    match *last_event {
        Some(at) if now.duration_since(at) >= STABILITY_DELAY => {
            *last_event = None;
            true
        }
        _ => false,
    }
}
