//! Filesystem change observation with debouncing.
//!
//! Raw notify events are mapped to [`ChangeEvent`]s on the watcher's
//! callback thread, filtered there (directory events and pattern-excluded
//! paths never cross into the async side), and fed to a debounce task that
//! emits one logical trigger per burst: after a raw event arrives, the
//! trigger fires once the tree has been quiet for the debounce interval,
//! carrying the most recent event. An editor's save sequence (create +
//! write + rename of a temp file) therefore causes one rebuild, not three.

use std::path::{Path, PathBuf};

use notify::{
    event::{CreateKind, ModifyKind, RemoveKind},
    EventKind, RecommendedWatcher, RecursiveMode, Watcher,
};
use regex::Regex;
use tokio::{
    sync::{mpsc, watch},
    task::JoinHandle,
};
use tracing::{debug, info, trace};

use super::{ServeError, WatchConfig};

/// What happened to a path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeKind {
    /// A file was created.
    Created,
    /// A file's contents changed.
    Modified,
    /// A file was removed.
    Removed,
    /// A file was renamed or moved.
    Renamed,
}

/// A single filesystem change notification.
#[derive(Debug, Clone)]
pub struct ChangeEvent {
    /// Absolute path the event refers to.
    pub path: PathBuf,

    /// What happened.
    pub kind: ChangeKind,

    /// Whether the path is a directory.
    pub is_dir: bool,
}

/// Include/exclude filtering over event paths.
#[derive(Debug, Clone)]
pub(crate) struct EventFilter {
    include: Vec<Regex>,
    exclude: Vec<Regex>,
}

impl EventFilter {
    pub(crate) fn new(include: Vec<Regex>, exclude: Vec<Regex>) -> Self {
        Self { include, exclude }
    }

    /// Whether an event should produce a trigger.
    ///
    /// Directory events are dropped, then excludes, then includes (an
    /// empty include list admits everything).
    pub(crate) fn matches(&self, event: &ChangeEvent) -> bool {
        if event.is_dir {
            return false;
        }

        let path = event.path.to_string_lossy();

        if self.exclude.iter().any(|re| re.is_match(&path)) {
            return false;
        }

        self.include.is_empty() || self.include.iter().any(|re| re.is_match(&path))
    }
}

/// Map a raw notify event to zero or more change events.
fn map_event(event: &notify::Event) -> Vec<ChangeEvent> {
    let kind = match event.kind {
        EventKind::Create(_) => Some(ChangeKind::Created),
        EventKind::Modify(ModifyKind::Name(_)) => Some(ChangeKind::Renamed),
        // Permission/ownership churn and reads are not content changes.
        EventKind::Modify(ModifyKind::Metadata(_)) | EventKind::Access(_) => None,
        EventKind::Modify(_) => Some(ChangeKind::Modified),
        EventKind::Remove(_) => Some(ChangeKind::Removed),
        EventKind::Any | EventKind::Other => Some(ChangeKind::Modified),
    };

    let Some(kind) = kind else {
        return Vec::new();
    };

    event
        .paths
        .iter()
        .map(|path| ChangeEvent {
            path: path.clone(),
            kind,
            is_dir: is_directory(&event.kind, path),
        })
        .collect()
}

fn is_directory(kind: &EventKind, path: &Path) -> bool {
    match kind {
        EventKind::Create(CreateKind::Folder) | EventKind::Remove(RemoveKind::Folder) => true,
        EventKind::Create(CreateKind::File) | EventKind::Remove(RemoveKind::File) => false,
        // The path of a removal no longer exists to ask; assume file.
        EventKind::Remove(_) => false,
        _ => path.is_dir(),
    }
}

/// Collapse bursts of raw events into single logical triggers.
///
/// A trigger fires once no raw event has arrived for `window`, carrying
/// the most recent event of the burst. The stop signal is honored at
/// every await point, so shutdown never waits out a pending window.
pub(crate) async fn debounce_loop(
    mut raw: mpsc::Receiver<ChangeEvent>,
    triggers: mpsc::Sender<ChangeEvent>,
    window: std::time::Duration,
    mut stop: watch::Receiver<bool>,
) {
    loop {
        let first = tokio::select! {
            _ = stop.changed() => return,
            event = raw.recv() => match event {
                Some(event) => event,
                None => return,
            },
        };

        let mut latest = first;
        loop {
            let deadline = tokio::time::sleep(window);
            tokio::pin!(deadline);

            tokio::select! {
                _ = stop.changed() => return,
                () = &mut deadline => break,
                event = raw.recv() => match event {
                    Some(event) => latest = event,
                    None => break,
                },
            }
        }

        info!(path = %latest.path.display(), kind = ?latest.kind, "change detected");
        if triggers.send(latest).await.is_err() {
            return;
        }
    }
}

/// Watches a directory tree and emits debounced change triggers.
///
/// The OS-level watch lives exactly as long as this value; [`stop`]
/// releases it before returning.
///
/// [`stop`]: ChangeObserver::stop
pub struct ChangeObserver {
    watcher: RecommendedWatcher,
    task: JoinHandle<()>,
    stop_tx: watch::Sender<bool>,
}

impl ChangeObserver {
    /// Start watching `config.watch_dir` recursively, sending debounced
    /// triggers into `triggers`.
    pub fn start(
        config: &WatchConfig,
        triggers: mpsc::Sender<ChangeEvent>,
    ) -> Result<Self, ServeError> {
        let filter = EventFilter::new(config.include.clone(), config.exclude.clone());
        let (raw_tx, raw_rx) = mpsc::channel::<ChangeEvent>(256);

        let mut watcher = RecommendedWatcher::new(
            move |result: Result<notify::Event, notify::Error>| {
                let Ok(event) = result else { return };
                for change in map_event(&event) {
                    trace!(path = %change.path.display(), kind = ?change.kind, "raw event");
                    if filter.matches(&change) {
                        // The callback runs on the watcher's own thread.
                        let _ = raw_tx.blocking_send(change);
                    }
                }
            },
            notify::Config::default(),
        )?;
        watcher.watch(&config.watch_dir, RecursiveMode::Recursive)?;

        let (stop_tx, stop_rx) = watch::channel(false);
        let task = tokio::spawn(debounce_loop(raw_rx, triggers, config.debounce, stop_rx));

        info!(dir = %config.watch_dir.display(), "watching for changes");

        Ok(Self {
            watcher,
            task,
            stop_tx,
        })
    }

    /// Stop watching. Releases the OS-level watch and joins the debounce
    /// task; no trigger is emitted after this returns. Shutdown is
    /// immediate — a pending debounce window is not waited out.
    pub async fn stop(self) {
        drop(self.watcher);
        let _ = self.stop_tx.send(true);
        let _ = self.task.await;
        debug!("change observer stopped");
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use tokio::time::timeout;

    use super::*;
    use crate::watch::compile_patterns;

    fn event(path: &str, kind: ChangeKind) -> ChangeEvent {
        ChangeEvent {
            path: PathBuf::from(path),
            kind,
            is_dir: false,
        }
    }

    fn filter(include: &[&str], exclude: &[&str]) -> EventFilter {
        let include: Vec<String> = include.iter().map(|s| s.to_string()).collect();
        let exclude: Vec<String> = exclude.iter().map(|s| s.to_string()).collect();
        EventFilter::new(
            compile_patterns(&include).unwrap(),
            compile_patterns(&exclude).unwrap(),
        )
    }

    #[test]
    fn test_filter_drops_directory_events() {
        let filter = filter(&[], &[]);
        let mut ev = event("content/posts", ChangeKind::Created);
        ev.is_dir = true;
        assert!(!filter.matches(&ev));
    }

    #[test]
    fn test_filter_exclude_wins() {
        let filter = filter(&[r"\.md$"], &[r"~$"]);
        assert!(filter.matches(&event("content/post.md", ChangeKind::Modified)));
        assert!(!filter.matches(&event("content/post.md~", ChangeKind::Modified)));
    }

    #[test]
    fn test_filter_empty_include_admits_all() {
        let filter = filter(&[], &[]);
        assert!(filter.matches(&event("anything.xyz", ChangeKind::Created)));
    }

    #[test]
    fn test_filter_include_required_when_present() {
        let filter = filter(&[r"\.md$"], &[]);
        assert!(filter.matches(&event("a.md", ChangeKind::Modified)));
        assert!(!filter.matches(&event("a.css", ChangeKind::Modified)));
    }

    #[test]
    fn test_map_event_kinds() {
        let raw = notify::Event {
            kind: EventKind::Create(CreateKind::File),
            paths: vec![PathBuf::from("/tmp/a.md")],
            attrs: Default::default(),
        };
        let mapped = map_event(&raw);
        assert_eq!(mapped.len(), 1);
        assert_eq!(mapped[0].kind, ChangeKind::Created);
        assert!(!mapped[0].is_dir);

        let raw = notify::Event {
            kind: EventKind::Access(notify::event::AccessKind::Read),
            paths: vec![PathBuf::from("/tmp/a.md")],
            attrs: Default::default(),
        };
        assert!(map_event(&raw).is_empty());

        let raw = notify::Event {
            kind: EventKind::Remove(RemoveKind::File),
            paths: vec![PathBuf::from("/tmp/a.md")],
            attrs: Default::default(),
        };
        assert_eq!(map_event(&raw)[0].kind, ChangeKind::Removed);
    }

    #[tokio::test]
    async fn test_debounce_collapses_burst_to_one_trigger() {
        let (raw_tx, raw_rx) = mpsc::channel(64);
        let (trigger_tx, mut trigger_rx) = mpsc::channel(64);
        let (_stop_tx, stop_rx) = watch::channel(false);

        let task = tokio::spawn(debounce_loop(
            raw_rx,
            trigger_tx,
            Duration::from_millis(100),
            stop_rx,
        ));

        // 10 raw events well inside the debounce window
        for i in 0..10 {
            raw_tx
                .send(event(&format!("content/f{i}.md"), ChangeKind::Modified))
                .await
                .unwrap();
            tokio::time::sleep(Duration::from_millis(5)).await;
        }

        let trigger = timeout(Duration::from_secs(2), trigger_rx.recv())
            .await
            .expect("debounced trigger should fire")
            .unwrap();
        // Carries the most recent event of the burst
        assert_eq!(trigger.path, PathBuf::from("content/f9.md"));

        // And exactly one trigger fired
        assert!(
            timeout(Duration::from_millis(300), trigger_rx.recv())
                .await
                .is_err(),
            "burst must collapse into a single trigger"
        );

        drop(raw_tx);
        task.await.unwrap();
    }

    #[tokio::test]
    async fn test_debounce_separate_bursts_fire_separately() {
        let (raw_tx, raw_rx) = mpsc::channel(64);
        let (trigger_tx, mut trigger_rx) = mpsc::channel(64);
        let (_stop_tx, stop_rx) = watch::channel(false);

        let task = tokio::spawn(debounce_loop(
            raw_rx,
            trigger_tx,
            Duration::from_millis(50),
            stop_rx,
        ));

        raw_tx.send(event("a.md", ChangeKind::Modified)).await.unwrap();
        let first = timeout(Duration::from_secs(2), trigger_rx.recv())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(first.path, PathBuf::from("a.md"));

        raw_tx.send(event("b.md", ChangeKind::Modified)).await.unwrap();
        let second = timeout(Duration::from_secs(2), trigger_rx.recv())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(second.path, PathBuf::from("b.md"));

        drop(raw_tx);
        task.await.unwrap();
    }

    #[tokio::test]
    async fn test_debounce_stop_is_immediate() {
        let (raw_tx, raw_rx) = mpsc::channel(64);
        let (trigger_tx, mut trigger_rx) = mpsc::channel(64);
        let (stop_tx, stop_rx) = watch::channel(false);

        // A long window that stop must not wait out
        let task = tokio::spawn(debounce_loop(
            raw_rx,
            trigger_tx,
            Duration::from_secs(60),
            stop_rx,
        ));

        raw_tx.send(event("a.md", ChangeKind::Modified)).await.unwrap();
        tokio::time::sleep(Duration::from_millis(20)).await;

        stop_tx.send(true).unwrap();
        timeout(Duration::from_secs(1), task)
            .await
            .expect("stop must not be debounced")
            .unwrap();

        // Nothing was emitted after stop
        assert!(trigger_rx.try_recv().is_err());
        drop(raw_tx);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_observer_emits_trigger_for_file_change() {
        let dir = tempfile::tempdir().unwrap();
        let config = WatchConfig {
            watch_dir: dir.path().to_path_buf(),
            output_dir: dir.path().join("public"),
            bind_addr: "127.0.0.1:0".to_string(),
            include: Vec::new(),
            exclude: Vec::new(),
            debounce: Duration::from_millis(100),
            grace: Duration::from_secs(1),
        };

        let (trigger_tx, mut trigger_rx) = mpsc::channel(64);
        let observer = ChangeObserver::start(&config, trigger_tx).unwrap();

        // Give the OS watch a moment to become effective
        tokio::time::sleep(Duration::from_millis(200)).await;
        std::fs::write(dir.path().join("post.md"), "hello").unwrap();

        let trigger = timeout(Duration::from_secs(10), trigger_rx.recv())
            .await
            .expect("file change should produce a trigger")
            .unwrap();
        assert!(trigger.path.ends_with("post.md"));

        observer.stop().await;
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_observer_stop_joins_promptly() {
        let dir = tempfile::tempdir().unwrap();
        let config = WatchConfig {
            watch_dir: dir.path().to_path_buf(),
            output_dir: dir.path().join("public"),
            bind_addr: "127.0.0.1:0".to_string(),
            include: Vec::new(),
            exclude: Vec::new(),
            debounce: Duration::from_secs(60),
            grace: Duration::from_secs(1),
        };

        let (trigger_tx, _trigger_rx) = mpsc::channel(64);
        let observer = ChangeObserver::start(&config, trigger_tx).unwrap();

        timeout(Duration::from_secs(2), observer.stop())
            .await
            .expect("observer stop must be prompt");
    }
}
