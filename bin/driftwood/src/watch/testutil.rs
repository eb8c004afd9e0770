//! Shared helpers for watch-loop tests.

use std::{
    fs,
    net::SocketAddr,
    path::PathBuf,
    sync::{
        atomic::{AtomicUsize, Ordering},
        Arc,
    },
    time::Duration,
};

use tokio::{
    io::{AsyncReadExt, AsyncWriteExt},
    net::TcpStream,
};

use driftwood_generator::{build::Result as BuildResult, BuildError, BuildStats, Renderer};

/// Minimal HTTP GET over a raw socket; returns the full response text.
pub(crate) async fn http_get(addr: SocketAddr, path: &str) -> std::io::Result<String> {
    let mut stream = TcpStream::connect(addr).await?;
    let request = format!("GET {path} HTTP/1.0\r\nHost: {addr}\r\nConnection: close\r\n\r\n");
    stream.write_all(request.as_bytes()).await?;

    let mut buf = Vec::new();
    stream.read_to_end(&mut buf).await?;
    Ok(String::from_utf8_lossy(&buf).into_owned())
}

/// Poll until `condition` holds or the deadline passes.
pub(crate) async fn wait_for(deadline: Duration, mut condition: impl FnMut() -> bool) -> bool {
    let start = tokio::time::Instant::now();
    while start.elapsed() < deadline {
        if condition() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    condition()
}

/// Configurable renderer stub.
///
/// Counts invocations, optionally sleeps to simulate a slow build,
/// optionally fails the first N calls, optionally writes a numbered
/// marker page into an output directory, and optionally runs a caller
/// hook in the middle of the render.
pub(crate) struct StubRenderer {
    calls: Arc<AtomicUsize>,
    delay: Duration,
    fail_times: usize,
    write_to: Option<PathBuf>,
    on_render: Option<Box<dyn Fn(usize) + Send + Sync>>,
}

impl StubRenderer {
    pub(crate) fn new() -> Self {
        Self {
            calls: Arc::new(AtomicUsize::new(0)),
            delay: Duration::ZERO,
            fail_times: 0,
            write_to: None,
            on_render: None,
        }
    }

    pub(crate) fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub(crate) fn failing_first(mut self, times: usize) -> Self {
        self.fail_times = times;
        self
    }

    /// Write `build N` into `dir/index.html` on each successful render.
    pub(crate) fn writing_to(mut self, dir: impl Into<PathBuf>) -> Self {
        self.write_to = Some(dir.into());
        self
    }

    pub(crate) fn with_hook(mut self, hook: impl Fn(usize) + Send + Sync + 'static) -> Self {
        self.on_render = Some(Box::new(hook));
        self
    }

    pub(crate) fn call_count(&self) -> Arc<AtomicUsize> {
        self.calls.clone()
    }
}

impl Renderer for StubRenderer {
    fn render(&self) -> BuildResult<BuildStats> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst) + 1;

        if let Some(hook) = &self.on_render {
            hook(call);
        }
        if !self.delay.is_zero() {
            std::thread::sleep(self.delay);
        }
        if call <= self.fail_times {
            return Err(BuildError::Io(std::io::Error::other("stub render failure")));
        }
        if let Some(dir) = &self.write_to {
            fs::create_dir_all(dir)?;
            fs::write(dir.join("index.html"), format!("build {call}"))?;
        }

        Ok(BuildStats::default())
    }
}
