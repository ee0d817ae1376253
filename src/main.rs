//! embedwin - demo host
//!
//! Opens one host window (top-level, or embedded with `--parent <xid>`)
//! and runs the event loop a browser integration would run: X11 events go
//! through the window registry, delayed focus tasks run on their deadline.

use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use tracing::{debug, error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use embedwin::config::Config;
use embedwin::dispatch::{EventResult, WindowRegistry};
use embedwin::x11_async::X11EventStream;
use embedwin::{
    BrowserHost, BrowserRef, PlatformDelegate, WindowInfo, WindowSystem, X11Display,
};

/// Upper bound on an idle wait when no task is pending
const IDLE_WAIT: Duration = Duration::from_secs(3600);

/// Stand-in browser that logs what the host window tells it
struct LoggingBrowser;

impl BrowserHost for LoggingBrowser {
    fn try_close_browser(&self) -> bool {
        info!("Browser asked to close; allowing");
        true
    }

    fn window_destroyed(&self) {
        info!("Browser notified: host window destroyed");
    }

    fn notify_move_or_resize_started(&self) {
        debug!("Browser notified: move/resize started");
    }

    fn set_focus(&self, focus: bool) {
        debug!("Browser focus -> {}", focus);
    }
}

struct HostApp {
    stream: X11EventStream,
    registry: WindowRegistry<X11Display>,
    delegate: PlatformDelegate,
    /// Owns the browser; windows only hold weak references
    _browser: Arc<dyn BrowserHost>,
}

impl HostApp {
    fn new(config: &Config, parent: Option<u32>) -> Result<Self> {
        let ws = Arc::new(X11Display::connect(None).context("Failed to connect to X server")?);
        debug!("Hosting on screen {} (root 0x{:x})", ws.screen_num(), ws.root());

        let stream = X11EventStream::new(ws.connection().clone())?;
        let mut registry = WindowRegistry::new(ws, config.focus.refocus_delay());

        let mut info = WindowInfo::from_config(config);
        if let Some(parent) = parent {
            info.parent_window = parent;
        }
        let mut delegate = PlatformDelegate::new(info, config);

        let browser: Arc<dyn BrowserHost> = Arc::new(LoggingBrowser);
        delegate
            .create_host_window(&mut registry, BrowserRef::new(&browser))
            .context("Failed to create host window")?;

        Ok(Self {
            stream,
            registry,
            delegate,
            _browser: browser,
        })
    }

    fn handle_events(&mut self) -> Result<()> {
        for event in self.stream.drain()? {
            match self.registry.dispatch_x11(&event, Instant::now()) {
                EventResult::Destroyed => info!("Host window destroyed after {:?}", event),
                EventResult::Handled => debug!("Handled {:?}", event),
                EventResult::Ignore => {}
            }
        }
        Ok(())
    }

    async fn run(mut self) -> Result<()> {
        info!(
            "Starting event loop for window {:?}",
            self.delegate.host_window_handle()
        );

        loop {
            // Replies can leave events queued without the socket turning readable
            self.handle_events()?;
            let applied = self.registry.run_due_tasks(Instant::now());
            if applied > 0 {
                debug!("Applied {} delayed refocus task(s)", applied);
            }
            self.stream.flush()?;

            if self.registry.is_empty() {
                info!("No host windows left, exiting");
                return Ok(());
            }

            let deadline = self
                .registry
                .next_deadline()
                .unwrap_or_else(|| Instant::now() + IDLE_WAIT);

            tokio::select! {
                () = self.stream.wait_readable() => {}
                _ = tokio::time::sleep_until(tokio::time::Instant::from_std(deadline)) => {}
            }
        }
    }
}

/// `--parent <xid>`, decimal or 0x-prefixed hex
fn parse_parent(args: &[String]) -> Option<u32> {
    let value = args
        .iter()
        .position(|arg| arg == "--parent")
        .and_then(|i| args.get(i + 1))?;
    let parsed = match value.strip_prefix("0x") {
        Some(hex) => u32::from_str_radix(hex, 16),
        None => value.parse(),
    };
    match parsed {
        Ok(xid) => Some(xid),
        Err(e) => {
            warn!("Ignoring invalid --parent {:?}: {}", value, e);
            None
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let config = Config::load().unwrap_or_else(|e| {
        eprintln!("Failed to load config, using defaults: {:#}", e);
        Config::default()
    });

    // Initialize logging
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| config.logging.filter.clone()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting embedwin host");

    let args: Vec<String> = std::env::args().collect();
    let parent = parse_parent(&args).or(config.window.parent_window);

    // Setup signal handlers for graceful shutdown
    let (shutdown_tx, mut shutdown_rx) = tokio::sync::mpsc::channel::<()>(1);

    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};
        let mut sigterm = signal(SignalKind::terminate())?;
        let mut sigint = signal(SignalKind::interrupt())?;
        let tx = shutdown_tx.clone();
        tokio::spawn(async move {
            tokio::select! {
                _ = sigterm.recv() => {
                    info!("Received SIGTERM, shutting down gracefully");
                    let _ = tx.send(()).await;
                }
                _ = sigint.recv() => {
                    info!("Received SIGINT, shutting down gracefully");
                    let _ = tx.send(()).await;
                }
            }
        });
    }

    let app = HostApp::new(&config, parent)?;

    tokio::select! {
        result = app.run() => {
            if let Err(e) = result {
                error!("Host error: {}", e);
                return Err(e);
            }
        }
        _ = shutdown_rx.recv() => {
            info!("Shutdown signal received, closing connection");
        }
    }

    Ok(())
}
