//! X11 Async Event Stream
//!
//! Readiness of the X11 socket as a tokio future. A mio poll runs on a
//! blocking thread and wakes the event loop; events are then drained on
//! the loop itself so window state is only touched from one task.

use std::os::unix::io::AsRawFd;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use tokio::sync::{oneshot, Notify};
use tracing::{info, warn};
use x11rb::connection::Connection;
use x11rb::protocol::Event;
use x11rb::rust_connection::RustConnection;

const X11_TOKEN: mio::Token = mio::Token(0);

/// Poll timeout; bounds how long the thread outlives the stream
const POLL_TIMEOUT: Duration = Duration::from_millis(100);

pub struct X11EventStream {
    conn: Arc<RustConnection>,
    notify: Arc<Notify>,
    /// Dropping this tells the poll thread to exit
    _task_guard: oneshot::Receiver<()>,
}

impl X11EventStream {
    /// Start polling the connection's socket. Must run inside a tokio runtime.
    pub fn new(conn: Arc<RustConnection>) -> Result<Self> {
        let fd = conn.stream().as_raw_fd();
        let notify = Arc::new(Notify::new());
        let task_notify = notify.clone();

        let (guard, task_guard) = oneshot::channel::<()>();
        let mut poll = mio::Poll::new().context("Failed to create mio Poll")?;
        let mut events = mio::Events::with_capacity(1);

        poll.registry()
            .register(
                &mut mio::unix::SourceFd(&fd),
                X11_TOKEN,
                mio::Interest::READABLE,
            )
            .context("Failed to register X11 FD with mio")?;

        tokio::task::spawn_blocking(move || loop {
            if guard.is_closed() {
                info!("X11 socket polling thread shutting down");
                return;
            }

            if let Err(err) = poll.poll(&mut events, Some(POLL_TIMEOUT)) {
                warn!("X11 socket poll failed: {:?}", err);
                continue;
            }

            if events.iter().any(|event| event.token() == X11_TOKEN) {
                task_notify.notify_one();
            }
        });

        Ok(Self {
            conn,
            notify,
            _task_guard: task_guard,
        })
    }

    /// Take every event already read from the socket, without blocking
    pub fn drain(&self) -> Result<Vec<Event>> {
        let mut drained = Vec::new();
        while let Some(event) = self
            .conn
            .poll_for_event()
            .context("X11 connection lost")?
        {
            drained.push(event);
        }
        Ok(drained)
    }

    /// Wait until the socket becomes readable
    pub async fn wait_readable(&self) {
        self.notify.notified().await;
    }

    /// Send queued requests; called once per loop iteration
    pub fn flush(&self) -> Result<()> {
        self.conn.flush().context("Failed to flush X11 connection")?;
        Ok(())
    }
}
