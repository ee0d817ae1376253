//! Error type for the window layer.

use thiserror::Error;
use x11rb::errors::{ConnectError, ConnectionError, ReplyError, ReplyOrIdError};

#[derive(Debug, Error)]
pub enum WindowError {
    #[error("failed to connect to X server: {0}")]
    Connect(#[from] ConnectError),

    #[error("X11 connection error: {0}")]
    Connection(#[from] ConnectionError),

    #[error("X11 request failed: {0}")]
    Reply(#[from] ReplyError),

    #[error("X11 request or id allocation failed: {0}")]
    ReplyOrId(#[from] ReplyOrIdError),

    #[error("screen {0} does not exist")]
    NoScreen(usize),

    #[error("native window creation failed under parent 0x{parent:x}")]
    CreateFailed { parent: u32 },
}

pub type Result<T> = std::result::Result<T, WindowError>;
