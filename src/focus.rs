//! Focus Module
//!
//! Delayed re-application of browser focus after the host window gains
//! keyboard focus.
//!
//! FocusIn reaches the host before the window manager's `_NET_ACTIVE_WINDOW`
//! update, and the toolkit reacts to that update by marking the embedded
//! view unfocused. Re-applying focus shortly afterwards restores it. A
//! FocusOut in between means another window won; the pending task is
//! cancelled so the two windows don't trade focus forever.

use std::time::{Duration, Instant};

use tracing::debug;
use x11rb::protocol::xproto::Window;

use crate::browser::BrowserRef;
use crate::tasks::{TaskId, TaskQueue};

/// Default delay between FocusIn and re-applying browser focus
pub const REFOCUS_DELAY: Duration = Duration::from_millis(100);

/// Work the event loop runs on behalf of a window
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WindowTask {
    ContinueFocus { window: Window },
}

impl WindowTask {
    pub fn window(&self) -> Window {
        match self {
            WindowTask::ContinueFocus { window } => *window,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RefocusState {
    #[default]
    Idle,
    Pending(TaskId),
}

/// What a refocus transition did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefocusOutcome {
    Scheduled(TaskId),
    AlreadyPending,
    Cancelled,
    NothingPending,
    Applied,
    /// The task that ran is no longer the pending one
    Stale,
}

/// idle -> pending -> applied | cancelled
#[derive(Debug)]
pub struct Refocus {
    state: RefocusState,
    delay: Duration,
}

impl Refocus {
    pub fn new(delay: Duration) -> Self {
        Self {
            state: RefocusState::Idle,
            delay,
        }
    }

    pub fn state(&self) -> RefocusState {
        self.state
    }

    pub fn is_pending(&self) -> bool {
        matches!(self.state, RefocusState::Pending(_))
    }

    pub fn focus_in(
        &mut self,
        window: Window,
        tasks: &mut TaskQueue<WindowTask>,
        now: Instant,
    ) -> RefocusOutcome {
        if self.is_pending() {
            return RefocusOutcome::AlreadyPending;
        }
        let id = tasks.post_delayed(now, self.delay, WindowTask::ContinueFocus { window });
        self.state = RefocusState::Pending(id);
        debug!("Window 0x{:x}: refocus scheduled in {:?}", window, self.delay);
        RefocusOutcome::Scheduled(id)
    }

    pub fn focus_out(&mut self, tasks: &mut TaskQueue<WindowTask>) -> RefocusOutcome {
        match self.state {
            RefocusState::Pending(id) => {
                tasks.cancel(id);
                self.state = RefocusState::Idle;
                debug!("Pending refocus cancelled");
                RefocusOutcome::Cancelled
            }
            RefocusState::Idle => RefocusOutcome::NothingPending,
        }
    }

    /// Run the task `id`; focus is applied only if it is still the pending one
    pub fn run(&mut self, id: TaskId, browser: &BrowserRef) -> RefocusOutcome {
        if self.state != RefocusState::Pending(id) {
            return RefocusOutcome::Stale;
        }
        self.state = RefocusState::Idle;
        if let Some(browser) = browser.get() {
            browser.set_focus(true);
        }
        RefocusOutcome::Applied
    }
}

impl Default for Refocus {
    fn default() -> Self {
        Self::new(REFOCUS_DELAY)
    }
}
