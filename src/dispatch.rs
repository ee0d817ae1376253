//! Event dispatch for host windows.
//!
//! Each host window gets an `EventDispatcher` that interprets the events
//! addressed to it. The `WindowRegistry` owns every dispatcher, routes
//! events by target window and frees a record when its window is destroyed.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use tracing::{debug, info, warn};
use x11rb::protocol::xproto::{Atom, ClientMessageEvent, ConfigureWindowAux, EventMask, Window};
use x11rb::protocol::Event;

use crate::browser::BrowserRef;
use crate::error::Result;
use crate::focus::{Refocus, RefocusOutcome, RefocusState, WindowTask};
use crate::shared::Rect;
use crate::tasks::{TaskId, TaskQueue};
use crate::window::NativeWindow;
use crate::x11::display::WindowSystem;
use crate::x11::event::PlatformEvent;

/// Result of event handling
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventResult {
    /// Event was handled
    Handled,
    /// Event was not for us or needs no action
    Ignore,
    /// The window was destroyed; its record must be dropped
    Destroyed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatcherState {
    Unmapped,
    Mapped,
    Destroyed,
}

/// Shared state an event handler may touch besides its own window
pub struct DispatchContext<'a> {
    pub tasks: &'a mut TaskQueue<WindowTask>,
    pub now: Instant,
}

/// Something that consumes platform events for one window
pub trait PlatformEventDispatcher {
    fn can_dispatch(&self, event: &PlatformEvent) -> bool;

    fn dispatch(&mut self, event: &PlatformEvent, ctx: &mut DispatchContext<'_>) -> EventResult;
}

/// Interprets window-manager protocol, geometry, focus and state events for
/// one host window
pub struct EventDispatcher<D: WindowSystem> {
    window: NativeWindow<D>,
    refocus: Refocus,
}

impl<D: WindowSystem> EventDispatcher<D> {
    pub fn new(window: NativeWindow<D>, refocus_delay: Duration) -> Self {
        Self {
            window,
            refocus: Refocus::new(refocus_delay),
        }
    }

    pub fn window(&self) -> &NativeWindow<D> {
        &self.window
    }

    pub fn window_mut(&mut self) -> &mut NativeWindow<D> {
        &mut self.window
    }

    pub fn state(&self) -> DispatcherState {
        if !self.window.is_live() {
            DispatcherState::Destroyed
        } else if self.window.is_mapped() {
            DispatcherState::Mapped
        } else {
            DispatcherState::Unmapped
        }
    }

    pub fn refocus_state(&self) -> RefocusState {
        self.refocus.state()
    }

    /// Run a delayed refocus task posted by this dispatcher
    pub fn continue_focus(&mut self, id: TaskId) -> RefocusOutcome {
        let outcome = self.refocus.run(id, self.window.browser());
        debug!(
            "Window 0x{:x}: refocus task {:?} -> {:?}",
            self.window.xwindow(),
            id,
            outcome
        );
        outcome
    }

    fn on_configure(&mut self, event: Window, window: Window, bounds: Rect) -> Result<EventResult> {
        if event != window {
            debug!("ConfigureNotify for 0x{:x} delivered to 0x{:x}", window, event);
        }
        // The window manager may resize us behind the browser's back
        self.window.set_cached_bounds(bounds);

        let Some(browser) = self.window.browser().get() else {
            return Ok(EventResult::Handled);
        };
        if let Some(child) = self.window.embedded_child() {
            let ws = self.window.window_system();
            ws.configure_window(
                child,
                &ConfigureWindowAux::new()
                    .width(bounds.width)
                    .height(bounds.height),
            )?;
            browser.notify_move_or_resize_started();
        }
        Ok(EventResult::Handled)
    }

    fn on_client_message(
        &mut self,
        message: &ClientMessageEvent,
        ctx: &mut DispatchContext<'_>,
    ) -> Result<EventResult> {
        let atoms = self.window.window_system().atoms().clone();
        if message.type_ != atoms.wm_protocols || message.format != 32 {
            return Ok(EventResult::Ignore);
        }

        let protocol: Atom = message.data.as_data32()[0];
        if protocol == atoms.wm_delete_window {
            self.on_delete_window(ctx)
        } else if protocol == atoms.net_wm_ping {
            self.on_ping(message)
        } else {
            debug!("Unhandled WM_PROTOCOLS message {}", protocol);
            Ok(EventResult::Ignore)
        }
    }

    fn on_delete_window(&mut self, ctx: &mut DispatchContext<'_>) -> Result<EventResult> {
        let xwindow = self.window.xwindow();
        let browser = self.window.browser().get();
        if let Some(browser) = &browser {
            if !browser.try_close_browser() {
                info!("Close of window 0x{:x} vetoed by browser", xwindow);
                return Ok(EventResult::Handled);
            }
        }

        self.refocus.focus_out(ctx.tasks);
        let destroyed = self.window.destroy();
        // Handle is already cleared, so the browser hears about it either way
        if let Some(browser) = browser {
            browser.window_destroyed();
        }
        destroyed?;
        Ok(EventResult::Destroyed)
    }

    fn on_ping(&self, message: &ClientMessageEvent) -> Result<EventResult> {
        let ws = self.window.window_system();
        let parent = self.window.parent();
        let mut reply = message.clone();
        reply.window = parent;
        ws.send_event(
            parent,
            EventMask::SUBSTRUCTURE_REDIRECT | EventMask::SUBSTRUCTURE_NOTIFY,
            &reply,
        )?;
        ws.flush()?;
        debug!("Answered _NET_WM_PING for 0x{:x}", self.window.xwindow());
        Ok(EventResult::Handled)
    }

    fn on_property(&self, atom: Atom) -> Result<EventResult> {
        let ws = self.window.window_system();
        let atoms = ws.atoms();
        if atom != atoms.net_wm_state {
            return Ok(EventResult::Ignore);
        }
        let Some(child) = self.window.embedded_child() else {
            return Ok(EventResult::Handled);
        };

        // Mirror minimize/maximize state so the toolkit can throttle a
        // hidden view. An empty list is still written: the toolkit only
        // reacts to a property change, not to its absence.
        let state = ws
            .get_property32(self.window.xwindow(), atoms.net_wm_state, atoms.atom)
            .unwrap_or_default();
        ws.change_property32(child, atoms.net_wm_state, atoms.atom, &state)?;
        debug!("Forwarded {} _NET_WM_STATE atoms to 0x{:x}", state.len(), child);
        Ok(EventResult::Handled)
    }
}

impl<D: WindowSystem> PlatformEventDispatcher for EventDispatcher<D> {
    fn can_dispatch(&self, event: &PlatformEvent) -> bool {
        self.window.is_live() && event.target() == Some(self.window.xwindow())
    }

    fn dispatch(&mut self, event: &PlatformEvent, ctx: &mut DispatchContext<'_>) -> EventResult {
        if !self.can_dispatch(event) {
            return EventResult::Ignore;
        }
        let xwindow = self.window.xwindow();

        let result = match event {
            PlatformEvent::Configure {
                event,
                window,
                x,
                y,
                width,
                height,
            } => self.on_configure(*event, *window, Rect::new(*x, *y, *width, *height)),
            PlatformEvent::ClientMessage(message) => self.on_client_message(message, ctx),
            PlatformEvent::FocusIn { .. } => {
                self.refocus.focus_in(xwindow, ctx.tasks, ctx.now);
                Ok(EventResult::Handled)
            }
            PlatformEvent::FocusOut { .. } => {
                self.refocus.focus_out(ctx.tasks);
                Ok(EventResult::Handled)
            }
            PlatformEvent::Property { atom, .. } => self.on_property(*atom),
            PlatformEvent::Input { .. } | PlatformEvent::Other { .. } => Ok(EventResult::Ignore),
        };

        result.unwrap_or_else(|e| {
            warn!("Window 0x{:x}: failed to handle {:?}: {}", xwindow, event, e);
            if self.window.is_live() {
                EventResult::Handled
            } else {
                EventResult::Destroyed
            }
        })
    }
}

/// Owns every host window, keyed by native handle
pub struct WindowRegistry<D: WindowSystem> {
    ws: Arc<D>,
    windows: HashMap<Window, EventDispatcher<D>>,
    tasks: TaskQueue<WindowTask>,
    refocus_delay: Duration,
}

impl<D: WindowSystem> WindowRegistry<D> {
    pub fn new(ws: Arc<D>, refocus_delay: Duration) -> Self {
        Self {
            ws,
            windows: HashMap::new(),
            tasks: TaskQueue::new(),
            refocus_delay,
        }
    }

    pub fn window_system(&self) -> &Arc<D> {
        &self.ws
    }

    /// Create a host window and start dispatching its events
    pub fn create_window(
        &mut self,
        browser: BrowserRef,
        parent: Window,
        bounds: Rect,
        name: &str,
    ) -> Result<Window> {
        let window = NativeWindow::create(self.ws.clone(), browser, parent, bounds, name)?;
        let id = window.xwindow();
        self.windows
            .insert(id, EventDispatcher::new(window, self.refocus_delay));
        Ok(id)
    }

    pub fn window(&self, id: Window) -> Option<&NativeWindow<D>> {
        self.windows.get(&id).map(EventDispatcher::window)
    }

    pub fn window_mut(&mut self, id: Window) -> Option<&mut NativeWindow<D>> {
        self.windows.get_mut(&id).map(EventDispatcher::window_mut)
    }

    pub fn dispatcher(&self, id: Window) -> Option<&EventDispatcher<D>> {
        self.windows.get(&id)
    }

    pub fn contains(&self, id: Window) -> bool {
        self.windows.contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.windows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.windows.is_empty()
    }

    /// Route an event to the window it targets
    pub fn dispatch(&mut self, event: &PlatformEvent, now: Instant) -> EventResult {
        let Some(target) = event.target() else {
            return EventResult::Ignore;
        };
        let Some(dispatcher) = self.windows.get_mut(&target) else {
            return EventResult::Ignore;
        };

        let mut ctx = DispatchContext {
            tasks: &mut self.tasks,
            now,
        };
        let result = dispatcher.dispatch(event, &mut ctx);
        if result == EventResult::Destroyed {
            self.windows.remove(&target);
            info!("Released host window record 0x{:x}", target);
        }
        result
    }

    pub fn dispatch_x11(&mut self, event: &Event, now: Instant) -> EventResult {
        self.dispatch(&PlatformEvent::from_x11(event), now)
    }

    /// Run every delayed task that is due. Returns how many applied focus.
    pub fn run_due_tasks(&mut self, now: Instant) -> usize {
        let mut applied = 0;
        for (id, task) in self.tasks.take_due(now) {
            match task {
                WindowTask::ContinueFocus { window } => {
                    let Some(dispatcher) = self.windows.get_mut(&window) else {
                        continue;
                    };
                    if dispatcher.continue_focus(id) == RefocusOutcome::Applied {
                        applied += 1;
                    }
                }
            }
        }
        applied
    }

    pub fn next_deadline(&self) -> Option<Instant> {
        self.tasks.next_deadline()
    }

    pub fn pending_tasks(&self) -> usize {
        self.tasks.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::browser::BrowserHost;
    use crate::focus::REFOCUS_DELAY;
    use crate::testing::{FakeDisplay, RecordingBrowser, ROOT};

    const SHELL: Window = 10;
    const CHILD: Window = 0x500;

    struct Fixture {
        ws: Arc<FakeDisplay>,
        registry: WindowRegistry<FakeDisplay>,
        recorder: Arc<RecordingBrowser>,
        _browser: Arc<dyn BrowserHost>,
        id: Window,
    }

    fn fixture(recorder: Arc<RecordingBrowser>) -> Fixture {
        let ws = Arc::new(FakeDisplay::new());
        ws.add_window(SHELL, ROOT);
        let browser: Arc<dyn BrowserHost> = recorder.clone();
        let mut registry = WindowRegistry::new(ws.clone(), REFOCUS_DELAY);
        let id = registry
            .create_window(BrowserRef::new(&browser), SHELL, Rect::new(0, 0, 800, 600), "t")
            .unwrap();
        ws.add_window(CHILD, id);
        registry.window_mut(id).unwrap().show().unwrap();
        Fixture {
            ws,
            registry,
            recorder,
            _browser: browser,
            id,
        }
    }

    fn protocol_message(f: &Fixture, protocol: Atom) -> PlatformEvent {
        let atoms = f.ws.atoms();
        PlatformEvent::ClientMessage(ClientMessageEvent::new(
            32,
            f.id,
            atoms.wm_protocols,
            [protocol, 0, 0, 0, 0],
        ))
    }

    fn delete_message(f: &Fixture) -> PlatformEvent {
        protocol_message(f, f.ws.atoms().wm_delete_window)
    }

    #[test]
    fn test_accepted_close_destroys_once() {
        let mut f = fixture(RecordingBrowser::allowing_close());
        let now = Instant::now();
        let close = delete_message(&f);

        assert_eq!(f.registry.dispatch(&close, now), EventResult::Destroyed);
        assert_eq!(f.recorder.destroyed.get(), 1);
        assert!(!f.registry.contains(f.id));
        assert!(!f.ws.exists(f.id));
        assert_eq!(*f.ws.destroyed.borrow(), vec![f.id]);

        // No further dispatch reaches the window
        assert_eq!(f.registry.dispatch(&close, now), EventResult::Ignore);
        let focus_in = PlatformEvent::FocusIn { window: f.id };
        assert_eq!(f.registry.dispatch(&focus_in, now), EventResult::Ignore);
        assert_eq!(f.recorder.destroyed.get(), 1);
        assert_eq!(f.recorder.close_requests.get(), 1);
    }

    #[test]
    fn test_rejected_close_keeps_window() {
        let mut f = fixture(RecordingBrowser::vetoing_close());
        let close = delete_message(&f);

        assert_eq!(f.registry.dispatch(&close, Instant::now()), EventResult::Handled);
        assert_eq!(f.recorder.close_requests.get(), 1);
        assert_eq!(f.recorder.destroyed.get(), 0);
        let window = f.registry.window(f.id).unwrap();
        assert!(window.is_live());
        assert!(window.is_mapped());
        assert!(f.ws.is_mapped(f.id));
        assert!(f.ws.destroyed.borrow().is_empty());
        assert_eq!(
            f.registry.dispatcher(f.id).unwrap().state(),
            DispatcherState::Mapped
        );
    }

    #[test]
    fn test_close_without_browser() {
        let ws = Arc::new(FakeDisplay::new());
        let mut registry = WindowRegistry::new(ws.clone(), REFOCUS_DELAY);
        let id = registry
            .create_window(BrowserRef::none(), 0, Rect::new(0, 0, 10, 10), "")
            .unwrap();
        let atoms = ws.atoms().clone();
        let close = PlatformEvent::ClientMessage(ClientMessageEvent::new(
            32,
            id,
            atoms.wm_protocols,
            [atoms.wm_delete_window, 0, 0, 0, 0],
        ));

        assert_eq!(registry.dispatch(&close, Instant::now()), EventResult::Destroyed);
        assert!(registry.is_empty());
    }

    #[test]
    fn test_ping_is_echoed_to_parent() {
        let mut f = fixture(RecordingBrowser::allowing_close());
        let ping = protocol_message(&f, f.ws.atoms().net_wm_ping);
        let flushes = f.ws.flushes.get();

        assert_eq!(f.registry.dispatch(&ping, Instant::now()), EventResult::Handled);
        assert_eq!(f.ws.flushes.get(), flushes + 1);
        let sent = f.ws.sent.borrow();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].destination, SHELL);
        assert_eq!(sent[0].message.window, SHELL);
        assert_eq!(sent[0].message.data.as_data32()[0], f.ws.atoms().net_wm_ping);
        assert!(sent[0].mask.contains(EventMask::SUBSTRUCTURE_REDIRECT));
        assert!(sent[0].mask.contains(EventMask::SUBSTRUCTURE_NOTIFY));
        assert!(f.registry.contains(f.id));
    }

    #[test]
    fn test_focus_in_then_out_never_applies() {
        let mut f = fixture(RecordingBrowser::allowing_close());
        let now = Instant::now();

        f.registry.dispatch(&PlatformEvent::FocusIn { window: f.id }, now);
        f.registry.dispatch(&PlatformEvent::FocusOut { window: f.id }, now);

        assert_eq!(f.registry.pending_tasks(), 0);
        assert_eq!(f.registry.run_due_tasks(now + REFOCUS_DELAY * 2), 0);
        assert!(f.recorder.focus_calls.borrow().is_empty());
    }

    #[test]
    fn test_focus_in_applies_once_after_delay() {
        let mut f = fixture(RecordingBrowser::allowing_close());
        let now = Instant::now();
        let focus_in = PlatformEvent::FocusIn { window: f.id };

        f.registry.dispatch(&focus_in, now);
        f.registry.dispatch(&focus_in, now + Duration::from_millis(10));
        assert_eq!(f.registry.pending_tasks(), 1);
        assert_eq!(f.registry.next_deadline(), Some(now + REFOCUS_DELAY));

        assert_eq!(f.registry.run_due_tasks(now + Duration::from_millis(99)), 0);
        assert_eq!(f.registry.run_due_tasks(now + REFOCUS_DELAY), 1);
        assert_eq!(f.registry.run_due_tasks(now + REFOCUS_DELAY * 3), 0);
        assert_eq!(*f.recorder.focus_calls.borrow(), vec![true]);
        assert_eq!(
            f.registry.dispatcher(f.id).unwrap().refocus_state(),
            RefocusState::Idle
        );
    }

    #[test]
    fn test_destroy_cancels_pending_refocus() {
        let mut f = fixture(RecordingBrowser::allowing_close());
        let now = Instant::now();
        f.registry.dispatch(&PlatformEvent::FocusIn { window: f.id }, now);
        let close = delete_message(&f);
        f.registry.dispatch(&close, now);

        assert_eq!(f.registry.pending_tasks(), 0);
        assert_eq!(f.registry.run_due_tasks(now + REFOCUS_DELAY), 0);
        assert!(f.recorder.focus_calls.borrow().is_empty());
    }

    #[test]
    fn test_configure_resizes_child_and_notifies() {
        let mut f = fixture(RecordingBrowser::allowing_close());
        let configure = PlatformEvent::Configure {
            event: f.id,
            window: f.id,
            x: 5,
            y: 6,
            width: 1000,
            height: 700,
        };

        assert_eq!(f.registry.dispatch(&configure, Instant::now()), EventResult::Handled);
        assert_eq!(f.registry.window(f.id).unwrap().bounds(), Rect::new(5, 6, 1000, 700));
        let resized = f.ws.configures_of(CHILD);
        assert_eq!(resized.len(), 1);
        assert_eq!((resized[0].width, resized[0].height), (Some(1000), Some(700)));
        assert_eq!((resized[0].x, resized[0].y), (None, None));
        assert_eq!(f.recorder.move_resize.get(), 1);
    }

    #[test]
    fn test_wm_state_is_forwarded_to_child() {
        let mut f = fixture(RecordingBrowser::allowing_close());
        let atoms = f.ws.atoms().clone();
        let hidden = 0x2222;
        f.ws.preset_property32(f.id, atoms.net_wm_state, atoms.atom, &[hidden]);
        let changed = PlatformEvent::Property {
            window: f.id,
            atom: atoms.net_wm_state,
        };

        assert_eq!(f.registry.dispatch(&changed, Instant::now()), EventResult::Handled);
        assert_eq!(f.ws.writes_to(CHILD, atoms.net_wm_state), vec![vec![hidden]]);
    }

    #[test]
    fn test_empty_wm_state_is_written_explicitly() {
        let mut f = fixture(RecordingBrowser::allowing_close());
        let atoms = f.ws.atoms().clone();
        assert!(f.ws.writes_to(CHILD, atoms.net_wm_state).is_empty());
        assert_eq!(f.ws.property32(CHILD, atoms.net_wm_state), None);

        let changed = PlatformEvent::Property {
            window: f.id,
            atom: atoms.net_wm_state,
        };
        f.registry.dispatch(&changed, Instant::now());

        assert_eq!(f.ws.writes_to(CHILD, atoms.net_wm_state), vec![Vec::<u32>::new()]);
        assert_eq!(f.ws.property32(CHILD, atoms.net_wm_state), Some(Vec::new()));
    }

    #[test]
    fn test_xinput_events_route_to_host_window() {
        use x11rb::protocol::xinput::{ButtonPressEvent, EnterEvent};

        let mut f = fixture(RecordingBrowser::allowing_close());
        let press = Event::XinputButtonPress(ButtonPressEvent {
            event: f.id,
            child: CHILD,
            ..Default::default()
        });
        let enter = Event::XinputEnter(EnterEvent {
            event: f.id,
            child: CHILD,
            ..Default::default()
        });

        for raw in [&press, &enter] {
            let event = PlatformEvent::from_x11(raw);
            assert_eq!(event.target(), Some(f.id));
            assert!(f.registry.dispatcher(f.id).unwrap().can_dispatch(&event));
            assert_eq!(f.registry.dispatch_x11(raw, Instant::now()), EventResult::Ignore);
        }
        assert!(f.registry.contains(f.id));
    }

    #[test]
    fn test_other_properties_and_foreign_events_ignored() {
        let mut f = fixture(RecordingBrowser::allowing_close());
        let now = Instant::now();
        let other_property = PlatformEvent::Property {
            window: f.id,
            atom: f.ws.atoms().net_wm_name,
        };
        assert_eq!(f.registry.dispatch(&other_property, now), EventResult::Ignore);

        let foreign = PlatformEvent::FocusIn { window: SHELL };
        assert_eq!(f.registry.dispatch(&foreign, now), EventResult::Ignore);
        assert_eq!(f.registry.pending_tasks(), 0);

        let input = PlatformEvent::Input { window: f.id };
        assert!(f.registry.dispatcher(f.id).unwrap().can_dispatch(&input));
        assert_eq!(f.registry.dispatch(&input, now), EventResult::Ignore);
    }
}
