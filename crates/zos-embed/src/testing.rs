//! In-memory collaborators for testing.
//!
//! [`MockPlatform`] records every frame, popup and host navigation and
//! runs timers from a manual clock. [`MockTransport`] records sent
//! messages and lets tests deliver inbound ones.

use core::cell::{Cell, RefCell};
use std::future;
use std::rc::Rc;

use serde_json::Value;

use crate::bridge::MessageType;
use crate::error::{EmbedError, Result};
use crate::platform::{
    BoxedFrame, BoxedPopup, Frame, Handler, Mount, Platform, Popup, PopupFeatures, Position, Reply,
    Size, Subscription, Transport,
};

/// Window handle handed out by [`MockPlatform`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MockWindow(pub u64);

/// How [`MockPlatform::open_popup`] behaves.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PopupMode {
    /// Popup opens normally
    Open,
    /// `window.open` returns nothing
    Blocked,
    /// Popup is returned already closed
    Closed,
    /// Popup's closed flag can not be read
    Unreadable,
}

/// Snapshot of a created frame.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FrameRecord {
    pub window: MockWindow,
    pub mount: Mount,
    pub size: Size,
    pub position: Option<Position>,
    pub src: Option<String>,
    pub attached: bool,
    /// Times `detach` was called
    pub detach_count: u32,
}

/// Snapshot of an opened popup.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PopupRecord {
    pub window: MockWindow,
    pub features: PopupFeatures,
    pub location: Option<String>,
    pub closed: bool,
    pub focus_count: u32,
    pub close_count: u32,
}

struct PendingTimer {
    due: u64,
    seq: u64,
    callback: Box<dyn FnOnce()>,
}

/// Mock platform for unit testing.
pub struct MockPlatform {
    viewport: Cell<Size>,
    popup_mode: Cell<PopupMode>,
    /// Frames report no content window
    windowless_frames: Cell<bool>,
    next_window: Cell<u64>,
    /// Known mount elements; None accepts any element
    elements: RefCell<Option<Vec<String>>>,
    frames: RefCell<Vec<Rc<RefCell<FrameRecord>>>>,
    popups: RefCell<Vec<Rc<RefCell<PopupRecord>>>>,
    popup_attempts: Cell<u32>,
    navigations: RefCell<Vec<String>>,
    /// Simulated time in milliseconds
    now: Cell<u64>,
    timer_seq: Cell<u64>,
    timers: RefCell<Vec<PendingTimer>>,
}

impl Default for MockPlatform {
    fn default() -> Self {
        Self::new()
    }
}

impl MockPlatform {
    /// Create a mock platform with a 1024x768 viewport.
    pub fn new() -> Self {
        Self {
            viewport: Cell::new(Size::new(1024, 768)),
            popup_mode: Cell::new(PopupMode::Open),
            windowless_frames: Cell::new(false),
            next_window: Cell::new(1),
            elements: RefCell::new(None),
            frames: RefCell::new(Vec::new()),
            popups: RefCell::new(Vec::new()),
            popup_attempts: Cell::new(0),
            navigations: RefCell::new(Vec::new()),
            now: Cell::new(0),
            timer_seq: Cell::new(0),
            timers: RefCell::new(Vec::new()),
        }
    }

    pub fn set_viewport(&self, size: Size) {
        self.viewport.set(size);
    }

    pub fn set_popup_mode(&self, mode: PopupMode) {
        self.popup_mode.set(mode);
    }

    pub fn set_windowless_frames(&self, windowless: bool) {
        self.windowless_frames.set(windowless);
    }

    /// Restrict element mounts to the given selectors.
    pub fn set_elements(&self, selectors: &[&str]) {
        *self.elements.borrow_mut() = Some(selectors.iter().map(|s| s.to_string()).collect());
    }

    pub fn frames(&self) -> Vec<FrameRecord> {
        self.frames.borrow().iter().map(|f| f.borrow().clone()).collect()
    }

    pub fn popups(&self) -> Vec<PopupRecord> {
        self.popups.borrow().iter().map(|p| p.borrow().clone()).collect()
    }

    /// Calls to `open_popup`, including blocked ones.
    pub fn popup_attempts(&self) -> u32 {
        self.popup_attempts.get()
    }

    /// Host page navigations, in order.
    pub fn navigations(&self) -> Vec<String> {
        self.navigations.borrow().clone()
    }

    /// Simulate the user closing a popup.
    pub fn close_popup(&self, window: MockWindow) {
        for popup in self.popups.borrow().iter() {
            let mut record = popup.borrow_mut();
            if record.window == window {
                record.closed = true;
            }
        }
    }

    pub fn now(&self) -> u64 {
        self.now.get()
    }

    pub fn pending_timers(&self) -> usize {
        self.timers.borrow().len()
    }

    /// Advance the clock by `ms`, running due timers in order.
    pub fn advance(&self, ms: u64) {
        let target = self.now.get() + ms;
        loop {
            let next = {
                let mut timers = self.timers.borrow_mut();
                let index = timers
                    .iter()
                    .enumerate()
                    .filter(|(_, t)| t.due <= target)
                    .min_by_key(|(_, t)| (t.due, t.seq))
                    .map(|(i, _)| i);
                index.map(|i| timers.remove(i))
            };
            match next {
                Some(timer) => {
                    self.now.set(timer.due);
                    (timer.callback)();
                }
                None => break,
            }
        }
        self.now.set(target);
    }

    fn allocate_window(&self) -> MockWindow {
        let id = self.next_window.get();
        self.next_window.set(id + 1);
        MockWindow(id)
    }
}

struct MockFrame {
    record: Rc<RefCell<FrameRecord>>,
    windowless: bool,
}

impl Frame for MockFrame {
    type Window = MockWindow;

    fn content_window(&self) -> Option<MockWindow> {
        let record = self.record.borrow();
        (record.attached && !self.windowless).then_some(record.window)
    }

    fn set_size(&mut self, size: Size) {
        self.record.borrow_mut().size = size;
    }

    fn set_position(&mut self, position: Position) {
        self.record.borrow_mut().position = Some(position);
    }

    fn set_src(&mut self, url: &str) {
        self.record.borrow_mut().src = Some(url.to_string());
    }

    fn is_attached(&self) -> bool {
        self.record.borrow().attached
    }

    fn detach(&mut self) {
        let mut record = self.record.borrow_mut();
        record.attached = false;
        record.detach_count += 1;
    }
}

struct MockPopup {
    record: Rc<RefCell<PopupRecord>>,
    readable: bool,
}

impl Popup for MockPopup {
    type Window = MockWindow;

    fn window(&self) -> MockWindow {
        self.record.borrow().window
    }

    fn closed_state(&self) -> Option<bool> {
        self.readable.then(|| self.record.borrow().closed)
    }

    fn navigate(&mut self, url: &str) {
        self.record.borrow_mut().location = Some(url.to_string());
    }

    fn focus(&mut self) {
        self.record.borrow_mut().focus_count += 1;
    }

    fn close(&mut self) {
        let mut record = self.record.borrow_mut();
        record.closed = true;
        record.close_count += 1;
    }
}

impl Platform for MockPlatform {
    type Window = MockWindow;

    fn viewport(&self) -> Size {
        self.viewport.get()
    }

    fn create_frame(&self, mount: &Mount, size: Size) -> Result<BoxedFrame<MockWindow>> {
        if let (Mount::Element(element), Some(known)) = (mount, self.elements.borrow().as_ref()) {
            if !known.iter().any(|k| k == element.as_str()) {
                return Err(EmbedError::no_context(format!("element {} not found", element)));
            }
        }

        let record = Rc::new(RefCell::new(FrameRecord {
            window: self.allocate_window(),
            mount: mount.clone(),
            size,
            position: None,
            src: None,
            attached: true,
            detach_count: 0,
        }));
        self.frames.borrow_mut().push(record.clone());
        Ok(Box::new(MockFrame {
            record,
            windowless: self.windowless_frames.get(),
        }))
    }

    fn open_popup(&self, features: &PopupFeatures) -> Option<BoxedPopup<MockWindow>> {
        self.popup_attempts.set(self.popup_attempts.get() + 1);

        let mode = self.popup_mode.get();
        if mode == PopupMode::Blocked {
            return None;
        }

        let record = Rc::new(RefCell::new(PopupRecord {
            window: self.allocate_window(),
            features: *features,
            location: None,
            closed: mode == PopupMode::Closed,
            focus_count: 0,
            close_count: 0,
        }));
        self.popups.borrow_mut().push(record.clone());
        Some(Box::new(MockPopup {
            record,
            readable: mode != PopupMode::Unreadable,
        }))
    }

    fn navigate_host(&self, url: &str) {
        self.navigations.borrow_mut().push(url.to_string());
    }

    fn set_timeout(&self, delay_ms: u32, callback: Box<dyn FnOnce()>) {
        let seq = self.timer_seq.get();
        self.timer_seq.set(seq + 1);
        self.timers.borrow_mut().push(PendingTimer {
            due: self.now.get() + u64::from(delay_ms),
            seq,
            callback,
        });
    }
}

/// A message recorded by [`MockTransport::send`].
#[derive(Clone, Debug, PartialEq)]
pub struct SentMessage {
    pub target: MockWindow,
    pub message: MessageType,
    pub payload: Value,
}

struct Listener {
    message: MessageType,
    source: MockWindow,
    handler: Handler,
    cancels: Rc<Cell<u32>>,
}

/// Mock transport for unit testing.
#[derive(Default)]
pub struct MockTransport {
    sent: RefCell<Vec<SentMessage>>,
    listeners: RefCell<Vec<Listener>>,
    fail_sends: Cell<bool>,
    reply: RefCell<Option<Value>>,
}

impl MockTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent send fail with `MessageDelivery`.
    pub fn fail_sends(&self, fail: bool) {
        self.fail_sends.set(fail);
    }

    /// Reply value for successful sends (null by default).
    pub fn set_reply(&self, reply: Value) {
        *self.reply.borrow_mut() = Some(reply);
    }

    pub fn sent(&self) -> Vec<SentMessage> {
        self.sent.borrow().clone()
    }

    /// Sent messages of one type.
    pub fn sent_of(&self, message: MessageType) -> Vec<SentMessage> {
        self.sent
            .borrow()
            .iter()
            .filter(|m| m.message == message)
            .cloned()
            .collect()
    }

    /// Deliver `message` from `source` to its registered handler.
    ///
    /// # Returns
    /// * `Ok(reply)` - Handler ran and replied
    /// * `Err(EmbedError::MessageDelivery)` - No active handler
    /// * `Err(_)` - Error returned by the handler
    pub fn deliver(
        &self,
        source: MockWindow,
        message: MessageType,
        payload: Value,
    ) -> Result<Value> {
        let handler = self
            .listeners
            .borrow()
            .iter()
            .find(|l| l.message == message && l.source == source && l.cancels.get() == 0)
            .map(|l| l.handler.clone());

        match handler {
            Some(handler) => handler(payload),
            None => Err(EmbedError::delivery(format!(
                "no handler for {} from {:?}",
                message, source
            ))),
        }
    }

    /// Total subscriptions ever registered.
    pub fn subscription_count(&self) -> usize {
        self.listeners.borrow().len()
    }

    /// Subscriptions not yet cancelled.
    pub fn active_subscriptions(&self) -> usize {
        self.listeners.borrow().iter().filter(|l| l.cancels.get() == 0).count()
    }

    /// Cancel count of each subscription, in registration order.
    pub fn cancel_counts(&self) -> Vec<u32> {
        self.listeners.borrow().iter().map(|l| l.cancels.get()).collect()
    }
}

struct MockSubscription(Rc<Cell<u32>>);

impl Subscription for MockSubscription {
    fn cancel(&mut self) {
        self.0.set(self.0.get() + 1);
    }
}

impl Transport<MockWindow> for MockTransport {
    fn send(&self, target: &MockWindow, message: MessageType, payload: Value) -> Reply {
        self.sent.borrow_mut().push(SentMessage {
            target: *target,
            message,
            payload,
        });

        let result = if self.fail_sends.get() {
            Err(EmbedError::delivery(format!("{:?} is unreachable", target)))
        } else {
            Ok(self.reply.borrow().clone().unwrap_or(Value::Null))
        };
        Box::pin(future::ready(result))
    }

    fn on(
        &self,
        message: MessageType,
        source: &MockWindow,
        handler: Handler,
    ) -> Box<dyn Subscription> {
        let cancels = Rc::new(Cell::new(0));
        self.listeners.borrow_mut().push(Listener {
            message,
            source: *source,
            handler,
            cancels: cancels.clone(),
        });
        Box::new(MockSubscription(cancels))
    }
}
