//! Instance lifecycle: callbacks, owned subscriptions and terminal state

use core::fmt;
use core::mem;
use std::rc::Rc;

use crate::context::RenderState;
use crate::definition::Context;
use crate::error::EmbedError;
use crate::platform::Subscription;

/// Callback without arguments (onEnter, onExit, onClose).
pub type LifecycleCallback = Rc<dyn Fn()>;

/// Callback receiving the terminal error (onError, onTimeout).
pub type ErrorCallback = Rc<dyn Fn(&EmbedError)>;

/// Lifecycle callbacks of one instance. Unset callbacks are no-ops.
#[derive(Clone, Default)]
pub struct Callbacks {
    pub(crate) on_enter: Option<LifecycleCallback>,
    pub(crate) on_exit: Option<LifecycleCallback>,
    pub(crate) on_close: Option<LifecycleCallback>,
    pub(crate) on_error: Option<ErrorCallback>,
    pub(crate) on_timeout: Option<ErrorCallback>,
}

impl Callbacks {
    pub fn enter(&self) {
        if let Some(f) = &self.on_enter {
            f();
        }
    }

    pub fn exit(&self) {
        if let Some(f) = &self.on_exit {
            f();
        }
    }

    pub fn close(&self) {
        if let Some(f) = &self.on_close {
            f();
        }
    }

    /// Report a terminal error: onTimeout, falling back to onError.
    pub fn timeout(&self, err: &EmbedError) {
        if let Some(f) = self.on_timeout.as_ref().or(self.on_error.as_ref()) {
            f(err);
        }
    }
}

impl fmt::Debug for Callbacks {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Callbacks")
            .field("on_enter", &self.on_enter.is_some())
            .field("on_exit", &self.on_exit.is_some())
            .field("on_close", &self.on_close.is_some())
            .field("on_error", &self.on_error.is_some())
            .field("on_timeout", &self.on_timeout.is_some())
            .finish()
    }
}

/// Message subscriptions owned by an instance.
///
/// Each subscription is cancelled exactly once: on [`release`], or on drop
/// if the set was never released. Subscriptions added after release are
/// cancelled immediately.
///
/// [`release`]: SubscriptionSet::release
#[derive(Default)]
pub struct SubscriptionSet {
    subscriptions: Vec<Box<dyn Subscription>>,
    released: bool,
}

impl SubscriptionSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, mut subscription: Box<dyn Subscription>) {
        if self.released {
            subscription.cancel();
        } else {
            self.subscriptions.push(subscription);
        }
    }

    pub fn len(&self) -> usize {
        self.subscriptions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.subscriptions.is_empty()
    }

    /// Move the held subscriptions into a new set and mark this one
    /// released. Lets the caller cancel them outside any borrow of `self`.
    pub fn take(&mut self) -> SubscriptionSet {
        self.released = true;
        SubscriptionSet {
            subscriptions: mem::take(&mut self.subscriptions),
            released: false,
        }
    }

    /// Cancel every held subscription.
    pub fn release(&mut self) {
        self.released = true;
        for mut subscription in self.subscriptions.drain(..) {
            subscription.cancel();
        }
    }
}

impl Drop for SubscriptionSet {
    fn drop(&mut self) {
        self.release();
    }
}

/// Why an instance was cleaned up.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ExitReason {
    /// `close()` or a CLOSE message
    Closed,
    /// REDIRECT message
    Redirected,
    /// `destroy(err)`, including handshake timeout
    Destroyed,
}

impl ExitReason {
    /// Whether onClose fires for this exit.
    pub fn is_close(&self) -> bool {
        matches!(self, ExitReason::Closed | ExitReason::Redirected)
    }
}

impl fmt::Display for ExitReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExitReason::Closed => f.write_str("closed"),
            ExitReason::Redirected => f.write_str("redirected"),
            ExitReason::Destroyed => f.write_str("destroyed"),
        }
    }
}

/// Render state, handshake flag and terminal transition of one instance.
#[derive(Clone, Debug)]
pub struct LifecycleController {
    state: RenderState,
    entered: bool,
    exit: Option<ExitReason>,
    timeout_ms: Option<u32>,
}

impl LifecycleController {
    pub fn new(timeout_ms: Option<u32>) -> Self {
        Self {
            state: RenderState::Unrendered,
            entered: false,
            exit: None,
            timeout_ms,
        }
    }

    pub fn state(&self) -> RenderState {
        self.state
    }

    pub fn timeout_ms(&self) -> Option<u32> {
        self.timeout_ms
    }

    pub fn is_entered(&self) -> bool {
        self.entered
    }

    pub fn exit_reason(&self) -> Option<ExitReason> {
        self.exit
    }

    /// Enter `Rendering(context)`. Only valid from `Unrendered`.
    pub fn begin_render(&mut self, context: Context) -> bool {
        match self.state {
            RenderState::Unrendered | RenderState::Rendering(_) => {
                self.state = RenderState::Rendering(context);
                true
            }
            RenderState::Active(_) | RenderState::Destroyed => false,
        }
    }

    /// Render finished in `context`.
    pub fn activate(&mut self, context: Context) {
        if !self.state.is_destroyed() {
            self.state = RenderState::Active(context);
        }
    }

    /// Render failed; back to `Unrendered`.
    pub fn abort_render(&mut self) {
        if let RenderState::Rendering(_) = self.state {
            self.state = RenderState::Unrendered;
        }
    }

    /// Record the handshake. Returns true the first time only.
    pub fn mark_entered(&mut self) -> bool {
        if self.entered || self.state.is_destroyed() {
            return false;
        }
        self.entered = true;
        true
    }

    /// Checked when the handshake timer fires.
    pub fn should_fire_timeout(&self) -> bool {
        !self.entered && !self.state.is_destroyed()
    }

    /// Enter `Destroyed`. Returns false if already there.
    pub fn begin_cleanup(&mut self, reason: ExitReason) -> bool {
        if self.state.is_destroyed() {
            return false;
        }
        self.state = RenderState::Destroyed;
        self.exit = Some(reason);
        true
    }
}
