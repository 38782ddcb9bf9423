//! Collaborator interfaces
//!
//! The embedding core never touches browser primitives directly. Window
//! and frame creation, host navigation and timers go through [`Platform`];
//! cross-window messaging goes through [`Transport`].
//!
//! # Implementations
//!
//! - **Browser** (`wasm` feature): `WebPlatform` / `JsTransport` over web-sys
//! - **Tests**: `MockPlatform` / `MockTransport` in [`crate::testing`]

use core::fmt;
use core::future::Future;
use core::pin::Pin;
use std::rc::Rc;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::bridge::MessageType;
use crate::error::Result;

/// Width and height in CSS pixels.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Size {
    pub width: u32,
    pub height: u32,
}

impl Size {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }
}

/// Top-left corner in CSS pixels.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Position {
    pub x: i32,
    pub y: i32,
}

/// Reference to a host element, by id or selector.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ElementRef(pub String);

impl ElementRef {
    pub fn new(selector: impl Into<String>) -> Self {
        Self(selector.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ElementRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Where a frame is attached.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Mount {
    /// Under a caller-supplied element (iframe context)
    Element(ElementRef),
    /// Directly under the document body (lightbox context)
    DocumentRoot,
}

/// Geometry requested when opening a popup window.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PopupFeatures {
    pub width: u32,
    pub height: u32,
    pub top: i32,
    pub left: i32,
}

impl PopupFeatures {
    /// `window.open` feature string.
    pub fn to_feature_string(&self) -> String {
        format!(
            "width={},height={},top={},left={}",
            self.width, self.height, self.top, self.left
        )
    }
}

/// A frame element owned by one instance.
pub trait Frame {
    /// Message-target handle of the frame's content
    type Window;

    /// Content window, once the frame is attached.
    fn content_window(&self) -> Option<Self::Window>;

    fn set_size(&mut self, size: Size);

    /// Absolutely position the frame.
    fn set_position(&mut self, position: Position);

    /// Load `url` into the frame.
    fn set_src(&mut self, url: &str);

    /// Whether the frame still has a parent node.
    fn is_attached(&self) -> bool;

    /// Remove the frame from its parent.
    fn detach(&mut self);
}

/// A popup window owned by one instance.
pub trait Popup {
    type Window;

    fn window(&self) -> Self::Window;

    /// `Some(closed)` when the closed flag is readable, None when the
    /// browser hides it (treated as blocked).
    fn closed_state(&self) -> Option<bool>;

    /// Set the popup's location.
    fn navigate(&mut self, url: &str);

    fn focus(&mut self);

    fn close(&mut self);
}

/// Boxed frame for a platform's window type.
pub type BoxedFrame<W> = Box<dyn Frame<Window = W>>;

/// Boxed popup for a platform's window type.
pub type BoxedPopup<W> = Box<dyn Popup<Window = W>>;

/// Window, frame and timer primitives of the host environment.
pub trait Platform: 'static {
    /// Handle used to address a child window over the transport
    type Window: Clone + fmt::Debug + 'static;

    /// Current viewport size (used for centering).
    fn viewport(&self) -> Size;

    /// Create a frame of `size` and attach it at `mount`.
    ///
    /// # Returns
    /// * `Ok(frame)` - Frame attached
    /// * `Err(EmbedError::NoContext)` - Mount point does not exist
    fn create_frame(&self, mount: &Mount, size: Size) -> Result<BoxedFrame<Self::Window>>;

    /// Open a blank popup window. None means the browser refused.
    fn open_popup(&self, features: &PopupFeatures) -> Option<BoxedPopup<Self::Window>>;

    /// Navigate the host page away.
    fn navigate_host(&self, url: &str);

    /// Run `callback` once after `delay_ms`.
    fn set_timeout(&self, delay_ms: u32, callback: Box<dyn FnOnce()>);
}

/// Result of a send, resolved when the peer replies.
pub type Reply = Pin<Box<dyn Future<Output = Result<Value>>>>;

/// Inbound message handler. The returned value is sent back as the reply;
/// an error is reported to the sender.
pub type Handler = Rc<dyn Fn(Value) -> Result<Value>>;

/// A registered handler. Cancelling unregisters it.
pub trait Subscription {
    fn cancel(&mut self);
}

/// Cross-window messaging.
pub trait Transport<W>: 'static {
    /// Send `message` to `target` and await the peer's reply.
    fn send(&self, target: &W, message: MessageType, payload: Value) -> Reply;

    /// Handle `message` when it arrives from `source`.
    fn on(&self, message: MessageType, source: &W, handler: Handler) -> Box<dyn Subscription>;
}
