//! Parent/child message protocol
//!
//! Message names are namespaced (`EMBED:INIT`, ...) so they cannot collide
//! with other traffic on the same transport. Every child-to-parent message
//! is routed through [`dispatch`], which decodes the payload and calls the
//! matching [`ChildMessageHandler`] method.

use core::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::definition::Context;
use crate::error::{EmbedError, Result};
use crate::props::NormalizedProps;

/// Protocol message types.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum MessageType {
    /// child -> parent handshake
    Init,
    /// child -> parent, tear the instance down
    Close,
    /// child -> parent, bring the popup to the foreground
    Focus,
    /// child -> parent, resize the frame
    Resize,
    /// child -> parent, tear down and navigate the host page
    Redirect,
    /// child -> parent, invoke a function prop
    PropCallback,
    /// parent -> child, normalized props changed
    Props,
}

impl MessageType {
    /// Messages the parent listens for.
    pub const INBOUND: [MessageType; 6] = [
        MessageType::Init,
        MessageType::Close,
        MessageType::Focus,
        MessageType::Resize,
        MessageType::Redirect,
        MessageType::PropCallback,
    ];

    /// Wire name.
    pub fn name(&self) -> &'static str {
        match self {
            MessageType::Init => "EMBED:INIT",
            MessageType::Close => "EMBED:CLOSE",
            MessageType::Focus => "EMBED:FOCUS",
            MessageType::Resize => "EMBED:RESIZE",
            MessageType::Redirect => "EMBED:REDIRECT",
            MessageType::PropCallback => "EMBED:PROP_CALLBACK",
            MessageType::Props => "EMBED:PROPS",
        }
    }

    /// Look up a message type by wire name.
    pub fn from_name(name: &str) -> Option<Self> {
        MessageType::INBOUND
            .into_iter()
            .chain([MessageType::Props])
            .find(|ty| ty.name() == name)
    }
}

impl fmt::Display for MessageType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Reply to INIT.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct InitReply {
    pub context: Context,
    pub props: NormalizedProps,
}

/// RESIZE payload.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResizeRequest {
    pub width: u32,
    pub height: u32,
}

/// REDIRECT payload.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RedirectRequest {
    pub url: String,
}

/// PROP_CALLBACK payload.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PropCallbackRequest {
    pub key: String,
    #[serde(default)]
    pub args: Vec<Value>,
}

/// PROPS payload.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct PropsUpdate {
    pub props: NormalizedProps,
}

/// Parent-side reactions to child messages.
pub trait ChildMessageHandler {
    fn on_init(&self) -> Result<InitReply>;
    fn on_close(&self) -> Result<()>;
    fn on_focus(&self) -> Result<()>;
    fn on_resize(&self, request: ResizeRequest) -> Result<()>;
    fn on_redirect(&self, request: RedirectRequest) -> Result<()>;
    fn on_prop_callback(&self, request: PropCallbackRequest) -> Result<Value>;
}

/// Decode `payload` for `message` and run the matching handler.
///
/// The handler's result is encoded as the reply value; messages without a
/// reply answer with null.
pub fn dispatch(
    handler: &dyn ChildMessageHandler,
    message: MessageType,
    payload: Value,
) -> Result<Value> {
    match message {
        MessageType::Init => Ok(serde_json::to_value(handler.on_init()?)?),
        MessageType::Close => handler.on_close().map(|_| Value::Null),
        MessageType::Focus => handler.on_focus().map(|_| Value::Null),
        MessageType::Resize => {
            let request: ResizeRequest = serde_json::from_value(payload)?;
            handler.on_resize(request).map(|_| Value::Null)
        }
        MessageType::Redirect => {
            let request: RedirectRequest = serde_json::from_value(payload)?;
            handler.on_redirect(request).map(|_| Value::Null)
        }
        MessageType::PropCallback => {
            let request: PropCallbackRequest = serde_json::from_value(payload)?;
            handler.on_prop_callback(request)
        }
        MessageType::Props => Err(EmbedError::protocol(format!(
            "{} is only sent from parent to child",
            message
        ))),
    }
}
