//! Host-side embedding of remote UI components
//!
//! This crate embeds a remotely hosted UI unit (the "child") into a host
//! page and drives its lifecycle over a bidirectional message protocol:
//! - Prop validation, normalization and query-string transport
//! - Rendering context selection (iframe, popup, lightbox) with fallback
//! - Window and frame ownership
//! - Handshake, resize, close, redirect and timeout handling
//! - Singleton enforcement through an injected registry
//!
//! ## Architecture
//!
//! ```text
//! ParentComponent
//!   ├── PropsManager ───────── validate → normalize → serialize
//!   ├── ContextSelector ────── RenderPlan (ordered attempts)
//!   ├── WindowHost ─────────── Platform (frames, popups, timers)
//!   ├── bridge::dispatch ───── Transport (send / on)
//!   ├── LifecycleController ── entered flag, terminal state
//!   └── ComponentRegistry ──── active instances, singleton check
//! ```
//!
//! - [`definition`]: Component schema, loadable from JSON
//! - [`props`]: Prop values and the three-stage prop pipeline
//! - [`context`]: Render state machine and context selection
//! - [`host`]: Window/frame ownership and centering
//! - [`bridge`]: Message types, payloads and dispatch
//! - [`lifecycle`]: Callbacks, owned subscriptions, terminal transitions
//! - [`registry`]: Active instance registry
//! - [`component`]: [`ParentComponent`], tying it all together
//! - [`platform`]: Collaborator traits
//! - [`testing`]: In-memory collaborators
//!
//! ## Example
//!
//! ```rust
//! use std::rc::Rc;
//! use zos_embed::testing::{MockPlatform, MockTransport};
//! use zos_embed::{
//!     ComponentDefinition, ComponentOptions, ComponentRegistry, Context, Dimensions, HostContext,
//!     ParentComponent, PropDescriptor, PropType, PropValue, Props,
//! };
//!
//! let dimensions = Dimensions::new(400, 300);
//! let definition = ComponentDefinition::new("login", "https://child.example/login", dimensions)
//!     .with_context(Context::Lightbox)
//!     .with_prop("email", PropDescriptor::required(PropType::String));
//!
//! let host = HostContext::new(
//!     Rc::new(MockPlatform::new()),
//!     Rc::new(MockTransport::new()),
//!     Rc::new(ComponentRegistry::new()),
//! );
//!
//! let mut props = Props::new();
//! props.insert("email".to_string(), PropValue::from("a@b.c"));
//!
//! let login = ParentComponent::new(definition, ComponentOptions::new(props), host).unwrap();
//! login.render(None).unwrap();
//!
//! assert_eq!(login.context(), Some(Context::Lightbox));
//! assert_eq!(login.url(), "https://child.example/login?email=a%40b.c");
//! ```
//!
//! ## Browser
//!
//! With the `wasm` feature, `WebPlatform` and `JsTransport` bind the core
//! to web-sys, and `init_logging` routes `log` output to the console.

pub mod bridge;
pub mod component;
pub mod context;
pub mod definition;
pub mod error;
pub mod host;
pub mod lifecycle;
pub mod platform;
pub mod props;
pub mod registry;
pub mod testing;

// Browser backend (only available with "wasm" feature)
#[cfg(feature = "wasm")]
mod wasm;
#[cfg(feature = "wasm")]
pub use wasm::{init_logging, JsTransport, WebPlatform};

pub use bridge::{MessageType, PropCallbackRequest, RedirectRequest, ResizeRequest};
pub use component::{internal_props, CloseReport, ComponentOptions, HostContext, ParentComponent};
pub use context::{ContextSelector, RenderPlan, RenderState};
pub use definition::{
    ComponentDefinition, Context, Dimensions, PropDescriptor, PropSchema, PropType,
};
pub use error::{EmbedError, Result};
pub use host::{center_position, WindowHost};
pub use lifecycle::{ExitReason, SubscriptionSet};
pub use platform::{
    ElementRef, Mount, Platform, PopupFeatures, Position, Size, Subscription, Transport,
};
pub use props::{decode_query, NormalizedProps, NormalizedValue, PropValue, Props, PropsManager};
pub use registry::{ComponentRegistry, InstanceId};
