//! Parent-side component instances
//!
//! A [`ParentComponent`] is one embedding of a [`ComponentDefinition`]:
//!
//! ```text
//! new ──> render ──> INIT ──> close / CLOSE / REDIRECT / destroy / timeout
//!  |        |          |                       |
//!  |        |          +-- onEnter             +-- cleanup: window released,
//!  |        +-- window opened, handlers           subscriptions cancelled,
//!  |            subscribed, URL loaded,           registry entry removed,
//!  |            handshake timer armed             onExit (+ onClose)
//!  +-- options checked, props prepared, registered
//! ```
//!
//! All state lives behind an `Rc` so message handlers and the handshake
//! timer can reach the instance through weak references; nothing keeps an
//! instance alive except its owner.

use core::fmt;
use core::future::{self, Future};
use std::cell::RefCell;
use std::rc::Rc;

use log::{debug, error, info, warn};
use serde_json::Value;

use crate::bridge::{
    self, ChildMessageHandler, InitReply, MessageType, PropCallbackRequest, PropsUpdate,
    RedirectRequest, ResizeRequest,
};
use crate::context::{ContextSelector, RenderState};
use crate::definition::{ComponentDefinition, Context, PropDescriptor, PropSchema, PropType};
use crate::error::{EmbedError, Result};
use crate::host::WindowHost;
use crate::lifecycle::{
    Callbacks, ErrorCallback, ExitReason, LifecycleCallback, LifecycleController, SubscriptionSet,
};
use crate::platform::{ElementRef, Handler, Platform, Reply, Size, Transport};
use crate::props::{
    child_url, NormalizedProps, PreparedProps, PropFn, PropValue, Props, PropsManager,
};
use crate::registry::{ComponentRegistry, InstanceId};

/// Collaborators shared by every instance an application creates.
pub struct HostContext<P, T> {
    pub platform: Rc<P>,
    pub transport: Rc<T>,
    pub registry: Rc<ComponentRegistry>,
}

impl<P, T> HostContext<P, T> {
    pub fn new(platform: Rc<P>, transport: Rc<T>, registry: Rc<ComponentRegistry>) -> Self {
        Self {
            platform,
            transport,
            registry,
        }
    }
}

impl<P, T> Clone for HostContext<P, T> {
    fn clone(&self) -> Self {
        Self {
            platform: self.platform.clone(),
            transport: self.transport.clone(),
            registry: self.registry.clone(),
        }
    }
}

/// Construction options.
#[derive(Clone, Debug, Default)]
pub struct ComponentOptions {
    pub props: Props,
    callbacks: Callbacks,
    timeout_ms: Option<u32>,
    container: Option<ElementRef>,
}

impl ComponentOptions {
    pub fn new(props: Props) -> Self {
        Self {
            props,
            ..Self::default()
        }
    }

    /// Called once, when the child completes the handshake.
    pub fn on_enter(mut self, f: impl Fn() + 'static) -> Self {
        self.callbacks.on_enter = Some(Rc::new(f));
        self
    }

    /// Called once, when the instance is cleaned up for any reason.
    pub fn on_exit(mut self, f: impl Fn() + 'static) -> Self {
        self.callbacks.on_exit = Some(Rc::new(f));
        self
    }

    /// Called when the instance ends through close, CLOSE or REDIRECT.
    pub fn on_close(mut self, f: impl Fn() + 'static) -> Self {
        self.callbacks.on_close = Some(Rc::new(f));
        self
    }

    pub fn on_error(mut self, f: impl Fn(&EmbedError) + 'static) -> Self {
        self.callbacks.on_error = Some(Rc::new(f));
        self
    }

    /// Receives the error passed to `destroy`. Defaults to `on_error`.
    pub fn on_timeout(mut self, f: impl Fn(&EmbedError) + 'static) -> Self {
        self.callbacks.on_timeout = Some(Rc::new(f));
        self
    }

    /// Handshake timeout. Zero disables it.
    pub fn timeout(mut self, ms: u32) -> Self {
        self.timeout_ms = (ms > 0).then_some(ms);
        self
    }

    /// Default render target (requires iframe support).
    pub fn container(mut self, element: ElementRef) -> Self {
        self.container = Some(element);
        self
    }
}

/// Outcome of [`ParentComponent::close`]. Cleanup has run in both cases.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CloseReport {
    /// The child acknowledged CLOSE
    Acknowledged,
    /// CLOSE could not be delivered
    Unacknowledged(EmbedError),
}

impl CloseReport {
    pub fn is_acknowledged(&self) -> bool {
        matches!(self, CloseReport::Acknowledged)
    }
}

/// Prop schema of the lifecycle props understood by
/// [`ParentComponent::from_props`].
pub fn internal_props() -> PropSchema {
    [
        ("onEnter", PropType::Function),
        ("onExit", PropType::Function),
        ("onClose", PropType::Function),
        ("onError", PropType::Function),
        ("timeout", PropType::Number),
    ]
    .into_iter()
    .map(|(name, prop_type)| (name.to_string(), PropDescriptor::optional(prop_type)))
    .collect()
}

struct PropState {
    raw: Props,
    normalized: NormalizedProps,
    query: String,
    url: String,
}

impl PropState {
    fn new(prepared: PreparedProps, base_url: &str) -> Self {
        let url = child_url(base_url, &prepared.query);
        Self {
            raw: prepared.raw,
            normalized: prepared.normalized,
            query: prepared.query,
            url,
        }
    }
}

struct Inner<P: Platform, T> {
    id: InstanceId,
    definition: ComponentDefinition,
    host: HostContext<P, T>,
    props: PropsManager,
    callbacks: Callbacks,
    container: Option<ElementRef>,
    state: RefCell<PropState>,
    window: RefCell<WindowHost<P::Window>>,
    subscriptions: RefCell<SubscriptionSet>,
    lifecycle: RefCell<LifecycleController>,
}

/// Dropping the last handle of a live instance cleans it up.
impl<P: Platform, T> Drop for Inner<P, T> {
    fn drop(&mut self) {
        if !self.lifecycle.get_mut().begin_cleanup(ExitReason::Destroyed) {
            return;
        }
        debug!("[embed:{}] instance {} dropped while active", self.definition.tag, self.id);

        if let Some(resource) = self.window.get_mut().take() {
            resource.release();
        }
        self.subscriptions.get_mut().release();
        self.host.registry.release(self.id);
        self.callbacks.exit();
    }
}

/// One embedded instance of a component definition.
pub struct ParentComponent<P: Platform, T> {
    inner: Rc<Inner<P, T>>,
}

impl<P: Platform, T> Clone for ParentComponent<P, T> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl<P: Platform, T> fmt::Debug for ParentComponent<P, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ParentComponent")
            .field("tag", &self.inner.definition.tag)
            .field("id", &self.inner.id)
            .field("state", &self.inner.lifecycle.borrow().state())
            .finish()
    }
}

impl<P, T> ParentComponent<P, T>
where
    P: Platform,
    T: Transport<P::Window>,
{
    /// Create an instance.
    ///
    /// # Returns
    /// * `Err(EmbedError::Validation)` - Bad definition or options
    /// * `Err(EmbedError::PropValidation)` - Props violate the schema
    /// * `Err(EmbedError::SingletonViolation)` - Singleton already active
    pub fn new(
        definition: ComponentDefinition,
        options: ComponentOptions,
        host: HostContext<P, T>,
    ) -> Result<Self> {
        definition.validate()?;

        if options.container.is_some() && !definition.supports(Context::Iframe) {
            return Err(EmbedError::validation(format!(
                "can not render {} to a container: iframe context is not supported",
                definition.tag
            )));
        }

        let props = PropsManager::new(definition.props.clone());
        let prepared = props.prepare(options.props)?;
        let id = host.registry.register(&definition)?;
        let state = PropState::new(prepared, &definition.url);

        info!("[embed:{}] created instance {}", definition.tag, id);

        Ok(Self {
            inner: Rc::new(Inner {
                id,
                host,
                props,
                callbacks: options.callbacks,
                container: options.container,
                state: RefCell::new(state),
                window: RefCell::new(WindowHost::new()),
                subscriptions: RefCell::new(SubscriptionSet::new()),
                lifecycle: RefCell::new(LifecycleController::new(options.timeout_ms)),
                definition,
            }),
        })
    }

    /// Create an instance from a single prop map.
    ///
    /// The lifecycle props of [`internal_props`] are removed from `props`
    /// and become callbacks and the handshake timeout.
    pub fn from_props(
        definition: ComponentDefinition,
        mut props: Props,
        host: HostContext<P, T>,
    ) -> Result<Self> {
        let on_enter = take_function(&mut props, "onEnter")?;
        let on_exit = take_function(&mut props, "onExit")?;
        let on_close = take_function(&mut props, "onClose")?;
        let on_error = take_function(&mut props, "onError")?;
        let timeout_ms = take_timeout(&mut props)?;

        let options = ComponentOptions {
            props,
            callbacks: Callbacks {
                on_enter: on_enter.map(|f| notify("onEnter", f)),
                on_exit: on_exit.map(|f| notify("onExit", f)),
                on_close: on_close.map(|f| notify("onClose", f)),
                on_error: on_error.map(report),
                on_timeout: None,
            },
            timeout_ms,
            container: None,
        };
        Self::new(definition, options, host)
    }

    // === Operations ===

    /// Render the child.
    ///
    /// `element` (or the container option) selects the iframe context;
    /// otherwise the default context and then lightbox/popup are tried.
    pub fn render(&self, element: Option<&ElementRef>) -> Result<&Self> {
        let inner = &self.inner;
        let state = inner.lifecycle.borrow().state();
        match state {
            RenderState::Unrendered => {}
            RenderState::Destroyed => return Err(self.destroyed()),
            other => return Err(EmbedError::unsupported(format!("render called while {}", other))),
        }

        let target = element.or(inner.container.as_ref());
        let plan = ContextSelector::new(&inner.definition).plan(target);

        let resolved = plan.execute(|attempt| {
            inner.lifecycle.borrow_mut().begin_render(attempt.context);
            debug!("[embed:{}] trying {}", self.tag(), attempt.context);
            inner
                .window
                .borrow_mut()
                .open(&*inner.host.platform, &inner.definition, attempt)
        });

        let context = match resolved {
            Ok(context) => context,
            Err(err) => {
                inner.lifecycle.borrow_mut().abort_render();
                error!("[embed:{}] render failed: {}", self.tag(), err);
                return Err(err);
            }
        };

        self.listen()?;
        let url = inner.state.borrow().url.clone();
        inner.window.borrow_mut().load_url(&url)?;
        inner.lifecycle.borrow_mut().activate(context);
        self.schedule_timeout();

        info!("[embed:{}] rendered {} as {}", self.tag(), inner.id, context);
        Ok(self)
    }

    /// Merge `partial` over the current props and re-derive the query
    /// string. Sends PROPS when the normalized props changed and a child
    /// window exists.
    ///
    /// Validation runs immediately; the returned future resolves when
    /// delivery (if any) completes. Fails with `Destroyed` after cleanup.
    pub fn update_props(&self, partial: Props) -> impl Future<Output = Result<()>> + 'static {
        let delivery = self.apply_props(partial);
        async move {
            if let Some(reply) = delivery? {
                reply.await?;
            }
            Ok(())
        }
    }

    /// Ask the child to close, then clean up whatever the outcome.
    ///
    /// A delivery failure is logged and reported, never returned as an
    /// error.
    pub fn close(&self) -> impl Future<Output = CloseReport> + 'static {
        let delivery = self.send(MessageType::Close, Value::Null);
        let component = self.clone();
        async move {
            let report = match delivery.await {
                Ok(_) => CloseReport::Acknowledged,
                Err(err) => {
                    warn!(
                        "[embed:{}] error sending close message to child: {}",
                        component.tag(),
                        err
                    );
                    CloseReport::Unacknowledged(err)
                }
            };
            component.cleanup(ExitReason::Closed);
            report
        }
    }

    /// Bring a popup to the foreground. No-op for frames.
    pub fn focus(&self) -> &Self {
        self.inner.window.borrow_mut().focus();
        self
    }

    /// Set the frame to exactly `width` x `height`.
    ///
    /// Fails with `UnsupportedOperation` for popups and before render.
    pub fn resize(&self, height: u32, width: u32) -> impl Future<Output = Result<()>> + 'static {
        future::ready(self.resize_frame(Size::new(width, height)))
    }

    /// Clean up and report `err` through onTimeout (or onError).
    ///
    /// Only the first terminal transition reports; later calls are no-ops.
    pub fn destroy(&self, err: EmbedError) -> &Self {
        if self.cleanup(ExitReason::Destroyed) {
            self.inner.callbacks.timeout(&err);
        }
        self
    }

    // === Accessors ===

    pub fn id(&self) -> InstanceId {
        self.inner.id
    }

    pub fn definition(&self) -> &ComponentDefinition {
        &self.inner.definition
    }

    pub fn state(&self) -> RenderState {
        self.inner.lifecycle.borrow().state()
    }

    /// Resolved context, while rendering or active.
    pub fn context(&self) -> Option<Context> {
        self.state().context()
    }

    /// Full child URL (base URL plus query string).
    pub fn url(&self) -> String {
        self.inner.state.borrow().url.clone()
    }

    pub fn query_string(&self) -> String {
        self.inner.state.borrow().query.clone()
    }

    pub fn normalized_props(&self) -> NormalizedProps {
        self.inner.state.borrow().normalized.clone()
    }

    /// Raw props, including function props.
    pub fn props(&self) -> Props {
        self.inner.state.borrow().raw.clone()
    }

    pub fn is_entered(&self) -> bool {
        self.inner.lifecycle.borrow().is_entered()
    }

    pub fn is_destroyed(&self) -> bool {
        self.state().is_destroyed()
    }

    pub fn timeout_ms(&self) -> Option<u32> {
        self.inner.lifecycle.borrow().timeout_ms()
    }

    /// Message-target handle of the child, while a window is open.
    pub fn window(&self) -> Option<P::Window> {
        self.inner.window.borrow().window().cloned()
    }

    // === Internals ===

    fn tag(&self) -> &str {
        &self.inner.definition.tag
    }

    fn destroyed(&self) -> EmbedError {
        EmbedError::Destroyed(self.inner.definition.tag.clone())
    }

    fn send(&self, message: MessageType, payload: Value) -> Reply {
        match self.window() {
            Some(window) => {
                debug!("[embed:{}] -> {}", self.tag(), message);
                self.inner.host.transport.send(&window, message, payload)
            }
            None => {
                let err = EmbedError::delivery(format!("{} has no child window", self.tag()));
                Box::pin(future::ready(Err(err)))
            }
        }
    }

    fn apply_props(&self, partial: Props) -> Result<Option<Reply>> {
        if self.is_destroyed() {
            return Err(self.destroyed());
        }
        let inner = &self.inner;
        let (changed, normalized) = {
            let mut state = inner.state.borrow_mut();
            let merged = PropsManager::merge(&state.raw, partial);
            let prepared = inner.props.prepare(merged)?;
            let changed = prepared.normalized.to_json_string() != state.normalized.to_json_string();
            *state = PropState::new(prepared, &inner.definition.url);
            (changed, state.normalized.clone())
        };

        if !changed || self.window().is_none() {
            return Ok(None);
        }
        let payload = serde_json::to_value(PropsUpdate { props: normalized })?;
        Ok(Some(self.send(MessageType::Props, payload)))
    }

    fn resize_frame(&self, size: Size) -> Result<()> {
        match self.state() {
            RenderState::Destroyed => Err(self.destroyed()),
            RenderState::Active(context) if context.is_frame() => {
                self.inner.window.borrow_mut().resize_frame(size)
            }
            RenderState::Active(_) => {
                Err(EmbedError::unsupported("can not resize popup from parent"))
            }
            RenderState::Unrendered | RenderState::Rendering(_) => {
                Err(EmbedError::unsupported("resize called before render"))
            }
        }
    }

    /// Subscribe a handler for every inbound message type.
    fn listen(&self) -> Result<()> {
        let window = self
            .window()
            .ok_or_else(|| EmbedError::no_context("no child window to listen on"))?;

        for message in MessageType::INBOUND {
            let weak = Rc::downgrade(&self.inner);
            let tag = self.inner.definition.tag.clone();
            let handler: Handler = Rc::new(move |payload: Value| -> Result<Value> {
                let inner = weak.upgrade().ok_or_else(|| EmbedError::Destroyed(tag.clone()))?;
                ParentComponent { inner }.handle(message, payload)
            });
            let subscription = self.inner.host.transport.on(message, &window, handler);
            self.inner.subscriptions.borrow_mut().add(subscription);
        }
        Ok(())
    }

    fn handle(&self, message: MessageType, payload: Value) -> Result<Value> {
        if self.is_destroyed() {
            return Err(self.destroyed());
        }
        debug!("[embed:{}] <- {}", self.tag(), message);

        let result = bridge::dispatch(self, message, payload);
        if let Err(err) = &result {
            warn!("[embed:{}] {} failed: {}", self.tag(), message, err);
        }
        result
    }

    fn schedule_timeout(&self) {
        let Some(timeout_ms) = self.timeout_ms() else {
            return;
        };
        let weak = Rc::downgrade(&self.inner);
        self.inner.host.platform.set_timeout(
            timeout_ms,
            Box::new(move || {
                if let Some(inner) = weak.upgrade() {
                    ParentComponent { inner }.handshake_expired(timeout_ms);
                }
            }),
        );
    }

    fn handshake_expired(&self, timeout_ms: u32) {
        if !self.inner.lifecycle.borrow().should_fire_timeout() {
            return;
        }
        let err = EmbedError::Timeout {
            tag: self.tag().to_string(),
            url: self.url(),
            timeout_ms,
        };
        error!("[embed:{}] {}", self.tag(), err);
        self.destroy(err);
    }

    /// Release the window, cancel subscriptions and leave the registry.
    /// Returns false if the instance was already cleaned up.
    fn cleanup(&self, reason: ExitReason) -> bool {
        let inner = &self.inner;
        if !inner.lifecycle.borrow_mut().begin_cleanup(reason) {
            return false;
        }

        let resource = inner.window.borrow_mut().take();
        let mut subscriptions = inner.subscriptions.borrow_mut().take();
        if let Some(resource) = resource {
            resource.release();
        }
        subscriptions.release();
        inner.host.registry.release(inner.id);

        info!("[embed:{}] instance {} {}", self.tag(), inner.id, reason);

        inner.callbacks.exit();
        if reason.is_close() {
            inner.callbacks.close();
        }
        true
    }
}

impl<P, T> ChildMessageHandler for ParentComponent<P, T>
where
    P: Platform,
    T: Transport<P::Window>,
{
    fn on_init(&self) -> Result<InitReply> {
        let first = self.inner.lifecycle.borrow_mut().mark_entered();
        let context = self.context().ok_or_else(|| self.destroyed())?;
        if first {
            info!("[embed:{}] child entered ({})", self.tag(), context);
            self.inner.callbacks.enter();
        }
        Ok(InitReply {
            context,
            props: self.normalized_props(),
        })
    }

    fn on_close(&self) -> Result<()> {
        self.cleanup(ExitReason::Closed);
        Ok(())
    }

    fn on_focus(&self) -> Result<()> {
        match self.context() {
            Some(Context::Popup) => {
                self.focus();
                Ok(())
            }
            _ => Err(EmbedError::unsupported("focus is only valid in popup context")),
        }
    }

    fn on_resize(&self, request: ResizeRequest) -> Result<()> {
        self.resize_frame(Size::new(request.width, request.height))
    }

    fn on_redirect(&self, request: RedirectRequest) -> Result<()> {
        self.cleanup(ExitReason::Redirected);
        info!("[embed:{}] redirecting host to {}", self.tag(), request.url);
        self.inner.host.platform.navigate_host(&request.url);
        Ok(())
    }

    fn on_prop_callback(&self, request: PropCallbackRequest) -> Result<Value> {
        let callback = self
            .inner
            .state
            .borrow()
            .raw
            .get(&request.key)
            .and_then(PropValue::as_function)
            .cloned();

        let callback = callback.ok_or_else(|| {
            EmbedError::protocol(format!("prop `{}` is not a function", request.key))
        })?;

        callback(request.args.as_slice()).map_err(|reason| EmbedError::CallbackFailed {
            key: request.key,
            reason,
        })
    }
}

fn take_function(props: &mut Props, key: &str) -> Result<Option<PropFn>> {
    match props.remove(key) {
        None | Some(PropValue::Null) => Ok(None),
        Some(PropValue::Function(f)) => Ok(Some(f)),
        Some(_) => Err(EmbedError::prop(key, "is not a function")),
    }
}

fn take_timeout(props: &mut Props) -> Result<Option<u32>> {
    let value = match props.remove("timeout") {
        None | Some(PropValue::Null) => return Ok(None),
        Some(value) => value,
    };
    let ms = value.parse_int().ok_or_else(|| {
        EmbedError::validation(format!("expected timeout to be a number: {:?}", value))
    })?;
    if ms <= 0 {
        return Ok(None);
    }
    u32::try_from(ms)
        .map(Some)
        .map_err(|_| EmbedError::validation(format!("timeout {} is out of range", ms)))
}

fn notify(name: &'static str, f: PropFn) -> LifecycleCallback {
    Rc::new(move || {
        if let Err(e) = f(&[]) {
            warn!("[embed] {} callback failed: {}", name, e);
        }
    })
}

fn report(f: PropFn) -> ErrorCallback {
    Rc::new(move |err: &EmbedError| {
        if let Err(e) = f(&[Value::String(err.to_string())]) {
            warn!("[embed] onError callback failed: {}", e);
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::definition::Dimensions;
    use crate::testing::{MockPlatform, MockTransport};
    use std::cell::Cell;

    type TestComponent = ParentComponent<MockPlatform, MockTransport>;

    fn host() -> HostContext<MockPlatform, MockTransport> {
        HostContext::new(
            Rc::new(MockPlatform::new()),
            Rc::new(MockTransport::new()),
            Rc::new(ComponentRegistry::new()),
        )
    }

    fn definition() -> ComponentDefinition {
        ComponentDefinition::new("card", "https://child.example/card", Dimensions::new(320, 200))
            .with_context(Context::Iframe)
            .with_context(Context::Lightbox)
            .with_prop("title", PropDescriptor::optional(PropType::String))
    }

    #[test]
    fn test_internal_props_all_optional() {
        let schema = internal_props();
        assert_eq!(schema.len(), 5);
        assert!(schema.iter().all(|(_, d)| !d.required));
        assert_eq!(schema.get("timeout").map(|d| d.prop_type), Some(PropType::Number));
    }

    #[test]
    fn test_url_includes_query() {
        let props: Props =
            [("title".to_string(), PropValue::from("Hi there"))].into_iter().collect();
        let c = TestComponent::new(definition(), ComponentOptions::new(props), host()).unwrap();
        assert_eq!(c.query_string(), "title=Hi%20there");
        assert_eq!(c.url(), "https://child.example/card?title=Hi%20there");
        assert_eq!(c.state(), RenderState::Unrendered);
        assert!(c.window().is_none());
    }

    #[test]
    fn test_container_requires_iframe_support() {
        let def = ComponentDefinition::new("p", "https://child.example", Dimensions::new(1, 1))
            .with_context(Context::Popup);
        let options = ComponentOptions::default().container(ElementRef::new("#slot"));
        let err = TestComponent::new(def, options, host()).unwrap_err();
        assert!(matches!(err, EmbedError::Validation(_)));
    }

    #[test]
    fn test_from_props_extracts_lifecycle_props() {
        let entered = Rc::new(Cell::new(0));
        let counter = entered.clone();
        let props: Props = [
            ("title".to_string(), PropValue::from("x")),
            ("timeout".to_string(), PropValue::from("250")),
            (
                "onEnter".to_string(),
                PropValue::function(move |_| {
                    counter.set(counter.get() + 1);
                    Ok(Value::Null)
                }),
            ),
        ]
        .into_iter()
        .collect();

        let c = TestComponent::from_props(definition(), props, host()).unwrap();
        assert_eq!(c.timeout_ms(), Some(250));
        assert!(!c.props().contains_key("onEnter"));
        assert!(!c.props().contains_key("timeout"));

        c.inner.callbacks.enter();
        assert_eq!(entered.get(), 1);
    }

    #[test]
    fn test_from_props_rejects_bad_timeout() {
        let props: Props = [("timeout".to_string(), PropValue::from("soon"))].into_iter().collect();
        let err = TestComponent::from_props(definition(), props, host()).unwrap_err();
        assert!(matches!(err, EmbedError::Validation(_)));
    }

    #[test]
    fn test_from_props_rejects_non_function_callback() {
        let props: Props = [("onClose".to_string(), PropValue::from(true))].into_iter().collect();
        let err = TestComponent::from_props(definition(), props, host()).unwrap_err();
        assert_eq!(err.prop_key(), Some("onClose"));
    }

    #[test]
    fn test_render_twice_rejected() {
        let host = host();
        let c =
            TestComponent::new(definition(), ComponentOptions::default(), host.clone()).unwrap();
        c.render(None).unwrap();
        assert_eq!(c.context(), Some(Context::Lightbox));
        assert!(matches!(c.render(None), Err(EmbedError::UnsupportedOperation(_))));
        assert_eq!(host.platform.frames().len(), 1);
    }

    #[test]
    fn test_container_is_default_target() {
        let host = host();
        let options = ComponentOptions::default().container(ElementRef::new("#slot"));
        let c = TestComponent::new(definition(), options, host.clone()).unwrap();
        c.render(None).unwrap();
        assert_eq!(c.context(), Some(Context::Iframe));
        assert_eq!(
            host.platform.frames()[0].mount,
            crate::platform::Mount::Element(ElementRef::new("#slot"))
        );
    }

    #[test]
    fn test_failed_render_returns_to_unrendered() {
        let host = host();
        host.platform.set_elements(&["#other"]);
        let c =
            TestComponent::new(definition(), ComponentOptions::default(), host.clone()).unwrap();
        let err = c.render(Some(&ElementRef::new("#slot"))).unwrap_err();
        assert!(matches!(err, EmbedError::NoContext(_)));
        assert_eq!(c.state(), RenderState::Unrendered);
        assert_eq!(host.transport.subscription_count(), 0);
    }

    #[test]
    fn test_drop_releases_registry_entry() {
        let host = host();
        let def = definition().as_singleton();
        let c = TestComponent::new(def, ComponentOptions::default(), host.clone()).unwrap();
        assert_eq!(host.registry.len(), 1);
        drop(c);
        assert!(host.registry.is_empty());
    }
}
