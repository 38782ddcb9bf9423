//! Browser backend
//!
//! - [`WebPlatform`] - iframes, popups, host navigation and timers over web-sys
//! - [`JsTransport`] - adapter for a JS messaging bus object exposing
//!   `send(window, name, payload) -> Promise` and
//!   `on(name, { window }, handler) -> { cancel() }`
//! - [`init_logging`] - `log` output to the browser console

use log::{error, Level, LevelFilter, Log, Metadata, Record};
use serde_json::Value;
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use wasm_bindgen_futures::JsFuture;
use web_sys::{HtmlIFrameElement, Node, Window};

use crate::bridge::MessageType;
use crate::error::{EmbedError, Result};
use crate::platform::{
    BoxedFrame, BoxedPopup, Frame, Handler, Mount, Platform, Popup, PopupFeatures, Position, Reply,
    Size, Subscription, Transport,
};

// =============================================================================
// Logging
// =============================================================================

struct ConsoleLogger;

static LOGGER: ConsoleLogger = ConsoleLogger;

impl Log for ConsoleLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= log::max_level()
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }
        let line = JsValue::from_str(&format!("{}", record.args()));
        match record.level() {
            Level::Error => web_sys::console::error_1(&line),
            Level::Warn => web_sys::console::warn_1(&line),
            Level::Info => web_sys::console::info_1(&line),
            Level::Debug | Level::Trace => web_sys::console::debug_1(&line),
        }
    }

    fn flush(&self) {}
}

/// Route `log` output to the console and install the panic hook.
///
/// Safe to call more than once; only the first call installs the logger.
pub fn init_logging(level: LevelFilter) {
    console_error_panic_hook::set_once();
    if log::set_logger(&LOGGER).is_ok() {
        log::set_max_level(level);
    }
}

fn describe(value: &JsValue) -> String {
    js_sys::Reflect::get(value, &"message".into())
        .ok()
        .and_then(|m| m.as_string())
        .or_else(|| value.as_string())
        .unwrap_or_else(|| format!("{:?}", value))
}

fn to_js(value: &Value) -> Result<JsValue> {
    js_sys::JSON::parse(&value.to_string()).map_err(|e| {
        EmbedError::protocol(format!("payload not representable in JS: {}", describe(&e)))
    })
}

fn from_js(value: &JsValue) -> Result<Value> {
    if value.is_undefined() || value.is_null() {
        return Ok(Value::Null);
    }
    let text = js_sys::JSON::stringify(value)
        .map_err(|e| EmbedError::protocol(format!("payload not serializable: {}", describe(&e))))?;
    Ok(serde_json::from_str(&String::from(text))?)
}

// =============================================================================
// Platform
// =============================================================================

/// Browser platform bound to the host window.
pub struct WebPlatform {
    window: Window,
}

impl WebPlatform {
    pub fn new() -> Result<Self> {
        let window = web_sys::window().ok_or_else(|| EmbedError::no_context("no global window"))?;
        Ok(Self { window })
    }

    fn mount_node(&self, mount: &Mount) -> Result<Node> {
        let document = self
            .window
            .document()
            .ok_or_else(|| EmbedError::no_context("window has no document"))?;

        match mount {
            Mount::DocumentRoot => document
                .body()
                .map(Node::from)
                .ok_or_else(|| EmbedError::no_context("document has no body")),
            Mount::Element(element) => document
                .get_element_by_id(element.as_str())
                .or_else(|| document.query_selector(element.as_str()).ok().flatten())
                .map(Node::from)
                .ok_or_else(|| EmbedError::no_context(format!("element {} not found", element))),
        }
    }
}

struct WebFrame {
    element: HtmlIFrameElement,
}

impl Frame for WebFrame {
    type Window = Window;

    fn content_window(&self) -> Option<Window> {
        self.element.content_window()
    }

    fn set_size(&mut self, size: Size) {
        self.element.set_width(&size.width.to_string());
        self.element.set_height(&size.height.to_string());
    }

    fn set_position(&mut self, position: Position) {
        let style = self.element.style();
        let _ = style.set_property("position", "absolute");
        let _ = style.set_property("top", &format!("{}px", position.y));
        let _ = style.set_property("left", &format!("{}px", position.x));
    }

    fn set_src(&mut self, url: &str) {
        self.element.set_src(url);
    }

    fn is_attached(&self) -> bool {
        self.element.parent_node().is_some()
    }

    fn detach(&mut self) {
        self.element.remove();
    }
}

struct WebPopup {
    window: Window,
}

impl Popup for WebPopup {
    type Window = Window;

    fn window(&self) -> Window {
        self.window.clone()
    }

    fn closed_state(&self) -> Option<bool> {
        self.window.closed().ok()
    }

    fn navigate(&mut self, url: &str) {
        if let Err(e) = self.window.location().set_href(url) {
            error!("[embed] popup navigation failed: {}", describe(&e));
        }
    }

    fn focus(&mut self) {
        let _ = self.window.focus();
    }

    fn close(&mut self) {
        let _ = self.window.close();
    }
}

impl Platform for WebPlatform {
    type Window = Window;

    fn viewport(&self) -> Size {
        let extent = |v: core::result::Result<JsValue, JsValue>| {
            v.ok().and_then(|v| v.as_f64()).map(|f| f.max(0.0) as u32).unwrap_or(0)
        };
        Size::new(extent(self.window.inner_width()), extent(self.window.inner_height()))
    }

    fn create_frame(&self, mount: &Mount, size: Size) -> Result<BoxedFrame<Window>> {
        let parent = self.mount_node(mount)?;
        let document = self
            .window
            .document()
            .ok_or_else(|| EmbedError::no_context("window has no document"))?;

        let element = document
            .create_element("iframe")
            .map_err(|e| EmbedError::no_context(describe(&e)))?
            .dyn_into::<HtmlIFrameElement>()
            .map_err(|_| EmbedError::no_context("created element is not an iframe"))?;

        let mut frame = WebFrame { element };
        frame.set_size(size);
        parent
            .append_child(&frame.element)
            .map_err(|e| EmbedError::no_context(describe(&e)))?;
        Ok(Box::new(frame))
    }

    fn open_popup(&self, features: &PopupFeatures) -> Option<BoxedPopup<Window>> {
        let window = self
            .window
            .open_with_url_and_target_and_features(
                "about:blank",
                "_blank",
                &features.to_feature_string(),
            )
            .ok()
            .flatten()?;
        Some(Box::new(WebPopup { window }))
    }

    fn navigate_host(&self, url: &str) {
        if let Err(e) = self.window.location().set_href(url) {
            error!("[embed] host navigation failed: {}", describe(&e));
        }
    }

    fn set_timeout(&self, delay_ms: u32, callback: Box<dyn FnOnce()>) {
        let closure = Closure::once_into_js(move || callback());
        let delay = i32::try_from(delay_ms).unwrap_or(i32::MAX);
        if let Err(e) = self
            .window
            .set_timeout_with_callback_and_timeout_and_arguments_0(closure.unchecked_ref(), delay)
        {
            error!("[embed] set_timeout failed: {}", describe(&e));
        }
    }
}

// =============================================================================
// Transport
// =============================================================================

/// Transport over a JS messaging bus object.
#[derive(Clone)]
pub struct JsTransport {
    bus: JsValue,
}

impl JsTransport {
    pub fn new(bus: JsValue) -> Self {
        Self { bus }
    }

    /// Use the bus published on the host window under `name`.
    pub fn from_global(name: &str) -> Result<Self> {
        let window = web_sys::window().ok_or_else(|| EmbedError::no_context("no global window"))?;
        match js_sys::Reflect::get(&window, &name.into()) {
            Ok(bus) if !bus.is_undefined() => Ok(Self::new(bus)),
            _ => Err(EmbedError::no_context(format!("messaging bus {} not found", name))),
        }
    }

    fn call(&self, method: &str, args: &js_sys::Array) -> Result<JsValue> {
        let function = js_sys::Reflect::get(&self.bus, &method.into())
            .ok()
            .and_then(|f| f.dyn_into::<js_sys::Function>().ok())
            .ok_or_else(|| {
                EmbedError::delivery(format!("messaging bus has no {} function", method))
            })?;
        js_sys::Reflect::apply(&function, &self.bus, args)
            .map_err(|e| EmbedError::delivery(describe(&e)))
    }
}

struct JsSubscription {
    listener: JsValue,
    _handler: Closure<dyn FnMut(JsValue) -> core::result::Result<JsValue, JsValue>>,
}

impl Subscription for JsSubscription {
    fn cancel(&mut self) {
        let cancel = js_sys::Reflect::get(&self.listener, &"cancel".into())
            .ok()
            .and_then(|f| f.dyn_into::<js_sys::Function>().ok());
        if let Some(cancel) = cancel {
            let _ = cancel.call0(&self.listener);
        }
    }
}

impl Transport<Window> for JsTransport {
    fn send(&self, target: &Window, message: MessageType, payload: Value) -> Reply {
        let sent = to_js(&payload).and_then(|payload| {
            let args = js_sys::Array::of3(target, &message.name().into(), &payload);
            self.call("send", &args)
        });

        Box::pin(async move {
            let promise = js_sys::Promise::resolve(&sent?);
            let reply = JsFuture::from(promise)
                .await
                .map_err(|e| EmbedError::delivery(describe(&e)))?;
            let data = js_sys::Reflect::get(&reply, &"data".into()).unwrap_or(JsValue::UNDEFINED);
            from_js(&data)
        })
    }

    fn on(&self, message: MessageType, source: &Window, handler: Handler) -> Box<dyn Subscription> {
        let closure = Closure::wrap(Box::new(move |event: JsValue| {
            let data = js_sys::Reflect::get(&event, &"data".into()).unwrap_or(JsValue::UNDEFINED);
            let reply = from_js(&data).and_then(|payload| handler(payload));
            reply
                .and_then(|value| to_js(&value))
                .map_err(|e| JsValue::from(js_sys::Error::new(&e.to_string())))
        }) as Box<dyn FnMut(JsValue) -> core::result::Result<JsValue, JsValue>>);

        let options = js_sys::Object::new();
        let _ = js_sys::Reflect::set(&options, &"window".into(), source);
        let args = js_sys::Array::of3(&message.name().into(), &options, closure.as_ref());

        let listener = self.call("on", &args).unwrap_or_else(|e| {
            error!("[embed] failed to subscribe to {}: {}", message, e);
            JsValue::UNDEFINED
        });
        Box::new(JsSubscription {
            listener,
            _handler: closure,
        })
    }
}
