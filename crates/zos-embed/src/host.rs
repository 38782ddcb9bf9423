//! Window and frame ownership
//!
//! [`WindowHost`] opens the resource for a render attempt, keeps the
//! message-target handle, and hands the resource back at cleanup.

use log::debug;

use crate::context::{Attempt, AttemptOutcome};
use crate::definition::{ComponentDefinition, Context, Dimensions};
use crate::error::{EmbedError, Result};
use crate::platform::{BoxedFrame, BoxedPopup, Mount, Platform, PopupFeatures, Position, Size};

/// Top-left corner that centers `dimensions` in `viewport`.
///
/// Fixed coordinates in the definition win; otherwise each axis is
/// `floor((viewport - size) / 2)`, or 0 when the viewport is not larger.
pub fn center_position(dimensions: &Dimensions, viewport: Size) -> Position {
    Position {
        x: dimensions.x.unwrap_or_else(|| center_axis(viewport.width, dimensions.width)),
        y: dimensions.y.unwrap_or_else(|| center_axis(viewport.height, dimensions.height)),
    }
}

fn center_axis(viewport: u32, size: u32) -> i32 {
    if viewport <= size {
        0
    } else {
        i32::try_from((viewport - size) / 2).unwrap_or(i32::MAX)
    }
}

/// Resource owned by an instance.
pub enum WindowResource<W> {
    Frame(BoxedFrame<W>),
    Popup(BoxedPopup<W>),
}

impl<W> WindowResource<W> {
    /// Close the popup or detach the frame, if still open.
    pub fn release(self) {
        match self {
            WindowResource::Popup(mut popup) => {
                if popup.closed_state() != Some(true) {
                    popup.close();
                }
            }
            WindowResource::Frame(mut frame) => {
                if frame.is_attached() {
                    frame.detach();
                }
            }
        }
    }
}

/// Holds the window or frame of one instance.
pub struct WindowHost<W> {
    resource: Option<WindowResource<W>>,
    window: Option<W>,
}

impl<W> Default for WindowHost<W> {
    fn default() -> Self {
        Self {
            resource: None,
            window: None,
        }
    }
}

impl<W: Clone> WindowHost<W> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Open the resource for one render attempt.
    pub fn open<P>(
        &mut self,
        platform: &P,
        definition: &ComponentDefinition,
        attempt: &Attempt,
    ) -> Result<AttemptOutcome>
    where
        P: Platform<Window = W>,
    {
        let dimensions = &definition.dimensions;
        match (attempt.context, &attempt.mount) {
            (Context::Popup, _) => self.open_popup(platform, dimensions),
            (Context::Iframe, Some(mount)) => self.open_iframe(platform, dimensions, mount),
            (Context::Lightbox, _) => self.open_lightbox(platform, dimensions),
            (Context::Iframe, None) => Err(EmbedError::no_context(
                "can not render to iframe without a container element",
            )),
        }
    }

    /// Create a frame at the declared size under `mount`.
    pub fn open_iframe<P>(
        &mut self,
        platform: &P,
        dimensions: &Dimensions,
        mount: &Mount,
    ) -> Result<AttemptOutcome>
    where
        P: Platform<Window = W>,
    {
        let size = Size::new(dimensions.width, dimensions.height);
        let mut frame = platform.create_frame(mount, size)?;
        let Some(window) = frame.content_window() else {
            frame.detach();
            return Err(EmbedError::no_context("frame has no content window"));
        };

        self.window = Some(window);
        self.resource = Some(WindowResource::Frame(frame));
        Ok(AttemptOutcome::Rendered)
    }

    /// Create a frame under the document root, positioned at the center.
    pub fn open_lightbox<P>(
        &mut self,
        platform: &P,
        dimensions: &Dimensions,
    ) -> Result<AttemptOutcome>
    where
        P: Platform<Window = W>,
    {
        self.open_iframe(platform, dimensions, &Mount::DocumentRoot)?;

        let position = center_position(dimensions, platform.viewport());
        if let Some(WindowResource::Frame(frame)) = self.resource.as_mut() {
            frame.set_position(position);
        }
        Ok(AttemptOutcome::Rendered)
    }

    /// Open a centered popup. A missing, closed or unreadable window means
    /// the browser blocked it.
    pub fn open_popup<P>(&mut self, platform: &P, dimensions: &Dimensions) -> Result<AttemptOutcome>
    where
        P: Platform<Window = W>,
    {
        let position = center_position(dimensions, platform.viewport());
        let features = PopupFeatures {
            width: dimensions.width,
            height: dimensions.height,
            top: position.y,
            left: position.x,
        };

        let popup = match platform.open_popup(&features) {
            Some(popup) if popup.closed_state() == Some(false) => popup,
            Some(popup) => {
                debug!("[embed] popup unusable (closed state {:?})", popup.closed_state());
                WindowResource::Popup(popup).release();
                return Ok(AttemptOutcome::Blocked);
            }
            None => return Ok(AttemptOutcome::Blocked),
        };

        self.window = Some(popup.window());
        self.resource = Some(WindowResource::Popup(popup));
        Ok(AttemptOutcome::Rendered)
    }

    /// Point the open resource at `url`.
    pub fn load_url(&mut self, url: &str) -> Result<()> {
        match self.resource.as_mut() {
            Some(WindowResource::Popup(popup)) => popup.navigate(url),
            Some(WindowResource::Frame(frame)) => frame.set_src(url),
            None => return Err(EmbedError::unsupported("load_url called before a window exists")),
        }
        Ok(())
    }

    /// Message-target handle of the open resource.
    pub fn window(&self) -> Option<&W> {
        self.window.as_ref()
    }

    pub fn is_open(&self) -> bool {
        self.resource.is_some()
    }

    /// Set frame dimensions exactly. Popups can not be resized from here.
    pub fn resize_frame(&mut self, size: Size) -> Result<()> {
        match self.resource.as_mut() {
            Some(WindowResource::Frame(frame)) => {
                frame.set_size(size);
                Ok(())
            }
            Some(WindowResource::Popup(_)) => {
                Err(EmbedError::unsupported("can not resize popup from parent"))
            }
            None => Err(EmbedError::unsupported("resize called before render")),
        }
    }

    /// Bring a popup to the foreground. No-op for frames.
    pub fn focus(&mut self) {
        if let Some(WindowResource::Popup(popup)) = self.resource.as_mut() {
            popup.focus();
        }
    }

    /// Take the resource out, clearing the window handle.
    pub fn take(&mut self) -> Option<WindowResource<W>> {
        self.window = None;
        self.resource.take()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{MockPlatform, PopupMode};

    fn definition() -> ComponentDefinition {
        ComponentDefinition::new("widget", "https://child.example", Dimensions::new(400, 300))
            .with_context(Context::Popup)
            .with_context(Context::Lightbox)
    }

    #[test]
    fn test_center_position() {
        let dims = Dimensions::new(400, 300);
        assert_eq!(center_position(&dims, Size::new(1025, 768)), Position { x: 312, y: 234 });
        assert_eq!(center_position(&dims, Size::new(400, 100)), Position { x: 0, y: 0 });
        assert_eq!(
            center_position(&dims.at(5, -3), Size::new(1024, 768)),
            Position { x: 5, y: -3 }
        );
    }

    #[test]
    fn test_popup_features_centered() {
        let platform = MockPlatform::new();
        platform.set_viewport(Size::new(1000, 700));
        let mut host = WindowHost::new();
        let outcome = host.open_popup(&platform, &definition().dimensions).unwrap();
        assert_eq!(outcome, AttemptOutcome::Rendered);

        let popups = platform.popups();
        assert_eq!(
            popups[0].features,
            PopupFeatures {
                width: 400,
                height: 300,
                top: 200,
                left: 300
            }
        );
        assert_eq!(host.window(), Some(&popups[0].window));
    }

    #[test]
    fn test_blocked_popup_modes() {
        for mode in [PopupMode::Blocked, PopupMode::Closed, PopupMode::Unreadable] {
            let platform = MockPlatform::new();
            platform.set_popup_mode(mode);
            let mut host = WindowHost::new();
            let outcome = host.open_popup(&platform, &definition().dimensions).unwrap();
            assert_eq!(outcome, AttemptOutcome::Blocked, "{:?}", mode);
            assert!(host.window().is_none());
            assert!(!host.is_open());
        }
    }

    #[test]
    fn test_unusable_popup_is_closed() {
        let platform = MockPlatform::new();
        platform.set_popup_mode(PopupMode::Unreadable);
        let mut host = WindowHost::new();
        host.open_popup(&platform, &definition().dimensions).unwrap();
        assert_eq!(platform.popups()[0].close_count, 1);

        platform.set_popup_mode(PopupMode::Closed);
        host.open_popup(&platform, &definition().dimensions).unwrap();
        assert_eq!(platform.popups()[1].close_count, 0);
    }

    #[test]
    fn test_windowless_frame_is_detached() {
        let platform = MockPlatform::new();
        platform.set_windowless_frames(true);
        let mut host = WindowHost::new();
        let err = host.open_lightbox(&platform, &definition().dimensions).unwrap_err();
        assert!(matches!(err, EmbedError::NoContext(_)));

        let frames = platform.frames();
        assert!(!frames[0].attached);
        assert_eq!(frames[0].detach_count, 1);
        assert!(!host.is_open());
    }

    #[test]
    fn test_popup_closed_by_user_not_closed_again() {
        let platform = MockPlatform::new();
        let mut host = WindowHost::new();
        host.open_popup(&platform, &definition().dimensions).unwrap();
        platform.close_popup(platform.popups()[0].window);

        host.take().unwrap().release();
        assert!(platform.popups()[0].closed);
        assert_eq!(platform.popups()[0].close_count, 0);
    }

    #[test]
    fn test_lightbox_positioned_on_document_root() {
        let platform = MockPlatform::new();
        platform.set_viewport(Size::new(800, 600));
        let mut host = WindowHost::new();
        host.open_lightbox(&platform, &definition().dimensions).unwrap();
        host.load_url("https://child.example?a=1").unwrap();

        let frames = platform.frames();
        let frame = &frames[0];
        assert_eq!(frame.mount, Mount::DocumentRoot);
        assert_eq!(frame.position, Some(Position { x: 200, y: 150 }));
        assert_eq!(frame.src.as_deref(), Some("https://child.example?a=1"));
    }

    #[test]
    fn test_resize_and_release() {
        let platform = MockPlatform::new();
        let mut host = WindowHost::new();
        assert!(host.resize_frame(Size::new(1, 1)).is_err());

        host.open_lightbox(&platform, &definition().dimensions).unwrap();
        assert!(host.is_open());
        host.resize_frame(Size::new(640, 480)).unwrap();
        assert_eq!(platform.frames()[0].size, Size::new(640, 480));

        host.take().unwrap().release();
        assert!(host.window().is_none());
        assert!(!platform.frames()[0].attached);
        assert!(!host.is_open());
        assert!(host.take().is_none());
    }

    #[test]
    fn test_load_url_requires_window() {
        let mut host: WindowHost<crate::testing::MockWindow> = WindowHost::new();
        assert!(matches!(
            host.load_url("https://child.example"),
            Err(EmbedError::UnsupportedOperation(_))
        ));
    }
}
