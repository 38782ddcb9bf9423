//! Rendering context selection
//!
//! Selection produces a [`RenderPlan`]: an ordered list of attempts that
//! is walked until one renders. A blocked popup either ends the walk with
//! [`EmbedError::PopupBlocked`] or, for the default-context popup only,
//! falls through to the next attempt.
//!
//! ```text
//! Unrendered --render--> Rendering(ctx) --opened--> Active(ctx)
//!      ^                      |                         |
//!      +------ failed --------+                     cleanup
//!                                                       v
//!                                                  Destroyed
//! ```

use core::fmt;

use log::debug;

use crate::definition::{ComponentDefinition, Context};
use crate::error::{EmbedError, Result};
use crate::platform::{ElementRef, Mount};

/// Render state of an instance.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RenderState {
    /// Constructed, not rendered yet
    Unrendered,
    /// Opening the window or frame for a context
    Rendering(Context),
    /// Window open, URL loaded
    Active(Context),
    /// Cleaned up (terminal)
    Destroyed,
}

impl RenderState {
    /// Context resolved for this state, if any.
    pub fn context(&self) -> Option<Context> {
        match self {
            RenderState::Rendering(context) | RenderState::Active(context) => Some(*context),
            RenderState::Unrendered | RenderState::Destroyed => None,
        }
    }

    #[inline]
    pub fn is_destroyed(&self) -> bool {
        matches!(self, RenderState::Destroyed)
    }
}

impl fmt::Display for RenderState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RenderState::Unrendered => f.write_str("unrendered"),
            RenderState::Rendering(context) => write!(f, "rendering({})", context),
            RenderState::Active(context) => write!(f, "active({})", context),
            RenderState::Destroyed => f.write_str("destroyed"),
        }
    }
}

/// What to do when an attempt's popup is blocked.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BlockedPolicy {
    /// Fail the render with `PopupBlocked`
    Fail,
    /// Continue with the next attempt
    FallThrough,
}

/// Outcome of a single attempt.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AttemptOutcome {
    Rendered,
    /// The browser refused the popup
    Blocked,
}

/// One step of a render plan.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Attempt {
    pub context: Context,
    /// Frame mount point (None for popups)
    pub mount: Option<Mount>,
    pub on_blocked: BlockedPolicy,
}

impl Attempt {
    fn iframe(element: &ElementRef) -> Self {
        Self {
            context: Context::Iframe,
            mount: Some(Mount::Element(element.clone())),
            on_blocked: BlockedPolicy::Fail,
        }
    }

    fn lightbox() -> Self {
        Self {
            context: Context::Lightbox,
            mount: Some(Mount::DocumentRoot),
            on_blocked: BlockedPolicy::Fail,
        }
    }

    fn popup(on_blocked: BlockedPolicy) -> Self {
        Self {
            context: Context::Popup,
            mount: None,
            on_blocked,
        }
    }
}

/// Ordered attempts plus the error reported when none applies.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RenderPlan {
    attempts: Vec<Attempt>,
    exhausted: EmbedError,
}

impl RenderPlan {
    pub fn attempts(&self) -> &[Attempt] {
        &self.attempts
    }

    /// Run `attempt` for each step until one renders.
    ///
    /// Errors from `attempt` end the walk immediately.
    pub fn execute<F>(self, mut attempt: F) -> Result<Context>
    where
        F: FnMut(&Attempt) -> Result<AttemptOutcome>,
    {
        for step in &self.attempts {
            match attempt(step)? {
                AttemptOutcome::Rendered => return Ok(step.context),
                AttemptOutcome::Blocked => match step.on_blocked {
                    BlockedPolicy::FallThrough => {
                        debug!("[embed] {} blocked, falling back", step.context);
                    }
                    BlockedPolicy::Fail => return Err(EmbedError::PopupBlocked),
                },
            }
        }
        Err(self.exhausted)
    }
}

/// Chooses rendering contexts for a definition.
pub struct ContextSelector<'a> {
    definition: &'a ComponentDefinition,
}

impl<'a> ContextSelector<'a> {
    pub fn new(definition: &'a ComponentDefinition) -> Self {
        Self { definition }
    }

    /// Build the render plan for an optional target element.
    ///
    /// 1. element given and iframe supported: iframe into the element
    /// 2. default context lightbox: lightbox; default popup: popup, falling
    ///    through when blocked
    /// 3. first supported of lightbox, popup (iframe needs an element)
    pub fn plan(&self, element: Option<&ElementRef>) -> RenderPlan {
        let definition = self.definition;
        let no_options = EmbedError::no_context("no context options available for render");

        if let Some(element) = element {
            if definition.supports(Context::Iframe) {
                return RenderPlan {
                    attempts: vec![Attempt::iframe(element)],
                    exhausted: no_options,
                };
            }
        }

        let mut attempts = Vec::new();

        match definition.default_context {
            Some(Context::Lightbox) => {
                return RenderPlan {
                    attempts: vec![Attempt::lightbox()],
                    exhausted: no_options,
                };
            }
            Some(Context::Popup) => attempts.push(Attempt::popup(BlockedPolicy::FallThrough)),
            Some(Context::Iframe) | None => {}
        }

        let exhausted = if definition.supports(Context::Lightbox) {
            attempts.push(Attempt::lightbox());
            no_options
        } else if definition.supports(Context::Popup) {
            attempts.push(Attempt::popup(BlockedPolicy::Fail));
            no_options
        } else if definition.supports(Context::Iframe) {
            EmbedError::no_context("can not render to iframe without a container element")
        } else {
            no_options
        };

        RenderPlan { attempts, exhausted }
    }
}
