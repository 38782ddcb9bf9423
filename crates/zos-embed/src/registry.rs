//! Active instance registry
//!
//! Owned by the application and shared with every instance it constructs,
//! so independent registries (one per test, one per host app) never see
//! each other's instances. Entries are removed at cleanup.

use core::cell::{Cell, RefCell};
use core::fmt;
use std::collections::BTreeMap;

use log::debug;

use crate::definition::ComponentDefinition;
use crate::error::{EmbedError, Result};

/// Identifier of a constructed instance.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct InstanceId(u64);

impl InstanceId {
    pub fn as_u64(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for InstanceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Record of active instances, keyed by id, holding the definition tag.
#[derive(Debug)]
pub struct ComponentRegistry {
    active: RefCell<BTreeMap<InstanceId, String>>,
    next_id: Cell<u64>,
}

impl Default for ComponentRegistry {
    fn default() -> Self {
        Self {
            active: RefCell::new(BTreeMap::new()),
            next_id: Cell::new(1),
        }
    }
}

impl ComponentRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a new instance of `definition`.
    ///
    /// # Returns
    /// * `Ok(id)` - Instance recorded
    /// * `Err(EmbedError::SingletonViolation)` - Singleton already active
    pub fn register(&self, definition: &ComponentDefinition) -> Result<InstanceId> {
        let mut active = self.active.borrow_mut();

        if definition.singleton && active.values().any(|tag| *tag == definition.tag) {
            return Err(EmbedError::SingletonViolation {
                tag: definition.tag.clone(),
            });
        }

        let id = InstanceId(self.next_id.get());
        self.next_id.set(id.0 + 1);
        active.insert(id, definition.tag.clone());
        debug!("[embed:{}] registered instance {}", definition.tag, id);
        Ok(id)
    }

    /// Remove an instance. Returns false if it was not active.
    pub fn release(&self, id: InstanceId) -> bool {
        self.active.borrow_mut().remove(&id).is_some()
    }

    pub fn is_active(&self, id: InstanceId) -> bool {
        self.active.borrow().contains_key(&id)
    }

    /// Number of active instances with `tag`.
    pub fn active_count(&self, tag: &str) -> usize {
        self.active.borrow().values().filter(|t| *t == tag).count()
    }

    pub fn len(&self) -> usize {
        self.active.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.active.borrow().is_empty()
    }
}
