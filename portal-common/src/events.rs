//! Store change notifications
//!
//! Every applied mutation is announced on an [`EventBus`] so views and
//! long-running observers can refresh without polling. Emission is lossy:
//! a store with no subscribers keeps working.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

use crate::import::ImportCounts;
use crate::selection::SelectionState;

/// Default channel capacity used by [`crate::store::PortalStore::new`]
pub const DEFAULT_EVENT_CAPACITY: usize = 256;

/// Kind of curriculum change
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StructureChange {
    PhaseCreated,
    PhaseRenamed,
    PhaseDeleted,
    ModuleCreated,
    ModuleRenamed,
    ModuleDeleted,
    LessonCreated,
    LessonUpdated,
    LessonDeleted,
}

/// Kind of roster or community change
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RosterChange {
    UserAdded,
    UserUpdated,
    UserRemoved,
    ResourceAdded,
    ResourceUpdated,
    ResourceRemoved,
    PostAdded,
    PostRemoved,
}

/// Portal events
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum PortalEvent {
    OrganizationCreated {
        organization_id: String,
        timestamp: DateTime<Utc>,
    },

    /// Patch, raw replacement or generated content applied
    OrganizationUpdated {
        organization_id: String,
        timestamp: DateTime<Utc>,
    },

    OrganizationDeleted {
        organization_id: String,
        timestamp: DateTime<Utc>,
    },

    /// A phase, module or lesson was created, renamed, updated or deleted
    StructureChanged {
        organization_id: String,
        change: StructureChange,
        node_id: String,
        timestamp: DateTime<Utc>,
    },

    LessonCompletionToggled {
        organization_id: String,
        lesson_id: String,
        completed: bool,
        timestamp: DateTime<Utc>,
    },

    /// Shared completion percentage written onto every roster entry
    ProgressRecomputed {
        organization_id: String,
        completion_percentage: u8,
        timestamp: DateTime<Utc>,
    },

    RosterChanged {
        organization_id: String,
        change: RosterChange,
        item_id: String,
        timestamp: DateTime<Utc>,
    },

    /// Bulk payload appended to an organization
    StructureImported {
        organization_id: String,
        counts: ImportCounts,
        timestamp: DateTime<Utc>,
    },

    /// Selection moved to a different state (including forced resets)
    SelectionChanged {
        state: SelectionState,
        timestamp: DateTime<Utc>,
    },
}

impl PortalEvent {
    /// Variant name, for logging and filtering
    pub fn event_type(&self) -> &str {
        match self {
            PortalEvent::OrganizationCreated { .. } => "OrganizationCreated",
            PortalEvent::OrganizationUpdated { .. } => "OrganizationUpdated",
            PortalEvent::OrganizationDeleted { .. } => "OrganizationDeleted",
            PortalEvent::StructureChanged { .. } => "StructureChanged",
            PortalEvent::LessonCompletionToggled { .. } => "LessonCompletionToggled",
            PortalEvent::ProgressRecomputed { .. } => "ProgressRecomputed",
            PortalEvent::RosterChanged { .. } => "RosterChanged",
            PortalEvent::StructureImported { .. } => "StructureImported",
            PortalEvent::SelectionChanged { .. } => "SelectionChanged",
        }
    }

    /// Organization the event concerns, if any
    pub fn organization_id(&self) -> Option<&str> {
        match self {
            PortalEvent::OrganizationCreated { organization_id, .. }
            | PortalEvent::OrganizationUpdated { organization_id, .. }
            | PortalEvent::OrganizationDeleted { organization_id, .. }
            | PortalEvent::StructureChanged { organization_id, .. }
            | PortalEvent::LessonCompletionToggled { organization_id, .. }
            | PortalEvent::ProgressRecomputed { organization_id, .. }
            | PortalEvent::RosterChanged { organization_id, .. }
            | PortalEvent::StructureImported { organization_id, .. } => Some(organization_id),
            PortalEvent::SelectionChanged { .. } => None,
        }
    }
}

/// Broadcast channel for [`PortalEvent`]s
///
/// Subscribers only see events emitted after they subscribe. A subscriber
/// that falls more than `capacity` events behind gets `RecvError::Lagged`.
#[derive(Debug, Clone)]
pub struct EventBus {
    tx: broadcast::Sender<PortalEvent>,
    capacity: usize,
}

impl EventBus {
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx, capacity }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<PortalEvent> {
        self.tx.subscribe()
    }

    /// Emit an event to all subscribers
    ///
    /// Returns `Ok(subscriber_count)`, or `Err` if nobody is listening.
    #[allow(clippy::result_large_err)]
    pub fn emit(&self, event: PortalEvent) -> Result<usize, broadcast::error::SendError<PortalEvent>> {
        self.tx.send(event)
    }

    /// Emit an event, ignoring the no-subscriber case
    pub fn emit_lossy(&self, event: PortalEvent) {
        let _ = self.tx.send(event);
    }

    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(DEFAULT_EVENT_CAPACITY)
    }
}
