//! Ordered items: frames, shots, and the sparse patches that edit them.
//!
//! DESIGN
//! ======
//! Frames (storyboard panels) and shots (project shot list entries) carry the
//! same editable content: a description, an optional background image and the
//! opaque drawing export. They differ only in which parent owns them. The
//! autosave collection is generic over [`OrderedItem`], so both kinds share
//! one implementation of buffering, debounced saves and order reconciliation.
//!
//! Change detection compares values field by field. The drawing is compared
//! as its exported string, never as a live widget handle.

#[cfg(test)]
#[path = "item_test.rs"]
mod item_test;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier for a frame, shot, storyboard or project.
pub type ItemId = Uuid;

// =============================================================================
// SAVE STATUS
// =============================================================================

/// Pending-save marker shown next to items with unconfirmed edits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SaveStatus {
    /// Edited locally; a save is scheduled but has not started.
    Dirty,
    /// The save request is in flight.
    Saving,
}

// =============================================================================
// TRAITS
// =============================================================================

/// An item with a dense zero-based position inside its parent collection.
pub trait OrderedItem: Clone + Send + Sync + 'static {
    /// Sparse update type accepted by [`OrderedItem::apply`] and the remote API.
    type Patch: Clone + Default + Serialize + Send + Sync + 'static;

    /// Lowercase entity name used in logs and errors (`"frame"`, `"shot"`).
    const KIND: &'static str;

    fn id(&self) -> ItemId;

    fn order(&self) -> usize;

    fn set_order(&mut self, order: usize);

    /// Merge `patch` into `self`. Returns `true` if any field changed value.
    fn apply(&mut self, patch: &Self::Patch) -> bool;

    /// Full patch describing every editable field; this is the save payload.
    fn to_patch(&self) -> Self::Patch;
}

/// Items that carry a drawing and a background image.
pub trait Drawable: OrderedItem<Patch = ItemPatch> {
    fn content(&self) -> &ItemContent;
}

// =============================================================================
// CONTENT + PATCH
// =============================================================================

/// Editable payload shared by frames and shots.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemContent {
    /// Free-text description.
    #[serde(default)]
    pub description: String,
    /// Background image URL, if one is attached.
    #[serde(default)]
    pub image_url: Option<String>,
    /// Opaque serialized drawing produced by the drawing widget.
    #[serde(default)]
    pub canvas_data: String,
}

impl ItemContent {
    /// Merge a patch, reporting whether anything changed.
    pub fn apply(&mut self, patch: &ItemPatch) -> bool {
        let mut changed = false;
        if let Some(description) = &patch.description {
            if *description != self.description {
                self.description.clone_from(description);
                changed = true;
            }
        }
        if let Some(image_url) = &patch.image_url {
            if *image_url != self.image_url {
                self.image_url.clone_from(image_url);
                changed = true;
            }
        }
        if let Some(canvas_data) = &patch.canvas_data {
            if *canvas_data != self.canvas_data {
                self.canvas_data.clone_from(canvas_data);
                changed = true;
            }
        }
        changed
    }

    #[must_use]
    pub fn to_patch(&self) -> ItemPatch {
        ItemPatch {
            description: Some(self.description.clone()),
            image_url: Some(self.image_url.clone()),
            canvas_data: Some(self.canvas_data.clone()),
        }
    }
}

/// Sparse update for a frame or shot. Only present fields are applied.
///
/// `image_url: Some(None)` removes the background image; `None` leaves it alone.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ItemPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_url: Option<Option<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub canvas_data: Option<String>,
}

impl ItemPatch {
    #[must_use]
    pub fn description(text: impl Into<String>) -> Self {
        Self { description: Some(text.into()), ..Self::default() }
    }

    #[must_use]
    pub fn canvas(data: impl Into<String>) -> Self {
        Self { canvas_data: Some(data.into()), ..Self::default() }
    }

    #[must_use]
    pub fn image(url: Option<String>) -> Self {
        Self { image_url: Some(url), ..Self::default() }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.description.is_none() && self.image_url.is_none() && self.canvas_data.is_none()
    }
}

// =============================================================================
// FRAME
// =============================================================================

/// A storyboard panel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Frame {
    pub id: ItemId,
    pub storyboard_id: ItemId,
    pub order: usize,
    #[serde(flatten)]
    pub content: ItemContent,
}

impl OrderedItem for Frame {
    type Patch = ItemPatch;

    const KIND: &'static str = "frame";

    fn id(&self) -> ItemId {
        self.id
    }

    fn order(&self) -> usize {
        self.order
    }

    fn set_order(&mut self, order: usize) {
        self.order = order;
    }

    fn apply(&mut self, patch: &ItemPatch) -> bool {
        self.content.apply(patch)
    }

    fn to_patch(&self) -> ItemPatch {
        self.content.to_patch()
    }
}

impl Drawable for Frame {
    fn content(&self) -> &ItemContent {
        &self.content
    }
}

// =============================================================================
// SHOT
// =============================================================================

/// An entry in a project's shot list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Shot {
    pub id: ItemId,
    pub project_id: ItemId,
    pub order: usize,
    #[serde(flatten)]
    pub content: ItemContent,
}

impl OrderedItem for Shot {
    type Patch = ItemPatch;

    const KIND: &'static str = "shot";

    fn id(&self) -> ItemId {
        self.id
    }

    fn order(&self) -> usize {
        self.order
    }

    fn set_order(&mut self, order: usize) {
        self.order = order;
    }

    fn apply(&mut self, patch: &ItemPatch) -> bool {
        self.content.apply(patch)
    }

    fn to_patch(&self) -> ItemPatch {
        self.content.to_patch()
    }
}

impl Drawable for Shot {
    fn content(&self) -> &ItemContent {
        &self.content
    }
}

impl Frame {
    /// Build a frame with empty content. Mostly useful for hosts seeding state.
    #[must_use]
    pub fn new(storyboard_id: ItemId, order: usize) -> Self {
        Self { id: Uuid::new_v4(), storyboard_id, order, content: ItemContent::default() }
    }
}

impl Shot {
    #[must_use]
    pub fn new(project_id: ItemId, order: usize) -> Self {
        Self { id: Uuid::new_v4(), project_id, order, content: ItemContent::default() }
    }
}
