//! Ordered, debounced-autosave collection.
//!
//! DESIGN
//! ======
//! One `Collection<T>` owns everything about a list of frames or shots:
//!
//! - the local buffer, the single source of truth for reads, mutated
//!   synchronously on every edit;
//! - a render snapshot published on a `watch` channel at most once per render
//!   interval, so a burst of strokes costs one re-render;
//! - one debounce handle per item id. Each edit resets that item's timer and
//!   only the latest buffered state is sent when it fires;
//! - Pending-Save markers (`Dirty` once scheduled, `Saving` while in flight).
//!
//! Reorders are applied to the buffer optimistically and moved back if the
//! remote rejects them. Deletes cancel the item's pending save before the
//! remote call so no stale save can follow a delete.
//!
//! The state lives behind a `std::sync::Mutex` that is never held across an
//! `.await`; timers are Tokio tasks holding an `Arc` of the shared core.
//!
//! ERROR HANDLING
//! ==============
//! Autosave failures are logged, the marker goes back to `Dirty` and the
//! handle is parked without a timer. Nothing retries on its own: the next
//! edit reschedules it, and `flush`/`flush_all` send it immediately. Reorder
//! and delete failures are returned to the caller after local state is
//! restored.

#[cfg(test)]
#[path = "collection_test.rs"]
mod collection_test;

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use futures::future::join_all;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use crate::item::{Drawable, ItemId, ItemPatch, OrderedItem, SaveStatus};
use crate::order;
use crate::remote::{Remote, RemoteError};
use crate::sketch::{DrawingSurface, SketchError};

// =============================================================================
// TYPES
// =============================================================================

#[derive(Debug, thiserror::Error)]
pub enum CollectionError {
    #[error("{kind} not found: {id}")]
    NotFound { kind: &'static str, id: ItemId },
    #[error("order {order} out of range for {len} {kind}s")]
    OrderOutOfRange { kind: &'static str, order: usize, len: usize },
    #[error("remote call failed: {0}")]
    Remote(#[from] RemoteError),
    #[error("drawing could not be restored: {0}")]
    Sketch(#[from] SketchError),
}

impl crate::error::ErrorCode for CollectionError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::NotFound { .. } => "E_ITEM_NOT_FOUND",
            Self::OrderOutOfRange { .. } => "E_ORDER_OUT_OF_RANGE",
            Self::Remote(e) => e.error_code(),
            Self::Sketch(e) => e.error_code(),
        }
    }

    fn retryable(&self) -> bool {
        match self {
            Self::Remote(e) => e.retryable(),
            _ => false,
        }
    }
}

/// A scheduled or parked save for one item.
struct PendingSave {
    generation: u64,
    /// `None` once parked after a failed save; only a flush or new edit sends it.
    timer: Option<JoinHandle<()>>,
}

impl PendingSave {
    fn cancel(self) {
        if let Some(timer) = self.timer {
            timer.abort();
        }
    }
}

struct PendingRender {
    generation: u64,
    timer: JoinHandle<()>,
}

struct State<T> {
    /// Buffer, kept sorted by order.
    items: Vec<T>,
    markers: HashMap<ItemId, SaveStatus>,
    pending: HashMap<ItemId, PendingSave>,
    render: Option<PendingRender>,
    generation: u64,
}

impl<T: OrderedItem> State<T> {
    fn next_generation(&mut self) -> u64 {
        self.generation += 1;
        self.generation
    }

    fn find(&self, id: ItemId) -> Option<&T> {
        self.items.iter().find(|item| item.id() == id)
    }

    /// Keep a save for `id` without a timer; only a flush or a new edit sends it.
    fn park(&mut self, id: ItemId) {
        let generation = self.next_generation();
        self.pending.insert(id, PendingSave { generation, timer: None });
        self.markers.insert(id, SaveStatus::Dirty);
    }

    fn not_found(id: ItemId) -> CollectionError {
        CollectionError::NotFound { kind: T::KIND, id }
    }
}

struct Shared<T: OrderedItem> {
    state: Mutex<State<T>>,
    remote: Arc<dyn Remote<T>>,
    save_delay: Duration,
    render_delay: Duration,
    rendered: watch::Sender<Vec<T>>,
}

// =============================================================================
// SHARED CORE
// =============================================================================

impl<T: OrderedItem> Shared<T> {
    fn lock(&self) -> MutexGuard<'_, State<T>> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn schedule_save_locked(self: &Arc<Self>, state: &mut State<T>, id: ItemId) {
        state.markers.insert(id, SaveStatus::Dirty);
        if let Some(previous) = state.pending.remove(&id) {
            previous.cancel();
        }

        let generation = state.next_generation();
        let shared = Arc::clone(self);
        let delay = self.save_delay;
        let timer = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            shared.fire_save(id, generation).await;
        });
        state.pending.insert(id, PendingSave { generation, timer: Some(timer) });
    }

    async fn fire_save(&self, id: ItemId, generation: u64) {
        let current = {
            let mut state = self.lock();
            match state.pending.get(&id) {
                Some(pending) if pending.generation == generation => {
                    state.pending.remove(&id);
                    true
                }
                _ => false,
            }
        };
        if current {
            self.save(id).await;
        }
    }

    /// Send the latest buffered state of `id`. The caller has already removed
    /// the pending handle. Returns `true` on success.
    async fn save(&self, id: ItemId) -> bool {
        let patch = {
            let mut state = self.lock();
            let patch = state.find(id).map(OrderedItem::to_patch);
            let Some(patch) = patch else {
                // EDGE: item deleted between scheduling and firing.
                state.markers.remove(&id);
                return false;
            };
            state.markers.insert(id, SaveStatus::Saving);
            patch
        };

        match self.remote.update(id, &patch).await {
            Ok(()) => {
                let mut state = self.lock();
                // EDGE: an edit during the request scheduled a newer save; keep its marker.
                if !state.pending.contains_key(&id) {
                    state.markers.remove(&id);
                }
                debug!(kind = T::KIND, %id, "saved");
                true
            }
            Err(e) => {
                error!(kind = T::KIND, %id, error = %e, "save failed; kept for manual flush");
                let mut state = self.lock();
                if !state.pending.contains_key(&id) && state.find(id).is_some() {
                    state.park(id);
                }
                false
            }
        }
    }

    /// Publish a render snapshot within one render interval. Calls made while
    /// one is already scheduled coalesce into it.
    fn schedule_render_locked(self: &Arc<Self>, state: &mut State<T>) {
        if state.render.is_some() {
            return;
        }
        let generation = state.next_generation();
        let shared = Arc::clone(self);
        let delay = self.render_delay;
        let timer = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            shared.fire_render(generation);
        });
        state.render = Some(PendingRender { generation, timer });
    }

    fn fire_render(&self, generation: u64) {
        let mut state = self.lock();
        if state.render.as_ref().is_some_and(|r| r.generation == generation) {
            state.render = None;
            self.rendered.send_replace(state.items.clone());
        }
    }

    /// Publish immediately, superseding any scheduled render.
    fn publish_locked(&self, state: &mut State<T>) {
        if let Some(render) = state.render.take() {
            render.timer.abort();
        }
        self.rendered.send_replace(state.items.clone());
    }
}

// =============================================================================
// COLLECTION
// =============================================================================

/// Handle to an ordered autosave collection. Clones share the same state.
///
/// Mutating operations spawn Tokio timers and must run inside a Tokio runtime.
pub struct Collection<T: OrderedItem> {
    shared: Arc<Shared<T>>,
}

impl<T: OrderedItem> Clone for Collection<T> {
    fn clone(&self) -> Self {
        Self { shared: Arc::clone(&self.shared) }
    }
}

impl<T: OrderedItem> Collection<T> {
    #[must_use]
    pub fn new(remote: Arc<dyn Remote<T>>, save_delay: Duration, render_delay: Duration) -> Self {
        let (rendered, _) = watch::channel(Vec::new());
        let state = State {
            items: Vec::new(),
            markers: HashMap::new(),
            pending: HashMap::new(),
            render: None,
            generation: 0,
        };
        Self {
            shared: Arc::new(Shared { state: Mutex::new(state), remote, save_delay, render_delay, rendered }),
        }
    }

    // -------------------------------------------------------------------------
    // Reads
    // -------------------------------------------------------------------------

    /// Buffered items, sorted by order.
    #[must_use]
    pub fn items(&self) -> Vec<T> {
        self.shared.lock().items.clone()
    }

    #[must_use]
    pub fn get(&self, id: ItemId) -> Option<T> {
        self.shared.lock().find(id).cloned()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.shared.lock().items.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.shared.lock().items.is_empty()
    }

    /// Receiver for the rendered (coalesced) snapshot of the collection.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<Vec<T>> {
        self.shared.rendered.subscribe()
    }

    #[must_use]
    pub fn save_status(&self, id: ItemId) -> Option<SaveStatus> {
        self.shared.lock().markers.get(&id).copied()
    }

    /// Items with unconfirmed edits, in display order.
    #[must_use]
    pub fn unsaved(&self) -> Vec<(ItemId, SaveStatus)> {
        let state = self.shared.lock();
        state
            .items
            .iter()
            .filter_map(|item| state.markers.get(&item.id()).map(|status| (item.id(), *status)))
            .collect()
    }

    #[must_use]
    pub fn has_unsaved(&self) -> bool {
        !self.shared.lock().markers.is_empty()
    }

    // -------------------------------------------------------------------------
    // Load / create
    // -------------------------------------------------------------------------

    /// Replace the buffer with the remote collection. Pending saves are
    /// flushed first so local edits are not overwritten.
    ///
    /// # Errors
    ///
    /// Returns the remote error if the listing fails; the buffer is left as is.
    pub async fn load(&self) -> Result<usize, CollectionError> {
        self.flush_all().await;
        let mut items = self.shared.remote.list().await?;
        order::sort(&mut items);
        if !order::is_dense(&items) {
            warn!(kind = T::KIND, count = items.len(), "remote orders are not dense");
        }

        let count = items.len();
        let mut guard = self.shared.lock();
        let state = &mut *guard;
        state.items = items;
        // EDGE: saves parked by a failed flush stay dirty; saves still in flight stay saving.
        let pending = &state.pending;
        state
            .markers
            .retain(|id, status| *status == SaveStatus::Saving || pending.contains_key(id));
        self.shared.publish_locked(state);
        info!(kind = T::KIND, count, "collection loaded");
        Ok(count)
    }

    /// Create an item remotely and insert it at the order the server assigned.
    ///
    /// # Errors
    ///
    /// Returns the remote error; nothing is inserted locally on failure.
    pub async fn create(&self, patch: T::Patch) -> Result<T, CollectionError> {
        let item = self.shared.remote.create(&patch).await?;
        let mut created = item.clone();

        let at = {
            let mut state = self.shared.lock();
            let at = order::insert_item(&mut state.items, item);
            self.shared.publish_locked(&mut state);
            at
        };
        created.set_order(at);
        info!(kind = T::KIND, id = %created.id(), order = at, "created");
        Ok(created)
    }

    // -------------------------------------------------------------------------
    // Edits + autosave
    // -------------------------------------------------------------------------

    /// Merge `patch` into the buffered item. Returns `Ok(false)` when nothing
    /// changed, in which case no save is scheduled.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if `id` is not in the buffer.
    pub fn update(&self, id: ItemId, patch: &T::Patch) -> Result<bool, CollectionError> {
        let mut guard = self.shared.lock();
        let state = &mut *guard;
        let item = state
            .items
            .iter_mut()
            .find(|item| item.id() == id)
            .ok_or_else(|| State::<T>::not_found(id))?;
        if !item.apply(patch) {
            return Ok(false);
        }

        self.shared.schedule_render_locked(state);
        self.shared.schedule_save_locked(state, id);
        Ok(true)
    }

    /// (Re)start the save timer for `id`.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if `id` is not in the buffer.
    pub fn schedule_save(&self, id: ItemId) -> Result<(), CollectionError> {
        let mut state = self.shared.lock();
        if state.find(id).is_none() {
            return Err(State::<T>::not_found(id));
        }
        self.shared.schedule_save_locked(&mut state, id);
        Ok(())
    }

    /// Send the pending save for `id` now. Returns `true` if a save ran and
    /// succeeded; `false` if nothing was pending or the save failed.
    pub async fn flush(&self, id: ItemId) -> bool {
        let pending = self.shared.lock().pending.remove(&id);
        let Some(pending) = pending else {
            return false;
        };
        pending.cancel();
        self.shared.save(id).await
    }

    /// Send every pending save concurrently and wait for all of them.
    /// Returns how many succeeded.
    pub async fn flush_all(&self) -> usize {
        let ids: Vec<ItemId> = {
            let mut state = self.shared.lock();
            state
                .pending
                .drain()
                .map(|(id, pending)| {
                    pending.cancel();
                    id
                })
                .collect()
        };
        if ids.is_empty() {
            return 0;
        }

        let results = join_all(ids.iter().map(|id| self.shared.save(*id))).await;
        let saved = results.into_iter().filter(|ok| *ok).count();
        info!(kind = T::KIND, pending = ids.len(), saved, "flushed pending saves");
        saved
    }

    // -------------------------------------------------------------------------
    // Structure
    // -------------------------------------------------------------------------

    /// Move `id` to `new_order`, optimistically, then confirm with the remote.
    ///
    /// # Errors
    ///
    /// Returns `NotFound`, `OrderOutOfRange`, or the remote error. On remote
    /// failure the item is moved back before returning.
    pub async fn change_order(&self, id: ItemId, new_order: usize) -> Result<(), CollectionError> {
        let old_order = {
            let mut guard = self.shared.lock();
            let state = &mut *guard;
            let old_order = state.find(id).ok_or_else(|| State::<T>::not_found(id))?.order();
            let len = state.items.len();
            if new_order >= len {
                return Err(CollectionError::OrderOutOfRange { kind: T::KIND, order: new_order, len });
            }
            if old_order == new_order {
                return Ok(());
            }

            order::move_item(&mut state.items, id, new_order);
            self.shared.publish_locked(state);
            old_order
        };

        if let Err(e) = self.shared.remote.change_order(id, new_order).await {
            warn!(kind = T::KIND, %id, new_order, old_order, error = %e, "reorder rejected; rolling back");
            let mut guard = self.shared.lock();
            let state = &mut *guard;
            // EDGE: siblings may have been created, deleted or moved while the
            // request was in flight; undo only this move, clamped to the current length.
            if state.find(id).is_some() {
                let back = old_order.min(state.items.len() - 1);
                order::move_item(&mut state.items, id, back);
                self.shared.publish_locked(state);
            }
            return Err(e.into());
        }

        debug!(kind = T::KIND, %id, new_order, "reordered");
        Ok(())
    }

    /// Delete `id` remotely, then locally, closing the order gap.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` or the remote error. On remote failure the item is
    /// kept and its cancelled save is put back as it was: a scheduled save is
    /// rescheduled, a parked one stays parked.
    pub async fn delete(&self, id: ItemId) -> Result<(), CollectionError> {
        let cancelled = {
            let mut state = self.shared.lock();
            if state.find(id).is_none() {
                return Err(State::<T>::not_found(id));
            }
            state.pending.remove(&id).map(|pending| {
                let parked = pending.timer.is_none();
                pending.cancel();
                parked
            })
        };

        if let Err(e) = self.shared.remote.delete(id).await {
            warn!(kind = T::KIND, %id, error = %e, "delete rejected");
            let mut guard = self.shared.lock();
            let state = &mut *guard;
            // EDGE: an edit during the request already scheduled a newer save.
            if state.find(id).is_some() && !state.pending.contains_key(&id) {
                match cancelled {
                    Some(true) => state.park(id),
                    Some(false) => self.shared.schedule_save_locked(state, id),
                    None => {}
                }
            }
            return Err(e.into());
        }

        let mut state = self.shared.lock();
        order::remove_item(&mut state.items, id);
        state.markers.remove(&id);
        if let Some(pending) = state.pending.remove(&id) {
            pending.cancel();
        }
        self.shared.publish_locked(&mut state);
        info!(kind = T::KIND, %id, "deleted");
        Ok(())
    }
}

// =============================================================================
// DRAWABLE ITEMS
// =============================================================================

impl<T: Drawable> Collection<T> {
    /// Export the widget's drawing and merge it into `id`. An export equal to
    /// the buffered one is not a change and schedules nothing.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if `id` is not in the buffer.
    pub fn update_canvas(&self, id: ItemId, surface: &dyn DrawingSurface) -> Result<bool, CollectionError> {
        self.update(id, &ItemPatch::canvas(surface.export_state()))
    }

    /// Load the buffered drawing of `id` into the widget.
    ///
    /// # Errors
    ///
    /// Returns `NotFound`, or `Sketch` if the widget rejects the stored data.
    pub fn restore_canvas(&self, id: ItemId, surface: &mut dyn DrawingSurface) -> Result<(), CollectionError> {
        let item = self.get(id).ok_or_else(|| State::<T>::not_found(id))?;
        surface.load_state(&item.content().canvas_data)?;
        Ok(())
    }

    /// Attach or clear the background image URL.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if `id` is not in the buffer.
    pub fn set_background_image(&self, id: ItemId, url: Option<String>) -> Result<bool, CollectionError> {
        self.update(id, &ItemPatch::image(url))
    }
}
