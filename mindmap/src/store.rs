//! The block store: owns every block of one mindmap and the operations that
//! mutate them.
//!
//! Every mutation runs to completion synchronously and is written through to
//! storage before returning. Work that should wait for input to settle
//! (viewport fit, auto-resize, recentering, marker clearing) is queued on
//! [`Debouncer`]s and run by [`BlockStore::tick`] once due, or immediately by
//! [`BlockStore::flush_deferred`].
//!
//! Overlap is resolved when a block is created, when a block's size changes
//! significantly, and when a drag ends. Dragging itself never runs the
//! resolver.

#[cfg(test)]
#[path = "store_test.rs"]
mod store_test;

use std::collections::{BTreeMap, BTreeSet, VecDeque};

use serde::de::DeserializeOwned;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::block::{Block, BlockId, PartialBlock};
use crate::camera::{Camera, Point, Viewport};
use crate::clock::Clock;
use crate::config::LayoutConfig;
use crate::debounce::Debouncer;
use crate::interaction::{BlockState, EditStart, Interaction};
use crate::measure::TextMeasurer;
use crate::notify::{NotificationKind, Notifier};
use crate::organize::{OrganizeSnapshot, grid_layout};
use crate::overlap::{MovedBlock, OverlapResolver};
use crate::sizer::BlockSizer;
use crate::stats::MindmapStats;
use crate::storage::{Storage, StorageError, blocks_key, canvas_key, pinned_key};
use crate::transfer::{ExportDocument, ImportMode, ImportPlan};
use crate::viewport::ViewportFitter;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("block not found: {0}")]
    NotFound(BlockId),
    #[error("invalid coordinates ({0}, {1})")]
    InvalidCoordinates(f64, f64),
    #[error(transparent)]
    Storage(#[from] StorageError),
    #[error("serialization failed: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// A deleted block held for undo.
#[derive(Debug, Clone, PartialEq)]
pub struct DeletedBlock {
    pub block: Block,
    pub deleted_at: i64,
    pub was_pinned: bool,
}

/// One block's slot in a cascade animation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CascadeStep {
    pub id: BlockId,
    /// Delay before this block's move animation starts.
    pub delay_ms: u64,
    pub distance: f64,
}

/// Blocks displaced by the most recent resolve, nearest to the subject first.
#[derive(Debug, Clone, PartialEq)]
pub struct Cascade {
    pub subject: BlockId,
    pub steps: Vec<CascadeStep>,
}

/// What a [`BlockStore::tick`] or [`BlockStore::flush_deferred`] call ran.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DeferredRun {
    pub fitted: bool,
    pub resized: Vec<BlockId>,
    pub recentered: bool,
    pub markers_cleared: bool,
}

impl DeferredRun {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        !self.fitted && self.resized.is_empty() && !self.recentered && !self.markers_cleared
    }
}

pub struct BlockStore<S: Storage> {
    mindmap_id: String,
    storage: S,
    config: LayoutConfig,
    clock: Box<dyn Clock>,
    notifier: Box<dyn Notifier>,
    sizer: BlockSizer,
    resolver: OverlapResolver,
    fitter: ViewportFitter,

    blocks: Vec<Block>,
    camera: Camera,
    viewport: Viewport,
    pinned: BTreeSet<BlockId>,
    pin_mode: bool,
    organize: Option<OrganizeSnapshot>,
    undo: VecDeque<DeletedBlock>,
    interaction: Interaction,
    selection: Option<BlockId>,

    fit_timer: Debouncer,
    resize_timers: BTreeMap<BlockId, Debouncer>,
    recenter_timer: Debouncer,
    marker_timer: Debouncer,
    repositioning: BTreeSet<BlockId>,
    last_cascade: Option<Cascade>,
    /// Set while in-memory state has not reached storage.
    dirty: bool,
}

impl<S: Storage> BlockStore<S> {
    // =========================================================================
    // LIFECYCLE
    // =========================================================================

    /// Open the store for `mindmap_id`, loading persisted state.
    ///
    /// Missing or corrupt entries fall back to an empty block list, a default
    /// camera and no pins.
    ///
    /// # Errors
    ///
    /// Returns an error only if the storage backend itself fails.
    pub fn init(
        mindmap_id: &str,
        storage: S,
        config: LayoutConfig,
        clock: impl Clock + 'static,
        notifier: impl Notifier + 'static,
    ) -> Result<Self, StoreError> {
        let sizer = BlockSizer::new(TextMeasurer::default(), config.font.clone(), config.sizing);
        Self::with_sizer(mindmap_id, storage, config, sizer, clock, notifier)
    }

    /// Like [`BlockStore::init`] with a caller-supplied sizer, for hosts with
    /// real font metrics.
    ///
    /// # Errors
    ///
    /// Returns an error only if the storage backend itself fails.
    pub fn with_sizer(
        mindmap_id: &str,
        storage: S,
        config: LayoutConfig,
        sizer: BlockSizer,
        clock: impl Clock + 'static,
        notifier: impl Notifier + 'static,
    ) -> Result<Self, StoreError> {
        let mut blocks: Vec<Block> = load_json(&storage, &blocks_key(mindmap_id))?.unwrap_or_default();
        let loaded = blocks.len();
        blocks.retain(Block::is_well_formed);
        if blocks.len() != loaded {
            warn!(mindmap = %mindmap_id, dropped = loaded - blocks.len(), "dropped malformed blocks");
        }

        let camera = load_json::<Camera>(&storage, &canvas_key(mindmap_id))?
            .map(Camera::sanitized)
            .unwrap_or_default();

        let pinned: BTreeSet<BlockId> = load_json::<Vec<BlockId>>(&storage, &pinned_key(mindmap_id))?
            .unwrap_or_default()
            .into_iter()
            .filter(|id| blocks.iter().any(|b| b.id == *id))
            .collect();

        info!(mindmap = %mindmap_id, blocks = blocks.len(), pinned = pinned.len(), "block store opened");

        Ok(Self {
            mindmap_id: mindmap_id.to_string(),
            storage,
            resolver: OverlapResolver::new(config.resolver),
            fitter: ViewportFitter::new(config.fit.clone()),
            config,
            clock: Box::new(clock),
            notifier: Box::new(notifier),
            sizer,
            blocks,
            camera,
            viewport: Viewport::default(),
            pinned,
            pin_mode: false,
            organize: None,
            undo: VecDeque::new(),
            interaction: Interaction::default(),
            selection: None,
            fit_timer: Debouncer::new(),
            resize_timers: BTreeMap::new(),
            recenter_timer: Debouncer::new(),
            marker_timer: Debouncer::new(),
            repositioning: BTreeSet::new(),
            last_cascade: None,
            dirty: false,
        })
    }

    /// Run pending deferred work, write anything not yet stored, and hand
    /// back the storage. A session with no mutations writes nothing, so
    /// corrupt entries stay as they are until explicitly cleaned.
    ///
    /// # Errors
    ///
    /// Returns an error if the final write fails.
    pub fn teardown(mut self) -> Result<S, StoreError> {
        self.flush_deferred()?;
        if self.dirty {
            self.persist()?;
        }
        info!(mindmap = %self.mindmap_id, blocks = self.blocks.len(), "block store closed");
        Ok(self.storage)
    }

    // =========================================================================
    // READS
    // =========================================================================

    #[must_use]
    pub fn mindmap_id(&self) -> &str {
        &self.mindmap_id
    }

    #[must_use]
    pub fn config(&self) -> &LayoutConfig {
        &self.config
    }

    #[must_use]
    pub fn storage(&self) -> &S {
        &self.storage
    }

    /// Every block, regardless of pin mode.
    #[must_use]
    pub fn blocks(&self) -> &[Block] {
        &self.blocks
    }

    #[must_use]
    pub fn block(&self, id: &BlockId) -> Option<&Block> {
        self.blocks.iter().find(|b| b.id == *id)
    }

    /// Blocks visible under the current pin mode.
    #[must_use]
    pub fn visible_blocks(&self) -> Vec<&Block> {
        self.blocks.iter().filter(|b| !self.pin_mode || self.pinned.contains(&b.id)).collect()
    }

    fn visible_owned(&self) -> Vec<Block> {
        self.visible_blocks().into_iter().cloned().collect()
    }

    #[must_use]
    pub fn camera(&self) -> Camera {
        self.camera
    }

    #[must_use]
    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    #[must_use]
    pub fn state_of(&self, id: &BlockId) -> BlockState {
        self.interaction.state_of(id)
    }

    #[must_use]
    pub fn editing(&self) -> Option<BlockId> {
        self.interaction.editing()
    }

    #[must_use]
    pub fn dragging(&self) -> Option<BlockId> {
        self.interaction.dragging()
    }

    #[must_use]
    pub fn selection(&self) -> Option<BlockId> {
        self.selection
    }

    #[must_use]
    pub fn is_pinned(&self, id: &BlockId) -> bool {
        self.pinned.contains(id)
    }

    #[must_use]
    pub fn pinned(&self) -> &BTreeSet<BlockId> {
        &self.pinned
    }

    #[must_use]
    pub fn pin_mode(&self) -> bool {
        self.pin_mode
    }

    #[must_use]
    pub fn organize_active(&self) -> bool {
        self.organize.is_some()
    }

    #[must_use]
    pub fn undo_depth(&self) -> usize {
        self.undo.len()
    }

    /// Blocks currently flagged as recently moved by the resolver.
    #[must_use]
    pub fn repositioning(&self) -> &BTreeSet<BlockId> {
        &self.repositioning
    }

    #[must_use]
    pub fn last_cascade(&self) -> Option<&Cascade> {
        self.last_cascade.as_ref()
    }

    /// Whether any deferred work is queued.
    #[must_use]
    pub fn has_pending(&self) -> bool {
        self.fit_timer.is_pending()
            || self.recenter_timer.is_pending()
            || self.marker_timer.is_pending()
            || self.resize_timers.values().any(Debouncer::is_pending)
    }

    /// Statistics over visible blocks.
    #[must_use]
    pub fn stats(&self) -> MindmapStats {
        MindmapStats::collect(self.visible_blocks(), &self.pinned)
    }

    // =========================================================================
    // CANVAS
    // =========================================================================

    /// Track the host window size. Not persisted.
    pub fn set_viewport(&mut self, width: f64, height: f64) {
        self.viewport = Viewport::new(width, height);
    }

    /// Replace the camera (host-driven pan/zoom).
    ///
    /// # Errors
    ///
    /// Returns an error if persisting fails.
    pub fn set_camera(&mut self, camera: Camera) -> Result<(), StoreError> {
        self.camera = camera.sanitized();
        self.persist()
    }

    /// Fit all visible blocks into the viewport now.
    ///
    /// # Errors
    ///
    /// Returns an error if persisting fails.
    pub fn fit_viewport(&mut self) -> Result<Camera, StoreError> {
        self.fit_timer.cancel();
        self.apply_fit();
        self.persist()?;
        Ok(self.camera)
    }

    fn apply_fit(&mut self) {
        let visible = self.visible_owned();
        self.camera = self.fitter.fit(&visible, self.viewport);
        debug!(zoom = self.camera.zoom, blocks = visible.len(), "viewport fitted");
    }

    // =========================================================================
    // BLOCKS
    // =========================================================================

    /// Create a block at a screen position and start editing it.
    ///
    /// Existing blocks are pushed out of the way; the new block stays where
    /// it was placed. A viewport fit is scheduled.
    ///
    /// # Errors
    ///
    /// Returns an error for non-finite coordinates or if persisting fails.
    pub fn create_block(&mut self, screen_x: f64, screen_y: f64, content: &str) -> Result<BlockId, StoreError> {
        let world = self.camera.screen_to_world(Point::new(screen_x, screen_y));
        if !world.x.is_finite() || !world.y.is_finite() {
            return Err(StoreError::InvalidCoordinates(screen_x, screen_y));
        }
        let now = self.clock.now_ms();
        let id = self.insert_new_block(world, content, now);

        self.begin_edit_inner(id, now);
        self.selection = Some(id);
        self.fit_timer.schedule(now, self.config.delays.fit_ms);
        self.persist()?;
        info!(id = %id, x = world.x, y = world.y, "block created");
        Ok(id)
    }

    /// Size a new block, clear space for it, and add it.
    fn insert_new_block(&mut self, world: Point, content: &str, now: i64) -> BlockId {
        let size = self.sizer.size(content, false);
        let block = Block::new(content, world.x, world.y, size.width, size.height, now);
        let id = block.id;
        self.blocks.push(block);
        let index = self.blocks.len() - 1;
        self.settle_around(index, now, false);
        id
    }

    /// Merge `patch` into a block.
    ///
    /// Content or image edits schedule a debounced resize. A significant size change
    /// or an image being added or removed resolves overlap immediately with
    /// the block as subject. Explicit sizes are floored at what the content
    /// needs.
    ///
    /// # Errors
    ///
    /// Returns an error if the block does not exist or persisting fails.
    pub fn update_block(&mut self, id: &BlockId, patch: &PartialBlock) -> Result<(), StoreError> {
        let index = self.index_of(id)?;
        let now = self.clock.now_ms();
        let before = self.blocks[index].clone();
        {
            let block = &mut self.blocks[index];
            patch.apply_to(block);
            block.last_edited = now;
        }

        let image_toggled = before.has_image() != self.blocks[index].has_image();
        if image_toggled {
            self.cancel_resize(id);
            self.fit_to_content(index);
        } else {
            if patch.width.is_some() || patch.height.is_some() {
                self.floor_at_required(index);
            }
            if patch.touches_content() {
                self.resize_timers
                    .entry(*id)
                    .or_default()
                    .schedule(now, self.config.delays.resize_ms);
            }
        }

        if image_toggled || self.is_significant_resize(&before, &self.blocks[index]) {
            self.settle_around(index, now, true);
        }
        self.persist()?;
        debug!(id = %id, "block updated");
        Ok(())
    }

    /// Remove a block and keep a copy for undo.
    ///
    /// # Errors
    ///
    /// Returns an error if the block does not exist or persisting fails.
    pub fn delete_block(&mut self, id: &BlockId) -> Result<(), StoreError> {
        let index = self.index_of(id)?;
        let now = self.clock.now_ms();
        let block = self.blocks.remove(index);
        let was_pinned = self.pinned.remove(id);

        if self.config.undo_limit > 0 {
            self.undo.push_back(DeletedBlock { block, deleted_at: now, was_pinned });
            while self.undo.len() > self.config.undo_limit {
                self.undo.pop_front();
            }
        }

        self.interaction.forget(id);
        if self.selection == Some(*id) {
            self.selection = None;
        }
        self.cancel_resize(id);
        self.repositioning.remove(id);
        if let Some(snapshot) = self.organize.as_mut() {
            snapshot.forget(id);
        }
        if self.pin_mode && self.pinned.is_empty() {
            self.pin_mode = false;
        }

        self.persist()?;
        info!(id = %id, undo_depth = self.undo.len(), "block deleted");
        Ok(())
    }

    /// Restore the most recently deleted block.
    ///
    /// Returns `None` and notifies the user when there is nothing to undo.
    ///
    /// # Errors
    ///
    /// Returns an error if persisting fails.
    pub fn undo_delete(&mut self) -> Result<Option<BlockId>, StoreError> {
        let Some(entry) = self.undo.pop_back() else {
            self.notifier
                .notify("Nothing to undo", NotificationKind::Info, self.config.delays.notification_ms);
            return Ok(None);
        };
        let id = entry.block.id;
        self.blocks.push(entry.block);
        if entry.was_pinned {
            self.pinned.insert(id);
        }
        self.persist()?;
        info!(id = %id, undo_depth = self.undo.len(), "block restored");
        Ok(Some(id))
    }

    /// Copy a block under a new id, offset from the original. The copy is
    /// allowed to overlap.
    ///
    /// # Errors
    ///
    /// Returns an error if the block does not exist or persisting fails.
    pub fn duplicate_block(&mut self, id: &BlockId) -> Result<BlockId, StoreError> {
        let index = self.index_of(id)?;
        let now = self.clock.now_ms();
        let mut copy = self.blocks[index].clone();
        copy.id = Uuid::new_v4();
        copy.x += self.config.duplicate_offset;
        copy.y += self.config.duplicate_offset;
        copy.created_at = now;
        copy.last_edited = now;
        let new_id = copy.id;
        self.blocks.push(copy);
        self.persist()?;
        debug!(id = %id, copy = %new_id, "block duplicated");
        Ok(new_id)
    }

    /// Move a block by a screen-space delta. Only zoom affects the
    /// conversion. Overlap is not resolved here.
    ///
    /// # Errors
    ///
    /// Returns an error if the block does not exist or persisting fails.
    pub fn move_block(&mut self, id: &BlockId, screen_dx: f64, screen_dy: f64) -> Result<(), StoreError> {
        let index = self.index_of(id)?;
        let dx = self.camera.screen_dist_to_world(screen_dx);
        let dy = self.camera.screen_dist_to_world(screen_dy);
        if !dx.is_finite() || !dy.is_finite() {
            return Err(StoreError::InvalidCoordinates(screen_dx, screen_dy));
        }
        let now = self.clock.now_ms();
        let block = &mut self.blocks[index];
        block.x += dx;
        block.y += dy;
        block.last_edited = now;
        self.persist()
    }

    // =========================================================================
    // INTERACTION
    // =========================================================================

    /// Start editing a block. Another block's edit is closed first, running
    /// its pending resize. Returns `false` if the block is being dragged.
    ///
    /// # Errors
    ///
    /// Returns an error if the block does not exist or persisting fails.
    pub fn begin_edit(&mut self, id: &BlockId) -> Result<bool, StoreError> {
        self.index_of(id)?;
        let now = self.clock.now_ms();
        let (started, resized) = self.begin_edit_inner(*id, now);
        if started {
            self.selection = Some(*id);
        }
        if resized {
            self.persist()?;
        }
        Ok(started)
    }

    /// Returns whether the edit started and whether closing a previous edit
    /// resized its block.
    fn begin_edit_inner(&mut self, id: BlockId, now: i64) -> (bool, bool) {
        match self.interaction.begin_edit(id) {
            EditStart::Replaced(previous) => {
                debug!(closed = %previous, opened = %id, "edit handed over");
                (true, self.flush_resize(&previous, now))
            }
            EditStart::Started | EditStart::Unchanged => (true, false),
            EditStart::Ignored => (false, false),
        }
    }

    /// Stop editing a block and run its pending resize now.
    ///
    /// # Errors
    ///
    /// Returns an error if persisting fails.
    pub fn end_edit(&mut self, id: &BlockId) -> Result<bool, StoreError> {
        if !self.interaction.end_edit(id) {
            return Ok(false);
        }
        let now = self.clock.now_ms();
        if self.flush_resize(id, now) {
            self.persist()?;
        }
        Ok(true)
    }

    /// Start dragging a block. Returns `false` if it is being edited or
    /// another block is being dragged.
    ///
    /// # Errors
    ///
    /// Returns an error if the block does not exist.
    pub fn begin_drag(&mut self, id: &BlockId) -> Result<bool, StoreError> {
        self.index_of(id)?;
        let started = self.interaction.begin_drag(*id);
        if started {
            self.recenter_timer.cancel();
            self.selection = Some(*id);
        }
        Ok(started)
    }

    /// Drop a dragged block. Overlap is resolved with it as subject and a
    /// gentle recenter is scheduled.
    ///
    /// # Errors
    ///
    /// Returns an error if persisting fails.
    pub fn end_drag(&mut self, id: &BlockId) -> Result<bool, StoreError> {
        if !self.interaction.end_drag(id) {
            return Ok(false);
        }
        let now = self.clock.now_ms();
        if let Some(index) = self.position_of(id) {
            self.settle_around(index, now, true);
        }
        self.recenter_timer.schedule(now, self.config.delays.recenter_ms);
        self.persist()?;
        Ok(true)
    }

    /// Select a block, or clear the selection with `None`.
    ///
    /// # Errors
    ///
    /// Returns an error if the block does not exist.
    pub fn select(&mut self, id: Option<BlockId>) -> Result<(), StoreError> {
        if let Some(ref id) = id {
            self.index_of(id)?;
        }
        self.selection = id;
        Ok(())
    }

    // =========================================================================
    // ORGANIZE
    // =========================================================================

    /// Enter organize mode (grid preview) or, if already active, revert it.
    /// Returns whether organize mode is active afterwards.
    ///
    /// # Errors
    ///
    /// Returns an error if persisting fails.
    pub fn toggle_organize_mode(&mut self) -> Result<bool, StoreError> {
        if self.organize.is_some() {
            self.revert_organize()?;
            return Ok(false);
        }
        if self.blocks.is_empty() {
            self.notifier
                .notify("No blocks to organize", NotificationKind::Info, self.config.delays.notification_ms);
            return Ok(false);
        }

        let now = self.clock.now_ms();
        self.organize = Some(OrganizeSnapshot::capture(&self.blocks, now));
        for placement in grid_layout(&self.blocks, self.config.grid_padding) {
            if let Some(block) = self.blocks.iter_mut().find(|b| b.id == placement.id) {
                block.x = placement.x;
                block.y = placement.y;
                block.last_edited = now;
            }
        }
        self.fit_timer.cancel();
        self.apply_fit();
        self.persist()?;
        info!(blocks = self.blocks.len(), "organize mode entered");
        Ok(true)
    }

    /// Blocks as organize mode would lay them out, without entering it.
    /// Nothing is stamped, moved, fitted or persisted.
    #[must_use]
    pub fn organize_preview(&self) -> Vec<Block> {
        let mut blocks = self.blocks.clone();
        for placement in grid_layout(&self.blocks, self.config.grid_padding) {
            if let Some(block) = blocks.iter_mut().find(|b| b.id == placement.id) {
                block.x = placement.x;
                block.y = placement.y;
            }
        }
        blocks
    }

    /// Keep the grid layout. Returns `false` if organize mode was not active.
    ///
    /// # Errors
    ///
    /// Returns an error if persisting fails.
    pub fn apply_organize(&mut self) -> Result<bool, StoreError> {
        if self.organize.take().is_none() {
            return Ok(false);
        }
        self.persist()?;
        info!("organize layout applied");
        Ok(true)
    }

    /// Restore every block to its pre-organize position. Returns `false` if
    /// organize mode was not active.
    ///
    /// # Errors
    ///
    /// Returns an error if persisting fails.
    pub fn revert_organize(&mut self) -> Result<bool, StoreError> {
        let Some(snapshot) = self.organize.take() else {
            return Ok(false);
        };
        let restored = snapshot.restore(&mut self.blocks, self.clock.now_ms());
        self.apply_fit();
        self.persist()?;
        info!(restored, "organize layout reverted");
        Ok(true)
    }

    // =========================================================================
    // PINNING
    // =========================================================================

    /// Pin or unpin a block. Returns whether it is pinned afterwards.
    ///
    /// # Errors
    ///
    /// Returns an error if the block does not exist or persisting fails.
    pub fn toggle_pin(&mut self, id: &BlockId) -> Result<bool, StoreError> {
        let index = self.index_of(id)?;
        let pinned = if self.pinned.remove(id) {
            false
        } else {
            self.pinned.insert(*id);
            true
        };
        self.blocks[index].last_edited = self.clock.now_ms();
        if self.pin_mode && self.pinned.is_empty() {
            self.pin_mode = false;
            debug!("pin mode left: no pinned blocks");
        }
        self.persist()?;
        Ok(pinned)
    }

    /// Toggle the pinned-only view. Refuses to turn on with nothing pinned.
    /// Returns whether pin mode is active afterwards.
    pub fn toggle_pin_mode(&mut self) -> bool {
        if !self.pin_mode && self.pinned.is_empty() {
            self.notifier
                .notify("Pin a block first", NotificationKind::Warning, self.config.delays.notification_ms);
            return false;
        }
        self.pin_mode = !self.pin_mode;
        debug!(pin_mode = self.pin_mode, "pin mode toggled");
        self.pin_mode
    }

    // =========================================================================
    // DEFERRED WORK
    // =========================================================================

    /// Run every deferred task whose delay has elapsed.
    ///
    /// # Errors
    ///
    /// Returns an error if persisting fails.
    pub fn tick(&mut self) -> Result<DeferredRun, StoreError> {
        let now = self.clock.now_ms();
        let mut run = DeferredRun::default();

        let due: Vec<BlockId> = self
            .resize_timers
            .iter_mut()
            .filter_map(|(id, timer)| timer.take_due(now).map(|_| *id))
            .collect();
        for id in due {
            self.resize_timers.remove(&id);
            if self.run_resize(&id, now) {
                run.resized.push(id);
            }
        }
        if let Some(generation) = self.fit_timer.take_due(now) {
            debug!(generation, "deferred fit due");
            self.apply_fit();
            run.fitted = true;
        }
        if self.recenter_timer.take_due(now).is_some() {
            run.recentered = self.recenter();
        }
        if self.marker_timer.take_due(now).is_some() {
            self.repositioning.clear();
            run.markers_cleared = true;
        }

        if !run.is_empty() {
            self.persist()?;
        }
        Ok(run)
    }

    /// Run every deferred task now, regardless of its delay.
    ///
    /// # Errors
    ///
    /// Returns an error if persisting fails.
    pub fn flush_deferred(&mut self) -> Result<DeferredRun, StoreError> {
        let now = self.clock.now_ms();
        let mut run = DeferredRun::default();

        let pending: Vec<BlockId> = self
            .resize_timers
            .iter_mut()
            .filter_map(|(id, timer)| timer.flush().map(|_| *id))
            .collect();
        self.resize_timers.clear();
        for id in pending {
            if self.run_resize(&id, now) {
                run.resized.push(id);
            }
        }
        if let Some(generation) = self.fit_timer.flush() {
            debug!(generation, "deferred fit flushed");
            self.apply_fit();
            run.fitted = true;
        }
        if self.recenter_timer.flush().is_some() {
            run.recentered = self.recenter();
        }
        if self.marker_timer.flush().is_some() {
            self.repositioning.clear();
            run.markers_cleared = true;
        }

        if !run.is_empty() {
            self.persist()?;
        }
        Ok(run)
    }

    fn recenter(&mut self) -> bool {
        let visible = self.visible_owned();
        let dragging = self.interaction.dragging().is_some();
        match self.fitter.gentle_recenter(&visible, self.camera, self.viewport, dragging) {
            Some(camera) => {
                self.camera = camera;
                debug!(pan_x = camera.pan_x, pan_y = camera.pan_y, "viewport recentered");
                true
            }
            None => false,
        }
    }

    fn cancel_resize(&mut self, id: &BlockId) {
        if let Some(mut timer) = self.resize_timers.remove(id) {
            timer.cancel();
        }
    }

    /// Run a block's pending resize, if any. Returns whether the size changed.
    fn flush_resize(&mut self, id: &BlockId, now: i64) -> bool {
        let pending = self.resize_timers.remove(id).and_then(|mut timer| timer.flush());
        pending.is_some() && self.run_resize(id, now)
    }

    /// Recompute a block's size from its content. Returns whether the size
    /// changed.
    fn run_resize(&mut self, id: &BlockId, now: i64) -> bool {
        let Some(index) = self.position_of(id) else {
            return false;
        };
        let before = self.blocks[index].clone();
        self.fit_to_content(index);
        let after = &self.blocks[index];
        #[allow(clippy::float_cmp)]
        let changed = after.width != before.width || after.height != before.height;
        if !changed {
            return false;
        }
        self.blocks[index].last_edited = now;
        if self.is_significant_resize(&before, &self.blocks[index]) {
            self.settle_around(index, now, true);
        }
        debug!(id = %id, width = self.blocks[index].width, height = self.blocks[index].height, "block resized");
        true
    }

    // =========================================================================
    // IMPORT / EXPORT
    // =========================================================================

    /// Snapshot every block and the camera.
    #[must_use]
    pub fn export_document(&self) -> ExportDocument {
        ExportDocument::new(self.blocks.clone(), self.camera, self.clock.now_ms())
    }

    /// Replace every block with the contents of `plan`. Pins, undo history,
    /// organize mode and interaction state are cleared. Returns the number
    /// of blocks imported.
    ///
    /// # Errors
    ///
    /// Returns an error if persisting fails.
    pub fn apply_import(&mut self, plan: &ImportPlan, mode: ImportMode) -> Result<usize, StoreError> {
        let now = self.clock.now_ms();
        self.reset_session();
        self.blocks.clear();

        for entry in &plan.entries {
            match (&entry.block, mode) {
                (Some(block), ImportMode::Full) => {
                    let mut block = block.clone();
                    if self.blocks.iter().any(|b| b.id == block.id) {
                        block.id = Uuid::new_v4();
                    }
                    self.blocks.push(block);
                }
                _ => {
                    self.insert_new_block(Point::new(entry.x, entry.y), &entry.content, now);
                }
            }
        }
        self.repositioning.clear();
        self.last_cascade = None;

        match (mode, plan.canvas) {
            (ImportMode::Full, Some(camera)) => self.camera = camera,
            _ => self.apply_fit(),
        }
        self.persist()?;
        info!(mindmap = %self.mindmap_id, blocks = self.blocks.len(), ?mode, "mindmap imported");
        Ok(self.blocks.len())
    }

    fn reset_session(&mut self) {
        self.pinned.clear();
        self.pin_mode = false;
        self.organize = None;
        self.undo.clear();
        self.interaction.reset();
        self.selection = None;
        self.fit_timer.cancel();
        self.recenter_timer.cancel();
        self.marker_timer.cancel();
        self.resize_timers.clear();
    }

    // =========================================================================
    // INTERNALS
    // =========================================================================

    fn position_of(&self, id: &BlockId) -> Option<usize> {
        self.blocks.iter().position(|b| b.id == *id)
    }

    fn index_of(&self, id: &BlockId) -> Result<usize, StoreError> {
        self.position_of(id).ok_or(StoreError::NotFound(*id))
    }

    fn fit_to_content(&mut self, index: usize) {
        let block = &self.blocks[index];
        let size = self.sizer.size(&block.content, block.has_image());
        let block = &mut self.blocks[index];
        block.width = size.width;
        block.height = size.height;
    }

    fn floor_at_required(&mut self, index: usize) {
        let bounds = self.sizer.bounds();
        let block = &self.blocks[index];
        let required = self.sizer.size_within(&block.content, block.has_image(), bounds).required;
        let block = &mut self.blocks[index];
        block.width = block.width.max(required.width).max(bounds.min_width);
        block.height = block.height.max(required.height).max(bounds.min_height);
    }

    fn is_significant_resize(&self, before: &Block, after: &Block) -> bool {
        let threshold = self.config.sizing.significant_resize;
        (after.width - before.width).abs() > threshold || (after.height - before.height).abs() > threshold
    }

    /// Resolve overlap with the block at `index` as the immovable subject.
    /// Displaced blocks are stamped, flagged as repositioning, and recorded
    /// as a cascade. Returns how many blocks moved.
    fn settle_around(&mut self, index: usize, now: i64, announce: bool) -> usize {
        let subject = self.blocks[index].clone();
        let resolution = self.resolver.resolve(&subject, &self.blocks);
        self.blocks = resolution.blocks;
        for moved in &resolution.moved {
            if let Some(block) = self.blocks.iter_mut().find(|b| b.id == moved.id) {
                block.last_edited = now;
            }
        }
        self.record_cascade(subject.id, &resolution.moved, now, announce);
        resolution.moved.len()
    }

    fn record_cascade(&mut self, subject: BlockId, moved: &[MovedBlock], now: i64, announce: bool) {
        if moved.is_empty() {
            return;
        }
        let step_ms = self.config.delays.cascade_step_ms;
        let steps: Vec<CascadeStep> = moved
            .iter()
            .zip(0_u64..)
            .map(|(m, i)| CascadeStep { id: m.id, delay_ms: step_ms * i, distance: m.distance })
            .collect();
        self.repositioning.extend(moved.iter().map(|m| m.id));

        let cascade_ms = step_ms.saturating_mul(u64::try_from(steps.len()).unwrap_or(u64::MAX));
        self.marker_timer
            .schedule(now, self.config.delays.marker_clear_ms.saturating_add(cascade_ms));
        self.last_cascade = Some(Cascade { subject, steps });

        if announce {
            let noun = if moved.len() == 1 { "block" } else { "blocks" };
            let message = format!("Moved {} {noun} to prevent overlap", moved.len());
            self.notifier
                .notify(&message, NotificationKind::Info, self.config.delays.notification_ms);
        }
        debug!(subject = %subject, moved = moved.len(), "blocks displaced");
    }

    /// Write blocks, camera and pins through to storage. A failed write
    /// leaves the store dirty so teardown retries it.
    fn persist(&mut self) -> Result<(), StoreError> {
        self.dirty = true;
        let blocks = serde_json::to_string(&self.blocks)?;
        let canvas = serde_json::to_string(&self.camera)?;
        let pinned = serde_json::to_string(&self.pinned.iter().collect::<Vec<_>>())?;
        self.storage.set(&blocks_key(&self.mindmap_id), &blocks)?;
        self.storage.set(&canvas_key(&self.mindmap_id), &canvas)?;
        self.storage.set(&pinned_key(&self.mindmap_id), &pinned)?;
        self.dirty = false;
        Ok(())
    }
}

/// Read and parse a stored value. Corrupt values (not text, or not JSON) are
/// logged and treated as absent.
fn load_json<T: DeserializeOwned>(storage: &impl Storage, key: &str) -> Result<Option<T>, StorageError> {
    let text = match storage.get(key) {
        Ok(Some(text)) => text,
        Ok(None) => return Ok(None),
        Err(StorageError::NotText(_)) => {
            warn!(key = %key, "stored value is not text; using default");
            return Ok(None);
        }
        Err(e) => return Err(e),
    };
    match serde_json::from_str(&text) {
        Ok(value) => Ok(Some(value)),
        Err(e) => {
            warn!(key = %key, error = %e, "corrupt stored value; using default");
            Ok(None)
        }
    }
}
