use std::collections::HashMap;

use tracing::debug;

use crate::geometry::Vec2;

/// Y deltas at or below this do not dirty the sort order; sub-pixel
/// jitter from the tween should not trigger resorts every tick.
pub const DEPTH_DIRTY_THRESHOLD: f32 = 0.5;

/// Handle to a visual owned by a [`VisualStore`]. Handles are never
/// reused, so a stale handle reliably fails lookups instead of
/// aliasing a newer visual.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct VisualId(u64);

/// A drawable placed in the scene: which asset to draw and where.
#[derive(Debug, Clone)]
pub struct Visual {
    pub asset: String,
    pub position: Vec2,
}

#[derive(Debug, Default)]
pub struct VisualStore {
    next_id: u64,
    visuals: HashMap<VisualId, Visual>,
}

impl VisualStore {
    pub fn new() -> Self {
        VisualStore::default()
    }

    pub fn insert(&mut self, visual: Visual) -> VisualId {
        let id = VisualId(self.next_id);
        self.next_id = self.next_id.saturating_add(1);
        self.visuals.insert(id, visual);
        id
    }

    pub fn remove(&mut self, id: VisualId) -> bool {
        self.visuals.remove(&id).is_some()
    }

    pub fn contains(&self, id: VisualId) -> bool {
        self.visuals.contains_key(&id)
    }

    pub fn get(&self, id: VisualId) -> Option<&Visual> {
        self.visuals.get(&id)
    }

    pub fn get_mut(&mut self, id: VisualId) -> Option<&mut Visual> {
        self.visuals.get_mut(&id)
    }

    pub fn len(&self) -> usize {
        self.visuals.len()
    }

    pub fn is_empty(&self) -> bool {
        self.visuals.is_empty()
    }

    pub fn clear(&mut self) {
        self.visuals.clear();
    }
}

/// Broad draw layer for an entry. Sorting is purely by proxy Y; the
/// category exists so callers can tear down or inspect one layer at a
/// time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DepthCategory {
    Character,
    Npc,
    Object,
    Overlay,
}

#[derive(Debug, Clone)]
pub struct DepthEntry {
    pub id: String,
    pub proxy_y: f32,
    pub category: DepthCategory,
    pub visual: VisualId,
    /// Proxy Y as of the last sort. Dirty checks compare against this,
    /// not the live value, so a slow crawl of tiny deltas still
    /// accumulates toward a resort.
    sorted_y: f32,
}

/// Painter's-order registry. Entries sort ascending by `proxy_y` (the
/// scene-space Y that stands in for depth), so things lower on screen
/// draw over things higher up. Resorts are deferred until something
/// actually moved far enough to matter.
#[derive(Debug, Default)]
pub struct DepthSorter {
    entries: Vec<DepthEntry>,
    dirty: bool,
}

impl DepthSorter {
    pub fn new() -> Self {
        DepthSorter::default()
    }

    /// Register `id` at `proxy_y`. Re-registering an existing id moves
    /// it rather than duplicating; the original visual binding is kept.
    pub fn register(&mut self, id: &str, proxy_y: f32, category: DepthCategory, visual: VisualId) {
        if let Some(entry) = self.entries.iter_mut().find(|e| e.id == id) {
            debug!(id, proxy_y, "depth_reregister_moves_entry");
            entry.proxy_y = proxy_y;
            self.dirty = true;
            return;
        }
        self.entries.push(DepthEntry {
            id: id.to_string(),
            proxy_y,
            category,
            visual,
            sorted_y: proxy_y,
        });
        self.dirty = true;
    }

    /// Remove the entry and destroy its visual. Returns `false` when
    /// the id was never registered.
    pub fn unregister(&mut self, id: &str, store: &mut VisualStore) -> bool {
        let Some(index) = self.entries.iter().position(|e| e.id == id) else {
            return false;
        };
        let entry = self.entries.remove(index);
        store.remove(entry.visual);
        self.dirty = true;
        true
    }

    /// Update an entry's proxy Y. Marks the order dirty only when the
    /// drift since the last sort exceeds [`DEPTH_DIRTY_THRESHOLD`].
    pub fn update_position(&mut self, id: &str, proxy_y: f32) -> bool {
        let Some(entry) = self.entries.iter_mut().find(|e| e.id == id) else {
            return false;
        };
        if (proxy_y - entry.sorted_y).abs() > DEPTH_DIRTY_THRESHOLD {
            self.dirty = true;
        }
        entry.proxy_y = proxy_y;
        true
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.entries.iter().any(|e| e.id == id)
    }

    /// Resort if anything moved since the last sort. Entries whose
    /// visual no longer exists in `store` are pruned first, so dropping
    /// a visual is enough to retire its depth entry eventually. Equal
    /// proxy Y breaks ties by id to keep the order stable across runs.
    pub fn resort_if_dirty(&mut self, store: &VisualStore) -> bool {
        if !self.dirty {
            return false;
        }
        let before = self.entries.len();
        self.entries.retain(|e| store.contains(e.visual));
        let pruned = before - self.entries.len();
        if pruned > 0 {
            debug!(pruned, "depth_pruned_stale_entries");
        }
        self.entries.sort_by(|a, b| {
            a.proxy_y
                .total_cmp(&b.proxy_y)
                .then_with(|| a.id.cmp(&b.id))
        });
        for entry in &mut self.entries {
            entry.sorted_y = entry.proxy_y;
        }
        self.dirty = false;
        true
    }

    /// Unconditional prune-and-sort, for stage loads and other bulk
    /// changes.
    pub fn force_resort(&mut self, store: &VisualStore) {
        self.dirty = true;
        self.resort_if_dirty(store);
    }

    /// Entries in back-to-front order as of the last sort.
    pub fn entries(&self) -> &[DepthEntry] {
        &self.entries
    }

    pub fn draw_order(&self) -> impl Iterator<Item = (&str, VisualId)> {
        self.entries.iter().map(|e| (e.id.as_str(), e.visual))
    }

    /// Drop every entry and destroy the visuals behind them.
    pub fn clear(&mut self, store: &mut VisualStore) {
        for entry in self.entries.drain(..) {
            store.remove(entry.visual);
        }
        self.dirty = false;
    }
}
