//! Manual reordering of a category's subcategories.
//!
//! A `ReorderSession` keeps two orders:
//!
//! - the **working order**, which is authoritative and only changes on drop
//! - the **visual order**, positions into the working order that follow the
//!   pointer on every hover for live feedback
//!
//! The session knows nothing about terminals or mice. Input layers translate
//! their events into `begin_drag` / `hover_insertion_point` / `complete_drop`
//! (or `nudge` for keyboard reordering).

use super::selection::{sorted_subcategories, SelectionState};
use super::types::{CatalogSnapshot, Subcategory};
use thiserror::Error;

// ============================================================================
// Error Types
// ============================================================================

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ReorderError {
    #[error("Select a category first")]
    NoCategorySelected,

    #[error("The selected category has no subcategories")]
    NoSubcategories { category_id: i64 },

    #[error("Subcategory {0} is not part of this sort session")]
    UnknownItem(i64),
}

// ============================================================================
// Session Types
// ============================================================================

/// Vertical extent of one rendered row, in the same units as the pointer.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RowSpan {
    pub top: f32,
    pub height: f32,
}

impl RowSpan {
    pub fn new(top: f32, height: f32) -> Self {
        Self { top, height }
    }

    fn midpoint(&self) -> f32 {
        self.top + self.height / 2.0
    }
}

/// One persisted position: `sort_order` is the zero-based final index.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SortUpdate {
    pub subcategory_id: i64,
    pub sort_order: i64,
}

/// An open sort dialog for one category.
#[derive(Debug, Clone)]
pub struct ReorderSession {
    category_id: i64,
    original_ids: Vec<i64>,
    working: Vec<Subcategory>,
    /// Indices into `working`, top to bottom as currently displayed.
    visual: Vec<usize>,
    /// Working index of the item being moved.
    dragging: Option<usize>,
}

impl ReorderSession {
    /// Open a session for the selected category.
    ///
    /// The working order is the category's subcategories sorted by
    /// `sort_order` (stable on ties).
    pub fn open(
        selection: &SelectionState,
        snapshot: &CatalogSnapshot,
    ) -> Result<Self, ReorderError> {
        let category_id = selection
            .selected_category_id
            .ok_or(ReorderError::NoCategorySelected)?;

        let working = sorted_subcategories(snapshot, category_id);
        if working.is_empty() {
            return Err(ReorderError::NoSubcategories { category_id });
        }

        tracing::debug!(category_id, items = working.len(), "Sort session opened");

        Ok(Self {
            category_id,
            original_ids: working.iter().map(|s| s.id).collect(),
            visual: (0..working.len()).collect(),
            working,
            dragging: None,
        })
    }

    pub fn category_id(&self) -> i64 {
        self.category_id
    }

    pub fn len(&self) -> usize {
        self.working.len()
    }

    pub fn is_empty(&self) -> bool {
        self.working.is_empty()
    }

    /// The authoritative order.
    pub fn working_order(&self) -> &[Subcategory] {
        &self.working
    }

    /// Items in display order, including any provisional hover movement.
    pub fn visual_items(&self) -> impl Iterator<Item = &Subcategory> + '_ {
        self.visual.iter().map(move |&i| &self.working[i])
    }

    /// Id of the item currently being moved.
    pub fn dragging_id(&self) -> Option<i64> {
        self.dragging.map(|i| self.working[i].id)
    }

    pub fn is_dragging(&self) -> bool {
        self.dragging.is_some()
    }

    /// Display position of the dragged item.
    pub fn dragging_position(&self) -> Option<usize> {
        let idx = self.dragging?;
        self.visual.iter().position(|&v| v == idx)
    }

    /// Whether the working order differs from the order the session opened with.
    pub fn is_modified(&self) -> bool {
        self.working
            .iter()
            .map(|s| s.id)
            .ne(self.original_ids.iter().copied())
    }

    // ------------------------------------------------------------------------
    // Drag lifecycle
    // ------------------------------------------------------------------------

    /// Mark an item as being moved.
    pub fn begin_drag(&mut self, item_id: i64) -> Result<(), ReorderError> {
        let idx = self
            .working
            .iter()
            .position(|s| s.id == item_id)
            .ok_or(ReorderError::UnknownItem(item_id))?;
        self.dragging = Some(idx);
        Ok(())
    }

    /// Provisionally relocate the dragged item while hovering over `over_id`.
    ///
    /// `rows` are the spans of the displayed rows in visual order. The
    /// dragged item is placed before the first other row whose midpoint lies
    /// below `pointer_y`, or appended when there is none. Hovering over the
    /// dragged item itself does nothing. Returns true if the visual order
    /// changed.
    pub fn hover_insertion_point(&mut self, over_id: i64, pointer_y: f32, rows: &[RowSpan]) -> bool {
        let Some(dragged) = self.dragging else {
            return false;
        };
        if self.working[dragged].id == over_id {
            return false;
        }
        if rows.len() != self.visual.len() {
            tracing::debug!(
                rows = rows.len(),
                items = self.visual.len(),
                "Row layout out of sync with sort list, ignoring hover"
            );
            return false;
        }

        let before = self
            .visual
            .iter()
            .zip(rows)
            .filter(|(&idx, _)| idx != dragged)
            .find(|(_, span)| span.midpoint() > pointer_y)
            .map(|(&idx, _)| idx);

        let previous = self.visual.clone();
        self.visual.retain(|&idx| idx != dragged);
        match before.and_then(|target| self.visual.iter().position(|&idx| idx == target)) {
            Some(pos) => self.visual.insert(pos, dragged),
            None => self.visual.push(dragged),
        }

        self.visual != previous
    }

    /// Move the dragged item `delta` rows in the visual order (keyboard drag).
    ///
    /// Clamped at both ends. Returns true if the visual order changed.
    pub fn nudge(&mut self, delta: isize) -> bool {
        let Some(from) = self.dragging_position() else {
            return false;
        };
        let last = self.visual.len().saturating_sub(1);
        let to = from.saturating_add_signed(delta).min(last);
        if to == from {
            return false;
        }
        let idx = self.visual.remove(from);
        self.visual.insert(to, idx);
        true
    }

    /// Commit the visual order as the new working order.
    ///
    /// Each displayed row is mapped back to its working entry, then positions
    /// are renumbered so later drags address the new order.
    pub fn complete_drop(&mut self) -> &[Subcategory] {
        let reordered: Vec<Subcategory> = self
            .visual
            .iter()
            .map(|&idx| self.working[idx].clone())
            .collect();

        self.working = reordered;
        self.visual = (0..self.working.len()).collect();
        self.dragging = None;

        tracing::trace!(
            order = ?self.working.iter().map(|s| s.id).collect::<Vec<_>>(),
            "Sort drop committed"
        );
        &self.working
    }

    /// End a drag without a drop; the display reverts to the working order.
    pub fn abort_drag(&mut self) {
        self.visual = (0..self.working.len()).collect();
        self.dragging = None;
    }

    /// Convert the working order into `(id, position)` updates.
    pub fn save_plan(&self) -> Vec<SortUpdate> {
        self.working
            .iter()
            .enumerate()
            .map(|(position, sub)| SortUpdate {
                subcategory_id: sub.id,
                sort_order: position as i64,
            })
            .collect()
    }
}

// ============================================================================
// Tests
// ============================================================================
