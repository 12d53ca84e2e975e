//! DragDrop Utilities
//!
//! Pointer-driven drag-and-drop state, independent of any rendering layer.
//! Uses a movement threshold to distinguish click from drag, and reports
//! drops as `(source, destination)` locations inside droppable lists.

use serde::{Deserialize, Serialize};

/// Movement threshold in pixels to start dragging
pub const DRAG_THRESHOLD_PX: i32 = 5;

/// A slot inside one droppable list
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DropLocation<S> {
    pub droppable_id: S,
    pub index: usize,
}

impl<S> DropLocation<S> {
    pub fn new(droppable_id: S, index: usize) -> Self {
        Self { droppable_id, index }
    }
}

/// Outcome of a finished drag
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DropResult<S> {
    pub draggable_id: u32,
    pub source: DropLocation<S>,
    /// None when released outside every droppable
    pub destination: Option<DropLocation<S>>,
}

/// A reorder inside a single list
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ListMove<S> {
    pub droppable_id: S,
    pub draggable_id: u32,
    pub from: usize,
    pub to: usize,
}

impl<S: PartialEq + Clone> DropResult<S> {
    /// Same-list move that changes position, if any.
    /// Drops onto another list are not moves.
    pub fn as_list_move(&self) -> Option<ListMove<S>> {
        let destination = self.destination.as_ref()?;
        if destination.droppable_id != self.source.droppable_id {
            return None;
        }
        if destination.index == self.source.index {
            return None;
        }
        Some(ListMove {
            droppable_id: self.source.droppable_id.clone(),
            draggable_id: self.draggable_id,
            from: self.source.index,
            to: destination.index,
        })
    }
}

#[derive(Clone, Debug)]
struct Pending<S> {
    draggable_id: u32,
    source: DropLocation<S>,
    start_x: i32,
    start_y: i32,
}

/// Drag state machine: pending (pressed) -> dragging -> released
#[derive(Clone, Debug)]
pub struct DragTracker<S> {
    pending: Option<Pending<S>>,
    dragging: bool,
    over: Option<DropLocation<S>>,
    just_ended: bool,
}

impl<S> Default for DragTracker<S> {
    fn default() -> Self {
        Self {
            pending: None,
            dragging: false,
            over: None,
            just_ended: false,
        }
    }
}

impl<S: Clone + PartialEq> DragTracker<S> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Primary button pressed on a draggable row
    pub fn press(&mut self, draggable_id: u32, source: DropLocation<S>, x: i32, y: i32) {
        self.pending = Some(Pending {
            draggable_id,
            source,
            start_x: x,
            start_y: y,
        });
        self.dragging = false;
        self.over = None;
        self.just_ended = false;
    }

    /// Pointer moved. Returns true when this move started the drag.
    pub fn move_to(&mut self, x: i32, y: i32) -> bool {
        let Some(pending) = &self.pending else {
            return false;
        };
        if self.dragging {
            return false;
        }
        let dx = (x - pending.start_x).abs();
        let dy = (y - pending.start_y).abs();
        if dx > DRAG_THRESHOLD_PX || dy > DRAG_THRESHOLD_PX {
            self.dragging = true;
            self.over = Some(pending.source.clone());
            return true;
        }
        false
    }

    /// Pointer entered a slot
    pub fn hover(&mut self, location: DropLocation<S>) {
        if self.dragging {
            self.over = Some(location);
        }
    }

    /// Pointer left every droppable
    pub fn leave(&mut self) {
        if self.dragging {
            self.over = None;
        }
    }

    pub fn dragging_id(&self) -> Option<u32> {
        if self.dragging {
            self.pending.as_ref().map(|p| p.draggable_id)
        } else {
            None
        }
    }

    pub fn drop_target(&self) -> Option<&DropLocation<S>> {
        self.over.as_ref()
    }

    /// Set after a real drag so the trailing click can be ignored
    pub fn drag_just_ended(&self) -> bool {
        self.just_ended
    }

    pub fn clear_just_ended(&mut self) {
        self.just_ended = false;
    }

    /// Button released. Yields a result only if a drag actually happened;
    /// a press without movement is a click.
    pub fn release(&mut self) -> Option<DropResult<S>> {
        let pending = self.pending.take()?;
        let was_dragging = std::mem::replace(&mut self.dragging, false);
        let over = self.over.take();
        self.just_ended = was_dragging;
        if !was_dragging {
            return None;
        }
        Some(DropResult {
            draggable_id: pending.draggable_id,
            source: pending.source,
            destination: over,
        })
    }

    /// Abort without producing a result
    pub fn cancel(&mut self) {
        self.pending = None;
        self.dragging = false;
        self.over = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn loc(list: &str, index: usize) -> DropLocation<String> {
        DropLocation::new(list.to_string(), index)
    }

    #[test]
    fn test_click_is_not_a_drag() {
        let mut tracker = DragTracker::new();
        tracker.press(7, loc("L-ROOT", 0), 10, 10);
        assert!(!tracker.move_to(12, 13));
        assert!(tracker.release().is_none());
        assert!(!tracker.drag_just_ended());
    }

    #[test]
    fn test_drag_past_threshold_yields_result() {
        let mut tracker = DragTracker::new();
        tracker.press(7, loc("L-ROOT", 0), 10, 10);
        assert!(tracker.move_to(10, 30));
        assert_eq!(tracker.dragging_id(), Some(7));
        tracker.hover(loc("L-ROOT", 2));

        let result = tracker.release().expect("drop result");
        assert_eq!(result.source, loc("L-ROOT", 0));
        assert_eq!(result.destination, Some(loc("L-ROOT", 2)));
        assert!(tracker.drag_just_ended());
        assert_eq!(tracker.dragging_id(), None);
    }

    #[test]
    fn test_release_outside_has_no_destination() {
        let mut tracker = DragTracker::new();
        tracker.press(1, loc("M-3", 1), 0, 0);
        tracker.move_to(0, 50);
        tracker.leave();
        let result = tracker.release().unwrap();
        assert!(result.destination.is_none());
        assert!(result.as_list_move().is_none());
    }

    #[test]
    fn test_list_move_rules() {
        let same = DropResult {
            draggable_id: 4,
            source: loc("S-9", 0),
            destination: Some(loc("S-9", 3)),
        };
        let moved = same.as_list_move().unwrap();
        assert_eq!((moved.from, moved.to), (0, 3));
        assert_eq!(moved.droppable_id, "S-9");

        let cross = DropResult {
            draggable_id: 4,
            source: loc("S-9", 0),
            destination: Some(loc("S-10", 0)),
        };
        assert!(cross.as_list_move().is_none());

        let unchanged = DropResult {
            draggable_id: 4,
            source: loc("S-9", 2),
            destination: Some(loc("S-9", 2)),
        };
        assert!(unchanged.as_list_move().is_none());
    }
}
