use kurbo::Point;

/// Fixed number of cut slots.
pub const SLOT_COUNT: usize = 6;

/// One storage location for a cut. The position is image-space so the cut
/// travels with the image under pan and zoom.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct CutSlot {
    pub occupied: bool,
    pub position: Point,
}

/// Owns the six cut slots and the selection. Selection is always a valid
/// index (slot 0 by default) and is independent of occupancy: clearing the
/// selected slot leaves selection pointing at an empty slot.
#[derive(Clone, Debug)]
pub struct SlotRegistry {
    slots: [CutSlot; SLOT_COUNT],
    selected: usize,
}

impl Default for SlotRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl SlotRegistry {
    pub fn new() -> Self {
        Self {
            slots: [CutSlot::default(); SLOT_COUNT],
            selected: 0,
        }
    }

    /// Places or moves a cut, marking the slot occupied and selecting it.
    /// Returns false and changes nothing for an out-of-range slot. Cache
    /// invalidation is the caller's job.
    pub fn place(&mut self, slot: usize, x: f64, y: f64) -> bool {
        if slot >= SLOT_COUNT {
            return false;
        }
        self.slots[slot] = CutSlot {
            occupied: true,
            position: Point::new(x, y),
        };
        self.selected = slot;
        true
    }

    /// Returns true only when the selection actually changed, so callers can
    /// arm a transition.
    pub fn select(&mut self, slot: usize) -> bool {
        if slot >= SLOT_COUNT || slot == self.selected {
            return false;
        }
        self.selected = slot;
        true
    }

    pub fn clear(&mut self, slot: usize) -> bool {
        if slot >= SLOT_COUNT {
            return false;
        }
        self.slots[slot] = CutSlot::default();
        true
    }

    pub fn clear_all(&mut self) {
        self.slots = [CutSlot::default(); SLOT_COUNT];
    }

    /// Clears every placement and resets selection to slot 0 (new-image
    /// lifecycle).
    pub fn reset(&mut self) {
        self.clear_all();
        self.selected = 0;
    }

    pub fn selected(&self) -> usize {
        self.selected
    }

    pub fn slot(&self, slot: usize) -> Option<&CutSlot> {
        self.slots.get(slot)
    }

    pub fn is_occupied(&self, slot: usize) -> bool {
        self.slots.get(slot).is_some_and(|s| s.occupied)
    }

    pub fn position(&self, slot: usize) -> Option<Point> {
        self.slots
            .get(slot)
            .filter(|s| s.occupied)
            .map(|s| s.position)
    }

    /// Occupied slot indices, ascending. Lower indices render first so
    /// higher-index cuts composite on top where rings overlap.
    pub fn occupied(&self) -> impl Iterator<Item = usize> + '_ {
        self.slots
            .iter()
            .enumerate()
            .filter(|(_, s)| s.occupied)
            .map(|(i, _)| i)
    }
}
