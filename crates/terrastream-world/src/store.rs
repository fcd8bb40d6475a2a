//! Fixed-capacity cell arena.
//!
//! Slots are allocated once and overwritten in place. Each slot has its own
//! lock so the render thread and the loader only contend on the cell they
//! both touch, and never for the duration of a mesh build.

use glam::Vec2;
use parking_lot::{Mutex, MutexGuard};

use crate::cell::{Cell, CellSnapshot};

/// Fixed array of cells addressed by slot index.
#[derive(Debug)]
pub struct CellStore {
    slots: Box<[Mutex<Cell>]>,
}

impl CellStore {
    /// Allocates `capacity` empty cells.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let slots = (0..capacity)
            .map(|_| Mutex::new(Cell::default()))
            .collect::<Vec<_>>()
            .into_boxed_slice();
        Self { slots }
    }

    /// Number of slots.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    /// Locks a slot.
    #[must_use]
    pub fn lock(&self, slot: usize) -> Option<MutexGuard<'_, Cell>> {
        self.slots.get(slot).map(|cell| cell.lock())
    }

    /// Iterates over slot locks in index order.
    pub fn iter(&self) -> impl Iterator<Item = &Mutex<Cell>> {
        self.slots.iter()
    }

    /// First slot, in index order, that is neither live nor loading.
    ///
    /// `None` means every slot is taken, which is transient.
    #[must_use]
    pub fn find_reusable_slot(&self) -> Option<usize> {
        self.slots.iter().position(|slot| !slot.lock().is_resident())
    }

    /// First resident slot whose origin lies within `tolerance` of `origin`.
    #[must_use]
    pub fn find_by_origin(&self, origin: Vec2, tolerance: f32) -> Option<usize> {
        self.slots.iter().position(|slot| {
            let cell = slot.lock();
            cell.is_resident() && cell.origin().distance(origin) < tolerance
        })
    }

    /// Slots currently eligible for drawing.
    #[must_use]
    pub fn live_cells(&self) -> Vec<usize> {
        self.slots
            .iter()
            .enumerate()
            .filter(|(_, slot)| slot.lock().is_drawable())
            .map(|(index, _)| index)
            .collect()
    }

    /// Clears `live` on every live cell whose origin is distant.
    ///
    /// Returns the number of cells evicted.
    pub fn mark_distant_cells_not_live(&self, is_distant: impl Fn(Vec2) -> bool) -> usize {
        let mut evicted = 0;
        for slot in self.slots.iter() {
            let mut cell = slot.lock();
            if cell.is_live() && is_distant(cell.origin()) {
                cell.evict();
                evicted += 1;
            }
        }
        evicted
    }

    /// Copies every slot's state.
    #[must_use]
    pub fn snapshots(&self) -> Vec<CellSnapshot> {
        self.slots.iter().map(|slot| slot.lock().snapshot()).collect()
    }
}
