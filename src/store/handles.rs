//! Generation-checked shape handles.
//!
//! Exports hand shape occurrences to the host as plain integers. Each
//! integer packs an arena slot and that slot's generation; disposing a
//! slot bumps the generation, so bits kept from before a dispose fail
//! resolution instead of aliasing whatever reuses the slot.

use crate::brep::Shape;
use crate::{Result, ShapeIoError};

/// Unpacked form of a handle: slot index in the low 32 bits, generation in
/// the high 32.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct HandleKey {
    index: u32,
    generation: u32,
}

impl HandleKey {
    pub fn to_bits(self) -> u64 {
        (u64::from(self.generation) << 32) | u64::from(self.index)
    }

    pub fn from_bits(bits: u64) -> Self {
        Self {
            index: bits as u32,
            generation: (bits >> 32) as u32,
        }
    }
}

struct Slot {
    generation: u32,
    shape: Option<Shape>,
}

/// Arena of exported shape occurrences. Every emission mints a fresh
/// handle, including repeat emissions of the same occurrence; handles stay
/// live until the host disposes them.
#[derive(Default)]
pub struct HandleArena {
    slots: Vec<Slot>,
    free: Vec<u32>,
}

impl HandleArena {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, shape: Shape) -> u64 {
        match self.free.pop() {
            Some(index) => {
                let slot = &mut self.slots[index as usize];
                slot.shape = Some(shape);
                HandleKey {
                    index,
                    generation: slot.generation,
                }
                .to_bits()
            }
            None => {
                let index = self.slots.len() as u32;
                self.slots.push(Slot {
                    generation: 0,
                    shape: Some(shape),
                });
                HandleKey {
                    index,
                    generation: 0,
                }
                .to_bits()
            }
        }
    }

    pub fn get(&self, bits: u64) -> Result<&Shape> {
        let key = HandleKey::from_bits(bits);
        self.slots
            .get(key.index as usize)
            .filter(|slot| slot.generation == key.generation)
            .and_then(|slot| slot.shape.as_ref())
            .ok_or(ShapeIoError::StaleHandle(bits))
    }

    pub fn dispose(&mut self, bits: u64) -> Result<Shape> {
        let key = HandleKey::from_bits(bits);
        let slot = self
            .slots
            .get_mut(key.index as usize)
            .filter(|slot| slot.generation == key.generation)
            .ok_or(ShapeIoError::StaleHandle(bits))?;
        let shape = slot.shape.take().ok_or(ShapeIoError::StaleHandle(bits))?;
        slot.generation = slot.generation.wrapping_add(1);
        self.free.push(key.index);
        Ok(shape)
    }

    /// Live handle count.
    pub fn len(&self) -> usize {
        self.slots.len() - self.free.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
