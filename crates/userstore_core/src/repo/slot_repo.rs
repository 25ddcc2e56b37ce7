//! Fixed-width, byte-addressed repository.
//!
//! # Responsibility
//! - Store each entity's title in one fixed-width slot of a contiguous
//!   zero-initialized buffer, addressed directly by id.
//!
//! # Invariants
//! - Id `k` owns bytes `[(k-1)*record_width, k*record_width)`; valid ids are
//!   `1..=max_records`.
//! - Occupancy lives in a separate length table, not in the slot bytes, so
//!   empty titles and titles starting with a NUL byte are storable.
//! - Unused trailing bytes of a slot are always zero.
//! - Writes that do not fit a slot fail before touching the buffer.

use crate::model::entity::{Entity, EntityId, EntityValidationError, Properties};
use crate::model::factory::{EntityFactory, TITLE_PROPERTY};
use crate::repo::factory::BackendKind;
use crate::repo::repository::{
    ensure_storable, lock_state, log_mutation, RepoError, RepoResult, Repository,
};
use std::ops::Range;
use std::sync::{Arc, Mutex};

const BACKEND: &str = "slots";

pub const DEFAULT_MAX_RECORDS: usize = 1024;
pub const DEFAULT_RECORD_WIDTH: usize = 255;

/// Capacity and slot width of a `SlotRepository`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SlotLayout {
    /// Number of addressable slots.
    pub max_records: usize,
    /// Slot width in bytes; the longest storable UTF-8 title.
    pub record_width: usize,
}

impl Default for SlotLayout {
    fn default() -> Self {
        Self {
            max_records: DEFAULT_MAX_RECORDS,
            record_width: DEFAULT_RECORD_WIDTH,
        }
    }
}

#[derive(Debug)]
struct SlotState {
    buffer: Vec<u8>,
    /// Encoded length per slot; `None` marks a free slot.
    lengths: Vec<Option<usize>>,
}

/// Byte-buffer store with O(1) addressing by id.
pub struct SlotRepository {
    factory: Arc<dyn EntityFactory>,
    layout: SlotLayout,
    state: Mutex<SlotState>,
}

impl SlotRepository {
    /// Allocates a zeroed buffer of `max_records * record_width` bytes.
    ///
    /// # Errors
    /// - `InvalidData` when either dimension is zero or the buffer size
    ///   overflows `usize`.
    pub fn new(factory: Arc<dyn EntityFactory>, layout: SlotLayout) -> RepoResult<Self> {
        if layout.max_records == 0 || layout.record_width == 0 {
            return Err(RepoError::InvalidData(format!(
                "slot layout must be non-empty, got {}x{}",
                layout.max_records, layout.record_width
            )));
        }
        let buffer_len = layout
            .max_records
            .checked_mul(layout.record_width)
            .ok_or_else(|| {
                RepoError::InvalidData(format!(
                    "slot layout {}x{} overflows the address space",
                    layout.max_records, layout.record_width
                ))
            })?;

        Ok(Self {
            factory,
            layout,
            state: Mutex::new(SlotState {
                buffer: vec![0; buffer_len],
                lengths: vec![None; layout.max_records],
            }),
        })
    }

    pub fn layout(&self) -> SlotLayout {
        self.layout
    }

    fn slot_index(&self, id: EntityId) -> Option<usize> {
        let id = usize::try_from(id).ok()?;
        (1..=self.layout.max_records)
            .contains(&id)
            .then(|| id - 1)
    }

    fn require_slot(&self, id: EntityId) -> RepoResult<usize> {
        self.slot_index(id).ok_or(RepoError::OutOfRange {
            id,
            max_records: self.layout.max_records,
        })
    }

    fn slot_range(&self, index: usize) -> Range<usize> {
        let start = index * self.layout.record_width;
        start..start + self.layout.record_width
    }

    fn encode<'a>(&self, entity: &'a Entity) -> RepoResult<&'a [u8]> {
        let title = entity
            .property(TITLE_PROPERTY)
            .ok_or(EntityValidationError::MissingProperty(TITLE_PROPERTY))?;
        let bytes = title.as_bytes();
        if bytes.len() > self.layout.record_width {
            return Err(RepoError::RecordTooLarge {
                id: entity.id(),
                len: bytes.len(),
                max: self.layout.record_width,
            });
        }
        Ok(bytes)
    }

    fn decode(&self, state: &SlotState, index: usize) -> RepoResult<Option<Entity>> {
        let Some(len) = state.lengths[index] else {
            return Ok(None);
        };
        let id = (index + 1) as EntityId;
        let start = self.slot_range(index).start;
        let title = std::str::from_utf8(&state.buffer[start..start + len]).map_err(|err| {
            RepoError::InvalidData(format!("slot {id} holds invalid UTF-8: {err}"))
        })?;

        let mut properties = Properties::new();
        properties.insert(TITLE_PROPERTY.to_string(), title.to_string());
        Ok(Some(self.factory.create(id, properties)?))
    }

    fn write_slot(&self, state: &mut SlotState, index: usize, bytes: &[u8]) {
        let slot = &mut state.buffer[self.slot_range(index)];
        slot.fill(0);
        slot[..bytes.len()].copy_from_slice(bytes);
        state.lengths[index] = Some(bytes.len());
    }

    fn clear_slot(&self, state: &mut SlotState, index: usize) {
        state.buffer[self.slot_range(index)].fill(0);
        state.lengths[index] = None;
    }

    fn add_locked(&self, entity: &Entity) -> RepoResult<()> {
        ensure_storable(entity)?;
        let index = self.require_slot(entity.id())?;
        let bytes = self.encode(entity)?;
        let mut state = lock_state(&self.state, BACKEND)?;
        if state.lengths[index].is_some() {
            return Err(RepoError::Conflict(entity.id()));
        }
        self.write_slot(&mut state, index, bytes);
        Ok(())
    }

    fn update_locked(&self, entity: &Entity) -> RepoResult<()> {
        ensure_storable(entity)?;
        let index = self.require_slot(entity.id())?;
        let bytes = self.encode(entity)?;
        let mut state = lock_state(&self.state, BACKEND)?;
        if state.lengths[index].is_none() {
            return Err(RepoError::NotFound(entity.id()));
        }
        self.write_slot(&mut state, index, bytes);
        Ok(())
    }

    fn delete_locked(&self, id: EntityId) -> RepoResult<()> {
        let index = self.require_slot(id)?;
        let mut state = lock_state(&self.state, BACKEND)?;
        if state.lengths[index].is_none() {
            return Err(RepoError::NotFound(id));
        }
        self.clear_slot(&mut state, index);
        Ok(())
    }

    #[cfg(test)]
    fn raw_slot(&self, id: EntityId) -> Vec<u8> {
        let index = self.slot_index(id).expect("id should be addressable");
        let state = self.state.lock().expect("slot state lock");
        state.buffer[self.slot_range(index)].to_vec()
    }
}

impl Repository for SlotRepository {
    fn backend_kind(&self) -> BackendKind {
        BackendKind::Slots
    }

    /// Ids outside the addressable range cannot hold data and read as absent.
    fn get(&self, id: EntityId) -> RepoResult<Option<Entity>> {
        let Some(index) = self.slot_index(id) else {
            return Ok(None);
        };
        let state = lock_state(&self.state, BACKEND)?;
        self.decode(&state, index)
    }

    fn list(&self) -> RepoResult<Vec<Entity>> {
        let state = lock_state(&self.state, BACKEND)?;
        let mut entities = Vec::new();
        for index in 0..self.layout.max_records {
            if let Some(entity) = self.decode(&state, index)? {
                entities.push(entity);
            }
        }
        Ok(entities)
    }

    fn add(&self, entity: &Entity) -> RepoResult<()> {
        let result = self.add_locked(entity);
        log_mutation(BACKEND, "add", entity.id(), &result);
        result
    }

    fn delete(&self, id: EntityId) -> RepoResult<()> {
        let result = self.delete_locked(id);
        log_mutation(BACKEND, "delete", id, &result);
        result
    }

    fn update(&self, entity: &Entity) -> RepoResult<()> {
        let result = self.update_locked(entity);
        log_mutation(BACKEND, "update", entity.id(), &result);
        result
    }
}
