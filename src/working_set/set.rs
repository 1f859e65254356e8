//! Generation checked member arena

use std::cell::RefCell;
use std::rc::Rc;

use super::id::WorkingSetId;
use super::member::WorkingSetMember;

/// Handle through which every stage of a plan tree reaches the working set
pub type SharedWorkingSet = Rc<RefCell<WorkingSet>>;

#[derive(Debug, Default)]
struct Slot {
    generation: u32,
    member: Option<WorkingSetMember>,
}

/// Arena of working set members.
///
/// Freed slots are recycled. Each reuse bumps the slot generation, so ids
/// handed out for earlier occupants stop resolving.
#[derive(Debug, Default)]
pub struct WorkingSet {
    slots: Vec<Slot>,
    free_slots: Vec<u32>,
    live: usize,
}

impl WorkingSet {
    /// Creates an empty working set
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an empty working set behind a shared handle
    pub fn shared() -> SharedWorkingSet {
        Rc::new(RefCell::new(Self::new()))
    }

    /// Inserts a fully built member and returns its id
    pub fn allocate_member(&mut self, member: WorkingSetMember) -> WorkingSetId {
        self.live += 1;
        if let Some(index) = self.free_slots.pop() {
            let slot = &mut self.slots[index as usize];
            slot.member = Some(member);
            return WorkingSetId::new(index, slot.generation);
        }

        let index = self.slots.len() as u32;
        self.slots.push(Slot {
            generation: 0,
            member: Some(member),
        });
        WorkingSetId::new(index, 0)
    }

    /// Returns the member for `id`, None if the id is invalid or stale
    pub fn get(&self, id: WorkingSetId) -> Option<&WorkingSetMember> {
        self.slots
            .get(id.index() as usize)
            .filter(|slot| slot.generation == id.generation())
            .and_then(|slot| slot.member.as_ref())
    }

    /// Returns the member for `id` mutably, None if the id is invalid or stale
    pub fn get_mut(&mut self, id: WorkingSetId) -> Option<&mut WorkingSetMember> {
        self.slots
            .get_mut(id.index() as usize)
            .filter(|slot| slot.generation == id.generation())
            .and_then(|slot| slot.member.as_mut())
    }

    /// Returns true if `id` resolves to a live member
    pub fn is_valid(&self, id: WorkingSetId) -> bool {
        self.get(id).is_some()
    }

    /// Removes the member for `id`, returning it
    pub fn take(&mut self, id: WorkingSetId) -> Option<WorkingSetMember> {
        let slot = self
            .slots
            .get_mut(id.index() as usize)
            .filter(|slot| slot.generation == id.generation())?;
        let member = slot.member.take()?;
        slot.generation = slot.generation.wrapping_add(1);
        self.free_slots.push(id.index());
        self.live -= 1;
        Some(member)
    }

    /// Frees the member for `id`. Returns false if the id did not resolve.
    pub fn free(&mut self, id: WorkingSetId) -> bool {
        self.take(id).is_some()
    }

    /// Returns the ids of all live members
    pub fn ids(&self) -> Vec<WorkingSetId> {
        self.slots
            .iter()
            .enumerate()
            .filter(|(_, slot)| slot.member.is_some())
            .map(|(index, slot)| WorkingSetId::new(index as u32, slot.generation))
            .collect()
    }

    /// Returns the number of live members
    pub fn len(&self) -> usize {
        self.live
    }

    /// Returns true if there are no live members
    pub fn is_empty(&self) -> bool {
        self.live == 0
    }

    /// Frees every member. Outstanding ids all become stale.
    pub fn clear(&mut self) {
        self.free_slots.clear();
        for (index, slot) in self.slots.iter_mut().enumerate() {
            if slot.member.take().is_some() {
                slot.generation = slot.generation.wrapping_add(1);
            }
            self.free_slots.push(index as u32);
        }
        self.live = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::RecordLocation;

    fn member(offset: u64) -> WorkingSetMember {
        WorkingSetMember::with_location(RecordLocation::new(0, offset))
    }

    #[test]
    fn test_allocate_and_get() {
        let mut ws = WorkingSet::new();
        let a = ws.allocate_member(member(1));
        let b = ws.allocate_member(member(2));

        assert_ne!(a, b);
        assert_eq!(ws.len(), 2);
        assert_eq!(ws.get(a).unwrap().location(), Some(RecordLocation::new(0, 1)));
        assert_eq!(ws.get(b).unwrap().location(), Some(RecordLocation::new(0, 2)));
    }

    #[test]
    fn test_invalid_id_never_resolves() {
        let mut ws = WorkingSet::new();
        ws.allocate_member(member(1));
        assert!(!ws.is_valid(WorkingSetId::INVALID));
        assert!(ws.get_mut(WorkingSetId::INVALID).is_none());
    }

    #[test]
    fn test_stale_id_after_reuse() {
        let mut ws = WorkingSet::new();
        let old = ws.allocate_member(member(1));
        assert!(ws.free(old));

        let new = ws.allocate_member(member(2));
        assert_eq!(old.index(), new.index());
        assert_ne!(old, new);

        assert!(!ws.is_valid(old));
        assert!(ws.get(old).is_none());
        assert_eq!(ws.get(new).unwrap().location(), Some(RecordLocation::new(0, 2)));
        assert!(!ws.free(old));
    }

    #[test]
    fn test_clear_stales_everything() {
        let mut ws = WorkingSet::new();
        let a = ws.allocate_member(member(1));
        let b = ws.allocate_member(member(2));
        ws.clear();

        assert!(ws.is_empty());
        assert!(!ws.is_valid(a));
        assert!(!ws.is_valid(b));

        let c = ws.allocate_member(member(3));
        assert!(ws.is_valid(c));
        assert_eq!(ws.len(), 1);
    }

    #[test]
    fn test_ids_lists_live_members() {
        let mut ws = WorkingSet::new();
        let a = ws.allocate_member(member(1));
        let b = ws.allocate_member(member(2));
        ws.free(a);
        assert_eq!(ws.ids(), vec![b]);
    }
}
