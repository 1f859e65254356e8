//! Helpers shared by every stage that touches the working set

use crate::status::Status;
use crate::storage::RecordLocation;

use super::id::WorkingSetId;
use super::member::WorkingSetMember;
use super::set::WorkingSet;

/// Working set operations built on top of the arena
pub struct WorkingSetCommon;

impl WorkingSetCommon {
    /// Allocates a member describing `status` and returns its id.
    ///
    /// The member is built before insertion, so the id always resolves to a
    /// complete status member.
    pub fn allocate_status_member(ws: &mut WorkingSet, status: Status) -> WorkingSetId {
        ws.allocate_member(WorkingSetMember::with_status(status))
    }

    /// Returns the status carried by `member`, if it is a status member
    pub fn member_status(member: &WorkingSetMember) -> Option<Status> {
        member.status().cloned()
    }

    /// Returns the status carried by the member behind `id`
    pub fn status_of(ws: &WorkingSet, id: WorkingSetId) -> Option<Status> {
        ws.get(id).and_then(Self::member_status)
    }

    /// Detaches every member still pointing at `location`.
    ///
    /// Members holding a document keep it as an owned copy. Members that
    /// only had the location are freed. Returns how many members were touched.
    pub fn fetch_and_invalidate_location(ws: &mut WorkingSet, location: RecordLocation) -> usize {
        let mut touched = 0;
        for id in ws.ids() {
            let points_here = ws
                .get(id)
                .map(|member| member.location() == Some(location))
                .unwrap_or(false);
            if !points_here {
                continue;
            }

            touched += 1;
            let kept = ws
                .get_mut(id)
                .map(WorkingSetMember::transition_to_owned_document)
                .unwrap_or(false);
            if !kept {
                ws.free(id);
            }
        }
        touched
    }
}
