//! Transform evaluator seam

use std::fmt;

use crate::status::StatusResult;
use crate::working_set::WorkingSetMember;

/// Rewrites a working set member in place or reports why it cannot.
pub trait DocumentTransform: fmt::Debug {
    /// Transforms the member. On error the member must be left untouched.
    fn transform(&self, member: &mut WorkingSetMember) -> StatusResult<()>;
}

/// A closure based transform
pub struct FnTransform<F>
where
    F: Fn(&mut WorkingSetMember) -> StatusResult<()>,
{
    name: String,
    func: F,
}

impl<F> FnTransform<F>
where
    F: Fn(&mut WorkingSetMember) -> StatusResult<()>,
{
    /// Creates a named closure transform
    pub fn new(name: impl Into<String>, func: F) -> Self {
        Self {
            name: name.into(),
            func,
        }
    }
}

impl<F> fmt::Debug for FnTransform<F>
where
    F: Fn(&mut WorkingSetMember) -> StatusResult<()>,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FnTransform")
            .field("name", &self.name)
            .finish()
    }
}

impl<F> DocumentTransform for FnTransform<F>
where
    F: Fn(&mut WorkingSetMember) -> StatusResult<()>,
{
    fn transform(&self, member: &mut WorkingSetMember) -> StatusResult<()> {
        (self.func)(member)
    }
}
