//! Completion tracking for one multi-file upload

/// State of one batch member.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MemberState {
    Pending,
    Uploaded,
    Failed,
}

/// Progress reported after recording a member.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BatchProgress {
    /// Members are still outstanding
    Pending { remaining: usize },
    /// The last member just completed; issue the barrier now
    Complete,
    /// The member was already recorded; nothing changed
    Duplicate,
}

/// Counting context for one selection.
///
/// Every member is recorded exactly once, in whatever order its read
/// finishes. [`BatchProgress::Complete`] is returned for exactly one call:
/// the one that records the final member.
#[derive(Debug, Clone)]
pub struct BatchJob {
    members: Vec<MemberState>,
    completed: usize,
}

impl BatchJob {
    pub fn new(len: usize) -> Self {
        Self {
            members: vec![MemberState::Pending; len],
            completed: 0,
        }
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    pub fn completed(&self) -> usize {
        self.completed
    }

    pub fn is_complete(&self) -> bool {
        self.completed == self.members.len()
    }

    pub fn state(&self, index: usize) -> Option<MemberState> {
        self.members.get(index).copied()
    }

    /// Record the outcome of member `index`.
    ///
    /// # Panics
    ///
    /// Panics if `index` is out of range.
    pub fn record(&mut self, index: usize, uploaded: bool) -> BatchProgress {
        let member = &mut self.members[index];
        if *member != MemberState::Pending {
            return BatchProgress::Duplicate;
        }

        *member = if uploaded {
            MemberState::Uploaded
        } else {
            MemberState::Failed
        };
        self.completed += 1;

        if self.is_complete() {
            BatchProgress::Complete
        } else {
            BatchProgress::Pending {
                remaining: self.members.len() - self.completed,
            }
        }
    }
}
