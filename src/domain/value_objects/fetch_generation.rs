use serde::{Deserialize, Serialize};

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FetchKind {
    Profile,
    Posts,
    Following,
    Followers,
    FollowStatus,
}

impl FetchKind {
    fn slot(self) -> usize {
        match self {
            FetchKind::Profile => 0,
            FetchKind::Posts => 1,
            FetchKind::Following => 2,
            FetchKind::Followers => 3,
            FetchKind::FollowStatus => 4,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            FetchKind::Profile => "profile",
            FetchKind::Posts => "posts",
            FetchKind::Following => "following",
            FetchKind::Followers => "followers",
            FetchKind::FollowStatus => "follow_status",
        }
    }
}

/// Proof that a fetch was started; only the newest ticket per kind may apply its result.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct FetchTicket {
    pub kind: FetchKind,
    pub generation: u64,
}

/// Last-write-wins bookkeeping for in-flight fetches.
///
/// Generations are drawn from one counter that never goes backwards, so a
/// ticket issued before `supersede_all` can never match a ticket issued after.
#[derive(Debug, Clone, Default)]
pub struct FetchGenerations {
    next: u64,
    current: [u64; 5],
}

impl FetchGenerations {
    pub fn begin(&mut self, kind: FetchKind) -> FetchTicket {
        self.next += 1;
        self.current[kind.slot()] = self.next;
        FetchTicket {
            kind,
            generation: self.next,
        }
    }

    pub fn is_current(&self, ticket: &FetchTicket) -> bool {
        self.current[ticket.kind.slot()] == ticket.generation
    }

    pub fn supersede(&mut self, kind: FetchKind) {
        self.current[kind.slot()] = 0;
    }

    pub fn supersede_all(&mut self) {
        self.current = [0; 5];
    }
}
