//! Named binary semaphores over the three contended resources.
//!
//! The lock table tracks only lock state. Blocking a process and waking the
//! waiters are queue transitions owned by the kernel; see `kernel::Kernel`'s
//! `sem_wait`/`sem_signal`.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Number of contended resources in the system.
pub const RESOURCE_COUNT: usize = 3;

/// Identifier for a contended resource.
///
/// The wire names (`userInput`, `file`, `userOutput`) are the literals that
/// appear in program text after `semWait`/`semSignal`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum ResourceId {
    UserInput,
    File,
    UserOutput,
}

impl ResourceId {
    /// All resources, in lock-table order.
    pub const ALL: [ResourceId; RESOURCE_COUNT] =
        [ResourceId::UserInput, ResourceId::File, ResourceId::UserOutput];

    /// Parse a wire name; `None` for anything unrecognized.
    pub fn parse(name: &str) -> Option<ResourceId> {
        match name {
            "userInput" => Some(ResourceId::UserInput),
            "file" => Some(ResourceId::File),
            "userOutput" => Some(ResourceId::UserOutput),
            _ => None,
        }
    }

    /// Wire name as it appears in program text.
    pub fn wire_name(self) -> &'static str {
        match self {
            ResourceId::UserInput => "userInput",
            ResourceId::File => "file",
            ResourceId::UserOutput => "userOutput",
        }
    }

    #[inline(always)]
    pub fn index(self) -> usize {
        match self {
            ResourceId::UserInput => 0,
            ResourceId::File => 1,
            ResourceId::UserOutput => 2,
        }
    }
}

impl fmt::Display for ResourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.wire_name())
    }
}

/// Lock state of a single resource.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LockState {
    Free,
    Held,
}

/// Binary lock table for the three resources.
///
/// `release` is unconditional: signaling a resource frees it regardless of
/// who (if anyone) holds it, matching the lenient semaphore protocol.
#[derive(Clone, Debug)]
pub struct ResourceManager {
    locks: [LockState; RESOURCE_COUNT],
}

impl ResourceManager {
    pub fn new() -> Self {
        Self {
            locks: [LockState::Free; RESOURCE_COUNT],
        }
    }

    /// Acquire the lock if free. Returns false when already held, in which
    /// case the caller must block the requesting process.
    pub fn try_acquire(&mut self, res: ResourceId) -> bool {
        match self.locks[res.index()] {
            LockState::Free => {
                self.locks[res.index()] = LockState::Held;
                true
            }
            LockState::Held => false,
        }
    }

    /// Unconditionally mark the resource free.
    pub fn release(&mut self, res: ResourceId) {
        self.locks[res.index()] = LockState::Free;
    }

    /// Whether the resource is currently held.
    pub fn is_held(&self, res: ResourceId) -> bool {
        self.locks[res.index()] == LockState::Held
    }
}

impl Default for ResourceManager {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_wire_names() {
        assert_eq!(ResourceId::parse("userInput"), Some(ResourceId::UserInput));
        assert_eq!(ResourceId::parse("file"), Some(ResourceId::File));
        assert_eq!(ResourceId::parse("userOutput"), Some(ResourceId::UserOutput));
        assert_eq!(ResourceId::parse("screen"), None);
        assert_eq!(ResourceId::parse(""), None);
    }

    #[test]
    fn acquire_is_exclusive_until_release() {
        let mut locks = ResourceManager::new();
        assert!(locks.try_acquire(ResourceId::File));
        assert!(!locks.try_acquire(ResourceId::File));
        assert!(locks.is_held(ResourceId::File));

        // Independent locks do not interfere.
        assert!(locks.try_acquire(ResourceId::UserInput));

        locks.release(ResourceId::File);
        assert!(!locks.is_held(ResourceId::File));
        assert!(locks.try_acquire(ResourceId::File));
    }

    #[test]
    fn release_without_holder_is_allowed() {
        let mut locks = ResourceManager::new();
        locks.release(ResourceId::UserOutput);
        assert!(locks.try_acquire(ResourceId::UserOutput));
    }
}
