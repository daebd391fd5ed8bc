//! Process model: pids, control blocks, bounded instruction memory, and the
//! bounded per-process variable table.
//!
//! Invariants:
//! - Pids are unique, monotonic from 1, and immutable after creation.
//! - `program_counter` stays inside `[0, MEMORY_SIZE)` while the process is
//!   not finished.
//! - An executed instruction slot is retired with an explicit marker; retired
//!   is distinct from never-loaded, so an empty line cannot be confused with
//!   an exhausted one.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::resource::ResourceId;

/// Instruction slots per process.
pub const MEMORY_SIZE: usize = 60;
/// Variable bindings per process.
pub const MAX_VARIABLES_PER_PROCESS: usize = 3;
/// Capacity of every process queue and the admission cap.
pub const MAX_PROCESSES: usize = 10;

/// Stable process identifier. Pids start at 1.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Pid(u32);

impl Pid {
    #[inline(always)]
    pub fn from_u32(id: u32) -> Self {
        debug_assert!(id >= 1, "pids start at 1");
        Self(id)
    }

    #[inline(always)]
    pub fn get(self) -> u32 {
        self.0
    }

    /// Zero-based table index for this pid.
    #[inline(always)]
    pub fn index(self) -> usize {
        (self.0 - 1) as usize
    }
}

impl fmt::Display for Pid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Control state of a process.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProcessState {
    Ready,
    Running,
    Blocked,
    Finished,
}

/// One instruction slot.
///
/// `Retired` marks an executed slot; the instruction text is released.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Slot {
    Pending(String),
    Retired,
}

/// Returned when a binding would exceed the variable slots.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct VarOverflow;

impl fmt::Display for VarOverflow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("variable slots exhausted")
    }
}

/// Bounded name -> value table.
///
/// Insertion order is slot-assignment order. Re-assigning an existing name
/// (exact match) overwrites in place; a new name past capacity is rejected.
#[derive(Clone, Debug, Default)]
pub struct VarTable {
    entries: Vec<(String, String)>,
}

impl VarTable {
    pub fn new() -> Self {
        Self {
            entries: Vec::with_capacity(MAX_VARIABLES_PER_PROCESS),
        }
    }

    pub fn set(&mut self, name: &str, value: String) -> Result<(), VarOverflow> {
        if let Some(entry) = self.entries.iter_mut().find(|(n, _)| n == name) {
            entry.1 = value;
            return Ok(());
        }
        if self.entries.len() >= MAX_VARIABLES_PER_PROCESS {
            return Err(VarOverflow);
        }
        self.entries.push((name.to_string(), value));
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Process control block.
#[derive(Clone, Debug)]
pub struct Pcb {
    pub pid: Pid,
    pub state: ProcessState,
    pub program_counter: usize,
    pub cycles_remaining: u32,
    /// Resource the process is waiting for; only meaningful while `Blocked`.
    pub waiting_for: Option<ResourceId>,
    /// Set when an io fault finished this process.
    pub fault: Option<String>,
}

/// An isolated unit of execution: instruction memory, variables, and PCB.
#[derive(Clone, Debug)]
pub struct Process {
    slots: Vec<Slot>,
    pub vars: VarTable,
    pub pcb: Pcb,
    pub arrival_time: u64,
}

impl Process {
    pub fn new(pid: Pid, arrival_time: u64, lines: Vec<String>, quantum: u32) -> Self {
        let mut slots: Vec<Slot> = lines.into_iter().map(Slot::Pending).collect();
        slots.truncate(MEMORY_SIZE);

        Self {
            slots,
            vars: VarTable::new(),
            pcb: Pcb {
                pid,
                state: ProcessState::Ready,
                program_counter: 0,
                cycles_remaining: quantum,
                waiting_for: None,
                fault: None,
            },
            arrival_time,
        }
    }

    /// Number of loaded instruction slots.
    pub fn loaded_len(&self) -> usize {
        self.slots.len()
    }

    /// The pending line at the program counter, if any.
    pub fn pending_line(&self) -> Option<&str> {
        match self.slots.get(self.pcb.program_counter) {
            Some(Slot::Pending(line)) => Some(line.as_str()),
            _ => None,
        }
    }

    /// Retire the slot at the program counter, releasing the line.
    pub fn retire_current(&mut self) {
        if let Some(slot) = self.slots.get_mut(self.pcb.program_counter) {
            *slot = Slot::Retired;
        }
    }

    /// Advance the program counter by one.
    pub fn advance(&mut self) {
        self.pcb.program_counter += 1;
    }

    /// Whether the program counter has run past the last loaded instruction.
    pub fn at_end(&self) -> bool {
        self.pcb.program_counter >= self.slots.len()
    }

    /// Pending lines in slot order, for storage snapshots.
    pub fn pending_lines(&self) -> impl Iterator<Item = &str> {
        self.slots.iter().filter_map(|slot| match slot {
            Slot::Pending(line) => Some(line.as_str()),
            Slot::Retired => None,
        })
    }
}

/// Storage for all allocated processes, indexed by pid.
///
/// A finished process is removed (deallocated) the instant it finishes; its
/// slot stays `None` so pids remain stable.
#[derive(Debug, Default)]
pub struct ProcessTable {
    slots: Vec<Option<Process>>,
}

impl ProcessTable {
    pub fn new() -> Self {
        Self { slots: Vec::new() }
    }

    pub fn insert(&mut self, process: Process) {
        let idx = process.pcb.pid.index();
        if idx >= self.slots.len() {
            self.slots.resize_with(idx + 1, || None);
        }
        debug_assert!(self.slots[idx].is_none(), "pid reused");
        self.slots[idx] = Some(process);
    }

    pub fn get(&self, pid: Pid) -> Option<&Process> {
        self.slots.get(pid.index()).and_then(|s| s.as_ref())
    }

    pub fn get_mut(&mut self, pid: Pid) -> Option<&mut Process> {
        self.slots.get_mut(pid.index()).and_then(|s| s.as_mut())
    }

    pub fn remove(&mut self, pid: Pid) -> Option<Process> {
        self.slots.get_mut(pid.index()).and_then(|s| s.take())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lines(texts: &[&str]) -> Vec<String> {
        texts.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn var_table_overwrites_in_place() {
        let mut vars = VarTable::new();
        vars.set("a", "1".to_string()).unwrap();
        vars.set("b", "2".to_string()).unwrap();
        vars.set("a", "3".to_string()).unwrap();

        assert_eq!(vars.get("a"), Some("3"));
        assert_eq!(vars.get("b"), Some("2"));
        assert_eq!(vars.len(), 2);
    }

    #[test]
    fn var_table_matches_exact_names_only() {
        let mut vars = VarTable::new();
        vars.set("x", "1".to_string()).unwrap();
        vars.set("xy", "2".to_string()).unwrap();

        assert_eq!(vars.get("x"), Some("1"));
        assert_eq!(vars.get("xy"), Some("2"));
        assert_eq!(vars.get("xyz"), None);
    }

    #[test]
    fn var_table_rejects_fourth_binding() {
        let mut vars = VarTable::new();
        vars.set("a", "1".to_string()).unwrap();
        vars.set("b", "2".to_string()).unwrap();
        vars.set("c", "3".to_string()).unwrap();
        assert_eq!(vars.set("d", "4".to_string()), Err(VarOverflow));

        // Existing names still writable at capacity.
        vars.set("b", "9".to_string()).unwrap();
        assert_eq!(vars.get("b"), Some("9"));
        assert_eq!(vars.get("d"), None);
    }

    #[test]
    fn slots_retire_without_shifting() {
        let mut p = Process::new(Pid::from_u32(1), 0, lines(&["print a", "print b"]), 1);
        assert_eq!(p.pending_line(), Some("print a"));

        p.retire_current();
        p.advance();
        assert_eq!(p.pending_line(), Some("print b"));
        assert!(!p.at_end());

        p.retire_current();
        p.advance();
        assert_eq!(p.pending_line(), None);
        assert!(p.at_end());
    }

    #[test]
    fn empty_program_is_at_end_immediately() {
        let p = Process::new(Pid::from_u32(1), 0, Vec::new(), 1);
        assert!(p.at_end());
        assert_eq!(p.pending_line(), None);
    }

    #[test]
    fn table_insert_get_remove() {
        let mut table = ProcessTable::new();
        table.insert(Process::new(Pid::from_u32(1), 0, Vec::new(), 1));
        table.insert(Process::new(Pid::from_u32(3), 0, Vec::new(), 1));

        assert!(table.get(Pid::from_u32(1)).is_some());
        assert!(table.get(Pid::from_u32(2)).is_none());
        assert!(table.get(Pid::from_u32(3)).is_some());

        let removed = table.remove(Pid::from_u32(1)).unwrap();
        assert_eq!(removed.pcb.pid, Pid::from_u32(1));
        assert!(table.get(Pid::from_u32(1)).is_none());
    }
}
