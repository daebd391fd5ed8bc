//! Deterministic round-robin process-scheduler simulation with a toy
//! instruction set and semaphore-guarded shared resources.
//!
//! ## Scope
//! This crate models how an operating system interleaves several
//! independently-loaded programs: process control blocks, a strict-FIFO
//! ready queue with a fixed time quantum, a seven-verb instruction
//! interpreter, and three binary semaphores (`userInput`, `file`,
//! `userOutput`) with blocking wait and wake-all signal.
//!
//! ## Key invariants
//! - One instruction execution or one idle tick advances the clock by
//!   exactly one; a run is a pure function of the spawned programs and the
//!   io port, so traces are replayable.
//! - Everything is bounded: process queues, instruction memory, and variable
//!   slots have fixed capacities, and overflow is an explicit, counted
//!   result rather than a silent drop.
//! - At most one process holds a resource lock at any instant; a signal
//!   wakes every waiter and lets the next scheduling rounds re-arbitrate.
//! - Io faults finish the faulting process; they never abort the run.
//!
//! ## Run flow
//! 1) Load programs (`loader`) and spawn them with arrival ticks.
//! 2) The kernel admits each process when the clock reaches its arrival.
//! 3) The ready queue drains round-robin, one instruction per turn.
//! 4) `semWait`/`semSignal` route processes through the blocked queue.
//! 5) The run report carries the outcome, counters, and the trace dump.
//!
//! ## Notable entry points
//! - [`Kernel`] / [`KernelConfig`]: the simulation itself.
//! - [`IoPort`]: capability trait for the external byte world, with
//!   [`StdIo`] (terminal + filesystem) and [`SimIo`] (deterministic,
//!   in-memory) implementations.
//! - [`LoadedProgram`] / [`load_program`]: bounded program loading.

pub mod stdx;

mod clock;
mod io_port;
mod kernel;
mod loader;
mod process;
mod program;
mod resource;
mod snapshot;
mod trace;

pub use clock::Clock;
pub use io_port::{IoPort, SimIo, StdIo};
pub use kernel::{Kernel, KernelConfig, RunOutcome, RunReport, SpawnError, TIME_QUANTUM};
pub use loader::{load_program, LoadedProgram};
pub use process::{
    Pcb, Pid, Process, ProcessState, VarOverflow, VarTable, MAX_PROCESSES,
    MAX_VARIABLES_PER_PROCESS, MEMORY_SIZE,
};
pub use program::{decode, AssignValue, DecodeError, Instr};
pub use resource::{LockState, ResourceId, ResourceManager, RESOURCE_COUNT};
pub use snapshot::{QueueRow, QueueSnapshot, StorageSnapshot};
pub use trace::{TraceEvent, TraceRing};
