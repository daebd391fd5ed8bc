//! Round-robin kernel: admission, the scheduling loop, and the per-turn
//! instruction interpreter.
//!
//! The kernel owns every piece of mutable state — the process table, the
//! ready/blocked/storage queues, the resource locks, the clock, and the
//! trace ring — so a run is a pure function of the spawned programs and the
//! io port. One instruction execution or one idle tick advances the clock by
//! exactly one.
//!
//! Scheduling invariants:
//! - The ready queue is strict FIFO; a process that ran rejoins at the tail.
//! - A process sits in at most one of {ready, blocked} at any instant and in
//!   storage until it finishes.
//! - Waking is wake-all: one signal moves every matching waiter to the ready
//!   tail in blocked-queue order, leaving the rest in place.
//! - A process that blocks on a wait retries the same instruction on wake;
//!   nothing is retired and the program counter does not move.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::clock::Clock;
use crate::io_port::IoPort;
use crate::loader::LoadedProgram;
use crate::process::{
    Pid, Process, ProcessState, ProcessTable, MAX_PROCESSES,
};
use crate::program::{decode, AssignValue, Instr};
use crate::resource::{ResourceId, ResourceManager};
use crate::snapshot::{QueueRow, QueueSnapshot, StorageSnapshot};
use crate::stdx::BoundedQueue;
use crate::trace::{TraceEvent, TraceRing};

/// Default number of instructions a process may run per scheduling turn.
pub const TIME_QUANTUM: u32 = 1;

/// Configuration for a kernel run.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct KernelConfig {
    /// Instructions a process may run before mandatory rotation.
    pub time_quantum: u32,
    /// Backstop bound: the run aborts once the clock exceeds this.
    pub max_ticks: u64,
    /// Capacity of the trace ring.
    pub trace_cap: usize,
    /// Emit arrival/finish announcements and queue tables on the output sink.
    pub show_queues: bool,
}

impl Default for KernelConfig {
    fn default() -> Self {
        Self {
            time_quantum: TIME_QUANTUM,
            max_ticks: 100_000,
            trace_cap: 1024,
            show_queues: false,
        }
    }
}

/// Terminal state of a run.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum RunOutcome {
    /// Every admitted process finished and nothing is blocked.
    Completed,
    /// All live processes are blocked and no arrival or signal can ever
    /// unblock them.
    Deadlock { blocked: Vec<Pid> },
    /// The `max_ticks` backstop fired.
    TickLimit,
}

impl fmt::Display for RunOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RunOutcome::Completed => f.write_str("completed"),
            RunOutcome::Deadlock { .. } => f.write_str("deadlock"),
            RunOutcome::TickLimit => f.write_str("tick-limit"),
        }
    }
}

/// Everything a run reports back: outcome, counters, and the trace dump.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RunReport {
    pub outcome: RunOutcome,
    pub final_tick: u64,
    /// Scheduling turns executed (a blocking wait counts as a turn).
    pub executed: u64,
    pub finished: u32,
    pub faulted: u32,
    /// Processes whose arrival tick was never reached before termination.
    pub never_admitted: u32,
    pub queue_overflows: u32,
    pub var_overflows: u32,
    pub truncated_lines: u32,
    pub trace: Vec<TraceEvent>,
}

/// Returned when spawning past the process capacity.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SpawnError {
    TooManyProcesses,
}

impl fmt::Display for SpawnError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SpawnError::TooManyProcesses => {
                write!(f, "process capacity exhausted (max {MAX_PROCESSES})")
            }
        }
    }
}

impl std::error::Error for SpawnError {}

/// The simulated operating system.
pub struct Kernel {
    cfg: KernelConfig,
    clock: Clock,
    table: ProcessTable,
    /// Spawned processes waiting for their arrival tick, in spawn order.
    pending: Vec<(u64, Pid)>,
    ready: BoundedQueue<Pid, MAX_PROCESSES>,
    blocked: BoundedQueue<Pid, MAX_PROCESSES>,
    storage: BoundedQueue<Pid, MAX_PROCESSES>,
    resources: ResourceManager,
    trace: TraceRing,
    next_pid: u32,
    executed: u64,
    finished: u32,
    faulted: u32,
    queue_overflows: u32,
    var_overflows: u32,
    truncated_lines: u32,
}

impl Kernel {
    pub fn new(cfg: KernelConfig) -> Self {
        let mut cfg = cfg;
        cfg.time_quantum = cfg.time_quantum.max(1);
        let trace = TraceRing::new(cfg.trace_cap);

        Self {
            cfg,
            clock: Clock::new(),
            table: ProcessTable::new(),
            pending: Vec::new(),
            ready: BoundedQueue::new(),
            blocked: BoundedQueue::new(),
            storage: BoundedQueue::new(),
            resources: ResourceManager::new(),
            trace,
            next_pid: 1,
            executed: 0,
            finished: 0,
            faulted: 0,
            queue_overflows: 0,
            var_overflows: 0,
            truncated_lines: 0,
        }
    }

    /// Register a program with an arrival tick. Pids are handed out in spawn
    /// order, starting at 1.
    pub fn spawn(&mut self, arrival_time: u64, program: LoadedProgram) -> Result<Pid, SpawnError> {
        if (self.next_pid - 1) as usize >= MAX_PROCESSES {
            return Err(SpawnError::TooManyProcesses);
        }

        let pid = Pid::from_u32(self.next_pid);
        self.next_pid += 1;

        if program.truncated > 0 {
            self.truncated_lines += program.truncated;
            self.trace.push(TraceEvent::ProgramTruncated {
                pid: pid.get(),
                dropped: program.truncated,
            });
        }

        self.table.insert(Process::new(
            pid,
            arrival_time,
            program.lines,
            self.cfg.time_quantum,
        ));
        self.pending.push((arrival_time, pid));
        Ok(pid)
    }

    /// Current clock value in ticks.
    pub fn clock_ticks(&self) -> u64 {
        self.clock.now_ticks()
    }

    /// Drive the simulation to its terminal state.
    pub fn run(&mut self, io: &mut dyn IoPort) -> RunReport {
        loop {
            self.admit_arrivals(io);
            if self.cfg.show_queues {
                self.emit_tables(io);
            }

            let mut any_ran = false;
            loop {
                let pid = match self.ready.pop_front() {
                    Some(pid) => pid,
                    None => break,
                };
                // Stale entries (finished or blocked since being queued) are
                // dropped on dequeue.
                let state = match self.table.get(pid) {
                    Some(proc) => proc.pcb.state,
                    None => continue,
                };
                if state != ProcessState::Ready {
                    continue;
                }

                any_ran = true;
                self.execute_turn(pid, io);
                self.executed += 1;
                self.clock.tick();
                if self.clock.now_ticks() > self.cfg.max_ticks {
                    return self.report(RunOutcome::TickLimit);
                }
                self.admit_arrivals(io);
                self.route_after_turn(pid, io);
            }

            if any_ran {
                continue;
            }
            if self.blocked.is_empty() {
                return self.report(RunOutcome::Completed);
            }
            if self.pending.is_empty() {
                // Nothing runnable, nothing arriving: no signal can ever be
                // issued again, so the blocked set can never shrink.
                self.trace.push(TraceEvent::DeadlockDetected {
                    tick: self.clock.now_ticks(),
                });
                let blocked: Vec<Pid> = self.blocked.iter().copied().collect();
                return self.report(RunOutcome::Deadlock { blocked });
            }

            // All live processes are blocked but arrivals are still due.
            self.clock.tick();
            self.trace.push(TraceEvent::IdleTick {
                tick: self.clock.now_ticks(),
            });
            if self.clock.now_ticks() > self.cfg.max_ticks {
                return self.report(RunOutcome::TickLimit);
            }
        }
    }

    /// Move every process whose arrival tick equals the clock into storage
    /// and the ready tail.
    fn admit_arrivals(&mut self, io: &mut dyn IoPort) {
        let now = self.clock.now_ticks();
        let mut due: Vec<Pid> = Vec::new();
        self.pending.retain(|&(arrival, pid)| {
            if arrival == now {
                due.push(pid);
                false
            } else {
                true
            }
        });

        for pid in due {
            self.trace.push(TraceEvent::ProcessArrived {
                pid: pid.get(),
                tick: now,
            });

            let empty = match self.table.get(pid) {
                Some(proc) => proc.loaded_len() == 0,
                None => continue,
            };
            if empty {
                // Nothing to run: finishes without ever entering a queue.
                if let Some(proc) = self.table.get_mut(pid) {
                    proc.pcb.state = ProcessState::Finished;
                }
                self.finish_process(pid, io);
                continue;
            }

            if self.storage.push_back(pid).is_err() {
                self.queue_overflows += 1;
                self.trace.push(TraceEvent::QueueOverflow { pid: pid.get() });
            }
            if self.ready.push_back(pid).is_err() {
                self.queue_overflows += 1;
                self.trace.push(TraceEvent::QueueOverflow { pid: pid.get() });
            }
            if self.cfg.show_queues {
                io.emit(&format!("Process {pid} has arrived at clock cycle {now}"));
            }
        }
    }

    /// Run exactly one instruction of `pid`.
    fn execute_turn(&mut self, pid: Pid, io: &mut dyn IoPort) {
        let (line, pc) = {
            let proc = match self.table.get_mut(pid) {
                Some(proc) => proc,
                None => return,
            };
            proc.pcb.state = ProcessState::Running;
            debug_assert!(proc.pcb.cycles_remaining > 0, "scheduled with no quantum");

            match proc.pending_line() {
                Some(line) => (line.to_string(), proc.pcb.program_counter),
                None => {
                    proc.pcb.state = ProcessState::Finished;
                    return;
                }
            }
        };

        self.trace.push(TraceEvent::InstrExecuted {
            pid: pid.get(),
            tick: self.clock.now_ticks(),
            pc: pc as u32,
        });
        if self.cfg.show_queues {
            io.emit(&format!(
                "Executing instruction [{line}] from Process {pid} at clock cycle {}",
                self.clock.now_ticks()
            ));
        }

        match decode(&line) {
            Ok(instr) => self.dispatch(pid, instr, io),
            // Resolution errors are reported and execution completes.
            Err(err) => io.emit(&err.to_string()),
        }

        let quantum = self.cfg.time_quantum;
        if let Some(proc) = self.table.get_mut(pid) {
            if proc.pcb.state == ProcessState::Blocked {
                // The wait is retried on wake: slot stays pending, the
                // program counter does not move.
                return;
            }

            proc.retire_current();
            proc.advance();
            proc.pcb.cycles_remaining = proc.pcb.cycles_remaining.saturating_sub(1);

            if proc.pcb.state == ProcessState::Running {
                if proc.at_end() {
                    proc.pcb.state = ProcessState::Finished;
                } else if proc.pcb.cycles_remaining == 0 {
                    proc.pcb.state = ProcessState::Ready;
                    proc.pcb.cycles_remaining = quantum;
                } else {
                    proc.pcb.state = ProcessState::Ready;
                }
            }
        }
    }

    /// Re-queue, drop, or retire `pid` after a turn.
    ///
    /// Re-enqueueing happens exactly once and exactly here; blocked
    /// processes were already queued by `sem_wait`.
    fn route_after_turn(&mut self, pid: Pid, io: &mut dyn IoPort) {
        let state = match self.table.get(pid) {
            Some(proc) => proc.pcb.state,
            None => return,
        };
        match state {
            ProcessState::Ready => {
                if self.ready.push_back(pid).is_err() {
                    self.queue_overflows += 1;
                    self.trace.push(TraceEvent::QueueOverflow { pid: pid.get() });
                }
            }
            ProcessState::Blocked => {}
            ProcessState::Finished => self.finish_process(pid, io),
            ProcessState::Running => debug_assert!(false, "turn left process running"),
        }
    }

    fn dispatch(&mut self, pid: Pid, instr: Instr, io: &mut dyn IoPort) {
        match instr {
            Instr::Print { var } => match self.lookup(pid, &var) {
                Some(value) => io.emit(&value),
                None => io.emit(&format!("Variable '{var}' not found.")),
            },
            Instr::Assign { var, value } => {
                let resolved = match value {
                    AssignValue::Literal(text) => text,
                    AssignValue::Input => {
                        io.emit(&format!("Please enter a value for variable {var}: "));
                        match io.read_input_line() {
                            Ok(line) => line,
                            Err(err) => {
                                self.fault_process(pid, format!("read input: {err}"));
                                return;
                            }
                        }
                    }
                    AssignValue::FirstLineOf { file_var } => {
                        let filename = match self.lookup(pid, &file_var) {
                            Some(name) => name,
                            None => {
                                io.emit(&format!("Filename variable '{file_var}' not found."));
                                return;
                            }
                        };
                        match io.read_first_line(&filename) {
                            Ok(line) => line,
                            Err(err) => {
                                io.emit(&format!("Error opening file: {filename}"));
                                self.fault_process(pid, format!("open {filename}: {err}"));
                                return;
                            }
                        }
                    }
                };
                if let Some(proc) = self.table.get_mut(pid) {
                    if proc.vars.set(&var, resolved).is_err() {
                        self.var_overflows += 1;
                        self.trace.push(TraceEvent::VarSlotsExhausted { pid: pid.get() });
                    }
                }
            }
            Instr::WriteFile { file_var, data_var } => {
                let filename = self.lookup(pid, &file_var);
                let data = self.lookup(pid, &data_var);
                match (filename, data) {
                    (Some(filename), Some(data)) => {
                        io.emit(&format!("Creating file: {filename}"));
                        if let Err(err) = io.write_file(&filename, &data) {
                            io.emit(&format!("Error writing to file: {filename}"));
                            self.fault_process(pid, format!("write {filename}: {err}"));
                        }
                    }
                    _ => io.emit("Error: Invalid filename or data."),
                }
            }
            Instr::ReadFile { file_var } => {
                let filename = match self.lookup(pid, &file_var) {
                    Some(name) => name,
                    None => {
                        io.emit(&format!("Filename variable '{file_var}' not found."));
                        return;
                    }
                };
                match io.read_all_lines(&filename) {
                    Ok(lines) => {
                        for line in lines {
                            io.emit(&line);
                        }
                    }
                    Err(err) => {
                        io.emit(&format!("Error opening file: {filename}"));
                        self.fault_process(pid, format!("open {filename}: {err}"));
                    }
                }
            }
            Instr::PrintFromTo { from_var, to_var } => {
                let from = self.lookup(pid, &from_var);
                let to = self.lookup(pid, &to_var);
                match (from, to) {
                    (Some(from), Some(to)) => {
                        match (from.parse::<i64>(), to.parse::<i64>()) {
                            (Ok(from), Ok(to)) => {
                                let mut out = String::new();
                                for i in from..=to {
                                    out.push_str(&format!("{i} "));
                                }
                                io.emit(&out);
                            }
                            _ => io.emit("Error: Range bounds must be integers."),
                        }
                    }
                    _ => io.emit("Error: Variables not found."),
                }
            }
            Instr::Wait { resource } => self.sem_wait(pid, resource),
            Instr::Signal { resource } => self.sem_signal(resource),
        }
    }

    fn lookup(&self, pid: Pid, var: &str) -> Option<String> {
        self.table
            .get(pid)
            .and_then(|proc| proc.vars.get(var))
            .map(str::to_string)
    }

    /// Acquire the resource or block the caller on it.
    fn sem_wait(&mut self, pid: Pid, res: ResourceId) {
        if self.resources.try_acquire(res) {
            return;
        }

        match self.table.get_mut(pid) {
            Some(proc) => {
                proc.pcb.state = ProcessState::Blocked;
                proc.pcb.waiting_for = Some(res);
            }
            None => return,
        }
        if self.blocked.push_back(pid).is_err() {
            self.queue_overflows += 1;
            self.trace.push(TraceEvent::QueueOverflow { pid: pid.get() });
        }
        self.trace.push(TraceEvent::ProcessBlocked {
            pid: pid.get(),
            resource: res,
        });
    }

    /// Free the resource and wake every process waiting on it.
    ///
    /// One pass over the blocked queue using the pop/push idiom: matching
    /// waiters move to the ready tail in blocked-queue order, the rest are
    /// re-appended in place. The woken processes re-arbitrate for the lock
    /// on their next turn; the lock is not handed to any one of them.
    fn sem_signal(&mut self, res: ResourceId) {
        self.resources.release(res);

        let scan = self.blocked.len();
        for _ in 0..scan {
            let pid = match self.blocked.pop_front() {
                Some(pid) => pid,
                None => break,
            };
            let waits_here = self
                .table
                .get(pid)
                .map(|proc| proc.pcb.waiting_for == Some(res))
                .unwrap_or(false);

            if waits_here {
                let quantum = self.cfg.time_quantum;
                if let Some(proc) = self.table.get_mut(pid) {
                    proc.pcb.state = ProcessState::Ready;
                    proc.pcb.waiting_for = None;
                    proc.pcb.cycles_remaining = quantum;
                }
                if self.ready.push_back(pid).is_err() {
                    self.queue_overflows += 1;
                    self.trace.push(TraceEvent::QueueOverflow { pid: pid.get() });
                }
                self.trace.push(TraceEvent::ProcessWoken {
                    pid: pid.get(),
                    resource: res,
                });
            } else if self.blocked.push_back(pid).is_err() {
                self.queue_overflows += 1;
                self.trace.push(TraceEvent::QueueOverflow { pid: pid.get() });
            }
        }
    }

    /// Record an io fault and finish the process on its current turn.
    fn fault_process(&mut self, pid: Pid, detail: String) {
        if let Some(proc) = self.table.get_mut(pid) {
            proc.pcb.fault = Some(detail);
            proc.pcb.state = ProcessState::Finished;
        }
    }

    /// Retire a finished process: out of storage, counted, deallocated.
    fn finish_process(&mut self, pid: Pid, io: &mut dyn IoPort) {
        let scan = self.storage.len();
        for _ in 0..scan {
            match self.storage.pop_front() {
                Some(other) if other == pid => {}
                // Re-append cannot fail: a slot was just freed by the pop.
                Some(other) => {
                    let _ = self.storage.push_back(other);
                }
                None => break,
            }
        }

        let tick = self.clock.now_ticks();
        let faulted = self
            .table
            .get(pid)
            .map(|proc| proc.pcb.fault.is_some())
            .unwrap_or(false);
        if faulted {
            self.faulted += 1;
            self.trace.push(TraceEvent::ProcessFaulted {
                pid: pid.get(),
                tick,
            });
        } else {
            self.finished += 1;
            self.trace.push(TraceEvent::ProcessFinished {
                pid: pid.get(),
                tick,
            });
        }

        if self.cfg.show_queues {
            io.emit(&format!("Process {pid} has finished execution."));
        }

        self.table.remove(pid);
    }

    fn report(&self, outcome: RunOutcome) -> RunReport {
        RunReport {
            outcome,
            final_tick: self.clock.now_ticks(),
            executed: self.executed,
            finished: self.finished,
            faulted: self.faulted,
            never_admitted: self.pending.len() as u32,
            queue_overflows: self.queue_overflows,
            var_overflows: self.var_overflows,
            truncated_lines: self.truncated_lines,
            trace: self.trace.dump(),
        }
    }

    /// Snapshot of the ready queue, front to back.
    pub fn ready_snapshot(&self) -> QueueSnapshot {
        self.queue_snapshot("Ready", &self.ready)
    }

    /// Snapshot of the blocked queue, front to back.
    pub fn blocked_snapshot(&self) -> QueueSnapshot {
        self.queue_snapshot("Blocked", &self.blocked)
    }

    fn queue_snapshot(
        &self,
        name: &'static str,
        queue: &BoundedQueue<Pid, MAX_PROCESSES>,
    ) -> QueueSnapshot {
        let rows = queue
            .iter()
            .map(|&pid| QueueRow {
                pid: pid.get(),
                line: self
                    .table
                    .get(pid)
                    .and_then(|proc| proc.pending_line())
                    .unwrap_or("")
                    .to_string(),
            })
            .collect();
        QueueSnapshot { name, rows }
    }

    /// Snapshot of every admitted process's remaining instructions.
    pub fn storage_snapshot(&self) -> StorageSnapshot {
        let mut rows = Vec::new();
        for &pid in self.storage.iter() {
            if let Some(proc) = self.table.get(pid) {
                for line in proc.pending_lines() {
                    rows.push(QueueRow {
                        pid: pid.get(),
                        line: line.to_string(),
                    });
                }
            }
        }
        StorageSnapshot { rows }
    }

    fn emit_tables(&self, io: &mut dyn IoPort) {
        io.emit(&self.ready_snapshot().to_string());
        io.emit(&self.blocked_snapshot().to_string());
        io.emit(&self.storage_snapshot().to_string());
    }
}
