//! Read-only queue and storage snapshots with table rendering.
//!
//! Presentation only: snapshots are built from queue iteration and consumed
//! by the CLI's `--show-queues` mode. The core never depends on them.

use std::fmt;

/// One row: a process and the instruction text it is currently at.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct QueueRow {
    pub pid: u32,
    pub line: String,
}

/// Snapshot of a process queue, front to back.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct QueueSnapshot {
    pub name: &'static str,
    pub rows: Vec<QueueRow>,
}

const BORDER: &str = "+------------+-----------------------+";

impl fmt::Display for QueueSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{} Queue:", self.name)?;
        writeln!(f, "{BORDER}")?;
        writeln!(f, "| Process ID | Current Instruction   |")?;
        writeln!(f, "{BORDER}")?;
        for row in &self.rows {
            writeln!(f, "| {:<10} | {:<21} |", row.pid, row.line)?;
        }
        write!(f, "{BORDER}")
    }
}

/// Snapshot of every admitted process's remaining instructions.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StorageSnapshot {
    pub rows: Vec<QueueRow>,
}

impl fmt::Display for StorageSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Memory Contents:")?;
        writeln!(f, "{BORDER}")?;
        writeln!(f, "| Process ID | Instructions          |")?;
        writeln!(f, "{BORDER}")?;
        for row in &self.rows {
            writeln!(f, "| {:<10} | {:<21} |", row.pid, row.line)?;
        }
        write!(f, "{BORDER}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn renders_rows_between_borders() {
        let snap = QueueSnapshot {
            name: "Ready",
            rows: vec![
                QueueRow {
                    pid: 1,
                    line: "print x".to_string(),
                },
                QueueRow {
                    pid: 2,
                    line: "assign y 2".to_string(),
                },
            ],
        };

        let rendered = snap.to_string();
        assert!(rendered.starts_with("Ready Queue:\n"));
        assert!(rendered.contains(&format!("| {:<10} | {:<21} |", 1, "print x")));
        assert!(rendered.contains(&format!("| {:<10} | {:<21} |", 2, "assign y 2")));
        assert!(rendered.ends_with(BORDER));
    }

    #[test]
    fn empty_queue_renders_headers_only() {
        let snap = QueueSnapshot {
            name: "Blocked",
            rows: Vec::new(),
        };
        let rendered = snap.to_string();
        assert_eq!(rendered.matches(BORDER).count(), 3);
    }
}
