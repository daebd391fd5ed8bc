//! Property tests for round-robin fairness.
//!
//! For any set of straight-line programs admitted together, the execution
//! order should match a naive rotation model: admission order, one
//! instruction per pass, processes dropping out as they finish.

use std::collections::VecDeque;

use proptest::prelude::*;

use schedsim_rs::{Kernel, KernelConfig, LoadedProgram, RunOutcome, SimIo, TraceEvent};

proptest! {
    #[test]
    fn admission_order_rotation(counts in proptest::collection::vec(1usize..8, 1..5)) {
        let mut kernel = Kernel::new(KernelConfig::default());
        for count in &counts {
            let lines: Vec<String> = (0..*count).map(|i| format!("assign a {i}")).collect();
            kernel.spawn(0, LoadedProgram::from_lines(&lines)).unwrap();
        }

        let mut io = SimIo::new();
        let report = kernel.run(&mut io);
        prop_assert_eq!(&report.outcome, &RunOutcome::Completed);

        let mut model: VecDeque<(u32, usize)> = counts
            .iter()
            .enumerate()
            .map(|(i, count)| ((i + 1) as u32, *count))
            .collect();
        let mut expected = Vec::new();
        while let Some((pid, remaining)) = model.pop_front() {
            expected.push(pid);
            if remaining > 1 {
                model.push_back((pid, remaining - 1));
            }
        }

        let actual: Vec<u32> = report
            .trace
            .iter()
            .filter_map(|ev| match ev {
                TraceEvent::InstrExecuted { pid, .. } => Some(*pid),
                _ => None,
            })
            .collect();
        prop_assert_eq!(actual, expected);
    }
}
