//! Property tests for the bounded FIFO queue.
//!
//! The queue should match a naive `VecDeque` reference model under any
//! interleaving of pushes and pops, with pushes past capacity rejected.

use std::collections::VecDeque;

use proptest::prelude::*;

use schedsim_rs::stdx::BoundedQueue;

const CAP: usize = 8;

#[derive(Clone, Debug)]
enum Op {
    Push(u8),
    Pop,
}

fn op_strategy() -> impl Strategy<Value = Op> {
    prop_oneof![any::<u8>().prop_map(Op::Push), Just(Op::Pop)]
}

proptest! {
    #[test]
    fn matches_a_bounded_vecdeque(ops in proptest::collection::vec(op_strategy(), 0..200)) {
        let mut queue: BoundedQueue<u8, CAP> = BoundedQueue::new();
        let mut model: VecDeque<u8> = VecDeque::new();

        for op in ops {
            match op {
                Op::Push(value) => {
                    let accepted = queue.push_back(value).is_ok();
                    if model.len() < CAP {
                        model.push_back(value);
                        prop_assert!(accepted);
                    } else {
                        prop_assert!(!accepted);
                    }
                }
                Op::Pop => {
                    prop_assert_eq!(queue.pop_front(), model.pop_front());
                }
            }

            prop_assert_eq!(queue.len(), model.len());
            prop_assert_eq!(queue.is_empty(), model.is_empty());
            prop_assert_eq!(queue.is_full(), model.len() == CAP);
        }

        let remaining: Vec<u8> = queue.iter().copied().collect();
        let expected: Vec<u8> = model.iter().copied().collect();
        prop_assert_eq!(remaining, expected);
    }
}
