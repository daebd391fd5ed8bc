//! Small, self-contained data structures used across the project.

pub mod bounded_queue;

pub use bounded_queue::BoundedQueue;
