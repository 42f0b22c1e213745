// Unless explicitly stated otherwise all files in this repository are licensed
// under the MIT/Apache-2.0 License, at your convenience
//
//! An asynchronous, bounded, many-producer/many-consumer rendezvous queue.
//!
//! Producers [`offer`](Queue::offer) or [`offer_all`](Queue::offer_all)
//! values; consumers [`take`](Queue::take) them out in FIFO order, or drain
//! the buffer in bulk with [`take_all`](Queue::take_all) /
//! [`take_up_to`](Queue::take_up_to). When the queue is full, offers suspend
//! until space opens up; when empty, takes suspend until a value arrives.
//! [`shutdown`](Queue::shutdown) interrupts every suspended waiter and makes
//! every subsequent operation terminate with whatever causes were supplied.
//!
//! ```
//! # futures::executor::block_on(async {
//! use qcore::Queue;
//!
//! let q = Queue::<i32, ()>::bounded(2);
//! q.offer(1).await.unwrap();
//! q.offer(2).await.unwrap();
//! assert_eq!(q.take_all().unwrap(), vec![1, 2]);
//! # });
//! ```
//!
//! This crate implements only the queue's core state machine and wait-list
//! protocol. It builds on, rather than reimplements, an async runtime's
//! task model (any `std::future`-compatible runtime works — nothing here
//! spawns anything), one-shot completion cells (`futures::channel::oneshot`),
//! and an atomic reference cell (a `parking_lot::Mutex`-backed adapter).
//!
//! Out of scope: priority ordering, multi-queue selection/fairness across
//! queues, persistence, and back-pressure signalling beyond producer
//! suspension.

mod error;
mod queue;

pub use error::Shutdown;
pub use queue::Queue;
