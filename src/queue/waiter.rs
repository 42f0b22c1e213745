// Unless explicitly stated otherwise all files in this repository are licensed
// under the MIT/Apache-2.0 License, at your convenience
//
use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};

use futures::channel::oneshot;

use crate::error::Shutdown;

/// Identifies a single suspended waiter within a queue.
///
/// Assigned once per `offer`/`offer_all`/`take` call that actually suspends,
/// from a per-queue monotonic counter. The release hook uses it to find and
/// remove exactly its own entry from whichever `VecDeque` holds it, since the
/// `oneshot::Sender` half by itself carries no identity we can compare by
/// value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct WaiterId(pub(crate) u64);

#[derive(Debug)]
pub(crate) struct IdSource(AtomicU64);

impl IdSource {
    pub(crate) fn new() -> Self {
        Self(AtomicU64::new(0))
    }

    pub(crate) fn next(&self) -> WaiterId {
        WaiterId(self.0.fetch_add(1, Ordering::Relaxed))
    }
}

/// A consumer suspended because the queue was empty on entry.
pub(crate) struct Taker<A, C> {
    pub(crate) id: WaiterId,
    pub(crate) cell: oneshot::Sender<Result<A, Shutdown<C>>>,
}

/// A producer suspended because its offered values exceeded available
/// capacity. Carries only the suffix that did not fit (I4: always non-empty).
pub(crate) struct Putter<A, C> {
    pub(crate) id: WaiterId,
    pub(crate) remaining: VecDeque<A>,
    pub(crate) done: oneshot::Sender<Result<(), Shutdown<C>>>,
}

/// Removes the waiter with `id` from `list`, if present. No-op otherwise
/// (e.g. it already completed and was removed, or the state has since moved
/// to `Shutdown`).
pub(crate) fn remove_by_id<W>(list: &mut VecDeque<W>, id: WaiterId, id_of: impl Fn(&W) -> WaiterId) {
    if let Some(pos) = list.iter().position(|w| id_of(w) == id) {
        list.remove(pos);
    }
}
