// Unless explicitly stated otherwise all files in this repository are licensed
// under the MIT/Apache-2.0 License, at your convenience
//
//! The bounded, many-producer/many-consumer rendezvous queue.
//!
//! See the crate-level docs for the overall contract. This module holds the
//! [`Queue`] type itself; [`state`] holds the closed sum-typed state machine
//! it swaps atomically, [`waiter`] holds the suspended-waiter bookkeeping,
//! and [`cell`] is the thin adapter over the lock that backs the atomic
//! state cell.

mod cell;
mod state;
mod waiter;

use std::collections::VecDeque;

use futures::channel::oneshot;

use crate::error::Shutdown;
use cell::AtomicCell;
use state::State;
use waiter::{remove_by_id, IdSource, Putter, Taker, WaiterId};

/// An asynchronous, bounded, many-producer/many-consumer queue.
///
/// Producers call [`offer`](Queue::offer) or [`offer_all`](Queue::offer_all);
/// consumers call [`take`](Queue::take), [`take_all`](Queue::take_all), or
/// [`take_up_to`](Queue::take_up_to). When full, offers suspend until space
/// opens up; when empty, takes suspend until a value (or a putter's payload)
/// arrives. [`shutdown`](Queue::shutdown) interrupts every suspended waiter
/// and makes every subsequent operation terminate with the supplied causes.
///
/// A `Queue` is not itself cheaply cloneable; share one across tasks behind
/// an `Arc`, the same way you would any other shared-state primitive that
/// isn't internally reference-counted.
pub struct Queue<A, C> {
    capacity: usize,
    state: AtomicCell<State<A, C>>,
    ids: IdSource,
}

impl<A, C> Queue<A, C>
where
    C: Clone,
{
    /// Constructs a queue that holds at most `capacity` buffered values.
    ///
    /// # Panics
    ///
    /// Panics if `capacity == 0` — a zero-capacity queue isn't a programmer
    /// mistake we can route through the normal error path, since it isn't a
    /// runtime condition; it can only ever be a construction-time bug.
    pub fn bounded(capacity: usize) -> Self {
        assert!(capacity > 0, "queue capacity must be positive, got {capacity}");
        Self {
            capacity,
            state: AtomicCell::new(State::empty_surplus()),
            ids: IdSource::new(),
        }
    }

    /// Constructs a queue with no practical capacity bound. Offers to an
    /// unbounded queue never suspend.
    pub fn unbounded() -> Self {
        Self::bounded(usize::MAX)
    }

    /// The capacity this queue was constructed with.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// `true` once [`shutdown`](Queue::shutdown) has completed.
    pub fn is_shutdown(&self) -> bool {
        self.state.modify(|state| state.is_shutdown())
    }

    /// The current size: buffered values plus values still held by suspended
    /// putters, or the negated count of suspended takers if the queue is in
    /// deficit. Terminates with the stored causes once shut down.
    pub fn size(&self) -> Result<isize, Shutdown<C>> {
        self.state.modify(|state| {
            state.size().ok_or_else(|| match state {
                State::Shutdown { causes } => Shutdown::new(causes.clone()),
                _ => unreachable!("size() only returns None for the Shutdown variant"),
            })
        })
    }

    /// Offers a single value. Equivalent to `offer_all(vec![value])`.
    pub async fn offer(&self, value: A) -> Result<(), Shutdown<C>>
    where
        A: Send,
        C: Send,
    {
        let mut values = VecDeque::with_capacity(1);
        values.push_back(value);
        self.offer_all_deque(values).await
    }

    /// Offers a batch of values, all-or-nothing with respect to ordering:
    /// the batch is accepted in order, split across the buffer and (if it
    /// doesn't fully fit) a suspended putter, but never reordered or
    /// partially visible out of order.
    ///
    /// Completes once every value in `values` has been buffered or handed
    /// directly to a waiting consumer. May suspend if the queue is full.
    pub async fn offer_all(&self, values: Vec<A>) -> Result<(), Shutdown<C>>
    where
        A: Send,
        C: Send,
    {
        self.offer_all_deque(values.into()).await
    }

    async fn offer_all_deque(&self, mut values: VecDeque<A>) -> Result<(), Shutdown<C>>
    where
        A: Send,
        C: Send,
    {
        enum Outcome<A, C> {
            Ready(Result<(), Shutdown<C>>),
            Suspended(WaiterId, oneshot::Receiver<Result<(), Shutdown<C>>>),
        }

        type Handoffs<A, C> = Vec<(oneshot::Sender<Result<A, Shutdown<C>>>, A)>;

        let (outcome, handoffs): (Outcome<A, C>, Handoffs<A, C>) = self.state.modify(|state| {
            let current = std::mem::replace(state, State::Shutdown { causes: Vec::new() });
            let (next, outcome, handoffs) = match current {
                State::Shutdown { causes } => (
                    State::Shutdown { causes: causes.clone() },
                    Outcome::Ready(Err(Shutdown::new(causes))),
                    Vec::new(),
                ),
                State::Deficit { mut takers } => {
                    let mut handoffs = Vec::new();
                    while !values.is_empty() {
                        match takers.pop_front() {
                            Some(taker) => {
                                let v = values.pop_front().expect("loop guarded by is_empty check");
                                handoffs.push((taker.cell, v));
                            }
                            None => break,
                        }
                    }
                    if !takers.is_empty() {
                        // every offered value was absorbed by a taker
                        (State::Deficit { takers }, Outcome::Ready(Ok(())), handoffs)
                    } else if values.is_empty() {
                        (State::empty_surplus(), Outcome::Ready(Ok(())), handoffs)
                    } else {
                        let split = self.capacity.min(values.len());
                        let fit: VecDeque<A> = values.drain(..split).collect();
                        if values.is_empty() {
                            (
                                State::Surplus { buffer: fit, putters: VecDeque::new() },
                                Outcome::Ready(Ok(())),
                                handoffs,
                            )
                        } else {
                            let (done, rx) = oneshot::channel();
                            let id = self.ids.next();
                            let overflow = std::mem::take(&mut values);
                            let mut putters = VecDeque::new();
                            putters.push_back(Putter { id, remaining: overflow, done });
                            (
                                State::Surplus { buffer: fit, putters },
                                Outcome::Suspended(id, rx),
                                handoffs,
                            )
                        }
                    }
                }
                State::Surplus { mut buffer, mut putters } => {
                    let room = self.capacity.saturating_sub(buffer.len());
                    let split = room.min(values.len());
                    let fit: VecDeque<A> = values.drain(..split).collect();
                    buffer.extend(fit);
                    if values.is_empty() {
                        (State::Surplus { buffer, putters }, Outcome::Ready(Ok(())), Vec::new())
                    } else {
                        let (done, rx) = oneshot::channel();
                        let id = self.ids.next();
                        let overflow = std::mem::take(&mut values);
                        putters.push_back(Putter { id, remaining: overflow, done });
                        (State::Surplus { buffer, putters }, Outcome::Suspended(id, rx), Vec::new())
                    }
                }
            };
            *state = next;
            (outcome, handoffs)
        });

        for (cell, value) in handoffs {
            // Losing this race (receiver already gone) is the "modulo
            // in-flight handoffs" slack the conservation property allows.
            let _ = cell.send(Ok(value));
        }

        match outcome {
            Outcome::Ready(result) => {
                tracing::trace!(ok = result.is_ok(), "offer_all settled without suspending");
                result
            }
            Outcome::Suspended(id, rx) => {
                tracing::trace!(waiter = id.0, "offer_all suspended on a full queue");
                let _guard = ReleaseGuard::putter(self, id);
                rx.await
                    .expect("a putter's completion cell is always resolved before being dropped")
            }
        }
    }

    /// Withdraws the next value in FIFO order. Suspends if the queue is
    /// empty.
    pub async fn take(&self) -> Result<A, Shutdown<C>>
    where
        A: Send,
        C: Send,
    {
        enum Outcome<A, C> {
            Ready(Result<A, Shutdown<C>>),
            Suspended(WaiterId, oneshot::Receiver<Result<A, Shutdown<C>>>),
        }

        type Completions<C> = Vec<oneshot::Sender<Result<(), Shutdown<C>>>>;

        let (outcome, completions): (Outcome<A, C>, Completions<C>) = self.state.modify(|state| {
            let current = std::mem::replace(state, State::Shutdown { causes: Vec::new() });
            let (next, outcome, completions) = match current {
                State::Shutdown { causes } => (
                    State::Shutdown { causes: causes.clone() },
                    Outcome::Ready(Err(Shutdown::new(causes))),
                    Vec::new(),
                ),
                State::Deficit { mut takers } => {
                    let (cell, rx) = oneshot::channel();
                    let id = self.ids.next();
                    takers.push_back(Taker { id, cell });
                    (State::Deficit { takers }, Outcome::Suspended(id, rx), Vec::new())
                }
                State::Surplus { mut buffer, mut putters } => {
                    if let Some(v) = buffer.pop_front() {
                        // A slot just freed up: promote putters' payloads
                        // into it (and any further slots that closes up),
                        // in FIFO order, before handing `v` back (S2; DN-2).
                        let completions = refill_from_putters(&mut buffer, &mut putters, self.capacity);
                        (State::Surplus { buffer, putters }, Outcome::Ready(Ok(v)), completions)
                    } else {
                        // I1 (tightened): putters are only ever non-empty
                        // alongside a full buffer, and every operation that
                        // frees buffer room refills from putters in the same
                        // swap — so an empty buffer implies putters is empty
                        // too, and there's nothing to do but suspend.
                        let (cell, rx) = oneshot::channel();
                        let id = self.ids.next();
                        let mut takers = VecDeque::new();
                        takers.push_back(Taker { id, cell });
                        (State::Deficit { takers }, Outcome::Suspended(id, rx), Vec::new())
                    }
                }
            };
            *state = next;
            (outcome, completions)
        });

        for cell in completions {
            let _ = cell.send(Ok(()));
        }

        match outcome {
            Outcome::Ready(result) => result,
            Outcome::Suspended(id, rx) => {
                tracing::trace!(waiter = id.0, "take suspended on an empty queue");
                let _guard = ReleaseGuard::taker(self, id);
                rx.await
                    .expect("a taker's completion cell is always resolved before being dropped")
            }
        }
    }

    /// Drains the entire buffer without suspending, then promotes any
    /// putters' payloads into the freed room (see [`refill_from_putters`]).
    pub fn take_all(&self) -> Result<Vec<A>, Shutdown<C>> {
        let (result, completions) = self.state.modify(|state| match state {
            State::Surplus { buffer, putters } => {
                let drained = std::mem::take(buffer).into_iter().collect();
                let completions = refill_from_putters(buffer, putters, self.capacity);
                (Ok(drained), completions)
            }
            State::Deficit { .. } => (Ok(Vec::new()), Vec::new()),
            State::Shutdown { causes } => (Err(Shutdown::new(causes.clone())), Vec::new()),
        });

        for cell in completions {
            let _ = cell.send(Ok(()));
        }
        result
    }

    /// Drains up to `max` values from the buffer without suspending, then
    /// promotes any putters' payloads into the freed room (see
    /// [`refill_from_putters`]).
    pub fn take_up_to(&self, max: usize) -> Result<Vec<A>, Shutdown<C>> {
        let (result, completions) = self.state.modify(|state| match state {
            State::Surplus { buffer, putters } => {
                let n = max.min(buffer.len());
                let drained = buffer.drain(..n).collect();
                let completions = refill_from_putters(buffer, putters, self.capacity);
                (Ok(drained), completions)
            }
            State::Deficit { .. } => (Ok(Vec::new()), Vec::new()),
            State::Shutdown { causes } => (Err(Shutdown::new(causes.clone())), Vec::new()),
        });

        for cell in completions {
            let _ = cell.send(Ok(()));
        }
        result
    }

    /// Shuts the queue down with no causes. Equivalent to
    /// `shutdown_with(Vec::new())`.
    pub async fn shutdown(&self) {
        self.shutdown_with(Vec::new()).await
    }

    /// Shuts the queue down, interrupting every suspended waiter with
    /// `causes`. Idempotent: a second call is a no-op. Every operation
    /// invoked afterwards (including a concurrent one already in flight)
    /// terminates with `causes`.
    pub async fn shutdown_with(&self, causes: Vec<C>)
    where
        A: Send,
        C: Send,
    {
        enum Action<A, C> {
            None,
            InterruptPutters(Vec<oneshot::Sender<Result<(), Shutdown<C>>>>),
            InterruptTakers(Vec<oneshot::Sender<Result<A, Shutdown<C>>>>),
        }

        let action = self.state.modify(|state| {
            if state.is_shutdown() {
                return Action::None;
            }
            let current = std::mem::replace(state, State::Shutdown { causes: causes.clone() });
            match current {
                State::Shutdown { .. } => unreachable!("checked is_shutdown above"),
                State::Surplus { putters, .. } if !putters.is_empty() => {
                    Action::InterruptPutters(putters.into_iter().map(|p| p.done).collect())
                }
                State::Surplus { .. } => Action::None,
                State::Deficit { takers } if !takers.is_empty() => {
                    Action::InterruptTakers(takers.into_iter().map(|t| t.cell).collect())
                }
                State::Deficit { .. } => Action::None,
            }
        });

        match action {
            Action::None => {}
            Action::InterruptPutters(cells) => {
                tracing::debug!(count = cells.len(), "shutdown interrupting suspended putters");
                for cell in cells {
                    let _ = cell.send(Err(Shutdown::new(causes.clone())));
                }
            }
            Action::InterruptTakers(cells) => {
                tracing::debug!(count = cells.len(), "shutdown interrupting suspended takers");
                for cell in cells {
                    let _ = cell.send(Err(Shutdown::new(causes.clone())));
                }
            }
        }
    }
}

/// Pulls values out of the head putters' remaining payloads to refill
/// `buffer` up to `capacity`, in FIFO order across putters, after a `take`,
/// `take_all`, or `take_up_to` has freed room in it. Any putter whose
/// payload is fully delivered is removed from `putters` and its `done`
/// cell returned, to be completed by the caller once the state lock is
/// released (never from inside `modify`).
fn refill_from_putters<A, C>(
    buffer: &mut VecDeque<A>,
    putters: &mut VecDeque<Putter<A, C>>,
    capacity: usize,
) -> Vec<oneshot::Sender<Result<(), Shutdown<C>>>> {
    let mut completed = Vec::new();
    while buffer.len() < capacity {
        let Some(putter) = putters.front_mut() else { break };
        let Some(v) = putter.remaining.pop_front() else { break };
        buffer.push_back(v);
        if putter.remaining.is_empty() {
            let putter = putters.pop_front().expect("front_mut just returned Some above");
            completed.push(putter.done);
        }
    }
    completed
}

enum WaiterKind {
    Putter,
    Taker,
}

/// The release half of the acquire/release bracket (§4.1): held across the
/// `.await` on a suspended waiter's completion cell, and prunes that
/// waiter's entry from the state on drop — whether the drop happens because
/// the future resolved normally or because the awaiting task was cancelled.
struct ReleaseGuard<'q, A, C> {
    queue: &'q Queue<A, C>,
    id: WaiterId,
    kind: WaiterKind,
}

impl<'q, A, C> ReleaseGuard<'q, A, C>
where
    C: Clone,
{
    fn putter(queue: &'q Queue<A, C>, id: WaiterId) -> Self {
        Self { queue, id, kind: WaiterKind::Putter }
    }

    fn taker(queue: &'q Queue<A, C>, id: WaiterId) -> Self {
        Self { queue, id, kind: WaiterKind::Taker }
    }
}

impl<'q, A, C> Drop for ReleaseGuard<'q, A, C>
where
    C: Clone,
{
    fn drop(&mut self) {
        self.queue.state.modify(|state| match (state, &self.kind) {
            (State::Surplus { putters, .. }, WaiterKind::Putter) => {
                remove_by_id(putters, self.id, |p| p.id);
            }
            (State::Deficit { takers }, WaiterKind::Taker) => {
                remove_by_id(takers, self.id, |t| t.id);
            }
            _ => {
                // Already shut down, or already completed and removed by
                // whichever operation resolved it — nothing to prune.
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bounded_rejects_zero_capacity() {
        let result = std::panic::catch_unwind(|| Queue::<i32, ()>::bounded(0));
        assert!(result.is_err());
    }

    #[test]
    fn fresh_queue_is_empty_and_open() {
        let q = Queue::<i32, ()>::bounded(4);
        assert_eq!(q.size().unwrap(), 0);
        assert!(!q.is_shutdown());
        assert_eq!(q.take_all().unwrap(), Vec::<i32>::new());
    }
}
