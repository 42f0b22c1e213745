// Unless explicitly stated otherwise all files in this repository are licensed
// under the MIT/Apache-2.0 License, at your convenience
//
use std::collections::VecDeque;

use crate::queue::waiter::{Putter, Taker};

/// The queue's closed sum-typed state machine (DN-1): a tagged discriminant
/// plus payload, not a class hierarchy. All transition logic in
/// [`crate::queue::Queue`] is exhaustive over this enum.
pub(crate) enum State<A, C> {
    /// Buffer holds values waiting to be taken (`0 <= buffer.len() <= capacity`).
    /// If `putters` is non-empty, every putter is blocked because its payload
    /// would not fit entirely; each putter carries only the suffix that did
    /// not fit (I1, I4).
    Surplus {
        buffer: VecDeque<A>,
        putters: VecDeque<Putter<A, C>>,
    },
    /// The buffer is conceptually empty and at least one consumer is waiting.
    Deficit { takers: VecDeque<Taker<A, C>> },
    /// Terminal. All further operations terminate with `causes` (I3).
    Shutdown { causes: Vec<C> },
}

impl<A, C> State<A, C> {
    pub(crate) fn empty_surplus() -> Self {
        State::Surplus {
            buffer: VecDeque::new(),
            putters: VecDeque::new(),
        }
    }

    /// The `size()` accounting from the data model: buffered count in
    /// `Surplus` (including putter-held remainders), negative taker count in
    /// `Deficit`.
    pub(crate) fn size(&self) -> Option<isize> {
        match self {
            State::Surplus { buffer, putters } => {
                let held: usize = putters.iter().map(|p| p.remaining.len()).sum();
                Some((buffer.len() + held) as isize)
            }
            State::Deficit { takers } => Some(-(takers.len() as isize)),
            State::Shutdown { .. } => None,
        }
    }

    pub(crate) fn is_shutdown(&self) -> bool {
        matches!(self, State::Shutdown { .. })
    }
}
