// Unless explicitly stated otherwise all files in this repository are licensed
// under the MIT/Apache-2.0 License, at your convenience
//
use std::fmt;

/// The single error kind this crate produces.
///
/// Every operation invoked on a queue that has already been (or concurrently
/// becomes) shut down terminates with this error, carrying whatever causes
/// were passed to [`crate::Queue::shutdown_with`]. This is not a failure of
/// the queue itself — it is the contract for quiescence (see the crate-level
/// docs on shutdown semantics).
pub struct Shutdown<C> {
    causes: Vec<C>,
}

impl<C> Shutdown<C> {
    pub(crate) fn new(causes: Vec<C>) -> Self {
        Self { causes }
    }

    /// The causes attached to the shutdown, in the order they were supplied.
    pub fn causes(&self) -> &[C] {
        &self.causes
    }

    /// Consumes the error, returning its causes.
    pub fn into_causes(self) -> Vec<C> {
        self.causes
    }
}

impl<C> Clone for Shutdown<C>
where
    C: Clone,
{
    fn clone(&self) -> Self {
        Self {
            causes: self.causes.clone(),
        }
    }
}

impl<C> PartialEq for Shutdown<C>
where
    C: PartialEq,
{
    fn eq(&self, other: &Self) -> bool {
        self.causes == other.causes
    }
}

impl<C> fmt::Debug for Shutdown<C>
where
    C: fmt::Debug,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Shutdown").field("causes", &self.causes).finish()
    }
}

impl<C> fmt::Display for Shutdown<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.causes.is_empty() {
            write!(f, "queue shut down with no cause")
        } else {
            write!(f, "queue shut down with {} cause(s)", self.causes.len())
        }
    }
}

impl<C> std::error::Error for Shutdown<C> where C: fmt::Debug {}
