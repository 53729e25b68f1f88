//! Stateright model of a lazy accessor's double-checked locking.
//!
//! Each thread runs the generated getter once:
//!
//! ```text
//! value = holder.get()                       // OuterLoad
//! if value == null {
//!     synchronized (holder) {                // Acquire
//!         value = holder.get()               // InnerLoad
//!         if value == null {
//!             actual = <initializer>         // Evaluate
//!             holder.set(encode(actual))     // Publish
//!         }
//!     }                                      // Release
//! }
//! return decode(value)
//! ```
//!
//! Only the monitor owner writes the holder, so the steps inside the
//! monitor interleave with other threads' outer loads and acquires only.

use std::collections::{BTreeMap, BTreeSet};

use stateright::Model;

/// Unique identifier for a thread.
pub type ThreadId = u64;

/// Contents of the holder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Slot {
    Empty,
    /// A non-null result, identified by the evaluation that produced it.
    Value(u64),
    /// The holder's own reference, standing for a cached `null`.
    Sentinel,
}

impl Slot {
    /// The cached result, `None` while nothing is cached.
    #[must_use]
    pub fn cached(self) -> Option<Option<u64>> {
        match self {
            Slot::Empty => None,
            Slot::Value(v) => Some(Some(v)),
            Slot::Sentinel => Some(None),
        }
    }
}

/// Where a thread is inside the getter.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ThreadState {
    Start,
    AwaitLock,
    Locked,
    /// Holding the monitor, inner load saw an empty holder.
    Checked,
    Computed { result: Option<u64> },
    Releasing { result: Option<u64> },
    Done { result: Option<u64> },
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DclState {
    pub slot: Slot,
    pub lock_owner: Option<ThreadId>,
    /// Number of times the initializer ran.
    pub evaluations: u64,
    pub threads: BTreeMap<ThreadId, ThreadState>,
}

impl DclState {
    pub fn new(threads_count: u64) -> Self {
        debug_assert!(threads_count > 0, "Must have at least one thread");
        debug_assert!(threads_count <= 6, "Model checking with many threads is slow");

        Self {
            slot: Slot::Empty,
            lock_owner: None,
            evaluations: 0,
            threads: (0..threads_count).map(|tid| (tid, ThreadState::Start)).collect(),
        }
    }

    fn results(&self) -> impl Iterator<Item = Option<u64>> + '_ {
        self.threads.values().filter_map(|t| match t {
            ThreadState::Done { result } => Some(*result),
            _ => None,
        })
    }

    pub fn at_most_one_evaluation(&self) -> bool {
        self.evaluations <= 1
    }

    /// Every finished thread returned the same object.
    pub fn agreed_result(&self) -> bool {
        self.results().collect::<BTreeSet<_>>().len() <= 1
    }

    /// Once a caller has returned a cached `null`, the holder is not empty.
    pub fn cached_null_stable(&self) -> bool {
        !(self.results().any(|r| r.is_none()) && self.slot == Slot::Empty)
    }

    pub fn all_done(&self) -> bool {
        self.threads.values().all(|t| matches!(t, ThreadState::Done { .. }))
    }

    pub fn invariants_hold(&self) -> bool {
        self.at_most_one_evaluation() && self.agreed_result() && self.cached_null_stable()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum DclAction {
    OuterLoad { thread: ThreadId },
    Acquire { thread: ThreadId },
    InnerLoad { thread: ThreadId },
    Evaluate { thread: ThreadId },
    Publish { thread: ThreadId },
    Release { thread: ThreadId },
}

/// Bounded model of concurrent first calls to one lazy getter.
#[derive(Debug, Clone)]
pub struct DclModel {
    pub threads_count: u64,
    /// The initializer evaluates to `null`.
    pub null_result: bool,
    /// Re-read the holder after acquiring the monitor.
    pub inner_check: bool,
    /// Store the holder itself for a `null` result instead of leaving it empty.
    pub use_sentinel: bool,
}

impl DclModel {
    /// The protocol as generated.
    pub fn new(threads_count: u64) -> Self {
        debug_assert!(threads_count > 0);

        Self {
            threads_count,
            null_result: false,
            inner_check: true,
            use_sentinel: true,
        }
    }

    #[must_use]
    pub fn returning_null(mut self) -> Self {
        self.null_result = true;
        self
    }

    #[must_use]
    pub fn without_inner_check(mut self) -> Self {
        self.inner_check = false;
        self
    }

    #[must_use]
    pub fn without_sentinel(mut self) -> Self {
        self.use_sentinel = false;
        self
    }

    fn encode(&self, result: Option<u64>) -> Slot {
        match result {
            Some(v) => Slot::Value(v),
            None if self.use_sentinel => Slot::Sentinel,
            None => Slot::Empty,
        }
    }
}

impl Model for DclModel {
    type State = DclState;
    type Action = DclAction;

    fn init_states(&self) -> Vec<Self::State> {
        vec![DclState::new(self.threads_count)]
    }

    fn actions(&self, state: &Self::State, actions: &mut Vec<Self::Action>) {
        for (&thread, thread_state) in &state.threads {
            match thread_state {
                ThreadState::Start => actions.push(DclAction::OuterLoad { thread }),
                ThreadState::AwaitLock => {
                    if state.lock_owner.is_none() {
                        actions.push(DclAction::Acquire { thread });
                    }
                }
                ThreadState::Locked if self.inner_check => actions.push(DclAction::InnerLoad { thread }),
                ThreadState::Locked | ThreadState::Checked => actions.push(DclAction::Evaluate { thread }),
                ThreadState::Computed { .. } => actions.push(DclAction::Publish { thread }),
                ThreadState::Releasing { .. } => actions.push(DclAction::Release { thread }),
                ThreadState::Done { .. } => {}
            }
        }
    }

    fn next_state(&self, state: &Self::State, action: Self::Action) -> Option<Self::State> {
        let mut next = state.clone();

        match action {
            DclAction::OuterLoad { thread } => {
                let after = match next.slot.cached() {
                    Some(result) => ThreadState::Done { result },
                    None => ThreadState::AwaitLock,
                };
                next.threads.insert(thread, after);
            }

            DclAction::Acquire { thread } => {
                if next.lock_owner.is_some() {
                    return None;
                }
                next.lock_owner = Some(thread);
                next.threads.insert(thread, ThreadState::Locked);
            }

            DclAction::InnerLoad { thread } => {
                let after = match next.slot.cached() {
                    Some(result) => ThreadState::Releasing { result },
                    None => ThreadState::Checked,
                };
                next.threads.insert(thread, after);
            }

            DclAction::Evaluate { thread } => {
                next.evaluations += 1;
                // Each evaluation yields a distinct object.
                let result = if self.null_result { None } else { Some(next.evaluations) };
                next.threads.insert(thread, ThreadState::Computed { result });
            }

            DclAction::Publish { thread } => {
                if let Some(ThreadState::Computed { result }) = next.threads.get(&thread).cloned() {
                    next.slot = self.encode(result);
                    next.threads.insert(thread, ThreadState::Releasing { result });
                }
            }

            DclAction::Release { thread } => {
                if let Some(ThreadState::Releasing { result }) = next.threads.get(&thread).cloned() {
                    debug_assert_eq!(next.lock_owner, Some(thread));
                    next.lock_owner = None;
                    next.threads.insert(thread, ThreadState::Done { result });
                }
            }
        }

        Some(next)
    }

    fn properties(&self) -> Vec<stateright::Property<Self>> {
        vec![
            stateright::Property::always("AtMostOneEvaluation", |_model: &Self, state: &Self::State| {
                state.at_most_one_evaluation()
            }),
            stateright::Property::always("AgreedResult", |_model: &Self, state: &Self::State| {
                state.agreed_result()
            }),
            stateright::Property::always("CachedNullStable", |_model: &Self, state: &Self::State| {
                state.cached_null_stable()
            }),
            stateright::Property::sometimes("AllDone", |_model: &Self, state: &Self::State| {
                state.all_done()
            }),
        ]
    }
}
