// src/executor/queue.rs
// =============================================================================
// The work queue and the loop that drains it.
//
// How it works:
// 1. The caller builds a WorkQueue from an ordered list of items
// 2. Executor::run pops the front item and awaits the step for it
// 3. The step must consume its Advance token exactly once to return
// 4. Only then is the next item popped
// 5. When the queue is empty, the on_idle callback fires exactly once
//
// There is no global failure state: a step reports failures through its
// own sink and always resumes, so one bad item never halts the queue.
//
// Rust concepts:
// - VecDeque: double-ended queue, pop_front() removes from the start
// - Move semantics: run() takes the queue by value, so it can't be reused
// - Private constructors: Advanced can only be obtained from an Advance
// =============================================================================

use std::collections::VecDeque;

use async_trait::async_trait;
use tracing::{debug, info};

/// An ordered backlog, consumed strictly front-to-back.
///
/// There is no way to reorder or peek past the front; the only mutation is
/// `pop_front`, and only the executor (and the domain prober, for its own
/// inner queues) calls it.
#[derive(Debug, Clone, PartialEq)]
pub struct WorkQueue<T> {
    items: VecDeque<T>,
}

impl<T> WorkQueue<T> {
    pub fn new(items: impl IntoIterator<Item = T>) -> Self {
        Self {
            items: items.into_iter().collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub(crate) fn pop_front(&mut self) -> Option<T> {
        self.items.pop_front()
    }
}

impl<T> Default for WorkQueue<T> {
    fn default() -> Self {
        Self {
            items: VecDeque::new(),
        }
    }
}

impl<T> FromIterator<T> for WorkQueue<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        Self::new(iter)
    }
}

/// Continuation handed to a step. Consuming it is the only way to produce
/// the `Advanced` value a step has to return, so every step resumes the
/// loop exactly once.
#[derive(Debug)]
#[must_use = "a step has to resume the queue"]
pub struct Advance {
    position: usize,
}

impl Advance {
    pub fn resume(self) -> Advanced {
        Advanced {
            position: self.position,
        }
    }

    /// Zero-based position of the item in its queue.
    pub fn position(&self) -> usize {
        self.position
    }
}

/// Proof that a step resumed the loop.
#[derive(Debug)]
pub struct Advanced {
    position: usize,
}

/// One step of a queue: the work done for a single item.
#[async_trait]
pub trait Step<T: Send>: Send {
    async fn step(&mut self, item: T, advance: Advance) -> Advanced;
}

/// What a finished run looked like.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunSummary {
    pub processed: usize,
}

/// Drives one queue at a time. Independent executors (or independent runs of
/// the same executor) share nothing, so several queues can be in flight at
/// once as long as each has its own step.
#[derive(Debug, Clone, Copy)]
pub struct Executor {
    name: &'static str,
}

impl Executor {
    pub fn new(name: &'static str) -> Self {
        Self { name }
    }

    pub async fn run<T, S, F>(&self, mut queue: WorkQueue<T>, step: &mut S, on_idle: F) -> RunSummary
    where
        T: Send,
        S: Step<T> + ?Sized,
        F: FnOnce(&RunSummary),
    {
        info!(queue = self.name, items = queue.len(), "draining queue");

        let mut processed = 0;
        while let Some(item) = queue.pop_front() {
            debug!(queue = self.name, position = processed, remaining = queue.len(), "dispatching item");

            let advanced = step.step(item, Advance { position: processed }).await;
            debug_assert_eq!(advanced.position, processed);
            processed += 1;
        }

        let summary = RunSummary { processed };
        info!(queue = self.name, processed, "queue idle");
        on_idle(&summary);
        summary
    }
}

// -----------------------------------------------------------------------------
// BEGINNER NOTES:
//
// 1. Why a loop instead of recursion?
//    - Each finished item simply lets the `while let` continue
//    - The call stack stays flat no matter how many fields a layer has
//
// 2. How does the type system enforce "advance exactly once"?
//    - A step must return Advanced
//    - Advanced has a private field, so code outside this module can only
//      get one by calling Advance::resume()
//    - resume() takes `self`, so the token is used up after one call
//
// 3. What is `?Sized` on S?
//    - It allows `run` to accept trait objects like `&mut dyn Step<T>`
// -----------------------------------------------------------------------------
