// src/executor/mod.rs
// =============================================================================
// This module drives a queue of work items to completion, one at a time.
//
// Submodules:
// - queue: the WorkQueue type and the Executor loop
//
// The executor is agnostic to what a step does. It pops the front item,
// hands it to the step together with an Advance token, and waits until the
// step gives that token back before touching the queue again.
// =============================================================================

mod queue;

pub use queue::{Advance, Advanced, Executor, RunSummary, Step, WorkQueue};
