//! # af-model
//!
//! Stateright model of the double-checked locking performed by lazy accessors.
//!
//! The model abstracts a generated lazy getter to its atomic steps (outer
//! load, monitor acquire, inner load, evaluate, publish, release) and checks
//! the safety properties the runtime relies on. Disabling the inner check or
//! the null sentinel produces counterexamples.

pub mod dcl;

pub use dcl::{DclAction, DclModel, DclState, Slot, ThreadState};
