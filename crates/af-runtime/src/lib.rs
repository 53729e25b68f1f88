//! # af-runtime
//!
//! Executes synthesized accessors so their concurrency behavior can be tested.
//!
//! Lazy accessors store their cached value in an [`AtomicHolder`]: a single
//! atomic slot with release/acquire publication and a monitor for the
//! `synchronized` section. Many threads may call the same accessor on one
//! instance; the initializer runs at most once per successful publication.
//!
//! Under `RUSTFLAGS="--cfg loom"` the holder, heap and instance locks switch to
//! loom's primitives so the double-checked locking can be explored exhaustively.

pub mod error;
pub mod heap;
pub mod interp;
mod sync;
pub mod value;

pub use error::ExecError;
pub use heap::{AtomicHolder, Heap, HeapObject, Instance};
pub use interp::{Host, NoHost, Runtime};
pub use value::{ObjId, Value};
