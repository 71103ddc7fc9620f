//! Fabrik Core -- the production state machine and buffered resource-flow
//! engine for factory-automation simulations.
//!
//! This crate owns the hard part of the simulation: advancing each machine
//! through its operational lifecycle every step, enforcing recipe legality,
//! managing capacity-bounded intake/output buffers, surviving power
//! interruption without losing mid-cycle progress, and round-tripping all of
//! that state through snapshots. Grid math, placement input, global
//! resource ledgers, and the scheduler that supplies delta-time all live
//! outside and are reached through injected parameters and traits.
//!
//! # Tick Model
//!
//! An external driver calls [`plant::Plant::step`] (or
//! [`machine::MachineInstance::tick`] directly) once per simulation step
//! with a non-negative delta-time in seconds. Each machine:
//!
//! 1. Reconciles interrupt flags (`enabled`, `powered`) with its state.
//! 2. Tries to start a cycle when idle or waiting, using the cached intake
//!    totals (rebuilt lazily after any buffer mutation).
//! 3. Integrates elapsed time into the running cycle and commits finished
//!    cycles all-or-nothing: inputs consumed and outputs produced together,
//!    and only at completion.
//!
//! Everything observable a tick did comes back as a
//! [`machine::TickEffects`] value; the plant mirrors those into a bounded
//! [`event::EventLog`] for collaborators to drain. There are no subscriber
//! callbacks.
//!
//! # Key Types
//!
//! - [`machine::MachineInstance`] -- the per-machine lifecycle state machine.
//! - [`port::Port`] -- capacity-bounded multi-resource buffer.
//! - [`catalog::Catalog`] -- frozen registry of resources, recipes, and
//!   machine types.
//! - [`plant::Plant`] -- machine container, step driver, and event fan-out.
//! - [`snapshot`] -- versioned bitcode persistence with repair-on-load.
//! - [`fixed::Fixed64`] -- Q32.32 fixed-point type for deterministic math.

pub mod catalog;
#[cfg(feature = "data-loader")]
pub mod data_loader;
pub mod event;
pub mod fixed;
pub mod id;
pub mod machine;
pub mod placement;
pub mod plant;
pub mod port;
pub mod recipe;
pub mod snapshot;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;
