//! The machinery behind the `partred` crate that doesn't require the
//! standard library.
//!
//! Everything here is written so that it could run on an accelerator: there
//! are no allocations, and shared state is limited to atomics. The
//! [`Reducer`] trait describes a reduction operation, [`ParticleCollection`]
//! describes the particle hierarchy, and the team abstractions (see
//! [`TeamProps`]) describe how a thread-block folds a tile of particles into
//! a shared accumulator. The std crate provides the executors that drive
//! these pieces.

#![no_std]
mod collection;
mod interpolate;
mod parallel;
mod reduce_utils;
mod reducer;
mod scalar;

pub use collection::{LevelRange, ParticleCollection};
pub use interpolate::{FaceFieldView, FieldView, cic_interpolate, mac_interpolate};
pub use parallel::{
    Executor, LaunchConfig, MAX_MEMBERS_PER_TEAM, SerialTeam, TeamProps, reduce_tile_single_team,
};
pub use reduce_utils::{TreeStep, TreeSteps, fold_grid_stride, fold_slice, tree_reduce, tree_steps};
pub use reducer::{LogicalAnd, LogicalOr, Max, Min, Reducer, Sum};
pub use scalar::{DeviceScalar, ReduceValue, max_of, min_of};
