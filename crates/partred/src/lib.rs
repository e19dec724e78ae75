/*!
Provides parallel reductions over particles stored in a hierarchy of
adaptively refined levels (e.g. the particles of an AMR simulation).

<div class="warning">

This crate is still in early development.

</div>

# High-Level: Particle Reductions

Simulation codes routinely need aggregate statistics of particle data: the
total mass of all particles, the largest particle speed (to pick a
timestep), or whether any particle has left the domain. Each of these boils
down to applying a small function to every particle and combining the
results with a commutative & associative operation.

This crate provides 5 such operations (sum, max, min, logical AND and
logical OR), each over
- the full hierarchy (e.g. [`reduce_sum`]),
- a single level (e.g. [`reduce_sum_level`]), or
- an inclusive range of levels (e.g. [`reduce_sum_levels`]).

A reduction over no particles produces the identity of the operation. For
max and min, the identities (the lowest and highest representable values)
act as "no data" sentinels.

# User Guide

The hierarchy is accessed through the [`ParticleCollection`] trait, so any
container can be reduced over. [`ParticleLevels`] is a simple owning
implementation.

```
use partred::{ParticleLevels, ReduceConfig, reduce_max, reduce_sum};

let mut particles = ParticleLevels::new();
particles.push_tile(0, vec![1.0, 2.0]).unwrap();
let level = particles.add_level();
particles.push_tile(level, vec![3.0, 4.0, 5.0]).unwrap();

let config = ReduceConfig::default();
assert_eq!(reduce_sum(&particles, |p: &f64| *p, &config).unwrap(), 15.0);
assert_eq!(reduce_max(&particles, |p: &f64| *p, &config).unwrap(), 5.0);
```

Reductions run on one of 2 backends, selected with [`ExecutionMode`]:
- the host backend visits the tiles on a rayon thread pool. Setting the
  `deterministic` flag of [`ReduceConfigBuilder`] forces a sequential visit
  in a fixed order, which makes floating-point sums bitwise reproducible.
- the accelerator backend follows the structure of a GPU reduction kernel:
  thread-blocks fold particles with a grid-stride loop, tree-reduce in
  block-shared scratch and atomically combine into a single accumulator.

# Developer Guide

See the crate-level documentation for [`partred_nostd_internal`].

*/

#![deny(rustdoc::broken_intra_doc_links)]

// inform build-system of the crates in this package
mod config;
mod container;
mod error;
mod parallel_device;
mod parallel_host;
mod parallel_threaded;
mod reduce;

// pull in symbols that visible outside of the package
pub use config::{ExecutionMode, ReduceConfig, ReduceConfigBuilder, TeamKind};
pub use container::ParticleLevels;
pub use error::Error;
pub use parallel_device::SimulatedDevice;
pub use parallel_host::HostExecutor;
pub use parallel_threaded::ThreadedTeam;
pub use partred_nostd_internal::{
    Executor, FaceFieldView, FieldView, LaunchConfig, LevelRange, LogicalAnd, LogicalOr, Max, Min,
    ParticleCollection, ReduceValue, Reducer, Sum, TeamProps, cic_interpolate, mac_interpolate,
};
pub use reduce::{
    reduce_logical_and, reduce_logical_and_level, reduce_logical_and_levels, reduce_logical_or,
    reduce_logical_or_level, reduce_logical_or_levels, reduce_max, reduce_max_level,
    reduce_max_levels, reduce_min, reduce_min_level, reduce_min_levels, reduce_sum,
    reduce_sum_level, reduce_sum_levels, reduce_with,
};
