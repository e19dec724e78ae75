//! The public reduction entry points.
//!
//! Every operation comes in 3 flavors:
//! - `reduce_<op>` visits every level of the collection
//! - `reduce_<op>_level` visits a single level
//! - `reduce_<op>_levels` visits an inclusive range of levels
//!
//! The first two are thin wrappers around the third. All of them funnel into
//! [`reduce_with`], which validates the level range, dispatches to the
//! configured backend and converts the accumulator into the output value.

use crate::config::{ExecutionMode, ReduceConfig};
use crate::error::Error;
use crate::parallel_device::SimulatedDevice;
use crate::parallel_host::HostExecutor;
use partred_nostd_internal::{
    Executor, LevelRange, LogicalAnd, LogicalOr, Max, Min, ParticleCollection, ReduceValue,
    Reducer, Sum,
};

/// Reduce `f` applied to every particle in levels `level_min..=level_max` of
/// `collection` with the reduction operation `R`.
///
/// When the range holds no particles, the result is `R`'s identity.
///
/// # Errors
/// Returns an error when `level_min > level_max` or when `level_max`
/// exceeds the finest level of `collection`.
pub fn reduce_with<R, C, F>(
    collection: &C,
    level_min: usize,
    level_max: usize,
    f: F,
    config: &ReduceConfig,
) -> Result<R::Output, Error>
where
    R: Reducer,
    C: ParticleCollection + Sync,
    C::Particle: Sync,
    F: Fn(&C::Particle) -> R::Input + Copy + Send + Sync,
{
    let finest_level = collection.finest_level();
    let levels = LevelRange::new(level_min, level_max, finest_level)
        .ok_or_else(|| Error::level_range(level_min, level_max, finest_level))?;

    tracing::debug!(
        op = R::NAME,
        level_min,
        level_max,
        mode = ?config.execution_mode(),
        deterministic = config.deterministic(),
        "starting particle reduction"
    );

    let value = match config.execution_mode() {
        ExecutionMode::Host => {
            HostExecutor::new(config.deterministic(), config.host_pool())
                .drive_reduce::<R, C, F>(collection, levels, f)
        }
        ExecutionMode::Accelerator => SimulatedDevice::new(
            config.particles_per_thread(),
            config.max_threads_per_block(),
            config.max_blocks(),
            config.team_kind(),
        )
        .drive_reduce::<R, C, F>(collection, levels, f),
    }
    .map_err(Error::internal_legacy_adhoc)?;

    tracing::debug!(op = R::NAME, "particle reduction complete");
    Ok(R::finish(value))
}

/// Sum `f` over every particle of every level.
pub fn reduce_sum<C, V, F>(collection: &C, f: F, config: &ReduceConfig) -> Result<V, Error>
where
    C: ParticleCollection + Sync,
    C::Particle: Sync,
    V: ReduceValue,
    F: Fn(&C::Particle) -> V + Copy + Send + Sync,
{
    reduce_with::<Sum<V>, C, F>(collection, 0, collection.finest_level(), f, config)
}

/// Sum `f` over every particle of a single level.
pub fn reduce_sum_level<C, V, F>(
    collection: &C,
    level: usize,
    f: F,
    config: &ReduceConfig,
) -> Result<V, Error>
where
    C: ParticleCollection + Sync,
    C::Particle: Sync,
    V: ReduceValue,
    F: Fn(&C::Particle) -> V + Copy + Send + Sync,
{
    reduce_with::<Sum<V>, C, F>(collection, level, level, f, config)
}

/// Sum `f` over every particle of levels `level_min..=level_max`.
pub fn reduce_sum_levels<C, V, F>(
    collection: &C,
    level_min: usize,
    level_max: usize,
    f: F,
    config: &ReduceConfig,
) -> Result<V, Error>
where
    C: ParticleCollection + Sync,
    C::Particle: Sync,
    V: ReduceValue,
    F: Fn(&C::Particle) -> V + Copy + Send + Sync,
{
    reduce_with::<Sum<V>, C, F>(collection, level_min, level_max, f, config)
}

/// The largest value of `f` over every particle of every level.
///
/// An empty collection produces the lowest representable value of `V`.
pub fn reduce_max<C, V, F>(collection: &C, f: F, config: &ReduceConfig) -> Result<V, Error>
where
    C: ParticleCollection + Sync,
    C::Particle: Sync,
    V: ReduceValue,
    F: Fn(&C::Particle) -> V + Copy + Send + Sync,
{
    reduce_with::<Max<V>, C, F>(collection, 0, collection.finest_level(), f, config)
}

/// The largest value of `f` over every particle of a single level.
pub fn reduce_max_level<C, V, F>(
    collection: &C,
    level: usize,
    f: F,
    config: &ReduceConfig,
) -> Result<V, Error>
where
    C: ParticleCollection + Sync,
    C::Particle: Sync,
    V: ReduceValue,
    F: Fn(&C::Particle) -> V + Copy + Send + Sync,
{
    reduce_with::<Max<V>, C, F>(collection, level, level, f, config)
}

/// The largest value of `f` over every particle of levels
/// `level_min..=level_max`.
pub fn reduce_max_levels<C, V, F>(
    collection: &C,
    level_min: usize,
    level_max: usize,
    f: F,
    config: &ReduceConfig,
) -> Result<V, Error>
where
    C: ParticleCollection + Sync,
    C::Particle: Sync,
    V: ReduceValue,
    F: Fn(&C::Particle) -> V + Copy + Send + Sync,
{
    reduce_with::<Max<V>, C, F>(collection, level_min, level_max, f, config)
}

/// The smallest value of `f` over every particle of every level.
///
/// An empty collection produces the highest representable value of `V`.
pub fn reduce_min<C, V, F>(collection: &C, f: F, config: &ReduceConfig) -> Result<V, Error>
where
    C: ParticleCollection + Sync,
    C::Particle: Sync,
    V: ReduceValue,
    F: Fn(&C::Particle) -> V + Copy + Send + Sync,
{
    reduce_with::<Min<V>, C, F>(collection, 0, collection.finest_level(), f, config)
}

/// The smallest value of `f` over every particle of a single level.
pub fn reduce_min_level<C, V, F>(
    collection: &C,
    level: usize,
    f: F,
    config: &ReduceConfig,
) -> Result<V, Error>
where
    C: ParticleCollection + Sync,
    C::Particle: Sync,
    V: ReduceValue,
    F: Fn(&C::Particle) -> V + Copy + Send + Sync,
{
    reduce_with::<Min<V>, C, F>(collection, level, level, f, config)
}

/// The smallest value of `f` over every particle of levels
/// `level_min..=level_max`.
pub fn reduce_min_levels<C, V, F>(
    collection: &C,
    level_min: usize,
    level_max: usize,
    f: F,
    config: &ReduceConfig,
) -> Result<V, Error>
where
    C: ParticleCollection + Sync,
    C::Particle: Sync,
    V: ReduceValue,
    F: Fn(&C::Particle) -> V + Copy + Send + Sync,
{
    reduce_with::<Min<V>, C, F>(collection, level_min, level_max, f, config)
}

/// `true` when `f` holds for every particle of every level (and for an empty
/// collection).
pub fn reduce_logical_and<C, F>(collection: &C, f: F, config: &ReduceConfig) -> Result<bool, Error>
where
    C: ParticleCollection + Sync,
    C::Particle: Sync,
    F: Fn(&C::Particle) -> bool + Copy + Send + Sync,
{
    reduce_with::<LogicalAnd, C, F>(collection, 0, collection.finest_level(), f, config)
}

/// `true` when `f` holds for every particle of a single level.
pub fn reduce_logical_and_level<C, F>(
    collection: &C,
    level: usize,
    f: F,
    config: &ReduceConfig,
) -> Result<bool, Error>
where
    C: ParticleCollection + Sync,
    C::Particle: Sync,
    F: Fn(&C::Particle) -> bool + Copy + Send + Sync,
{
    reduce_with::<LogicalAnd, C, F>(collection, level, level, f, config)
}

/// `true` when `f` holds for every particle of levels `level_min..=level_max`.
pub fn reduce_logical_and_levels<C, F>(
    collection: &C,
    level_min: usize,
    level_max: usize,
    f: F,
    config: &ReduceConfig,
) -> Result<bool, Error>
where
    C: ParticleCollection + Sync,
    C::Particle: Sync,
    F: Fn(&C::Particle) -> bool + Copy + Send + Sync,
{
    reduce_with::<LogicalAnd, C, F>(collection, level_min, level_max, f, config)
}

/// `true` when `f` holds for at least 1 particle of any level (`false` for an
/// empty collection).
pub fn reduce_logical_or<C, F>(collection: &C, f: F, config: &ReduceConfig) -> Result<bool, Error>
where
    C: ParticleCollection + Sync,
    C::Particle: Sync,
    F: Fn(&C::Particle) -> bool + Copy + Send + Sync,
{
    reduce_with::<LogicalOr, C, F>(collection, 0, collection.finest_level(), f, config)
}

/// `true` when `f` holds for at least 1 particle of a single level.
pub fn reduce_logical_or_level<C, F>(
    collection: &C,
    level: usize,
    f: F,
    config: &ReduceConfig,
) -> Result<bool, Error>
where
    C: ParticleCollection + Sync,
    C::Particle: Sync,
    F: Fn(&C::Particle) -> bool + Copy + Send + Sync,
{
    reduce_with::<LogicalOr, C, F>(collection, level, level, f, config)
}

/// `true` when `f` holds for at least 1 particle of levels
/// `level_min..=level_max`.
pub fn reduce_logical_or_levels<C, F>(
    collection: &C,
    level_min: usize,
    level_max: usize,
    f: F,
    config: &ReduceConfig,
) -> Result<bool, Error>
where
    C: ParticleCollection + Sync,
    C::Particle: Sync,
    F: Fn(&C::Particle) -> bool + Copy + Send + Sync,
{
    reduce_with::<LogicalOr, C, F>(collection, level_min, level_max, f, config)
}
