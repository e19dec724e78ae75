//! Implements the host backend

use partred_nostd_internal::{Executor, LevelRange, ParticleCollection, Reducer, fold_slice};
use rayon::prelude::*;

/// Executes reductions on the host.
///
/// The levels are always visited from coarsest to finest. Within a level,
/// the tiles are either visited sequentially (in the collection's order)
/// or distributed over a rayon thread pool. In the latter case, each worker
/// folds its tiles into a private partial result and the partial results
/// are merged with the reduction's combine rule.
pub struct HostExecutor<'a> {
    deterministic: bool,
    pool: Option<&'a rayon::ThreadPool>,
}

impl<'a> HostExecutor<'a> {
    /// When `deterministic` is `true`, every particle is visited by the
    /// calling thread in a fixed order. Otherwise, tiles are distributed over
    /// `pool` (or over the global rayon pool when `pool` is `None`).
    pub fn new(deterministic: bool, pool: Option<&'a rayon::ThreadPool>) -> Self {
        HostExecutor {
            deterministic,
            pool,
        }
    }
}

impl<'a> Executor for HostExecutor<'a> {
    fn drive_reduce<R, C, F>(
        &mut self,
        collection: &C,
        levels: LevelRange,
        f: F,
    ) -> Result<R::Value, &'static str>
    where
        R: Reducer,
        C: ParticleCollection + Sync,
        C::Particle: Sync,
        F: Fn(&C::Particle) -> R::Input + Copy + Send + Sync,
    {
        if self.deterministic {
            return Ok(reduce_sequential::<R, C, F>(collection, levels, f));
        }
        let value = match self.pool {
            Some(pool) => pool.install(|| reduce_threaded::<R, C, F>(collection, levels, f)),
            None => reduce_threaded::<R, C, F>(collection, levels, f),
        };
        Ok(value)
    }
}

fn reduce_sequential<R, C, F>(collection: &C, levels: LevelRange, f: F) -> R::Value
where
    R: Reducer,
    C: ParticleCollection,
    F: Fn(&C::Particle) -> R::Input + Copy,
{
    let mut acc = R::identity();
    for level in levels.iter() {
        for tile in collection.tiles(level) {
            acc = fold_slice::<R, C::Particle, F>(tile, f, acc);
        }
    }
    acc
}

fn reduce_threaded<R, C, F>(collection: &C, levels: LevelRange, f: F) -> R::Value
where
    R: Reducer,
    C: ParticleCollection + Sync,
    C::Particle: Sync,
    F: Fn(&C::Particle) -> R::Input + Copy + Send + Sync,
{
    let mut acc = R::identity();
    for level in levels.iter() {
        // the collection's tile iterator isn't necessarily Send, so we gather
        // the tile slices up front
        let tiles: Vec<&[C::Particle]> = collection.tiles(level).collect();
        let level_result = tiles
            .par_iter()
            .map(|tile| fold_slice::<R, C::Particle, F>(tile, f, R::identity()))
            .reduce(R::identity, R::combine);
        acc = R::combine(acc, level_result);
    }
    acc
}
