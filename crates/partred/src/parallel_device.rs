//! Implements the (simulated) accelerator backend
//!
//! Every tile of every level gets its own "kernel launch." A launch is a
//! league of teams (thread-blocks) and each team executes
//! [`reduce_tile_single_team`]. The teams are submitted as tasks to a rayon
//! scope, which plays the role of the device stream: the host submits every
//! launch without waiting, and the end of the scope is the point where the
//! host synchronizes with the device before reading the accumulator back.

use crate::config::TeamKind;
use crate::parallel_threaded::ThreadedTeam;
use partred_nostd_internal::{
    DeviceScalar, Executor, LaunchConfig, LevelRange, ParticleCollection, ReduceValue, Reducer,
    SerialTeam, reduce_tile_single_team,
};
use std::num::NonZeroU32;

/// Executes reductions with the accelerator algorithm.
pub struct SimulatedDevice {
    particles_per_thread: NonZeroU32,
    max_threads_per_block: NonZeroU32,
    max_blocks: NonZeroU32,
    team_kind: TeamKind,
}

impl SimulatedDevice {
    pub fn new(
        particles_per_thread: NonZeroU32,
        max_threads_per_block: NonZeroU32,
        max_blocks: NonZeroU32,
        team_kind: TeamKind,
    ) -> Self {
        SimulatedDevice {
            particles_per_thread,
            max_threads_per_block,
            max_blocks,
            team_kind,
        }
    }

    /// the launch geometry used for a tile with `n_particles` particles
    pub fn launch_config(&self, n_particles: usize) -> LaunchConfig {
        LaunchConfig::for_tile(
            n_particles,
            self.particles_per_thread,
            self.max_threads_per_block,
            self.max_blocks,
        )
    }
}

impl Executor for SimulatedDevice {
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
        let accumulator = DeviceScalar::<R::Value>::new(R::identity());
        let team_kind = self.team_kind;
        let mut n_launches = 0_usize;

        rayon::scope(|s| {
            for level in levels.iter() {
                for (tile_index, tile) in collection.tiles(level).enumerate() {
                    let launch = self.launch_config(tile.len());
                    if launch.is_empty() {
                        tracing::trace!(level, tile_index, "skipping empty tile");
                        continue;
                    }
                    tracing::trace!(
                        level,
                        tile_index,
                        n_particles = tile.len(),
                        n_blocks = launch.n_teams,
                        n_threads_per_block = launch.n_members_per_team.get(),
                        "launching tile reduction"
                    );
                    n_launches += 1;
                    let accumulator = &accumulator;
                    for team_id in 0..launch.n_teams {
                        s.spawn(move |_| {
                            run_block::<R, C::Particle, F>(
                                team_kind,
                                team_id,
                                &launch,
                                tile,
                                f,
                                accumulator.cell(),
                            )
                        });
                    }
                }
            }
        });

        // every launch has completed at this point, so the readback is safe
        let value = accumulator.value();
        tracing::trace!(n_launches, "device accumulator read back");
        Ok(value)
    }
}

/// execute a single thread-block. The block's shared scratch memory only
/// lives for the duration of the block.
fn run_block<R, P, F>(
    team_kind: TeamKind,
    team_id: u32,
    launch: &LaunchConfig,
    particles: &[P],
    f: F,
    accumulator: &<R::Value as ReduceValue>::Atomic,
) where
    R: Reducer,
    P: Sync,
    F: Fn(&P) -> R::Input + Copy + Sync,
{
    match team_kind {
        TeamKind::Serial => {
            let mut scratch = vec![R::identity(); launch.scratch_len()];
            let mut team = SerialTeam::<R>::new(&mut scratch);
            reduce_tile_single_team::<R, _, P, F>(
                &mut team,
                team_id,
                launch,
                particles,
                f,
                accumulator,
            );
        }
        TeamKind::Threaded => {
            let mut team = ThreadedTeam::<R>::new(launch.n_members_per_team);
            reduce_tile_single_team::<R, _, P, F>(
                &mut team,
                team_id,
                launch,
                particles,
                f,
                accumulator,
            );
        }
    }
}
