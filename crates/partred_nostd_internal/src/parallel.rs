//! Our parallelism abstractions use the concepts of teams & leagues
//!
//! In general, a parallel reduction is a way of characterizing a certain kind
//! of calculation that can be broken into parts, where each part can be
//! computed simultaneously, and each of the partial results can be combined
//! together into a single result.
//!
//! The idea of a "team" is an abstraction that we define in the context of
//! describing parallelism:
//! - we distribute the work of a reduction over a "league" of 1 or more teams
//! - a team is composed of 1 or more members. The members of a team work
//!   together in a tightly-coupled, synchronous manner. They share a small
//!   scratch buffer and synchronize with barriers.
//!
//! This abstraction maps directly onto accelerator hardware: a team is a
//! thread-block, each member is a thread of that block, the shared scratch
//! buffer is block-shared memory, and the league is the launch grid.
//!
//! # How a tile gets reduced
//! For every tile of particles we:
//! 1. pick a [`LaunchConfig`] from the number of particles in the tile
//! 2. have each team execute [`reduce_tile_single_team`]:
//!    - each member folds a strided subset of the tile's particles (a
//!      grid-stride loop) into a private value
//!    - the members combine their private values with a barrier-separated
//!      tree reduction in the team's scratch buffer
//!    - the root member atomically combines the team's result into an
//!      accumulator shared by every team of every tile
//!
//! Since the combine rule is associative and commutative, nothing about the
//! order in which teams finish affects the result (beyond floating-point
//! reassociation for sums).

use crate::collection::{LevelRange, ParticleCollection};
use crate::reduce_utils::{fold_grid_stride, tree_reduce};
use crate::reducer::Reducer;
use crate::scalar::ReduceValue;
use core::num::NonZeroU32;

/// The largest number of members a team may have. This mirrors the largest
/// thread-block size supported by common accelerator hardware.
pub const MAX_MEMBERS_PER_TEAM: u32 = 1024;

/// Describes the shape of a launch: the number of teams in the league and the
/// number of members in each team.
///
/// Instances are cheap to compute, so we recompute one for every tile.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LaunchConfig {
    pub n_members_per_team: NonZeroU32,
    pub n_teams: u32,
}

impl LaunchConfig {
    /// Derive the launch shape for a tile holding `n_particles` particles.
    ///
    /// Each member is nominally responsible for `particles_per_member`
    /// particles. The team size is capped at `max_members_per_team` and the
    /// number of teams is capped at `max_teams`. When the caps kick in, the
    /// grid-stride loop makes members visit more particles (we never spawn an
    /// unbounded number of teams).
    ///
    /// A tile without particles gets a launch with zero teams.
    pub fn for_tile(
        n_particles: usize,
        particles_per_member: NonZeroU32,
        max_members_per_team: NonZeroU32,
        max_teams: NonZeroU32,
    ) -> LaunchConfig {
        if n_particles == 0 {
            return LaunchConfig {
                n_members_per_team: NonZeroU32::MIN,
                n_teams: 0,
            };
        }
        let n_work = n_particles.div_ceil(particles_per_member.get() as usize);
        let max_members = max_members_per_team.get().min(MAX_MEMBERS_PER_TEAM) as usize;
        // a non-empty tile always has n_work >= 1
        let n_members = n_work.min(max_members);
        let n_teams = n_work.div_ceil(n_members).min(max_teams.get() as usize);
        LaunchConfig {
            n_members_per_team: NonZeroU32::MIN.saturating_add((n_members - 1) as u32),
            n_teams: n_teams as u32,
        }
    }

    /// `true` when nothing needs to be launched
    pub fn is_empty(&self) -> bool {
        self.n_teams == 0
    }

    /// the total number of members across the whole league (this is the
    /// stride of the grid-stride loop)
    pub fn grid_stride(&self) -> usize {
        (self.n_teams as usize) * (self.n_members_per_team.get() as usize)
    }

    /// the number of scratch slots each team needs: 1 slot for the team's
    /// result followed by 1 slot per member
    pub fn scratch_len(&self) -> usize {
        (self.n_members_per_team.get() as usize) + 1
    }
}

/// A team (implementer of TeamProps) is composed of 1 or more members, who
/// work together in a tightly-coupled, synchronous manner. This trait can
/// describe:
/// - a team of threads (one thread per member)
/// - a team of 1 thread that "simulates" the role of multiple members (it
///   goes through and does the work of 1 member at a time)
///
/// The methods are all designed to be entered by all members of a team the
/// same time. Calls to these methods should be written *as if* there is a
/// barrier at the start of the method that will hang until all members catch
/// up. (Whether there is a barrier or not is an implementation detail)
///
/// Every implementation must combine the member contributions following the
/// schedule given by [`tree_steps`](crate::tree_steps). That way, all
/// implementations produce bitwise identical results for the same team size.
pub trait TeamProps<R: Reducer> {
    fn n_members_per_team(&self) -> u32;

    /// Ensures all team members are synchronized, then does 3 things:
    /// 1. each member calls `get_member_contrib` with its rank and records
    ///    the result in its own scratch slot
    /// 2. the members combine the scratch slots (in a barrier-separated tree
    ///    reduction) so that a single slot holds the team's result
    /// 3. the root member copies the result into the team-result slot and
    ///    passes it to `apply_team_result`. The other members do nothing
    ///    during this step.
    fn calccontribs_combine_apply(
        &mut self,
        get_member_contrib: &(impl Fn(u32) -> R::Value + Sync),
        apply_team_result: &(impl Fn(R::Value) + Sync),
    );
}

/// A team represented by a single thread that simulates every member, one
/// after another.
///
/// The scratch buffer is provided by the caller (this crate doesn't allocate).
/// Slot 0 holds the team's result and slot `1 + rank` belongs to member
/// `rank`.
pub struct SerialTeam<'a, R: Reducer> {
    scratch: &'a mut [R::Value],
}

impl<'a, R: Reducer> SerialTeam<'a, R> {
    /// `scratch` must hold at least 2 slots (a team always has 1 member)
    pub fn new(scratch: &'a mut [R::Value]) -> Self {
        assert!(scratch.len() >= 2, "a team needs at least 1 member");
        SerialTeam { scratch }
    }

    /// the value stored in the team-result slot
    pub fn team_result(&self) -> R::Value {
        self.scratch[0]
    }
}

impl<'a, R: Reducer> TeamProps<R> for SerialTeam<'a, R> {
    fn n_members_per_team(&self) -> u32 {
        (self.scratch.len() - 1) as u32
    }

    fn calccontribs_combine_apply(
        &mut self,
        get_member_contrib: &(impl Fn(u32) -> R::Value + Sync),
        apply_team_result: &(impl Fn(R::Value) + Sync),
    ) {
        let (team_slot, member_slots) = self.scratch.split_at_mut(1);

        // in a multi-threaded team, every member would do this at once
        for (rank, slot) in member_slots.iter_mut().enumerate() {
            *slot = get_member_contrib(rank as u32);
        }

        // every step of the tree-reduction would be followed by a barrier
        team_slot[0] = tree_reduce::<R>(member_slots).unwrap_or_else(R::identity);
        apply_team_result(team_slot[0]);
    }
}

/// The body of the "kernel" executed by team `team_id` for a single tile.
///
/// The team folds its share of `particles` and atomically combines the
/// team's result into `accumulator`. Every team of `launch` must execute this
/// function (in any order, or simultaneously) for the accumulator to receive
/// the tile's full contribution.
pub fn reduce_tile_single_team<R, T, P, F>(
    team: &mut T,
    team_id: u32,
    launch: &LaunchConfig,
    particles: &[P],
    f: F,
    accumulator: &<R::Value as ReduceValue>::Atomic,
) where
    R: Reducer,
    T: TeamProps<R>,
    P: Sync,
    F: Fn(&P) -> R::Input + Copy + Sync,
{
    debug_assert_eq!(team.n_members_per_team(), launch.n_members_per_team.get());
    let stride = launch.grid_stride();
    let team_offset = (team_id as usize) * (launch.n_members_per_team.get() as usize);

    team.calccontribs_combine_apply(
        &|rank: u32| {
            fold_grid_stride::<R, P, F>(particles, f, team_offset + rank as usize, stride)
        },
        &|team_result: R::Value| R::atomic_combine(accumulator, team_result),
    );
}

/// a trait for expressing how to drive a reduction over a particle
/// collection.
///
/// We implement this for each parallelism "backend," so we have a uniform
/// interface for easily switching between backends. Each backend receives
/// exactly the same inputs and must produce the same result (up to
/// floating-point reassociation for sums).
///
/// **NOTE:** Types that implement this trait are intended to live entirely on
/// the host. An accelerator backend implements this trait in order to launch
/// the calculations and read back the result.
pub trait Executor {
    /// fold `f` over every particle in every tile of every level in `levels`
    /// and return the accumulator value (before [`Reducer::finish`] is
    /// applied).
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
        F: Fn(&C::Particle) -> R::Input + Copy + Send + Sync;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reducer::{LogicalAnd, Max, Sum};
    use crate::scalar::DeviceScalar;

    fn nz(x: u32) -> NonZeroU32 {
        NonZeroU32::new(x).unwrap()
    }

    #[test]
    fn launch_config_shapes() {
        let empty = LaunchConfig::for_tile(0, nz(32), nz(256), nz(100));
        assert!(empty.is_empty());

        let tiny = LaunchConfig::for_tile(5, nz(32), nz(256), nz(100));
        assert_eq!(tiny, LaunchConfig { n_members_per_team: nz(1), n_teams: 1 });

        // 1000 particles at 4 per member -> 250 members in a single team
        let mid = LaunchConfig::for_tile(1000, nz(4), nz(256), nz(100));
        assert_eq!(mid, LaunchConfig { n_members_per_team: nz(250), n_teams: 1 });
        assert_eq!(mid.scratch_len(), 251);

        let big = LaunchConfig::for_tile(100_000, nz(4), nz(256), nz(100));
        assert_eq!(big.n_members_per_team.get(), 256);
        assert_eq!(big.n_teams, 98);

        // the number of teams gets capped
        let capped = LaunchConfig::for_tile(10_000_000, nz(1), nz(128), nz(7));
        assert_eq!(capped, LaunchConfig { n_members_per_team: nz(128), n_teams: 7 });
        assert_eq!(capped.grid_stride(), 896);

        // the team size never exceeds the hardware limit
        let huge = LaunchConfig::for_tile(10_000_000, nz(1), nz(4096), nz(7));
        assert_eq!(huge.n_members_per_team.get(), MAX_MEMBERS_PER_TEAM);
    }

    #[test]
    fn serial_team_non_power_of_two() {
        let particles: [f64; 13] = core::array::from_fn(|i| i as f64);
        let launch = LaunchConfig {
            n_members_per_team: nz(3),
            n_teams: 2,
        };
        let accum = DeviceScalar::new(Sum::<f64>::identity());
        for team_id in 0..launch.n_teams {
            let mut scratch = [0.0; 4];
            let mut team = SerialTeam::<Sum<f64>>::new(&mut scratch);
            reduce_tile_single_team::<Sum<f64>, _, _, _>(
                &mut team,
                team_id,
                &launch,
                &particles,
                |p: &f64| *p,
                accum.cell(),
            );
        }
        assert_eq!(accum.value(), 78.0);
    }

    #[test]
    fn serial_team_result_slot() {
        let particles = [3_i64, -8, 12, 5, 0];
        let launch = LaunchConfig {
            n_members_per_team: nz(5),
            n_teams: 1,
        };
        let accum = DeviceScalar::new(Max::<i64>::identity());
        let mut scratch = [0_i64; 6];
        let mut team = SerialTeam::<Max<i64>>::new(&mut scratch);
        reduce_tile_single_team::<Max<i64>, _, _, _>(
            &mut team,
            0,
            &launch,
            &particles,
            |p: &i64| *p,
            accum.cell(),
        );
        assert_eq!(team.team_result(), 12);
        assert_eq!(accum.value(), 12);
    }

    #[test]
    fn idle_members_contribute_identity() {
        // more members than particles: the idle members must not flip the
        // logical result
        let particles = [true, true];
        let launch = LaunchConfig {
            n_members_per_team: nz(6),
            n_teams: 1,
        };
        let accum = DeviceScalar::new(LogicalAnd::identity());
        let mut scratch = [0_i32; 7];
        let mut team = SerialTeam::<LogicalAnd>::new(&mut scratch);
        reduce_tile_single_team::<LogicalAnd, _, _, _>(
            &mut team,
            0,
            &launch,
            &particles,
            |p: &bool| *p,
            accum.cell(),
        );
        assert_eq!(accum.value(), 1);
    }
}
