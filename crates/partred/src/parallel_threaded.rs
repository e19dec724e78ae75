//! Implements a team where every member runs on its own thread

use partred_nostd_internal::{ReduceValue, Reducer, TeamProps, tree_steps};
use std::any::Any;
use std::num::NonZeroU32;
use std::panic::{self, AssertUnwindSafe};
use std::sync::{Barrier, Mutex, PoisonError};

type PanicPayload = Box<dyn Any + Send + 'static>;

/// A team in which every member is backed by a dedicated OS thread.
///
/// This is the closest host-side analog of an accelerator thread-block: the
/// members execute simultaneously, they exchange partial results through a
/// shared scratch buffer, and they synchronize with a barrier between the
/// steps of the tree-reduction. The scratch slots are atomics so that the
/// members can share them without locks (the barrier provides the
/// happens-before relationship between steps).
///
/// The combine schedule is identical to the one used by
/// [`SerialTeam`](partred_nostd_internal::SerialTeam), so both produce
/// bitwise identical results.
///
/// If a member's contribution panics, that member still takes part in every
/// barrier step (contributing the identity) so that the remaining members
/// can finish. The team result is then discarded and the panic is resumed on
/// the calling thread.
pub struct ThreadedTeam<R: Reducer> {
    // slot 0 holds the team result, slot 1 + rank belongs to member rank
    scratch: Vec<<R::Value as ReduceValue>::Atomic>,
    barrier: Barrier,
}

impl<R: Reducer> ThreadedTeam<R> {
    pub fn new(n_members_per_team: NonZeroU32) -> Self {
        let n_members = n_members_per_team.get() as usize;
        let scratch = (0..=n_members)
            .map(|_| R::Value::new_atomic(R::identity()))
            .collect();
        ThreadedTeam {
            scratch,
            barrier: Barrier::new(n_members),
        }
    }

    /// the value stored in the team-result slot
    pub fn team_result(&self) -> R::Value {
        R::Value::atomic_load(&self.scratch[0])
    }
}

impl<R: Reducer> TeamProps<R> for ThreadedTeam<R> {
    fn n_members_per_team(&self) -> u32 {
        (self.scratch.len() - 1) as u32
    }

    fn calccontribs_combine_apply(
        &mut self,
        get_member_contrib: &(impl Fn(u32) -> R::Value + Sync),
        apply_team_result: &(impl Fn(R::Value) + Sync),
    ) {
        let (team_slot, member_slots) = self.scratch.split_at(1);
        let n_members = member_slots.len();
        let barrier = &self.barrier;
        let first_panic: Mutex<Option<PanicPayload>> = Mutex::new(None);
        let first_panic = &first_panic;

        std::thread::scope(|s| {
            for rank in 0..n_members {
                let spawned = std::thread::Builder::new().spawn_scoped(s, move || {
                    let contrib = match panic::catch_unwind(AssertUnwindSafe(|| {
                        get_member_contrib(rank as u32)
                    })) {
                        Ok(contrib) => contrib,
                        Err(payload) => {
                            let mut slot =
                                first_panic.lock().unwrap_or_else(PoisonError::into_inner);
                            slot.get_or_insert(payload);
                            R::identity()
                        }
                    };
                    R::Value::atomic_store(&member_slots[rank], contrib);
                    barrier.wait();

                    for step in tree_steps(n_members) {
                        if rank < step.n_active {
                            let combined = R::combine(
                                R::Value::atomic_load(&member_slots[rank]),
                                R::Value::atomic_load(&member_slots[rank + step.offset]),
                            );
                            R::Value::atomic_store(&member_slots[rank], combined);
                        }
                        barrier.wait();
                    }

                    let failed = first_panic
                        .lock()
                        .unwrap_or_else(PoisonError::into_inner)
                        .is_some();
                    if rank == 0 && !failed {
                        let result = R::Value::atomic_load(&member_slots[0]);
                        R::Value::atomic_store(&team_slot[0], result);
                        apply_team_result(result);
                    }
                });
                if let Err(err) = spawned {
                    // the members that already started can never get past
                    // the barrier
                    tracing::error!(rank, n_members, %err, "unable to spawn a team member");
                    std::process::abort();
                }
            }
        });

        let payload = first_panic
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(payload) = payload {
            panic::resume_unwind(payload);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use partred_nostd_internal::{
        DeviceScalar, LaunchConfig, Max, SerialTeam, Sum, reduce_tile_single_team,
    };
    use std::sync::mpsc;
    use std::time::Duration;

    fn nz(x: u32) -> NonZeroU32 {
        NonZeroU32::new(x).unwrap()
    }

    #[test]
    fn matches_serial_team_bitwise() {
        // use values with very different magnitudes so that any change in
        // the combine order would alter the rounding
        let particles: Vec<f64> = (0..1000)
            .map(|i| ((i * 7919) % 1013) as f64 * 10f64.powi((i % 17) - 8))
            .collect();

        for n_members in [1, 2, 5, 13, 32] {
            let launch = LaunchConfig {
                n_members_per_team: nz(n_members),
                n_teams: 3,
            };

            let serial_accum = DeviceScalar::<f64>::new(0.0);
            let threaded_accum = DeviceScalar::<f64>::new(0.0);
            let mut serial_results = Vec::new();
            let mut threaded_results = Vec::new();
            for team_id in 0..launch.n_teams {
                let mut scratch = vec![0.0; launch.scratch_len()];
                let mut team = SerialTeam::<Sum<f64>>::new(&mut scratch);
                reduce_tile_single_team::<Sum<f64>, _, _, _>(
                    &mut team,
                    team_id,
                    &launch,
                    &particles,
                    |p: &f64| *p,
                    serial_accum.cell(),
                );
                serial_results.push(team.team_result());

                let mut team = ThreadedTeam::<Sum<f64>>::new(nz(n_members));
                reduce_tile_single_team::<Sum<f64>, _, _, _>(
                    &mut team,
                    team_id,
                    &launch,
                    &particles,
                    |p: &f64| *p,
                    threaded_accum.cell(),
                );
                threaded_results.push(team.team_result());
            }
            for (a, b) in serial_results.iter().zip(threaded_results.iter()) {
                assert_eq!(a.to_bits(), b.to_bits(), "n_members = {n_members}");
            }
            assert_eq!(serial_accum.value().to_bits(), threaded_accum.value().to_bits());
        }
    }

    #[test]
    fn max_over_team() {
        let particles = [4_i32, -3, 17, 9, 17, 2, 0];
        let launch = LaunchConfig {
            n_members_per_team: nz(3),
            n_teams: 1,
        };
        let accum = DeviceScalar::<i32>::new(i32::MIN);
        let mut team = ThreadedTeam::<Max<i32>>::new(nz(3));
        reduce_tile_single_team::<Max<i32>, _, _, _>(
            &mut team,
            0,
            &launch,
            &particles,
            |p: &i32| *p,
            accum.cell(),
        );
        assert_eq!(team.team_result(), 17);
        assert_eq!(accum.value(), 17);
    }

    #[test]
    fn member_panic_is_resumed_not_deadlocked() {
        // run the team on a helper thread so that a deadlock shows up as a
        // timeout instead of a hung test
        let (sender, receiver) = mpsc::channel();
        std::thread::spawn(move || {
            let applied = std::sync::atomic::AtomicBool::new(false);
            let outcome = panic::catch_unwind(AssertUnwindSafe(|| {
                let mut team = ThreadedTeam::<Sum<i64>>::new(nz(8));
                team.calccontribs_combine_apply(
                    &|rank: u32| {
                        if rank == 3 {
                            panic!("bad particle");
                        }
                        rank as i64
                    },
                    &|_: i64| applied.store(true, std::sync::atomic::Ordering::SeqCst),
                );
            }));
            let message = outcome
                .err()
                .and_then(|payload| payload.downcast_ref::<&str>().map(|s| s.to_string()));
            let _ = sender.send((message, applied.into_inner()));
        });

        let (message, applied) = receiver
            .recv_timeout(Duration::from_secs(30))
            .expect("the team never finished after a member panicked");
        assert_eq!(message.as_deref(), Some("bad particle"));
        assert!(!applied, "a partial team result must not be applied");
    }

    #[test]
    fn team_is_reusable_after_member_panic() {
        let mut team = ThreadedTeam::<Sum<i64>>::new(nz(4));
        let outcome = panic::catch_unwind(AssertUnwindSafe(|| {
            team.calccontribs_combine_apply(&|_: u32| -> i64 { panic!("boom") }, &|_: i64| {})
        }));
        assert!(outcome.is_err());

        let total = std::sync::atomic::AtomicI64::new(0);
        team.calccontribs_combine_apply(&|rank: u32| rank as i64 + 1, &|v: i64| {
            total.store(v, std::sync::atomic::Ordering::SeqCst)
        });
        assert_eq!(total.into_inner(), 10);
        assert_eq!(team.team_result(), 10);
    }
}
