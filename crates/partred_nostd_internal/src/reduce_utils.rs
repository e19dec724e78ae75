// this defines some basic utilities used in reductions. The folding
// functions are shared by every backend, and the tree-reduction schedule is
// shared by every team implementation (so that they all combine partial
// results in exactly the same order)

use crate::reducer::Reducer;

/// fold `f` applied to every particle of `particles` into `acc`, in order
#[inline]
pub fn fold_slice<R, P, F>(particles: &[P], f: F, acc: R::Value) -> R::Value
where
    R: Reducer,
    F: Fn(&P) -> R::Input,
{
    particles
        .iter()
        .fold(acc, |acc, p| R::combine(acc, R::lift(f(p))))
}

/// Fold the particles visited by a single member of a grid-stride loop.
///
/// The member visits `start`, `start + stride`, `start + 2*stride`, ... until
/// it runs off the end of `particles`. When `start >= particles.len()` the
/// member contributes the identity.
#[inline]
pub fn fold_grid_stride<R, P, F>(particles: &[P], f: F, start: usize, stride: usize) -> R::Value
where
    R: Reducer,
    F: Fn(&P) -> R::Input,
{
    assert!(stride > 0);
    let mut acc = R::identity();
    let mut i = start;
    while i < particles.len() {
        acc = R::combine(acc, R::lift(f(&particles[i])));
        i += stride;
    }
    acc
}

/// A single synchronized step of a tree-reduction.
///
/// During a step, each slot `i < n_active` is updated with
/// `slot[i] = combine(slot[i], slot[i + offset])`. Every other slot is left
/// alone. Since `n_active <= offset`, no slot is read and written in the same
/// step, so the members can perform a step simultaneously (followed by a
/// barrier).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TreeStep {
    pub n_active: usize,
    pub offset: usize,
}

/// Iterator over the steps needed to tree-reduce `n` slots into slot 0.
///
/// When `n` isn't a power of 2, the first step folds the `n - p` slots beyond
/// the largest power of 2 (`p`) into the leading slots. The remaining steps
/// halve the active range each time. No step ever touches a slot `>= n`.
pub struct TreeSteps {
    next: Option<TreeStep>,
}

impl Iterator for TreeSteps {
    type Item = TreeStep;

    fn next(&mut self) -> Option<TreeStep> {
        let cur = self.next?;
        self.next = if cur.offset > 1 {
            let half = cur.offset / 2;
            Some(TreeStep {
                n_active: half,
                offset: half,
            })
        } else {
            None
        };
        Some(cur)
    }
}

/// the largest power of 2 that doesn't exceed `n` (`n` must be positive)
fn prev_power_of_two(n: usize) -> usize {
    1 << (usize::BITS - 1 - n.leading_zeros())
}

pub fn tree_steps(n: usize) -> TreeSteps {
    let next = if n <= 1 {
        None
    } else {
        let p = prev_power_of_two(n);
        if p < n {
            Some(TreeStep {
                n_active: n - p,
                offset: p,
            })
        } else {
            Some(TreeStep {
                n_active: p / 2,
                offset: p / 2,
            })
        }
    };
    TreeSteps { next }
}

/// Combines all entries of `values` such that `values[0]` holds the result.
/// The other entries are left in an undetermined state.
///
/// This is the serial rendition of the barrier-separated tree reduction
/// performed by a team. It returns `None` when `values` is empty.
pub fn tree_reduce<R: Reducer>(values: &mut [R::Value]) -> Option<R::Value> {
    for step in tree_steps(values.len()) {
        for i in 0..step.n_active {
            values[i] = R::combine(values[i], values[i + step.offset]);
        }
    }
    values.first().copied()
}
