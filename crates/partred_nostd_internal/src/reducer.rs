//! Define the reduction operations (that don't require the standard lib)
//!
//! # Reduction Machinery
//!
//! Every reduction in this crate boils down to the same recipe:
//! 1. start from the operation's identity value
//! 2. apply a user-supplied function to each particle, converting the result
//!    into the operation's accumulator representation
//! 3. fold each converted value into a running accumulator
//! 4. combine running accumulators (from separate threads, team members or
//!    teams) with the very same rule
//! 5. convert the final accumulator into the output type
//!
//! Types that implement [`Reducer`] encode the rules for each of these steps.
//! They are zero-sized marker types: they carry no state and are only ever
//! used as type parameters. This means that all of the logic gets
//! monomorphized into the calling loop (there is no dynamic dispatch on the
//! per-particle path).
//!
//! # Logical Operations
//! The logical reductions track their state as an `i32` holding `1` (true)
//! or `0` (false). With that encoding, AND is exactly `min` and OR is exactly
//! `max`. We lean on that equivalence everywhere (thread-local folding,
//! tree-reductions and the atomic combine), so there is only one combine
//! rule per operation.

use crate::scalar::{ReduceValue, max_of, min_of};
use core::marker::PhantomData;

/// Describes a commutative & associative reduction operation.
///
/// # Requirements
/// For every implementation, `combine` must be associative and commutative
/// and `identity()` must be its neutral element. Floating-point addition is
/// the only (tolerated) exception to associativity.
pub trait Reducer: 'static {
    /// the type returned by the per-particle function
    type Input;

    /// the type used to track the accumulator state
    type Value: ReduceValue;

    /// the type handed back to the caller
    type Output;

    /// used in log messages
    const NAME: &'static str;

    /// the neutral element of [`Self::combine`]
    fn identity() -> Self::Value;

    /// convert the output of the per-particle function into an accumulator
    /// value
    fn lift(input: Self::Input) -> Self::Value;

    /// combine 2 accumulator values
    fn combine(acc: Self::Value, other: Self::Value) -> Self::Value;

    /// atomically combine `value` into a shared accumulator
    fn atomic_combine(target: &<Self::Value as ReduceValue>::Atomic, value: Self::Value);

    /// convert the final accumulator value into the output value
    fn finish(value: Self::Value) -> Self::Output;
}

/// Sums the values. The identity is `0`.
pub struct Sum<V>(PhantomData<V>);

impl<V: ReduceValue> Reducer for Sum<V> {
    type Input = V;
    type Value = V;
    type Output = V;

    const NAME: &'static str = "sum";

    #[inline(always)]
    fn identity() -> V {
        V::ZERO
    }

    #[inline(always)]
    fn lift(input: V) -> V {
        input
    }

    #[inline(always)]
    fn combine(acc: V, other: V) -> V {
        acc.add(other)
    }

    fn atomic_combine(target: &V::Atomic, value: V) {
        V::atomic_add(target, value)
    }

    fn finish(value: V) -> V {
        value
    }
}

/// Tracks the largest value. The identity is the lowest representable value
/// (callers should treat it as a "no data" sentinel).
pub struct Max<V>(PhantomData<V>);

impl<V: ReduceValue> Reducer for Max<V> {
    type Input = V;
    type Value = V;
    type Output = V;

    const NAME: &'static str = "max";

    #[inline(always)]
    fn identity() -> V {
        V::LOWEST
    }

    #[inline(always)]
    fn lift(input: V) -> V {
        input
    }

    #[inline(always)]
    fn combine(acc: V, other: V) -> V {
        max_of(acc, other)
    }

    fn atomic_combine(target: &V::Atomic, value: V) {
        V::atomic_max(target, value)
    }

    fn finish(value: V) -> V {
        value
    }
}

/// Tracks the smallest value. The identity is the highest representable value
/// (callers should treat it as a "no data" sentinel).
pub struct Min<V>(PhantomData<V>);

impl<V: ReduceValue> Reducer for Min<V> {
    type Input = V;
    type Value = V;
    type Output = V;

    const NAME: &'static str = "min";

    #[inline(always)]
    fn identity() -> V {
        V::HIGHEST
    }

    #[inline(always)]
    fn lift(input: V) -> V {
        input
    }

    #[inline(always)]
    fn combine(acc: V, other: V) -> V {
        min_of(acc, other)
    }

    fn atomic_combine(target: &V::Atomic, value: V) {
        V::atomic_min(target, value)
    }

    fn finish(value: V) -> V {
        value
    }
}

/// Logical AND of boolean values. The identity is `true`.
///
/// The state is tracked as an `i32` and combined with `min`.
pub struct LogicalAnd;

impl Reducer for LogicalAnd {
    type Input = bool;
    type Value = i32;
    type Output = bool;

    const NAME: &'static str = "logical_and";

    #[inline(always)]
    fn identity() -> i32 {
        1
    }

    #[inline(always)]
    fn lift(input: bool) -> i32 {
        input as i32
    }

    #[inline(always)]
    fn combine(acc: i32, other: i32) -> i32 {
        min_of(acc, other)
    }

    fn atomic_combine(target: &<i32 as ReduceValue>::Atomic, value: i32) {
        i32::atomic_min(target, value)
    }

    fn finish(value: i32) -> bool {
        value != 0
    }
}

/// Logical OR of boolean values. The identity is `false`.
///
/// The state is tracked as an `i32` and combined with `max`.
pub struct LogicalOr;

impl Reducer for LogicalOr {
    type Input = bool;
    type Value = i32;
    type Output = bool;

    const NAME: &'static str = "logical_or";

    #[inline(always)]
    fn identity() -> i32 {
        0
    }

    #[inline(always)]
    fn lift(input: bool) -> i32 {
        input as i32
    }

    #[inline(always)]
    fn combine(acc: i32, other: i32) -> i32 {
        max_of(acc, other)
    }

    fn atomic_combine(target: &<i32 as ReduceValue>::Atomic, value: i32) {
        i32::atomic_max(target, value)
    }

    fn finish(value: i32) -> bool {
        value != 0
    }
}
