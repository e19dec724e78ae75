//! Scalar types that can live in a reduction accumulator.
//!
//! A reduction accumulator has to exist in 2 forms:
//! - a plain value, that a single thread (or a single team member) folds
//!   contributions into
//! - an atomic cell, that many teams combine their results into without any
//!   locking (this is the "device-resident" accumulator on the accelerator
//!   path)
//!
//! [`ReduceValue`] ties the 2 forms together. Integer types map directly onto
//! the matching `core::sync::atomic` type. Floating point types are stored as
//! their bit patterns inside an unsigned atomic and updated with a
//! compare-and-swap loop (there's no native atomic float in `core`).

use core::sync::atomic::{
    AtomicI32, AtomicI64, AtomicU32, AtomicU64, AtomicUsize, Ordering,
};

/// A scalar that can be folded by a reduction and combined atomically.
///
/// The extremal constants are used as identities: [`Self::LOWEST`] for max
/// and [`Self::HIGHEST`] for min. For floating point types these are the
/// finite extremes (`f64::MIN`, `f64::MAX`), not infinities.
pub trait ReduceValue: Copy + PartialOrd + Send + Sync + 'static {
    /// the atomic cell type used to hold a shared accumulator
    type Atomic: Send + Sync;

    const ZERO: Self;
    const LOWEST: Self;
    const HIGHEST: Self;

    /// integer types wrap on overflow (this matches the atomic fetch_add)
    fn add(self, other: Self) -> Self;

    fn new_atomic(value: Self) -> Self::Atomic;

    fn atomic_load(atomic: &Self::Atomic) -> Self;

    fn atomic_store(atomic: &Self::Atomic, value: Self);

    fn atomic_add(atomic: &Self::Atomic, value: Self);

    fn atomic_max(atomic: &Self::Atomic, value: Self);

    fn atomic_min(atomic: &Self::Atomic, value: Self);
}

/// returns `b` only if `a < b`. A NaN in `b` never replaces `a`.
#[inline(always)]
pub fn max_of<V: PartialOrd>(a: V, b: V) -> V {
    if a < b { b } else { a }
}

/// returns `b` only if `b < a`. A NaN in `b` never replaces `a`.
#[inline(always)]
pub fn min_of<V: PartialOrd>(a: V, b: V) -> V {
    if b < a { b } else { a }
}

macro_rules! impl_reduce_value_int {
    ($t:ty, $atomic:ty) => {
        impl ReduceValue for $t {
            type Atomic = $atomic;

            const ZERO: Self = 0;
            const LOWEST: Self = <$t>::MIN;
            const HIGHEST: Self = <$t>::MAX;

            #[inline(always)]
            fn add(self, other: Self) -> Self {
                self.wrapping_add(other)
            }

            fn new_atomic(value: Self) -> Self::Atomic {
                <$atomic>::new(value)
            }

            #[inline(always)]
            fn atomic_load(atomic: &Self::Atomic) -> Self {
                atomic.load(Ordering::Acquire)
            }

            #[inline(always)]
            fn atomic_store(atomic: &Self::Atomic, value: Self) {
                atomic.store(value, Ordering::Release)
            }

            #[inline(always)]
            fn atomic_add(atomic: &Self::Atomic, value: Self) {
                atomic.fetch_add(value, Ordering::AcqRel);
            }

            #[inline(always)]
            fn atomic_max(atomic: &Self::Atomic, value: Self) {
                atomic.fetch_max(value, Ordering::AcqRel);
            }

            #[inline(always)]
            fn atomic_min(atomic: &Self::Atomic, value: Self) {
                atomic.fetch_min(value, Ordering::AcqRel);
            }
        }
    };
}

impl_reduce_value_int!(i32, AtomicI32);
impl_reduce_value_int!(i64, AtomicI64);
impl_reduce_value_int!(u32, AtomicU32);
impl_reduce_value_int!(u64, AtomicU64);
impl_reduce_value_int!(usize, AtomicUsize);

macro_rules! impl_reduce_value_float {
    ($t:ty, $atomic:ty) => {
        impl ReduceValue for $t {
            type Atomic = $atomic;

            const ZERO: Self = 0.0;
            const LOWEST: Self = <$t>::MIN;
            const HIGHEST: Self = <$t>::MAX;

            #[inline(always)]
            fn add(self, other: Self) -> Self {
                self + other
            }

            fn new_atomic(value: Self) -> Self::Atomic {
                <$atomic>::new(value.to_bits())
            }

            #[inline(always)]
            fn atomic_load(atomic: &Self::Atomic) -> Self {
                <$t>::from_bits(atomic.load(Ordering::Acquire))
            }

            #[inline(always)]
            fn atomic_store(atomic: &Self::Atomic, value: Self) {
                atomic.store(value.to_bits(), Ordering::Release)
            }

            fn atomic_add(atomic: &Self::Atomic, value: Self) {
                // the closure always returns Some, so this can't fail
                let _ = atomic.fetch_update(Ordering::AcqRel, Ordering::Acquire, |bits| {
                    Some((<$t>::from_bits(bits) + value).to_bits())
                });
            }

            fn atomic_max(atomic: &Self::Atomic, value: Self) {
                // returning None leaves the cell untouched
                let _ = atomic.fetch_update(Ordering::AcqRel, Ordering::Acquire, |bits| {
                    if <$t>::from_bits(bits) < value {
                        Some(value.to_bits())
                    } else {
                        None
                    }
                });
            }

            fn atomic_min(atomic: &Self::Atomic, value: Self) {
                let _ = atomic.fetch_update(Ordering::AcqRel, Ordering::Acquire, |bits| {
                    if value < <$t>::from_bits(bits) {
                        Some(value.to_bits())
                    } else {
                        None
                    }
                });
            }
        }
    };
}

impl_reduce_value_float!(f32, AtomicU32);
impl_reduce_value_float!(f64, AtomicU64);

/// A single accumulator value that can be shared (by reference) between all
/// of the teams participating in a reduction.
///
/// On real accelerator hardware this would be a device allocation that gets
/// copied back to the host once all launches complete. Here, the "readback"
/// is just an atomic load performed after the caller has waited for every
/// team to finish.
pub struct DeviceScalar<V: ReduceValue> {
    cell: V::Atomic,
}

impl<V: ReduceValue> DeviceScalar<V> {
    pub fn new(initial: V) -> Self {
        DeviceScalar {
            cell: V::new_atomic(initial),
        }
    }

    /// the atomic cell that teams combine their results into
    pub fn cell(&self) -> &V::Atomic {
        &self.cell
    }

    /// copy the current value out of the accumulator
    pub fn value(&self) -> V {
        V::atomic_load(&self.cell)
    }
}
