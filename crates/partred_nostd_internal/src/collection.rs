use core::ops::RangeInclusive;

/// Describes a read-only, hierarchical collection of particles.
///
/// The collection is organized into refinement levels (indexed from `0`, the
/// coarsest level, up to and including [`finest_level`]). Each level is
/// partitioned into tiles, and each tile owns a contiguous buffer of
/// particle records.
///
/// The reduction machinery never needs to know how the records are laid out.
/// It only needs to visit every tile of a level and hand each record to a
/// user-supplied function. Tiles may be empty.
///
/// [`finest_level`]: ParticleCollection::finest_level
pub trait ParticleCollection {
    type Particle;

    /// an iterator over the tiles of a single level
    type Tiles<'a>: Iterator<Item = &'a [Self::Particle]>
    where
        Self: 'a;

    /// the index of the finest level.
    fn finest_level(&self) -> usize;

    /// iterate over the tiles of `level` in a fixed order.
    ///
    /// Repeated calls must yield the same tiles in the same order (this is
    /// what lets deterministic reductions produce bitwise identical results).
    /// Implementations should yield no tiles for a level that holds no
    /// particles.
    fn tiles(&self, level: usize) -> Self::Tiles<'_>;
}

/// An inclusive range of refinement levels that is known to be valid for a
/// particular collection.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LevelRange {
    level_min: usize,
    level_max: usize,
}

impl LevelRange {
    /// Returns `None` unless `level_min <= level_max <= finest_level`
    pub fn new(level_min: usize, level_max: usize, finest_level: usize) -> Option<Self> {
        if (level_min <= level_max) && (level_max <= finest_level) {
            Some(LevelRange {
                level_min,
                level_max,
            })
        } else {
            None
        }
    }

    /// the range spanning every level of a collection
    pub fn all_levels(finest_level: usize) -> Self {
        LevelRange {
            level_min: 0,
            level_max: finest_level,
        }
    }

    pub fn level_min(&self) -> usize {
        self.level_min
    }

    pub fn level_max(&self) -> usize {
        self.level_max
    }

    /// iterate over the levels, from coarsest to finest
    pub fn iter(&self) -> RangeInclusive<usize> {
        self.level_min..=self.level_max
    }
}
