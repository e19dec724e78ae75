use crate::error::Error;
use partred_nostd_internal::ParticleCollection;

/// A simple owning particle hierarchy: a list of levels, where each level is
/// a list of tiles and each tile is a list of particles.
///
/// This is mostly useful for testing and for callers that don't have a
/// container of their own. Any container can be reduced over by
/// implementing [`ParticleCollection`].
///
/// A hierarchy always has a coarsest level (level 0), even when it holds no
/// particles.
#[derive(Clone, Debug)]
pub struct ParticleLevels<P> {
    levels: Vec<Vec<Vec<P>>>,
}

impl<P> Default for ParticleLevels<P> {
    fn default() -> Self {
        Self::new()
    }
}

impl<P> ParticleLevels<P> {
    /// create a hierarchy with a single empty level
    pub fn new() -> Self {
        ParticleLevels {
            levels: vec![Vec::new()],
        }
    }

    /// append a new (empty) finest level and return its index
    pub fn add_level(&mut self) -> usize {
        self.levels.push(Vec::new());
        self.levels.len() - 1
    }

    /// append a tile to `level`. Empty tiles are allowed.
    pub fn push_tile(&mut self, level: usize, particles: Vec<P>) -> Result<(), Error> {
        let finest_level = self.finest_level();
        match self.levels.get_mut(level) {
            Some(tiles) => {
                tiles.push(particles);
                Ok(())
            }
            None => Err(Error::level_range(level, level, finest_level)),
        }
    }

    /// the number of tiles on `level` (0 for a level that doesn't exist)
    pub fn num_tiles(&self, level: usize) -> usize {
        self.levels.get(level).map_or(0, Vec::len)
    }

    /// the total number of particles across every level
    pub fn num_particles(&self) -> usize {
        self.levels
            .iter()
            .flat_map(|tiles| tiles.iter())
            .map(Vec::len)
            .sum()
    }
}

impl<P> From<Vec<Vec<Vec<P>>>> for ParticleLevels<P> {
    /// an empty outer vector produces a hierarchy with a single empty level
    fn from(mut levels: Vec<Vec<Vec<P>>>) -> Self {
        if levels.is_empty() {
            levels.push(Vec::new());
        }
        ParticleLevels { levels }
    }
}

impl<P> ParticleCollection for ParticleLevels<P> {
    type Particle = P;
    type Tiles<'a>
        = std::iter::Map<std::slice::Iter<'a, Vec<P>>, fn(&'a Vec<P>) -> &'a [P]>
    where
        Self: 'a;

    fn finest_level(&self) -> usize {
        self.levels.len() - 1
    }

    fn tiles<'a>(&'a self, level: usize) -> Self::Tiles<'a> {
        let tiles: &'a [Vec<P>] = self.levels.get(level).map_or(&[][..], Vec::as_slice);
        let as_slice: fn(&'a Vec<P>) -> &'a [P] = Vec::as_slice;
        tiles.iter().map(as_slice)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn build_hierarchy() {
        let mut levels = ParticleLevels::new();
        assert_eq!(levels.finest_level(), 0);
        assert_eq!(levels.num_particles(), 0);
        assert_eq!(levels.tiles(0).count(), 0);

        levels.push_tile(0, vec![1, 2]).unwrap();
        levels.push_tile(0, vec![]).unwrap();
        assert_eq!(levels.add_level(), 1);
        levels.push_tile(1, vec![3, 4, 5]).unwrap();
        assert!(levels.push_tile(2, vec![6]).is_err());

        assert_eq!(levels.finest_level(), 1);
        assert_eq!(levels.num_tiles(0), 2);
        assert_eq!(levels.num_tiles(7), 0);
        assert_eq!(levels.num_particles(), 5);

        let tile_lens: Vec<usize> = levels.tiles(0).map(<[i32]>::len).collect();
        assert_eq!(tile_lens, [2, 0]);
        assert_eq!(levels.tiles(1).next().unwrap(), &[3, 4, 5]);
    }

    #[test]
    fn from_nested_vec() {
        let levels = ParticleLevels::from(Vec::<Vec<Vec<f64>>>::new());
        assert_eq!(levels.finest_level(), 0);

        let levels = ParticleLevels::from(vec![vec![vec![1.0]], vec![], vec![vec![2.0, 3.0]]]);
        assert_eq!(levels.finest_level(), 2);
        assert_eq!(levels.tiles(1).count(), 0);
        assert_eq!(levels.num_particles(), 3);
    }
}
