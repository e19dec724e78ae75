use ndarray::{Array3, Array4};
use rand::distr::{Distribution, Uniform};
use rand_xoshiro::Xoshiro256PlusPlus;
use rand_xoshiro::rand_core::SeedableRng;

/// A particle record used throughout the tests and benchmarks
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TestParticle {
    pub pos: [f64; 3],
    pub vel: [f64; 3],
    pub mass: f64,
    pub id: u64,
}

impl TestParticle {
    pub fn speed(&self) -> f64 {
        (self.vel[0] * self.vel[0] + self.vel[1] * self.vel[1] + self.vel[2] * self.vel[2]).sqrt()
    }
}

/// build a hierarchy of randomly generated particles.
///
/// `tiles_per_level[lev]` gives the number of tiles on level `lev`. Each tile
/// holds between 0 and `max_particles_per_tile` particles (so some tiles are
/// generally empty). Positions are drawn from the unit cube, velocity
/// components from `[-1, 1]` and masses from `[0.5, 2]`. Particle ids are
/// unique and increase in the order that particles are generated.
pub fn random_hierarchy(
    tiles_per_level: &[usize],
    max_particles_per_tile: usize,
    seed: u64,
) -> Vec<Vec<Vec<TestParticle>>> {
    let mut my_rng = Xoshiro256PlusPlus::seed_from_u64(seed);
    let count_dist = Uniform::try_from(0..=max_particles_per_tile).unwrap();
    let pos_dist = Uniform::try_from(0.0..1.0).unwrap();
    let vel_dist = Uniform::try_from(-1.0..=1.0).unwrap();
    let mass_dist = Uniform::try_from(0.5..=2.0).unwrap();

    let mut next_id = 0;
    let mut levels = Vec::with_capacity(tiles_per_level.len());
    for n_tiles in tiles_per_level.iter().copied() {
        let mut tiles = Vec::with_capacity(n_tiles);
        for _ in 0..n_tiles {
            let n_particles = count_dist.sample(&mut my_rng);
            let mut tile = Vec::with_capacity(n_particles);
            for _ in 0..n_particles {
                tile.push(TestParticle {
                    pos: std::array::from_fn(|_| pos_dist.sample(&mut my_rng)),
                    vel: std::array::from_fn(|_| vel_dist.sample(&mut my_rng)),
                    mass: mass_dist.sample(&mut my_rng),
                    id: next_id,
                });
                next_id += 1;
            }
            tiles.push(tile);
        }
        levels.push(tiles);
    }
    levels
}

/// the coefficients of a linear function: `c[0] + c[1]*x + c[2]*y + c[3]*z`
pub type LinearCoefs = [f64; 4];

pub fn eval_linear(coefs: &LinearCoefs, pos: &[f64; 3]) -> f64 {
    coefs[0] + coefs[1] * pos[0] + coefs[2] * pos[1] + coefs[3] * pos[2]
}

/// Describes the index space and geometry of a uniform grid.
///
/// Cell `(i, j, k)` spans `plo + [i, i+1) * dx` (along each axis) and the
/// arrays built from this description start at the global index `lo`.
#[derive(Clone, Copy, Debug)]
pub struct GridDescr {
    pub lo: [isize; 3],
    pub shape: [usize; 3],
    pub plo: [f64; 3],
    pub dx: [f64; 3],
}

impl GridDescr {
    pub fn dxi(&self) -> [f64; 3] {
        [1.0 / self.dx[0], 1.0 / self.dx[1], 1.0 / self.dx[2]]
    }

    /// the physical position of a point, given in (fractional) global index
    /// coordinates
    fn position(&self, idx: [f64; 3]) -> [f64; 3] {
        std::array::from_fn(|d| self.plo[d] + idx[d] * self.dx[d])
    }

    /// build a cell-centered field where component `comp` samples the linear
    /// function `coefs[comp]` at the cell centers
    pub fn linear_cell_field(&self, coefs: &[LinearCoefs; 3]) -> Array4<f64> {
        let [nx, ny, nz] = self.shape;
        Array4::from_shape_fn((nx, ny, nz, 3), |(i, j, k, comp)| {
            let center = self.position([
                (self.lo[0] + i as isize) as f64 + 0.5,
                (self.lo[1] + j as isize) as f64 + 0.5,
                (self.lo[2] + k as isize) as f64 + 0.5,
            ]);
            eval_linear(&coefs[comp], &center)
        })
    }

    /// build the face-centered field normal to `axis` that samples the
    /// linear function `coefs` at the face centers. There is 1 more face
    /// than cells along `axis`.
    pub fn linear_face_field(&self, axis: usize, coefs: &LinearCoefs) -> Array3<f64> {
        let mut shape = self.shape;
        shape[axis] += 1;
        Array3::from_shape_fn((shape[0], shape[1], shape[2]), |(i, j, k)| {
            let idx = [i, j, k];
            let face_center = self.position(std::array::from_fn(|d| {
                let offset = if d == axis { 0.0 } else { 0.5 };
                (self.lo[d] + idx[d] as isize) as f64 + offset
            }));
            eval_linear(coefs, &face_center)
        })
    }

    /// draw `n` random positions that are far enough inside the grid for an
    /// interpolation stencil to stay within the grid's cells
    pub fn random_interior_positions(&self, n: usize, seed: u64) -> Vec<[f64; 3]> {
        let mut my_rng = Xoshiro256PlusPlus::seed_from_u64(seed);
        let dists: [Uniform<f64>; 3] = std::array::from_fn(|d| {
            let lo = (self.lo[d] as f64) + 1.0;
            let hi = (self.lo[d] + self.shape[d] as isize) as f64 - 1.0;
            Uniform::try_from(lo..hi).unwrap()
        });
        (0..n)
            .map(|_| self.position(std::array::from_fn(|d| dists[d].sample(&mut my_rng))))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hierarchy_is_reproducible() {
        let a = random_hierarchy(&[3, 5], 20, 42);
        let b = random_hierarchy(&[3, 5], 20, 42);
        assert_eq!(a, b);
        assert_eq!(a.len(), 2);
        assert_eq!(a[1].len(), 5);

        let ids: Vec<u64> = a.iter().flatten().flatten().map(|p| p.id).collect();
        let expected: Vec<u64> = (0..ids.len() as u64).collect();
        assert_eq!(ids, expected);
    }

    #[test]
    fn face_field_shape() {
        let grid = GridDescr {
            lo: [-2, 0, 3],
            shape: [4, 5, 6],
            plo: [0.0; 3],
            dx: [0.25; 3],
        };
        assert_eq!(grid.linear_face_field(1, &[1.0, 0.0, 0.0, 0.0]).shape(), &[4, 6, 6]);
        assert_eq!(grid.linear_cell_field(&[[0.0; 4]; 3]).shape(), &[4, 5, 6, 3]);
    }
}
