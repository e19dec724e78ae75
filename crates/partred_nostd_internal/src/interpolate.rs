//! Grid-to-particle interpolation kernels.
//!
//! These are the leaf formulas used to sample mesh data at particle
//! positions (e.g. to compute a particle's velocity from a velocity field
//! before reducing over the particles). They operate on plain positions so
//! that they stay agnostic about the particle layout.
//!
//! Field data is accessed through views that carry the global index of
//! their first cell (the views of a tile's field data generally don't start
//! at index 0).
//!
//! Only 3D meshes are supported.

use ndarray::{ArrayView3, ArrayView4, Axis};

/// Wraps a cell-centered field with 3 or more components.
///
/// `data[[i, j, k, comp]]` holds component `comp` of cell `(lo[0] + i,
/// lo[1] + j, lo[2] + k)`.
#[derive(Clone)]
pub struct FieldView<'a> {
    data: ArrayView4<'a, f64>,
    lo: [isize; 3],
}

impl<'a> FieldView<'a> {
    pub fn new(data: ArrayView4<'a, f64>, lo: [isize; 3]) -> Result<Self, &'static str> {
        if data.len_of(Axis(3)) < 3 {
            Err("a cell-centered field needs at least 3 components")
        } else {
            Ok(Self { data, lo })
        }
    }

    /// access a value using global cell indices
    ///
    /// # Panics
    /// When the indices lie outside of the view
    #[inline(always)]
    pub fn get(&self, i: isize, j: isize, k: isize, comp: usize) -> f64 {
        self.data[[
            (i - self.lo[0]) as usize,
            (j - self.lo[1]) as usize,
            (k - self.lo[2]) as usize,
            comp,
        ]]
    }
}

/// Wraps a single-component face-centered (staggered) field.
///
/// `data[[i, j, k]]` holds the value on face `(lo[0] + i, lo[1] + j,
/// lo[2] + k)`.
#[derive(Clone)]
pub struct FaceFieldView<'a> {
    data: ArrayView3<'a, f64>,
    lo: [isize; 3],
}

impl<'a> FaceFieldView<'a> {
    pub fn new(data: ArrayView3<'a, f64>, lo: [isize; 3]) -> Self {
        Self { data, lo }
    }

    /// access a value using global face indices
    ///
    /// # Panics
    /// When the indices lie outside of the view
    #[inline(always)]
    pub fn get(&self, i: isize, j: isize, k: isize) -> f64 {
        self.data[[
            (i - self.lo[0]) as usize,
            (j - self.lo[1]) as usize,
            (k - self.lo[2]) as usize,
        ]]
    }
}

// NOTE: f64::floor isn't available in no_std crates
#[inline(always)]
fn floor_to_isize(x: f64) -> isize {
    let truncated = x as isize;
    if (truncated as f64) > x {
        truncated - 1
    } else {
        truncated
    }
}

/// the lower stencil index and the pair of linear weights along 1 axis
#[inline(always)]
fn stencil_1d(pos: f64, plo: f64, dxi: f64, shift: f64) -> (isize, [f64; 2]) {
    let l = (pos - plo) * dxi - shift;
    let i = floor_to_isize(l);
    let frac = l - (i as f64);
    (i, [1.0 - frac, frac])
}

/// Trilinear (cloud-in-cell) interpolation of the first 3 components of a
/// cell-centered field at position `pos`.
///
/// `plo` is the physical position of the lower corner of cell `(0,0,0)` and
/// `dxi` is the inverse cell width along each axis. Cell `i` is centered at
/// `plo + (i + 0.5) / dxi`.
pub fn cic_interpolate(
    pos: &[f64; 3],
    plo: &[f64; 3],
    dxi: &[f64; 3],
    field: &FieldView,
) -> [f64; 3] {
    let (i, sx) = stencil_1d(pos[0], plo[0], dxi[0], 0.5);
    let (j, sy) = stencil_1d(pos[1], plo[1], dxi[1], 0.5);
    let (k, sz) = stencil_1d(pos[2], plo[2], dxi[2], 0.5);

    let mut val = [0.0; 3];
    for (comp, out) in val.iter_mut().enumerate() {
        for (kk, wz) in sz.iter().enumerate() {
            for (jj, wy) in sy.iter().enumerate() {
                for (ii, wx) in sx.iter().enumerate() {
                    *out += wx
                        * wy
                        * wz
                        * field.get(i + ii as isize, j + jj as isize, k + kk as isize, comp);
                }
            }
        }
    }
    val
}

/// Interpolation of a staggered (face-centered) vector field at position
/// `pos`.
///
/// Component `d` of the result is interpolated from `faces[d]`, whose values
/// live on the faces normal to axis `d`. Along axis `d` the values sit on
/// cell faces (no half-cell shift); along the other axes they sit at cell
/// centers.
pub fn mac_interpolate(
    pos: &[f64; 3],
    plo: &[f64; 3],
    dxi: &[f64; 3],
    faces: &[FaceFieldView; 3],
) -> [f64; 3] {
    let mut val = [0.0; 3];
    for (d, out) in val.iter_mut().enumerate() {
        let shift = |axis: usize| if axis == d { 0.0 } else { 0.5 };
        let (i, sx) = stencil_1d(pos[0], plo[0], dxi[0], shift(0));
        let (j, sy) = stencil_1d(pos[1], plo[1], dxi[1], shift(1));
        let (k, sz) = stencil_1d(pos[2], plo[2], dxi[2], shift(2));

        for (kk, wz) in sz.iter().enumerate() {
            for (jj, wy) in sy.iter().enumerate() {
                for (ii, wx) in sx.iter().enumerate() {
                    *out += wx
                        * wy
                        * wz
                        * faces[d].get(i + ii as isize, j + jj as isize, k + kk as isize);
                }
            }
        }
    }
    val
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn floor_negative() {
        assert_eq!(floor_to_isize(1.5), 1);
        assert_eq!(floor_to_isize(-0.5), -1);
        assert_eq!(floor_to_isize(-2.0), -2);
        assert_eq!(floor_to_isize(0.0), 0);
    }

    #[test]
    fn cic_reproduces_linear_field() {
        // a field that is linear in the cell-center coordinates is
        // reproduced exactly by trilinear interpolation
        let shape = (4, 4, 4, 3);
        let mut buf = [0.0; 4 * 4 * 4 * 3];
        let dx = 0.5;
        let plo = [1.0, -1.0, 0.0];
        let lo = [-1_isize, 0, 2];
        {
            let mut data = ndarray::ArrayViewMut4::from_shape(shape, &mut buf).unwrap();
            for ((a, b, c, comp), v) in data.indexed_iter_mut() {
                let x = plo[0] + ((a as isize + lo[0]) as f64 + 0.5) * dx;
                let y = plo[1] + ((b as isize + lo[1]) as f64 + 0.5) * dx;
                let z = plo[2] + ((c as isize + lo[2]) as f64 + 0.5) * dx;
                *v = (comp as f64 + 1.0) * (2.0 * x - 3.0 * y + 0.5 * z);
            }
        }
        let field = FieldView::new(ArrayView4::from_shape(shape, &buf).unwrap(), lo).unwrap();
        let dxi = [1.0 / dx; 3];

        let pos = [0.9, -0.6, 1.7];
        let expected = 2.0 * pos[0] - 3.0 * pos[1] + 0.5 * pos[2];
        let val = cic_interpolate(&pos, &plo, &dxi, &field);
        for (comp, v) in val.iter().enumerate() {
            let reference = (comp as f64 + 1.0) * expected;
            assert!((v - reference).abs() < 1e-12, "{v} vs {reference}");
        }
    }

    #[test]
    fn field_view_needs_3_components() {
        let buf = [0.0; 8];
        let view = ArrayView4::from_shape((2, 2, 1, 2), &buf).unwrap();
        assert!(FieldView::new(view, [0, 0, 0]).is_err());
    }

    #[test]
    fn mac_uniform_faces() {
        let bx = [1.0; 27];
        let by = [2.0; 27];
        let bz = [-3.0; 27];
        let faces = [
            FaceFieldView::new(ArrayView3::from_shape((3, 3, 3), &bx).unwrap(), [0, 0, 0]),
            FaceFieldView::new(ArrayView3::from_shape((3, 3, 3), &by).unwrap(), [0, 0, 0]),
            FaceFieldView::new(ArrayView3::from_shape((3, 3, 3), &bz).unwrap(), [0, 0, 0]),
        ];
        let val = mac_interpolate(&[0.7, 0.8, 0.9], &[0.0; 3], &[1.0; 3], &faces);
        assert!((val[0] - 1.0).abs() < 1e-14);
        assert!((val[1] - 2.0).abs() < 1e-14);
        assert!((val[2] + 3.0).abs() < 1e-14);
    }
}
