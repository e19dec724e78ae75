use ndarray::Array4;
use partred::{
    FaceFieldView, FieldView, ParticleLevels, cic_interpolate, mac_interpolate, reduce_logical_and,
    reduce_max, reduce_sum,
};
use partred_test::{GridDescr, LinearCoefs, eval_linear};

mod common;

use common::{NamedConfig, all_configs, init_logging, isclose};

const COEFS: [LinearCoefs; 3] = [
    [1.0, 2.0, -1.0, 0.5],
    [-3.0, 0.0, 4.0, 1.0],
    [0.25, -0.5, 0.5, -2.0],
];

fn grid() -> GridDescr {
    GridDescr {
        lo: [-4, 2, 0],
        shape: [8, 6, 10],
        plo: [-1.0, 0.5, 2.0],
        dx: [0.125, 0.25, 0.1],
    }
}

/// split the positions into 2 levels of unevenly sized tiles
fn positions_as_levels(positions: Vec<[f64; 3]>) -> ParticleLevels<[f64; 3]> {
    let mut levels = ParticleLevels::new();
    let finer = levels.add_level();
    for (i, chunk) in positions.chunks(1 + positions.len() / 7).enumerate() {
        levels.push_tile(i % 2, chunk.to_vec()).unwrap();
    }
    levels.push_tile(finer, vec![]).unwrap();
    levels
}

#[test]
fn cic_velocity_reductions() {
    init_logging();
    let grid = grid();
    let field_data = grid.linear_cell_field(&COEFS);
    let field = FieldView::new(field_data.view(), grid.lo).unwrap();
    let plo = grid.plo;
    let dxi = grid.dxi();

    let positions = grid.random_interior_positions(500, 17);
    let ref_sum: f64 = positions.iter().map(|p| eval_linear(&COEFS[0], p)).sum();
    let ref_max = positions
        .iter()
        .map(|p| eval_linear(&COEFS[1], p))
        .fold(f64::MIN, f64::max);
    let levels = positions_as_levels(positions);

    let vel = |comp: usize| {
        let field = &field;
        move |p: &[f64; 3]| cic_interpolate(p, &plo, &dxi, field)[comp]
    };

    for NamedConfig { name, config } in all_configs() {
        let sum = reduce_sum(&levels, vel(0), &config).unwrap();
        assert!(isclose(sum, ref_sum, 1e-10, 1e-10), "{name}: {sum} vs {ref_sum}");
        let max = reduce_max(&levels, vel(1), &config).unwrap();
        assert!(isclose(max, ref_max, 1e-12, 1e-12), "{name}: {max} vs {ref_max}");
    }
}

#[test]
fn field_needs_3_components() {
    let two_comps = Array4::<f64>::zeros((3, 3, 3, 2));
    assert!(FieldView::new(two_comps.view(), [0, 0, 0]).is_err());
    let three_comps = Array4::<f64>::zeros((3, 3, 3, 3));
    assert!(FieldView::new(three_comps.view(), [0, 0, 0]).is_ok());
}

#[test]
fn mac_velocity_reductions() {
    let grid = grid();
    let face_data: Vec<_> = (0..3)
        .map(|axis| grid.linear_face_field(axis, &COEFS[axis]))
        .collect();
    let faces = [
        FaceFieldView::new(face_data[0].view(), grid.lo),
        FaceFieldView::new(face_data[1].view(), grid.lo),
        FaceFieldView::new(face_data[2].view(), grid.lo),
    ];
    let plo = grid.plo;
    let dxi = grid.dxi();

    let positions = grid.random_interior_positions(300, 4);
    for p in positions.iter().take(20) {
        let val = mac_interpolate(p, &plo, &dxi, &faces);
        for (comp, v) in val.iter().enumerate() {
            let reference = eval_linear(&COEFS[comp], p);
            assert!(isclose(*v, reference, 1e-12, 1e-12), "{v} vs {reference}");
        }
    }

    let ref_sum: f64 = positions.iter().map(|p| eval_linear(&COEFS[2], p)).sum();
    let bound = positions
        .iter()
        .map(|p| eval_linear(&COEFS[2], p).abs())
        .fold(0.0, f64::max);
    let levels = positions_as_levels(positions);
    let faces = &faces;
    let vz = move |p: &[f64; 3]| mac_interpolate(p, &plo, &dxi, faces)[2];

    for NamedConfig { name, config } in all_configs() {
        let sum = reduce_sum(&levels, vz, &config).unwrap();
        assert!(isclose(sum, ref_sum, 1e-10, 1e-10), "{name}: {sum} vs {ref_sum}");
        let bounded = reduce_logical_and(&levels, move |p| vz(p).abs() <= bound + 1e-9, &config);
        assert!(bounded.unwrap(), "{name}");
    }
}
