// crates/sn_sweep/tests/reflecting_slab.rs

//! 反射边界的滞后反馈收敛
//!
//! 反射面通量不进依赖图，靠多遍扫描逐遍逼近自洽值。本文件验证：
//! 全反射槽收敛到无限介质解；半槽反射与镜像加倍的全槽逐位等价。

use std::sync::Arc;
use sn_mesh::SlabMeshBuilder;
use sn_sweep::prelude::*;

fn solve(
    n_cells: usize,
    length: f64,
    boundaries: Vec<BoundaryConfig>,
    sigma_t: f64,
    source: f64,
    n_passes: usize,
) -> SweepSolution {
    let mesh = Arc::new(SlabMeshBuilder::new(n_cells, length).build().unwrap());
    let quad = Arc::new(AngularQuadrature::gauss_legendre(4).unwrap());
    let kernel = Arc::new(AttenuationKernel::new(sigma_t, source).unwrap());
    let config = SweepRunConfig {
        n_passes,
        aggregation: AngleAggregation::Octant,
        scheduler: SchedulerConfig::default(),
        boundaries,
    };
    run_sweep(mesh, quad, kernel, &config).unwrap()
}

#[test]
fn test_fully_reflecting_reaches_infinite_medium() {
    // 两侧全反射、均匀源：自洽解是各向同性的 ψ = q/σ，
    // 角矩 = Σw·(q/σ) = 2·q/σ
    let solution = solve(
        4,
        2.0,
        vec![
            BoundaryConfig::reflecting("xmin"),
            BoundaryConfig::reflecting("xmax"),
        ],
        1.0,
        1.0,
        40,
    );

    for c in 0..4 {
        let m = solution.moment(c, 0).unwrap();
        assert!((m - 2.0).abs() < 1e-9, "单元 {} 角矩 {} 未收敛", c, m);
    }

    // 反射偏差逐遍衰减直至可忽略
    let deltas = &solution.reflecting_deltas;
    assert!(deltas[0] > 0.0);
    assert!(deltas[1] < deltas[0]);
    assert!(*deltas.last().unwrap() < 1e-9);
}

#[test]
fn test_half_slab_matches_mirrored_full_slab() {
    // [0,1] 左反射右真空 ≡ [0,2] 两侧真空的右半段（对称性）
    let sigma_t = 1.5;
    let source = 0.8;

    let half = solve(
        3,
        1.0,
        vec![
            BoundaryConfig::reflecting("xmin"),
            BoundaryConfig::vacuum("xmax"),
        ],
        sigma_t,
        source,
        20,
    );
    let full = solve(
        6,
        2.0,
        vec![
            BoundaryConfig::vacuum("xmin"),
            BoundaryConfig::vacuum("xmax"),
        ],
        sigma_t,
        source,
        20,
    );

    for c in 0..3 {
        let h = half.moment(c, 0).unwrap();
        let f = full.moment(3 + c, 0).unwrap();
        assert!(
            (h - f).abs() < 1e-9,
            "半槽单元 {} ({}) 与全槽镜像 ({}) 不符",
            c,
            h,
            f
        );
    }
}
