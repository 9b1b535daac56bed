// crates/sn_sweep/tests/abort_restart.rs

//! 中止后重跑的一致性
//!
//! 角矩只在整遍完成时一次性提交，遍内任何失败经 abort 清理后
//! 重跑，结果必须与从未中断的运行逐位一致。

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use sn_foundation::error::{SnError, SnResult};
use sn_mesh::SlabMeshBuilder;
use sn_sweep::kernel::{CellSweepContext, CellSweepOutput, SweepKernel};
use sn_sweep::prelude::*;
use sn_sweep::PassState;

/// 在第 `fail_at` 次执行上失败一次的衰减核
struct FlakyKernel {
    inner: AttenuationKernel,
    count: AtomicUsize,
    fail_at: usize,
}

impl FlakyKernel {
    fn new(sigma_t: f64, source: f64, fail_at: usize) -> Self {
        Self {
            inner: AttenuationKernel::new(sigma_t, source).unwrap(),
            count: AtomicUsize::new(0),
            fail_at,
        }
    }
}

impl SweepKernel for FlakyKernel {
    fn flux_width(&self) -> usize {
        self.inner.flux_width()
    }

    fn execute(&self, ctx: CellSweepContext<'_>) -> SnResult<CellSweepOutput> {
        let n = self.count.fetch_add(1, Ordering::SeqCst) + 1;
        if n == self.fail_at {
            return Err(SnError::numerical_kernel("注入的瞬态故障"));
        }
        self.inner.execute(ctx)
    }
}

fn make_scheduler(kernel: Arc<dyn SweepKernel>) -> SweepScheduler {
    let mesh = Arc::new(SlabMeshBuilder::new(4, 1.0).build().unwrap());
    let quad = Arc::new(AngularQuadrature::gauss_legendre(2).unwrap());
    let sets = build_angle_sets(&quad, AngleAggregation::Octant);
    let comm = sn_sweep::SweepComm::for_ranks(1).unwrap().pop().unwrap();
    let boundaries = vec![
        BoundaryConfig::incident_isotropic("xmin", vec![1.0]),
        BoundaryConfig::vacuum("xmax"),
    ];
    SweepScheduler::new(
        mesh,
        quad,
        sets,
        kernel,
        &boundaries,
        comm,
        SchedulerConfig::default(),
    )
    .unwrap()
}

#[test]
fn test_abort_then_rerun_matches_uninterrupted() {
    // 对照组：从不失败
    let mut control = make_scheduler(Arc::new(AttenuationKernel::new(1.2, 0.5).unwrap()));
    control.prepare().unwrap();
    control.execute_pass(PassScope::All).unwrap();

    // 实验组：第 3 次单元执行失败一次
    let mut flaky = make_scheduler(Arc::new(FlakyKernel::new(1.2, 0.5, 3)));
    flaky.prepare().unwrap();
    let err = flaky.execute_pass(PassScope::All).unwrap_err();
    assert!(matches!(err, SnError::NumericalKernel { .. }));

    // 失败的遍未提交任何角矩
    assert!(flaky.moments().iter().all(|&m| m == 0.0));

    flaky.abort();
    assert_eq!(flaky.state(), PassState::Ready);
    flaky.execute_pass(PassScope::All).unwrap();

    assert_eq!(flaky.moments(), control.moments());
}

#[test]
fn test_committed_moments_survive_aborted_pass() {
    // 第一遍成功（8 次执行），第二遍中途失败
    let mut s = make_scheduler(Arc::new(FlakyKernel::new(0.7, 1.0, 11)));
    s.prepare().unwrap();
    s.execute_pass(PassScope::All).unwrap();
    let committed = s.moments().to_vec();
    assert!(committed.iter().any(|&m| m != 0.0));

    s.reset();
    assert!(s.execute_pass(PassScope::All).is_err());
    // 失败的第二遍不得触碰已提交的角矩
    assert_eq!(s.moments(), committed.as_slice());

    // 清理重跑：问题是定常的，第二遍结果与第一遍相同
    s.abort();
    s.execute_pass(PassScope::All).unwrap();
    assert_eq!(s.moments(), committed.as_slice());
}
