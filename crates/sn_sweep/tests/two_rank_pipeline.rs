// crates/sn_sweep/tests/two_rank_pipeline.rs

//! 两分区等待行为对比
//!
//! 板网格上 μ<0 与 μ>0 两个角度集的跨分区依赖方向相反：分区 0 的
//! μ>0 链独立起步，μ<0 链要等分区 1 的消息。把分区 1 人为放慢后：
//!
//! - Pipelined: 分区 0 在等消息期间先跑完独立的 μ>0 链
//! - Strict: 分区 0 卡在编号靠前的 μ<0 角度集上，μ>0 工作被推迟

use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use sn_foundation::error::SnResult;
use sn_foundation::indices::{rank, RankIndex};
use sn_mesh::SlabMeshBuilder;
use sn_sweep::kernel::{CellSweepContext, CellSweepOutput, SweepKernel};
use sn_sweep::prelude::*;

#[derive(Debug, Clone)]
struct TraceEvent {
    owner: RankIndex,
    mu_positive: bool,
    elapsed: Duration,
}

/// 透传核：记录每次执行的 (分区, 方向符号, 时刻)，可按分区注入延迟
struct TraceKernel {
    events: Arc<Mutex<Vec<TraceEvent>>>,
    epoch: Instant,
    slow_rank: RankIndex,
    delay: Duration,
}

impl SweepKernel for TraceKernel {
    fn flux_width(&self) -> usize {
        1
    }

    fn execute(&self, ctx: CellSweepContext<'_>) -> SnResult<CellSweepOutput> {
        if ctx.cell.owner == self.slow_rank {
            std::thread::sleep(self.delay);
        }
        self.events.lock().unwrap().push(TraceEvent {
            owner: ctx.cell.owner,
            mu_positive: ctx.direction.omega.x > 0.0,
            elapsed: self.epoch.elapsed(),
        });

        let mut psi = 0.0;
        let mut n = 0usize;
        for slot in ctx.incoming.iter().flatten() {
            psi += slot[0];
            n += 1;
        }
        if n > 0 {
            psi /= n as f64;
        }
        Ok(CellSweepOutput {
            outgoing: ctx
                .incoming
                .iter()
                .map(|s| s.is_none().then(|| vec![psi]))
                .collect(),
            moment: vec![ctx.direction.weight * psi],
        })
    }
}

fn run_trace(algorithm: SchedulingAlgorithm) -> Vec<TraceEvent> {
    let mesh = Arc::new(SlabMeshBuilder::new(6, 1.0).with_ranks(2).build().unwrap());
    let quad = Arc::new(AngularQuadrature::gauss_legendre(2).unwrap());
    let events = Arc::new(Mutex::new(Vec::new()));
    let kernel = Arc::new(TraceKernel {
        events: Arc::clone(&events),
        epoch: Instant::now(),
        slow_rank: rank(1),
        delay: Duration::from_millis(100),
    });

    let config = SweepRunConfig {
        n_passes: 1,
        aggregation: AngleAggregation::Octant,
        scheduler: SchedulerConfig {
            algorithm,
            recv_timeout_ms: 10_000,
        },
        boundaries: vec![
            BoundaryConfig::vacuum("xmin"),
            BoundaryConfig::vacuum("xmax"),
        ],
    };
    run_sweep(mesh, quad, kernel, &config).unwrap();

    let events = events.lock().unwrap().clone();
    events
}

#[test]
fn test_pipelined_overlaps_independent_work() {
    let events = run_trace(SchedulingAlgorithm::Pipelined);

    let rank1_first = events
        .iter()
        .filter(|e| e.owner == rank(1))
        .map(|e| e.elapsed)
        .min()
        .unwrap();
    let rank0_pos: Vec<Duration> = events
        .iter()
        .filter(|e| e.owner == rank(0) && e.mu_positive)
        .map(|e| e.elapsed)
        .collect();

    assert_eq!(rank0_pos.len(), 3);
    // 分区 0 的独立 μ>0 链在分区 1 完成第一个单元（至少 100ms 延迟）
    // 之前就已全部执行，等待消息没有阻塞其他角度集
    for t in &rank0_pos {
        assert!(
            *t < rank1_first,
            "Pipelined 下 μ>0 执行 ({:?}) 晚于分区 1 首个事件 ({:?})",
            t,
            rank1_first
        );
    }
}

#[test]
fn test_strict_defers_later_angle_sets() {
    let events = run_trace(SchedulingAlgorithm::Strict);

    let rank1_first = events
        .iter()
        .filter(|e| e.owner == rank(1))
        .map(|e| e.elapsed)
        .min()
        .unwrap();
    let rank0_pos_first = events
        .iter()
        .filter(|e| e.owner == rank(0) && e.mu_positive)
        .map(|e| e.elapsed)
        .min()
        .unwrap();

    // 分区 0 先困在 μ<0 角度集上等分区 1 的消息，μ>0 工作只能
    // 排在分区 1 开工之后
    assert!(
        rank0_pos_first > rank1_first,
        "Strict 下 μ>0 首个执行 ({:?}) 不应早于分区 1 首个事件 ({:?})",
        rank0_pos_first,
        rank1_first
    );
}
