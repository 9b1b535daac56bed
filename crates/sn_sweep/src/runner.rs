// crates/sn_sweep/src/runner.rs

//! 多分区扫描驱动
//!
//! 把"每分区一个调度器"的模型落到线程上：每个分区一个工作线程，
//! 独占自己的通信端点与调度器，跑满固定遍数后汇合；全局角矩按
//! 分区归属拼装。遍数固定使各分区天然对齐，无需额外的全局判停。

use crate::angleset::{build_angle_sets, AngleAggregation};
use crate::boundary::BoundaryConfig;
use crate::comm::SweepComm;
use crate::kernel::SweepKernel;
use crate::quadrature::AngularQuadrature;
use crate::scheduler::{PassReport, PassScope, SchedulerConfig, SweepScheduler};
use serde::{Deserialize, Serialize};
use sn_foundation::error::{SnError, SnResult};
use sn_foundation::indices::RankIndex;
use sn_mesh::SweepMesh;
use std::sync::Arc;

/// 一次扫描求解的配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SweepRunConfig {
    /// 扫描遍数（反射边界的滞后反馈靠多遍收敛）
    #[serde(default = "default_n_passes")]
    pub n_passes: usize,
    /// 角度集聚合策略
    #[serde(default)]
    pub aggregation: AngleAggregation,
    /// 调度器配置
    #[serde(default)]
    pub scheduler: SchedulerConfig,
    /// 边界条件
    pub boundaries: Vec<BoundaryConfig>,
}

fn default_n_passes() -> usize {
    1
}

/// 扫描求解结果
#[derive(Debug, Clone)]
pub struct SweepSolution {
    /// 全局角矩（全局单元 × 宽度，行主序）
    pub moments: Vec<f64>,
    /// 通量宽度
    pub width: usize,
    /// 每遍反射面通量偏差的全分区最大值
    pub reflecting_deltas: Vec<f64>,
    /// 全部遍报告（按分区、按遍）
    pub reports: Vec<Vec<PassReport>>,
}

impl SweepSolution {
    /// 单元第 `k` 个角矩分量
    pub fn moment(&self, cell: usize, k: usize) -> SnResult<f64> {
        let idx = cell * self.width + k;
        self.moments
            .get(idx)
            .copied()
            .ok_or_else(|| SnError::index_out_of_bounds("moment", idx, self.moments.len()))
    }
}

struct RankOutcome {
    rank: RankIndex,
    moments: Vec<f64>,
    reports: Vec<PassReport>,
}

/// 执行完整的多遍扫描求解
///
/// 每个分区一个线程；任一分区出错时整个求解失败并返回该错误。
pub fn run_sweep(
    mesh: Arc<SweepMesh>,
    quadrature: Arc<AngularQuadrature>,
    kernel: Arc<dyn SweepKernel>,
    config: &SweepRunConfig,
) -> SnResult<SweepSolution> {
    if config.n_passes == 0 {
        return Err(SnError::invalid_input("扫描遍数必须大于 0"));
    }
    mesh.validate_adjacency()?;

    let angle_sets = build_angle_sets(&quadrature, config.aggregation);
    let width = kernel.flux_width();
    let n_ranks = mesh.num_ranks();
    let comms = SweepComm::for_ranks(n_ranks)?;

    log::info!(
        "扫描求解开始: {} 分区, {} 单元, {} 方向, {} 角度集, {} 遍",
        n_ranks,
        mesh.n_cells(),
        quadrature.n_directions(),
        angle_sets.len(),
        config.n_passes
    );

    let mut handles = Vec::with_capacity(n_ranks);
    for comm in comms {
        let mesh = Arc::clone(&mesh);
        let quadrature = Arc::clone(&quadrature);
        let kernel = Arc::clone(&kernel);
        let angle_sets = angle_sets.clone();
        let boundaries = config.boundaries.clone();
        let scheduler_config = config.scheduler.clone();
        let n_passes = config.n_passes;

        handles.push(std::thread::spawn(move || -> SnResult<RankOutcome> {
            let rank = comm.rank();
            let mut scheduler = SweepScheduler::new(
                mesh,
                quadrature,
                angle_sets,
                kernel,
                &boundaries,
                comm,
                scheduler_config,
            )?;
            scheduler.prepare()?;

            let mut reports = Vec::with_capacity(n_passes);
            for _ in 0..n_passes {
                reports.push(scheduler.execute_pass(PassScope::All)?);
                scheduler.reset();
            }
            Ok(RankOutcome {
                rank,
                moments: scheduler.moments().to_vec(),
                reports,
            })
        }));
    }

    let mut outcomes = Vec::with_capacity(n_ranks);
    let mut errors = Vec::new();
    for handle in handles {
        match handle
            .join()
            .map_err(|_| SnError::internal("分区线程异常退出"))?
        {
            Ok(outcome) => outcomes.push(outcome),
            Err(e) => errors.push(e),
        }
    }
    if !errors.is_empty() {
        // 被中止的遍末屏障唤醒的分区报 Communication，是次生错误，
        // 优先报告出错根因
        let root = errors
            .iter()
            .position(|e| !matches!(e, SnError::Communication { .. }))
            .unwrap_or(0);
        return Err(errors.swap_remove(root));
    }

    // 按分区归属拼装全局角矩
    let mut moments = vec![0.0; mesh.n_cells() * width];
    let mut reflecting_deltas = vec![0.0f64; config.n_passes];
    let mut reports = vec![Vec::new(); n_ranks];
    for outcome in outcomes {
        let owned = mesh.owned_cells(outcome.rank);
        SnError::check_size("rank moments", owned.len() * width, outcome.moments.len())?;
        for (local, &gid) in owned.iter().enumerate() {
            let dst = gid.get() * width;
            moments[dst..dst + width]
                .copy_from_slice(&outcome.moments[local * width..(local + 1) * width]);
        }
        for (pass, report) in outcome.reports.iter().enumerate() {
            reflecting_deltas[pass] = reflecting_deltas[pass].max(report.reflecting_delta);
        }
        reports[outcome.rank.get()] = outcome.reports;
    }

    log::info!(
        "扫描求解完成: 末遍反射偏差 {:.3e}",
        reflecting_deltas.last().copied().unwrap_or(0.0)
    );

    Ok(SweepSolution {
        moments,
        width,
        reflecting_deltas,
        reports,
    })
}
