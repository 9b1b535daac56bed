// crates/sn_sweep/src/kernel.rs

//! 单元扫描核
//!
//! 调度器与数值离散之间的接缝：调度器负责"以正确顺序、带齐上游
//! 通量地访问每个单元"，核负责"在一个单元上把入流通量推进为
//! 出流通量并累积角矩贡献"。
//!
//! 核必须 `Send + Sync`：同一核实例被所有分区线程共享只读。

use crate::quadrature::Direction;
use sn_foundation::error::{SnError, SnResult};
use sn_mesh::Cell;

/// 单元扫描输入
///
/// `incoming` 按面槽位索引：入流面给出上游通量（来自邻居出流、
/// 跨分区消息或边界条件），出流面为 `None`。
pub struct CellSweepContext<'a> {
    /// 被扫描单元
    pub cell: &'a Cell,
    /// 扫描方向
    pub direction: &'a Direction,
    /// 各面槽位的入流通量
    pub incoming: &'a [Option<Vec<f64>>],
}

/// 单元扫描输出
pub struct CellSweepOutput {
    /// 各面槽位的出流通量（入流槽位为 `None`）
    pub outgoing: Vec<Option<Vec<f64>>>,
    /// 本方向对单元角矩的贡献（权重 × 单元平均角通量）
    pub moment: Vec<f64>,
}

/// 单元扫描核接口
pub trait SweepKernel: Send + Sync {
    /// 通量向量宽度（能群数 × 面上离散点数）
    fn flux_width(&self) -> usize;

    /// 在一个单元上执行一个方向的扫描
    fn execute(&self, ctx: CellSweepContext<'_>) -> SnResult<CellSweepOutput>;
}

// ============================================================
// 衰减核
// ============================================================

/// 指数衰减扫描核
///
/// 单群、特征线式的解析推进：沿方向 ω 穿过单元的弦长 τ 取单元
/// 顶点在 ω 上投影的跨度，
///
/// ```text
/// ψ_out = ψ_in·e^(−στ) + (q/σ)(1 − e^(−στ))
/// ψ̄    = q/σ + (ψ_in − q/σ)(1 − e^(−στ))/(στ)
/// ```
///
/// σ → 0 时退化为 ψ_out = ψ_in + qτ。入流取全部入流面通量的均值。
#[derive(Debug, Clone)]
pub struct AttenuationKernel {
    /// 总截面 σ_t
    pub sigma_t: f64,
    /// 均匀各向同性源 q
    pub source: f64,
}

impl AttenuationKernel {
    /// 创建衰减核
    ///
    /// # 错误
    ///
    /// 截面为负或非有限 → `InvalidInput`。
    pub fn new(sigma_t: f64, source: f64) -> SnResult<Self> {
        if !sigma_t.is_finite() || sigma_t < 0.0 || !source.is_finite() {
            return Err(SnError::invalid_input(format!(
                "衰减核参数无效: sigma_t={}, source={}",
                sigma_t, source
            )));
        }
        Ok(Self { sigma_t, source })
    }

    /// 单元沿 ω 的投影跨度
    fn chord_length(cell: &Cell, omega: glam::DVec3) -> f64 {
        let mut lo = f64::INFINITY;
        let mut hi = f64::NEG_INFINITY;
        for v in &cell.vertices {
            let s = v.dot(omega);
            lo = lo.min(s);
            hi = hi.max(s);
        }
        (hi - lo).max(0.0)
    }
}

impl SweepKernel for AttenuationKernel {
    fn flux_width(&self) -> usize {
        1
    }

    fn execute(&self, ctx: CellSweepContext<'_>) -> SnResult<CellSweepOutput> {
        // 入流均值
        let mut psi_in = 0.0;
        let mut n_in = 0usize;
        for slot in ctx.incoming.iter().flatten() {
            psi_in += slot[0];
            n_in += 1;
        }
        if n_in > 0 {
            psi_in /= n_in as f64;
        }

        let tau = Self::chord_length(ctx.cell, ctx.direction.omega);
        let st = self.sigma_t * tau;

        let (psi_out, psi_avg) = if st < 1e-10 {
            (psi_in + self.source * tau, psi_in + 0.5 * self.source * tau)
        } else {
            let att = (-st).exp();
            let qs = self.source / self.sigma_t;
            (
                psi_in * att + qs * (1.0 - att),
                qs + (psi_in - qs) * (1.0 - att) / st,
            )
        };

        if !psi_out.is_finite() || !psi_avg.is_finite() {
            return Err(SnError::numerical_kernel(format!(
                "单元 {} 扫描产生非有限通量: psi_out={}, psi_avg={}",
                ctx.cell.id, psi_out, psi_avg
            )));
        }

        let outgoing = ctx
            .incoming
            .iter()
            .map(|slot| slot.is_none().then(|| vec![psi_out]))
            .collect();

        Ok(CellSweepOutput {
            outgoing,
            moment: vec![ctx.direction.weight * psi_avg],
        })
    }
}
