// crates/sn_sweep/src/scheduler.rs

//! 扫描调度器
//!
//! 每个分区一个调度器实例，驱动本分区全部角度集完成一遍扫描：
//! 按拓扑序执行就绪单元、出流通量即时转发（本地投递或跨分区
//! 发送）、入流缺口由消息到达逐步补齐。
//!
//! # 状态机
//!
//! ```text
//! Init ──prepare()──▶ Ready ──execute_pass()──▶ Running ──▶ Draining ──▶ Done
//!                       ▲                          │                       │
//!                       └────────── abort() ───────┘◀────── reset() ──────┘
//! ```
//!
//! - `Running` 中途出错（超时、核失败）后由调用方 [`SweepScheduler::abort`]
//!   丢弃本遍全部中间状态回到 `Ready`；重跑结果与未中断运行逐位一致，
//!   因为角矩只在整遍完成时一次性提交
//! - `Draining` 负责提交角矩、推进反射双缓冲并在遍末屏障与其他
//!   分区会合，保证消息不跨遍串扰
//!
//! # 调度策略
//!
//! - [`SchedulingAlgorithm::Strict`]: 按编号逐个角度集推进到完成，
//!   行为最接近同步扫描，便于对拍
//! - [`SchedulingAlgorithm::Pipelined`]: 轮转推进全部角度集，某个
//!   角度集等消息时其余角度集继续执行，用计算隐藏通信延迟

use crate::angleset::AngleSet;
use crate::boundary::{BoundaryConfig, BoundarySet};
use crate::comm::RankComm;
use crate::graph::{build_sweep_ordering, SweepOrdering};
use crate::kernel::{CellSweepContext, SweepKernel};
use crate::message::FluxMessage;
use crate::quadrature::AngularQuadrature;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use sn_foundation::error::{SnError, SnResult};
use sn_foundation::indices::{AngleSetIndex, FaceIndex, RankIndex};
use sn_mesh::{FaceConnection, SweepMesh};
use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;
use std::time::{Duration, Instant};

// ============================================================
// 配置与状态
// ============================================================

/// 调度策略
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum SchedulingAlgorithm {
    /// 逐个角度集顺序推进
    Strict,
    /// 全部角度集轮转流水线
    #[default]
    Pipelined,
}

/// 调度器配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchedulerConfig {
    /// 调度策略
    #[serde(default)]
    pub algorithm: SchedulingAlgorithm,
    /// 等待跨分区消息的超时（毫秒）
    #[serde(default = "default_recv_timeout_ms")]
    pub recv_timeout_ms: u64,
}

fn default_recv_timeout_ms() -> u64 {
    5_000
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            algorithm: SchedulingAlgorithm::default(),
            recv_timeout_ms: default_recv_timeout_ms(),
        }
    }
}

/// 调度器状态
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PassState {
    /// 已创建，扫描顺序尚未构建
    Init,
    /// 可以开始一遍扫描
    Ready,
    /// 一遍扫描进行中
    Running,
    /// 本遍收尾：提交角矩、推进反射缓冲、遍末屏障
    Draining,
    /// 本遍完成，等待 reset 开始下一遍
    Done,
}

impl std::fmt::Display for PassState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Init => "Init",
            Self::Ready => "Ready",
            Self::Running => "Running",
            Self::Draining => "Draining",
            Self::Done => "Done",
        };
        write!(f, "{}", name)
    }
}

/// 一遍扫描的范围
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PassScope {
    /// 全部角度集
    All,
    /// 单个角度集（诊断用）
    One(AngleSetIndex),
}

/// 一遍扫描的统计报告
#[derive(Debug, Clone)]
pub struct PassReport {
    /// 遍序号（从 0 起）
    pub pass: usize,
    /// 执行的 (单元, 方向) 任务数
    pub n_tasks: usize,
    /// 发出的跨分区消息数
    pub n_sent: usize,
    /// 收到的跨分区消息数
    pub n_received: usize,
    /// 反射面通量相邻两遍的最大偏差
    pub reflecting_delta: f64,
    /// 本遍耗时
    pub elapsed: Duration,
}

// ============================================================
// 单个角度集的遍内运行状态
// ============================================================

/// 角度集在本遍内的可变状态（遍结束即丢弃）
struct AngleSetRun {
    /// 每个本地单元尚未满足的依赖数（本地上游边 + 接收义务）
    waiting: Vec<usize>,
    /// 已执行标记
    executed: Vec<bool>,
    /// 就绪池（最小本地编号优先）
    ready: BTreeSet<usize>,
    /// 已到位的入流通量：(本地单元, 面槽位) → 成员方向 × 宽度
    psi: HashMap<(usize, usize), Vec<f64>>,
    /// 仍在等待的消息：全局面编号 → (本地单元, 面槽位)
    expected: HashMap<FaceIndex, (usize, usize)>,
    /// 已执行单元数
    n_done: usize,
}

impl AngleSetRun {
    fn new(ordering: &SweepOrdering) -> Self {
        let n = ordering.n_local_cells();
        let waiting: Vec<usize> = (0..n)
            .map(|i| ordering.n_upwind[i] + ordering.receive_deps[i].len())
            .collect();
        let ready = (0..n).filter(|&i| waiting[i] == 0).collect();
        let expected = ordering
            .receive_deps
            .iter()
            .enumerate()
            .flat_map(|(local, deps)| deps.iter().map(move |d| (d.face, (local, d.face_slot))))
            .collect();
        Self {
            waiting,
            executed: vec![false; n],
            ready,
            psi: HashMap::new(),
            expected,
            n_done: 0,
        }
    }

    fn is_done(&self) -> bool {
        self.n_done == self.waiting.len()
    }

    /// 满足一个依赖，归零即入就绪池
    fn satisfy(&mut self, local: usize) {
        self.waiting[local] -= 1;
        if self.waiting[local] == 0 && !self.executed[local] {
            self.ready.insert(local);
        }
    }
}

// ============================================================
// 调度器
// ============================================================

/// 分区扫描调度器
pub struct SweepScheduler {
    mesh: Arc<SweepMesh>,
    quadrature: Arc<AngularQuadrature>,
    angle_sets: Vec<AngleSet>,
    kernel: Arc<dyn SweepKernel>,
    boundaries: BoundarySet,
    comm: RankComm,
    config: SchedulerConfig,
    rank: RankIndex,
    width: usize,
    /// 每个角度集的扫描顺序（prepare 时构建，之后只读）
    orderings: Vec<SweepOrdering>,
    /// 同分区共享面的槽位对应：(本地单元, 槽位) → (邻居本地编号, 邻居槽位)
    local_links: HashMap<(usize, usize), (usize, usize)>,
    state: PassState,
    pass_index: usize,
    /// 已提交的角矩（本地单元 × 宽度），仅在整遍完成时整体替换
    moments: Vec<f64>,
}

impl SweepScheduler {
    /// 创建调度器（状态 `Init`）
    pub fn new(
        mesh: Arc<SweepMesh>,
        quadrature: Arc<AngularQuadrature>,
        angle_sets: Vec<AngleSet>,
        kernel: Arc<dyn SweepKernel>,
        boundary_configs: &[BoundaryConfig],
        comm: RankComm,
        config: SchedulerConfig,
    ) -> SnResult<Self> {
        if angle_sets.is_empty() {
            return Err(SnError::invalid_input("角度集列表为空"));
        }
        let width = kernel.flux_width();
        if width == 0 {
            return Err(SnError::invalid_input("扫描核的通量宽度为 0"));
        }
        let rank = comm.rank();
        let boundaries =
            BoundarySet::from_configs(boundary_configs, &mesh, Arc::clone(&quadrature), width)?;
        let n_local = mesh.owned_cells(rank).len();

        Ok(Self {
            mesh,
            quadrature,
            angle_sets,
            kernel,
            boundaries,
            comm,
            config,
            rank,
            width,
            orderings: Vec::new(),
            local_links: HashMap::new(),
            state: PassState::Init,
            pass_index: 0,
            moments: vec![0.0; n_local * width],
        })
    }

    /// 当前状态
    #[inline]
    pub fn state(&self) -> PassState {
        self.state
    }

    /// 已完成的遍数
    #[inline]
    pub fn pass_index(&self) -> usize {
        self.pass_index
    }

    /// 已提交的角矩（本地单元 × 宽度，行主序）
    #[inline]
    pub fn moments(&self) -> &[f64] {
        &self.moments
    }

    /// 某角度集的扫描顺序（诊断用，prepare 之后可用）
    pub fn sweep_ordering(&self, set: AngleSetIndex) -> SnResult<&SweepOrdering> {
        self.orderings.get(set.get()).ok_or_else(|| {
            SnError::index_out_of_bounds("AngleSet", set.get(), self.orderings.len())
        })
    }

    /// 构建全部角度集的扫描顺序，进入 `Ready`
    ///
    /// 各角度集的图构建相互独立，并行执行。已就绪时为空操作。
    pub fn prepare(&mut self) -> SnResult<()> {
        if self.state != PassState::Init {
            return Ok(());
        }

        self.orderings = self
            .angle_sets
            .par_iter()
            .map(|set| build_sweep_ordering(&self.mesh, self.rank, set))
            .collect::<SnResult<Vec<_>>>()?;

        self.local_links = self.build_local_links()?;

        log::debug!(
            "分区 {} 就绪: {} 个角度集, 本地单元 {}, 接收义务 {}, 发送义务 {}",
            self.rank,
            self.orderings.len(),
            self.mesh.owned_cells(self.rank).len(),
            self.orderings.iter().map(SweepOrdering::n_receive_deps).sum::<usize>(),
            self.orderings.iter().map(SweepOrdering::n_send_duties).sum::<usize>(),
        );
        self.state = PassState::Ready;
        Ok(())
    }

    /// 同分区共享面两侧槽位的对应关系（与角度集无关，构建一次）
    fn build_local_links(&self) -> SnResult<HashMap<(usize, usize), (usize, usize)>> {
        let locals = self.mesh.owned_cells(self.rank);
        let mut links = HashMap::new();

        for (local, &gid) in locals.iter().enumerate() {
            let cell = self.mesh.cell(gid)?;
            for (slot, face) in cell.faces.iter().enumerate() {
                if let FaceConnection::Neighbor { cell: nbr, owner } = face.connection {
                    if owner != self.rank {
                        continue;
                    }
                    let nbr_local = self.mesh.local_id(self.rank, nbr).ok_or_else(|| {
                        SnError::internal(format!("单元 {} 归属分区与索引不一致", nbr))
                    })?;
                    let nbr_slot = self
                        .mesh
                        .cell(nbr)?
                        .faces
                        .iter()
                        .position(|f| {
                            matches!(f.connection, FaceConnection::Neighbor { cell: c, .. } if c == gid)
                        })
                        .ok_or_else(|| {
                            SnError::invalid_mesh(format!("单元 {} 与 {} 的邻接不互认", gid, nbr))
                        })?;
                    links.insert((local, slot), (nbr_local, nbr_slot));
                }
            }
        }
        Ok(links)
    }

    /// 执行一遍扫描
    ///
    /// 成功时先与其他分区在遍末屏障会合，再提交角矩、推进反射
    /// 缓冲，状态转入 `Done`。本分区失败时中止遍末屏障，让停在
    /// 屏障上的分区以 `Communication` 错误返回而不是永远等待；
    /// 中间状态留在 `Running`/`Draining`，由调用方 [`Self::abort`]
    /// 清理后重试。
    pub fn execute_pass(&mut self, scope: PassScope) -> SnResult<PassReport> {
        if self.state != PassState::Ready {
            return Err(SnError::config(format!(
                "状态 {} 不能开始扫描（需要 Ready）",
                self.state
            )));
        }
        self.state = PassState::Running;
        let started = Instant::now();

        let active: Vec<usize> = match scope {
            PassScope::All => (0..self.angle_sets.len()).collect(),
            PassScope::One(set) => {
                if let Err(e) = SnError::check_index("AngleSet", set.get(), self.angle_sets.len())
                {
                    self.comm.abort_pass();
                    return Err(e);
                }
                vec![set.get()]
            }
        };

        // 遍内状态：所有角度集都建运行态（消息可能先于调度到达），
        // 但只驱动 active 中的角度集
        let mut runs: Vec<AngleSetRun> =
            self.orderings.iter().map(AngleSetRun::new).collect();
        // 角矩按角度集分槽累加，提交时按角度集编号定序求和，
        // 使结果与角度集的实际执行交错顺序无关
        let mut pass_moments = vec![0.0; self.angle_sets.len() * self.moments.len()];
        let mut stats = (0usize, 0usize, 0usize); // (tasks, sent, received)

        let result = match self.config.algorithm {
            SchedulingAlgorithm::Strict => {
                self.drive_strict(&active, &mut runs, &mut pass_moments, &mut stats)
            }
            SchedulingAlgorithm::Pipelined => {
                self.drive_pipelined(&active, &mut runs, &mut pass_moments, &mut stats)
            }
        };
        if let Err(e) = result {
            // 停在遍末屏障上的分区靠这一步醒来并出错返回
            self.comm.abort_pass();
            return Err(e);
        }

        // 收尾：先会合确认所有分区都成功跑完本遍，再提交角矩、
        // 推进反射缓冲；会合失败时本遍不留任何副作用
        self.state = PassState::Draining;
        self.comm.wait_pass()?;

        let n = self.moments.len();
        let mut committed = vec![0.0; n];
        for chunk in pass_moments.chunks_exact(n) {
            for (dst, v) in committed.iter_mut().zip(chunk) {
                *dst += v;
            }
        }
        self.moments = committed;
        let reflecting_delta = self.boundaries.advance_pass();

        let report = PassReport {
            pass: self.pass_index,
            n_tasks: stats.0,
            n_sent: stats.1,
            n_received: stats.2,
            reflecting_delta,
            elapsed: started.elapsed(),
        };
        log::debug!(
            "分区 {} 第 {} 遍完成: {} 任务, 发 {} 收 {}, 反射偏差 {:.3e}, 耗时 {:?}",
            self.rank,
            report.pass,
            report.n_tasks,
            report.n_sent,
            report.n_received,
            report.reflecting_delta,
            report.elapsed,
        );
        self.pass_index += 1;
        self.state = PassState::Done;
        Ok(report)
    }

    /// 中止当前遍：清空接收队列，丢弃遍内反射记录，回到 `Ready`
    ///
    /// 幂等；角矩未被本遍触碰，重跑与未中断运行结果一致。
    pub fn abort(&mut self) {
        let dropped = self.comm.drain();
        self.boundaries.discard_pass();
        self.comm.reset_pass();
        if self.state != PassState::Init {
            if self.state == PassState::Running {
                log::warn!(
                    "分区 {} 中止第 {} 遍扫描，丢弃 {} 条在途消息",
                    self.rank,
                    self.pass_index,
                    dropped
                );
            }
            self.state = PassState::Ready;
        }
    }

    /// 从 `Done` 回到 `Ready` 准备下一遍；幂等
    pub fn reset(&mut self) {
        match self.state {
            PassState::Done | PassState::Ready => self.state = PassState::Ready,
            PassState::Running | PassState::Draining => self.abort(),
            PassState::Init => {}
        }
    }

    // --------------------------------------------------------
    // 驱动循环
    // --------------------------------------------------------

    /// 逐个角度集推进到完成
    fn drive_strict(
        &mut self,
        active: &[usize],
        runs: &mut [AngleSetRun],
        moments: &mut [f64],
        stats: &mut (usize, usize, usize),
    ) -> SnResult<()> {
        let timeout = Duration::from_millis(self.config.recv_timeout_ms);
        for &set_idx in active {
            while !runs[set_idx].is_done() {
                if let Some(local) = runs[set_idx].ready.pop_first() {
                    self.run_cell(set_idx, local, &mut runs[set_idx], moments, stats)?;
                } else {
                    let env = self.comm.recv_timeout(timeout)?;
                    self.apply_message(runs, env, stats)?;
                }
            }
        }
        Ok(())
    }

    /// 全部角度集轮转推进；只有在毫无进展时才阻塞等消息
    fn drive_pipelined(
        &mut self,
        active: &[usize],
        runs: &mut [AngleSetRun],
        moments: &mut [f64],
        stats: &mut (usize, usize, usize),
    ) -> SnResult<()> {
        let timeout = Duration::from_millis(self.config.recv_timeout_ms);
        loop {
            let mut progressed = false;

            while let Some(env) = self.comm.try_recv() {
                self.apply_message(runs, env, stats)?;
                progressed = true;
            }

            for &set_idx in active {
                while let Some(local) = runs[set_idx].ready.pop_first() {
                    self.run_cell(set_idx, local, &mut runs[set_idx], moments, stats)?;
                    progressed = true;
                }
            }

            if active.iter().all(|&i| runs[i].is_done()) {
                return Ok(());
            }
            if !progressed {
                let env = self.comm.recv_timeout(timeout)?;
                self.apply_message(runs, env, stats)?;
            }
        }
    }

    /// 消息入账：按角度集与全局面编号路由到等待中的 (单元, 槽位)
    fn apply_message(
        &self,
        runs: &mut [AngleSetRun],
        (from, msg): (RankIndex, FluxMessage),
        stats: &mut (usize, usize, usize),
    ) -> SnResult<()> {
        let set_idx = msg.angle_set.get();
        let run = runs.get_mut(set_idx).ok_or_else(|| {
            SnError::communication(format!("来自分区 {} 的消息指向未知角度集 {}", from, msg.angle_set))
        })?;
        let (local, slot) = run.expected.remove(&msg.face).ok_or_else(|| {
            SnError::communication(format!(
                "来自分区 {} 的消息指向非等待中的面 {}（角度集 {}）",
                from, msg.face, msg.angle_set
            ))
        })?;

        let n_members = self.angle_sets[set_idx].n_directions();
        if msg.values.len() != n_members * self.width {
            return Err(SnError::communication(format!(
                "来自分区 {} 的消息载荷长度 {} 与预期 {} 不符（面 {}，角度集 {}）",
                from,
                msg.values.len(),
                n_members * self.width,
                msg.face,
                msg.angle_set
            )));
        }

        run.psi.insert((local, slot), msg.values);
        run.satisfy(local);
        stats.2 += 1;
        Ok(())
    }

    /// 执行一个本地单元的全部成员方向，并转发出流通量
    fn run_cell(
        &mut self,
        set_idx: usize,
        local: usize,
        run: &mut AngleSetRun,
        moments: &mut [f64],
        stats: &mut (usize, usize, usize),
    ) -> SnResult<()> {
        let width = self.width;
        let set = &self.angle_sets[set_idx];
        let n_members = set.n_directions();
        let gid = self.mesh.owned_cells(self.rank)[local];
        let cell = self.mesh.cell(gid)?;
        let n_slots = cell.faces.len();

        // 槽位朝向由代表方向决定，全体成员一致
        let slot_outgoing: Vec<bool> = cell
            .faces
            .iter()
            .map(|f| crate::orientation::classify_normal(f.normal, set.representative).is_outgoing())
            .collect();

        // 逐成员方向执行核，收集每个出流槽位的 成员 × 宽度 载荷
        let mut outgoing_payload: Vec<Vec<f64>> = vec![Vec::new(); n_slots];
        for (m, &dir_idx) in set.directions.iter().enumerate() {
            let direction = self.quadrature.direction(dir_idx)?;

            let mut incoming: Vec<Option<Vec<f64>>> = Vec::with_capacity(n_slots);
            for (slot, face) in cell.faces.iter().enumerate() {
                if slot_outgoing[slot] {
                    incoming.push(None);
                    continue;
                }
                let values = match face.connection {
                    FaceConnection::Boundary(tag) => {
                        let face_id = self.mesh.face_id(gid, slot)?;
                        self.boundaries
                            .incoming_flux(tag, face_id, face.normal, dir_idx)?
                    }
                    FaceConnection::Neighbor { .. } => {
                        let payload = run.psi.get(&(local, slot)).ok_or_else(|| {
                            SnError::internal(format!(
                                "单元 {} 槽位 {} 的入流通量缺失（调度顺序被破坏）",
                                gid, slot
                            ))
                        })?;
                        payload[m * width..(m + 1) * width].to_vec()
                    }
                };
                incoming.push(Some(values));
            }

            let output = self.kernel.execute(CellSweepContext {
                cell,
                direction,
                incoming: &incoming,
            })?;
            SnError::check_size("kernel moment", width, output.moment.len())?;

            let base = (set_idx * (self.moments.len() / width) + local) * width;
            for (k, v) in output.moment.iter().enumerate() {
                moments[base + k] += v;
            }
            for (slot, out) in output.outgoing.into_iter().enumerate() {
                if let Some(values) = out {
                    SnError::check_size("kernel outgoing flux", width, values.len())?;
                    outgoing_payload[slot].extend_from_slice(&values);
                }
            }
            stats.0 += 1;
        }

        // 出流转发：边界记录 / 本地投递 / 跨分区发送
        for slot in 0..n_slots {
            if !slot_outgoing[slot] {
                continue;
            }
            let payload = std::mem::take(&mut outgoing_payload[slot]);
            if payload.len() != n_members * width {
                return Err(SnError::internal(format!(
                    "单元 {} 槽位 {} 的出流载荷不完整",
                    gid, slot
                )));
            }
            match cell.faces[slot].connection {
                FaceConnection::Boundary(tag) => {
                    let face_id = self.mesh.face_id(gid, slot)?;
                    for (m, &dir_idx) in set.directions.iter().enumerate() {
                        self.boundaries.record_outgoing(
                            tag,
                            face_id,
                            dir_idx,
                            payload[m * width..(m + 1) * width].to_vec(),
                        )?;
                    }
                }
                FaceConnection::Neighbor { owner, .. } if owner == self.rank => {
                    let &(nbr_local, nbr_slot) =
                        self.local_links.get(&(local, slot)).ok_or_else(|| {
                            SnError::internal(format!("单元 {} 槽位 {} 缺少本地链接", gid, slot))
                        })?;
                    run.psi.insert((nbr_local, nbr_slot), payload);
                    run.satisfy(nbr_local);
                }
                FaceConnection::Neighbor { owner, .. } => {
                    let face_id = self.mesh.face_id(gid, slot)?;
                    let msg = FluxMessage::new(face_id, set.id, n_members, width, payload)?;
                    self.comm.send(owner, msg)?;
                    stats.1 += 1;
                }
            }
        }

        run.executed[local] = true;
        run.n_done += 1;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::angleset::{build_angle_sets, AngleAggregation};
    use crate::comm::SweepComm;
    use crate::kernel::AttenuationKernel;
    use glam::DVec3;
    use sn_foundation::indices::{angle_set, cell, rank};
    use sn_mesh::SlabMeshBuilder;

    fn single_rank_scheduler(
        n_cells: usize,
        algorithm: SchedulingAlgorithm,
        configs: Vec<BoundaryConfig>,
        kernel: AttenuationKernel,
    ) -> SweepScheduler {
        let mesh = Arc::new(SlabMeshBuilder::new(n_cells, 1.0).build().unwrap());
        let quad = Arc::new(AngularQuadrature::gauss_legendre(2).unwrap());
        let sets = build_angle_sets(&quad, AngleAggregation::Octant);
        let comm = SweepComm::for_ranks(1).unwrap().pop().unwrap();
        SweepScheduler::new(
            mesh,
            quad,
            sets,
            Arc::new(kernel),
            &configs,
            comm,
            SchedulerConfig {
                algorithm,
                recv_timeout_ms: 200,
            },
        )
        .unwrap()
    }

    fn vacuum_incident() -> Vec<BoundaryConfig> {
        vec![
            BoundaryConfig::incident_isotropic("xmin", vec![1.0]),
            BoundaryConfig::vacuum("xmax"),
        ]
    }

    #[test]
    fn test_state_machine_transitions() {
        let mut s = single_rank_scheduler(
            2,
            SchedulingAlgorithm::Strict,
            vacuum_incident(),
            AttenuationKernel::new(0.0, 0.0).unwrap(),
        );
        assert_eq!(s.state(), PassState::Init);
        // Ready 之前不能扫描
        assert!(s.execute_pass(PassScope::All).is_err());

        s.prepare().unwrap();
        assert_eq!(s.state(), PassState::Ready);
        s.execute_pass(PassScope::All).unwrap();
        assert_eq!(s.state(), PassState::Done);
        // Done 不能直接再扫
        assert!(s.execute_pass(PassScope::All).is_err());
        s.reset();
        assert_eq!(s.state(), PassState::Ready);
        s.execute_pass(PassScope::All).unwrap();
        assert_eq!(s.pass_index(), 2);
    }

    #[test]
    fn test_streaming_pass_moments() {
        // σ=0, q=0: μ>0 方向把 xmin 入射 1.0 原样穿过，μ<0 方向全零。
        // 每单元角矩 = w⁺·1 + w⁻·0 = 1.0
        let mut s = single_rank_scheduler(
            3,
            SchedulingAlgorithm::Strict,
            vacuum_incident(),
            AttenuationKernel::new(0.0, 0.0).unwrap(),
        );
        s.prepare().unwrap();
        let report = s.execute_pass(PassScope::All).unwrap();
        // 3 单元 × 2 方向
        assert_eq!(report.n_tasks, 6);
        assert_eq!(report.n_sent, 0);
        for &m in s.moments() {
            assert!((m - 1.0).abs() < 1e-12, "角矩 {}", m);
        }
    }

    #[test]
    fn test_strict_and_pipelined_agree() {
        let kernel = AttenuationKernel::new(1.5, 0.7).unwrap();
        let mut a = single_rank_scheduler(
            4,
            SchedulingAlgorithm::Strict,
            vacuum_incident(),
            kernel.clone(),
        );
        let mut b = single_rank_scheduler(
            4,
            SchedulingAlgorithm::Pipelined,
            vacuum_incident(),
            kernel,
        );
        a.prepare().unwrap();
        b.prepare().unwrap();
        a.execute_pass(PassScope::All).unwrap();
        b.execute_pass(PassScope::All).unwrap();
        assert_eq!(a.moments(), b.moments());
    }

    #[test]
    fn test_single_angle_set_scope() {
        let mut s = single_rank_scheduler(
            2,
            SchedulingAlgorithm::Strict,
            vacuum_incident(),
            AttenuationKernel::new(0.0, 0.0).unwrap(),
        );
        s.prepare().unwrap();
        // 只扫 μ>0 半球（角度集 1）：每单元角矩 = w⁺·1 = 1.0
        let report = s.execute_pass(PassScope::One(angle_set(1))).unwrap();
        assert_eq!(report.n_tasks, 2);
        for &m in s.moments() {
            assert!((m - 1.0).abs() < 1e-12);
        }
    }

    #[test]
    fn test_abort_is_idempotent() {
        let mut s = single_rank_scheduler(
            2,
            SchedulingAlgorithm::Pipelined,
            vacuum_incident(),
            AttenuationKernel::new(0.0, 0.0).unwrap(),
        );
        s.prepare().unwrap();
        s.abort();
        assert_eq!(s.state(), PassState::Ready);
        s.abort();
        assert_eq!(s.state(), PassState::Ready);
        // 中止后仍可正常扫描
        s.execute_pass(PassScope::All).unwrap();
        assert_eq!(s.state(), PassState::Done);
    }

    #[test]
    fn test_malformed_payload_is_communication_error() {
        // 单个 μ<0 方向：分区 0 的单元要等分区 1 的消息
        let mesh = Arc::new(SlabMeshBuilder::new(2, 1.0).with_ranks(2).build().unwrap());
        let quad =
            Arc::new(AngularQuadrature::from_directions(&[(DVec3::NEG_X, 2.0)]).unwrap());
        let sets = build_angle_sets(&quad, AngleAggregation::Octant);
        let mut comms = SweepComm::for_ranks(2).unwrap();
        let c1 = comms.pop().unwrap();
        let c0 = comms.pop().unwrap();

        let mut s = SweepScheduler::new(
            Arc::clone(&mesh),
            quad,
            sets,
            Arc::new(AttenuationKernel::new(0.0, 0.0).unwrap()),
            &[
                BoundaryConfig::vacuum("xmin"),
                BoundaryConfig::vacuum("xmax"),
            ],
            c0,
            SchedulerConfig {
                algorithm: SchedulingAlgorithm::Pipelined,
                recv_timeout_ms: 500,
            },
        )
        .unwrap();
        s.prepare().unwrap();

        // 预期载荷长度 1（单方向 × 宽度 1），实际送 2 个分量
        let shared = mesh.face_id(cell(0), 1).unwrap();
        c1.send(
            rank(0),
            FluxMessage {
                face: shared,
                angle_set: angle_set(0),
                values: vec![1.0, 2.0],
            },
        )
        .unwrap();

        let err = s.execute_pass(PassScope::All).unwrap_err();
        assert!(matches!(err, SnError::Communication { .. }), "{err}");
    }

    #[test]
    fn test_ordering_available_after_prepare() {
        let mut s = single_rank_scheduler(
            3,
            SchedulingAlgorithm::Strict,
            vacuum_incident(),
            AttenuationKernel::new(0.0, 0.0).unwrap(),
        );
        assert!(s.sweep_ordering(angle_set(0)).is_err());
        s.prepare().unwrap();
        let ordering = s.sweep_ordering(angle_set(1)).unwrap();
        assert_eq!(ordering.order, vec![0, 1, 2]);
    }
}
