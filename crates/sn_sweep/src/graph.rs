// crates/sn_sweep/src/graph.rs

//! 单元依赖图与拓扑排序
//!
//! 对每个 (分区, 角度集) 构建一次单元依赖图并给出确定性的拓扑序，
//! 由角度集全体成员方向共享只读使用。
//!
//! # 构建规则
//!
//! 对本分区每个单元逐面按代表方向分类：
//!
//! - 出流面 → 同分区邻居：本地边（上游单元 → 下游单元）
//! - 出流面 → 跨分区邻居：发送义务（执行完该单元后立即发消息）
//! - 入流面 ← 跨分区邻居：接收义务（运行期等消息到达才可调度）
//! - 反射边界面：不产生任何边——反射反馈建模为上一遍的滞后外部
//!   输入，从结构上断开环（见 boundary 模块）
//!
//! # 拓扑排序
//!
//! 反复剥离：本地入度为零的单元进入就绪池（接收义务在排序阶段视
//! 为即时可满足，真正的等待发生在运行期），每次取本地编号最小者，
//! 保证同一输入得到同一顺序。剥离后仍有剩余单元说明存在不可归因
//! 于反射边界的真环，报告违规单元集合。

use crate::angleset::AngleSet;
use crate::orientation::classify_normal;
use sn_foundation::error::{SnError, SnResult};
use sn_foundation::indices::{FaceIndex, RankIndex};
use sn_mesh::{FaceConnection, SweepMesh};
use std::collections::BTreeSet;

/// 接收义务：某本地单元的某个面等待来自远端分区的通量消息
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReceiveDep {
    /// 面槽位（在单元面列表中的位置）
    pub face_slot: usize,
    /// 全局面编号（消息路由键）
    pub face: FaceIndex,
    /// 消息来源分区
    pub from: RankIndex,
}

/// 发送义务：某本地单元执行后须向远端分区发出该面的出流通量
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SendDuty {
    /// 面槽位
    pub face_slot: usize,
    /// 全局面编号
    pub face: FaceIndex,
    /// 消息目标分区
    pub to: RankIndex,
}

/// 某 (分区, 角度集) 的扫描顺序与通信义务
///
/// 构建一次后只读共享。所有 `Vec` 按本地单元编号索引
/// （本地编号 = 单元在 `mesh.owned_cells(rank)` 中的位置）。
#[derive(Debug, Clone)]
pub struct SweepOrdering {
    /// 拓扑序（本地编号）
    pub order: Vec<usize>,
    /// 每个单元的本地下游邻居（依赖图出边）
    pub downwind: Vec<Vec<usize>>,
    /// 每个单元的本地上游边数（依赖图入度）
    pub n_upwind: Vec<usize>,
    /// 每个单元的接收义务
    pub receive_deps: Vec<Vec<ReceiveDep>>,
    /// 每个单元的发送义务
    pub send_duties: Vec<Vec<SendDuty>>,
}

impl SweepOrdering {
    /// 本地单元数
    #[inline]
    pub fn n_local_cells(&self) -> usize {
        self.order.len()
    }

    /// 接收义务总数
    pub fn n_receive_deps(&self) -> usize {
        self.receive_deps.iter().map(Vec::len).sum()
    }

    /// 发送义务总数
    pub fn n_send_duties(&self) -> usize {
        self.send_duties.iter().map(Vec::len).sum()
    }
}

/// 为一个 (分区, 角度集) 构建扫描顺序
///
/// # 错误
///
/// 存在不可归因于反射边界的依赖环 → `Topology`，附带无法排序的
/// 单元全局编号。
pub fn build_sweep_ordering(
    mesh: &SweepMesh,
    rank: RankIndex,
    angle_set: &AngleSet,
) -> SnResult<SweepOrdering> {
    let locals = mesh.owned_cells(rank);
    let n = locals.len();
    let omega = angle_set.representative;

    let mut downwind: Vec<Vec<usize>> = vec![Vec::new(); n];
    let mut n_upwind = vec![0usize; n];
    let mut receive_deps: Vec<Vec<ReceiveDep>> = vec![Vec::new(); n];
    let mut send_duties: Vec<Vec<SendDuty>> = vec![Vec::new(); n];

    for (local, &gid) in locals.iter().enumerate() {
        let cell = mesh.cell(gid)?;
        for (slot, face) in cell.faces.iter().enumerate() {
            let orientation = classify_normal(face.normal, omega);
            match face.connection {
                FaceConnection::Neighbor { cell: nbr, owner } if owner == rank => {
                    // 同分区：只在出流侧建边，入流侧由对面补齐
                    if orientation.is_outgoing() {
                        let nbr_local = mesh.local_id(rank, nbr).ok_or_else(|| {
                            SnError::internal(format!("单元 {} 归属分区与索引不一致", nbr))
                        })?;
                        downwind[local].push(nbr_local);
                        n_upwind[nbr_local] += 1;
                    }
                }
                FaceConnection::Neighbor { owner, .. } => {
                    let face_id = mesh.face_id(gid, slot)?;
                    if orientation.is_outgoing() {
                        send_duties[local].push(SendDuty {
                            face_slot: slot,
                            face: face_id,
                            to: owner,
                        });
                    } else {
                        receive_deps[local].push(ReceiveDep {
                            face_slot: slot,
                            face: face_id,
                            from: owner,
                        });
                    }
                }
                FaceConnection::Boundary(_) => {
                    // 边界面不进依赖图；反射边界作为滞后输入在运行期查询
                }
            }
        }
    }

    // 反复剥离，最小本地编号优先
    let mut remaining = n_upwind.clone();
    let mut ready: BTreeSet<usize> = (0..n).filter(|&i| remaining[i] == 0).collect();
    let mut order = Vec::with_capacity(n);

    while let Some(&next) = ready.iter().next() {
        ready.remove(&next);
        order.push(next);
        for &d in &downwind[next] {
            remaining[d] -= 1;
            if remaining[d] == 0 {
                ready.insert(d);
            }
        }
    }

    if order.len() < n {
        let stuck: Vec<usize> = (0..n)
            .filter(|&i| remaining[i] > 0)
            .map(|i| locals[i].get())
            .collect();
        return Err(SnError::topology(angle_set.id.get(), stuck));
    }

    Ok(SweepOrdering {
        order,
        downwind,
        n_upwind,
        receive_deps,
        send_duties,
    })
}
