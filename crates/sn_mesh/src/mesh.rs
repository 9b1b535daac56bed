// crates/sn_mesh/src/mesh.rs

//! 分区扫描网格
//!
//! [`SweepMesh`] 持有全体单元及分区归属信息，构建后不可变，
//! 供所有分区线程通过 `Arc` 共享只读访问。
//!
//! # 设计说明
//!
//! 每个分区（rank）拥有一个互不相交的单元子集。调度器只调度
//! 本分区单元，跨分区面通过消息交换通量。`validate_adjacency`
//! 在任何扫描开始前检出邻接不一致（面声称的邻居未回指）。

use crate::cell::{Cell, FaceConnection};
use sn_foundation::error::{SnError, SnResult};
use sn_foundation::indices::{CellIndex, FaceIndex, RankIndex};
use std::collections::HashMap;

/// 分区扫描网格
///
/// 单元按全局编号升序存放；`owned` 缓存每个分区的单元编号列表
/// （升序），用于全局编号与本地编号的互转。共享面在两侧单元间
/// 分配同一个全局面编号，作为跨分区通量消息的键。
#[derive(Debug, Clone)]
pub struct SweepMesh {
    /// 全体单元（下标即全局编号）
    cells: Vec<Cell>,
    /// 分区数
    num_ranks: usize,
    /// 每个分区拥有的单元编号（升序）
    owned: Vec<Vec<CellIndex>>,
    /// 每个单元各面槽位的全局面编号（与 cells[i].faces 平行）
    face_ids: Vec<Vec<FaceIndex>>,
    /// 全局面总数
    n_global_faces: usize,
    /// 边界名称（下标即 BoundaryIndex）
    boundary_names: Vec<String>,
}

impl SweepMesh {
    /// 从单元列表构建网格
    ///
    /// # 错误
    ///
    /// - 单元编号与下标不一致，或 owner 超出分区数 → `InvalidMesh`
    pub fn new(
        cells: Vec<Cell>,
        num_ranks: usize,
        boundary_names: Vec<String>,
    ) -> SnResult<Self> {
        if num_ranks == 0 {
            return Err(SnError::invalid_input("分区数必须大于 0"));
        }

        let mut owned = vec![Vec::new(); num_ranks];
        for (i, c) in cells.iter().enumerate() {
            if c.id.get() != i {
                return Err(SnError::invalid_mesh(format!(
                    "单元编号 {} 与存放位置 {} 不一致",
                    c.id, i
                )));
            }
            let r = c.owner.get();
            if r >= num_ranks {
                return Err(SnError::invalid_mesh(format!(
                    "单元 {} 的分区编号 {} 超出分区数 {}",
                    c.id, r, num_ranks
                )));
            }
            owned[r].push(c.id);
        }

        // 分配全局面编号：内部面以 (小单元号, 大单元号) 为键两侧共享，
        // 边界面各自独立编号
        let mut face_ids: Vec<Vec<FaceIndex>> = Vec::with_capacity(cells.len());
        let mut shared: HashMap<(CellIndex, CellIndex), FaceIndex> = HashMap::new();
        let mut next_face = 0usize;
        for c in &cells {
            let mut ids = Vec::with_capacity(c.faces.len());
            for f in &c.faces {
                let id = match f.connection {
                    FaceConnection::Neighbor { cell: nbr, .. } => {
                        let key = if c.id < nbr { (c.id, nbr) } else { (nbr, c.id) };
                        *shared.entry(key).or_insert_with(|| {
                            let id = FaceIndex::new(next_face);
                            next_face += 1;
                            id
                        })
                    }
                    FaceConnection::Boundary(_) => {
                        let id = FaceIndex::new(next_face);
                        next_face += 1;
                        id
                    }
                };
                ids.push(id);
            }
            face_ids.push(ids);
        }

        Ok(Self {
            cells,
            num_ranks,
            owned,
            face_ids,
            n_global_faces: next_face,
            boundary_names,
        })
    }

    /// 单元总数
    #[inline]
    pub fn n_cells(&self) -> usize {
        self.cells.len()
    }

    /// 分区数
    #[inline]
    pub fn num_ranks(&self) -> usize {
        self.num_ranks
    }

    /// 边界数量
    #[inline]
    pub fn n_boundaries(&self) -> usize {
        self.boundary_names.len()
    }

    /// 边界名称
    pub fn boundary_name(&self, idx: usize) -> Option<&str> {
        self.boundary_names.get(idx).map(String::as_str)
    }

    /// 按全局编号访问单元
    pub fn cell(&self, id: CellIndex) -> SnResult<&Cell> {
        self.cells
            .get(id.get())
            .ok_or_else(|| SnError::index_out_of_bounds("Cell", id.get(), self.cells.len()))
    }

    /// 全体单元切片
    #[inline]
    pub fn cells(&self) -> &[Cell] {
        &self.cells
    }

    /// 某分区拥有的单元编号（升序）
    pub fn owned_cells(&self, rank: RankIndex) -> &[CellIndex] {
        self.owned
            .get(rank.get())
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// 全局编号转分区本地编号
    ///
    /// 本地编号即该单元在 `owned_cells(rank)` 中的位置，
    /// 不属于该分区时返回 None。
    pub fn local_id(&self, rank: RankIndex, global: CellIndex) -> Option<usize> {
        self.owned
            .get(rank.get())
            .and_then(|v| v.binary_search(&global).ok())
    }

    /// 全局面总数
    #[inline]
    pub fn n_global_faces(&self) -> usize {
        self.n_global_faces
    }

    /// 某单元某面槽位的全局面编号
    ///
    /// 共享面在两侧单元返回同一编号。
    pub fn face_id(&self, cell: CellIndex, face_slot: usize) -> SnResult<FaceIndex> {
        let ids = self
            .face_ids
            .get(cell.get())
            .ok_or_else(|| SnError::index_out_of_bounds("Cell", cell.get(), self.cells.len()))?;
        ids.get(face_slot)
            .copied()
            .ok_or_else(|| SnError::index_out_of_bounds("Face", face_slot, ids.len()))
    }

    /// 校验网格邻接一致性
    ///
    /// 对每个内部面检查：
    /// 1. 邻居单元存在；
    /// 2. 面上记录的 owner 与邻居单元实际归属一致；
    /// 3. 邻居存在回指本单元的面（互相引用）。
    ///
    /// 任何不一致都是致命的配置错误，在扫描开始前上报。
    pub fn validate_adjacency(&self) -> SnResult<()> {
        for c in &self.cells {
            for (fi, f) in c.faces.iter().enumerate() {
                let (nbr, stated_owner) = match f.connection {
                    FaceConnection::Neighbor { cell, owner } => (cell, owner),
                    FaceConnection::Boundary(_) => continue,
                };

                let nbr_cell = self.cells.get(nbr.get()).ok_or_else(|| {
                    SnError::config(format!(
                        "单元 {} 的面 {} 引用不存在的邻居 {}",
                        c.id, fi, nbr
                    ))
                })?;

                if nbr_cell.owner != stated_owner {
                    return Err(SnError::config(format!(
                        "单元 {} 的面 {} 记录邻居 {} 属于分区 {}，实际属于 {}",
                        c.id, fi, nbr, stated_owner, nbr_cell.owner
                    )));
                }

                let reciprocated = nbr_cell.faces.iter().any(|nf| {
                    matches!(nf.connection, FaceConnection::Neighbor { cell, .. } if cell == c.id)
                });
                if !reciprocated {
                    return Err(SnError::config(format!(
                        "单元 {} 的面 {} 声称与 {} 相邻，但 {} 没有回指的面",
                        c.id, fi, nbr, nbr
                    )));
                }
            }
        }
        Ok(())
    }
}
