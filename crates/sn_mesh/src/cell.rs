// crates/sn_mesh/src/cell.rs

//! 单元与面数据模型
//!
//! 本模块定义扫描调度所需的网格基本类型：
//!
//! - [`CellKind`]: 单元几何类别（板、多边形、多面体）
//! - [`FaceConnection`]: 面的连接关系（邻居单元或边界标签）
//! - [`Face`]: 带外法向与参考点的单元面
//! - [`Cell`]: 带分区归属的单元
//!
//! 所有类型在网格构建后只读，调度器按引用访问，从不复制。

use glam::DVec3;
use sn_foundation::indices::{BoundaryIndex, CellIndex, RankIndex};

// ============================================================
// 单元类别
// ============================================================

/// 单元几何类别
///
/// 决定射线分段时的处理方式：板与多面体按单一弦长处理，
/// 多边形按质心锚定的三角条带分解。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CellKind {
    /// 一维板单元（两个面）
    Slab,
    /// 二维多边形单元
    Polygon,
    /// 三维多面体单元
    Polyhedron,
}

// ============================================================
// 面连接关系
// ============================================================

/// 面的连接关系
///
/// 一个面要么与某个单元相邻（同分区或跨分区），要么落在网格边界上。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FaceConnection {
    /// 与邻居单元相邻
    Neighbor {
        /// 邻居单元（全局编号）
        cell: CellIndex,
        /// 邻居单元所属分区
        owner: RankIndex,
    },
    /// 网格边界，携带边界标签
    Boundary(BoundaryIndex),
}

impl FaceConnection {
    /// 是否为边界面
    #[inline]
    pub fn is_boundary(&self) -> bool {
        matches!(self, Self::Boundary(_))
    }

    /// 获取邻居单元（边界面返回 None）
    #[inline]
    pub fn neighbor(&self) -> Option<(CellIndex, RankIndex)> {
        match self {
            Self::Neighbor { cell, owner } => Some((*cell, *owner)),
            Self::Boundary(_) => None,
        }
    }

    /// 获取边界标签（内部面返回 None）
    #[inline]
    pub fn boundary(&self) -> Option<BoundaryIndex> {
        match self {
            Self::Boundary(b) => Some(*b),
            Self::Neighbor { .. } => None,
        }
    }
}

// ============================================================
// 面
// ============================================================

/// 单元面
///
/// 携带单位外法向、参考点（面心）与连接关系。法向以所属单元为内侧，
/// 指向单元外部。
#[derive(Debug, Clone)]
pub struct Face {
    /// 单位外法向
    pub normal: DVec3,
    /// 面参考点（面心）
    pub centroid: DVec3,
    /// 面顶点坐标（板单元的面可为空）
    pub vertices: Vec<DVec3>,
    /// 连接关系
    pub connection: FaceConnection,
}

impl Face {
    /// 创建内部面
    pub fn interior(normal: DVec3, centroid: DVec3, cell: CellIndex, owner: RankIndex) -> Self {
        Self {
            normal,
            centroid,
            vertices: Vec::new(),
            connection: FaceConnection::Neighbor { cell, owner },
        }
    }

    /// 创建边界面
    pub fn boundary(normal: DVec3, centroid: DVec3, tag: BoundaryIndex) -> Self {
        Self {
            normal,
            centroid,
            vertices: Vec::new(),
            connection: FaceConnection::Boundary(tag),
        }
    }

    /// 设置面顶点
    pub fn with_vertices(mut self, vertices: Vec<DVec3>) -> Self {
        self.vertices = vertices;
        self
    }
}

// ============================================================
// 单元
// ============================================================

/// 网格单元
///
/// 全局编号、分区归属与有序面列表在网格构建时确定，此后只读。
#[derive(Debug, Clone)]
pub struct Cell {
    /// 全局单元编号
    pub id: CellIndex,
    /// 所属分区
    pub owner: RankIndex,
    /// 几何类别
    pub kind: CellKind,
    /// 单元质心
    pub centroid: DVec3,
    /// 单元顶点坐标
    pub vertices: Vec<DVec3>,
    /// 有序面列表
    pub faces: Vec<Face>,
}

impl Cell {
    /// 面数量
    #[inline]
    pub fn n_faces(&self) -> usize {
        self.faces.len()
    }

    /// 遍历边界面及其标签
    pub fn boundary_faces(&self) -> impl Iterator<Item = (usize, BoundaryIndex)> + '_ {
        self.faces
            .iter()
            .enumerate()
            .filter_map(|(i, f)| f.connection.boundary().map(|b| (i, b)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sn_foundation::indices::{boundary, cell, rank};

    #[test]
    fn test_face_connection() {
        let interior = FaceConnection::Neighbor {
            cell: cell(3),
            owner: rank(0),
        };
        assert!(!interior.is_boundary());
        assert_eq!(interior.neighbor(), Some((cell(3), rank(0))));
        assert_eq!(interior.boundary(), None);

        let bnd = FaceConnection::Boundary(boundary(1));
        assert!(bnd.is_boundary());
        assert_eq!(bnd.boundary(), Some(boundary(1)));
    }

    #[test]
    fn test_cell_boundary_faces() {
        let c = Cell {
            id: cell(0),
            owner: rank(0),
            kind: CellKind::Slab,
            centroid: DVec3::ZERO,
            vertices: vec![],
            faces: vec![
                Face::boundary(DVec3::new(-1.0, 0.0, 0.0), DVec3::ZERO, boundary(0)),
                Face::interior(DVec3::new(1.0, 0.0, 0.0), DVec3::X, cell(1), rank(0)),
            ],
        };
        let bfaces: Vec<_> = c.boundary_faces().collect();
        assert_eq!(bfaces, vec![(0, boundary(0))]);
    }
}
