// crates/sn_mesh/src/generation.rs

//! 网格生成模块
//!
//! 提供简单的结构化网格生成工具，用于测试和演示：
//!
//! - [`SlabMeshBuilder`]: 一维板网格生成器
//! - [`OrthoMeshBuilder`]: 二维正交四边形网格生成器
//!
//! 两者都支持把单元按连续条带划分到多个分区。
//!
//! # 使用示例
//!
//! ```rust
//! use sn_mesh::generation::SlabMeshBuilder;
//!
//! let mesh = SlabMeshBuilder::new(10, 1.0).with_ranks(2).build().unwrap();
//! assert_eq!(mesh.n_cells(), 10);
//! assert!(mesh.validate_adjacency().is_ok());
//! ```

use crate::cell::{Cell, CellKind, Face, FaceConnection};
use crate::mesh::SweepMesh;
use glam::DVec3;
use sn_foundation::error::{SnError, SnResult};
use sn_foundation::indices::{boundary, cell, rank, BoundaryIndex, RankIndex};

/// 连续条带分区：单元 i 归属的分区
#[inline]
fn stripe_rank(i: usize, n: usize, num_ranks: usize) -> RankIndex {
    rank(i * num_ranks / n)
}

// ============================================================
// 一维板网格
// ============================================================

/// 一维板网格生成器
///
/// 沿 x 轴生成 n 个板单元，左端边界标签 0，右端边界标签 1。
pub struct SlabMeshBuilder {
    /// 单元数
    n_cells: usize,
    /// 域长度
    length: f64,
    /// 分区数
    num_ranks: usize,
    /// 左端边界标签
    left: BoundaryIndex,
    /// 右端边界标签
    right: BoundaryIndex,
}

impl SlabMeshBuilder {
    /// 创建板网格生成器
    pub fn new(n_cells: usize, length: f64) -> Self {
        Self {
            n_cells,
            length,
            num_ranks: 1,
            left: boundary(0),
            right: boundary(1),
        }
    }

    /// 设置分区数
    pub fn with_ranks(mut self, num_ranks: usize) -> Self {
        self.num_ranks = num_ranks;
        self
    }

    /// 设置两端边界标签
    pub fn with_boundaries(mut self, left: BoundaryIndex, right: BoundaryIndex) -> Self {
        self.left = left;
        self.right = right;
        self
    }

    /// 构建网格
    pub fn build(self) -> SnResult<SweepMesh> {
        if self.n_cells == 0 {
            return Err(SnError::invalid_input("板网格单元数必须大于 0"));
        }
        if self.num_ranks > self.n_cells {
            return Err(SnError::invalid_input(format!(
                "分区数 {} 超过单元数 {}",
                self.num_ranks, self.n_cells
            )));
        }

        let dx = self.length / self.n_cells as f64;
        let n = self.n_cells;
        let mut cells = Vec::with_capacity(n);

        for i in 0..n {
            let x0 = i as f64 * dx;
            let x1 = x0 + dx;

            let left_conn = if i == 0 {
                FaceConnection::Boundary(self.left)
            } else {
                FaceConnection::Neighbor {
                    cell: cell(i - 1),
                    owner: stripe_rank(i - 1, n, self.num_ranks),
                }
            };
            let right_conn = if i == n - 1 {
                FaceConnection::Boundary(self.right)
            } else {
                FaceConnection::Neighbor {
                    cell: cell(i + 1),
                    owner: stripe_rank(i + 1, n, self.num_ranks),
                }
            };

            cells.push(Cell {
                id: cell(i),
                owner: stripe_rank(i, n, self.num_ranks),
                kind: CellKind::Slab,
                centroid: DVec3::new(x0 + 0.5 * dx, 0.0, 0.0),
                vertices: vec![DVec3::new(x0, 0.0, 0.0), DVec3::new(x1, 0.0, 0.0)],
                faces: vec![
                    Face {
                        normal: DVec3::NEG_X,
                        centroid: DVec3::new(x0, 0.0, 0.0),
                        vertices: vec![],
                        connection: left_conn,
                    },
                    Face {
                        normal: DVec3::X,
                        centroid: DVec3::new(x1, 0.0, 0.0),
                        vertices: vec![],
                        connection: right_conn,
                    },
                ],
            });
        }

        SweepMesh::new(
            cells,
            self.num_ranks,
            vec!["xmin".into(), "xmax".into()],
        )
    }
}

// ============================================================
// 二维正交网格
// ============================================================

/// 二维正交四边形网格生成器
///
/// 生成 nx × ny 的四边形单元，单元按行主序编号，分区按行条带划分。
/// 边界标签：xmin=0, xmax=1, ymin=2, ymax=3。
pub struct OrthoMeshBuilder {
    /// x 方向单元数
    nx: usize,
    /// y 方向单元数
    ny: usize,
    /// x 方向域长度
    lx: f64,
    /// y 方向域长度
    ly: f64,
    /// 分区数
    num_ranks: usize,
}

impl OrthoMeshBuilder {
    /// 创建正交网格生成器
    pub fn new(nx: usize, ny: usize, lx: f64, ly: f64) -> Self {
        Self {
            nx,
            ny,
            lx,
            ly,
            num_ranks: 1,
        }
    }

    /// 创建方形网格生成器
    pub fn square(n: usize, length: f64) -> Self {
        Self::new(n, n, length, length)
    }

    /// 设置分区数
    pub fn with_ranks(mut self, num_ranks: usize) -> Self {
        self.num_ranks = num_ranks;
        self
    }

    /// 构建网格
    pub fn build(self) -> SnResult<SweepMesh> {
        if self.nx == 0 || self.ny == 0 {
            return Err(SnError::invalid_input("正交网格单元数必须大于 0"));
        }
        if self.num_ranks > self.ny {
            return Err(SnError::invalid_input(format!(
                "分区数 {} 超过行数 {}，行条带划分不可行",
                self.num_ranks, self.ny
            )));
        }

        let dx = self.lx / self.nx as f64;
        let dy = self.ly / self.ny as f64;
        let (nx, ny) = (self.nx, self.ny);
        let n = nx * ny;
        let row_rank = |j: usize| stripe_rank(j, ny, self.num_ranks);

        let mut cells = Vec::with_capacity(n);
        for j in 0..ny {
            for i in 0..nx {
                let id = j * nx + i;
                let x0 = i as f64 * dx;
                let y0 = j as f64 * dy;
                let corners = [
                    DVec3::new(x0, y0, 0.0),
                    DVec3::new(x0 + dx, y0, 0.0),
                    DVec3::new(x0 + dx, y0 + dy, 0.0),
                    DVec3::new(x0, y0 + dy, 0.0),
                ];

                // 逆时针四条边：下、右、上、左
                let edge_info = [
                    (0usize, 1usize, DVec3::NEG_Y),
                    (1, 2, DVec3::X),
                    (2, 3, DVec3::Y),
                    (3, 0, DVec3::NEG_X),
                ];
                let neighbor_of = |edge: usize| -> Option<usize> {
                    match edge {
                        0 if j > 0 => Some(id - nx),
                        1 if i + 1 < nx => Some(id + 1),
                        2 if j + 1 < ny => Some(id + nx),
                        3 if i > 0 => Some(id - 1),
                        _ => None,
                    }
                };
                let boundary_of = |edge: usize| -> BoundaryIndex {
                    match edge {
                        0 => boundary(2), // ymin
                        1 => boundary(1), // xmax
                        2 => boundary(3), // ymax
                        _ => boundary(0), // xmin
                    }
                };

                let mut faces = Vec::with_capacity(4);
                for (e, &(a, b, normal)) in edge_info.iter().enumerate() {
                    let v0 = corners[a];
                    let v1 = corners[b];
                    let connection = match neighbor_of(e) {
                        Some(nid) => FaceConnection::Neighbor {
                            cell: cell(nid),
                            owner: row_rank(nid / nx),
                        },
                        None => FaceConnection::Boundary(boundary_of(e)),
                    };
                    faces.push(Face {
                        normal,
                        centroid: (v0 + v1) * 0.5,
                        vertices: vec![v0, v1],
                        connection,
                    });
                }

                cells.push(Cell {
                    id: cell(id),
                    owner: row_rank(j),
                    kind: CellKind::Polygon,
                    centroid: DVec3::new(x0 + 0.5 * dx, y0 + 0.5 * dy, 0.0),
                    vertices: corners.to_vec(),
                    faces,
                });
            }
        }

        SweepMesh::new(
            cells,
            self.num_ranks,
            vec!["xmin".into(), "xmax".into(), "ymin".into(), "ymax".into()],
        )
    }
}
