// crates/sn_mesh/src/raytrace.rs

//! 射线分段几何原语
//!
//! 为非凸/多边形单元的上下游拓扑构建提供射线-单元分段能力：
//!
//! - [`plane_line_intersect`]: 线段与平面求交
//! - [`line_intersect_strip`]: 线段与条带（两点加法向定义）求交
//! - [`point_in_triangle`]: 同号叉积点在三角形内判定（边界点算内部）
//! - [`ray_segment_lengths`]: 射线穿越单元的有序分段长度
//!
//! # 算法说明
//!
//! 线面求交先把线段两端点投影到平面法向上，符号不同则穿越平面，
//! 用投影绝对值作权重插值得到交点。多边形单元按质心锚定的三角
//! 条带分解：每条边的首顶点 v0 与质心 vc 定义一个条带，收集全部
//! 有效穿越距离加上射线总长，升序稳定排序后取相邻差即为分段长度。
//! 分段长度之和恒等于弦长（浮点容差内）。

use crate::cell::{Cell, CellKind};
use glam::DVec3;
use sn_foundation::error::{SnError, SnResult};

/// 线段与平面求交
///
/// 平面由参考点与法向定义。把两端点相对参考点的向量投影到法向上，
/// 两投影符号一致（含同为零侧，判据 `>= 0`）则不穿越，返回 None；
/// 否则按投影绝对值加权插值返回交点。
pub fn plane_line_intersect(
    plane_normal: DVec3,
    plane_point: DVec3,
    line_point0: DVec3,
    line_point1: DVec3,
) -> Option<DVec3> {
    let v0 = line_point0 - plane_point;
    let v1 = line_point1 - plane_point;

    let dotp_0 = plane_normal.dot(v0);
    let dotp_1 = plane_normal.dot(v1);

    let sense_0 = dotp_0 >= 0.0;
    let sense_1 = dotp_1 >= 0.0;

    if sense_0 != sense_1 {
        let dotp_total = dotp_0.abs() + dotp_1.abs();
        let w0 = dotp_0.abs() / dotp_total;
        let w1 = 1.0 - w0;
        Some(line_point0 * w1 + line_point1 * w0)
    } else {
        None
    }
}

/// 线段与条带求交
///
/// 条带由两点 (v0, v1) 与法向 n 定义，沿 (v1-v0)×n 方向无限延伸。
/// 先做线面求交，再检验交点是否落在 v0、v1 两个界定端点之间
/// （对边向量的点积同号判定）。
pub fn line_intersect_strip(
    strip_point0: DVec3,
    strip_point1: DVec3,
    strip_normal: DVec3,
    line_point0: DVec3,
    line_point1: DVec3,
) -> Option<DVec3> {
    let plane_point = plane_line_intersect(strip_normal, strip_point0, line_point0, line_point1)?;

    let edge_vec = strip_point1 - strip_point0;
    let ints_vec1 = plane_point - strip_point0;
    let ints_vec2 = plane_point - strip_point1;

    let sense1 = edge_vec.dot(ints_vec1) >= 0.0;
    let sense2 = edge_vec.dot(ints_vec2) >= 0.0;

    if sense1 != sense2 {
        Some(plane_point)
    } else {
        None
    }
}

/// 点在三角形内判定
///
/// 对三条边依次取叉积并与三角形法向点积，三个符号全部非负则在
/// 三角形内。判据 `>= 0` 使边界上的点（含顶点）算作内部，保证
/// 分类唯一。
pub fn point_in_triangle(v0: DVec3, v1: DVec3, v2: DVec3, n: DVec3, point: DVec3) -> bool {
    let v01 = v1 - v0;
    let v12 = v2 - v1;
    let v20 = v0 - v2;

    let v0p = point - v0;
    let v1p = point - v1;
    let v2p = point - v2;

    let vc0 = v01.cross(v0p);
    let vc1 = v12.cross(v1p);
    let vc2 = v20.cross(v2p);

    let dp0 = vc0.dot(n) >= 0.0;
    let dp1 = vc1.dot(n) >= 0.0;
    let dp2 = vc2.dot(n) >= 0.0;

    dp0 && dp1 && dp2
}

/// 点是否在单元内
///
/// 多边形单元按质心锚定的三角扇逐个三角形判定；板与多面体按
/// 凸半空间判定（点到各面参考点的向量与外法向点积非正）。
pub fn cell_contains_point(cell: &Cell, point: DVec3) -> bool {
    match cell.kind {
        CellKind::Polygon => {
            let khat = DVec3::Z;
            cell.faces.iter().any(|f| {
                if f.vertices.len() < 2 {
                    return false;
                }
                point_in_triangle(f.vertices[0], f.vertices[1], cell.centroid, khat, point)
            })
        }
        CellKind::Slab | CellKind::Polyhedron => cell
            .faces
            .iter()
            .all(|f| f.normal.dot(point - f.centroid) <= 1e-12),
    }
}

/// 计算射线穿越单元的有序分段长度
///
/// - 板单元与多面体单元内部没有条带，只有单一分段（整条弦长）；
/// - 多边形单元按边分解为以质心为顶点的三角条带，只对每条边的
///   首顶点到质心的条带求交（相邻三角形共享该条带，避免重复）。
///
/// 后置条件：分段长度之和等于弦长（1e-10 相对容差内）。
///
/// # 错误
///
/// 射线长度退化为零 → `InvalidInput`。
pub fn ray_segment_lengths(cell: &Cell, line_point0: DVec3, line_point1: DVec3) -> SnResult<Vec<f64>> {
    let ray_length = (line_point1 - line_point0).length();
    if ray_length <= f64::EPSILON {
        return Err(SnError::invalid_input("射线长度为零，无法分段"));
    }

    let mut distance_to_segments: Vec<f64> = Vec::new();
    distance_to_segments.push(ray_length);

    if cell.kind == CellKind::Polygon {
        let khat = DVec3::Z;
        for face in &cell.faces {
            let Some(&v0) = face.vertices.first() else {
                log::warn!("多边形单元 {} 的面缺少顶点，跳过条带求交", cell.id);
                continue;
            };
            let vc = cell.centroid;

            let vc0 = vc - v0;
            if vc0.length() <= f64::EPSILON {
                continue;
            }
            let n0 = vc0.normalize().cross(khat).normalize();

            if let Some(ip) = line_intersect_strip(v0, vc, n0, line_point0, line_point1) {
                let d = (ip - line_point0).length();
                distance_to_segments.push(d);
            }
        }
    }

    // 升序稳定排序后取相邻差；N 次穿越恒给出 N+1 个距离
    distance_to_segments.sort_by(|a, b| a.partial_cmp(b).expect("分段距离不应为 NaN"));

    let mut segment_lengths = Vec::with_capacity(distance_to_segments.len());
    segment_lengths.push(distance_to_segments[0]);
    for di in 1..distance_to_segments.len() {
        segment_lengths.push(distance_to_segments[di] - distance_to_segments[di - 1]);
    }

    Ok(segment_lengths)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cell::{CellKind, Face};
    use sn_foundation::indices::{boundary, cell, rank};
    use sn_foundation::tolerance::relative_diff;

    fn unit_square_polygon() -> Cell {
        // 单位正方形，质心 (0.5, 0.5)，四条边逆时针
        let corners = [
            DVec3::new(0.0, 0.0, 0.0),
            DVec3::new(1.0, 0.0, 0.0),
            DVec3::new(1.0, 1.0, 0.0),
            DVec3::new(0.0, 1.0, 0.0),
        ];
        let normals = [DVec3::NEG_Y, DVec3::X, DVec3::Y, DVec3::NEG_X];
        let mut faces = Vec::new();
        for i in 0..4 {
            let v0 = corners[i];
            let v1 = corners[(i + 1) % 4];
            faces.push(
                Face::boundary(normals[i], (v0 + v1) * 0.5, boundary(i))
                    .with_vertices(vec![v0, v1]),
            );
        }
        Cell {
            id: cell(0),
            owner: rank(0),
            kind: CellKind::Polygon,
            centroid: DVec3::new(0.5, 0.5, 0.0),
            vertices: corners.to_vec(),
            faces,
        }
    }

    #[test]
    fn test_plane_line_intersect() {
        let ip = plane_line_intersect(
            DVec3::X,
            DVec3::new(0.5, 0.0, 0.0),
            DVec3::ZERO,
            DVec3::X,
        )
        .unwrap();
        assert!((ip.x - 0.5).abs() < 1e-12);

        // 两端点同侧无交点
        assert!(plane_line_intersect(
            DVec3::X,
            DVec3::new(2.0, 0.0, 0.0),
            DVec3::ZERO,
            DVec3::X,
        )
        .is_none());
    }

    #[test]
    fn test_point_in_triangle_boundary_inclusive() {
        let v0 = DVec3::ZERO;
        let v1 = DVec3::new(1.0, 0.0, 0.0);
        let v2 = DVec3::new(0.0, 1.0, 0.0);
        let n = DVec3::Z;

        // 内部点
        assert!(point_in_triangle(v0, v1, v2, n, DVec3::new(0.25, 0.25, 0.0)));
        // 边上的点算内部
        assert!(point_in_triangle(v0, v1, v2, n, DVec3::new(0.5, 0.0, 0.0)));
        // 顶点算内部
        assert!(point_in_triangle(v0, v1, v2, n, v0));
        // 外部点
        assert!(!point_in_triangle(v0, v1, v2, n, DVec3::new(1.0, 1.0, 0.0)));
    }

    #[test]
    fn test_segment_lengths_sum_to_chord() {
        let sq = unit_square_polygon();
        // 对角穿越
        let p0 = DVec3::new(0.0, 0.0, 0.0);
        let p1 = DVec3::new(1.0, 1.0, 0.0);
        let segs = ray_segment_lengths(&sq, p0, p1).unwrap();
        let total: f64 = segs.iter().sum();
        let chord = (p1 - p0).length();
        assert!(relative_diff(total, chord) < 1e-10);
        assert!(segs.iter().all(|&s| s >= 0.0));

        // 水平穿越，必穿过两个条带
        let p0 = DVec3::new(0.0, 0.3, 0.0);
        let p1 = DVec3::new(1.0, 0.3, 0.0);
        let segs = ray_segment_lengths(&sq, p0, p1).unwrap();
        let total: f64 = segs.iter().sum();
        assert!(relative_diff(total, 1.0) < 1e-10);
        assert!(segs.len() >= 2);
    }

    #[test]
    fn test_slab_single_segment() {
        let slab = Cell {
            id: cell(0),
            owner: rank(0),
            kind: CellKind::Slab,
            centroid: DVec3::new(0.5, 0.0, 0.0),
            vertices: vec![],
            faces: vec![
                Face::boundary(DVec3::NEG_X, DVec3::ZERO, boundary(0)),
                Face::boundary(DVec3::X, DVec3::X, boundary(1)),
            ],
        };
        let segs = ray_segment_lengths(&slab, DVec3::ZERO, DVec3::X).unwrap();
        assert_eq!(segs.len(), 1);
        assert!((segs[0] - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_degenerate_ray_rejected() {
        let sq = unit_square_polygon();
        assert!(ray_segment_lengths(&sq, DVec3::ZERO, DVec3::ZERO).is_err());
    }

    #[test]
    fn test_cell_contains_point() {
        let sq = unit_square_polygon();
        assert!(cell_contains_point(&sq, DVec3::new(0.5, 0.5, 0.0)));
        assert!(cell_contains_point(&sq, DVec3::new(0.0, 0.5, 0.0)));
        assert!(!cell_contains_point(&sq, DVec3::new(1.5, 0.5, 0.0)));
    }
}
