// crates/sn_sweep/src/boundary.rs

//! 扫描边界条件
//!
//! 本模块提供扫描入流通量的三种边界变体：
//!
//! - [`BoundaryKind::Vacuum`]: 入流恒零，不引入任何依赖
//! - [`BoundaryKind::IncidentIsotropic`]: 固定入射源向量，跨扫描不变
//! - [`BoundaryKind::Reflecting`]: 返回上一遍扫描在镜像面、镜像方向
//!   记录的出流通量；首遍默认为零
//!
//! # 反射边界与环
//!
//! 反射边界是整个依赖结构中环的唯一来源。它被刻意排除在依赖图外，
//! 建模为滞后一遍的外部输入，从结构上断开环。反射面通量是否收敛
//! 由外层迭代负责判断，调度器只保证每一遍内部有序；[`BoundarySet::advance_pass`]
//! 返回相邻两遍记录值的最大偏差供外层使用。

use crate::orientation::mirror_direction;
use crate::quadrature::AngularQuadrature;
use glam::DVec3;
use serde::{Deserialize, Serialize};
use sn_foundation::error::{SnError, SnResult};
use sn_foundation::indices::{BoundaryIndex, DirectionIndex, FaceIndex};
use sn_foundation::tolerance::SweepTolerance;
use sn_mesh::SweepMesh;
use std::collections::HashMap;
use std::sync::Arc;

// ============================================================
// 边界类型与配置
// ============================================================

/// 边界类型枚举
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum BoundaryKind {
    /// 真空边界（入流恒零）
    #[default]
    Vacuum,
    /// 各向同性入射边界（固定源向量）
    IncidentIsotropic,
    /// 反射边界（镜像方向滞后反馈）
    Reflecting,
}

impl BoundaryKind {
    /// 是否需要入射源数据
    #[inline]
    pub fn requires_source(&self) -> bool {
        matches!(self, Self::IncidentIsotropic)
    }

    /// 是否引入跨扫描反馈
    #[inline]
    pub fn is_reflecting(&self) -> bool {
        matches!(self, Self::Reflecting)
    }
}

impl std::fmt::Display for BoundaryKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Vacuum => "Vacuum",
            Self::IncidentIsotropic => "IncidentIsotropic",
            Self::Reflecting => "Reflecting",
        };
        write!(f, "{}", name)
    }
}

/// 边界条件配置
///
/// 按名称与网格边界匹配。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BoundaryConfig {
    /// 边界名称（与网格边界名对应）
    pub name: String,
    /// 边界类型
    pub kind: BoundaryKind,
    /// 入射源向量（仅 IncidentIsotropic 使用）
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub incident: Option<Vec<f64>>,
}

impl BoundaryConfig {
    /// 创建真空边界
    pub fn vacuum(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: BoundaryKind::Vacuum,
            incident: None,
        }
    }

    /// 创建各向同性入射边界
    pub fn incident_isotropic(name: impl Into<String>, values: Vec<f64>) -> Self {
        Self {
            name: name.into(),
            kind: BoundaryKind::IncidentIsotropic,
            incident: Some(values),
        }
    }

    /// 创建反射边界
    pub fn reflecting(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: BoundaryKind::Reflecting,
            incident: None,
        }
    }
}

// ============================================================
// 反射通量存储
// ============================================================

/// 反射面通量双缓冲
///
/// `current` 收集本遍记录的出流通量，`previous` 提供上一遍完成时
/// 的值；换遍时交换。键为 (全局面编号, 出流方向)。
#[derive(Debug, Default)]
struct ReflectingStore {
    previous: HashMap<(FaceIndex, DirectionIndex), Vec<f64>>,
    current: HashMap<(FaceIndex, DirectionIndex), Vec<f64>>,
}

impl ReflectingStore {
    fn record(&mut self, face: FaceIndex, dir: DirectionIndex, values: Vec<f64>) {
        self.current.insert((face, dir), values);
    }

    fn lagged(&self, face: FaceIndex, dir: DirectionIndex) -> Option<&[f64]> {
        self.previous.get(&(face, dir)).map(Vec::as_slice)
    }

    /// 相邻两遍记录值的最大绝对偏差
    fn delta(&self) -> f64 {
        let mut max = 0.0f64;
        for (key, cur) in &self.current {
            match self.previous.get(key) {
                Some(prev) => {
                    for (a, b) in cur.iter().zip(prev.iter()) {
                        max = max.max((a - b).abs());
                    }
                }
                None => {
                    for a in cur {
                        max = max.max(a.abs());
                    }
                }
            }
        }
        max
    }

    fn advance(&mut self) -> f64 {
        let delta = self.delta();
        self.previous = std::mem::take(&mut self.current);
        delta
    }

    fn clear_current(&mut self) {
        self.current.clear();
    }
}

// ============================================================
// 边界集合
// ============================================================

/// 分区本地的边界条件集合
///
/// 由配置按名称匹配网格边界构建；每个分区线程独占一份
/// （反射存储随之本地化，不跨分区共享）。
#[derive(Debug)]
pub struct BoundarySet {
    kinds: Vec<BoundaryKind>,
    incident: Vec<Option<Vec<f64>>>,
    store: ReflectingStore,
    quadrature: Arc<AngularQuadrature>,
    width: usize,
    tol: SweepTolerance,
}

impl BoundarySet {
    /// 从配置构建边界集合
    ///
    /// # 错误
    ///
    /// - 网格边界缺少同名配置 → `Config`
    /// - 入射源向量长度与通量宽度不符 → `Config`
    pub fn from_configs(
        configs: &[BoundaryConfig],
        mesh: &SweepMesh,
        quadrature: Arc<AngularQuadrature>,
        width: usize,
    ) -> SnResult<Self> {
        let mut kinds = Vec::with_capacity(mesh.n_boundaries());
        let mut incident = Vec::with_capacity(mesh.n_boundaries());

        for b in 0..mesh.n_boundaries() {
            let name = mesh
                .boundary_name(b)
                .ok_or_else(|| SnError::internal("边界名称缺失"))?;
            let cfg = configs.iter().find(|c| c.name == name).ok_or_else(|| {
                SnError::config(format!("网格边界 '{}' 没有对应的边界条件配置", name))
            })?;

            if cfg.kind.requires_source() {
                let values = cfg.incident.as_ref().ok_or_else(|| {
                    SnError::config(format!("入射边界 '{}' 缺少源向量", name))
                })?;
                if values.len() != width {
                    return Err(SnError::config(format!(
                        "入射边界 '{}' 源向量长度 {} 与通量宽度 {} 不符",
                        name,
                        values.len(),
                        width
                    )));
                }
            }

            kinds.push(cfg.kind);
            incident.push(cfg.incident.clone());
        }

        Ok(Self {
            kinds,
            incident,
            store: ReflectingStore::default(),
            quadrature,
            width,
            tol: SweepTolerance::default(),
        })
    }

    /// 边界类型
    pub fn kind(&self, tag: BoundaryIndex) -> SnResult<BoundaryKind> {
        self.kinds
            .get(tag.get())
            .copied()
            .ok_or_else(|| SnError::index_out_of_bounds("Boundary", tag.get(), self.kinds.len()))
    }

    /// 是否存在反射边界
    pub fn has_reflecting(&self) -> bool {
        self.kinds.iter().any(BoundaryKind::is_reflecting)
    }

    /// 查询边界入流通量
    ///
    /// 反射边界返回上一遍在 (同一面, 镜像方向) 记录的出流通量；
    /// 首遍尚无记录时为零。镜像方向按 ω − 2(ω·n)n 在求积组中就近
    /// 匹配，求积组不对称（无镜像方向）是配置错误。
    pub fn incoming_flux(
        &self,
        tag: BoundaryIndex,
        face: FaceIndex,
        face_normal: DVec3,
        dir: DirectionIndex,
    ) -> SnResult<Vec<f64>> {
        match self.kind(tag)? {
            BoundaryKind::Vacuum => Ok(vec![0.0; self.width]),
            BoundaryKind::IncidentIsotropic => {
                let values = self.incident[tag.get()]
                    .as_ref()
                    .ok_or_else(|| SnError::internal("入射边界缺少源向量"))?;
                Ok(values.clone())
            }
            BoundaryKind::Reflecting => {
                let omega = self.quadrature.direction(dir)?.omega;
                let mirrored = mirror_direction(omega, face_normal);
                let mirror_dir = self
                    .quadrature
                    .nearest_direction(mirrored, self.tol.mirror_match)
                    .ok_or_else(|| {
                        SnError::config(format!(
                            "求积组中找不到方向 {} 关于法向 {:?} 的镜像方向",
                            dir, face_normal
                        ))
                    })?;
                Ok(self
                    .store
                    .lagged(face, mirror_dir)
                    .map(<[f64]>::to_vec)
                    .unwrap_or_else(|| vec![0.0; self.width]))
            }
        }
    }

    /// 记录反射面出流通量（非反射边界静默忽略）
    pub fn record_outgoing(
        &mut self,
        tag: BoundaryIndex,
        face: FaceIndex,
        dir: DirectionIndex,
        values: Vec<f64>,
    ) -> SnResult<()> {
        if self.kind(tag)?.is_reflecting() {
            SnError::check_size("reflecting flux", self.width, values.len())?;
            self.store.record(face, dir, values);
        }
        Ok(())
    }

    /// 完成一遍扫描：交换双缓冲，返回相邻两遍的最大偏差
    pub fn advance_pass(&mut self) -> f64 {
        self.store.advance()
    }

    /// 丢弃本遍已记录的反射通量（扫描中止时调用）
    pub fn discard_pass(&mut self) {
        self.store.clear_current();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sn_foundation::indices::{boundary, direction, face};
    use sn_mesh::SlabMeshBuilder;

    fn slab_setup(configs: Vec<BoundaryConfig>) -> SnResult<BoundarySet> {
        let mesh = SlabMeshBuilder::new(2, 1.0).build().unwrap();
        let quad = Arc::new(AngularQuadrature::gauss_legendre(2).unwrap());
        BoundarySet::from_configs(&configs, &mesh, quad, 1)
    }

    #[test]
    fn test_vacuum_is_zero() {
        let set = slab_setup(vec![
            BoundaryConfig::vacuum("xmin"),
            BoundaryConfig::vacuum("xmax"),
        ])
        .unwrap();
        let flux = set
            .incoming_flux(boundary(0), face(0), DVec3::NEG_X, direction(1))
            .unwrap();
        assert_eq!(flux, vec![0.0]);
    }

    #[test]
    fn test_incident_isotropic_fixed() {
        let set = slab_setup(vec![
            BoundaryConfig::incident_isotropic("xmin", vec![2.5]),
            BoundaryConfig::vacuum("xmax"),
        ])
        .unwrap();
        let flux = set
            .incoming_flux(boundary(0), face(0), DVec3::NEG_X, direction(1))
            .unwrap();
        assert_eq!(flux, vec![2.5]);
    }

    #[test]
    fn test_reflecting_lagged_feedback() {
        let mut set = slab_setup(vec![
            BoundaryConfig::reflecting("xmin"),
            BoundaryConfig::vacuum("xmax"),
        ])
        .unwrap();

        // 首遍：无记录，读出零
        let flux = set
            .incoming_flux(boundary(0), face(0), DVec3::NEG_X, direction(1))
            .unwrap();
        assert_eq!(flux, vec![0.0]);

        // 记录 μ<0 方向（dir 0）的出流，换遍后 μ>0 方向（dir 1）读到它
        set.record_outgoing(boundary(0), face(0), direction(0), vec![3.0])
            .unwrap();
        let delta = set.advance_pass();
        assert!((delta - 3.0).abs() < 1e-12);

        let flux = set
            .incoming_flux(boundary(0), face(0), DVec3::NEG_X, direction(1))
            .unwrap();
        assert_eq!(flux, vec![3.0]);
    }

    #[test]
    fn test_advance_delta_shrinks_when_stable() {
        let mut set = slab_setup(vec![
            BoundaryConfig::reflecting("xmin"),
            BoundaryConfig::vacuum("xmax"),
        ])
        .unwrap();
        set.record_outgoing(boundary(0), face(0), direction(0), vec![2.0])
            .unwrap();
        set.advance_pass();
        set.record_outgoing(boundary(0), face(0), direction(0), vec![2.0])
            .unwrap();
        let delta = set.advance_pass();
        assert!(delta < 1e-12);
    }

    #[test]
    fn test_missing_config_rejected() {
        let err = slab_setup(vec![BoundaryConfig::vacuum("xmin")]).unwrap_err();
        assert!(matches!(err, SnError::Config { .. }));
    }

    #[test]
    fn test_incident_width_mismatch_rejected() {
        let err = slab_setup(vec![
            BoundaryConfig::incident_isotropic("xmin", vec![1.0, 2.0]),
            BoundaryConfig::vacuum("xmax"),
        ])
        .unwrap_err();
        assert!(matches!(err, SnError::Config { .. }));
    }

    #[test]
    fn test_record_ignored_for_vacuum() {
        let mut set = slab_setup(vec![
            BoundaryConfig::vacuum("xmin"),
            BoundaryConfig::vacuum("xmax"),
        ])
        .unwrap();
        set.record_outgoing(boundary(0), face(0), direction(0), vec![9.0])
            .unwrap();
        assert!((set.advance_pass()).abs() < 1e-12);
    }
}
