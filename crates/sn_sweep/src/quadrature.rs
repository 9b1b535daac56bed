// crates/sn_sweep/src/quadrature.rs

//! 角度求积组
//!
//! 提供离散纵标方向集合：
//!
//! - [`Direction`]: 单位方向向量 + 积分权重 + 序号
//! - [`AngularQuadrature`]: 方向有序列表，构建后不可变
//!
//! # 构造方式
//!
//! - [`AngularQuadrature::gauss_legendre`]: 一维（板几何）
//!   Gauss-Legendre 求积，Newton 迭代求 Legendre 多项式根
//! - [`AngularQuadrature::product_quadrature`]: 极角 Gauss-Legendre ×
//!   方位角等权的乘积求积组（二维/三维）
//! - [`AngularQuadrature::from_directions`]: 自定义方向集

use glam::DVec3;
use sn_foundation::error::{SnError, SnResult};
use sn_foundation::indices::DirectionIndex;

/// 离散方向
///
/// 求积组构建后不可变。
#[derive(Debug, Clone, Copy)]
pub struct Direction {
    /// 单位方向向量
    pub omega: DVec3,
    /// 积分权重
    pub weight: f64,
    /// 在求积组中的序号
    pub index: DirectionIndex,
}

/// 角度求积组
#[derive(Debug, Clone)]
pub struct AngularQuadrature {
    /// 方向有序列表
    directions: Vec<Direction>,
}

impl AngularQuadrature {
    /// 从自定义 (方向, 权重) 列表构建
    ///
    /// # 错误
    ///
    /// 空列表或存在零长方向向量 → `InvalidInput`。
    pub fn from_directions(entries: &[(DVec3, f64)]) -> SnResult<Self> {
        if entries.is_empty() {
            return Err(SnError::invalid_input("求积组方向列表为空"));
        }
        let mut directions = Vec::with_capacity(entries.len());
        for (i, &(omega, weight)) in entries.iter().enumerate() {
            if omega.length() <= f64::EPSILON {
                return Err(SnError::invalid_input(format!("方向 {} 的向量长度为零", i)));
            }
            directions.push(Direction {
                omega: omega.normalize(),
                weight,
                index: DirectionIndex::new(i),
            });
        }
        Ok(Self { directions })
    }

    /// 一维 Gauss-Legendre 求积（板几何）
    ///
    /// 方向为 (μ, 0, 0)，μ 为 [-1, 1] 上的 n 个 Legendre 根，
    /// 按升序排列；权重之和为 2。
    pub fn gauss_legendre(n: usize) -> SnResult<Self> {
        let (mus, weights) = gauss_legendre_points(n)?;
        let entries: Vec<(DVec3, f64)> = mus
            .iter()
            .zip(weights.iter())
            .map(|(&mu, &w)| (DVec3::new(mu, 0.0, 0.0), w))
            .collect();
        Self::from_directions(&entries)
    }

    /// 乘积求积组
    ///
    /// 极角余弦 μ = ω·ẑ 取 n_polar 个 Gauss-Legendre 点，方位角取
    /// n_azimuthal 个等分角（等权）。方向按 (极角层, 方位角) 行主序
    /// 排列，权重之和为 4π。
    pub fn product_quadrature(n_polar: usize, n_azimuthal: usize) -> SnResult<Self> {
        if n_azimuthal == 0 {
            return Err(SnError::invalid_input("方位角份数必须大于 0"));
        }
        let (mus, polar_weights) = gauss_legendre_points(n_polar)?;
        let azi_weight = 2.0 * std::f64::consts::PI / n_azimuthal as f64;

        let mut entries = Vec::with_capacity(n_polar * n_azimuthal);
        for (&mu, &wp) in mus.iter().zip(polar_weights.iter()) {
            let sin_theta = (1.0 - mu * mu).sqrt();
            for k in 0..n_azimuthal {
                // 方位角取每个扇区中心，避免恰好落在坐标轴上
                let phi = (k as f64 + 0.5) * 2.0 * std::f64::consts::PI / n_azimuthal as f64;
                let omega = DVec3::new(sin_theta * phi.cos(), sin_theta * phi.sin(), mu);
                entries.push((omega, wp * azi_weight));
            }
        }
        Self::from_directions(&entries)
    }

    /// 方向数量
    #[inline]
    pub fn n_directions(&self) -> usize {
        self.directions.len()
    }

    /// 方向有序切片
    #[inline]
    pub fn directions(&self) -> &[Direction] {
        &self.directions
    }

    /// 按序号访问方向
    pub fn direction(&self, idx: DirectionIndex) -> SnResult<&Direction> {
        self.directions.get(idx.get()).ok_or_else(|| {
            SnError::index_out_of_bounds("Direction", idx.get(), self.directions.len())
        })
    }

    /// 权重总和
    pub fn weight_sum(&self) -> f64 {
        self.directions.iter().map(|d| d.weight).sum()
    }

    /// 查找与给定向量最接近的方向
    ///
    /// 用于反射边界的镜像方向匹配；偏差超过 `tol`（方向向量之差的
    /// 模）时返回 None。
    pub fn nearest_direction(&self, omega: DVec3, tol: f64) -> Option<DirectionIndex> {
        let mut best: Option<(f64, DirectionIndex)> = None;
        for d in &self.directions {
            let dist = (d.omega - omega).length();
            if best.map_or(true, |(b, _)| dist < b) {
                best = Some((dist, d.index));
            }
        }
        best.and_then(|(dist, idx)| (dist <= tol).then_some(idx))
    }
}

/// Newton 迭代求 n 点 Gauss-Legendre 求积的根与权重
///
/// 初值取 Chebyshev 近似 cos(π(4i+3)/(4n+2))，根按升序返回。
fn gauss_legendre_points(n: usize) -> SnResult<(Vec<f64>, Vec<f64>)> {
    if n == 0 {
        return Err(SnError::invalid_input("Gauss-Legendre 点数必须大于 0"));
    }

    let mut roots = Vec::with_capacity(n);
    let mut weights = Vec::with_capacity(n);

    for i in 0..n {
        let mut x = (std::f64::consts::PI * (4.0 * i as f64 + 3.0) / (4.0 * n as f64 + 2.0)).cos();
        let mut dp = 0.0;
        for _ in 0..100 {
            let (p, p_deriv) = legendre(n, x);
            dp = p_deriv;
            let dx = p / p_deriv;
            x -= dx;
            if dx.abs() < 1e-15 {
                break;
            }
        }
        roots.push(x);
        weights.push(2.0 / ((1.0 - x * x) * dp * dp));
    }

    // 初值公式给出的根按降序产生，翻转为升序
    roots.reverse();
    weights.reverse();
    Ok((roots, weights))
}

/// Legendre 多项式 P_n 及其导数，三项递推求值
fn legendre(n: usize, x: f64) -> (f64, f64) {
    let mut p0 = 1.0;
    let mut p1 = x;
    if n == 0 {
        return (1.0, 0.0);
    }
    for k in 2..=n {
        let k = k as f64;
        let p2 = ((2.0 * k - 1.0) * x * p1 - (k - 1.0) * p0) / k;
        p0 = p1;
        p1 = p2;
    }
    let deriv = n as f64 * (x * p1 - p0) / (x * x - 1.0);
    (p1, deriv)
}
