// crates/sn_sweep/src/orientation.rs

//! 面朝向分类
//!
//! 按方向向量与面外法向点积的符号，把单元面分为入流/出流。
//! 判据 `dot >= 0 ⇒ Outgoing`：掠射方向统一算出流，保证任何面
//! 对任何方向都只有唯一分类。

use glam::DVec3;
use sn_mesh::Face;

/// 面朝向
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FaceOrientation {
    /// 入流面（上游）
    Incoming,
    /// 出流面（下游）
    Outgoing,
}

impl FaceOrientation {
    /// 是否为出流面
    #[inline]
    pub fn is_outgoing(self) -> bool {
        matches!(self, Self::Outgoing)
    }
}

/// 按方向分类单元面
///
/// 掠射（点积为零）算出流。
#[inline]
pub fn classify(face: &Face, omega: DVec3) -> FaceOrientation {
    classify_normal(face.normal, omega)
}

/// 按法向分类（不需要完整 Face）
#[inline]
pub fn classify_normal(normal: DVec3, omega: DVec3) -> FaceOrientation {
    if omega.dot(normal) >= 0.0 {
        FaceOrientation::Outgoing
    } else {
        FaceOrientation::Incoming
    }
}

/// 方向所在卦限的符号模式（3 位：x、y、z 分量符号）
///
/// 共享同一符号模式的方向对任何轴对齐面法向有相同的入流/出流
/// 分类，是角度集聚合的主键。分量为零按正号处理，与掠射判据一致。
#[inline]
pub fn octant_of(omega: DVec3) -> u8 {
    let mut key = 0u8;
    if omega.x >= 0.0 {
        key |= 1;
    }
    if omega.y >= 0.0 {
        key |= 2;
    }
    if omega.z >= 0.0 {
        key |= 4;
    }
    key
}

/// 极角层次键：对 ω·ẑ 量化后的整数
///
/// 乘积求积组中同一极角层的方向 ω·ẑ 相同；量化到 1e-9 避免
/// 浮点噪声拆散同层方向。
#[inline]
pub fn polar_key(omega: DVec3) -> i64 {
    (omega.z * 1e9).round() as i64
}

/// 镜面反射方向：ω − 2(ω·n)n
#[inline]
pub fn mirror_direction(omega: DVec3, normal: DVec3) -> DVec3 {
    omega - 2.0 * omega.dot(normal) * normal
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify() {
        let n = DVec3::X;
        assert_eq!(classify_normal(n, DVec3::new(0.5, 0.2, 0.0)), FaceOrientation::Outgoing);
        assert_eq!(classify_normal(n, DVec3::new(-0.5, 0.2, 0.0)), FaceOrientation::Incoming);
        // 掠射算出流
        assert_eq!(classify_normal(n, DVec3::Y), FaceOrientation::Outgoing);
    }

    #[test]
    fn test_octant() {
        assert_eq!(octant_of(DVec3::new(1.0, 1.0, 1.0)), 0b111);
        assert_eq!(octant_of(DVec3::new(-1.0, 1.0, -1.0)), 0b010);
        assert_eq!(octant_of(DVec3::new(-1.0, -1.0, -1.0)), 0);
        // 零分量按正号
        assert_eq!(octant_of(DVec3::new(1.0, 0.0, 0.0)), 0b111);
    }

    #[test]
    fn test_mirror_direction() {
        let omega = DVec3::new(0.6, 0.8, 0.0);
        let m = mirror_direction(omega, DVec3::X);
        assert!((m.x + 0.6).abs() < 1e-12);
        assert!((m.y - 0.8).abs() < 1e-12);
        // 反射保模长
        assert!((m.length() - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_polar_key_groups_levels() {
        let a = DVec3::new(0.5, 0.5, 0.70710678118).normalize();
        let b = DVec3::new(-0.5, 0.5, 0.70710678118).normalize();
        assert_eq!(polar_key(a), polar_key(b));
    }
}
