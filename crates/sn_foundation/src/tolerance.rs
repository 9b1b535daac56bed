// crates/sn_foundation/src/tolerance.rs

//! 数值容差配置
//!
//! 集中定义几何与通量比较使用的容差阈值，通过参数注入使用，
//! 不提供全局静态变量。

/// 数值容差配置
///
/// 包含扫描调度中所有数值比较使用的容差阈值。
#[derive(Debug, Clone, Copy)]
pub struct SweepTolerance {
    /// 几何容差（点线面相交判定）
    pub geometric: f64,
    /// 弦长求和相对容差
    pub chord_rel: f64,
    /// 镜像方向匹配容差
    pub mirror_match: f64,
    /// 通量比较容差
    pub flux: f64,
}

impl Default for SweepTolerance {
    fn default() -> Self {
        Self {
            geometric: 1e-12,
            chord_rel: 1e-10,
            mirror_match: 1e-8,
            flux: 1e-12,
        }
    }
}

/// 绝对容差比较
#[inline]
pub fn approx_eq(a: f64, b: f64, tol: f64) -> bool {
    (a - b).abs() <= tol
}

/// 相对差（以两者较大绝对值归一，零附近退化为绝对差）
#[inline]
pub fn relative_diff(a: f64, b: f64) -> f64 {
    let scale = a.abs().max(b.abs());
    if scale < f64::EPSILON {
        (a - b).abs()
    } else {
        (a - b).abs() / scale
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_approx_eq() {
        assert!(approx_eq(1.0, 1.0 + 1e-13, 1e-12));
        assert!(!approx_eq(1.0, 1.1, 1e-12));
    }

    #[test]
    fn test_relative_diff() {
        assert!(relative_diff(100.0, 100.0 + 1e-9) < 1e-10);
        assert!(relative_diff(0.0, 0.0) < f64::EPSILON);
        assert!(relative_diff(1.0, 2.0) > 0.4);
    }

    #[test]
    fn test_default_tolerance() {
        let tol = SweepTolerance::default();
        assert!(tol.chord_rel <= 1e-10);
        assert!(tol.geometric < tol.mirror_match);
    }
}
