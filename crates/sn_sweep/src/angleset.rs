// crates/sn_sweep/src/angleset.rs

//! 角度集聚合
//!
//! 把面朝向符号模式完全相同的方向归入同一角度集，使依赖图
//! 对每个角度集只构建一次，由全部成员方向共享只读使用。
//!
//! # 聚合粒度
//!
//! 聚合粒度是性能选择而非正确性选择，作为配置暴露：
//!
//! - [`AngleAggregation::Octant`]: 纯卦限聚合（三维八组、二维四组、
//!   一维两组），图构建开销最小
//! - [`AngleAggregation::PolarOctant`]: 卦限内再按极角层细分，
//!   角度集更多更小，便于流水线调度隐藏通信延迟

use crate::orientation::{octant_of, polar_key};
use crate::quadrature::AngularQuadrature;
use glam::DVec3;
use serde::{Deserialize, Serialize};
use sn_foundation::indices::{AngleSetIndex, DirectionIndex};
use std::collections::BTreeMap;

/// 角度集聚合策略
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum AngleAggregation {
    /// 纯卦限聚合
    #[default]
    Octant,
    /// 卦限 × 极角层聚合
    PolarOctant,
}

/// 角度集
///
/// 成员方向共享同一面朝向符号模式；`representative` 是首个成员的
/// 方向向量，对任何面的分类与全体成员一致，供依赖图构建使用。
#[derive(Debug, Clone)]
pub struct AngleSet {
    /// 角度集编号
    pub id: AngleSetIndex,
    /// 成员方向序号（升序）
    pub directions: Vec<DirectionIndex>,
    /// 代表方向向量
    pub representative: DVec3,
}

impl AngleSet {
    /// 成员方向数
    #[inline]
    pub fn n_directions(&self) -> usize {
        self.directions.len()
    }
}

/// 按策略聚合方向为角度集
///
/// 分组键为 (卦限, 可选极角层)，用 BTreeMap 保证分组遍历确定；
/// 角度集按最小成员方向序号排序后编号，结果对同一求积组完全可重现。
pub fn build_angle_sets(
    quadrature: &AngularQuadrature,
    strategy: AngleAggregation,
) -> Vec<AngleSet> {
    let mut groups: BTreeMap<(u8, i64), Vec<DirectionIndex>> = BTreeMap::new();

    for d in quadrature.directions() {
        let sub = match strategy {
            AngleAggregation::Octant => 0,
            AngleAggregation::PolarOctant => polar_key(d.omega),
        };
        groups
            .entry((octant_of(d.omega), sub))
            .or_default()
            .push(d.index);
    }

    let mut sets: Vec<Vec<DirectionIndex>> = groups.into_values().collect();
    for members in &mut sets {
        members.sort();
    }
    sets.sort_by_key(|members| members[0]);

    sets.into_iter()
        .enumerate()
        .map(|(i, directions)| {
            let representative = quadrature.directions()[directions[0].get()].omega;
            AngleSet {
                id: AngleSetIndex::new(i),
                directions,
                representative,
            }
        })
        .collect()
}
