// crates/sn_foundation/src/lib.rs

//! SnSweep Foundation Layer
//!
//! 基础层，提供整个项目的基础抽象。
//!
//! # 模块概览
//!
//! - [`error`]: 统一错误类型
//! - [`indices`]: 强类型索引系统
//! - [`tolerance`]: 数值容差配置
//!
//! # 设计原则
//!
//! 1. **最小依赖**: 仅依赖 serde 和 thiserror
//! 2. **类型安全**: 编译期防止索引误用
//! 3. **无全局状态**: 容差等配置通过参数注入

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod error;
pub mod indices;
pub mod tolerance;

// 重导出常用类型
pub use error::{SnError, SnResult};
pub use indices::{
    AngleSetIndex, BoundaryIndex, CellIndex, DirectionIndex, FaceIndex, RankIndex,
};
pub use tolerance::SweepTolerance;

/// Prelude 模块，包含常用类型
pub mod prelude {
    pub use crate::error::{SnError, SnResult};
    pub use crate::indices::{
        angle_set, boundary, cell, direction, face, rank, AngleSetIndex, BoundaryIndex,
        CellIndex, DirectionIndex, FaceIndex, RankIndex,
    };
    pub use crate::tolerance::{approx_eq, relative_diff, SweepTolerance};
}
