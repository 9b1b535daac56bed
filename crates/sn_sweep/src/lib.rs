// crates/sn_sweep/src/lib.rs

//! # sn_sweep - 离散纵标扫描调度
//!
//! 离散纵标（Sₙ）输运扫描的顺序构建与异步执行：
//!
//! - [`quadrature`]: 角度求积组（Gauss-Legendre、乘积求积）
//! - [`orientation`]: 面朝向分类与卦限/极角分组键
//! - [`angleset`]: 按面朝向符号模式聚合方向为角度集
//! - [`graph`]: 每 (分区, 角度集) 的单元依赖图与确定性拓扑序
//! - [`boundary`]: 真空 / 各向同性入射 / 反射（滞后反馈）边界
//! - [`message`] / [`comm`]: 跨分区角通量消息与通道层
//! - [`kernel`]: 单元扫描核接缝与解析衰减核
//! - [`scheduler`]: 分区调度器状态机（Strict / Pipelined 策略）
//! - [`runner`]: 每分区一线程的多遍求解驱动
//!
//! # 设计原则
//!
//! 1. **顺序与执行分离**: 依赖图与拓扑序在 prepare 阶段构建一次，
//!    之后只读共享；运行期只做就绪判定与消息补齐
//! 2. **确定性**: 同一网格、求积组与分区方案得到逐位一致的顺序
//!    与结果，与消息到达时序无关
//! 3. **反射不进图**: 反射边界建模为上一遍的滞后输入，依赖图
//!    永远无环
//!
//! # 示例
//!
//! ```no_run
//! use std::sync::Arc;
//! use sn_sweep::prelude::*;
//!
//! # fn main() -> sn_foundation::error::SnResult<()> {
//! let mesh = Arc::new(SlabMeshBuilder::new(16, 1.0).with_ranks(2).build()?);
//! let quadrature = Arc::new(AngularQuadrature::gauss_legendre(8)?);
//! let kernel = Arc::new(AttenuationKernel::new(1.0, 0.5)?);
//!
//! let config = SweepRunConfig {
//!     n_passes: 1,
//!     aggregation: AngleAggregation::Octant,
//!     scheduler: SchedulerConfig::default(),
//!     boundaries: vec![
//!         BoundaryConfig::incident_isotropic("xmin", vec![1.0]),
//!         BoundaryConfig::vacuum("xmax"),
//!     ],
//! };
//! let solution = run_sweep(mesh, quadrature, kernel, &config)?;
//! println!("单元 0 角矩: {}", solution.moment(0, 0)?);
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod angleset;
pub mod boundary;
pub mod comm;
pub mod graph;
pub mod kernel;
pub mod message;
pub mod orientation;
pub mod quadrature;
pub mod runner;
pub mod scheduler;

pub use angleset::{build_angle_sets, AngleAggregation, AngleSet};
pub use boundary::{BoundaryConfig, BoundaryKind, BoundarySet};
pub use comm::{RankComm, SweepComm};
pub use graph::{build_sweep_ordering, ReceiveDep, SendDuty, SweepOrdering};
pub use kernel::{AttenuationKernel, CellSweepContext, CellSweepOutput, SweepKernel};
pub use message::FluxMessage;
pub use orientation::{classify, classify_normal, FaceOrientation};
pub use quadrature::{AngularQuadrature, Direction};
pub use runner::{run_sweep, SweepRunConfig, SweepSolution};
pub use scheduler::{
    PassReport, PassScope, PassState, SchedulerConfig, SchedulingAlgorithm, SweepScheduler,
};

/// 常用类型一站式导入
pub mod prelude {
    pub use crate::angleset::{build_angle_sets, AngleAggregation, AngleSet};
    pub use crate::boundary::{BoundaryConfig, BoundaryKind};
    pub use crate::kernel::{AttenuationKernel, SweepKernel};
    pub use crate::quadrature::AngularQuadrature;
    pub use crate::runner::{run_sweep, SweepRunConfig, SweepSolution};
    pub use crate::scheduler::{PassScope, SchedulerConfig, SchedulingAlgorithm, SweepScheduler};
    pub use sn_foundation::prelude::*;
    pub use sn_mesh::{OrthoMeshBuilder, SlabMeshBuilder, SweepMesh};
}
