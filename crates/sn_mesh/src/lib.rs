// crates/sn_mesh/src/lib.rs

//! SnSweep 网格层
//!
//! 分区多面体网格数据模型与射线几何原语。
//!
//! # 模块概览
//!
//! - [`cell`]: 单元/面数据模型（构建后只读）
//! - [`mesh`]: 分区网格与邻接一致性校验
//! - [`generation`]: 测试/演示用结构化网格生成器
//! - [`raytrace`]: 射线-单元分段几何（线面求交、条带求交、点在三角形内）
//!
//! 网格生成与通用网格处理不在本层职责内；这里只提供扫描调度
//! 所消费的最小数据模型与几何原语。

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod cell;
pub mod generation;
pub mod mesh;
pub mod raytrace;

pub use cell::{Cell, CellKind, Face, FaceConnection};
pub use generation::{OrthoMeshBuilder, SlabMeshBuilder};
pub use mesh::SweepMesh;
