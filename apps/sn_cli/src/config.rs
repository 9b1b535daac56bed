// apps/sn_cli/src/config.rs

//! 算例文件
//!
//! 一个 JSON 文件描述完整算例：网格、求积组、扫描核与求解配置。

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::Arc;

use sn_mesh::{OrthoMeshBuilder, SlabMeshBuilder, SweepMesh};
use sn_sweep::{
    AngularQuadrature, AttenuationKernel, BoundaryConfig, SchedulerConfig, SweepRunConfig,
};

/// 网格描述
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum MeshSpec {
    /// 一维板网格
    Slab {
        n_cells: usize,
        length: f64,
        #[serde(default = "one")]
        ranks: usize,
    },
    /// 二维正交网格
    Ortho {
        nx: usize,
        ny: usize,
        lx: f64,
        ly: f64,
        #[serde(default = "one")]
        ranks: usize,
    },
}

fn one() -> usize {
    1
}

/// 求积组描述
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum QuadratureSpec {
    /// 一维 Gauss-Legendre
    GaussLegendre { n: usize },
    /// 极角 × 方位角乘积求积
    Product { n_polar: usize, n_azimuthal: usize },
}

/// 扫描核参数
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KernelSpec {
    /// 总截面
    pub sigma_t: f64,
    /// 均匀各向同性源
    pub source: f64,
}

/// 完整算例
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CaseFile {
    pub mesh: MeshSpec,
    pub quadrature: QuadratureSpec,
    pub kernel: KernelSpec,
    pub run: SweepRunConfig,
}

impl CaseFile {
    /// 从 JSON 文件加载
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("读取算例文件 {} 失败", path.display()))?;
        serde_json::from_str(&text)
            .with_context(|| format!("解析算例文件 {} 失败", path.display()))
    }

    /// 内置演示算例：板几何、入射 + 真空边界
    pub fn demo(n_cells: usize, ranks: usize, sigma_t: f64, source: f64) -> Self {
        Self {
            mesh: MeshSpec::Slab {
                n_cells,
                length: 1.0,
                ranks,
            },
            quadrature: QuadratureSpec::GaussLegendre { n: 8 },
            kernel: KernelSpec { sigma_t, source },
            run: SweepRunConfig {
                n_passes: 1,
                aggregation: Default::default(),
                scheduler: SchedulerConfig::default(),
                boundaries: vec![
                    BoundaryConfig::incident_isotropic("xmin", vec![1.0]),
                    BoundaryConfig::vacuum("xmax"),
                ],
            },
        }
    }

    /// 构建网格
    pub fn build_mesh(&self) -> Result<Arc<SweepMesh>> {
        let mesh = match self.mesh {
            MeshSpec::Slab {
                n_cells,
                length,
                ranks,
            } => SlabMeshBuilder::new(n_cells, length)
                .with_ranks(ranks)
                .build()?,
            MeshSpec::Ortho { nx, ny, lx, ly, ranks } => {
                OrthoMeshBuilder::new(nx, ny, lx, ly).with_ranks(ranks).build()?
            }
        };
        Ok(Arc::new(mesh))
    }

    /// 构建求积组
    pub fn build_quadrature(&self) -> Result<Arc<AngularQuadrature>> {
        let quad = match self.quadrature {
            QuadratureSpec::GaussLegendre { n } => AngularQuadrature::gauss_legendre(n)?,
            QuadratureSpec::Product {
                n_polar,
                n_azimuthal,
            } => AngularQuadrature::product_quadrature(n_polar, n_azimuthal)?,
        };
        Ok(Arc::new(quad))
    }

    /// 构建扫描核
    pub fn build_kernel(&self) -> Result<Arc<AttenuationKernel>> {
        Ok(Arc::new(AttenuationKernel::new(
            self.kernel.sigma_t,
            self.kernel.source,
        )?))
    }
}
