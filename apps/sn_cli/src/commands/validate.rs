// apps/sn_cli/src/commands/validate.rs

//! 算例验证命令
//!
//! 不执行求解，只做静态检查：网格邻接互认、边界配置齐全、
//! 每个 (分区, 角度集) 的依赖图可排序（无真环）。

use anyhow::{bail, Context, Result};
use clap::Args;
use std::path::PathBuf;
use tracing::{info, warn};

use crate::config::CaseFile;
use sn_foundation::indices::rank;
use sn_sweep::{build_angle_sets, build_sweep_ordering};

/// 算例验证参数
#[derive(Args)]
pub struct ValidateArgs {
    /// 算例文件路径
    #[arg(short, long)]
    pub config: PathBuf,
}

/// 执行验证命令
pub fn execute(args: ValidateArgs) -> Result<()> {
    info!("=== 验证算例 {} ===", args.config.display());

    let case = CaseFile::load(&args.config)?;
    let mesh = case.build_mesh()?;
    let quadrature = case.build_quadrature()?;
    case.build_kernel().context("扫描核参数无效")?;

    mesh.validate_adjacency().context("网格邻接检查失败")?;
    info!(
        "网格: {} 单元, {} 分区, {} 全局面",
        mesh.n_cells(),
        mesh.num_ranks(),
        mesh.n_global_faces()
    );

    // 边界配置必须覆盖全部网格边界
    for b in 0..mesh.n_boundaries() {
        let name = mesh.boundary_name(b).unwrap_or("?");
        if !case.run.boundaries.iter().any(|c| c.name == name) {
            bail!("网格边界 '{}' 缺少边界条件配置", name);
        }
    }

    let sets = build_angle_sets(&quadrature, case.run.aggregation);
    info!("{} 方向聚合为 {} 个角度集", quadrature.n_directions(), sets.len());

    let mut failures = 0usize;
    for r in 0..mesh.num_ranks() {
        for set in &sets {
            match build_sweep_ordering(&mesh, rank(r), set) {
                Ok(ordering) => info!(
                    "分区 {} 角度集 {}: {} 单元, 收 {} 发 {}",
                    r,
                    set.id,
                    ordering.n_local_cells(),
                    ordering.n_receive_deps(),
                    ordering.n_send_duties()
                ),
                Err(e) => {
                    warn!("分区 {} 角度集 {}: {}", r, set.id, e);
                    failures += 1;
                }
            }
        }
    }
    if failures > 0 {
        bail!("{} 个 (分区, 角度集) 无法排序", failures);
    }

    info!("算例验证通过");
    Ok(())
}
