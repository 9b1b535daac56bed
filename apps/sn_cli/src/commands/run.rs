// apps/sn_cli/src/commands/run.rs

//! 执行扫描求解命令

use anyhow::{Context, Result};
use clap::Args;
use std::path::PathBuf;
use std::time::Instant;
use tracing::info;

use crate::config::CaseFile;
use sn_sweep::run_sweep;

/// 扫描求解参数
#[derive(Args)]
pub struct RunArgs {
    /// 算例文件路径（省略时使用内置板几何演示）
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// 结果输出文件（JSON）
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// 演示模式：单元数
    #[arg(long, default_value = "16")]
    pub cells: usize,

    /// 演示模式：分区数
    #[arg(long, default_value = "2")]
    pub ranks: usize,

    /// 演示模式：总截面
    #[arg(long, default_value = "1.0")]
    pub sigma_t: f64,

    /// 演示模式：均匀源强度
    #[arg(long, default_value = "0.5")]
    pub source: f64,
}

/// 执行求解命令
pub fn execute(args: RunArgs) -> Result<()> {
    info!("=== SnSweep 扫描求解 ===");

    let case = match &args.config {
        Some(path) => CaseFile::load(path)?,
        None => {
            info!(
                "未指定算例文件，使用演示算例: {} 单元 / {} 分区",
                args.cells, args.ranks
            );
            CaseFile::demo(args.cells, args.ranks, args.sigma_t, args.source)
        }
    };

    let mesh = case.build_mesh()?;
    let quadrature = case.build_quadrature()?;
    let kernel = case.build_kernel()?;
    info!(
        "问题规模: {} 单元, {} 分区, {} 方向, {} 遍",
        mesh.n_cells(),
        mesh.num_ranks(),
        quadrature.n_directions(),
        case.run.n_passes
    );

    let started = Instant::now();
    let solution = run_sweep(mesh, quadrature, kernel, &case.run).context("扫描求解失败")?;
    let elapsed = started.elapsed();

    // 角矩统计
    let n = solution.moments.len().max(1);
    let sum: f64 = solution.moments.iter().sum();
    let max = solution.moments.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
    let min = solution.moments.iter().cloned().fold(f64::INFINITY, f64::min);
    info!("角矩: min={:.6e} max={:.6e} mean={:.6e}", min, max, sum / n as f64);
    for (pass, delta) in solution.reflecting_deltas.iter().enumerate() {
        info!("第 {} 遍反射偏差: {:.3e}", pass, delta);
    }
    info!("总耗时: {:?}", elapsed);

    if let Some(path) = &args.output {
        let report = serde_json::json!({
            "moments": solution.moments,
            "width": solution.width,
            "reflecting_deltas": solution.reflecting_deltas,
        });
        std::fs::write(path, serde_json::to_string_pretty(&report)?)
            .with_context(|| format!("写出结果文件 {} 失败", path.display()))?;
        info!("结果已写入 {}", path.display());
    }

    Ok(())
}
