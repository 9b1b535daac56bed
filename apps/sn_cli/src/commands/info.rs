// apps/sn_cli/src/commands/info.rs

//! 信息显示命令

use anyhow::Result;
use clap::Args;

use crate::config::CaseFile;

/// 信息显示参数
#[derive(Args)]
pub struct InfoArgs {
    /// 显示系统信息
    #[arg(long)]
    pub system: bool,

    /// 显示演示算例的完整 JSON（可作为算例文件模板）
    #[arg(long)]
    pub template: bool,
}

/// 执行信息命令
pub fn execute(args: InfoArgs) -> Result<()> {
    let show_all = !args.system && !args.template;

    if args.system || show_all {
        print_system_info();
    }
    if args.template || show_all {
        if show_all {
            println!();
        }
        print_template()?;
    }
    Ok(())
}

fn print_system_info() {
    println!("=== 系统信息 ===");
    println!("SnSweep CLI 版本: {}", env!("CARGO_PKG_VERSION"));
    println!("目标平台: {}", std::env::consts::ARCH);
    println!("操作系统: {}", std::env::consts::OS);
    println!("可用核心: {}", std::thread::available_parallelism().map_or(1, |n| n.get()));
}

fn print_template() -> Result<()> {
    println!("=== 算例文件模板 ===");
    let demo = CaseFile::demo(16, 2, 1.0, 0.5);
    println!("{}", serde_json::to_string_pretty(&demo)?);
    Ok(())
}
