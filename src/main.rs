//! # qx-ruleset
//!
//! CLI 工具，把远程 Clash 风格的 rule-provider 源转换为
//! QuantumultX 可用的 `.list` 规则文件，每个源一个文件。
//!
//! ## 功能
//! - 读取地址列表（每行一个 URL）
//! - 抓取每个源，限深跟进嵌套 rule-provider 指针
//! - 提取、规范化、去重并排序规则
//! - 写出 `<name>.list` 文件与汇总 README
//!
//! ## 使用
//! ```bash
//! # 默认读取 ./rules.txt，输出到当前目录
//! qx-ruleset
//!
//! # 指定输入列表与输出目录
//! qx-ruleset --rules-file sources.txt --output-dir dist
//!
//! # 限制并行抓取数
//! qx-ruleset --jobs 4
//! ```

use std::fs;
use std::path::{Path, PathBuf};
use std::process;

use anyhow::{Context, Result};
use clap::Parser;

mod document;
mod extract;
mod fetch;
mod output;
mod pipeline;
mod rule;

use fetch::{HttpFetcher, DEFAULT_TIMEOUT_SECS};
use pipeline::IngestError;

// ========================================
// CLI 参数定义
// ========================================

/// Clash rule-provider 转 QuantumultX 规则列表
#[derive(Parser)]
#[command(name = "qx-ruleset")]
#[command(version = "0.1.0")]
#[command(about = "Convert remote Clash rule providers into QuantumultX .list files")]
struct Cli {
    /// 源地址列表文件（每行一个 URL，空行忽略）
    #[arg(long, default_value = "rules.txt", value_name = "PATH")]
    rules_file: PathBuf,

    /// 输出目录（不存在时自动创建）
    #[arg(long, default_value = ".", value_name = "DIR")]
    output_dir: PathBuf,

    /// 抓取超时（秒）
    #[arg(long, default_value_t = DEFAULT_TIMEOUT_SECS)]
    timeout: u64,

    /// 并行抓取的线程数（默认由 rayon 决定）
    #[arg(long, short = 'j')]
    jobs: Option<usize>,

    /// 跳过旧 .list 文件的清理
    #[arg(long)]
    keep_stale: bool,
}

// ========================================
// 主函数
// ========================================

fn main() {
    let cli = Cli::parse();

    if let Err(e) = run(cli) {
        eprintln!("Error: {:#}", e);
        process::exit(1);
    }
}

/// 运行驱动：读列表 → 清旧产物 → 并行转换 → 落盘 → 汇总
fn run(cli: Cli) -> Result<()> {
    // 输入列表缺失是唯一的运行级致命错误，在任何处理开始前中止
    let addresses = read_address_list(&cli.rules_file)?;
    if addresses.is_empty() {
        anyhow::bail!("No addresses found in {}", cli.rules_file.display());
    }

    if let Some(jobs) = cli.jobs {
        rayon::ThreadPoolBuilder::new()
            .num_threads(jobs)
            .build_global()
            .context("Failed to configure thread pool")?;
    }

    fs::create_dir_all(&cli.output_dir)
        .with_context(|| format!("Failed to create {}", cli.output_dir.display()))?;

    // 旧产物清理是驱动层的显式前置步骤，不属于转换管道
    if !cli.keep_stale {
        for path in output::clear_stale_lists(&cli.output_dir)? {
            println!("[Clean] Removed old list: {}", path.display());
        }
    }

    let fetcher = HttpFetcher::new(cli.timeout)?;
    let results = pipeline::process_sources(&fetcher, &addresses);

    // 单源失败只记录，继续写出其余成功项
    let mut generated = Vec::new();
    for (address, result) in results {
        match result {
            Ok(output) => {
                let filename = output::write_list(&cli.output_dir, &output)?;
                println!(
                    "[Success] Generated: {} ({} rules)",
                    filename,
                    output.rules.len()
                );
                generated.push(filename);
            }
            Err(IngestError::NoRulesExtracted { url }) => {
                println!("[Warning] No rules extracted for {}", url);
            }
            Err(e) => {
                eprintln!("[Error] {}", e);
                eprintln!("[Skip] {}", address);
            }
        }
    }

    if generated.is_empty() {
        println!("[Warning] No list files generated");
    } else {
        output::write_summary(&cli.output_dir, &generated)?;
        println!("[Info] README.md updated ({} lists)", generated.len());
    }

    Ok(())
}

/// 读取地址列表：每个非空的修剪行都是一个地址
fn read_address_list(path: &Path) -> Result<Vec<String>> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read address list {}", path.display()))?;
    Ok(content
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .map(str::to_string)
        .collect())
}
