//! # 输出文件管理
//!
//! 负责把转换产物落盘：每个源一个 `<name>.list` 文件，
//! 外加一份汇总 README。旧产物的清理是运行驱动层的显式步骤，
//! 转换管道本身绝不碰文件系统。

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::Utc;

use crate::pipeline::SourceOutput;

/// 写出单个 `.list` 文件，返回生成的文件名
///
/// 内容为规则行按行拼接，无末尾分隔符；行序已由管道保证（字典序、无重复）。
pub fn write_list(dir: &Path, output: &SourceOutput) -> Result<String> {
    let filename = format!("{}.list", output.name);
    let path = dir.join(&filename);
    let content = output.rules.join("\n");
    fs::write(&path, content).with_context(|| format!("Failed to write {}", path.display()))?;
    Ok(filename)
}

/// 清理上一次运行留下的 `.list` 文件
///
/// 由运行驱动在处理开始前显式调用一次，返回被删除的文件列表。
pub fn clear_stale_lists(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut removed = Vec::new();
    for entry in fs::read_dir(dir).with_context(|| format!("Failed to read {}", dir.display()))? {
        let path = entry?.path();
        if path.extension().map(|e| e == "list").unwrap_or(false) && path.is_file() {
            fs::remove_file(&path)
                .with_context(|| format!("Failed to remove {}", path.display()))?;
            removed.push(path);
        }
    }
    Ok(removed)
}

/// 生成汇总 README：标题 + 生成文件的列表 + UTC 时间戳
///
/// 只列出实际产出规则的文件；列表按文件名排序。
pub fn write_summary(dir: &Path, filenames: &[String]) -> Result<()> {
    let mut sorted: Vec<&String> = filenames.iter().collect();
    sorted.sort();

    let mut content = String::from("# QuantumultX Rule Lists\n\n");
    content.push_str("自动生成的 QuantumultX 规则列表：\n\n");
    for name in sorted {
        content.push_str(&format!("- `{}`\n", name));
    }
    content.push_str(&format!(
        "\n_Last update: {} UTC_\n",
        Utc::now().format("%Y-%m-%d %H:%M:%S")
    ));

    let path = dir.join("README.md");
    fs::write(&path, content).with_context(|| format!("Failed to write {}", path.display()))
}
