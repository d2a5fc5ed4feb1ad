//! # 转换编排模块
//!
//! 这个模块是核心业务逻辑所在，负责单个源地址的完整转换链：
//! 1. 抓取远程内容（传输协作者）
//! 2. 解码并识别 rule-provider 指针，限深递归跟进
//! 3. 提取候选条目并逐条分类
//! 4. 去重、排序，得出规范规则集与输出名
//!
//! 每条转换链独立无共享状态，多个源之间由 rayon 并行处理；
//! 单个源的失败只影响它自己，绝不中断整个运行。

use std::collections::BTreeSet;
use std::sync::OnceLock;

use rayon::prelude::*;
use regex::Regex;
use thiserror::Error;

use crate::document::{self, Document};
use crate::extract;
use crate::fetch::{FetchError, Fetcher};
use crate::rule;

/// 指针递归的最大深度（深度 0 为输入列表里的原始地址）
const MAX_REDIRECT_DEPTH: u32 = 3;

// ========================================
// 单源错误
// ========================================

/// 单个源地址的转换失败原因，运行级别一律非致命
#[derive(Debug, Error)]
pub enum IngestError {
    /// 抓取失败（连接失败与非 2xx 状态统一归入此类）
    #[error("failed to fetch {url}: {source}")]
    FetchFailed {
        url: String,
        #[source]
        source: FetchError,
    },
    /// 指针链超过最大深度
    #[error("too many nested providers at {url}")]
    TooManyRedirects { url: String },
    /// 文档解析成功但没有提取出任何规则
    #[error("no rules extracted from {url}")]
    NoRulesExtracted { url: String },
}

// ========================================
// 转换结果
// ========================================

/// 单个源的转换产物
#[derive(Debug, Clone)]
pub struct SourceOutput {
    /// 清洗后的输出名（不含扩展名）
    pub name: String,
    /// 规范规则行，已去重并按字典序升序排列
    pub rules: Vec<String>,
}

// ========================================
// 单源转换
// ========================================

/// 转换一个源地址，限深跟进 rule-provider 指针
///
/// 顶层调用 `depth` 传 0。指针递归最多 3 层，超出即失败，不再抓取。
pub fn ingest(
    fetcher: &dyn Fetcher,
    address: &str,
    depth: u32,
) -> Result<SourceOutput, IngestError> {
    if depth > MAX_REDIRECT_DEPTH {
        return Err(IngestError::TooManyRedirects {
            url: address.to_string(),
        });
    }

    println!("[Download] {}", address);
    let content = fetcher
        .fetch(address)
        .map_err(|source| IngestError::FetchFailed {
            url: address.to_string(),
            source,
        })?;

    let decoded = document::decode(&content);
    if let Some(reason) = &decoded.anomaly {
        // 解码异常非致命，记录后按行式文本继续
        println!(
            "[Warning] {} is not structured YAML, treating as text: {}",
            address, reason
        );
    }
    let doc = decoded.doc;

    // 指针优先：wrapper 文档里即使有 payload 也不提取
    if let Document::Indirection(target) = &doc {
        println!("[Info] Nested rule-provider found, downloading {}", target);
        return ingest(fetcher, target, depth + 1);
    }

    // 分类 + 去重：BTreeSet 以渲染后的字符串为键，天然有序
    let rules: BTreeSet<String> = extract::extract(&doc)
        .iter()
        .filter_map(|entry| rule::classify(entry))
        .map(|r| r.to_string())
        .collect();

    if rules.is_empty() {
        return Err(IngestError::NoRulesExtracted {
            url: address.to_string(),
        });
    }

    // 命名：终点文档的显示名优先，其次取终点地址的末段
    let name = document::display_name(&doc)
        .map(|n| sanitize_name(&n))
        .unwrap_or_else(|| derive_name(address));

    Ok(SourceOutput {
        name,
        rules: rules.into_iter().collect(),
    })
}

// ========================================
// 多源驱动
// ========================================

/// 并行处理整个地址列表
///
/// 返回值与输入一一对应、保持输入顺序；失败项原样带回，由调用方记录。
pub fn process_sources(
    fetcher: &dyn Fetcher,
    addresses: &[String],
) -> Vec<(String, Result<SourceOutput, IngestError>)> {
    addresses
        .par_iter()
        .map(|address| (address.clone(), ingest(fetcher, address, 0)))
        .collect()
}

// ========================================
// 输出命名
// ========================================

/// 从终点地址推导输出名：取末段路径并去掉已知扩展名
fn derive_name(address: &str) -> String {
    let segment = address
        .trim_end_matches('/')
        .rsplit('/')
        .next()
        .unwrap_or(address);
    // 去掉查询串
    let segment = segment.split('?').next().unwrap_or(segment);

    let stem = [".yaml", ".yml", ".list", ".txt"]
        .iter()
        .find_map(|ext| segment.strip_suffix(ext))
        .unwrap_or(segment);

    sanitize_name(stem)
}

/// 清洗输出名：字母、数字、下划线、连字符之外的字符一律替换为下划线
fn sanitize_name(name: &str) -> String {
    static SANITIZE_RE: OnceLock<Regex> = OnceLock::new();
    let re = SANITIZE_RE.get_or_init(|| Regex::new(r"[^A-Za-z0-9_\-]").expect("hardcoded pattern"));
    let cleaned = re.replace_all(name, "_").to_string();
    if cleaned.is_empty() {
        "unnamed".to_string()
    } else {
        cleaned
    }
}
