//! # 规则载荷提取
//!
//! 从解码后的文档中收集候选规则条目（未分类的原始字符串）。
//!
//! ## 结构化文档
//! provider 文档不保证扁平：真正的规则数组可能被一层或多层映射包裹。
//! 因此在任意深度查找 `payload` / `rules` 字段，合并所有命中的数组。
//! 遍历用显式工作队列而非原生递归，并设节点数上限，深层或恶意构造的
//! 输入不会撑爆调用栈。
//!
//! ## 行式文本
//! 每个非空、非 `#` 注释行都是候选条目，去掉可选的 `- ` 列表前缀。
//!
//! 输出顺序不保证；去重与排序由上游编排器完成。

use serde_yaml::Value;

use crate::document::Document;

/// 结构化遍历的节点数上限，防止构造出的超大文档拖垮遍历
const MAX_VISITED_NODES: usize = 100_000;

/// 收集候选规则条目的字段名
const RULE_LIST_KEYS: [&str; 2] = ["payload", "rules"];

/// 从文档中提取候选规则条目
///
/// 指针文档不含规则，返回空集（调用方应在提取前处理掉指针）。
pub fn extract(doc: &Document) -> Vec<String> {
    match doc {
        Document::Structured(value) => extract_structured(value),
        Document::Text(lines) => extract_lines(lines),
        Document::Indirection(_) => Vec::new(),
    }
}

/// 工作队列遍历结构化节点，在任意深度收集 payload/rules 数组
fn extract_structured(root: &Value) -> Vec<String> {
    let mut entries = Vec::new();
    // 顶层裸列表：文档本身就是规则数组（无 payload 键的变体）
    if let Value::Sequence(items) = root {
        entries.extend(items.iter().filter_map(|v| v.as_str()).map(str::to_string));
    }
    let mut worklist: Vec<&Value> = vec![root];
    let mut visited = 0usize;

    while let Some(node) = worklist.pop() {
        visited += 1;
        if visited > MAX_VISITED_NODES {
            break;
        }

        match node {
            Value::Mapping(mapping) => {
                for (key, child) in mapping {
                    let is_rule_list = key
                        .as_str()
                        .map(|k| RULE_LIST_KEYS.contains(&k))
                        .unwrap_or(false);

                    if is_rule_list {
                        if let Value::Sequence(items) = child {
                            // 非字符串元素静默跳过
                            entries.extend(
                                items.iter().filter_map(|v| v.as_str()).map(str::to_string),
                            );
                            continue;
                        }
                    }
                    // 只下探嵌套映射与映射列表，不进入标量列表
                    match child {
                        Value::Mapping(_) => worklist.push(child),
                        Value::Sequence(items) => {
                            worklist.extend(items.iter().filter(|v| v.is_mapping()));
                        }
                        _ => {}
                    }
                }
            }
            Value::Sequence(items) => {
                worklist.extend(items.iter().filter(|v| v.is_mapping()));
            }
            _ => {}
        }
    }

    entries
}

/// 行式文本提取：跳过空行与注释，去掉 YAML 风格的 `- ` 前缀
fn extract_lines(lines: &[String]) -> Vec<String> {
    lines
        .iter()
        .filter_map(|line| {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                return None;
            }
            let line = line.strip_prefix("- ").unwrap_or(line).trim();
            if line.is_empty() {
                None
            } else {
                Some(line.to_string())
            }
        })
        .collect()
}
