//! # 文档解码模块
//!
//! 把一次抓取得到的原始文本一次性归类为三种封闭形态之一：
//! - `Indirection`：rule-provider 指针文档，指向另一个远程源
//! - `Structured`：解析成功的 YAML 映射/序列，内部可能嵌套规则数组
//! - `Text`：非 YAML 的行式规则文本
//!
//! 归类只发生一次（解码时），后续提取逻辑不再做形态判断。
//! 指针检测优先于规则提取：wrapper 文档里即使带有 payload 字段，
//! 也必须当作指针处理。
//!
//! YAML 解析失败不是错误，降级为行式文本处理；失败原因随结果带回，
//! 由编排器记录日志。合法但非结构化的内容（纯标量）不算解析异常。

use serde_yaml::Value;

// ========================================
// 文档形态
// ========================================

/// 一次抓取的解码结果形态
#[derive(Debug, Clone)]
pub enum Document {
    /// rule-provider 指针，值为目标地址
    Indirection(String),
    /// 结构化 YAML 节点
    Structured(Value),
    /// 行式文本（YAML 解析失败或内容本就是纯文本）
    Text(Vec<String>),
}

/// 解码结果：文档形态 + 可观测的解析异常
#[derive(Debug, Clone)]
pub struct Decoded {
    /// 归类后的文档
    pub doc: Document,
    /// YAML 解析失败的原因；内容合法但非结构化时为 `None`
    pub anomaly: Option<String>,
}

/// 判断一个值是否像网络地址
fn looks_like_url(s: &str) -> bool {
    s.starts_with("http://") || s.starts_with("https://")
}

/// 解码抓取到的文本
pub fn decode(content: &str) -> Decoded {
    match serde_yaml::from_str::<Value>(content) {
        Ok(value @ Value::Mapping(_)) => {
            // 结构化指针形状：{type: http, url: "..."}
            let doc = if let Some(url) = structured_indirection(&value) {
                Document::Indirection(url)
            } else {
                Document::Structured(value)
            };
            Decoded { doc, anomaly: None }
        }
        Ok(value @ Value::Sequence(_)) => Decoded {
            doc: Document::Structured(value),
            anomaly: None,
        },
        // 纯标量：解析成功但没有结构，按行处理，不算异常
        Ok(_) => Decoded {
            doc: decode_text(content),
            anomaly: None,
        },
        // 解析失败：降级为行式文本，原因带回供日志记录
        Err(e) => Decoded {
            doc: decode_text(content),
            anomaly: Some(e.to_string()),
        },
    }
}

/// 行式内容解码，优先识别文本形状的指针
fn decode_text(content: &str) -> Document {
    let lines: Vec<String> = content.lines().map(|l| l.to_string()).collect();
    if let Some(url) = textual_indirection(&lines) {
        return Document::Indirection(url);
    }
    Document::Text(lines)
}

/// 结构化指针检测：顶层映射带 `type: http` 且 `url` 字段像地址
fn structured_indirection(value: &Value) -> Option<String> {
    let provider_type = value.get("type")?.as_str()?;
    if provider_type != "http" {
        return None;
    }
    let url = value.get("url")?.as_str()?;
    if looks_like_url(url) {
        Some(url.to_string())
    } else {
        None
    }
}

/// 文本指针检测：扫描含 `url:` 标记的行，取其后的值
fn textual_indirection(lines: &[String]) -> Option<String> {
    for line in lines {
        if let Some(pos) = line.find("url:") {
            let candidate = line[pos + 4..].trim();
            if looks_like_url(candidate) {
                return Some(candidate.to_string());
            }
        }
    }
    None
}

/// 读取文档携带的显示名（用于输出文件命名）
///
/// 结构化文档取顶层 `name` 字段；行式文本取 `name:` 开头的行。
pub fn display_name(doc: &Document) -> Option<String> {
    match doc {
        Document::Structured(value) => value
            .get("name")?
            .as_str()
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty()),
        Document::Text(lines) => lines.iter().find_map(|line| {
            let rest = line.trim().strip_prefix("name:")?;
            let rest = rest.trim();
            if rest.is_empty() {
                None
            } else {
                Some(rest.to_string())
            }
        }),
        Document::Indirection(_) => None,
    }
}
