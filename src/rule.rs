//! # 规则分类器
//!
//! 此模块负责判断一条原始规则字符串是否是 QuantumultX 支持的规则，
//! 并将其改写为统一的 `TYPE,TARGET` 形式。
//!
//! ## 接受的输入形状
//! - `TYPE,TARGET[,...]`：逗号分隔（Clash/Surge 常见形状），多余字段（如策略组）丢弃
//! - `TYPE: TARGET`：冒号分隔（旧式 YAML 行内形状）
//! - 裸 IP/网段字面量：`8.8.8.8`、`10.0.0.0/8`、`2001:db8::/32`

use std::fmt;
use std::net::IpAddr;
use std::str::FromStr;

use ipnet::IpNet;

// ========================================
// 规则类型（封闭集合）
// ========================================

/// QuantumultX 目标格式支持的规则类型
///
/// 任何不在此集合中的类型（如 MATCH、PROCESS-NAME、GEOIP）都会被丢弃。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RuleType {
    /// 精确域名
    Domain,
    /// 域名后缀
    DomainSuffix,
    /// 域名关键字
    DomainKeyword,
    /// IPv4 网段
    IpCidr,
    /// IPv6 网段
    IpCidr6,
    /// URL 正则
    UrlRegex,
}

impl RuleType {
    /// 规则类型在输出格式中的文本形式
    pub fn as_str(&self) -> &'static str {
        match self {
            RuleType::Domain => "DOMAIN",
            RuleType::DomainSuffix => "DOMAIN-SUFFIX",
            RuleType::DomainKeyword => "DOMAIN-KEYWORD",
            RuleType::IpCidr => "IP-CIDR",
            RuleType::IpCidr6 => "IP-CIDR6",
            RuleType::UrlRegex => "URL-REGEX",
        }
    }

    /// 从输入文本匹配类型（大小写敏感，与上游格式一致）
    fn parse(s: &str) -> Option<Self> {
        match s {
            "DOMAIN" => Some(RuleType::Domain),
            "DOMAIN-SUFFIX" => Some(RuleType::DomainSuffix),
            "DOMAIN-KEYWORD" => Some(RuleType::DomainKeyword),
            "IP-CIDR" => Some(RuleType::IpCidr),
            "IP-CIDR6" => Some(RuleType::IpCidr6),
            "URL-REGEX" => Some(RuleType::UrlRegex),
            _ => None,
        }
    }
}

impl fmt::Display for RuleType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// ========================================
// 规范化规则
// ========================================

/// 一条规范化后的规则，渲染为 `TYPE,TARGET`
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CanonicalRule {
    /// 规则类型
    pub rule_type: RuleType,
    /// 规则目标（域名、网段或正则，已去除首尾空白）
    pub target: String,
}

impl fmt::Display for CanonicalRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{}", self.rule_type, self.target)
    }
}

// ========================================
// 分类入口
// ========================================

/// 对单条原始规则字符串分类
///
/// 返回 `None` 表示该条目不是支持的规则，直接丢弃，不报错。
/// 纯函数，无副作用，对任意输入都不会 panic。
pub fn classify(entry: &str) -> Option<CanonicalRule> {
    let entry = entry.trim();
    if entry.is_empty() {
        return None;
    }

    // 1. 逗号形状：TYPE,TARGET[,POLICY,...]
    if entry.contains(',') {
        let parts: Vec<&str> = entry.split(',').map(|p| p.trim()).collect();
        if parts.len() >= 2 {
            if let Some(rule_type) = RuleType::parse(parts[0]) {
                // 第三个及以后的字段（策略组标注等）丢弃
                return Some(CanonicalRule {
                    rule_type,
                    target: parts[1].to_string(),
                });
            }
        }
        // 类型未识别时继续尝试裸字面量（含逗号的条目必然解析失败，最终丢弃）
    } else if let Some((type_str, target)) = entry.split_once(':') {
        // 2. 冒号形状（旧式）：TYPE: TARGET
        // 注意 IPv6 字面量也含冒号，类型匹配失败时落到裸字面量解析
        if let Some(rule_type) = RuleType::parse(type_str.trim()) {
            return Some(CanonicalRule {
                rule_type,
                target: target.trim().to_string(),
            });
        }
    }

    // 3. 裸 IP/网段字面量：按地址族区分 IP-CIDR / IP-CIDR6
    classify_bare_network(entry)
}

/// 尝试把裸 token 解析为 IP 网段或单个 IP 地址
fn classify_bare_network(entry: &str) -> Option<CanonicalRule> {
    let is_v6 = if let Ok(net) = IpNet::from_str(entry) {
        matches!(net, IpNet::V6(_))
    } else if let Ok(addr) = IpAddr::from_str(entry) {
        addr.is_ipv6()
    } else {
        return None;
    };

    let rule_type = if is_v6 {
        RuleType::IpCidr6
    } else {
        RuleType::IpCidr
    };
    Some(CanonicalRule {
        rule_type,
        target: entry.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_comma_shape_basic() {
        let rule = classify("DOMAIN-SUFFIX,example.com").unwrap();
        assert_eq!(rule.to_string(), "DOMAIN-SUFFIX,example.com");
    }

    #[test]
    fn test_comma_shape_drops_policy_annotation() {
        let rule = classify("DOMAIN,example.com,Proxy").unwrap();
        assert_eq!(rule.to_string(), "DOMAIN,example.com");
    }

    #[test]
    fn test_unsupported_type_rejected() {
        assert!(classify("MATCH,,Proxy").is_none());
        assert!(classify("PROCESS-NAME,Telegram").is_none());
        assert!(classify("GEOIP,CN,DIRECT").is_none());
    }

    #[test]
    fn test_legacy_colon_shape() {
        let rule = classify("DOMAIN-SUFFIX: example.com").unwrap();
        assert_eq!(rule.to_string(), "DOMAIN-SUFFIX,example.com");
    }

    #[test]
    fn test_case_sensitive_type_match() {
        // 小写类型不属于支持集合
        assert!(classify("domain-suffix,example.com").is_none());
    }

    #[test]
    fn test_bare_ipv4_cidr() {
        let rule = classify("10.0.0.0/8").unwrap();
        assert_eq!(rule.to_string(), "IP-CIDR,10.0.0.0/8");
    }

    #[test]
    fn test_bare_ipv6_cidr_classified_by_family() {
        // IPv6 必须归为 IP-CIDR6，不能与 IPv4 混用同一类型
        let rule = classify("2001:db8::/32").unwrap();
        assert_eq!(rule.rule_type, RuleType::IpCidr6);
        assert_eq!(rule.to_string(), "IP-CIDR6,2001:db8::/32");

        let v4 = classify("10.0.0.0/8").unwrap();
        assert_eq!(v4.rule_type, RuleType::IpCidr);
    }

    #[test]
    fn test_bare_single_address() {
        assert_eq!(classify("8.8.8.8").unwrap().to_string(), "IP-CIDR,8.8.8.8");
        assert_eq!(
            classify("2001:db8::1").unwrap().to_string(),
            "IP-CIDR6,2001:db8::1"
        );
    }

    #[test]
    fn test_garbage_yields_none() {
        assert!(classify("").is_none());
        assert!(classify("   ").is_none());
        assert!(classify("just some words").is_none());
        assert!(classify("example.com").is_none());
        assert!(classify("999.999.999.999/8").is_none());
    }

    #[test]
    fn test_classify_is_deterministic() {
        for entry in ["DOMAIN,a.com", "10.0.0.0/8", "nonsense"] {
            assert_eq!(classify(entry), classify(entry));
        }
    }
}
