//! # 远程内容抓取
//!
//! 传输层协作者：给定地址返回文本内容。
//! 单次尝试、固定超时、不重试；HTTP 状态失败与连接失败分开报告
//! （日志用途），但编排器对两者的处理一致。

use std::time::Duration;

use anyhow::{Context, Result};
use thiserror::Error;

/// 默认抓取超时（秒）
pub const DEFAULT_TIMEOUT_SECS: u64 = 20;

// ========================================
// 抓取错误
// ========================================

/// 单次抓取的失败原因
#[derive(Debug, Error)]
pub enum FetchError {
    /// 服务端返回非 2xx 状态
    #[error("HTTP status {status} from {url}")]
    Status { url: String, status: u16 },
    /// 连接/传输层失败（DNS、超时、TLS 等）
    #[error("request to {url} failed: {source}")]
    Connect {
        url: String,
        #[source]
        source: reqwest::Error,
    },
}

// ========================================
// 抓取接口
// ========================================

/// 抓取接口
///
/// 以 trait 作为接缝，测试时用内存桩替换真实 HTTP 客户端。
/// `Send + Sync` 约束保证可以被 rayon 并行的多条转换链共享。
pub trait Fetcher: Send + Sync {
    /// 抓取一个地址的文本内容
    fn fetch(&self, url: &str) -> Result<String, FetchError>;
}

/// 基于 reqwest 阻塞客户端的真实实现
pub struct HttpFetcher {
    client: reqwest::blocking::Client,
}

impl HttpFetcher {
    /// 创建客户端，超时必须设置（无超时的抓取是缺陷）
    pub fn new(timeout_secs: u64) -> Result<Self> {
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .context("Failed to build HTTP client")?;
        Ok(Self { client })
    }
}

impl Fetcher for HttpFetcher {
    fn fetch(&self, url: &str) -> Result<String, FetchError> {
        let response = self.client.get(url).send().map_err(|e| FetchError::Connect {
            url: url.to_string(),
            source: e,
        })?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        response.text().map_err(|e| FetchError::Connect {
            url: url.to_string(),
            source: e,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_error_display() {
        let err = FetchError::Status {
            url: "https://x/y.yaml".to_string(),
            status: 404,
        };
        assert_eq!(err.to_string(), "HTTP status 404 from https://x/y.yaml");
    }

    #[test]
    fn test_client_builds_with_timeout() {
        assert!(HttpFetcher::new(DEFAULT_TIMEOUT_SECS).is_ok());
    }
}
