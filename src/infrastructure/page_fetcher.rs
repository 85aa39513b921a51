//! 页面抓取器 - 基础设施层
//!
//! 持有唯一的 HTTP 客户端，只暴露"按 URL 取回 HTML"的能力

use std::future::Future;
use std::time::Duration;

use tracing::{debug, error};

use crate::error::{AppError, AppResult, ConfigError};

const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36";
const ACCEPT: &str = "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8";
const ACCEPT_LANGUAGE: &str = "vi-VN,vi;q=0.9,en;q=0.8";

/// 原始响应
#[derive(Debug, Clone)]
pub struct RawResponse {
    pub status: u16,
    pub body: String,
}

/// 传输层能力：发一个 GET 请求
///
/// 生产环境用 [`HttpTransport`]，测试里换成固定页面
pub trait Transport {
    fn get(
        &self,
        url: &str,
        headers: &[(&'static str, String)],
    ) -> impl Future<Output = AppResult<RawResponse>>;
}

/// 基于 reqwest 的传输实现
pub struct HttpTransport {
    client: reqwest::Client,
}

impl HttpTransport {
    /// 创建带超时的 HTTP 传输
    pub fn new(timeout: Duration) -> AppResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ConfigError::HttpClient(e.to_string()))?;
        Ok(Self { client })
    }
}

impl Transport for HttpTransport {
    async fn get(&self, url: &str, headers: &[(&'static str, String)]) -> AppResult<RawResponse> {
        let mut request = self.client.get(url);
        for (name, value) in headers {
            request = request.header(*name, value.as_str());
        }

        let response = request
            .send()
            .await
            .map_err(|e| AppError::request_failed(url, e))?;
        let status = response.status().as_u16();
        let body = response.text().await.map_err(|e| {
            AppError::Transport(crate::error::TransportError::BodyFailed {
                url: url.to_string(),
                message: e.to_string(),
            })
        })?;

        Ok(RawResponse { status, body })
    }
}

/// 页面抓取器
///
/// 职责：
/// - 注入浏览器风格的请求头和可选 Cookie
/// - 非 2xx 响应视为失败
/// - 不重试（重试策略属于编排层）
/// - 不认识 Course / Exam
pub struct PageFetcher<T> {
    transport: T,
}

impl<T: Transport> PageFetcher<T> {
    pub fn new(transport: T) -> Self {
        Self { transport }
    }

    /// 获取 transport 的引用
    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// 抓取页面，返回原始 HTML
    pub async fn fetch(&self, url: &str, cookie: Option<&str>) -> AppResult<String> {
        debug!("抓取页面: {}", url);

        let headers = build_headers(cookie);
        let response = self.transport.get(url, &headers).await.map_err(|e| {
            error!("抓取 {} 失败: {}", url, e);
            e
        })?;

        if !(200..300).contains(&response.status) {
            error!("抓取 {} 返回状态码 {}", url, response.status);
            return Err(AppError::bad_status(url, response.status));
        }

        debug!("抓取完成: {} ({} 字节)", url, response.body.len());
        Ok(response.body)
    }
}

fn build_headers(cookie: Option<&str>) -> Vec<(&'static str, String)> {
    let mut headers = vec![
        ("User-Agent", USER_AGENT.to_string()),
        ("Accept", ACCEPT.to_string()),
        ("Accept-Language", ACCEPT_LANGUAGE.to_string()),
    ];
    if let Some(cookie) = cookie.filter(|c| !c.trim().is_empty()) {
        headers.push(("Cookie", cookie.to_string()));
    }
    headers
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;

    struct Recorder {
        status: u16,
        seen: RefCell<Vec<(&'static str, String)>>,
    }

    impl Transport for Recorder {
        async fn get(&self, _url: &str, headers: &[(&'static str, String)]) -> AppResult<RawResponse> {
            *self.seen.borrow_mut() = headers.to_vec();
            Ok(RawResponse {
                status: self.status,
                body: "<html></html>".to_string(),
            })
        }
    }

    fn recorder(status: u16) -> PageFetcher<Recorder> {
        PageFetcher::new(Recorder {
            status,
            seen: RefCell::new(Vec::new()),
        })
    }

    #[tokio::test]
    async fn sends_browser_headers_and_cookie() {
        let fetcher = recorder(200);
        let body = fetcher.fetch("https://example.test", Some("sid=1")).await.unwrap();
        assert_eq!(body, "<html></html>");

        let seen = fetcher.transport().seen.borrow();
        let names: Vec<_> = seen.iter().map(|(n, _)| *n).collect();
        assert_eq!(names, ["User-Agent", "Accept", "Accept-Language", "Cookie"]);
        assert_eq!(seen[3].1, "sid=1");
    }

    #[tokio::test]
    async fn blank_cookie_is_not_sent() {
        let fetcher = recorder(200);
        fetcher.fetch("https://example.test", Some("  ")).await.unwrap();
        assert!(fetcher.transport().seen.borrow().iter().all(|(n, _)| *n != "Cookie"));
    }

    #[tokio::test]
    async fn non_2xx_is_a_transport_error() {
        let fetcher = recorder(503);
        let err = fetcher.fetch("https://example.test", None).await.unwrap_err();
        assert!(err.is_transport());
        assert!(err.to_string().contains("503"));
    }
}
