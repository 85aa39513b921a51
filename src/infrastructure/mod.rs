//! 基础设施层（Infrastructure）
//!
//! 持有稀缺资源（HTTP 客户端），只暴露能力：
//! - `PageFetcher` - 按 URL 取回 HTML
//! - `Document` - 解析 HTML 并提供只读查询

pub mod document;
pub mod page_fetcher;

pub use document::{ChildNode, Document, Element};
pub use page_fetcher::{HttpTransport, PageFetcher, RawResponse, Transport};
