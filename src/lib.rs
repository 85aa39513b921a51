//! # Exam Crawler
//!
//! 抓取分层组织的教育网站（科目 → 课程 → 课时 → 试卷 → 段落 → 题目 → 答案），
//! 把站点专有的 HTML 标记转换成规范化的关系数据。
//!
//! ## 架构设计
//!
//! 本系统采用严格的四层架构：
//!
//! ### ① 基础设施层（Infrastructure）
//! - `infrastructure/` - 持有稀缺资源（HTTP 客户端），只暴露能力
//! - `PageFetcher` - 唯一的 HTTP 出口，注入请求头和 Cookie
//! - `Document` - 只读的 HTML 查询
//!
//! ### ② 业务能力层（Services）
//! - `services/` - 描述"我能做什么"，都是同步纯函数
//! - `normalizer` / `classifier` / `extractor` / `reconciler`
//!
//! ### ③ 流程层（Workflow）
//! - `workflow/` - 定义"一个页面"的完整处理流程
//! - `HierarchyWalker` - 层级遍历（抓取 → 抽取 → 对账）
//! - `QuestionFlow` - 题目状态机（成组判断题 / 阅读段落）
//!
//! ### ④ 编排层（Orchestration）
//! - `orchestrator/crawl_orchestrator` - 命名操作 + 结果信封
//! - `orchestrator/exam_batch` - 逐张抓题、限速、失败隔离
//!
//! 持久化只通过 `store/` 里的 trait 访问，自带一个内存 + JSON 快照的实现。
//!
//! ## 模块结构

pub mod config;
pub mod error;
pub mod infrastructure;

pub mod models;
pub mod orchestrator;
pub mod services;
pub mod store;
pub mod utils;
pub mod workflow;

// 重新导出常用类型
pub use config::{Config, QuestionPolicy};
pub use error::{AppError, AppResult};
pub use infrastructure::{Document, HttpTransport, PageFetcher, Transport};
pub use models::{CrawlResult, QuestionKind, QuestionType};
pub use orchestrator::CrawlOrchestrator;
pub use services::ChapterMode;
pub use store::{MemoryStore, Store};
pub use workflow::{ExamCtx, ExamLayout, HierarchyWalker, QuestionFlow};
