//! 编排层（Orchestration Layer）
//!
//! ## 职责
//!
//! 本层负责把流程层串成对外的抓取操作，是整个系统的"指挥中心"。
//!
//! ## 模块划分
//!
//! ### `crawl_orchestrator` - 抓取编排器
//! - 持有抓取器、存储和配置
//! - 提供全部命名操作，统一包装成结果信封
//!
//! ### `exam_batch` - 试卷批量抓取
//! - 逐张抓取试卷题目，两张之间限速
//! - 单张失败只记录，不中断
//!
//! ## 层次关系
//!
//! ```text
//! crawl_orchestrator (命名操作 → CrawlResult)
//!     ↓
//! exam_batch (处理 Vec<Exam>)
//!     ↓
//! workflow::HierarchyWalker / QuestionFlow
//!     ↓
//! services (能力层：抽取 / 判定 / 规范化 / 对账)
//!     ↓
//! infrastructure (基础设施：PageFetcher / Document)
//! ```

pub mod crawl_orchestrator;
pub mod exam_batch;

pub use crawl_orchestrator::CrawlOrchestrator;
pub use exam_batch::{crawl_exams, ExamBatchStats};
