//! 业务能力层（Services）
//!
//! 描述"我能做什么"，都是同步的纯能力，不访问网络：
//! - `selectors` - 目标站点的标记约定
//! - `normalizer` - HTML 片段规范化
//! - `classifier` - 题型判定
//! - `extractor` - 页面 → 草稿
//! - `reconciler` - 按自然键新建或更新

pub mod classifier;
pub mod extractor;
pub mod normalizer;
pub mod reconciler;
pub mod selectors;

pub use classifier::classify;
pub use extractor::{
    ChapterMode, ExamBlock, ScrapedAnswer, ScrapedChapter, ScrapedExam, ScrapedLesson,
    ScrapedQuestion,
};
pub use normalizer::normalize;
pub use reconciler::{upsert, Upserted};
