//! 试卷批量抓取 - 编排层
//!
//! ## 职责
//!
//! 层级抓取完成后，逐张抓取试卷题目：
//! 1. **顺序执行**：一张抓完再抓下一张，不并发
//! 2. **限速**：两张试卷之间固定等待
//! 3. **失败隔离**：单张试卷抓取失败只记录，继续下一张
//! 4. **统计输出**：累计段落/题目/答案数量
//!
//! 入库失败不属于单张试卷的问题，直接向上返回。

use std::time::Duration;

use tracing::{error, info};

use crate::error::AppResult;
use crate::infrastructure::{PageFetcher, Transport};
use crate::models::{Exam, ExamFailure};
use crate::store::Store;
use crate::workflow::{ExamCtx, ExamLayout, QuestionFlow};

/// 批量抓取统计
#[derive(Debug, Default)]
pub struct ExamBatchStats {
    pub paragraphs: usize,
    pub questions: usize,
    pub answers: usize,
    pub failures: Vec<ExamFailure>,
}

/// 逐张抓取试卷题目
pub async fn crawl_exams<T: Transport, S: Store>(
    fetcher: &PageFetcher<T>,
    flow: &QuestionFlow<'_, S>,
    exams: &[Exam],
    layout: ExamLayout,
    delay: Duration,
    cookie: Option<&str>,
) -> AppResult<ExamBatchStats> {
    let total = exams.len();
    let mut stats = ExamBatchStats::default();
    info!("📋 开始抓取 {} 张试卷的题目 (间隔 {:?})", total, delay);

    for (index, exam) in exams.iter().enumerate() {
        let ctx = ExamCtx::new(exam.id, index + 1, total);

        match flow.run(fetcher, exam, layout, &ctx, cookie).await {
            Ok(data) => {
                stats.paragraphs += data.paragraphs.len();
                stats.questions += data.questions.len();
                stats.answers += data.answers.len();
            }
            Err(e) if e.is_transport() => {
                error!("{} ❌ 抓取失败，继续下一张: {}", ctx, e);
                stats.failures.push(ExamFailure {
                    exam_id: exam.id,
                    url: exam.url.clone(),
                    error: e.to_string(),
                });
            }
            Err(e) => return Err(e),
        }

        if index + 1 < total && !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
    }

    info!(
        "✓ 试卷题目抓取完成: 成功 {}/{}, {} 道题目, {} 个答案",
        total - stats.failures.len(),
        total,
        stats.questions,
        stats.answers
    );
    Ok(stats)
}
