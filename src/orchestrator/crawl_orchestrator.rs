//! 抓取编排器 - 编排层
//!
//! ## 职责
//!
//! 对外的全部抓取操作都在这里，每个操作都返回结果信封，从不返回 `Err`：
//!
//! | 操作 | 输入 | 遍历 |
//! |---|---|---|
//! | `crawl_subjects` | 列表页 URL | 科目列表 |
//! | `crawl_courses` | 课程页 URL + 模式 | TSA 层级 |
//! | `crawl` | 课程页 URL + 模式 | TSA 层级，再逐张抓阅读题 |
//! | `crawl_subject_exams` | 科目 id | 科目层级，再逐张抓普通题 |
//! | `crawl_questions` | 试卷 id | 普通题 |
//! | `crawl_paragraphs` | 试卷 id | 阅读题 |
//! | `fetch_raw` | URL | 无 |
//!
//! 顶层页面失败时整个操作失败；逐张抓题时单张失败只计数（见 `exam_batch`）。

use std::time::Duration;

use tracing::{error, info};

use crate::config::Config;
use crate::error::{AppError, AppResult};
use crate::infrastructure::{PageFetcher, Transport};
use crate::models::{
    CrawlCounts, CrawlResult, Exam, FullCrawlData, HierarchyData, QuestionsData, Record, Subject,
    SubjectsData,
};
use crate::orchestrator::exam_batch::{crawl_exams, ExamBatchStats};
use crate::services::ChapterMode;
use crate::store::{Repository, Store};
use crate::workflow::{ExamCtx, ExamLayout, HierarchyWalker, QuestionFlow};

/// 抓取编排器
///
/// 持有唯一的抓取器和存储，所有操作严格顺序执行
pub struct CrawlOrchestrator<T, S> {
    fetcher: PageFetcher<T>,
    store: S,
    config: Config,
}

impl<T: Transport, S: Store> CrawlOrchestrator<T, S> {
    pub fn new(transport: T, store: S, config: Config) -> Self {
        Self {
            fetcher: PageFetcher::new(transport),
            store,
            config,
        }
    }

    pub fn fetcher(&self) -> &PageFetcher<T> {
        &self.fetcher
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// 科目列表
    pub async fn crawl_subjects(
        &self,
        url: &str,
        cookie: Option<&str>,
    ) -> CrawlResult<SubjectsData> {
        let result = self
            .walker()
            .walk_subjects(url, self.cookie(cookie))
            .await
            .map(|subjects| {
                let counts = CrawlCounts {
                    subject_count: Some(subjects.len()),
                    ..Default::default()
                };
                (SubjectsData { subjects }, counts)
            });
        envelope(url, result)
    }

    /// TSA 课程页的层级（不抓题目）
    pub async fn crawl_courses(
        &self,
        url: &str,
        mode: ChapterMode,
        cookie: Option<&str>,
    ) -> CrawlResult<HierarchyData> {
        let result = self
            .walker()
            .walk_tsa(url, mode, self.cookie(cookie))
            .await
            .map(|data| {
                let counts = hierarchy_counts(&data);
                (data, counts)
            });
        envelope(url, result)
    }

    /// TSA 完整抓取：层级 + 每张试卷的阅读段落和题目
    pub async fn crawl(
        &self,
        url: &str,
        mode: ChapterMode,
        cookie: Option<&str>,
    ) -> CrawlResult<FullCrawlData> {
        let cookie = self.cookie(cookie);
        let result = async {
            let hierarchy = self.walker().walk_tsa(url, mode, cookie).await?;
            let stats = crawl_exams(
                &self.fetcher,
                &self.flow(),
                &hierarchy.exams,
                ExamLayout::ParagraphLinked,
                Duration::from_millis(self.config.tsa_exam_delay_ms),
                cookie,
            )
            .await?;
            Ok::<_, AppError>(full_result(hierarchy, stats))
        }
        .await;
        envelope(url, result)
    }

    /// 按科目完整抓取：层级 + 每张已发布试卷的题目
    pub async fn crawl_subject_exams(
        &self,
        subject_id: u64,
        cookie: Option<&str>,
    ) -> CrawlResult<FullCrawlData> {
        let subject = match self.find::<Subject>(subject_id) {
            Ok(subject) => subject,
            Err(e) => return envelope("", Err(e)),
        };

        let cookie = self.cookie(cookie);
        let result = async {
            let hierarchy = self.walker().walk_subject(&subject, cookie).await?;
            let stats = crawl_exams(
                &self.fetcher,
                &self.flow(),
                &hierarchy.exams,
                ExamLayout::Plain,
                Duration::from_millis(self.config.subject_exam_delay_ms),
                cookie,
            )
            .await?;
            Ok::<_, AppError>(full_result(hierarchy, stats))
        }
        .await;
        envelope(&subject.url, result)
    }

    /// 单张普通试卷的题目
    pub async fn crawl_questions(
        &self,
        exam_id: u64,
        cookie: Option<&str>,
    ) -> CrawlResult<QuestionsData> {
        self.crawl_exam(exam_id, ExamLayout::Plain, cookie).await
    }

    /// 单张阅读试卷的段落和题目
    pub async fn crawl_paragraphs(
        &self,
        exam_id: u64,
        cookie: Option<&str>,
    ) -> CrawlResult<QuestionsData> {
        self.crawl_exam(exam_id, ExamLayout::ParagraphLinked, cookie).await
    }

    /// 原样取回页面
    pub async fn fetch_raw(&self, url: &str, cookie: Option<&str>) -> CrawlResult<String> {
        let result = self
            .fetcher
            .fetch(url, self.cookie(cookie))
            .await
            .map(|body| (body, CrawlCounts::default()));
        envelope(url, result)
    }

    async fn crawl_exam(
        &self,
        exam_id: u64,
        layout: ExamLayout,
        cookie: Option<&str>,
    ) -> CrawlResult<QuestionsData> {
        let exam = match self.find::<Exam>(exam_id) {
            Ok(exam) => exam,
            Err(e) => return envelope("", Err(e)),
        };

        let result = self
            .flow()
            .run(
                &self.fetcher,
                &exam,
                layout,
                &ExamCtx::single(exam.id),
                self.cookie(cookie),
            )
            .await
            .map(|data| {
                let counts = CrawlCounts {
                    items_count: Some(data.questions.len()),
                    paragraphs_count: Some(data.paragraphs.len()),
                    questions_count: Some(data.questions.len()),
                    answers_count: Some(data.answers.len()),
                    ..Default::default()
                };
                (data, counts)
            });
        envelope(&exam.url, result)
    }

    fn find<R: Record>(&self, id: u64) -> AppResult<R>
    where
        S: Repository<R>,
    {
        Repository::<R>::find_by_id(&self.store, id)?.ok_or(AppError::not_found(R::KIND, id))
    }

    /// 调用方没给 Cookie 时用配置里的
    fn cookie<'c>(&'c self, cookie: Option<&'c str>) -> Option<&'c str> {
        cookie.or(self.config.cookie.as_deref())
    }

    fn walker(&self) -> HierarchyWalker<'_, T, S> {
        HierarchyWalker::new(&self.fetcher, &self.store, &self.config)
    }

    fn flow(&self) -> QuestionFlow<'_, S> {
        QuestionFlow::new(&self.store, &self.config)
    }
}

fn envelope<D>(url: &str, result: AppResult<(D, CrawlCounts)>) -> CrawlResult<D> {
    match result {
        Ok((data, counts)) => CrawlResult::ok(data, url, counts),
        Err(e) => {
            error!("❌ 抓取失败 {}: {}", url, e);
            CrawlResult::fail(e, url)
        }
    }
}

fn hierarchy_counts(data: &HierarchyData) -> CrawlCounts {
    CrawlCounts {
        courses_count: Some(data.courses.len()),
        lessons_count: Some(data.lessons.len()),
        exams_count: Some(data.exams.len()),
        ..Default::default()
    }
}

fn full_result(hierarchy: HierarchyData, stats: ExamBatchStats) -> (FullCrawlData, CrawlCounts) {
    let counts = CrawlCounts {
        paragraphs_count: Some(stats.paragraphs),
        questions_count: Some(stats.questions),
        answers_count: Some(stats.answers),
        failed_exams: Some(stats.failures.len()),
        ..hierarchy_counts(&hierarchy)
    };
    info!(
        "✓ 完整抓取完成: {} 门课程, {} 个课时, {} 张试卷, {} 道题目, {} 个答案, {} 张失败",
        hierarchy.courses.len(),
        hierarchy.lessons.len(),
        hierarchy.exams.len(),
        stats.questions,
        stats.answers,
        stats.failures.len()
    );

    let data = FullCrawlData {
        hierarchy,
        total_paragraphs: stats.paragraphs,
        total_questions: stats.questions,
        total_answers: stats.answers,
        failures: stats.failures,
    };
    (data, counts)
}
