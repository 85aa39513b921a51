//! 层级遍历流程 - 流程层
//!
//! ## 职责
//! - 抓取列表页/课程页，抽取草稿，逐级对账入库
//! - 科目列表、TSA 课程页、按科目的课程页三种遍历形状
//! - 不抓题目（题目属于 `QuestionFlow`）
//!
//! 每一步都是：抓取 → 解析并抽取成自有数据 → 丢掉文档 → 入库。
//! 中途入库失败时，之前已经写入的记录保留，重新抓取即可恢复。

use tracing::{debug, info};

use crate::config::Config;
use crate::error::AppResult;
use crate::infrastructure::{Document, PageFetcher, Transport};
use crate::models::{
    Course, CourseDraft, Exam, ExamDraft, HierarchyData, Lesson, LessonDraft, Subject,
};
use crate::services::extractor::{
    extract_chapters, extract_subjects, select_subject_chapters, select_tsa_chapters,
    ChapterMode, ScrapedChapter, ScrapedLesson,
};
use crate::services::selectors::is_exam_title;
use crate::services::upsert;
use crate::store::{Repository, Store};

/// 层级遍历
pub struct HierarchyWalker<'a, T, S> {
    fetcher: &'a PageFetcher<T>,
    store: &'a S,
    trailing_chapter_skip: &'a [u64],
}

impl<'a, T: Transport, S: Store> HierarchyWalker<'a, T, S> {
    pub fn new(fetcher: &'a PageFetcher<T>, store: &'a S, config: &'a Config) -> Self {
        Self {
            fetcher,
            store,
            trailing_chapter_skip: &config.trailing_chapter_skip,
        }
    }

    /// 科目列表页
    pub async fn walk_subjects(&self, url: &str, cookie: Option<&str>) -> AppResult<Vec<Subject>> {
        let html = self.fetcher.fetch(url, cookie).await?;
        let drafts = extract_subjects(&Document::parse(&html));

        let mut subjects = Vec::with_capacity(drafts.len());
        for draft in drafts {
            let subject = upsert::<Subject, _>(self.store, draft)?.record;
            debug!("科目: {} (#{})", subject.title, subject.id);
            subjects.push(subject);
        }

        info!("✓ 科目列表完成: {} 个科目", subjects.len());
        Ok(subjects)
    }

    /// TSA 课程页：按模式保留章节，课程的 `is_exam` 由模式决定
    pub async fn walk_tsa(
        &self,
        url: &str,
        mode: ChapterMode,
        cookie: Option<&str>,
    ) -> AppResult<HierarchyData> {
        let html = self.fetcher.fetch(url, cookie).await?;
        let chapters = select_tsa_chapters(extract_chapters(&Document::parse(&html)), mode);
        info!("📚 课程页 {} 保留 {} 个章节 ({:?})", url, chapters.len(), mode);

        let mut data = HierarchyData::default();
        for chapter in chapters {
            let ScrapedChapter {
                title,
                url,
                lessons,
            } = chapter;
            let course = upsert::<Course, _>(
                self.store,
                CourseDraft {
                    title,
                    url,
                    is_exam: Some(mode.is_exam()),
                    subject_id: None,
                },
            )?
            .record;

            self.persist_lessons(&course, lessons, &mut data)?;
            data.courses.push(course);
        }

        log_hierarchy(&data);
        Ok(data)
    }

    /// 按科目抓取：课程挂在科目下，只保留已发布的试卷
    pub async fn walk_subject(
        &self,
        subject: &Subject,
        cookie: Option<&str>,
    ) -> AppResult<HierarchyData> {
        let html = self.fetcher.fetch(&subject.url, cookie).await?;
        let chapters = select_subject_chapters(
            extract_chapters(&Document::parse(&html)),
            subject.id,
            self.trailing_chapter_skip,
        );
        info!("📚 科目 {} (#{}) 保留 {} 个章节", subject.title, subject.id, chapters.len());

        let mut data = HierarchyData::default();
        for chapter in chapters {
            let ScrapedChapter {
                title,
                url,
                lessons,
            } = chapter;
            let opens_with_exam = lessons.first().is_some_and(|l| is_exam_title(&l.title));

            let mut course = upsert::<Course, _>(
                self.store,
                CourseDraft {
                    title,
                    url,
                    is_exam: None,
                    subject_id: Some(subject.id),
                },
            )?
            .record;

            if opens_with_exam && !course.is_exam {
                debug!("课程 #{} 的第一个课时是考试，标记为考试课程", course.id);
                course = Repository::<Course>::update(
                    self.store,
                    course.id,
                    CourseDraft {
                        is_exam: Some(true),
                        ..CourseDraft::from(&course)
                    },
                )?;
            }

            self.persist_lessons(&course, lessons, &mut data)?;
            data.courses.push(course);
        }

        log_hierarchy(&data);
        Ok(data)
    }

    fn persist_lessons(
        &self,
        course: &Course,
        lessons: Vec<ScrapedLesson>,
        data: &mut HierarchyData,
    ) -> AppResult<()> {
        for (i, lesson) in lessons.into_iter().enumerate() {
            let ScrapedLesson {
                title,
                anchor,
                exams,
            } = lesson;
            let lesson = upsert::<Lesson, _>(
                self.store,
                LessonDraft {
                    title,
                    url: format!("{}{}", course.url, anchor),
                    order_index: (i + 1) as u32,
                    course_id: course.id,
                },
            )?
            .record;
            debug!("  - 课时: {} (#{})", lesson.title, lesson.id);

            for (k, exam) in exams.into_iter().enumerate() {
                let exam = upsert::<Exam, _>(
                    self.store,
                    ExamDraft {
                        title: exam.title,
                        url: exam.url,
                        order_index: (k + 1) as u32,
                        lesson_id: lesson.id,
                        course_id: Some(course.id),
                        question_quantity: exam.quantity,
                    },
                )?
                .record;
                debug!("    * 试卷: {} (#{})", exam.title, exam.id);
                data.exams.push(exam);
            }

            data.lessons.push(lesson);
        }
        Ok(())
    }
}

fn log_hierarchy(data: &HierarchyData) {
    info!(
        "✓ 层级抓取完成: {} 门课程, {} 个课时, {} 张试卷",
        data.courses.len(),
        data.lessons.len(),
        data.exams.len()
    );
}
