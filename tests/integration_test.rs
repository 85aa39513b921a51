use std::cell::RefCell;
use std::collections::HashMap;

use exam_crawler::infrastructure::RawResponse;
use exam_crawler::models::{Course, Exam, Lesson, Paragraph, Subject, SubjectDraft};
use exam_crawler::services::upsert;
use exam_crawler::store::{QuestionRepository, Repository};
use exam_crawler::{
    AppResult, ChapterMode, Config, CrawlOrchestrator, MemoryStore, QuestionKind, QuestionPolicy,
    Transport,
};

const TSA_URL: &str = "https://site.test/tsa";
const PARTIAL_URL: &str = "https://site.test/tsa-partial";
const SUBJECTS_URL: &str = "https://site.test/mon-hoc";

// ========== 固定站点 ==========

/// 按 URL 返回固定页面；没有的页面返回 404
#[derive(Default)]
struct FixtureSite {
    pages: RefCell<HashMap<String, String>>,
    requests: RefCell<Vec<(String, Option<String>)>>,
}

impl FixtureSite {
    fn with(pages: Vec<(&str, String)>) -> Self {
        let site = Self::default();
        for (url, html) in pages {
            site.set(url, html);
        }
        site
    }

    fn set(&self, url: &str, html: String) {
        self.pages.borrow_mut().insert(url.to_string(), html);
    }

    fn requested(&self, url: &str) -> bool {
        self.requests.borrow().iter().any(|(u, _)| u == url)
    }

    fn last_cookie(&self) -> Option<String> {
        self.requests.borrow().last().and_then(|(_, c)| c.clone())
    }
}

impl Transport for FixtureSite {
    async fn get(&self, url: &str, headers: &[(&'static str, String)]) -> AppResult<RawResponse> {
        let cookie = headers
            .iter()
            .find(|(name, _)| *name == "Cookie")
            .map(|(_, value)| value.clone());
        self.requests.borrow_mut().push((url.to_string(), cookie));

        Ok(match self.pages.borrow().get(url) {
            Some(body) => RawResponse {
                status: 200,
                body: body.clone(),
            },
            None => RawResponse {
                status: 404,
                body: "not found".to_string(),
            },
        })
    }
}

// ========== 页面片段 ==========

fn exam_item(title: &str, url: &str, quantity: Option<u32>) -> String {
    let quantity = quantity
        .map(|q| format!(r#" data-quantity="{q}""#))
        .unwrap_or_default();
    format!(
        r#"<li class="exam-item last-item"{quantity}>
            <div class="exam-body"><p class="exam-test"><a class="url-main" href="{url}">{title}</a></p></div>
        </li>"#
    )
}

fn lesson(title: &str, anchor: &str, exams: &[String]) -> String {
    format!(
        r#"<li class="exam-item">
            <div class="exam-body"><p class="exam-test mb-0"><a href="{anchor}">{title}</a></p></div>
            <div class="collapse"><ul class="lesson-wrapper">{}</ul></div>
        </li>"#,
        exams.concat()
    )
}

fn chapter(title: &str, url: &str, lessons: &[String]) -> String {
    format!(
        r#"<div class="chapter-item">
            <div class="chapter-head"><a href="{url}"><span>{title}</span></a></div>
            <ul class="lesson-wrapper">{}</ul>
        </div>"#,
        lessons.concat()
    )
}

fn page(body: &str) -> String {
    format!("<!DOCTYPE html><html><head><title>fixture</title></head><body>{body}</body></html>")
}

fn question(content: &str, answers: &str, hint: &str) -> String {
    format!(
        r#"<div class="quiz-answer-item">
            <div class="quiz-answer-left">
                <div class="question"><div class="title-question">{content}</div></div>
                <div class="answer-check radio">{answers}</div>
            </div>
            <div class="quiz-answer-right"><div class="result box-hint">{hint}</div></div>
        </div>"#
    )
}

fn option(content: &str, correct: bool) -> String {
    let flag = if correct { "Y" } else { "N" };
    format!(
        r#"<div class="option-choices js-answer" data-answer="{flag}"><div class="option-content">{content}</div></div>"#
    )
}

fn options(count: usize, correct: usize) -> String {
    (0..count)
        .map(|i| option(&format!("<p>Phương án {}</p>", i + 1), i == correct))
        .collect()
}

fn exam_page(children: &[String]) -> String {
    page(&format!(
        r#"<div class="quiz-answer-list">{}</div>"#,
        children.concat()
    ))
}

// ========== 固定数据 ==========

fn tsa_course_page() -> String {
    page(&[
        chapter(
            "Tư duy toán học",
            "https://site.test/c/toan",
            &[lesson(
                "Bài 1: Hàm số",
                "#collapse-1",
                &[exam_item("Đề luyện 1", "https://site.test/e/1", Some(3))],
            )],
        ),
        chapter(
            "Tư duy đọc hiểu",
            "https://site.test/c/doc",
            &[lesson(
                "Bài 2: Đọc hiểu",
                "#collapse-2",
                &[exam_item("Đề luyện 2", "https://site.test/e/2", Some(2))],
            )],
        ),
        chapter(
            "Đề thi thử TSA",
            "https://site.test/c/de-thi",
            &[lesson(
                "Đề thi số 1",
                "#collapse-3",
                &[exam_item("Đề thi 1", "https://site.test/e/3", Some(40))],
            )],
        ),
    ]
    .concat())
}

/// 1 个段落、2 道题（选择题 + 简答题）、4 个答案；第三道题没有题干
fn exam_one() -> String {
    exam_page(&[
        r#"<div class="paragraph-title">Đoạn 1</div>"#.to_string(),
        r#"<div class="paragraph-content"><p class="MsoNormal">Đọc   đoạn văn sau</p></div>"#
            .to_string(),
        question(
            "<p>Câu 1: chọn đáp án đúng</p>",
            &options(4, 1),
            "<p>Giải thích</p>",
        ),
        question(
            "<p>Câu 2: tính 6 x 7</p>",
            r#"<div class="no-option"></div>"#,
            "<p>Đáp án: 42</p>",
        ),
        question("", &option("X", true), ""),
    ])
}

/// 2 道题（填空题 + 表格判断题）、5 个答案
fn exam_two() -> String {
    exam_page(&[
        question(
            "<p>Hà Nội là _____ của Việt Nam</p>",
            &format!("{}{}", option("thủ đô", true), option("thành phố", false)),
            "",
        ),
        question(
            r#"<p>Xét tính đúng sai</p>
               <table>
                   <tr data-answer="Y"><td>a) 1 + 1 = 2</td></tr>
                   <tr><td>b) 2 + 2 = 5</td></tr>
                   <tr><td>c) 3 &gt; 2</td><td><span data-answer="Y"></span></td></tr>
               </table>"#,
            "",
            "",
        ),
    ])
}

fn tsa_site() -> FixtureSite {
    FixtureSite::with(vec![
        (TSA_URL, tsa_course_page()),
        ("https://site.test/e/1", exam_one()),
        ("https://site.test/e/2", exam_two()),
    ])
}

fn test_config() -> Config {
    Config {
        tsa_exam_delay_ms: 0,
        subject_exam_delay_ms: 0,
        cookie: None,
        ..Config::default()
    }
}

fn orchestrator(site: FixtureSite, config: Config) -> CrawlOrchestrator<FixtureSite, MemoryStore> {
    CrawlOrchestrator::new(site, MemoryStore::new(), config)
}

/// [课程, 课时, 试卷, 段落, 题目, 答案]
fn table_counts(store: &MemoryStore) -> [usize; 6] {
    [
        Repository::<Course>::count(store).unwrap(),
        Repository::<Lesson>::count(store).unwrap(),
        Repository::<Exam>::count(store).unwrap(),
        Repository::<Paragraph>::count(store).unwrap(),
        store.question_count().unwrap(),
        store.answer_count().unwrap(),
    ]
}

fn exam_by_url(store: &MemoryStore, url: &str) -> Exam {
    Repository::<Exam>::find_by_natural_key(store, url)
        .unwrap()
        .expect("试卷应已入库")
}

// ========== TSA 轨道 ==========

#[tokio::test]
async fn two_chapter_fixture_end_to_end() {
    let app = orchestrator(tsa_site(), test_config());
    let result = app.crawl(TSA_URL, ChapterMode::NonExamChapters, None).await;

    assert!(result.success, "error: {:?}", result.error);
    let counts = &result.metadata.counts;
    assert_eq!(counts.courses_count, Some(2));
    assert_eq!(counts.lessons_count, Some(2));
    assert_eq!(counts.exams_count, Some(2));
    assert_eq!(counts.paragraphs_count, Some(1));
    assert_eq!(counts.questions_count, Some(4));
    assert_eq!(counts.answers_count, Some(9));
    assert_eq!(counts.failed_exams, Some(0));

    let data = result.data.as_ref().unwrap();
    assert_eq!(data.hierarchy.lessons[0].url, "https://site.test/c/toan#collapse-1");
    assert!(data.hierarchy.courses.iter().all(|c| !c.is_exam));
    assert_eq!(data.hierarchy.exams[0].course_id, Some(data.hierarchy.courses[0].id));
    assert_eq!(data.hierarchy.exams[0].question_quantity, Some(3));
    assert!(data.failures.is_empty());

    // 试卷 1：两道题都挂在段落下
    let store = app.store();
    let paragraph = Repository::<Paragraph>::find_by_natural_key(
        store,
        &format!("Đoạn 1{}", data.hierarchy.exams[0].id),
    )
    .unwrap()
    .unwrap();
    assert_eq!(paragraph.content, "<p>Đọc đoạn văn sau</p>");

    let first = store.questions_for_exam(data.hierarchy.exams[0].id).unwrap();
    assert_eq!(first.len(), 2);
    assert!(first.iter().all(|q| q.paragraph_id == Some(paragraph.id)));
    assert_eq!(first[0].kind, QuestionKind::Choice);
    assert_eq!(first[0].explanation.as_deref(), Some("<p>Giải thích</p>"));
    assert_eq!(
        first[1].kind,
        QuestionKind::ShortAnswer {
            short_answer: Some("42".into())
        }
    );
    let answers = store.answers_for_question(first[0].id).unwrap();
    let correct: Vec<_> = answers.iter().map(|a| a.is_correct).collect();
    assert_eq!(correct, [false, true, false, false]);

    // 试卷 2：填空题 + 表格判断题
    let second = store.questions_for_exam(data.hierarchy.exams[1].id).unwrap();
    assert_eq!(second[0].kind, QuestionKind::FillBlank);
    assert_eq!(second[1].kind, QuestionKind::TrueFalse { true_false: None });
    let rows: Vec<_> = store
        .answers_for_question(second[1].id)
        .unwrap()
        .iter()
        .map(|a| a.is_correct)
        .collect();
    assert_eq!(rows, [true, false, true]);

    // 考试章节的试卷页没有被请求
    assert!(!app.fetcher().transport().requested("https://site.test/e/3"));
}

#[tokio::test]
async fn recrawl_keeps_hierarchy_and_accumulates_questions() {
    let app = orchestrator(tsa_site(), test_config());

    assert!(app.crawl(TSA_URL, ChapterMode::NonExamChapters, None).await.success);
    assert_eq!(table_counts(app.store()), [2, 2, 2, 1, 4, 9]);

    assert!(app.crawl(TSA_URL, ChapterMode::NonExamChapters, None).await.success);
    assert_eq!(table_counts(app.store()), [2, 2, 2, 1, 8, 18]);
}

#[tokio::test]
async fn replace_policy_rebuilds_questions_on_recrawl() {
    let config = Config {
        question_policy: QuestionPolicy::Replace,
        ..test_config()
    };
    let app = orchestrator(tsa_site(), config);

    app.crawl(TSA_URL, ChapterMode::NonExamChapters, None).await;
    app.crawl(TSA_URL, ChapterMode::NonExamChapters, None).await;
    assert_eq!(table_counts(app.store()), [2, 2, 2, 1, 4, 9]);
}

#[tokio::test]
async fn failing_exam_does_not_abort_the_crawl() {
    let site = tsa_site();
    site.set(
        PARTIAL_URL,
        page(&chapter(
            "Luyện tập",
            "https://site.test/c/luyen-tap",
            &[lesson(
                "Bài tổng hợp",
                "#collapse-9",
                &[
                    exam_item("Đề 1", "https://site.test/e/1", None),
                    exam_item("Đề hỏng", "https://site.test/e/broken", None),
                    exam_item("Đề 2", "https://site.test/e/2", None),
                ],
            )],
        )),
    );
    let app = orchestrator(site, test_config());

    let result = app.crawl(PARTIAL_URL, ChapterMode::NonExamChapters, None).await;
    assert!(result.success);
    assert_eq!(result.metadata.counts.exams_count, Some(3));
    assert_eq!(result.metadata.counts.failed_exams, Some(1));
    assert_eq!(result.metadata.counts.questions_count, Some(4));
    assert_eq!(result.metadata.counts.answers_count, Some(9));

    let data = result.data.unwrap();
    assert_eq!(data.total_questions, 4);
    assert_eq!(data.failures.len(), 1);
    assert_eq!(data.failures[0].url, "https://site.test/e/broken");
    assert!(data.failures[0].error.contains("404"));
}

#[tokio::test]
async fn top_level_failure_is_a_failure_envelope() {
    let app = orchestrator(tsa_site(), test_config());
    let result = app
        .crawl("https://site.test/missing", ChapterMode::NonExamChapters, None)
        .await;

    assert!(!result.success);
    assert!(result.data.is_none());
    assert!(result.error.unwrap().contains("404"));
    assert_eq!(result.metadata.url, "https://site.test/missing");
    assert_eq!(table_counts(app.store()), [0, 0, 0, 0, 0, 0]);
}

#[tokio::test]
async fn exam_mode_keeps_only_exam_chapters() {
    let app = orchestrator(tsa_site(), test_config());
    let result = app
        .crawl_courses(TSA_URL, ChapterMode::ExamChapters, None)
        .await;

    assert!(result.success);
    let data = result.data.unwrap();
    assert_eq!(data.courses.len(), 1);
    assert!(data.courses[0].is_exam);
    assert_eq!(data.exams[0].url, "https://site.test/e/3");
    assert_eq!(data.exams[0].course_id, Some(data.courses[0].id));
    assert_eq!(result.metadata.counts.questions_count, None);
}

#[tokio::test]
async fn course_recrawl_updates_rows_in_place() {
    let app = orchestrator(tsa_site(), test_config());
    let first = app
        .crawl_courses(TSA_URL, ChapterMode::NonExamChapters, None)
        .await
        .data
        .unwrap();

    app.fetcher().transport().set(
        TSA_URL,
        tsa_course_page().replace("Tư duy toán học", "Tư duy toán học (2025)"),
    );
    let second = app
        .crawl_courses(TSA_URL, ChapterMode::NonExamChapters, None)
        .await
        .data
        .unwrap();

    assert_eq!(Repository::<Course>::count(app.store()).unwrap(), 2);
    assert_eq!(second.courses[0].id, first.courses[0].id);
    assert_eq!(second.courses[0].title, "Tư duy toán học (2025)");
}

#[tokio::test]
async fn single_exam_operations_follow_the_layout() {
    let app = orchestrator(tsa_site(), test_config());
    app.crawl_courses(TSA_URL, ChapterMode::NonExamChapters, None)
        .await;
    let exam = exam_by_url(app.store(), "https://site.test/e/1");

    let linked = app.crawl_paragraphs(exam.id, None).await;
    assert!(linked.success);
    assert_eq!(linked.metadata.url, "https://site.test/e/1");
    assert_eq!(linked.metadata.counts.paragraphs_count, Some(1));
    assert_eq!(linked.metadata.counts.items_count, Some(2));

    let plain = app.crawl_questions(exam.id, None).await;
    let data = plain.data.unwrap();
    assert!(data.paragraphs.is_empty());
    assert_eq!(data.questions.len(), 2);
    assert!(data.questions.iter().all(|q| q.paragraph_id.is_none()));
}

#[tokio::test]
async fn unknown_ids_are_failure_envelopes() {
    let app = orchestrator(tsa_site(), test_config());

    let questions = app.crawl_questions(999, None).await;
    assert!(!questions.success);
    assert!(questions.error.unwrap().contains("exam #999"));

    let subject = app.crawl_subject_exams(999, None).await;
    assert!(!subject.success);
    assert!(subject.error.unwrap().contains("subject #999"));
}

#[tokio::test]
async fn envelope_serializes_camel_case_counts() {
    let app = orchestrator(tsa_site(), test_config());
    let result = app
        .crawl_courses(TSA_URL, ChapterMode::NonExamChapters, None)
        .await;

    let json = serde_json::to_value(&result).unwrap();
    assert_eq!(json["success"], true);
    assert_eq!(json["metadata"]["coursesCount"], 2);
    assert_eq!(json["metadata"]["url"], TSA_URL);
    assert!(json["metadata"].get("failedExams").is_none());
    assert!(json.get("error").is_none());
    assert_eq!(json["data"]["courses"].as_array().unwrap().len(), 2);
}

// ========== 科目轨道 ==========

fn subjects_page() -> String {
    page(
        r#"<div class="list-subject">
            <div class="subject-item"><a href="https://site.test/s/toan"><img src="/toan.png"><span class="subject-title">Toán</span></a></div>
            <div class="subject-item"><a href="https://site.test/s/van"><span class="subject-title">Ngữ văn</span></a></div>
            <div class="subject-item"><a href=""><span class="subject-title">Sắp ra mắt</span></a></div>
        </div>"#,
    )
}

fn subject_course_page() -> String {
    page(&[
        chapter(
            "Chương 1: Hàm số",
            "https://site.test/c/ham-so",
            &[lesson(
                "Đề thi thử chương 1",
                "#collapse-11",
                &[
                    exam_item("Đề 1", "https://site.test/e/s1", Some(3)),
                    exam_item("Đề sắp ra mắt", "https://site.test/e/s-unpublished", None),
                ],
            )],
        ),
        chapter(
            "Chương 2: Hình học",
            "https://site.test/c/hinh-hoc",
            &[lesson(
                "Bài 1: Vectơ",
                "#collapse-21",
                &[exam_item("Đề 2", "https://site.test/e/s2", Some(2))],
            )],
        ),
        chapter(
            "Tổng ôn",
            "https://site.test/c/tong-on",
            &[lesson(
                "Bài tổng ôn",
                "#collapse-31",
                &[exam_item("Đề 3", "https://site.test/e/s3", Some(1))],
            )],
        ),
    ]
    .concat())
}

/// 选择题 + 成组判断题（4 个子题）+ 选择题：3 道题、9 个答案
fn grouped_exam() -> String {
    exam_page(&[
        question("<p>Câu 1</p>", &options(2, 0), ""),
        r#"<div class="quiz-paragraph"><div class="title-question"><p>Cho các phát biểu sau</p></div></div>"#
            .to_string(),
        question("<p>a) phát biểu a</p>", "", "<p>Đúng</p>"),
        question("<p>b) phát biểu b</p>", "", "<p>Sai</p>"),
        question("<p>c) phát biểu c</p>", "", "<p>Phát biểu ĐÚNG</p>"),
        question("<p>d) phát biểu d</p>", "", "<p>Sai</p>"),
        question("<p>Câu 3</p>", &options(3, 2), ""),
    ])
}

/// 没有题目容器：2 道独立题、4 个答案
fn containerless_exam() -> String {
    page(&format!(
        r#"<div class="quiz">{}{}</div>"#,
        question("<p>Câu 1</p>", &options(2, 1), ""),
        question("<p>Câu 2</p>", &options(2, 0), "")
    ))
}

fn subject_site() -> FixtureSite {
    FixtureSite::with(vec![
        (SUBJECTS_URL, subjects_page()),
        ("https://site.test/s/toan", subject_course_page()),
        ("https://site.test/e/s1", grouped_exam()),
        ("https://site.test/e/s2", containerless_exam()),
        ("https://site.test/e/s3", containerless_exam()),
    ])
}

#[tokio::test]
async fn subject_listing_skips_incomplete_items() {
    let app = orchestrator(subject_site(), test_config());
    let result = app.crawl_subjects(SUBJECTS_URL, None).await;

    assert!(result.success);
    assert_eq!(result.metadata.counts.subject_count, Some(2));
    let subjects = result.data.unwrap().subjects;
    assert_eq!(subjects[0].title, "Toán");
    assert_eq!(subjects[0].image.as_deref(), Some("/toan.png"));

    app.crawl_subjects(SUBJECTS_URL, None).await;
    assert_eq!(Repository::<Subject>::count(app.store()).unwrap(), 2);
}

#[tokio::test]
async fn subject_track_end_to_end() {
    let store = MemoryStore::new();
    let toan = tokio_test::assert_ok!(upsert::<Subject, _>(
        &store,
        SubjectDraft {
            title: "Toán".into(),
            url: "https://site.test/s/toan".into(),
            image: None,
        },
    ))
    .record;
    let config = Config {
        trailing_chapter_skip: vec![toan.id],
        ..test_config()
    };
    let app = CrawlOrchestrator::new(subject_site(), store, config);

    let result = app.crawl_subject_exams(toan.id, None).await;
    assert!(result.success, "error: {:?}", result.error);
    assert_eq!(result.metadata.url, "https://site.test/s/toan");

    let counts = &result.metadata.counts;
    assert_eq!(counts.courses_count, Some(2));
    assert_eq!(counts.lessons_count, Some(2));
    assert_eq!(counts.exams_count, Some(2));
    assert_eq!(counts.questions_count, Some(5));
    assert_eq!(counts.answers_count, Some(13));

    let data = result.data.unwrap();
    let courses = &data.hierarchy.courses;
    assert!(courses[0].is_exam, "第一个课时是考试的课程应标记为考试");
    assert!(!courses[1].is_exam);
    assert!(courses.iter().all(|c| c.subject_id == Some(toan.id)));

    // 尾部章节被丢掉，未发布的试卷被跳过
    let site = app.fetcher().transport();
    assert!(!site.requested("https://site.test/e/s3"));
    assert!(!site.requested("https://site.test/e/s-unpublished"));

    // 成组判断题：一道题 + 四个合成答案
    let grouped = app
        .store()
        .questions_for_exam(data.hierarchy.exams[0].id)
        .unwrap();
    assert_eq!(grouped.len(), 3);
    assert_eq!(grouped[1].kind, QuestionKind::TrueFalse { true_false: None });
    assert_eq!(grouped[1].content, "<p>Cho các phát biểu sau</p>");
    let verdicts: Vec<_> = app
        .store()
        .answers_for_question(grouped[1].id)
        .unwrap()
        .iter()
        .map(|a| a.is_correct)
        .collect();
    assert_eq!(verdicts, [true, false, true, false]);
}

// ========== 原样抓取 ==========

#[tokio::test]
async fn fetch_raw_uses_configured_cookie_unless_overridden() {
    let config = Config {
        cookie: Some("sid=from-config".into()),
        ..test_config()
    };
    let app = orchestrator(tsa_site(), config);

    let result = app.fetch_raw(TSA_URL, None).await;
    assert!(result.success);
    assert!(result.data.unwrap().contains("chapter-item"));
    assert_eq!(
        app.fetcher().transport().last_cookie().as_deref(),
        Some("sid=from-config")
    );

    app.fetch_raw(TSA_URL, Some("sid=explicit")).await;
    assert_eq!(
        app.fetcher().transport().last_cookie().as_deref(),
        Some("sid=explicit")
    );
}

#[tokio::test]
async fn snapshot_survives_a_full_crawl() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("crawl_snapshot.json");

    let app = orchestrator(tsa_site(), test_config());
    app.crawl(TSA_URL, ChapterMode::NonExamChapters, None).await;
    app.store().save(&path).unwrap();

    let reloaded = MemoryStore::load(&path).unwrap();
    assert_eq!(table_counts(&reloaded), table_counts(app.store()));
}
