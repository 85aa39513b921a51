use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use serde::Serialize;

use exam_crawler::models::{CrawlCounts, CrawlResult};
use exam_crawler::utils::logging;
use exam_crawler::{ChapterMode, Config, CrawlOrchestrator, HttpTransport, MemoryStore};

/// 教育网站题库抓取工具
#[derive(Debug, Parser)]
#[command(name = "exam_crawler", version)]
struct Cli {
    /// TOML 配置文件（不指定时只读环境变量）
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// 会话 Cookie，覆盖配置
    #[arg(long, global = true)]
    cookie: Option<String>,

    /// 数据快照文件，覆盖配置
    #[arg(long, global = true)]
    snapshot: Option<PathBuf>,

    /// 显示 debug 日志
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// 抓取科目列表
    Subjects {
        /// 列表页 URL，默认取配置
        #[arg(long)]
        url: Option<String>,
    },
    /// 抓取 TSA 课程页的课程/课时/试卷
    Courses {
        #[arg(long)]
        url: Option<String>,
        #[arg(long, value_enum, default_value_t = Mode::NonExam)]
        mode: Mode,
    },
    /// TSA 完整抓取（层级 + 阅读题）
    Crawl {
        #[arg(long)]
        url: Option<String>,
        #[arg(long, value_enum, default_value_t = Mode::NonExam)]
        mode: Mode,
    },
    /// 按科目完整抓取（层级 + 普通题）
    SubjectExams { subject_id: u64 },
    /// 抓取单张试卷的题目
    Questions { exam_id: u64 },
    /// 抓取单张阅读试卷的段落和题目
    Paragraphs { exam_id: u64 },
    /// 原样取回页面
    Fetch { url: String },
}

/// 章节模式
#[derive(Clone, Copy, Debug, Eq, PartialEq, ValueEnum)]
enum Mode {
    /// 只抓考试章节
    Exam,
    /// 只抓普通章节
    NonExam,
}

impl From<Mode> for ChapterMode {
    fn from(mode: Mode) -> Self {
        match mode {
            Mode::Exam => ChapterMode::ExamChapters,
            Mode::NonExam => ChapterMode::NonExamChapters,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // 加载配置
    let mut config = match &cli.config {
        Some(path) => Config::from_toml_file(path)?,
        None => Config::from_env()?,
    };
    if cli.verbose {
        config.verbose_logging = true;
    }
    if let Some(snapshot) = &cli.snapshot {
        config.snapshot_file = snapshot.display().to_string();
    }

    // 初始化日志
    logging::init(config.verbose_logging);

    let snapshot = PathBuf::from(&config.snapshot_file);
    let store = MemoryStore::load(&snapshot)
        .with_context(|| format!("加载快照失败: {}", snapshot.display()))?;
    let transport = HttpTransport::new(Duration::from_secs(config.request_timeout_secs))?;

    let subjects_url = config.subjects_url.clone();
    let tsa_url = config.tsa_url.clone();
    let app = CrawlOrchestrator::new(transport, store, config);
    let cookie = cli.cookie.as_deref();

    let report = match cli.command {
        Command::Subjects { url } => {
            let url = url.unwrap_or(subjects_url);
            logging::log_startup("科目列表", &url);
            Report::new(app.crawl_subjects(&url, cookie).await)?
        }
        Command::Courses { url, mode } => {
            let url = url.unwrap_or(tsa_url);
            logging::log_startup("课程层级", &url);
            Report::new(app.crawl_courses(&url, mode.into(), cookie).await)?
        }
        Command::Crawl { url, mode } => {
            let url = url.unwrap_or(tsa_url);
            logging::log_startup("TSA 完整抓取", &url);
            Report::new(app.crawl(&url, mode.into(), cookie).await)?
        }
        Command::SubjectExams { subject_id } => {
            logging::log_startup("按科目完整抓取", &format!("科目 #{}", subject_id));
            Report::new(app.crawl_subject_exams(subject_id, cookie).await)?
        }
        Command::Questions { exam_id } => {
            logging::log_startup("试卷题目", &format!("试卷 #{}", exam_id));
            Report::new(app.crawl_questions(exam_id, cookie).await)?
        }
        Command::Paragraphs { exam_id } => {
            logging::log_startup("阅读试卷", &format!("试卷 #{}", exam_id));
            Report::new(app.crawl_paragraphs(exam_id, cookie).await)?
        }
        Command::Fetch { url } => {
            logging::log_startup("原样抓取", &url);
            Report::new(app.fetch_raw(&url, cookie).await)?
        }
    };

    app.store()
        .save(&snapshot)
        .with_context(|| format!("保存快照失败: {}", snapshot.display()))?;

    logging::print_final_stats(report.success, &report.counts);
    println!("{}", report.json);

    if !report.success {
        std::process::exit(1);
    }
    Ok(())
}

/// 输出用的结果摘要
struct Report {
    success: bool,
    counts: CrawlCounts,
    json: String,
}

impl Report {
    fn new<D: Serialize>(result: CrawlResult<D>) -> Result<Self> {
        Ok(Self {
            success: result.success,
            json: serde_json::to_string_pretty(&result).context("序列化结果失败")?,
            counts: result.metadata.counts,
        })
    }
}
