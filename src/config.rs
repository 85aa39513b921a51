use std::path::Path;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{AppResult, ConfigError, FileError};

/// 科目 id 名单：这些科目的课程页最后一个章节不是真正的课程（是广告/汇总入口），
/// 按科目抓取时要丢掉最后一个章节。
///
/// 名单来自目标站点的观察结果，站点改版后需要重新核对。
pub const DEFAULT_TRAILING_CHAPTER_SKIP: &[u64] = &[4, 5, 6];

/// 重复抓取同一试卷时题目/答案的处理策略
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuestionPolicy {
    /// 每次抓取都新建题目和答案，旧数据保留（会累积重复）
    #[default]
    Accumulate,
    /// 先删除该试卷已有的题目和答案，再重新创建
    Replace,
}

impl FromStr for QuestionPolicy {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "accumulate" => Ok(QuestionPolicy::Accumulate),
            "replace" => Ok(QuestionPolicy::Replace),
            _ => Err(()),
        }
    }
}

/// 程序配置
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// 科目列表页
    pub subjects_url: String,
    /// TSA（评估思维能力考试）课程页
    pub tsa_url: String,
    /// 会话 Cookie（VIP 内容需要）
    pub cookie: Option<String>,
    /// 单次请求超时（秒）
    pub request_timeout_secs: u64,
    /// TSA 整体抓取时每张试卷之间的间隔（毫秒）
    pub tsa_exam_delay_ms: u64,
    /// 按科目抓取时每张试卷之间的间隔（毫秒）
    pub subject_exam_delay_ms: u64,
    /// 需要丢掉最后一个章节的科目 id
    pub trailing_chapter_skip: Vec<u64>,
    /// 题目重复抓取策略
    pub question_policy: QuestionPolicy,
    /// 数据快照文件
    pub snapshot_file: String,
    /// 是否显示详细日志
    pub verbose_logging: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            subjects_url: "https://khoahoc.vietjack.com/trac-nghiem".to_string(),
            tsa_url: "https://khoahoc.vietjack.com/trac-nghiem/danh-gia-nang-luc/mon-dh-bach-khoa"
                .to_string(),
            cookie: None,
            request_timeout_secs: 30,
            tsa_exam_delay_ms: 2000,
            subject_exam_delay_ms: 500,
            trailing_chapter_skip: DEFAULT_TRAILING_CHAPTER_SKIP.to_vec(),
            question_policy: QuestionPolicy::Accumulate,
            snapshot_file: "crawl_snapshot.json".to_string(),
            verbose_logging: false,
        }
    }
}

impl Config {
    /// 以默认值为基础，用环境变量覆盖
    pub fn from_env() -> AppResult<Self> {
        Self::default().with_env_overrides()
    }

    /// 从 TOML 文件加载，再用环境变量覆盖
    pub fn from_toml_file(path: &Path) -> AppResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|source| FileError::ReadFailed {
            path: path.display().to_string(),
            source,
        })?;
        let config: Config = toml::from_str(&content).map_err(|source| FileError::TomlParseFailed {
            path: path.display().to_string(),
            source,
        })?;
        config.with_env_overrides()
    }

    fn with_env_overrides(self) -> AppResult<Self> {
        let cookie = match std::env::var("CRAWL_COOKIE") {
            Ok(v) if !v.trim().is_empty() => Some(v),
            _ => self.cookie,
        };
        let trailing_chapter_skip = match std::env::var("TRAILING_CHAPTER_SKIP") {
            Ok(v) => parse_id_list("TRAILING_CHAPTER_SKIP", &v)?,
            Err(_) => self.trailing_chapter_skip,
        };

        Ok(Self {
            subjects_url: std::env::var("SUBJECTS_URL").unwrap_or(self.subjects_url),
            tsa_url: std::env::var("TSA_URL").unwrap_or(self.tsa_url),
            cookie,
            request_timeout_secs: env_parse("REQUEST_TIMEOUT_SECS", self.request_timeout_secs)?,
            tsa_exam_delay_ms: env_parse("TSA_EXAM_DELAY_MS", self.tsa_exam_delay_ms)?,
            subject_exam_delay_ms: env_parse("SUBJECT_EXAM_DELAY_MS", self.subject_exam_delay_ms)?,
            trailing_chapter_skip,
            question_policy: env_parse("QUESTION_POLICY", self.question_policy)?,
            snapshot_file: std::env::var("SNAPSHOT_FILE").unwrap_or(self.snapshot_file),
            verbose_logging: env_parse("VERBOSE_LOGGING", self.verbose_logging)?,
        })
    }
}

fn env_parse<T: FromStr>(var_name: &str, default: T) -> Result<T, ConfigError> {
    match std::env::var(var_name) {
        Ok(value) => value
            .trim()
            .parse()
            .map_err(|_| ConfigError::EnvVarParseFailed {
                var_name: var_name.to_string(),
                value,
                expected_type: std::any::type_name::<T>().to_string(),
            }),
        Err(_) => Ok(default),
    }
}

fn parse_id_list(var_name: &str, value: &str) -> Result<Vec<u64>, ConfigError> {
    value
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| {
            s.parse().map_err(|_| ConfigError::EnvVarParseFailed {
                var_name: var_name.to_string(),
                value: value.to_string(),
                expected_type: "逗号分隔的 u64 列表".to_string(),
            })
        })
        .collect()
}
