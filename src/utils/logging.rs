//! 日志工具模块
//!
//! 提供日志初始化和输出的辅助函数

use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::models::CrawlCounts;

/// 初始化日志
///
/// `RUST_LOG` 优先；没有设置时默认 `info`，`verbose` 为真时 `debug`
pub fn init(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .try_init();
}

/// 记录程序启动信息
///
/// # 参数
/// - `operation`: 操作名
/// - `target`: 目标 URL 或 id
pub fn log_startup(operation: &str, target: &str) {
    info!("{}", "=".repeat(60));
    info!("🚀 程序启动 - {}", operation);
    info!("🎯 目标: {}", target);
    info!(
        "启动时间: {}",
        chrono::Local::now().format("%Y-%m-%d %H:%M:%S")
    );
    info!("{}", "=".repeat(60));
}

/// 打印最终统计信息
///
/// # 参数
/// - `success`: 操作是否成功
/// - `counts`: 结果信封里的计数
pub fn print_final_stats(success: bool, counts: &CrawlCounts) {
    info!("\n{}", "=".repeat(60));
    info!("📊 处理完成统计");
    info!(
        "完成时间: {}",
        chrono::Local::now().format("%Y-%m-%d %H:%M:%S")
    );
    info!("{}", "=".repeat(60));
    info!("{}", if success { "✅ 成功" } else { "❌ 失败" });

    let rows = [
        ("科目", counts.subject_count),
        ("课程", counts.courses_count),
        ("课时", counts.lessons_count),
        ("试卷", counts.exams_count),
        ("段落", counts.paragraphs_count),
        ("题目", counts.questions_count),
        ("答案", counts.answers_count),
        ("失败试卷", counts.failed_exams),
    ];
    for (label, value) in rows {
        if let Some(value) = value {
            info!("{}: {}", label, value);
        }
    }
    info!("{}", "=".repeat(60));
}

/// 截断长文本用于日志显示
///
/// # 参数
/// - `text`: 原始文本
/// - `max_len`: 最大长度
///
/// # 返回
/// 返回截断后的文本
pub fn truncate_text(text: &str, max_len: usize) -> String {
    if text.chars().count() > max_len {
        text.chars().take(max_len).collect::<String>() + "..."
    } else {
        text.to_string()
    }
}
