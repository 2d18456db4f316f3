// src/cli/run.rs
//! Run 命令 - 执行一次管道运行
//!
//! 实时频率：读窗口内的原始通知跑批处理，窗口参数可用于回放；
//! 汇总频率：窗口由各任务的水位线决定，不接受窗口参数。

use std::path::PathBuf;

use anyhow::{anyhow, Context, Result};
use chrono::{DateTime, Utc};
use clap::Args;

use crate::cli::bootstrap::build_context;
use crate::model::FrequencyType;
use crate::store::NotificationStore;

/// Run 命令参数
#[derive(Args)]
pub struct RunArgs {
    /// 运行频率: real_time, daily, weekly
    #[arg(long, short, default_value = "real_time")]
    pub frequency: String,

    /// 窗口起点（RFC3339，仅实时频率，默认从头读）
    #[arg(long)]
    pub window_start: Option<String>,

    /// 窗口终点（RFC3339，仅实时频率，默认当前时间）
    #[arg(long)]
    pub window_end: Option<String>,

    /// Dry-run：输出落终端，不外发、不写审计、不动水位线
    #[arg(long)]
    pub dry_run: bool,

    /// 配置文件路径（默认 ~/.alert-relay/config.json）
    #[arg(long, short)]
    pub config: Option<PathBuf>,

    /// 输出 JSON 汇总
    #[arg(long)]
    pub json: bool,
}

/// 处理 run 命令
pub fn handle_run(args: RunArgs) -> Result<()> {
    // 1. 参数验证
    let frequency: FrequencyType = args.frequency.parse().map_err(|_| {
        anyhow!(
            "不支持的频率: {}，可选: real_time, daily, weekly",
            args.frequency
        )
    })?;

    if frequency.is_digest() && (args.window_start.is_some() || args.window_end.is_some()) {
        return Err(anyhow!("汇总频率的窗口由水位线决定，不接受窗口参数"));
    }

    // 2. 装配管道
    let context = build_context(args.config.as_deref(), args.dry_run)?;

    // 3. 按频率执行
    let summary = if frequency.is_digest() {
        context.pipeline.run_digest(frequency, Utc::now())?
    } else {
        let start = parse_instant(args.window_start.as_deref())?;
        let end = parse_instant(args.window_end.as_deref())?.unwrap_or_else(Utc::now);
        let raws = context.notifications.find_created_between(start, end)?;
        context.pipeline.process_batch(&raws, &[frequency])?
    };

    // 4. 输出结果
    if args.json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
    } else {
        println!("{}", summary);
    }

    if summary.had_failures() {
        std::process::exit(1);
    }
    Ok(())
}

/// 解析 RFC3339 时间参数
fn parse_instant(value: Option<&str>) -> Result<Option<DateTime<Utc>>> {
    value
        .map(|v| {
            v.parse::<DateTime<Utc>>()
                .with_context(|| format!("时间格式无效 (需要 RFC3339): {}", v))
        })
        .transpose()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_instant() {
        assert_eq!(parse_instant(None).unwrap(), None);

        let parsed = parse_instant(Some("2024-05-01T10:00:00Z")).unwrap();
        assert_eq!(parsed, Some("2024-05-01T10:00:00Z".parse().unwrap()));

        assert!(parse_instant(Some("yesterday")).is_err());
    }
}
