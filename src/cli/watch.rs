// src/cli/watch.rs
//! Watch 命令 - 持续监听新通知并实时分发
//!
//! 从启动时刻起轮询通知存储，把每个 (上次游标, now] 窗口交给实时
//! 批处理。游标只在内存里；批处理失败时游标不动，下一轮重读整窗，
//! 重复投递由内容键合并吸收。汇总频率不在此调度，由外部定时器调
//! `run --frequency daily` 触发。

use std::path::PathBuf;
use std::time::Duration;

use anyhow::Result;
use chrono::Utc;
use clap::Args;
use tokio::time::sleep;
use tracing::{error, info};

use crate::cli::bootstrap::build_context;
use crate::model::FrequencyType;
use crate::store::NotificationStore;

/// Watch 命令参数
#[derive(Args)]
pub struct WatchArgs {
    /// 轮询间隔（秒）
    #[arg(long, short, default_value = "10")]
    pub interval: u64,

    /// Dry-run：输出落终端，不外发
    #[arg(long)]
    pub dry_run: bool,

    /// 配置文件路径（默认 ~/.alert-relay/config.json）
    #[arg(long, short)]
    pub config: Option<PathBuf>,
}

/// 处理 watch 命令
pub async fn handle_watch(args: WatchArgs) -> Result<()> {
    let context = build_context(args.config.as_deref(), args.dry_run)?;

    eprintln!(
        "Alert Relay 实时监听启动，轮询间隔: {}秒，数据目录: {}",
        args.interval,
        context.data_dir.display()
    );

    let mut cursor = Utc::now();
    let mut consecutive_errors = 0;
    const MAX_CONSECUTIVE_ERRORS: u32 = 10;

    loop {
        sleep(Duration::from_secs(args.interval)).await;
        let now = Utc::now();

        let raws = match context.notifications.find_created_between(Some(cursor), now) {
            Ok(raws) => {
                consecutive_errors = 0;
                raws
            }
            Err(e) => {
                consecutive_errors += 1;
                error!(
                    error = %e,
                    consecutive = consecutive_errors,
                    max = MAX_CONSECUTIVE_ERRORS,
                    "读取通知存储失败"
                );
                if consecutive_errors >= MAX_CONSECUTIVE_ERRORS {
                    error!("连续错误次数过多，监听停止");
                    break;
                }
                continue;
            }
        };

        if raws.is_empty() {
            cursor = now;
            continue;
        }

        match context
            .pipeline
            .process_batch(&raws, &[FrequencyType::RealTime])
        {
            Ok(summary) => {
                consecutive_errors = 0;
                info!(
                    batch = raws.len(),
                    sent = summary.groups_sent,
                    failed = summary.groups_failed,
                    "实时窗口处理完成"
                );
                cursor = now;
            }
            Err(e) => {
                consecutive_errors += 1;
                error!(error = %e, "批处理失败，窗口保留待重试");
                if consecutive_errors >= MAX_CONSECUTIVE_ERRORS {
                    error!("连续错误次数过多，监听停止");
                    break;
                }
            }
        }
    }

    Ok(())
}
