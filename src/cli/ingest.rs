// src/cli/ingest.rs
//! Ingest 命令 - 从 stdin 读取原始通知入库
//!
//! 每行一条 JSON，格式与 notifications.jsonl 的行格式一致。
//! 解析失败的行跳过并计数，不中断整批入库。

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use tracing::warn;

use crate::cli::bootstrap::build_context;
use crate::model::RawNotification;

/// Ingest 命令参数
#[derive(Args)]
pub struct IngestArgs {
    /// 配置文件路径（默认 ~/.alert-relay/config.json）
    #[arg(long, short)]
    pub config: Option<PathBuf>,
}

/// 处理 ingest 命令
pub fn handle_ingest(args: IngestArgs) -> Result<()> {
    let context = build_context(args.config.as_deref(), false)?;

    let input = std::io::read_to_string(std::io::stdin()).context("读取标准输入失败")?;

    let mut accepted = 0usize;
    let mut rejected = 0usize;
    for (idx, line) in input.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        match serde_json::from_str::<RawNotification>(line) {
            Ok(notification) => {
                context.notifications.append(&notification)?;
                accepted += 1;
            }
            Err(e) => {
                rejected += 1;
                warn!(line = idx + 1, error = %e, "通知解析失败，已跳过");
            }
        }
    }

    if rejected > 0 {
        println!("已入库 {} 条通知，{} 条解析失败被跳过", accepted, rejected);
    } else {
        println!("已入库 {} 条通知", accepted);
    }
    Ok(())
}
