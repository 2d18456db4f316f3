//! Alert Relay CLI
//!
//! SCA 安全通知的匹配、合并与分发管道

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::{fmt, EnvFilter};

use alert_relay::cli::{
    handle_ingest, handle_run, handle_watch, resolve_config_path, IngestArgs, RunArgs, WatchArgs,
};
use alert_relay::config::RelayConfig;
use alert_relay::store::{
    AuditStore, JsonlAuditStore, JsonlNotificationStore, NotificationStore,
};

#[derive(Parser)]
#[command(name = "arelay")]
#[command(about = "Alert Relay - SCA 安全通知的匹配、合并与分发")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// 执行一次管道运行（实时或汇总频率）
    Run(RunArgs),
    /// 持续监听新通知并实时分发
    Watch(WatchArgs),
    /// 从 stdin 读取原始通知入库（每行一条 JSON）
    Ingest(IngestArgs),
    /// 列出最近入库的原始通知
    Notifications {
        /// 显示最近 N 条
        #[arg(long, short, default_value = "20")]
        limit: usize,
        /// 输出 JSON 格式
        #[arg(long)]
        json: bool,
        /// 配置文件路径
        #[arg(long, short)]
        config: Option<PathBuf>,
    },
    /// 列出最近的派发审计记录
    Audit {
        /// 显示最近 N 条
        #[arg(long, short, default_value = "20")]
        limit: usize,
        /// 输出 JSON 格式
        #[arg(long)]
        json: bool,
        /// 配置文件路径
        #[arg(long, short)]
        config: Option<PathBuf>,
    },
    /// 列出配置中的分发任务
    Jobs {
        /// 输出 JSON 格式
        #[arg(long)]
        json: bool,
        /// 配置文件路径
        #[arg(long, short)]
        config: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    // 初始化 tracing 日志系统
    // 通过 RUST_LOG 环境变量控制日志级别，默认为 info
    // 例如: RUST_LOG=debug arelay watch
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("alert_relay=info,arelay=info"));

    fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Run(args) => {
            handle_run(args)?;
        }
        Commands::Watch(args) => {
            handle_watch(args).await?;
        }
        Commands::Ingest(args) => {
            handle_ingest(args)?;
        }
        Commands::Notifications {
            limit,
            json,
            config,
        } => {
            let config = RelayConfig::load_or_default(&resolve_config_path(config.as_deref()))?;
            let store = JsonlNotificationStore::new(config.data_dir());
            let notifications = store.recent(limit)?;

            if json {
                println!("{}", serde_json::to_string_pretty(&notifications)?);
            } else if notifications.is_empty() {
                println!("暂无入库通知");
            } else {
                println!("最近 {} 条通知:\n", notifications.len());
                for n in notifications {
                    println!(
                        "  {} | id: {} | provider: {} | {}",
                        n.created_at.format("%Y-%m-%d %H:%M:%S"),
                        n.id,
                        n.provider_config_id,
                        n.notification_type
                    );
                }
            }
        }
        Commands::Audit {
            limit,
            json,
            config,
        } => {
            let config = RelayConfig::load_or_default(&resolve_config_path(config.as_deref()))?;
            let store = JsonlAuditStore::new(config.data_dir());
            let records = store.recent(limit)?;

            if json {
                println!("{}", serde_json::to_string_pretty(&records)?);
            } else if records.is_empty() {
                println!("暂无审计记录");
            } else {
                println!("最近 {} 条审计记录:\n", records.len());
                for r in records {
                    let event = r
                        .event_id
                        .map(|id| id.to_string())
                        .unwrap_or_else(|| "-".to_string());
                    println!(
                        "  {} | job: {} | event: {} | {}",
                        r.timestamp.format("%Y-%m-%d %H:%M:%S"),
                        r.job_id,
                        event,
                        r.outcome
                    );
                }
            }
        }
        Commands::Jobs { json, config } => {
            let config = RelayConfig::load_or_default(&resolve_config_path(config.as_deref()))?;

            if json {
                println!("{}", serde_json::to_string_pretty(&config.jobs)?);
            } else if config.jobs.is_empty() {
                println!("配置中没有分发任务");
            } else {
                println!("共 {} 个分发任务:\n", config.jobs.len());
                for job in &config.jobs {
                    let state = if job.enabled { "启用" } else { "停用" };
                    println!(
                        "  {} | {} | {} | 渠道: {} | {}",
                        job.job_id, job.name, job.frequency, job.channel_key, state
                    );
                }
            }
        }
    }

    Ok(())
}
