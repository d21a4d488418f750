// ==========================================
// 喷涂线颜色排序系统 - 命令行入口
// ==========================================
// 用法:
//   color-sequence-aps <items.csv|xlsx> [--db PATH] [--start CLUSTER]
//                      [--first CODE] [--priority CODE,CODE]
//                      [--locale en|zh-CN] [--log-json]
// 输出: stdout 为 JSON（导入摘要 + 优化结果），日志走 stderr
// ==========================================

use anyhow::{anyhow, Context, Result};
use clap::Parser;
use color_sequence_aps::api::{
    ColorItemDto, LockedOptimizeRequest, OptimizeRequest, SequencingApi,
};
use color_sequence_aps::config::ConfigManager;
use color_sequence_aps::db::{default_db_path, ensure_schema, open_sqlite_connection};
use color_sequence_aps::i18n::{set_locale, t_with_args};
use color_sequence_aps::importer::ItemImporter;
use color_sequence_aps::repository::{ClusterMembershipRepository, TransitionRuleRepository};
use color_sequence_aps::{logging, APP_NAME, VERSION};
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

/// 喷涂线颜色排序: 导入当日颜色清单并输出最优换色序列
#[derive(Parser, Debug)]
#[command(name = "color-sequence-aps")]
#[command(version)]
#[command(about = "喷涂线颜色排序系统 - 换色组路径最优化")]
struct CliArgs {
    /// 当日颜色清单 (.csv / .xlsx / .xls)
    items_path: PathBuf,

    /// 规则数据库路径（默认读取 COLOR_SEQUENCE_APS_DB_PATH 或用户数据目录）
    #[arg(long = "db")]
    db_path: Option<PathBuf>,

    /// 强制起始换色组
    #[arg(long)]
    start: Option<String>,

    /// 强制首个产品代码
    #[arg(long)]
    first: Option<String>,

    /// 优先补货代码（逗号分隔）
    #[arg(long, value_delimiter = ',')]
    priority: Vec<String>,

    /// 诊断信息语言 (zh-CN / en)
    #[arg(long)]
    locale: Option<String>,

    /// 以 JSON 格式输出日志
    #[arg(long)]
    log_json: bool,
}

impl CliArgs {
    fn priority_codes(&self) -> Option<Vec<String>> {
        let codes: Vec<String> = self
            .priority
            .iter()
            .map(|c| c.trim().to_string())
            .filter(|c| !c.is_empty())
            .collect();
        (!codes.is_empty()).then_some(codes)
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = CliArgs::parse();

    if cli.log_json {
        logging::init_json();
    } else {
        logging::init();
    }
    if let Some(locale) = &cli.locale {
        set_locale(locale);
    }

    tracing::info!(version = VERSION, "{} 启动", APP_NAME);

    // 数据库
    let db_path = cli.db_path.clone().unwrap_or_else(default_db_path);
    if let Some(parent) = db_path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("无法创建数据库目录: {}", parent.display()))?;
    }
    let db_path_str = db_path.to_string_lossy().to_string();
    tracing::info!(db = %db_path_str, "使用数据库");

    let conn = open_sqlite_connection(&db_path_str)
        .with_context(|| format!("无法打开数据库: {}", db_path_str))?;
    ensure_schema(&conn).context("数据库建表失败")?;
    let conn = Arc::new(Mutex::new(conn));

    let cluster_repo = Arc::new(ClusterMembershipRepository::from_connection(conn.clone()));
    let rule_repo = Arc::new(TransitionRuleRepository::from_connection(conn.clone()));
    let config_manager =
        Arc::new(ConfigManager::from_connection(conn.clone()).map_err(|e| anyhow!(e))?);
    let api = SequencingApi::new(cluster_repo, rule_repo, config_manager);

    // 导入当日清单
    let report = ItemImporter
        .import_file(&cli.items_path)
        .with_context(|| format!("颜色清单导入失败: {}", cli.items_path.display()))?;
    let summary = t_with_args(
        "import.summary",
        &[
            ("rows", &report.total_rows.to_string()),
            ("items", &report.items.len().to_string()),
            ("rejected", &report.rejected_rows().to_string()),
        ],
    );
    tracing::info!("{}", summary);

    let dtos: Vec<ColorItemDto> = report.items.iter().map(ColorItemDto::from).collect();
    let priority_codes = cli.priority_codes();

    // 清单中含锁定项时走锁定重排
    let result = if report.items.iter().any(|i| i.locked) {
        if cli.start.is_some() || cli.first.is_some() {
            tracing::warn!("存在锁定项，--start / --first 不生效（起点由最后一个锁定项决定）");
        }
        api.optimize_locked(&LockedOptimizeRequest {
            items: dtos,
            priority_codes,
        })
        .await
    } else {
        api.optimize(&OptimizeRequest {
            items: dtos,
            start_cluster: cli.start.clone(),
            first_item: cli.first.clone(),
            priority_codes,
        })
        .await
    };
    let result = result.context("排序失败")?;

    let output = serde_json::json!({
        "import": {
            "summary": summary,
            "total_rows": report.total_rows,
            "rejected_rows": report.rejected_rows(),
            "issues": report.issues,
        },
        "result": result,
    });
    println!("{}", serde_json::to_string_pretty(&output)?);

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_args_full() {
        let cli = CliArgs::try_parse_from([
            "color-sequence-aps",
            "day.csv",
            "--db",
            "/tmp/rules.db",
            "--start",
            "NERI",
            "--first",
            "RAL9005",
            "--priority",
            "RAL5019, RAL5015,",
            "--locale",
            "en",
        ])
        .unwrap();

        assert_eq!(cli.items_path, PathBuf::from("day.csv"));
        assert_eq!(cli.db_path, Some(PathBuf::from("/tmp/rules.db")));
        assert_eq!(cli.start.as_deref(), Some("NERI"));
        assert_eq!(cli.first.as_deref(), Some("RAL9005"));
        assert_eq!(
            cli.priority_codes(),
            Some(vec!["RAL5019".to_string(), "RAL5015".to_string()])
        );
        assert_eq!(cli.locale.as_deref(), Some("en"));
        assert!(!cli.log_json);
    }

    #[test]
    fn test_parse_args_errors() {
        assert!(CliArgs::try_parse_from(["color-sequence-aps"]).is_err());
        assert!(CliArgs::try_parse_from(["color-sequence-aps", "day.csv", "--start"]).is_err());
        assert!(CliArgs::try_parse_from(["color-sequence-aps", "day.csv", "--bogus"]).is_err());
        assert!(CliArgs::try_parse_from(["color-sequence-aps", "a.csv", "b.csv"]).is_err());

        let cli = CliArgs::try_parse_from(["color-sequence-aps", "day.csv", "--log-json"]).unwrap();
        assert!(cli.log_json);
        assert_eq!(cli.priority_codes(), None);
    }
}
