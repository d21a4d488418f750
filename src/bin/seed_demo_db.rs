// Dev utility: create (or reset) a demo rule database for the color sequencer.
//
// Usage:
//   cargo run --bin seed_demo_db -- [db_path]
//
// Existing cluster members, transition rules and config entries are replaced.

use anyhow::{anyhow, Context, Result};
use color_sequence_aps::config::{config_keys, ConfigManager};
use color_sequence_aps::db::{default_db_path, ensure_schema, open_sqlite_connection};
use color_sequence_aps::domain::ItemType;
use color_sequence_aps::repository::{ClusterMembershipRepository, TransitionRuleRepository};
use std::sync::{Arc, Mutex};

const MEMBERS: &[(&str, &str)] = &[
    ("BIANCHI", "RAL9010"),
    ("BIANCHI", "RAL9016"),
    ("BIANCHI", "RAL9003"),
    ("GRIGI", "RAL7035"),
    ("GRIGI", "RAL7016"),
    ("GRIGI", "RAL7021"),
    ("BLU", "RAL5015"),
    ("BLU", "RAL5019"),
    ("ROSSI", "RAL3000"),
    ("ROSSI", "RAL3020"),
    ("NERI", "RAL9005"),
    ("NERI", "RAL9011"),
];

// (source, target, weight, required codes, required type)
type RuleSeed = (&'static str, &'static str, i64, &'static [&'static str], Option<ItemType>);

const RULES: &[RuleSeed] = &[
    ("BIANCHI", "GRIGI", 3, &[], None),
    ("BIANCHI", "BLU", 8, &[], None),
    ("BIANCHI", "ROSSI", 10, &[], None),
    ("BIANCHI", "NERI", 15, &[], Some(ItemType::Fixed)),
    ("GRIGI", "BLU", 5, &[], None),
    ("GRIGI", "NERI", 6, &[], None),
    ("GRIGI", "BIANCHI", 20, &[], None),
    ("BLU", "NERI", 4, &[], None),
    ("BLU", "ROSSI", 9, &[], None),
    ("ROSSI", "NERI", 5, &["RAL9005"], None),
    ("ROSSI", "BLU", 12, &[], None),
    ("NERI", "BIANCHI", 9999, &[], None),
    ("NERI", "GRIGI", 30, &[], None),
];

fn main() -> Result<()> {
    color_sequence_aps::logging::init();

    let db_path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| default_db_path().to_string_lossy().to_string());

    if let Some(parent) = std::path::Path::new(&db_path)
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
    {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("无法创建数据库目录: {}", parent.display()))?;
    }

    let conn = open_sqlite_connection(&db_path)
        .with_context(|| format!("无法打开数据库: {}", db_path))?;
    ensure_schema(&conn)?;
    conn.execute_batch(
        "DELETE FROM cluster_member; DELETE FROM transition_rule; DELETE FROM config_kv;",
    )
    .context("清空旧数据失败")?;
    let conn = Arc::new(Mutex::new(conn));

    let clusters = ClusterMembershipRepository::from_connection(conn.clone());
    for (cluster, code) in MEMBERS {
        clusters.add(cluster, code)?;
    }

    let rules = TransitionRuleRepository::from_connection(conn.clone());
    for (source, target, weight, codes, required_type) in RULES {
        let codes: Vec<String> = codes.iter().map(|c| c.to_string()).collect();
        rules.add(source, target, *weight, &codes, *required_type)?;
    }

    let config = ConfigManager::from_connection(conn.clone()).map_err(|e| anyhow!(e))?;
    config
        .set_config_value(config_keys::TOP_N, "3")
        .map_err(|e| anyhow!(e))?;

    println!(
        "db={} clusters={} rules={}",
        db_path,
        clusters.cluster_names()?.len(),
        rules.load_rules()?.len()
    );
    Ok(())
}
