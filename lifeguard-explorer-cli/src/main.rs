//! Lifeguard Explorer CLI Tool
//!
//! Extracts the records connected to one seed record from a JSON snapshot and prints the
//! insert statements that recreate them, ordered so that referenced records come first.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::Colorize;
use lifeguard_explorer::snapshot::TableSchema;
use lifeguard_explorer::{EntityType, Exploration, Explorer, ExplorerConfig, Snapshot};
use std::fs;
use std::path::PathBuf;
use std::process;
use std::time::Duration;

#[derive(Parser)]
#[command(name = "lifeguard-explore")]
#[command(about = "Extract a record subgraph as dependency-ordered inserts")]
#[command(version = "0.1.0")]
struct Cli {
    /// Snapshot file holding table schemas and rows
    #[arg(long, env = "LIFEGUARD_EXPLORER_SNAPSHOT")]
    snapshot: PathBuf,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,

    /// Quiet output (errors only)
    #[arg(short, long)]
    quiet: bool,

    /// Abort on any resolution error or unresolved insert order
    #[arg(long, conflicts_with = "lenient")]
    strict: bool,

    /// Skip entries that fail to resolve and report an unresolved insert order
    #[arg(long)]
    lenient: bool,

    /// Abandon the run after this many seconds
    #[arg(long)]
    timeout: Option<u64>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Write the insert script for everything reachable from a seed record
    Extract {
        /// Seed table
        table: String,
        /// Seed primary key
        id: String,
        /// Write the script to a file instead of stdout
        #[arg(long, short)]
        output: Option<PathBuf>,
    },

    /// Show the insert order and dependency graph without writing statements
    Plan {
        /// Seed table
        table: String,
        /// Seed primary key
        id: String,
        /// Print the plan as JSON
        #[arg(long)]
        json: bool,
    },

    /// List tables and their relations
    Schema,
}

fn main() {
    dotenv::dotenv().ok();
    let cli = Cli::parse();

    // Initialize logging
    let level = if cli.quiet {
        "error"
    } else if cli.verbose {
        "debug"
    } else {
        "info"
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();

    let result = run(&cli);
    match result {
        Ok(()) => {
            if !cli.quiet {
                eprintln!("{}", "✅ Success".green());
            }
            process::exit(0);
        }
        Err(e) => {
            eprintln!("{} {:#}", "❌ Error:".red(), e);
            process::exit(1);
        }
    }
}

fn run(cli: &Cli) -> Result<()> {
    let snapshot = Snapshot::from_path(&cli.snapshot)
        .with_context(|| format!("could not load snapshot {}", cli.snapshot.display()))?;

    match &cli.command {
        Commands::Extract { table, id, output } => {
            let explorer = Explorer::new(&snapshot, explorer_config(cli)?);
            handle_extract(&explorer, table, id, output.as_ref(), cli.quiet)
        }
        Commands::Plan { table, id, json } => {
            let explorer = Explorer::new(&snapshot, explorer_config(cli)?);
            handle_plan(&explorer, table, id, *json)
        }
        Commands::Schema => handle_schema(&snapshot),
    }
}

/// File/env configuration overridden by command-line flags
fn explorer_config(cli: &Cli) -> Result<ExplorerConfig> {
    let mut config = ExplorerConfig::load().context("invalid explorer configuration")?;
    if cli.strict {
        config = ExplorerConfig {
            timeout_seconds: config.timeout_seconds,
            ..ExplorerConfig::strict()
        };
    } else if cli.lenient {
        config = ExplorerConfig {
            timeout_seconds: config.timeout_seconds,
            ..ExplorerConfig::lenient()
        };
    }
    if let Some(seconds) = cli.timeout {
        config = config.with_timeout(Duration::from_secs(seconds));
    }
    log::debug!("Explorer configuration: {:?}", config);
    Ok(config)
}

fn handle_extract(
    explorer: &Explorer<&Snapshot>,
    table: &str,
    id: &str,
    output: Option<&PathBuf>,
    quiet: bool,
) -> Result<()> {
    let result = explorer.explore(table, id)?;
    let script = result.to_sql();

    match output {
        Some(path) => {
            fs::write(path, &script).with_context(|| format!("could not write {}", path.display()))?;
            if !quiet {
                eprintln!("📝 Wrote {}", path.display());
            }
        }
        None => print!("{}", script),
    }

    if !quiet {
        eprintln!("{}", summary(&result));
    }
    warn_incomplete(&result);
    Ok(())
}

fn handle_plan(explorer: &Explorer<&Snapshot>, table: &str, id: &str, json: bool) -> Result<()> {
    let result = explorer.explore(table, id)?;
    if json {
        println!("{}", serde_json::to_string_pretty(&plan_json(&result))?);
        return Ok(());
    }

    println!("\n📋 Insert plan for {}\n", result.seed);
    for (i, entity_type) in result.insert_order.iter().enumerate() {
        let count = result.inserts.get(entity_type).len();
        let deps = result.dependencies.dependencies_of(entity_type).unwrap_or_default();
        if deps.is_empty() {
            println!("  {}. {} ({} insert(s))", i + 1, entity_type, count);
        } else {
            println!("  {}. {} ({} insert(s)) after {}", i + 1, entity_type, count, join(deps));
        }
    }

    if !result.residual.is_empty() {
        println!("\n{}", "⚠️  Unresolved:".yellow());
        for (entity_type, deps) in result.residual.iter() {
            println!("  {} -> {}", entity_type, join(deps));
        }
    }

    println!("\n{}", summary(&result));
    warn_incomplete(&result);
    Ok(())
}

fn handle_schema(snapshot: &Snapshot) -> Result<()> {
    println!("\n🗂  Tables\n");
    for (entity_type, table) in snapshot.tables() {
        print_table(entity_type, table, snapshot.rows(entity_type).len());
    }
    Ok(())
}

fn print_table(entity_type: &EntityType, table: &TableSchema, rows: usize) {
    println!("{} (primary key {}, {} row(s))", entity_type.as_str().bold(), table.primary_key, rows);
    for relation in &table.relations {
        let target = relation
            .target
            .as_ref()
            .map_or_else(|| "<polymorphic>".to_string(), ToString::to_string);
        println!("  {} {} -> {}", relation.kind, relation.name, target);
    }
}

fn summary(result: &Exploration) -> String {
    format!(
        "📈 Summary: {} record(s) from {} type(s), {} skipped, {:.3}s",
        result.visited.len(),
        result.insert_order.len() + result.residual.len(),
        result.skipped.len(),
        result.elapsed.as_secs_f64()
    )
}

fn warn_incomplete(result: &Exploration) {
    for skipped in &result.skipped {
        let what = skipped
            .entity
            .as_ref()
            .map_or_else(|| skipped.entity_type.to_string(), ToString::to_string);
        log::warn!("Skipped {}: {}", what, skipped.reason);
    }
    if !result.residual.is_empty() {
        log::warn!(
            "Insert order is incomplete; statements for {} are appended unordered",
            join(result.residual.types())
        );
    }
}

fn join(types: &[EntityType]) -> String {
    types.iter().map(EntityType::as_str).collect::<Vec<_>>().join(", ")
}

fn plan_json(result: &Exploration) -> serde_json::Value {
    let types = |types: &[EntityType]| types.iter().map(|t| t.as_str().to_string()).collect::<Vec<_>>();
    let graph = |graph: &lifeguard_explorer::DependencyGraph| {
        graph
            .iter()
            .map(|(entity_type, deps)| (entity_type.to_string(), serde_json::json!(types(deps))))
            .collect::<serde_json::Map<_, _>>()
    };

    serde_json::json!({
        "seed": result.seed.to_string(),
        "insert_order": types(&result.insert_order),
        "counts": result
            .insert_order
            .iter()
            .chain(result.residual.types())
            .map(|t| (t.to_string(), serde_json::json!(result.inserts.get(t).len())))
            .collect::<serde_json::Map<_, _>>(),
        "dependencies": graph(&result.dependencies),
        "residual": graph(&result.residual),
        "skipped": result
            .skipped
            .iter()
            .map(|s| serde_json::json!({"type": s.entity_type.to_string(), "reason": s.reason}))
            .collect::<Vec<_>>(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn snapshot() -> Snapshot {
        Snapshot::from_json_str(
            r#"{
                "tables": {
                    "customers": {},
                    "orders": {"relations": [
                        {"name": "customer", "kind": "belongs_to", "target": "customers", "foreign_key": "customer_id"}
                    ]}
                },
                "rows": {"customers": [{"id": 1}], "orders": [{"id": 2, "customer_id": 1}]}
            }"#,
        )
        .unwrap()
    }

    #[test]
    fn test_cli_flags_parse() {
        let cli = Cli::try_parse_from([
            "lifeguard-explore",
            "--snapshot",
            "shop.json",
            "--lenient",
            "--timeout",
            "5",
            "extract",
            "orders",
            "1",
            "-o",
            "out.sql",
        ])
        .unwrap();
        assert!(cli.lenient);
        assert_eq!(cli.timeout, Some(5));
        assert!(matches!(cli.command, Commands::Extract { ref output, .. } if output.is_some()));
    }

    #[test]
    fn test_strict_conflicts_with_lenient() {
        let parsed = Cli::try_parse_from([
            "lifeguard-explore",
            "--snapshot",
            "shop.json",
            "--strict",
            "--lenient",
            "schema",
        ]);
        assert!(parsed.is_err());
    }

    #[test]
    fn test_plan_json_lists_order_and_counts() {
        let snapshot = snapshot();
        let explorer = Explorer::new(&snapshot, ExplorerConfig::default());
        let result = explorer.explore("orders", "2").unwrap();
        let plan = plan_json(&result);

        assert_eq!(plan["seed"], "orders/2");
        assert_eq!(plan["insert_order"], serde_json::json!(["customers", "orders"]));
        assert_eq!(plan["counts"]["orders"], 1);
        assert_eq!(plan["counts"]["customers"], 0);
        assert_eq!(plan["dependencies"]["orders"], serde_json::json!(["customers"]));
    }

    #[test]
    fn test_extract_writes_script_to_file() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("seed.sql");
        let mut file = tempfile::NamedTempFile::new_in(dir.path()).unwrap();
        write!(
            file,
            r#"{{"tables": {{"orders": {{}}}}, "rows": {{"orders": [{{"id": 5, "total": 1.5}}]}}}}"#
        )
        .unwrap();

        let snapshot = Snapshot::from_path(file.path()).unwrap();
        let explorer = Explorer::new(&snapshot, ExplorerConfig::default());
        handle_extract(&explorer, "orders", "5", Some(&out), true).unwrap();

        let script = fs::read_to_string(&out).unwrap();
        assert_eq!(script, "INSERT INTO \"orders\" (\"id\", \"total\") VALUES (5, 1.5);\n");
    }
}
