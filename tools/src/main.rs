//! instance-runner: headless instance generation for exchange workloads.
//!
//! Usage:
//!   instance-runner convert --rc sweep.json --db instances.db -n 10 --seed 7
//!   instance-runner convert --rc sweep.json --count
//!   instance-runner dump --db instances.db
//!   instance-runner show --db instances.db --instid <uuid>

use anyhow::{anyhow, Result};
use exchange_core::{config::RunConfig, engine::InstanceEngine, store::InstanceStore};
use std::env;
use uuid::Uuid;

#[derive(serde::Serialize)]
struct InstanceSummary {
    inst_id:        String,
    param_id:       String,
    seed:           u64,
    stream:         u64,
    request_groups: usize,
    supply_groups:  usize,
    request_nodes:  usize,
    supply_nodes:   usize,
    arcs:           usize,
}

fn main() -> Result<()> {
    env_logger::init();

    let args: Vec<String> = env::args().collect();
    let command = args.get(1).map(String::as_str).unwrap_or("help");
    let db = flag_value(&args, "--db").unwrap_or("instances.db");

    match command {
        "convert" => convert(&args, db),
        "dump" => dump(db),
        "show" => {
            let inst_id = flag_value(&args, "--instid")
                .ok_or_else(|| anyhow!("show requires --instid <uuid>"))?;
            show(db, inst_id)
        }
        "help" | "--help" | "-h" => {
            print_usage();
            Ok(())
        }
        other => {
            log::warn!("Unknown command: {}", other);
            print_usage();
            Ok(())
        }
    }
}

fn convert(args: &[String], db: &str) -> Result<()> {
    let rc = flag_value(args, "--rc").ok_or_else(|| anyhow!("convert requires --rc <file>"))?;
    let mut config = RunConfig::load(rc)?;
    config.seed = parse_arg(args, "--seed", config.seed);
    config.instances_per_point = parse_arg(args, "-n", config.instances_per_point);

    let points = config.space.count();
    if args.iter().any(|a| a == "--count") {
        println!("{points}");
        return Ok(());
    }

    println!("Exchange instance runner: convert");
    println!("  rc:         {rc}");
    println!("  db:         {db}");
    println!("  seed:       {}", config.seed);
    println!("  points:     {points}");
    println!("  per point:  {}", config.instances_per_point);
    println!();

    let store = InstanceStore::open(db)?;
    store.migrate()?;
    let mut engine = InstanceEngine::new(config.seed, store);
    let summary = engine.convert(&config.space, config.instances_per_point, config.offsets)?;

    println!("=== CONVERSION SUMMARY ===");
    println!("  points:     {}", summary.points);
    println!("  instances:  {}", summary.instance_ids.len());
    println!("  stored:     {}", engine.store().instance_count()?);
    Ok(())
}

fn dump(db: &str) -> Result<()> {
    let store = InstanceStore::open(db)?;
    for id in store.instance_ids()? {
        println!("{}", id.simple());
    }
    Ok(())
}

fn show(db: &str, inst_id: &str) -> Result<()> {
    let store = InstanceStore::open(db)?;
    let inst_id = Uuid::parse_str(inst_id)?;
    let record = store.read_instance(&inst_id)?;
    let p = &record.params;
    let summary = InstanceSummary {
        inst_id:        record.inst_id.to_string(),
        param_id:       record.param_id.to_string(),
        seed:           record.seed,
        stream:         record.stream,
        request_groups: p.u_nodes_per_req.len(),
        supply_groups:  p.v_nodes_per_sup.len(),
        request_nodes:  p.request_node_count(),
        supply_nodes:   p.supply_node_count(),
        arcs:           p.arc_count(),
    };
    println!("{}", serde_json::to_string_pretty(&summary)?);
    for (solver, soln) in store.solutions_for(&inst_id)? {
        println!(
            "  {solver} ({}) | objective: {:.4} | time: {:.3}s",
            soln.version, soln.objective, soln.time
        );
    }
    Ok(())
}

fn print_usage() {
    println!("Usage:");
    println!("  instance-runner convert --rc <file> [--db <path>] [-n <count>] [--seed <u64>] [--count]");
    println!("  instance-runner dump [--db <path>]");
    println!("  instance-runner show [--db <path>] --instid <uuid>");
}

fn flag_value<'a>(args: &'a [String], flag: &str) -> Option<&'a str> {
    args.windows(2)
        .find(|w| w[0] == flag)
        .map(|w| w[1].as_str())
}

fn parse_arg<T: std::str::FromStr + Copy>(args: &[String], flag: &str, default: T) -> T {
    args.windows(2)
        .find(|w| w[0] == flag)
        .and_then(|w| w[1].parse().ok())
        .unwrap_or(default)
}
