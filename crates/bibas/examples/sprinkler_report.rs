//! BIBAS report for the sprinkler network.
//!
//! Run with: cargo run -p bibas --example sprinkler_report
//!
//! Set `RUST_LOG=bibas=debug` to see every computed score.
//!
//! This example prints:
//! - Sources ranked by their impact on WetGrass, observed and forced
//! - The full intervention matrix
//! - Scores along each edge of the DAG
//! - The matrix as JSON, ready for a plotting front end

use bibas::{
    rank_sources, score_matrix, BibasError, MatrixBuilder, MatrixConfig, Mode, RankConfig,
    ScoreConfig,
};
use bibas_prob::{sprinkler_network, VariableElimination};
use tracing_subscriber::EnvFilter;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_target(false)
        .init();

    println!("=== BIBAS: Sprinkler Network ===\n");

    let net = sprinkler_network();

    // -------------------------------------------------------------------------
    // 1. Ranking sources for one target
    // -------------------------------------------------------------------------
    println!("1. Impact on WetGrass");
    println!("---------------------");
    for mode in [Mode::Observe, Mode::Intervene] {
        let ranking = rank_sources(&net, "WetGrass", &RankConfig::new(mode))?;
        println!("  mode = {mode}");
        for (entry, (_, relative)) in ranking.entries.iter().zip(ranking.relative_impacts()) {
            let relative = relative.map_or_else(|| "-".to_string(), |r| format!("{r:.2}"));
            let score = entry.score.to_string();
            println!("    {:<10} {score:>7}  (relative {relative})", entry.source);
        }
    }
    println!();

    // -------------------------------------------------------------------------
    // 2. Full matrix
    // -------------------------------------------------------------------------
    println!("2. Intervention matrix (row = source, column = target)");
    println!("------------------------------------------------------");
    let matrix = score_matrix(&net, None, &MatrixConfig::new(Mode::Intervene))?;
    print!("  {:<10}", "");
    for node in matrix.nodes() {
        print!("{node:>10}");
    }
    println!();
    for (source, row) in matrix.nodes().iter().zip(matrix.grid()) {
        print!("  {source:<10}");
        for cell in row {
            match cell {
                Some(v) => print!("{v:>10.2}"),
                None => print!("{:>10}", "·"),
            }
        }
        println!();
    }
    println!();

    // -------------------------------------------------------------------------
    // 3. Edge scores
    // -------------------------------------------------------------------------
    println!("3. Observed influence along each edge");
    println!("-------------------------------------");
    let engine = VariableElimination::new(&net);
    for edge in MatrixBuilder::new(&engine).edge_scores(&ScoreConfig::default())? {
        println!("  {:>9} → {:<9} {}", edge.source, edge.target, edge.score);
    }
    println!();

    // -------------------------------------------------------------------------
    // 4. Contract violations are errors, not scores
    // -------------------------------------------------------------------------
    println!("4. Invalid requests");
    println!("-------------------");
    match rank_sources(&net, "Fog", &RankConfig::default()) {
        Err(err @ BibasError::InvalidTarget { .. }) => println!("  {err}"),
        other => println!("  unexpected: {other:?}"),
    }
    println!();

    // -------------------------------------------------------------------------
    // 5. JSON for presentation
    // -------------------------------------------------------------------------
    println!("5. Matrix as JSON");
    println!("-----------------");
    println!("{}", serde_json::to_string_pretty(&matrix)?);

    Ok(())
}
