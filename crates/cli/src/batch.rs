use std::io::Write;
use std::path::Path;

use rayon::prelude::*;

use aircombat_shared::*;
use aircombat_sim::run_match;

use crate::EngagementArgs;

/// One finished episode, reduced to what the tally and CSV need.
struct EpisodeRow {
    seed: u64,
    result: EpisodeResult,
}

/// Outcome counts and mean returns over a batch.
#[derive(Debug, Default, PartialEq)]
struct Tally {
    blue_wins: u32,
    red_wins: u32,
    draws: u32,
    boundary_exits: u32,
    collisions: u32,
    fuel_outs: u32,
    mean_steps: f64,
    mean_return_blue: f64,
    mean_return_red: f64,
}

fn tally(rows: &[EpisodeRow]) -> Tally {
    let mut t = Tally::default();
    if rows.is_empty() {
        return t;
    }
    for row in rows {
        let r = &row.result;
        match r.outcome {
            Outcome::BlueWin => t.blue_wins += 1,
            Outcome::RedWin => t.red_wins += 1,
            Outcome::Draw | Outcome::Undetermined => t.draws += 1,
        }
        match r.reason {
            Some(TerminationReason::BoundaryExit(_)) => t.boundary_exits += 1,
            Some(TerminationReason::Collision) => t.collisions += 1,
            Some(TerminationReason::FuelExhausted) => t.fuel_outs += 1,
            Some(TerminationReason::Advantage(_)) | None => {}
        }
        t.mean_steps += r.steps as f64;
        t.mean_return_blue += r.return_blue;
        t.mean_return_red += r.return_red;
    }
    let n = rows.len() as f64;
    t.mean_steps /= n;
    t.mean_return_blue /= n;
    t.mean_return_red /= n;
    t
}

fn write_csv(path: &Path, rows: &[EpisodeRow]) -> std::io::Result<()> {
    let mut file = std::fs::File::create(path)?;
    writeln!(
        file,
        "seed,outcome,reason,steps,final_advantage,return_blue,return_red"
    )?;
    for row in rows {
        let r = &row.result;
        let reason = match r.reason {
            Some(reason) => format!("{:?}", reason),
            None => String::new(),
        };
        writeln!(
            file,
            "{},{:?},{},{},{},{:.6},{:.6}",
            row.seed, r.outcome, reason, r.steps, r.final_advantage, r.return_blue, r.return_red,
        )?;
    }
    Ok(())
}

pub fn cmd_batch(
    args: &EngagementArgs,
    episodes: u32,
    seed_start: u64,
    csv: Option<&Path>,
) -> Result<(), String> {
    // Resolve once up front so a bad config fails before any work starts.
    let base = args.resolve(seed_start)?;

    println!(
        "Batch: {} episodes, {} (blue) vs {} (red), model={}, scenario={:?}, seeds {}..{}",
        episodes,
        args.blue,
        args.red,
        base.model,
        base.scenario.mode,
        seed_start,
        seed_start + episodes as u64
    );

    let rows: Vec<EpisodeRow> = (0..episodes as u64)
        .into_par_iter()
        .map(|i| {
            let seed = seed_start + i;
            let config = EngagementConfig {
                seed,
                ..base.clone()
            };
            run_match(&config, args.blue, args.red).map(|replay| EpisodeRow {
                seed,
                result: replay.result,
            })
        })
        .collect::<Result<_, SimError>>()
        .map_err(|e| e.to_string())?;

    let t = tally(&rows);
    let n = rows.len().max(1) as f64;
    println!();
    println!("=== Batch Result ===");
    println!("{:<16} {:>8} {:>8}", "outcome", "count", "rate");
    println!("{:-<16} {:-<8} {:-<8}", "", "", "");
    for (label, count) in [
        ("blue wins", t.blue_wins),
        ("red wins", t.red_wins),
        ("draws", t.draws),
        ("  fuel", t.fuel_outs),
        ("  boundary", t.boundary_exits),
        ("  collision", t.collisions),
    ] {
        println!("{:<16} {:>8} {:>7.1}%", label, count, 100.0 * count as f64 / n);
    }
    println!();
    println!("Mean steps:       {:.1}", t.mean_steps);
    println!("Mean return blue: {:+.4}", t.mean_return_blue);
    println!("Mean return red:  {:+.4}", t.mean_return_red);

    if let Some(path) = csv {
        write_csv(path, &rows).map_err(|e| format!("failed to write CSV: {}", e))?;
        println!("\nCSV written to {}", path.display());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(seed: u64, outcome: Outcome, reason: TerminationReason, steps: u32) -> EpisodeRow {
        EpisodeRow {
            seed,
            result: EpisodeResult {
                outcome,
                reason: Some(reason),
                steps,
                final_advantage: 0,
                return_blue: 1.0,
                return_red: -1.0,
            },
        }
    }

    #[test]
    fn test_tally_counts_outcomes_and_reasons() {
        let rows = vec![
            row(0, Outcome::BlueWin, TerminationReason::Advantage(Side::Blue), 10),
            row(1, Outcome::Draw, TerminationReason::FuelExhausted, 100),
            row(2, Outcome::Draw, TerminationReason::BoundaryExit(Side::Red), 40),
            row(3, Outcome::RedWin, TerminationReason::Advantage(Side::Red), 50),
        ];
        let t = tally(&rows);
        assert_eq!(t.blue_wins, 1);
        assert_eq!(t.red_wins, 1);
        assert_eq!(t.draws, 2);
        assert_eq!(t.fuel_outs, 1);
        assert_eq!(t.boundary_exits, 1);
        assert_eq!(t.collisions, 0);
        assert_eq!(t.mean_steps, 50.0);
        assert_eq!(t.mean_return_blue, 1.0);
    }

    #[test]
    fn test_tally_empty() {
        assert_eq!(tally(&[]), Tally::default());
    }
}
