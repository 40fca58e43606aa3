//! Plain-text and JSON rendering of command results for stdout.

use anyhow::Result;
use serde::Serialize;
use std::fmt::Write as _;

use crate::db::import::ImportSummary;
use crate::db::models::CurrentStanding;
use crate::projection::sensitivity::SensitivityCell;
use crate::projection::{BetaPrior, PriorSpec, WinProjection};

pub fn to_json<T: Serialize + ?Sized>(value: &T) -> Result<String> {
    Ok(serde_json::to_string_pretty(value)?)
}

#[derive(Debug, Serialize)]
pub struct PriorSummary {
    pub spec: PriorSpec,
    pub alpha: f64,
    pub beta: f64,
    pub mean: f64,
    pub strength: f64,
}

impl PriorSummary {
    pub fn new(spec: PriorSpec, prior: &BetaPrior) -> Self {
        PriorSummary {
            spec,
            alpha: prior.alpha(),
            beta: prior.beta(),
            mean: prior.mean(),
            strength: prior.strength(),
        }
    }
}

pub fn prior_table(prior: &BetaPrior) -> String {
    format!(
        "alpha     {:.4}\nbeta      {:.4}\nmean      {:.4}\nstrength  {:.2}\n",
        prior.alpha(),
        prior.beta(),
        prior.mean(),
        prior.strength()
    )
}

pub fn projection_table(proj: &WinProjection) -> String {
    let mut out = String::from(" wins   P(>= wins)\n");
    for e in proj.entries() {
        let _ = writeln!(out, "{:>5}   {:>8.2}%", e.wins, e.probability_pct);
    }
    out
}

pub fn teams_table(teams: &[CurrentStanding]) -> String {
    let mut out = String::from("short  record   name\n");
    for t in teams {
        let record = t.record();
        let _ = writeln!(
            out,
            "{:<5}  {:>3}-{:<3}  {}  ({} played)",
            t.short,
            record.wins,
            record.losses,
            t.name,
            record.games()
        );
    }
    out
}

/// Rows are prior means, columns prior strengths.
pub fn sensitivity_table(cells: &[SensitivityCell]) -> String {
    let mut strengths: Vec<f64> = Vec::new();
    for c in cells {
        if !strengths.contains(&c.strength) {
            strengths.push(c.strength);
        }
    }
    let mut out = String::from("  pct \\ N");
    for s in &strengths {
        let _ = write!(out, "{:>8.1}", s);
    }
    out.push('\n');
    for row in cells.chunks(strengths.len().max(1)) {
        let _ = write!(out, "{:>9.3}", row[0].prior_pct);
        for c in row {
            let _ = write!(out, "{:>8.2}", c.probability_pct);
        }
        out.push('\n');
    }
    out
}

pub fn import_summary(summary: &ImportSummary) -> String {
    format!(
        "seasons added: {}\nhistorical rows: {}\ncurrent rows: {}\n",
        summary.seasons_added, summary.historical_rows, summary.current_rows
    )
}
