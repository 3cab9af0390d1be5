use anyhow::Result;
use colored::Colorize;
use relic_engine::{RelicType, Tier};
use serde::Serialize;
use std::io::Write;
use std::time::Duration;

use super::{SimulationRecord, SimulationSummary};

#[derive(Serialize)]
struct JsonReport<'a> {
    summary: &'a SimulationSummary,
    runs: &'a [SimulationRecord],
}

fn relic_row(record: &SimulationRecord, relic_type: RelicType) -> String {
    Tier::RELIC_TIERS
        .iter()
        .map(|tier| {
            record
                .relics_earned
                .get(&relic_type)
                .and_then(|tiers| tiers.get(tier))
                .copied()
                .unwrap_or(0)
                .to_string()
        })
        .collect::<Vec<_>>()
        .join(" / ")
}

fn failure_line(record: &SimulationRecord) -> String {
    if record.failures.is_empty() {
        return "none".to_string();
    }
    record
        .failures
        .iter()
        .map(|(reason, count)| format!("{reason} x{count}"))
        .collect::<Vec<_>>()
        .join(", ")
}

fn raised_skills(record: &SimulationRecord) -> String {
    let raised: Vec<String> = record
        .skill_tiers
        .iter()
        .filter(|(_, tier)| **tier > Tier::Locked)
        .map(|(skill, tier)| format!("{skill} {tier}"))
        .collect();
    if raised.is_empty() {
        "none".to_string()
    } else {
        raised.join(", ")
    }
}

pub fn generate_console_report(
    out: &mut dyn Write,
    records: &[SimulationRecord],
    summary: &SimulationSummary,
    total_duration: Duration,
) -> Result<()> {
    writeln!(out)?;
    writeln!(out, "{}", "📊 Relic Simulation Summary".bright_cyan().bold())?;
    writeln!(out, "{}", "===========================".cyan())?;
    writeln!(out, "Runs: {}", summary.runs)?;
    writeln!(out, "Mean relics earned: {:.1}", summary.mean_relics)?;
    writeln!(out, "Mean unlocks committed: {:.1}", summary.mean_unlocks)?;
    writeln!(out, "Total time: {total_duration:?}")?;
    writeln!(out)?;

    for record in records {
        writeln!(
            out,
            "{} seed {} ({} events, {} ignored)",
            "🎲".bold(),
            record.seed.to_string().bold(),
            record.events,
            record.ignored_signals
        )?;
        writeln!(out, "   Relics (Apprentice → Grandmaster):")?;
        for relic_type in RelicType::ALL {
            writeln!(
                out,
                "     {:<12} {}",
                relic_type.display_name(),
                relic_row(record, relic_type)
            )?;
        }
        writeln!(
            out,
            "   Unlocks: {}",
            record.unlocks.len().to_string().green()
        )?;
        writeln!(out, "   Unspent relics: {}", record.relics_unspent)?;
        writeln!(out, "   Failures: {}", failure_line(record).yellow())?;
        writeln!(out, "   Skills: {}", raised_skills(record))?;
        let gear: Vec<String> = record
            .gear_tiers
            .iter()
            .map(|(style, tier)| format!("{style:?} {tier}"))
            .collect();
        writeln!(out, "   Gear: {}", gear.join(", "))?;
        writeln!(out)?;
    }

    if !summary.failures.is_empty() {
        writeln!(out, "{}", "⚠️  Activation failures".bright_yellow().bold())?;
        writeln!(out, "{}", "======================".yellow())?;
        for (reason, count) in &summary.failures {
            writeln!(out, "  • {reason}: {count}")?;
        }
    }
    Ok(())
}

pub fn generate_json_report(
    out: &mut dyn Write,
    records: &[SimulationRecord],
    summary: &SimulationSummary,
) -> Result<()> {
    let report = JsonReport {
        summary,
        runs: records,
    };
    serde_json::to_writer_pretty(&mut *out, &report)?;
    writeln!(out)?;
    Ok(())
}

pub fn generate_markdown_report(
    out: &mut dyn Write,
    records: &[SimulationRecord],
    summary: &SimulationSummary,
) -> Result<()> {
    writeln!(out, "# Relic Simulation Results\n")?;
    writeln!(out, "## Summary\n")?;
    writeln!(out, "- **Runs**: {}", summary.runs)?;
    writeln!(out, "- **Mean relics earned**: {:.1}", summary.mean_relics)?;
    writeln!(out, "- **Mean unlocks committed**: {:.1}\n", summary.mean_unlocks)?;

    writeln!(out, "## Runs\n")?;
    writeln!(
        out,
        "| Seed | Events | Skilling | Combat | Exploration | Unlocks | Unspent | Failures |"
    )?;
    writeln!(out, "|---|---|---|---|---|---|---|---|")?;
    for record in records {
        writeln!(
            out,
            "| {} | {} | {} | {} | {} | {} | {} | {} |",
            record.seed,
            record.events,
            relic_row(record, RelicType::Skilling),
            relic_row(record, RelicType::Combat),
            relic_row(record, RelicType::Exploration),
            record.unlocks.len(),
            record.relics_unspent,
            failure_line(record)
        )?;
    }

    for record in records {
        writeln!(out, "\n### Seed {}\n", record.seed)?;
        writeln!(out, "- **Skills**: {}", raised_skills(record))?;
        if record.unlocks.is_empty() {
            writeln!(out, "- **Unlocks**: none")?;
        } else {
            writeln!(out, "- **Unlocks**:")?;
            for unlock in &record.unlocks {
                writeln!(
                    out,
                    "  - event {}: `{}` ({} {})",
                    unlock.event, unlock.id, unlock.relic_type, unlock.tier
                )?;
            }
        }
    }
    Ok(())
}
