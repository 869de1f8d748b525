//! Renders a pipeline [`Outcome`] for people (text) or machines (JSON).
//!
//! Nothing here computes metrics; every number comes from the report.

pub mod widgets;

use std::fmt::Write as _;

use crate::aggregate::AggregateSummary;
use crate::aggregate::grade::grade;
use crate::config::Settings;
use crate::error::Result;
use crate::loader::RowIssue;
use crate::metrics::{DerivedRecord, RiskTier};
use crate::pipeline::{Outcome, Report};
use widgets::{Table, Tone, bar, paint, thousands};

/// Presentation knobs.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderOptions {
    pub color: bool,
    pub goal: f64,
    pub bar_width: usize,
    /// Registry rows shown in text output; JSON always carries all of them.
    pub registry_limit: usize,
}

impl Default for RenderOptions {
    fn default() -> Self {
        RenderOptions {
            color: false,
            goal: 0.6,
            bar_width: 30,
            registry_limit: 25,
        }
    }
}

impl RenderOptions {
    pub fn from_settings(settings: &Settings) -> Self {
        RenderOptions {
            goal: settings.utilization_goal,
            ..RenderOptions::default()
        }
    }

    pub fn with_color(mut self, color: bool) -> Self {
        self.color = color;
        self
    }
}

/// Pretty-printed JSON of the whole outcome.
pub fn render_json(outcome: &Outcome) -> Result<String> {
    Ok(serde_json::to_string_pretty(outcome)?)
}

/// Multi-section text report, or the empty-state message.
pub fn render_text(outcome: &Outcome, opts: &RenderOptions) -> String {
    match outcome {
        Outcome::Ready(report) => render_report(report, opts),
        Outcome::Empty { reason, issues } => {
            let mut out = String::new();
            let _ = writeln!(out, "{}", paint("Fleet Telematics Report", Tone::Neutral, opts.color));
            let _ = writeln!(out);
            let _ = writeln!(out, "  No data to display: {reason}.");
            let _ = writeln!(out, "  Load a telematics export or widen the filters to begin.");
            push_issues(&mut out, issues, opts);
            out
        }
    }
}

fn heading(out: &mut String, title: &str, opts: &RenderOptions) {
    let _ = writeln!(out);
    let _ = writeln!(out, "{}", paint(&title.to_uppercase(), Tone::Neutral, opts.color));
}

fn render_report(report: &Report, opts: &RenderOptions) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "{}",
        paint("Fleet Telematics Report", Tone::Neutral, opts.color)
    );
    let _ = writeln!(out, "  Viewing: {}", report.view);

    push_cards(&mut out, report, opts);
    push_groups(&mut out, report, opts);
    push_location_make(&mut out, report, opts);
    push_composition(&mut out, report, opts);
    push_workhorses(&mut out, &report.workhorses, opts);
    push_markers(&mut out, report, opts);
    push_trend(&mut out, &report.trend, opts);
    push_registry(&mut out, report, opts);
    push_plan(&mut out, report, opts);
    push_issues(&mut out, &report.issues, opts);
    out
}

fn push_cards(out: &mut String, report: &Report, opts: &RenderOptions) {
    let s = &report.summary;
    let currency = &report.currency;
    let on_goal = s.average_utilization >= opts.goal;
    let goal_tone = if on_goal { Tone::Good } else { Tone::Bad };
    let goal_mark = if on_goal { "on goal" } else { "below goal" };

    heading(out, "Summary", opts);
    let cards = [
        (
            "Total Distance",
            paint(&format!("{} km", thousands(s.total_distance, 0)), Tone::Neutral, opts.color),
        ),
        (
            "Utilization Rate",
            format!(
                "{:.1}% ({} / {} assets active)",
                s.utilization_rate, s.active_assets, s.unique_assets
            ),
        ),
        (
            "Avg Utilization",
            paint(
                &format!(
                    "{:.2} (grade {}, goal {:.2}, {goal_mark})",
                    s.average_utilization,
                    grade(s.average_utilization, opts.goal),
                    opts.goal
                ),
                goal_tone,
                opts.color,
            ),
        ),
        ("Ghost Records", paint(&s.ghost_records.to_string(), Tone::Bad, opts.color)),
        ("Est. Cost", format!("{currency} {}", thousands(s.total_cost, 0))),
        (
            "Risk Tiers",
            RiskTier::ALL
                .iter()
                .map(|t| format!("{} {}", t.as_str(), s.risk_tier_counts.get(*t)))
                .collect::<Vec<_>>()
                .join(" | "),
        ),
        ("Anomalies", s.anomalies.to_string()),
        ("Records", s.records.to_string()),
    ];
    for (label, value) in cards {
        let _ = writeln!(out, "  {label:<18}{value}");
    }
}

fn push_groups(out: &mut String, report: &Report, opts: &RenderOptions) {
    heading(out, &format!("By {}", report.group_by), opts);

    let max = report
        .groups
        .iter()
        .map(|g| g.total_distance)
        .fold(0.0, f64::max);
    let mut table = Table::new(&[
        "Group", ">Records", ">Assets", ">Km", ">Cost", ">Util", "Grade", ">Low", ">Med",
        ">High", "",
    ]);
    for g in &report.groups {
        table.push_toned(
            vec![
                g.group_key.clone(),
                g.records.to_string(),
                g.assets.to_string(),
                thousands(g.total_distance, 0),
                thousands(g.total_cost, 0),
                format!("{:.2}", g.average_utilization),
                grade(g.average_utilization, opts.goal).to_string(),
                g.risk_tier_counts.low.to_string(),
                g.risk_tier_counts.medium.to_string(),
                g.risk_tier_counts.high.to_string(),
                bar(g.total_distance, max, opts.bar_width),
            ],
            utilization_tone(g.average_utilization, opts.goal),
        );
    }
    let _ = writeln!(out, "{}", table.render(opts.color));
}

fn utilization_tone(utilization: f64, goal: f64) -> Tone {
    if utilization >= goal {
        Tone::Good
    } else {
        Tone::Plain
    }
}

fn push_location_make(out: &mut String, report: &Report, opts: &RenderOptions) {
    heading(out, "Mileage by location & make", opts);
    let max = report
        .location_make
        .iter()
        .map(|e| e.total_distance)
        .fold(0.0, f64::max);
    let mut table = Table::new(&["Location", "Make", ">Km", ""]);
    for e in &report.location_make {
        table.push(vec![
            e.location.clone(),
            e.make.clone(),
            thousands(e.total_distance, 0),
            bar(e.total_distance, max, opts.bar_width),
        ]);
    }
    let _ = writeln!(out, "{}", table.render(opts.color));
}

fn push_composition(out: &mut String, report: &Report, opts: &RenderOptions) {
    heading(out, "Fleet composition", opts);
    let mut table = Table::new(&["Make", "Role", "Band", ">Count"]);
    for e in &report.composition {
        table.push(vec![
            e.make.clone(),
            e.role.clone(),
            e.band.label().to_string(),
            e.count.to_string(),
        ]);
    }
    let _ = writeln!(out, "{}", table.render(opts.color));
}

fn push_workhorses(out: &mut String, workhorses: &[DerivedRecord], opts: &RenderOptions) {
    heading(out, "Top workhorses", opts);
    let max = workhorses.first().map_or(0.0, |r| r.distance_km);
    for r in workhorses {
        let _ = writeln!(
            out,
            "  {:<14} {:>10} km  {}",
            r.vehicle_id,
            thousands(r.distance_km, 0),
            bar(r.distance_km, max, opts.bar_width)
        );
    }
}

fn push_markers(out: &mut String, report: &Report, opts: &RenderOptions) {
    heading(out, "Map markers", opts);
    let mut table = Table::new(&["Location", ">Lat", ">Lon", ">Records", ">Km"]);
    for m in &report.markers {
        table.push(vec![
            m.location.clone(),
            format!("{:.4}", m.lat),
            format!("{:.4}", m.lon),
            m.records.to_string(),
            thousands(m.total_distance, 0),
        ]);
    }
    let _ = writeln!(out, "{}", table.render(opts.color));
}

fn push_trend(out: &mut String, trend: &[AggregateSummary], opts: &RenderOptions) {
    heading(out, "Daily trend", opts);
    if trend.len() < 2 {
        let _ = writeln!(out, "  Select more than one day to see a trend.");
        return;
    }
    let max = trend.iter().map(|d| d.total_distance).fold(0.0, f64::max);
    for day in trend {
        let line = format!(
            "  {}  {:>10} km  util {:>5.2}  {}",
            day.group_key,
            thousands(day.total_distance, 0),
            day.average_utilization,
            bar(day.total_distance, max, opts.bar_width)
        );
        let tone = utilization_tone(day.average_utilization, opts.goal);
        let _ = writeln!(out, "{}", paint(&line, tone, opts.color));
    }
}

fn registry_tone(r: &DerivedRecord, goal: f64) -> Tone {
    if r.ghost {
        Tone::Muted
    } else if r.risk_tier == RiskTier::High || r.anomalous {
        Tone::Bad
    } else {
        utilization_tone(r.utilization_score, goal)
    }
}

fn push_registry(out: &mut String, report: &Report, opts: &RenderOptions) {
    heading(out, "Fleet registry", opts);
    let mut table = Table::new(&[
        "Vehicle", "Role", "Make", "Location", "Date", ">Km", ">Cost", ">Util", "Risk", "Band",
    ]);
    for r in report.registry.iter().take(opts.registry_limit) {
        table.push_toned(
            vec![
                r.vehicle_id.clone(),
                r.role.clone(),
                r.make.clone(),
                r.location.clone(),
                r.timestamp.format("%Y-%m-%d").to_string(),
                thousands(r.distance_km, 0),
                thousands(r.estimated_cost, 2),
                format!("{:.2}", r.utilization_score),
                format!("{} {:.2}", r.risk_tier.as_str(), r.risk_score),
                r.maintenance_band.label().to_string(),
            ],
            registry_tone(r, opts.goal),
        );
    }
    let _ = writeln!(out, "{}", table.render(opts.color));

    let hidden = report.registry.len().saturating_sub(opts.registry_limit);
    if hidden > 0 {
        let _ = writeln!(out, "  ... {hidden} more record(s); use --format json or --export for all");
    }
}

fn push_plan(out: &mut String, report: &Report, opts: &RenderOptions) {
    heading(out, "Next period planner", opts);
    match &report.plan {
        Some(plan) => {
            let target = format!("Recommended utilization goal: {:.2}", plan.recommended);
            let _ = writeln!(out, "  {}", paint(&target, Tone::Good, opts.color));
            let _ = writeln!(out, "  Current average: {:.2}", plan.average);
            let _ = writeln!(out, "  Best record:     {:.2}", plan.best);
            let _ = writeln!(
                out,
                "  Matches the top 25% of {} active record(s).",
                plan.sample_size
            );
        }
        None => {
            let _ = writeln!(
                out,
                "  Not enough data for a recommendation (needs active records)."
            );
        }
    }
}

fn push_issues(out: &mut String, issues: &[RowIssue], opts: &RenderOptions) {
    if issues.is_empty() {
        return;
    }
    heading(out, &format!("Skipped rows ({})", issues.len()), opts);
    for issue in issues {
        let line = format!("  line {}: {}", issue.line, issue.error);
        let _ = writeln!(out, "{}", paint(&line, Tone::Bad, opts.color));
    }
}
