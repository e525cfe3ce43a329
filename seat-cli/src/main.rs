//! SeatSync operator CLI.
//!
//! Works directly on layout document files: generate a seating plan from a
//! guest list, inspect a layout, print the public seating chart, or check a
//! guest in at the door.

use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use tracing::info;

use seat_core::{
    fallback_plan, seating_chart, GuestLifecycle, SeatingPlan, DEFAULT_TABLE_SIZE,
};
use seat_session::{plans_or_fallback, HttpAssistant, PlanSource, SeatingRequest};
use seat_types::{GuestStatus, Layout, LayoutDocument};

#[derive(Parser)]
#[command(name = "seat-cli", about = "SeatSync seating planner CLI", version)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Generate a seating layout from a guest list file
    Plan {
        /// Guest list file, one name per line
        guests: PathBuf,
        /// Guests per table
        #[arg(long, default_value_t = DEFAULT_TABLE_SIZE)]
        table_size: usize,
        /// Chat-completions endpoint for AI suggestions
        #[arg(long, requires = "api_key")]
        endpoint: Option<String>,
        /// API key for the endpoint
        #[arg(long, requires = "endpoint")]
        api_key: Option<String>,
        /// Write the layout document here instead of stdout
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// Print roster and table statistics for a layout document
    Stats {
        /// Layout document file
        layout: PathBuf,
    },
    /// Print the guest-to-table seating chart
    Chart {
        /// Layout document file
        layout: PathBuf,
    },
    /// Check a guest in and rewrite the layout document
    CheckIn {
        /// Layout document file
        layout: PathBuf,
        /// Guest name, matched exactly
        #[arg(long)]
        guest: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();
    match cli.command {
        Command::Plan {
            guests,
            table_size,
            endpoint,
            api_key,
            out,
        } => {
            let guest_list = std::fs::read_to_string(&guests)
                .with_context(|| format!("reading guest list {}", guests.display()))?;

            let (plan, source) = match (endpoint, api_key) {
                (Some(endpoint), Some(api_key)) => {
                    let assistant = HttpAssistant::new(endpoint, api_key);
                    let request = SeatingRequest {
                        guest_list: guest_list.clone(),
                        plan_count: 1,
                    };
                    let (mut plans, source) = plans_or_fallback(&assistant, &request).await;
                    let plan = plans
                        .drain(..)
                        .next()
                        .context("assistant returned no plans")?;
                    (plan, source)
                }
                _ => (
                    fallback_plan(&guest_list, table_size),
                    PlanSource::Fallback,
                ),
            };
            info!(?source, tables = plan.tables.len(), "plan ready");

            let layout = layout_from_plan(&plan, table_size as u32)?;
            let text = LayoutDocument::from_layout(&layout)?.to_json()?;
            match out {
                Some(path) => {
                    std::fs::write(&path, text)
                        .with_context(|| format!("writing {}", path.display()))?;
                    println!(
                        "wrote {} tables, {} guests to {}",
                        layout.tables.len(),
                        layout.guest_count(),
                        path.display()
                    );
                }
                None => println!("{text}"),
            }
        }
        Command::Stats { layout } => {
            let layout = load_layout(&layout)?;
            print_stats(&layout);
        }
        Command::Chart { layout } => {
            let layout = load_layout(&layout)?;
            for record in seating_chart(&layout) {
                let table = record.table_name.as_deref().unwrap_or("(unassigned)");
                println!("{:<30} {table}", record.guest_name);
            }
        }
        Command::CheckIn { layout: path, guest } => {
            let mut layout = load_layout(&path)?;
            let when = check_in_by_name(&mut layout, &guest)?;
            let text = LayoutDocument::from_layout(&layout)?.to_json()?;
            std::fs::write(&path, text)
                .with_context(|| format!("writing {}", path.display()))?;
            println!("checked in {guest} at {when}");
        }
    }

    Ok(())
}

fn load_layout(path: &Path) -> Result<Layout> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("reading layout {}", path.display()))?;
    let layout = LayoutDocument::from_json(&text)?.into_layout()?;
    Ok(layout)
}

fn layout_from_plan(plan: &SeatingPlan, capacity: u32) -> Result<Layout> {
    let mut layout = Layout::new();
    seat_core::apply_plan(&mut layout, plan, capacity)?;
    Ok(layout)
}

fn check_in_by_name(layout: &mut Layout, name: &str) -> Result<u64> {
    let matches: Vec<_> = layout
        .guests
        .values()
        .filter(|g| g.name == name)
        .map(|g| g.id)
        .collect();
    let guest = match matches.as_slice() {
        [] => bail!("no guest named {name:?}"),
        [one] => *one,
        _ => bail!("{} guests named {name:?}; check in by editing the document", matches.len()),
    };

    let now = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0);
    let when = GuestLifecycle::check_in(layout, guest, now)?;
    Ok(when)
}

fn print_stats(layout: &Layout) {
    let total = layout.guest_count();
    let mut by_status = [0usize; 4];
    for guest in layout.guests.values() {
        let slot = match guest.status {
            GuestStatus::Unconfirmed => 0,
            GuestStatus::Confirmed => 1,
            GuestStatus::Cancelled => 2,
            GuestStatus::CheckedIn => 3,
        };
        by_status[slot] += 1;
    }

    println!("guests:      {total}");
    println!("unconfirmed: {}", by_status[0]);
    println!("confirmed:   {}", by_status[1]);
    println!("cancelled:   {}", by_status[2]);
    println!("checked-in:  {}", by_status[3]);
    if total > 0 {
        println!(
            "check-in rate: {:.0}%",
            by_status[3] as f64 / total as f64 * 100.0
        );
    }
    println!("unassigned:  {}", layout.unassigned.len());
    println!("tables:      {}", layout.tables.len());
    for table in &layout.tables {
        println!(
            "  {:<24} {}/{}",
            table.name,
            table.occupied(),
            table.capacity
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn planned_layout() -> Layout {
        let plan = fallback_plan("Ada\nGrace\nEdsger", 2);
        layout_from_plan(&plan, 2).unwrap()
    }

    #[test]
    fn plan_layout_round_trips_through_a_file() {
        let layout = planned_layout();
        let text = LayoutDocument::from_layout(&layout).unwrap().to_json().unwrap();

        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(text.as_bytes()).unwrap();

        let loaded = load_layout(file.path()).unwrap();
        assert_eq!(loaded, layout);
        assert_eq!(loaded.tables.len(), 2);
        assert_eq!(loaded.guest_count(), 3);
    }

    #[test]
    fn check_in_by_name_finds_the_guest() {
        let mut layout = planned_layout();
        let when = check_in_by_name(&mut layout, "Grace").unwrap();
        assert!(when > 0);

        let checked: Vec<_> = layout
            .guests
            .values()
            .filter(|g| g.status == GuestStatus::CheckedIn)
            .collect();
        assert_eq!(checked.len(), 1);
        assert_eq!(checked[0].name, "Grace");
        assert!(checked[0].locked);
    }

    #[test]
    fn check_in_unknown_name_fails() {
        let mut layout = planned_layout();
        assert!(check_in_by_name(&mut layout, "Nobody").is_err());
    }

    #[test]
    fn load_layout_rejects_corrupt_documents() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"{not json").unwrap();
        assert!(load_layout(file.path()).is_err());
    }
}
