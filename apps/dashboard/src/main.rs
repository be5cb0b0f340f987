use std::fmt::Write as _;

use anyhow::Result;
use chrono::Local;
use clap::{Parser, Subcommand};
use client_core::{
    filter::{filter_beds, filter_diseases, filter_inventory, filter_staff},
    summary::{bed_occupancy, expiring_within, low_stock},
    DashboardClient, DashboardState,
};
use shared::{
    domain::{BedStatus, DepartmentId},
    protocol::{Advisory, Bed, Disease, InventoryRecord, Prediction, StaffMember},
};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(about = "Terminal view of the hospital operations dashboard")]
struct Args {
    #[arg(long, default_value = "http://127.0.0.1:8080")]
    server_url: String,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Bed board with per-department occupancy.
    Beds {
        #[arg(long)]
        department_id: Option<i64>,
        #[arg(long)]
        status: Option<BedStatus>,
        #[arg(long, default_value = "")]
        search: String,
    },
    Staff {
        #[arg(long, default_value = "")]
        search: String,
    },
    Inventory {
        #[arg(long, default_value = "")]
        search: String,
        /// Only show records with quantity below this value.
        #[arg(long)]
        low_stock: Option<i64>,
        /// Only show records expiring within this many days (expired included).
        #[arg(long)]
        expiring_days: Option<i64>,
    },
    Diseases {
        #[arg(long, default_value = "")]
        search: String,
    },
    Alerts,
    Predict {
        prompt: String,
    },
    /// Print change events as they arrive and keep a live occupancy line.
    Watch,
}

fn render_beds(beds: &[&Bed]) -> String {
    let mut out = String::new();
    for bed in beds {
        let _ = writeln!(
            out,
            "{:<10} {:<12} {}",
            bed.bed_number,
            bed.status.as_str(),
            bed.department_name
        );
    }
    let owned: Vec<Bed> = beds.iter().map(|b| (*b).clone()).collect();
    let summary = bed_occupancy(&owned);
    for dept in &summary.departments {
        let _ = writeln!(
            out,
            "{}: {} free, {} occupied, {} maintenance ({:.0}% occupied)",
            dept.department_name,
            dept.counts.free,
            dept.counts.occupied,
            dept.counts.maintenance,
            dept.counts.occupancy_rate()
        );
    }
    let _ = writeln!(
        out,
        "total: {} beds, {:.0}% occupied",
        summary.overall.total(),
        summary.overall.occupancy_rate()
    );
    out
}

fn render_staff(staff: &[&StaffMember]) -> String {
    let mut out = String::new();
    for member in staff {
        let _ = writeln!(
            out,
            "{:<24} {:<22} {}",
            member.name,
            member.specialization,
            member.department_name.as_deref().unwrap_or("-")
        );
    }
    out
}

fn render_inventory(records: &[&InventoryRecord]) -> String {
    let mut out = String::new();
    for record in records {
        let expiry = record
            .expiry_date
            .map(|d| d.to_string())
            .unwrap_or_else(|| "-".to_string());
        let _ = writeln!(
            out,
            "{:<28} {:>6}  {:<10} {}",
            format!(
                "{} {}{}",
                record.medicine.name, record.medicine.strength, record.medicine.unit
            ),
            record.quantity,
            record.batch_number.as_deref().unwrap_or("-"),
            expiry
        );
    }
    out
}

fn render_diseases(diseases: &[&Disease]) -> String {
    let mut out = String::new();
    for disease in diseases {
        let _ = writeln!(out, "{}", disease.name);
        for subcategory in &disease.subcategories {
            let _ = writeln!(out, "  {}", subcategory.name);
            for age_group in &subcategory.age_groups {
                let _ = writeln!(
                    out,
                    "    {} ({})",
                    age_group.group.as_str(),
                    age_group.age_range
                );
                for medicine in &age_group.medicines {
                    let _ = writeln!(out, "      {}: {}", medicine.medicine_name, medicine.dosage);
                }
            }
        }
    }
    out
}

fn render_alerts(alerts: &[Advisory]) -> String {
    let mut out = String::new();
    for alert in alerts {
        let _ = writeln!(out, "[{:?}] {}\n  {}", alert.severity, alert.title, alert.body);
    }
    out
}

fn render_prediction(prediction: &Prediction) -> String {
    let mut out = String::new();
    if let Some(disease) = &prediction.disease {
        let _ = writeln!(out, "disease: {disease}");
    }
    if let Some(confidence) = prediction.confidence {
        let _ = writeln!(out, "confidence: {confidence:.1}%");
    }
    if let Some(risk) = prediction.risk {
        let _ = writeln!(out, "risk: {risk:?}");
    }
    if let Some(recommendation) = &prediction.recommendation {
        let _ = writeln!(out, "recommendation: {recommendation}");
    }
    if out.is_empty() {
        let _ = writeln!(out, "{}", prediction.raw);
    }
    out
}

async fn run(client: &DashboardClient, command: Command) -> Result<()> {
    match command {
        Command::Beds {
            department_id,
            status,
            search,
        } => {
            let beds = client.list_beds(department_id.map(DepartmentId)).await?;
            print!("{}", render_beds(&filter_beds(&beds, &search, status)));
        }
        Command::Staff { search } => {
            let staff = client.list_staff().await?;
            print!("{}", render_staff(&filter_staff(&staff, &search)));
        }
        Command::Inventory {
            search,
            low_stock: threshold,
            expiring_days,
        } => {
            let records = client.list_inventory().await?;
            let mut shown = filter_inventory(&records, &search);
            if let Some(threshold) = threshold {
                let low: Vec<_> = low_stock(&records, threshold)
                    .into_iter()
                    .map(|r| r.inventory_id)
                    .collect();
                shown.retain(|r| low.contains(&r.inventory_id));
            }
            if let Some(days) = expiring_days {
                let today = Local::now().date_naive();
                let expiring: Vec<_> = expiring_within(&records, today, days)
                    .into_iter()
                    .map(|r| r.inventory_id)
                    .collect();
                shown.retain(|r| expiring.contains(&r.inventory_id));
            }
            print!("{}", render_inventory(&shown));
        }
        Command::Diseases { search } => {
            let diseases = client.list_diseases().await?;
            print!("{}", render_diseases(&filter_diseases(&diseases, &search)));
        }
        Command::Alerts => {
            print!("{}", render_alerts(&client.list_alerts().await?));
        }
        Command::Predict { prompt } => {
            let prediction = client.predict(&prompt).await?;
            print!("{}", render_prediction(&prediction));
        }
        Command::Watch => {
            let mut state = DashboardState::default();
            state.refresh_all(client).await?;
            let mut feed = client.subscribe().await?;
            info!(server = %client.server_url(), "watching for changes");
            while let Some(event) = feed.next().await {
                println!("{}", serde_json::to_string(&event)?);
                state.apply_event(&event);
                let summary = bed_occupancy(&state.beds);
                println!(
                    "beds: {} total, {:.0}% occupied",
                    summary.overall.total(),
                    summary.overall.occupancy_rate()
                );
            }
        }
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();
    let args = Args::parse();

    let client = DashboardClient::new(&args.server_url)?;
    run(&client, args.command).await
}

#[cfg(test)]
#[path = "tests/main_tests.rs"]
mod tests;
