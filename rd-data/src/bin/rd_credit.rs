use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use rd_core::{CreditEngine, CreditMethod, CreditReport};
use rd_data::{SnapshotLoader, csv_loader, logging};
use rust_decimal::Decimal;
use tracing::info;

/// Calculate federal and state R&D tax credits for one business and year.
///
/// The snapshot is a JSON document holding the business profile, research
/// activities, employee allocations, expenses and prior-year history. Any of
/// the tabular sections can be replaced from CSV files.
#[derive(Parser, Debug)]
#[command(name = "rd-credit")]
#[command(version, about, long_about = None)]
struct Args {
    /// Path to the JSON calculation snapshot
    #[arg(short, long)]
    snapshot: PathBuf,

    /// CSV of prior-year QRE and gross receipts, replacing the snapshot's history
    #[arg(long)]
    historical: Option<PathBuf>,

    /// CSV of contractor payments, replacing the snapshot's contractors
    #[arg(long)]
    contractors: Option<PathBuf>,

    /// CSV of supply purchases, replacing the snapshot's supplies
    #[arg(long)]
    supplies: Option<PathBuf>,

    /// Federal method to report: standard or asc
    #[arg(short, long, value_parser = parse_method)]
    method: Option<CreditMethod>,

    /// Apply the Section 280C reduced-credit election
    #[arg(long, default_value_t = false)]
    use_280c: bool,

    /// Corporate tax rate used by the 280C election (e.g. 0.21)
    #[arg(long)]
    tax_rate: Option<Decimal>,

    /// Fraction of contractor research spend that qualifies (e.g. 0.65)
    #[arg(long)]
    contractor_rate: Option<Decimal>,

    /// Count employees and contractors at 80% or more research time in full
    #[arg(long, default_value_t = false)]
    eighty_percent_rule: bool,

    /// Two-letter state code, overriding the snapshot's state
    #[arg(long)]
    state: Option<String>,

    /// Leave the state credit out of the total
    #[arg(long, default_value_t = false)]
    no_state_credit: bool,

    /// Print the full report as JSON instead of a summary
    #[arg(long, default_value_t = false)]
    json: bool,

    /// Log intermediate values
    #[arg(short, long, default_value_t = false)]
    verbose: bool,
}

fn parse_method(s: &str) -> Result<CreditMethod, String> {
    CreditMethod::parse(s).ok_or_else(|| format!("unknown method '{s}' (expected standard or asc)"))
}

fn main() -> Result<()> {
    let args = Args::parse();
    logging::init_tracing(args.verbose);

    let mut input = SnapshotLoader::load_from_file(&args.snapshot)
        .with_context(|| format!("Failed to load snapshot: {}", args.snapshot.display()))?;

    if let Some(path) = &args.historical {
        input.historical_data = csv_loader::load_historical_from_file(path)
            .with_context(|| format!("Failed to load historical data: {}", path.display()))?;
    }
    if let Some(path) = &args.contractors {
        input.contractor_expenses = csv_loader::load_contractors_from_file(path)
            .with_context(|| format!("Failed to load contractors: {}", path.display()))?;
    }
    if let Some(path) = &args.supplies {
        input.supply_expenses = csv_loader::load_supplies_from_file(path)
            .with_context(|| format!("Failed to load supplies: {}", path.display()))?;
    }

    if let Some(method) = args.method {
        input.selected_method = Some(method);
    }
    if let Some(rate) = args.tax_rate {
        input.corporate_tax_rate = rate;
    }
    if let Some(rate) = args.contractor_rate {
        input.contractor_qualified_rate = rate;
    }
    if let Some(state) = args.state {
        input.state_code = state;
    }
    input.use_280c |= args.use_280c;
    input.apply_eighty_percent_rule |= args.eighty_percent_rule;
    input.include_state_credit &= !args.no_state_credit;

    info!(year = input.year, state = %input.state_code, "Calculating credits");

    let report = CreditEngine::from_input(&input)
        .calculate(&input)
        .context("Invalid calculation settings")?;

    if args.json {
        let json = serde_json::to_string_pretty(&report).context("Failed to serialize report")?;
        println!("{json}");
    } else {
        print_summary(&report);
    }

    Ok(())
}

fn print_summary(report: &CreditReport) {
    match &report.business_id {
        Some(id) => println!("R&D credit estimate for {id}, tax year {}", report.year),
        None => println!("R&D credit estimate for tax year {}", report.year),
    }
    println!();
    println!("{}", report.result);
    println!();
    println!("{}", report.state.message);

    let missing: Vec<&String> = match report.federal.selected_method {
        CreditMethod::Standard => report.federal.standard.missing_data.iter().collect(),
        CreditMethod::Asc => report.federal.asc.missing_data.iter().collect(),
    };
    if !missing.is_empty() || !report.notes.is_empty() {
        println!();
        println!("Notes:");
        for note in missing.into_iter().chain(report.notes.iter()) {
            println!("  - {note}");
        }
    }
}
