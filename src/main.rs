use std::path::PathBuf;

use attendance_tools::config::{DateRange, PipelineConfig};
use attendance_tools::model::SummaryStats;
use attendance_tools::pipeline::{self, MergeOutcome};
use attendance_tools::{Result, logging};
use chrono::{Local, NaiveDate};
use clap::{ArgAction, Parser, Subcommand};

fn main() {
    let cli = Cli::parse();
    if let Err(error) = run(cli) {
        eprintln!("error: {error}");
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<()> {
    logging::init(cli.verbose)?;
    match cli.command {
        Command::Merge(args) => execute_merge(args),
    }
}

fn execute_merge(args: MergeArgs) -> Result<()> {
    let period = args.period()?;
    let config = match &args.config {
        Some(path) => PipelineConfig::load(path)?,
        None => PipelineConfig::default(),
    };
    let output = args.output.clone().unwrap_or_else(default_output_path);

    let outcome = pipeline::merge_files(&args.input, &output, period, &config)?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&summary_json(&outcome, &output))?);
    } else {
        print_summary(&outcome, &output);
    }
    Ok(())
}

fn default_output_path() -> PathBuf {
    PathBuf::from(format!(
        "attendance_summary_{}.xlsx",
        Local::now().format("%Y%m%d_%H%M%S")
    ))
}

fn summary_json(outcome: &MergeOutcome, output: &std::path::Path) -> serde_json::Value {
    serde_json::json!({
        "output": output.display().to_string(),
        "period": outcome.period,
        "summary": outcome.summary,
    })
}

fn print_summary(outcome: &MergeOutcome, output: &std::path::Path) {
    let SummaryStats {
        total_records,
        employees,
        late,
        early_leave,
    } = outcome.summary;

    if let Some(period) = &outcome.period {
        println!("period:       {period}");
    }
    println!("records:      {total_records}");
    if let Some(employees) = employees {
        println!("employees:    {employees}");
    }
    println!("late:         {late}");
    println!("early leave:  {early_leave}");
    println!("written to:   {}", output.display());
}

#[derive(Parser)]
#[command(
    author,
    version,
    about = "Merge attendance spreadsheets and flag late arrivals and early leaves."
)]
struct Cli {
    /// Increase log verbosity (-v info, -vv debug). RUST_LOG takes precedence.
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Merge attendance workbooks into a single summary workbook.
    Merge(MergeArgs),
}

#[derive(clap::Args)]
struct MergeArgs {
    /// Input workbook (.xlsx or .xls). Repeat for several files; order is kept.
    #[arg(long, short, required = true)]
    input: Vec<PathBuf>,

    /// Output workbook path. Defaults to a timestamped file name.
    #[arg(long, short)]
    output: Option<PathBuf>,

    /// First day of the reporting period (YYYY-MM-DD).
    #[arg(long, requires = "end_date")]
    start_date: Option<NaiveDate>,

    /// Last day of the reporting period (YYYY-MM-DD).
    #[arg(long, requires = "start_date")]
    end_date: Option<NaiveDate>,

    /// Optional JSON file overriding column names and the output sheet name.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Print the summary as JSON.
    #[arg(long)]
    json: bool,
}

impl MergeArgs {
    fn period(&self) -> Result<Option<DateRange>> {
        match (self.start_date, self.end_date) {
            (Some(start), Some(end)) => DateRange::new(start, end).map(Some),
            // clap only accepts both bounds together.
            _ => Ok(None),
        }
    }
}
