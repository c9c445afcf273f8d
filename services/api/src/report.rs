use chrono::{Local, NaiveDate};
use clap::{Args, ValueEnum};
use reno_estimate::config::AppConfig;
use reno_estimate::error::AppError;
use reno_estimate::estimate::{
    format_won, import_tasks, ConstructionTemplate, Estimate, EstimateSheet,
};
use reno_estimate::labor::{parse_target_date, KosisLaborIndex, LaborIndexProvider};
use std::fmt::Write as _;
use std::fs::File;
use std::path::PathBuf;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub(crate) enum TemplateArg {
    #[default]
    Interior,
    Restoration,
    PermitWork,
}

impl From<TemplateArg> for ConstructionTemplate {
    fn from(value: TemplateArg) -> Self {
        match value {
            TemplateArg::Interior => ConstructionTemplate::Interior,
            TemplateArg::Restoration => ConstructionTemplate::Restoration,
            TemplateArg::PermitWork => ConstructionTemplate::PermitWork,
        }
    }
}

#[derive(Args, Debug, Default)]
pub(crate) struct EstimateArgs {
    /// Construction template that seeds the task list
    #[arg(long, value_enum, default_value_t = TemplateArg::Interior)]
    pub(crate) template: TemplateArg,
    /// Base area in pyung; every task quantity is synced to it
    #[arg(long)]
    pub(crate) area: Option<f64>,
    /// CSV task sheet replacing the template seeds
    #[arg(long)]
    pub(crate) tasks_csv: Option<PathBuf>,
    /// Price every mapped category from the labor wage table
    #[arg(long)]
    pub(crate) labor_prices: bool,
    /// Include a full task listing in the output
    #[arg(long)]
    pub(crate) list_tasks: bool,
    /// Write the estimate sheet as CSV to this path
    #[arg(long)]
    pub(crate) csv_out: Option<PathBuf>,
    /// Issue date printed on the sheet (defaults to today)
    #[arg(long, value_parser = parse_target_date)]
    pub(crate) issued_on: Option<NaiveDate>,
}

#[derive(Args, Debug, Default)]
pub(crate) struct LaborIndexArgs {
    /// Historical date (YYYY-MM-DD); omit for the current index
    #[arg(long, value_parser = parse_target_date)]
    pub(crate) date: Option<NaiveDate>,
}

/// Labor index provider built from the environment, same as the server uses.
fn configured_labor_index() -> Result<KosisLaborIndex, AppError> {
    let config = AppConfig::load()?;
    Ok(KosisLaborIndex::from_config(&config.labor))
}

pub(crate) fn build_estimate(
    args: &EstimateArgs,
    labor: &KosisLaborIndex,
) -> Result<Estimate, AppError> {
    let template = ConstructionTemplate::from(args.template);
    let mut estimate = match &args.tasks_csv {
        Some(path) => {
            let tasks = import_tasks(File::open(path)?)?;
            let mut estimate = Estimate::empty(template);
            estimate.extend_tasks(tasks);
            estimate
        }
        None => Estimate::new(template),
    };

    if let Some(area) = args.area {
        estimate.set_base_area(Some(area));
        estimate.sync_area_to_base();
    }

    if args.labor_prices {
        let snapshot = labor.snapshot_at(chrono::Utc::now());
        estimate.apply_price_table(&snapshot.price_table());
    }

    Ok(estimate)
}

pub(crate) fn run_estimate(args: EstimateArgs) -> Result<(), AppError> {
    let estimate = build_estimate(&args, &configured_labor_index()?)?;
    let issued_on = args
        .issued_on
        .unwrap_or_else(|| Local::now().date_naive());
    let sheet = EstimateSheet::from_estimate(&estimate, issued_on);

    render_estimate(&estimate, &sheet, args.list_tasks);

    if let Some(path) = args.csv_out {
        sheet.write_csv(File::create(&path)?)?;
        println!("\nSheet written to {}", path.display());
    }

    Ok(())
}

pub(crate) fn render_estimate(estimate: &Estimate, sheet: &EstimateSheet, list_tasks: bool) {
    let summary = estimate.summary();

    println!("{}", sheet.title);
    println!(
        "Template: {} | Issued {}",
        sheet.template_label, sheet.issued_on
    );
    match estimate.base_area() {
        Some(area) => println!("Base area: {} pyung ({} m2)", area, sheet.base_area_m2),
        None => println!("Base area: not set"),
    }
    println!(
        "Tasks: {} total, {} included",
        summary.task_count, summary.included_count
    );

    if list_tasks {
        println!("\nTasks");
        for task in estimate.tasks() {
            let marker = if task.included { "x" } else { " " };
            println!(
                "- [{}] {} / {}: {} x {} {} = {}",
                marker,
                task.category,
                task.name,
                format_won(task.unit_price),
                task.quantity,
                task.category.unit().label(),
                format_won(task.line_total())
            );
        }
    }

    println!("\nTotal: {}", sheet.total_display);
}

pub(crate) async fn run_labor_index(args: LaborIndexArgs) -> Result<(), AppError> {
    let provider = configured_labor_index()?;
    print!("{}", render_labor_index(&provider, args.date).await?);
    Ok(())
}

pub(crate) async fn render_labor_index(
    provider: &dyn LaborIndexProvider,
    date: Option<NaiveDate>,
) -> Result<String, AppError> {
    let mut out = String::new();

    match date {
        Some(date) => {
            let historical = provider.historical(date).await?;
            let _ = writeln!(
                out,
                "Labor index on {}: {:.2} ({})",
                historical.target_date, historical.index, historical.source
            );
        }
        None => {
            let snapshot = provider.current().await?;
            let _ = writeln!(out, "Labor index: {:.1} ({})", snapshot.index, snapshot.source);
            if let Some(message) = &snapshot.message {
                let _ = writeln!(out, "Note: {message}");
            }
            let _ = writeln!(out, "\nDaily wages");
            for (role, wage) in &snapshot.labor_costs {
                let _ = writeln!(out, "- {}: {}", role, format_won(*wage));
            }
        }
    }

    Ok(out)
}
