//! CLI subcommands — init, validate, plan, run, partitions.

use crate::collectors::command::CommandCollectors;
use crate::core::navigator::FolderNavigator;
use crate::core::orchestrator::Orchestrator;
use crate::core::parser;
use crate::core::timeframe::Timeframe;
use crate::core::types::{CadenceScope, RunParams, RunStatus, RunSummary, TaskStatus};
use chrono::NaiveDate;
use clap::Subcommand;
use std::path::{Path, PathBuf};

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Initialize a datastore root with a starter instruction file
    Init {
        /// Directory to initialize (default: current)
        #[arg(default_value = ".")]
        path: PathBuf,
    },

    /// Validate an instruction file without touching the datastore
    Validate {
        /// Path to the instruction file
        #[arg(short, long, default_value = "daily_instructions.json")]
        file: PathBuf,
    },

    /// Show which tasks would run and where their output would land
    Plan {
        /// Path to the instruction file
        #[arg(short, long, default_value = "daily_instructions.json")]
        file: PathBuf,

        /// Datastore root directory
        #[arg(long, default_value = "datastore")]
        root: PathBuf,

        /// Run date, YYYY-MM-DD (default: today)
        #[arg(long)]
        date: Option<String>,

        /// Cadence scope to consider
        #[arg(long, value_enum, default_value_t = CadenceScope::Daily)]
        cadence: CadenceScope,

        /// Emit the plan as JSON
        #[arg(long)]
        json: bool,
    },

    /// Execute due tasks from one or all instruction files
    Run {
        /// Path to the instruction file
        #[arg(short, long, default_value = "daily_instructions.json")]
        file: PathBuf,

        /// Datastore root directory
        #[arg(long, default_value = "datastore")]
        root: PathBuf,

        /// Run date, YYYY-MM-DD (default: today)
        #[arg(long)]
        date: Option<String>,

        /// Cadence scope to consider
        #[arg(long, value_enum, default_value_t = CadenceScope::Daily)]
        cadence: CadenceScope,

        /// Resolve and report without executing or creating directories
        #[arg(long)]
        dry_run: bool,

        /// Cap on executed tasks per file (0 = unlimited)
        #[arg(long, default_value_t = 0)]
        max_tasks: u32,

        /// Run every instruction file in the config's directory
        #[arg(long)]
        all_configs: bool,

        /// Discovery pattern for --all-configs
        #[arg(long, default_value = "*_instructions.json")]
        pattern: String,

        /// Seconds to wait between instruction files in --all-configs mode
        #[arg(long, default_value_t = 30)]
        inter_config_delay: u64,

        /// Program invoked for search tasks
        #[arg(long, default_value = "lode-search")]
        search_collector: PathBuf,

        /// Program invoked for page-text tasks
        #[arg(long, default_value = "lode-page-text")]
        page_collector: PathBuf,

        /// Skip the run journal
        #[arg(long)]
        no_journal: bool,

        /// Emit the summary as JSON
        #[arg(long)]
        json: bool,
    },

    /// List existing date partitions for a domain
    Partitions {
        /// Datastore root directory
        #[arg(long, default_value = "datastore")]
        root: PathBuf,

        /// Area to inspect (mine, analysis, present, or a literal folder)
        #[arg(long, default_value = "mine")]
        area: String,

        /// Domain to inspect; omit to list all domains in the area
        #[arg(short, long)]
        domain: Option<String>,

        /// Timeframe filter: YYYY, YYYY/MM, YYYY/MM/DD, or `-` for all
        #[arg(short, long, default_value = "-")]
        timeframe: String,
    },
}

/// Dispatch a CLI command.
pub fn dispatch(cmd: Commands) -> Result<(), String> {
    match cmd {
        Commands::Init { path } => cmd_init(&path),
        Commands::Validate { file } => cmd_validate(&file),
        Commands::Plan {
            file,
            root,
            date,
            cadence,
            json,
        } => cmd_plan(&file, &root, date.as_deref(), cadence, json),
        Commands::Run {
            file,
            root,
            date,
            cadence,
            dry_run,
            max_tasks,
            all_configs,
            pattern,
            inter_config_delay,
            search_collector,
            page_collector,
            no_journal,
            json,
        } => {
            let mut params = RunParams::new(resolve_run_date(date.as_deref())?);
            params.scope = cadence;
            params.dry_run = dry_run;
            params.max_tasks = max_tasks;
            params.config_pattern = pattern;
            params.inter_config_delay_secs = inter_config_delay;
            params.journal = !no_journal;
            cmd_run(
                &file,
                &root,
                &params,
                all_configs,
                &search_collector,
                &page_collector,
                json,
            )
        }
        Commands::Partitions {
            root,
            area,
            domain,
            timeframe,
        } => cmd_partitions(&root, &area, domain.as_deref(), &timeframe),
    }
}

fn resolve_run_date(date: Option<&str>) -> Result<NaiveDate, String> {
    match date {
        Some(s) => NaiveDate::parse_from_str(s, "%Y-%m-%d")
            .map_err(|e| format!("invalid --date {}: {}", s, e)),
        None => Ok(chrono::Local::now().date_naive()),
    }
}

fn cmd_init(path: &Path) -> Result<(), String> {
    let config_path = path.join("daily_instructions.json");
    if config_path.exists() {
        return Err(format!("{} already exists", config_path.display()));
    }

    let root = path.join("datastore");
    std::fs::create_dir_all(&root).map_err(|e| format!("cannot create datastore: {}", e))?;

    let template = r#"{
  "default_domain": "GeneralNews",
  "tasks": [
    {
      "name": "Morning sweep",
      "type": "search",
      "cadence": "daily",
      "query": "latest developments",
      "max_results": 8
    },
    {
      "name": "Monthly digest",
      "type": "page-text",
      "cadence": "monthly",
      "day_of_month": 1,
      "url": "https://example.org/digest",
      "max_links": 8,
      "words": 200
    }
  ]
}
"#;
    std::fs::write(&config_path, template)
        .map_err(|e| format!("cannot write {}: {}", config_path.display(), e))?;

    println!("Initialized lode project at {}", path.display());
    println!("  Created: {}", config_path.display());
    println!("  Created: {}/", root.display());
    Ok(())
}

fn cmd_validate(file: &Path) -> Result<(), String> {
    let instructions = parser::load_instruction_file(file).map_err(|e| e.to_string())?;
    let errors = parser::validate_instructions(&instructions);

    if errors.is_empty() {
        println!(
            "OK: {} ({} tasks, default domain {})",
            file.display(),
            instructions.tasks.len(),
            instructions.default_domain
        );
        Ok(())
    } else {
        for e in &errors {
            eprintln!("  ERROR: {}", e);
        }
        Err(format!("{} validation error(s)", errors.len()))
    }
}

fn cmd_plan(
    file: &Path,
    root: &Path,
    date: Option<&str>,
    cadence: CadenceScope,
    json: bool,
) -> Result<(), String> {
    let params = {
        let mut p = RunParams::new(resolve_run_date(date)?);
        p.scope = cadence;
        p
    };
    // Planning never executes; collector programs are placeholders.
    let collectors = CommandCollectors::new("true", "true");
    let orchestrator = Orchestrator::new(FolderNavigator::new(root), &collectors);
    let plan = orchestrator.plan_file(file, &params).map_err(|e| e.to_string())?;

    if json {
        let rendered =
            serde_json::to_string_pretty(&plan).map_err(|e| format!("cannot render plan: {}", e))?;
        println!("{}", rendered);
        return Ok(());
    }

    println!(
        "Planning: {} for {} (cadence: {})",
        plan.config_path.display(),
        plan.run_date,
        plan.cadence
    );
    println!();
    for task in &plan.tasks {
        println!(
            "  + {} [{}] {} -> {}",
            task.name,
            task.kind,
            task.domain,
            task.output_path.display()
        );
    }
    println!();
    println!("Plan: {} task(s) would run.", plan.tasks.len());
    Ok(())
}

#[allow(clippy::too_many_arguments)]
fn cmd_run(
    file: &Path,
    root: &Path,
    params: &RunParams,
    all_configs: bool,
    search_collector: &Path,
    page_collector: &Path,
    json: bool,
) -> Result<(), String> {
    let collectors = CommandCollectors::new(search_collector, page_collector);
    let orchestrator = Orchestrator::new(FolderNavigator::new(root), &collectors);

    if all_configs {
        let report = orchestrator.run_all(file, params);
        if json {
            let rendered = serde_json::to_string_pretty(&report)
                .map_err(|e| format!("cannot render report: {}", e))?;
            println!("{}", rendered);
        } else {
            for summary in &report.config_runs {
                print_summary(summary);
            }
            println!(
                "All configs: {} file(s), {} failed; {} executed, {} skipped, {} failed task(s).",
                report.configs_total,
                report.configs_failed,
                report.tasks_executed,
                report.tasks_skipped,
                report.tasks_failed
            );
        }
        if report.status == RunStatus::Ok {
            return Ok(());
        }
        return Err(format!(
            "{} config(s) and {} task(s) failed",
            report.configs_failed, report.tasks_failed
        ));
    }

    let summary = orchestrator.run_file(file, params);
    if json {
        let rendered = serde_json::to_string_pretty(&summary)
            .map_err(|e| format!("cannot render summary: {}", e))?;
        println!("{}", rendered);
    } else {
        print_summary(&summary);
    }

    match summary.status {
        RunStatus::Ok => Ok(()),
        RunStatus::PartialError => Err(format!("{} task(s) failed", summary.tasks_failed)),
        RunStatus::Error => Err(summary
            .error
            .unwrap_or_else(|| "run failed".to_string())),
    }
}

fn print_summary(summary: &RunSummary) {
    println!(
        "{}: {} total, {} due, {} executed, {} skipped, {} failed{}",
        summary.config_path.display(),
        summary.tasks_total,
        summary.tasks_due,
        summary.tasks_executed,
        summary.tasks_skipped,
        summary.tasks_failed,
        if summary.dry_run { " (dry run)" } else { "" }
    );
    for record in &summary.results {
        let detail = record
            .reason
            .as_deref()
            .or(record.error.as_deref())
            .map(|d| format!(" ({})", d))
            .unwrap_or_default();
        let symbol = match record.status {
            TaskStatus::Succeeded => "+",
            TaskStatus::Planned => "~",
            TaskStatus::Skipped => " ",
            TaskStatus::Failed => "!",
        };
        println!("  {} {}: {}{}", symbol, record.name, record.status, detail);
    }
    if let Some(error) = &summary.error {
        println!("  ! {}", error);
    }
}

fn cmd_partitions(
    root: &Path,
    area: &str,
    domain: Option<&str>,
    timeframe: &str,
) -> Result<(), String> {
    let navigator = FolderNavigator::new(root);

    let Some(domain) = domain else {
        let domains = navigator.list_domains(area);
        if domains.is_empty() {
            println!("No domains under {}/{}.", root.display(), area);
        }
        for d in domains {
            println!("{}", d);
        }
        return Ok(());
    };

    let timeframe = Timeframe::parse(timeframe).map_err(|e| e.to_string())?;
    let mut count = 0usize;
    for (date, path) in navigator
        .partitions(area, domain, timeframe)
        .map_err(|e| e.to_string())?
    {
        println!("{}  {}", date, path.display());
        count += 1;
    }
    if count == 0 {
        println!("No partitions match {} for {}.", timeframe, domain);
    }
    Ok(())
}
