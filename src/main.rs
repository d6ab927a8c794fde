use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use std::path::{Path, PathBuf};
use std::time::Duration;
use timetable_solver::curriculum::{build_all_curricula, build_curriculum};
use timetable_solver::parser::{build_store, load_input_from_dir, validate_input};
use timetable_solver::reporter::{
    generate_curriculum_json, generate_reports, print_summary, room_timetable,
    student_timetable, teacher_timetable, OutputFormat,
};
use timetable_solver::sink::verify_placements;
use timetable_solver::solver::{solve_year, CancelToken, SolveOptions, SolverObserver};
use timetable_solver::store::EntityStore;
use timetable_solver::types::{
    ClassroomId, SolveOutcome, SolveStatus, StudentId, TeacherId, YearId,
};
use timetable_solver::TimetableError;

#[derive(Parser)]
#[command(name = "timetable-solver")]
#[command(about = "Backtracking CSP school timetable solver")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build a year's curriculum structure (blocks, sets, classes)
    BuildCurriculum {
        /// Directory containing input JSON files
        #[arg(short, long)]
        data: PathBuf,

        /// Year id to build; omit to build every year
        #[arg(short, long)]
        year: Option<u32>,

        /// Output directory for curriculum.json
        #[arg(short, long, default_value = "./output")]
        output: PathBuf,
    },

    /// Build the curriculum and solve a year's timetable
    SolveTimetable {
        /// Directory containing input JSON files
        #[arg(short, long)]
        data: PathBuf,

        /// Year id to solve
        #[arg(short, long)]
        year: u32,

        /// Enable the Most-Constrained-Variable heuristic
        #[arg(long)]
        mcv: bool,

        /// Enable forward checking and the pre-search AC-3 pass
        #[arg(long)]
        fc: bool,

        /// RNG seed; identical seeds reproduce identical timetables
        #[arg(long, default_value_t = 0)]
        seed: u64,

        /// Wall-clock deadline in milliseconds
        #[arg(long)]
        timeout_ms: Option<u64>,

        /// Global cap on contact periods per teacher
        #[arg(long)]
        max_teacher_load: Option<u32>,

        /// Output directory for report files
        #[arg(short, long, default_value = "./output")]
        output: PathBuf,

        /// Output format(s): json, text, or all
        #[arg(short, long, default_value = "all")]
        format: String,

        /// Suppress progress output
        #[arg(short, long)]
        quiet: bool,
    },

    /// Re-check the committed-state invariants of an existing placement file
    Validate {
        /// Directory containing input JSON files
        #[arg(short, long)]
        data: PathBuf,

        /// Year id the placements belong to
        #[arg(short, long)]
        year: u32,

        /// Path to a placements.json written by solve-timetable
        #[arg(short, long)]
        placements: PathBuf,
    },

    /// Print a committed timetable for one teacher, student, or room
    Report {
        /// Directory containing input JSON files
        #[arg(short, long)]
        data: PathBuf,

        /// Year id the placements belong to
        #[arg(short, long)]
        year: u32,

        /// Path to a placements.json written by solve-timetable
        #[arg(short, long)]
        placements: PathBuf,

        /// Teacher id to report on
        #[arg(long)]
        teacher: Option<u32>,

        /// Student id to report on
        #[arg(long)]
        student: Option<u32>,

        /// Room id to report on
        #[arg(long)]
        room: Option<u32>,
    },
}

/// Observer driving the indicatif progress bar
struct ProgressObserver {
    bar: ProgressBar,
}

impl ProgressObserver {
    fn new(quiet: bool) -> Self {
        let bar = if quiet {
            ProgressBar::hidden()
        } else {
            let bar = ProgressBar::new(1);
            bar.set_style(
                ProgressStyle::default_bar()
                    .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}")
                    .unwrap()
                    .progress_chars("#>-"),
            );
            bar
        };
        Self { bar }
    }
}

impl SolverObserver for ProgressObserver {
    fn on_progress(&mut self, assigned: usize, total: usize, backtracks: u64) {
        self.bar.set_length(total as u64);
        self.bar.set_position(assigned as u64);
        self.bar.set_message(format!("{backtracks} backtracks"));
    }
}

fn main() {
    env_logger::init();
    let cli = Cli::parse();
    let code = match run(cli.command) {
        Ok(code) => code,
        Err(err) => {
            eprintln!("{} {err:#}", "Error:".red().bold());
            match err.downcast_ref::<TimetableError>() {
                Some(e) if e.is_configuration() => 3,
                _ => 1,
            }
        }
    };
    std::process::exit(code);
}

fn run(command: Commands) -> Result<i32> {
    match command {
        Commands::BuildCurriculum { data, year, output } => run_build(&data, year, &output),
        Commands::SolveTimetable {
            data,
            year,
            mcv,
            fc,
            seed,
            timeout_ms,
            max_teacher_load,
            output,
            format,
            quiet,
        } => {
            let options = SolveOptions {
                mcv,
                fc,
                seed,
                timeout: timeout_ms.map(Duration::from_millis),
                teacher_max_load: max_teacher_load,
            };
            run_solve(&data, year, &options, &output, &format, quiet)
        }
        Commands::Validate {
            data,
            year,
            placements,
        } => run_validate(&data, year, &placements),
        Commands::Report {
            data,
            year,
            placements,
            teacher,
            student,
            room,
        } => run_report(&data, year, &placements, teacher, student, room),
    }
}

/// Load a data directory into a validated store
fn load_store(data: &Path, quiet: bool) -> Result<EntityStore> {
    let input = load_input_from_dir(data).context("Failed to load input data")?;
    let validation = validate_input(&input)?;
    if !quiet {
        for warning in &validation.warnings {
            println!("{} {warning}", "Warning:".yellow());
        }
        println!(
            "Loaded {} years, {} subjects, {} teachers, {} classrooms, {} students",
            input.years.len(),
            input.subjects.len(),
            input.teachers.len(),
            input.classrooms.len(),
            input.students.len()
        );
    }
    build_store(&input)
}

fn run_build(data: &Path, year: Option<u32>, output: &Path) -> Result<i32> {
    let mut store = load_store(data, false)?;
    std::fs::create_dir_all(output)?;

    // a single year propagates its configuration error; building all years
    // reports each year's failure and carries on with the rest
    let results = match year {
        Some(year) => {
            let year = YearId(year);
            vec![(year, build_curriculum(&mut store, year))]
        }
        None => build_all_curricula(&mut store),
    };

    let mut failures = 0;
    for (year, result) in &results {
        match result {
            Ok(summary) => {
                println!(
                    "Year {}: {} blocks, {} sets, {} classes",
                    year, summary.blocks, summary.sets, summary.classes
                );
                for skipped in &summary.skipped {
                    println!("{} {}", "Skipped:".yellow(), skipped.reason);
                }
                let path = output.join(format!("curriculum-{year}.json"));
                std::fs::write(&path, generate_curriculum_json(&store, *year, summary)?)?;
                println!(
                    "Curriculum written to: {}",
                    path.display().to_string().green()
                );
            }
            Err(err) => {
                failures += 1;
                println!("{} year {}: {err}", "Failed:".red(), year);
            }
        }
    }

    if failures > 0 && failures == results.len() {
        let all_config = results
            .iter()
            .all(|(_, r)| matches!(r, Err(e) if e.is_configuration()));
        return Ok(if all_config { 3 } else { 1 });
    }
    Ok(0)
}

fn run_solve(
    data: &Path,
    year: u32,
    options: &SolveOptions,
    output: &Path,
    format: &str,
    quiet: bool,
) -> Result<i32> {
    let year = YearId(year);
    let mut store = load_store(data, quiet)?;
    let summary = build_curriculum(&mut store, year)?;
    if !quiet {
        println!(
            "Curriculum: {} blocks, {} sets, {} classes",
            summary.blocks, summary.sets, summary.classes
        );
    }

    let cancel = CancelToken::new();
    let mut observer = ProgressObserver::new(quiet);
    let outcome = solve_year(&mut store, year, options, &cancel, &mut observer)?;
    observer.bar.finish_and_clear();

    if outcome.is_solved() {
        generate_reports(&outcome, output, &OutputFormat::parse_list(format))?;
        if !quiet {
            println!("Reports written to: {}", output.display().to_string().green());
        }
    }
    if quiet {
        println!("{}", serde_json::to_string_pretty(&outcome.report)?);
    } else {
        print_summary(&outcome);
    }

    Ok(exit_code(outcome.report.status))
}

fn run_validate(data: &Path, year: u32, placements: &Path) -> Result<i32> {
    let year = YearId(year);
    let (store, outcome) = load_committed(data, year, placements)?;
    let violations = verify_placements(&store, year, &outcome.placements);
    if violations.is_empty() {
        println!("{}", "Placements satisfy all invariants".green().bold());
        Ok(0)
    } else {
        println!("{}", "Placements violate invariants".red().bold());
        for violation in &violations {
            println!("  - {}: {}", violation.invariant.red(), violation.message);
        }
        Ok(1)
    }
}

fn run_report(
    data: &Path,
    year: u32,
    placements: &Path,
    teacher: Option<u32>,
    student: Option<u32>,
    room: Option<u32>,
) -> Result<i32> {
    let year = YearId(year);
    let (mut store, outcome) = load_committed(data, year, placements)?;
    store
        .insert_placements(outcome.placements)
        .context("Placement file does not match the data directory")?;

    let text = if let Some(id) = teacher {
        teacher_timetable(&store, TeacherId(id))
    } else if let Some(id) = student {
        student_timetable(&store, StudentId(id))
    } else if let Some(id) = room {
        room_timetable(&store, ClassroomId(id))
    } else {
        anyhow::bail!("Specify one of --teacher, --student, or --room");
    };
    match text {
        Some(text) => {
            println!("{text}");
            Ok(0)
        }
        None => {
            println!("Not found");
            Ok(1)
        }
    }
}

/// Rebuild the curriculum (class ids are deterministic) and read a
/// placement file against it
fn load_committed(
    data: &Path,
    year: YearId,
    placements: &Path,
) -> Result<(EntityStore, SolveOutcome)> {
    let mut store = load_store(data, true)?;
    build_curriculum(&mut store, year)?;
    let content = std::fs::read_to_string(placements)
        .with_context(|| format!("Failed to read '{}'", placements.display()))?;
    let outcome: SolveOutcome = serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse '{}'", placements.display()))?;
    Ok((store, outcome))
}

fn exit_code(status: SolveStatus) -> i32 {
    match status {
        SolveStatus::Solved => 0,
        SolveStatus::Unsolvable => 2,
        SolveStatus::Timeout => 4,
        SolveStatus::Cancelled => 5,
    }
}
