//! periodiza - cycle planner for youth volleyball classes

use anyhow::{Context, Result, anyhow};
use chrono::{Local, NaiveDate, Utc};
use clap::{Parser, Subcommand};

use periodiza::age_band::{normalize_age_band, parse_age_range};
use periodiza::db::{ClassGroup, Database, DEFAULT_DURATION_MINUTES, PlanStore, SessionLog};
use periodiza::planner::cycle::{apply_to_weeks, current_content, reset_week, save_week_edit};
use periodiza::planner::generator::current_week_number;
use periodiza::planner::workload::workload_report;
use periodiza::planner::{
    CycleParams, Phase, RegenerateMode, build_week_plans, regenerate_cycle, week_schedule,
};
use periodiza::templates::MvLevel;

#[derive(Parser)]
#[command(name = "periodiza")]
#[command(author, version, about = "Cycle planner for youth volleyball classes")]
struct Cli {
    /// SQLite database path
    #[arg(long, global = true, env = "PERIODIZA_DB", default_value = "periodiza.db")]
    db: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Register a class
    AddClass {
        name: String,

        /// Age band, e.g. "9-11"
        #[arg(short, long)]
        age_band: String,

        /// Mesocycle length in weeks
        #[arg(short, long, default_value = "4")]
        cycle_length: u32,

        /// Sessions per week
        #[arg(short, long, default_value = "2")]
        sessions: u32,

        /// Weekdays the class meets (0=Sunday..6=Saturday), e.g. 1,3,5
        #[arg(long, value_delimiter = ',')]
        days: Vec<u8>,

        /// Skill level override (MV1, MV2, MV3)
        #[arg(long)]
        mv: Option<MvLevel>,

        /// First day of the cycle (YYYY-MM-DD)
        #[arg(long)]
        start: Option<NaiveDate>,

        /// Nominal session length in minutes
        #[arg(long, default_value_t = DEFAULT_DURATION_MINUTES)]
        duration: u32,
    },

    /// List classes
    Classes,

    /// Generate or refresh a class's cycle
    Generate {
        class_id: i64,

        /// fill: only missing weeks | auto: also refresh AUTO weeks | all: rebuild everything
        #[arg(short, long, default_value = "fill")]
        mode: RegenerateMode,

        /// Confirm discarding manual edits (required for --mode all)
        #[arg(long)]
        yes: bool,
    },

    /// Show the cycle week by week
    Plans {
        class_id: i64,

        /// Print JSON instead of a table
        #[arg(long)]
        json: bool,
    },

    /// Edit a week; changed fields make it MANUAL
    Edit {
        class_id: i64,
        week: u32,

        #[arg(long)]
        phase: Option<Phase>,
        #[arg(long)]
        theme: Option<String>,
        #[arg(long)]
        technical: Option<String>,
        #[arg(long)]
        physical: Option<String>,
        #[arg(long)]
        constraints: Option<String>,
        #[arg(long)]
        mv_format: Option<String>,
        #[arg(long)]
        warmup: Option<String>,
        #[arg(long)]
        jumps: Option<String>,
        #[arg(long)]
        rpe: Option<String>,

        /// Also copy the edited week onto these weeks
        #[arg(long, value_delimiter = ',')]
        copy_to: Vec<u32>,
    },

    /// Discard edits on a week and regenerate it
    ResetWeek { class_id: i64, week: u32 },

    /// Copy a week's content onto other weeks
    CopyWeek {
        class_id: i64,
        week: u32,

        #[arg(long, value_delimiter = ',', required = true)]
        to: Vec<u32>,
    },

    /// Log a session's perceived effort
    Log {
        class_id: i64,

        /// Perceived effort (0-10)
        #[arg(long)]
        pse: f64,

        /// Pain score, if anyone reported pain
        #[arg(long)]
        pain: Option<u8>,
    },

    /// Show workload ratio and warnings
    Load { class_id: i64 },

    /// Show the session layout of a week
    Schedule {
        class_id: i64,

        /// Week number (defaults to the current week of the cycle)
        #[arg(short, long)]
        week: Option<u32>,
    },
}

fn load_class(db: &Database, id: i64) -> Result<ClassGroup> {
    db.get_class(id)?
        .ok_or_else(|| anyhow!("Class {} not found", id))
}

fn main() -> Result<()> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt::init();

    let cli = Cli::parse();
    let db = Database::open(&cli.db)?;
    let today = Local::now().date_naive();

    match cli.command {
        Commands::AddClass { name, age_band, cycle_length, sessions, days, mv, start, duration } => {
            let class = ClassGroup {
                id: None,
                name: name.clone(),
                age_band: normalize_age_band(&age_band),
                cycle_start_date: start,
                cycle_length_weeks: cycle_length,
                sessions_per_week: sessions,
                mv_level: mv,
                days_of_week: days,
                duration_minutes: duration,
            };
            let id = db.add_class(&class)?;
            println!("Added: {} ({}, {} weeks) (id: {})", name, class.age_band, cycle_length, id);
        }

        Commands::Classes => {
            println!("Classes:");
            println!("{:-<60}", "");
            let mut classes = db.list_classes()?;
            classes.sort_by_key(|c| parse_age_range(&c.age_band));
            for c in classes {
                let band = if parse_age_range(&c.age_band).is_bounded() {
                    c.age_band.clone()
                } else {
                    format!("{}?", c.age_band)
                };
                println!(
                    "{:>3} | {:20} | {:6} | {:2} wk | {}x/wk | {}",
                    c.id.unwrap_or_default(),
                    c.name,
                    band,
                    c.cycle_length_weeks,
                    c.sessions_per_week,
                    c.mv_level.map(|l| l.as_str()).unwrap_or("-")
                );
            }
        }

        Commands::Generate { class_id, mode, yes } => {
            let class = load_class(&db, class_id)?;
            let params = CycleParams::from_class(&class, &db.list_plans(class_id)?, today)?;
            let report = regenerate_cycle(&db, &params, mode, yes)
                .with_context(|| format!("Failed to generate cycle for {}", class.name))?;
            println!(
                "{}: {} created, {} updated, {} kept",
                class.name,
                report.created.len(),
                report.updated.len(),
                report.kept.len()
            );
        }

        Commands::Plans { class_id, json } => {
            let class = load_class(&db, class_id)?;
            let plans = db.list_plans(class_id)?;
            let params = CycleParams::from_class(&class, &plans, today)?;
            let weeks = build_week_plans(&params, &plans);

            if json {
                println!("{}", serde_json::to_string_pretty(&weeks)?);
                return Ok(());
            }

            println!("{} - cycle from {}", class.name, params.start_date);
            println!("{:-<90}", "");
            for w in &weeks {
                let source = if w.persisted { w.plan.source.as_str() } else { "(draft)" };
                println!(
                    "{:2} | {:15} | {:22} | {:3} {:5} | jumps {:5} | RPE {} | {}",
                    w.week_number,
                    w.phase,
                    w.title(),
                    "#".repeat(w.volume.level() as usize),
                    w.volume,
                    w.plan.jump_target,
                    w.plan.rpe_target,
                    source
                );
            }
        }

        Commands::Edit {
            class_id,
            week,
            phase,
            theme,
            technical,
            physical,
            constraints,
            mv_format,
            warmup,
            jumps,
            rpe,
            copy_to,
        } => {
            let class = load_class(&db, class_id)?;
            let params = CycleParams::from_class(&class, &db.list_plans(class_id)?, today)?;

            let mut draft = current_content(&db, &params, week)?;
            if let Some(phase) = phase {
                draft.phase = phase;
            }
            let fields = [
                (&mut draft.theme, theme),
                (&mut draft.technical_focus, technical),
                (&mut draft.physical_focus, physical),
                (&mut draft.constraints, constraints),
                (&mut draft.mv_format, mv_format),
                (&mut draft.warmup_profile, warmup),
                (&mut draft.jump_target, jumps),
                (&mut draft.rpe_target, rpe),
            ];
            for (field, value) in fields {
                if let Some(value) = value {
                    *field = value;
                }
            }

            let saved = save_week_edit(&db, &params, week, draft.clone())?;
            println!("Week {} saved ({})", week, saved.source.as_str());

            if !copy_to.is_empty() {
                let applied = apply_to_weeks(&db, &params, week, &draft, &copy_to)?;
                println!("Copied to weeks: {:?}", applied);
            }
        }

        Commands::ResetWeek { class_id, week } => {
            let class = load_class(&db, class_id)?;
            let params = CycleParams::from_class(&class, &db.list_plans(class_id)?, today)?;
            let plan = reset_week(&db, &params, week)?;
            println!("Week {} reset: {} ({})", week, plan.theme, plan.phase);
        }

        Commands::CopyWeek { class_id, week, to } => {
            let class = load_class(&db, class_id)?;
            let params = CycleParams::from_class(&class, &db.list_plans(class_id)?, today)?;
            let draft = current_content(&db, &params, week)?;
            let applied = apply_to_weeks(&db, &params, week, &draft, &to)?;
            println!("Copied week {} to weeks: {:?}", week, applied);
        }

        Commands::Log { class_id, pse, pain } => {
            load_class(&db, class_id)?;
            let log = SessionLog {
                id: None,
                class_id,
                created_at: Utc::now(),
                pse,
                pain_score: pain,
            };
            let id = db.add_session_log(&log)?;
            println!("Logged: PSE {} (id: {})", pse, id);
        }

        Commands::Load { class_id } => {
            let class = load_class(&db, class_id)?;
            let plans = db.list_plans(class_id)?;
            let params = CycleParams::from_class(&class, &plans, today)?;
            let weeks = build_week_plans(&params, &plans);
            let report = workload_report(&db, class_id, &weeks, class.duration_minutes, Utc::now())?;

            println!("Workload - {}", class.name);
            println!("{:-<40}", "");
            match &report.acwr {
                Some(acwr) => {
                    println!("Acute load:   {:.0}", acwr.acute_load);
                    println!("Chronic load: {:.0}", acwr.chronic_load);
                    println!("ACWR:         {:.2} - {}", acwr.ratio, acwr.message());
                }
                None => println!("ACWR: no sessions logged in the last 28 days"),
            }
            for warning in report.warnings() {
                println!("! {}", warning);
            }
        }

        Commands::Schedule { class_id, week } => {
            let class = load_class(&db, class_id)?;
            let plans = db.list_plans(class_id)?;
            let params = CycleParams::from_class(&class, &plans, today)?;
            let week = week.unwrap_or_else(|| {
                current_week_number(params.start_date, today, params.cycle_length)
            });
            let weeks = build_week_plans(&params, &plans);
            let week_plan = weeks
                .iter()
                .find(|w| w.week_number == week)
                .ok_or_else(|| anyhow!("Week {} is outside the {}-week cycle", week, params.cycle_length))?;

            println!("Week {} - {} ({})", week, week_plan.title(), week_plan.phase);
            let schedule = week_schedule(
                week_plan.focus(),
                week_plan.title(),
                class.sessions_per_week,
                &class.days_of_week,
            );
            for day in &schedule {
                println!("{} | {}", day.label, day.display());
            }
            let sessions = schedule.iter().filter(|d| !d.is_rest()).count();
            println!("{} sessions, {} rest days", sessions, schedule.len() - sessions);
        }
    }

    Ok(())
}
