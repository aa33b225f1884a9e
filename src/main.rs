//! Command line front end of the schedule admission engine.
//!
//! Works on a timetable JSON file: submits, updates and deletes sessions through the
//! admission controller and prints the outcome as JSON.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};

use class_schedule_admission::api::finding_dto::RejectionDto;
use class_schedule_admission::api::session_dto::{ScheduleSessionDto, SessionPatchDto, SessionRequestDto};
use class_schedule_admission::domain::admission::admission_config::AdmissionConfig;
use class_schedule_admission::domain::admission::admission_state::AdmissionOperation;
use class_schedule_admission::domain::session::schedule_session::{ScheduleSession, Term};
use class_schedule_admission::domain::utils::id::{SessionId, UserId};
use class_schedule_admission::error::AdmissionError;
use class_schedule_admission::loader::parser::parse_json_file;
use class_schedule_admission::{load_timetable, logger, save_timetable};

#[derive(Parser)]
#[command(name = "class-schedule-admission")]
#[command(about = "Checks class sessions for room, section and instructor conflicts before they enter a timetable")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Timetable JSON file
    #[arg(long, global = true, default_value = "data/timetable.json")]
    timetable: String,

    /// Admission config JSON file
    #[arg(long, global = true)]
    config: Option<String>,

    /// Write the timetable back after a successful change
    #[arg(long, global = true)]
    save: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Submit a new session.
    Submit {
        /// Request JSON file
        #[arg(long)]
        request: String,
        /// Acting user id
        #[arg(long)]
        user: i64,
    },

    /// Patch a committed session.
    Update {
        #[arg(long)]
        session: i64,
        /// Patch JSON file
        #[arg(long)]
        patch: String,
        #[arg(long)]
        user: i64,
    },

    /// Delete a committed session.
    Delete {
        #[arg(long)]
        session: i64,
        #[arg(long)]
        user: i64,
    },

    /// List the sessions of a term, newest first.
    List {
        #[arg(long)]
        academic_year: i64,
        #[arg(long)]
        semester: i64,
        /// Also write the list as CSV
        #[arg(long)]
        csv: Option<PathBuf>,
    },
}

fn print_session(session: &ScheduleSession) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(&ScheduleSessionDto::from(session))?);
    Ok(())
}

/// Prints a rejection in its response shape and turns it into the process error.
fn report(operation: AdmissionOperation, error: AdmissionError) -> anyhow::Error {
    if let Some(findings) = error.findings() {
        match serde_json::to_string_pretty(&RejectionDto::new(operation, findings)) {
            Ok(json) => println!("{}", json),
            Err(e) => log::error!("Failed to render rejection: {}", e),
        }
    }

    anyhow::Error::new(error)
}

fn write_csv(path: &PathBuf, sessions: &[ScheduleSession]) -> Result<()> {
    let mut writer = csv::WriterBuilder::new().delimiter(b';').from_path(path).with_context(|| format!("cannot create '{}'", path.display()))?;

    for session in sessions {
        writer.serialize(ScheduleSessionDto::from(session))?;
    }

    writer.flush()?;
    Ok(())
}

fn main() -> Result<()> {
    logger::init();

    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => AdmissionConfig::load(path).with_context(|| format!("cannot load config '{}'", path))?,
        None => AdmissionConfig::default(),
    };

    let timetable = load_timetable(&cli.timetable).with_context(|| format!("cannot load timetable '{}'", cli.timetable))?;
    let controller = timetable.controller(config)?;

    let changed = match cli.command {
        Commands::Submit { request, user } => {
            let request: SessionRequestDto = parse_json_file(&request)?;
            let session = controller.submit_request(&request, UserId::new(user)).map_err(|e| report(AdmissionOperation::Submit, e))?;
            print_session(&session)?;
            true
        }
        Commands::Update { session, patch, user } => {
            let patch: SessionPatchDto = parse_json_file(&patch)?;
            let session = controller.update_request(SessionId::new(session), &patch, UserId::new(user)).map_err(|e| report(AdmissionOperation::Update, e))?;
            print_session(&session)?;
            true
        }
        Commands::Delete { session, user } => {
            let session = controller.delete(SessionId::new(session), UserId::new(user)).map_err(|e| report(AdmissionOperation::Delete, e))?;
            print_session(&session)?;
            true
        }
        Commands::List { academic_year, semester, csv } => {
            let sessions = controller.list(&Term::new(academic_year, semester))?;
            let dtos: Vec<ScheduleSessionDto> = sessions.iter().map(ScheduleSessionDto::from).collect();
            println!("{}", serde_json::to_string_pretty(&dtos)?);

            if let Some(path) = csv {
                write_csv(&path, &sessions)?;
            }
            false
        }
    };

    if changed && cli.save {
        save_timetable(&cli.timetable, &timetable)?;
    } else if changed {
        log::info!("Change not saved, pass --save to write it to '{}'.", cli.timetable);
    }

    Ok(())
}
