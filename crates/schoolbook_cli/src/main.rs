//! Command-line front end for the school record book.
//!
//! # Responsibility
//! - Map subcommands onto core services and queries.
//! - Print results as JSON so output can be piped or diffed.
//!
//! # Invariants
//! - Mutations run under the session persisted by `login`.
//! - Nothing is written when a command fails.

use anyhow::{anyhow, bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use schoolbook_core::model::class::split_display_name;
use schoolbook_core::query::{profile, roster};
use schoolbook_core::report::tables;
use schoolbook_core::{
    init_logging, open_db, AdmitStudentRequest, AuthService, FeeRequest, MarksEntry,
    MarksRequest, Role, SchoolService, SchoolStore, SchoolbookConfig, Session,
    SqliteKvRepository, TeacherInput, CONFIG_ENV_VAR,
};
use serde::Serialize;
use std::path::PathBuf;

/// School record book: admissions, teachers, classes, fees and marks.
#[derive(Parser)]
#[command(name = "schoolbook")]
#[command(author, version, about)]
struct Cli {
    /// JSON config file (falls back to $SCHOOLBOOK_CONFIG, then defaults)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Sign in and persist the session
    Login {
        #[arg(long)]
        name: String,
        /// CNIC / id card number
        #[arg(long)]
        id: String,
        /// principal | teacher | parent
        #[arg(long)]
        role: String,
    },

    /// Clear the persisted session
    Logout,

    /// Show the persisted session
    Whoami,

    /// Admit a new student (principal)
    Admit(AdmitArgs),

    /// Create or update a teacher (principal)
    Teacher(TeacherArgs),

    /// Create or rename a class (principal)
    Class {
        /// Internal id of the class to rename
        #[arg(long)]
        id: Option<String>,
        #[arg(long)]
        name: String,
        #[arg(long)]
        section: Option<String>,
    },

    /// Replace the subject list of a class (principal)
    Subjects {
        #[arg(long)]
        class: String,
        #[arg(required = true)]
        subjects: Vec<String>,
    },

    /// Record a fee transaction
    Fee {
        #[arg(long)]
        student: String,
        #[arg(long)]
        amount: f64,
        /// YYYY-MM-DD, today when omitted
        #[arg(long)]
        date: Option<String>,
        /// Record an outstanding charge instead of a payment
        #[arg(long)]
        unpaid: bool,
    },

    /// Record one test for a class (teacher or principal)
    Marks {
        #[arg(long)]
        class: String,
        #[arg(long)]
        subject: String,
        #[arg(long)]
        date: Option<String>,
        /// Total used when an entry gives none
        #[arg(long, default_value_t = profile::DEFAULT_TEST_TOTAL)]
        total: f64,
        /// `CODE=OBTAINED[/TOTAL]`; `CODE=` skips the student
        entries: Vec<String>,
    },

    /// Search students by name or code
    Students {
        #[arg(long, default_value = "")]
        search: String,
        #[arg(long)]
        class: Option<String>,
    },

    /// Search fee records by student name or class
    Fees {
        #[arg(long, default_value = "")]
        search: String,
    },

    /// Student and teacher counts
    Dashboard,

    /// Classes with their section and assigned subjects
    Classes,

    /// Teacher contact cards
    Teachers,

    /// Class and subject choices for the signed-in user
    Panel,

    /// Student profile details and contact card
    Profile { code: String },

    /// Prefilled marks entry rows for a class, subject and date
    MarksSheet {
        #[arg(long)]
        class: String,
        #[arg(long)]
        subject: String,
        #[arg(long)]
        date: String,
    },

    /// Export tables
    #[command(subcommand)]
    Report(ReportCommands),
}

#[derive(Args)]
struct AdmitArgs {
    #[arg(long)]
    name: String,
    #[arg(long)]
    father: String,
    #[arg(long)]
    father_cnic: String,
    #[arg(long)]
    class: String,
    #[arg(long, default_value = "")]
    previous_school: String,
    #[arg(long, default_value = "")]
    address: String,
    #[arg(long, default_value = "")]
    dob: String,
    #[arg(long, default_value = "")]
    photo: String,
    #[arg(long, default_value_t = 0.0)]
    fees_paid: f64,
    #[arg(long, default_value_t = 0.0)]
    fees_due: f64,
}

#[derive(Args)]
struct TeacherArgs {
    /// Internal id of the teacher to update
    #[arg(long)]
    id: Option<String>,
    #[arg(long)]
    name: String,
    #[arg(long)]
    id_card: String,
    /// Comma-separated class names
    #[arg(long, default_value = "")]
    classes: String,
    /// Comma-separated subjects
    #[arg(long, default_value = "")]
    subjects: String,
    #[arg(long, default_value = "")]
    periods: String,
    #[arg(long, default_value = "")]
    photo: String,
}

#[derive(Subcommand)]
enum ReportCommands {
    /// Recent test history of one student
    Student { code: String },
    /// All fee records
    Fees,
    /// Per-subject summary of one class
    Consolidated { class: String },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = load_config(cli.config)?;
    if let Some(log_dir) = &config.log_dir {
        init_logging(&config.log_level, log_dir)?;
    }

    let conn = open_db(&config.db_path)
        .with_context(|| format!("opening {}", config.db_path.display()))?;
    let store = || {
        SchoolStore::with_keys(
            SqliteKvRepository::with_quota(&conn, config.quota_bytes),
            config.store_keys(),
        )
    };
    let auth = AuthService::new(store());
    let school = SchoolService::new(store());

    match cli.command {
        Commands::Login { name, id, role } => {
            let role = Role::parse(&role).ok_or_else(|| anyhow!("unknown role `{role}`"))?;
            print_json(&auth.login(&name, &id, role)?)
        }
        Commands::Logout => {
            auth.logout()?;
            println!("logged out");
            Ok(())
        }
        Commands::Whoami => print_json(&auth.current_session()?),
        Commands::Admit(args) => {
            let session = require_session(&auth)?;
            let request = AdmitStudentRequest {
                name: args.name,
                father: args.father,
                father_cnic: args.father_cnic,
                class_name: args.class,
                previous_school: args.previous_school,
                address: args.address,
                dob: args.dob,
                photo: args.photo,
                fees_paid: args.fees_paid,
                fees_due: args.fees_due,
            };
            print_json(&school.admit_student(&session, &request)?)
        }
        Commands::Teacher(args) => {
            let session = require_session(&auth)?;
            let input = TeacherInput {
                name: args.name,
                id_card: args.id_card,
                classes: args.classes,
                subjects: args.subjects,
                periods: args.periods,
                photo: args.photo,
            };
            print_json(&school.upsert_teacher(&session, args.id.as_deref(), &input)?)
        }
        Commands::Class { id, name, section } => {
            let session = require_session(&auth)?;
            let class =
                school.upsert_class(&session, id.as_deref(), &name, section.as_deref())?;
            print_json(&class)
        }
        Commands::Subjects { class, subjects } => {
            let session = require_session(&auth)?;
            print_json(&school.assign_subjects(&session, &class, subjects.as_slice())?)
        }
        Commands::Fee {
            student,
            amount,
            date,
            unpaid,
        } => {
            let session = require_session(&auth)?;
            let request = FeeRequest {
                student_code: student,
                amount,
                date,
                paid: !unpaid,
            };
            print_json(&school.record_fee(&session, &request)?)
        }
        Commands::Marks {
            class,
            subject,
            date,
            total,
            entries,
        } => {
            let session = require_session(&auth)?;
            let entries = entries
                .iter()
                .map(|raw| parse_marks_entry(raw, total))
                .collect::<Result<Vec<_>>>()?;
            let request = MarksRequest {
                class_name: class,
                subject,
                date,
                entries,
            };
            let recorded = school.record_marks(&session, &request)?;
            println!("recorded {recorded} entries");
            Ok(())
        }
        Commands::Students { search, class } => {
            let data = school.load()?;
            print_json(&roster::search_students(&data, &search, class.as_deref()))
        }
        Commands::Fees { search } => {
            let data = school.load()?;
            print_json(&roster::search_fees(&data, &search))
        }
        Commands::Dashboard => print_json(&roster::dashboard_counts(&school.load()?)),
        Commands::Classes => {
            let data = school.load()?;
            let classes: Vec<ClassSummary> = roster::class_options(&data)
                .into_iter()
                .map(|display| {
                    let (name, section) = split_display_name(&display);
                    ClassSummary {
                        id: data
                            .class_by_name(&display)
                            .map(|class| class.id.clone())
                            .unwrap_or_default(),
                        subjects: data.subjects_for(&display).to_vec(),
                        display,
                        name,
                        section,
                    }
                })
                .collect();
            print_json(&classes)
        }
        Commands::Teachers => {
            let data = school.load()?;
            let cards: Vec<_> = data
                .teachers
                .iter()
                .map(profile::ContactCard::for_teacher)
                .collect();
            print_json(&cards)
        }
        Commands::Panel => {
            let session = require_session(&auth)?;
            print_json(&roster::teacher_panel_options(&school.load()?, &session))
        }
        Commands::Profile { code } => {
            let data = school.load()?;
            let student = data
                .student(&code)
                .ok_or_else(|| anyhow!("student `{code}` not found"))?;
            print_json(&StudentProfile {
                card: profile::ContactCard::for_student(student),
                details: profile::profile_details(student)
                    .into_iter()
                    .map(|(label, value)| (label.to_string(), value))
                    .collect(),
                recent: profile::recent_daily(student, profile::RECENT_DAILY_LIMIT)
                    .into_iter()
                    .map(|entry| {
                        format!(
                            "{} {} {}/{}",
                            entry.date, entry.subject, entry.marks, entry.total
                        )
                    })
                    .collect(),
            })
        }
        Commands::MarksSheet {
            class,
            subject,
            date,
        } => {
            let data = school.load()?;
            print_json(&profile::marks_entry_sheet(&data, &class, &subject, &date))
        }
        Commands::Report(report) => {
            let data = school.load()?;
            match report {
                ReportCommands::Student { code } => {
                    let student = data
                        .student(&code)
                        .ok_or_else(|| anyhow!("student `{code}` not found"))?;
                    print_json(&tables::student_record_sheet(student))
                }
                ReportCommands::Fees => print_json(&tables::fee_ledger(&data.fees)),
                ReportCommands::Consolidated { class } => {
                    if data.class_by_name(&class).is_none() {
                        bail!("class `{class}` not found");
                    }
                    let sheet = tables::class_consolidated_sheet(&data, &class);
                    if sheet.is_empty() {
                        eprintln!("no students in class `{class}`");
                    }
                    print_json(&sheet)
                }
            }
        }
    }
}

#[derive(Serialize)]
struct ClassSummary {
    id: String,
    display: String,
    name: String,
    section: Option<String>,
    subjects: Vec<String>,
}

#[derive(Serialize)]
struct StudentProfile {
    card: profile::ContactCard,
    details: Vec<(String, String)>,
    recent: Vec<String>,
}

fn load_config(flag: Option<PathBuf>) -> Result<SchoolbookConfig> {
    let path = flag.or_else(|| std::env::var_os(CONFIG_ENV_VAR).map(PathBuf::from));
    match path {
        Some(path) => Ok(SchoolbookConfig::load(path)?),
        None => Ok(SchoolbookConfig::default()),
    }
}

fn require_session(auth: &AuthService<SqliteKvRepository<'_>>) -> Result<Session> {
    auth.current_session()?
        .ok_or_else(|| anyhow!("not signed in; run `schoolbook login` first"))
}

/// Parses `CODE=OBTAINED[/TOTAL]`. An empty obtained value yields a blank
/// entry that the service skips.
fn parse_marks_entry(raw: &str, default_total: f64) -> Result<MarksEntry> {
    let (code, score) = raw
        .split_once('=')
        .ok_or_else(|| anyhow!("marks entry `{raw}` must look like CODE=OBTAINED[/TOTAL]"))?;
    let (obtained, total) = match score.split_once('/') {
        Some((obtained, total)) => (obtained, Some(total)),
        None => (score, None),
    };
    let total = match total.map(str::trim).filter(|total| !total.is_empty()) {
        Some(total) => total
            .parse::<f64>()
            .with_context(|| format!("invalid total in `{raw}`"))?,
        None => default_total,
    };
    let obtained = match obtained.trim() {
        "" => None,
        value => Some(
            value
                .parse::<f64>()
                .with_context(|| format!("invalid obtained marks in `{raw}`"))?,
        ),
    };
    Ok(MarksEntry {
        student_code: code.trim().to_string(),
        total,
        obtained,
    })
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
