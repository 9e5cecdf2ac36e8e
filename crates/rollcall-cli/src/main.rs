use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use rollcall_core::{AttendanceStatus, FaceEngine, KnownFaceRegistry, PlaceholderEngine};
use rollcall_store::{schema, students};
use rusqlite::Connection;

#[derive(Parser)]
#[command(name = "rollcall", about = "Rollcall attendance database tool")]
struct Cli {
    /// SQLite database shared with rollcalld
    #[arg(long, env = "ROLLCALL_DB_PATH", default_value_os_t = default_db_path())]
    db: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create tables and seed a teacher account
    Init {
        #[arg(long, default_value = "teacher1")]
        username: String,
        #[arg(long, default_value = "1234")]
        password: String,
    },
    /// List students and their attendance
    List {
        /// Print JSON instead of a table
        #[arg(long)]
        json: bool,
    },
    /// Set one student's attendance
    Mark {
        id: i64,
        /// "present" or "absent"
        status: AttendanceStatus,
    },
    /// Mark every student absent
    Reset,
    /// Print the placeholder encoding for an image file
    Encode { path: PathBuf },
    /// Compute and store encodings for students that lack one
    Backfill,
}

fn default_db_path() -> PathBuf {
    std::env::var("XDG_DATA_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| {
            let home = std::env::var("HOME").unwrap_or_else(|_| "/tmp".to_string());
            PathBuf::from(home).join(".local/share")
        })
        .join("rollcall")
        .join("attendance.db")
}

fn open(path: &Path) -> Result<Connection> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("creating {}", parent.display()))?;
    }
    let conn = Connection::open(path).with_context(|| format!("opening {}", path.display()))?;
    schema::configure(&conn)?;
    schema::ensure_schema(&conn)?;
    tracing::debug!(db = %path.display(), "database opened");
    Ok(conn)
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();
    let db = cli.db;

    match cli.command {
        Commands::Init { username, password } => {
            let conn = open(&db)?;
            if schema::seed_teacher(&conn, &username, &password)? {
                println!("Initialized {} with teacher {username}", db.display());
            } else {
                println!("Initialized {} (teacher {username} already exists)", db.display());
            }
        }
        Commands::List { json } => {
            let rows = students::list(&open(&db)?)?;
            if json {
                println!("{}", serde_json::to_string_pretty(&rows)?);
            } else if rows.is_empty() {
                println!("No students registered");
            } else {
                println!("{:>6}  {:<8}  NAME", "ID", "STATUS");
                for s in rows {
                    println!("{:>6}  {:<8}  {}", s.id, s.status, s.name);
                }
            }
        }
        Commands::Mark { id, status } => {
            if students::set_present(&open(&db)?, id, status.is_present())? {
                println!("Student {id} marked as {status}");
            } else {
                anyhow::bail!("no student with id {id}");
            }
        }
        Commands::Reset => {
            let n = students::set_all_present(&open(&db)?, false)?;
            println!("Reset {n} student(s) to absent");
        }
        Commands::Backfill => {
            let report = backfill(&open(&db)?, &PlaceholderEngine)?;
            println!(
                "{} known face(s), {} encoding(s) stored, {} skipped",
                report.known_faces, report.stored, report.skipped.len()
            );
            for id in report.skipped {
                println!("  skipped student {id}");
            }
        }
        Commands::Encode { path } => {
            let encoding = PlaceholderEngine
                .compute_encoding(&path)
                .with_context(|| format!("encoding {}", path.display()))?;
            println!("{}", encoding.to_json()?);
        }
    }

    Ok(())
}

struct BackfillReport {
    known_faces: usize,
    stored: usize,
    skipped: Vec<i64>,
}

fn backfill(conn: &Connection, engine: &dyn FaceEngine) -> Result<BackfillReport> {
    let records = students::load_all(conn)?;
    let rebuild = KnownFaceRegistry::rebuild(records.into_iter().map(Into::into), engine);

    let mut stored = 0;
    for (id, encoding) in &rebuild.backfilled {
        if students::update_encoding(conn, *id, encoding)? {
            stored += 1;
        }
    }
    Ok(BackfillReport {
        known_faces: rebuild.registry.len(),
        stored,
        skipped: rebuild.skipped,
    })
}
