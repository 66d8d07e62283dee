//! Dashboard CLI
//!
//! Drives the dashboard against a running API and prints the rendered regions.
//! The session token is kept in a JSON file between invocations.
//!
//! Usage:
//!   dashboard login --email admin@scholarships.local --password admin12345
//!   dashboard scholarships --search stem
//!   dashboard apply 3 --essay "..." --achievements "..."

use anyhow::{anyhow, Result};
use clap::{Parser, Subcommand};
use scholarship_backend::applications::{ApplicationData, ReviewDecision};
use scholarship_backend::auth::UserRole;
use scholarship_backend::dashboard::{ApiClient, Dashboard, Session};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "dashboard")]
#[command(about = "Scholarship management dashboard")]
struct Args {
    /// API base URL
    #[arg(long, env = "SCHOLARSHIP_API_URL", default_value = "http://127.0.0.1:8000")]
    api_url: String,

    /// Where the session token is stored
    #[arg(long, env = "SCHOLARSHIP_SESSION_FILE", default_value = ".scholarship-session.json")]
    session_file: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    Login {
        #[arg(long)]
        email: String,
        #[arg(long)]
        password: String,
    },
    Register {
        #[arg(long)]
        name: String,
        #[arg(long)]
        email: String,
        #[arg(long)]
        password: String,
        #[arg(long, default_value = "student", value_parser = parse_role)]
        role: UserRole,
    },
    Logout,
    /// Landing page (stats for admins, recent scholarships)
    Home,
    Scholarships {
        #[arg(long)]
        search: Option<String>,
        #[arg(long)]
        page: Option<u32>,
    },
    Show {
        id: i64,
    },
    /// Save a draft application
    Apply {
        scholarship_id: i64,
        #[arg(long)]
        essay: String,
        #[arg(long)]
        achievements: String,
        #[arg(long, default_value = "")]
        extracurricular: String,
    },
    Mine {
        #[arg(long, default_value_t = 1)]
        page: u32,
    },
    Submit {
        id: i64,
    },
    Queue {
        #[arg(long, default_value_t = 1)]
        page: u32,
    },
    Review {
        id: i64,
        #[arg(value_parser = parse_decision)]
        decision: ReviewDecision,
        #[arg(long)]
        notes: Option<String>,
    },
}

fn parse_role(raw: &str) -> Result<UserRole, String> {
    raw.parse()
}

fn parse_decision(raw: &str) -> Result<ReviewDecision, String> {
    match raw {
        "approve" | "approved" => Ok(ReviewDecision::Approved),
        "reject" | "rejected" => Ok(ReviewDecision::Rejected),
        other => Err(format!("unknown decision '{}' (approve|reject)", other)),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let _ = dotenv::dotenv();
    let args = Args::parse();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "scholarship_backend=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let client = ApiClient::new(&args.api_url)?;
    let mut dashboard =
        Dashboard::new(client).map_err(|e| anyhow!("Failed to compile templates: {}", e))?;

    if let Some(stored) = Session::load(&args.session_file)? {
        dashboard.restore_session(&stored.token).await;
    }

    let ok = match args.command {
        Command::Login { email, password } => dashboard.login(&email, &password).await,
        Command::Register {
            name,
            email,
            password,
            role,
        } => dashboard.register(&name, &email, &password, role).await,
        Command::Logout => dashboard.logout().await,
        Command::Home => dashboard.load_dashboard().await,
        Command::Scholarships { search, page } => {
            dashboard.load_scholarships(search.as_deref(), page).await
        }
        Command::Show { id } => dashboard.view_scholarship(id).await,
        Command::Apply {
            scholarship_id,
            essay,
            achievements,
            extracurricular,
        } => {
            let data = ApplicationData {
                essay,
                achievements,
                extracurricular,
            };
            dashboard.apply_for(scholarship_id, data).await
        }
        Command::Mine { page } => dashboard.load_my_applications(page).await,
        Command::Submit { id } => dashboard.submit_application(id).await,
        Command::Queue { page } => dashboard.load_review_queue(page).await,
        Command::Review {
            id,
            decision,
            notes,
        } => {
            dashboard
                .review_application(id, decision, notes.as_deref())
                .await
        }
    };

    match dashboard.session() {
        Some(session) => session.save(&args.session_file)?,
        None => Session::clear(&args.session_file)?,
    }

    print_view(&dashboard);

    if ok {
        Ok(())
    } else {
        Err(anyhow!("action failed"))
    }
}

fn print_view(dashboard: &Dashboard) {
    let view = dashboard.view();
    for note in view.notifications() {
        eprintln!("[{:?}] {}", note.level, note.message);
    }

    let regions = view.regions();
    if regions.page_title.is_empty() {
        return;
    }
    println!("<!-- navbar -->\n{}", regions.navbar.trim());
    println!("<!-- {} -->", regions.page_title);
    if !regions.page_actions.trim().is_empty() {
        println!("{}", regions.page_actions.trim());
    }
    println!("{}", regions.content.trim());
}
