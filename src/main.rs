mod auth;
mod catalog;
mod models;
mod notify;
mod provider;
mod tui;

use anyhow::{Context, Result, bail};
use auth::SessionController;
use clap::{Parser, Subcommand};
use models::FilterCriteria;
use notify::TerminalNotifier;
use provider::{MemoryIdentityProvider, RestIdentityProvider};
use std::io::Write;
use std::sync::Arc;

#[derive(Parser)]
#[command(name = "jobtrack")]
#[command(about = "Browse companies and job listings, and manage your JobTrack account")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List job listings
    Jobs {
        /// Match against job title, company name, or description
        #[arg(short, long)]
        search: Option<String>,

        /// Filter by job type (exact, e.g. "Full-time"); "all" disables
        #[arg(short = 't', long)]
        job_type: Option<String>,

        /// Filter by location (exact); "all" disables
        #[arg(short, long)]
        location: Option<String>,
    },

    /// Browse job listings interactively
    Browse {
        /// Initial search term
        #[arg(short, long)]
        search: Option<String>,

        /// Initial job type filter
        #[arg(short = 't', long)]
        job_type: Option<String>,

        /// Initial location filter
        #[arg(short, long)]
        location: Option<String>,
    },

    /// List companies
    Companies,

    /// Show a company and its openings
    Company {
        /// Company ID
        id: String,
    },

    /// Create an account
    Register {
        /// Display name
        #[arg(short, long)]
        name: String,

        /// Email address
        #[arg(short, long)]
        email: String,

        /// Profile photo URL (a default avatar is used if omitted)
        #[arg(long)]
        photo_url: Option<String>,

        /// Password (prompted for, with confirmation, if omitted)
        #[arg(long)]
        password: Option<String>,
    },

    /// Sign in
    Login {
        /// Email address
        #[arg(short, long, required_unless_present = "federated")]
        email: Option<String>,

        /// Password (prompted for if omitted)
        #[arg(long)]
        password: Option<String>,

        /// Use the provider's federated sign-in instead of a password
        #[arg(long)]
        federated: bool,
    },

    /// Sign out
    Logout,

    /// Send a password reset email
    ForgotPassword {
        /// Email address
        #[arg(short, long)]
        email: String,
    },

    /// Show or update the signed-in profile
    Profile {
        #[command(subcommand)]
        command: Option<ProfileCommands>,
    },
}

#[derive(Subcommand)]
enum ProfileCommands {
    /// Update display name and photo
    Update {
        /// New display name
        #[arg(short, long)]
        name: String,

        /// New photo URL
        #[arg(long)]
        photo_url: Option<String>,
    },
}

fn criteria_from_args(
    search: Option<String>,
    job_type: Option<String>,
    location: Option<String>,
) -> FilterCriteria {
    FilterCriteria {
        search_term: search.unwrap_or_default(),
        job_type: job_type.unwrap_or_default(),
        location: location.unwrap_or_default(),
    }
}

/// Provider selection: JOBTRACK_PROVIDER=memory runs against an in-process
/// fake (seeded with demo@jobtrack.dev / Passw0rd); anything else uses the
/// REST backend.
fn build_controller() -> Result<SessionController> {
    let notifier = Arc::new(TerminalNotifier);
    let provider: Arc<dyn auth::IdentityProvider> =
        if std::env::var("JOBTRACK_PROVIDER").as_deref() == Ok("memory") {
            Arc::new(
                MemoryIdentityProvider::new()
                    .with_account("demo@jobtrack.dev", "Passw0rd", "Demo User"),
            )
        } else {
            Arc::new(RestIdentityProvider::new()?)
        };
    Ok(SessionController::new(provider, notifier))
}

fn prompt(label: &str) -> Result<String> {
    print!("{}: ", label);
    std::io::stdout().flush()?;
    let mut line = String::new();
    std::io::stdin()
        .read_line(&mut line)
        .context("Failed to read input")?;
    Ok(line.trim_end_matches(['\r', '\n']).to_string())
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Jobs {
            search,
            job_type,
            location,
        } => {
            let companies = catalog::load_companies()?;
            let entries = catalog::flatten_listings(&companies);
            let criteria = criteria_from_args(search, job_type, location);
            let filtered = catalog::apply_filters(&entries, &criteria);

            if filtered.is_empty() {
                println!("No jobs found matching your criteria.");
            } else {
                let noun = if filtered.len() == 1 { "job" } else { "jobs" };
                println!("{} {} found", filtered.len(), noun);
                println!(
                    "{:<30} {:<22} {:<12} {:<16} {:<22}",
                    "TITLE", "COMPANY", "TYPE", "LOCATION", "SALARY"
                );
                println!("{}", "-".repeat(106));
                for entry in filtered {
                    println!(
                        "{:<30} {:<22} {:<12} {:<16} {:<22}",
                        truncate(&entry.job.title, 28),
                        truncate(&entry.company_name, 20),
                        truncate(&entry.job.job_type, 10),
                        truncate(&entry.job.location, 14),
                        truncate(&entry.job.salary, 20)
                    );
                }
            }
        }

        Commands::Browse {
            search,
            job_type,
            location,
        } => {
            let companies = catalog::load_companies()?;
            let entries = catalog::flatten_listings(&companies);
            let criteria = criteria_from_args(search, job_type, location);
            tui::run_browse(entries, criteria)?;
        }

        Commands::Companies => {
            let companies = catalog::load_companies()?;
            println!(
                "{:<12} {:<24} {:<14} {:<18} {:>5}",
                "ID", "NAME", "INDUSTRY", "LOCATION", "JOBS"
            );
            println!("{}", "-".repeat(77));
            for company in &companies {
                println!(
                    "{:<12} {:<24} {:<14} {:<18} {:>5}",
                    truncate(&company.id, 10),
                    truncate(&company.name, 22),
                    truncate(&company.industry, 12),
                    truncate(&company.location, 16),
                    company.jobs.len()
                );
            }
        }

        Commands::Company { id } => {
            let companies = catalog::load_companies()?;
            let Some(company) = catalog::find_company(&companies, &id) else {
                bail!("Company '{}' not found.", id);
            };
            println!("{}", company.name);
            println!("Industry: {}", company.industry);
            println!("Location: {}", company.location);
            println!("Website: {}", company.website);
            if company.jobs.is_empty() {
                println!("\nNo open positions.");
            } else {
                println!("\nOpen positions ({}):", company.jobs.len());
                for job in &company.jobs {
                    println!(
                        "  {} - {} ({}, {})",
                        job.id, job.title, job.job_type, job.location
                    );
                }
            }
        }

        Commands::Register {
            name,
            email,
            photo_url,
            password,
        } => {
            let controller = build_controller()?;
            if let Some(user) = controller.current_user() {
                println!("Already signed in as {}; log out first.", user.email);
                return Ok(());
            }
            let (password, confirm) = match password {
                Some(p) => (p.clone(), p),
                None => (prompt("Password")?, prompt("Confirm password")?),
            };
            controller.sign_up(&name, &email, &password, &confirm, photo_url.as_deref())?;
        }

        Commands::Login {
            email,
            password,
            federated,
        } => {
            let controller = build_controller()?;
            if let Some(user) = controller.current_user() {
                println!("Already signed in as {}; log out first.", user.email);
                return Ok(());
            }
            if federated {
                controller.federated_sign_in()?;
            } else {
                let email = email.unwrap_or_default();
                let password = match password {
                    Some(p) => p,
                    None => prompt("Password")?,
                };
                controller.sign_in(&email, &password)?;
            }
        }

        Commands::Logout => {
            let controller = build_controller()?;
            controller.sign_out()?;
        }

        Commands::ForgotPassword { email } => {
            let controller = build_controller()?;
            controller.request_password_reset(&email)?;
        }

        Commands::Profile { command } => {
            let controller = build_controller()?;
            match command {
                None => {
                    let Some(user) = controller.current_user() else {
                        bail!("Not signed in. Run 'jobtrack login' first.");
                    };
                    let name = if user.name.is_empty() { "(unset)" } else { user.name.as_str() };
                    println!("Name: {}", name);
                    println!("Email: {}", user.email);
                    println!("Photo: {}", user.photo_url);
                    println!("Provider: {}", user.provider);
                }
                Some(ProfileCommands::Update { name, photo_url }) => {
                    let photo = match photo_url {
                        Some(url) => url,
                        None => controller
                            .current_user()
                            .map(|u| u.photo_url)
                            .unwrap_or_default(),
                    };
                    controller.update_profile(&name, &photo)?;
                }
            }
        }
    }

    Ok(())
}

fn truncate(s: &str, max: usize) -> String {
    if s.len() <= max {
        s.to_string()
    } else {
        format!("{}...", &s[..max.saturating_sub(3)])
    }
}
