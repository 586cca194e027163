use anyhow::{Context, Result};
use clap::Parser;

use khatma::cli::args::{Cli, Commands};
use khatma::cli::handlers::{self, Session};
use khatma::config::AppConfig;
use khatma::{db, services, tui};

fn main() -> Result<()> {
    env_logger::init();

    let cli = Cli::parse();
    let config = AppConfig::load().context("Loading config")?;
    services::configure(&config);

    AppConfig::ensure_data_dir()?;
    let db_path = AppConfig::db_path()?;
    let conn = db::open(&db_path)?;

    let mut session = Session::new(conn, config, cli.user, cli.json);

    match cli.command {
        Some(Commands::Setup { reset }) => handlers::handle_setup(&mut session, reset)?,
        Some(Commands::Register { username, name, email }) => {
            handlers::users::handle_register(&session, &username, name.as_deref(), email.as_deref())?
        }
        Some(Commands::Users) => handlers::users::handle_users(&session)?,
        Some(Commands::Profile { action }) => {
            handlers::users::handle_profile(&session, action.as_ref())?
        }
        Some(Commands::Achievements) => handlers::users::handle_achievements(&session)?,
        Some(Commands::Khatma { action }) => handlers::khatmas::handle_khatma(&session, &action)?,
        Some(Commands::Group { action }) => handlers::groups::handle_group(&session, &action)?,
        Some(Commands::Chat { action }) => handlers::chat::handle_chat(&session, &action)?,
        Some(Commands::Notifications { action }) => {
            handlers::notifications::handle_notifications(&session, &action)?
        }
        Some(Commands::Quran { action }) => handlers::quran::handle_quran(&mut session, &action)?,
        Some(Commands::Memorial { action }) => {
            handlers::memorials::handle_memorial(&session, &action)?
        }
        Some(Commands::Dashboard) => handlers::overview::handle_dashboard(&session)?,
        Some(Commands::Community) => handlers::overview::handle_community(&session)?,
        Some(Commands::Search { query }) => handlers::overview::handle_search(&session, &query)?,
        Some(Commands::Run { job }) => handlers::overview::handle_run(&session, &job)?,

        // No subcommand → launch TUI
        None => {
            if session.acting.is_none() {
                eprintln!("No reader configured. Running setup...");
                eprintln!();
                handlers::handle_setup(&mut session, false)?;
            }
            let user = session.actor()?;
            tui::app::run(session.conn, session.config, user)?;
        }
    }

    Ok(())
}
