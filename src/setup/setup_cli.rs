use chronicle_backend::config::Config;
use chronicle_backend::models::db_operations::accounts_db_operations;
use chronicle_backend::setup::db_setup;
use clap::{Parser, Subcommand};
use rusqlite::Connection;
use std::fs;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "setup_cli", author, version, about = "A CLI for initial application setup.", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Path to the .env configuration file.
    #[arg(long, required = true, value_name = "FILE")]
    env_file: PathBuf,
}

#[derive(Subcommand, Debug)]
enum Commands {
    Db {
        #[command(subcommand)]
        action: DbAction,
    },
    Admin {
        #[command(subcommand)]
        action: AdminAction,
    },
}

#[derive(Subcommand, Debug)]
enum DbAction {
    Setup,
}

#[derive(Subcommand, Debug)]
enum AdminAction {
    Create {
        #[arg(long)]
        username: String,
        #[arg(long)]
        email: String,
        #[arg(long)]
        password: String,
    },
    List,
    ChangePassword {
        #[arg(long)]
        username: String,
        #[arg(long)]
        new_password: String,
    },
}

fn main() {
    let cli = Cli::parse();

    let config = Config::from_env(&cli.env_file)
        .expect("FATAL: Failed to load or parse configuration.");

    match &cli.command {
        Commands::Db { action } => match action {
            DbAction::Setup => setup_feed_database(&config),
        },
        Commands::Admin { action } => match action {
            AdminAction::Create {
                username,
                email,
                password,
            } => {
                create_admin_account(&config, username, email, password);
            }
            AdminAction::List => {
                list_admin_accounts(&config);
            }
            AdminAction::ChangePassword {
                username,
                new_password,
            } => {
                change_admin_password(&config, username, new_password);
            }
        },
    }
}

fn setup_feed_database(config: &Config) {
    let db_path = config.feed_db_path();
    if db_path.exists() {
        println!("ℹ️ Feed database already exists at '{}'. Skipping creation.", db_path.display());
        return;
    }
    println!("\nSetting up feed database at '{}'...", db_path.display());

    if let Some(parent_dir) = db_path.parent() {
        fs::create_dir_all(parent_dir).expect("Could not create database directory.");
    }

    let mut conn = Connection::open(&db_path).expect("Could not create feed database file.");
    match db_setup::setup_feed_db(&mut conn) {
        Ok(_) => println!("✅ Feed database setup completed successfully."),
        Err(e) => eprintln!("❌ Error setting up feed database: {}", e),
    }
}

fn open_feed_db(config: &Config) -> Option<Connection> {
    let db_path = config.feed_db_path();
    if !db_path.exists() {
        eprintln!(
            "❌ Error: Feed database not found at '{}'. Please run `setup_cli db setup` first.",
            db_path.display()
        );
        return None;
    }
    Connection::open(&db_path).ok()
}

fn create_admin_account(config: &Config, username: &str, email: &str, password: &str) {
    let conn = match open_feed_db(config) {
        Some(c) => c,
        None => return,
    };

    match accounts_db_operations::create_admin_account(&conn, username, &email.to_lowercase(), password) {
        Ok(_) => println!("✅ Admin account '{}' created successfully.", username),
        Err(e) => eprintln!(
            "❌ Error creating admin account: {}. The username or email might already be taken.",
            e
        ),
    }
}

fn list_admin_accounts(config: &Config) {
    let conn = match open_feed_db(config) {
        Some(c) => c,
        None => return,
    };

    println!("Listing Admin Accounts:");
    match accounts_db_operations::read_admin_usernames(&conn) {
        Ok(usernames) => {
            for username in usernames {
                println!("- {}", username);
            }
        }
        Err(e) => eprintln!("❌ Error fetching admins: {}", e),
    }
}

fn change_admin_password(config: &Config, username: &str, new_password: &str) {
    let conn = match open_feed_db(config) {
        Some(c) => c,
        None => return,
    };

    match accounts_db_operations::update_password(&conn, username, new_password) {
        Ok(0) => eprintln!("❌ Error: No account named '{}' found.", username),
        Ok(_) => println!("✅ Password for account '{}' changed successfully.", username),
        Err(e) => eprintln!("❌ Error updating password: {}", e),
    }
}
