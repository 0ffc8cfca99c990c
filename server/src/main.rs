use clap::ArgAction;
use clap::{Args, Parser, Subcommand};
use dotenvy::dotenv;
use log::{error, warn};
use salas_server::cli;
use salas_server::cli_error::CliError;

fn main() {
    let args = CliArgs::parse();
    let dotenv_result = dotenv();

    let env = env_logger::Env::new().filter_or(
        "RUST_LOG",
        match args.global_opts.verbose {
            0 => "warn",
            1 => "info",
            2 => "debug",
            _ => "trace",
        },
    );
    env_logger::Builder::from_env(env).init();
    if let Err(e) = dotenv_result {
        warn!("Could not read .env file: {}", e);
    }

    if let Err(e) = run_command(args.command) {
        error!("{}", e);
        eprintln!("{}", e);
        std::process::exit(e.exit_code());
    }
}

fn run_command(command: Command) -> Result<(), CliError> {
    match command {
        Command::Serve => salas_server::web::serve(),
        Command::Migrate => cli::database_migration::run_migrations(),
        Command::CreateUser {
            username,
            admin,
            manager,
        } => cli::manage_users::create_user(&username, admin, manager),
        Command::SetPassword { username } => cli::manage_users::set_password(&username),
        Command::ListUsers => cli::manage_users::print_user_list(),
        Command::AddRoom { name, description } => {
            cli::manage_rooms::add_room(&name, &description)
        }
        Command::ListRooms => cli::manage_rooms::print_room_list(),
        Command::SetRoomActive { room_id, active } => {
            cli::manage_rooms::set_room_active(room_id, active)
        }
    }
}

/// Room booking and event scheduling server
#[derive(Debug, Parser)]
#[clap(name = "salas", version)]
pub struct CliArgs {
    #[clap(flatten)]
    global_opts: GlobalOpts,

    #[clap(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Serve the web application
    Serve,
    /// Migrate the database schema to the current version
    Migrate,
    /// Create a new user account. The password is queried interactively.
    CreateUser {
        username: String,
        /// Grant the administrator role (staff flag)
        #[clap(long)]
        admin: bool,
        /// Add the user to the event manager group
        #[clap(long)]
        manager: bool,
    },
    /// Set a new password for an existing user
    SetPassword { username: String },
    /// List all user accounts with their roles
    ListUsers,
    /// Create a new bookable room
    AddRoom {
        name: String,
        #[clap(long, default_value = "")]
        description: String,
    },
    /// List all rooms, including inactive ones
    ListRooms,
    /// Activate or deactivate a room. Inactive rooms cannot be selected for new bookings.
    SetRoomActive {
        room_id: i32,
        #[clap(action = ArgAction::Set)]
        active: bool,
    },
}

#[derive(Debug, Args)]
struct GlobalOpts {
    /// Verbosity level (can be specified multiple times)
    #[clap(long, short, global = true, action = ArgAction::Count)]
    verbose: u8,
}
