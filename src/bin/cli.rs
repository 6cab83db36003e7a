use clap::{Parser, Subcommand};
use jobboard::{
    db,
    repositories::SqliteUserRepository,
    services::user_service::{CreateUserRequest, UserService},
};
use std::sync::Arc;

#[derive(Parser)]
#[command(name = "jobboard-cli")]
#[command(about = "Operator tool for the job board database", long_about = None)]
struct Cli {
    /// Database URL (defaults to DATABASE_URL)
    #[arg(long, env = "DATABASE_URL")]
    database_url: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Apply pending schema migrations
    Migrate,

    /// User management commands
    User {
        #[command(subcommand)]
        command: UserCommands,
    },
}

#[derive(Subcommand)]
enum UserCommands {
    /// Create a new user
    Create {
        /// Email address
        #[arg(short, long)]
        email: String,

        /// Password (will prompt if not provided)
        #[arg(short, long)]
        password: Option<String>,

        /// candidate, employer or admin
        #[arg(short, long, default_value = "candidate")]
        role: String,

        /// Display name (defaults to the email's local part)
        #[arg(short, long)]
        name: Option<String>,
    },

    /// List all users
    List {
        /// Maximum number of users to display
        #[arg(short, long, default_value_t = 100)]
        limit: i64,

        /// Offset for pagination
        #[arg(short = 'o', long, default_value_t = 0)]
        offset: i64,
    },

    /// Set a new password for a user
    SetPassword {
        /// Email address of the user
        #[arg(short, long)]
        email: String,

        /// New password (will prompt if not provided)
        #[arg(short, long)]
        password: Option<String>,
    },
}

fn get_password(prompt: &str) -> Result<String, Box<dyn std::error::Error>> {
    use std::io::{self, Write};
    print!("{}: ", prompt);
    io::stdout().flush()?;

    Ok(rpassword::read_password()?)
}

/// Prompt twice and require both entries to match.
fn prompt_new_password(prompt: &str) -> Result<String, Box<dyn std::error::Error>> {
    let password = get_password(prompt)?;
    let confirm = get_password("Confirm password")?;
    if password != confirm {
        eprintln!("❌ Passwords do not match");
        std::process::exit(1);
    }
    Ok(password)
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load environment variables
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "jobboard=info,sqlx=warn".into()),
        )
        .init();

    // Parse CLI arguments
    let cli = Cli::parse();

    // Connect to database
    let pool = db::create_pool(&cli.database_url).await?;

    let user_command = match cli.command {
        Commands::Migrate => {
            let pending = db::pending_migrations(&pool).await?;
            if pending.is_empty() {
                println!("ℹ️  Database is up to date");
            } else {
                db::run_migrations(&pool).await?;
                println!("✅ Applied {} migration(s): {:?}", pending.len(), pending);
            }
            return Ok(());
        }
        Commands::User { command } => command,
    };

    let pending = db::pending_migrations(&pool).await?;
    if !pending.is_empty() {
        eprintln!("❌ Database has pending migrations; run `jobboard-cli migrate` first");
        std::process::exit(1);
    }

    // Initialize services
    let user_repository = Arc::new(SqliteUserRepository::new(pool.clone()));
    let user_service = Arc::new(UserService::new(user_repository));

    match user_command {
        UserCommands::Create {
            email,
            password,
            role,
            name,
        } => {
            let password = match password {
                Some(pw) => pw,
                None => prompt_new_password("Password")?,
            };

            let request = CreateUserRequest {
                email,
                password,
                role: Some(role),
                name,
            };

            match user_service.create_user(request).await {
                Ok(user) => {
                    println!("✅ User created successfully!");
                    println!("  ID: {}", user.id);
                    println!("  Email: {}", user.email);
                    println!("  Role: {}", user.role);
                    println!("  Name: {}", user.name);
                }
                Err(err) => {
                    eprintln!("❌ Failed to create user: {}", err);
                    std::process::exit(1);
                }
            }
        }

        UserCommands::List { limit, offset } => {
            match user_service.list_users(Some(limit), Some(offset)).await {
                Ok(users) => {
                    if users.is_empty() {
                        println!("No users found.");
                    } else {
                        println!(
                            "{:<5} {:<40} {:<10} {:<25} {:<20}",
                            "ID", "Email", "Role", "Name", "Created"
                        );
                        println!("{}", "-".repeat(100));
                        for user in users {
                            println!(
                                "{:<5} {:<40} {:<10} {:<25} {:<20}",
                                user.id,
                                user.email,
                                user.role,
                                user.name,
                                user.created_at.format("%Y-%m-%d %H:%M:%S").to_string()
                            );
                        }
                    }
                }
                Err(err) => {
                    eprintln!("❌ Failed to list users: {}", err);
                    std::process::exit(1);
                }
            }
        }

        UserCommands::SetPassword { email, password } => {
            let password = match password {
                Some(pw) => pw,
                None => prompt_new_password("New password")?,
            };

            match user_service.set_password(&email, &password).await {
                Ok(()) => {
                    println!("✅ Password updated successfully for '{}'!", email);
                }
                Err(err) => {
                    eprintln!("❌ Failed to update password: {}", err);
                    std::process::exit(1);
                }
            }
        }
    }

    Ok(())
}
