use clap::{Parser, Subcommand};
use dialoguer::{Input, Password};
use dotenvy::dotenv;
use lms_cli::seeder::{self, SeedConfig};
use lms_cli::{CliResult, admin, roles};
use lms_config::DatabaseConfig;
use sqlx::PgPool;

#[derive(Parser)]
#[command(name = "lms-cli")]
#[command(about = "LMS CLI - Administrative tools for the LMS API", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Apply pending database migrations
    Migrate,
    /// Create the default roles that are missing
    SeedRoles,
    /// Create a new admin account
    CreateAdmin {
        /// Display name of the admin
        #[arg(short = 'n', long)]
        name: Option<String>,

        /// Email address
        #[arg(short = 'e', long)]
        email: Option<String>,

        /// Password (will be prompted securely if not provided)
        #[arg(short = 'p', long)]
        password: Option<String>,
    },
    /// Seed the database with fake subjects, teachers and students
    Seed {
        /// Number of teachers to create
        #[arg(long, default_value = "10")]
        teachers: usize,

        /// Number of students to create
        #[arg(long, default_value = "50")]
        students: usize,

        /// Number of subjects to create
        #[arg(long, default_value = "8")]
        subjects: usize,

        /// Subjects attached to each teacher
        #[arg(long, default_value = "2")]
        subjects_per_teacher: usize,
    },
    /// Delete every seeded account
    ClearSeed,
}

#[tokio::main]
async fn main() {
    dotenv().ok();

    let cli = Cli::parse();

    let pool = match connect().await {
        Ok(pool) => pool,
        Err(e) => exit_with("Error connecting to database", e),
    };

    let result = match cli.command {
        Commands::Migrate => handle_migrate(&pool).await,
        Commands::SeedRoles => handle_seed_roles(&pool).await,
        Commands::CreateAdmin {
            name,
            email,
            password,
        } => handle_create_admin(&pool, name, email, password).await,
        Commands::Seed {
            teachers,
            students,
            subjects,
            subjects_per_teacher,
        } => {
            let config = SeedConfig {
                teachers,
                students,
                subjects,
                subjects_per_teacher,
            };
            seeder::seed_all(&pool, config).await
        }
        Commands::ClearSeed => handle_clear_seed(&pool).await,
    };

    if let Err(e) = result {
        exit_with("Command failed", e);
    }
}

async fn connect() -> CliResult<PgPool> {
    let config = DatabaseConfig::from_env().map_err(|_| "DATABASE_URL must be set")?;
    Ok(lms_db::init_db_pool(&config).await?)
}

fn exit_with(context: &str, error: Box<dyn std::error::Error>) -> ! {
    eprintln!("\n❌ {}: {}", context, error);
    std::process::exit(1);
}

async fn handle_migrate(pool: &PgPool) -> CliResult<()> {
    lms_db::run_migrations(pool).await?;
    println!("✅ Migrations applied");
    Ok(())
}

async fn handle_seed_roles(pool: &PgPool) -> CliResult<()> {
    let created = roles::seed_roles(pool).await?;
    println!(
        "✅ Created {} of {} default roles",
        created,
        roles::DEFAULT_ROLES.len()
    );
    Ok(())
}

async fn handle_create_admin(
    pool: &PgPool,
    name: Option<String>,
    email: Option<String>,
    password: Option<String>,
) -> CliResult<()> {
    let name = match name {
        Some(name) => name,
        None => Input::<String>::new().with_prompt("Name").interact_text()?,
    };

    let email = match email {
        Some(email) => email,
        None => Input::<String>::new().with_prompt("Email address").interact_text()?,
    };

    let password = match password {
        Some(password) => password,
        None => Password::new()
            .with_prompt("Password")
            .with_confirmation("Confirm password", "Passwords don't match")
            .interact()?,
    };

    let user_id = admin::create_admin(pool, &name, &email, &password).await?;

    println!("\n✅ Admin created successfully!");
    println!("   Id: {}", user_id);
    println!("   Email: {}", email);
    println!("   Name: {}", name);
    Ok(())
}

async fn handle_clear_seed(pool: &PgPool) -> CliResult<()> {
    let deleted = seeder::clear_seeded(pool).await?;
    println!("✅ Deleted {} seeded users", deleted);
    Ok(())
}
