use std::path::PathBuf;

use anyhow::Context;
use chrono::Utc;
use clap::{ArgGroup, Parser, Subcommand};
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};

use bootcamp_scores::{db, leaderboard, report, score};

#[derive(Parser)]
#[command(name = "bootcamp-scores")]
#[command(about = "Composite learner scores for bootcamp cohorts", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create or upgrade the database schema
    InitDb,
    /// Load realistic seed data
    Seed,
    /// Import objective reviews from a CSV file
    ImportAchievements {
        #[arg(long)]
        csv: PathBuf,
    },
    /// Import core skill ratings from a CSV file
    ImportRatings {
        #[arg(long)]
        csv: PathBuf,
    },
    /// Rank students by composite score
    #[command(group(
        ArgGroup::new("scope")
            .args(["cohort", "email"])
            .multiple(false)
    ))]
    Score {
        #[arg(long)]
        cohort: Option<String>,
        #[arg(long)]
        email: Option<String>,
        #[arg(long, default_value_t = 10)]
        limit: usize,
    },
    /// Generate a markdown report
    #[command(group(
        ArgGroup::new("scope")
            .args(["cohort", "email"])
            .multiple(false)
    ))]
    Report {
        #[arg(long)]
        cohort: Option<String>,
        #[arg(long)]
        email: Option<String>,
        #[arg(long, default_value = "report.md")]
        out: PathBuf,
    },
    /// Score literal weights and levels without touching the database
    Compute {
        #[arg(long = "weight", allow_hyphen_values = true)]
        weights: Vec<String>,
        #[arg(long = "level", allow_hyphen_values = true)]
        levels: Vec<String>,
    },
}

async fn connect() -> anyhow::Result<PgPool> {
    let database_url = std::env::var("DATABASE_URL")
        .context("DATABASE_URL must be set to a Postgres instance")?;

    let pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(&database_url)
        .await
        .context("failed to connect to Postgres")?;

    info!("connected to Postgres");
    Ok(pool)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Compute { weights, levels } => {
            let achievements = weights
                .iter()
                .map(|raw| score::parse_weight(raw))
                .collect::<Result<Vec<_>, _>>()?;
            let skills = levels
                .iter()
                .map(|raw| score::parse_level(raw))
                .collect::<Result<Vec<_>, _>>()?;
            let breakdown = score::explain_score(&achievements, &skills)?;
            println!(
                "score {} from {} points ({})",
                breakdown.score,
                breakdown.raw_total,
                report::describe_adjustment(&breakdown.adjustment)
            );
        }
        Commands::InitDb => {
            let pool = connect().await?;
            db::init_db(&pool).await?;
            println!("Schema ready.");
        }
        Commands::Seed => {
            let pool = connect().await?;
            db::seed(&pool).await?;
            println!("Seed data inserted.");
        }
        Commands::ImportAchievements { csv } => {
            let pool = connect().await?;
            let inserted = db::import_reviews_csv(&pool, &csv).await?;
            println!("Inserted {inserted} objective reviews from {}.", csv.display());
        }
        Commands::ImportRatings { csv } => {
            let pool = connect().await?;
            let inserted = db::import_ratings_csv(&pool, &csv).await?;
            println!("Inserted {inserted} skill ratings from {}.", csv.display());
        }
        Commands::Score {
            cohort,
            email,
            limit,
        } => {
            let pool = connect().await?;
            let achievements =
                db::fetch_achievements(&pool, cohort.as_deref(), email.as_deref()).await?;
            let ratings = db::fetch_ratings(&pool, cohort.as_deref(), email.as_deref()).await?;
            let scores = leaderboard::score_students(&achievements, &ratings)?;

            if scores.is_empty() {
                println!("No students found for this scope.");
                return Ok(());
            }

            println!("Top students by composite score:");
            for score in scores.iter().take(limit) {
                println!(
                    "- {} ({}, {}) score {} from {} points across {} objectives ({})",
                    score.student_name,
                    score.student_email,
                    score.cohort,
                    score.score,
                    score.raw_total,
                    score.achievement_count,
                    report::describe_adjustment(&score.adjustment)
                );
            }
        }
        Commands::Report { cohort, email, out } => {
            let pool = connect().await?;
            let achievements =
                db::fetch_achievements(&pool, cohort.as_deref(), email.as_deref()).await?;
            let ratings = db::fetch_ratings(&pool, cohort.as_deref(), email.as_deref()).await?;
            let scores = leaderboard::score_students(&achievements, &ratings)?;
            let skills = leaderboard::summarize_skills(&ratings);
            let report = report::build_report(
                cohort.as_deref().or(email.as_deref()),
                Utc::now().date_naive(),
                &scores,
                &skills,
                &achievements,
            );
            std::fs::write(&out, report)
                .with_context(|| format!("failed to write {}", out.display()))?;
            println!("Report written to {}.", out.display());
        }
    }

    Ok(())
}
