mod config;
mod db;
mod discover;
mod error;
mod extract;
mod fetch;
mod filter;
mod input;
mod llm;
mod pipeline;
mod sink;
mod throttle;

use std::path::PathBuf;
use std::time::Instant;

use clap::{Parser, Subcommand};

use crate::pipeline::Pipeline;

#[derive(Parser)]
#[command(name = "career_scraper", about = "Career-page scraper and LLM job-link ranker")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Load seed companies from a CSV into the work queue
    Init {
        /// Seed CSV: company domain, optional careers page URL
        #[arg(short, long)]
        input: PathBuf,
    },
    /// Probe for careers pages on companies that don't have one yet
    Discover {
        /// Max companies to probe (default: all pending)
        #[arg(short = 'n', long)]
        limit: Option<usize>,
    },
    /// Fetch careers pages and rank their links with the model
    Rank {
        /// Max companies to rank (default: all pending)
        #[arg(short = 'n', long)]
        limit: Option<usize>,
    },
    /// Follow each company's highest-scored link and persist job links
    Harvest {
        /// Max companies to harvest (default: all pending)
        #[arg(short = 'n', long)]
        limit: Option<usize>,
        /// Harvest from a pre-ranked CSV (domain, ranked links text)
        /// instead of the queue
        #[arg(short, long)]
        input: Option<PathBuf>,
    },
    /// Rank + harvest pending companies in one pass
    Run {
        /// Max companies to process
        #[arg(short = 'n', long)]
        limit: Option<usize>,
    },
    /// Show queue and result counts
    Stats,
    /// Dump the job_links table to CSV
    Export {
        /// Output path (default: job_links_<date>.csv)
        #[arg(short, long)]
        out: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let t0 = Instant::now();
    let cli = Cli::parse();
    let settings = config::Settings::load()?;

    let result = match cli.command {
        Commands::Init { input } => {
            let conn = db::connect(&settings.db_path)?;
            db::init_schema(&conn)?;
            let rows = input::read_seed_csv(&input)?;
            let seed: Vec<(String, Option<String>)> = rows
                .into_iter()
                .map(|r| (r.domain, r.careers_url))
                .collect();
            let inserted = db::insert_companies(&conn, &seed)?;
            println!(
                "Inserted {} new companies ({} rows in {}).",
                inserted,
                seed.len(),
                input.display()
            );
            Ok(())
        }
        Commands::Discover { limit } => {
            let conn = db::connect(&settings.db_path)?;
            db::init_schema(&conn)?;
            let mut pipeline = Pipeline::new(&conn, &settings)?;
            let stats = pipeline.discover(limit).await?;
            stats.print("Probed");
            Ok(())
        }
        Commands::Rank { limit } => {
            let conn = db::connect(&settings.db_path)?;
            db::init_schema(&conn)?;
            let mut pipeline = Pipeline::new(&conn, &settings)?;
            let stats = pipeline.rank(limit).await?;
            stats.print("Ranked");
            Ok(())
        }
        Commands::Harvest { limit, input } => {
            let conn = db::connect(&settings.db_path)?;
            db::init_schema(&conn)?;
            let mut pipeline = Pipeline::new(&conn, &settings)?;
            let stats = match input {
                Some(path) => {
                    let rows = input::read_ranked_csv(&path)?;
                    pipeline.harvest_rows(&rows).await?
                }
                None => pipeline.harvest(limit).await?,
            };
            stats.print("Harvested");
            Ok(())
        }
        Commands::Run { limit } => {
            let conn = db::connect(&settings.db_path)?;
            db::init_schema(&conn)?;
            let mut pipeline = Pipeline::new(&conn, &settings)?;
            let ranked = pipeline.rank(limit).await?;
            ranked.print("Ranked");
            let harvested = pipeline.harvest(limit).await?;
            harvested.print("Harvested");
            Ok(())
        }
        Commands::Stats => {
            let conn = db::connect(&settings.db_path)?;
            db::init_schema(&conn)?;
            let s = db::get_stats(&conn)?;
            println!("Companies:  {}", s.companies);
            println!("Discovered: {}", s.discovered);
            println!("Ranked:     {}", s.ranked);
            println!("Harvested:  {}", s.harvested);
            println!("Job links:  {}", s.job_links);
            Ok(())
        }
        Commands::Export { out } => {
            let conn = db::connect(&settings.db_path)?;
            db::init_schema(&conn)?;
            let out = out.unwrap_or_else(|| {
                PathBuf::from(format!(
                    "job_links_{}.csv",
                    chrono::Local::now().format("%Y%m%d")
                ))
            });
            let rows = db::fetch_job_links(&conn)?;
            sink::write_export(&out, &rows)?;
            println!("Wrote {} rows to {}.", rows.len(), out.display());
            Ok(())
        }
    };

    let elapsed = t0.elapsed();
    if elapsed.as_secs() >= 1 {
        println!("\nDone in {:.1}s", elapsed.as_secs_f64());
    }

    result
}
