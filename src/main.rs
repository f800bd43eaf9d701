use anyhow::Result;
use clap::Parser;
use mwgit::config::Settings;
use mwgit::convert::Pandoc;
use mwgit::error::MigrateError;
use mwgit::fetch::HttpAssetFetcher;
use mwgit::identity::{Blocklist, IdentityMap};
use mwgit::parser::DumpReader;
use mwgit::policy::InclusionPolicy;
use mwgit::replay::{ReplayEngine, ReplayReport};
use mwgit::store::{build_log, RevisionStore};
use mwgit::vcs::Git;
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Instant;
use tracing::info;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

#[derive(Parser)]
#[command(name = "mwgit", version)]
#[command(about = "Replay a MediaWiki XML dump as git history, one commit per revision")]
#[command(after_help = "White list: mwgit mediawiki.xml \"Main Page\" \"File:Example Image.jpg\"")]
struct Cli {
    /// MediaWiki XML export (.xml or .xml.bz2)
    dump: PathBuf,

    /// Only convert these pages (exact titles); all pages when omitted
    titles: Vec<String>,
}

fn banner(message: &str) {
    println!("{}", "=".repeat(60));
    println!("{}", message);
}

fn run(cli: Cli) -> Result<ReplayReport> {
    let settings = Settings::default();

    // Everything that can be misconfigured is checked before the dump is read.
    let identities = IdentityMap::load(&settings.identity_file)?;
    let blocklist = Blocklist::load(&settings.blocklist_file)?;
    let git = Git::open(&settings.git, &settings.work_dir)?;
    let fetcher = HttpAssetFetcher::new(&settings.base_url, settings.base_image_url())?;

    banner("Parsing XML and saving revisions by page.");
    let start_parsing = Instant::now();
    let mut reader = DumpReader::open(&cli.dump)?.with_blocklist(blocklist);
    let store = if settings.spill_to_disk {
        RevisionStore::spill_to_disk()?
    } else {
        RevisionStore::in_memory()
    };
    let log = build_log(reader.by_ref(), store)?;
    info!(
        revisions = log.len(),
        deleted = reader.deleted_count(),
        blocked = reader.blocked_count(),
        duration_secs = start_parsing.elapsed().as_secs_f64(),
        "Parsing complete"
    );

    banner("Sorting changes by revision date...");
    let engine = ReplayEngine::new(
        &settings.work_dir,
        InclusionPolicy::new(cli.titles),
        identities,
        Pandoc::new(&settings.pandoc),
        git,
        fetcher,
    );
    engine.run(&log)
}

fn print_summary(report: &ReplayReport) {
    let stats = &report.stats;
    banner("Summary");
    println!("Pages committed:    {}", stats.pages_committed);
    println!("Redirects:          {}", stats.redirects_committed);
    println!("Files committed:    {}", stats.media_committed);
    println!("Skipped:            {}", stats.skipped);
    println!("Excluded:           {}", stats.excluded());

    if !report.missing.is_empty() {
        println!();
        println!("Missing information for these usernames:");
        for (username, count) in report.missing.sorted() {
            println!("{} - {}", count, username);
        }
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_target(false)
        .finish();

    tracing::subscriber::set_global_default(subscriber).expect("Failed to set tracing subscriber");

    match run(cli) {
        Ok(report) => {
            print_summary(&report);
            info!("Completed successfully");
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("Error: {:#}", e);
            let status = e
                .downcast_ref::<MigrateError>()
                .map(MigrateError::exit_status)
                .unwrap_or(1);
            ExitCode::from(status)
        }
    }
}
