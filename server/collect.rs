use std::path::PathBuf;

use anyhow::Context as _;
use clap::{Parser, Subcommand};
use train_reveal_server::collector::{self, AMTRAKER_URL, MANIFEST_FILE};

#[derive(Parser, Debug)]
#[command(name = "train-data", version)]
struct Cli {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Fetch live positions and write schedule CSVs plus the train manifest.
    Collect(CollectArgs),
    /// Delete plot files that do not belong to the given image id.
    Trim(TrimArgs),
}

#[derive(Parser, Debug)]
struct CollectArgs {
    /// Image id embedded in the plot file names.
    img_id: String,

    /// Position feed URL.
    #[arg(long, default_value = AMTRAKER_URL)]
    feed_url: String,

    /// Directory receiving `north/` and `south/` schedule CSVs.
    #[arg(long, default_value = "train_data")]
    train_data_dir: PathBuf,

    /// Manifest output path.
    #[arg(long, default_value = MANIFEST_FILE)]
    out: PathBuf,
}

#[derive(Parser, Debug)]
struct TrimArgs {
    /// Substring that plot file names must contain to be kept.
    keep: String,

    /// Plot directory.
    #[arg(long, default_value = "plots")]
    dir: PathBuf,
}

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    env_logger::init_from_env(env_logger::Env::default().default_filter_or("info"));

    match Cli::parse().cmd {
        Command::Collect(args) => {
            let client = reqwest::Client::new();
            let feed = collector::fetch_feed(&client, &args.feed_url).await?;
            let report =
                collector::write_collection(&feed, &args.img_id, &args.train_data_dir, &args.out)
                    .context("failed to write collection")?;
            log::info!(
                "Wrote {} schedule files and {} manifest entries to {}",
                report.csv_files.len(),
                report.manifest_entries,
                args.out.display()
            );
        }
        Command::Trim(args) => {
            let removed = collector::trim_plots(&args.dir, &args.keep)?;
            log::info!("Removed {removed} plot files from {}", args.dir.display());
        }
    }

    Ok(())
}
