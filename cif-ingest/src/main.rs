use std::process::ExitCode;
use std::sync::Arc;

use cif_ingest::dedup::DedupSet;
use cif_ingest::pipeline::{Pipeline, RunOptions, RunStatus};
use cif_ingest::publish::LogPublisher;
use cif_ingest::stations::StationDirectory;

fn usage() -> ! {
    eprintln!("usage: cif-ingest <stations.json> <feed> [--force-refresh] [--run-id <id>]");
    eprintln!();
    eprintln!("The feed may be plain newline-delimited JSON or gzip-compressed.");
    std::process::exit(2);
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let mut positional = Vec::new();
    let mut force_refresh = false;
    let mut run_id = None;

    let mut args = std::env::args().skip(1);
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--force-refresh" => force_refresh = true,
            "--run-id" => run_id = Some(args.next().unwrap_or_else(|| usage())),
            _ if arg.starts_with("--") => usage(),
            _ => positional.push(arg),
        }
    }
    let [stations_path, feed_path] = positional.as_slice() else {
        usage();
    };
    let run_id = run_id.unwrap_or_else(|| format!("cli-{}", uuid::Uuid::new_v4()));

    let directory = match StationDirectory::from_json_file(stations_path) {
        Ok(directory) => directory,
        Err(e) => {
            eprintln!("cannot load station directory from {stations_path}: {e}");
            return ExitCode::FAILURE;
        }
    };
    tracing::info!(stations = directory.len(), "loaded station directory");

    let feed = match std::fs::File::open(feed_path) {
        Ok(file) => file,
        Err(e) => {
            eprintln!("cannot open feed {feed_path}: {e}");
            return ExitCode::FAILURE;
        }
    };

    let pipeline = Pipeline::new(Arc::new(directory), DedupSet::new(), Arc::new(LogPublisher));
    let options = RunOptions::new(run_id).force_refresh(force_refresh);
    let result = pipeline.run_stream(feed, options).await;

    match serde_json::to_string_pretty(&result) {
        Ok(json) => println!("{json}"),
        Err(e) => eprintln!("cannot render run result: {e}"),
    }

    if result.status == RunStatus::Failed {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    }
}
