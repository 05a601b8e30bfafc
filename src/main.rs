use anyhow::Result;
use clap::{Arg, ArgAction, Command};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

use meeting_assistant::{
    combine_documents, AgendaGenerator, Config, HttpTransport, VideoPipeline,
};

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "meeting_assistant=info,warn".into()),
        )
        .init();

    let matches = Command::new("Meeting Assistant")
        .version("0.1.0")
        .about("Meeting agenda generation and video transcription/summarization")
        .subcommand_required(true)
        .subcommand(
            Command::new("video")
                .about("Transcribe and summarize a meeting video")
                .arg(
                    Arg::new("file")
                        .value_name("FILE")
                        .help("Video file to process")
                        .required(true),
                ),
        )
        .subcommand(
            Command::new("agenda")
                .about("Generate a meeting agenda from documents and points")
                .arg(
                    Arg::new("doc")
                        .long("doc")
                        .value_name("FILE")
                        .help("Meeting document (repeatable)")
                        .action(ArgAction::Append)
                        .required(true),
                )
                .arg(
                    Arg::new("points")
                        .long("points")
                        .value_name("TEXT")
                        .help("Comma-separated meeting points")
                        .required(true),
                ),
        )
        .get_matches();

    let config = Config::load();

    // Pre-flight: a bad credential must surface here, not mid-pipeline
    if let Err(e) = config.validate() {
        eprintln!("{}", e);
        std::process::exit(1);
    }

    match matches.subcommand() {
        Some(("video", sub)) => {
            let path = PathBuf::from(sub.get_one::<String>("file").unwrap());
            info!("Processing video: {}", path.display());

            let pipeline = VideoPipeline::with_http(config)?;
            let outcome = pipeline.process_file(&path).await;

            match (outcome.transcript, outcome.summary) {
                (Some(transcript), Some(summary)) => {
                    println!("=== Transcription ===\n{}\n", transcript);
                    println!("=== Summary ===\n{}", summary);
                }
                (Some(transcript), None) => {
                    println!("=== Transcription ===\n{}\n", transcript);
                    eprintln!("Summarization failed; transcript shown without a summary.");
                }
                _ => {
                    eprintln!("Video processing failed. See the log for details.");
                    std::process::exit(1);
                }
            }
        }
        Some(("agenda", sub)) => {
            let docs: Vec<PathBuf> = sub
                .get_many::<String>("doc")
                .unwrap()
                .map(PathBuf::from)
                .collect();
            let points = sub.get_one::<String>("points").unwrap();

            info!("Generating agenda from {} document(s)", docs.len());

            let documents_text = combine_documents(&docs).await?;
            let transport = Arc::new(HttpTransport::new(Duration::from_secs(
                config.api.request_timeout_seconds,
            ))?);
            let generator =
                AgendaGenerator::new(config.agenda.clone(), config.token().to_string(), transport);

            match generator.generate(&documents_text, points).await {
                Ok(agenda) => println!("{}", agenda),
                Err(e) => {
                    eprintln!("Agenda generation failed: {}", e);
                    std::process::exit(1);
                }
            }
        }
        _ => unreachable!("subcommand required"),
    }

    Ok(())
}
