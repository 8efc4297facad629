use clap::Parser;
use color_eyre::Result;
use color_eyre::eyre::Context;
use grouping_engine::{GroupingService, HttpImageProbe, RecognitionClient};
use grouping_store::{connect_and_migrate, PostgresStore};
use grouping_types::{load_settings, FaceInput};
use reqwest::Client;
use std::path::PathBuf;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

/// Demo driver for the face-grouping core: loads a batch of faces from a
/// JSON fixture and runs it through `processBatch`, printing the groups it
/// touched.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// User whose faces are being processed.
    #[clap(long)]
    user_id: String,

    /// File the batch's faces belong to. Must already exist in the `files`
    /// table with a reachable `url`.
    #[clap(long)]
    file_id: String,

    /// Path to a JSON array of face objects (see `FaceInput`).
    #[clap(long)]
    faces: PathBuf,

    /// Optional interview scope.
    #[clap(long)]
    interview_id: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let subscriber = FmtSubscriber::builder()
        .with_max_level(Level::INFO)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;
    color_eyre::install()?;

    let args = Args::parse();
    let settings = load_settings().context("failed to load grouping settings")?;

    let pool = connect_and_migrate(
        &settings.database_url,
        settings.database_max_connections,
        30,
    )
    .await?;
    let store = PostgresStore::new(pool);

    let http_client = Client::new();
    let match_resolver = RecognitionClient::new(
        http_client.clone(),
        settings.recognition_base_url.clone(),
        settings.recognition_collection_prefix.clone(),
        settings.similarity_threshold,
        settings.max_matches,
    );
    let image_probe = HttpImageProbe::new(http_client, settings.head_timeout_ms);

    let service = GroupingService::new(
        store,
        match_resolver,
        image_probe,
        settings.bounding_box_tolerance,
        settings.test_user_id.clone(),
    );

    let faces_json = std::fs::read_to_string(&args.faces)
        .with_context(|| format!("failed to read {}", args.faces.display()))?;
    let faces: Vec<FaceInput> = serde_json::from_str(&faces_json)
        .with_context(|| format!("failed to parse {} as FaceInput[]", args.faces.display()))?;

    info!(user_id = %args.user_id, file_id = %args.file_id, count = faces.len(), "submitting batch");

    let result = service
        .process_batch(&args.user_id, &args.file_id, faces, args.interview_id.as_deref())
        .await?;

    println!("processed {} face(s)", result.processed_count);
    for group in &result.groups {
        println!(
            "  group {}: {} face(s), leader={:?}, status={:?}",
            group.group_id, group.face_count, group.leader_face_id, group.status
        );
    }

    Ok(())
}
