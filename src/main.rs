use std::error::Error;

use storyboard::config::Config;
use storyboard::item::ItemId;
use storyboard::session::{LeaveReason, Session};

fn id_from_env(key: &str) -> Result<ItemId, Box<dyn Error>> {
    let raw = std::env::var(key).map_err(|e| format!("{key}: {e}"))?;
    let id = raw.trim().parse::<ItemId>().map_err(|e| format!("{key}: {e}"))?;
    Ok(id)
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    tracing_subscriber::fmt::init();

    let config = Config::from_env();
    let storyboard_id = id_from_env("STORYBOARD_ID")?;
    let project_id = id_from_env("PROJECT_ID")?;

    let session = Session::connect(&config, storyboard_id, project_id)?;
    session.load_all().await?;
    tracing::info!(
        frames = session.frames().len(),
        shots = session.shots().len(),
        tasks = session.tasks().tasks().len(),
        "storyboard-sync ready"
    );

    tokio::signal::ctrl_c().await?;
    let saved = session.leave(LeaveReason::Unload).await;
    tracing::info!(saved, "storyboard-sync stopped");
    Ok(())
}
