mod common;

use axum::extract::State;
use lensmart_api::routes::health::health_check;

#[tokio::test]
async fn health_check_reports_database_down_without_failing() -> anyhow::Result<()> {
    let state = common::offline_state()?;
    let response = health_check(State(state)).await;
    assert_eq!(response.0.message, "Health check");

    let data = response.0.data.expect("health data");
    assert_eq!(data.status, "ok");
    assert_eq!(data.database, "down");
    assert_eq!(data.version, env!("CARGO_PKG_VERSION"));
    Ok(())
}

#[tokio::test]
async fn health_check_sees_live_database() -> anyhow::Result<()> {
    let Some(url) = common::database_url() else {
        return Ok(());
    };
    let harness = common::setup(&url).await?;

    let response = health_check(State(harness.state)).await;
    let data = response.0.data.expect("health data");
    assert_eq!(data.database, "up");
    Ok(())
}
