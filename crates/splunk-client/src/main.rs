use resource_framework::tracing::setup_tracing;
use resource_framework::{ListOptions, Params, Resource, ResourceMap};
use splunk_client::{Service, ServiceConfig};
use tracing::{error, info, Instrument};

#[tokio::main]
async fn main() -> Result<(), String> {
    setup_tracing();

    let config = ServiceConfig::from_env().map_err(|e| e.to_string())?;
    info!(url = %config.base_url(), namespace = %config.namespace(), "Starting");

    let service = Service::connect(config).await.map_err(|e| {
        error!(error = %e, "Login failed");
        e.to_string()
    })?;

    let info = service.info().await.map_err(|e| e.to_string())?;
    info!(
        version = info.text("version").unwrap_or("unknown"),
        server = info.text("serverName").unwrap_or("unknown"),
        "Server info"
    );

    let span = tracing::info_span!("inventory");
    async {
        let apps = service.apps().keys().await.map_err(|e| e.to_string())?;
        info!(count = apps.len(), "Apps");

        let indexes = service.indexes().keys().await.map_err(|e| e.to_string())?;
        info!(?indexes, "Indexes");

        let searches = service
            .saved_searches()
            .list(&ListOptions::new().count(10))
            .await
            .map_err(|e| e.to_string())?;
        info!(count = searches.len(), "Saved searches");
        Ok::<_, String>(())
    }
    .instrument(span)
    .await?;

    let span = tracing::info_span!("search");
    async {
        let mut job = service
            .search("search index=_internal | head 5", Params::new())
            .await
            .map_err(|e| e.to_string())?;
        info!(sid = %job.sid(), "Job dispatched");

        let state = job.get("dispatchState").await.map_err(|e| e.to_string())?;
        info!(sid = %job.sid(), state = state.as_str().unwrap_or("unknown"), "Job state");
        job.cancel().await.map_err(|e| e.to_string())?;
        Ok::<_, String>(())
    }
    .instrument(span)
    .await?;

    info!("Done");
    Ok(())
}
