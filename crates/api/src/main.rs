use std::sync::Arc;

use provend_notify::{
    FsTemplateSource, InMemoryNotificationStore, NotificationDispatcher, NotifyConfig,
    NotifyWorker, RetrySweeper, TracingMailTransport,
};
use provend_orders::{EventSink, InMemoryOrderStore, ProcurementService};
use provend_vendors::InMemoryVendorStore;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    provend_api::telemetry::init();

    let config = match NotifyConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            tracing::error!(error = %e, "invalid notification configuration");
            std::process::exit(1);
        }
    };
    if config.approver_recipients.is_empty() {
        tracing::warn!("NOTIFY_APPROVERS not set; submission emails will have no recipients");
    }

    let template_dir =
        std::env::var("TEMPLATE_DIR").unwrap_or_else(|_| "templates".to_string());
    let bind_addr = std::env::var("BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:8080".to_string());

    let vendors = InMemoryVendorStore::arc();
    let orders = InMemoryOrderStore::arc();
    let notifications = InMemoryNotificationStore::arc();

    let sweep_interval = config.sweep_interval;
    let dispatcher = Arc::new(NotificationDispatcher::new(
        notifications.clone(),
        vendors.clone(),
        Arc::new(TracingMailTransport),
        Arc::new(FsTemplateSource::new(template_dir)),
        config,
    ));

    let (notify_handle, _worker) = NotifyWorker::spawn(dispatcher.clone());
    let _sweeper = RetrySweeper::spawn(dispatcher.clone(), sweep_interval);

    let sink: Arc<dyn EventSink> = Arc::new(notify_handle);
    let procurement = ProcurementService::new(orders, vendors.clone(), sink);

    let services = Arc::new(provend_api::services::AppServices::new(
        procurement,
        vendors,
        notifications,
        dispatcher,
    ));

    let app = provend_api::app::build_app(services);

    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;

    tracing::info!("listening on {}", listener.local_addr()?);

    axum::serve(listener, app).await?;
    Ok(())
}
