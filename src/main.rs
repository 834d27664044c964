use std::net::SocketAddr;
use std::time::Duration;

use subscription_backoffice::{
    app_router,
    config::{get_config, init_config, LogFormat},
    database::pool::create_pool,
    AppState,
};
use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::EnvFilter;

fn init_tracing(format: LogFormat) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,tower_http=info,sqlx=warn"));
    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    match format {
        LogFormat::Json => builder.json().init(),
        LogFormat::Pretty => builder.init(),
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_config()?;
    let config = get_config();
    init_tracing(config.log_format);

    let pool = create_pool().await?;
    sqlx::migrate!("./migrations").run(&pool).await?;

    let app_state = AppState::new(pool);

    {
        let state = app_state.clone();
        let ttl_days = config.pending_plan_ttl_days;
        let every = Duration::from_secs(config.expiry_sweep_secs.max(1));
        tokio::spawn(async move {
            loop {
                match state.pending_plan_service.expire_stale(ttl_days).await {
                    Ok(0) => {}
                    Ok(expired) => info!(expired, ttl_days, "stale pending plans expired"),
                    Err(e) => tracing::error!(error = ?e, "Pending plan expiry sweep error"),
                }
                tokio::time::sleep(every).await;
            }
        });
    }

    let app = app_router(app_state);

    let addr: SocketAddr = config.server_address.parse()?;
    info!("Server listening on {}", addr);
    let listener = TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
