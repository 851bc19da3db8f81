use crate::api::api_routes;
use anyhow::anyhow;
use axum::{Router, middleware::from_fn_with_state};
use log::info;
use middleware::auth_middleware;
use quill_database::{error::BackendResult, impls::QuillContext};
use std::net::SocketAddr;
use tokio::{net::TcpListener, sync::oneshot};
use tower_http::{compression::CompressionLayer, cors::CorsLayer};

mod middleware;

pub(super) async fn start_server(
    context: QuillContext,
    override_bind: Option<SocketAddr>,
    notify_start: Option<oneshot::Sender<()>>,
) -> BackendResult<()> {
    let addr = match override_bind {
        Some(addr) => addr,
        None => context
            .conf
            .server
            .bind
            .parse()
            .map_err(|err| anyhow!("invalid bind address: {err}"))?,
    };

    let app = Router::new()
        .nest("/api/v1", api_routes())
        .layer(CorsLayer::permissive())
        .layer(CompressionLayer::new())
        .route_layer(from_fn_with_state(context.clone(), auth_middleware))
        .with_state(context);

    info!("Listening on {}", &addr);
    let listener = TcpListener::bind(&addr).await?;
    if let Some(notify_start) = notify_start {
        notify_start.send(()).expect("send oneshot");
    }
    axum::serve(listener, app.into_make_service()).await?;
    Ok(())
}
