use quill_database::{config::QuillConfig, error::BackendResult, impls::QuillContext};
use server::start_server;
use std::net::SocketAddr;
use tokio::sync::oneshot;

pub mod api;
mod assets;
mod server;
pub mod validate;

pub async fn start(
    config: QuillConfig,
    override_bind: Option<SocketAddr>,
    notify_start: Option<oneshot::Sender<()>>,
) -> BackendResult<()> {
    let context = QuillContext::init(config, override_bind.is_some())?;
    start_server(context, override_bind, notify_start).await?;
    Ok(())
}
