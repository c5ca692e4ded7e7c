use exercise_tracker::{
    config,
    server::{self, ServerState},
    state,
};
use tracing::error;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    config::init_tracing();
    let config = config::AppConfig::load()?;
    let (ctx, audit_writer) = state::build_context(config)?;

    let server_state = ServerState::new(ctx.clone());
    let server_task = tokio::spawn(async move {
        if let Err(err) = server::serve(server_state).await {
            error!(error = ?err, "server error");
        }
    });

    tokio::signal::ctrl_c().await?;
    ctx.request_shutdown();

    let _ = server_task.await;
    drop(ctx);

    if let Some(writer) = audit_writer {
        if let Err(err) = writer.await {
            error!(error = ?err, "audit writer join error");
        }
    }

    Ok(())
}
