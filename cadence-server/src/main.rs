use cadence_server::{Config, Server, ServerState, print_banner, setup_environment};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // dotenv, work dir, logging
    setup_environment()?;
    print_banner();

    let config = Config::from_env();
    tracing::info!(environment = %config.environment, "Cadence server starting");

    let state = ServerState::initialize(&config).await?;
    Server::with_state(config, state)
        .run()
        .await
        .inspect_err(|e| tracing::error!("Server error: {e}"))?;

    Ok(())
}
