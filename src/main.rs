use std::sync::Arc;

use oshi_sync::{
    Outcome, SortOrder,
    auth::JwtSessionResolver,
    configuration::Config,
    state::AppState,
    telemetry::{get_subscriber, init_subscriber},
};
use secrecy::SecretString;

/// Prints the catalog as the view layer would receive it.
///
/// Usage: `oshi-sync [sort]`. Set `OSHI_SYNC_TOKEN` to read as a signed-in user.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::new()?;

    let subscriber = get_subscriber(
        config.application.name.clone(),
        config.application.log_level.clone(),
        std::io::stderr,
    );
    init_subscriber(subscriber)?;

    let sessions = Arc::new(JwtSessionResolver::new(config.jwt.clone()));
    if let Ok(token) = std::env::var("OSHI_SYNC_TOKEN") {
        sessions.set_token(SecretString::from(token)).await;
    }

    let sort = SortOrder::normalize(std::env::args().nth(1).as_deref());
    let state = AppState::init(config, sessions);

    let outcome: Outcome<_> = state.oshi_lists().catalog(sort).await.into();
    println!("{}", serde_json::to_string_pretty(&outcome)?);

    Ok(())
}
