use poll_types::Invocation;
use tokio::net::TcpListener;
use tower_http::cors::CorsLayer;

use crate::config::GatewayConfig;
use crate::error::{GatewayError, GatewayResult};
use crate::handler::AppState;
use crate::router::build_router;

/// HTTP front end over the transaction and vote channels.
pub struct GatewayServer {
    config: GatewayConfig,
    state: AppState,
}

impl GatewayServer {
    /// Create the channels, seeding them if the config asks for it.
    pub fn new(config: GatewayConfig) -> GatewayResult<Self> {
        let state = AppState::new();
        if config.seed_ledgers {
            let init = Invocation::new("InitLedger", Vec::<String>::new());
            for channel in [&state.transactions, &state.votes] {
                let receipt = channel.submit(&init)?;
                tracing::info!(channel = channel.name(), tx = %receipt.tx_id.short(), "seeded ledger");
            }
        }
        Ok(Self { config, state })
    }

    pub fn config(&self) -> &GatewayConfig {
        &self.config
    }

    pub fn state(&self) -> &AppState {
        &self.state
    }

    /// Build the router (useful for testing).
    pub fn router(&self) -> axum::Router {
        let router = build_router(self.state.clone());
        if self.config.permissive_cors {
            router.layer(CorsLayer::permissive())
        } else {
            router
        }
    }

    /// Start serving requests.
    pub async fn serve(self) -> GatewayResult<()> {
        let app = self.router();
        let listener = TcpListener::bind(self.config.bind_addr).await?;
        tracing::info!("poll gateway listening on {}", self.config.bind_addr);
        axum::serve(listener, app)
            .await
            .map_err(|e| GatewayError::Internal(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn server_construction() {
        let server = GatewayServer::new(GatewayConfig::default()).unwrap();
        assert_eq!(server.config().bind_addr, "127.0.0.1:3000".parse().unwrap());
        assert_eq!(server.state().votes.sequence().unwrap(), 0);
    }

    #[test]
    fn seeding_runs_init_ledger_on_both_channels() {
        let config = GatewayConfig {
            seed_ledgers: true,
            ..GatewayConfig::default()
        };
        let server = GatewayServer::new(config).unwrap();
        assert_eq!(server.state().transactions.sequence().unwrap(), 1);
        assert_eq!(server.state().votes.sequence().unwrap(), 1);
        assert!(!server.state().votes.store().is_empty().unwrap());
    }

    #[test]
    fn router_builds() {
        let config = GatewayConfig {
            permissive_cors: true,
            ..GatewayConfig::default()
        };
        let server = GatewayServer::new(config).unwrap();
        let _router = server.router();
    }
}
