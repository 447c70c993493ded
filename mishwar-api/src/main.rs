use std::net::SocketAddr;
use std::sync::Arc;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use mishwar_api::{app, worker::run_booking_worker, AppState};
use mishwar_api::auth::JwtTokenVerifier;
use mishwar_domain::identity::{MockTokenVerifier, TokenVerifier};
use mishwar_domain::repository::{TripRepository, UserTokenRepository};
use mishwar_notify::{Dispatcher, FcmClient, MockPushProvider, NotificationRouter, PushProvider};
use mishwar_store::{
    app_config, Config, DbClient, MemoryTripRepository, MemoryUserTokenRepository,
    PgTripRepository, PgUserTokenRepository,
};

#[tokio::main]
async fn main() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "mishwar_api=debug,tower_http=debug,axum::rejection=trace".into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::load().expect("Failed to load config");
    let run_mode = app_config::run_mode();
    let production = run_mode == "production";
    tracing::info!(
        "Starting Mishwar API on port {} ({} mode)",
        config.server.port,
        run_mode
    );

    // Trip and token storage
    let trips: Arc<dyn TripRepository>;
    let user_tokens: Arc<dyn UserTokenRepository>;
    match &config.database {
        Some(database) => {
            let db = DbClient::new(&database.url)
                .await
                .expect("Failed to connect to Postgres");
            db.ensure_schema().await.expect("Failed to prepare schema");
            trips = Arc::new(PgTripRepository::new(db.pool.clone()));
            user_tokens = Arc::new(PgUserTokenRepository::new(db.pool.clone()));
        }
        None => {
            if production {
                tracing::error!("No [database] configured; refusing to start in production");
                std::process::exit(1);
            }
            tracing::warn!("No [database] configured, using in-memory stores");
            trips = Arc::new(MemoryTripRepository::new());
            user_tokens = Arc::new(MemoryUserTokenRepository::new());
        }
    }

    // Token verification
    let verifier: Arc<dyn TokenVerifier> = match &config.auth {
        Some(auth) => Arc::new(JwtTokenVerifier::new(auth.jwt_secret.clone())),
        None => {
            if production {
                tracing::error!("No [auth] configured; refusing to start in production");
                std::process::exit(1);
            }
            tracing::warn!("No [auth] configured, accepting mock tokens");
            Arc::new(MockTokenVerifier)
        }
    };

    // Push delivery
    let provider: Arc<dyn PushProvider> = match &config.push {
        Some(push) => Arc::new(
            FcmClient::new(push.fcm_server_key.clone(), push.fcm_endpoint.clone())
                .expect("Failed to initialise FCM client"),
        ),
        None => {
            tracing::warn!("No [push] configured, notifications will only be logged");
            Arc::new(MockPushProvider)
        }
    };
    let dispatcher = Arc::new(Dispatcher::new(provider, user_tokens.clone()));

    // Booking events worker
    match config.kafka.clone() {
        Some(kafka) => {
            let router = Arc::new(NotificationRouter::new(
                dispatcher.clone(),
                user_tokens.clone(),
            ));
            tokio::spawn(run_booking_worker(
                kafka.brokers,
                kafka.group_id,
                kafka.booking_topic,
                router,
            ));
        }
        None => tracing::warn!("No [kafka] configured, booking events will not be consumed"),
    }

    let app_state = AppState {
        trips,
        user_tokens,
        dispatcher,
        verifier,
    };

    let app = app(app_state);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.server.port));
    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await.unwrap();
    axum::serve(listener, app).await.unwrap();
}
