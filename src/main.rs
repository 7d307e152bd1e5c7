use axum_laundry::auth::TokenService;
use axum_laundry::config::Config;
use axum_laundry::errors::response::expose_internal_errors;
use axum_laundry::handlers;
use axum_laundry::services::LaundryStore;
use axum_laundry::state::AppState;

#[tokio::main]
async fn main() {
    // Initialize basic tracing subscriber
    tracing_subscriber::fmt::init();

    // Load configuration
    let config = Config::load().expect("Failed to load configuration");
    expose_internal_errors(config.app.debug);

    // Connect to the database and make sure the schema exists
    let store = LaundryStore::connect(&config.database)
        .await
        .expect("Failed to connect to database");
    store
        .init_schema()
        .await
        .expect("Failed to initialize database schema");
    tracing::info!("Database ready at {}", config.database.url);

    let tokens = TokenService::new(&config.auth.secret, config.auth.token_expiry_minutes);

    let state = AppState { store, tokens };

    let app = handlers::router(state);

    let addr = format!("{}:{}", config.server.host, config.server.port);
    tracing::info!("Server running on {}", addr);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .expect("Failed to bind server");

    axum::serve(listener, app.into_make_service())
        .await
        .expect("Failed to start server");
}
