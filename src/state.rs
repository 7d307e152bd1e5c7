use crate::auth::TokenService;
use crate::services::LaundryStore;

/// Shared application state handed to every handler. Configuration is
/// consumed at startup; only the live components travel with requests.
#[derive(Clone)]
pub struct AppState {
    pub store: LaundryStore,
    pub tokens: TokenService,
}
