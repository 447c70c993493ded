use std::sync::Arc;

use mishwar_domain::identity::TokenVerifier;
use mishwar_domain::repository::{TripRepository, UserTokenRepository};
use mishwar_notify::Dispatcher;

#[derive(Clone)]
pub struct AppState {
    pub trips: Arc<dyn TripRepository>,
    pub user_tokens: Arc<dyn UserTokenRepository>,
    pub dispatcher: Arc<Dispatcher>,
    pub verifier: Arc<dyn TokenVerifier>,
}
