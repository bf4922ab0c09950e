pub mod auth;
pub mod contribution;
pub mod event;
pub mod invitation;
pub mod log;
pub mod notification;
pub mod participation;
pub mod story;
pub mod voting;

use std::sync::Arc;

use crate::{config::Config, db::Stores};

use self::notification::Notifier;

/// Shared by every handler through `web::Data`.
#[derive(Clone)]
pub struct AppState {
    pub stores: Stores,
    pub notifier: Arc<dyn Notifier>,
    pub config: Config,
}
