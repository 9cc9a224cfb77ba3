use std::sync::Arc;

use url::Url;

use crate::domain::ports::inbound::AvatarService;

#[derive(Clone)]
pub struct AppState {
    pub app_url: Url,
    pub avatar_service: Arc<dyn AvatarService>,
}

impl AppState {
    pub fn new(app_url: Url, avatar_service: Arc<dyn AvatarService>) -> Self {
        Self {
            app_url,
            avatar_service,
        }
    }
}
