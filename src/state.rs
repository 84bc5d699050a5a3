use std::sync::Arc;

use crate::store::Store;

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn Store>,
    pub jwt_secret: Arc<str>,
}

impl AppState {
    pub fn new(store: Arc<dyn Store>, jwt_secret: impl Into<Arc<str>>) -> Self {
        Self {
            store,
            jwt_secret: jwt_secret.into(),
        }
    }
}
