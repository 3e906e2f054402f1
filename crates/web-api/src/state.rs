use std::sync::Arc;

use application::{ChatContext, LocalConnectionHub};

use crate::JwtService;

#[derive(Clone)]
pub struct AppState {
    pub chat: Arc<ChatContext>,
    /// 与 `chat` 中的连接中心是同一个实例，这里保留具体类型用于注册连接
    pub hub: Arc<LocalConnectionHub>,
    pub jwt_service: Arc<JwtService>,
}

impl AppState {
    pub fn new(
        chat: Arc<ChatContext>,
        hub: Arc<LocalConnectionHub>,
        jwt_service: Arc<JwtService>,
    ) -> Self {
        Self {
            chat,
            hub,
            jwt_service,
        }
    }
}
