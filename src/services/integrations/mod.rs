pub mod create;
pub mod list;

use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};
use serde::Deserialize;
use std::sync::Arc;

use crate::models::integrations::requests::CreateIntegrationRequest;
use crate::storage::Storage;

/// 集成列表查询参数
#[derive(Debug, Clone, Deserialize)]
pub struct IntegrationListQuery {
    pub course_id: i64,
    #[serde(default)]
    pub active_only: bool,
}

pub struct IntegrationService {
    storage: Option<Arc<dyn Storage>>,
}

impl IntegrationService {
    pub fn new_lazy() -> Self {
        Self { storage: None }
    }

    pub(crate) fn get_storage(&self, request: &HttpRequest) -> Arc<dyn Storage> {
        if let Some(storage) = &self.storage {
            storage.clone()
        } else {
            super::storage_from_request(request)
        }
    }

    pub async fn create_integration(
        &self,
        request: &HttpRequest,
        req: CreateIntegrationRequest,
    ) -> ActixResult<HttpResponse> {
        create::create_integration(self, request, req).await
    }

    pub async fn list_integrations(
        &self,
        request: &HttpRequest,
        query: IntegrationListQuery,
    ) -> ActixResult<HttpResponse> {
        list::list_integrations(self, request, query).await
    }
}
