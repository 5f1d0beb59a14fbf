//! Service Request API Handlers

use axum::{
    Json,
    extract::{Path, Query, State},
};
use serde::Deserialize;

use shared::error::AppResult;
use shared::request::{NewServiceRequest, ServiceRequest, ServiceRequestStatus};
use shared::response::{ApiResponse, PaginatedResponse};

use crate::api::context::RequestContext;
use crate::api::parse_tokens;
use crate::core::ServerState;
use crate::orders::ServiceRequestFilter;

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct ListServiceRequestsQuery {
    /// Comma-separated status tokens
    pub statuses: Option<String>,
    pub table_id: Option<String>,
    pub page: Option<u32>,
    pub per_page: Option<u32>,
}

impl ListServiceRequestsQuery {
    fn into_filter(self) -> AppResult<ServiceRequestFilter> {
        let mut filter = ServiceRequestFilter::default();
        if let Some(raw) = &self.statuses {
            filter.statuses = parse_tokens(raw)?;
        }
        filter.table_id = self.table_id.filter(|t| !t.trim().is_empty());
        filter.page = self.page.unwrap_or(0);
        filter.per_page = self.per_page.unwrap_or(0);
        Ok(filter)
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct AcknowledgeBody {
    /// Optional note relayed back to the table ("on my way")
    #[serde(default)]
    pub response_text: Option<String>,
}

/// POST /api/service-requests - customer calls for service (rate-limited)
pub async fn create(
    State(state): State<ServerState>,
    context: RequestContext,
    Json(payload): Json<NewServiceRequest>,
) -> AppResult<Json<ApiResponse<ServiceRequest>>> {
    let request = state
        .service
        .create_service_request(&context.tenant_id, payload)?;
    Ok(Json(ApiResponse::success_message(
        request,
        "Service request created",
    )))
}

/// GET /api/service-requests - list requests, newest first
pub async fn list(
    State(state): State<ServerState>,
    context: RequestContext,
    Query(query): Query<ListServiceRequestsQuery>,
) -> AppResult<Json<ApiResponse<PaginatedResponse<ServiceRequest>>>> {
    let filter = query.into_filter()?;
    let (items, pagination) = state
        .service
        .list_service_requests(&context.tenant_id, filter)?;
    Ok(Json(ApiResponse::success(PaginatedResponse {
        items,
        pagination,
    })))
}

/// POST /api/service-requests/:id/acknowledge - staff takes the request
///
/// Records who answered; `responded_by` is not touched again by the
/// later complete/cancel transitions.
pub async fn acknowledge(
    State(state): State<ServerState>,
    context: RequestContext,
    Path(id): Path<String>,
    Json(payload): Json<AcknowledgeBody>,
) -> AppResult<Json<ApiResponse<ServiceRequest>>> {
    let request = state.service.update_service_request_status(
        &context.tenant_id,
        &id,
        ServiceRequestStatus::Acknowledged,
        Some(context.actor()),
        payload.response_text,
    )?;
    Ok(Json(ApiResponse::success(request)))
}

/// POST /api/service-requests/:id/complete - request fulfilled
pub async fn complete(
    State(state): State<ServerState>,
    context: RequestContext,
    Path(id): Path<String>,
) -> AppResult<Json<ApiResponse<ServiceRequest>>> {
    let request = state.service.update_service_request_status(
        &context.tenant_id,
        &id,
        ServiceRequestStatus::Completed,
        None,
        None,
    )?;
    Ok(Json(ApiResponse::success(request)))
}

/// POST /api/service-requests/:id/cancel - request withdrawn
pub async fn cancel(
    State(state): State<ServerState>,
    context: RequestContext,
    Path(id): Path<String>,
) -> AppResult<Json<ApiResponse<ServiceRequest>>> {
    let request = state.service.update_service_request_status(
        &context.tenant_id,
        &id,
        ServiceRequestStatus::Cancelled,
        None,
        None,
    )?;
    Ok(Json(ApiResponse::success(request)))
}
