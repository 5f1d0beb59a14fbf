//! Orders API Handlers

use std::collections::HashMap;

use axum::{
    Json,
    extract::{Path, Query, State},
};
use serde::Deserialize;

use shared::error::AppResult;
use shared::order::{
    NewOrder, NewOrderItem, Order, OrderDetail, OrderItem, OrderStatus, PaymentStatus,
};
use shared::response::{ApiResponse, PaginatedResponse};

use crate::api::context::RequestContext;
use crate::api::parse_tokens;
use crate::core::ServerState;
use crate::orders::{OrderFilter, SortField, SortOrder};
use crate::utils::time::{day_end_millis, day_start_millis, parse_date};

/// Order fields plus the item lines, accepted as one document.
#[derive(Debug, Deserialize)]
pub struct CreateOrderBody {
    #[serde(flatten)]
    pub order: NewOrder,
    #[serde(default)]
    pub items: Vec<NewOrderItem>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct ListOrdersQuery {
    /// Comma-separated status tokens
    pub statuses: Option<String>,
    /// Comma-separated payment-status tokens
    pub payment_statuses: Option<String>,
    pub table_id: Option<String>,
    /// YYYY-MM-DD, inclusive
    pub date_from: Option<String>,
    /// YYYY-MM-DD, inclusive
    pub date_to: Option<String>,
    pub search: Option<String>,
    pub active_only: Option<bool>,
    pub page: Option<u32>,
    pub per_page: Option<u32>,
    pub sort_by: Option<SortField>,
    pub sort_order: Option<SortOrder>,
}

impl ListOrdersQuery {
    fn into_filter(self) -> AppResult<OrderFilter> {
        let mut filter = OrderFilter::default();
        if let Some(raw) = &self.statuses {
            filter.statuses = parse_tokens(raw)?;
        }
        if let Some(raw) = &self.payment_statuses {
            filter.payment_statuses = parse_tokens(raw)?;
        }
        filter.table_id = self.table_id.filter(|t| !t.trim().is_empty());
        if let Some(date) = &self.date_from {
            filter.from = Some(day_start_millis(parse_date(date)?));
        }
        if let Some(date) = &self.date_to {
            filter.to = Some(day_end_millis(parse_date(date)?));
        }
        filter.search = self
            .search
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty());
        filter.active_only = self.active_only.unwrap_or(false);
        filter.page = self.page.unwrap_or(0);
        filter.per_page = self.per_page.unwrap_or(0);
        filter.sort_by = self.sort_by.unwrap_or_default();
        filter.sort_order = self.sort_order.unwrap_or_default();
        Ok(filter)
    }
}

#[derive(Debug, Deserialize)]
pub struct UpdateStatusBody {
    pub status: OrderStatus,
    /// Status the caller last saw; a mismatch is logged, never rejected
    #[serde(default)]
    pub expected_status: Option<OrderStatus>,
}

#[derive(Debug, Deserialize)]
pub struct CancelBody {
    pub reason: String,
}

#[derive(Debug, Deserialize)]
pub struct PaymentStatusBody {
    pub payment_status: PaymentStatus,
}

#[derive(Debug, Deserialize)]
pub struct AssignBody {
    /// Empty string clears the assignment
    #[serde(default)]
    pub staff_id: String,
}

#[derive(Debug, Deserialize)]
pub struct EstimatedReadyBody {
    /// Unix millis
    pub estimated_ready_at: i64,
}

#[derive(Debug, Deserialize)]
pub struct NotesBody {
    /// Empty string clears the notes
    #[serde(default)]
    pub notes: String,
}

#[derive(Debug, Deserialize)]
pub struct ItemStatusBody {
    pub status: OrderStatus,
}

#[derive(Debug, Deserialize)]
pub struct BulkItemStatusBody {
    pub item_ids: Vec<String>,
    pub status: OrderStatus,
}

/// POST /api/orders - create an order with its items
pub async fn create(
    State(state): State<ServerState>,
    context: RequestContext,
    Json(payload): Json<CreateOrderBody>,
) -> AppResult<Json<ApiResponse<OrderDetail>>> {
    let detail = state
        .service
        .create_order(&context.tenant_id, payload.order, payload.items)?;
    Ok(Json(ApiResponse::success_message(detail, "Order created")))
}

/// GET /api/orders - list orders with filters and pagination
pub async fn list(
    State(state): State<ServerState>,
    context: RequestContext,
    Query(query): Query<ListOrdersQuery>,
) -> AppResult<Json<ApiResponse<PaginatedResponse<Order>>>> {
    let filter = query.into_filter()?;
    let (items, pagination) = state.service.list_orders(&context.tenant_id, filter)?;
    Ok(Json(ApiResponse::success(PaginatedResponse {
        items,
        pagination,
    })))
}

/// GET /api/orders/counts - per-status counts over the trailing 24 hours
pub async fn counts(
    State(state): State<ServerState>,
    context: RequestContext,
) -> AppResult<Json<ApiResponse<HashMap<OrderStatus, u64>>>> {
    let counts = state.service.status_counts(&context.tenant_id)?;
    Ok(Json(ApiResponse::success(counts)))
}

/// GET /api/orders/:id - single order with its items
pub async fn get_by_id(
    State(state): State<ServerState>,
    context: RequestContext,
    Path(id): Path<String>,
) -> AppResult<Json<ApiResponse<OrderDetail>>> {
    let detail = state.service.get_order(&context.tenant_id, &id)?;
    Ok(Json(ApiResponse::success(detail)))
}

/// POST /api/orders/:id/status - advance the order through its lifecycle
pub async fn update_status(
    State(state): State<ServerState>,
    context: RequestContext,
    Path(id): Path<String>,
    Json(payload): Json<UpdateStatusBody>,
) -> AppResult<Json<ApiResponse<Order>>> {
    let order = state.service.update_order_status(
        &context.tenant_id,
        &id,
        payload.status,
        context.actor(),
        payload.expected_status,
    )?;
    Ok(Json(ApiResponse::success(order)))
}

/// POST /api/orders/:id/cancel - cancel with a mandatory reason
pub async fn cancel(
    State(state): State<ServerState>,
    context: RequestContext,
    Path(id): Path<String>,
    Json(payload): Json<CancelBody>,
) -> AppResult<Json<ApiResponse<Order>>> {
    let order =
        state
            .service
            .cancel_order(&context.tenant_id, &id, &payload.reason, context.actor())?;
    Ok(Json(ApiResponse::success_message(order, "Order cancelled")))
}

/// POST /api/orders/:id/payment-status - record settlement progress
pub async fn update_payment_status(
    State(state): State<ServerState>,
    context: RequestContext,
    Path(id): Path<String>,
    Json(payload): Json<PaymentStatusBody>,
) -> AppResult<Json<ApiResponse<Order>>> {
    let order =
        state
            .service
            .update_payment_status(&context.tenant_id, &id, payload.payment_status)?;
    Ok(Json(ApiResponse::success(order)))
}

/// POST /api/orders/:id/assign - assign a staff member (empty clears)
pub async fn assign(
    State(state): State<ServerState>,
    context: RequestContext,
    Path(id): Path<String>,
    Json(payload): Json<AssignBody>,
) -> AppResult<Json<ApiResponse<Order>>> {
    let order = state
        .service
        .assign_order(&context.tenant_id, &id, &payload.staff_id)?;
    Ok(Json(ApiResponse::success(order)))
}

/// POST /api/orders/:id/estimated-ready - promise a ready time to the customer
pub async fn set_estimated_ready(
    State(state): State<ServerState>,
    context: RequestContext,
    Path(id): Path<String>,
    Json(payload): Json<EstimatedReadyBody>,
) -> AppResult<Json<ApiResponse<Order>>> {
    let order =
        state
            .service
            .set_estimated_ready(&context.tenant_id, &id, payload.estimated_ready_at)?;
    Ok(Json(ApiResponse::success(order)))
}

/// POST /api/orders/:id/notes - internal notes (empty clears)
pub async fn update_notes(
    State(state): State<ServerState>,
    context: RequestContext,
    Path(id): Path<String>,
    Json(payload): Json<NotesBody>,
) -> AppResult<Json<ApiResponse<Order>>> {
    let order = state
        .service
        .update_notes(&context.tenant_id, &id, &payload.notes)?;
    Ok(Json(ApiResponse::success(order)))
}

/// POST /api/order-items/:id/status - advance a single item
pub async fn update_item_status(
    State(state): State<ServerState>,
    context: RequestContext,
    Path(id): Path<String>,
    Json(payload): Json<ItemStatusBody>,
) -> AppResult<Json<ApiResponse<OrderItem>>> {
    let item = state
        .service
        .update_order_item_status(&context.tenant_id, &id, payload.status)?;
    Ok(Json(ApiResponse::success(item)))
}

/// POST /api/order-items/status - advance a batch of items, all or nothing
pub async fn bulk_update_item_status(
    State(state): State<ServerState>,
    context: RequestContext,
    Json(payload): Json<BulkItemStatusBody>,
) -> AppResult<Json<ApiResponse<Vec<OrderItem>>>> {
    let items = state.service.bulk_update_item_status(
        &context.tenant_id,
        &payload.item_ids,
        payload.status,
    )?;
    Ok(Json(ApiResponse::success(items)))
}
