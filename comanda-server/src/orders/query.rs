//! List filters, sorting and pagination for the read paths
//!
//! Filters are typed here; the API layer is responsible for parsing query
//! strings (comma-separated status sets, YYYY-MM-DD dates) into these
//! structures before they reach the store.

use shared::order::{Order, OrderStatus, PaymentStatus};
use shared::request::{ServiceRequest, ServiceRequestStatus};
use shared::response::Pagination;

pub const DEFAULT_PER_PAGE: u32 = 50;

/// Sort field for order listings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortField {
    #[default]
    CreatedAt,
    OrderNumber,
    TotalAmount,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortOrder {
    Asc,
    #[default]
    Desc,
}

/// Order list filter. Empty vectors mean "no restriction".
#[derive(Debug, Clone, Default)]
pub struct OrderFilter {
    pub statuses: Vec<OrderStatus>,
    pub payment_statuses: Vec<PaymentStatus>,
    pub table_id: Option<String>,
    /// created_at lower bound (millis, inclusive)
    pub from: Option<i64>,
    /// created_at upper bound (millis, inclusive)
    pub to: Option<i64>,
    /// Case-insensitive match over order number and customer name
    pub search: Option<String>,
    /// Everything except the two terminal states
    pub active_only: bool,
    pub page: u32,
    pub per_page: u32,
    pub sort_by: SortField,
    pub sort_order: SortOrder,
}

impl OrderFilter {
    pub fn matches(&self, order: &Order) -> bool {
        if self.active_only && !order.status.is_active() {
            return false;
        }
        if !self.statuses.is_empty() && !self.statuses.contains(&order.status) {
            return false;
        }
        if !self.payment_statuses.is_empty()
            && !self.payment_statuses.contains(&order.payment_status)
        {
            return false;
        }
        if let Some(table_id) = &self.table_id
            && order.table_id.as_deref() != Some(table_id.as_str())
        {
            return false;
        }
        if let Some(from) = self.from
            && order.created_at < from
        {
            return false;
        }
        if let Some(to) = self.to
            && order.created_at > to
        {
            return false;
        }
        if let Some(search) = &self.search {
            let needle = search.trim().to_lowercase();
            if !needle.is_empty() {
                let number_hit = order.order_number.to_string().contains(&needle);
                let name_hit = order
                    .customer_name
                    .as_deref()
                    .is_some_and(|name| name.to_lowercase().contains(&needle));
                if !number_hit && !name_hit {
                    return false;
                }
            }
        }
        true
    }
}

/// Sort in place by the requested field and direction.
pub fn sort_orders(orders: &mut [Order], sort_by: SortField, sort_order: SortOrder) {
    orders.sort_by(|a, b| {
        let ordering = match sort_by {
            SortField::CreatedAt => a.created_at.cmp(&b.created_at),
            SortField::OrderNumber => a.order_number.cmp(&b.order_number),
            SortField::TotalAmount => a.total_amount.total_cmp(&b.total_amount),
        };
        match sort_order {
            SortOrder::Asc => ordering,
            SortOrder::Desc => ordering.reverse(),
        }
    });
}

/// Service-request list filter.
#[derive(Debug, Clone, Default)]
pub struct ServiceRequestFilter {
    pub statuses: Vec<ServiceRequestStatus>,
    pub table_id: Option<String>,
    pub page: u32,
    pub per_page: u32,
}

impl ServiceRequestFilter {
    pub fn matches(&self, request: &ServiceRequest) -> bool {
        if !self.statuses.is_empty() && !self.statuses.contains(&request.status) {
            return false;
        }
        if let Some(table_id) = &self.table_id
            && request.table_id != *table_id
        {
            return false;
        }
        true
    }
}

/// Clamp page/per_page to sane values: page is 1-based, per_page defaults to
/// [`DEFAULT_PER_PAGE`] and is capped at `max_per_page`.
pub fn normalize_page(page: u32, per_page: u32, max_per_page: u32) -> (u32, u32) {
    let page = page.max(1);
    let per_page = if per_page == 0 {
        DEFAULT_PER_PAGE.min(max_per_page)
    } else {
        per_page.min(max_per_page)
    };
    (page, per_page)
}

/// Apply pagination to an already filtered + sorted list.
pub fn paginate<T>(items: Vec<T>, page: u32, per_page: u32) -> (Vec<T>, Pagination) {
    let total = items.len() as u64;
    let pagination = Pagination::new(page, per_page, total);
    let start = (page.max(1) as u64 - 1) * per_page as u64;
    let page_items: Vec<T> = if start >= total {
        Vec::new()
    } else {
        items
            .into_iter()
            .skip(start as usize)
            .take(per_page as usize)
            .collect()
    };
    (page_items, pagination)
}
