//! redb-based storage for orders, order items and service requests
//!
//! # Tables
//!
//! | Table | Key | Value | Purpose |
//! |-------|-----|-------|---------|
//! | `orders` | `(tenant_id, order_id)` | `Order` | Order rows, scoped per tenant |
//! | `order_items` | `(order_id, item_id)` | `OrderItem` | Items, clustered under their order |
//! | `item_index` | `item_id` | `(tenant_id, order_id)` | Item lookup without the order id |
//! | `service_requests` | `(tenant_id, request_id)` | `ServiceRequest` | Waiter calls etc. |
//! | `request_window` | `(tenant_id, table_id, created_at, request_id)` | `()` | Rate-limit scan index |
//! | `counters` | `"order_number:{tenant}"` | `u64` | Per-tenant order numbers |
//!
//! All values are JSON via serde_json. Every mutation runs inside a single
//! `begin_write()` transaction and commits atomically; a rejected transition
//! drops the transaction, so the row is untouched. redb commits are durable
//! when `commit()` returns and the file is always in a consistent state, so
//! an order can never exist without its items.

use redb::{Database, ReadableDatabase, ReadableTable, TableDefinition, WriteTransaction};
use shared::error::{AppError, AppResult};
use shared::order::{
    ALL_STATUSES, NewOrder, NewOrderItem, Order, OrderDetail, OrderItem, OrderStatus,
    PaymentStatus,
};
use shared::request::{NewServiceRequest, ServiceRequest, ServiceRequestStatus};
use shared::response::Pagination;
use shared::util::new_id;
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;
use thiserror::Error;
use tracing::warn;

use super::limiter::SlidingWindow;
use super::money;
use super::query::{OrderFilter, ServiceRequestFilter, paginate, sort_orders};

const ORDERS_TABLE: TableDefinition<(&str, &str), &[u8]> = TableDefinition::new("orders");
const ORDER_ITEMS_TABLE: TableDefinition<(&str, &str), &[u8]> = TableDefinition::new("order_items");
const ITEM_INDEX_TABLE: TableDefinition<&str, (&str, &str)> = TableDefinition::new("item_index");
const SERVICE_REQUESTS_TABLE: TableDefinition<(&str, &str), &[u8]> =
    TableDefinition::new("service_requests");
const REQUEST_WINDOW_TABLE: TableDefinition<(&str, &str, i64, &str), ()> =
    TableDefinition::new("request_window");
const COUNTERS_TABLE: TableDefinition<&str, u64> = TableDefinition::new("counters");

const DAY_MS: i64 = 24 * 60 * 60 * 1000;

/// Storage errors
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Database error: {0}")]
    Database(#[from] redb::DatabaseError),

    #[error("Transaction error: {0}")]
    Transaction(#[from] redb::TransactionError),

    #[error("Table error: {0}")]
    Table(#[from] redb::TableError),

    #[error("Storage error: {0}")]
    Storage(#[from] redb::StorageError),

    #[error("Commit error: {0}")]
    Commit(#[from] redb::CommitError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

pub type StorageResult<T> = Result<T, StorageError>;

impl From<StorageError> for AppError {
    fn from(err: StorageError) -> Self {
        AppError::database(err.to_string())
    }
}

/// Order store backed by redb.
#[derive(Clone)]
pub struct OrderStore {
    db: Arc<Database>,
}

impl OrderStore {
    /// Open or create the database at the given path.
    pub fn open(path: impl AsRef<Path>) -> StorageResult<Self> {
        let db = Database::create(path)?;
        Self::initialize(db)
    }

    /// Open an in-memory database (for testing).
    pub fn open_in_memory() -> StorageResult<Self> {
        let db = Database::builder().create_with_backend(redb::backends::InMemoryBackend::new())?;
        Self::initialize(db)
    }

    fn initialize(db: Database) -> StorageResult<Self> {
        let txn = db.begin_write()?;
        {
            let _ = txn.open_table(ORDERS_TABLE)?;
            let _ = txn.open_table(ORDER_ITEMS_TABLE)?;
            let _ = txn.open_table(ITEM_INDEX_TABLE)?;
            let _ = txn.open_table(SERVICE_REQUESTS_TABLE)?;
            let _ = txn.open_table(REQUEST_WINDOW_TABLE)?;
            let _ = txn.open_table(COUNTERS_TABLE)?;
        }
        txn.commit()?;
        Ok(Self { db: Arc::new(db) })
    }

    fn begin_write(&self) -> StorageResult<WriteTransaction> {
        Ok(self.db.begin_write()?)
    }

    fn commit(txn: WriteTransaction) -> StorageResult<()> {
        Ok(txn.commit()?)
    }

    // ========== Order Operations ==========

    /// Persist a new order with all of its items as one atomic unit.
    ///
    /// The per-tenant order number is taken from the counter inside the same
    /// transaction, so a failed create consumes nothing.
    pub fn create_order(
        &self,
        tenant_id: &str,
        input: NewOrder,
        items: Vec<NewOrderItem>,
        default_currency: &str,
        now: i64,
    ) -> AppResult<OrderDetail> {
        if items.is_empty() {
            return Err(AppError::validation("order must contain at least one item"));
        }
        money::validate_discount(input.discount_total)?;
        for item in &items {
            money::validate_new_item(item)?;
        }
        let currency = money::normalize_currency(input.currency.as_deref(), default_currency)?;
        let totals = money::order_totals(&items, input.discount_total);

        let txn = self.begin_write()?;
        let order_number = Self::next_order_number_txn(&txn, tenant_id)?;

        let order = Order {
            id: new_id(),
            tenant_id: tenant_id.to_string(),
            order_number,
            table_id: input.table_id,
            table_name: input.table_name,
            order_type: input.order_type,
            status: OrderStatus::Pending,
            payment_status: PaymentStatus::Pending,
            subtotal: totals.subtotal,
            modifiers_total: totals.modifiers_total,
            discount_total: totals.discount_total,
            total_amount: totals.total_amount,
            currency,
            customer_name: input.customer_name,
            customer_phone: input.customer_phone,
            customer_email: input.customer_email,
            assigned_to: None,
            notes: input.notes,
            created_at: now,
            status_changed_at: now,
            status_changed_by: None,
            confirmed_at: None,
            preparing_at: None,
            estimated_ready_at: None,
            actual_ready_at: None,
            served_at: None,
            completed_at: None,
            cancelled_at: None,
            cancelled_by: None,
            cancellation_reason: None,
        };

        let built_items: Vec<OrderItem> = items
            .into_iter()
            .map(|item| {
                let modifiers_total = money::to_f64(money::modifiers_total(&item.modifiers));
                let line_total =
                    money::to_f64(money::line_total(item.unit_price, &item.modifiers, item.quantity));
                OrderItem {
                    id: new_id(),
                    order_id: order.id.clone(),
                    tenant_id: tenant_id.to_string(),
                    product_id: item.product_id,
                    name: item.name,
                    description: item.description,
                    image_url: item.image_url,
                    quantity: item.quantity,
                    unit_price: item.unit_price,
                    price_entry_id: item.price_entry_id,
                    modifiers: item.modifiers,
                    modifiers_total,
                    line_total,
                    special_instructions: item.special_instructions,
                    status: OrderStatus::Pending,
                    created_at: now,
                    status_changed_at: now,
                    confirmed_at: None,
                    preparing_at: None,
                    actual_ready_at: None,
                    served_at: None,
                    completed_at: None,
                    cancelled_at: None,
                }
            })
            .collect();

        Self::write_order_txn(&txn, &order)?;
        for item in &built_items {
            Self::write_item_txn(&txn, item)?;
        }
        Self::commit(txn)?;

        Ok(OrderDetail {
            order,
            items: built_items,
        })
    }

    /// Fetch one order with all of its items.
    pub fn get_order(&self, tenant_id: &str, order_id: &str) -> AppResult<OrderDetail> {
        let order = self
            .read_order(tenant_id, order_id)?
            .ok_or_else(|| AppError::not_found(format!("order {}", order_id)))?;
        let items = self.read_items_for_order(order_id)?;
        Ok(OrderDetail { order, items })
    }

    /// Validated status transition with provenance and first-entry timestamp.
    ///
    /// `expected` is an optional precondition from the client's last read; a
    /// mismatch is logged and the update proceeds (last write wins).
    pub fn update_order_status(
        &self,
        tenant_id: &str,
        order_id: &str,
        new_status: OrderStatus,
        actor: &str,
        expected: Option<OrderStatus>,
        now: i64,
    ) -> AppResult<Order> {
        let txn = self.begin_write()?;
        let mut order = Self::read_order_txn(&txn, tenant_id, order_id)?
            .ok_or_else(|| AppError::not_found(format!("order {}", order_id)))?;

        if let Some(expected) = expected
            && expected != order.status
        {
            warn!(
                order_id = %order_id,
                expected = %expected,
                current = %order.status,
                "status precondition no longer holds, proceeding last-write-wins"
            );
        }

        if !order.status.can_transition_to(new_status) {
            return Err(AppError::invalid_transition(order.status, new_status));
        }

        order.apply_status(new_status, actor, now);
        if new_status == OrderStatus::Cancelled {
            order.cancelled_by = Some(actor.to_string());
        }

        Self::write_order_txn(&txn, &order)?;
        Self::commit(txn)?;
        Ok(order)
    }

    /// Cancellation with a mandatory reason.
    pub fn cancel_order(
        &self,
        tenant_id: &str,
        order_id: &str,
        reason: &str,
        actor: &str,
        now: i64,
    ) -> AppResult<Order> {
        let reason = reason.trim();
        if reason.is_empty() {
            return Err(AppError::validation("cancellation reason must not be empty"));
        }

        let txn = self.begin_write()?;
        let mut order = Self::read_order_txn(&txn, tenant_id, order_id)?
            .ok_or_else(|| AppError::not_found(format!("order {}", order_id)))?;

        if !order.status.can_transition_to(OrderStatus::Cancelled) {
            return Err(AppError::NotCancellable {
                status: order.status,
            });
        }

        order.apply_status(OrderStatus::Cancelled, actor, now);
        order.cancelled_by = Some(actor.to_string());
        order.cancellation_reason = Some(reason.to_string());

        Self::write_order_txn(&txn, &order)?;
        Self::commit(txn)?;
        Ok(order)
    }

    /// Payment status is a flat field, never gated by the state machine.
    pub fn update_payment_status(
        &self,
        tenant_id: &str,
        order_id: &str,
        payment_status: PaymentStatus,
    ) -> AppResult<Order> {
        self.mutate_order(tenant_id, order_id, |order| {
            order.payment_status = payment_status;
            Ok(())
        })
    }

    /// Assign to a staff member; an empty id clears the assignment.
    pub fn assign_order(
        &self,
        tenant_id: &str,
        order_id: &str,
        staff_id: &str,
    ) -> AppResult<Order> {
        let staff_id = staff_id.trim();
        self.mutate_order(tenant_id, order_id, |order| {
            order.assigned_to = if staff_id.is_empty() {
                None
            } else {
                Some(staff_id.to_string())
            };
            Ok(())
        })
    }

    pub fn set_estimated_ready(
        &self,
        tenant_id: &str,
        order_id: &str,
        at_millis: i64,
    ) -> AppResult<Order> {
        if at_millis <= 0 {
            return Err(AppError::validation(format!(
                "estimated ready time must be a positive timestamp, got {}",
                at_millis
            )));
        }
        self.mutate_order(tenant_id, order_id, |order| {
            order.estimated_ready_at = Some(at_millis);
            Ok(())
        })
    }

    /// Replace the internal notes; empty clears.
    pub fn update_notes(&self, tenant_id: &str, order_id: &str, notes: &str) -> AppResult<Order> {
        let notes = notes.trim();
        self.mutate_order(tenant_id, order_id, |order| {
            order.notes = if notes.is_empty() {
                None
            } else {
                Some(notes.to_string())
            };
            Ok(())
        })
    }

    fn mutate_order(
        &self,
        tenant_id: &str,
        order_id: &str,
        mutate: impl FnOnce(&mut Order) -> AppResult<()>,
    ) -> AppResult<Order> {
        let txn = self.begin_write()?;
        let mut order = Self::read_order_txn(&txn, tenant_id, order_id)?
            .ok_or_else(|| AppError::not_found(format!("order {}", order_id)))?;
        mutate(&mut order)?;
        Self::write_order_txn(&txn, &order)?;
        Self::commit(txn)?;
        Ok(order)
    }

    /// Filtered, sorted, paginated order listing.
    pub fn list_orders(
        &self,
        tenant_id: &str,
        filter: &OrderFilter,
    ) -> AppResult<(Vec<Order>, Pagination)> {
        let mut orders: Vec<Order> = self
            .scan_orders(tenant_id)?
            .into_iter()
            .filter(|order| filter.matches(order))
            .collect();
        sort_orders(&mut orders, filter.sort_by, filter.sort_order);
        Ok(paginate(orders, filter.page, filter.per_page))
    }

    /// Orders per status over the trailing 24 hours, zero-filled.
    pub fn status_counts(
        &self,
        tenant_id: &str,
        now: i64,
    ) -> AppResult<HashMap<OrderStatus, u64>> {
        let since = now - DAY_MS;
        let mut counts: HashMap<OrderStatus, u64> =
            ALL_STATUSES.iter().map(|status| (*status, 0)).collect();
        for order in self.scan_orders(tenant_id)? {
            if order.created_at >= since
                && let Some(count) = counts.get_mut(&order.status)
            {
                *count += 1;
            }
        }
        Ok(counts)
    }

    // ========== Order Item Operations ==========

    /// Validated transition for a single item. The parent order is untouched;
    /// all items reaching a status never auto-advances the order.
    pub fn update_order_item_status(
        &self,
        tenant_id: &str,
        item_id: &str,
        new_status: OrderStatus,
        now: i64,
    ) -> AppResult<OrderItem> {
        let txn = self.begin_write()?;
        let mut item = Self::read_item_txn(&txn, tenant_id, item_id)?
            .ok_or_else(|| AppError::not_found(format!("order item {}", item_id)))?;

        if !item.status.can_transition_to(new_status) {
            return Err(AppError::invalid_transition(item.status, new_status));
        }

        item.apply_status(new_status, now);
        Self::write_item_txn(&txn, &item)?;
        Self::commit(txn)?;
        Ok(item)
    }

    /// One transaction for the whole batch, all-or-nothing: every item's
    /// current status is re-validated and a single illegal transition rejects
    /// the batch with the offending ids, leaving every row unchanged.
    pub fn bulk_update_item_status(
        &self,
        tenant_id: &str,
        item_ids: &[String],
        new_status: OrderStatus,
        now: i64,
    ) -> AppResult<Vec<OrderItem>> {
        if item_ids.is_empty() {
            return Err(AppError::validation("item_ids must not be empty"));
        }

        let txn = self.begin_write()?;
        let mut items = Vec::with_capacity(item_ids.len());
        let mut invalid = Vec::new();

        for item_id in item_ids {
            let item = Self::read_item_txn(&txn, tenant_id, item_id)?
                .ok_or_else(|| AppError::not_found(format!("order item {}", item_id)))?;
            if item.status.can_transition_to(new_status) {
                items.push(item);
            } else {
                invalid.push(item_id.clone());
            }
        }

        if !invalid.is_empty() {
            return Err(AppError::BulkTransition {
                to: new_status,
                invalid,
            });
        }

        for item in &mut items {
            item.apply_status(new_status, now);
            Self::write_item_txn(&txn, item)?;
        }
        Self::commit(txn)?;
        Ok(items)
    }

    // ========== Service Request Operations ==========

    /// Create a service request, gated by the sliding-window limiter.
    ///
    /// The window scan and the insert share one transaction; on rejection no
    /// row is written.
    pub fn create_service_request(
        &self,
        tenant_id: &str,
        input: NewServiceRequest,
        limiter: &SlidingWindow,
        now: i64,
    ) -> AppResult<ServiceRequest> {
        let table_id = input.table_id.trim();
        if table_id.is_empty() {
            return Err(AppError::validation("table_id must not be empty"));
        }

        let txn = self.begin_write()?;
        let timestamps =
            Self::window_timestamps_txn(&txn, tenant_id, table_id, limiter.window_start(now), now)?;
        limiter.check(&timestamps, now)?;

        let request = ServiceRequest {
            id: new_id(),
            tenant_id: tenant_id.to_string(),
            table_id: table_id.to_string(),
            table_name: input.table_name,
            kind: input.kind,
            status: ServiceRequestStatus::Pending,
            message: input.message,
            session_id: input.session_id,
            responded_by: None,
            response_text: None,
            created_at: now,
            status_changed_at: now,
        };

        Self::write_request_txn(&txn, &request)?;
        Self::record_window_txn(&txn, tenant_id, table_id, now, &request.id)?;
        Self::commit(txn)?;
        Ok(request)
    }

    /// Validated service-request transition, optionally recording who picked
    /// it up and what they replied.
    pub fn update_service_request_status(
        &self,
        tenant_id: &str,
        request_id: &str,
        new_status: ServiceRequestStatus,
        responded_by: Option<&str>,
        response_text: Option<String>,
        now: i64,
    ) -> AppResult<ServiceRequest> {
        let txn = self.begin_write()?;
        let mut request = Self::read_request_txn(&txn, tenant_id, request_id)?
            .ok_or_else(|| AppError::not_found(format!("service request {}", request_id)))?;

        if !request.status.can_transition_to(new_status) {
            return Err(AppError::request_transition(request.status, new_status));
        }

        request.apply_status(new_status, now);
        if let Some(actor) = responded_by {
            request.responded_by = Some(actor.to_string());
        }
        if response_text.is_some() {
            request.response_text = response_text;
        }

        Self::write_request_txn(&txn, &request)?;
        Self::commit(txn)?;
        Ok(request)
    }

    /// Service requests for a tenant, newest first.
    pub fn list_service_requests(
        &self,
        tenant_id: &str,
        filter: &ServiceRequestFilter,
    ) -> AppResult<(Vec<ServiceRequest>, Pagination)> {
        let mut requests: Vec<ServiceRequest> = self
            .scan_service_requests(tenant_id)?
            .into_iter()
            .filter(|request| filter.matches(request))
            .collect();
        requests.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(paginate(requests, filter.page, filter.per_page))
    }

    // ========== redb plumbing ==========

    fn next_order_number_txn(txn: &WriteTransaction, tenant_id: &str) -> StorageResult<u64> {
        let mut table = txn.open_table(COUNTERS_TABLE)?;
        let key = format!("order_number:{}", tenant_id);
        let current = table.get(key.as_str())?.map(|g| g.value()).unwrap_or(0);
        let next = current + 1;
        table.insert(key.as_str(), next)?;
        Ok(next)
    }

    fn write_order_txn(txn: &WriteTransaction, order: &Order) -> StorageResult<()> {
        let mut table = txn.open_table(ORDERS_TABLE)?;
        let value = serde_json::to_vec(order)?;
        table.insert((order.tenant_id.as_str(), order.id.as_str()), value.as_slice())?;
        Ok(())
    }

    fn read_order_txn(
        txn: &WriteTransaction,
        tenant_id: &str,
        order_id: &str,
    ) -> StorageResult<Option<Order>> {
        let table = txn.open_table(ORDERS_TABLE)?;
        match table.get((tenant_id, order_id))? {
            Some(value) => Ok(Some(serde_json::from_slice(value.value())?)),
            None => Ok(None),
        }
    }

    fn read_order(&self, tenant_id: &str, order_id: &str) -> StorageResult<Option<Order>> {
        let txn = self.db.begin_read()?;
        let table = txn.open_table(ORDERS_TABLE)?;
        match table.get((tenant_id, order_id))? {
            Some(value) => Ok(Some(serde_json::from_slice(value.value())?)),
            None => Ok(None),
        }
    }

    fn scan_orders(&self, tenant_id: &str) -> StorageResult<Vec<Order>> {
        let txn = self.db.begin_read()?;
        let table = txn.open_table(ORDERS_TABLE)?;
        let mut orders = Vec::new();
        for entry in table.range((tenant_id, "")..)? {
            let (key, value) = entry?;
            if key.value().0 != tenant_id {
                break;
            }
            orders.push(serde_json::from_slice(value.value())?);
        }
        Ok(orders)
    }

    fn write_item_txn(txn: &WriteTransaction, item: &OrderItem) -> StorageResult<()> {
        let value = serde_json::to_vec(item)?;
        {
            let mut table = txn.open_table(ORDER_ITEMS_TABLE)?;
            table.insert((item.order_id.as_str(), item.id.as_str()), value.as_slice())?;
        }
        let mut index = txn.open_table(ITEM_INDEX_TABLE)?;
        index.insert(
            item.id.as_str(),
            (item.tenant_id.as_str(), item.order_id.as_str()),
        )?;
        Ok(())
    }

    /// Look an item up by id alone, via the index. Rows of other tenants are
    /// reported as absent.
    fn read_item_txn(
        txn: &WriteTransaction,
        tenant_id: &str,
        item_id: &str,
    ) -> StorageResult<Option<OrderItem>> {
        let order_id = {
            let index = txn.open_table(ITEM_INDEX_TABLE)?;
            match index.get(item_id)? {
                Some(entry) => {
                    let (row_tenant, order_id) = entry.value();
                    if row_tenant != tenant_id {
                        return Ok(None);
                    }
                    order_id.to_string()
                }
                None => return Ok(None),
            }
        };

        let table = txn.open_table(ORDER_ITEMS_TABLE)?;
        match table.get((order_id.as_str(), item_id))? {
            Some(value) => Ok(Some(serde_json::from_slice(value.value())?)),
            None => Ok(None),
        }
    }

    fn read_items_for_order(&self, order_id: &str) -> StorageResult<Vec<OrderItem>> {
        let txn = self.db.begin_read()?;
        let table = txn.open_table(ORDER_ITEMS_TABLE)?;
        let mut items: Vec<OrderItem> = Vec::new();
        for entry in table.range((order_id, "")..)? {
            let (key, value) = entry?;
            if key.value().0 != order_id {
                break;
            }
            items.push(serde_json::from_slice(value.value())?);
        }
        items.sort_by(|a, b| a.created_at.cmp(&b.created_at).then_with(|| a.id.cmp(&b.id)));
        Ok(items)
    }

    fn write_request_txn(txn: &WriteTransaction, request: &ServiceRequest) -> StorageResult<()> {
        let mut table = txn.open_table(SERVICE_REQUESTS_TABLE)?;
        let value = serde_json::to_vec(request)?;
        table.insert(
            (request.tenant_id.as_str(), request.id.as_str()),
            value.as_slice(),
        )?;
        Ok(())
    }

    fn read_request_txn(
        txn: &WriteTransaction,
        tenant_id: &str,
        request_id: &str,
    ) -> StorageResult<Option<ServiceRequest>> {
        let table = txn.open_table(SERVICE_REQUESTS_TABLE)?;
        match table.get((tenant_id, request_id))? {
            Some(value) => Ok(Some(serde_json::from_slice(value.value())?)),
            None => Ok(None),
        }
    }

    fn scan_service_requests(&self, tenant_id: &str) -> StorageResult<Vec<ServiceRequest>> {
        let txn = self.db.begin_read()?;
        let table = txn.open_table(SERVICE_REQUESTS_TABLE)?;
        let mut requests = Vec::new();
        for entry in table.range((tenant_id, "")..)? {
            let (key, value) = entry?;
            if key.value().0 != tenant_id {
                break;
            }
            requests.push(serde_json::from_slice(value.value())?);
        }
        Ok(requests)
    }

    fn record_window_txn(
        txn: &WriteTransaction,
        tenant_id: &str,
        table_id: &str,
        now: i64,
        request_id: &str,
    ) -> StorageResult<()> {
        let mut table = txn.open_table(REQUEST_WINDOW_TABLE)?;
        table.insert((tenant_id, table_id, now, request_id), ())?;
        Ok(())
    }

    /// Creation timestamps for (tenant, table) in `[from, now]`, oldest first.
    fn window_timestamps_txn(
        txn: &WriteTransaction,
        tenant_id: &str,
        table_id: &str,
        from: i64,
        now: i64,
    ) -> StorageResult<Vec<i64>> {
        let table = txn.open_table(REQUEST_WINDOW_TABLE)?;
        let mut timestamps = Vec::new();
        for entry in table.range((tenant_id, table_id, from, "")..)? {
            let (key, _) = entry?;
            let (row_tenant, row_table, created_at, _) = key.value();
            if row_tenant != tenant_id || row_table != table_id || created_at > now {
                break;
            }
            timestamps.push(created_at);
        }
        Ok(timestamps)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared::error::ErrorCode;
    use shared::order::OrderType;

    fn store() -> OrderStore {
        OrderStore::open_in_memory().unwrap()
    }

    fn limiter() -> SlidingWindow {
        SlidingWindow::new(3, 300_000)
    }

    fn new_order() -> NewOrder {
        NewOrder {
            table_id: Some("table-1".to_string()),
            table_name: Some("Masa-1".to_string()),
            order_type: OrderType::DineIn,
            currency: None,
            customer_name: Some("Ana".to_string()),
            customer_phone: None,
            customer_email: None,
            notes: None,
            discount_total: 0.0,
        }
    }

    fn new_item(name: &str, unit_price: f64, quantity: u32) -> NewOrderItem {
        NewOrderItem {
            product_id: None,
            name: name.to_string(),
            description: None,
            image_url: None,
            quantity,
            unit_price,
            price_entry_id: None,
            modifiers: Vec::new(),
            special_instructions: None,
        }
    }

    fn new_request(table_id: &str) -> NewServiceRequest {
        NewServiceRequest {
            table_id: table_id.to_string(),
            table_name: None,
            kind: Default::default(),
            message: None,
            session_id: None,
        }
    }

    #[test]
    fn test_create_order_atomic_unit() {
        let store = store();
        let detail = store
            .create_order(
                "tenant-1",
                new_order(),
                vec![new_item("Tortilla", 6.0, 2), new_item("Cola", 2.5, 1)],
                "EUR",
                1_000,
            )
            .unwrap();

        assert_eq!(detail.order.order_number, 1);
        assert_eq!(detail.order.status, OrderStatus::Pending);
        assert_eq!(detail.order.subtotal, 14.5);
        assert_eq!(detail.order.total_amount, 14.5);
        assert_eq!(detail.order.currency, "EUR");
        assert_eq!(detail.items.len(), 2);
        assert!(detail.items.iter().all(|i| i.order_id == detail.order.id));

        let fetched = store.get_order("tenant-1", &detail.order.id).unwrap();
        assert_eq!(fetched.items.len(), 2);
        assert_eq!(fetched.order, detail.order);
    }

    #[test]
    fn test_create_order_rejects_empty_items() {
        let store = store();
        let err = store
            .create_order("tenant-1", new_order(), vec![], "EUR", 1_000)
            .unwrap_err();
        assert_eq!(err.code(), ErrorCode::ValidationError);
    }

    #[test]
    fn test_failed_create_consumes_nothing() {
        let store = store();
        // Bad item: zero quantity
        let err = store
            .create_order(
                "tenant-1",
                new_order(),
                vec![new_item("Tortilla", 6.0, 0)],
                "EUR",
                1_000,
            )
            .unwrap_err();
        assert_eq!(err.code(), ErrorCode::ValidationError);

        // No order row and no order-number gap
        let (orders, pagination) = store
            .list_orders("tenant-1", &OrderFilter { page: 1, per_page: 50, ..Default::default() })
            .unwrap();
        assert!(orders.is_empty());
        assert_eq!(pagination.total, 0);

        let detail = store
            .create_order("tenant-1", new_order(), vec![new_item("Cola", 2.5, 1)], "EUR", 2_000)
            .unwrap();
        assert_eq!(detail.order.order_number, 1);
    }

    #[test]
    fn test_order_numbers_per_tenant() {
        let store = store();
        let a1 = store
            .create_order("tenant-a", new_order(), vec![new_item("X", 1.0, 1)], "EUR", 1_000)
            .unwrap();
        let a2 = store
            .create_order("tenant-a", new_order(), vec![new_item("X", 1.0, 1)], "EUR", 1_100)
            .unwrap();
        let b1 = store
            .create_order("tenant-b", new_order(), vec![new_item("X", 1.0, 1)], "EUR", 1_200)
            .unwrap();

        assert_eq!(a1.order.order_number, 1);
        assert_eq!(a2.order.order_number, 2);
        assert_eq!(b1.order.order_number, 1);
    }

    #[test]
    fn test_full_status_walk_with_timestamps() {
        let store = store();
        let detail = store
            .create_order("tenant-1", new_order(), vec![new_item("X", 1.0, 1)], "EUR", 1_000)
            .unwrap();
        let id = detail.order.id.as_str();

        let order = store
            .update_order_status("tenant-1", id, OrderStatus::Confirmed, "staff-1", None, 2_000)
            .unwrap();
        assert_eq!(order.confirmed_at, Some(2_000));

        let order = store
            .update_order_status("tenant-1", id, OrderStatus::Preparing, "staff-1", None, 3_000)
            .unwrap();
        assert_eq!(order.preparing_at, Some(3_000));

        let order = store
            .update_order_status("tenant-1", id, OrderStatus::Ready, "staff-2", None, 4_000)
            .unwrap();
        assert_eq!(order.actual_ready_at, Some(4_000));

        let order = store
            .update_order_status("tenant-1", id, OrderStatus::Served, "staff-2", None, 5_000)
            .unwrap();
        assert_eq!(order.served_at, Some(5_000));

        let order = store
            .update_order_status("tenant-1", id, OrderStatus::Completed, "staff-1", None, 6_000)
            .unwrap();
        assert_eq!(order.completed_at, Some(6_000));
        assert_eq!(order.status_changed_by.as_deref(), Some("staff-1"));

        // Terminal: nothing leaves completed
        let err = store
            .update_order_status("tenant-1", id, OrderStatus::Pending, "staff-1", None, 7_000)
            .unwrap_err();
        assert_eq!(err.code(), ErrorCode::InvalidStatusTransition);
    }

    #[test]
    fn test_rejected_transition_leaves_row_untouched() {
        let store = store();
        let detail = store
            .create_order("tenant-1", new_order(), vec![new_item("X", 1.0, 1)], "EUR", 1_000)
            .unwrap();
        let id = detail.order.id.as_str();
        store
            .update_order_status("tenant-1", id, OrderStatus::Confirmed, "staff-1", None, 2_000)
            .unwrap();

        // Skipping preparing is not allowed
        let err = store
            .update_order_status("tenant-1", id, OrderStatus::Ready, "staff-1", None, 3_000)
            .unwrap_err();
        assert!(matches!(err, AppError::InvalidTransition { .. }));

        let current = store.get_order("tenant-1", id).unwrap().order;
        assert_eq!(current.status, OrderStatus::Confirmed);
        assert_eq!(current.status_changed_at, 2_000);
        assert!(current.actual_ready_at.is_none());
    }

    #[test]
    fn test_same_state_rejected() {
        let store = store();
        let detail = store
            .create_order("tenant-1", new_order(), vec![new_item("X", 1.0, 1)], "EUR", 1_000)
            .unwrap();
        let err = store
            .update_order_status(
                "tenant-1",
                &detail.order.id,
                OrderStatus::Pending,
                "staff-1",
                None,
                2_000,
            )
            .unwrap_err();
        assert_eq!(err.code(), ErrorCode::InvalidStatusTransition);
    }

    #[test]
    fn test_stale_precondition_still_wins() {
        let store = store();
        let detail = store
            .create_order("tenant-1", new_order(), vec![new_item("X", 1.0, 1)], "EUR", 1_000)
            .unwrap();
        let id = detail.order.id.as_str();
        store
            .update_order_status("tenant-1", id, OrderStatus::Confirmed, "staff-1", None, 2_000)
            .unwrap();

        // Client still believes the order is pending; update proceeds anyway
        let order = store
            .update_order_status(
                "tenant-1",
                id,
                OrderStatus::Preparing,
                "staff-2",
                Some(OrderStatus::Pending),
                3_000,
            )
            .unwrap();
        assert_eq!(order.status, OrderStatus::Preparing);
    }

    #[test]
    fn test_cancel_requires_reason() {
        let store = store();
        let detail = store
            .create_order("tenant-1", new_order(), vec![new_item("X", 1.0, 1)], "EUR", 1_000)
            .unwrap();
        let err = store
            .cancel_order("tenant-1", &detail.order.id, "   ", "staff-1", 2_000)
            .unwrap_err();
        assert_eq!(err.code(), ErrorCode::ValidationError);
    }

    #[test]
    fn test_cancel_sets_provenance() {
        let store = store();
        let detail = store
            .create_order("tenant-1", new_order(), vec![new_item("X", 1.0, 1)], "EUR", 1_000)
            .unwrap();
        let order = store
            .cancel_order(
                "tenant-1",
                &detail.order.id,
                "customer changed their mind",
                "staff-1",
                2_000,
            )
            .unwrap();
        assert_eq!(order.status, OrderStatus::Cancelled);
        assert_eq!(order.cancelled_at, Some(2_000));
        assert_eq!(order.cancelled_by.as_deref(), Some("staff-1"));
        assert_eq!(
            order.cancellation_reason.as_deref(),
            Some("customer changed their mind")
        );
    }

    #[test]
    fn test_served_order_not_cancellable() {
        let store = store();
        let detail = store
            .create_order("tenant-1", new_order(), vec![new_item("X", 1.0, 1)], "EUR", 1_000)
            .unwrap();
        let id = detail.order.id.as_str();
        for (status, at) in [
            (OrderStatus::Confirmed, 2_000),
            (OrderStatus::Preparing, 3_000),
            (OrderStatus::Ready, 4_000),
            (OrderStatus::Served, 5_000),
        ] {
            store
                .update_order_status("tenant-1", id, status, "staff-1", None, at)
                .unwrap();
        }

        let err = store
            .cancel_order("tenant-1", id, "too late", "staff-1", 6_000)
            .unwrap_err();
        assert!(matches!(
            err,
            AppError::NotCancellable {
                status: OrderStatus::Served
            }
        ));
        assert_eq!(err.code(), ErrorCode::InvalidStatusTransition);
    }

    #[test]
    fn test_tenant_isolation_on_reads() {
        let store = store();
        let detail = store
            .create_order("tenant-a", new_order(), vec![new_item("X", 1.0, 1)], "EUR", 1_000)
            .unwrap();

        let err = store.get_order("tenant-b", &detail.order.id).unwrap_err();
        assert_eq!(err.code(), ErrorCode::NotFound);

        let err = store
            .update_order_item_status(
                "tenant-b",
                &detail.items[0].id,
                OrderStatus::Confirmed,
                2_000,
            )
            .unwrap_err();
        assert_eq!(err.code(), ErrorCode::NotFound);
    }

    #[test]
    fn test_item_status_independent_of_order() {
        let store = store();
        let detail = store
            .create_order(
                "tenant-1",
                new_order(),
                vec![new_item("Tortilla", 6.0, 1), new_item("Cola", 2.5, 1)],
                "EUR",
                1_000,
            )
            .unwrap();

        let item = store
            .update_order_item_status(
                "tenant-1",
                &detail.items[0].id,
                OrderStatus::Confirmed,
                2_000,
            )
            .unwrap();
        assert_eq!(item.status, OrderStatus::Confirmed);
        assert_eq!(item.confirmed_at, Some(2_000));

        let order = store.get_order("tenant-1", &detail.order.id).unwrap().order;
        assert_eq!(order.status, OrderStatus::Pending);
    }

    #[test]
    fn test_bulk_all_or_nothing() {
        let store = store();
        let detail = store
            .create_order(
                "tenant-1",
                new_order(),
                vec![
                    new_item("A", 1.0, 1),
                    new_item("B", 2.0, 1),
                    new_item("C", 3.0, 1),
                ],
                "EUR",
                1_000,
            )
            .unwrap();
        let ids: Vec<String> = detail.items.iter().map(|i| i.id.clone()).collect();

        // Two items confirmed, one still pending
        store
            .update_order_item_status("tenant-1", &ids[0], OrderStatus::Confirmed, 2_000)
            .unwrap();
        store
            .update_order_item_status("tenant-1", &ids[1], OrderStatus::Confirmed, 2_000)
            .unwrap();

        // Pending cannot reach preparing, so the whole batch is rejected
        let err = store
            .bulk_update_item_status("tenant-1", &ids, OrderStatus::Preparing, 3_000)
            .unwrap_err();
        match &err {
            AppError::BulkTransition { to, invalid } => {
                assert_eq!(*to, OrderStatus::Preparing);
                assert_eq!(invalid, &vec![ids[2].clone()]);
            }
            other => panic!("expected BulkTransition, got {:?}", other),
        }

        // Nothing moved, including the items that could have
        let after = store.get_order("tenant-1", &detail.order.id).unwrap();
        for item in &after.items {
            assert_ne!(item.status, OrderStatus::Preparing);
        }

        // Align the third item and retry
        store
            .update_order_item_status("tenant-1", &ids[2], OrderStatus::Confirmed, 3_500)
            .unwrap();
        let items = store
            .bulk_update_item_status("tenant-1", &ids, OrderStatus::Preparing, 4_000)
            .unwrap();
        assert_eq!(items.len(), 3);
        assert!(items.iter().all(|i| i.status == OrderStatus::Preparing));
        assert!(items.iter().all(|i| i.preparing_at == Some(4_000)));
    }

    #[test]
    fn test_payment_assign_notes_estimated() {
        let store = store();
        let detail = store
            .create_order("tenant-1", new_order(), vec![new_item("X", 1.0, 1)], "EUR", 1_000)
            .unwrap();
        let id = detail.order.id.as_str();

        let order = store
            .update_payment_status("tenant-1", id, PaymentStatus::Paid)
            .unwrap();
        assert_eq!(order.payment_status, PaymentStatus::Paid);

        let order = store.assign_order("tenant-1", id, "staff-7").unwrap();
        assert_eq!(order.assigned_to.as_deref(), Some("staff-7"));
        let order = store.assign_order("tenant-1", id, "").unwrap();
        assert!(order.assigned_to.is_none());

        let order = store.set_estimated_ready("tenant-1", id, 9_999).unwrap();
        assert_eq!(order.estimated_ready_at, Some(9_999));
        assert!(store.set_estimated_ready("tenant-1", id, 0).is_err());

        let order = store.update_notes("tenant-1", id, "VIP guest").unwrap();
        assert_eq!(order.notes.as_deref(), Some("VIP guest"));
        let order = store.update_notes("tenant-1", id, "  ").unwrap();
        assert!(order.notes.is_none());
    }

    #[test]
    fn test_list_filters_and_pagination() {
        let store = store();
        for i in 0..5 {
            store
                .create_order(
                    "tenant-1",
                    new_order(),
                    vec![new_item("X", 1.0 + i as f64, 1)],
                    "EUR",
                    1_000 + i,
                )
                .unwrap();
        }
        // One order for another tenant must never show up
        store
            .create_order("tenant-2", new_order(), vec![new_item("Y", 9.0, 1)], "EUR", 1_000)
            .unwrap();

        let filter = OrderFilter {
            page: 1,
            per_page: 2,
            ..Default::default()
        };
        let (orders, pagination) = store.list_orders("tenant-1", &filter).unwrap();
        assert_eq!(orders.len(), 2);
        assert_eq!(pagination.total, 5);
        assert_eq!(pagination.total_pages, 3);
        // Default sort: newest first
        assert_eq!(orders[0].created_at, 1_004);

        let filter = OrderFilter {
            statuses: vec![OrderStatus::Confirmed],
            page: 1,
            per_page: 50,
            ..Default::default()
        };
        let (orders, _) = store.list_orders("tenant-1", &filter).unwrap();
        assert!(orders.is_empty());
    }

    #[test]
    fn test_status_counts_trailing_day() {
        let store = store();
        let now = 10 * DAY_MS;

        // Inside the window
        let recent = store
            .create_order("tenant-1", new_order(), vec![new_item("X", 1.0, 1)], "EUR", now - 1_000)
            .unwrap();
        store
            .update_order_status(
                "tenant-1",
                &recent.order.id,
                OrderStatus::Confirmed,
                "staff-1",
                None,
                now - 500,
            )
            .unwrap();
        // Outside the window
        store
            .create_order(
                "tenant-1",
                new_order(),
                vec![new_item("Old", 1.0, 1)],
                "EUR",
                now - DAY_MS - 1,
            )
            .unwrap();

        let counts = store.status_counts("tenant-1", now).unwrap();
        assert_eq!(counts[&OrderStatus::Confirmed], 1);
        assert_eq!(counts[&OrderStatus::Pending], 0);
        assert_eq!(counts.len(), ALL_STATUSES.len());
    }

    #[test]
    fn test_service_request_rate_limit_window() {
        let store = store();
        let limiter = limiter();

        // Three calls in quick succession succeed
        for at in [0i64, 1_000, 2_000] {
            store
                .create_service_request("tenant-1", new_request("table-1"), &limiter, at)
                .unwrap();
        }

        // The fourth inside the window is rejected and writes nothing
        let err = store
            .create_service_request("tenant-1", new_request("table-1"), &limiter, 3_000)
            .unwrap_err();
        assert_eq!(err.code(), ErrorCode::RateLimited);
        let (requests, _) = store
            .list_service_requests(
                "tenant-1",
                &ServiceRequestFilter { page: 1, per_page: 50, ..Default::default() },
            )
            .unwrap();
        assert_eq!(requests.len(), 3);

        // Another table is not affected
        store
            .create_service_request("tenant-1", new_request("table-2"), &limiter, 3_000)
            .unwrap();

        // Neither is another tenant
        store
            .create_service_request("tenant-2", new_request("table-1"), &limiter, 3_000)
            .unwrap();

        // After the window has slid past the first call, creation works again
        store
            .create_service_request("tenant-1", new_request("table-1"), &limiter, 301_000)
            .unwrap();
    }

    #[test]
    fn test_service_request_lifecycle() {
        let store = store();
        let limiter = limiter();
        let request = store
            .create_service_request("tenant-1", new_request("table-1"), &limiter, 1_000)
            .unwrap();
        assert_eq!(request.status, ServiceRequestStatus::Pending);

        let request = store
            .update_service_request_status(
                "tenant-1",
                &request.id,
                ServiceRequestStatus::Acknowledged,
                Some("staff-1"),
                Some("on my way".to_string()),
                2_000,
            )
            .unwrap();
        assert_eq!(request.status, ServiceRequestStatus::Acknowledged);
        assert_eq!(request.responded_by.as_deref(), Some("staff-1"));
        assert_eq!(request.response_text.as_deref(), Some("on my way"));

        // Acknowledged can no longer be cancelled
        let err = store
            .update_service_request_status(
                "tenant-1",
                &request.id,
                ServiceRequestStatus::Cancelled,
                None,
                None,
                3_000,
            )
            .unwrap_err();
        assert_eq!(err.code(), ErrorCode::InvalidStatusTransition);

        let request = store
            .update_service_request_status(
                "tenant-1",
                &request.id,
                ServiceRequestStatus::Completed,
                None,
                None,
                4_000,
            )
            .unwrap();
        assert_eq!(request.status, ServiceRequestStatus::Completed);
    }

    #[test]
    fn test_reopen_preserves_data() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("orders.redb");

        let order_id = {
            let store = OrderStore::open(&path).unwrap();
            let detail = store
                .create_order("tenant-1", new_order(), vec![new_item("X", 1.0, 1)], "EUR", 1_000)
                .unwrap();
            detail.order.id
        };

        let store = OrderStore::open(&path).unwrap();
        let detail = store.get_order("tenant-1", &order_id).unwrap();
        assert_eq!(detail.order.id, order_id);
        assert_eq!(detail.items.len(), 1);

        // The counter also survives
        let next = store
            .create_order("tenant-1", new_order(), vec![new_item("Y", 1.0, 1)], "EUR", 2_000)
            .unwrap();
        assert_eq!(next.order.order_number, 2);
    }
}
