//! Order service - the write path plus event fan-out
//!
//! Handlers never touch the store directly; they call this service. Every
//! mutation commits first and publishes its [`ChangeEvent`] only afterwards,
//! so subscribers can re-fetch and always see the new state. A failed
//! mutation publishes nothing.

use shared::error::AppResult;
use shared::event::ChangeEvent;
use shared::order::{
    NewOrder, NewOrderItem, Order, OrderDetail, OrderItem, OrderStatus, PaymentStatus,
};
use shared::request::{NewServiceRequest, ServiceRequest, ServiceRequestStatus};
use shared::response::Pagination;
use shared::util::now_millis;
use std::collections::HashMap;

use crate::core::config::Config;
use crate::realtime::EventHub;

use super::limiter::SlidingWindow;
use super::query::{OrderFilter, ServiceRequestFilter, normalize_page};
use super::store::OrderStore;

#[derive(Clone)]
pub struct OrderService {
    store: OrderStore,
    hub: EventHub,
    default_currency: String,
    limiter: SlidingWindow,
    max_page_size: u32,
}

impl OrderService {
    pub fn new(store: OrderStore, hub: EventHub, config: &Config) -> Self {
        Self {
            store,
            hub,
            default_currency: config.default_currency.clone(),
            limiter: SlidingWindow::new(
                config.service_request_max,
                config.service_request_window_ms(),
            ),
            max_page_size: config.max_page_size,
        }
    }

    // ========== Orders ==========

    pub fn create_order(
        &self,
        tenant_id: &str,
        input: NewOrder,
        items: Vec<NewOrderItem>,
    ) -> AppResult<OrderDetail> {
        let now = now_millis();
        let detail = self
            .store
            .create_order(tenant_id, input, items, &self.default_currency, now)?;
        self.hub.publish(&ChangeEvent::order_created(
            tenant_id,
            &detail.order.id,
            detail.order.status,
            now,
        ));
        Ok(detail)
    }

    pub fn get_order(&self, tenant_id: &str, order_id: &str) -> AppResult<OrderDetail> {
        self.store.get_order(tenant_id, order_id)
    }

    pub fn update_order_status(
        &self,
        tenant_id: &str,
        order_id: &str,
        new_status: OrderStatus,
        actor: &str,
        expected: Option<OrderStatus>,
    ) -> AppResult<Order> {
        let now = now_millis();
        let order = self
            .store
            .update_order_status(tenant_id, order_id, new_status, actor, expected, now)?;
        self.hub.publish(&ChangeEvent::order_status_changed(
            tenant_id,
            &order.id,
            order.status,
            now,
        ));
        Ok(order)
    }

    pub fn cancel_order(
        &self,
        tenant_id: &str,
        order_id: &str,
        reason: &str,
        actor: &str,
    ) -> AppResult<Order> {
        let now = now_millis();
        let order = self
            .store
            .cancel_order(tenant_id, order_id, reason, actor, now)?;
        self.hub.publish(&ChangeEvent::order_status_changed(
            tenant_id,
            &order.id,
            order.status,
            now,
        ));
        Ok(order)
    }

    pub fn update_payment_status(
        &self,
        tenant_id: &str,
        order_id: &str,
        payment_status: PaymentStatus,
    ) -> AppResult<Order> {
        self.store
            .update_payment_status(tenant_id, order_id, payment_status)
    }

    pub fn assign_order(
        &self,
        tenant_id: &str,
        order_id: &str,
        staff_id: &str,
    ) -> AppResult<Order> {
        self.store.assign_order(tenant_id, order_id, staff_id)
    }

    pub fn set_estimated_ready(
        &self,
        tenant_id: &str,
        order_id: &str,
        at_millis: i64,
    ) -> AppResult<Order> {
        self.store.set_estimated_ready(tenant_id, order_id, at_millis)
    }

    pub fn update_notes(&self, tenant_id: &str, order_id: &str, notes: &str) -> AppResult<Order> {
        self.store.update_notes(tenant_id, order_id, notes)
    }

    pub fn list_orders(
        &self,
        tenant_id: &str,
        mut filter: OrderFilter,
    ) -> AppResult<(Vec<Order>, Pagination)> {
        (filter.page, filter.per_page) =
            normalize_page(filter.page, filter.per_page, self.max_page_size);
        self.store.list_orders(tenant_id, &filter)
    }

    pub fn status_counts(&self, tenant_id: &str) -> AppResult<HashMap<OrderStatus, u64>> {
        self.store.status_counts(tenant_id, now_millis())
    }

    // ========== Order Items ==========

    pub fn update_order_item_status(
        &self,
        tenant_id: &str,
        item_id: &str,
        new_status: OrderStatus,
    ) -> AppResult<OrderItem> {
        let now = now_millis();
        let item = self
            .store
            .update_order_item_status(tenant_id, item_id, new_status, now)?;
        self.hub.publish(&ChangeEvent::order_item_status_changed(
            tenant_id,
            &item.id,
            &item.order_id,
            item.status,
            now,
        ));
        Ok(item)
    }

    /// All-or-nothing batch; one event per item on success.
    pub fn bulk_update_item_status(
        &self,
        tenant_id: &str,
        item_ids: &[String],
        new_status: OrderStatus,
    ) -> AppResult<Vec<OrderItem>> {
        let now = now_millis();
        let items = self
            .store
            .bulk_update_item_status(tenant_id, item_ids, new_status, now)?;
        for item in &items {
            self.hub.publish(&ChangeEvent::order_item_status_changed(
                tenant_id,
                &item.id,
                &item.order_id,
                item.status,
                now,
            ));
        }
        Ok(items)
    }

    // ========== Service Requests ==========

    pub fn create_service_request(
        &self,
        tenant_id: &str,
        input: NewServiceRequest,
    ) -> AppResult<ServiceRequest> {
        let now = now_millis();
        let request = self
            .store
            .create_service_request(tenant_id, input, &self.limiter, now)?;
        self.hub.publish(&ChangeEvent::service_request_created(
            tenant_id,
            &request.id,
            request.status,
            now,
        ));
        Ok(request)
    }

    pub fn update_service_request_status(
        &self,
        tenant_id: &str,
        request_id: &str,
        new_status: ServiceRequestStatus,
        responded_by: Option<&str>,
        response_text: Option<String>,
    ) -> AppResult<ServiceRequest> {
        let now = now_millis();
        let request = self.store.update_service_request_status(
            tenant_id,
            request_id,
            new_status,
            responded_by,
            response_text,
            now,
        )?;
        self.hub
            .publish(&ChangeEvent::service_request_status_changed(
                tenant_id,
                &request.id,
                request.status,
                now,
            ));
        Ok(request)
    }

    pub fn list_service_requests(
        &self,
        tenant_id: &str,
        mut filter: ServiceRequestFilter,
    ) -> AppResult<(Vec<ServiceRequest>, Pagination)> {
        (filter.page, filter.per_page) =
            normalize_page(filter.page, filter.per_page, self.max_page_size);
        self.store.list_service_requests(tenant_id, &filter)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared::event::EventKind;
    use shared::order::OrderType;

    fn test_config() -> Config {
        Config {
            work_dir: "/tmp/comanda-test".into(),
            http_port: 0,
            environment: "development".into(),
            log_level: "info".into(),
            log_to_file: false,
            default_currency: "EUR".into(),
            event_buffer_size: 16,
            service_request_window_secs: 300,
            service_request_max: 3,
            max_page_size: 200,
        }
    }

    fn service() -> (OrderService, EventHub) {
        let hub = EventHub::new(16);
        let store = OrderStore::open_in_memory().unwrap();
        (OrderService::new(store, hub.clone(), &test_config()), hub)
    }

    fn new_order() -> NewOrder {
        NewOrder {
            table_id: Some("table-1".to_string()),
            order_type: OrderType::DineIn,
            ..Default::default()
        }
    }

    fn new_item(name: &str, unit_price: f64) -> NewOrderItem {
        NewOrderItem {
            product_id: None,
            name: name.to_string(),
            description: None,
            image_url: None,
            quantity: 1,
            unit_price,
            price_entry_id: None,
            modifiers: Vec::new(),
            special_instructions: None,
        }
    }

    #[tokio::test]
    async fn test_create_publishes_after_commit() {
        let (service, hub) = service();
        let (_id, mut rx) = hub.subscribe("tenant-1", None);

        let detail = service
            .create_order("tenant-1", new_order(), vec![new_item("Cola", 2.5)])
            .unwrap();

        let event = rx.recv().await.unwrap();
        assert_eq!(event.kind, EventKind::OrderCreated);
        assert_eq!(event.entity_id, detail.order.id);
        assert_eq!(event.status, "PENDING");
        // The entity the event points at is already readable
        assert!(service.get_order("tenant-1", &event.entity_id).is_ok());
    }

    #[tokio::test]
    async fn test_rejected_mutation_publishes_nothing() {
        let (service, hub) = service();
        let detail = service
            .create_order("tenant-1", new_order(), vec![new_item("Cola", 2.5)])
            .unwrap();

        let (_id, mut rx) = hub.subscribe("tenant-1", None);
        let err = service
            .update_order_status("tenant-1", &detail.order.id, OrderStatus::Ready, "staff", None)
            .unwrap_err();
        assert_eq!(
            err.code(),
            shared::error::ErrorCode::InvalidStatusTransition
        );
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_bulk_publishes_one_event_per_item() {
        let (service, hub) = service();
        let detail = service
            .create_order(
                "tenant-1",
                new_order(),
                vec![new_item("A", 1.0), new_item("B", 2.0)],
            )
            .unwrap();
        let ids: Vec<String> = detail.items.iter().map(|i| i.id.clone()).collect();

        let (_id, mut rx) = hub.subscribe("tenant-1", None);
        service
            .bulk_update_item_status("tenant-1", &ids, OrderStatus::Confirmed)
            .unwrap();

        for _ in 0..2 {
            let event = rx.recv().await.unwrap();
            assert_eq!(event.kind, EventKind::OrderItemStatusChanged);
            assert_eq!(event.order_id.as_deref(), Some(detail.order.id.as_str()));
            assert_eq!(event.status, "CONFIRMED");
        }
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_service_request_flood_publishes_only_accepted() {
        let (service, hub) = service();
        let (_id, mut rx) = hub.subscribe("tenant-1", None);

        let input = || NewServiceRequest {
            table_id: "table-9".to_string(),
            table_name: None,
            kind: Default::default(),
            message: None,
            session_id: None,
        };

        for _ in 0..3 {
            service.create_service_request("tenant-1", input()).unwrap();
        }
        // Fourth call within the window is rejected and produces no event
        assert!(service.create_service_request("tenant-1", input()).is_err());

        for _ in 0..3 {
            let event = rx.recv().await.unwrap();
            assert_eq!(event.kind, EventKind::ServiceRequestCreated);
        }
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_list_caps_per_page() {
        let (service, _hub) = service();
        for i in 0..3 {
            service
                .create_order("tenant-1", new_order(), vec![new_item("X", 1.0 + i as f64)])
                .unwrap();
        }

        let filter = OrderFilter {
            page: 0,
            per_page: 5_000,
            ..Default::default()
        };
        let (_, pagination) = service.list_orders("tenant-1", filter).unwrap();
        assert_eq!(pagination.page, 1);
        assert_eq!(pagination.per_page, 200);

        let filter = OrderFilter::default();
        let (_, pagination) = service.list_orders("tenant-1", filter).unwrap();
        assert_eq!(pagination.per_page, 50);
    }
}
