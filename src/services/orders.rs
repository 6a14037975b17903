use crate::{
    db::DbPool,
    entities::{customer, order, order_item, payment, service, status_history, user},
    errors::ServiceError,
    models::{self, OrderStatus, PaymentMethod, PaymentStatus},
    services::activity::ActivityLogService,
};
use chrono::{DateTime, NaiveDate, Utc};
use rand::Rng;
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, QuerySelect, Set, TransactionTrait,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::Arc;
use tracing::{error, info, instrument, warn};
use uuid::Uuid;

/// Filters for the order list endpoint
#[derive(Debug, Default)]
pub struct OrderListFilter {
    pub status: Option<String>,
    pub payment_status: Option<String>,
    pub search: Option<String>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub limit: Option<u64>,
}

#[derive(Debug, Deserialize, utoipa::ToSchema)]
pub struct CreateOrderItemInput {
    pub service_id: Uuid,
    pub quantity: Decimal,
}

#[derive(Debug, Deserialize, utoipa::ToSchema)]
pub struct CreateOrderInput {
    pub customer_id: Option<Uuid>,
    pub customer_name: Option<String>,
    pub customer_phone: Option<String>,
    pub items: Vec<CreateOrderItemInput>,
    pub notes: Option<String>,
    /// Optional immediate settlement at the counter
    pub payment_status: Option<String>,
    pub payment_method: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CashierInfo {
    pub id: Uuid,
    pub username: String,
    pub name: String,
}

#[derive(Debug, Serialize)]
pub struct OrderItemDetail {
    pub id: Uuid,
    pub service: service::Model,
    pub quantity: Decimal,
    pub unit_price: Decimal,
    pub subtotal: Decimal,
}

#[derive(Debug, Serialize)]
pub struct OrderDetail {
    pub id: Uuid,
    pub order_number: String,
    pub status: String,
    pub payment_status: String,
    pub total_amount: Decimal,
    pub notes: Option<String>,
    pub customer: customer::Model,
    pub cashier: CashierInfo,
    pub items: Vec<OrderItemDetail>,
    pub payment: Option<payment::Model>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status_history: Option<Vec<status_history::Model>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Nota number: LDR + yymmdd + four random digits
fn generate_order_number(now: DateTime<Utc>, rng: &mut impl Rng) -> String {
    format!("LDR{}{:04}", now.format("%y%m%d"), rng.gen_range(0..10_000))
}

fn order_total(items: &[(Decimal, Decimal)]) -> Decimal {
    items.iter().map(|(qty, price)| *qty * *price).sum()
}

/// Service for managing laundry orders
#[derive(Clone)]
pub struct OrderService {
    db_pool: Arc<DbPool>,
    activity: Arc<ActivityLogService>,
}

impl OrderService {
    pub fn new(db_pool: Arc<DbPool>, activity: Arc<ActivityLogService>) -> Self {
        Self { db_pool, activity }
    }

    /// Lists orders, newest first, with optional filters
    #[instrument(skip(self, filter))]
    pub async fn list_orders(
        &self,
        filter: OrderListFilter,
    ) -> Result<Vec<OrderDetail>, ServiceError> {
        let db = &*self.db_pool;

        let mut query = order::Entity::find();

        if let Some(raw) = &filter.status {
            let status = models::parse_order_status(raw)?;
            query = query.filter(order::Column::Status.eq(status.to_string()));
        }

        if let Some(raw) = &filter.payment_status {
            let payment_status = models::parse_payment_status(raw)?;
            query = query.filter(order::Column::PaymentStatus.eq(payment_status.to_string()));
        }

        if let Some(search) = filter.search.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
            // Match the order number or any customer whose name/phone matches
            let customer_ids: Vec<Uuid> = customer::Entity::find()
                .filter(
                    Condition::any()
                        .add(customer::Column::Name.contains(search))
                        .add(customer::Column::Phone.contains(search)),
                )
                .all(db)
                .await
                .map_err(ServiceError::DatabaseError)?
                .into_iter()
                .map(|c| c.id)
                .collect();

            query = query.filter(
                Condition::any()
                    .add(order::Column::OrderNumber.contains(search))
                    .add(order::Column::CustomerId.is_in(customer_ids)),
            );
        }

        if let Some(start) = filter.start_date {
            let start_at = start.and_hms_opt(0, 0, 0).unwrap_or_default().and_utc();
            query = query.filter(order::Column::CreatedAt.gte(start_at));
        }

        if let Some(end) = filter.end_date {
            let end_at = (end + chrono::Duration::days(1))
                .and_hms_opt(0, 0, 0)
                .unwrap_or_default()
                .and_utc();
            query = query.filter(order::Column::CreatedAt.lt(end_at));
        }

        let orders = query
            .order_by_desc(order::Column::CreatedAt)
            .limit(filter.limit.unwrap_or(50))
            .all(db)
            .await
            .map_err(ServiceError::DatabaseError)?;

        let mut details = Vec::with_capacity(orders.len());
        for model in orders {
            details.push(self.load_detail(model, false).await?);
        }

        Ok(details)
    }

    /// Orders still moving through the process, newest first
    #[instrument(skip(self))]
    pub async fn list_in_progress(&self, limit: u64) -> Result<Vec<OrderDetail>, ServiceError> {
        let db = &*self.db_pool;

        let active = [
            OrderStatus::Diterima,
            OrderStatus::Dicuci,
            OrderStatus::Dikeringkan,
            OrderStatus::Disetrika,
        ];
        let orders = order::Entity::find()
            .filter(order::Column::Status.is_in(active.map(|s| s.to_string())))
            .order_by_desc(order::Column::CreatedAt)
            .limit(limit)
            .all(db)
            .await
            .map_err(ServiceError::DatabaseError)?;

        let mut details = Vec::with_capacity(orders.len());
        for model in orders {
            details.push(self.load_detail(model, false).await?);
        }

        Ok(details)
    }

    /// Retrieves a single order with its status history
    #[instrument(skip(self), fields(order_id = %order_id))]
    pub async fn get_order(&self, order_id: Uuid) -> Result<OrderDetail, ServiceError> {
        let db = &*self.db_pool;

        let model = order::Entity::find_by_id(order_id)
            .one(db)
            .await
            .map_err(ServiceError::DatabaseError)?
            .ok_or_else(|| ServiceError::NotFound("Pesanan tidak ditemukan".to_string()))?;

        self.load_detail(model, true).await
    }

    /// Creates an order with its items, initial status history and an
    /// optional immediate payment, all in one transaction.
    #[instrument(skip(self, input), fields(user_id = %user_id))]
    pub async fn create_order(
        &self,
        user_id: Uuid,
        input: CreateOrderInput,
    ) -> Result<OrderDetail, ServiceError> {
        if input.items.is_empty() {
            return Err(ServiceError::ValidationError(
                "Minimal satu layanan harus dipilih".to_string(),
            ));
        }

        let payment_status = match input.payment_status.as_deref() {
            Some(raw) => models::parse_payment_status(raw)?,
            None => PaymentStatus::BelumBayar,
        };
        let payment_method = match input.payment_method.as_deref() {
            Some(raw) => models::parse_payment_method(raw)?,
            None => PaymentMethod::Tunai,
        };

        let db = &*self.db_pool;
        let now = Utc::now();
        let order_id = Uuid::new_v4();

        let txn = db.begin().await.map_err(|e| {
            error!(error = %e, "Failed to start transaction for order creation");
            ServiceError::DatabaseError(e)
        })?;

        // Resolve the customer: an existing id, or an inline walk-in customer
        let customer_id = match input.customer_id {
            Some(id) => {
                customer::Entity::find_by_id(id)
                    .one(&txn)
                    .await
                    .map_err(ServiceError::DatabaseError)?
                    .ok_or_else(|| {
                        ServiceError::NotFound("Pelanggan tidak ditemukan".to_string())
                    })?
                    .id
            }
            None => {
                let name = input
                    .customer_name
                    .as_deref()
                    .map(str::trim)
                    .filter(|s| !s.is_empty())
                    .ok_or_else(|| {
                        ServiceError::ValidationError(
                            "Pelanggan harus dipilih atau diisi".to_string(),
                        )
                    })?;

                let new_customer = customer::ActiveModel {
                    id: Set(Uuid::new_v4()),
                    name: Set(name.to_string()),
                    phone: Set(input.customer_phone.clone()),
                    address: Set(None),
                    created_at: Set(now),
                    updated_at: Set(now),
                };
                new_customer
                    .insert(&txn)
                    .await
                    .map_err(ServiceError::DatabaseError)?
                    .id
            }
        };

        // Snapshot prices from the catalog
        let mut lines: Vec<(Uuid, Decimal, Decimal)> = Vec::with_capacity(input.items.len());
        for item in &input.items {
            if item.quantity <= Decimal::ZERO {
                return Err(ServiceError::ValidationError(
                    "Jumlah harus lebih dari 0".to_string(),
                ));
            }

            let svc = service::Entity::find_by_id(item.service_id)
                .one(&txn)
                .await
                .map_err(ServiceError::DatabaseError)?
                .ok_or_else(|| ServiceError::NotFound("Layanan tidak ditemukan".to_string()))?;

            lines.push((svc.id, item.quantity, svc.price));
        }
        let priced: Vec<(Decimal, Decimal)> =
            lines.iter().map(|(_, qty, price)| (*qty, *price)).collect();
        let total_amount = order_total(&priced);

        // Generate a nota number, retrying on the unlikely collision.
        // The unique index on order_number is the backstop.
        let mut order_number = generate_order_number(now, &mut rand::thread_rng());
        for _ in 0..5 {
            let exists = order::Entity::find()
                .filter(order::Column::OrderNumber.eq(order_number.clone()))
                .count(&txn)
                .await
                .map_err(ServiceError::DatabaseError)?
                > 0;
            if !exists {
                break;
            }
            warn!(order_number = %order_number, "Order number collision, regenerating");
            order_number = generate_order_number(now, &mut rand::thread_rng());
        }

        let order_model = order::ActiveModel {
            id: Set(order_id),
            order_number: Set(order_number.clone()),
            customer_id: Set(customer_id),
            user_id: Set(user_id),
            total_amount: Set(total_amount),
            status: Set(OrderStatus::Diterima.to_string()),
            payment_status: Set(payment_status.to_string()),
            notes: Set(input.notes.clone()),
            created_at: Set(now),
            updated_at: Set(now),
        };
        order_model
            .insert(&txn)
            .await
            .map_err(ServiceError::DatabaseError)?;

        for (service_id, quantity, unit_price) in &lines {
            let item_model = order_item::ActiveModel {
                id: Set(Uuid::new_v4()),
                order_id: Set(order_id),
                service_id: Set(*service_id),
                quantity: Set(*quantity),
                unit_price: Set(*unit_price),
                subtotal: Set(*quantity * *unit_price),
                created_at: Set(now),
            };
            item_model
                .insert(&txn)
                .await
                .map_err(ServiceError::DatabaseError)?;
        }

        let history = status_history::ActiveModel {
            id: Set(Uuid::new_v4()),
            order_id: Set(order_id),
            status: Set(OrderStatus::Diterima.to_string()),
            changed_by: Set(user_id),
            changed_at: Set(now),
        };
        history
            .insert(&txn)
            .await
            .map_err(ServiceError::DatabaseError)?;

        if payment_status == PaymentStatus::SudahBayar {
            let payment_model = payment::ActiveModel {
                id: Set(Uuid::new_v4()),
                order_id: Set(order_id),
                amount: Set(total_amount),
                method: Set(payment_method.to_string()),
                paid_at: Set(now),
            };
            payment_model
                .insert(&txn)
                .await
                .map_err(ServiceError::DatabaseError)?;
        }

        txn.commit().await.map_err(|e| {
            error!(error = %e, order_id = %order_id, "Failed to commit order creation transaction");
            ServiceError::DatabaseError(e)
        })?;

        info!(order_id = %order_id, order_number = %order_number, total = %total_amount, "Order created");

        self.activity
            .record(
                user_id,
                "CREATE_ORDER",
                "order",
                Some(order_id.to_string()),
                Some(json!({ "order_number": order_number, "total_amount": total_amount })),
            )
            .await;

        self.get_order(order_id).await
    }

    /// Sets an order's status and appends a status history row.
    /// Membership in the known status set is the only validation.
    #[instrument(skip(self), fields(order_id = %order_id, status = raw_status))]
    pub async fn update_status(
        &self,
        order_id: Uuid,
        raw_status: &str,
        changed_by: Uuid,
    ) -> Result<OrderDetail, ServiceError> {
        let status = models::parse_order_status(raw_status)?;

        let db = &*self.db_pool;
        let now = Utc::now();

        let txn = db.begin().await.map_err(ServiceError::DatabaseError)?;

        let existing = order::Entity::find_by_id(order_id)
            .one(&txn)
            .await
            .map_err(ServiceError::DatabaseError)?
            .ok_or_else(|| ServiceError::NotFound("Pesanan tidak ditemukan".to_string()))?;

        let mut active: order::ActiveModel = existing.into();
        active.status = Set(status.to_string());
        active.updated_at = Set(now);
        active
            .update(&txn)
            .await
            .map_err(ServiceError::DatabaseError)?;

        let history = status_history::ActiveModel {
            id: Set(Uuid::new_v4()),
            order_id: Set(order_id),
            status: Set(status.to_string()),
            changed_by: Set(changed_by),
            changed_at: Set(now),
        };
        history
            .insert(&txn)
            .await
            .map_err(ServiceError::DatabaseError)?;

        txn.commit().await.map_err(ServiceError::DatabaseError)?;

        info!(order_id = %order_id, status = %status, "Order status updated");

        self.activity
            .record(
                changed_by,
                "UPDATE_ORDER_STATUS",
                "order",
                Some(order_id.to_string()),
                Some(json!({ "status": status.to_string() })),
            )
            .await;

        self.get_order(order_id).await
    }

    /// Sets the payment status. The first transition to SUDAH_BAYAR creates
    /// the payment row for the stored order total; repeating it is a no-op.
    #[instrument(skip(self), fields(order_id = %order_id))]
    pub async fn update_payment(
        &self,
        order_id: Uuid,
        raw_payment_status: &str,
        raw_method: Option<&str>,
        changed_by: Uuid,
    ) -> Result<OrderDetail, ServiceError> {
        let payment_status = models::parse_payment_status(raw_payment_status)?;
        let method = match raw_method {
            Some(raw) => models::parse_payment_method(raw)?,
            None => PaymentMethod::Tunai,
        };

        let db = &*self.db_pool;
        let now = Utc::now();

        let txn = db.begin().await.map_err(ServiceError::DatabaseError)?;

        let existing = order::Entity::find_by_id(order_id)
            .one(&txn)
            .await
            .map_err(ServiceError::DatabaseError)?
            .ok_or_else(|| ServiceError::NotFound("Pesanan tidak ditemukan".to_string()))?;

        let total_amount = existing.total_amount;

        let mut active: order::ActiveModel = existing.into();
        active.payment_status = Set(payment_status.to_string());
        active.updated_at = Set(now);
        active
            .update(&txn)
            .await
            .map_err(ServiceError::DatabaseError)?;

        if payment_status == PaymentStatus::SudahBayar {
            let already_paid = payment::Entity::find()
                .filter(payment::Column::OrderId.eq(order_id))
                .count(&txn)
                .await
                .map_err(ServiceError::DatabaseError)?
                > 0;

            if !already_paid {
                let payment_model = payment::ActiveModel {
                    id: Set(Uuid::new_v4()),
                    order_id: Set(order_id),
                    amount: Set(total_amount),
                    method: Set(method.to_string()),
                    paid_at: Set(now),
                };
                payment_model
                    .insert(&txn)
                    .await
                    .map_err(ServiceError::DatabaseError)?;
            }
        }

        txn.commit().await.map_err(ServiceError::DatabaseError)?;

        info!(order_id = %order_id, payment_status = %payment_status, "Order payment updated");

        self.activity
            .record(
                changed_by,
                "UPDATE_PAYMENT",
                "order",
                Some(order_id.to_string()),
                Some(json!({ "payment_status": payment_status.to_string() })),
            )
            .await;

        self.get_order(order_id).await
    }

    /// Assembles the full order view: customer, cashier, items with their
    /// services, payment and (optionally) the status trail.
    async fn load_detail(
        &self,
        model: order::Model,
        with_history: bool,
    ) -> Result<OrderDetail, ServiceError> {
        let db = &*self.db_pool;

        let customer = customer::Entity::find_by_id(model.customer_id)
            .one(db)
            .await
            .map_err(ServiceError::DatabaseError)?
            .ok_or_else(|| {
                ServiceError::InternalError(format!(
                    "order {} references missing customer {}",
                    model.id, model.customer_id
                ))
            })?;

        let cashier = user::Entity::find_by_id(model.user_id)
            .one(db)
            .await
            .map_err(ServiceError::DatabaseError)?
            .map(|u| CashierInfo {
                id: u.id,
                username: u.username,
                name: u.name,
            })
            .ok_or_else(|| {
                ServiceError::InternalError(format!(
                    "order {} references missing user {}",
                    model.id, model.user_id
                ))
            })?;

        let items = order_item::Entity::find()
            .filter(order_item::Column::OrderId.eq(model.id))
            .find_also_related(service::Entity)
            .all(db)
            .await
            .map_err(ServiceError::DatabaseError)?
            .into_iter()
            .map(|(item, svc)| {
                let svc = svc.ok_or_else(|| {
                    ServiceError::InternalError(format!(
                        "order item {} references missing service",
                        item.id
                    ))
                })?;
                Ok(OrderItemDetail {
                    id: item.id,
                    service: svc,
                    quantity: item.quantity,
                    unit_price: item.unit_price,
                    subtotal: item.subtotal,
                })
            })
            .collect::<Result<Vec<_>, ServiceError>>()?;

        let payment = payment::Entity::find()
            .filter(payment::Column::OrderId.eq(model.id))
            .one(db)
            .await
            .map_err(ServiceError::DatabaseError)?;

        let status_history = if with_history {
            Some(
                status_history::Entity::find()
                    .filter(status_history::Column::OrderId.eq(model.id))
                    .order_by_desc(status_history::Column::ChangedAt)
                    .all(db)
                    .await
                    .map_err(ServiceError::DatabaseError)?,
            )
        } else {
            None
        };

        Ok(OrderDetail {
            id: model.id,
            order_number: model.order_number,
            status: model.status,
            payment_status: model.payment_status,
            total_amount: model.total_amount,
            notes: model.notes,
            customer,
            cashier,
            items,
            payment,
            status_history,
            created_at: model.created_at,
            updated_at: model.updated_at,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use rust_decimal_macros::dec;

    #[test]
    fn order_number_has_prefix_date_and_suffix() {
        let now = Utc.with_ymd_and_hms(2024, 3, 7, 10, 30, 0).unwrap();
        let mut rng = StdRng::seed_from_u64(42);

        let number = generate_order_number(now, &mut rng);

        assert_eq!(number.len(), 13);
        assert!(number.starts_with("LDR240307"));
        assert!(number[9..].chars().all(|c| c.is_ascii_digit()));
    }

    #[test]
    fn order_numbers_vary_with_rng() {
        let now = Utc.with_ymd_and_hms(2024, 3, 7, 10, 30, 0).unwrap();
        let mut rng = StdRng::seed_from_u64(7);

        let first = generate_order_number(now, &mut rng);
        let second = generate_order_number(now, &mut rng);

        assert_ne!(first, second);
    }

    #[test]
    fn total_is_sum_of_line_subtotals() {
        // 2 kg wash-and-fold at 7000/kg plus one suit at 35000
        let items = vec![(dec!(2), dec!(7000)), (dec!(1), dec!(35000))];
        assert_eq!(order_total(&items), dec!(49000));
    }

    #[test]
    fn fractional_kiloan_quantities_are_exact() {
        let items = vec![(dec!(2.5), dec!(7000))];
        assert_eq!(order_total(&items), dec!(17500));
    }
}
