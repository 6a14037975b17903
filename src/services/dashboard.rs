use crate::{
    db::DbPool,
    entities::{customer, order, order_item, service},
    errors::ServiceError,
    models::{OrderStatus, PaymentStatus},
    services::orders::{OrderDetail, OrderService},
};
use chrono::{DateTime, Datelike, Duration, NaiveDate, Utc};
use rust_decimal::Decimal;
use sea_orm::{ColumnTrait, EntityTrait, QueryFilter};
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::instrument;

#[derive(Debug, Serialize)]
pub struct PeriodStats {
    pub orders: u64,
    pub revenue: Decimal,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DailyRevenuePoint {
    pub date: NaiveDate,
    pub orders: u64,
    pub revenue: Decimal,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MonthlyRevenuePoint {
    /// First day of the month
    pub month: NaiveDate,
    pub orders: u64,
    pub revenue: Decimal,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TopService {
    pub service_id: uuid::Uuid,
    pub name: String,
    pub total_quantity: Decimal,
    pub order_count: u64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TopCustomer {
    pub customer_id: uuid::Uuid,
    pub name: String,
    pub order_count: u64,
    pub total_spent: Decimal,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OwnerDashboard {
    pub today: PeriodStats,
    pub this_month: PeriodStats,
    pub this_year: PeriodStats,
    pub last_seven_days: Vec<DailyRevenuePoint>,
    pub last_six_months: Vec<MonthlyRevenuePoint>,
    pub top_services: Vec<TopService>,
    pub top_customers: Vec<TopCustomer>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct KasirDashboard {
    pub today_orders: u64,
    pub today_revenue: Decimal,
    pub unpaid_orders: u64,
    pub ready_for_pickup: u64,
    pub in_progress: Vec<OrderDetail>,
}

/// Aggregated figures for the two dashboard views. Revenue always means
/// paid, non-cancelled orders; order counts exclude cancelled ones.
#[derive(Clone)]
pub struct DashboardService {
    db_pool: Arc<DbPool>,
    orders: Arc<OrderService>,
}

impl DashboardService {
    pub fn new(db_pool: Arc<DbPool>, orders: Arc<OrderService>) -> Self {
        Self { db_pool, orders }
    }

    #[instrument(skip(self))]
    pub async fn owner_dashboard(&self) -> Result<OwnerDashboard, ServiceError> {
        let now = Utc::now();
        let today = now.date_naive();
        let month_start = today.with_day(1).unwrap_or(today);
        let year_start = NaiveDate::from_ymd_opt(today.year(), 1, 1).unwrap_or(today);

        // One fetch covers every aggregate below
        let year_orders = self
            .orders_since(start_of_day(year_start))
            .await?;

        let today_stats = period_stats(&year_orders, start_of_day(today), now);
        let month_stats = period_stats(&year_orders, start_of_day(month_start), now);
        let year_stats = period_stats(&year_orders, start_of_day(year_start), now);

        let mut last_seven_days = Vec::with_capacity(7);
        for offset in (0..7).rev() {
            let day = today - Duration::days(offset);
            let stats = period_stats(
                &year_orders,
                start_of_day(day),
                start_of_day(day + Duration::days(1)),
            );
            last_seven_days.push(DailyRevenuePoint {
                date: day,
                orders: stats.orders,
                revenue: stats.revenue,
            });
        }

        // Six months may reach into last year, so fetch separately
        let six_months_ago = shift_months(month_start, -5);
        let six_month_orders = self.orders_since(start_of_day(six_months_ago)).await?;

        let mut last_six_months = Vec::with_capacity(6);
        for offset in (0..6).rev() {
            let month = shift_months(month_start, -offset);
            let next = shift_months(month, 1);
            let stats = period_stats(&six_month_orders, start_of_day(month), start_of_day(next));
            last_six_months.push(MonthlyRevenuePoint {
                month,
                orders: stats.orders,
                revenue: stats.revenue,
            });
        }

        let month_orders: Vec<&order::Model> = year_orders
            .iter()
            .filter(|o| o.created_at >= start_of_day(month_start))
            .collect();

        let top_services = self.top_services(&month_orders).await?;
        let top_customers = self.top_customers(&month_orders).await?;

        Ok(OwnerDashboard {
            today: today_stats,
            this_month: month_stats,
            this_year: year_stats,
            last_seven_days,
            last_six_months,
            top_services,
            top_customers,
        })
    }

    #[instrument(skip(self))]
    pub async fn kasir_dashboard(&self) -> Result<KasirDashboard, ServiceError> {
        let db = &*self.db_pool;
        let now = Utc::now();
        let today = now.date_naive();

        let today_orders = self.orders_since(start_of_day(today)).await?;
        let today_stats = period_stats(&today_orders, start_of_day(today), now);

        use sea_orm::PaginatorTrait;

        let unpaid_orders = order::Entity::find()
            .filter(order::Column::PaymentStatus.eq(PaymentStatus::BelumBayar.to_string()))
            .filter(order::Column::Status.ne(OrderStatus::Dibatalkan.to_string()))
            .count(db)
            .await
            .map_err(ServiceError::DatabaseError)?;

        let ready_for_pickup = order::Entity::find()
            .filter(order::Column::Status.eq(OrderStatus::Selesai.to_string()))
            .count(db)
            .await
            .map_err(ServiceError::DatabaseError)?;

        let in_progress = self.orders.list_in_progress(10).await?;

        Ok(KasirDashboard {
            today_orders: today_stats.orders,
            today_revenue: today_stats.revenue,
            unpaid_orders,
            ready_for_pickup,
            in_progress,
        })
    }

    async fn orders_since(
        &self,
        start: DateTime<Utc>,
    ) -> Result<Vec<order::Model>, ServiceError> {
        order::Entity::find()
            .filter(order::Column::CreatedAt.gte(start))
            .filter(order::Column::Status.ne(OrderStatus::Dibatalkan.to_string()))
            .all(&*self.db_pool)
            .await
            .map_err(ServiceError::DatabaseError)
    }

    async fn top_services(
        &self,
        orders: &[&order::Model],
    ) -> Result<Vec<TopService>, ServiceError> {
        let db = &*self.db_pool;
        let order_ids: Vec<uuid::Uuid> = orders.iter().map(|o| o.id).collect();
        if order_ids.is_empty() {
            return Ok(Vec::new());
        }

        let items = order_item::Entity::find()
            .filter(order_item::Column::OrderId.is_in(order_ids))
            .all(db)
            .await
            .map_err(ServiceError::DatabaseError)?;

        let mut by_service: HashMap<uuid::Uuid, (Decimal, u64)> = HashMap::new();
        for item in &items {
            let entry = by_service
                .entry(item.service_id)
                .or_insert((Decimal::ZERO, 0));
            entry.0 += item.quantity;
            entry.1 += 1;
        }

        let services = service::Entity::find()
            .filter(service::Column::Id.is_in(by_service.keys().copied().collect::<Vec<_>>()))
            .all(db)
            .await
            .map_err(ServiceError::DatabaseError)?;

        let mut top: Vec<TopService> = services
            .into_iter()
            .filter_map(|s| {
                by_service.get(&s.id).map(|(qty, count)| TopService {
                    service_id: s.id,
                    name: s.name,
                    total_quantity: *qty,
                    order_count: *count,
                })
            })
            .collect();
        top.sort_by(|a, b| b.total_quantity.cmp(&a.total_quantity));
        top.truncate(5);

        Ok(top)
    }

    async fn top_customers(
        &self,
        orders: &[&order::Model],
    ) -> Result<Vec<TopCustomer>, ServiceError> {
        let db = &*self.db_pool;

        let mut by_customer: HashMap<uuid::Uuid, (u64, Decimal)> = HashMap::new();
        for o in orders {
            let entry = by_customer.entry(o.customer_id).or_insert((0, Decimal::ZERO));
            entry.0 += 1;
            if o.payment_status == PaymentStatus::SudahBayar.to_string() {
                entry.1 += o.total_amount;
            }
        }
        if by_customer.is_empty() {
            return Ok(Vec::new());
        }

        let customers = customer::Entity::find()
            .filter(customer::Column::Id.is_in(by_customer.keys().copied().collect::<Vec<_>>()))
            .all(db)
            .await
            .map_err(ServiceError::DatabaseError)?;

        let mut top: Vec<TopCustomer> = customers
            .into_iter()
            .filter_map(|c| {
                by_customer.get(&c.id).map(|(count, spent)| TopCustomer {
                    customer_id: c.id,
                    name: c.name,
                    order_count: *count,
                    total_spent: *spent,
                })
            })
            .collect();
        top.sort_by(|a, b| b.order_count.cmp(&a.order_count));
        top.truncate(5);

        Ok(top)
    }
}

fn start_of_day(date: NaiveDate) -> DateTime<Utc> {
    date.and_hms_opt(0, 0, 0).unwrap_or_default().and_utc()
}

/// Moves a month-start date by whole months, clamping to the first day
fn shift_months(month_start: NaiveDate, months: i64) -> NaiveDate {
    let total = month_start.year() as i64 * 12 + month_start.month0() as i64 + months;
    let year = total.div_euclid(12) as i32;
    let month = total.rem_euclid(12) as u32 + 1;
    NaiveDate::from_ymd_opt(year, month, 1).unwrap_or(month_start)
}

fn period_stats(orders: &[order::Model], start: DateTime<Utc>, end: DateTime<Utc>) -> PeriodStats {
    let mut count = 0u64;
    let mut revenue = Decimal::ZERO;
    for o in orders {
        if o.created_at >= start && o.created_at < end {
            count += 1;
            if o.payment_status == PaymentStatus::SudahBayar.to_string() {
                revenue += o.total_amount;
            }
        }
    }
    PeriodStats {
        orders: count,
        revenue,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn month_shifts_cross_year_boundaries() {
        let jan = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        assert_eq!(shift_months(jan, -1), NaiveDate::from_ymd_opt(2023, 12, 1).unwrap());
        assert_eq!(shift_months(jan, -5), NaiveDate::from_ymd_opt(2023, 8, 1).unwrap());
        assert_eq!(shift_months(jan, 1), NaiveDate::from_ymd_opt(2024, 2, 1).unwrap());
        assert_eq!(shift_months(jan, 12), NaiveDate::from_ymd_opt(2025, 1, 1).unwrap());
    }

    #[test]
    fn revenue_counts_only_paid_orders() {
        use crate::entities::order::Model;
        use rust_decimal_macros::dec;

        let start = start_of_day(NaiveDate::from_ymd_opt(2024, 3, 1).unwrap());
        let end = start_of_day(NaiveDate::from_ymd_opt(2024, 3, 2).unwrap());
        let at = start + Duration::hours(10);

        let base = Model {
            id: uuid::Uuid::new_v4(),
            order_number: "LDR2403010001".to_string(),
            customer_id: uuid::Uuid::new_v4(),
            user_id: uuid::Uuid::new_v4(),
            total_amount: dec!(20000),
            status: "DITERIMA".to_string(),
            payment_status: "SUDAH_BAYAR".to_string(),
            notes: None,
            created_at: at,
            updated_at: at,
        };
        let unpaid = Model {
            id: uuid::Uuid::new_v4(),
            order_number: "LDR2403010002".to_string(),
            payment_status: "BELUM_BAYAR".to_string(),
            total_amount: dec!(15000),
            ..base.clone()
        };

        let stats = period_stats(&[base, unpaid], start, end);
        assert_eq!(stats.orders, 2);
        assert_eq!(stats.revenue, dec!(20000));
    }
}
