use crate::{
    db::DbPool,
    entities::{customer, order, order_item, service, settings},
    errors::ServiceError,
    models::{OrderStatus, PaymentStatus},
};
use chrono::{DateTime, Datelike, Duration, NaiveDate, Utc};
use rust_decimal::Decimal;
use sea_orm::{ColumnTrait, EntityTrait, QueryFilter, QueryOrder};
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{info, instrument};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportPeriod {
    Daily,
    Monthly,
    Yearly,
    Custom,
}

impl ReportPeriod {
    pub fn slug(&self) -> &'static str {
        match self {
            Self::Daily => "harian",
            Self::Monthly => "bulanan",
            Self::Yearly => "tahunan",
            Self::Custom => "custom",
        }
    }
}

/// Half-open date range, end exclusive
#[derive(Debug, Clone, Copy)]
pub struct ReportRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl ReportRange {
    pub fn day(date: NaiveDate) -> Self {
        Self {
            start: date,
            end: date + Duration::days(1),
        }
    }

    pub fn month(date: NaiveDate) -> Self {
        let start = date.with_day(1).unwrap_or(date);
        let end = if start.month() == 12 {
            NaiveDate::from_ymd_opt(start.year() + 1, 1, 1).unwrap_or(start)
        } else {
            NaiveDate::from_ymd_opt(start.year(), start.month() + 1, 1).unwrap_or(start)
        };
        Self { start, end }
    }

    pub fn year(date: NaiveDate) -> Self {
        let start = NaiveDate::from_ymd_opt(date.year(), 1, 1).unwrap_or(date);
        let end = NaiveDate::from_ymd_opt(date.year() + 1, 1, 1).unwrap_or(date);
        Self { start, end }
    }

    /// Inclusive dates from the caller become a half-open range
    pub fn custom(start: NaiveDate, end: NaiveDate) -> Result<Self, ServiceError> {
        if end < start {
            return Err(ServiceError::ValidationError(
                "Tanggal akhir harus setelah tanggal mulai".to_string(),
            ));
        }
        Ok(Self {
            start,
            end: end + Duration::days(1),
        })
    }

    fn start_at(&self) -> DateTime<Utc> {
        self.start.and_hms_opt(0, 0, 0).unwrap_or_default().and_utc()
    }

    fn end_at(&self) -> DateTime<Utc> {
        self.end.and_hms_opt(0, 0, 0).unwrap_or_default().and_utc()
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportTopService {
    pub name: String,
    pub total_quantity: Decimal,
    pub revenue: Decimal,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportTopCustomer {
    pub name: String,
    pub order_count: u64,
    pub total_spent: Decimal,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportStats {
    pub total_orders: u64,
    pub total_revenue: Decimal,
    pub paid_orders: u64,
    pub unpaid_orders: u64,
    pub top_services: Vec<ReportTopService>,
    pub top_customers: Vec<ReportTopCustomer>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportBreakdownPoint {
    /// Day (or first day of the month) this bucket covers
    pub period: NaiveDate,
    pub orders: u64,
    pub revenue: Decimal,
}

/// A flattened order row for report tables and exports
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportOrderRow {
    pub order_number: String,
    pub created_at: DateTime<Utc>,
    pub customer_name: String,
    pub customer_phone: Option<String>,
    pub status: String,
    pub payment_status: String,
    pub total_amount: Decimal,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Report {
    pub period: String,
    pub start_date: NaiveDate,
    /// Last day covered, inclusive
    pub end_date: NaiveDate,
    pub stats: ReportStats,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub breakdown: Option<Vec<ReportBreakdownPoint>>,
    pub orders: Vec<ReportOrderRow>,
}

/// An export ready to stream back to the browser
pub struct ReportExport {
    pub filename: String,
    pub content_type: &'static str,
    pub bytes: Vec<u8>,
}

/// Revenue and volume reporting over closed date ranges. Cancelled
/// orders are excluded everywhere; revenue only counts paid orders.
#[derive(Clone)]
pub struct ReportService {
    db_pool: Arc<DbPool>,
}

impl ReportService {
    pub fn new(db_pool: Arc<DbPool>) -> Self {
        Self { db_pool }
    }

    #[instrument(skip(self))]
    pub async fn report(
        &self,
        period: ReportPeriod,
        range: ReportRange,
    ) -> Result<Report, ServiceError> {
        let db = &*self.db_pool;

        let orders = order::Entity::find()
            .filter(order::Column::CreatedAt.gte(range.start_at()))
            .filter(order::Column::CreatedAt.lt(range.end_at()))
            .filter(order::Column::Status.ne(OrderStatus::Dibatalkan.to_string()))
            .order_by_asc(order::Column::CreatedAt)
            .all(db)
            .await
            .map_err(ServiceError::DatabaseError)?;

        let stats = self.stats_for(&orders).await?;
        let rows = self.order_rows(&orders).await?;

        let breakdown = match period {
            ReportPeriod::Monthly | ReportPeriod::Custom => {
                Some(daily_breakdown(&orders, range))
            }
            ReportPeriod::Yearly => Some(monthly_breakdown(&orders, range)),
            ReportPeriod::Daily => None,
        };

        info!(
            period = period.slug(),
            orders = stats.total_orders,
            revenue = %stats.total_revenue,
            "Report generated"
        );

        Ok(Report {
            period: period.slug().to_string(),
            start_date: range.start,
            end_date: range.end - Duration::days(1),
            stats,
            breakdown,
            orders: rows,
        })
    }

    /// Workbook with a summary header and one row per order
    #[instrument(skip(self, report))]
    pub async fn export_excel(
        &self,
        period: ReportPeriod,
        report: &Report,
    ) -> Result<ReportExport, ServiceError> {
        use rust_xlsxwriter::{Format, Workbook};

        let shop = self.shop_settings().await?;

        let mut workbook = Workbook::new();
        let worksheet = workbook.add_worksheet();

        let bold = Format::new().set_bold();

        let write = |e: rust_xlsxwriter::XlsxError| {
            ServiceError::InternalError(format!("xlsx write failed: {e}"))
        };

        worksheet
            .write_string_with_format(0, 0, &shop.business_name, &bold)
            .map_err(write)?;
        worksheet
            .write_string(
                1,
                0,
                &format!(
                    "Laporan {} ({} s/d {})",
                    report.period, report.start_date, report.end_date
                ),
            )
            .map_err(write)?;

        worksheet
            .write_string(3, 0, "Total Transaksi")
            .map_err(write)?;
        worksheet
            .write_number(3, 1, report.stats.total_orders as f64)
            .map_err(write)?;
        worksheet
            .write_string(4, 0, "Total Pendapatan")
            .map_err(write)?;
        worksheet
            .write_string(4, 1, &format_rupiah(report.stats.total_revenue))
            .map_err(write)?;
        worksheet.write_string(5, 0, "Lunas").map_err(write)?;
        worksheet
            .write_number(5, 1, report.stats.paid_orders as f64)
            .map_err(write)?;
        worksheet.write_string(6, 0, "Belum Bayar").map_err(write)?;
        worksheet
            .write_number(6, 1, report.stats.unpaid_orders as f64)
            .map_err(write)?;

        let headers = [
            "No. Nota",
            "Tanggal",
            "Pelanggan",
            "No. HP",
            "Status",
            "Status Bayar",
            "Total",
        ];
        let header_row = 8u32;
        for (col, title) in headers.iter().enumerate() {
            worksheet
                .write_string_with_format(header_row, col as u16, *title, &bold)
                .map_err(write)?;
        }

        for (i, row) in report.orders.iter().enumerate() {
            let r = header_row + 1 + i as u32;
            worksheet
                .write_string(r, 0, &row.order_number)
                .map_err(write)?;
            worksheet
                .write_string(r, 1, &row.created_at.format("%d/%m/%Y %H:%M").to_string())
                .map_err(write)?;
            worksheet
                .write_string(r, 2, &row.customer_name)
                .map_err(write)?;
            worksheet
                .write_string(r, 3, row.customer_phone.as_deref().unwrap_or("-"))
                .map_err(write)?;
            worksheet.write_string(r, 4, &row.status).map_err(write)?;
            worksheet
                .write_string(r, 5, payment_status_label(&row.payment_status))
                .map_err(write)?;
            worksheet
                .write_string(r, 6, &format_rupiah(row.total_amount))
                .map_err(write)?;
        }

        let bytes = workbook
            .save_to_buffer()
            .map_err(|e| ServiceError::InternalError(format!("xlsx save failed: {e}")))?;

        Ok(ReportExport {
            filename: export_filename(period, "xlsx"),
            content_type:
                "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
            bytes,
        })
    }

    /// A4 document: shop header, summary block and the first fifty
    /// order rows, continued on further pages when a page fills up.
    #[instrument(skip(self, report))]
    pub async fn export_pdf(
        &self,
        period: ReportPeriod,
        report: &Report,
    ) -> Result<ReportExport, ServiceError> {
        use printpdf::{BuiltinFont, Mm, PdfDocument};

        let shop = self.shop_settings().await?;

        // A4 portrait
        let page_w = Mm(210.0);
        let page_h = Mm(297.0);
        let margin = Mm(15.0);
        let line = Mm(6.0);

        let (doc, page, layer) = PdfDocument::new(
            format!("Laporan {}", report.period),
            page_w,
            page_h,
            "Page 1",
        );
        let font = doc
            .add_builtin_font(BuiltinFont::Helvetica)
            .map_err(|e| ServiceError::InternalError(format!("pdf font failed: {e}")))?;
        let font_bold = doc
            .add_builtin_font(BuiltinFont::HelveticaBold)
            .map_err(|e| ServiceError::InternalError(format!("pdf font failed: {e}")))?;

        let mut layer_ref = doc.get_page(page).get_layer(layer);
        let mut y = page_h - margin;

        layer_ref.use_text(&shop.business_name, 16.0, margin, y, &font_bold);
        y = y - line - Mm(2.0);
        layer_ref.use_text(
            format!(
                "Laporan {} ({} s/d {})",
                report.period, report.start_date, report.end_date
            ),
            11.0,
            margin,
            y,
            &font,
        );
        y = y - line - line;

        layer_ref.use_text("Ringkasan", 12.0, margin, y, &font_bold);
        y = y - line;
        let summary_lines = [
            format!("Total Transaksi: {}", report.stats.total_orders),
            format!(
                "Total Pendapatan: {}",
                format_rupiah(report.stats.total_revenue)
            ),
            format!("Lunas: {}", report.stats.paid_orders),
            format!("Belum Bayar: {}", report.stats.unpaid_orders),
        ];
        for text in &summary_lines {
            layer_ref.use_text(text, 10.0, margin, y, &font);
            y = y - line;
        }
        y = y - line;

        layer_ref.use_text("Transaksi", 12.0, margin, y, &font_bold);
        y = y - line;

        let shown = report.orders.len().min(50);
        for row in report.orders.iter().take(50) {
            if y < Mm(20.0) {
                let (next_page, next_layer) = doc.add_page(page_w, page_h, "Continuation");
                layer_ref = doc.get_page(next_page).get_layer(next_layer);
                y = page_h - margin;
            }
            let text = format!(
                "{}  {}  {}  {}  {}  {}",
                row.order_number,
                row.created_at.format("%d/%m/%Y"),
                row.customer_name,
                row.status,
                payment_status_label(&row.payment_status),
                format_rupiah(row.total_amount),
            );
            layer_ref.use_text(text, 9.0, margin, y, &font);
            y = y - line;
        }
        if report.orders.len() > shown {
            if y < Mm(20.0) {
                let (next_page, next_layer) = doc.add_page(page_w, page_h, "Continuation");
                layer_ref = doc.get_page(next_page).get_layer(next_layer);
                y = page_h - margin;
            }
            layer_ref.use_text(
                format!("... dan {} transaksi lainnya", report.orders.len() - shown),
                9.0,
                margin,
                y,
                &font,
            );
        }

        let bytes = doc
            .save_to_bytes()
            .map_err(|e| ServiceError::InternalError(format!("pdf save failed: {e}")))?;

        Ok(ReportExport {
            filename: export_filename(period, "pdf"),
            content_type: "application/pdf",
            bytes,
        })
    }

    async fn shop_settings(&self) -> Result<settings::Model, ServiceError> {
        settings::Entity::find_by_id("default-settings")
            .one(&*self.db_pool)
            .await
            .map_err(ServiceError::DatabaseError)?
            .ok_or(())
            .or_else(|_| {
                Ok(settings::Model {
                    id: "default-settings".to_string(),
                    business_name: "LaundryKu".to_string(),
                    address: None,
                    phone: None,
                    receipt_footer: None,
                    template: "simple".to_string(),
                    logo_url: None,
                    updated_at: Utc::now(),
                })
            })
    }

    async fn stats_for(&self, orders: &[order::Model]) -> Result<ReportStats, ServiceError> {
        let db = &*self.db_pool;

        let mut total_revenue = Decimal::ZERO;
        let mut paid_orders = 0u64;
        let mut unpaid_orders = 0u64;
        for o in orders {
            if o.payment_status == PaymentStatus::SudahBayar.to_string() {
                paid_orders += 1;
                total_revenue += o.total_amount;
            } else {
                unpaid_orders += 1;
            }
        }

        let order_ids: Vec<Uuid> = orders.iter().map(|o| o.id).collect();

        let mut top_services = Vec::new();
        if !order_ids.is_empty() {
            let items = order_item::Entity::find()
                .filter(order_item::Column::OrderId.is_in(order_ids))
                .all(db)
                .await
                .map_err(ServiceError::DatabaseError)?;

            let mut by_service: HashMap<Uuid, (Decimal, Decimal)> = HashMap::new();
            for item in &items {
                let entry = by_service
                    .entry(item.service_id)
                    .or_insert((Decimal::ZERO, Decimal::ZERO));
                entry.0 += item.quantity;
                entry.1 += item.subtotal;
            }

            let services = service::Entity::find()
                .filter(
                    service::Column::Id.is_in(by_service.keys().copied().collect::<Vec<_>>()),
                )
                .all(db)
                .await
                .map_err(ServiceError::DatabaseError)?;

            top_services = services
                .into_iter()
                .filter_map(|s| {
                    by_service.get(&s.id).map(|(qty, revenue)| ReportTopService {
                        name: s.name,
                        total_quantity: *qty,
                        revenue: *revenue,
                    })
                })
                .collect();
            top_services.sort_by(|a, b| b.total_quantity.cmp(&a.total_quantity));
            top_services.truncate(5);
        }

        let mut by_customer: HashMap<Uuid, (u64, Decimal)> = HashMap::new();
        for o in orders {
            let entry = by_customer.entry(o.customer_id).or_insert((0, Decimal::ZERO));
            entry.0 += 1;
            if o.payment_status == PaymentStatus::SudahBayar.to_string() {
                entry.1 += o.total_amount;
            }
        }
        let mut top_customers = Vec::new();
        if !by_customer.is_empty() {
            let customers = customer::Entity::find()
                .filter(
                    customer::Column::Id.is_in(by_customer.keys().copied().collect::<Vec<_>>()),
                )
                .all(db)
                .await
                .map_err(ServiceError::DatabaseError)?;

            top_customers = customers
                .into_iter()
                .filter_map(|c| {
                    by_customer.get(&c.id).map(|(count, spent)| ReportTopCustomer {
                        name: c.name,
                        order_count: *count,
                        total_spent: *spent,
                    })
                })
                .collect();
            top_customers.sort_by(|a, b| b.order_count.cmp(&a.order_count));
            top_customers.truncate(5);
        }

        Ok(ReportStats {
            total_orders: orders.len() as u64,
            total_revenue,
            paid_orders,
            unpaid_orders,
            top_services,
            top_customers,
        })
    }

    async fn order_rows(
        &self,
        orders: &[order::Model],
    ) -> Result<Vec<ReportOrderRow>, ServiceError> {
        let db = &*self.db_pool;

        let customer_ids: Vec<Uuid> = orders.iter().map(|o| o.customer_id).collect();
        let customers: HashMap<Uuid, customer::Model> = if customer_ids.is_empty() {
            HashMap::new()
        } else {
            customer::Entity::find()
                .filter(customer::Column::Id.is_in(customer_ids))
                .all(db)
                .await
                .map_err(ServiceError::DatabaseError)?
                .into_iter()
                .map(|c| (c.id, c))
                .collect()
        };

        Ok(orders
            .iter()
            .map(|o| {
                let c = customers.get(&o.customer_id);
                ReportOrderRow {
                    order_number: o.order_number.clone(),
                    created_at: o.created_at,
                    customer_name: c.map(|c| c.name.clone()).unwrap_or_else(|| "-".to_string()),
                    customer_phone: c.and_then(|c| c.phone.clone()),
                    status: o.status.clone(),
                    payment_status: o.payment_status.clone(),
                    total_amount: o.total_amount,
                }
            })
            .collect())
    }
}

fn daily_breakdown(orders: &[order::Model], range: ReportRange) -> Vec<ReportBreakdownPoint> {
    let mut points = Vec::new();
    let mut day = range.start;
    while day < range.end {
        let next = day + Duration::days(1);
        let mut count = 0u64;
        let mut revenue = Decimal::ZERO;
        for o in orders {
            let d = o.created_at.date_naive();
            if d >= day && d < next {
                count += 1;
                if o.payment_status == PaymentStatus::SudahBayar.to_string() {
                    revenue += o.total_amount;
                }
            }
        }
        points.push(ReportBreakdownPoint {
            period: day,
            orders: count,
            revenue,
        });
        day = next;
    }
    points
}

fn monthly_breakdown(orders: &[order::Model], range: ReportRange) -> Vec<ReportBreakdownPoint> {
    let mut points = Vec::new();
    let mut month = range.start.with_day(1).unwrap_or(range.start);
    while month < range.end {
        let next = if month.month() == 12 {
            NaiveDate::from_ymd_opt(month.year() + 1, 1, 1).unwrap_or(month)
        } else {
            NaiveDate::from_ymd_opt(month.year(), month.month() + 1, 1).unwrap_or(month)
        };
        let mut count = 0u64;
        let mut revenue = Decimal::ZERO;
        for o in orders {
            let d = o.created_at.date_naive();
            if d >= month && d < next {
                count += 1;
                if o.payment_status == PaymentStatus::SudahBayar.to_string() {
                    revenue += o.total_amount;
                }
            }
        }
        points.push(ReportBreakdownPoint {
            period: month,
            orders: count,
            revenue,
        });
        month = next;
    }
    points
}

fn payment_status_label(raw: &str) -> &'static str {
    if raw == PaymentStatus::SudahBayar.to_string() {
        "Lunas"
    } else {
        "Belum Bayar"
    }
}

/// Thousands-separated rupiah amount, e.g. "Rp 49.000"
fn format_rupiah(amount: Decimal) -> String {
    let whole = amount.trunc().to_string();
    let negative = whole.starts_with('-');
    let digits: Vec<char> = whole.trim_start_matches('-').chars().collect();

    let mut grouped = String::new();
    for (i, c) in digits.iter().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push('.');
        }
        grouped.push(*c);
    }

    if negative {
        format!("-Rp {grouped}")
    } else {
        format!("Rp {grouped}")
    }
}

fn export_filename(period: ReportPeriod, extension: &str) -> String {
    format!(
        "laporan-{}-{}.{}",
        period.slug(),
        Utc::now().format("%Y%m%d%H%M%S"),
        extension
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn month_range_covers_whole_month() {
        let range = ReportRange::month(NaiveDate::from_ymd_opt(2024, 2, 15).unwrap());
        assert_eq!(range.start, NaiveDate::from_ymd_opt(2024, 2, 1).unwrap());
        assert_eq!(range.end, NaiveDate::from_ymd_opt(2024, 3, 1).unwrap());

        let december = ReportRange::month(NaiveDate::from_ymd_opt(2023, 12, 5).unwrap());
        assert_eq!(december.end, NaiveDate::from_ymd_opt(2024, 1, 1).unwrap());
    }

    #[test]
    fn year_range_spans_january_to_january() {
        let range = ReportRange::year(NaiveDate::from_ymd_opt(2024, 6, 10).unwrap());
        assert_eq!(range.start, NaiveDate::from_ymd_opt(2024, 1, 1).unwrap());
        assert_eq!(range.end, NaiveDate::from_ymd_opt(2025, 1, 1).unwrap());
    }

    #[test]
    fn custom_range_is_inclusive_of_end_date() {
        let range = ReportRange::custom(
            NaiveDate::from_ymd_opt(2024, 3, 1).unwrap(),
            NaiveDate::from_ymd_opt(2024, 3, 7).unwrap(),
        )
        .unwrap();
        assert_eq!(range.end, NaiveDate::from_ymd_opt(2024, 3, 8).unwrap());
    }

    #[test]
    fn custom_range_rejects_reversed_dates() {
        let result = ReportRange::custom(
            NaiveDate::from_ymd_opt(2024, 3, 7).unwrap(),
            NaiveDate::from_ymd_opt(2024, 3, 1).unwrap(),
        );
        assert!(result.is_err());
    }

    #[test]
    fn rupiah_formatting_groups_thousands() {
        assert_eq!(format_rupiah(dec!(0)), "Rp 0");
        assert_eq!(format_rupiah(dec!(7000)), "Rp 7.000");
        assert_eq!(format_rupiah(dec!(49000)), "Rp 49.000");
        assert_eq!(format_rupiah(dec!(1250000)), "Rp 1.250.000");
    }

    #[test]
    fn payment_labels_are_indonesian() {
        assert_eq!(payment_status_label("SUDAH_BAYAR"), "Lunas");
        assert_eq!(payment_status_label("BELUM_BAYAR"), "Belum Bayar");
    }
}
