pub mod auth;
pub mod customers;
pub mod dashboard;
pub mod orders;
pub mod reports;
pub mod services;
pub mod settings;
pub mod users;

use crate::db::DbPool;
use std::sync::Arc;

pub use crate::AppState;

/// Services layer that encapsulates business logic used by HTTP handlers
#[derive(Clone)]
pub struct AppServices {
    pub auth: Arc<crate::auth::AuthService>,
    pub users: Arc<crate::services::users::UserService>,
    pub catalog: Arc<crate::services::catalog::CatalogService>,
    pub customers: Arc<crate::services::customers::CustomerService>,
    pub orders: Arc<crate::services::orders::OrderService>,
    pub dashboard: Arc<crate::services::dashboard::DashboardService>,
    pub reports: Arc<crate::services::reports::ReportService>,
    pub settings: Arc<crate::services::settings::SettingsService>,
    pub activity: Arc<crate::services::activity::ActivityLogService>,
}

impl AppServices {
    pub fn new(db_pool: Arc<DbPool>, auth_service: Arc<crate::auth::AuthService>) -> Self {
        let activity = Arc::new(crate::services::activity::ActivityLogService::new(
            db_pool.clone(),
        ));
        let orders = Arc::new(crate::services::orders::OrderService::new(
            db_pool.clone(),
            activity.clone(),
        ));

        Self {
            auth: auth_service.clone(),
            users: Arc::new(crate::services::users::UserService::new(
                db_pool.clone(),
                auth_service,
                activity.clone(),
            )),
            catalog: Arc::new(crate::services::catalog::CatalogService::new(
                db_pool.clone(),
                activity.clone(),
            )),
            customers: Arc::new(crate::services::customers::CustomerService::new(
                db_pool.clone(),
                activity.clone(),
            )),
            dashboard: Arc::new(crate::services::dashboard::DashboardService::new(
                db_pool.clone(),
                orders.clone(),
            )),
            orders,
            reports: Arc::new(crate::services::reports::ReportService::new(db_pool.clone())),
            settings: Arc::new(crate::services::settings::SettingsService::new(
                db_pool,
                activity.clone(),
            )),
            activity,
        }
    }
}
