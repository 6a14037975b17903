use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Laundry API",
        version = "1.0.0",
        description = r#"
# Laundry Shop Management API

Backend for a small laundry shop: customers, service catalog, orders with
their wash/dry/iron lifecycle, payments, reports and printable receipts.

## Authentication

Login at `/api/auth/login` and send the returned JWT on every request:

```
Authorization: Bearer <token>
```

Receipt and export endpoints also accept a `?token=` query parameter so
they can be opened directly in a new browser tab.

## Roles

- **KASIR**: day-to-day operations (orders, customers, payments)
- **OWNER**: everything, plus user management, reports and settings

## Error format

```json
{
  "success": false,
  "message": "Pesanan tidak ditemukan"
}
```
        "#
    ),
    servers(
        (url = "http://localhost:3001", description = "Local development")
    ),
    tags(
        (name = "Auth", description = "Login and session endpoints"),
        (name = "Orders", description = "Order lifecycle and payments"),
        (name = "Customers", description = "Customer book"),
        (name = "Services", description = "Service catalog"),
        (name = "Users", description = "Account management, OWNER only"),
        (name = "Dashboard", description = "Aggregated figures per role"),
        (name = "Reports", description = "Revenue reports and exports, OWNER only"),
        (name = "Settings", description = "Shop profile used on receipts")
    ),
    paths(
        crate::handlers::auth::login,
        crate::handlers::orders::list_orders,
        crate::handlers::orders::create_order,
        crate::handlers::customers::list_customers,
        crate::handlers::services::list_services,
        crate::handlers::users::create_user,
        crate::handlers::dashboard::owner_dashboard,
        crate::handlers::reports::daily_report,
        crate::handlers::reports::export_excel,
    ),
    components(
        schemas(
            crate::ApiResponse<serde_json::Value>,
            crate::handlers::auth::LoginRequest,
            crate::handlers::auth::LoginResponse,
            crate::handlers::auth::ChangePasswordRequest,
            crate::auth::AuthUser,
            crate::models::OrderStatus,
            crate::models::PaymentStatus,
            crate::models::PaymentMethod,
            crate::models::ServiceType,
            crate::models::Role,
            crate::errors::ErrorResponse
        )
    )
)]
pub struct ApiDoc;

pub fn swagger_ui() -> SwaggerUi {
    SwaggerUi::new("/swagger-ui")
        .url("/api-docs/openapi.json", ApiDoc::openapi())
        .config(utoipa_swagger_ui::Config::from("/api-docs/openapi.json").try_it_out_enabled(true))
}

pub fn swagger_routes<S>() -> axum::Router<S>
where
    S: Clone + Send + Sync + 'static,
{
    swagger_ui().into()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn openapi_document_includes_core_paths() {
        let openapi = ApiDoc::openapi();
        let json = serde_json::to_string_pretty(&openapi).unwrap();
        assert!(json.contains("Laundry Shop Management API"));
        assert!(json.contains("/api/orders"));
        assert!(json.contains("/api/auth/login"));
    }
}
