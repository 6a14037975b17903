mod common;

use axum::http::StatusCode;
use common::TestApp;
use sea_orm::{ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter};
use serde_json::{json, Value};

async fn create_service(app: &TestApp, token: &str, name: &str, service_type: &str, price: i64) -> String {
    let (status, body) = app
        .request(
            "POST",
            "/api/services",
            Some(token),
            Some(json!({ "name": name, "service_type": service_type, "price": price })),
        )
        .await;
    assert_eq!(status, StatusCode::OK, "create service failed: {body}");
    body["data"]["id"].as_str().unwrap().to_string()
}

async fn create_customer(app: &TestApp, token: &str, name: &str) -> String {
    let (status, body) = app
        .request(
            "POST",
            "/api/customers",
            Some(token),
            Some(json!({ "name": name, "phone": "081234567890" })),
        )
        .await;
    assert_eq!(status, StatusCode::OK, "create customer failed: {body}");
    body["data"]["id"].as_str().unwrap().to_string()
}

async fn create_order(app: &TestApp, token: &str, payload: Value) -> Value {
    let (status, body) = app
        .request("POST", "/api/orders", Some(token), Some(payload))
        .await;
    assert_eq!(status, StatusCode::OK, "create order failed: {body}");
    body["data"].clone()
}

#[tokio::test]
async fn order_total_is_sum_of_snapshotted_prices() {
    let app = TestApp::spawn().await;
    let owner = app.owner_token().await;
    let kasir = app.kasir_token().await;

    let kiloan = create_service(&app, &owner, "Cuci Kering Lipat", "KILOAN", 7000).await;
    let satuan = create_service(&app, &owner, "Dry Clean Jas", "SATUAN", 35000).await;
    let customer_id = create_customer(&app, &kasir, "Budi Santoso").await;

    let order = create_order(
        &app,
        &kasir,
        json!({
            "customer_id": customer_id,
            "items": [
                { "service_id": kiloan, "quantity": 2 },
                { "service_id": satuan, "quantity": 1 }
            ]
        }),
    )
    .await;

    assert_eq!(order["total_amount"], "49000");
    assert_eq!(order["status"], "DITERIMA");
    assert_eq!(order["payment_status"], "BELUM_BAYAR");
    assert_eq!(order["items"].as_array().unwrap().len(), 2);
    assert!(order["order_number"].as_str().unwrap().starts_with("LDR"));
    assert_eq!(order["order_number"].as_str().unwrap().len(), 13);
    assert_eq!(order["cashier"]["username"], "kasir");
}

#[tokio::test]
async fn order_can_be_created_for_inline_walk_in_customer() {
    let app = TestApp::spawn().await;
    let owner = app.owner_token().await;

    let kiloan = create_service(&app, &owner, "Cuci Setrika", "KILOAN", 10000).await;

    let order = create_order(
        &app,
        &owner,
        json!({
            "customer_name": "Pelanggan Baru",
            "customer_phone": "085612345678",
            "items": [{ "service_id": kiloan, "quantity": "2.5" }]
        }),
    )
    .await;

    assert_eq!(order["customer"]["name"], "Pelanggan Baru");
    // 2.5 kg at 10000, stored without a trailing fraction
    assert_eq!(order["total_amount"], "25000");
}

#[tokio::test]
async fn order_requires_at_least_one_item() {
    let app = TestApp::spawn().await;
    let kasir = app.kasir_token().await;
    let customer_id = create_customer(&app, &kasir, "Siti Rahayu").await;

    let (status, body) = app
        .request(
            "POST",
            "/api/orders",
            Some(&kasir),
            Some(json!({ "customer_id": customer_id, "items": [] })),
        )
        .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Minimal satu layanan harus dipilih");
}

#[tokio::test]
async fn order_requires_a_customer() {
    let app = TestApp::spawn().await;
    let owner = app.owner_token().await;
    let kiloan = create_service(&app, &owner, "Setrika Saja", "KILOAN", 5000).await;

    let (status, body) = app
        .request(
            "POST",
            "/api/orders",
            Some(&owner),
            Some(json!({ "items": [{ "service_id": kiloan, "quantity": 1 }] })),
        )
        .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Pelanggan harus dipilih atau diisi");
}

#[tokio::test]
async fn status_updates_append_to_history() {
    let app = TestApp::spawn().await;
    let owner = app.owner_token().await;
    let kasir = app.kasir_token().await;

    let kiloan = create_service(&app, &owner, "Cuci Express", "KILOAN", 15000).await;
    let customer_id = create_customer(&app, &kasir, "Agus Wijaya").await;
    let order = create_order(
        &app,
        &kasir,
        json!({
            "customer_id": customer_id,
            "items": [{ "service_id": kiloan, "quantity": 3 }]
        }),
    )
    .await;
    let order_id = order["id"].as_str().unwrap();

    for next in ["DICUCI", "DIKERINGKAN", "SELESAI"] {
        let (status, body) = app
            .request(
                "PUT",
                &format!("/api/orders/{order_id}/status"),
                Some(&kasir),
                Some(json!({ "status": next })),
            )
            .await;
        assert_eq!(status, StatusCode::OK, "status update failed: {body}");
        assert_eq!(body["data"]["status"], next);
    }

    let (_, body) = app
        .request("GET", &format!("/api/orders/{order_id}"), Some(&kasir), None)
        .await;
    let history = body["data"]["status_history"].as_array().unwrap();
    // DITERIMA plus the three transitions above
    assert_eq!(history.len(), 4);
}

#[tokio::test]
async fn invalid_status_is_rejected() {
    let app = TestApp::spawn().await;
    let owner = app.owner_token().await;

    let kiloan = create_service(&app, &owner, "Cuci Selimut", "SATUAN", 25000).await;
    let customer_id = create_customer(&app, &owner, "Dewi Lestari").await;
    let order = create_order(
        &app,
        &owner,
        json!({
            "customer_id": customer_id,
            "items": [{ "service_id": kiloan, "quantity": 1 }]
        }),
    )
    .await;

    let (status, body) = app
        .request(
            "PUT",
            &format!("/api/orders/{}/status", order["id"].as_str().unwrap()),
            Some(&owner),
            Some(json!({ "status": "SEDANG_DICUCI" })),
        )
        .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Status tidak valid");
}

#[tokio::test]
async fn marking_paid_creates_exactly_one_payment() {
    let app = TestApp::spawn().await;
    let owner = app.owner_token().await;
    let kasir = app.kasir_token().await;

    let kiloan = create_service(&app, &owner, "Cuci Bed Cover", "SATUAN", 30000).await;
    let customer_id = create_customer(&app, &kasir, "Rina Wati").await;
    let order = create_order(
        &app,
        &kasir,
        json!({
            "customer_id": customer_id,
            "items": [{ "service_id": kiloan, "quantity": 1 }]
        }),
    )
    .await;
    let order_id = order["id"].as_str().unwrap();

    // Mark paid twice; the second call must not add another payment row
    for _ in 0..2 {
        let (status, body) = app
            .request(
                "PUT",
                &format!("/api/orders/{order_id}/payment"),
                Some(&kasir),
                Some(json!({ "payment_status": "SUDAH_BAYAR", "payment_method": "QRIS" })),
            )
            .await;
        assert_eq!(status, StatusCode::OK, "payment update failed: {body}");
        assert_eq!(body["data"]["payment_status"], "SUDAH_BAYAR");
        assert_eq!(body["data"]["payment"]["amount"], "30000");
        assert_eq!(body["data"]["payment"]["method"], "QRIS");
    }

    let order_uuid = uuid::Uuid::parse_str(order_id).unwrap();
    let payment_rows = laundry_api::entities::payment::Entity::find()
        .filter(laundry_api::entities::payment::Column::OrderId.eq(order_uuid))
        .count(&*app.db)
        .await
        .unwrap();
    assert_eq!(payment_rows, 1);
}

#[tokio::test]
async fn order_paid_at_creation_gets_a_payment_row() {
    let app = TestApp::spawn().await;
    let owner = app.owner_token().await;

    let kiloan = create_service(&app, &owner, "Cuci Karpet Kecil", "SATUAN", 20000).await;
    let customer_id = create_customer(&app, &owner, "Joko Susilo").await;

    let order = create_order(
        &app,
        &owner,
        json!({
            "customer_id": customer_id,
            "items": [{ "service_id": kiloan, "quantity": 2 }],
            "payment_status": "SUDAH_BAYAR",
            "payment_method": "TRANSFER"
        }),
    )
    .await;

    assert_eq!(order["payment_status"], "SUDAH_BAYAR");
    assert_eq!(order["payment"]["amount"], "40000");
    assert_eq!(order["payment"]["method"], "TRANSFER");
}

#[tokio::test]
async fn receipt_includes_shop_settings() {
    let app = TestApp::spawn().await;
    let owner = app.owner_token().await;

    let kiloan = create_service(&app, &owner, "Cuci Kering Lipat", "KILOAN", 7000).await;
    let customer_id = create_customer(&app, &owner, "Budi Santoso").await;
    let order = create_order(
        &app,
        &owner,
        json!({
            "customer_id": customer_id,
            "items": [{ "service_id": kiloan, "quantity": 4 }]
        }),
    )
    .await;

    let (status, body) = app
        .request(
            "GET",
            &format!("/api/orders/{}/receipt", order["id"].as_str().unwrap()),
            Some(&owner),
            None,
        )
        .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["settings"]["business_name"], "LaundryKu");
    assert_eq!(body["data"]["order"]["total_amount"], "28000");
}

#[tokio::test]
async fn order_list_filters_by_payment_status() {
    let app = TestApp::spawn().await;
    let owner = app.owner_token().await;

    let kiloan = create_service(&app, &owner, "Cuci Setrika", "KILOAN", 10000).await;
    let customer_id = create_customer(&app, &owner, "Siti Rahayu").await;

    create_order(
        &app,
        &owner,
        json!({
            "customer_id": customer_id,
            "items": [{ "service_id": kiloan, "quantity": 1 }],
            "payment_status": "SUDAH_BAYAR"
        }),
    )
    .await;
    create_order(
        &app,
        &owner,
        json!({
            "customer_id": customer_id,
            "items": [{ "service_id": kiloan, "quantity": 2 }]
        }),
    )
    .await;

    let (status, body) = app
        .request(
            "GET",
            "/api/orders?payment_status=BELUM_BAYAR",
            Some(&owner),
            None,
        )
        .await;

    assert_eq!(status, StatusCode::OK);
    let orders = body["data"].as_array().unwrap();
    assert_eq!(orders.len(), 1);
    assert_eq!(orders[0]["payment_status"], "BELUM_BAYAR");
}

#[tokio::test]
async fn unknown_order_returns_not_found() {
    let app = TestApp::spawn().await;
    let kasir = app.kasir_token().await;

    let (status, body) = app
        .request(
            "GET",
            &format!("/api/orders/{}", uuid::Uuid::new_v4()),
            Some(&kasir),
            None,
        )
        .await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["message"], "Pesanan tidak ditemukan");
}
