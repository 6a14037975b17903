mod common;

use axum::http::StatusCode;
use common::TestApp;
use serde_json::json;

async fn seed_one_paid_order(app: &TestApp, owner: &str) {
    let (_, svc) = app
        .request(
            "POST",
            "/api/services",
            Some(owner),
            Some(json!({ "name": "Cuci Setrika", "service_type": "KILOAN", "price": 10000 })),
        )
        .await;
    let service_id = svc["data"]["id"].as_str().unwrap().to_string();

    let (status, body) = app
        .request(
            "POST",
            "/api/orders",
            Some(owner),
            Some(json!({
                "customer_name": "Budi Santoso",
                "items": [{ "service_id": service_id, "quantity": 2 }],
                "payment_status": "SUDAH_BAYAR"
            })),
        )
        .await;
    assert_eq!(status, StatusCode::OK, "seed order failed: {body}");
}

#[tokio::test]
async fn owner_dashboard_aggregates_today() {
    let app = TestApp::spawn().await;
    let owner = app.owner_token().await;
    seed_one_paid_order(&app, &owner).await;

    let (status, body) = app
        .request("GET", "/api/dashboard/owner", Some(&owner), None)
        .await;

    assert_eq!(status, StatusCode::OK, "dashboard failed: {body}");
    let data = &body["data"];
    assert_eq!(data["today"]["orders"], 1);
    assert_eq!(data["today"]["revenue"], "20000");
    assert_eq!(data["thisMonth"]["orders"], 1);
    assert_eq!(data["lastSevenDays"].as_array().unwrap().len(), 7);
    assert_eq!(data["lastSixMonths"].as_array().unwrap().len(), 6);
    assert_eq!(data["topServices"][0]["name"], "Cuci Setrika");
    assert_eq!(data["topServices"][0]["totalQuantity"], "2");
    assert_eq!(data["topCustomers"][0]["name"], "Budi Santoso");
    assert_eq!(data["topCustomers"][0]["orderCount"], 1);
    assert_eq!(data["topCustomers"][0]["totalSpent"], "20000");
}

#[tokio::test]
async fn owner_dashboard_is_forbidden_for_kasir() {
    let app = TestApp::spawn().await;
    let kasir = app.kasir_token().await;

    let (status, _) = app
        .request("GET", "/api/dashboard/owner", Some(&kasir), None)
        .await;

    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn kasir_dashboard_counts_work_queue() {
    let app = TestApp::spawn().await;
    let owner = app.owner_token().await;
    let kasir = app.kasir_token().await;
    seed_one_paid_order(&app, &owner).await;

    let (status, body) = app
        .request("GET", "/api/dashboard/kasir", Some(&kasir), None)
        .await;

    assert_eq!(status, StatusCode::OK, "dashboard failed: {body}");
    let data = &body["data"];
    assert_eq!(data["todayOrders"], 1);
    assert_eq!(data["todayRevenue"], "20000");
    assert_eq!(data["unpaidOrders"], 0);
    assert_eq!(data["inProgress"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn kasir_dashboard_lists_in_progress_orders_behind_newer_pickups() {
    let app = TestApp::spawn().await;
    let owner = app.owner_token().await;

    let (_, svc) = app
        .request(
            "POST",
            "/api/services",
            Some(&owner),
            Some(json!({ "name": "Cuci Kilat", "service_type": "KILOAN", "price": 8000 })),
        )
        .await;
    let service_id = svc["data"]["id"].as_str().unwrap().to_string();

    // The only order still in progress, created before a long run of pickups
    let (_, first) = app
        .request(
            "POST",
            "/api/orders",
            Some(&owner),
            Some(json!({
                "customer_name": "Sari Dewi",
                "items": [{ "service_id": service_id, "quantity": 1 }]
            })),
        )
        .await;
    let stuck_number = first["data"]["order_number"].clone();

    for n in 0..100 {
        let (_, body) = app
            .request(
                "POST",
                "/api/orders",
                Some(&owner),
                Some(json!({
                    "customer_name": format!("Pelanggan {n}"),
                    "items": [{ "service_id": service_id, "quantity": 1 }]
                })),
            )
            .await;
        let id = body["data"]["id"].as_str().unwrap().to_string();
        let (status, _) = app
            .request(
                "PUT",
                &format!("/api/orders/{id}/status"),
                Some(&owner),
                Some(json!({ "status": "DIAMBIL" })),
            )
            .await;
        assert_eq!(status, StatusCode::OK);
    }

    let kasir = app.kasir_token().await;
    let (status, body) = app
        .request("GET", "/api/dashboard/kasir", Some(&kasir), None)
        .await;

    assert_eq!(status, StatusCode::OK);
    let in_progress = body["data"]["inProgress"].as_array().unwrap();
    assert_eq!(in_progress.len(), 1);
    assert_eq!(in_progress[0]["order_number"], stuck_number);
}

#[tokio::test]
async fn settings_are_readable_by_kasir_but_owner_writable() {
    let app = TestApp::spawn().await;
    let owner = app.owner_token().await;
    let kasir = app.kasir_token().await;

    let (status, body) = app
        .request("GET", "/api/settings", Some(&kasir), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["business_name"], "LaundryKu");
    assert_eq!(
        body["data"]["receipt_footer"],
        "Terima kasih telah menggunakan jasa kami!"
    );

    let (status, _) = app
        .request(
            "PUT",
            "/api/settings",
            Some(&kasir),
            Some(json!({ "businessName": "Laundry Kasir" })),
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) = app
        .request(
            "PUT",
            "/api/settings",
            Some(&owner),
            Some(json!({ "businessName": "Laundry Berkah", "phone": "0211234567" })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["business_name"], "Laundry Berkah");
}

#[tokio::test]
async fn customer_search_matches_name_and_counts_orders() {
    let app = TestApp::spawn().await;
    let owner = app.owner_token().await;
    seed_one_paid_order(&app, &owner).await;

    let (status, body) = app
        .request("GET", "/api/customers?search=Budi", Some(&owner), None)
        .await;

    assert_eq!(status, StatusCode::OK);
    let customers = body["data"].as_array().unwrap();
    assert_eq!(customers.len(), 1);
    assert_eq!(customers[0]["name"], "Budi Santoso");
    assert_eq!(customers[0]["order_count"], 1);

    let (_, empty) = app
        .request("GET", "/api/customers?search=TidakAda", Some(&owner), None)
        .await;
    assert_eq!(empty["data"].as_array().unwrap().len(), 0);
}
