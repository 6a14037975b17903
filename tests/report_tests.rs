mod common;

use axum::http::StatusCode;
use common::TestApp;
use serde_json::json;

async fn seed_orders(app: &TestApp, owner: &str) {
    let (_, svc) = app
        .request(
            "POST",
            "/api/services",
            Some(owner),
            Some(json!({ "name": "Cuci Kering Lipat", "service_type": "KILOAN", "price": 7000 })),
        )
        .await;
    let service_id = svc["data"]["id"].as_str().unwrap().to_string();

    let (_, cust) = app
        .request(
            "POST",
            "/api/customers",
            Some(owner),
            Some(json!({ "name": "Budi Santoso" })),
        )
        .await;
    let customer_id = cust["data"]["id"].as_str().unwrap().to_string();

    // Two paid, one unpaid, one cancelled
    for (quantity, paid) in [(2, true), (3, true), (1, false), (5, false)] {
        let mut payload = json!({
            "customer_id": customer_id,
            "items": [{ "service_id": service_id, "quantity": quantity }]
        });
        if paid {
            payload["payment_status"] = json!("SUDAH_BAYAR");
        }
        let (status, body) = app
            .request("POST", "/api/orders", Some(owner), Some(payload))
            .await;
        assert_eq!(status, StatusCode::OK, "seed order failed: {body}");

        if quantity == 5 {
            let order_id = body["data"]["id"].as_str().unwrap();
            let (status, _) = app
                .request(
                    "PUT",
                    &format!("/api/orders/{order_id}/status"),
                    Some(owner),
                    Some(json!({ "status": "DIBATALKAN" })),
                )
                .await;
            assert_eq!(status, StatusCode::OK);
        }
    }
}

#[tokio::test]
async fn daily_report_excludes_cancelled_and_sums_paid_revenue() {
    let app = TestApp::spawn().await;
    let owner = app.owner_token().await;
    seed_orders(&app, &owner).await;

    let (status, body) = app
        .request("GET", "/api/reports/daily", Some(&owner), None)
        .await;

    assert_eq!(status, StatusCode::OK, "report failed: {body}");
    let stats = &body["data"]["stats"];
    // The cancelled order disappears from every figure
    assert_eq!(stats["totalOrders"], 3);
    assert_eq!(stats["paidOrders"], 2);
    assert_eq!(stats["unpaidOrders"], 1);
    // 2kg + 3kg at 7000/kg
    assert_eq!(stats["totalRevenue"], "35000");
    assert_eq!(body["data"]["orders"].as_array().unwrap().len(), 3);
}

#[tokio::test]
async fn daily_report_lists_top_services() {
    let app = TestApp::spawn().await;
    let owner = app.owner_token().await;
    seed_orders(&app, &owner).await;

    let (_, body) = app
        .request("GET", "/api/reports/daily", Some(&owner), None)
        .await;

    let top = body["data"]["stats"]["topServices"].as_array().unwrap();
    assert_eq!(top.len(), 1);
    assert_eq!(top[0]["name"], "Cuci Kering Lipat");
    // 2 + 3 + 1 kg from the non-cancelled orders
    assert_eq!(top[0]["totalQuantity"], "6");
    assert_eq!(top[0]["revenue"], "42000");

    let customers = body["data"]["stats"]["topCustomers"].as_array().unwrap();
    assert_eq!(customers[0]["name"], "Budi Santoso");
    assert_eq!(customers[0]["orderCount"], 3);
    // Spent means paid orders only
    assert_eq!(customers[0]["totalSpent"], "35000");
}

#[tokio::test]
async fn monthly_report_includes_daily_breakdown() {
    let app = TestApp::spawn().await;
    let owner = app.owner_token().await;
    seed_orders(&app, &owner).await;

    let (status, body) = app
        .request("GET", "/api/reports/monthly", Some(&owner), None)
        .await;

    assert_eq!(status, StatusCode::OK);
    let breakdown = body["data"]["breakdown"].as_array().unwrap();
    assert!(breakdown.len() >= 28);
    let total: u64 = breakdown
        .iter()
        .map(|p| p["orders"].as_u64().unwrap())
        .sum();
    assert_eq!(total, 3);
}

#[tokio::test]
async fn monthly_report_accepts_month_and_year_params() {
    let app = TestApp::spawn().await;
    let owner = app.owner_token().await;
    seed_orders(&app, &owner).await;

    let (status, body) = app
        .request(
            "GET",
            "/api/reports/monthly?month=1&year=2020",
            Some(&owner),
            None,
        )
        .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["startDate"], "2020-01-01");
    assert_eq!(body["data"]["endDate"], "2020-01-31");
    assert_eq!(body["data"]["stats"]["totalOrders"], 0);
}

#[tokio::test]
async fn custom_report_requires_both_dates() {
    let app = TestApp::spawn().await;
    let owner = app.owner_token().await;

    let (status, body) = app
        .request(
            "GET",
            "/api/reports/custom?start_date=2024-03-01",
            Some(&owner),
            None,
        )
        .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Tanggal mulai dan akhir harus diisi");
}

#[tokio::test]
async fn reports_are_owner_only() {
    let app = TestApp::spawn().await;
    let kasir = app.kasir_token().await;

    let (status, _) = app
        .request("GET", "/api/reports/daily", Some(&kasir), None)
        .await;

    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn excel_export_returns_a_workbook_attachment() {
    let app = TestApp::spawn().await;
    let owner = app.owner_token().await;
    seed_orders(&app, &owner).await;

    use axum::body::Body;
    use axum::http::{header, Request};
    use tower::ServiceExt;

    let request = Request::builder()
        .method("GET")
        .uri("/api/reports/export/excel?type=daily")
        .header(header::AUTHORIZATION, format!("Bearer {owner}"))
        .body(Body::empty())
        .unwrap();
    let response = app.router.clone().oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let disposition = response
        .headers()
        .get(header::CONTENT_DISPOSITION)
        .unwrap()
        .to_str()
        .unwrap()
        .to_string();
    assert!(disposition.contains("laporan-harian-"));
    assert!(disposition.ends_with(".xlsx\""));

    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    // xlsx files are zip archives
    assert_eq!(&bytes[..2], b"PK");
}

#[tokio::test]
async fn pdf_export_returns_a_pdf_attachment() {
    let app = TestApp::spawn().await;
    let owner = app.owner_token().await;
    seed_orders(&app, &owner).await;

    use axum::body::Body;
    use axum::http::{header, Request};
    use tower::ServiceExt;

    let request = Request::builder()
        .method("GET")
        .uri("/api/reports/export/pdf?type=daily")
        .header(header::AUTHORIZATION, format!("Bearer {owner}"))
        .body(Body::empty())
        .unwrap();
    let response = app.router.clone().oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers().get(header::CONTENT_TYPE).unwrap(),
        "application/pdf"
    );

    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    assert_eq!(&bytes[..5], b"%PDF-");
}
