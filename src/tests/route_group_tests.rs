#[cfg(test)]
mod tests {
    use axum::{
        body::Body,
        http::{header, Method, Request, StatusCode},
        Router,
    };
    use serde_json::json;
    use sqlx::SqlitePool;
    use tower::ServiceExt;

    use crate::app::build_router;
    use crate::routes::route_groups;
    use crate::tests::{body_json, insert_shipment, settings_in, test_state};

    async fn setup_test_app() -> (Router, SqlitePool, tempfile::TempDir) {
        let dir = tempfile::tempdir().unwrap();
        let state = test_state(settings_in(dir.path())).await;
        let pool = state.db.clone();
        (build_router(state), pool, dir)
    }

    fn get(uri: &str) -> Request<Body> {
        Request::builder().uri(uri).body(Body::empty()).unwrap()
    }

    fn post_json(uri: &str, body: serde_json::Value) -> Request<Body> {
        Request::builder()
            .method(Method::POST)
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    async fn insert_event(pool: &SqlitePool, shipment_id: i64, status: &str, location: &str, at: &str) {
        sqlx::query(
            "INSERT INTO shipment_events (shipment_id, status, location, description, created_at) \
             VALUES (?, ?, ?, 'Scanned', ?)",
        )
        .bind(shipment_id)
        .bind(status)
        .bind(location)
        .bind(at)
        .execute(pool)
        .await
        .unwrap();
    }

    async fn insert_intervention(pool: &SqlitePool, shipment_id: i64, kind: &str, active: bool) {
        sqlx::query("INSERT INTO interventions (shipment_id, kind, reason, active) VALUES (?, ?, 'Held', ?)")
            .bind(shipment_id)
            .bind(kind)
            .bind(active)
            .execute(pool)
            .await
            .unwrap();
    }

    #[test]
    fn test_route_group_registry() {
        let groups = route_groups();
        let names: Vec<&str> = groups.iter().map(|g| g.name).collect();
        assert_eq!(
            names,
            vec![
                "auth",
                "dashboard",
                "shipments",
                "shipment_detail",
                "interventions",
                "communication",
                "bulk",
                "public_tracking"
            ]
        );
        assert!(groups.iter().all(|g| g.prefix.starts_with('/')));
    }

    #[tokio::test]
    async fn test_public_tracking_shape() {
        let (app, pool, _dir) = setup_test_app().await;
        let id = insert_shipment(&pool, "EUK-100", "IN_TRANSIT").await;
        insert_event(&pool, id, "BOOKED", "Lagos", "2026-10-01T08:00:00Z").await;
        insert_event(&pool, id, "IN_TRANSIT", "Frankfurt", "2026-10-03T12:00:00Z").await;
        insert_intervention(&pool, id, "customs", true).await;
        insert_intervention(&pool, id, "damage", false).await;

        // Lookup is case-insensitive
        let response = app.oneshot(get("/api/v1/public/track/euk-100")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let v = body_json(response).await;
        assert_eq!(v["tracking"], "EUK-100");
        assert_eq!(v["status"]["current"], "IN_TRANSIT");
        assert_eq!(v["status"]["display"], "In Transit");
        assert_eq!(v["route"]["origin"], "Lagos");
        assert_eq!(v["route"]["destination"], "London");
        assert_eq!(v["dates"]["sending"], "2026-10-01");
        assert_eq!(v["dates"]["estimated"], "2026-10-20");
        assert!(v["dates"]["actual"].is_null());
        assert_eq!(v["sender"]["name"], "Ada Obi");
        assert_eq!(v["recipient"]["name"], "John Smith");
        assert_eq!(v["commodity"]["weight"], 12.5);
        assert_eq!(v["images"]["front"], "/uploads/shipments/front.jpg");
        assert!(v["images"]["rear"].is_null());
        assert_eq!(v["interventions"]["customs_active"], true);
        assert_eq!(v["interventions"]["damage_reported"], false);
        assert_eq!(v["interventions"]["security_active"], false);

        let timeline = v["timeline"].as_array().unwrap();
        assert_eq!(timeline.len(), 2);
        assert_eq!(timeline[0]["status"], "BOOKED");
        assert_eq!(timeline[1]["location"], "Frankfurt");
        assert_eq!(timeline[1]["display"], "In Transit");
    }

    #[tokio::test]
    async fn test_public_tracking_errors() {
        let (app, _pool, _dir) = setup_test_app().await;

        let response = app.clone().oneshot(get("/api/v1/public/track/EUK-404")).await.unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        let v = body_json(response).await;
        assert_eq!(v["error"]["code"], "NOT_FOUND");
        assert_eq!(v["status"], 404);

        let response = app.oneshot(get("/api/v1/public/track/bad%20number")).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let v = body_json(response).await;
        assert_eq!(v["error"]["code"], "VALIDATION_ERROR");
        assert_eq!(v["error"]["details"]["field"], "tracking");
    }

    #[tokio::test]
    async fn test_lowercase_stored_tracking_number_is_found() {
        let (app, pool, _dir) = setup_test_app().await;
        let id = insert_shipment(&pool, "euk-77", "BOOKED").await;
        insert_intervention(&pool, id, "delay", true).await;

        for uri in [
            "/api/v1/public/track/euk-77",
            "/api/v1/public/track/EUK-77",
            "/api/v1/shipments/Euk-77",
            "/api/v1/shipments/EUK-77/interventions",
        ] {
            let response = app.clone().oneshot(get(uri)).await.unwrap();
            assert_eq!(response.status(), StatusCode::OK, "{}", uri);
        }

        let response = app
            .oneshot(post_json("/api/v1/bulk/lookup", json!({ "tracking_numbers": ["EUK-77", "EUK-78"] })))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let v = body_json(response).await;
        assert_eq!(v["found"][0]["tracking"], "euk-77");
        assert_eq!(v["missing"], json!(["EUK-78"]));
    }

    #[tokio::test]
    async fn test_list_shipments_pagination_and_filters() {
        let (app, pool, _dir) = setup_test_app().await;
        for i in 0..5 {
            insert_shipment(&pool, &format!("EUK-{}", i), "BOOKED").await;
        }
        insert_shipment(&pool, "EUK-DLV", "DELIVERED").await;
        sqlx::query("UPDATE shipments SET recipient_name = 'Grace Hopper' WHERE tracking_number = 'EUK-3'")
            .execute(&pool)
            .await
            .unwrap();

        let response = app.clone().oneshot(get("/api/v1/shipments?page=2&per_page=4")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let v = body_json(response).await;
        assert_eq!(v["data"].as_array().unwrap().len(), 2);
        assert_eq!(v["meta"]["total"], 6);
        assert_eq!(v["meta"]["total_pages"], 2);
        assert_eq!(v["meta"]["page"], 2);

        let v = body_json(app.clone().oneshot(get("/api/v1/shipments?status=delivered")).await.unwrap()).await;
        assert_eq!(v["meta"]["total"], 1);
        assert_eq!(v["data"][0]["tracking"], "EUK-DLV");
        assert_eq!(v["data"][0]["status"]["display"], "Delivered");

        let v = body_json(app.clone().oneshot(get("/api/v1/shipments?search=hopper")).await.unwrap()).await;
        assert_eq!(v["meta"]["total"], 1);
        assert_eq!(v["data"][0]["tracking"], "EUK-3");

        let response = app.oneshot(get("/api/v1/shipments?status=LOST")).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_shipment_detail_includes_timeline() {
        let (app, pool, _dir) = setup_test_app().await;
        let id = insert_shipment(&pool, "EUK-7", "CUSTOMS").await;
        insert_event(&pool, id, "CUSTOMS", "Heathrow", "2026-10-05T09:30:00Z").await;

        let response = app.clone().oneshot(get("/api/v1/shipments/euk-7")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let v = body_json(response).await;
        assert_eq!(v["tracking"], "EUK-7");
        assert_eq!(v["status"]["display"], "Customs Clearance");
        assert_eq!(v["front_image"], "shipments/front.jpg");
        assert_eq!(v["timeline"][0]["location"], "Heathrow");

        let response = app.oneshot(get("/api/v1/shipments/EUK-8")).await.unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_interventions_active_first() {
        let (app, pool, _dir) = setup_test_app().await;
        let id = insert_shipment(&pool, "EUK-9", "ON_HOLD").await;
        insert_intervention(&pool, id, "delay", false).await;
        insert_intervention(&pool, id, "security", true).await;

        let response = app.oneshot(get("/api/v1/shipments/EUK-9/interventions")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let v = body_json(response).await;
        let items = v.as_array().unwrap();
        assert_eq!(items.len(), 2);
        assert_eq!(items[0]["kind"], "security");
        assert_eq!(items[0]["active"], true);
        assert_eq!(items[1]["kind"], "delay");
        assert_eq!(items[1]["active"], false);
    }

    #[tokio::test]
    async fn test_communications_newest_first() {
        let (app, pool, _dir) = setup_test_app().await;
        let id = insert_shipment(&pool, "EUK-10", "BOOKED").await;
        for (subject, at) in [("Booked", "2026-10-01T08:00:00Z"), ("Delayed", "2026-10-02T08:00:00Z")] {
            sqlx::query(
                "INSERT INTO communications (shipment_id, recipient, subject, body, created_at) \
                 VALUES (?, 'john@example.com', ?, 'Update', ?)",
            )
            .bind(id)
            .bind(subject)
            .bind(at)
            .execute(&pool)
            .await
            .unwrap();
        }

        let response = app.clone().oneshot(get("/api/v1/shipments/EUK-10/communications")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let v = body_json(response).await;
        assert_eq!(v[0]["subject"], "Delayed");
        assert_eq!(v[0]["direction"], "outbound");
        assert_eq!(v[0]["channel"], "email");
        assert_eq!(v[1]["subject"], "Booked");

        let response = app.oneshot(get("/api/v1/shipments/EUK-11/communications")).await.unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_dashboard_counts() {
        let (app, pool, _dir) = setup_test_app().await;
        let a = insert_shipment(&pool, "EUK-A", "IN_TRANSIT").await;
        insert_shipment(&pool, "EUK-B", "IN_TRANSIT").await;
        insert_shipment(&pool, "EUK-C", "DELIVERED").await;
        insert_intervention(&pool, a, "customs", true).await;
        insert_intervention(&pool, a, "delay", false).await;

        let response = app.oneshot(get("/api/v1/dashboard/stats")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let v = body_json(response).await;
        assert_eq!(v["total_shipments"], 3);
        assert_eq!(v["by_status"]["IN_TRANSIT"], 2);
        assert_eq!(v["by_status"]["DELIVERED"], 1);
        assert_eq!(v["by_status"]["RETURNED"], 0);
        assert_eq!(v["by_status"].as_object().unwrap().len(), 7);
        assert_eq!(v["active_interventions"], 1);
        assert_eq!(v["created_last_7_days"], 3);
    }

    #[tokio::test]
    async fn test_bulk_lookup_preserves_order() {
        let (app, pool, _dir) = setup_test_app().await;
        insert_shipment(&pool, "EUK-1", "BOOKED").await;
        insert_shipment(&pool, "EUK-2", "DELIVERED").await;

        let response = app
            .clone()
            .oneshot(post_json(
                "/api/v1/bulk/lookup",
                json!({ "tracking_numbers": ["euk-2", "EUK-404", "EUK-1", "EUK-2"] }),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let v = body_json(response).await;
        let found = v["found"].as_array().unwrap();
        assert_eq!(found.len(), 2);
        assert_eq!(found[0]["tracking"], "EUK-2");
        assert_eq!(found[1]["tracking"], "EUK-1");
        assert_eq!(v["missing"], json!(["EUK-404"]));

        let response =
            app.oneshot(post_json("/api/v1/bulk/lookup", json!({ "tracking_numbers": [] }))).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_login_checks_seeded_admin() {
        let dir = tempfile::tempdir().unwrap();
        let state = test_state(settings_in(dir.path())).await;
        assert!(crate::db::seed_admin(&state.db, &state.settings).await.unwrap());
        let app = build_router(state);

        let response = app
            .clone()
            .oneshot(post_json("/api/v1/auth/login", json!({ "username": "admin", "password": "admin-pass-123" })))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let v = body_json(response).await;
        assert_eq!(v["username"], "admin");
        assert_eq!(v["email"], "admin@eukexpress.com");
        assert_eq!(v["role"], "admin");

        let response = app
            .clone()
            .oneshot(post_json("/api/v1/auth/login", json!({ "username": "admin", "password": "wrong" })))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        let v = body_json(response).await;
        assert_eq!(v["error"]["message"], "Invalid username or password");

        let response = app
            .oneshot(post_json("/api/v1/auth/login", json!({ "username": "ghost", "password": "x" })))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }
}
