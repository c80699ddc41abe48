use actix_web::dev::Service;
use actix_web::test::TestRequest;
use actix_web::{test, web, App, HttpMessage};
use httpmock::Method::POST;
use httpmock::MockServer;
use serde_json::{json, Value};
use uuid::Uuid;

use studyvault::api::courses::list_course_files;
use studyvault::api::orders::create_order;
use studyvault::api::purchases::list_purchases;
use studyvault::api::webhooks::payment_webhook;

mod support;

#[actix_web::test]
async fn create_order_missing_fields_never_reaches_gateway() {
    let server = MockServer::start_async().await;
    let gateway_mock = server.mock(|when, then| {
        when.method(POST).path("/orders");
        then.status(200).json_body(json!({
            "order_id": "order_x_1",
            "payment_session_id": "session-x"
        }));
    });

    let test_db = support::init_test_db().await;
    let suffix = Uuid::new_v4().simple().to_string();
    let user_id = support::insert_user(&test_db.pool, &suffix).await;

    let state = web::Data::new(support::build_state(test_db.pool.clone(), &server.url(""), None));
    let app = test::init_service(
        App::new()
            .app_data(state.clone())
            .wrap_fn(move |req, srv| {
                req.extensions_mut().insert(user_id);
                let fut = srv.call(req);
                async move { fut.await }
            })
            .service(create_order),
    )
    .await;

    for body in [
        json!({ "productId": "course_x" }),
        json!({ "amount": 499.0 }),
        json!({}),
    ] {
        let req = TestRequest::post().uri("/orders").set_json(body).to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), 400);
    }

    gateway_mock.assert_hits(0);
}

#[actix_web::test]
async fn create_order_rejects_amount_mismatch() {
    let server = MockServer::start_async().await;
    let gateway_mock = server.mock(|when, then| {
        when.method(POST).path("/orders");
        then.status(200).json_body(json!({
            "order_id": "order_x_1",
            "payment_session_id": "session-x"
        }));
    });

    let test_db = support::init_test_db().await;
    let suffix = Uuid::new_v4().simple().to_string();
    let user_id = support::insert_user(&test_db.pool, &suffix).await;
    let course_id = support::insert_course(&test_db.pool, &suffix, "499.00").await;

    let state = web::Data::new(support::build_state(test_db.pool.clone(), &server.url(""), None));
    let app = test::init_service(
        App::new()
            .app_data(state.clone())
            .wrap_fn(move |req, srv| {
                req.extensions_mut().insert(user_id);
                let fut = srv.call(req);
                async move { fut.await }
            })
            .service(create_order),
    )
    .await;

    let req = TestRequest::post()
        .uri("/orders")
        .set_json(json!({ "amount": 1.0, "productId": course_id }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 400);
    gateway_mock.assert_hits(0);
}

#[actix_web::test]
async fn buy_then_webhook_then_view_flow() {
    let server = MockServer::start_async().await;

    let test_db = support::init_test_db().await;
    let pool = &test_db.pool;
    let suffix = Uuid::new_v4().simple().to_string();
    let user_id = support::insert_user(pool, &suffix).await;
    let course_id = support::insert_course(pool, &suffix, "499.00").await;
    support::insert_file(pool, &course_id, Some("Physics"), "kinematics.pdf").await;
    support::insert_file(pool, &course_id, None, "syllabus.pdf").await;

    let gateway_mock = server.mock(|when, then| {
        when.method(POST)
            .path("/orders")
            .header("x-client-id", "test-client-id")
            .header("x-client-secret", "test-client-secret")
            .json_body_partial(
                json!({
                    "order_amount": 499.0,
                    "customer_details": { "customer_id": format!("cust_{user_id}") }
                })
                .to_string(),
            );
        then.status(200).json_body(json!({
            "order_id": format!("order_{course_id}_1717171717171"),
            "payment_session_id": "session-abc"
        }));
    });

    let state = web::Data::new(support::build_state(test_db.pool.clone(), &server.url(""), None));
    let app = test::init_service(
        App::new()
            .app_data(state.clone())
            .wrap_fn(move |req, srv| {
                req.extensions_mut().insert(user_id);
                let fut = srv.call(req);
                async move { fut.await }
            })
            .service(create_order)
            .service(payment_webhook)
            .service(list_course_files)
            .service(list_purchases),
    )
    .await;

    // Before purchase: the listing is denied and reveals nothing.
    let req = TestRequest::get()
        .uri(&format!("/courses/{course_id}/files"))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 403);

    // Buy Now: order creation returns the checkout session.
    let req = TestRequest::post()
        .uri("/orders")
        .set_json(json!({ "amount": 499.0, "productId": course_id }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert!(resp.status().is_success());
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["success"], json!(true));
    let order_id = body["data"]["order_id"].as_str().expect("order_id").to_string();
    assert_eq!(body["data"]["payment_session_id"], json!("session-abc"));
    gateway_mock.assert();

    // The gateway confirms payment out-of-band.
    let req = TestRequest::post()
        .uri("/webhook/payment")
        .set_json(json!({
            "orderId": order_id,
            "orderAmount": 499.0,
            "referenceId": "ref-xyz",
            "paymentStatus": "SUCCESS",
            "customerDetails": { "customer_id": format!("cust_{user_id}") }
        }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert!(resp.status().is_success());

    // After purchase: the listing succeeds, grouped by subfolder.
    let req = TestRequest::get()
        .uri(&format!("/courses/{course_id}/files"))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert!(resp.status().is_success());
    let body: Value = test::read_body_json(resp).await;

    let groups = body["groups"].as_array().expect("groups");
    let names: Vec<&str> = groups
        .iter()
        .map(|g| g["subfolder"].as_str().unwrap())
        .collect();
    assert_eq!(names, vec!["_files", "Physics"]);
    assert_eq!(groups[0]["files"][0]["name"], json!("syllabus.pdf"));
    assert_eq!(groups[1]["files"][0]["name"], json!("kinematics.pdf"));

    // And the purchase shows up in the caller's purchase history.
    let req = TestRequest::get().uri("/purchases").to_request();
    let resp = test::call_service(&app, req).await;
    assert!(resp.status().is_success());
    let body: Value = test::read_body_json(resp).await;
    let purchases = body.as_array().expect("purchases array");
    assert_eq!(purchases.len(), 1);
    assert_eq!(purchases[0]["course_id"], json!(course_id));
    assert_eq!(purchases[0]["order_id"], json!(order_id));
    assert_eq!(purchases[0]["payment_id"], json!("ref-xyz"));
    assert_eq!(purchases[0]["amount"], json!("499"));
}

#[actix_web::test]
async fn create_order_conflicts_when_already_purchased() {
    let server = MockServer::start_async().await;

    let test_db = support::init_test_db().await;
    let pool = &test_db.pool;
    let suffix = Uuid::new_v4().simple().to_string();
    let user_id = support::insert_user(pool, &suffix).await;
    let course_id = support::insert_course(pool, &suffix, "499.00").await;

    sqlx::query(
        r#"INSERT INTO purchases (user_id, course_id, order_id, payment_id, amount)
           VALUES ($1, $2, $3, 'ref-1', '499.00'::numeric)"#,
    )
    .bind(user_id)
    .bind(&course_id)
    .bind(format!("order_{course_id}_1717171717171"))
    .execute(pool)
    .await
    .expect("insert purchase");

    let state = web::Data::new(support::build_state(test_db.pool.clone(), &server.url(""), None));
    let app = test::init_service(
        App::new()
            .app_data(state.clone())
            .wrap_fn(move |req, srv| {
                req.extensions_mut().insert(user_id);
                let fut = srv.call(req);
                async move { fut.await }
            })
            .service(create_order),
    )
    .await;

    let req = TestRequest::post()
        .uri("/orders")
        .set_json(json!({ "amount": 499.0, "productId": course_id }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 409);
}
