//! Admin API: authentication, dashboard commands and the recovery ticket flow.
//!
//! Run with: cargo test --test admin_api

mod common;

use serde_json::Value;
use std::sync::Arc;

use common::{dead_address, start_round, test_config, ADMIN_KEY};
use connectivity_monitor::lifecycle::{Application, LifecycleEvent};

fn admin(
    client: &reqwest::Client,
    method: reqwest::Method,
    url: String,
) -> reqwest::RequestBuilder {
    client.request(method, url).bearer_auth(ADMIN_KEY)
}

#[tokio::test]
async fn test_requires_api_key() {
    let app = Arc::new(Application::new(test_config(dead_address().await)));
    let round = start_round(&app).await;
    let client = reqwest::Client::new();
    let url = format!("http://{}/admin/status", round.admin_addr);

    let res = client.get(&url).send().await.unwrap();
    assert_eq!(res.status(), 401);

    let res = client.get(&url).bearer_auth("wrong").send().await.unwrap();
    assert_eq!(res.status(), 401);

    let res = client.get(&url).bearer_auth(ADMIN_KEY).send().await.unwrap();
    assert_eq!(res.status(), 200);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["status"], "operational");
    assert_eq!(body["detector_active"], true);
    assert_eq!(body["alert"]["state"], "quiet");

    app.lifecycle.shutdown();
    round.handle.await.unwrap().unwrap();
}

#[tokio::test]
async fn test_dashboard_commands() {
    let app = Arc::new(Application::new(test_config(dead_address().await)));
    let round = start_round(&app).await;
    let client = reqwest::Client::new();
    let base = format!("http://{}/admin", round.admin_addr);

    let snapshot: Value = admin(&client, reqwest::Method::GET, format!("{base}/dashboard"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let names: Vec<&str> = snapshot["collections"]
        .as_array()
        .unwrap()
        .iter()
        .map(|c| c["name"].as_str().unwrap())
        .collect();
    assert_eq!(names, vec!["farms", "notifications", "rooms", "workers"]);
    assert_eq!(snapshot["realtime"]["has_new_data"], false);

    let res = admin(&client, reqwest::Method::POST, format!("{base}/realtime/workers"))
        .json(&serde_json::json!({ "ids": ["w1", "w2", "w1"] }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 200);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["added"], 2);
    assert_eq!(body["dashboard"]["realtime"]["new_workers"], 2);
    assert_eq!(body["dashboard"]["realtime"]["has_new_data"], true);

    let res = admin(&client, reqwest::Method::POST, format!("{base}/realtime/rooms"))
        .json(&serde_json::json!({ "ids": ["r1"] }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 400);

    let snapshot: Value = admin(&client, reqwest::Method::POST, format!("{base}/realtime/ack"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(snapshot["realtime"]["total_new"], 0);
    assert_eq!(snapshot["realtime"]["has_new_data"], false);

    let res = admin(&client, reqwest::Method::POST, format!("{base}/cache/farms/clear"))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 200);
    assert_eq!(app.cache.generation("farms"), Some(1));

    for unknown in ["strategies", "missing"] {
        let res = admin(&client, reqwest::Method::POST, format!("{base}/cache/{unknown}/clear"))
            .send()
            .await
            .unwrap();
        assert_eq!(res.status(), 404);
    }

    let res = admin(&client, reqwest::Method::POST, format!("{base}/cache/clear"))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 200);
    assert_eq!(app.cache.generation("farms"), Some(2));
    assert_eq!(app.cache.generation("workers"), Some(1));

    app.lifecycle.shutdown();
    round.handle.await.unwrap().unwrap();
}

#[tokio::test]
async fn test_recovery_ticket_flow() {
    let upstream = dead_address().await;
    let app = Arc::new(Application::new(test_config(upstream)));
    let round = start_round(&app).await;
    let client = reqwest::Client::new();

    for _ in 0..3 {
        let res = client
            .get(format!("http://{}/v1/documents", round.forward_addr))
            .send()
            .await
            .unwrap();
        assert_eq!(res.status(), 502);
    }
    let base = format!("http://{}/admin", round.admin_addr);

    let alert: Value = admin(&client, reqwest::Method::GET, format!("{base}/alert"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(alert["visible"], true);
    assert_eq!(alert["error_count"], 3);

    // A ticket nobody issued never runs recovery.
    let res = admin(
        &client,
        reqwest::Method::POST,
        format!("{base}/recovery/{}", uuid::Uuid::new_v4()),
    )
    .send()
    .await
    .unwrap();
    assert_eq!(res.status(), 409);
    assert_eq!(app.cache.generation("workers"), Some(0));

    // A ticket whose disclosed count went stale is spent without running recovery.
    let stale: Value = admin(&client, reqwest::Method::GET, format!("{base}/recovery"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(stale["error_count"], 3);
    let res = client
        .get(format!("http://{}/v1/documents", round.forward_addr))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 502);
    assert_eq!(app.detector.view().error_count, 4);

    let stale_ticket = stale["ticket"].as_str().unwrap();
    let res = admin(&client, reqwest::Method::POST, format!("{base}/recovery/{stale_ticket}"))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 409);
    assert!(res.text().await.unwrap().contains("request a new recovery ticket"));
    assert_eq!(app.cache.generation("workers"), Some(0));

    let issued: Value = admin(&client, reqwest::Method::GET, format!("{base}/recovery"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(issued["error_count"], 4);
    assert!(issued["message"].as_str().unwrap().contains("4 connection errors detected"));
    let ticket = issued["ticket"].as_str().unwrap().to_string();

    let res = admin(&client, reqwest::Method::POST, format!("{base}/recovery/{ticket}"))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 200);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["outcome"], "completed");
    assert_eq!(body["error_count"], 4);

    // Recovery ends the round with a restart and wipes local state.
    let event = round.handle.await.unwrap().unwrap();
    assert_eq!(event, LifecycleEvent::Restart);
    assert_eq!(app.cache.generation("workers"), Some(1));
    assert!(!app.detector.view().visible);

    // Next round: the ticket was consumed.
    let round = start_round(&app).await;
    let res = admin(
        &client,
        reqwest::Method::POST,
        format!("http://{}/admin/recovery/{ticket}", round.admin_addr),
    )
    .send()
    .await
    .unwrap();
    assert_eq!(res.status(), 409);
    assert_eq!(app.cache.generation("workers"), Some(1));

    app.lifecycle.shutdown();
    let event = round.handle.await.unwrap().unwrap();
    assert_eq!(event, LifecycleEvent::Shutdown);
}
