//! End-to-end tests driving the HTTP API with a real client.

use parkade_core::{Engine, EngineOptions};
use parkade_schema::parse_layout_str;
use parkade_server::TestServer;
use parkade_store::{FacilityStore, MemoryStore};
use serde_json::{json, Value};
use std::sync::Arc;

fn agent() -> ureq::Agent {
    ureq::Agent::config_builder()
        .http_status_as_error(false)
        .build()
        .into()
}

fn read(mut resp: ureq::http::Response<ureq::Body>) -> (u16, Value) {
    let status = resp.status().as_u16();
    let body = resp.body_mut().read_to_string().unwrap();
    (status, serde_json::from_str(&body).unwrap())
}

fn get(srv: &TestServer, path: &str) -> (u16, Value) {
    read(agent().get(&format!("{}{path}", srv.url)).call().unwrap())
}

fn delete(srv: &TestServer, path: &str) -> (u16, Value) {
    read(agent().delete(&format!("{}{path}", srv.url)).call().unwrap())
}

fn post(srv: &TestServer, path: &str, body: &Value) -> (u16, Value) {
    let resp = agent()
        .post(&format!("{}{path}", srv.url))
        .header("Content-Type", "application/json")
        .send(body.to_string().as_bytes())
        .unwrap();
    read(resp)
}

fn post_raw(srv: &TestServer, path: &str, body: &str) -> (u16, Value) {
    let resp = agent()
        .post(&format!("{}{path}", srv.url))
        .send(body.as_bytes())
        .unwrap();
    read(resp)
}

fn seeded(layout: &str) -> (TestServer, tempfile::TempDir) {
    let dir = tempfile::tempdir().unwrap();
    let srv = TestServer::start(dir.path().to_path_buf());
    srv.engine.seed(&parse_layout_str(layout).unwrap()).unwrap();
    (srv, dir)
}

fn park(srv: &TestServer, kind: &str, plate: &str) -> (u16, Value) {
    post(
        srv,
        "/vehicles",
        &json!({ "vehicleType": kind, "licensePlate": plate }),
    )
}

#[test]
fn health_reports_available() {
    let (srv, _dir) = seeded("layout_version = 1\n[[levels]]\ncar = 1\n");
    let (status, body) = get(&srv, "/health");
    assert_eq!(status, 200);
    assert_eq!(body["success"], true);
    assert_eq!(body["data"]["available"], true);
}

#[test]
fn park_list_leave_cycle() {
    let (srv, _dir) = seeded("layout_version = 1\n[[levels]]\nslots = [\"motorcycle\", \"car\"]\n");

    let (status, body) = park(&srv, "Car", "AAA111");
    assert_eq!(status, 201);
    assert_eq!(body["data"]["license_plate"], "AAA111");
    assert_eq!(body["data"]["level"], 1);
    assert_eq!(body["data"]["slot"], 2);

    let (status, body) = get(&srv, "/parkinglot");
    assert_eq!(status, 200);
    assert_eq!(body["data"], json!({ "free_spot": 1, "n_spot": 2 }));

    let (_, body) = get(&srv, "/vehicles");
    let parked = body["data"].as_array().unwrap();
    assert_eq!(parked.len(), 1);
    assert_eq!(parked[0]["license_plate"], "AAA111");

    let (status, body) = delete(&srv, "/vehicles/AAA111");
    assert_eq!(status, 200);
    assert_eq!(body["data"]["outcome"], "released");

    let (_, body) = get(&srv, "/parkinglot");
    assert_eq!(body["data"]["free_spot"], 2);
}

#[test]
fn duplicate_park_conflicts() {
    let (srv, _dir) = seeded("layout_version = 1\n[[levels]]\ncar = 2\n");
    assert_eq!(park(&srv, "Car", "AAA111").0, 201);
    let (status, body) = park(&srv, "Car", "AAA111");
    assert_eq!(status, 409);
    assert_eq!(body["success"], false);
    assert!(body["error"].as_str().unwrap().contains("AAA111"));
}

#[test]
fn full_lot_is_unprocessable() {
    let (srv, _dir) = seeded("layout_version = 1\n[[levels]]\nmotorcycle = 1\n");
    let (status, body) = park(&srv, "Bus", "BUS001");
    assert_eq!(status, 422);
    assert!(body["error"].as_str().unwrap().contains("no available spot"));
}

#[test]
fn leave_unknown_plate_is_not_found() {
    let (srv, _dir) = seeded("layout_version = 1\n[[levels]]\ncar = 1\n");
    let (status, body) = delete(&srv, "/vehicles/NOPE01");
    assert_eq!(status, 404);
    assert_eq!(body["success"], false);
}

#[test]
fn malformed_body_is_bad_request() {
    let (srv, _dir) = seeded("layout_version = 1\n[[levels]]\ncar = 1\n");
    let (status, body) = post_raw(&srv, "/vehicles", "{ not json");
    assert_eq!(status, 400);
    assert_eq!(body["success"], false);
}

#[test]
fn unknown_route_and_wrong_method() {
    let (srv, _dir) = seeded("layout_version = 1\n[[levels]]\ncar = 1\n");
    assert_eq!(get(&srv, "/nowhere").0, 404);
    assert_eq!(delete(&srv, "/parkinglot").0, 405);
}

#[test]
fn admin_structural_edits() {
    let dir = tempfile::tempdir().unwrap();
    let srv = TestServer::start(dir.path().to_path_buf());

    let (status, body) = post(&srv, "/admin/levels", &json!({}));
    assert_eq!(status, 201);
    assert_eq!(body["data"]["level_number"], 1);

    let (status, body) = post(&srv, "/admin/levels/1/slots", &json!({ "size": "bus" }));
    assert_eq!(status, 201);
    assert_eq!(body["data"]["slot_number"], 1);
    let (status, _) = post(&srv, "/admin/levels/1/slots", &json!({ "size": 0 }));
    assert_eq!(status, 201);
    let (status, _) = post(&srv, "/admin/levels/1/slots", &json!({ "size": "truck" }));
    assert_eq!(status, 400);
    let (status, _) = post(&srv, "/admin/levels/9/slots", &json!({ "size": "car" }));
    assert_eq!(status, 404);

    let (status, body) = get(&srv, "/admin/levels/1");
    assert_eq!(status, 200);
    assert_eq!(body["data"]["capacity"], 2);

    assert_eq!(park(&srv, "Bus", "BUS001").0, 201);
    assert_eq!(delete(&srv, "/admin/levels/1/slots/2").0, 200);
    let (status, body) = delete(&srv, "/admin/levels/1/slots/1");
    assert_eq!(status, 409);
    assert!(body["error"].as_str().unwrap().contains("occupied"));

    assert_eq!(delete(&srv, "/vehicles/BUS001").0, 200);
    assert_eq!(delete(&srv, "/admin/levels/1/slots/1").0, 200);
    assert_eq!(delete(&srv, "/admin/levels/1").0, 200);

    let (_, body) = get(&srv, "/admin/levels");
    assert!(body["data"].as_array().unwrap().is_empty());
}

#[test]
fn state_survives_server_restart() {
    let dir = tempfile::tempdir().unwrap();
    {
        let srv = TestServer::start(dir.path().to_path_buf());
        srv.engine
            .seed(&parse_layout_str("layout_version = 1\n[[levels]]\ncar = 2\n").unwrap())
            .unwrap();
        assert_eq!(park(&srv, "Car", "AAA111").0, 201);
    }

    let srv = TestServer::start(dir.path().to_path_buf());
    let (_, body) = get(&srv, "/parkinglot");
    assert_eq!(body["data"]["free_spot"], 1);
    assert_eq!(park(&srv, "Car", "AAA111").0, 409);
}

#[test]
fn offline_store_is_service_unavailable() {
    let store = Arc::new(MemoryStore::new());
    store.insert_level(1).unwrap();
    let engine = Engine::new(Box::new(Arc::clone(&store)), EngineOptions::default());
    let srv = TestServer::with_engine(Arc::new(engine));

    store.set_offline(true);
    let (status, body) = park(&srv, "Car", "AAA111");
    assert_eq!(status, 503);
    assert_eq!(body["success"], false);

    store.set_offline(false);
    let (status, body) = post(&srv, "/admin/reload", &json!({}));
    assert_eq!(status, 200);
    assert_eq!(body["data"]["levels"], 1);
}

#[test]
fn concurrent_parks_never_share_a_slot() {
    let (srv, _dir) = seeded("layout_version = 1\n[[levels]]\ncar = 4\n");
    let srv = Arc::new(srv);

    let handles: Vec<_> = (0..8)
        .map(|i| {
            let srv = Arc::clone(&srv);
            std::thread::spawn(move || park(&srv, "Car", &format!("CAR{i:03}")).0)
        })
        .collect();
    let statuses: Vec<u16> = handles.into_iter().map(|h| h.join().unwrap()).collect();

    assert_eq!(statuses.iter().filter(|s| **s == 201).count(), 4);
    assert_eq!(statuses.iter().filter(|s| **s == 422).count(), 4);

    let (_, body) = get(&srv, "/vehicles");
    let mut slots: Vec<u64> = body["data"]
        .as_array()
        .unwrap()
        .iter()
        .map(|v| v["slot_number"].as_u64().unwrap())
        .collect();
    slots.sort_unstable();
    assert_eq!(slots, vec![1, 2, 3, 4]);
}
