//! HTTP JSON API over a shared Parkade [`Engine`].
//!
//! Every response uses the same envelope: `{"success": true, "data": ...}` on
//! success, `{"success": false, "error": "..."}` on failure. Engine errors map
//! to statuses by [`ErrorKind`].
//!
//! The [`TestServer`] helper starts a server on a random port for integration testing.

use parkade_core::{CoreError, Engine, EngineOptions, ErrorKind};
use parkade_schema::SizeClass;
use parkade_store::FileStore;
use serde::Deserialize;
use serde_json::{json, Value};
use std::path::PathBuf;
use std::sync::Arc;
use std::thread;
use tiny_http::{Header, Method, Response, Server, StatusCode};
use tracing::{debug, error, info, warn};

pub type ServerError = Box<dyn std::error::Error + Send + Sync + 'static>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route {
    Health,
    ListVehicles,
    Park,
    Leave(String),
    Occupancy,
    ListLevels,
    CreateLevel,
    GetLevel(u32),
    DeleteLevel(u32),
    CreateSlot(u32),
    DeleteSlot(u32, u32),
    Reload,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteError {
    NotFound,
    MethodNotAllowed,
}

/// Decode `%XX` escapes in a single path segment.
fn decode_segment(segment: &str) -> Option<String> {
    let bytes = segment.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'%' {
            let hex = segment.get(i + 1..i + 3)?;
            out.push(u8::from_str_radix(hex, 16).ok()?);
            i += 3;
        } else {
            out.push(bytes[i]);
            i += 1;
        }
    }
    String::from_utf8(out).ok()
}

fn number(segment: &str) -> Result<u32, RouteError> {
    segment.parse().map_err(|_| RouteError::NotFound)
}

/// Resolve a method and URL (query string ignored) to a route.
pub fn parse_route(method: &Method, url: &str) -> Result<Route, RouteError> {
    let path = url.split('?').next().unwrap_or("");
    let segments: Vec<&str> = path.trim_matches('/').split('/').collect();
    let allow = |ok: bool, route: Route| {
        if ok {
            Ok(route)
        } else {
            Err(RouteError::MethodNotAllowed)
        }
    };

    match segments.as_slice() {
        ["health"] => allow(*method == Method::Get, Route::Health),
        ["vehicles"] => match *method {
            Method::Get => Ok(Route::ListVehicles),
            Method::Post => Ok(Route::Park),
            _ => Err(RouteError::MethodNotAllowed),
        },
        ["vehicles", plate] => {
            let plate = decode_segment(plate).ok_or(RouteError::NotFound)?;
            allow(*method == Method::Delete, Route::Leave(plate))
        }
        ["parkinglot"] => allow(*method == Method::Get, Route::Occupancy),
        ["admin", "levels"] => match *method {
            Method::Get => Ok(Route::ListLevels),
            Method::Post => Ok(Route::CreateLevel),
            _ => Err(RouteError::MethodNotAllowed),
        },
        ["admin", "levels", n] => {
            let n = number(n)?;
            match *method {
                Method::Get => Ok(Route::GetLevel(n)),
                Method::Delete => Ok(Route::DeleteLevel(n)),
                _ => Err(RouteError::MethodNotAllowed),
            }
        }
        ["admin", "levels", n, "slots"] => {
            let n = number(n)?;
            allow(*method == Method::Post, Route::CreateSlot(n))
        }
        ["admin", "levels", n, "slots", s] => {
            let (n, s) = (number(n)?, number(s)?);
            allow(*method == Method::Delete, Route::DeleteSlot(n, s))
        }
        ["admin", "reload"] => allow(*method == Method::Post, Route::Reload),
        _ => Err(RouteError::NotFound),
    }
}

pub fn status_for(err: &CoreError) -> u16 {
    match err.kind() {
        ErrorKind::AlreadyExists | ErrorKind::IntegrityViolation => 409,
        ErrorKind::NotFound => 404,
        ErrorKind::NoAvailableSpot | ErrorKind::InvalidInput => 422,
        ErrorKind::StorageUnavailable => 503,
        ErrorKind::InconsistentState | ErrorKind::Internal => 500,
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ParkRequest {
    #[serde(default)]
    vehicle_type: String,
    license_plate: String,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum SizeParam {
    Rank(u8),
    Name(String),
}

#[derive(Debug, Deserialize)]
struct CreateSlotRequest {
    size: SizeParam,
}

impl SizeParam {
    fn resolve(&self) -> Result<SizeClass, String> {
        match self {
            SizeParam::Rank(rank) => {
                SizeClass::from_rank(*rank).ok_or_else(|| format!("unknown size class: {rank}"))
            }
            SizeParam::Name(name) => name.parse(),
        }
    }
}

fn json_header() -> Header {
    Header::from_bytes(&b"Content-Type"[..], &b"application/json"[..])
        .unwrap_or_else(|()| unreachable!("static header is valid"))
}

fn respond(req: tiny_http::Request, code: u16, body: &Value) {
    let response = Response::from_string(body.to_string())
        .with_status_code(StatusCode(code))
        .with_header(json_header());
    if let Err(e) = req.respond(response) {
        warn!("failed to send response: {e}");
    }
}

fn respond_ok(req: tiny_http::Request, code: u16, data: impl serde::Serialize) {
    match serde_json::to_value(data) {
        Ok(data) => respond(req, code, &json!({ "success": true, "data": data })),
        Err(e) => respond_err(req, 500, &format!("serialization failed: {e}")),
    }
}

fn respond_err(req: tiny_http::Request, code: u16, msg: &str) {
    respond(req, code, &json!({ "success": false, "error": msg }));
}

fn respond_core(req: tiny_http::Request, err: &CoreError) {
    let code = status_for(err);
    if code >= 500 {
        error!("{err}");
    } else {
        debug!("{err}");
    }
    respond_err(req, code, &err.to_string());
}

fn read_json<T: serde::de::DeserializeOwned>(req: &mut tiny_http::Request) -> Result<T, String> {
    let mut body = Vec::new();
    req.as_reader()
        .read_to_end(&mut body)
        .map_err(|e| format!("failed to read body: {e}"))?;
    serde_json::from_slice(&body).map_err(|e| format!("invalid request body: {e}"))
}

fn reply<T: serde::Serialize>(req: tiny_http::Request, code: u16, result: Result<T, CoreError>) {
    match result {
        Ok(data) => respond_ok(req, code, data),
        Err(e) => respond_core(req, &e),
    }
}

/// Handle a single HTTP request, dispatching to the appropriate route handler.
pub fn handle_request(engine: &Engine, mut req: tiny_http::Request) {
    let method = req.method().clone();
    let url = req.url().to_owned();
    debug!("{method} {url}");

    let route = match parse_route(&method, &url) {
        Ok(route) => route,
        Err(RouteError::NotFound) => return respond_err(req, 404, "not found"),
        Err(RouteError::MethodNotAllowed) => return respond_err(req, 405, "method not allowed"),
    };

    match route {
        Route::Health => respond_ok(
            req,
            200,
            json!({ "status": "ok", "available": engine.is_available() }),
        ),
        Route::ListVehicles => reply(req, 200, engine.parked()),
        Route::Park => match read_json::<ParkRequest>(&mut req) {
            Ok(body) => reply(req, 201, engine.park(&body.vehicle_type, &body.license_plate)),
            Err(msg) => respond_err(req, 400, &msg),
        },
        Route::Leave(plate) => reply(req, 200, engine.leave(&plate)),
        Route::Occupancy => reply(
            req,
            200,
            engine
                .occupancy()
                .map(|o| json!({ "free_spot": o.free, "n_spot": o.total })),
        ),
        Route::ListLevels => reply(req, 200, engine.levels()),
        Route::CreateLevel => reply(
            req,
            201,
            engine
                .create_level()
                .map(|n| json!({ "level_number": n })),
        ),
        Route::GetLevel(n) => reply(req, 200, engine.level(n)),
        Route::DeleteLevel(n) => reply(
            req,
            200,
            engine
                .delete_level(n)
                .map(|()| json!({ "deleted_level": n })),
        ),
        Route::CreateSlot(n) => {
            let size = read_json::<CreateSlotRequest>(&mut req).and_then(|b| b.size.resolve());
            match size {
                Ok(size) => reply(
                    req,
                    201,
                    engine
                        .create_slot(n, size)
                        .map(|s| json!({ "level_number": n, "slot_number": s, "size": size })),
                ),
                Err(msg) => respond_err(req, 400, &msg),
            }
        }
        Route::DeleteSlot(n, s) => reply(
            req,
            200,
            engine
                .delete_slot(n, s)
                .map(|()| json!({ "level_number": n, "deleted_slot": s })),
        ),
        Route::Reload => reply(req, 200, engine.reload()),
    }
}

fn worker_loop(server: &Server, engine: &Engine) {
    for request in server.incoming_requests() {
        handle_request(engine, request);
    }
}

/// Bind a server without starting any workers.
pub fn bind(addr: &str) -> Result<Arc<Server>, ServerError> {
    Ok(Arc::new(Server::http(addr)?))
}

/// Serve requests on `workers` threads until [`shutdown`] is called.
pub fn serve(server: &Arc<Server>, engine: &Arc<Engine>, workers: usize) {
    let handles: Vec<_> = (0..workers.max(1))
        .map(|_| {
            let server = Arc::clone(server);
            let engine = Arc::clone(engine);
            thread::spawn(move || worker_loop(&server, &engine))
        })
        .collect();
    for handle in handles {
        if handle.join().is_err() {
            error!("server worker panicked");
        }
    }
    info!("server stopped");
}

/// Wake every blocked worker so `serve` returns.
pub fn shutdown(server: &Server, workers: usize) {
    for _ in 0..workers.max(1) {
        server.unblock();
    }
}

/// A test helper that starts a parkade-server on a random port in a background thread.
///
/// The server listens on `127.0.0.1:{port}`. Dropping the `TestServer` unblocks
/// and joins the worker.
pub struct TestServer {
    pub url: String,
    pub port: u16,
    pub engine: Arc<Engine>,
    server: Arc<Server>,
    handle: Option<thread::JoinHandle<()>>,
}

impl TestServer {
    /// Start a test server over a file store rooted at `data_dir`.
    pub fn start(data_dir: PathBuf) -> Self {
        let engine = Engine::new(Box::new(FileStore::new(data_dir)), EngineOptions::default());
        Self::with_engine(Arc::new(engine))
    }

    /// Start a test server over an existing engine.
    /// Binds to `127.0.0.1:0` (random port).
    pub fn with_engine(engine: Arc<Engine>) -> Self {
        let server = bind("127.0.0.1:0").expect("failed to bind test HTTP server");
        let port = server.server_addr().to_ip().expect("not an IP addr").port();
        let url = format!("http://127.0.0.1:{port}");

        let srv = Arc::clone(&server);
        let eng = Arc::clone(&engine);
        let handle = thread::spawn(move || worker_loop(&srv, &eng));

        Self {
            url,
            port,
            engine,
            server,
            handle: Some(handle),
        }
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.server.unblock();
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}
