// Copyright (c) Kelp Contributors
// SPDX-License-Identifier: Apache-2.0

//! In-process mock of a master and volume server for client tests.

use std::{
    collections::{HashMap, HashSet},
    sync::{
        Arc, Mutex,
        atomic::{AtomicUsize, Ordering},
    },
};

use axum::{
    Json, Router,
    body::Bytes,
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode, header},
    routing::{get, post},
};
use serde_json::{Value, json};

/// A recorded blob upload.
#[derive(Debug, Clone)]
pub struct RecordedUpload {
    pub path: String,
    pub content_type: String,
    pub body: Vec<u8>,
}

/// Shared, mutable state of the mock cluster.
#[derive(Debug, Default)]
pub struct MockState {
    /// The fid string the next assign returns.
    pub assign_fid: Mutex<String>,
    /// Error field served by `/dir/assign`, if any.
    pub assign_error: Mutex<Option<String>>,
    /// Error field served by `/status`, if any.
    pub status_error: Mutex<Option<String>>,
    /// The `size` the upload response reports.
    pub upload_size: Mutex<u64>,
    /// Blob paths (including any replica suffix) whose DELETE returns 500.
    pub failing_deletes: Mutex<HashSet<String>>,
    /// The `host:port` lookups report as the volume location.
    pub reported_addr: Mutex<String>,

    /// Number of `/dir/assign` requests served.
    pub assign_calls: AtomicUsize,
    /// Number of `/dir/lookup` requests served.
    pub lookup_calls: AtomicUsize,
    /// The query parameters of every lookup, in call order.
    pub lookup_queries: Mutex<Vec<HashMap<String, String>>>,
    /// Every blob upload received, in call order.
    pub uploads: Mutex<Vec<RecordedUpload>>,
    /// The request paths of every delete, in call order.
    pub delete_paths: Mutex<Vec<String>>,
}

/// A running mock cluster serving master and volume routes from one address.
#[derive(Debug)]
pub struct MockCluster {
    /// Bare `host:port` of the server, without a scheme, the way the master
    /// reports volume locations.
    pub addr: String,
    /// Handle to inspect and configure the cluster from tests.
    pub state: Arc<MockState>,
}

impl MockCluster {
    /// The master endpoint with an explicit scheme, for client construction.
    pub fn master_endpoint(&self) -> String {
        format!("http://{}", self.addr)
    }
}

/// Spawns the mock cluster on an ephemeral port.
pub async fn spawn_mock_cluster() -> MockCluster {
    let state = Arc::new(MockState::default());

    let app = Router::new()
        .route("/dir/assign", get(assign))
        .route("/dir/lookup", get(lookup))
        .route("/status", get(status))
        .route("/{fid}", post(upload).delete(delete_blob))
        .with_state(state.clone());

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind ephemeral port");
    let addr = listener.local_addr().expect("local addr").to_string();
    *state.reported_addr.lock().expect("lock") = addr.clone();
    tokio::spawn(async move {
        axum::serve(listener, app).await.expect("mock cluster serve");
    });

    MockCluster { addr, state }
}

async fn assign(
    State(state): State<Arc<MockState>>,
    Query(params): Query<HashMap<String, String>>,
) -> Json<Value> {
    state.assign_calls.fetch_add(1, Ordering::SeqCst);
    if let Some(error) = state.assign_error.lock().expect("lock").clone() {
        return Json(json!({ "error": error }));
    }
    let count: u64 = params
        .get("count")
        .and_then(|count| count.parse().ok())
        .unwrap_or(1);
    let fid = state.assign_fid.lock().expect("lock").clone();
    Json(json!({
        "fid": fid,
        "count": count,
        "url": "",
        "publicUrl": "",
    }))
}

async fn lookup(
    State(state): State<Arc<MockState>>,
    Query(params): Query<HashMap<String, String>>,
) -> Json<Value> {
    state.lookup_calls.fetch_add(1, Ordering::SeqCst);
    state.lookup_queries.lock().expect("lock").push(params);
    // Bare host:port, exercising the client-side scheme normalization.
    let addr = state.addr();
    Json(json!({
        "locations": [{ "url": addr, "publicUrl": addr }],
    }))
}

async fn status(State(state): State<Arc<MockState>>) -> Json<Value> {
    match state.status_error.lock().expect("lock").clone() {
        Some(error) => Json(json!({ "version": "0.3", "error": error })),
        None => Json(json!({ "version": "0.3" })),
    }
}

async fn upload(
    State(state): State<Arc<MockState>>,
    Path(fid): Path<String>,
    headers: HeaderMap,
    body: Bytes,
) -> Json<Value> {
    let content_type = headers
        .get(header::CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .unwrap_or_default()
        .to_owned();
    state.uploads.lock().expect("lock").push(RecordedUpload {
        path: fid.clone(),
        content_type,
        body: body.to_vec(),
    });
    let size = *state.upload_size.lock().expect("lock");
    Json(json!({ "fileName": fid, "size": size }))
}

async fn delete_blob(State(state): State<Arc<MockState>>, Path(fid): Path<String>) -> StatusCode {
    state.delete_paths.lock().expect("lock").push(fid.clone());
    if state.failing_deletes.lock().expect("lock").contains(&fid) {
        StatusCode::INTERNAL_SERVER_ERROR
    } else {
        StatusCode::ACCEPTED
    }
}

impl MockState {
    fn addr(&self) -> String {
        self.reported_addr.lock().expect("lock").clone()
    }
}
