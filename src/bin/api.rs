//! Minimal HTTP proof-job surface
//!
//! Exposes exactly the three routes spec.md §6 names: `POST /api/zk/generate`,
//! `GET /api/zk/proof/{job_id}`, `POST /api/zk/verify`. This is a thin
//! reference implementation of the interface the core must support — the
//! auth/billing/rate-limiting/KV-store machinery the teacher's own HTTP
//! façade (`tinyzkp_api.rs`) builds around its prover is infrastructure for
//! that product, not this proof system's core, and is out of scope here
//! (spec.md §1). What is kept is the ambient shape: typed request/response
//! structs, an in-process job table, and `tower-http` request tracing.

#![forbid(unsafe_code)]

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json};
use axum::routing::{get, post};
use axum::Router;
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tower_http::trace::TraceLayer;
use tracing::{error, info};

use starkcore::{Proof, StarkConfig, Prover, Verifier};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
struct GenerateRequestData {
    statement: serde_json::Value,
    witness: serde_json::Value,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
struct GenerateRequest {
    proof_type: String,
    data: GenerateRequestData,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "snake_case")]
struct GenerateResponse {
    job_id: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "snake_case", tag = "status")]
enum JobStatus {
    Queued,
    Running,
    Completed { proof: Box<Proof>, claim: serde_json::Value, duration_ms: u64 },
    Failed { error: String },
}

type JobTable = Arc<Mutex<HashMap<String, JobStatus>>>;

#[derive(Clone)]
struct AppState {
    jobs: JobTable,
    config: StarkConfig,
}

async fn generate(
    State(state): State<AppState>,
    Json(req): Json<GenerateRequest>,
) -> impl IntoResponse {
    let job_id = uuid_v4();
    {
        let mut jobs = state.jobs.lock().await;
        jobs.insert(job_id.clone(), JobStatus::Queued);
    }

    let config = state.config;
    let jobs = state.jobs.clone();
    let id_for_task = job_id.clone();
    let proof_type = req.proof_type.clone();
    let statement = req.data.statement.clone();
    let witness = req.data.witness;

    tokio::spawn(async move {
        {
            let mut jobs = jobs.lock().await;
            jobs.insert(id_for_task.clone(), JobStatus::Running);
        }
        info!(job_id = %id_for_task, proof_type = %proof_type, "proof job started");

        let started = Instant::now();
        let prover = Prover::new(config);
        let result = prover.prove(&statement, &witness);
        let duration_ms = started.elapsed().as_millis() as u64;

        let status = match result {
            Ok(proof) => JobStatus::Completed { proof: Box::new(proof), claim: statement, duration_ms },
            Err(e) => {
                error!(job_id = %id_for_task, error = %e, "proof job failed");
                JobStatus::Failed { error: e.to_string() }
            }
        };
        let mut jobs = jobs.lock().await;
        jobs.insert(id_for_task, status);
    });

    Json(GenerateResponse { job_id })
}

async fn proof_status(
    State(state): State<AppState>,
    Path(job_id): Path<String>,
) -> impl IntoResponse {
    let jobs = state.jobs.lock().await;
    match jobs.get(&job_id) {
        Some(status) => (StatusCode::OK, Json(status.clone())).into_response(),
        None => (
            StatusCode::NOT_FOUND,
            Json(serde_json::json!({ "error": "unknown job_id" })),
        )
            .into_response(),
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "snake_case")]
struct VerifyRequest {
    proof: Proof,
    #[allow(dead_code)]
    public_inputs: Option<serde_json::Value>,
    claim: serde_json::Value,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "snake_case")]
struct VerifyResponse {
    valid: bool,
    duration_ms: u64,
}

async fn verify(State(state): State<AppState>, Json(req): Json<VerifyRequest>) -> impl IntoResponse {
    let started = Instant::now();
    let verifier = Verifier::new(state.config);
    let valid = verifier.verify(&req.proof, &req.claim);
    let duration_ms = started.elapsed().as_millis() as u64;
    Json(VerifyResponse { valid, duration_ms })
}

/// A process-local, time-seeded-enough v4-shaped UUID. Job ids only need to
/// be unique within this process's in-memory table, not globally unique or
/// cryptographically unpredictable, so this avoids pulling in a `uuid`
/// dependency for a single call site.
fn uuid_v4() -> String {
    use std::sync::atomic::{AtomicU64, Ordering};
    static COUNTER: AtomicU64 = AtomicU64::new(0);
    let counter = COUNTER.fetch_add(1, Ordering::Relaxed);
    let pid = std::process::id() as u64;
    format!("job-{pid:x}-{counter:x}")
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "starkcore_api=info,tower_http=info".into()),
        )
        .with_target(false)
        .compact()
        .init();

    let addr: SocketAddr = std::env::var("STARKCORE_API_ADDR")
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or_else(|| SocketAddr::from(([127, 0, 0, 1], 8080)));

    let state = AppState { jobs: Arc::new(Mutex::new(HashMap::new())), config: StarkConfig::default() };

    let app = Router::new()
        .route("/api/zk/generate", post(generate))
        .route("/api/zk/proof/:job_id", get(proof_status))
        .route("/api/zk/verify", post(verify))
        .with_state(state)
        .layer(TraceLayer::new_for_http());

    info!(%addr, "starkcore API listening");
    let listener = tokio::net::TcpListener::bind(addr).await.expect("bind address");
    axum::serve(listener, app).await.expect("server error");
}
