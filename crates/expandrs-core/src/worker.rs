// Expandrs Bulk Worker
// Import/search task decoupled from the expansion path

use std::sync::Arc;

use log::{debug, warn};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::abbreviation::Abbreviation;
use crate::store::MemoryStore;

/// Operations the bulk worker performs.
#[derive(Debug)]
pub enum WorkerOp {
    /// Insert many abbreviations; invalid ones are skipped and counted.
    Import(Vec<Abbreviation>),
    /// Case-insensitive substring search over the stored abbreviations.
    Search { query: String },
}

/// Request with a caller-chosen correlation id.
#[derive(Debug)]
pub struct WorkerRequest {
    pub id: u64,
    pub op: WorkerOp,
}

/// Result of one worker operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WorkerResult {
    Imported { inserted: usize, rejected: usize },
    Matches(Vec<String>),
}

/// Response carrying the request's correlation id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkerResponse {
    pub id: u64,
    pub result: WorkerResult,
}

/// Handle to a spawned bulk worker.
///
/// The worker shares no state with the expansion engine beyond the store
/// handle; all communication is request/response message passing keyed by
/// the caller's correlation id. Dropping the handle shuts the worker down.
pub struct BulkWorker {
    requests: mpsc::UnboundedSender<WorkerRequest>,
    responses: mpsc::UnboundedReceiver<WorkerResponse>,
    handle: JoinHandle<()>,
}

impl BulkWorker {
    /// Spawn the worker task against a store.
    pub fn spawn(store: Arc<MemoryStore>) -> Self {
        let (req_tx, mut req_rx) = mpsc::unbounded_channel::<WorkerRequest>();
        let (resp_tx, resp_rx) = mpsc::unbounded_channel::<WorkerResponse>();

        let handle = tokio::spawn(async move {
            while let Some(request) = req_rx.recv().await {
                let result = run_op(&store, request.op);
                let response = WorkerResponse {
                    id: request.id,
                    result,
                };
                if resp_tx.send(response).is_err() {
                    debug!("bulk worker receiver gone, stopping");
                    break;
                }
            }
        });

        Self {
            requests: req_tx,
            responses: resp_rx,
            handle,
        }
    }

    /// Submit a request. Returns false when the worker has stopped.
    pub fn submit(&self, request: WorkerRequest) -> bool {
        self.requests.send(request).is_ok()
    }

    /// Await the next response. `None` once the worker has stopped.
    pub async fn next_response(&mut self) -> Option<WorkerResponse> {
        self.responses.recv().await
    }

    /// Stop the worker and wait for it to finish.
    pub async fn shutdown(self) {
        drop(self.requests);
        drop(self.responses);
        if let Err(e) = self.handle.await {
            warn!("bulk worker task failed: {e}");
        }
    }
}

fn run_op(store: &MemoryStore, op: WorkerOp) -> WorkerResult {
    match op {
        WorkerOp::Import(abbreviations) => {
            let mut inserted = 0;
            let mut rejected = 0;
            for abbreviation in abbreviations {
                match store.add_abbreviation(abbreviation) {
                    Ok(()) => inserted += 1,
                    Err(e) => {
                        warn!("bulk import rejected an abbreviation: {e}");
                        rejected += 1;
                    }
                }
            }
            WorkerResult::Imported { inserted, rejected }
        }
        WorkerOp::Search { query } => WorkerResult::Matches(store.search(&query)),
    }
}
