//! Background worker loop.
//!
//! The worker owns no shared state: each task frame carries a full snapshot
//! of its inputs and every response is a full result. A handler panic ends
//! the thread, which the bridge observes as a disconnected channel.

use crate::protocol::{BezierRequest, ConnectorRequest, Envelope, LayoutRequest, TaskKind};
use crate::strategy::ComputeTask;
use serde_json::Value;
use std::sync::mpsc;

/// Messages from the bridge to the worker thread.
#[derive(Debug)]
pub enum ToWorker {
    /// A MessagePack-encoded request envelope.
    Task(Vec<u8>),
    Shutdown,
}

/// Computes one task. `Err` becomes a `<kind>_ERROR` frame.
pub trait TaskHandler: Send + 'static {
    fn handle(&mut self, kind: &str, payload: Value) -> Result<Value, String>;
}

impl<F> TaskHandler for F
where
    F: FnMut(&str, Value) -> Result<Value, String> + Send + 'static,
{
    fn handle(&mut self, kind: &str, payload: Value) -> Result<Value, String> {
        self(kind, payload)
    }
}

/// The production handler: runs the primary side of each strategy pair.
#[derive(Debug, Default, Clone, Copy)]
pub struct GraphCompute;

impl TaskHandler for GraphCompute {
    fn handle(&mut self, kind: &str, payload: Value) -> Result<Value, String> {
        let kind = TaskKind::parse(kind).map_err(|e| e.to_string())?;
        match kind {
            TaskKind::CalculateLayout => run_primary::<LayoutRequest>(payload),
            TaskKind::CalculateBezier => run_primary::<BezierRequest>(payload),
            TaskKind::CalculateSmartConnectors => run_primary::<ConnectorRequest>(payload),
        }
    }
}

fn run_primary<T>(payload: Value) -> Result<Value, String>
where
    T: ComputeTask + serde::de::DeserializeOwned,
{
    let request: T = serde_json::from_value(payload)
        .map_err(|e| format!("bad payload for {}: {e}", T::KIND))?;
    serde_json::to_value(request.primary()).map_err(|e| e.to_string())
}

/// Serve task frames until shutdown or until either channel closes.
pub fn worker_loop<H: TaskHandler>(
    mut handler: H,
    inbound: mpsc::Receiver<ToWorker>,
    outbound: mpsc::Sender<Vec<u8>>,
) {
    while let Ok(msg) = inbound.recv() {
        let frame = match msg {
            ToWorker::Task(frame) => frame,
            ToWorker::Shutdown => break,
        };
        let request = match Envelope::decode(&frame) {
            Ok(env) => env,
            Err(e) => {
                log::warn!("worker: dropping undecodable request: {e}");
                continue;
            }
        };
        log::trace!("worker: {} {}", request.kind, request.id);

        let response = match handler.handle(&request.kind, request.payload) {
            Ok(value) => Envelope::result(&request.kind, value, request.id),
            Err(message) => Envelope::error(&request.kind, message, request.id),
        };
        let bytes = match response.encode() {
            Ok(bytes) => bytes,
            Err(e) => {
                log::warn!("worker: failed to encode response: {e}");
                continue;
            }
        };
        if outbound.send(bytes).is_err() {
            break;
        }
    }
    log::debug!("worker: exiting");
}
