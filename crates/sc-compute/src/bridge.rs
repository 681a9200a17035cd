//! Caller-owned bridge between the interactive thread and the compute worker.
//!
//! Tasks are correlated by id. Each submit returns a [`Deferred`] that is
//! filled exactly once: by a matching response, by a timeout, by a worker
//! fault, or immediately when the worker is unavailable. [`ComputationBridge::pump`]
//! never blocks; [`ComputationBridge::wait`] does, bounded by the task
//! timeout.

use crate::error::TaskError;
use crate::protocol::{Envelope, ProtocolError, Reply};
use crate::strategy::{ComputeTask, Resolved};
use crate::worker::{GraphCompute, TaskHandler, ToWorker, worker_loop};
use sc_core::CanvasConfig;
use serde::Serialize;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::mpsc::{self, RecvTimeoutError, TryRecvError};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

const WORKER_THREAD_NAME: &str = "sc-compute";

/// Returns `true` when the local fallback produced the delivered value.
type Completion = Box<dyn FnOnce(Result<Value, TaskError>) -> bool + Send>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BridgeStatus {
    Ready,
    Unavailable,
    Disposed,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BridgeStats {
    pub submitted: u64,
    pub completed: u64,
    pub failed: u64,
    pub timed_out: u64,
    /// Responses whose id no longer matched a pending task.
    pub stale: u64,
    pub fallbacks: u64,
}

/// A task result that arrives later.
pub struct Deferred<T> {
    id: String,
    rx: mpsc::Receiver<T>,
}

impl<T> Deferred<T> {
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Take the result if it has arrived. Yields `Some` at most once.
    pub fn try_take(&mut self) -> Option<T> {
        self.rx.try_recv().ok()
    }
}

impl<T> std::fmt::Debug for Deferred<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Deferred").field("id", &self.id).finish()
    }
}

struct Pending {
    kind: String,
    deadline: Instant,
    complete: Completion,
}

struct WorkerLink {
    outbound: mpsc::Sender<ToWorker>,
    inbound: mpsc::Receiver<Vec<u8>>,
    handle: Option<JoinHandle<()>>,
    /// Requests sent whose reply frame has not been received yet.
    in_flight: usize,
}

pub struct ComputationBridge {
    link: Option<WorkerLink>,
    status: BridgeStatus,
    pending: HashMap<String, Pending>,
    timeout: Duration,
    next_id: u64,
    stats: BridgeStats,
}

impl ComputationBridge {
    /// Start a worker running the built-in layout and connector computations.
    pub fn spawn(timeout: Duration) -> Self {
        Self::with_handler(GraphCompute, timeout)
    }

    pub fn from_config(config: &CanvasConfig) -> Self {
        Self::spawn(config.task_timeout())
    }

    /// Start a worker with a custom handler.
    pub fn with_handler<H: TaskHandler>(handler: H, timeout: Duration) -> Self {
        let (to_worker, worker_rx) = mpsc::channel();
        let (worker_tx, from_worker) = mpsc::channel();

        let spawned = thread::Builder::new()
            .name(WORKER_THREAD_NAME.into())
            .spawn(move || worker_loop(handler, worker_rx, worker_tx));

        match spawned {
            Ok(handle) => {
                let mut bridge = Self::unavailable(timeout);
                bridge.link = Some(WorkerLink {
                    outbound: to_worker,
                    inbound: from_worker,
                    handle: Some(handle),
                    in_flight: 0,
                });
                bridge.status = BridgeStatus::Ready;
                bridge
            }
            Err(e) => {
                log::warn!("bridge: could not start worker thread: {e}");
                Self::unavailable(timeout)
            }
        }
    }

    /// A bridge with no worker. Every submit resolves immediately.
    pub fn unavailable(timeout: Duration) -> Self {
        Self {
            link: None,
            status: BridgeStatus::Unavailable,
            pending: HashMap::new(),
            timeout,
            next_id: 0,
            stats: BridgeStats::default(),
        }
    }

    pub fn status(&self) -> BridgeStatus {
        self.status
    }

    pub fn is_available(&self) -> bool {
        self.status == BridgeStatus::Ready
    }

    pub fn stats(&self) -> BridgeStats {
        self.stats
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }

    /// Submit an untyped task. Rejects on timeout, worker error, or fault.
    pub fn submit_raw(&mut self, kind: &str, payload: Value) -> Deferred<Result<Value, TaskError>> {
        let (tx, rx) = mpsc::channel();
        let id = self.dispatch(
            kind,
            Ok(payload),
            Box::new(move |result| {
                let _ = tx.send(result);
                false
            }),
        );
        Deferred { id, rx }
    }

    /// Submit a typed task. Always resolves: with the worker's result, or
    /// with the task's local fallback when the worker cannot deliver.
    pub fn submit<T: ComputeTask>(&mut self, task: T) -> Deferred<Resolved<T::Output>> {
        let (tx, rx) = mpsc::channel();
        let payload = serde_json::to_value(&task)
            .map_err(|e| TaskError::from(ProtocolError::Encode(e.to_string())));
        let complete: Completion = Box::new(move |result| {
            let resolved = match result {
                Ok(value) => match serde_json::from_value::<T::Output>(value) {
                    Ok(output) => Resolved::primary(output),
                    Err(e) => Resolved::fallback(task.fallback(), TaskError::Decode(e.to_string())),
                },
                Err(reason) => Resolved::fallback(task.fallback(), reason),
            };
            let used_fallback = resolved.is_fallback();
            let _ = tx.send(resolved);
            used_fallback
        });
        let id = self.dispatch(T::KIND.as_str(), payload, complete);
        Deferred { id, rx }
    }

    /// Drain responses and expire overdue tasks without blocking. Returns the
    /// number of tasks settled.
    pub fn pump(&mut self) -> usize {
        let mut settled = 0;
        loop {
            let Some(link) = self.link.as_mut() else {
                break;
            };
            match link.inbound.try_recv() {
                Ok(frame) => {
                    link.in_flight = link.in_flight.saturating_sub(1);
                    settled += self.handle_frame(&frame);
                }
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => {
                    settled += self.fault("worker thread exited");
                    break;
                }
            }
        }
        settled + self.expire(Instant::now())
    }

    /// Block until `deferred` settles. Never call this from the interactive loop.
    pub fn wait<T>(&mut self, deferred: &mut Deferred<T>) -> Option<T> {
        loop {
            if let Some(value) = deferred.try_take() {
                return Some(value);
            }
            let Some(deadline) = self.pending.get(deferred.id()).map(|p| p.deadline) else {
                return deferred.try_take();
            };
            let Some(link) = self.link.as_mut() else {
                return deferred.try_take();
            };
            let remaining = deadline.saturating_duration_since(Instant::now());
            match link.inbound.recv_timeout(remaining) {
                Ok(frame) => {
                    link.in_flight = link.in_flight.saturating_sub(1);
                    self.handle_frame(&frame);
                }
                Err(RecvTimeoutError::Timeout) => {
                    self.expire(Instant::now());
                }
                Err(RecvTimeoutError::Disconnected) => {
                    self.fault("worker thread exited");
                }
            }
        }
    }

    /// Stop the worker and reject everything still pending. An idle worker
    /// is joined; one still busy with a request (even a timed-out one) is
    /// detached and exits once that request finishes.
    pub fn dispose(&mut self) {
        if self.status == BridgeStatus::Disposed {
            return;
        }
        if let Some(mut link) = self.link.take() {
            while link.inbound.try_recv().is_ok() {
                link.in_flight = link.in_flight.saturating_sub(1);
            }
            let _ = link.outbound.send(ToWorker::Shutdown);
            match link.handle.take() {
                Some(handle) if link.in_flight == 0 => {
                    let _ = handle.join();
                }
                Some(_) => {
                    log::debug!("bridge: detaching worker with {} request(s) in flight", link.in_flight);
                }
                None => {}
            }
        }
        self.status = BridgeStatus::Disposed;
        self.reject_all(|| TaskError::Disposed);
        log::debug!("bridge: disposed");
    }

    fn next_task_id(&mut self) -> String {
        self.next_id += 1;
        format!("task-{}", self.next_id)
    }

    fn dispatch(&mut self, kind: &str, payload: Result<Value, TaskError>, complete: Completion) -> String {
        let id = self.next_task_id();
        self.stats.submitted += 1;

        let payload = match payload {
            Ok(payload) => payload,
            Err(e) => {
                self.settle(&id, kind, complete, Err(e));
                return id;
            }
        };
        let frame = match Envelope::request(kind, payload, id.clone()).encode() {
            Ok(frame) => frame,
            Err(e) => {
                self.settle(&id, kind, complete, Err(e.into()));
                return id;
            }
        };
        let sent = match self.link.as_mut() {
            Some(link) => {
                let sent = link.outbound.send(ToWorker::Task(frame)).is_ok();
                if sent {
                    link.in_flight += 1;
                }
                sent
            }
            None => {
                let reason = match self.status {
                    BridgeStatus::Disposed => TaskError::Disposed,
                    _ => TaskError::Unavailable,
                };
                self.settle(&id, kind, complete, Err(reason));
                return id;
            }
        };
        if !sent {
            self.fault("worker channel closed");
            self.settle(&id, kind, complete, Err(TaskError::Unavailable));
            return id;
        }

        log::debug!("bridge: dispatched {kind} {id}");
        self.pending.insert(
            id.clone(),
            Pending {
                kind: kind.to_string(),
                deadline: Instant::now() + self.timeout,
                complete,
            },
        );
        id
    }

    fn handle_frame(&mut self, frame: &[u8]) -> usize {
        let envelope = match Envelope::decode(frame) {
            Ok(envelope) => envelope,
            Err(e) => return self.fault(&format!("malformed response frame: {e}")),
        };
        let id = envelope.id.clone();
        let frame_kind = envelope.kind.clone();
        let Some((base, reply)) = envelope.reply() else {
            return self.fault(&format!("unexpected frame kind `{frame_kind}`"));
        };
        let Some(pending) = self.pending.remove(&id) else {
            self.stats.stale += 1;
            log::debug!("bridge: discarding stale {frame_kind} for {id}");
            return 0;
        };

        let result = if base != pending.kind {
            Err(TaskError::Decode(format!(
                "response kind {base} does not match request kind {}",
                pending.kind
            )))
        } else {
            match reply {
                Reply::Result(value) => Ok(value),
                Reply::Error(message) => Err(TaskError::Worker(message)),
            }
        };
        self.settle(&id, &pending.kind, pending.complete, result);
        1
    }

    fn expire(&mut self, now: Instant) -> usize {
        let mut overdue: Vec<String> = self
            .pending
            .iter()
            .filter(|(_, p)| p.deadline <= now)
            .map(|(id, _)| id.clone())
            .collect();
        overdue.sort();
        for id in &overdue {
            if let Some(pending) = self.pending.remove(id) {
                self.settle(id, &pending.kind, pending.complete, Err(TaskError::Timeout(self.timeout)));
            }
        }
        overdue.len()
    }

    /// Take the worker offline and reject every pending task.
    fn fault(&mut self, reason: &str) -> usize {
        log::warn!("bridge: worker fault: {reason}; switching to local fallbacks");
        self.status = BridgeStatus::Unavailable;
        // Detach rather than join: a faulted worker may never answer Shutdown.
        self.link = None;
        let reason = reason.to_string();
        self.reject_all(|| TaskError::Fault(reason.clone()))
    }

    fn reject_all(&mut self, reason: impl Fn() -> TaskError) -> usize {
        let mut drained: Vec<(String, Pending)> = self.pending.drain().collect();
        drained.sort_by(|a, b| a.0.cmp(&b.0));
        let count = drained.len();
        for (id, pending) in drained {
            self.settle(&id, &pending.kind, pending.complete, Err(reason()));
        }
        count
    }

    fn settle(&mut self, id: &str, kind: &str, complete: Completion, result: Result<Value, TaskError>) {
        match &result {
            Ok(_) => {
                self.stats.completed += 1;
                log::debug!("bridge: {kind} {id} completed");
            }
            Err(TaskError::Timeout(after)) => {
                self.stats.timed_out += 1;
                log::warn!("bridge: {kind} {id} timed out after {after:?}");
            }
            Err(e) => {
                self.stats.failed += 1;
                log::debug!("bridge: {kind} {id} failed: {e}");
            }
        }
        if complete(result) {
            self.stats.fallbacks += 1;
            log::warn!("bridge: {kind} {id} resolved by local fallback");
        }
    }
}

impl Drop for ComputationBridge {
    fn drop(&mut self) {
        self.dispose();
    }
}

impl std::fmt::Debug for ComputationBridge {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ComputationBridge")
            .field("status", &self.status)
            .field("pending", &self.pending.len())
            .field("timeout", &self.timeout)
            .field("stats", &self.stats)
            .finish()
    }
}
