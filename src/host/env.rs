//! Host event loop and background-work queue.
//!
//! `Env` is the host thread's handle. Work is queued in two halves: an
//! `execute` closure that runs on the blocking pool, and a `complete`
//! closure that runs back on the host thread when the loop is driven
//! (`tick`, `run_until_idle`, `block_on`).

use super::{HostError, HostValue, Promise};
use crate::config::CoordinatorConfig;
use crate::error::{OcrError, UNKNOWN_ERROR};
use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::panic::{catch_unwind, AssertUnwindSafe};
use tokio::sync::{mpsc, oneshot};

type Completer = Box<dyn FnOnce(&Env)>;

/// Status handed to a completer whose worker produced no output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("background work did not complete")]
pub struct WorkFailed;

pub struct Env {
    runtime: tokio::runtime::Runtime,
    done_tx: mpsc::UnboundedSender<u64>,
    done_rx: RefCell<mpsc::UnboundedReceiver<u64>>,
    /// Completers of queued work, keyed by work id.
    pending: RefCell<HashMap<u64, Completer>>,
    /// Reserved plus queued work; bounded by `max_pending`.
    in_flight: Cell<usize>,
    next_id: Cell<u64>,
    max_pending: usize,
}

/// A reserved slot in the work queue. Queuing cannot fail once held.
pub struct WorkTicket<'env> {
    env: &'env Env,
    id: u64,
    name: &'static str,
    queued: bool,
}

impl Env {
    pub fn new(config: &CoordinatorConfig) -> Result<Self, OcrError> {
        config.validate()?;

        let runtime = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(1)
            .max_blocking_threads(config.worker_threads)
            .thread_name("ocr-worker")
            .build()
            .map_err(|e| OcrError::Config(format!("failed to start worker pool: {}", e)))?;
        let (done_tx, done_rx) = mpsc::unbounded_channel();

        log::info!(
            "[HOST] Worker pool ready: {} threads, up to {} pending jobs",
            config.worker_threads,
            config.max_pending_jobs
        );

        Ok(Self {
            runtime,
            done_tx,
            done_rx: RefCell::new(done_rx),
            pending: RefCell::new(HashMap::new()),
            in_flight: Cell::new(0),
            next_id: Cell::new(1),
            max_pending: config.max_pending_jobs,
        })
    }

    /// Reserve a queue slot for work called `name`.
    pub fn reserve_work(&self, name: &'static str) -> Result<WorkTicket<'_>, OcrError> {
        if self.in_flight.get() >= self.max_pending {
            log::warn!(
                "[HOST] Refusing '{}': {} jobs already in flight",
                name,
                self.in_flight.get()
            );
            return Err(OcrError::Dispatch("Failed to queue async work".to_string()));
        }

        let id = self.next_id.get();
        self.next_id.set(id + 1);
        self.in_flight.set(self.in_flight.get() + 1);

        Ok(WorkTicket {
            env: self,
            id,
            name,
            queued: false,
        })
    }

    /// Number of queued work items whose completer has not run yet.
    pub fn pending_work(&self) -> usize {
        self.pending.borrow().len()
    }

    /// Run every completion that is ready, without blocking.
    pub fn tick(&self) -> usize {
        let mut ran = 0;
        loop {
            let next = self.done_rx.borrow_mut().try_recv();
            match next {
                Ok(id) => {
                    self.complete(id);
                    ran += 1;
                }
                Err(_) => break,
            }
        }
        ran
    }

    /// Block until all queued work has completed on this thread.
    pub fn run_until_idle(&self) {
        while self.pending_work() > 0 {
            if !self.wait_one() {
                break;
            }
        }
    }

    /// Drive the loop until `promise` settles and return its outcome.
    pub fn block_on(&self, promise: &Promise) -> Result<HostValue, HostError> {
        loop {
            if let Some(outcome) = promise.outcome() {
                return outcome;
            }
            if self.pending_work() == 0 || !self.wait_one() {
                return Err(HostError::error(UNKNOWN_ERROR));
            }
        }
    }

    fn wait_one(&self) -> bool {
        let next = self.done_rx.borrow_mut().blocking_recv();
        match next {
            Some(id) => {
                self.complete(id);
                true
            }
            None => false,
        }
    }

    fn complete(&self, id: u64) {
        let completer = self.pending.borrow_mut().remove(&id);
        match completer {
            Some(completer) => {
                self.in_flight.set(self.in_flight.get().saturating_sub(1));
                completer(self);
            }
            None => log::error!("[HOST] Completion for unknown work #{}", id),
        }
    }
}

impl WorkTicket<'_> {
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Queue the two halves of the work. `execute` borrows `payload` on a
    /// background thread and must not touch host values. `complete` runs on
    /// the host thread and always gets `payload` back, with the worker's
    /// output or `WorkFailed` if it panicked.
    pub fn queue<P, T, E, C>(mut self, payload: P, execute: E, complete: C)
    where
        P: Send + 'static,
        T: Send + 'static,
        E: FnOnce(&P) -> T + Send + 'static,
        C: FnOnce(&Env, P, Result<T, WorkFailed>) + 'static,
    {
        let (out_tx, mut out_rx) = oneshot::channel::<(P, Result<T, WorkFailed>)>();
        let id = self.id;
        let name = self.name;

        self.env.pending.borrow_mut().insert(
            id,
            Box::new(move |env: &Env| match out_rx.try_recv() {
                Ok((payload, status)) => complete(env, payload, status),
                Err(_) => log::error!("[HOST] Work '{}' #{} returned nothing", name, id),
            }),
        );

        let done_tx = self.env.done_tx.clone();
        self.env.runtime.spawn_blocking(move || {
            let status = catch_unwind(AssertUnwindSafe(|| execute(&payload))).map_err(|_| {
                log::error!("[HOST] Work '{}' #{} panicked", name, id);
                WorkFailed
            });
            let _ = out_tx.send((payload, status));
            let _ = done_tx.send(id);
        });

        log::debug!("[HOST] Queued '{}' #{}", name, id);
        self.queued = true;
    }
}

impl Drop for WorkTicket<'_> {
    fn drop(&mut self) {
        if !self.queued {
            self.env
                .in_flight
                .set(self.env.in_flight.get().saturating_sub(1));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::create_promise;
    use std::rc::Rc;
    use std::sync::{Arc, Mutex};
    use std::thread::ThreadId;

    fn env_with(max_pending: usize) -> Env {
        Env::new(&CoordinatorConfig {
            worker_threads: 2,
            max_pending_jobs: max_pending,
            warm_up: false,
        })
        .unwrap()
    }

    /// Records the thread it was dropped on.
    struct DropProbe(Arc<Mutex<Option<ThreadId>>>);

    impl Drop for DropProbe {
        fn drop(&mut self) {
            if let Ok(mut slot) = self.0.lock() {
                *slot = Some(std::thread::current().id());
            }
        }
    }

    #[test]
    fn output_reaches_completer_on_host_thread() {
        let env = env_with(4);
        let host_thread = std::thread::current().id();
        let seen = Rc::new(Cell::new(0));
        let seen_in_complete = seen.clone();

        let ticket = env.reserve_work("Test").unwrap();
        ticket.queue(
            21,
            |n: &u32| n * 2,
            move |_env, payload, status| {
                assert_eq!(std::thread::current().id(), host_thread);
                assert_eq!(payload, 21);
                seen_in_complete.set(status.unwrap());
            },
        );

        env.run_until_idle();
        assert_eq!(seen.get(), 42);
        assert_eq!(env.pending_work(), 0);
    }

    #[test]
    fn panicking_worker_reports_failure() {
        let env = env_with(4);
        let (deferred, promise) = create_promise();

        env.reserve_work("Test").unwrap().queue(
            (),
            |_: &()| -> u32 { panic!("worker blew up") },
            move |_env, _payload, status| match status {
                Ok(_) => deferred.resolve(HostValue::Null),
                Err(WorkFailed) => deferred.reject(HostError::error(UNKNOWN_ERROR)),
            },
        );

        assert_eq!(env.block_on(&promise), Err(HostError::error(UNKNOWN_ERROR)));
    }

    #[test]
    fn payload_is_dropped_on_host_thread() {
        let env = env_with(4);
        let host_thread = std::thread::current().id();

        for panics in [false, true] {
            let dropped_on = Arc::new(Mutex::new(None));
            env.reserve_work("Test").unwrap().queue(
                DropProbe(dropped_on.clone()),
                move |_: &DropProbe| {
                    if panics {
                        panic!("worker blew up");
                    }
                },
                |_env, payload, _status| drop(payload),
            );

            env.run_until_idle();
            assert_eq!(*dropped_on.lock().unwrap(), Some(host_thread));
        }
    }

    #[test]
    fn reservation_is_bounded_and_released() {
        let env = env_with(1);
        let ticket = env.reserve_work("Test").unwrap();
        assert!(matches!(env.reserve_work("Test"), Err(OcrError::Dispatch(_))));
        drop(ticket);
        assert!(env.reserve_work("Test").is_ok());
    }

    #[test]
    fn tick_without_work_runs_nothing() {
        let env = env_with(1);
        assert_eq!(env.tick(), 0);
    }
}
