use std::sync::mpsc::{self, Receiver, Sender};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use tracing::{debug, error, trace, warn};

use crate::domain::XVError;
use crate::record::Record;
use crate::store::{DataStore, UploadReceipt};
use crate::upload::SpreadsheetFile;

#[derive(Debug)]
pub enum Request {
    Fetch,
    Upload(SpreadsheetFile),
    Clear,
    ClearSession,
}

impl Request {
    fn name(&self) -> &'static str {
        match self {
            Request::Fetch => "fetch",
            Request::Upload(_) => "upload",
            Request::Clear => "clear",
            Request::ClearSession => "clear session",
        }
    }
}

#[derive(Debug)]
pub enum Outcome {
    Fetched(Vec<Record>),
    Uploaded(UploadReceipt),
    Cleared,
    SessionCleared,
}

/// Result of one request, tagged with the token `submit` returned for it.
#[derive(Debug)]
pub struct Completion {
    pub token: u64,
    pub result: Result<Outcome, XVError>,
}

struct Job {
    token: u64,
    request: Request,
}

/// Runs store calls one after another on a background thread so the UI
/// loop never blocks on the network.
pub struct Worker {
    jobs: Option<Sender<Job>>,
    completions: Receiver<Completion>,
    handle: Option<JoinHandle<()>>,
    next_token: u64,
}

impl Worker {
    pub fn spawn(store: Box<dyn DataStore>) -> Result<Self, XVError> {
        let (job_tx, job_rx) = mpsc::channel::<Job>();
        let (done_tx, done_rx) = mpsc::channel::<Completion>();

        let handle = thread::Builder::new()
            .name("xv-store".to_string())
            .spawn(move || Self::run(store, job_rx, done_tx))?;

        Ok(Worker {
            jobs: Some(job_tx),
            completions: done_rx,
            handle: Some(handle),
            next_token: 1,
        })
    }

    fn run(store: Box<dyn DataStore>, jobs: Receiver<Job>, done: Sender<Completion>) {
        // Ends once the sending side is dropped and the queue is drained.
        for job in jobs.iter() {
            trace!("Worker runs {} #{}", job.request.name(), job.token);
            let result = match job.request {
                Request::Fetch => store.fetch_all().map(Outcome::Fetched),
                Request::Upload(file) => store.upload_file(&file).map(Outcome::Uploaded),
                Request::Clear => store.clear_all().map(|_| Outcome::Cleared),
                Request::ClearSession => store.clear_session().map(|_| Outcome::SessionCleared),
            };
            if let Err(e) = &result {
                debug!("Request #{} failed: {}", job.token, e);
            }
            if done
                .send(Completion {
                    token: job.token,
                    result,
                })
                .is_err()
            {
                // Nobody is listening anymore
                break;
            }
        }
        trace!("Worker stopped");
    }

    /// Queues a request and returns its token.
    pub fn submit(&mut self, request: Request) -> u64 {
        let token = self.next_token;
        self.next_token += 1;
        debug!("Submit {} #{}", request.name(), token);
        match &self.jobs {
            Some(jobs) => {
                if jobs.send(Job { token, request }).is_err() {
                    error!("Worker is gone, request #{} dropped", token);
                }
            }
            None => error!("Worker was shut down, request #{} dropped", token),
        }
        token
    }

    pub fn try_recv(&self) -> Option<Completion> {
        self.completions.try_recv().ok()
    }

    #[cfg(test)]
    pub fn recv_timeout(&self, timeout: Duration) -> Option<Completion> {
        self.completions.recv_timeout(timeout).ok()
    }

    /// Lets queued requests finish for at most `grace`, then joins the
    /// thread. A thread still busy after that is left behind.
    pub fn shutdown(&mut self, grace: Duration) {
        self.jobs.take();
        let Some(handle) = self.handle.take() else {
            return;
        };
        let deadline = Instant::now() + grace;
        while !handle.is_finished() && Instant::now() < deadline {
            thread::sleep(Duration::from_millis(10));
        }
        if !handle.is_finished() {
            warn!("Worker still busy after {}ms, not waiting for it", grace.as_millis());
            return;
        }
        if handle.join().is_err() {
            error!("Worker thread panicked");
        }
    }
}

impl Drop for Worker {
    fn drop(&mut self) {
        self.shutdown(Duration::ZERO);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::Value;
    use crate::store::tests::MemoryStore;

    const WAIT: Duration = Duration::from_secs(5);

    #[test]
    fn completions_carry_their_token() {
        let store = MemoryStore::default();
        store
            .records
            .lock()
            .unwrap()
            .push(Record::new().with("a", Value::Number(1.0)));
        let mut worker = Worker::spawn(Box::new(store)).unwrap();

        let first = worker.submit(Request::Fetch);
        let second = worker.submit(Request::Clear);
        assert!(second > first);

        let c1 = worker.recv_timeout(WAIT).unwrap();
        assert_eq!(c1.token, first);
        assert!(matches!(c1.result, Ok(Outcome::Fetched(ref r)) if r.len() == 1));

        let c2 = worker.recv_timeout(WAIT).unwrap();
        assert_eq!(c2.token, second);
        assert!(matches!(c2.result, Ok(Outcome::Cleared)));
    }

    #[test]
    fn failures_are_reported() {
        let store = MemoryStore::default();
        *store.fail_next.lock().unwrap() = Some(XVError::Network("HTTP 503".into()));
        let mut worker = Worker::spawn(Box::new(store)).unwrap();
        let token = worker.submit(Request::Fetch);
        let completion = worker.recv_timeout(WAIT).unwrap();
        assert_eq!(completion.token, token);
        assert!(matches!(completion.result, Err(XVError::Network(_))));
    }

    #[test]
    fn shutdown_drains_the_queue() {
        let store = MemoryStore::default();
        let calls = store.calls.clone();
        let mut worker = Worker::spawn(Box::new(store)).unwrap();
        worker.submit(Request::ClearSession);
        worker.shutdown(WAIT);
        assert_eq!(*calls.lock().unwrap(), vec!["session"]);
    }

    /// Every call takes `delay`.
    struct SlowStore {
        delay: Duration,
    }

    impl DataStore for SlowStore {
        fn fetch_all(&self) -> Result<Vec<Record>, XVError> {
            thread::sleep(self.delay);
            Ok(Vec::new())
        }

        fn upload_file(&self, _file: &SpreadsheetFile) -> Result<UploadReceipt, XVError> {
            thread::sleep(self.delay);
            Ok(UploadReceipt { rows_processed: 0 })
        }

        fn clear_all(&self) -> Result<(), XVError> {
            thread::sleep(self.delay);
            Ok(())
        }

        fn clear_session(&self) -> Result<(), XVError> {
            thread::sleep(self.delay);
            Ok(())
        }
    }

    #[test]
    fn shutdown_does_not_wait_past_the_grace_period() {
        let mut worker = Worker::spawn(Box::new(SlowStore {
            delay: Duration::from_secs(3),
        }))
        .unwrap();
        worker.submit(Request::Fetch);
        worker.submit(Request::ClearSession);

        let start = Instant::now();
        worker.shutdown(Duration::from_millis(100));
        assert!(start.elapsed() < Duration::from_secs(2));
    }
}
