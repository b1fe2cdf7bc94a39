use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::time::Instant;
use waystone::{operation_fn, AttemptError, Endpoint, FnOperation};

/// How a scripted endpoint answers.
#[derive(Clone, Debug)]
#[allow(dead_code)]
pub enum Behavior {
    Succeed(&'static str),
    Fail,
    /// Never answers; only the per-attempt timeout ends it.
    Hang,
    SucceedAfter(&'static str, Duration),
}

/// Per-endpoint call counters and a log of when each call started.
#[derive(Clone, Default)]
pub struct CallLog {
    counts: Arc<Vec<AtomicUsize>>,
    starts: Arc<Mutex<Vec<(usize, Instant)>>>,
}

#[allow(dead_code)]
impl CallLog {
    pub fn new(endpoints: usize) -> Self {
        Self {
            counts: Arc::new((0..endpoints).map(|_| AtomicUsize::new(0)).collect()),
            starts: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn calls(&self, index: usize) -> usize {
        self.counts[index].load(Ordering::SeqCst)
    }

    pub fn total(&self) -> usize {
        self.counts.iter().map(|c| c.load(Ordering::SeqCst)).sum()
    }

    pub fn starts(&self) -> Vec<(usize, Instant)> {
        self.starts.lock().unwrap().clone()
    }

    fn record(&self, index: usize) {
        self.counts[index].fetch_add(1, Ordering::SeqCst);
        self.starts.lock().unwrap().push((index, Instant::now()));
    }
}

/// Operation whose per-endpoint behavior is read from `script` on every call,
/// so tests can change it between calls.
pub fn scripted(
    log: &CallLog,
    script: Arc<Mutex<Vec<Behavior>>>,
) -> FnOperation<impl Fn(Endpoint) -> waystone::AttemptFuture<&'static str> + Send + Sync + 'static>
{
    let log = log.clone();
    operation_fn("scripted", move |ep: Endpoint| {
        log.record(ep.index());
        let behavior = script.lock().unwrap()[ep.index()].clone();
        let fut: waystone::AttemptFuture<&'static str> = Box::pin(async move {
            match behavior {
                Behavior::Succeed(v) => Ok(v),
                Behavior::Fail => Err(AttemptError::Transport("connection refused".into())),
                Behavior::Hang => {
                    std::future::pending::<()>().await;
                    Err(AttemptError::Transport("unreachable".into()))
                }
                Behavior::SucceedAfter(v, delay) => {
                    tokio::time::sleep(delay).await;
                    Ok(v)
                }
            }
        });
        fut
    })
}

#[allow(dead_code)]
pub fn script(behaviors: Vec<Behavior>) -> Arc<Mutex<Vec<Behavior>>> {
    Arc::new(Mutex::new(behaviors))
}
