//! The scheduling engine: per-minute window polling plus the inner run loop.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use chrono::{Local, Timelike};
use tokio::time::{interval, sleep};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, warn};

use cadence_core::{ClockTime, Config, Delay, Schedule};

use crate::error::{EngineError, Result};
use crate::task::Task;

/// Recurring-task execution engine.
///
/// Owns the live [`Schedule`] and the lifecycle of one `start`…`shutdown`
/// session. Cheap to clone; clones share the same state.
#[derive(Clone)]
pub struct Engine {
    shared: Arc<Shared>,
}

struct Shared {
    /// Live schedule cell: swap-whole-`Arc` on write, clone on read, so
    /// readers never observe a partially updated schedule.
    schedule: Mutex<Arc<Schedule>>,
    /// Shutdown signal for the current polling session. `None` until the
    /// first `start`; replaced with a fresh token on every `start`.
    stop: Mutex<Option<CancellationToken>>,
}

impl Shared {
    fn schedule(&self) -> Arc<Schedule> {
        self.schedule.lock().unwrap().clone()
    }
}

/// The single window currently executing.
///
/// Lives on the polling loop's stack: only that loop reads or writes it, so
/// it needs no lock, and run-loop tasks never touch it.
struct ActiveWindow {
    start: ClockTime,
    cancel: CancellationToken,
}

impl Engine {
    /// Build an engine with `config` validated and installed.
    pub fn new(config: Config) -> Result<Self> {
        let schedule = config.resolve()?;
        Ok(Self {
            shared: Arc::new(Shared {
                schedule: Mutex::new(Arc::new(schedule)),
                stop: Mutex::new(None),
            }),
        })
    }

    /// Replace the live configuration.
    ///
    /// `None` leaves the current schedule in place and reports success. A
    /// rejected config (any unparseable window) leaves the previous schedule
    /// fully intact. On success the swap is atomic: the polling loop and an
    /// in-flight run loop pick the new values up at their next read, never a
    /// mix of old and new.
    pub fn set_config(&self, config: Option<Config>) -> Result<()> {
        let Some(config) = config else {
            return Ok(());
        };
        let schedule = Arc::new(config.resolve()?);
        *self.shared.schedule.lock().unwrap() = schedule;
        Ok(())
    }

    /// Snapshot of the currently installed schedule.
    pub fn schedule(&self) -> Arc<Schedule> {
        self.shared.schedule()
    }

    /// Signal the current polling session to stop.
    ///
    /// Idempotent and safe at any time: before `start` has ever run it is a
    /// no-op, and repeated calls re-cancel an already-cancelled token.
    /// Returns immediately; it does not wait for teardown.
    ///
    /// Only the window-polling mode listens for this signal. An engine
    /// running continuously (no windows configured) stops when the token
    /// passed to [`Engine::start`] is cancelled.
    pub fn shutdown(&self) {
        match self.shared.stop.lock().unwrap().as_ref() {
            Some(token) => token.cancel(),
            None => debug!("shutdown requested but no session has started"),
        }
    }

    /// Run `task` under the installed schedule until stopped.
    ///
    /// Blocks (asynchronously) until the session is shut down, the task
    /// terminates per the delay policy, or `cancel` was already cancelled.
    /// With no windows configured the task loop runs for the whole session;
    /// otherwise window membership is re-evaluated once per minute and the
    /// task runs only inside the active window.
    pub async fn start(&self, cancel: CancellationToken, task: Arc<dyn Task>) -> Result<()> {
        let stop = CancellationToken::new();
        *self.shared.stop.lock().unwrap() = Some(stop.clone());

        // The polling loop compares hour/minute once per minute, so the
        // first scheduling decision must land exactly on a minute boundary
        // or every window edge would be detected up to 59 seconds late.
        loop {
            let second = Local::now().second();
            if second == 0 {
                break;
            }
            let wait = 60 - second;
            warn!(
                task = %self.schedule().name,
                wait_secs = wait,
                "not on a minute boundary; delaying the first scheduling decision"
            );
            tokio::select! {
                _ = stop.cancelled() => return Ok(()),
                _ = sleep(Duration::from_secs(u64::from(wait))) => {}
            }
        }

        if self.schedule().windows.is_empty() {
            return run_loop(&self.shared, &cancel, task.as_ref()).await;
        }
        self.poll_windows(cancel, stop, task).await
    }

    /// Outer scheduling loop: tick once per minute, activating and
    /// deactivating windows against the live schedule.
    async fn poll_windows(
        &self,
        cancel: CancellationToken,
        stop: CancellationToken,
        task: Arc<dyn Task>,
    ) -> Result<()> {
        let mut active: Option<ActiveWindow> = None;
        let mut ticker = interval(Duration::from_secs(60));
        // An interval's first tick completes immediately; consume it so the
        // loop below waits a full minute between evaluations.
        ticker.tick().await;

        loop {
            let schedule = self.shared.schedule();
            if active.is_none() {
                debug!(task = %schedule.name, "scanning time windows");
            }
            let now = Local::now();
            let now = ClockTime {
                hour: now.hour() as u8,
                minute: now.minute() as u8,
            };

            for window in &schedule.windows {
                // While a window is executing, only that window is eligible
                // for evaluation; the rest wait until the slot clears.
                if let Some(current) = &active {
                    if current.start != window.start {
                        continue;
                    }
                }

                let status = window.status_at(now);
                if status.started && !status.ended && active.is_none() {
                    let token = cancel.child_token();
                    active = Some(ActiveWindow {
                        start: window.start,
                        cancel: token.clone(),
                    });
                    debug!(task = %schedule.name, window = %window, "window open; starting run loop");

                    let shared = Arc::clone(&self.shared);
                    let task = Arc::clone(&task);
                    let name = schedule.name.clone();
                    tokio::spawn(async move {
                        match run_loop(&shared, &token, task.as_ref()).await {
                            Ok(()) => {}
                            Err(EngineError::Cancelled) => {
                                debug!(task = %name, "window closed; run loop cancelled");
                            }
                            Err(err) => {
                                error!(task = %name, error = %err, "window run ended with error");
                            }
                        }
                        debug!(task = %name, "window execution finished; waiting for the next window");
                    });
                    break;
                }
                if status.started && status.ended {
                    if let Some(current) = active.take() {
                        current.cancel.cancel();
                    }
                }
            }

            tokio::select! {
                _ = stop.cancelled() => {
                    if let Some(current) = active.take() {
                        current.cancel.cancel();
                    }
                    debug!(task = %self.shared.schedule().name, "engine stopped");
                    return Ok(());
                }
                _ = ticker.tick() => {}
            }
        }
    }
}

/// Inner run loop: repeat `task`, applying the success/failure delay policy,
/// until cancelled or the policy says stop.
///
/// Cancellation is observed at iteration boundaries only: a sleep already in
/// progress when `cancel` fires completes before the loop notices.
async fn run_loop(shared: &Shared, cancel: &CancellationToken, task: &dyn Task) -> Result<()> {
    let mut schedule = shared.schedule();
    loop {
        if cancel.is_cancelled() {
            return Err(EngineError::Cancelled);
        }

        if let Err(err) = task.run(cancel.clone()).await {
            match schedule.on_failure {
                Delay::Stop => return Err(EngineError::Task(err)),
                Delay::After(delay) => {
                    error!(task = %schedule.name, error = %err, "task failed");
                    warn!(
                        task = %schedule.name,
                        delay_ms = delay.as_millis() as u64,
                        "retrying after the failure delay"
                    );
                    sleep(delay).await;
                }
            }
            continue;
        }

        // Re-read the live schedule so delay changes made while the task ran
        // apply to this decision, not the next one.
        schedule = shared.schedule();
        match schedule.on_success {
            Delay::Stop => return Ok(()),
            Delay::After(delay) => {
                debug!(
                    task = %schedule.name,
                    delay_ms = delay.as_millis() as u64,
                    "task succeeded; sleeping before the next run"
                );
                sleep(delay).await;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Instant;

    use cadence_core::WindowSpec;
    use tokio::time::timeout;

    use super::*;
    use crate::task::TaskFn;

    fn continuous(success_delay_ms: i64, failure_delay_ms: i64) -> Config {
        Config {
            name: "test".to_string(),
            windows: Vec::new(),
            success_delay_ms,
            failure_delay_ms,
        }
    }

    /// Task that fails its first `failures` runs, then succeeds forever.
    fn counting_task(runs: Arc<AtomicUsize>, failures: usize) -> Arc<dyn Task> {
        Arc::new(TaskFn::new(move |_cancel| {
            let runs = Arc::clone(&runs);
            async move {
                let n = runs.fetch_add(1, Ordering::SeqCst);
                if n < failures {
                    anyhow::bail!("induced failure {n}");
                }
                Ok(())
            }
        }))
    }

    #[tokio::test]
    async fn one_shot_success_runs_exactly_once() {
        let engine = Engine::new(continuous(-1, -1)).unwrap();
        let runs = Arc::new(AtomicUsize::new(0));
        let task = counting_task(Arc::clone(&runs), 0);

        run_loop(&engine.shared, &CancellationToken::new(), task.as_ref())
            .await
            .unwrap();
        assert_eq!(runs.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn retries_through_failures_then_honours_one_shot_success() {
        let engine = Engine::new(continuous(-1, 50)).unwrap();
        let runs = Arc::new(AtomicUsize::new(0));
        let task = counting_task(Arc::clone(&runs), 2);

        let started = Instant::now();
        run_loop(&engine.shared, &CancellationToken::new(), task.as_ref())
            .await
            .unwrap();
        assert_eq!(runs.load(Ordering::SeqCst), 3);
        // Two failure delays of 50ms each were slept through.
        assert!(started.elapsed() >= Duration::from_millis(100));
    }

    #[tokio::test]
    async fn negative_failure_delay_is_fatal() {
        let engine = Engine::new(continuous(-1, -1)).unwrap();
        let runs = Arc::new(AtomicUsize::new(0));
        let task = counting_task(Arc::clone(&runs), usize::MAX);

        let err = run_loop(&engine.shared, &CancellationToken::new(), task.as_ref())
            .await
            .unwrap_err();
        assert!(matches!(err, EngineError::Task(_)));
        assert_eq!(runs.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn already_cancelled_token_skips_the_task() {
        let engine = Engine::new(continuous(-1, -1)).unwrap();
        let runs = Arc::new(AtomicUsize::new(0));
        let task = counting_task(Arc::clone(&runs), 0);

        let token = CancellationToken::new();
        token.cancel();
        let err = run_loop(&engine.shared, &token, task.as_ref())
            .await
            .unwrap_err();
        assert!(matches!(err, EngineError::Cancelled));
        assert_eq!(runs.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn delay_change_is_observed_after_the_next_success() {
        // Success delay starts at 10ms; the task flips it to "stop" during
        // its first run, so the re-read after success ends the loop without
        // a second invocation.
        let engine = Engine::new(continuous(10, -1)).unwrap();
        let runs = Arc::new(AtomicUsize::new(0));
        let swapper = engine.clone();
        let task_runs = Arc::clone(&runs);
        let task: Arc<dyn Task> = Arc::new(TaskFn::new(move |_cancel| {
            let runs = Arc::clone(&task_runs);
            let swapper = swapper.clone();
            async move {
                runs.fetch_add(1, Ordering::SeqCst);
                swapper.set_config(Some(continuous(-1, -1)))?;
                Ok(())
            }
        }));

        run_loop(&engine.shared, &CancellationToken::new(), task.as_ref())
            .await
            .unwrap();
        assert_eq!(runs.load(Ordering::SeqCst), 1);
        assert_eq!(engine.schedule().on_success, Delay::Stop);
    }

    #[test]
    fn rejected_config_leaves_the_previous_schedule_intact() {
        let engine = Engine::new(Config {
            name: "keeper".to_string(),
            windows: vec![WindowSpec {
                start: "09:00".to_string(),
                end: "17:00".to_string(),
            }],
            success_delay_ms: 100,
            failure_delay_ms: 100,
        })
        .unwrap();

        let bad = Config {
            windows: vec![
                WindowSpec {
                    start: "08:00".to_string(),
                    end: "12:00".to_string(),
                },
                WindowSpec {
                    start: "25:00".to_string(),
                    end: "18:00".to_string(),
                },
            ],
            ..Config::default()
        };
        let err = engine.set_config(Some(bad)).unwrap_err();
        assert!(err.to_string().contains("time window 1"), "got: {err}");

        let schedule = engine.schedule();
        assert_eq!(schedule.name, "keeper");
        assert_eq!(schedule.windows.len(), 1);
        assert_eq!(schedule.on_success, Delay::After(Duration::from_millis(100)));
    }

    #[test]
    fn set_config_none_is_a_no_op() {
        let engine = Engine::new(continuous(-1, -1)).unwrap();
        engine.set_config(None).unwrap();
        assert_eq!(engine.schedule().name, "test");
    }

    #[test]
    fn shutdown_without_a_session_is_a_no_op() {
        let engine = Engine::new(Config::default()).unwrap();
        engine.shutdown();
        engine.shutdown();
    }

    #[tokio::test]
    async fn shutdown_stops_a_polling_session_promptly() {
        let engine = Engine::new(Config {
            name: "test".to_string(),
            windows: vec![WindowSpec {
                start: "08:00".to_string(),
                end: "08:00".to_string(),
            }],
            success_delay_ms: 3_600_000,
            failure_delay_ms: 3_600_000,
        })
        .unwrap();
        let runs = Arc::new(AtomicUsize::new(0));
        let task = counting_task(Arc::clone(&runs), 0);

        let session = tokio::spawn({
            let engine = engine.clone();
            async move { engine.start(CancellationToken::new(), task).await }
        });

        // Wait until start() has installed its stop token (it may be inside
        // the minute-alignment wait or the polling select at this point).
        while engine.shared.stop.lock().unwrap().is_none() {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        engine.shutdown();
        engine.shutdown(); // second call mid-session must also be safe

        let result = timeout(Duration::from_secs(5), session)
            .await
            .expect("start did not return after shutdown")
            .unwrap();
        assert!(result.is_ok());
    }
}
