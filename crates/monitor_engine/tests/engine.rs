use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use chrono::{DateTime, TimeZone, Utc};
use monitor_engine::{
    Clock, EngineEvent, EngineHandle, GatewayError, JobGateway, JobId, JobRecord, JobState,
};
use pretty_assertions::assert_eq;
use tokio::sync::mpsc::UnboundedReceiver;
use tokio::time::sleep;

/// Gateway that replays scripted fetch results and records cancel calls.
#[derive(Default)]
struct ScriptedGateway {
    fetches: Mutex<VecDeque<Result<JobRecord, GatewayError>>>,
    fetch_calls: AtomicUsize,
    cancel_result: Mutex<Option<Result<(), GatewayError>>>,
    cancelled: Mutex<Vec<JobId>>,
}

impl ScriptedGateway {
    fn with_fetches(fetches: Vec<Result<JobRecord, GatewayError>>) -> Arc<Self> {
        Arc::new(Self {
            fetches: Mutex::new(fetches.into()),
            ..Self::default()
        })
    }
}

#[async_trait::async_trait]
impl JobGateway for ScriptedGateway {
    async fn fetch_job(&self, job_id: JobId) -> Result<JobRecord, GatewayError> {
        self.fetch_calls.fetch_add(1, Ordering::SeqCst);
        self.fetches
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(Ok(JobRecord::new(job_id, JobState::Running)))
    }

    async fn cancel_job(&self, job_id: JobId) -> Result<(), GatewayError> {
        self.cancelled.lock().unwrap().push(job_id);
        self.cancel_result.lock().unwrap().clone().unwrap_or(Ok(()))
    }
}

fn fixed_time() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).unwrap()
}

fn fixed_clock() -> Clock {
    Arc::new(fixed_time)
}

fn engine_with(gateway: Arc<ScriptedGateway>) -> (EngineHandle, UnboundedReceiver<EngineEvent>) {
    engine_logging::initialize_for_tests();
    EngineHandle::new(gateway, tokio::runtime::Handle::current(), fixed_clock())
}

fn drain(rx: &mut UnboundedReceiver<EngineEvent>) -> Vec<EngineEvent> {
    let mut events = Vec::new();
    while let Ok(event) = rx.try_recv() {
        events.push(event);
    }
    events
}

#[tokio::test(start_paused = true)]
async fn fetch_reports_result_with_observation_time() {
    let gateway = ScriptedGateway::with_fetches(vec![Err(GatewayError::NotFound(4))]);
    let (engine, mut rx) = engine_with(gateway);

    engine.fetch_job(4);

    let event = rx.recv().await.expect("event");
    assert_eq!(
        event,
        EngineEvent::JobFetched {
            job_id: 4,
            result: Err(GatewayError::NotFound(4)),
            observed_at: fixed_time(),
        }
    );
}

#[tokio::test(start_paused = true)]
async fn failed_ticks_are_swallowed_and_polling_continues() {
    let gateway = ScriptedGateway::with_fetches(vec![
        Err(GatewayError::Network("connection reset".to_string())),
        Ok(JobRecord {
            progress: 25.0,
            ..JobRecord::new(1, JobState::Running)
        }),
    ]);
    let (engine, mut rx) = engine_with(gateway.clone());

    engine.start_polling(1, Duration::from_millis(100));
    sleep(Duration::from_millis(250)).await;
    engine.stop_polling();

    let events = drain(&mut rx);
    assert_eq!(
        events,
        vec![EngineEvent::PollResolved {
            tick: 2,
            job: JobRecord {
                progress: 25.0,
                ..JobRecord::new(1, JobState::Running)
            },
            observed_at: fixed_time(),
        }]
    );
    assert_eq!(gateway.fetch_calls.load(Ordering::SeqCst), 2);
}

#[tokio::test(start_paused = true)]
async fn permanent_tick_failures_do_not_stop_the_loop() {
    let gateway = ScriptedGateway::with_fetches(vec![
        Err(GatewayError::NotFound(1)),
        Err(GatewayError::HttpStatus(502)),
        Ok(JobRecord::new(1, JobState::Completed)),
    ]);
    let (engine, mut rx) = engine_with(gateway.clone());

    engine.start_polling(1, Duration::from_millis(100));
    sleep(Duration::from_millis(350)).await;
    assert!(engine.is_polling());
    engine.stop_polling();

    let events = drain(&mut rx);
    assert_eq!(
        events,
        vec![EngineEvent::PollResolved {
            tick: 3,
            job: JobRecord::new(1, JobState::Completed),
            observed_at: fixed_time(),
        }]
    );
}

#[tokio::test(start_paused = true)]
async fn stop_polling_is_idempotent() {
    let gateway = ScriptedGateway::with_fetches(Vec::new());
    let (engine, mut rx) = engine_with(gateway.clone());

    engine.start_polling(1, Duration::from_millis(100));
    assert!(engine.is_polling());
    sleep(Duration::from_millis(150)).await;
    engine.stop_polling();
    engine.stop_polling();
    assert!(!engine.is_polling());

    let calls = gateway.fetch_calls.load(Ordering::SeqCst);
    sleep(Duration::from_secs(1)).await;
    assert_eq!(gateway.fetch_calls.load(Ordering::SeqCst), calls);
    assert_eq!(drain(&mut rx).len(), 1);
}

#[tokio::test(start_paused = true)]
async fn restarting_polling_replaces_the_previous_loop() {
    let gateway = ScriptedGateway::with_fetches(Vec::new());
    let (engine, mut rx) = engine_with(gateway.clone());

    engine.start_polling(1, Duration::from_millis(100));
    engine.start_polling(1, Duration::from_millis(100));
    sleep(Duration::from_millis(150)).await;
    engine.stop_polling();

    assert_eq!(gateway.fetch_calls.load(Ordering::SeqCst), 1);
    assert_eq!(drain(&mut rx).len(), 1);
}

#[tokio::test(start_paused = true)]
async fn cancel_reports_gateway_outcome() {
    let gateway = ScriptedGateway::with_fetches(Vec::new());
    *gateway.cancel_result.lock().unwrap() = Some(Err(GatewayError::Conflict(3)));
    let (engine, mut rx) = engine_with(gateway.clone());

    engine.cancel_job(3);

    let event = rx.recv().await.expect("event");
    assert_eq!(
        event,
        EngineEvent::CancelFinished {
            job_id: 3,
            result: Err(GatewayError::Conflict(3)),
        }
    );
    assert_eq!(*gateway.cancelled.lock().unwrap(), vec![3]);
}

#[tokio::test(start_paused = true)]
async fn navigation_fires_after_delay() {
    let (engine, mut rx) = engine_with(ScriptedGateway::with_fetches(Vec::new()));

    engine.schedule_navigation(Duration::from_millis(2_000));

    sleep(Duration::from_millis(1_900)).await;
    assert!(drain(&mut rx).is_empty());
    sleep(Duration::from_millis(200)).await;
    assert_eq!(drain(&mut rx), vec![EngineEvent::NavigationDue]);
}

#[tokio::test(start_paused = true)]
async fn shutdown_abandons_timers_and_polling() {
    let gateway = ScriptedGateway::with_fetches(Vec::new());
    let (engine, mut rx) = engine_with(gateway.clone());

    engine.start_polling(1, Duration::from_millis(100));
    engine.schedule_navigation(Duration::from_millis(500));
    engine.shutdown();
    engine.start_polling(1, Duration::from_millis(100));

    sleep(Duration::from_secs(2)).await;
    assert!(drain(&mut rx).is_empty());
    assert_eq!(gateway.fetch_calls.load(Ordering::SeqCst), 0);
    assert!(!engine.is_polling());
}
