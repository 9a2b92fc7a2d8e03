use std::sync::Arc;
use std::time::Duration;

use chrono::Local;
use display_control::actuator::DisplayAction;
use display_control::error::DisplayError;
use display_control::scheduler::TurnOffScheduler;
use tokio::time::{sleep, Instant};

use test_harness::{off, test_controller, MockActuator};

const MINUTE: Duration = Duration::from_secs(60);
const HOUR: Duration = Duration::from_secs(60 * 60);

fn test_scheduler(actuator: Arc<MockActuator>) -> TurnOffScheduler {
    TurnOffScheduler::new(Arc::new(test_controller(actuator, "HDMI-A-1,HDMI-A-2")))
}

#[tokio::test(start_paused = true)]
async fn test_query_idle_is_empty() {
    let scheduler = test_scheduler(MockActuator::new());
    assert!(scheduler.query().await.is_none());
    assert!(scheduler.pending().await.is_none());
}

#[tokio::test(start_paused = true)]
async fn test_cancel_idle_is_noop() {
    let actuator = MockActuator::new();
    let scheduler = test_scheduler(actuator.clone());

    assert!(!scheduler.cancel().await);
    assert!(!scheduler.cancel().await);
    assert!(scheduler.query().await.is_none());
    assert!(actuator.calls().is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_query_reports_fire_at() {
    let scheduler = test_scheduler(MockActuator::new());

    let before = Local::now();
    let fire_at = scheduler.schedule(HOUR).await.unwrap();
    let after = Local::now();

    let hour = chrono::Duration::hours(1);
    assert!(fire_at >= before + hour);
    assert!(fire_at <= after + hour);
    assert_eq!(scheduler.query().await, Some(fire_at));

    let (pending_at, remaining) = scheduler.pending().await.unwrap();
    assert_eq!(pending_at, fire_at);
    assert!(remaining <= HOUR);
    assert!(remaining > HOUR - MINUTE);
}

#[tokio::test(start_paused = true)]
async fn test_fires_off_in_reverse_order_and_clears() {
    let actuator = MockActuator::new();
    let scheduler = test_scheduler(actuator.clone());

    scheduler.schedule(Duration::from_secs(5)).await.unwrap();

    sleep(Duration::from_secs(4)).await;
    assert!(actuator.calls().is_empty());
    assert!(scheduler.query().await.is_some());

    sleep(Duration::from_secs(2)).await;
    assert_eq!(
        actuator.sequence(),
        vec![off("HDMI-A-2"), off("HDMI-A-1")]
    );
    assert!(scheduler.query().await.is_none());
}

#[tokio::test(start_paused = true)]
async fn test_second_schedule_supersedes_first() {
    let actuator = MockActuator::new();
    let scheduler = test_scheduler(actuator.clone());
    let started = Instant::now();

    let first = scheduler.schedule(30 * MINUTE).await.unwrap();
    let second = scheduler.schedule(HOUR).await.unwrap();
    assert!(second > first);
    assert_eq!(scheduler.query().await, Some(second));

    sleep(31 * MINUTE).await;
    assert!(actuator.calls().is_empty());
    assert_eq!(scheduler.query().await, Some(second));

    sleep(30 * MINUTE).await;
    let calls = actuator.calls();
    assert_eq!(calls.len(), 2);
    assert!(calls.iter().all(|c| c.action == DisplayAction::Off));
    assert!(calls[0].at - started >= HOUR);
    assert!(scheduler.query().await.is_none());

    sleep(2 * HOUR).await;
    assert_eq!(actuator.calls().len(), 2);
}

#[tokio::test(start_paused = true)]
async fn test_cancel_prevents_fire() {
    let actuator = MockActuator::new();
    let scheduler = test_scheduler(actuator.clone());

    scheduler.schedule(HOUR).await.unwrap();

    sleep(10 * MINUTE).await;
    assert!(scheduler.cancel().await);

    sleep(10 * MINUTE).await;
    assert!(scheduler.query().await.is_none());
    assert!(scheduler.pending().await.is_none());

    sleep(HOUR).await;
    assert!(actuator.calls().is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_fired_job_clears_even_when_off_fails() {
    let actuator = MockActuator::new();
    actuator.fail_device("HDMI-A-2");
    let scheduler = test_scheduler(actuator.clone());

    scheduler.schedule(Duration::from_secs(1)).await.unwrap();
    sleep(Duration::from_secs(3)).await;

    assert_eq!(
        actuator.sequence(),
        vec![off("HDMI-A-2"), off("HDMI-A-1")]
    );
    assert!(scheduler.query().await.is_none());
}

#[tokio::test(start_paused = true)]
async fn test_cancel_after_fire_started_does_not_suppress() {
    let actuator = MockActuator::with_latency(Duration::from_secs(5));
    let scheduler = test_scheduler(actuator.clone());

    scheduler.schedule(Duration::from_secs(1)).await.unwrap();

    // Timer fired at 1s; the first toggle is still running
    sleep(Duration::from_secs(2)).await;
    assert_eq!(actuator.calls().len(), 1);
    assert!(!scheduler.cancel().await);

    sleep(Duration::from_secs(20)).await;
    assert_eq!(
        actuator.sequence(),
        vec![off("HDMI-A-2"), off("HDMI-A-1")]
    );
}

#[tokio::test(start_paused = true)]
async fn test_schedule_while_firing_is_kept() {
    let actuator = MockActuator::with_latency(Duration::from_secs(5));
    let scheduler = test_scheduler(actuator.clone());

    scheduler.schedule(Duration::from_secs(1)).await.unwrap();
    sleep(Duration::from_secs(2)).await;

    let next = scheduler.schedule(HOUR).await.unwrap();

    sleep(Duration::from_secs(20)).await;
    assert_eq!(actuator.calls().len(), 2);
    assert_eq!(scheduler.query().await, Some(next));
}

#[tokio::test(start_paused = true)]
async fn test_concurrent_schedules_arm_one_job() {
    let actuator = MockActuator::new();
    let scheduler = Arc::new(test_scheduler(actuator.clone()));

    let a = tokio::spawn({
        let scheduler = scheduler.clone();
        async move { scheduler.schedule(10 * MINUTE).await.unwrap() }
    });
    let b = tokio::spawn({
        let scheduler = scheduler.clone();
        async move { scheduler.schedule(20 * MINUTE).await.unwrap() }
    });
    let (a, b) = (a.await.unwrap(), b.await.unwrap());

    let armed = scheduler.query().await.unwrap();
    assert!(armed == a || armed == b);
    assert_eq!(scheduler.query().await, Some(armed));

    sleep(HOUR).await;
    assert_eq!(actuator.count(DisplayAction::Off), 2);
    assert!(scheduler.query().await.is_none());
}

#[tokio::test(start_paused = true)]
async fn test_out_of_range_delay_is_rejected() {
    let scheduler = test_scheduler(MockActuator::new());

    let armed = scheduler.schedule(HOUR).await.unwrap();
    let err = scheduler.schedule(Duration::MAX).await.unwrap_err();

    assert!(matches!(err, DisplayError::ScheduleOutOfRange(_)));
    assert_eq!(scheduler.query().await, Some(armed));
}

#[tokio::test(start_paused = true)]
async fn test_shutdown_discards_pending_job() {
    let actuator = MockActuator::new();
    let scheduler = test_scheduler(actuator.clone());

    scheduler.schedule(MINUTE).await.unwrap();
    scheduler.shutdown().await;
    assert!(scheduler.query().await.is_none());

    sleep(2 * MINUTE).await;
    assert!(actuator.calls().is_empty());
}
