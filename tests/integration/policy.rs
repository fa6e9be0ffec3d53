use crate::utils::Flaky;
use recur::clock::ManualClock;
use recur::policy::DEFAULT_MAX_RETRY_DURATION;
use recur::{Error, MaxRetryDurationPolicy, RetryExecution, RetryPolicy, RetryPolicyExt};
use std::time::Duration;

#[test]
fn default_policy_scenario() {
    let _ = env_logger::try_init();
    let clock = ManualClock::new();
    let policy =
        MaxRetryDurationPolicy::with_clock(DEFAULT_MAX_RETRY_DURATION, clock.clone()).unwrap();

    let mut execution = policy.start();
    clock.advance(Duration::from_secs(1));
    assert!(execution.should_retry(&Flaky::Unavailable));

    clock.advance(Duration::from_millis(2500));
    assert!(!execution.should_retry(&Flaky::Unavailable));
}

#[test]
fn failure_reason_is_ignored() {
    let _ = env_logger::try_init();
    let clock = ManualClock::new();
    let policy =
        MaxRetryDurationPolicy::with_clock(Duration::from_millis(10), clock.clone()).unwrap();
    let mut execution = policy.start();

    assert!(execution.should_retry(&Flaky::Unavailable));
    assert!(execution.should_retry(&Flaky::BadInput));

    clock.advance(Duration::from_millis(11));
    assert!(!execution.should_retry(&Flaky::Unavailable));
    assert!(!execution.should_retry(&Flaky::BadInput));
}

#[test]
fn rejected_update_is_not_applied() {
    let _ = env_logger::try_init();
    let mut policy = MaxRetryDurationPolicy::default();
    assert!(matches!(
        policy.set_max_retry_duration(Duration::from_secs(0)),
        Err(Error::InvalidConfiguration(_))
    ));
    assert_eq!(policy.max_retry_duration(), DEFAULT_MAX_RETRY_DURATION);
}

#[test]
fn policy_is_shareable_across_threads() {
    let _ = env_logger::try_init();
    let policy = std::sync::Arc::new(MaxRetryDurationPolicy::default());
    let handles: Vec<_> = (0..4)
        .map(|_| {
            let policy = policy.clone();
            std::thread::spawn(move || policy.start().should_retry(&Flaky::Unavailable))
        })
        .collect();
    for handle in handles {
        assert!(handle.join().unwrap());
    }
}

#[test]
fn filtered_duration_policy() {
    let _ = env_logger::try_init();
    let policy = MaxRetryDurationPolicy::default()
        .retry_if(|failure| failure.downcast_ref::<Flaky>() == Some(&Flaky::Unavailable));
    let mut execution = policy.start();
    assert!(execution.should_retry(&Flaky::Unavailable));
    assert!(!execution.should_retry(&Flaky::BadInput));
}
