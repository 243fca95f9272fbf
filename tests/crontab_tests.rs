// End-to-end crontab behavior against the real wall clock

use crontab::{Crontab, Granularity};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::time::sleep;
use tracing_subscriber::EnvFilter;

/// Install a test subscriber once; later calls are no-ops.
fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .try_init();
}

#[tokio::test(flavor = "multi_thread")]
async fn test_every_second_job_fires_three_times_in_three_seconds() {
    init_tracing();
    let cron = Crontab::new(Granularity::Second);

    let plain_runs = Arc::new(AtomicUsize::new(0));
    {
        let plain_runs = Arc::clone(&plain_runs);
        cron.add("counter", "* * * * * *", move || {
            let plain_runs = Arc::clone(&plain_runs);
            async move {
                plain_runs.fetch_add(1, Ordering::SeqCst);
                Ok(())
            }
        })
        .await
        .unwrap();
    }

    // The second job binds a String argument by capturing it; each run
    // must see the same value.
    let bound = "whatever".to_string();
    let bound_runs = Arc::new(AtomicUsize::new(0));
    let delivered = Arc::new(Mutex::new(String::new()));
    {
        let bound_runs = Arc::clone(&bound_runs);
        let delivered = Arc::clone(&delivered);
        cron.add("counter-with-arg", "* * * * * *", move || {
            let bound_runs = Arc::clone(&bound_runs);
            let delivered = Arc::clone(&delivered);
            let bound = bound.clone();
            async move {
                bound_runs.fetch_add(1, Ordering::SeqCst);
                *delivered.lock().unwrap() = bound;
                Ok(())
            }
        })
        .await
        .unwrap();
    }

    sleep(Duration::from_millis(3100)).await;

    assert_eq!(plain_runs.load(Ordering::SeqCst), 3);
    assert_eq!(bound_runs.load(Ordering::SeqCst), 3);
    assert_eq!(delivered.lock().unwrap().as_str(), "whatever");
}

#[tokio::test(flavor = "multi_thread")]
async fn test_run_dispatches_all_jobs_once_per_call() {
    init_tracing();
    // Minute granularity: no tick can land during this test, so only
    // run() dispatches anything.
    let cron = Crontab::new(Granularity::Minute);

    let first_runs = Arc::new(AtomicUsize::new(0));
    {
        let first_runs = Arc::clone(&first_runs);
        cron.add("first", "*/5 * * * *", move || {
            let first_runs = Arc::clone(&first_runs);
            async move {
                first_runs.fetch_add(1, Ordering::SeqCst);
                Ok(())
            }
        })
        .await
        .unwrap();
    }

    let second_runs = Arc::new(AtomicUsize::new(0));
    {
        let second_runs = Arc::clone(&second_runs);
        cron.add("second", "30 4 * * 2", move || {
            let second_runs = Arc::clone(&second_runs);
            async move {
                second_runs.fetch_add(1, Ordering::SeqCst);
                Ok(())
            }
        })
        .await
        .unwrap();
    }

    cron.run().await;
    sleep(Duration::from_millis(100)).await;
    assert_eq!(first_runs.load(Ordering::SeqCst), 1);
    assert_eq!(second_runs.load(Ordering::SeqCst), 1);

    cron.run().await;
    sleep(Duration::from_millis(100)).await;
    assert_eq!(first_runs.load(Ordering::SeqCst), 2);
    assert_eq!(second_runs.load(Ordering::SeqCst), 2);
}

#[tokio::test(flavor = "multi_thread")]
async fn test_run_after_stop_dispatches_nothing() {
    init_tracing();
    let cron = Crontab::new(Granularity::Minute);

    let runs = Arc::new(AtomicUsize::new(0));
    {
        let runs = Arc::clone(&runs);
        cron.add("job", "*/5 * * * *", move || {
            let runs = Arc::clone(&runs);
            async move {
                runs.fetch_add(1, Ordering::SeqCst);
                Ok(())
            }
        })
        .await
        .unwrap();
    }

    cron.run().await;
    sleep(Duration::from_millis(100)).await;
    assert_eq!(runs.load(Ordering::SeqCst), 1);

    cron.stop().await;
    cron.run().await;
    sleep(Duration::from_millis(100)).await;
    assert_eq!(runs.load(Ordering::SeqCst), 1);

    // New registrations are picked up again after a stop.
    {
        let runs = Arc::clone(&runs);
        cron.add("job", "*/5 * * * *", move || {
            let runs = Arc::clone(&runs);
            async move {
                runs.fetch_add(1, Ordering::SeqCst);
                Ok(())
            }
        })
        .await
        .unwrap();
    }
    cron.run().await;
    sleep(Duration::from_millis(100)).await;
    assert_eq!(runs.load(Ordering::SeqCst), 2);
}

#[tokio::test(flavor = "multi_thread")]
async fn test_failing_jobs_do_not_stop_the_loop_or_siblings() {
    init_tracing();
    let cron = Crontab::new(Granularity::Second);

    let panic_attempts = Arc::new(AtomicUsize::new(0));
    {
        let panic_attempts = Arc::clone(&panic_attempts);
        cron.add("explodes", "* * * * * *", move || {
            let panic_attempts = Arc::clone(&panic_attempts);
            async move {
                panic_attempts.fetch_add(1, Ordering::SeqCst);
                panic!("boom");
            }
        })
        .await
        .unwrap();
    }

    let error_attempts = Arc::new(AtomicUsize::new(0));
    {
        let error_attempts = Arc::clone(&error_attempts);
        cron.add("fails", "* * * * * *", move || {
            let error_attempts = Arc::clone(&error_attempts);
            async move {
                error_attempts.fetch_add(1, Ordering::SeqCst);
                Err(anyhow::anyhow!("nope"))
            }
        })
        .await
        .unwrap();
    }

    let survivor_runs = Arc::new(AtomicUsize::new(0));
    {
        let survivor_runs = Arc::clone(&survivor_runs);
        cron.add("survivor", "* * * * * *", move || {
            let survivor_runs = Arc::clone(&survivor_runs);
            async move {
                survivor_runs.fetch_add(1, Ordering::SeqCst);
                Ok(())
            }
        })
        .await
        .unwrap();
    }

    sleep(Duration::from_millis(2100)).await;

    // Both failing jobs stay registered and get re-dispatched every
    // tick; their failures never reach the sibling or the loop.
    assert_eq!(panic_attempts.load(Ordering::SeqCst), 2);
    assert_eq!(error_attempts.load(Ordering::SeqCst), 2);
    assert_eq!(survivor_runs.load(Ordering::SeqCst), 2);
}

#[tokio::test(flavor = "multi_thread")]
async fn test_shutdown_halts_the_tick_loop() {
    init_tracing();
    let cron = Crontab::new(Granularity::Second);

    let runs = Arc::new(AtomicUsize::new(0));
    {
        let runs = Arc::clone(&runs);
        cron.add("job", "* * * * * *", move || {
            let runs = Arc::clone(&runs);
            async move {
                runs.fetch_add(1, Ordering::SeqCst);
                Ok(())
            }
        })
        .await
        .unwrap();
    }

    // Shut down before the first tick; nothing must ever fire.
    cron.shutdown().await;
    sleep(Duration::from_millis(1500)).await;
    assert_eq!(runs.load(Ordering::SeqCst), 0);
}

#[tokio::test(flavor = "multi_thread")]
async fn test_dropping_the_registry_releases_the_tick_loop() {
    init_tracing();
    let cron = Crontab::new(Granularity::Second);

    let runs = Arc::new(AtomicUsize::new(0));
    {
        let runs = Arc::clone(&runs);
        cron.add("job", "* * * * * *", move || {
            let runs = Arc::clone(&runs);
            async move {
                runs.fetch_add(1, Ordering::SeqCst);
                Ok(())
            }
        })
        .await
        .unwrap();
    }

    drop(cron);
    sleep(Duration::from_millis(1500)).await;
    assert_eq!(runs.load(Ordering::SeqCst), 0);
}
