//! Worker pool behaviour seen through the public API

use sastbench::pool::api::{Task, TaskError, TaskStatus, WorkerPool};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Capacity 2, five tasks: never more than two at once, all five finish
#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_capacity_two_five_tasks() {
    let pool = WorkerPool::new(2).unwrap();
    let active = Arc::new(AtomicUsize::new(0));
    let peak = Arc::new(AtomicUsize::new(0));
    let finished = Arc::new(Mutex::new(Vec::new()));

    for i in 0..5 {
        let active = active.clone();
        let peak = peak.clone();
        let finished = finished.clone();
        pool.submit(Task::new(format!("sleep {}", i), async move {
            let now = active.fetch_add(1, Ordering::SeqCst) + 1;
            peak.fetch_max(now, Ordering::SeqCst);
            tokio::time::sleep(Duration::from_millis(30)).await;
            active.fetch_sub(1, Ordering::SeqCst);
            finished.lock().unwrap().push(i);
            Ok(())
        }))
        .await
        .unwrap();
        assert!(pool.running() <= 2);
    }

    let summary = pool.join_all().await;
    assert_eq!(summary.completed, 5);
    assert_eq!(summary.total(), 5);
    assert!(peak.load(Ordering::SeqCst) <= 2);
    assert_eq!(finished.lock().unwrap().len(), 5);

    assert_eq!(pool.join_all().await.total(), 0);
    assert_eq!(pool.prune(), 5);
    assert_eq!(pool.tracked(), 0);
}

#[tokio::test]
async fn test_zero_tasks_and_zero_capacity() {
    assert!(WorkerPool::new(0).is_err());

    let pool = WorkerPool::new(1).unwrap();
    assert!(pool.join_all().await.is_empty());
    assert_eq!(pool.prune(), 0);
}

#[tokio::test]
async fn test_deadline_and_failure_do_not_stop_the_batch() {
    let pool = WorkerPool::new(2)
        .unwrap()
        .with_default_timeout(Some(Duration::from_millis(50)));

    pool.submit(Task::new("hang", async {
        tokio::time::sleep(Duration::from_secs(30)).await;
        Ok(())
    }))
    .await
    .unwrap();
    pool.submit(Task::new("broken", async {
        Err(TaskError::Precondition {
            message: "nothing to scan".to_string(),
        })
    }))
    .await
    .unwrap();
    pool.submit(
        Task::new("quick", async { Ok(()) }).with_timeout(Duration::from_secs(5)),
    )
    .await
    .unwrap();

    let summary = pool.join_all().await;
    assert_eq!(summary.timed_out, 1);
    assert_eq!(summary.failed, 1);
    assert_eq!(summary.completed, 1);
    assert_eq!(
        TaskStatus::from(Err::<(), _>(TaskError::Precondition {
            message: "x".to_string()
        })),
        TaskStatus::Failed("x".to_string())
    );
}
