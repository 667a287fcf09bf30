//! Tests for deadlines and hard cancellation

#[cfg(test)]
mod tests {
    use crate::pool::api::{PoolError, Task, WorkerPool};
    use std::time::Duration;

    #[tokio::test]
    async fn test_task_timeout_is_reported_and_releases_slot() {
        let pool = WorkerPool::new(1).unwrap();
        pool.submit(
            Task::new("sleeper", async {
                tokio::time::sleep(Duration::from_secs(30)).await;
                Ok(())
            })
            .with_timeout(Duration::from_millis(20)),
        )
        .await
        .unwrap();

        // Only admitted once the sleeper's slot is released
        pool.submit(Task::new("next", async { Ok(()) })).await.unwrap();

        let summary = pool.join_all().await;
        assert_eq!(summary.timed_out, 1);
        assert_eq!(summary.completed, 1);
    }

    #[tokio::test]
    async fn test_default_timeout_applies_to_tasks_without_their_own() {
        let pool = WorkerPool::new(2)
            .unwrap()
            .with_default_timeout(Some(Duration::from_millis(20)));

        pool.submit(Task::new("slow", async {
            tokio::time::sleep(Duration::from_secs(30)).await;
            Ok(())
        }))
        .await
        .unwrap();
        pool.submit(
            Task::new("patient", async {
                tokio::time::sleep(Duration::from_millis(60)).await;
                Ok(())
            })
            .with_timeout(Duration::from_secs(5)),
        )
        .await
        .unwrap();

        let summary = pool.join_all().await;
        assert_eq!(summary.timed_out, 1);
        assert_eq!(summary.completed, 1);
    }

    #[tokio::test]
    async fn test_cancel_all_aborts_live_tasks() {
        let pool = WorkerPool::new(2).unwrap();
        for i in 0..2 {
            pool.submit(Task::new(format!("forever {}", i), async {
                tokio::time::sleep(Duration::from_secs(3600)).await;
                Ok(())
            }))
            .await
            .unwrap();
        }

        assert_eq!(pool.cancel_all(), 2);
        let summary = tokio::time::timeout(Duration::from_secs(5), pool.join_all())
            .await
            .expect("cancelled tasks should join promptly");

        assert_eq!(summary.cancelled, 2);
        assert_eq!(pool.prune(), 2);
    }

    #[tokio::test]
    async fn test_cancel_all_closes_admission() {
        let pool = WorkerPool::new(1).unwrap();
        pool.cancel_all();

        assert!(pool.is_closed());
        let err = pool
            .submit(Task::new("late", async { Ok(()) }))
            .await
            .unwrap_err();
        assert_eq!(
            err,
            PoolError::Closed {
                label: "late".to_string()
            }
        );
    }

    #[tokio::test]
    async fn test_cancel_all_wakes_waiting_submitter() {
        let pool = std::sync::Arc::new(WorkerPool::new(1).unwrap());
        pool.submit(Task::new("holder", async {
            tokio::time::sleep(Duration::from_secs(3600)).await;
            Ok(())
        }))
        .await
        .unwrap();

        let waiting = {
            let pool = pool.clone();
            tokio::spawn(async move { pool.submit(Task::new("waiter", async { Ok(()) })).await })
        };
        tokio::time::sleep(Duration::from_millis(20)).await;

        pool.cancel_all();
        let result = waiting.await.unwrap();
        assert!(matches!(result, Err(PoolError::Closed { .. })));
    }

    #[tokio::test]
    async fn test_cancel_all_skips_finished_tasks() {
        let pool = WorkerPool::new(2).unwrap();
        pool.submit(Task::new("done", async { Ok(()) })).await.unwrap();
        pool.join_all().await;

        assert_eq!(pool.cancel_all(), 0);
    }
}
