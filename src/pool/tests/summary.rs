//! Tests for failure accounting

#[cfg(test)]
mod tests {
    use crate::pool::api::{JoinSummary, Task, TaskError, TaskStatus, WorkerPool};

    #[tokio::test]
    async fn test_failed_task_is_counted_not_propagated() {
        let pool = WorkerPool::new(2).unwrap();
        pool.submit(Task::new("bad", async {
            Err(TaskError::Precondition {
                message: "working copy missing".to_string(),
            })
        }))
        .await
        .unwrap();
        pool.submit(Task::new("good", async { Ok(()) })).await.unwrap();

        let summary = pool.join_all().await;
        assert_eq!(summary.failed, 1);
        assert_eq!(summary.completed, 1);
        assert_eq!(summary.failures(), 1);
    }

    #[tokio::test]
    async fn test_panicking_task_is_isolated() {
        let pool = WorkerPool::new(2).unwrap();
        pool.submit(Task::new("boom", async {
            if true {
                panic!("task exploded");
            }
            Ok(())
        }))
        .await
        .unwrap();
        pool.submit(Task::new("fine", async { Ok(()) })).await.unwrap();

        let summary = pool.join_all().await;
        assert_eq!(summary.panicked, 1);
        assert_eq!(summary.completed, 1);
        assert_eq!(pool.running(), 0);
    }

    #[test]
    fn test_summary_merge_and_display() {
        let mut left = JoinSummary::default();
        left.record(&TaskStatus::Completed);
        left.record(&TaskStatus::Failed("x".to_string()));

        let mut right = JoinSummary::default();
        right.record(&TaskStatus::TimedOut);
        right.record(&TaskStatus::Cancelled);

        left.merge(right);
        assert_eq!(left.total(), 4);
        assert_eq!(left.failures(), 3);
        assert_eq!(
            left.to_string(),
            "4 tasks: 1 completed, 1 failed, 1 timed out, 1 cancelled"
        );
    }

    #[test]
    fn test_command_failure_message_includes_stderr() {
        let err = TaskError::CommandFailed {
            program: "docker".to_string(),
            status: "exit status: 125".to_string(),
            stderr: "no such image".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "'docker' exited with exit status: 125: no such image"
        );
        assert_eq!(
            TaskStatus::from(Err::<(), _>(err)),
            TaskStatus::Failed("'docker' exited with exit status: 125: no such image".to_string())
        );
    }
}
