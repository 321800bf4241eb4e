use std::sync::atomic::{AtomicBool, Ordering};

use serde_json::json;
use uuid::Uuid;

use super::*;
use crate::error::ErrorCode;

struct MockTasks {
    project_id: ItemId,
    listing: Mutex<Vec<Task>>,
    status_calls: Mutex<Vec<(ItemId, TaskStatus)>>,
    fail: AtomicBool,
}

impl MockTasks {
    fn new(listing: Vec<Task>) -> Self {
        Self {
            project_id: Uuid::new_v4(),
            listing: Mutex::new(listing),
            status_calls: Mutex::new(Vec::new()),
            fail: AtomicBool::new(false),
        }
    }

    fn failure(&self) -> Result<(), RemoteError> {
        if self.fail.load(Ordering::SeqCst) {
            Err(RemoteError::Request("connection reset".into()))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl TaskRemote for MockTasks {
    async fn list(&self) -> Result<Vec<Task>, RemoteError> {
        Ok(self.listing.lock().unwrap().clone())
    }

    async fn create(&self, task: &NewTask) -> Result<Task, RemoteError> {
        self.failure()?;
        Ok(Task {
            id: Uuid::new_v4(),
            project_id: self.project_id,
            frame_id: task.frame_id,
            title: task.title.clone(),
            status: task.status,
        })
    }

    async fn set_status(&self, id: ItemId, status: TaskStatus) -> Result<(), RemoteError> {
        self.status_calls.lock().unwrap().push((id, status));
        self.failure()
    }

    async fn delete(&self, _id: ItemId) -> Result<(), RemoteError> {
        self.failure()
    }
}

fn task(title: &str, status: TaskStatus, frame_id: Option<ItemId>) -> Task {
    Task { id: Uuid::new_v4(), project_id: Uuid::nil(), frame_id, title: title.into(), status }
}

async fn board_with(tasks: Vec<Task>) -> (Arc<MockTasks>, TaskBoard) {
    let remote = Arc::new(MockTasks::new(tasks));
    let board = TaskBoard::new(remote.clone() as Arc<dyn TaskRemote>);
    board.load().await.unwrap();
    (remote, board)
}

// =============================================================================
// columns
// =============================================================================

#[tokio::test]
async fn columns_filter_by_status() {
    let (_, board) = board_with(vec![
        task("sketch", TaskStatus::Todo, None),
        task("ink", TaskStatus::InProgress, None),
        task("color", TaskStatus::Todo, None),
    ])
    .await;

    let todo: Vec<String> = board.column(TaskStatus::Todo).into_iter().map(|t| t.title).collect();
    assert_eq!(todo, vec!["sketch", "color"]);
    assert_eq!(board.column(TaskStatus::Done).len(), 0);
}

#[tokio::test]
async fn for_frame_filters_by_attachment() {
    let frame = Uuid::new_v4();
    let (_, board) = board_with(vec![
        task("a", TaskStatus::Todo, Some(frame)),
        task("b", TaskStatus::Todo, None),
        task("c", TaskStatus::Done, Some(frame)),
    ])
    .await;

    assert_eq!(board.for_frame(frame).len(), 2);
    assert!(board.for_frame(Uuid::new_v4()).is_empty());
}

// =============================================================================
// change_status
// =============================================================================

#[tokio::test]
async fn change_status_moves_card() {
    let t = task("ink", TaskStatus::Todo, None);
    let (remote, board) = board_with(vec![t.clone()]).await;

    board.change_status(t.id, TaskStatus::Done).await.unwrap();

    assert_eq!(board.get(t.id).unwrap().status, TaskStatus::Done);
    assert_eq!(*remote.status_calls.lock().unwrap(), vec![(t.id, TaskStatus::Done)]);
}

#[tokio::test]
async fn change_status_rolls_back_and_propagates() {
    let t = task("ink", TaskStatus::InProgress, None);
    let (remote, board) = board_with(vec![t.clone()]).await;
    remote.fail.store(true, Ordering::SeqCst);

    let err = board.change_status(t.id, TaskStatus::Done).await.unwrap_err();

    assert!(matches!(err, TaskError::Remote(RemoteError::Request(_))));
    assert!(err.retryable());
    assert_eq!(board.get(t.id).unwrap().status, TaskStatus::InProgress);
}

#[tokio::test]
async fn change_status_same_column_skips_remote() {
    let t = task("ink", TaskStatus::Todo, None);
    let (remote, board) = board_with(vec![t.clone()]).await;

    board.change_status(t.id, TaskStatus::Todo).await.unwrap();
    assert!(remote.status_calls.lock().unwrap().is_empty());
}

#[tokio::test]
async fn change_status_unknown_is_not_found() {
    let (_, board) = board_with(vec![]).await;
    let err = board.change_status(Uuid::new_v4(), TaskStatus::Done).await.unwrap_err();
    assert_eq!(err.error_code(), "E_TASK_NOT_FOUND");
}

// =============================================================================
// create / delete
// =============================================================================

#[tokio::test]
async fn create_appends_to_board() {
    let (_, board) = board_with(vec![]).await;
    let frame = Uuid::new_v4();

    let created = board.create(NewTask::todo("storyboard review").on_frame(frame)).await.unwrap();

    assert_eq!(board.tasks(), vec![created.clone()]);
    assert_eq!(created.frame_id, Some(frame));
    assert_eq!(created.status, TaskStatus::Todo);
}

#[tokio::test]
async fn create_failure_adds_nothing() {
    let (remote, board) = board_with(vec![]).await;
    remote.fail.store(true, Ordering::SeqCst);
    assert!(board.create(NewTask::todo("x")).await.is_err());
    assert!(board.tasks().is_empty());
}

#[tokio::test]
async fn delete_removes_after_remote_confirms() {
    let t = task("old", TaskStatus::Done, None);
    let (remote, board) = board_with(vec![t.clone()]).await;

    remote.fail.store(true, Ordering::SeqCst);
    assert!(board.delete(t.id).await.is_err());
    assert_eq!(board.tasks().len(), 1);

    remote.fail.store(false, Ordering::SeqCst);
    board.delete(t.id).await.unwrap();
    assert!(board.tasks().is_empty());
    assert!(matches!(board.delete(t.id).await, Err(TaskError::NotFound(_))));
}

// =============================================================================
// wire shapes
// =============================================================================

#[test]
fn status_serializes_snake_case() {
    assert_eq!(serde_json::to_value(TaskStatus::InProgress).unwrap(), json!("in_progress"));
    assert_eq!(TaskStatus::ALL.len(), 3);
}

#[test]
fn new_task_omits_missing_frame() {
    assert_eq!(
        serde_json::to_value(NewTask::todo("x")).unwrap(),
        json!({"title": "x", "status": "todo"})
    );
}

#[test]
fn status_body_shape() {
    assert_eq!(
        serde_json::to_value(StatusBody { status: TaskStatus::Done }).unwrap(),
        json!({"status": "done"})
    );
}

#[test]
fn task_deserializes_without_frame() {
    let t: Task = serde_json::from_value(json!({
        "id": Uuid::new_v4(),
        "project_id": Uuid::new_v4(),
        "title": "t",
        "status": "todo"
    }))
    .unwrap();
    assert_eq!(t.frame_id, None);
}
