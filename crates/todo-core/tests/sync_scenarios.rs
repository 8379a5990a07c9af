//! End-to-end sync scenarios: local store -> client -> server -> report

use std::net::SocketAddr;
use std::time::Duration;

use tempfile::TempDir;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use todo_core::sync::report::{DETAIL_HEADER, SUMMARY_HEADER};
use todo_core::sync::{Request, SyncState};
use todo_core::{NewTask, Repository, SqliteRepository, SyncClient, SyncError, SyncServer, Task, TaskStatus};

struct Running {
    addr: SocketAddr,
    state: SyncState,
    shutdown: oneshot::Sender<()>,
    handle: JoinHandle<()>,
}

async fn start_server() -> Running {
    let server = SyncServer::bind("127.0.0.1:0")
        .await
        .unwrap()
        .with_timeout(Some(Duration::from_secs(5)));
    let addr = server.local_addr().unwrap();
    let state = server.state();
    let (shutdown, rx) = oneshot::channel();
    let handle = tokio::spawn(server.run_until(async move {
        let _ = rx.await;
    }));
    Running {
        addr,
        state,
        shutdown,
        handle,
    }
}

impl Running {
    fn client(&self) -> SyncClient {
        SyncClient::new("127.0.0.1", self.addr.port()).with_timeout(Some(Duration::from_secs(5)))
    }

    async fn stop(self) {
        let _ = self.shutdown.send(());
        self.handle.await.unwrap();
    }
}

#[tokio::test]
async fn push_then_report_matches_expected_csv() {
    let server = start_server().await;
    let client = server.client();

    let tasks = vec![
        Task::new(1, "A")
            .with_status(TaskStatus::Done)
            .with_due_date("2024-01-01"),
        Task::new(2, "B"),
    ];

    let message = client.push_tasks(&tasks).await.unwrap();
    assert_eq!(message, "Sync completed. Received 2 tasks.");

    let csv = client.fetch_report_csv().await.unwrap();
    let expected = format!(
        "{}\n2,1,0,1,50.00\n\n{}\n1,\"A\",DONE,2024-01-01\n2,\"B\",TODO,\n",
        SUMMARY_HEADER, DETAIL_HEADER
    );
    assert_eq!(csv, expected);

    server.stop().await;
}

#[tokio::test]
async fn report_before_any_push_is_an_error() {
    let server = start_server().await;

    let err = server.client().fetch_report_csv().await.unwrap_err();
    assert!(matches!(err, SyncError::Server(_)));
    assert_eq!(err.to_string(), "No tasks synced yet.");

    server.stop().await;
}

#[tokio::test]
async fn repeated_reports_are_identical() {
    let server = start_server().await;
    let client = server.client();

    let tasks = vec![
        Task::new(1, "one").with_status(TaskStatus::Doing),
        Task::new(2, "two"),
        Task::new(3, "three").with_status(TaskStatus::Done),
    ];
    client.push_tasks(&tasks).await.unwrap();

    let first = client.fetch_report_csv().await.unwrap();
    let second = client.fetch_report_csv().await.unwrap();
    assert_eq!(first, second);

    let summary: Vec<&str> = first.lines().nth(1).unwrap().split(',').collect();
    assert_eq!(summary, vec!["3", "1", "1", "1", "33.33"]);

    server.stop().await;
}

#[tokio::test]
async fn quotes_in_titles_are_doubled() {
    let server = start_server().await;
    let client = server.client();

    client
        .push_tasks(&[Task::new(9, "He said \"hi\"")])
        .await
        .unwrap();
    let csv = client.fetch_report_csv().await.unwrap();
    assert!(csv.contains("9,\"He said \"\"hi\"\"\",TODO,\n"));

    server.stop().await;
}

#[tokio::test]
async fn pushed_tasks_arrive_unchanged() {
    let server = start_server().await;

    let tasks = vec![
        Task::new(1, "with everything")
            .with_notes("some notes")
            .with_due_date("2025-03-01")
            .with_status(TaskStatus::Doing),
        Task::new(2, "bare"),
    ];
    server.client().push_tasks(&tasks).await.unwrap();

    let received = server.state.snapshot().await;
    assert_eq!(received, tasks);
    assert!(received[1].notes.is_none());
    assert!(received[1].due_date.is_none());

    server.stop().await;
}

#[tokio::test]
async fn newer_push_replaces_older_snapshot() {
    let server = start_server().await;
    let client = server.client();

    client
        .push_tasks(&[Task::new(1, "a"), Task::new(2, "b")])
        .await
        .unwrap();
    client
        .push_tasks(&[Task::new(3, "c").with_status(TaskStatus::Done)])
        .await
        .unwrap();

    let csv = client.fetch_report_csv().await.unwrap();
    assert_eq!(csv.lines().nth(1), Some("1,0,0,1,100.00"));
    assert!(!csv.contains("\"a\""));

    server.stop().await;
}

#[tokio::test]
async fn unknown_request_type_does_not_stop_server() {
    let server = start_server().await;

    let mut body = Vec::new();
    ciborium::into_writer(
        &ciborium::Value::Map(vec![(
            ciborium::Value::Text("type".into()),
            ciborium::Value::Text("DROP_TABLES".into()),
        )]),
        &mut body,
    )
    .unwrap();

    let mut stream = tokio::net::TcpStream::connect(server.addr).await.unwrap();
    todo_core::sync::message::write_frame(&mut stream, &body)
        .await
        .unwrap();
    let reply = todo_core::sync::message::read_frame(&mut stream)
        .await
        .unwrap();
    let response = todo_core::sync::Response::decode(&reply).unwrap();
    assert!(!response.is_ok());
    assert_eq!(response.message(), "Unknown request type.");

    let message = server.client().push_tasks(&[]).await.unwrap();
    assert_eq!(message, "Sync completed. Received 0 tasks.");

    server.stop().await;
}

#[tokio::test]
async fn local_store_round_trips_through_sync() {
    let dir = TempDir::new().unwrap();
    let repo = SqliteRepository::open_path(&dir.path().join("todo.db")).unwrap();
    let user = repo.ensure_user("sam").unwrap();

    let water = repo
        .add_task(user.id, &NewTask::new("Water plants").due_date(Some("2024-06-01".into())))
        .unwrap();
    repo.add_task(user.id, &NewTask::new("Call mum")).unwrap();
    assert!(repo.mark_complete(user.id, water.id).unwrap());

    let tasks = repo.fetch_tasks(user.id).unwrap();
    let server = start_server().await;
    let client = server.client();
    client.push_tasks(&tasks).await.unwrap();

    let csv = client.fetch_report_csv().await.unwrap();
    assert_eq!(csv.lines().nth(1), Some("2,1,0,1,50.00"));
    // Open tasks sort before done ones
    assert!(csv.lines().nth(4).unwrap().contains("\"Call mum\",TODO,"));
    assert!(csv
        .lines()
        .nth(5)
        .unwrap()
        .ends_with("\"Water plants\",DONE,2024-06-01"));

    server.stop().await;
}

#[test]
fn request_tags_are_stable() {
    assert_eq!(Request::push_tasks(Vec::new()).tag(), "PUSH_TASKS");
    assert_eq!(Request::GetReportCsv.tag(), "GET_REPORT_CSV");
}
