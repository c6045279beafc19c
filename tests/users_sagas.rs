//! End-to-end behaviour of the users watchers over a scripted backend.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tokio::sync::{mpsc, oneshot};
use tokio_util::sync::CancellationToken;

use sagavisor::users::events::{CREATE_FAILED, DELETE_FAILED, GET_FAILED};
use sagavisor::users::{
    self, NewUser, Outcome, User, UserId, UserPage, UsersApi, UsersWatchers,
};
use sagavisor::{Event, Matcher, Scheduler, SchedulerConfig, TaskStatus, TransportError};

// ---------------------------
// Scripted backend
// ---------------------------

enum Reply<T> {
    Now(Result<T, TransportError>),
    Gate(oneshot::Receiver<Result<T, TransportError>>),
}

/// Replies are consumed in call order; an empty script uses `fallback`.
struct Script<T> {
    replies: Mutex<VecDeque<Reply<T>>>,
    fallback: fn() -> Result<T, TransportError>,
}

impl<T> Script<T> {
    fn new(fallback: fn() -> Result<T, TransportError>) -> Self {
        Self {
            replies: Mutex::new(VecDeque::new()),
            fallback,
        }
    }

    fn push(&self, reply: Result<T, TransportError>) {
        self.replies.lock().unwrap().push_back(Reply::Now(reply));
    }

    fn gate(&self) -> oneshot::Sender<Result<T, TransportError>> {
        let (tx, rx) = oneshot::channel();
        self.replies.lock().unwrap().push_back(Reply::Gate(rx));
        tx
    }

    async fn next(&self) -> Result<T, TransportError> {
        let reply = self.replies.lock().unwrap().pop_front();
        match reply {
            Some(Reply::Now(r)) => r,
            Some(Reply::Gate(rx)) => rx
                .await
                .unwrap_or_else(|_| Err(TransportError::new("gate dropped"))),
            None => (self.fallback)(),
        }
    }
}

struct MockApi {
    list: Script<UserPage>,
    create: Script<User>,
    delete: Script<()>,
    limits: Mutex<Vec<u32>>,
    created: Mutex<Vec<NewUser>>,
    deleted: Mutex<Vec<UserId>>,
}

impl MockApi {
    fn new() -> Arc<Self> {
        Arc::new(Self {
            list: Script::new(|| Ok(UserPage::default())),
            create: Script::new(|| Err(TransportError::new("unscripted"))),
            delete: Script::new(|| Ok(())),
            limits: Mutex::default(),
            created: Mutex::default(),
            deleted: Mutex::default(),
        })
    }

    fn list_calls(&self) -> usize {
        self.limits.lock().unwrap().len()
    }

    fn create_calls(&self) -> usize {
        self.created.lock().unwrap().len()
    }

    fn deleted(&self) -> Vec<UserId> {
        self.deleted.lock().unwrap().clone()
    }
}

#[async_trait]
impl UsersApi for MockApi {
    async fn fetch_list(&self, limit: u32) -> Result<UserPage, TransportError> {
        self.limits.lock().unwrap().push(limit);
        self.list.next().await
    }

    async fn create_one(&self, user: NewUser) -> Result<User, TransportError> {
        self.created.lock().unwrap().push(user);
        self.create.next().await
    }

    async fn delete_one(&self, id: UserId) -> Result<(), TransportError> {
        self.deleted.lock().unwrap().push(id);
        self.delete.next().await
    }
}

// ---------------------------
// Helpers
// ---------------------------

fn user(id: u64, first: &str, last: &str) -> User {
    User {
        id: UserId(id),
        first_name: first.into(),
        last_name: last.into(),
    }
}

fn page(users: Vec<User>) -> UserPage {
    UserPage { items: users }
}

type Outcomes = Arc<Mutex<Vec<Outcome>>>;

fn setup(api: &Arc<MockApi>) -> (Scheduler, UsersWatchers, Outcomes) {
    let mut sched = Scheduler::new(SchedulerConfig::default());
    let watchers = users::register(&mut sched, api.clone());
    let outcomes: Outcomes = Arc::default();
    let sink = outcomes.clone();
    sched.subscribe(Matcher::Any, move |ev| {
        if let Some(outcome) = Outcome::from_event(ev) {
            sink.lock().unwrap().push(outcome);
        }
    });
    (sched, watchers, outcomes)
}

fn taken(outcomes: &Outcomes) -> Vec<Outcome> {
    std::mem::take(&mut *outcomes.lock().unwrap())
}

fn failed(message: &str) -> Outcome {
    Outcome::OperationFailed(message.to_owned())
}

// ---------------------------
// Scenarios
// ---------------------------

#[tokio::test]
async fn list_with_empty_backend_reports_empty_items() {
    let api = MockApi::new();
    let (mut sched, _, outcomes) = setup(&api);
    api.list.push(Ok(page(Vec::new())));

    sched.publish(users::events::list_requested());
    sched.run_until_idle().await;

    assert_eq!(taken(&outcomes), vec![Outcome::ListSucceeded(page(Vec::new()))]);
    assert_eq!(*api.limits.lock().unwrap(), vec![users::LIST_LIMIT]);
}

#[tokio::test]
async fn rejected_create_reports_create_failure_without_listing() {
    let api = MockApi::new();
    let (mut sched, _, outcomes) = setup(&api);
    api.create.push(Err(TransportError::new("409")));

    sched.publish(users::events::create_requested(&NewUser::new("A", "B")));
    sched.run_until_idle().await;

    assert_eq!(taken(&outcomes), vec![failed(CREATE_FAILED)]);
    assert_eq!(*api.created.lock().unwrap(), vec![NewUser::new("A", "B")]);
    assert_eq!(api.list_calls(), 0);
}

#[tokio::test]
async fn delete_then_failed_list_reports_get_failure() {
    let api = MockApi::new();
    let (mut sched, _, outcomes) = setup(&api);
    api.delete.push(Ok(()));
    api.list.push(Err(TransportError::new("503")));

    sched.publish(users::events::delete_requested(UserId(7)));
    sched.run_until_idle().await;

    assert_eq!(taken(&outcomes), vec![failed(GET_FAILED)]);
    assert_eq!(api.deleted(), vec![UserId(7)]);
}

// ---------------------------
// Properties
// ---------------------------

#[tokio::test]
async fn every_trigger_ends_in_exactly_one_outcome() {
    let api = MockApi::new();
    let (mut sched, _, outcomes) = setup(&api);

    api.list.push(Err(TransportError::new("down")));
    sched.publish(users::events::list_requested());
    sched.run_until_idle().await;
    assert_eq!(taken(&outcomes), vec![failed(GET_FAILED)]);

    api.delete.push(Err(TransportError::new("404")));
    sched.publish(users::events::delete_requested(UserId(1)));
    sched.run_until_idle().await;
    assert_eq!(taken(&outcomes), vec![failed(DELETE_FAILED)]);

    // Malformed payloads are answered without calling the backend.
    sched.publish(Event::new(users::events::CREATE_REQUESTED).with_payload(serde_json::json!({ "firstName": "A" })));
    sched.publish(Event::new(users::events::DELETE_REQUESTED));
    sched.run_until_idle().await;
    assert_eq!(taken(&outcomes), vec![failed(CREATE_FAILED), failed(DELETE_FAILED)]);
    assert_eq!(api.create_calls(), 0);
    assert_eq!(api.deleted(), vec![UserId(1)]);
}

#[tokio::test]
async fn successful_write_reports_the_refetched_list() {
    let api = MockApi::new();
    let (mut sched, _, outcomes) = setup(&api);
    let ada = user(1, "Ada", "Lovelace");
    api.create.push(Ok(ada.clone()));
    api.list.push(Ok(page(vec![ada.clone()])));

    sched.publish(users::events::create_requested(&NewUser::new("Ada", "Lovelace")));
    sched.run_until_idle().await;

    assert_eq!(taken(&outcomes), vec![Outcome::ListSucceeded(page(vec![ada]))]);
    assert_eq!(api.list_calls(), 1);

    // Older producers send `userId`.
    sched.publish(
        Event::new(users::events::DELETE_REQUESTED).with_payload(serde_json::json!({ "userId": 1 })),
    );
    sched.run_until_idle().await;
    assert_eq!(taken(&outcomes), vec![Outcome::ListSucceeded(page(Vec::new()))]);
    assert_eq!(api.deleted(), vec![UserId(1)]);
}

#[tokio::test]
async fn newer_create_supersedes_older_one() {
    let api = MockApi::new();
    let (mut sched, watchers, outcomes) = setup(&api);
    let first_gate = api.create.gate();
    let second_gate = api.create.gate();

    sched.publish(users::events::create_requested(&NewUser::new("A", "One")));
    let first = sched.watcher_task(watchers.create).unwrap();
    sched.publish(users::events::create_requested(&NewUser::new("A", "Two")));
    let second = sched.watcher_task(watchers.create).unwrap();

    assert_eq!(sched.task(first).unwrap().status, TaskStatus::Cancelled);
    assert_eq!(sched.in_flight(), 2, "the superseded call is not aborted");

    first_gate.send(Ok(user(1, "A", "One"))).unwrap();
    second_gate.send(Ok(user(2, "A", "Two"))).unwrap();
    api.list.push(Ok(page(vec![user(2, "A", "Two")])));
    sched.run_until_idle().await;

    assert_eq!(
        taken(&outcomes),
        vec![Outcome::ListSucceeded(page(vec![user(2, "A", "Two")]))]
    );
    assert_eq!(api.create_calls(), 2);
    assert_eq!(api.list_calls(), 1, "only the latest create refetches");
    assert_eq!(sched.task(second).unwrap().status, TaskStatus::Completed);
}

#[tokio::test]
async fn superseded_create_failure_is_not_reported() {
    let api = MockApi::new();
    let (mut sched, _, outcomes) = setup(&api);
    let first_gate = api.create.gate();
    api.create.push(Err(TransportError::new("409")));

    sched.publish(users::events::create_requested(&NewUser::new("A", "One")));
    sched.publish(users::events::create_requested(&NewUser::new("A", "Two")));
    first_gate.send(Err(TransportError::new("500"))).unwrap();
    sched.run_until_idle().await;

    assert_eq!(taken(&outcomes), vec![failed(CREATE_FAILED)]);
}

#[tokio::test]
async fn deletes_are_serialized() {
    let api = MockApi::new();
    let (mut sched, watchers, outcomes) = setup(&api);
    let gate = api.delete.gate();

    sched.publish(users::events::delete_requested(UserId(7)));
    let first = sched.watcher_task(watchers.delete).unwrap();
    sched.publish(users::events::delete_requested(UserId(8)));

    assert_eq!(sched.in_flight(), 1, "busy delete watcher ignores the second request");
    assert_eq!(sched.live_tasks(), vec![first]);

    gate.send(Ok(())).unwrap();
    sched.run_until_idle().await;
    assert_eq!(api.deleted(), vec![UserId(7)]);
    assert_eq!(sched.task(first).unwrap().status, TaskStatus::Completed);
    assert_eq!(taken(&outcomes), vec![Outcome::ListSucceeded(page(Vec::new()))]);

    sched.publish(users::events::delete_requested(UserId(9)));
    sched.run_until_idle().await;
    assert_eq!(api.deleted(), vec![UserId(7), UserId(9)]);
}

#[tokio::test]
async fn concurrent_lists_both_report() {
    let api = MockApi::new();
    let (mut sched, _, outcomes) = setup(&api);
    let first_gate = api.list.gate();
    let second_gate = api.list.gate();

    sched.publish(users::events::list_requested());
    sched.publish(users::events::list_requested());
    assert_eq!(sched.live_tasks().len(), 2);

    second_gate.send(Ok(page(vec![user(2, "B", "B")]))).unwrap();
    first_gate.send(Ok(page(vec![user(1, "A", "A")]))).unwrap();
    sched.run_until_idle().await;

    let mut seen = taken(&outcomes);
    seen.sort_by_key(|o| match o {
        Outcome::ListSucceeded(p) => p.items.first().map(|u| u.id),
        Outcome::OperationFailed(_) => None,
    });
    assert_eq!(
        seen,
        vec![
            Outcome::ListSucceeded(page(vec![user(1, "A", "A")])),
            Outcome::ListSucceeded(page(vec![user(2, "B", "B")])),
        ]
    );
}

// ---------------------------
// Hosted loop
// ---------------------------

#[tokio::test]
async fn hosted_scheduler_answers_submitted_requests() {
    let api = MockApi::new();
    api.list.push(Ok(page(vec![user(3, "C", "D")])));

    let mut sched = Scheduler::new(SchedulerConfig::default());
    users::register(&mut sched, api.clone());
    let (tx, mut rx) = mpsc::unbounded_channel();
    sched.subscribe(Matcher::Any, move |ev| {
        if let Some(outcome) = Outcome::from_event(ev) {
            let _ = tx.send(outcome);
        }
    });

    let handle = sched.handle();
    let token = CancellationToken::new();
    let stop = token.clone();
    let host = tokio::spawn(async move {
        sched.run(stop).await;
        sched
    });

    handle.submit(users::events::list_requested()).await.unwrap();
    assert_eq!(
        rx.recv().await,
        Some(Outcome::ListSucceeded(page(vec![user(3, "C", "D")])))
    );

    token.cancel();
    let sched = host.await.unwrap();
    assert!(sched.live_tasks().is_empty());
    sched.shutdown().await;
}
