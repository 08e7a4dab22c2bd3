use async_trait::async_trait;
use resource_framework::mock::{atom_entry, atom_feed, response_document, AtomEntry, MockTransport};
use resource_framework::retry::{poll_entry, RetryPolicy};
use resource_framework::{
    atom, Collection, Entity, ParsedEntry, Params, Resource, ResourceError, ResourceMap, Result,
    Transport, Value,
};
use std::sync::Arc;
use std::time::Duration;

// --- Test Resource: a field-shadowing specialization ---

struct Report {
    entity: Entity,
}

#[async_trait]
impl Resource for Report {
    fn entity(&self) -> &Entity {
        &self.entity
    }

    fn entity_mut(&mut self) -> &mut Entity {
        &mut self.entity
    }

    async fn member(&mut self, key: &str) -> Result<Option<Value>> {
        match key {
            "owner" => Ok(Some(Value::from("from-member"))),
            _ => self.entity.member(key).await,
        }
    }

    fn default_field(&self, key: &str) -> Option<Value> {
        match key {
            "owner" | "priority" => Some(Value::from("from-default")),
            _ => None,
        }
    }
}

// --- Test Resource: a polled job ---

struct PolledJob {
    entity: Entity,
    sid: String,
    policy: RetryPolicy,
}

impl PolledJob {
    fn new(transport: Arc<dyn Transport>, sid: &str, policy: RetryPolicy) -> Self {
        Self {
            entity: Entity::new(transport, format!("search/jobs/{sid}")),
            sid: sid.to_string(),
            policy,
        }
    }
}

#[async_trait]
impl Resource for PolledJob {
    fn entity(&self) -> &Entity {
        &self.entity
    }

    fn entity_mut(&mut self) -> &mut Entity {
        &mut self.entity
    }

    async fn read(&self) -> Result<ParsedEntry> {
        poll_entry(self.endpoint(), &self.policy).await
    }

    async fn name(&mut self) -> Result<String> {
        Ok(self.sid.clone())
    }
}

fn reports(mock: &MockTransport) -> Collection<Report> {
    Collection::new(mock.transport(), "saved/searches", |t, path, state| Report {
        entity: Entity::with_state(t, path, state),
    })
}

#[tokio::test]
async fn test_cascade_ordering_across_collection_items() {
    let mock = MockTransport::new();
    mock.expect_get("saved/searches/").return_ok(
        200,
        atom_feed(&[AtomEntry::new("nightly")
            .alternate("/services/saved/searches/nightly")
            .field("owner", "from-content")]),
    );

    let mut items = reports(&mock).values().await.unwrap();
    let report = &mut items[0];
    // member beats content beats default
    assert_eq!(report.get("owner").await.unwrap(), Value::from("from-member"));
    // default fills genuine absence only
    assert_eq!(report.get("priority").await.unwrap(), Value::from("from-default"));
    assert!(matches!(
        report.get("nonexistent").await,
        Err(ResourceError::NoSuchField(_))
    ));
    mock.verify();
}

#[tokio::test]
async fn test_create_get_delete_lifecycle() {
    let mock = MockTransport::new();
    let created = atom_feed(&[
        AtomEntry::new("a").alternate("/services/saved/searches/a"),
        AtomEntry::new("b").alternate("/services/saved/searches/b"),
    ]);
    mock.expect_post("saved/searches/").return_ok(201, "");
    mock.expect_get("saved/searches/").return_ok(200, created.clone());
    mock.expect_get("saved/searches/").return_ok(200, created);
    mock.expect_delete("saved/searches/b").return_ok(200, "");
    mock.expect_get("saved/searches/").return_ok(
        200,
        atom_feed(&[AtomEntry::new("a").alternate("/services/saved/searches/a")]),
    );

    let reports = reports(&mock);
    let mut report = reports
        .create("b", Params::new().with("search", "index=_internal"))
        .await
        .unwrap();
    assert_eq!(report.name().await.unwrap(), "b");
    assert_eq!(reports.iter().await.unwrap(), ["a", "b"]);

    reports.delete("b").await.unwrap();
    assert!(!reports.contains("b").await.unwrap());
    mock.verify();
}

#[tokio::test]
async fn test_items_pairs_names_with_resources() {
    let mock = MockTransport::new();
    mock.expect_get("saved/searches/").return_ok(
        200,
        atom_feed(&[
            AtomEntry::new("a").alternate("/services/saved/searches/a"),
            AtomEntry::new("b").alternate("/services/saved/searches/b"),
        ]),
    );
    let pairs = reports(&mock).items().await.unwrap();
    let names: Vec<&str> = pairs.iter().map(|(name, _)| name.as_str()).collect();
    assert_eq!(names, ["a", "b"]);
    assert_eq!(pairs[1].1.path(), "/services/saved/searches/b/");
}

#[tokio::test(start_paused = true)]
async fn test_polled_job_refreshes_after_not_ready() {
    let mock = MockTransport::new();
    let sid = atom::load_sid(response_document(&[("sid", "12345")]).as_bytes()).unwrap();
    mock.expect_get("search/jobs/12345/").return_ok(204, "");
    mock.expect_get("search/jobs/12345/").return_ok(204, "");
    mock.expect_get("search/jobs/12345/").return_ok(
        200,
        atom_entry(&AtomEntry::new("search index=main").field("dispatchState", "DONE")),
    );

    let mut job = PolledJob::new(mock.transport(), &sid, RetryPolicy::default());
    assert_eq!(job.path().trim_end_matches('/'), "search/jobs/12345");
    assert_eq!(job.get("name").await.unwrap(), Value::from("12345"));
    assert_eq!(job.get("dispatchState").await.unwrap(), Value::from("DONE"));
    mock.verify();
}

#[tokio::test(start_paused = true)]
async fn test_polled_job_times_out() {
    let mock = MockTransport::new();
    let policy = RetryPolicy::new(3, Duration::from_millis(500));
    for _ in 0..3 {
        mock.expect_get("search/jobs/42/").return_ok(204, "");
    }
    let mut job = PolledJob::new(mock.transport(), "42", policy);
    assert!(matches!(
        job.refresh().await.map(|_| ()),
        Err(ResourceError::TimedOut(_))
    ));
    mock.verify();
}
