//! Data inputs. One collection spans every input kind, each kind living under
//! its own sub-path of `data/inputs/`.

use crate::service::PATH_INPUTS;
use once_cell::sync::Lazy;
use resource_framework::{Entity, KindMap, KindedCollection, ParsedEntry, Transport};
use std::ops::Deref;
use std::sync::Arc;

/// Input kinds and the sub-paths they live under.
pub static INPUT_KINDS: Lazy<KindMap> = Lazy::new(|| {
    [
        ("ad", "ad"),
        ("monitor", "monitor"),
        ("registry", "registry"),
        ("script", "script"),
        ("tcp", "tcp/raw"),
        ("splunktcp", "tcp/cooked"),
        ("udp", "udp"),
        ("win-event-log-collections", "win-event-log-collections"),
        ("win-perfmon", "win-perfmon"),
        ("win-wmi-collections", "win-wmi-collections"),
    ]
    .into_iter()
    .collect()
});

#[derive(Debug, Clone)]
pub struct Input {
    entity: Entity,
    kind: String,
}

impl Input {
    pub fn new(
        transport: Arc<dyn Transport>,
        path: impl Into<String>,
        kind: &str,
        state: Option<ParsedEntry>,
    ) -> Self {
        Self {
            entity: Entity::from_parts(transport, path, state),
            kind: kind.to_string(),
        }
    }

    pub fn kind(&self) -> &str {
        &self.kind
    }
}

impl_resource!(Input);

#[derive(Debug, Clone)]
pub struct Inputs {
    inner: KindedCollection<Input>,
}

impl Inputs {
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self::with_kinds(transport, &INPUT_KINDS)
    }

    /// An inputs collection over a different kind table.
    pub fn with_kinds(transport: Arc<dyn Transport>, kinds: &'static KindMap) -> Self {
        Self {
            inner: KindedCollection::new(transport, PATH_INPUTS, kinds, |t, path, kind, state| {
                Input::new(t, path, kind, state)
            }),
        }
    }
}

impl Deref for Inputs {
    type Target = KindedCollection<Input>;

    fn deref(&self) -> &Self::Target {
        &self.inner
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use resource_framework::mock::{atom_feed, AtomEntry, MockTransport};
    use resource_framework::{Params, Resource, ResourceError, ResourceMap};

    #[tokio::test]
    async fn test_list_by_kind_skips_missing_kinds() {
        let mock = MockTransport::new();
        mock.expect_get("data/inputs/tcp/raw/").return_ok(
            200,
            atom_feed(&[AtomEntry::new("9997").alternate("/services/data/inputs/tcp/raw/9997")]),
        );
        mock.expect_get("data/inputs/udp/").return_ok(404, "no udp inputs");

        let inputs = Inputs::new(mock.transport()).list(&["tcp", "udp"]).await.unwrap();
        assert_eq!(inputs.len(), 1);
        assert_eq!(inputs[0].kind(), "tcp");
        assert_eq!(inputs[0].path(), "/services/data/inputs/tcp/raw/9997/");
        mock.verify();
    }

    #[tokio::test]
    async fn test_create_posts_to_kind_path() {
        let mock = MockTransport::new();
        mock.expect_post("data/inputs/monitor/").return_ok(201, "");

        let input = Inputs::new(mock.transport())
            .create("monitor", "/var/log/syslog", Params::new().with("index", "main"))
            .await
            .unwrap();
        assert_eq!(input.kind(), "monitor");
        assert!(input.entity().cached().is_none());
        assert_eq!(mock.requests()[0].message.form.get("name"), Some("/var/log/syslog"));
        mock.verify();
    }

    #[tokio::test]
    async fn test_unknown_kind_is_rejected() {
        let mock = MockTransport::new();
        let inputs = Inputs::new(mock.transport());
        assert!(matches!(
            inputs.list(&["carrier-pigeon"]).await,
            Err(ResourceError::InvalidArgument(_))
        ));
        assert_eq!(inputs.kindpath("splunktcp").unwrap(), "tcp/cooked");
        assert_eq!(inputs.kinds().len(), 10);
    }

    #[tokio::test]
    async fn test_contains_spans_all_kinds() {
        let mock = MockTransport::new();
        for kind in INPUT_KINDS.kinds() {
            let path = format!("data/inputs/{}/", INPUT_KINDS.subpath(kind).unwrap());
            if kind == "script" {
                mock.expect_get(path).return_ok(
                    200,
                    atom_feed(&[AtomEntry::new("backup.sh")
                        .alternate("/services/data/inputs/script/backup.sh")]),
                );
            } else {
                mock.expect_get(path).return_ok(404, "");
            }
        }
        assert!(Inputs::new(mock.transport()).contains("backup.sh").await.unwrap());
        mock.verify();
    }
}
