//
//  scm-bitbucket
//  webhook/event.rs
//
//  Created by Ngonidzashe Mangudya on 2026/01/12.
//  Copyright (c) 2025 IAMNGONI. All rights reserved.
//

//! # Webhook Events
//!
//! Bitbucket identifies each delivery with an `x-event-key` header of the
//! form `category:action`. Only push and pull request events are turned
//! into [`CanonicalEvent`]s:
//!
//! | Event key | Type | Action |
//! |-----------|------|--------|
//! | `repo:push` | `repo` | `push` |
//! | `pullrequest:created` | `pr` | `opened` |
//! | `pullrequest:updated` | `pr` | `synchronized` |
//! | `pullrequest:fulfilled` | `pr` | `closed` (merged) |
//! | `pullrequest:rejected` | `pr` | `closed` |
//!
//! Every other key is recognized but ignored: parsing returns `Ok(None)`.

use reqwest::header::HeaderMap;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::api::cloud::{PullRequest, Repository, User};
use crate::api::common::{Result, ScmError};
use crate::config::{host_of_url, same_host};

/// Header carrying `category:action`.
pub const EVENT_KEY_HEADER: &str = "x-event-key";

/// Header carrying the delivery id.
pub const REQUEST_UUID_HEADER: &str = "x-request-uuid";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum EventType {
    Repo,
    Pr,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum EventAction {
    Push,
    Opened,
    Synchronized,
    Closed,
}

/// Fields specific to the event type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum EventDetails {
    #[serde(rename_all = "camelCase")]
    Push { last_commit_message: String },

    #[serde(rename_all = "camelCase")]
    PullRequest {
        pr_num: u64,
        /// Source branch of the pull request.
        pr_ref: String,
        pr_merged: bool,
        pr_title: String,
    },
}

/// A webhook delivery in the orchestrator's vocabulary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CanonicalEvent {
    #[serde(rename = "type")]
    pub event_type: EventType,
    pub action: EventAction,
    /// UUID of the actor.
    pub username: String,
    pub checkout_url: String,
    /// Pushed branch, or the target branch of a pull request.
    pub branch: String,
    pub sha: String,
    pub hook_id: String,
    pub scm_context: String,
    #[serde(flatten)]
    pub details: EventDetails,
}

impl CanonicalEvent {
    /// Whether this closes a pull request by merging it.
    pub fn is_merge(&self) -> bool {
        matches!(self.details, EventDetails::PullRequest { pr_merged: true, .. })
    }
}

#[derive(Debug, Deserialize)]
struct HookPayload {
    #[serde(default)]
    actor: User,

    #[serde(default)]
    repository: Option<Repository>,

    #[serde(default)]
    push: Option<PushPayload>,

    #[serde(default)]
    pullrequest: Option<PullRequest>,
}

#[derive(Debug, Deserialize)]
struct PushPayload {
    #[serde(default)]
    changes: Vec<PushChange>,
}

#[derive(Debug, Deserialize)]
struct PushChange {
    /// `None` when the branch was deleted.
    #[serde(default)]
    new: Option<PushRef>,
}

#[derive(Debug, Deserialize)]
struct PushRef {
    name: String,
    target: PushTarget,
}

#[derive(Debug, Deserialize)]
struct PushTarget {
    hash: String,
    #[serde(default)]
    message: String,
}

/// Parses webhook deliveries for one Bitbucket host.
#[derive(Debug, Clone)]
pub struct EventNormalizer {
    hostname: String,
    scm_context: String,
}

impl EventNormalizer {
    pub fn new(hostname: impl Into<String>) -> Self {
        let hostname = hostname.into();
        let scm_context = format!("bitbucket:{}", hostname);
        Self {
            hostname,
            scm_context,
        }
    }

    /// Parses a delivery.
    ///
    /// Returns `Ok(None)` for events that carry no build trigger: unhandled
    /// event keys and pushes that deleted a branch.
    ///
    /// # Errors
    ///
    /// - [`ScmError::MalformedPayload`] when the event key header, the
    ///   repository link or a required event field is missing
    /// - [`ScmError::HostMismatch`] when the repository lives on another host
    pub fn parse_hook(
        &self,
        headers: &HeaderMap,
        payload: &serde_json::Value,
    ) -> Result<Option<CanonicalEvent>> {
        let event_key = header(headers, EVENT_KEY_HEADER)
            .ok_or_else(|| ScmError::MalformedPayload(format!("missing {} header", EVENT_KEY_HEADER)))?;
        let hook_id = header(headers, REQUEST_UUID_HEADER).unwrap_or_default();

        let payload = HookPayload::deserialize(payload)
            .map_err(|err| ScmError::MalformedPayload(err.to_string()))?;
        let repository = payload
            .repository
            .as_ref()
            .ok_or_else(|| ScmError::MalformedPayload("missing repository".to_string()))?;
        let link = repository
            .links
            .html
            .as_ref()
            .map(|link| link.href.as_str())
            .ok_or_else(|| ScmError::MalformedPayload("missing repository link".to_string()))?;
        let link_host = host_of_url(link)
            .ok_or_else(|| ScmError::MalformedPayload(format!("unparseable repository link {}", link)))?;
        if !same_host(&link_host, &self.hostname) {
            return Err(ScmError::HostMismatch(link_host));
        }

        let (category, action) = event_key.split_once(':').unwrap_or((event_key.as_str(), ""));
        let checkout_url = format!("https://{}/{}.git", self.hostname, repository.full_name);

        let event = Event {
            username: payload.actor.uuid.clone(),
            checkout_url,
            hook_id: hook_id.clone(),
        };

        match (category, action) {
            ("repo", "push") => self.push_event(event, &payload),
            ("pullrequest", "created") => self.pr_event(event, &payload, EventAction::Opened, false),
            ("pullrequest", "updated") => {
                self.pr_event(event, &payload, EventAction::Synchronized, false)
            }
            ("pullrequest", "fullfilled") | ("pullrequest", "fulfilled") => {
                self.pr_event(event, &payload, EventAction::Closed, true)
            }
            ("pullrequest", "rejected") => self.pr_event(event, &payload, EventAction::Closed, false),
            _ => {
                debug!(event_key = %event_key, hook_id = %hook_id, "Ignoring unhandled event");
                Ok(None)
            }
        }
    }

    /// Whether this adapter understands the delivery.
    ///
    /// Ignored events count as understood; only deliveries that fail to
    /// parse do not.
    pub fn can_handle(&self, headers: &HeaderMap, payload: &serde_json::Value) -> bool {
        self.parse_hook(headers, payload).is_ok()
    }

    fn push_event(&self, event: Event, payload: &HookPayload) -> Result<Option<CanonicalEvent>> {
        let change = payload
            .push
            .as_ref()
            .and_then(|push| push.changes.first())
            .ok_or_else(|| ScmError::MalformedPayload("push without changes".to_string()))?;

        let Some(new) = &change.new else {
            debug!(hook_id = %event.hook_id, "Ignoring branch deletion");
            return Ok(None);
        };

        Ok(Some(CanonicalEvent {
            event_type: EventType::Repo,
            action: EventAction::Push,
            username: event.username,
            checkout_url: event.checkout_url,
            branch: new.name.clone(),
            sha: new.target.hash.clone(),
            hook_id: event.hook_id,
            scm_context: self.scm_context.clone(),
            details: EventDetails::Push {
                last_commit_message: new.target.message.clone(),
            },
        }))
    }

    fn pr_event(
        &self,
        event: Event,
        payload: &HookPayload,
        action: EventAction,
        fulfilled: bool,
    ) -> Result<Option<CanonicalEvent>> {
        let pr = payload
            .pullrequest
            .as_ref()
            .ok_or_else(|| ScmError::MalformedPayload("missing pullrequest".to_string()))?;

        Ok(Some(CanonicalEvent {
            event_type: EventType::Pr,
            action,
            username: event.username,
            checkout_url: event.checkout_url,
            branch: pr.destination.branch.name.clone(),
            sha: pr.source.hash(),
            hook_id: event.hook_id,
            scm_context: self.scm_context.clone(),
            details: EventDetails::PullRequest {
                pr_num: pr.id,
                pr_ref: pr.source.branch.name.clone(),
                pr_merged: fulfilled && pr.state == "MERGED",
                pr_title: pr.title.clone(),
            },
        }))
    }
}

/// Fields shared by every event type.
struct Event {
    username: String,
    checkout_url: String,
    hook_id: String,
}

fn header(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get(name)
        .and_then(|value| value.to_str().ok())
        .map(String::from)
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::header::HeaderValue;
    use serde_json::json;

    fn headers(event_key: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(EVENT_KEY_HEADER, HeaderValue::from_str(event_key).unwrap());
        headers.insert(
            REQUEST_UUID_HEADER,
            HeaderValue::from_static("1e8d4e8e-5fcf-4624-b091-b10bd6ecaf5e"),
        );
        headers
    }

    fn repository(host: &str) -> serde_json::Value {
        json!({
            "full_name": "batman/test",
            "uuid": "{de7d7695-1196-46a1-b87d-371b7b2945ab}",
            "links": { "html": { "href": format!("https://{}/batman/test", host) } }
        })
    }

    fn actor() -> serde_json::Value {
        json!({ "uuid": "{4f1a9b70-5324-4084-8a3d-b9da5a1ef40b}", "display_name": "Batman" })
    }

    fn push_payload() -> serde_json::Value {
        json!({
            "actor": actor(),
            "repository": repository("bitbucket.org"),
            "push": {
                "changes": [{
                    "new": {
                        "type": "branch",
                        "name": "stuff",
                        "target": { "hash": "9ff49b2d1437567cad2b5fed7a0706472131e927", "message": "testing\n" }
                    }
                }]
            }
        })
    }

    fn pr_payload(state: &str) -> serde_json::Value {
        json!({
            "actor": actor(),
            "repository": repository("bitbucket.org"),
            "pullrequest": {
                "id": 7,
                "title": "Add feature",
                "state": state,
                "source": { "branch": { "name": "mynewbranch" }, "commit": { "hash": "40171b678527" } },
                "destination": { "branch": { "name": "master" }, "commit": { "hash": "0ef4c1d6cf9a" } }
            }
        })
    }

    fn normalizer() -> EventNormalizer {
        EventNormalizer::new("bitbucket.org")
    }

    #[test]
    fn test_push_event() {
        let event = normalizer()
            .parse_hook(&headers("repo:push"), &push_payload())
            .unwrap()
            .unwrap();

        assert_eq!(event.event_type, EventType::Repo);
        assert_eq!(event.action, EventAction::Push);
        assert_eq!(event.branch, "stuff");
        assert_eq!(event.sha, "9ff49b2d1437567cad2b5fed7a0706472131e927");
        assert_eq!(event.checkout_url, "https://bitbucket.org/batman/test.git");
        assert_eq!(event.username, "{4f1a9b70-5324-4084-8a3d-b9da5a1ef40b}");
        assert_eq!(event.hook_id, "1e8d4e8e-5fcf-4624-b091-b10bd6ecaf5e");
        assert_eq!(event.scm_context, "bitbucket:bitbucket.org");
        assert_eq!(
            event.details,
            EventDetails::Push {
                last_commit_message: "testing\n".to_string()
            }
        );
    }

    #[test]
    fn test_pr_actions() {
        let cases = [
            ("pullrequest:created", "OPEN", EventAction::Opened, false),
            ("pullrequest:updated", "OPEN", EventAction::Synchronized, false),
            ("pullrequest:fullfilled", "MERGED", EventAction::Closed, true),
            ("pullrequest:fulfilled", "MERGED", EventAction::Closed, true),
            ("pullrequest:rejected", "DECLINED", EventAction::Closed, false),
        ];

        for (key, state, action, merged) in cases {
            let event = normalizer()
                .parse_hook(&headers(key), &pr_payload(state))
                .unwrap()
                .unwrap();
            assert_eq!(event.event_type, EventType::Pr, "{}", key);
            assert_eq!(event.action, action, "{}", key);
            assert_eq!(event.is_merge(), merged, "{}", key);
        }
    }

    #[test]
    fn test_fulfilled_requires_merged_state() {
        let event = normalizer()
            .parse_hook(&headers("pullrequest:fulfilled"), &pr_payload("OPEN"))
            .unwrap()
            .unwrap();
        assert!(!event.is_merge());
    }

    #[test]
    fn test_pr_event_fields() {
        let event = normalizer()
            .parse_hook(&headers("pullrequest:created"), &pr_payload("OPEN"))
            .unwrap()
            .unwrap();

        assert_eq!(event.branch, "master");
        assert_eq!(event.sha, "40171b678527");
        assert_eq!(
            event.details,
            EventDetails::PullRequest {
                pr_num: 7,
                pr_ref: "mynewbranch".to_string(),
                pr_merged: false,
                pr_title: "Add feature".to_string(),
            }
        );
    }

    #[test]
    fn test_serialized_shape() {
        let event = normalizer()
            .parse_hook(&headers("pullrequest:fullfilled"), &pr_payload("MERGED"))
            .unwrap()
            .unwrap();
        let value = serde_json::to_value(&event).unwrap();

        assert_eq!(value["type"], "pr");
        assert_eq!(value["action"], "closed");
        assert_eq!(value["prMerged"], true);
        assert_eq!(value["prNum"], 7);
        assert_eq!(value["checkoutUrl"], "https://bitbucket.org/batman/test.git");
    }

    #[test]
    fn test_unhandled_events_are_none() {
        let payload = push_payload();
        assert!(normalizer()
            .parse_hook(&headers("repo:fork"), &payload)
            .unwrap()
            .is_none());
        assert!(normalizer()
            .parse_hook(&headers("issue:created"), &payload)
            .unwrap()
            .is_none());
        assert!(normalizer().can_handle(&headers("pullrequest:approved"), &payload));
    }

    #[test]
    fn test_branch_deletion_is_none() {
        let mut payload = push_payload();
        payload["push"]["changes"][0]["new"] = serde_json::Value::Null;

        assert!(normalizer()
            .parse_hook(&headers("repo:push"), &payload)
            .unwrap()
            .is_none());
    }

    #[test]
    fn test_host_mismatch() {
        let mut payload = push_payload();
        payload["repository"] = repository("bitbucket.example.com");

        let err = normalizer()
            .parse_hook(&headers("repo:push"), &payload)
            .unwrap_err();
        assert!(matches!(err, ScmError::HostMismatch(ref host) if host == "bitbucket.example.com"));
        assert!(err.is_status(400));
        assert!(!normalizer().can_handle(&headers("repo:push"), &payload));
    }

    #[test]
    fn test_malformed_payloads() {
        let mut payload = push_payload();
        payload["repository"]["links"] = json!({});
        assert!(matches!(
            normalizer().parse_hook(&headers("repo:push"), &payload),
            Err(ScmError::MalformedPayload(_))
        ));

        assert!(!normalizer().can_handle(&HeaderMap::new(), &push_payload()));

        let mut payload = push_payload();
        payload["push"]["changes"] = json!([]);
        assert!(!normalizer().can_handle(&headers("repo:push"), &payload));
    }
}
