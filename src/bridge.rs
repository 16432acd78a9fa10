//! Request/reply correlation over the untyped bus.
//!
//! A request is paired with the first unclaimed inbound message whose kind is
//! in the caller's [`Expect`] set. Nothing else ties a reply to its request, so
//! two in-flight requests expecting the same kind resolve in the order they
//! were issued, whatever the host meant. Without a timeout a request whose
//! reply never comes stays pending forever.

use std::time::Duration;

use crate::bus::ConsoleEndpoint;
use crate::error::ConsoleError;
use crate::protocol::{HostReply, HostRequest, ReplyKind};

/// The reply kinds a request accepts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Expect {
    kinds: Vec<ReplyKind>,
}

impl Expect {
    pub fn only(kind: ReplyKind) -> Self {
        Self { kinds: vec![kind] }
    }

    /// Also accept the host's `error` reply, surfacing it as [`ConsoleError::Host`].
    pub fn or_error(mut self) -> Self {
        if !self.kinds.contains(&ReplyKind::Error) {
            self.kinds.push(ReplyKind::Error);
        }
        self
    }

    pub fn matches(&self, reply: &HostReply) -> bool {
        reply.kind().is_some_and(|k| self.kinds.contains(&k))
    }
}

impl From<ReplyKind> for Expect {
    fn from(kind: ReplyKind) -> Self {
        Self::only(kind)
    }
}

/// Console-side correlator.
#[derive(Clone)]
pub struct Bridge {
    bus: ConsoleEndpoint,
}

impl Bridge {
    pub fn new(bus: ConsoleEndpoint) -> Self {
        Self { bus }
    }

    pub fn endpoint(&self) -> &ConsoleEndpoint {
        &self.bus
    }

    /// Fire-and-forget send; any reply is left for other listeners or dropped.
    pub fn send(&self, request: HostRequest) -> Result<(), ConsoleError> {
        self.bus.send(request)
    }

    /// One round trip with no deadline.
    pub async fn request(
        &self,
        request: HostRequest,
        expect: impl Into<Expect>,
    ) -> Result<HostReply, ConsoleError> {
        self.request_within(request, expect, None).await
    }

    /// One round trip, optionally bounded. The listener is released when the
    /// reply arrives, when the deadline passes, or when the send fails.
    pub async fn request_within(
        &self,
        request: HostRequest,
        expect: impl Into<Expect>,
        deadline: Option<Duration>,
    ) -> Result<HostReply, ConsoleError> {
        let expect = expect.into();
        let name = request.type_name();

        // Listen before sending: the host may answer before `send` returns.
        let pending = {
            let expect = expect.clone();
            self.bus.subscribe_once(move |m| expect.matches(m))
        };
        self.bus.send(request)?;

        let reply = match deadline {
            Some(limit) => tokio::time::timeout(limit, pending.wait())
                .await
                .map_err(|_| {
                    tracing::warn!(
                        request = name,
                        waited_ms = ?limit.as_millis(),
                        "host reply timed out"
                    );
                    ConsoleError::timeout(name, limit)
                })??,
            None => pending.wait().await?,
        };

        tracing::debug!(request = name, reply = ?reply.kind(), "request settled");
        match reply {
            HostReply::Error { context, message } => Err(ConsoleError::Host { context, message }),
            other => Ok(other),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::bus::{HostEndpoint, MessageBus};
    use crate::protocol::{LsSubCommand, UserSummary};

    fn setup() -> (Bridge, HostEndpoint) {
        let (console, host) = MessageBus::channel();
        (Bridge::new(console), host)
    }

    fn analytics(pages: u64) -> HostReply {
        HostReply::AnalyticsData {
            total_pages: pages,
            total_layers_in_document: 0,
            total_layers_in_current_page: 0,
        }
    }

    fn ls(data: &str) -> HostReply {
        HostReply::LsData {
            data: data.into(),
            sub_command: LsSubCommand::Fonts,
        }
    }

    fn ls_request() -> HostRequest {
        HostRequest::GetLsData {
            sub_command: LsSubCommand::Fonts,
            list_current: false,
        }
    }

    #[tokio::test]
    async fn reply_sent_during_send_is_not_lost() {
        let (bridge, mut host) = setup();
        let replier = host.replier();
        let responder = tokio::spawn(async move {
            while let Some(req) = host.next_request().await {
                if req == HostRequest::GetAnalytics {
                    replier.reply(&analytics(4));
                }
            }
        });

        let reply = bridge
            .request(HostRequest::GetAnalytics, ReplyKind::AnalyticsData)
            .await
            .unwrap();
        assert_eq!(reply, analytics(4));
        assert_eq!(bridge.endpoint().listener_count(), 0);
        responder.abort();
    }

    #[tokio::test]
    async fn concurrent_requests_of_different_kinds_never_cross() {
        let (bridge, host) = setup();
        let replier = host.replier();

        let a = bridge.request(HostRequest::GetAnalytics, ReplyKind::AnalyticsData);
        let b = bridge.request(ls_request(), ReplyKind::LsData);
        let replies = async {
            tokio::task::yield_now().await;
            // Reverse order, plus noise that nobody expects.
            replier.reply(&HostReply::Unknown);
            replier.reply(&ls("Inter Regular"));
            replier.reply(&analytics(2));
        };

        let (a, b, ()) = tokio::join!(a, b, replies);
        assert_eq!(a.unwrap(), analytics(2));
        assert_eq!(b.unwrap(), ls("Inter Regular"));
        assert_eq!(bridge.endpoint().listener_count(), 0);
    }

    #[tokio::test]
    async fn same_kind_requests_resolve_first_come_first_served() {
        let (bridge, host) = setup();
        let replier = host.replier();

        let first = bridge.request(ls_request(), ReplyKind::LsData);
        let second = bridge.request(ls_request(), ReplyKind::LsData);
        let replies = async {
            tokio::task::yield_now().await;
            replier.reply(&ls("meant for second"));
            replier.reply(&ls("meant for first"));
        };

        let (first, second, ()) = tokio::join!(first, second, replies);
        // No ids on the wire: the oldest pending request takes the first reply.
        assert_eq!(first.unwrap(), ls("meant for second"));
        assert_eq!(second.unwrap(), ls("meant for first"));
    }

    #[tokio::test(start_paused = true)]
    async fn timeout_is_a_distinct_error_and_releases_the_listener() {
        let (bridge, _host) = setup();
        let err = bridge
            .request_within(
                HostRequest::GetAnalytics,
                ReplyKind::AnalyticsData,
                Some(Duration::from_secs(10)),
            )
            .await
            .unwrap_err();
        assert_eq!(
            err,
            ConsoleError::Timeout {
                request: "get-analytics".into(),
                waited_ms: 10_000
            }
        );
        assert_eq!(bridge.endpoint().listener_count(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn host_error_is_ignored_unless_expected() {
        let (bridge, host) = setup();
        let replier = host.replier();
        let error = HostReply::Error {
            context: "loading pages".into(),
            message: "Error loading pages: timeout".into(),
        };

        let ignored = bridge.request_within(
            HostRequest::GetAnalytics,
            ReplyKind::AnalyticsData,
            Some(Duration::from_secs(1)),
        );
        let post = async {
            tokio::task::yield_now().await;
            replier.reply(&error);
        };
        let (ignored, ()) = tokio::join!(ignored, post);
        assert!(matches!(ignored, Err(ConsoleError::Timeout { .. })));

        let surfaced = bridge.request(
            HostRequest::GetAnalytics,
            Expect::only(ReplyKind::AnalyticsData).or_error(),
        );
        let post = async {
            tokio::task::yield_now().await;
            replier.reply(&error);
        };
        let (surfaced, ()) = tokio::join!(surfaced, post);
        assert_eq!(
            surfaced.unwrap_err(),
            ConsoleError::Host {
                context: "loading pages".into(),
                message: "Error loading pages: timeout".into(),
            }
        );
    }

    #[tokio::test]
    async fn failed_send_releases_the_listener() {
        let (bridge, host) = setup();
        drop(host);
        let err = bridge
            .request(HostRequest::GetUserInfo, ReplyKind::UserInfo)
            .await
            .unwrap_err();
        assert_eq!(err, ConsoleError::BridgeClosed);
        assert_eq!(bridge.endpoint().listener_count(), 0);
    }

    #[tokio::test]
    async fn closing_the_bus_settles_pending_requests() {
        let (bridge, host) = setup();
        let replier = host.replier();
        let pending = bridge.request(HostRequest::GetUserInfo, ReplyKind::UserInfo);
        let close = async {
            tokio::task::yield_now().await;
            replier.close();
        };
        let (result, ()) = tokio::join!(pending, close);
        assert_eq!(result.unwrap_err(), ConsoleError::BridgeClosed);
    }

    #[test]
    fn expect_matches_only_listed_kinds() {
        let expect = Expect::only(ReplyKind::UserInfo);
        let user = HostReply::UserInfo {
            user: Some(UserSummary {
                id: "1".into(),
                name: "Ada".into(),
                email: None,
            }),
            message: None,
        };
        assert!(expect.matches(&user));
        assert!(!expect.matches(&ls("x")));
        assert!(!expect.matches(&HostReply::Unknown));
    }
}
