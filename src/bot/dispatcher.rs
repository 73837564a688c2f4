//! Event dispatcher.
//!
//! Runs every event through validation, the permission gate and the
//! moderation stages, and hands back the actions to carry out. Each event
//! either yields its full action list or an error with nothing mutated.

use std::sync::Arc;
use std::sync::atomic::{AtomicI64, Ordering};

use chrono::{DateTime, Utc};
use futures::future::join_all;
use tracing::{debug, info, warn};

use super::actions::{Action, ActionList};
use super::error::EngineError;
use super::event::{EventKind, ModerationEvent};
use crate::cache::CacheConfig;
use crate::config::Settings;
use crate::database::{ConfigStore, GroupConfig, HistoryEntry, UserRecord};
use crate::events::{FilterEngine, FloodGuard, FloodVerdict, HistoryTracker};
use crate::i18n::get_text;
use crate::permissions::{AdminLookup, PermissionGate};
use crate::plugins::{self, Command, CommandContext};
use crate::state::{KeyedState, Slot};
use crate::utils::render;

/// Shared engine state. Safe to use from many tasks at once.
pub struct Dispatcher {
    /// Per-group configuration.
    pub(crate) groups: KeyedState<GroupConfig>,

    /// User records and name history.
    pub(crate) history: HistoryTracker,

    /// Per (group, user) message counters.
    pub(crate) flood: FloodGuard,

    /// Compiled keyword matchers.
    pub(crate) filters: FilterEngine,

    pub(crate) permissions: PermissionGate,

    /// Newest event time seen, in milliseconds. Flood pruning runs on this
    /// clock so replayed or backdated streams keep their windows.
    latest_event: AtomicI64,
}

impl Dispatcher {
    pub fn new(
        store: Arc<dyn ConfigStore>,
        lookup: Arc<dyn AdminLookup>,
        settings: Settings,
    ) -> Self {
        Self {
            groups: KeyedState::new("group_configs", CacheConfig::group_configs(), store.clone()),
            history: HistoryTracker::new(store, settings.history_limit, settings.owner_ids),
            flood: FloodGuard::new(settings.flood_window),
            filters: FilterEngine::new(),
            permissions: PermissionGate::new(lookup),
            latest_event: AtomicI64::new(i64::MIN),
        }
    }

    /// Process one event.
    pub async fn handle(&self, event: &ModerationEvent) -> Result<Vec<Action>, EngineError> {
        event.validate()?;
        self.latest_event.fetch_max(event.at.timestamp_millis(), Ordering::AcqRel);

        let group = self.group(event.chat_id).await?;
        let user = self.history.resolve(event.actor.user_id).await?;

        let actions = match &event.kind {
            EventKind::MemberJoined => self.on_member_change(event, &group, &user, true).await?,
            EventKind::MemberLeft => self.on_member_change(event, &group, &user, false).await?,
            EventKind::Message { text } => self.on_message(event, text, &group, &user).await?,
            EventKind::Command { command } => {
                self.on_command(event, command, &group, &user).await?
            }
        };

        debug!(
            "Event in chat {} from user {} produced {} actions",
            event.chat_id,
            event.actor.user_id,
            actions.len()
        );
        Ok(actions.into_vec())
    }

    /// Process a batch concurrently. Results keep the order of `events`.
    pub async fn handle_many(
        &self,
        events: &[ModerationEvent],
    ) -> Vec<Result<Vec<Action>, EngineError>> {
        join_all(events.iter().map(|event| self.handle(event))).await
    }

    /// Name history for a user, oldest first.
    pub async fn query_history(&self, user_id: u64) -> Result<Vec<HistoryEntry>, EngineError> {
        Ok(self.history.query_history(user_id).await?)
    }

    /// Current config for a group, defaults if never configured.
    pub async fn group_config(&self, chat_id: i64) -> Result<GroupConfig, EngineError> {
        Ok(self.group(chat_id).await?.snapshot())
    }

    /// Drop flood counters that expired before the newest event seen so far.
    /// Returns how many were removed.
    pub fn prune_flood(&self) -> usize {
        let Some(now) = self.latest_event_time() else {
            return 0;
        };
        let pruned = self.flood.prune(now);
        if pruned > 0 {
            debug!("Pruned {} expired flood counters as of {}", pruned, now);
        }
        pruned
    }

    /// Release cached group configs and user records that no event is using.
    pub fn evict_idle(&self) -> usize {
        self.groups.evict_idle() + self.history.evict_idle()
    }

    fn latest_event_time(&self) -> Option<DateTime<Utc>> {
        match self.latest_event.load(Ordering::Acquire) {
            i64::MIN => None,
            millis => DateTime::from_timestamp_millis(millis),
        }
    }

    async fn group(&self, chat_id: i64) -> Result<Slot<GroupConfig>, EngineError> {
        Ok(self
            .groups
            .resolve(chat_id, move || GroupConfig::new(chat_id))
            .await?)
    }

    async fn on_member_change(
        &self,
        event: &ModerationEvent,
        group: &Slot<GroupConfig>,
        user: &Slot<UserRecord>,
        joined: bool,
    ) -> Result<ActionList, EngineError> {
        let config = group.snapshot();
        let mut out = ActionList::new(config.log_channel);

        let template = match joined {
            true if config.welcome_enabled => Some(config.welcome_template()),
            false if config.goodbye_enabled => Some(config.goodbye_template()),
            _ => None,
        };
        if let Some(template) = template {
            out.reply(event.chat_id, render(template, &event.actor));
        }

        self.history.observe(user, &event.actor, event.at).await?;
        Ok(out)
    }

    async fn on_message(
        &self,
        event: &ModerationEvent,
        text: &str,
        group: &Slot<GroupConfig>,
        user: &Slot<UserRecord>,
    ) -> Result<ActionList, EngineError> {
        let config = group.snapshot();
        let actor = &event.actor;
        let mut out = ActionList::new(config.log_channel);

        // Commit first: the flood counter cannot be rolled back, so it only
        // moves once nothing left in this event can fail or be cancelled.
        self.history.observe(user, actor, event.at).await?;

        if config.is_blacklisted(actor.user_id) {
            info!("Blocked message from banned user {} in chat {}", actor.user_id, event.chat_id);
            out.moderate(
                Action::Ban {
                    chat_id: event.chat_id,
                    user_id: actor.user_id,
                    until: None,
                },
                get_text("ban.log_blocked").replace("{user}", &actor.label()),
            );
        } else if self.flood.check(&config, actor.user_id, event.at) == FloodVerdict::Triggered {
            plugins::antiflood::apply_penalty(
                &config,
                actor,
                event.at,
                self.flood.window().num_seconds(),
                &mut out,
            );
        } else if let Some(response) = self.filters.response(&config, text) {
            out.reply(event.chat_id, response);
        }

        Ok(out)
    }

    async fn on_command(
        &self,
        event: &ModerationEvent,
        command: &Command,
        group: &Slot<GroupConfig>,
        user: &Slot<UserRecord>,
    ) -> Result<ActionList, EngineError> {
        let record = user.snapshot();
        let level = command.required_level();

        if !self
            .permissions
            .authorize(&record, event.chat_id, level)
            .await?
        {
            warn!(
                "User {} may not run /{} in chat {} (needs {:?})",
                event.actor.user_id,
                command.name(),
                event.chat_id,
                level
            );
            let mut out = ActionList::new(None);
            out.reply(event.chat_id, get_text("common.not_authorized"));
            return Ok(out);
        }

        let ctx = CommandContext {
            state: self,
            event,
            group,
        };
        plugins::execute(&ctx, command).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bot::{Actor, ValidationError};
    use crate::database::testing::GatedStore;
    use crate::database::{FloodPenalty, MemoryStore};
    use crate::permissions::{LookupError, StaticAdminLookup};
    use crate::utils::MAX_DURATION_SECS;
    use async_trait::async_trait;
    use chrono::TimeZone;
    use futures::FutureExt;

    const CHAT: i64 = -100;
    const ADMIN: u64 = 1;
    const OWNER: u64 = 99;

    struct FailingLookup;

    #[async_trait]
    impl AdminLookup for FailingLookup {
        async fn is_group_admin(&self, chat_id: i64, user_id: u64) -> Result<bool, LookupError> {
            Err(LookupError {
                chat_id,
                user_id,
                reason: "platform unreachable".to_string(),
            })
        }
    }

    fn at(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(1_700_000_000 + secs, 0).unwrap()
    }

    fn setup() -> (Arc<MemoryStore>, Dispatcher) {
        let store = Arc::new(MemoryStore::new());
        let settings = Settings {
            owner_ids: vec![OWNER],
            ..Settings::default()
        };
        let dispatcher = Dispatcher::new(
            store.clone(),
            Arc::new(StaticAdminLookup::new([(CHAT, ADMIN)])),
            settings,
        );
        (store, dispatcher)
    }

    fn gated_setup() -> (Arc<GatedStore>, Dispatcher) {
        let store = Arc::new(GatedStore::new());
        let dispatcher = Dispatcher::new(
            store.clone(),
            Arc::new(StaticAdminLookup::new([(CHAT, ADMIN)])),
            Settings::default(),
        );
        (store, dispatcher)
    }

    fn admin() -> Actor {
        Actor::new(ADMIN, "Alice").with_username("alice")
    }

    fn ann() -> Actor {
        Actor::new(2, "Ann").with_username("ann")
    }

    async fn run(dispatcher: &Dispatcher, actor: Actor, command: Command) -> Vec<Action> {
        dispatcher
            .handle(&ModerationEvent::command(CHAT, actor, at(0), command))
            .await
            .unwrap()
    }

    fn replies(actions: &[Action]) -> Vec<&str> {
        actions
            .iter()
            .filter_map(|a| match a {
                Action::Reply { text, .. } => Some(text.as_str()),
                _ => None,
            })
            .collect()
    }

    #[tokio::test]
    async fn test_welcome_renders_once_without_log() {
        let (_, dispatcher) = setup();
        run(&dispatcher, admin(), Command::SetWelcome { text: "Welcome {first}!".to_string() }).await;
        run(&dispatcher, admin(), Command::Welcome { enabled: true }).await;

        let event = ModerationEvent::new(CHAT, Actor::new(5, "Ann"), at(1), EventKind::MemberJoined);
        let actions = dispatcher.handle(&event).await.unwrap();

        assert_eq!(
            actions,
            vec![Action::Reply {
                chat_id: CHAT,
                text: "Welcome Ann!".to_string()
            }]
        );
    }

    #[tokio::test]
    async fn test_disabled_greetings_produce_nothing() {
        let (_, dispatcher) = setup();
        let joined = ModerationEvent::new(CHAT, ann(), at(0), EventKind::MemberJoined);
        let left = ModerationEvent::new(CHAT, ann(), at(1), EventKind::MemberLeft);

        assert!(dispatcher.handle(&joined).await.unwrap().is_empty());
        assert!(dispatcher.handle(&left).await.unwrap().is_empty());
        // Membership events still record the member's name.
        assert_eq!(dispatcher.query_history(2).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_goodbye_uses_default_template() {
        let (_, dispatcher) = setup();
        run(&dispatcher, admin(), Command::Goodbye { enabled: true }).await;

        let event = ModerationEvent::new(CHAT, ann(), at(1), EventKind::MemberLeft);
        let actions = dispatcher.handle(&event).await.unwrap();
        assert_eq!(replies(&actions), vec!["Goodbye, Ann!"]);
    }

    #[tokio::test]
    async fn test_non_admin_gets_single_denial() {
        let (store, dispatcher) = setup();
        let before = dispatcher.group_config(CHAT).await.unwrap();

        let actions = run(&dispatcher, ann(), Command::SetFlood { threshold: 1 }).await;

        assert_eq!(
            actions,
            vec![Action::Reply {
                chat_id: CHAT,
                text: get_text("common.not_authorized")
            }]
        );
        assert_eq!(dispatcher.group_config(CHAT).await.unwrap(), before);
        assert_eq!(store.write_count(), 0);
    }

    #[tokio::test]
    async fn test_group_admin_cannot_promote() {
        let (_, dispatcher) = setup();
        let actions = run(&dispatcher, admin(), Command::Promote { target: ann() }).await;
        assert_eq!(replies(&actions), vec![get_text("common.not_authorized").as_str()]);

        let actions = run(&dispatcher, Actor::new(OWNER, "Owner"), Command::Promote { target: ann() }).await;
        assert!(replies(&actions)[0].contains("is now a global admin"));

        // Ann can now edit config in any group without being a group admin.
        let actions = run(&dispatcher, ann(), Command::SetFlood { threshold: 3 }).await;
        assert!(actions.iter().any(|a| matches!(a, Action::ConfigChanged { .. })));
    }

    #[tokio::test]
    async fn test_flood_penalty_with_log_skips_filters() {
        let (_, dispatcher) = setup();
        run(&dispatcher, admin(), Command::SetFlood { threshold: 2 }).await;
        run(&dispatcher, admin(), Command::SetLog { channel: -900 }).await;
        run(
            &dispatcher,
            admin(),
            Command::AddFilter {
                keyword: "hello".to_string(),
                response: "Hi there".to_string(),
            },
        )
        .await;

        for i in 0..2 {
            let event = ModerationEvent::message(CHAT, ann(), at(i), "hello");
            let actions = dispatcher.handle(&event).await.unwrap();
            assert_eq!(replies(&actions), vec!["Hi there"]);
        }

        let event = ModerationEvent::message(CHAT, ann(), at(2), "hello");
        let actions = dispatcher.handle(&event).await.unwrap();

        assert_eq!(actions.len(), 3);
        assert_eq!(
            actions[0],
            Action::Mute {
                chat_id: CHAT,
                user_id: 2,
                until: None
            }
        );
        assert!(matches!(actions[1], Action::Log { channel: -900, .. }));
        assert!(matches!(&actions[2], Action::Reply { text, .. } if text.contains("flooding")));
    }

    #[tokio::test]
    async fn test_flood_without_log_channel() {
        let (_, dispatcher) = setup();
        run(&dispatcher, admin(), Command::SetFlood { threshold: 1 }).await;
        run(
            &dispatcher,
            admin(),
            Command::SetFloodPenalty {
                penalty: FloodPenalty::Kick,
                duration_secs: 600,
            },
        )
        .await;

        dispatcher.handle(&ModerationEvent::message(CHAT, ann(), at(0), "a")).await.unwrap();
        let actions = dispatcher
            .handle(&ModerationEvent::message(CHAT, ann(), at(1), "b"))
            .await
            .unwrap();

        assert_eq!(actions.len(), 2);
        assert_eq!(actions[0], Action::Kick { chat_id: CHAT, user_id: 2 });
        assert!(!actions.iter().any(|a| matches!(a, Action::Log { .. })));
    }

    #[tokio::test]
    async fn test_filter_reply_is_verbatim() {
        let (_, dispatcher) = setup();
        run(
            &dispatcher,
            admin(),
            Command::AddFilter {
                keyword: "Rules".to_string(),
                response: "Read {first} the pinned message".to_string(),
            },
        )
        .await;

        let actions = dispatcher
            .handle(&ModerationEvent::message(CHAT, ann(), at(0), "where are the RULES?"))
            .await
            .unwrap();
        assert_eq!(replies(&actions), vec!["Read {first} the pinned message"]);

        let actions = dispatcher
            .handle(&ModerationEvent::message(CHAT, ann(), at(1), "rulesless"))
            .await
            .unwrap();
        assert!(actions.is_empty());
    }

    #[tokio::test]
    async fn test_duplicate_filter_is_a_reply() {
        let (_, dispatcher) = setup();
        let add = || Command::AddFilter {
            keyword: "spam".to_string(),
            response: "no spam".to_string(),
        };

        run(&dispatcher, admin(), add()).await;
        let before = dispatcher.group_config(CHAT).await.unwrap();

        let actions = run(&dispatcher, admin(), add()).await;
        assert_eq!(actions.len(), 1);
        assert!(replies(&actions)[0].contains("already exists"));
        assert_eq!(dispatcher.group_config(CHAT).await.unwrap(), before);
    }

    #[tokio::test]
    async fn test_ban_blacklists_and_blocks_later_messages() {
        let (_, dispatcher) = setup();
        run(&dispatcher, admin(), Command::SetLog { channel: -900 }).await;

        let actions = run(&dispatcher, admin(), Command::Ban { target: ann() }).await;
        assert!(matches!(actions[0], Action::Ban { user_id: 2, .. }));
        assert!(matches!(&actions[1], Action::Log { text, .. } if text.contains("banned by Alice")));
        assert!(dispatcher.group_config(CHAT).await.unwrap().is_blacklisted(2));

        let actions = dispatcher
            .handle(&ModerationEvent::message(CHAT, ann(), at(1), "hi"))
            .await
            .unwrap();
        assert_eq!(actions.len(), 2);
        assert!(matches!(actions[0], Action::Ban { user_id: 2, until: None, .. }));
        assert!(matches!(&actions[1], Action::Log { text, .. } if text.contains("Blocked")));

        run(&dispatcher, admin(), Command::Unban { target: ann() }).await;
        assert!(!dispatcher.group_config(CHAT).await.unwrap().is_blacklisted(2));
    }

    #[tokio::test]
    async fn test_timed_mute_and_unmute() {
        let (_, dispatcher) = setup();
        let actions = run(
            &dispatcher,
            admin(),
            Command::Mute {
                target: ann(),
                duration_secs: Some(600),
            },
        )
        .await;
        assert_eq!(
            actions[0],
            Action::Mute {
                chat_id: CHAT,
                user_id: 2,
                until: Some(at(600))
            }
        );
        assert!(replies(&actions)[0].contains("10 minutes"));

        let actions = run(&dispatcher, admin(), Command::Unmute { target: ann() }).await;
        assert_eq!(actions[0], Action::Unmute { chat_id: CHAT, user_id: 2 });
    }

    #[tokio::test]
    async fn test_store_outage_aborts_without_actions() {
        let (store, dispatcher) = setup();
        store.set_offline(true);

        let result = dispatcher
            .handle(&ModerationEvent::message(CHAT, ann(), at(0), "hello"))
            .await;
        assert!(matches!(result, Err(EngineError::Store(_))));
    }

    #[tokio::test]
    async fn test_failed_commit_leaves_config_unchanged() {
        let (store, dispatcher) = setup();
        let before = dispatcher.group_config(CHAT).await.unwrap();
        dispatcher.history.resolve(ADMIN).await.unwrap();

        store.set_offline(true);
        let result = dispatcher
            .handle(&ModerationEvent::command(CHAT, admin(), at(0), Command::Welcome { enabled: true }))
            .await;
        assert!(matches!(result, Err(EngineError::Store(_))));

        store.set_offline(false);
        assert_eq!(dispatcher.group_config(CHAT).await.unwrap(), before);
    }

    #[tokio::test]
    async fn test_lookup_failure_is_an_error() {
        let dispatcher = Dispatcher::new(
            Arc::new(MemoryStore::new()),
            Arc::new(FailingLookup),
            Settings::default(),
        );
        let result = dispatcher
            .handle(&ModerationEvent::command(CHAT, ann(), at(0), Command::UnsetLog))
            .await;
        assert!(matches!(result, Err(EngineError::AdminLookup(_))));

        // Commands open to anyone never ask the lookup.
        let actions = dispatcher
            .handle(&ModerationEvent::command(CHAT, ann(), at(0), Command::LogStatus))
            .await
            .unwrap();
        assert_eq!(actions.len(), 1);
    }

    #[tokio::test]
    async fn test_invalid_event_rejected() {
        let (store, dispatcher) = setup();
        let result = dispatcher
            .handle(&ModerationEvent::message(0, ann(), at(0), "hi"))
            .await;
        assert!(matches!(result, Err(EngineError::Validation(_))));
        assert!(!result.unwrap_err().is_retryable());
        assert_eq!(store.write_count(), 0);
    }

    #[tokio::test]
    async fn test_history_command() {
        let (_, dispatcher) = setup();
        dispatcher
            .handle(&ModerationEvent::message(CHAT, Actor::new(2, "Ann").with_username("old"), at(0), "hi"))
            .await
            .unwrap();
        dispatcher
            .handle(&ModerationEvent::message(CHAT, ann(), at(1), "hi"))
            .await
            .unwrap();

        let actions = run(&dispatcher, ann(), Command::History { username: None }).await;
        let text = replies(&actions)[0];
        assert!(text.starts_with("Your name history:"));
        assert!(text.contains("Ann (@old)"));
        assert!(text.contains("Ann (@ann)"));

        let actions = run(
            &dispatcher,
            admin(),
            Command::History {
                username: Some("@old".to_string()),
            },
        )
        .await;
        assert!(replies(&actions)[0].starts_with("History of old:"));

        let actions = run(
            &dispatcher,
            admin(),
            Command::History {
                username: Some("nobody".to_string()),
            },
        )
        .await;
        assert_eq!(replies(&actions), vec!["User not found."]);
    }

    #[tokio::test]
    async fn test_handle_many_keeps_order_and_counts_every_message() {
        let (_, dispatcher) = setup();
        run(&dispatcher, admin(), Command::SetFlood { threshold: 50 }).await;

        let events: Vec<_> = (0..20)
            .map(|i| ModerationEvent::message(CHAT, Actor::new(10 + (i % 4), "User"), at(0), "hi"))
            .collect();
        let results = dispatcher.handle_many(&events).await;

        assert_eq!(results.len(), 20);
        assert!(results.iter().all(|r| r.as_ref().is_ok_and(|a| a.is_empty())));
        for user in 10..14 {
            assert_eq!(dispatcher.flood.state(CHAT, user).unwrap().count, 5);
        }
    }

    #[tokio::test]
    async fn test_prune_follows_event_time() {
        let (_, dispatcher) = setup();
        assert_eq!(dispatcher.prune_flood(), 0);

        for user in 10..14 {
            dispatcher
                .handle(&ModerationEvent::message(CHAT, Actor::new(user, "User"), at(0), "hi"))
                .await
                .unwrap();
        }
        // Still inside their window as far as the event stream is concerned.
        assert_eq!(dispatcher.prune_flood(), 0);

        dispatcher
            .handle(&ModerationEvent::message(CHAT, Actor::new(20, "Late"), at(60), "hi"))
            .await
            .unwrap();
        assert_eq!(dispatcher.prune_flood(), 4);

        // A backdated event does not move the clock back.
        dispatcher
            .handle(&ModerationEvent::message(CHAT, Actor::new(21, "Old"), at(1), "hi"))
            .await
            .unwrap();
        assert_eq!(dispatcher.prune_flood(), 1);
        assert!(dispatcher.flood.state(CHAT, 20).is_some());
    }

    #[tokio::test]
    async fn test_failed_commit_keeps_flood_penalty_for_retry() {
        let (store, dispatcher) = setup();
        run(&dispatcher, admin(), Command::SetFlood { threshold: 1 }).await;

        dispatcher
            .handle(&ModerationEvent::message(CHAT, ann(), at(0), "one"))
            .await
            .unwrap();
        let counted = dispatcher.flood.state(CHAT, 2).unwrap();

        // A new username forces a history write, which fails.
        let renamed = ModerationEvent::message(CHAT, Actor::new(2, "Ann").with_username("ann2"), at(1), "two");
        store.set_offline(true);
        let result = dispatcher.handle(&renamed).await;
        assert!(matches!(result, Err(EngineError::Store(_))));
        assert_eq!(dispatcher.flood.state(CHAT, 2), Some(counted));

        store.set_offline(false);
        let actions = dispatcher.handle(&renamed).await.unwrap();
        assert_eq!(
            actions[0],
            Action::Mute {
                chat_id: CHAT,
                user_id: 2,
                until: None
            }
        );
    }

    #[tokio::test]
    async fn test_dropped_event_leaves_no_trace() {
        let (store, dispatcher) = gated_setup();
        run(&dispatcher, admin(), Command::SetFlood { threshold: 1 }).await;
        dispatcher
            .handle(&ModerationEvent::message(CHAT, ann(), at(0), "one"))
            .await
            .unwrap();
        let counted = dispatcher.flood.state(CHAT, 2).unwrap();

        let renamed = ModerationEvent::message(CHAT, Actor::new(2, "Ann").with_username("ann2"), at(1), "two");
        store.set_stall_writes(true);
        // Polled once, parked inside the history write, then dropped.
        assert!(dispatcher.handle(&renamed).now_or_never().is_none());

        assert_eq!(dispatcher.flood.state(CHAT, 2), Some(counted));
        assert_eq!(dispatcher.query_history(2).await.unwrap().len(), 1);

        store.set_stall_writes(false);
        let actions = dispatcher.handle(&renamed).await.unwrap();
        assert!(matches!(actions[0], Action::Mute { user_id: 2, .. }));
        assert_eq!(dispatcher.query_history(2).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_concurrent_edits_on_one_group_all_land() {
        let (store, dispatcher) = gated_setup();
        store.set_yield_writes(true);

        let add = |keyword: &str| {
            ModerationEvent::command(
                CHAT,
                admin(),
                at(0),
                Command::AddFilter {
                    keyword: keyword.to_string(),
                    response: format!("{keyword}!"),
                },
            )
        };
        let events = [add("one"), add("two"), add("three")];
        let results = dispatcher.handle_many(&events).await;
        assert!(results.iter().all(Result::is_ok));

        let config = dispatcher.group_config(CHAT).await.unwrap();
        assert_eq!(config.filters.len(), 3);
        for keyword in ["one", "two", "three"] {
            assert!(config.get_filter(keyword).is_some());
        }
        assert_eq!(store.get_group_config(CHAT).await.unwrap(), Some(config));
    }

    #[tokio::test]
    async fn test_idle_eviction_keeps_committed_config() {
        let (_, dispatcher) = setup();
        run(&dispatcher, admin(), Command::SetFlood { threshold: 7 }).await;

        // Nothing is in flight, but the slots are fresh, so they stay.
        assert_eq!(dispatcher.evict_idle(), 0);
        assert_eq!(dispatcher.group_config(CHAT).await.unwrap().flood_threshold, 7);
    }

    #[tokio::test]
    async fn test_oversized_mute_is_rejected() {
        let (store, dispatcher) = setup();
        let event = ModerationEvent::command(
            CHAT,
            admin(),
            at(0),
            Command::Mute {
                target: ann(),
                duration_secs: Some(MAX_DURATION_SECS + 1),
            },
        );

        let result = dispatcher.handle(&event).await;
        assert!(matches!(
            result,
            Err(EngineError::Validation(ValidationError::OutOfRange { .. }))
        ));
        assert_eq!(store.write_count(), 0);
    }
}
