//! End-to-end tests driving the facade against the simulated runtime.

use std::sync::Arc;
use std::time::Duration;

use eos_sdk::auth::LoginCredentialType;
use eos_sdk::presence::PresenceStatus;
use eos_sdk::sim::{SimAccount, SimOp, SimWorld, SimulatedSdk, definition};
use eos_sdk::{ApplicationStatus, EosResult, EpicAccountId, ProductUserId};
use online_eos::{
    EosSettings, FrameSignals, HostEnvironment, IdentityState, LocalUser, OnlinePlatform,
    OnlinePlatformEos, OnlinePresence, RuntimeOptions,
};
use online_eos::credentials::LoginMethod;
use tempfile::TempDir;

const USER: LocalUser = LocalUser::PRIMARY;

fn settings(encryption_key: Option<String>) -> EosSettings {
    EosSettings {
        product_name: "Integration".to_string(),
        product_version: "1.0".to_string(),
        product_id: "product".to_string(),
        sandbox_id: "sandbox".to_string(),
        deployment_id: "deployment".to_string(),
        client_id: "client".to_string(),
        client_secret: "secret".to_string(),
        encryption_key,
    }
}

struct Harness {
    sdk: SimulatedSdk,
    platform: OnlinePlatformEos,
    _temp: TempDir,
}

impl Harness {
    fn new(world: SimWorld, args: &[&str]) -> Self {
        Self::with_settings(world, args, settings(Some("ab".repeat(32))))
    }

    fn with_settings(world: SimWorld, args: &[&str], settings: EosSettings) -> Self {
        let sdk = SimulatedSdk::new(world);
        let temp = tempfile::tempdir().unwrap();
        let host = HostEnvironment::new(args.iter().map(|a| a.to_string()).collect(), temp.path());
        let runtime = RuntimeOptions::default().with_bridge_timeout(Duration::from_secs(5));
        let mut platform = OnlinePlatformEos::new(Arc::new(sdk.clone()), settings, runtime, host);
        assert!(platform.initialize());
        Self {
            sdk,
            platform,
            _temp: temp,
        }
    }

    /// Tick until the user's login is no longer in flight.
    fn settle(&self) -> IdentityState {
        for _ in 0..100 {
            self.platform.on_update(FrameSignals::foreground());
            let state = self.platform.identity_state(USER);
            if !state.is_pending() {
                return state;
            }
        }
        panic!("login did not settle");
    }

    fn login(&self) -> IdentityState {
        assert!(self.platform.user_login(USER));
        self.settle()
    }

    fn product_user(&self) -> ProductUserId {
        self.platform
            .context()
            .unwrap()
            .product_user_id(USER)
            .unwrap()
    }
}

/// Alice with a launcher code, a game-service user and three achievements.
fn backend() -> (SimWorld, EpicAccountId, ProductUserId) {
    let alice = SimAccount::new("alice");
    let id = alice.id.clone();
    let pid = ProductUserId::generate();
    let world = SimWorld::new()
        .with_exchange_code("abc123", &id)
        .with_product_user(&id, pid.clone())
        .with_definition(definition("first_blood", "First Blood", false))
        .with_definition(definition("explorer", "Explorer", false))
        .with_definition(definition("secret_room", "Secret Room", true))
        .with_progress(&id, "first_blood", 1.0)
        .with_progress(&id, "explorer", 0.25)
        .with_progress(&id, "secret_room", 0.5)
        .with_account(alice);
    (world, id, pid)
}

const EXCHANGE_ARGS: [&str; 2] = ["-AUTH_TYPE=exchangecode", "-AUTH_PASSWORD=abc123"];

#[test]
fn test_friends_before_login_fail_without_remote_call() {
    let (world, _, _) = backend();
    let harness = Harness::new(world, &[]);

    assert!(harness.platform.get_friends(USER).is_none());
    assert!(harness.platform.get_achievements(USER).is_none());
    assert_eq!(harness.sdk.calls(SimOp::QueryFriends), 0);
    assert_eq!(harness.sdk.calls(SimOp::QueryDefinitions), 0);
}

#[test]
fn test_exchange_code_login_links_and_syncs_achievements() {
    let (world, account, pid) = backend();
    let harness = Harness::new(world, &EXCHANGE_ARGS);

    assert_eq!(harness.login(), IdentityState::Linked);
    assert!(harness.platform.get_user_logged_in(USER));
    assert_eq!(harness.product_user(), pid);
    assert_eq!(
        harness.sdk.login_attempts(),
        vec![LoginCredentialType::ExchangeCode]
    );

    let achievements = harness.platform.get_achievements(USER).unwrap();
    let backend_count = harness
        .sdk
        .with_world(|w| w.player_achievement_count(&account));
    assert_eq!(achievements.len(), backend_count);
    assert_eq!(achievements.len(), 3);
    assert_eq!(harness.sdk.live_allocations(), 0);
}

#[test]
fn test_hidden_achievement_merged_with_progress() {
    let (world, _, _) = backend();
    let harness = Harness::new(world, &EXCHANGE_ARGS);
    harness.login();

    let achievements = harness.platform.get_achievements(USER).unwrap();
    let secret: Vec<_> = achievements
        .iter()
        .filter(|a| a.identifier == "secret_room")
        .collect();
    assert_eq!(secret.len(), 1);
    assert!(secret[0].is_hidden);
    assert_eq!(secret[0].progress, 0.5);
    assert!(!secret[0].is_unlocked());

    let first = achievements
        .iter()
        .find(|a| a.identifier == "first_blood")
        .unwrap();
    assert!(!first.is_hidden);
    assert!(first.is_unlocked());
}

#[test]
fn test_stale_keychain_invalidated_then_portal_fallback_once() {
    let alice = SimAccount::new("alice");
    let world = SimWorld::new()
        .with_keychain(&alice.id, true)
        .with_portal_account(&alice.id)
        .with_product_user(&alice.id, ProductUserId::generate())
        .with_account(alice);
    let harness = Harness::new(world, &[]);

    assert_eq!(harness.login(), IdentityState::Linked);
    assert_eq!(harness.sdk.calls(SimOp::DeletePersistentAuth), 1);
    assert_eq!(
        harness.sdk.login_attempts(),
        vec![
            LoginCredentialType::PersistentAuth,
            LoginCredentialType::AccountPortal
        ]
    );
}

#[test]
fn test_login_rejected_while_stale_credential_is_scrubbed() {
    let alice = SimAccount::new("alice");
    let world = SimWorld::new()
        .with_keychain(&alice.id, true)
        .with_portal_account(&alice.id)
        .with_product_user(&alice.id, ProductUserId::generate())
        .with_account(alice);
    let harness = Harness::new(world, &[]);

    assert!(harness.platform.user_login(USER));
    harness.platform.on_update(FrameSignals::foreground());
    assert_eq!(
        harness.platform.identity_state(USER),
        IdentityState::FirstStagePending {
            method: LoginMethod::AccountPortal,
            fallback_used: true,
        }
    );
    assert!(!harness.platform.user_login(USER));

    assert_eq!(harness.settle(), IdentityState::Linked);
    assert_eq!(harness.sdk.calls(SimOp::DeletePersistentAuth), 1);
    assert_eq!(
        harness.sdk.login_attempts(),
        vec![
            LoginCredentialType::PersistentAuth,
            LoginCredentialType::AccountPortal
        ]
    );
}

#[test]
fn test_failed_portal_fallback_is_not_retried() {
    let alice = SimAccount::new("alice");
    let world = SimWorld::new()
        .with_keychain(&alice.id, true)
        .with_account(alice);
    let harness = Harness::new(world, &[]);

    assert_eq!(
        harness.login(),
        IdentityState::Failed {
            reason: EosResult::Canceled
        }
    );
    assert_eq!(harness.sdk.calls(SimOp::DeletePersistentAuth), 1);
    assert_eq!(harness.sdk.login_attempts().len(), 2);
    assert!(!harness.platform.get_user_logged_in(USER));
}

#[test]
fn test_unknown_exchange_code_fails_without_fallback() {
    let (world, _, _) = backend();
    let harness = Harness::new(world, &["-AUTH_TYPE=exchangecode", "-AUTH_PASSWORD=wrong"]);

    assert_eq!(
        harness.login(),
        IdentityState::Failed {
            reason: EosResult::AuthExchangeCodeNotFound
        }
    );
    assert_eq!(harness.sdk.calls(SimOp::DeletePersistentAuth), 0);
    assert_eq!(harness.sdk.calls(SimOp::ConnectLogin), 0);
}

#[test]
fn test_unknown_service_user_is_created_once() {
    let alice = SimAccount::new("alice");
    let account = alice.id.clone();
    let world = SimWorld::new()
        .with_exchange_code("abc123", &account)
        .with_account(alice);
    let harness = Harness::new(world, &EXCHANGE_ARGS);

    assert_eq!(harness.login(), IdentityState::Linked);
    assert_eq!(harness.sdk.calls(SimOp::CreateUser), 1);
    let created = harness
        .sdk
        .with_world(|w| w.product_user(&account).cloned())
        .unwrap();
    assert_eq!(harness.product_user(), created);
}

#[test]
fn test_create_user_failure_is_not_retried() {
    let alice = SimAccount::new("alice");
    let world = SimWorld::new()
        .with_exchange_code("abc123", &alice.id)
        .with_failure(SimOp::CreateUser, EosResult::AccessDenied)
        .with_account(alice);
    let harness = Harness::new(world, &EXCHANGE_ARGS);

    assert_eq!(
        harness.login(),
        IdentityState::Failed {
            reason: EosResult::AccessDenied
        }
    );
    assert_eq!(harness.sdk.calls(SimOp::CreateUser), 1);
    assert_eq!(harness.sdk.calls(SimOp::ConnectLogin), 1);
}

#[test]
fn test_second_login_while_pending_is_rejected() {
    let (world, _, _) = backend();
    let harness = Harness::new(world, &EXCHANGE_ARGS);

    assert!(harness.platform.user_login(USER));
    assert!(!harness.platform.user_login(USER));
    assert_eq!(harness.sdk.login_attempts().len(), 1);
    assert_eq!(harness.settle(), IdentityState::Linked);
}

#[test]
fn test_friends_with_presence() {
    let bob = SimAccount::new("bob").with_presence(PresenceStatus::Online);
    let carol = SimAccount::new("carol");
    let dave = SimAccount::new("dave").with_presence(PresenceStatus::DoNotDisturb);
    let erin = SimAccount::new("erin").with_presence(PresenceStatus::ExtendedAway);
    let ghost = EpicAccountId::generate();
    let alice = SimAccount::new("alice")
        .with_friend(&bob.id)
        .with_friend(&carol.id)
        .with_friend(&dave.id)
        .with_friend(&erin.id)
        .with_friend(&ghost);
    let world = SimWorld::new()
        .with_exchange_code("abc123", &alice.id)
        .with_product_user(&alice.id, ProductUserId::generate())
        .with_account(alice)
        .with_account(bob)
        .with_account(carol)
        .with_account(dave)
        .with_account(erin);
    let harness = Harness::new(world, &EXCHANGE_ARGS);
    harness.login();

    let friends = harness.platform.get_friends(USER).unwrap();
    let presence: Vec<(&str, OnlinePresence)> = friends
        .iter()
        .map(|f| (f.name.as_str(), f.presence))
        .collect();
    assert_eq!(
        presence,
        vec![
            ("bob", OnlinePresence::Online),
            ("carol", OnlinePresence::Offline),
            ("dave", OnlinePresence::Busy),
            ("erin", OnlinePresence::Away),
        ]
    );
    assert_eq!(harness.sdk.live_allocations(), 0);
}

#[test]
fn test_empty_friends_list_reports_failure() {
    let (world, _, _) = backend();
    let harness = Harness::new(world, &EXCHANGE_ARGS);
    harness.login();

    assert!(harness.platform.get_friends(USER).is_none());
    assert_eq!(harness.sdk.calls(SimOp::QueryFriends), 1);
    assert_eq!(harness.sdk.calls(SimOp::QueryUserInfo), 0);
}

#[test]
fn test_profile_of_local_user() {
    let (world, account, _) = backend();
    let harness = Harness::new(world, &EXCHANGE_ARGS);
    harness.login();

    let profile = harness.platform.get_user(USER).unwrap();
    assert_eq!(profile.id, account.to_string());
    assert_eq!(profile.name, "alice");
    assert_eq!(profile.presence, OnlinePresence::Online);
}

#[test]
fn test_unlock_reports_unconfirmed_and_applies_on_tick() {
    let (world, account, _) = backend();
    let harness = Harness::new(world, &EXCHANGE_ARGS);
    harness.login();

    assert!(!harness.platform.unlock_achievement("explorer", USER));
    for _ in 0..3 {
        harness.platform.on_update(FrameSignals::foreground());
    }
    assert_eq!(
        harness.sdk.with_world(|w| w.progress_of(&account, "explorer")),
        Some(1.0)
    );
}

#[test]
fn test_partial_progress_is_ingested_as_stat() {
    let (world, _, _) = backend();
    let harness = Harness::new(world, &EXCHANGE_ARGS);
    harness.login();
    let pid = harness.product_user();

    assert!(!harness
        .platform
        .unlock_achievement_progress("explorer", 0.42, USER));
    for _ in 0..3 {
        harness.platform.on_update(FrameSignals::foreground());
    }
    assert_eq!(harness.sdk.with_world(|w| w.stat(&pid, "explorer")), Some(42));
    assert_eq!(harness.sdk.calls(SimOp::UnlockAchievements), 0);
}

#[test]
fn test_stats_round_trip() {
    let (world, _, _) = backend();
    let harness = Harness::new(world, &EXCHANGE_ARGS);
    harness.login();

    assert!(harness.platform.set_stat("kills", 12.4, USER));
    assert_eq!(harness.platform.get_stat("kills", USER), Some(12.0));
    assert!(harness.platform.get_stat("deaths", USER).is_none());
}

#[test]
fn test_save_game_round_trip_in_chunks() {
    let (world, _, _) = backend();
    let harness = Harness::new(world, &EXCHANGE_ARGS);
    harness.login();

    assert_eq!(harness.platform.get_save_game("slot1", USER), Some(Vec::new()));

    let data: Vec<u8> = (0..10_000u32).map(|i| (i % 251) as u8).collect();
    assert!(harness.platform.set_save_game("slot1", &data, USER));
    assert_eq!(harness.platform.get_save_game("slot1", USER), Some(data));

    assert!(!harness.platform.set_save_game("../slot1", b"x", USER));
    assert_eq!(harness.sdk.calls(SimOp::WriteFile), 1);
}

#[test]
fn test_lifecycle_issues_status_changes_only_on_transition() {
    let (world, _, _) = backend();
    let harness = Harness::new(world, &[]);
    let background = FrameSignals {
        is_foreground_window: false,
        has_focus: false,
        game_paused: false,
    };

    harness.platform.on_update(FrameSignals::foreground());
    assert_eq!(harness.sdk.calls(SimOp::SetApplicationStatus), 0);

    harness.platform.on_update(background);
    harness.platform.on_update(background);
    assert_eq!(harness.sdk.calls(SimOp::SetApplicationStatus), 1);
    assert_eq!(
        harness.platform.context().unwrap().platform().application_status(),
        ApplicationStatus::BackgroundConstrained
    );

    harness.platform.on_update(FrameSignals {
        game_paused: true,
        ..background
    });
    harness.platform.on_update(FrameSignals::foreground());
    assert_eq!(harness.sdk.calls(SimOp::SetApplicationStatus), 3);
}

#[test]
fn test_network_status_forwarded_on_change_only() {
    let (world, _, _) = backend();
    let harness = Harness::new(world, &[]);

    assert!(harness.platform.set_network_status(true));
    assert_eq!(harness.sdk.calls(SimOp::SetNetworkStatus), 0);
    assert!(harness.platform.set_network_status(false));
    assert!(harness.platform.set_network_status(false));
    assert_eq!(harness.sdk.calls(SimOp::SetNetworkStatus), 1);
}

#[test]
fn test_auth_expiration_refreshes_service_login() {
    let (world, _, pid) = backend();
    let harness = Harness::new(world, &EXCHANGE_ARGS);
    harness.login();
    assert_eq!(harness.sdk.calls(SimOp::ConnectLogin), 1);

    harness.sdk.expire_connect_auth(&pid);
    harness.platform.on_update(FrameSignals::foreground());
    assert_eq!(harness.settle(), IdentityState::Linked);
    assert_eq!(harness.sdk.calls(SimOp::ConnectLogin), 2);
    assert_eq!(harness.product_user(), pid);
}

#[test]
fn test_logout_clears_identity() {
    let (world, _, _) = backend();
    let harness = Harness::new(world, &EXCHANGE_ARGS);
    harness.login();

    assert!(harness.platform.user_logout(USER));
    assert!(!harness.platform.get_user_logged_in(USER));
    assert_eq!(harness.platform.identity_state(USER), IdentityState::NoIdentity);
    assert!(harness.platform.get_achievements(USER).is_none());
}

#[test]
fn test_deinitialize_twice_is_safe() {
    let (world, _, _) = backend();
    let mut harness = Harness::new(world, &EXCHANGE_ARGS);
    harness.login();

    harness.platform.deinitialize();
    assert!(!harness.platform.is_initialized());
    assert!(!harness.sdk.is_initialized());
    assert_eq!(harness.sdk.live_platforms(), 0);

    harness.platform.deinitialize();
    assert!(!harness.platform.is_initialized());
    assert!(!harness.sdk.is_initialized());
    assert!(harness.platform.get_friends(USER).is_none());
    assert!(!harness.platform.user_login(USER));
    harness.platform.on_update(FrameSignals::foreground());
}

#[test]
fn test_invalid_encryption_key_disables_saves_only() {
    let (world, _, _) = backend();
    let harness = Harness::with_settings(world, &EXCHANGE_ARGS, settings(Some("nothex".into())));
    assert_eq!(harness.login(), IdentityState::Linked);

    assert!(harness.platform.get_save_game("slot1", USER).is_none());
    assert_eq!(harness.sdk.calls(SimOp::ReadFile), 0);
    assert!(harness.platform.get_achievements(USER).is_some());
}

#[test]
fn test_injected_query_failure_surfaces_as_empty() {
    let (world, _, _) = backend();
    let harness = Harness::new(world, &EXCHANGE_ARGS);
    harness.login();

    harness
        .sdk
        .set_failure(SimOp::QueryPlayerAchievements, Some(EosResult::NoConnection));
    assert!(harness.platform.get_achievements(USER).is_none());

    harness.sdk.set_failure(SimOp::QueryPlayerAchievements, None);
    assert_eq!(harness.platform.get_achievements(USER).map(|a| a.len()), Some(3));
}
