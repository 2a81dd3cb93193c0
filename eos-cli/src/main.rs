use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use eos_sdk::presence::PresenceStatus;
use eos_sdk::sim::{SimAccount, SimWorld, SimulatedSdk, definition};
use eos_sdk::{LogCategory, LogLevel, ProductUserId};
use online_eos::logging::{LoggingOptions, init_logging};
use online_eos::{
    EosSettings, FrameSignals, HostEnvironment, IdentityState, LocalUser, OnlineAchievement,
    OnlinePlatform, OnlinePlatformEos, OnlineUser, RuntimeOptions,
};
use serde::Serialize;
use tracing::info;

/// Frames to pump before giving up on a login.
const MAX_LOGIN_FRAMES: usize = 1000;

const FRAME_INTERVAL: Duration = Duration::from_millis(5);

const PRESENCE_CYCLE: [Option<PresenceStatus>; 5] = [
    Some(PresenceStatus::Online),
    Some(PresenceStatus::Away),
    Some(PresenceStatus::DoNotDisturb),
    Some(PresenceStatus::ExtendedAway),
    None,
];

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Login method injected as -AUTH_TYPE (exchangecode, developer,
    /// persistentauth, accountportal)
    #[arg(long)]
    auth_type: Option<String>,

    /// Token injected as -AUTH_PASSWORD
    #[arg(long)]
    auth_password: Option<String>,

    /// Developer tool host injected as -AUTH_LOGIN
    #[arg(long)]
    auth_login: Option<String>,

    /// Seed the keychain with a revoked credential
    #[arg(long)]
    stale_keychain: bool,

    /// Start without a game-service user so one gets created
    #[arg(long)]
    new_user: bool,

    /// Number of friends of the simulated account
    #[arg(long, default_value_t = 3)]
    friends: usize,

    /// Number of achievements defined for the product
    #[arg(long, default_value_t = 4)]
    achievements: usize,

    /// Settings file; defaults to EOS_* environment variables
    #[arg(long, env = "EOS_SETTINGS")]
    settings: Option<PathBuf>,

    /// Log filter directive
    #[arg(long)]
    log_filter: Option<String>,

    /// Forward SDK messages down to this level (off, fatal, error, warning,
    /// info, verbose, veryverbose)
    #[arg(long)]
    sdk_log_level: Option<LogLevel>,

    /// Output the result in JSON format
    #[arg(long)]
    json: bool,
}

#[derive(Debug, Serialize)]
struct Report {
    state: String,
    profile: Option<OnlineUser>,
    friends: Vec<OnlineUser>,
    achievements: Vec<OnlineAchievement>,
}

fn launch_args(args: &Args) -> Vec<String> {
    let mut launch = Vec::new();
    if let Some(auth_type) = &args.auth_type {
        launch.push(format!("-AUTH_TYPE={}", auth_type));
    }
    if let Some(password) = &args.auth_password {
        launch.push(format!("-AUTH_PASSWORD={}", password));
    }
    if let Some(login) = &args.auth_login {
        launch.push(format!("-AUTH_LOGIN={}", login));
    }
    launch
}

fn build_world(args: &Args) -> SimWorld {
    let mut alice = SimAccount::new("alice").with_presence(PresenceStatus::Online);
    let mut friends = Vec::with_capacity(args.friends);
    for i in 0..args.friends {
        let mut friend = SimAccount::new(format!("friend-{}", i + 1));
        friend.presence = PRESENCE_CYCLE[i % PRESENCE_CYCLE.len()];
        alice = alice.with_friend(&friend.id);
        friends.push(friend);
    }

    let id = alice.id.clone();
    let mut world = SimWorld::new()
        .with_keychain(&id, args.stale_keychain)
        .with_portal_account(&id);
    if let Some(password) = &args.auth_password {
        world = world
            .with_exchange_code(password.clone(), &id)
            .with_developer_credential(password.clone(), &id);
    }
    if !args.new_user {
        world = world.with_product_user(&id, ProductUserId::generate());
    }
    for i in 0..args.achievements {
        let achievement_id = format!("achievement_{}", i + 1);
        let name = format!("Achievement {}", i + 1);
        let progress = i as f64 / args.achievements as f64;
        world = world
            .with_definition(definition(&achievement_id, &name, i % 3 == 2))
            .with_progress(&id, &achievement_id, progress);
    }

    friends
        .into_iter()
        .fold(world.with_account(alice), SimWorld::with_account)
}

fn load_settings(args: &Args) -> anyhow::Result<EosSettings> {
    let mut settings = match &args.settings {
        Some(path) => EosSettings::from_file(path)
            .with_context(|| format!("Failed to load settings from {}", path.display()))?,
        None => EosSettings::from_env(),
    };
    // The simulated runtime accepts any identifiers.
    let fill = |value: &mut String, default: &str| {
        if value.is_empty() {
            *value = default.to_string();
        }
    };
    fill(&mut settings.product_name, "eos-cli");
    fill(&mut settings.product_version, env!("CARGO_PKG_VERSION"));
    fill(&mut settings.product_id, "sim-product");
    fill(&mut settings.sandbox_id, "sim-sandbox");
    fill(&mut settings.deployment_id, "sim-deployment");
    fill(&mut settings.client_id, "sim-client");
    Ok(settings)
}

fn print_report(report: &Report) {
    println!("Login: {}", report.state);
    if let Some(profile) = &report.profile {
        println!("Profile: {} ({})", profile.name, profile.id);
    }

    println!("\nFriends ({}):", report.friends.len());
    for friend in &report.friends {
        println!("  {:<16} {}", friend.name, friend.presence);
    }

    println!("\nAchievements ({}):", report.achievements.len());
    for achievement in &report.achievements {
        let status = if achievement.is_unlocked() {
            "unlocked".to_string()
        } else {
            format!("{:.0}%", achievement.progress * 100.0)
        };
        let hidden = if achievement.is_hidden { " [hidden]" } else { "" };
        println!(
            "  {:<20} {:<10}{}",
            achievement.identifier, status, hidden
        );
    }
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let (logging, _guard) = init_logging(&LoggingOptions {
        filter: args.log_filter.clone(),
        ..LoggingOptions::default()
    })
    .context("Failed to initialize logging")?;

    let settings = load_settings(&args)?;
    let temp = std::env::temp_dir().join("eos-cli");
    let host = HostEnvironment::new(launch_args(&args), temp);
    let sdk = Arc::new(SimulatedSdk::new(build_world(&args)));

    let mut platform = OnlinePlatformEos::new(sdk, settings, RuntimeOptions::default(), host)
        .with_logging(logging);
    if !platform.initialize() {
        anyhow::bail!("Failed to initialize the online platform");
    }
    if let Some(level) = args.sdk_log_level {
        platform.set_log_level(LogCategory::AllCategories, level);
    }

    let user = LocalUser::PRIMARY;
    if !platform.user_login(user) {
        anyhow::bail!("Login request was rejected");
    }

    let mut state = platform.identity_state(user);
    for _ in 0..MAX_LOGIN_FRAMES {
        platform.on_update(FrameSignals::foreground());
        state = platform.identity_state(user);
        if !state.is_pending() {
            break;
        }
        std::thread::sleep(FRAME_INTERVAL);
    }
    info!(state = %state, "Login settled");

    let report = if state == IdentityState::Linked {
        Report {
            state: state.to_string(),
            profile: platform.get_user(user),
            friends: platform.get_friends(user).unwrap_or_default(),
            achievements: platform.get_achievements(user).unwrap_or_default(),
        }
    } else {
        Report {
            state: format!("{:?}", state),
            profile: None,
            friends: Vec::new(),
            achievements: Vec::new(),
        }
    };

    if args.json {
        println!(
            "{}",
            serde_json::to_string_pretty(&report).context("Failed to serialize report")?
        );
    } else {
        print_report(&report);
    }

    platform.deinitialize();
    Ok(())
}
