//! Two-stage login.
//!
//! The account login (first stage) is chained into a game-service login
//! (second stage) with the account's id token. Every transition happens in a
//! callback delivered by a platform tick; callbacks hold a `Weak` context and
//! do nothing once the platform is torn down.

use std::sync::{Arc, Weak};

use eos_sdk::auth::{LoginCallbackInfo, LogoutCallbackInfo};
use eos_sdk::connect::{
    AuthExpirationCallbackInfo, ConnectCredentials, ConnectLoginCallbackInfo,
    ConnectLoginOptions, CreateUserCallbackInfo, ExternalCredentialType,
};
use eos_sdk::{EosResult, EpicAccountId, ProductUserId};
use tracing::{debug, error, info, instrument, warn};

use crate::achievements;
use crate::context::PlatformContext;
use crate::credentials::{CredentialResolver, LoginMethod, LoginPlan, requires_relogin};
use crate::error::{Error, Result};
use crate::types::LocalUser;

use super::state::IdentityState;

/// Start linking `user`. Returns once the first-stage call is issued; the
/// outcome shows up in the user's [`IdentityState`].
#[instrument(skip(ctx))]
pub fn begin_login(ctx: &Arc<PlatformContext>, user: LocalUser) -> Result<()> {
    let plan = CredentialResolver::new(ctx.launch_args().clone()).resolve();

    let accepted = ctx.update_identity(user, |identity| {
        if identity.state.is_pending() {
            return false;
        }
        identity.state = IdentityState::FirstStagePending {
            method: plan.method,
            fallback_used: false,
        };
        true
    });
    if !accepted {
        debug!("Login already in progress");
        return Err(Error::LoginPending(user));
    }

    info!(method = %plan.method, "Starting account login");
    issue_first_stage(ctx, user, plan, false);
    Ok(())
}

fn issue_first_stage(ctx: &Arc<PlatformContext>, user: LocalUser, plan: LoginPlan, fallback_used: bool) {
    let weak = Arc::downgrade(ctx);
    let method = plan.method;
    ctx.platform().auth().login(
        plan.login_options(),
        Box::new(move |info| {
            if let Some(ctx) = weak.upgrade() {
                on_first_stage(&ctx, user, method, fallback_used, info);
            }
        }),
    );
}

fn on_first_stage(
    ctx: &Arc<PlatformContext>,
    user: LocalUser,
    method: LoginMethod,
    fallback_used: bool,
    info: LoginCallbackInfo,
) {
    match (info.result, info.local_user_id) {
        (EosResult::Success, Some(account)) => {
            info!(%user, account = %account, method = %method, "Account login succeeded");
            ctx.update_identity(user, |identity| {
                identity.account_id = Some(account);
                identity.state = IdentityState::FirstStageAuthenticated;
            });
            begin_second_stage(ctx, user, false);
        }
        (result, _)
            if requires_relogin(method, result)
                && !fallback_used
                && method != LoginMethod::AccountPortal =>
        {
            warn!(%user, method = %method, result = %result, "Cached credential is stale, falling back to account portal");
            // Pending until the portal login resolves.
            ctx.update_identity(user, |identity| {
                identity.state = IdentityState::FirstStagePending {
                    method: LoginMethod::AccountPortal,
                    fallback_used: true,
                };
            });
            invalidate_then_fallback(ctx, user);
        }
        (result, _) => {
            let reason = if result.is_success() {
                EosResult::InvalidUser
            } else {
                result
            };
            error!(%user, method = %method, result = %reason, "Account login failed");
            ctx.update_identity(user, |identity| {
                identity.state = IdentityState::Failed { reason };
            });
        }
    }
}

/// Scrub the cached credential, then retry interactively once.
fn invalidate_then_fallback(ctx: &Arc<PlatformContext>, user: LocalUser) {
    let weak = Arc::downgrade(ctx);
    ctx.platform().auth().delete_persistent_auth(
        None,
        Box::new(move |info| {
            let Some(ctx) = weak.upgrade() else {
                return;
            };
            if !info.result.is_success() {
                warn!(%user, result = %info.result, "Failed to delete persistent credential");
            }
            issue_first_stage(&ctx, user, LoginPlan::account_portal(), true);
        }),
    );
}

/// Federate the account identity into the game service.
fn begin_second_stage(ctx: &Arc<PlatformContext>, user: LocalUser, create_attempted: bool) {
    let Some(account) = ctx.identity(user).account_id else {
        return;
    };

    let token = match ctx.platform().auth().copy_id_token(&account) {
        Ok(token) => token.json_web_token.clone(),
        Err(result) => {
            error!(%user, result = %result, "Failed to copy id token");
            ctx.update_identity(user, |identity| {
                identity.state = IdentityState::Failed { reason: result };
            });
            return;
        }
    };

    ctx.update_identity(user, |identity| {
        identity.state = IdentityState::SecondStagePending { create_attempted };
    });

    let weak = Arc::downgrade(ctx);
    ctx.platform().connect().login(
        ConnectLoginOptions {
            credentials: ConnectCredentials {
                credential_type: ExternalCredentialType::EpicIdToken,
                token,
            },
        },
        Box::new(move |info| {
            if let Some(ctx) = weak.upgrade() {
                on_second_stage(&ctx, user, create_attempted, info);
            }
        }),
    );
}

fn on_second_stage(
    ctx: &Arc<PlatformContext>,
    user: LocalUser,
    create_attempted: bool,
    info: ConnectLoginCallbackInfo,
) {
    match (info.result, info.local_user_id, info.continuance_token) {
        (EosResult::Success, Some(product_user), _) => link(ctx, user, product_user),
        (EosResult::InvalidUser, _, Some(continuance)) if !create_attempted => {
            info!(%user, "No game-service user yet, creating one");
            ctx.update_identity(user, |identity| {
                identity.state = IdentityState::SecondStagePending {
                    create_attempted: true,
                };
            });
            let weak = Arc::downgrade(ctx);
            ctx.platform().connect().create_user(
                continuance,
                Box::new(move |info| {
                    if let Some(ctx) = weak.upgrade() {
                        on_user_created(&ctx, user, info);
                    }
                }),
            );
        }
        (result, _, _) => fail_second_stage(ctx, user, result),
    }
}

fn on_user_created(ctx: &Arc<PlatformContext>, user: LocalUser, info: CreateUserCallbackInfo) {
    match (info.result, info.local_user_id) {
        (EosResult::Success, Some(product_user)) => link(ctx, user, product_user),
        (result, _) => fail_second_stage(ctx, user, result),
    }
}

fn fail_second_stage(ctx: &PlatformContext, user: LocalUser, result: EosResult) {
    let reason = if result.is_success() {
        EosResult::InvalidUser
    } else {
        result
    };
    error!(%user, result = %reason, "Game-service login failed");
    ctx.update_identity(user, |identity| {
        identity.state = IdentityState::Failed { reason };
    });
}

fn link(ctx: &Arc<PlatformContext>, user: LocalUser, product_user: ProductUserId) {
    info!(%user, product_user = %product_user, "Identity linked");
    let needs_notification = ctx.update_identity(user, |identity| {
        identity.product_user_id = Some(product_user.clone());
        identity.state = IdentityState::Linked;
        identity.auth_expiration.is_none()
    });

    if needs_notification {
        let weak: Weak<PlatformContext> = Arc::downgrade(ctx);
        let id = ctx.platform().connect().add_notify_auth_expiration(Arc::new(
            move |info: &AuthExpirationCallbackInfo| {
                if let Some(ctx) = weak.upgrade() {
                    on_auth_expiring(&ctx, user, &info.local_user_id);
                }
            },
        ));
        if id.is_valid() {
            ctx.update_identity(user, |identity| identity.auth_expiration = Some(id));
        } else {
            warn!(%user, "Failed to register for auth expiration");
        }
    }

    achievements::prefetch(ctx, user, &product_user);
}

fn on_auth_expiring(ctx: &Arc<PlatformContext>, user: LocalUser, expiring: &ProductUserId) {
    let identity = ctx.identity(user);
    if identity.product_user_id.as_ref() != Some(expiring) || identity.state.is_pending() {
        return;
    }
    info!(%user, "Game-service auth expiring, refreshing");
    begin_second_stage(ctx, user, false);
}

/// Log `user` out of the account and drop its identity.
#[instrument(skip(ctx))]
pub fn logout(ctx: &PlatformContext, user: LocalUser) -> Result<()> {
    let account: EpicAccountId = ctx.account_id(user)?;

    let info: LogoutCallbackInfo = ctx.call("auth_logout", |platform, done| {
        platform
            .auth()
            .logout(&account, Box::new(move |info| done.complete(info)));
    })?;

    forget(ctx, user);
    Error::check("auth_logout", info.result)?;
    info!(account = %account, "Logged out");
    Ok(())
}

/// Drop `user`'s identity and its notification registration.
pub fn forget(ctx: &PlatformContext, user: LocalUser) {
    if let Some(identity) = ctx.remove_identity(user)
        && let Some(id) = identity.auth_expiration
    {
        ctx.platform().connect().remove_notify_auth_expiration(id);
    }
}
