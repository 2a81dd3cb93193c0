//! Per-frame pump and application status reconciliation.

use eos_sdk::{ApplicationStatus, NetworkStatus};
use tracing::{debug, warn};

use crate::context::PlatformContext;

/// Window and pause state sampled by the host each frame.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FrameSignals {
    pub is_foreground_window: bool,
    pub has_focus: bool,
    pub game_paused: bool,
}

impl FrameSignals {
    pub fn foreground() -> Self {
        Self {
            is_foreground_window: true,
            has_focus: true,
            game_paused: false,
        }
    }
}

/// Status the SDK should be in for these signals; `None` leaves it alone.
///
/// Priority: foreground window, then paused without focus (suspended), then
/// no focus (constrained).
pub fn target_status(signals: FrameSignals) -> Option<ApplicationStatus> {
    if signals.is_foreground_window {
        Some(ApplicationStatus::Foreground)
    } else if signals.game_paused && !signals.has_focus {
        Some(ApplicationStatus::BackgroundSuspended)
    } else if !signals.has_focus {
        Some(ApplicationStatus::BackgroundConstrained)
    } else {
        None
    }
}

/// The transition to issue, if `current` differs from the target.
pub fn status_change(
    signals: FrameSignals,
    current: ApplicationStatus,
) -> Option<ApplicationStatus> {
    target_status(signals).filter(|target| *target != current)
}

/// Pump the SDK once, then reconcile the application status.
pub fn tick(ctx: &PlatformContext, signals: FrameSignals) {
    let platform = ctx.platform();
    if platform.is_released() {
        return;
    }
    platform.tick();

    if let Some(next) = status_change(signals, platform.application_status()) {
        let result = platform.set_application_status(next);
        if result.is_success() {
            debug!(status = ?next, "Application status changed");
        } else {
            warn!(status = ?next, result = %result, "Failed to change application status");
        }
    }
}

/// Forward a network status change; nothing is sent if it is unchanged.
pub fn set_network_status(ctx: &PlatformContext, online: bool) -> bool {
    let platform = ctx.platform();
    let next = if online {
        NetworkStatus::Online
    } else {
        NetworkStatus::Offline
    };
    if platform.network_status() == next {
        return true;
    }
    let result = platform.set_network_status(next);
    if result.is_success() {
        debug!(status = ?next, "Network status changed");
        true
    } else {
        warn!(status = ?next, result = %result, "Failed to change network status");
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn signals(is_foreground_window: bool, has_focus: bool, game_paused: bool) -> FrameSignals {
        FrameSignals {
            is_foreground_window,
            has_focus,
            game_paused,
        }
    }

    #[rstest]
    #[case(signals(true, true, false), Some(ApplicationStatus::Foreground))]
    #[case(signals(true, false, true), Some(ApplicationStatus::Foreground))]
    #[case(signals(false, false, true), Some(ApplicationStatus::BackgroundSuspended))]
    #[case(signals(false, false, false), Some(ApplicationStatus::BackgroundConstrained))]
    #[case(signals(false, true, true), None)]
    #[case(signals(false, true, false), None)]
    fn test_target_status(#[case] signals: FrameSignals, #[case] expected: Option<ApplicationStatus>) {
        assert_eq!(target_status(signals), expected);
    }

    #[test]
    fn test_no_change_when_already_in_target() {
        assert_eq!(
            status_change(FrameSignals::foreground(), ApplicationStatus::Foreground),
            None
        );
        assert_eq!(
            status_change(signals(false, false, false), ApplicationStatus::Foreground),
            Some(ApplicationStatus::BackgroundConstrained)
        );
    }
}
