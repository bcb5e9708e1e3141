//! Controller configuration and live play settings.
//!
//! [`ControllerConfig`] is fixed when the controller is created.
//! [`PlaySettings`] is a shared handle whose values can be changed at any
//! time by the UI; the controller reads them afresh at the start of every
//! turn timer and every auto-play iteration.

use std::sync::atomic::{AtomicU32, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Minimum interval between two accepted clicks.
pub const DEFAULT_CLICK_GAP: Duration = Duration::from_millis(250);

/// Cooldown after toggling auto-play before the toggle is accepted again.
pub const DEFAULT_AUTO_TOGGLE_COOLDOWN: Duration = Duration::from_millis(20);

/// Default capacity of the bounded event channel.
const DEFAULT_EVENT_CHANNEL_CAPACITY: usize = 256;

/// Move count recorded for a drawn game.
pub const DRAW_MOVE_COUNT: u32 = 999;

/// Default timeout for the graceful shutdown.
const DEFAULT_SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(1);

/// Default seconds per turn.
pub const DEFAULT_TURN_SECONDS: u32 = 30;

/// Bounds of the per-turn duration.
pub const MIN_TURN_SECONDS: u32 = 1;
pub const MAX_TURN_SECONDS: u32 = 120;

/// Default delay between two auto-play moves.
pub const DEFAULT_AUTO_DELAY: Duration = Duration::from_millis(500);

// ── ControllerConfig ────────────────────────────────────────────────

/// Configuration for a [`GameController`](crate::GameController).
///
/// # Example
///
/// ```
/// use cube_four_client::settings::ControllerConfig;
/// use std::time::Duration;
///
/// let config = ControllerConfig::new()
///     .with_click_gap(Duration::from_millis(100))
///     .with_event_channel_capacity(64);
/// assert_eq!(config.click_gap, Duration::from_millis(100));
/// ```
#[derive(Debug, Clone)]
pub struct ControllerConfig {
    /// Minimum time between two accepted manual inputs. Defaults to **250 ms**.
    pub click_gap: Duration,
    /// Cooldown applied to the auto-play toggle. Defaults to **20 ms**.
    pub auto_toggle_cooldown: Duration,
    /// Capacity of the bounded event channel.
    ///
    /// Events that do not fit are dropped with a warning so the controller
    /// never blocks on a slow renderer. Defaults to **256**, clamped to ≥ 1.
    pub event_channel_capacity: usize,
    /// Move count recorded for a drawn game. Defaults to **999**.
    pub draw_move_count: u32,
    /// Upper bound on the remote session deletion during
    /// [`shutdown`](crate::GameController::shutdown). Defaults to **1 second**.
    pub shutdown_timeout: Duration,
}

impl ControllerConfig {
    /// Create a configuration with default values.
    pub fn new() -> Self {
        Self {
            click_gap: DEFAULT_CLICK_GAP,
            auto_toggle_cooldown: DEFAULT_AUTO_TOGGLE_COOLDOWN,
            event_channel_capacity: DEFAULT_EVENT_CHANNEL_CAPACITY,
            draw_move_count: DRAW_MOVE_COUNT,
            shutdown_timeout: DEFAULT_SHUTDOWN_TIMEOUT,
        }
    }

    /// Set the minimum interval between accepted clicks.
    #[must_use]
    pub fn with_click_gap(mut self, gap: Duration) -> Self {
        self.click_gap = gap;
        self
    }

    /// Set the auto-play toggle cooldown.
    #[must_use]
    pub fn with_auto_toggle_cooldown(mut self, cooldown: Duration) -> Self {
        self.auto_toggle_cooldown = cooldown;
        self
    }

    /// Set the capacity of the event channel. Values below 1 are clamped to 1.
    #[must_use]
    pub fn with_event_channel_capacity(mut self, capacity: usize) -> Self {
        self.event_channel_capacity = capacity.max(1);
        self
    }

    /// Set the move count recorded for a draw.
    #[must_use]
    pub fn with_draw_move_count(mut self, moves: u32) -> Self {
        self.draw_move_count = moves;
        self
    }

    /// Set the shutdown timeout.
    #[must_use]
    pub fn with_shutdown_timeout(mut self, timeout: Duration) -> Self {
        self.shutdown_timeout = timeout;
        self
    }
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self::new()
    }
}

// ── PlaySettings ────────────────────────────────────────────────────

#[derive(Debug)]
struct PlaySettingsInner {
    turn_seconds: AtomicU32,
    auto_delay_ms: AtomicU64,
}

/// Live, externally adjustable play settings.
///
/// Clones share the same values.
///
/// ```
/// use cube_four_client::settings::PlaySettings;
/// use std::time::Duration;
///
/// let settings = PlaySettings::default();
/// let ui_handle = settings.clone();
/// ui_handle.set_turn_seconds(500);
/// assert_eq!(settings.turn_seconds(), 120);
/// ui_handle.set_auto_delay(Duration::ZERO);
/// assert_eq!(settings.auto_delay(), Duration::ZERO);
/// ```
#[derive(Debug, Clone)]
pub struct PlaySettings {
    inner: Arc<PlaySettingsInner>,
}

impl PlaySettings {
    /// Create settings with the given turn duration and auto-play delay.
    pub fn new(turn_seconds: u32, auto_delay: Duration) -> Self {
        let settings = Self {
            inner: Arc::new(PlaySettingsInner {
                turn_seconds: AtomicU32::new(DEFAULT_TURN_SECONDS),
                auto_delay_ms: AtomicU64::new(0),
            }),
        };
        settings.set_turn_seconds(turn_seconds);
        settings.set_auto_delay(auto_delay);
        settings
    }

    /// Seconds allowed per turn (also the algorithm's thinking budget).
    pub fn turn_seconds(&self) -> u32 {
        self.inner.turn_seconds.load(Ordering::Acquire)
    }

    /// Set the seconds per turn, clamped to `1..=120`.
    pub fn set_turn_seconds(&self, seconds: u32) {
        let clamped = seconds.clamp(MIN_TURN_SECONDS, MAX_TURN_SECONDS);
        self.inner.turn_seconds.store(clamped, Ordering::Release);
    }

    /// Delay between two auto-play moves.
    pub fn auto_delay(&self) -> Duration {
        Duration::from_millis(self.inner.auto_delay_ms.load(Ordering::Acquire))
    }

    /// Set the delay between two auto-play moves.
    pub fn set_auto_delay(&self, delay: Duration) {
        let ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX);
        self.inner.auto_delay_ms.store(ms, Ordering::Release);
    }
}

impl Default for PlaySettings {
    fn default() -> Self {
        Self::new(DEFAULT_TURN_SECONDS, DEFAULT_AUTO_DELAY)
    }
}
