//! Adaptive render scheduling.
//!
//! The scheduler runs in two regimes. While the user is interacting it targets
//! one frame per display refresh; once input has been quiet for a while it
//! falls back to a slow idle cadence to spare CPU and battery. Requests are
//! coalesced: at most one render is pending at any time.

use crate::core::config::SchedulerConfig;
use instant::Instant;
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderMode {
    Active,
    Idle,
}

/// What the host should do after a render request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScheduleDecision {
    /// Render on the next animation frame.
    NextFrame,
    /// Render once the remaining part of the frame interval has passed.
    Deferred(Duration),
    /// A render is already pending; nothing to do.
    AlreadyPending,
}

#[derive(Debug, Clone)]
pub struct RenderScheduler {
    config: SchedulerConfig,
    mode: RenderMode,
    pending_at: Option<Instant>,
    last_render: Option<Instant>,
    last_interaction: Option<Instant>,
}

impl RenderScheduler {
    pub fn new(config: SchedulerConfig) -> Self {
        Self {
            config,
            mode: RenderMode::Idle,
            pending_at: None,
            last_render: None,
            last_interaction: None,
        }
    }

    pub fn mode(&self) -> RenderMode {
        self.mode
    }

    pub fn is_pending(&self) -> bool {
        self.pending_at.is_some()
    }

    /// When the pending render is due, if one is pending.
    pub fn due_at(&self) -> Option<Instant> {
        self.pending_at
    }

    /// Any pointer, touch, wheel or key event switches to the active regime.
    pub fn note_interaction(&mut self, now: Instant) {
        if self.mode == RenderMode::Idle {
            log::debug!("render scheduler: idle -> active");
        }
        self.mode = RenderMode::Active;
        self.last_interaction = Some(now);
        // a render deferred under the idle cadence is pulled forward
        if let Some(due) = self.pending_at {
            let active_due = self.due_from(now, self.config.active_interval());
            if active_due < due {
                self.pending_at = Some(active_due);
            }
        }
    }

    /// Drops back to idle once the quiet period has elapsed.
    pub fn update_mode(&mut self, now: Instant) -> RenderMode {
        if self.mode == RenderMode::Active {
            let quiet = self
                .last_interaction
                .map(|t| now.saturating_duration_since(t) >= self.config.quiet_period())
                .unwrap_or(true);
            if quiet {
                log::debug!("render scheduler: active -> idle");
                self.mode = RenderMode::Idle;
            }
        }
        self.mode
    }

    /// Target inter-frame interval for the current regime.
    pub fn target_interval(&self) -> Duration {
        match self.mode {
            RenderMode::Active => self.config.active_interval(),
            RenderMode::Idle => self.config.idle_interval(),
        }
    }

    /// Requests a render. Immediate when the target interval has already
    /// elapsed since the previous render, deferred by the remainder otherwise.
    pub fn schedule_render(&mut self, now: Instant) -> ScheduleDecision {
        if self.pending_at.is_some() {
            return ScheduleDecision::AlreadyPending;
        }
        self.update_mode(now);
        let due = self.due_from(now, self.target_interval());
        self.pending_at = Some(due);
        if due <= now {
            ScheduleDecision::NextFrame
        } else {
            ScheduleDecision::Deferred(due - now)
        }
    }

    /// True when a pending render is due at `now`.
    pub fn is_due(&self, now: Instant) -> bool {
        self.pending_at.map(|due| now >= due).unwrap_or(false)
    }

    /// Marks the start of a frame: clears the pending flag and stamps the time.
    pub fn begin_frame(&mut self, now: Instant) {
        self.pending_at = None;
        self.last_render = Some(now);
    }

    fn due_from(&self, now: Instant, interval: Duration) -> Instant {
        match self.last_render {
            Some(last) => {
                let elapsed = now.saturating_duration_since(last);
                if elapsed >= interval {
                    now
                } else {
                    now + (interval - elapsed)
                }
            }
            None => now,
        }
    }
}
