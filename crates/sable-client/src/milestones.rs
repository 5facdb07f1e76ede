use std::collections::HashSet;

use tracing::info;

use sable_types::models::{MessageType, SubscriptionStatus};

/// Usage thresholds, in percent, that trigger a one-time notice.
pub const MILESTONES: [u8; 3] = [50, 75, 90];

/// A milestone `m` counts as entered while `m <= pct < m + BAND_WIDTH`.
pub const BAND_WIDTH: f64 = 10.0;

/// `used / (limit + credits)` as a percentage. A zero denominator is 0%.
pub fn usage_percent(used: u64, limit: u64, credits: u64) -> f64 {
    let total = limit.saturating_add(credits);
    if total == 0 {
        return 0.0;
    }
    used as f64 / total as f64 * 100.0
}

/// The milestone whose band contains `pct`, if any.
pub fn milestone_band(pct: f64) -> Option<u8> {
    MILESTONES
        .iter()
        .copied()
        .find(|&m| pct >= f64::from(m) && pct < f64::from(m) + BAND_WIDTH)
}

#[derive(Debug, Clone, PartialEq)]
pub struct MilestoneNotice {
    pub kind: MessageType,
    pub milestone: u8,
    pub percent: f64,
}

impl MilestoneNotice {
    pub fn message(&self) -> String {
        format!(
            "You've used {}% of your {} messages ({:.1}%)",
            self.milestone, self.kind, self.percent
        )
    }
}

/// Milestones already announced, keyed by message class.
#[derive(Debug, Clone, Default)]
pub struct MilestoneFlags(HashSet<(MessageType, u8)>);

impl MilestoneFlags {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_flagged(&self, kind: MessageType, milestone: u8) -> bool {
        self.0.contains(&(kind, milestone))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn clear(&mut self) {
        self.0.clear();
    }

    /// Returns `true` if the pair was not flagged before.
    fn flag(&mut self, kind: MessageType, milestone: u8) -> bool {
        self.0.insert((kind, milestone))
    }
}

/// Emits a notice the first time `pct` lands in a milestone band for `kind`.
pub fn check_milestone(flags: &mut MilestoneFlags, kind: MessageType, pct: f64) -> Option<MilestoneNotice> {
    let milestone = milestone_band(pct)?;
    flags.flag(kind, milestone).then_some(MilestoneNotice {
        kind,
        milestone,
        percent: pct,
    })
}

/// Watches subscription status snapshots for milestone crossings.
#[derive(Debug, Default)]
pub struct MilestoneWatcher {
    flags: MilestoneFlags,
}

impl MilestoneWatcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Checks standard then premium usage; returns the notices to show.
    pub fn observe(&mut self, status: &SubscriptionStatus) -> Vec<MilestoneNotice> {
        let mut notices = Vec::new();
        for kind in [MessageType::Standard, MessageType::Premium] {
            let (used, limit, credits) = status.counters(kind);
            let pct = usage_percent(used, limit, credits);
            if let Some(notice) = check_milestone(&mut self.flags, kind, pct) {
                info!("{} usage reached {}% ({:.1}%)", kind, notice.milestone, pct);
                notices.push(notice);
            }
        }
        notices
    }

    /// Forgets every announced milestone, e.g. at billing-period rollover.
    pub fn reset(&mut self) {
        self.flags.clear();
    }

    pub fn flags(&self) -> &MilestoneFlags {
        &self.flags
    }
}
