//! Deprecation policy: severity derivation from days-until-removal, and a
//! cooldown-tracked record of when low-severity notices were last shown.

use crate::error::Error;
use crate::fs::FileSystem;
use crate::spec::model::DeprecationInfo;
use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// Severity of an approaching or passed removal date.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Severity {
    Info,
    Warning,
    Urgent,
    Critical,
    Removed,
}

impl Severity {
    /// Derives severity from whole days remaining until `removal_date`
    /// (negative once the date has passed).
    #[must_use]
    pub fn from_days_remaining(days_remaining: i64) -> Self {
        if days_remaining < 0 {
            Self::Removed
        } else if days_remaining < 30 {
            Self::Critical
        } else if days_remaining < 90 {
            Self::Urgent
        } else if days_remaining < 180 {
            Self::Warning
        } else {
            Self::Info
        }
    }
}

/// What the executor should do in response to a severity, independent of
/// whether this is the first time it's been seen this invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Policy {
    /// Blocked entirely; cannot proceed regardless of flags.
    Block,
    /// Require `--force` to proceed.
    RequireForce,
    /// Show a warning every invocation, then proceed.
    WarnAlways,
    /// Show a warning at most once per cooldown window, then proceed.
    WarnWithCooldown,
}

#[must_use]
pub fn policy_for(severity: Severity) -> Policy {
    match severity {
        Severity::Removed => Policy::Block,
        Severity::Critical => Policy::RequireForce,
        Severity::Urgent | Severity::Warning => Policy::WarnAlways,
        Severity::Info => Policy::WarnWithCooldown,
    }
}

/// Computes whole days remaining between today (UTC) and `removal_date`.
#[must_use]
pub fn days_remaining(removal_date: NaiveDate) -> i64 {
    (removal_date - Utc::now().date_naive()).num_days()
}

/// Cooldown window for `Info`-severity notices: shown at most once per
/// `COOLDOWN_DAYS` per operation.
const COOLDOWN_DAYS: i64 = 7;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct TrackingState {
    #[serde(default)]
    last_shown: HashMap<String, NaiveDate>,
}

/// Tracks when `Info`-severity deprecation notices were last shown, per
/// operation id, persisted under the CLI's data directory.
pub struct DeprecationTracker<F: FileSystem> {
    fs: F,
    path: PathBuf,
}

impl<F: FileSystem> DeprecationTracker<F> {
    #[must_use]
    pub const fn new(fs: F, path: PathBuf) -> Self {
        Self { fs, path }
    }

    fn load(&self) -> TrackingState {
        self.fs
            .read_to_string(&self.path)
            .ok()
            .and_then(|content| serde_yaml::from_str(&content).ok())
            .unwrap_or_default()
    }

    fn save(&self, state: &TrackingState) -> Result<(), Error> {
        if let Some(parent) = self.path.parent() {
            self.fs.create_dir_all(parent)?;
        }
        let content = serde_yaml::to_string(state)?;
        self.fs.write_all(&self.path, content.as_bytes())?;
        Ok(())
    }

    /// Returns `true` and records the sighting if an `Info`-severity notice
    /// for `operation_id` hasn't been shown within the cooldown window.
    ///
    /// # Errors
    /// Returns an error if the tracking file can't be read or written.
    pub fn should_show_info_notice(&self, operation_id: &str) -> Result<bool, Error> {
        let mut state = self.load();
        let today = Utc::now().date_naive();
        let should_show = match state.last_shown.get(operation_id) {
            Some(last) => (today - *last).num_days() >= COOLDOWN_DAYS,
            None => true,
        };
        if should_show {
            state.last_shown.insert(operation_id.to_string(), today);
            self.save(&state)?;
        }
        Ok(should_show)
    }
}

/// Builds the user-facing deprecation message from `info`, falling back to
/// a generic notice when `info.message` is absent.
#[must_use]
pub fn format_notice(operation_id: &str, info: &DeprecationInfo, severity: Severity) -> String {
    let mut notice = info
        .message
        .clone()
        .unwrap_or_else(|| format!("'{operation_id}' is deprecated"));
    if let Some(date) = info.removal_date {
        notice.push_str(&format!(" (removal date: {date})"));
    }
    if let Some(migration) = &info.migration {
        notice.push_str(&format!(". Migration: {migration}"));
    }
    if severity == Severity::Critical {
        notice.push_str(". Pass --force to proceed.");
    }
    notice
}

/// Evaluates whether an operation with `Sunset` metadata may proceed.
///
/// # Errors
/// Returns `Error::deprecation_blocked` when the policy is `Block`, or when
/// it's `RequireForce` and `force` is false.
pub fn enforce(operation_id: &str, info: &DeprecationInfo, force: bool) -> Result<Option<String>, Error> {
    let Some(removal_date) = info.removal_date else {
        return Ok(info.message.clone());
    };
    let severity = Severity::from_days_remaining(days_remaining(removal_date));
    let notice = format_notice(operation_id, info, severity);

    match policy_for(severity) {
        Policy::Block => Err(Error::deprecation_blocked(notice)),
        Policy::RequireForce if !force => Err(Error::deprecation_blocked(notice)),
        _ => Ok(Some(notice)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fs::MemoryFileSystem;

    #[test]
    fn severity_thresholds_match_policy() {
        assert_eq!(Severity::from_days_remaining(200), Severity::Info);
        assert_eq!(Severity::from_days_remaining(100), Severity::Warning);
        assert_eq!(Severity::from_days_remaining(50), Severity::Urgent);
        assert_eq!(Severity::from_days_remaining(10), Severity::Critical);
        assert_eq!(Severity::from_days_remaining(-1), Severity::Removed);
    }

    #[test]
    fn policy_mapping_is_correct() {
        assert_eq!(policy_for(Severity::Removed), Policy::Block);
        assert_eq!(policy_for(Severity::Critical), Policy::RequireForce);
        assert_eq!(policy_for(Severity::Urgent), Policy::WarnAlways);
        assert_eq!(policy_for(Severity::Warning), Policy::WarnAlways);
        assert_eq!(policy_for(Severity::Info), Policy::WarnWithCooldown);
    }

    #[test]
    fn removed_operation_is_blocked() {
        let info = DeprecationInfo {
            removal_date: Some(Utc::now().date_naive() - chrono::Duration::days(1)),
            message: Some("no longer available".to_string()),
            migration: None,
        };
        let result = enforce("deleteCluster", &info, false);
        assert!(result.is_err());
    }

    #[test]
    fn critical_without_force_is_blocked() {
        let info = DeprecationInfo {
            removal_date: Some(Utc::now().date_naive() + chrono::Duration::days(10)),
            message: None,
            migration: None,
        };
        assert!(enforce("deleteCluster", &info, false).is_err());
        assert!(enforce("deleteCluster", &info, true).is_ok());
    }

    #[test]
    fn info_notice_cooldown_suppresses_repeat_within_window() {
        let fs = MemoryFileSystem::new();
        let tracker = DeprecationTracker::new(fs, PathBuf::from("/data/deprecation-tracking.yaml"));
        assert!(tracker.should_show_info_notice("getCluster").unwrap());
        assert!(!tracker.should_show_info_notice("getCluster").unwrap());
    }

    #[test]
    fn info_notice_tracks_independently_per_operation() {
        let fs = MemoryFileSystem::new();
        let tracker = DeprecationTracker::new(fs, PathBuf::from("/data/deprecation-tracking.yaml"));
        assert!(tracker.should_show_info_notice("getCluster").unwrap());
        assert!(tracker.should_show_info_notice("listClusters").unwrap());
    }

    #[test]
    fn format_notice_includes_migration_hint() {
        let info = DeprecationInfo {
            removal_date: None,
            message: Some("use v2 instead".to_string()),
            migration: Some("switch to createClusterV2".to_string()),
        };
        let notice = format_notice("createCluster", &info, Severity::Warning);
        assert!(notice.contains("switch to createClusterV2"));
    }
}
