//! Reading progress and reading-session records

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::types::RecordId;

/// Per-book progress as returned by `/reading/progress/{bookId}/`
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ReadingProgress {
    #[serde(default)]
    pub current_page: u32,
    #[serde(default)]
    pub total_pages: Option<u32>,
    #[serde(default)]
    pub progress_percentage: Option<f64>,
    #[serde(default)]
    pub is_completed: bool,
    #[serde(default)]
    pub last_read_at: Option<DateTime<Utc>>,
}

impl ReadingProgress {
    /// Server percentage when present, otherwise derived from the page counts
    pub fn percent(&self) -> Option<f64> {
        if let Some(p) = self.progress_percentage {
            return Some(p);
        }
        match self.total_pages {
            Some(total) if total > 0 => {
                Some((self.current_page.min(total) as f64 / total as f64) * 100.0)
            }
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ProgressUpdate {
    pub current_page: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_pages: Option<u32>,
}

/// Active reading session (used for streak tracking on the backend)
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ReadingSession {
    pub id: RecordId,
    #[serde(default)]
    pub start_page: Option<u32>,
    #[serde(default)]
    pub current_page: Option<u32>,
    #[serde(default)]
    pub pages_read: Option<u32>,
    #[serde(default)]
    pub started_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub ended_at: Option<DateTime<Utc>>,
}

impl ReadingSession {
    pub fn is_active(&self) -> bool {
        self.ended_at.is_none()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SessionUpdate {
    pub current_page: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pages_read: Option<u32>,
}

/// Reporting window for `/reading/dashboard/`
pub const DEFAULT_DASHBOARD_PERIOD: &str = "week";

/// Reading dashboard for one period; only the streak statistics are read
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ReadingDashboard {
    #[serde(default)]
    pub stats: StreakStats,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct StreakStats {
    #[serde(default)]
    pub current_streak_days: u32,
    #[serde(default)]
    pub longest_streak_days: u32,
    #[serde(default)]
    pub streak_history: Vec<StreakDay>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StreakDay {
    pub date: NaiveDate,
    #[serde(default)]
    pub read: bool,
}

impl StreakStats {
    /// Days with reading activity, oldest first
    pub fn reading_days(&self) -> Vec<NaiveDate> {
        let mut days: Vec<NaiveDate> = self
            .streak_history
            .iter()
            .filter(|d| d.read)
            .map(|d| d.date)
            .collect();
        days.sort();
        days.dedup();
        days
    }

    pub fn read_on(&self, date: NaiveDate) -> bool {
        self.streak_history.iter().any(|d| d.read && d.date == date)
    }
}
