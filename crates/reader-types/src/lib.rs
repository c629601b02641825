pub mod auth;
pub mod color;
pub mod error;
pub mod progress;
pub mod types;

pub use auth::{AuthSession, UserProfile, AUTH_STORAGE_KEY};
pub use color::{AnnotationKind, HighlightColor, HighlightStyle};
pub use error::TypesError;
pub use progress::{
    ProgressUpdate, ReadingDashboard, ReadingProgress, ReadingSession, SessionUpdate, StreakDay,
    StreakStats, DEFAULT_DASHBOARD_PERIOD,
};
pub use types::{Highlight, HighlightId, NewHighlight, PositionData, Rect, RecordId};
