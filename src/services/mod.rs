pub mod avatar;
pub mod feedback;
pub mod stats;

pub use avatar::{compress_avatar, ingest_avatar, AvatarError};
pub use feedback::{clear_feedbacks, ClearReport, ReadSet};
pub use stats::{rollup_by_month, summarize_period, Balance, MonthKey, MonthTotal, MonthlyRollup, PeriodSummary};
