pub mod history;
pub mod profile;

pub use history::{PlanHistoryEntry, PlanSnapshot};
pub use profile::{CheckinPlan, Goal, Targets, UserProfile};
