pub mod goal_service;
pub mod roster_service;
pub mod sales_service;

pub use goal_service::{GoalRow, GoalService};
pub use roster_service::{MediaUploads, PersonForm, RosterService, SubmitOutcome, Upload};
pub use sales_service::{SalesRow, SalesService, SalesSummary};
