//! Wire and view models shared by the transport, controller and admin shell.

pub mod order;
pub mod report;
pub mod result;
pub mod user;

pub use order::{Order, OrderStatus};
pub use report::{
    EmailReportRequest, GenerateReportRequest, Pagination, Report, ReportListing, ReportQuery,
    SavedArtifact,
};
pub use result::OperationResult;
pub use user::User;
