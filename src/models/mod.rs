mod admin;
mod forms;
mod job;
mod user;

pub use admin::{Admin, AdminRole};
pub use forms::{
    AdminDashboard, AnalyticsParams, HistoryParams, JobDetail, JobList, JobStats, JobWithUser,
    JobsList, JobsParams, LoginRequest, LoginResponse, MessageResponse, QueuedJob, RecentJob,
    RegisterAdminRequest, RegisterAdminResponse, SubmitRequest, SubmitResponse, TokenParams,
    UpdateStatusRequest, UpdateStatusResponse, UserDashboard, VerifyTokenResponse,
};
pub use job::{JobPriority, JobStatus, LaundryJob};
pub use user::{NewUser, PlanTier, Subscription, User};
