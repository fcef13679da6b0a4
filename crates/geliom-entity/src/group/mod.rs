//! Group dashboard and membership entities.

pub mod dashboard;
pub mod membership;

pub use dashboard::{DashboardData, DashboardMember, GroupSummary, MemberMood, MemberStatus};
pub use membership::{
    DirectInviteCreated, JoinRequest, JoinRequestCreated, JoinRequestResolution,
    JoinRequestStatus, JoinRequestView,
};
