//! Watched table names.

pub const USER_STATUSES: &str = "user_statuses";
pub const USER_MOODS: &str = "user_moods";
pub const NICKNAMES: &str = "nicknames";
pub const JOIN_REQUESTS: &str = "join_requests";
pub const GROUP_MEMBERS: &str = "group_members";

/// Tables a group dashboard subscribes to.
pub const GROUP_TABLES: [&str; 5] = [
    USER_STATUSES,
    USER_MOODS,
    NICKNAMES,
    JOIN_REQUESTS,
    GROUP_MEMBERS,
];
