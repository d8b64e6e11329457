pub mod attendance;
pub mod organization;
pub mod role;
pub mod team;
pub mod user;
