pub mod admin;
pub mod course;
pub mod team_member;
