pub mod admin;
pub mod contact;
pub mod course;
pub mod shared;
pub mod team;
