pub mod address;
pub mod package;
pub mod user;
