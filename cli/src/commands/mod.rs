pub mod auth;
pub mod chat;
pub mod report;
pub mod rooms;
pub mod team;
