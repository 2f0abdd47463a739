pub mod auth;
pub mod family;
pub mod profile;
pub mod user;
pub mod wizard;
