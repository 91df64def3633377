pub mod cli;
pub mod config;
pub mod dispatch;
pub mod error;
pub mod inventory;
pub mod notify;
pub mod output;
pub mod profile;
pub mod select;
pub mod state;
pub mod workflow;
