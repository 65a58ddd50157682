pub mod bridge;
pub mod reconnect;
pub mod runner;
pub mod webhook;
