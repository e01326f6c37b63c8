pub mod limiter;
pub mod mail;
pub mod utils;
pub mod web;
