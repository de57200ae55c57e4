pub mod core;
pub mod models;
pub mod stores;
pub mod security;
pub mod accounting;
pub mod anti_cheat;
pub mod bencode;
pub mod locale;
pub mod tracker;
pub mod api;
pub mod metrics;
pub mod validation;
pub mod utils;
pub mod handlers;
