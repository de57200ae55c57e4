pub mod admin;
pub mod announce;
pub mod fallback;
pub mod health;
pub mod metrics;
pub mod sync;
