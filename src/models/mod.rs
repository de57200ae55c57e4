pub mod admin;
pub mod credential;
pub mod peer;
pub mod torrent;
pub mod user;
