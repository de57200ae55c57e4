pub mod credential_store;
pub mod swarm;
pub mod torrent_store;
pub mod user_store;
