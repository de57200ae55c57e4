pub mod client_bans;
