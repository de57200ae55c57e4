use dashmap::DashSet;

/// Registry of banned BitTorrent clients.
///
/// A client is banned either by its peer-id prefix (the azureus-style
/// `-XX1234-` client fingerprint) or by a User-Agent substring.
#[derive(Debug, Default)]
pub struct ClientBanList {
    peer_prefixes: DashSet<Vec<u8>>,
    user_agents: DashSet<String>,
}

impl ClientBanList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_config(peer_prefixes: &[String], user_agents: &[String]) -> Self {
        let bans = Self::new();
        for prefix in peer_prefixes {
            bans.ban_peer_prefix(prefix.as_bytes().to_vec());
        }
        for agent in user_agents {
            bans.ban_user_agent(agent.clone());
        }
        tracing::info!(
            peer_prefixes = bans.peer_prefixes.len(),
            user_agents = bans.user_agents.len(),
            "Initialized client ban list"
        );
        bans
    }

    pub fn ban_peer_prefix(&self, prefix: Vec<u8>) {
        self.peer_prefixes.insert(prefix);
    }

    pub fn unban_peer_prefix(&self, prefix: &[u8]) {
        self.peer_prefixes.remove(prefix);
    }

    pub fn ban_user_agent(&self, agent: String) {
        self.user_agents.insert(agent);
    }

    pub fn unban_user_agent(&self, agent: &str) {
        self.user_agents.remove(agent);
    }

    /// Whether the announcing client matches any ban entry.
    pub fn is_banned(&self, peer_id: &[u8; 20], user_agent: &str) -> bool {
        self.peer_prefixes
            .iter()
            .any(|entry| peer_id.starts_with(entry.key()))
            || self
                .user_agents
                .iter()
                .any(|entry| user_agent.contains(entry.key().as_str()))
    }

    pub fn list_peer_prefixes(&self) -> Vec<String> {
        self.peer_prefixes
            .iter()
            .map(|entry| String::from_utf8_lossy(entry.key()).into_owned())
            .collect()
    }

    pub fn list_user_agents(&self) -> Vec<String> {
        self.user_agents
            .iter()
            .map(|entry| entry.key().clone())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.peer_prefixes.len() + self.user_agents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.peer_prefixes.is_empty() && self.user_agents.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn peer_id(prefix: &[u8]) -> [u8; 20] {
        let mut id = [b'0'; 20];
        id[..prefix.len()].copy_from_slice(prefix);
        id
    }

    #[test]
    fn test_peer_prefix_ban() {
        let bans = ClientBanList::new();
        bans.ban_peer_prefix(b"-XL0012-".to_vec());

        assert!(bans.is_banned(&peer_id(b"-XL0012-"), "Xunlei/1.0"));
        assert!(!bans.is_banned(&peer_id(b"-qB4500-"), "qBittorrent/4.5"));
    }

    #[test]
    fn test_user_agent_substring_ban() {
        let bans = ClientBanList::new();
        bans.ban_user_agent("FakeTorrent".to_string());

        assert!(bans.is_banned(&peer_id(b"-AB1000-"), "FakeTorrent/0.1"));
        assert!(!bans.is_banned(&peer_id(b"-AB1000-"), "Transmission/4.0"));
    }

    #[test]
    fn test_unban() {
        let bans = ClientBanList::new();
        bans.ban_peer_prefix(b"-XL".to_vec());
        bans.unban_peer_prefix(b"-XL");

        assert!(!bans.is_banned(&peer_id(b"-XL0012-"), ""));
        assert!(bans.is_empty());
    }

    #[test]
    fn test_from_config() {
        let bans = ClientBanList::from_config(
            &["-XL0012-".to_string()],
            &["SpamBot".to_string()],
        );
        assert_eq!(bans.len(), 2);
        assert!(bans.is_banned(&peer_id(b"-XL0012-"), ""));
        assert!(bans.is_banned(&peer_id(b"-AA0000-"), "SpamBot/9"));
    }
}
