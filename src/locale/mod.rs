//! Localized failure-reason strings.
//!
//! Failure reasons go out on the wire to torrent clients and are shown to
//! the user verbatim, so they are localized to the account's stored language
//! when one was resolved, default language otherwise.

/// Keys for every user-facing failure reason.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageKey {
    BrowserAccess,
    InvalidParameters,
    InvalidCredential,
    CredentialRevoked,
    AccountBanned,
    ClientBanned,
    TorrentNotFound,
    RateLimited,
    SpeedCapExceeded,
    MultiLocation,
}

pub const DEFAULT_LANGUAGE: &str = "en";

/// Look up the message for `key` in `lang`, falling back to the default
/// language for unknown tags.
pub fn localize(key: MessageKey, lang: Option<&str>) -> &'static str {
    let lang = lang.unwrap_or(DEFAULT_LANGUAGE);
    // Only the primary subtag matters ("de-AT" -> "de")
    let primary = lang.split(['-', '_']).next().unwrap_or(DEFAULT_LANGUAGE);

    match primary {
        "de" => german(key),
        "fr" => french(key),
        _ => english(key),
    }
}

fn english(key: MessageKey) -> &'static str {
    match key {
        MessageKey::BrowserAccess => "This announce URL belongs in a torrent client",
        MessageKey::InvalidParameters => "Invalid announce parameters",
        MessageKey::InvalidCredential => "Invalid or unknown credential",
        MessageKey::CredentialRevoked => "This credential has been revoked",
        MessageKey::AccountBanned => "Your account is banned from announcing",
        MessageKey::ClientBanned => "Your client is not allowed on this tracker",
        MessageKey::TorrentNotFound => "Torrent not found",
        MessageKey::RateLimited => "Announced too frequently, slow down",
        MessageKey::SpeedCapExceeded => "Reported upload speed is not plausible",
        MessageKey::MultiLocation => "Too many locations for this torrent",
    }
}

fn german(key: MessageKey) -> &'static str {
    match key {
        MessageKey::BrowserAccess => "Diese Announce-URL gehoert in einen Torrent-Client",
        MessageKey::InvalidParameters => "Ungueltige Announce-Parameter",
        MessageKey::InvalidCredential => "Unbekanntes Zugangstoken",
        MessageKey::CredentialRevoked => "Dieses Zugangstoken wurde widerrufen",
        MessageKey::AccountBanned => "Dein Konto ist gesperrt",
        MessageKey::ClientBanned => "Dein Client ist auf diesem Tracker nicht erlaubt",
        MessageKey::TorrentNotFound => "Torrent nicht gefunden",
        MessageKey::RateLimited => "Zu haeufige Announces, bitte langsamer",
        MessageKey::SpeedCapExceeded => "Gemeldete Upload-Geschwindigkeit ist nicht plausibel",
        MessageKey::MultiLocation => "Zu viele Standorte fuer diesen Torrent",
    }
}

fn french(key: MessageKey) -> &'static str {
    match key {
        MessageKey::BrowserAccess => "Cette URL d'announce se configure dans un client torrent",
        MessageKey::InvalidParameters => "Parametres d'announce invalides",
        MessageKey::InvalidCredential => "Jeton d'acces inconnu",
        MessageKey::CredentialRevoked => "Ce jeton d'acces a ete revoque",
        MessageKey::AccountBanned => "Votre compte est banni",
        MessageKey::ClientBanned => "Votre client n'est pas autorise sur ce tracker",
        MessageKey::TorrentNotFound => "Torrent introuvable",
        MessageKey::RateLimited => "Announces trop frequentes, ralentissez",
        MessageKey::SpeedCapExceeded => "Vitesse d'upload declaree non plausible",
        MessageKey::MultiLocation => "Trop d'emplacements pour ce torrent",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_language() {
        assert_eq!(
            localize(MessageKey::TorrentNotFound, None),
            "Torrent not found"
        );
    }

    #[test]
    fn test_known_language() {
        assert_eq!(
            localize(MessageKey::TorrentNotFound, Some("de")),
            "Torrent nicht gefunden"
        );
        assert_eq!(
            localize(MessageKey::TorrentNotFound, Some("fr")),
            "Torrent introuvable"
        );
    }

    #[test]
    fn test_region_subtag_stripped() {
        assert_eq!(
            localize(MessageKey::AccountBanned, Some("de-AT")),
            "Dein Konto ist gesperrt"
        );
    }

    #[test]
    fn test_unknown_language_falls_back() {
        assert_eq!(
            localize(MessageKey::RateLimited, Some("xx")),
            "Announced too frequently, slow down"
        );
    }
}
