use serde::{Deserialize, Serialize};

/// The authenticated profile handed over by the identity provider after a
/// successful login. The aggregator consumes it verbatim; it never reaches
/// the database directly.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SteamProfile {
    /// 64-bit Steam id, as a decimal string.
    pub id: String,
    pub display_name: String,
    /// Avatar URLs, smallest first.
    pub photos: Vec<String>,
}

impl SteamProfile {
    /// The largest avatar, if the provider returned any.
    pub fn best_photo(&self) -> Option<&str> {
        self.photos.last().map(String::as_str)
    }
}
