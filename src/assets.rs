const ASSET_BASE: &str = "https://s3-ap-northeast-1.amazonaws.com/solution-userstats";

pub const KART_FALLBACK_URL: &str =
    "https://s3-ap-northeast-1.amazonaws.com/solution-userstats/metadata/kart/unknown.png";
pub const TRACK_FALLBACK_URL: &str =
    "https://s3-ap-northeast-1.amazonaws.com/solution-userstats/kartimg/Category/unknown_1.png";

pub fn kart_image_url(kart_id: &str) -> String {
    format!("{ASSET_BASE}/metadata/kart/{kart_id}.png")
}

pub fn track_image_url(track_id: &str) -> String {
    format!("{ASSET_BASE}/kartimg/Category/{track_id}_1.png")
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AssetKind {
    Kart,
    Track,
}

/// A thumbnail that falls back to a placeholder asset once loading fails.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageSlot {
    pub kind: AssetKind,
    pub primary: String,
    pub failed: bool,
}

impl ImageSlot {
    pub fn kart(kart_id: &str) -> Self {
        Self {
            kind: AssetKind::Kart,
            primary: kart_image_url(kart_id),
            failed: false,
        }
    }

    pub fn track(track_id: &str) -> Self {
        Self {
            kind: AssetKind::Track,
            primary: track_image_url(track_id),
            failed: false,
        }
    }

    pub fn url(&self) -> &str {
        if self.failed {
            fallback_url(self.kind)
        } else {
            &self.primary
        }
    }

    /// Returns `true` only on the first failure.
    pub fn on_error(&mut self) -> bool {
        let first = !self.failed;
        self.failed = true;
        first
    }
}

pub fn fallback_url(kind: AssetKind) -> &'static str {
    match kind {
        AssetKind::Kart => KART_FALLBACK_URL,
        AssetKind::Track => TRACK_FALLBACK_URL,
    }
}
