use std::collections::{HashMap, VecDeque};
use std::fmt;

use anyhow::Result;
use serde::Serialize;
use sha2::{Digest, Sha256};

use crate::assets::{AssetKind, ImageSlot};
use crate::kart_record::{Kart, RecordSelector};
use crate::track_ranking::{RankedTable, SortField, SortSeq, TrackPage};

pub const FETCH_FAILED_NOTICE: &str = "An error occurred. Please try again in a moment.";

const SPEED_SOLO_ID: &str = "7b9f0fd5377c38514dbb78ebe63ac6c3b81009d5a31dd569d1cff8f005aa881a";
const SPEED_TEAM_ID: &str = "effd66758144a29868663aa50e85d3d95c5bc0147d7fdb9802691c2087f3416e";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum GameType {
    #[default]
    SpeedSolo,
    SpeedTeam,
}

impl GameType {
    pub fn match_type_id(self) -> &'static str {
        match self {
            GameType::SpeedSolo => SPEED_SOLO_ID,
            GameType::SpeedTeam => SPEED_TEAM_ID,
        }
    }

    pub fn toggled(self) -> Self {
        match self {
            GameType::SpeedSolo => GameType::SpeedTeam,
            GameType::SpeedTeam => GameType::SpeedSolo,
        }
    }

    /// Accepts `solo`/`team` or the raw match-type id.
    pub fn parse(raw: &str) -> Option<Self> {
        let value = raw.trim().to_ascii_lowercase();
        match value.as_str() {
            "solo" | "speed-solo" | "speed_solo" | SPEED_SOLO_ID => Some(GameType::SpeedSolo),
            "team" | "speed-team" | "speed_team" | SPEED_TEAM_ID => Some(GameType::SpeedTeam),
            _ => None,
        }
    }
}

/// Content hash of a fetched entity list.
///
/// Two fetches with identical content share a revision, so only a real data
/// change resets selection.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Revision([u8; 32]);

impl Revision {
    pub fn of<T: Serialize + ?Sized>(value: &T) -> Self {
        let mut hasher = Sha256::new();
        // Writing into a hasher cannot fail; a serializer error only shortens the input.
        let _ = serde_json::to_writer(&mut hasher, value);
        Self(hasher.finalize().into())
    }
}

impl fmt::Debug for Revision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Revision(")?;
        for byte in &self.0[..6] {
            write!(f, "{byte:02x}")?;
        }
        write!(f, ")")
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Screen {
    Home,
    Track,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Query {
    Tracks { game_type: GameType },
    UserKarts { nickname: String, game_type: GameType },
}

impl fmt::Display for Query {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Query::Tracks { game_type } => write!(f, "tracks ({})", game_type_label(*game_type)),
            Query::UserKarts {
                nickname,
                game_type,
            } => write!(f, "karts for {nickname} ({})", game_type_label(*game_type)),
        }
    }
}

#[derive(Debug, Clone)]
pub struct AppState {
    pub screen: Screen,
    pub game_type: GameType,
    pub default_game_type: GameType,
    pub nickname: Option<String>,
    pub karts: RecordSelector,
    pub karts_loading: bool,
    pub tracks: RankedTable,
    pub tracks_loading: bool,
    pub filter_input_active: bool,
    pub guide_overlay: bool,
    pub help_overlay: bool,
    pub alert: Option<String>,
    pub cleared_by_failure: bool,
    pub logs: VecDeque<String>,
    pub kart_images: HashMap<String, ImageSlot>,
    pub track_images: HashMap<String, ImageSlot>,
}

impl Default for AppState {
    fn default() -> Self {
        Self::new(GameType::default(), None)
    }
}

impl AppState {
    pub fn new(game_type: GameType, nickname: Option<String>) -> Self {
        Self {
            screen: Screen::Home,
            game_type,
            default_game_type: game_type,
            nickname,
            karts: RecordSelector::new(),
            karts_loading: false,
            tracks: RankedTable::new(),
            tracks_loading: false,
            filter_input_active: false,
            guide_overlay: false,
            help_overlay: false,
            alert: None,
            cleared_by_failure: false,
            logs: VecDeque::with_capacity(200),
            kart_images: HashMap::new(),
            track_images: HashMap::new(),
        }
    }

    pub fn on_select(&mut self, index: usize) -> Result<()> {
        self.karts.select(index)
    }

    pub fn on_filter_change(&mut self, text: impl Into<String>) {
        self.tracks.set_filter(text);
    }

    pub fn on_sort_change(&mut self, field: SortField, seq: SortSeq) {
        self.tracks.set_sort(field, seq);
    }

    pub fn on_kart_error(&mut self, kart_id: &str) {
        let slot = self
            .kart_images
            .entry(kart_id.to_string())
            .or_insert_with(|| ImageSlot::kart(kart_id));
        if slot.on_error() {
            self.push_log(format!("[INFO] Kart image {kart_id} unavailable, using fallback"));
        }
    }

    pub fn on_track_error(&mut self, track_id: &str) {
        let slot = self
            .track_images
            .entry(track_id.to_string())
            .or_insert_with(|| ImageSlot::track(track_id));
        if slot.on_error() {
            self.push_log(format!("[INFO] Track image {track_id} unavailable, using fallback"));
        }
    }

    pub fn kart_image_url(&self, kart_id: &str) -> String {
        match self.kart_images.get(kart_id) {
            Some(slot) => slot.url().to_string(),
            None => ImageSlot::kart(kart_id).url().to_string(),
        }
    }

    pub fn track_image_url(&self, track_id: &str) -> String {
        match self.track_images.get(track_id) {
            Some(slot) => slot.url().to_string(),
            None => ImageSlot::track(track_id).url().to_string(),
        }
    }

    /// Registers the thumbnail of the selected kart and track, returning the ones not yet checked.
    pub fn take_unprobed_assets(&mut self) -> Vec<(AssetKind, String, String)> {
        let mut out = Vec::new();
        if let Some(id) = self.karts.selected_id().map(str::to_string)
            && !self.kart_images.contains_key(&id)
        {
            let slot = ImageSlot::kart(&id);
            out.push((AssetKind::Kart, id.clone(), slot.primary.clone()));
            self.kart_images.insert(id, slot);
        }
        if let Some(id) = self.tracks.selected().map(|t| t.id.clone())
            && !self.track_images.contains_key(&id)
        {
            let slot = ImageSlot::track(&id);
            out.push((AssetKind::Track, id.clone(), slot.primary.clone()));
            self.track_images.insert(id, slot);
        }
        out
    }

    pub fn switch_screen(&mut self) {
        self.screen = match self.screen {
            Screen::Home => Screen::Track,
            Screen::Track => Screen::Home,
        };
        self.filter_input_active = false;
        self.guide_overlay = false;
    }

    /// Switches game mode. Data for the previous mode is dropped so it is never shown under
    /// the new mode's title.
    pub fn set_game_type(&mut self, game_type: GameType) -> bool {
        if self.game_type == game_type {
            return false;
        }
        self.game_type = game_type;
        self.tracks.clear();
        self.tracks_loading = false;
        self.karts.clear();
        self.karts_loading = false;
        self.push_log(format!("[INFO] Game mode: {}", game_type_label(game_type)));
        true
    }

    /// Failed fetch: notify, forget the chosen mode, and go back to the home view.
    pub fn on_fetch_failed(&mut self, query: &Query, error: &str) {
        self.push_log(format!("[WARN] Fetch {query} failed: {error}"));
        self.alert = Some(FETCH_FAILED_NOTICE.to_string());
        self.cleared_by_failure = true;
        self.game_type = self.default_game_type;
        self.tracks.clear();
        self.tracks_loading = false;
        self.karts.clear();
        self.karts_loading = false;
        self.filter_input_active = false;
        self.guide_overlay = false;
        self.screen = Screen::Home;
    }

    pub fn dismiss_alert(&mut self) {
        self.alert = None;
    }

    pub fn push_filter_char(&mut self, ch: char) {
        let mut text = self.tracks.filter().to_string();
        text.push(ch);
        self.on_filter_change(text);
    }

    pub fn pop_filter_char(&mut self) {
        let mut text = self.tracks.filter().to_string();
        if text.pop().is_some() {
            self.on_filter_change(text);
        }
    }

    /// Moves to the next column the way a header click would, so it starts descending.
    pub fn cycle_sort_field(&mut self) {
        let next = self.tracks.sort().standard.next();
        self.tracks.toggle_sort(next);
    }

    pub fn flip_sort_seq(&mut self) {
        let sort = self.tracks.sort();
        self.on_sort_change(sort.standard, sort.seq.flipped());
    }

    pub fn push_log(&mut self, msg: impl Into<String>) {
        const MAX_LOGS: usize = 200;
        self.logs.push_back(msg.into());
        while self.logs.len() > MAX_LOGS {
            self.logs.pop_front();
        }
    }
}

#[derive(Debug, Clone)]
pub enum Delta {
    SetTracks {
        game_type: GameType,
        page: TrackPage,
        revision: Revision,
    },
    SetUserKarts {
        game_type: GameType,
        nickname: String,
        karts: Vec<Kart>,
        revision: Revision,
    },
    FetchFailed {
        query: Query,
        error: String,
    },
    ImageLoadFailed {
        kind: AssetKind,
        id: String,
    },
    Log(String),
}

#[derive(Debug, Clone)]
pub enum ProviderCommand {
    FetchTracks {
        game_type: GameType,
    },
    FetchUserKarts {
        nickname: String,
        game_type: GameType,
    },
    ProbeAsset {
        kind: AssetKind,
        id: String,
        url: String,
    },
}

pub fn apply_delta(state: &mut AppState, delta: Delta) {
    match delta {
        Delta::SetTracks {
            game_type,
            page,
            revision,
        } => {
            if game_type != state.game_type {
                state.push_log(format!(
                    "[INFO] Dropped tracks for {} (mode changed)",
                    game_type_label(game_type)
                ));
                return;
            }
            let count = page.tracks.len();
            state.tracks.replace(page, revision);
            state.tracks_loading = false;
            state.cleared_by_failure = false;
            state.push_log(format!("[INFO] Loaded {count} tracks"));
        }
        Delta::SetUserKarts {
            game_type,
            nickname,
            karts,
            revision,
        } => {
            if game_type != state.game_type || state.nickname.as_deref() != Some(nickname.as_str())
            {
                state.push_log(format!("[INFO] Dropped karts for {nickname} (query changed)"));
                return;
            }
            let count = karts.len();
            state.karts.replace(karts, revision);
            state.karts_loading = false;
            state.cleared_by_failure = false;
            state.push_log(format!("[INFO] Loaded {count} karts for {nickname}"));
        }
        Delta::FetchFailed { query, error } => {
            let current = match &query {
                Query::Tracks { game_type } => *game_type == state.game_type,
                Query::UserKarts {
                    nickname,
                    game_type,
                } => {
                    *game_type == state.game_type
                        && state.nickname.as_deref() == Some(nickname.as_str())
                }
            };
            if !current {
                state.push_log(format!("[INFO] Ignored failure of superseded {query}: {error}"));
                return;
            }
            state.on_fetch_failed(&query, &error);
        }
        Delta::ImageLoadFailed { kind, id } => match kind {
            AssetKind::Kart => state.on_kart_error(&id),
            AssetKind::Track => state.on_track_error(&id),
        },
        Delta::Log(msg) => state.push_log(msg),
    }
}

pub fn game_type_label(game_type: GameType) -> &'static str {
    match game_type {
        GameType::SpeedSolo => "Speed Solo",
        GameType::SpeedTeam => "Speed Team",
    }
}

pub fn screen_label(screen: Screen) -> &'static str {
    match screen {
        Screen::Home => "KART RECORD",
        Screen::Track => "TRACK RANKING",
    }
}
