use anyhow::{Context, Result, anyhow};
use reqwest::Url;
use reqwest::blocking::Client;
use serde_json::Value;

use crate::kart_record::Kart;
use crate::query_cache::{CacheStatus, QueryCache};
use crate::state::{GameType, Revision};
use crate::track_ranking::TrackPage;

const TRACKS_PATH: [&str; 2] = ["track", "all"];
const USER_PATH: &str = "user";

#[derive(Debug, Clone)]
pub struct Fetched<T> {
    pub value: T,
    pub revision: Revision,
    pub status: CacheStatus,
}

pub fn tracks_url(api_base: &str, game_type: GameType) -> Result<Url> {
    let mut url = base_url(api_base)?;
    url.path_segments_mut()
        .map_err(|_| anyhow!("api base cannot carry a path: {api_base}"))?
        .pop_if_empty()
        .extend(TRACKS_PATH);
    url.query_pairs_mut()
        .append_pair("matchType", game_type.match_type_id());
    Ok(url)
}

pub fn user_url(api_base: &str, nickname: &str, game_type: GameType) -> Result<Url> {
    let mut url = base_url(api_base)?;
    url.path_segments_mut()
        .map_err(|_| anyhow!("api base cannot carry a path: {api_base}"))?
        .pop_if_empty()
        .push(USER_PATH)
        .push(nickname);
    url.query_pairs_mut()
        .append_pair("matchType", game_type.match_type_id());
    Ok(url)
}

fn base_url(api_base: &str) -> Result<Url> {
    Url::parse(api_base.trim()).with_context(|| format!("invalid api base url {api_base:?}"))
}

pub fn fetch_tracks(
    client: &Client,
    cache: &mut QueryCache,
    api_base: &str,
    game_type: GameType,
) -> Result<Fetched<TrackPage>> {
    let url = tracks_url(api_base, game_type)?;
    let cached = cache.fetch_json(client, url.as_str())?;
    let page = match parse_tracks_json(&cached.body) {
        Ok(page) => page,
        Err(err) => {
            cache.invalidate(url.as_str());
            return Err(err);
        }
    };
    Ok(Fetched {
        revision: Revision::of(&page),
        value: page,
        status: cached.status,
    })
}

pub fn fetch_user_karts(
    client: &Client,
    cache: &mut QueryCache,
    api_base: &str,
    nickname: &str,
    game_type: GameType,
) -> Result<Fetched<Vec<Kart>>> {
    let url = user_url(api_base, nickname, game_type)?;
    let cached = cache.fetch_json(client, url.as_str())?;
    let karts = match parse_user_karts_json(&cached.body) {
        Ok(karts) => karts,
        Err(err) => {
            cache.invalidate(url.as_str());
            return Err(err);
        }
    };
    Ok(Fetched {
        revision: Revision::of(&karts),
        value: karts,
        status: cached.status,
    })
}

pub fn parse_tracks_json(raw: &str) -> Result<TrackPage> {
    let trimmed = raw.trim();
    if trimmed.is_empty() || trimmed == "null" {
        return Ok(TrackPage::default());
    }
    serde_json::from_str::<TrackPage>(trimmed).context("invalid tracks json")
}

/// Accepts `{"karts": [...]}`, `{"kart": [...]}` or a bare array.
pub fn parse_user_karts_json(raw: &str) -> Result<Vec<Kart>> {
    let trimmed = raw.trim();
    if trimmed.is_empty() || trimmed == "null" {
        return Ok(Vec::new());
    }
    let root: Value = serde_json::from_str(trimmed).context("invalid user json")?;
    let list = match &root {
        Value::Array(_) => root,
        Value::Object(map) => map
            .get("karts")
            .or_else(|| map.get("kart"))
            .cloned()
            .unwrap_or(Value::Array(Vec::new())),
        _ => return Err(anyhow!("unexpected user payload")),
    };
    serde_json::from_value::<Vec<Kart>>(list).context("invalid kart list")
}

pub fn head_ok(client: &Client, url: &str) -> bool {
    client
        .head(url)
        .send()
        .map(|resp| resp.status().is_success())
        .unwrap_or(false)
}
