use std::fs;
use std::path::PathBuf;

use tmi_terminal::api::{parse_tracks_json, parse_user_karts_json, tracks_url, user_url};
use tmi_terminal::state::GameType;

fn read_fixture(name: &str) -> String {
    let mut path = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    path.push("tests");
    path.push("fixtures");
    path.push(name);
    fs::read_to_string(path).expect("fixture file should be readable")
}

#[test]
fn parses_tracks_fixture() {
    let raw = read_fixture("tracks.json");
    let page = parse_tracks_json(&raw).expect("fixture should parse");
    assert_eq!(page.total_count, 3480);
    assert_eq!(page.tracks.len(), 3);
    assert_eq!(page.tracks[0].best_rider, "라이더1");
    assert_eq!(page.tracks[0].best_record, Some(94_210));
    assert_eq!(page.tracks[0].average_record, Some(101_882));
    assert_eq!(page.tracks[1].best_record, Some(88_430));
    assert_eq!(page.tracks[1].average_record, Some(95_120));
    assert_eq!(page.tracks[2].best_record, None);
}

#[test]
fn parses_user_karts_fixture() {
    let raw = read_fixture("user_karts.json");
    let karts = parse_user_karts_json(&raw).expect("fixture should parse");
    assert_eq!(karts.len(), 2);
    let proto = &karts[0];
    assert_eq!(proto.win_count, 5);
    assert_eq!(proto.retire_count, 2);
    assert_eq!(proto.map.len(), 3);
    assert_eq!(proto.map[0].record, Some(83_456));
    assert_eq!(proto.map[1].record, Some(91_007));
    assert_eq!(proto.map[2].record, None);
    assert!(karts[1].map.is_empty());
}

#[test]
fn user_payload_accepts_kart_key_and_bare_array() {
    let keyed = r#"{"kart":[{"id":"a","name":"A","count":1,"winCount":1,"retireCount":0}]}"#;
    let bare = r#"[{"id":"a","name":"A"}]"#;
    assert_eq!(parse_user_karts_json(keyed).unwrap().len(), 1);
    let karts = parse_user_karts_json(bare).unwrap();
    assert_eq!(karts[0].count, 0);
    assert!(karts[0].map.is_empty());
}

#[test]
fn empty_payloads_parse_to_empty() {
    assert!(parse_tracks_json("").unwrap().tracks.is_empty());
    assert!(parse_tracks_json("null").unwrap().tracks.is_empty());
    assert!(parse_user_karts_json(" null ").unwrap().is_empty());
    assert!(parse_user_karts_json("{}").unwrap().is_empty());
}

#[test]
fn malformed_payloads_are_errors() {
    assert!(parse_tracks_json("{not json").is_err());
    assert!(parse_tracks_json(r#"{"tracks": 3}"#).is_err());
    assert!(parse_user_karts_json("42").is_err());
}

#[test]
fn urls_carry_match_type_and_encoded_nickname() {
    let url = tracks_url("https://api.example.com/", GameType::SpeedSolo).unwrap();
    assert_eq!(
        url.as_str(),
        format!(
            "https://api.example.com/track/all?matchType={}",
            GameType::SpeedSolo.match_type_id()
        )
    );

    let url = user_url("https://api.example.com/v1", "라이더 1", GameType::SpeedTeam).unwrap();
    assert!(url.path().starts_with("/v1/user/"));
    assert!(!url.path().contains(' '));
    assert!(url.as_str().contains(GameType::SpeedTeam.match_type_id()));
}

#[test]
fn bad_api_base_is_an_error() {
    assert!(tracks_url("not a url", GameType::SpeedSolo).is_err());
}
