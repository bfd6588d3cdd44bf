use tmi_terminal::assets::{AssetKind, KART_FALLBACK_URL, TRACK_FALLBACK_URL, kart_image_url};
use tmi_terminal::kart_record::Kart;
use tmi_terminal::provider::seed_karts;
use tmi_terminal::state::{
    AppState, Delta, FETCH_FAILED_NOTICE, GameType, Query, Revision, Screen, apply_delta,
};
use tmi_terminal::track_ranking::{SortField, SortSeq, TrackDetail, TrackPage};

fn page(names: &[&str]) -> TrackPage {
    TrackPage {
        tracks: names
            .iter()
            .enumerate()
            .map(|(idx, name)| TrackDetail {
                id: format!("t{idx}"),
                name: name.to_string(),
                count: (idx as u64 + 1) * 10,
                best_rider: "라이더1".to_string(),
                best_record: Some(90_000 + idx as u64),
                average_record: None,
            })
            .collect(),
        total_count: 100,
    }
}

fn set_tracks(game_type: GameType, page: TrackPage) -> Delta {
    Delta::SetTracks {
        game_type,
        revision: Revision::of(&page),
        page,
    }
}

fn set_karts(nickname: &str, game_type: GameType, karts: Vec<Kart>) -> Delta {
    Delta::SetUserKarts {
        game_type,
        nickname: nickname.to_string(),
        revision: Revision::of(&karts),
        karts,
    }
}

#[test]
fn tracks_for_current_mode_are_installed() {
    let mut state = AppState::new(GameType::SpeedSolo, None);
    state.tracks_loading = true;
    apply_delta(&mut state, set_tracks(GameType::SpeedSolo, page(&["A", "B"])));
    assert!(!state.tracks_loading);
    assert_eq!(state.tracks.visible_len(), 2);
}

#[test]
fn tracks_for_superseded_mode_are_dropped() {
    let mut state = AppState::new(GameType::SpeedSolo, None);
    assert!(state.set_game_type(GameType::SpeedTeam));
    apply_delta(&mut state, set_tracks(GameType::SpeedSolo, page(&["A"])));
    assert!(!state.tracks.has_data());
    assert!(state.logs.back().unwrap().contains("Dropped tracks"));
}

#[test]
fn karts_for_other_rider_are_dropped() {
    let mut state = AppState::new(GameType::SpeedSolo, Some("rider".to_string()));
    apply_delta(
        &mut state,
        set_karts("someone-else", GameType::SpeedSolo, seed_karts(GameType::SpeedSolo)),
    );
    assert!(state.karts.is_empty());

    apply_delta(
        &mut state,
        set_karts("rider", GameType::SpeedSolo, seed_karts(GameType::SpeedSolo)),
    );
    assert_eq!(state.karts.karts().len(), 4);
}

#[test]
fn refetch_with_new_content_resets_kart_selection() {
    let mut state = AppState::new(GameType::SpeedSolo, Some("rider".to_string()));
    let karts = seed_karts(GameType::SpeedSolo);
    apply_delta(&mut state, set_karts("rider", GameType::SpeedSolo, karts.clone()));
    state.on_select(2).unwrap();

    // Same content: cached response, selection kept.
    apply_delta(&mut state, set_karts("rider", GameType::SpeedSolo, karts.clone()));
    assert_eq!(state.karts.selected_index(), Some(2));

    let mut changed = karts;
    changed[0].count += 1;
    apply_delta(&mut state, set_karts("rider", GameType::SpeedSolo, changed));
    assert_eq!(state.karts.selected_index(), Some(0));
}

#[test]
fn fetch_failure_alerts_resets_mode_and_goes_home() {
    let mut state = AppState::new(GameType::SpeedSolo, Some("rider".to_string()));
    state.screen = Screen::Track;
    state.set_game_type(GameType::SpeedTeam);
    apply_delta(&mut state, set_tracks(GameType::SpeedTeam, page(&["A"])));
    state.filter_input_active = true;

    apply_delta(
        &mut state,
        Delta::FetchFailed {
            query: Query::Tracks {
                game_type: GameType::SpeedTeam,
            },
            error: "http 500".to_string(),
        },
    );

    assert_eq!(state.alert.as_deref(), Some(FETCH_FAILED_NOTICE));
    assert_eq!(state.game_type, GameType::SpeedSolo);
    assert_eq!(state.screen, Screen::Home);
    assert!(!state.tracks.has_data());
    assert!(!state.filter_input_active);
    assert!(state.logs.iter().any(|l| l.starts_with("[WARN]") && l.contains("http 500")));

    state.dismiss_alert();
    assert!(state.alert.is_none());
}

#[test]
fn failure_of_superseded_query_is_ignored() {
    let mut state = AppState::new(GameType::SpeedSolo, None);
    state.screen = Screen::Track;
    state.set_game_type(GameType::SpeedTeam);
    apply_delta(
        &mut state,
        Delta::FetchFailed {
            query: Query::Tracks {
                game_type: GameType::SpeedSolo,
            },
            error: "timeout".to_string(),
        },
    );
    assert!(state.alert.is_none());
    assert_eq!(state.screen, Screen::Track);
    assert_eq!(state.game_type, GameType::SpeedTeam);
}

#[test]
fn image_failure_substitutes_fallback_once() {
    let mut state = AppState::default();
    assert_eq!(state.kart_image_url("k1"), kart_image_url("k1"));

    apply_delta(
        &mut state,
        Delta::ImageLoadFailed {
            kind: AssetKind::Kart,
            id: "k1".to_string(),
        },
    );
    assert_eq!(state.kart_image_url("k1"), KART_FALLBACK_URL);
    let logs_after_first = state.logs.len();

    state.on_kart_error("k1");
    assert_eq!(state.kart_image_url("k1"), KART_FALLBACK_URL);
    assert_eq!(state.logs.len(), logs_after_first);

    state.on_track_error("t9");
    assert_eq!(state.track_image_url("t9"), TRACK_FALLBACK_URL);
}

#[test]
fn unprobed_assets_are_reported_once() {
    let mut state = AppState::new(GameType::SpeedSolo, Some("rider".to_string()));
    apply_delta(
        &mut state,
        set_karts("rider", GameType::SpeedSolo, seed_karts(GameType::SpeedSolo)),
    );
    apply_delta(&mut state, set_tracks(GameType::SpeedSolo, page(&["A", "B"])));

    let first = state.take_unprobed_assets();
    assert_eq!(first.len(), 2);
    assert!(first.iter().any(|(kind, id, _)| *kind == AssetKind::Kart && id == "kart-proto-x"));
    assert!(first.iter().any(|(kind, _, _)| *kind == AssetKind::Track));
    assert!(state.take_unprobed_assets().is_empty());

    state.karts.select_next();
    let next = state.take_unprobed_assets();
    assert_eq!(next.len(), 1);
    assert_eq!(next[0].1, "kart-saber-9");
}

#[test]
fn event_handlers_drive_track_view() {
    let mut state = AppState::default();
    apply_delta(
        &mut state,
        set_tracks(GameType::SpeedSolo, page(&["Village", "Forest", "Village Night"])),
    );

    state.on_filter_change("Village");
    assert_eq!(state.tracks.visible_len(), 2);

    state.on_sort_change(SortField::Name, SortSeq::Asc);
    let names: Vec<&str> = state.tracks.visible().map(|t| t.name.as_str()).collect();
    assert_eq!(names, vec!["Village", "Village Night"]);

    state.pop_filter_char();
    assert_eq!(state.tracks.filter(), "Villag");
    state.push_filter_char('e');
    assert_eq!(state.tracks.filter(), "Village");

    state.flip_sort_seq();
    assert_eq!(state.tracks.sort().seq, SortSeq::Desc);
    state.cycle_sort_field();
    assert_eq!(state.tracks.sort().standard, SortField::Count);
}

#[test]
fn zero_count_kart_shows_placeholder_rates() {
    let mut state = AppState::new(GameType::SpeedSolo, Some("rider".to_string()));
    apply_delta(
        &mut state,
        set_karts("rider", GameType::SpeedSolo, seed_karts(GameType::SpeedSolo)),
    );
    let rows = state.karts.rows();
    let retired = rows.iter().find(|r| r.kart.id == "kart-retired").unwrap();
    assert_eq!(retired.win_rate, None);
    assert_eq!(retired.retire_rate, None);
}

#[test]
fn game_type_parses_aliases_and_ids() {
    assert_eq!(GameType::parse("team"), Some(GameType::SpeedTeam));
    assert_eq!(GameType::parse(" Solo "), Some(GameType::SpeedSolo));
    assert_eq!(
        GameType::parse(GameType::SpeedTeam.match_type_id()),
        Some(GameType::SpeedTeam)
    );
    assert_eq!(GameType::parse("item"), None);
}

#[test]
fn next_sort_column_starts_descending_after_reverse() {
    let mut state = AppState::default();
    apply_delta(&mut state, set_tracks(GameType::SpeedSolo, page(&["A", "B"])));
    assert_eq!(state.tracks.sort().standard, SortField::Count);

    state.flip_sort_seq();
    assert_eq!(state.tracks.sort().seq, SortSeq::Asc);

    state.cycle_sort_field();
    let sort = state.tracks.sort();
    assert_eq!((sort.standard, sort.seq), (SortField::BestRider, SortSeq::Desc));
}

#[test]
fn failure_marks_cleared_data_until_next_load() {
    let mut state = AppState::new(GameType::SpeedSolo, Some("rider".to_string()));
    let karts = seed_karts(GameType::SpeedSolo);
    apply_delta(&mut state, set_karts("rider", GameType::SpeedSolo, karts));
    assert!(!state.cleared_by_failure);

    apply_delta(
        &mut state,
        Delta::FetchFailed {
            query: Query::Tracks {
                game_type: GameType::SpeedSolo,
            },
            error: "timeout".to_string(),
        },
    );
    assert!(state.karts.is_empty());
    assert!(state.cleared_by_failure);

    state.dismiss_alert();
    assert!(state.cleared_by_failure);

    let karts = seed_karts(GameType::SpeedSolo);
    apply_delta(&mut state, set_karts("rider", GameType::SpeedSolo, karts));
    assert!(!state.cleared_by_failure);
    assert_eq!(state.karts.selected_index(), Some(0));
}
