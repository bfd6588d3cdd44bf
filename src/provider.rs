use std::sync::mpsc::{Receiver, Sender};
use std::thread;

use rand::Rng;

use crate::api;
use crate::config::AppConfig;
use crate::http_client::http_client;
use crate::kart_record::{Kart, RecordItem};
use crate::query_cache::{CacheStatus, QueryCache};
use crate::state::{Delta, GameType, ProviderCommand, Query, Revision};
use crate::track_ranking::{TrackDetail, TrackPage};

/// Serves provider commands on a background thread until the command channel closes.
///
/// Every command produces at most one failure delta. Nothing is retried; the
/// UI decides when to ask again.
pub fn spawn_provider(tx: Sender<Delta>, cmd_rx: Receiver<ProviderCommand>, config: AppConfig) {
    thread::spawn(move || {
        if config.demo {
            run_demo(tx, cmd_rx);
        } else {
            run_remote(tx, cmd_rx, config);
        }
    });
}

fn run_remote(tx: Sender<Delta>, cmd_rx: Receiver<ProviderCommand>, config: AppConfig) {
    let mut cache = QueryCache::new(config.stale_after);

    while let Ok(cmd) = cmd_rx.recv() {
        let client = match http_client(config.request_timeout) {
            Ok(client) => client,
            Err(err) => {
                if let Some(query) = query_for(&cmd) {
                    let _ = tx.send(Delta::FetchFailed {
                        query,
                        error: format!("{err:#}"),
                    });
                }
                continue;
            }
        };

        match cmd {
            ProviderCommand::FetchTracks { game_type } => {
                match api::fetch_tracks(client, &mut cache, &config.api_base, game_type) {
                    Ok(fetched) => {
                        if fetched.status != CacheStatus::Fresh {
                            let _ = tx.send(Delta::Log(format!(
                                "[INFO] Tracks {}",
                                status_label(fetched.status)
                            )));
                        }
                        let _ = tx.send(Delta::SetTracks {
                            game_type,
                            page: fetched.value,
                            revision: fetched.revision,
                        });
                    }
                    Err(err) => {
                        let _ = tx.send(Delta::FetchFailed {
                            query: Query::Tracks { game_type },
                            error: format!("{err:#}"),
                        });
                    }
                }
            }
            ProviderCommand::FetchUserKarts {
                nickname,
                game_type,
            } => match api::fetch_user_karts(
                client,
                &mut cache,
                &config.api_base,
                &nickname,
                game_type,
            ) {
                Ok(fetched) => {
                    let _ = tx.send(Delta::SetUserKarts {
                        game_type,
                        nickname,
                        karts: fetched.value,
                        revision: fetched.revision,
                    });
                }
                Err(err) => {
                    let _ = tx.send(Delta::FetchFailed {
                        query: Query::UserKarts {
                            nickname,
                            game_type,
                        },
                        error: format!("{err:#}"),
                    });
                }
            },
            ProviderCommand::ProbeAsset { kind, id, url } => {
                if !api::head_ok(client, &url) {
                    let _ = tx.send(Delta::ImageLoadFailed { kind, id });
                }
            }
        }
    }
}

fn run_demo(tx: Sender<Delta>, cmd_rx: Receiver<ProviderCommand>) {
    let _ = tx.send(Delta::Log("[INFO] Demo feed active".to_string()));
    let mut rng = rand::thread_rng();
    let solo = seed_tracks(GameType::SpeedSolo, &mut rng);
    let team = seed_tracks(GameType::SpeedTeam, &mut rng);

    while let Ok(cmd) = cmd_rx.recv() {
        match cmd {
            ProviderCommand::FetchTracks { game_type } => {
                let page = match game_type {
                    GameType::SpeedSolo => solo.clone(),
                    GameType::SpeedTeam => team.clone(),
                };
                let _ = tx.send(Delta::SetTracks {
                    game_type,
                    revision: Revision::of(&page),
                    page,
                });
            }
            ProviderCommand::FetchUserKarts {
                nickname,
                game_type,
            } => {
                let karts = seed_karts(game_type);
                let _ = tx.send(Delta::SetUserKarts {
                    game_type,
                    nickname,
                    revision: Revision::of(&karts),
                    karts,
                });
            }
            // Demo assets are never reachable.
            ProviderCommand::ProbeAsset { kind, id, .. } => {
                let _ = tx.send(Delta::ImageLoadFailed { kind, id });
            }
        }
    }
}

fn query_for(cmd: &ProviderCommand) -> Option<Query> {
    match cmd {
        ProviderCommand::FetchTracks { game_type } => Some(Query::Tracks {
            game_type: *game_type,
        }),
        ProviderCommand::FetchUserKarts {
            nickname,
            game_type,
        } => Some(Query::UserKarts {
            nickname: nickname.clone(),
            game_type: *game_type,
        }),
        ProviderCommand::ProbeAsset { .. } => None,
    }
}

fn status_label(status: CacheStatus) -> &'static str {
    match status {
        CacheStatus::Fresh => "served from cache",
        CacheStatus::Revalidated => "revalidated (not modified)",
        CacheStatus::Fetched => "fetched",
    }
}

pub fn seed_karts(game_type: GameType) -> Vec<Kart> {
    let scale = match game_type {
        GameType::SpeedSolo => 1,
        GameType::SpeedTeam => 2,
    };
    let tracks = seed_track_names();
    let kart = |id: &str, name: &str, count: u32, wins: u32, retires: u32, base_ms: u64| Kart {
        id: id.to_string(),
        name: name.to_string(),
        count: count * scale,
        win_count: wins * scale,
        retire_count: retires * scale,
        map: tracks
            .iter()
            .take(4)
            .enumerate()
            .map(|(idx, (track_id, track_name))| RecordItem {
                id: Some(track_id.to_string()),
                name: track_name.to_string(),
                record: Some(base_ms + idx as u64 * 7_341),
            })
            .collect(),
    };
    vec![
        kart("kart-proto-x", "Proto X", 42, 18, 4, 92_310),
        kart("kart-saber-9", "Saber 9", 27, 9, 6, 95_880),
        kart("kart-neo-v1", "Neo V1", 12, 2, 5, 99_020),
        kart("kart-retired", "Retired Frame", 0, 0, 0, 0),
    ]
}

fn seed_tracks<R: Rng>(game_type: GameType, rng: &mut R) -> TrackPage {
    let riders = ["라이더1", "Dao", "Bazzi", "Marid", "없음"];
    let tracks: Vec<TrackDetail> = seed_track_names()
        .iter()
        .enumerate()
        .map(|(idx, (id, name))| {
            let best = 85_000 + rng.gen_range(0..30_000u64);
            TrackDetail {
                id: id.to_string(),
                name: name.to_string(),
                count: rng.gen_range(20..2_000u64),
                best_rider: riders[idx % riders.len()].to_string(),
                best_record: Some(best),
                average_record: Some(best + rng.gen_range(2_000..9_000u64)),
            }
        })
        .collect();
    let total_count = tracks.iter().map(|t| t.count).sum::<u64>()
        * match game_type {
            GameType::SpeedSolo => 1,
            GameType::SpeedTeam => 2,
        };
    TrackPage {
        tracks,
        total_count,
    }
}

fn seed_track_names() -> [(&'static str, &'static str); 8] {
    [
        ("village-roundabout", "Village Roundabout"),
        ("forest-mushroom", "Forest Mushroom Hill"),
        ("desert-pyramid", "Desert Pyramid Run"),
        ("ice-canyon", "Ice Canyon"),
        ("cemetery-hill", "Cemetery Hill"),
        ("pirate-cave", "Pirate Cave"),
        ("moonhill-downtown", "Moonhill Downtown"),
        ("world-tour", "World Tour Rio"),
    ]
}
