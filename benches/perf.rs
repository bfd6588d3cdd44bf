use criterion::{Criterion, criterion_group, criterion_main};
use std::hint::black_box;

use tmi_terminal::api::parse_tracks_json;
use tmi_terminal::state::Revision;
use tmi_terminal::track_ranking::{SortField, SortSeq, SortSpec, TrackDetail, TrackPage, derive_visible};

fn sample_tracks(n: usize) -> Vec<TrackDetail> {
    (0..n)
        .map(|idx| TrackDetail {
            id: format!("track-{idx}"),
            name: format!("Track {}", idx % 97),
            count: ((idx * 7919) % 2_000) as u64,
            best_rider: format!("라이더{}", idx % 31),
            best_record: Some(85_000 + ((idx * 104_729) % 30_000) as u64),
            average_record: Some(95_000 + ((idx * 1_299_709) % 30_000) as u64),
        })
        .collect()
}

fn bench_derive_visible(c: &mut Criterion) {
    let tracks = sample_tracks(2_000);
    let spec = SortSpec {
        standard: SortField::Count,
        seq: SortSeq::Desc,
    };
    c.bench_function("derive_visible_unfiltered", |b| {
        b.iter(|| {
            let order = derive_visible(black_box(&tracks), "", spec);
            black_box(order.len());
        })
    });
    c.bench_function("derive_visible_filtered", |b| {
        b.iter(|| {
            let order = derive_visible(black_box(&tracks), "라이더1", spec);
            black_box(order.len());
        })
    });
}

fn bench_tracks_parse(c: &mut Criterion) {
    let page = TrackPage {
        total_count: 1_000_000,
        tracks: sample_tracks(500),
    };
    let raw = serde_json::to_string(&page).expect("serializable page");
    c.bench_function("tracks_parse", |b| {
        b.iter(|| {
            let page = parse_tracks_json(black_box(&raw)).unwrap();
            black_box(page.tracks.len());
        })
    });
}

fn bench_revision(c: &mut Criterion) {
    let tracks = sample_tracks(500);
    c.bench_function("revision_of_tracks", |b| {
        b.iter(|| black_box(Revision::of(black_box(&tracks))))
    });
}

criterion_group!(benches, bench_derive_visible, bench_tracks_parse, bench_revision);
criterion_main!(benches);
