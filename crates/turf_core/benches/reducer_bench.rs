//! Benchmarks for the hot paths: dispatch, formation migration, chemistry
//! links and snapshot encoding

use criterion::{black_box, criterion_group, criterion_main, Criterion};

use turf_core::config::APP_VERSION;
use turf_core::geometry::Team;
use turf_core::save::normalize;
use turf_core::tactics::chemistry::ChemistryInputs;
use turf_core::tactics::chemistry_links;
use turf_core::{reduce, Action, RootState};

fn bench_toggle_theme(c: &mut Criterion) {
    let state = RootState::initial();
    c.bench_function("reduce_toggle_theme", |b| {
        b.iter(|| black_box(reduce(black_box(&state), &Action::ToggleTheme)))
    });
}

fn bench_formation_switch(c: &mut Criterion) {
    let state = RootState::initial();
    let action = Action::SetActiveFormation { team: Team::Home, formation_id: "3-5-2".into() };
    c.bench_function("reduce_set_active_formation", |b| {
        b.iter(|| black_box(reduce(black_box(&state), &action)))
    });
}

fn bench_chemistry_links(c: &mut Criterion) {
    let state = RootState::initial();
    let t = &state.tactics;
    let formation = t.active_formation(Team::Home).expect("seed binds the home formation");
    let inputs = ChemistryInputs::for_team(&t.chemistry, &state.franchise, Team::Home);
    c.bench_function("chemistry_links_home", |b| {
        b.iter(|| black_box(chemistry_links(formation, Team::Home, &t.players, &inputs, 30.0)))
    });
}

fn bench_snapshot_encode(c: &mut Criterion) {
    let state = RootState::initial();
    c.bench_function("snapshot_normalize_encode", |b| {
        b.iter(|| {
            let snapshot = normalize(black_box(&state), APP_VERSION);
            black_box(snapshot.to_json())
        })
    });
}

criterion_group!(
    benches,
    bench_toggle_theme,
    bench_formation_switch,
    bench_chemistry_links,
    bench_snapshot_encode
);
criterion_main!(benches);
