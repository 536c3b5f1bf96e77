//! Benchmarks for scoring a single guild.
//!
//! Run:
//! - cargo bench --bench single_guild

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};

use guild_network_scorer::metrics::PhyloPDCalculator;
use guild_network_scorer::utils::{NameLookup, PhyloTree};
use guild_network_scorer::{
    build_network_profiles, score_guild, Calibration, GrowthForm, Guild, Interaction, LookupTables, MetricId,
    PercentileParams, PlantRecord, ScoringConfig,
};
use rustc_hash::FxHashMap;

const TIER: &str = "tier_3_humid_temperate";
const POOL: usize = 200;
const GUILD_SIZES: [usize; 3] = [2, 7, 20];
const FORMS: [GrowthForm; 5] = [
    GrowthForm::Tree,
    GrowthForm::Shrub,
    GrowthForm::Herb,
    GrowthForm::VineLiana,
    GrowthForm::Graminoid,
];

fn names(rng: &mut StdRng, prefix: &str, universe: usize, count: usize) -> Vec<String> {
    (0..count)
        .map(|_| format!("{prefix} sp{}", rng.gen_range(0..universe)))
        .collect()
}

fn build_pool(rng: &mut StdRng) -> Vec<PlantRecord> {
    (0..POOL)
        .map(|i| {
            let c = rng.gen_range(0.0..100.0);
            let s = rng.gen_range(0.0..(100.0 - c));
            PlantRecord::new(format!("p{i}"), format!("Plantus species{i}"))
                .with_csr(c, s, (100.0 - c - s).max(0.0))
                .with_height(rng.gen_range(0.1..30.0))
                .with_growth_form(FORMS[i % FORMS.len()])
                .with_light(rng.gen_range(1.0..9.0))
                .with_organisms(Interaction::Herbivores, names(rng, "Aphis", 40, 8))
                .with_organisms(Interaction::Pollinators, names(rng, "Bombus", 30, 6))
                .with_organisms(Interaction::PredatorsHasHost, names(rng, "Coccinella", 20, 3))
                .with_organisms(Interaction::AmfFungi, names(rng, "Glomus", 25, 4))
                .with_organisms(Interaction::PathogenicFungi, names(rng, "Botrytis", 30, 5))
                .with_organisms(Interaction::MycoparasiteFungi, names(rng, "Trichoderma", 10, 2))
        })
        .collect()
}

/// Balanced binary tree over the pool ids.
fn build_tree() -> PhyloTree {
    let mut level: Vec<String> = (0..POOL).map(|i| format!("p{i}:10")).collect();
    while level.len() > 1 {
        level = level
            .chunks(2)
            .map(|pair| match pair {
                [a, b] => format!("({a},{b}):10"),
                [a] => a.clone(),
                _ => unreachable!(),
            })
            .collect();
    }
    PhyloTree::parse(&format!("{};", level[0])).unwrap()
}

fn build_lookups() -> LookupTables {
    let calibration = MetricId::ALL.iter().fold(Calibration::default(), |cal, &id| {
        cal.with_metric(TIER, id, PercentileParams::linear(0.0, 2.0))
    });
    let predators: Vec<(String, Vec<String>)> = (0..40)
        .map(|i| (format!("Aphis sp{i}"), vec![format!("Coccinella sp{}", i % 20)]))
        .collect();
    let antagonists: Vec<(String, Vec<String>)> = (0..30)
        .map(|i| (format!("Botrytis sp{i}"), vec![format!("Trichoderma sp{}", i % 10)]))
        .collect();
    LookupTables::new(calibration, PhyloPDCalculator::new(build_tree(), FxHashMap::default()))
        .with_herbivore_predators(NameLookup::from_entries(predators))
        .with_pathogen_antagonists(NameLookup::from_entries(antagonists))
}

fn bench_score_guild(c: &mut Criterion) {
    let mut rng = StdRng::seed_from_u64(42);
    let pool = build_pool(&mut rng);
    let lookups = build_lookups();

    let mut group = c.benchmark_group("score_guild");
    for &size in &GUILD_SIZES {
        let plants: Vec<PlantRecord> = pool.choose_multiple(&mut rng, size).cloned().collect();
        let guild = Guild::new(plants, TIER).unwrap();

        for parallel in [false, true] {
            let config = ScoringConfig {
                parallel,
                ..Default::default()
            };
            let id = BenchmarkId::new(if parallel { "parallel" } else { "sequential" }, size);
            group.bench_with_input(id, &guild, |b, guild| {
                b.iter(|| black_box(score_guild(black_box(guild), &lookups, &config)));
            });
        }
    }
    group.finish();
}

fn bench_network_profiles(c: &mut Criterion) {
    let mut rng = StdRng::seed_from_u64(7);
    let pool = build_pool(&mut rng);
    let lookups = build_lookups();
    let config = ScoringConfig::default();

    let mut group = c.benchmark_group("network_profiles");
    for &size in &GUILD_SIZES {
        let plants: Vec<PlantRecord> = pool.choose_multiple(&mut rng, size).cloned().collect();
        let guild = Guild::new(plants, TIER).unwrap();
        let result = score_guild(&guild, &lookups, &config);

        group.bench_with_input(BenchmarkId::new("all", size), &guild, |b, guild| {
            b.iter(|| black_box(build_network_profiles(guild, &result, &lookups, &config)));
        });
    }
    group.finish();
}

criterion_group!(benches, bench_score_guild, bench_network_profiles);
criterion_main!(benches);
