// Integration tests for pathmatch
use pathmatch_core::{names, ApplicantRecord, CategoryProfile, Dataset, Error, FeatureSchema, QueryVector};
use pathmatch_discovery::{CancellationFlag, DiscoveryConfig, DiscoveryPipeline, PathDiscoveryEngine};
use pathmatch_service::{MatchingService, ServiceConfig};
use pathmatch_similarity::{
    BaseMatcher, MatchLevel, MatcherVariant, MatchingConfig, MatchingEngine, PreparedCategory,
    RobustMatcher,
};
use pathmatch_storage::ProfileStore;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::sync::Arc;
use tempfile::{tempdir, TempDir};

const STRONG: [f64; 11] = [88.0, 86.0, 0.85, 82.0, 1.0, 0.7, 80.0, 0.8, 0.5, 85.0, 84.0];
const MODERATE: [f64; 11] = [62.0, 64.0, 0.40, 64.0, 4.0, 0.35, 68.0, 0.55, 0.65, 62.0, 63.0];

fn standard_schema() -> Arc<FeatureSchema> {
    Arc::new(FeatureSchema::standard())
}

fn noisy(base: &[f64], rng: &mut StdRng) -> Vec<f64> {
    base.iter()
        .map(|b| b + (b.abs() * 0.03 + 0.01) * rng.random_range(-1.0..1.0))
        .collect()
}

/// Two well-separated clusters per category
fn records(
    categories: &[String],
    per_cluster: usize,
    extra_features: usize,
    seed: u64,
) -> Vec<ApplicantRecord> {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut out = Vec::new();
    for category in categories {
        for (c, base) in [STRONG, MODERATE].iter().enumerate() {
            for i in 0..per_cluster {
                let mut features = noisy(base, &mut rng);
                features.extend((0..extra_features).map(|_| rng.random_range(0.0..1.0)));
                out.push(ApplicantRecord::new(
                    format!("{}-{}-{}", category, c, i),
                    category.clone(),
                    features,
                ));
            }
        }
    }
    out
}

fn category_names(prefix: &str, n: usize) -> Vec<String> {
    (0..n).map(|i| format!("{} {:02}", prefix, i)).collect()
}

fn build_profiles(dataset: &Dataset) -> Vec<CategoryProfile> {
    let pipeline = DiscoveryPipeline::new(DiscoveryConfig::default()).unwrap();
    let report = pipeline.run(dataset, &CancellationFlag::new());
    assert!(report.failures.is_empty(), "{:?}", report.failures);
    report.profiles.into_values().collect()
}

fn standard_profiles(categories: &[&str]) -> (Arc<FeatureSchema>, Vec<CategoryProfile>) {
    let names: Vec<String> = categories.iter().map(|c| c.to_string()).collect();
    let schema = standard_schema();
    let dataset = Dataset::new(schema.clone(), records(&names, 80, 0, 7)).unwrap();
    (schema, build_profiles(&dataset))
}

fn engine(variant: MatcherVariant, profiles: Vec<CategoryProfile>) -> MatchingEngine {
    let config = MatchingConfig {
        variant,
        ..MatchingConfig::default()
    };
    let engine = MatchingEngine::new(config, 10).unwrap();
    engine.load(profiles).unwrap();
    engine
}

fn service_config(dir: &TempDir) -> ServiceConfig {
    ServiceConfig {
        profiles_path: dir.path().join("profiles.json"),
        archive_dir: Some(dir.path().join("archive")),
        ..ServiceConfig::default()
    }
}

#[test]
fn test_two_separated_clusters_give_two_paths() {
    let schema = standard_schema();
    let names = vec!["engineering".to_string()];
    let rows: Vec<Vec<f64>> = records(&names, 250, 0, 3)
        .into_iter()
        .map(|r| r.features)
        .collect();
    assert_eq!(rows.len(), 500);

    let engine = PathDiscoveryEngine::new(DiscoveryConfig::default()).unwrap();
    let discovery = engine.discover("engineering", &schema, &rows).unwrap();
    assert_eq!(discovery.k(), 2);
    assert!(discovery.quality > 0.5, "quality {}", discovery.quality);
    assert!(!discovery.degenerate);
}

#[test]
fn test_built_profiles_respect_invariants() {
    let (_, profiles) = standard_profiles(&["law", "medicine", "physics"]);
    assert_eq!(profiles.len(), 3);
    for profile in &profiles {
        let k = profile.paths().len();
        assert!((2..6).contains(&k), "{} has {} paths", profile.name(), k);
        assert!((profile.total_coverage() - 1.0).abs() <= 0.01);
        assert_eq!(profile.summary().total_applicants, 160);
        for path in profile.paths() {
            assert!((0.0..=1.0).contains(&path.representativeness()));
            assert!(!path.label().is_empty());
        }
    }
}

#[test]
fn test_scores_stay_in_bounds() {
    let (schema, profiles) = standard_profiles(&["law"]);
    let mut rng = StdRng::seed_from_u64(99);
    for variant in [MatcherVariant::Base, MatcherVariant::Robust] {
        let engine = engine(variant, profiles.clone());
        for _ in 0..200 {
            let values = (0..schema.len())
                .map(|_| {
                    if rng.random_range(0.0..1.0) < 0.2 {
                        None
                    } else {
                        Some(rng.random_range(-50.0..200.0))
                    }
                })
                .collect();
            let query = QueryVector::new(schema.clone(), values).unwrap();
            let result = engine.match_query("law", &query).unwrap();
            assert!((10..=100).contains(&result.score), "score {}", result.score);
            assert!((0.0..=1.0).contains(&result.confidence));
            assert!(result.similarity.is_finite());
        }
    }
}

#[test]
fn test_matching_is_deterministic() {
    let (schema, profiles) = standard_profiles(&["law"]);
    let engine = engine(MatcherVariant::Robust, profiles);
    let mut rng = StdRng::seed_from_u64(5);
    let query = QueryVector::complete(schema, noisy(&MODERATE, &mut rng)).unwrap();
    let first = engine.match_query("law", &query).unwrap();
    let second = engine.match_query("law", &query).unwrap();
    assert_eq!(first, second);
}

#[test]
fn test_exact_center_is_high_match() {
    let (schema, profiles) = standard_profiles(&["law"]);
    for variant in [MatcherVariant::Base, MatcherVariant::Robust] {
        let engine = engine(variant, profiles.clone());
        for path in profiles[0].paths() {
            let query = QueryVector::complete(schema.clone(), path.center().to_vec()).unwrap();
            let result = engine.match_query("law", &query).unwrap();
            assert!(result.score >= 85, "{:?}: score {}", variant, result.score);
            assert_eq!(result.level, MatchLevel::High);
            assert_eq!(result.path_id, path.id());
        }
    }
}

#[test]
fn test_minority_path_center_is_high_match() {
    let schema = standard_schema();
    let mut rng = StdRng::seed_from_u64(21);
    let records: Vec<ApplicantRecord> = (0..500)
        .map(|i| {
            let base = if i < 450 { &MODERATE } else { &STRONG };
            ApplicantRecord::new(format!("uneven-{}", i), "law", noisy(base, &mut rng))
        })
        .collect();
    let dataset = Dataset::new(schema.clone(), records).unwrap();
    let profiles = build_profiles(&dataset);
    let minority = profiles[0]
        .paths()
        .iter()
        .map(|p| p.coverage())
        .fold(f64::INFINITY, f64::min);
    assert!(minority <= 0.15, "smallest coverage {}", minority);

    for variant in [MatcherVariant::Base, MatcherVariant::Robust] {
        let engine = engine(variant, profiles.clone());
        for path in profiles[0].paths() {
            let query = QueryVector::complete(schema.clone(), path.center().to_vec()).unwrap();
            let result = engine.match_query("law", &query).unwrap();
            assert!(
                result.score >= 85,
                "{:?} path {}: score {}",
                variant,
                path.id(),
                result.score
            );
            assert_eq!(result.path_id, path.id());
        }
    }
}

#[test]
fn test_closer_queries_never_score_lower() {
    let (_, profiles) = standard_profiles(&["law"]);
    let config = MatchingConfig::default();
    let prepared = PreparedCategory::new(Arc::new(profiles[0].clone()), &config.weights().unwrap());
    let base = BaseMatcher::new(config.clone());
    let robust = RobustMatcher::new(config);

    let path = &profiles[0].paths()[0];
    let steps = [0.0, 0.25, 0.5, 1.0, 1.5, 2.0, 3.0, 4.0];

    let base_scores: Vec<f64> = steps
        .iter()
        .map(|t| {
            let values: Vec<Option<f64>> = path
                .per_feature_stats()
                .iter()
                .map(|s| Some(s.mean + t * s.std))
                .collect();
            base.weighted_similarity(&prepared, 0, &values).unwrap()
        })
        .collect();
    assert!(base_scores.windows(2).all(|w| w[0] >= w[1] - 1e-12), "{:?}", base_scores);

    let robust_scores: Vec<f64> = steps
        .iter()
        .map(|t| {
            let dense: Vec<f64> = path
                .per_feature_stats()
                .iter()
                .enumerate()
                .map(|(j, s)| s.clipped_mean + t * prepared.robust_spread(0, j))
                .collect();
            robust.distribution_similarity(&prepared, 0, &dense)
        })
        .collect();
    assert!(robust_scores.windows(2).all(|w| w[0] >= w[1] - 1e-12), "{:?}", robust_scores);
}

#[test]
fn test_missing_minor_feature_is_bounded() {
    let (schema, profiles) = standard_profiles(&["law"]);
    let competition = schema.index_of(names::COMPETITION_INDEX).unwrap();
    let robust_mean = profiles[0].feature_stats()[competition].robust_mean;

    let mut values = profiles[0].paths()[0].center().to_vec();
    values[competition] = robust_mean;
    let present = QueryVector::complete(schema.clone(), values).unwrap();
    let missing = present.without(names::COMPETITION_INDEX).unwrap();

    for variant in [MatcherVariant::Base, MatcherVariant::Robust] {
        let engine = engine(variant, profiles.clone());
        let a = engine.match_query("law", &present).unwrap().score as i64;
        let b = engine.match_query("law", &missing).unwrap().score as i64;
        assert!((a - b).abs() <= 10, "{:?}: {} vs {}", variant, a, b);
    }
}

#[test]
fn test_unknown_category_lists_suggestions() {
    let dir = tempdir().unwrap();
    let names = category_names("program", 3);
    let service = MatchingService::new(service_config(&dir)).unwrap();
    let dataset = Dataset::new(standard_schema(), records(&names, 60, 0, 1)).unwrap();
    service.rebuild(&dataset, &CancellationFlag::new()).unwrap();

    let query = QueryVector::complete(standard_schema(), STRONG.to_vec()).unwrap();
    match service.match_query("progam 01", &query) {
        Err(Error::CategoryNotFound { category, suggestions }) => {
            assert_eq!(category, "progam 01");
            assert!(!suggestions.is_empty());
            assert!(suggestions.iter().all(|s| names.contains(s)));
        }
        other => panic!("expected CategoryNotFound, got {:?}", other.map(|r| r.score)),
    }
}

#[test]
fn test_ranking_survives_schema_mismatches() {
    let dir = tempdir().unwrap();
    let config = service_config(&dir);

    let matching = category_names("matching", 17);
    let standard = Dataset::new(standard_schema(), records(&matching, 60, 0, 21)).unwrap();

    let mut extended_names: Vec<String> = names::STANDARD.iter().map(|s| s.to_string()).collect();
    extended_names.push("portfolio_score".to_string());
    let extended_schema = Arc::new(FeatureSchema::new(extended_names).unwrap());
    let mismatched = category_names("portfolio", 3);
    let extended = Dataset::new(extended_schema, records(&mismatched, 60, 1, 22)).unwrap();

    let mut profiles = build_profiles(&standard);
    profiles.extend(build_profiles(&extended));
    assert_eq!(profiles.len(), 20);
    ProfileStore::new(&config.profiles_path, None)
        .unwrap()
        .save(&profiles)
        .unwrap();

    let service = MatchingService::open(config).unwrap();
    assert_eq!(service.categories().len(), 20);

    let query = QueryVector::complete(standard_schema(), STRONG.to_vec()).unwrap();
    let report = service.rank(&query, None).unwrap();
    assert_eq!(report.results.len(), 17);
    assert_eq!(report.failures.len(), 3);
    assert!(report.failures.iter().all(|f| f.kind == "schema_mismatch"));
    assert!(report
        .results
        .windows(2)
        .all(|w| w[0].score >= w[1].score));
    assert_eq!(report.statistics.evaluated, 17);
    assert_eq!(report.recommendations.len(), 10);
}

#[test]
fn test_rebuild_archives_and_reloads() {
    let dir = tempdir().unwrap();
    let config = service_config(&dir);
    let service = MatchingService::new(config.clone()).unwrap();

    let first = Dataset::new(standard_schema(), records(&category_names("a", 2), 60, 0, 31)).unwrap();
    let report = service.rebuild(&first, &CancellationFlag::new()).unwrap();
    assert!(report.archived.is_none());

    let second = Dataset::new(standard_schema(), records(&category_names("b", 2), 60, 0, 32)).unwrap();
    let report = service.rebuild(&second, &CancellationFlag::new()).unwrap();
    assert!(report.archived.is_some());
    assert_eq!(service.categories(), vec!["b 00", "b 01"]);

    let status = service.status();
    assert_eq!(status.generation, 2);
    assert_eq!(status.total_applicants, 240);

    let reopened = MatchingService::open(config).unwrap();
    assert_eq!(reopened.categories(), vec!["b 00", "b 01"]);
    let description = reopened.describe("b 00").unwrap();
    assert_eq!(description.summary.num_paths, description.paths.len());
}
