use super::ranked_profiles;
use super::select_profile;
use super::ModelProfile;
use crate::domain::models::OrchestratorError;

#[test]
fn it_selects_the_top_tier_with_plenty_of_memory() {
    let res = select_profile(&ranked_profiles(), 48_000, None).unwrap();
    assert_eq!(res.model, "qwen2.5-coder:32b");
}

#[test]
fn it_selects_exactly_at_the_boundary() {
    let res = select_profile(&ranked_profiles(), 24_000, None).unwrap();
    assert_eq!(res.model, "qwen2.5-coder:32b");
}

#[test]
fn it_selects_a_mid_tier() {
    let res = select_profile(&ranked_profiles(), 16_000, None).unwrap();
    assert_eq!(res.model, "qwen2.5-coder:14b");
}

#[test]
fn it_selects_the_smallest_tier() {
    let res = select_profile(&ranked_profiles(), 8_000, None).unwrap();
    assert_eq!(res.model, "deepseek-coder:6.7b");
}

#[test]
fn it_fails_when_nothing_fits() {
    let err = select_profile(&ranked_profiles(), 4_000, None).unwrap_err();
    let res = err.downcast_ref::<OrchestratorError>();

    assert!(matches!(
        res,
        Some(OrchestratorError::NoCompatibleModel { available_mb: 4000 })
    ));
}

#[test]
fn it_prefers_an_installed_ranked_model() {
    let available = vec!["deepseek-coder:33b".to_string()];
    let res = select_profile(&ranked_profiles(), 24_000, Some(&available)).unwrap();

    assert_eq!(res.model, "deepseek-coder:33b");
}

#[test]
fn it_falls_back_to_an_unranked_installed_model() {
    let available = vec!["mistral:7b".to_string()];
    let res = select_profile(&ranked_profiles(), 16_000, Some(&available)).unwrap();

    assert_eq!(res.model, "mistral:7b");
    // Pinned at the lowest fitting tier's requirement.
    assert_eq!(res.min_vram_mb, 6_000);
}

#[test]
fn it_selects_by_memory_alone_when_nothing_is_installed() {
    let available: Vec<String> = vec![];
    let res = select_profile(&ranked_profiles(), 16_000, Some(&available)).unwrap();

    assert_eq!(res.model, "qwen2.5-coder:14b");
}

#[test]
fn it_is_deterministic() {
    let table = vec![
        ModelProfile::new("a", 10),
        ModelProfile::new("b", 5),
        ModelProfile::new("c", 1),
    ];

    let first = select_profile(&table, 7, None).unwrap();
    let second = select_profile(&table, 7, None).unwrap();

    assert_eq!(first, second);
    assert_eq!(first.model, "b");
}
