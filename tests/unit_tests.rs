// Unit tests for Colleague Match

use colleague_match::core::{draw_distinct, exclusion_set, filter_predicates, CandidatePool};
use colleague_match::models::{
    DepartmentFilter, MatchGroupConfig, MatchGroupStatus, OfficeFilter, Owner, SearchTarget,
    StatusFilter, UserIcon, UserPredicate,
};
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::collections::HashSet;

fn create_owner() -> Owner {
    Owner {
        user_id: "owner".to_string(),
        user_name: "Owner".to_string(),
        user_icon: UserIcon {
            file_id: "icon-owner".to_string(),
            file_name: "owner.png".to_string(),
        },
        office_name: "Tokyo".to_string(),
        office_id: "o1".to_string(),
        department_id: "d1".to_string(),
    }
}

fn create_config() -> MatchGroupConfig {
    MatchGroupConfig {
        owner_id: "owner".to_string(),
        match_group_name: "coffee".to_string(),
        description: String::new(),
        num_of_members: 4,
        department_filter: DepartmentFilter::None,
        office_filter: OfficeFilter::None,
        skill_filter: vec![],
        never_matched_filter: false,
    }
}

#[test]
fn test_draw_distinct_exact_pool() {
    let mut rng = StdRng::seed_from_u64(11);
    let pool = vec!["a", "b", "c"];

    let drawn = draw_distinct(pool, 3, &mut rng).unwrap();
    let unique: HashSet<_> = drawn.iter().collect();
    assert_eq!(unique.len(), 3);
}

#[test]
fn test_draw_distinct_zero_count() {
    let mut rng = StdRng::seed_from_u64(11);
    assert_eq!(draw_distinct(Vec::<u32>::new(), 0, &mut rng), Some(vec![]));
}

#[test]
fn test_draw_distinct_shortage() {
    let mut rng = StdRng::seed_from_u64(11);
    assert!(draw_distinct(vec![1, 2], 3, &mut rng).is_none());
}

#[test]
fn test_draw_distinct_same_seed_same_draw() {
    let items: Vec<u32> = (0..100).collect();

    let first = draw_distinct(items.clone(), 10, &mut StdRng::seed_from_u64(42)).unwrap();
    let second = draw_distinct(items, 10, &mut StdRng::seed_from_u64(42)).unwrap();
    assert_eq!(first, second);
}

#[test]
fn test_draw_distinct_reaches_every_item() {
    let mut seen = HashSet::new();
    for seed in 0..200 {
        let mut rng = StdRng::seed_from_u64(seed);
        seen.extend(draw_distinct((0..10).collect::<Vec<u32>>(), 2, &mut rng).unwrap());
    }
    assert_eq!(seen.len(), 10);
}

#[test]
fn test_candidate_pool_dedup_keeps_first_seen_order() {
    let mut pool = CandidatePool::new();
    assert_eq!(pool.extend(vec!["b".to_string(), "a".to_string()]), 2);
    assert_eq!(pool.extend(vec!["a".to_string(), "c".to_string(), "b".to_string()]), 1);

    assert_eq!(pool.as_slice(), &["b", "a", "c"]);
}

#[test]
fn test_candidate_pool_remove() {
    let mut pool: CandidatePool = ["x", "owner", "y"].iter().map(|s| s.to_string()).collect();

    assert!(pool.remove("owner"));
    assert!(!pool.remove("owner"));
    assert!(!pool.contains("owner"));
    assert_eq!(pool.len(), 2);
    assert_eq!(pool.into_ids(), vec!["x", "y"]);
}

#[test]
fn test_no_filters_means_no_predicates() {
    let mut config = create_config();
    config.never_matched_filter = true;

    assert!(!config.has_active_filters());
    assert!(filter_predicates(&create_owner(), &config).is_empty());
}

#[test]
fn test_every_filter_contributes_one_predicate() {
    let mut config = create_config();
    config.department_filter = DepartmentFilter::ExcludeMyDepartment;
    config.office_filter = OfficeFilter::OnlyMyOffice;
    config.skill_filter = vec!["Go".to_string(), "Rust".to_string()];

    let predicates = filter_predicates(&create_owner(), &config);
    let labels: Vec<&str> = predicates.iter().map(|(label, _)| *label).collect();
    assert_eq!(labels, vec!["department", "office", "skill"]);

    assert_eq!(
        predicates[0].1,
        UserPredicate::NotInDepartment { department_id: "d1".to_string() }
    );
    assert_eq!(
        predicates[1].1,
        UserPredicate::InOffice {
            office_id: "o1".to_string(),
            excluding: Some("owner".to_string()),
        }
    );
    assert_eq!(
        predicates[2].1,
        UserPredicate::HasAnySkill(vec!["Go".to_string(), "Rust".to_string()])
    );
}

#[test]
fn test_exclusion_set_starts_with_owner() {
    let excluded = exclusion_set(&create_owner(), vec!["p1".to_string(), "owner".to_string()]);
    assert_eq!(excluded, vec!["owner", "p1"]);
}

#[test]
fn test_others_needed() {
    let mut config = create_config();
    assert_eq!(config.others_needed(), 3);

    config.num_of_members = 1;
    assert_eq!(config.others_needed(), 0);
}

#[test]
fn test_config_from_json_defaults_filters() {
    let config: MatchGroupConfig = serde_json::from_str(
        r#"{"ownerId":"u1","matchGroupName":"lunch","description":"","numOfMembers":3}"#,
    )
    .unwrap();

    assert_eq!(config.department_filter, DepartmentFilter::None);
    assert_eq!(config.office_filter, OfficeFilter::None);
    assert!(config.skill_filter.is_empty());
    assert!(!config.never_matched_filter);
}

#[test]
fn test_config_filter_names() {
    let config: MatchGroupConfig = serde_json::from_str(
        r#"{"ownerId":"u1","matchGroupName":"lunch","description":"","numOfMembers":3,
            "departmentFilter":"onlyMyDepartment","officeFilter":"excludeMyOffice",
            "skillFilter":["Go"],"neverMatchedFilter":true}"#,
    )
    .unwrap();

    assert_eq!(config.department_filter, DepartmentFilter::OnlyMyDepartment);
    assert_eq!(config.office_filter, OfficeFilter::ExcludeMyOffice);
    assert!(config.has_active_filters());
}

#[test]
fn test_search_target_names() {
    for target in SearchTarget::ALL {
        assert_eq!(target.as_str().parse::<SearchTarget>().unwrap(), target);
    }
    assert!("nickname".parse::<SearchTarget>().is_err());
}

#[test]
fn test_status_filter() {
    assert!(StatusFilter::Open.admits(MatchGroupStatus::Open));
    assert!(!StatusFilter::Open.admits(MatchGroupStatus::Close));
    assert!(StatusFilter::All.admits(MatchGroupStatus::Close));
    assert_eq!(StatusFilter::default(), StatusFilter::All);
}
