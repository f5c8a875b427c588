//! Tests for planner module

use super::*;
use test_case::test_case;

// ============================================================================
// Default Policy Tests
// ============================================================================

#[test_case(0, 10_000; "empty")]
#[test_case(1, 10_000; "single row")]
#[test_case(8_000, 10_000; "small file")]
#[test_case(10_000, 10_000; "small boundary")]
#[test_case(10_001, 5_000; "just above small boundary")]
#[test_case(100_000, 5_000; "large boundary")]
#[test_case(100_001, 3_000; "just above large boundary")]
#[test_case(150_000, 3_000; "very large file")]
fn test_default_policy(rows: usize, expected: usize) {
    assert_eq!(ChunkPolicy::default().plan(rows), expected);
}

#[test]
fn test_plan_is_pure() {
    let policy = ChunkPolicy::default();
    for rows in [0, 9_999, 50_000, 2_000_000] {
        assert_eq!(policy.plan(rows), policy.plan(rows));
    }
}

#[test]
fn test_plan_chunks_counts() {
    let policy = ChunkPolicy::default();

    let plan = policy.plan_chunks(150_000);
    assert_eq!(plan.chunk_size, 3_000);
    assert_eq!(plan.chunk_count, 50);

    let plan = policy.plan_chunks(12_001);
    assert_eq!(plan.chunk_size, 5_000);
    assert_eq!(plan.chunk_count, 3);

    assert_eq!(policy.plan_chunks(0).chunk_count, 0);
    assert_eq!(policy.plan_chunks(1).chunk_count, 1);
}

// ============================================================================
// Custom Policy Tests
// ============================================================================

#[test]
fn test_custom_tiers_order_independent() {
    let policy = ChunkPolicy::new(
        vec![
            ChunkTier {
                above: 10,
                chunk_size: 5,
            },
            ChunkTier {
                above: 100,
                chunk_size: 2,
            },
        ],
        50,
    );

    assert_eq!(policy.plan(5), 50);
    assert_eq!(policy.plan(11), 5);
    assert_eq!(policy.plan(101), 2);
}

#[test]
fn test_validate_rejects_zero_sizes() {
    assert!(ChunkPolicy::default().validate().is_ok());
    assert!(ChunkPolicy::new(vec![], 0).validate().is_err());

    let policy = ChunkPolicy::new(
        vec![ChunkTier {
            above: 10,
            chunk_size: 0,
        }],
        100,
    );
    let err = policy.validate().unwrap_err();
    assert!(err.to_string().contains("chunking.tiers"));
}

#[test]
fn test_policy_from_yaml() {
    let yaml = r"
tiers:
  - above: 1000
    chunk_size: 250
default_size: 500
";
    let policy: ChunkPolicy = serde_yaml::from_str(yaml).unwrap();
    assert_eq!(policy.plan(999), 500);
    assert_eq!(policy.plan(1001), 250);

    let policy: ChunkPolicy = serde_yaml::from_str("{}").unwrap();
    assert_eq!(policy, ChunkPolicy::default());
}
