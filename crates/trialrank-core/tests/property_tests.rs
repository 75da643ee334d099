use proptest::prelude::*;
use trialrank_core::config::{CriterionWeights, FusionConfig, ZeroNormPolicy};
use trialrank_core::evaluation::{MeanMetrics, TopicMetrics};
use trialrank_core::search::{RankedList, TopsisFusion};

fn ranked_list() -> impl Strategy<Value = Vec<(u8, f64)>> {
    prop::collection::vec((0u8..30, 0.0f64..50.0), 0..25)
}

fn to_list(entries: &[(u8, f64)]) -> RankedList {
    RankedList::from_pairs(entries.iter().map(|(id, score)| (format!("nct{id:03}"), *score)))
}

fn weights() -> impl Strategy<Value = CriterionWeights> {
    (0.0f64..2.0, 0.0f64..2.0, 0.0f64..2.0).prop_map(|(m, i, e)| CriterionWeights::new(m, i, e))
}

fn zero_norm() -> impl Strategy<Value = ZeroNormPolicy> {
    prop_oneof![Just(ZeroNormPolicy::Zero), Just(ZeroNormPolicy::Exclude)]
}

proptest! {
    #[test]
    fn prop_closeness_in_unit_interval(
        main in ranked_list(),
        inclusion in ranked_list(),
        exclusion in ranked_list(),
        weights in weights(),
        zero_norm in zero_norm(),
    ) {
        let fusion = TopsisFusion::new(FusionConfig { weights, zero_norm, ..FusionConfig::default() }).unwrap();
        let fused = fusion.fuse(&to_list(&main), &to_list(&inclusion), &to_list(&exclusion));

        for doc in fused.iter() {
            prop_assert!((0.0..=1.0).contains(&doc.closeness), "closeness {}", doc.closeness);
        }
    }

    #[test]
    fn prop_fusion_independent_of_input_order(
        main in ranked_list(),
        inclusion in ranked_list(),
        exclusion in ranked_list(),
    ) {
        // Deduplicate so reversing a list cannot change which entry wins
        let dedup = |entries: &[(u8, f64)]| {
            let mut seen = std::collections::HashSet::new();
            entries.iter().copied().filter(|(id, _)| seen.insert(*id)).collect::<Vec<_>>()
        };
        let (main, inclusion, exclusion) = (dedup(&main), dedup(&inclusion), dedup(&exclusion));
        let reversed = |entries: &[(u8, f64)]| entries.iter().rev().copied().collect::<Vec<_>>();

        let fusion = TopsisFusion::new(FusionConfig::default()).unwrap();
        let forward = fusion.fuse(&to_list(&main), &to_list(&inclusion), &to_list(&exclusion));
        let backward = fusion.fuse(
            &to_list(&reversed(&main)),
            &to_list(&reversed(&inclusion)),
            &to_list(&reversed(&exclusion)),
        );

        prop_assert_eq!(forward, backward);
    }

    #[test]
    fn prop_fused_ranking_is_sorted(
        main in ranked_list(),
        inclusion in ranked_list(),
        exclusion in ranked_list(),
    ) {
        let fusion = TopsisFusion::new(FusionConfig::default()).unwrap();
        let fused = fusion.fuse(&to_list(&main), &to_list(&inclusion), &to_list(&exclusion));

        for pair in fused.as_slice().windows(2) {
            prop_assert!(
                pair[0].closeness > pair[1].closeness
                    || (pair[0].closeness == pair[1].closeness && pair[0].doc_id < pair[1].doc_id)
            );
        }
    }

    #[test]
    fn prop_ndcg_at_most_one(
        grades in prop::collection::vec(0u8..=2, 1..50),
        k in 1usize..60,
    ) {
        let mut metrics = TopicMetrics::new();
        for (rank, &grade) in grades.iter().enumerate() {
            metrics.update(grade, rank);
        }

        let ndcg = metrics.ndcg_at(k);
        prop_assert!((0.0..=1.0 + 1e-12).contains(&ndcg), "nDCG {}", ndcg);
    }

    #[test]
    fn prop_mean_merge_order_independent(
        rows in prop::collection::vec((0.0f64..=1.0, 0.0f64..=1.0, 0.0f64..=1.0, 0.0f64..=1.0), 0..30),
        split in 0usize..30,
    ) {
        let split = split.min(rows.len());
        let fold = |rows: &[(f64, f64, f64, f64)]| {
            rows.iter().fold(MeanMetrics::new(), |mut mean, &(p, rr, n, r)| {
                mean.update(p, rr, n, r);
                mean
            })
        };

        let whole = fold(&rows);
        let merged = fold(&rows[split..]).merge(fold(&rows[..split]));

        prop_assert_eq!(whole.topics(), merged.topics());
        prop_assert!((whole.mean_ndcg() - merged.mean_ndcg()).abs() < 1e-9);
        prop_assert!((whole.mean_precision() - merged.mean_precision()).abs() < 1e-9);
    }
}
