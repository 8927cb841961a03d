use log::debug;

use crate::config::*;

/// What an assertion says about an elimination order suffix and all the orders ending with it.
#[derive(Eq, PartialEq, Debug, Clone, Copy, Hash)]
pub enum EffectOfAssertion {
    /// The suffix, and every order extending it, is ruled out.
    Contradiction,
    /// The suffix, and every order extending it, is compatible with the assertion.
    Ok,
    /// The outcome depends on candidates that are not in the suffix yet.
    NeedsMoreDetail,
}

/// Classifies a non-empty suffix according to one assertion.
pub fn evaluate(assertion: &Assertion, suffix: &[CandidateId]) -> EffectOfAssertion {
    match &assertion.kind {
        AssertionKind::NotEliminatedBefore => {
            // The candidate found last in the order was eliminated later.
            for cid in suffix.iter().rev() {
                if *cid == assertion.winner {
                    return EffectOfAssertion::Ok;
                }
                if *cid == assertion.loser {
                    return EffectOfAssertion::Contradiction;
                }
            }
            EffectOfAssertion::NeedsMoreDetail
        }
        AssertionKind::NotEliminatedNext(continuing) => {
            let window_start = suffix.len().saturating_sub(continuing.len());
            let window = &suffix[window_start..];
            if window.iter().any(|cid| !continuing.contains(cid)) {
                // The state where exactly these candidates remain never happens.
                return EffectOfAssertion::Ok;
            }
            if suffix.len() >= continuing.len() {
                // The first eliminated among the continuing candidates must not be the winner.
                if window.first() == Some(&assertion.winner) {
                    EffectOfAssertion::Contradiction
                } else {
                    EffectOfAssertion::Ok
                }
            } else if suffix.contains(&assertion.winner) {
                EffectOfAssertion::Ok
            } else {
                EffectOfAssertion::NeedsMoreDetail
            }
        }
    }
}

/// Expands a suffix until the assertion can decide on every branch.
///
/// The contradicted suffixes are dropped, unless `keep_contradicted` is set.
pub fn allowed_suffixes(
    assertion: &Assertion,
    suffix: &[CandidateId],
    num_candidates: u32,
    keep_contradicted: bool,
) -> Vec<Suffix> {
    match evaluate(assertion, suffix) {
        EffectOfAssertion::Contradiction if keep_contradicted => vec![suffix.to_vec()],
        EffectOfAssertion::Contradiction => vec![],
        EffectOfAssertion::Ok => vec![suffix.to_vec()],
        EffectOfAssertion::NeedsMoreDetail => {
            let mut res: Vec<Suffix> = Vec::new();
            for cid in (0..num_candidates).map(CandidateId) {
                if suffix.contains(&cid) {
                    continue;
                }
                let mut longer: Suffix = Vec::with_capacity(suffix.len() + 1);
                longer.push(cid);
                longer.extend_from_slice(suffix);
                res.extend(allowed_suffixes(
                    assertion,
                    &longer,
                    num_candidates,
                    keep_contradicted,
                ));
            }
            res
        }
    }
}

/// Advances a whole frontier of suffixes by one assertion.
pub fn all_allowed_suffixes(
    assertion: &Assertion,
    suffixes: &[Suffix],
    num_candidates: u32,
    keep_contradicted: bool,
) -> Vec<Suffix> {
    let res: Vec<Suffix> = suffixes
        .iter()
        .flat_map(|s| allowed_suffixes(assertion, s, num_candidates, keep_contradicted))
        .collect();
    debug!(
        "all_allowed_suffixes: assertion {:?}: {} suffixes -> {}",
        assertion.index,
        suffixes.len(),
        res.len()
    );
    res
}

/// All the `n!` complete elimination orders of `n` candidates.
///
/// The result grows very quickly: callers are expected to bound `n`
/// (see [ExplainOptions::max_exhaustive_candidates]).
pub fn all_elimination_orders(num_candidates: u32) -> Vec<Suffix> {
    if num_candidates == 0 {
        return vec![vec![]];
    }
    let last = CandidateId(num_candidates - 1);
    let mut res: Vec<Suffix> = Vec::new();
    for order in all_elimination_orders(num_candidates - 1) {
        for pos in 0..=order.len() {
            let mut o = order.clone();
            o.insert(pos, last);
            res.push(o);
        }
    }
    res
}

/// The `n` suffixes of length one, one per possible winner.
pub fn all_singleton_suffixes(num_candidates: u32) -> Vec<Suffix> {
    (0..num_candidates).map(|c| vec![CandidateId(c)]).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn s(ids: &[u32]) -> Suffix {
        ids.iter().map(|c| CandidateId(*c)).collect()
    }

    // All the suffixes of a given length, by brute force.
    fn all_suffixes(num_candidates: u32, len: usize) -> Vec<Suffix> {
        let mut res: Vec<Suffix> = Vec::new();
        for order in all_elimination_orders(num_candidates) {
            let tail = order[order.len() - len..].to_vec();
            if !res.contains(&tail) {
                res.push(tail);
            }
        }
        res
    }

    // Direct reading of a complete order.
    fn holds_on_full_order(a: &Assertion, order: &[CandidateId]) -> bool {
        let pos = |cid: CandidateId| order.iter().position(|c| *c == cid).unwrap();
        match &a.kind {
            AssertionKind::NotEliminatedBefore => pos(a.winner) > pos(a.loser),
            AssertionKind::NotEliminatedNext(continuing) => {
                let tail = &order[order.len() - continuing.len()..];
                if tail.iter().any(|c| !continuing.contains(c)) {
                    return true;
                }
                let first_out = continuing.iter().min_by_key(|c| pos(**c)).unwrap();
                *first_out != a.winner
            }
        }
    }

    fn sample_assertions() -> Vec<Assertion> {
        vec![
            Assertion::neb(0, 1),
            Assertion::neb(3, 2),
            Assertion::nen(2, 0, &[0, 2]),
            Assertion::nen(1, 3, &[1, 2, 3]),
            Assertion::nen(0, 3, &[0, 1, 2, 3]),
        ]
    }

    #[test]
    fn neb_examples() {
        let a = Assertion::neb(0, 1);
        assert_eq!(evaluate(&a, &s(&[2, 1, 0])), EffectOfAssertion::Ok);
        assert_eq!(evaluate(&a, &s(&[2, 0, 1])), EffectOfAssertion::Contradiction);
        assert_eq!(evaluate(&a, &s(&[2])), EffectOfAssertion::NeedsMoreDetail);
        assert_eq!(evaluate(&a, &s(&[0])), EffectOfAssertion::Ok);
        assert_eq!(evaluate(&a, &s(&[1, 2])), EffectOfAssertion::Contradiction);
    }

    #[test]
    fn nen_examples() {
        let a = Assertion::nen(2, 0, &[0, 2]);
        // Only Alice and Chuan remain, Chuan goes out first.
        assert_eq!(evaluate(&a, &s(&[1, 2, 0])), EffectOfAssertion::Contradiction);
        assert_eq!(evaluate(&a, &s(&[1, 0, 2])), EffectOfAssertion::Ok);
        // The final pair is not the continuing set.
        assert_eq!(evaluate(&a, &s(&[2, 3])), EffectOfAssertion::Ok);
        assert_eq!(evaluate(&a, &s(&[0])), EffectOfAssertion::NeedsMoreDetail);
        assert_eq!(evaluate(&a, &s(&[2])), EffectOfAssertion::Ok);
        assert_eq!(evaluate(&a, &s(&[1])), EffectOfAssertion::Ok);
    }

    #[test]
    fn nen_larger_continuing_set() {
        let a = Assertion::nen(2, 3, &[0, 2, 3]);
        assert_eq!(evaluate(&a, &s(&[3, 0])), EffectOfAssertion::NeedsMoreDetail);
        assert_eq!(evaluate(&a, &s(&[2, 3, 0])), EffectOfAssertion::Contradiction);
        assert_eq!(evaluate(&a, &s(&[3, 2, 0])), EffectOfAssertion::Ok);
        assert_eq!(evaluate(&a, &s(&[2, 0])), EffectOfAssertion::Ok);
        assert_eq!(evaluate(&a, &s(&[1, 0])), EffectOfAssertion::Ok);
    }

    #[test]
    fn full_orders_agree_with_direct_reading() {
        for a in sample_assertions() {
            for order in all_elimination_orders(4) {
                let expected = if holds_on_full_order(&a, &order) {
                    EffectOfAssertion::Ok
                } else {
                    EffectOfAssertion::Contradiction
                };
                assert_eq!(evaluate(&a, &order), expected, "{:?} {:?}", a, order);
            }
        }
    }

    #[test]
    fn decided_verdicts_are_stable_under_extension() {
        let n = 4;
        for a in sample_assertions() {
            for len in 1..n {
                for suffix in all_suffixes(n as u32, len) {
                    let verdict = evaluate(&a, &suffix);
                    if verdict == EffectOfAssertion::NeedsMoreDetail {
                        continue;
                    }
                    for order in all_elimination_orders(n as u32) {
                        if order.ends_with(&suffix) {
                            assert_eq!(evaluate(&a, &order), verdict, "{:?} {:?}", a, order);
                        }
                    }
                }
            }
        }
    }

    #[test]
    fn expansion_resolves_every_branch() {
        for a in sample_assertions() {
            for seed in all_singleton_suffixes(4) {
                let res = allowed_suffixes(&a, &seed, 4, true);
                assert!(!res.is_empty());
                for suffix in res.iter() {
                    assert!(suffix.ends_with(&seed));
                    assert!(suffix.len() <= 4);
                    assert_ne!(evaluate(&a, suffix), EffectOfAssertion::NeedsMoreDetail);
                }
            }
        }
    }

    #[test]
    fn expansion_drops_or_keeps_contradictions() {
        let a = Assertion::neb(0, 1);
        assert_eq!(allowed_suffixes(&a, &s(&[1]), 3, false), Vec::<Suffix>::new());
        assert_eq!(allowed_suffixes(&a, &s(&[1]), 3, true), vec![s(&[1])]);
        // [1, 2] is contradicted, [0, 2] settles it for every extension.
        assert_eq!(allowed_suffixes(&a, &s(&[2]), 3, false), vec![s(&[0, 2])]);
        assert_eq!(
            allowed_suffixes(&a, &s(&[2]), 3, true),
            vec![s(&[0, 2]), s(&[1, 2])]
        );
    }

    #[test]
    fn frontier_matches_exhaustive_filter() {
        let assertions = sample_assertions();
        let mut frontier = all_singleton_suffixes(4);
        let mut full = all_elimination_orders(4);
        for a in assertions.iter() {
            frontier = all_allowed_suffixes(a, &frontier, 4, false);
            full = all_allowed_suffixes(a, &full, 4, false);
        }
        // Every full survivor has exactly one suffix in the frontier.
        for order in full.iter() {
            assert_eq!(frontier.iter().filter(|f| order.ends_with(f)).count(), 1);
        }
        // Every order extending a frontier suffix survives.
        for order in all_elimination_orders(4) {
            if frontier.iter().any(|f| order.ends_with(f)) {
                assert!(full.contains(&order));
            }
        }
    }

    #[test]
    fn universe_sizes() {
        assert_eq!(all_elimination_orders(1), vec![s(&[0])]);
        assert_eq!(all_elimination_orders(3).len(), 6);
        let orders = all_elimination_orders(5);
        assert_eq!(orders.len(), 120);
        let mut sorted = orders.clone();
        sorted.sort();
        sorted.dedup();
        assert_eq!(sorted.len(), 120);
        assert_eq!(all_singleton_suffixes(3), vec![s(&[0]), s(&[1]), s(&[2])]);
    }
}
