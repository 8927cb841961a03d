/*!
Checks and explains the assertions of an instant-runoff voting (IRV) audit.

An audit certifies an IRV winner with a small set of assertions comparing two candidates.
Together, the assertions must rule out every elimination order that does not end with the
announced winner. This crate computes which elimination orders survive the assertions,
without enumerating all of them when there are many candidates:

* [infer_winner] and [check_winner] find the candidates that can still win,
* [explain] shows, assertion after assertion, which elimination orders get ruled out,
* [lazy::LazyTree] lets a caller explore the elimination orders of one winner on demand.

```
use irv_assertions::builder::AuditBuilder;
use irv_assertions::*;

let audit = AuditBuilder::new(&["Alice", "Bob", "Chuan"])?
    .neb("Chuan", "Bob")?
    .nen("Chuan", "Alice", &["Alice", "Chuan"])?
    .winner("Chuan")?
    .build()?;

assert_eq!(check_winner(&audit, &ExplainOptions::DEFAULT_OPTIONS), Ok(CandidateId(2)));
# Ok::<(), AuditErrors>(())
```
*/

pub mod builder;
mod config;
pub mod lazy;
pub mod manual;
pub mod suffix;
pub mod tree;

use log::{debug, info, warn};
use std::collections::BTreeSet;

pub use crate::config::*;
use crate::suffix::*;
use crate::tree::*;

/// Applies the assertions in order to a frontier of suffixes.
///
/// Returns None as soon as no suffix survives.
fn narrow_frontier(
    assertions: &[Assertion],
    frontier: Vec<Suffix>,
    num_candidates: u32,
) -> Option<Vec<Suffix>> {
    let mut cur_frontier = frontier;
    for (idx, a) in assertions.iter().enumerate() {
        cur_frontier = all_allowed_suffixes(a, &cur_frontier, num_candidates, false);
        info!(
            "narrow_frontier: after assertion {}: {} surviving suffixes",
            idx,
            cur_frontier.len()
        );
        if cur_frontier.is_empty() {
            return None;
        }
    }
    Some(cur_frontier)
}

/// The candidates that can still win, given the assertions.
///
/// All the elimination orders are enumerated when the number of candidates allows it
/// (see [ExplainOptions::max_exhaustive_candidates]), otherwise the search starts from the
/// singleton suffixes. Both yield the same candidates.
pub fn possible_winners(
    assertions: &[Assertion],
    num_candidates: u32,
    options: &ExplainOptions,
) -> Result<Vec<CandidateId>, Inconsistency> {
    let seeds = if num_candidates <= options.max_exhaustive_candidates {
        all_elimination_orders(num_candidates)
    } else {
        warn!(
            "possible_winners: {} candidates is above the limit of {}, starting from singletons",
            num_candidates, options.max_exhaustive_candidates
        );
        all_singleton_suffixes(num_candidates)
    };
    debug!("possible_winners: {} initial suffixes", seeds.len());
    let survivors =
        narrow_frontier(assertions, seeds, num_candidates).ok_or(Inconsistency::Contradictory)?;
    let winners: BTreeSet<CandidateId> = survivors.iter().filter_map(|s| s.last()).cloned().collect();
    Ok(winners.into_iter().collect())
}

/// The unique winner implied by the assertions.
pub fn infer_winner(
    assertions: &[Assertion],
    num_candidates: u32,
    options: &ExplainOptions,
) -> Result<CandidateId, Inconsistency> {
    let winners = possible_winners(assertions, num_candidates, options)?;
    match winners.as_slice() {
        [w] => Ok(*w),
        _ => Err(Inconsistency::Ambiguous {
            possible_winners: winners,
        }),
    }
}

/// Checks that the assertions of the audit imply its declared winner, and only that winner.
///
/// This should be called before presenting any explanation.
pub fn check_winner(audit: &Audit, options: &ExplainOptions) -> Result<CandidateId, AuditErrors> {
    let declared = audit.declared_winner();
    let winners = possible_winners(audit.assertions(), audit.num_candidates(), options)?;
    info!(
        "check_winner: declared: {}, possible winners: {:?}",
        declared, winners
    );
    if !winners.contains(&declared) {
        return Err(AuditErrors::Inconsistent(Inconsistency::Mismatch {
            declared,
            possible_winners: winners,
        }));
    }
    if winners.len() > 1 {
        return Err(AuditErrors::Inconsistent(Inconsistency::Ambiguous {
            possible_winners: winners,
        }));
    }
    Ok(declared)
}

/// Explains, for every candidate, how the assertions rule out the elimination orders that
/// end with this candidate.
///
/// Each assertion is one step, recording the trees before (with the surviving paths marked as
/// valid) and after. The explanation of a candidate stops once all its orders are ruled out.
pub fn explain(audit: &Audit, options: &ExplainOptions) -> Result<Vec<WinnerNarrative>, AuditErrors> {
    let num_candidates = audit.num_candidates();
    info!(
        "explain: {} candidates, {} assertions, options: {:?}",
        num_candidates,
        audit.assertions().len(),
        options
    );
    let seeds: Vec<Suffix> = if options.expand_fully {
        if num_candidates > options.max_exhaustive_candidates {
            return Err(AuditErrors::TooManyCandidates {
                num_candidates,
                max: options.max_exhaustive_candidates,
            });
        }
        all_elimination_orders(num_candidates)
    } else {
        all_singleton_suffixes(num_candidates)
    };

    let mut res: Vec<WinnerNarrative> = Vec::new();
    for cid in (0..num_candidates).map(CandidateId) {
        if options.hide_winner && cid == audit.declared_winner() {
            continue;
        }
        let initial: Vec<Suffix> = seeds
            .iter()
            .filter(|s| s.last() == Some(&cid))
            .cloned()
            .collect();
        if initial.is_empty() {
            continue;
        }
        let narrative = explain_winner(audit, cid, initial);
        info!(
            "explain: candidate {} ({}): {} steps, ruled out at {:?}",
            cid,
            narrative.winner_name,
            narrative.process.len(),
            narrative.ruled_out_at
        );
        res.push(narrative);
    }
    Ok(res)
}

fn explain_winner(audit: &Audit, cid: CandidateId, initial: Vec<Suffix>) -> WinnerNarrative {
    let num_candidates = audit.num_candidates();
    let mut process: Vec<StepRecord> = vec![StepRecord {
        step: 0,
        assertion: None,
        assertion_text: None,
        before: None,
        after: Some(build_valid_trees(&initial)),
    }];
    let mut ruled_out_at: Option<usize> = None;
    let mut frontier = initial;
    for (idx, a) in audit.assertions().iter().enumerate() {
        let step = idx + 1;
        let new_frontier = all_allowed_suffixes(a, &frontier, num_candidates, false);
        let mut before = build_trees(&frontier);
        mark_valid_paths(&mut before, &new_frontier);
        debug!(
            "explain_winner: candidate {} step {}: {} -> {} suffixes",
            cid,
            step,
            frontier.len(),
            new_frontier.len()
        );
        process.push(StepRecord {
            step,
            assertion: Some(a.clone()),
            assertion_text: Some(a.describe(audit.candidates())),
            before: Some(before),
            after: Some(build_valid_trees(&new_frontier)),
        });
        frontier = new_frontier;
        if frontier.is_empty() {
            ruled_out_at = Some(step);
            break;
        }
    }
    WinnerNarrative {
        winner: cid,
        winner_name: audit.candidate_name(cid).to_string(),
        process,
        ruled_out_at,
    }
}
