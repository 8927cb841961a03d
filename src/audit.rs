mod input;

use log::{debug, info, warn};

use irv_assertions::lazy::{LazyTree, LazyTreeNode};
use irv_assertions::*;
use snafu::{prelude::*, Snafu};

use std::fs;

use serde_json::json;
use serde_json::Map as JSMap;
use serde_json::Value as JSValue;
use text_diff::print_diff;

pub use crate::audit::input::*;

#[derive(Debug, Snafu)]
pub enum ExplainError {
    #[snafu(display("Error opening file {path}"))]
    OpeningJson {
        source: std::io::Error,
        path: String,
    },
    #[snafu(display("Error parsing JSON content"))]
    ParsingJson { source: serde_json::Error },
    #[snafu(display("Error writing file {path}"))]
    WritingOutput {
        source: std::io::Error,
        path: String,
    },
    #[snafu(display("Invalid audit: {source}"))]
    InvalidAudit { source: ValidationError },
    #[snafu(display("{source}"))]
    AuditComputation { source: AuditErrors },

    #[snafu(whatever, display("{message}"))]
    Whatever {
        message: String,
        #[snafu(source(from(Box<dyn std::error::Error>, Some)))]
        source: Option<Box<dyn std::error::Error>>,
    },
}

pub type ExplainResult<T> = Result<T, ExplainError>;

/// What the program produces once the winner is confirmed.
#[derive(Eq, PartialEq, Debug, Clone, Copy)]
pub enum OutputMode {
    /// The step-by-step explanation of every candidate.
    Narrative,
    /// The lazily expanded tree of every candidate, down to the given depth.
    Lazy(u32),
}

#[derive(Eq, PartialEq, Debug, Clone)]
pub struct RunSettings {
    pub input: String,
    pub out: Option<String>,
    pub reference: Option<String>,
    pub mode: OutputMode,
    pub options: ExplainOptions,
}

fn candidate_json(audit: &Audit, cid: CandidateId) -> JSValue {
    json!({"id": cid.0, "name": audit.candidate_name(cid)})
}

fn tree_to_json(audit: &Audit, node: &TreeNode) -> JSValue {
    let children: Vec<JSValue> = node
        .children
        .iter()
        .map(|c| tree_to_json(audit, c))
        .collect();
    json!({
        "id": node.id.0,
        "name": audit.candidate_name(node.id),
        "valid": node.valid,
        "children": children
    })
}

fn trees_to_json(audit: &Audit, trees: &[TreeNode]) -> JSValue {
    JSValue::Array(trees.iter().map(|t| tree_to_json(audit, t)).collect())
}

fn narrative_to_json(audit: &Audit, narrative: &WinnerNarrative) -> JSValue {
    let mut process: Vec<JSValue> = Vec::new();
    for step in narrative.process.iter() {
        let mut js: JSMap<String, JSValue> = JSMap::new();
        js.insert("step".to_string(), json!(step.step));
        if let Some(text) = &step.assertion_text {
            js.insert("assertion".to_string(), json!(text));
        }
        if let Some(before) = &step.before {
            js.insert("before".to_string(), trees_to_json(audit, before));
        }
        if let Some(after) = &step.after {
            js.insert("after".to_string(), trees_to_json(audit, after));
        }
        process.push(JSValue::Object(js));
    }
    json!({
        "winnerInfo": candidate_json(audit, narrative.winner),
        "ruledOutAt": narrative.ruled_out_at,
        "process": process
    })
}

fn lazy_node_to_json(audit: &Audit, tree: &LazyTree, node: &LazyTreeNode) -> JSValue {
    let mut js: JSMap<String, JSValue> = JSMap::new();
    js.insert("id".to_string(), json!(node.id.0));
    js.insert("name".to_string(), json!(audit.candidate_name(node.id)));
    js.insert(
        "path".to_string(),
        json!(node.path.iter().map(|c| c.0).collect::<Vec<u32>>()),
    );
    js.insert(
        "remaining".to_string(),
        json!(node.remaining.iter().map(|c| c.0).collect::<Vec<u32>>()),
    );
    js.insert("pruned".to_string(), json!(node.pruned()));
    if let Some(a) = tree.pruning_assertion(node) {
        js.insert("prunedBy".to_string(), json!(a.describe(audit.candidates())));
    }
    let children: Vec<JSValue> = node
        .children
        .iter()
        .map(|c| lazy_node_to_json(audit, tree, c))
        .collect();
    js.insert("children".to_string(), JSValue::Array(children));
    JSValue::Object(js)
}

fn inference_to_json(audit: &Audit, verdict: &Result<CandidateId, AuditErrors>) -> JSValue {
    match verdict {
        Ok(cid) => json!({"ok": true, "winner": candidate_json(audit, *cid)}),
        Err(AuditErrors::Inconsistent(e)) => json!({
            "ok": false,
            "reason": e.reason(),
            "detail": e.to_string(),
            "inferredWinner": e.inferred_winner().map(|cid| candidate_json(audit, cid)),
        }),
        Err(e) => json!({"ok": false, "reason": "error", "detail": e.to_string()}),
    }
}

fn build_lazy_trees(audit: &Audit, settings: &RunSettings, depth: u32) -> ExplainResult<JSValue> {
    let mut res: Vec<JSValue> = Vec::new();
    for cid in (0..audit.num_candidates()).map(CandidateId) {
        if settings.options.hide_winner && cid == audit.declared_winner() {
            continue;
        }
        let mut tree = LazyTree::new(cid, audit.num_candidates(), audit.assertions());
        for _ in 0..depth {
            let expanded = tree.expand_layer().context(AuditComputationSnafu {})?;
            if expanded == 0 {
                break;
            }
        }
        res.push(lazy_node_to_json(audit, &tree, tree.root()));
    }
    Ok(JSValue::Array(res))
}

fn build_summary_js(
    audit: &Audit,
    verdict: &Result<CandidateId, AuditErrors>,
    settings: &RunSettings,
) -> ExplainResult<JSValue> {
    let inference = inference_to_json(audit, verdict);
    if verdict.is_err() {
        // Nothing to explain.
        return Ok(json!({ "inference": inference }));
    }
    let res = match settings.mode {
        OutputMode::Narrative => {
            let narratives =
                explain(audit, &settings.options).context(AuditComputationSnafu {})?;
            let js_narratives: Vec<JSValue> = narratives
                .iter()
                .map(|n| narrative_to_json(audit, n))
                .collect();
            json!({
                "inference": inference,
                "candidates": audit.candidates(),
                "narratives": js_narratives
            })
        }
        OutputMode::Lazy(depth) => json!({
            "inference": inference,
            "candidates": audit.candidates(),
            "lazyTrees": build_lazy_trees(audit, settings, depth)?
        }),
    };
    Ok(res)
}

fn write_output(out: &Option<String>, contents: &str) -> ExplainResult<()> {
    match out.as_deref() {
        None | Some("stdout") => {
            println!("{}", contents);
        }
        Some(path) => {
            info!("Writing the explanation to {:?}", path);
            fs::write(path, contents).context(WritingOutputSnafu { path })?;
        }
    }
    Ok(())
}

fn read_reference(path: &str) -> ExplainResult<String> {
    let contents = fs::read_to_string(path).context(OpeningJsonSnafu { path })?;
    let js: JSValue = serde_json::from_str(contents.as_str()).context(ParsingJsonSnafu {})?;
    serde_json::to_string_pretty(&js).context(ParsingJsonSnafu {})
}

pub fn run_explain(settings: &RunSettings) -> ExplainResult<()> {
    info!("Reading audit {:?}", settings.input);
    let audit = read_audit(settings.input.as_str())?;
    info!(
        "Audit: {} candidates, {} assertions, declared winner: {} ({})",
        audit.num_candidates(),
        audit.assertions().len(),
        audit.declared_winner(),
        audit.candidate_name(audit.declared_winner())
    );
    for a in audit.assertions() {
        debug!("assertion {:?}: {}", a.index, a.describe(audit.candidates()));
    }

    let verdict = check_winner(&audit, &settings.options);
    match &verdict {
        Ok(cid) => info!("The assertions imply the winner {}", audit.candidate_name(*cid)),
        Err(e) => warn!("The assertions do not confirm the winner: {}", e),
    }

    let result_js = build_summary_js(&audit, &verdict, settings)?;
    let pretty_js = serde_json::to_string_pretty(&result_js).context(ParsingJsonSnafu {})?;
    write_output(&settings.out, pretty_js.as_str())?;

    // The reference output, if provided for comparison
    if let Some(reference_p) = &settings.reference {
        let pretty_js_ref = read_reference(reference_p.as_str())?;
        if pretty_js_ref != pretty_js {
            warn!("Found differences with the reference output");
            print_diff(pretty_js_ref.as_str(), pretty_js.as_str(), "\n");
            whatever!("Difference detected between the explanation and the reference")
        }
    }

    verdict.context(AuditComputationSnafu {})?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_path(name: &str) -> String {
        format!("{}/tests/data/{}", env!("CARGO_MANIFEST_DIR"), name)
    }

    fn settings(name: &str, mode: OutputMode) -> RunSettings {
        RunSettings {
            input: test_path(name),
            out: Some("stdout".to_string()),
            reference: None,
            mode,
            options: ExplainOptions::DEFAULT_OPTIONS,
        }
    }

    #[test]
    fn both_input_shapes_give_the_same_audit() {
        let explicit = read_audit(test_path("guide_explicit.json").as_str()).unwrap();
        let generated = read_audit(test_path("guide_raire.json").as_str()).unwrap();
        assert_eq!(explicit, generated);
        assert_eq!(explicit.declared_winner(), CandidateId(2));
        assert_eq!(explicit.assertions().len(), 4);
    }

    #[test]
    fn narratives_in_json() {
        let s = settings("guide_explicit.json", OutputMode::Narrative);
        let audit = read_audit(s.input.as_str()).unwrap();
        let verdict = check_winner(&audit, &s.options);
        let js = build_summary_js(&audit, &verdict, &s).unwrap();
        assert_eq!(js["inference"]["ok"], json!(true));
        assert_eq!(js["inference"]["winner"]["name"], json!("Chuan"));
        let narratives = js["narratives"].as_array().unwrap();
        assert_eq!(narratives.len(), 4);
        assert_eq!(narratives[1]["winnerInfo"]["name"], json!("Bob"));
        assert_eq!(narratives[1]["ruledOutAt"], json!(1));
        assert_eq!(narratives[2]["ruledOutAt"], JSValue::Null);
        let step1 = &narratives[0]["process"][1];
        assert_eq!(step1["assertion"], json!("Chuan NEB Bob"));
        assert_eq!(step1["before"][0]["valid"], json!(true));
        assert!(narratives[0]["process"][0].get("before").is_none());
    }

    #[test]
    fn lazy_trees_in_json() {
        let s = settings("guide_raire.json", OutputMode::Lazy(1));
        let audit = read_audit(s.input.as_str()).unwrap();
        let verdict = check_winner(&audit, &s.options);
        let js = build_summary_js(&audit, &verdict, &s).unwrap();
        let trees = js["lazyTrees"].as_array().unwrap();
        assert_eq!(trees.len(), 4);
        let alice = &trees[0];
        assert_eq!(alice["path"], json!([0]));
        let children = alice["children"].as_array().unwrap();
        assert_eq!(children.len(), 3);
        assert_eq!(children[0]["path"], json!([1, 0]));
        assert_eq!(children[0]["pruned"], json!(true));
        assert_eq!(children[0]["prunedBy"], json!("Chuan NEB Bob"));
    }

    #[test]
    fn ambiguous_audit_is_rejected() {
        let s = settings("ambiguous.json", OutputMode::Narrative);
        let audit = read_audit(s.input.as_str()).unwrap();
        let verdict = check_winner(&audit, &s.options);
        let js = build_summary_js(&audit, &verdict, &s).unwrap();
        assert_eq!(js["inference"]["ok"], json!(false));
        assert_eq!(js["inference"]["reason"], json!("ambiguous"));
        assert!(js.get("narratives").is_none());
        assert!(matches!(
            run_explain(&s),
            Err(ExplainError::AuditComputation {
                source: AuditErrors::Inconsistent(Inconsistency::Ambiguous { .. })
            })
        ));
    }

    #[test]
    fn wrong_declared_winner_reports_the_inferred_one() {
        let s = settings("wrong_winner.json", OutputMode::Narrative);
        let audit = read_audit(s.input.as_str()).unwrap();
        let verdict = check_winner(&audit, &s.options);
        let js = build_summary_js(&audit, &verdict, &s).unwrap();
        assert_eq!(js["inference"]["ok"], json!(false));
        assert_eq!(js["inference"]["reason"], json!("mismatch"));
        assert_eq!(
            js["inference"]["inferredWinner"],
            json!({"id": 2, "name": "Chuan"})
        );
        assert!(js.get("narratives").is_none());
        assert!(matches!(
            run_explain(&s),
            Err(ExplainError::AuditComputation {
                source: AuditErrors::Inconsistent(Inconsistency::Mismatch { .. })
            })
        ));
    }

    #[test]
    fn contradictory_audit_is_rejected() {
        let s = settings("contradictory.json", OutputMode::Lazy(1));
        let audit = read_audit(s.input.as_str()).unwrap();
        let verdict = check_winner(&audit, &s.options);
        let js = build_summary_js(&audit, &verdict, &s).unwrap();
        assert_eq!(js["inference"]["ok"], json!(false));
        assert_eq!(js["inference"]["reason"], json!("contradictory"));
        assert_eq!(js["inference"]["inferredWinner"], JSValue::Null);
        assert!(js.get("lazyTrees").is_none());
    }

    #[test]
    fn candidates_that_are_not_indexes() {
        assert!(matches!(
            parse_audit(r#"{"candidateNames": ["A", "B"], "assertions": [{"type": "NEB", "winner": 0, "loser": 1}, {"type": "NEB", "winner": -1, "loser": 0}], "declaredWinner": 0}"#),
            Err(ExplainError::InvalidAudit {
                source: ValidationError::NotACandidate { assertion: 1, field: "winner", .. }
            })
        ));
        assert!(matches!(
            parse_audit(r#"{"candidateNames": ["A", "B"], "assertions": [{"type": "NEB", "winner": 0, "loser": "B"}], "declaredWinner": 0}"#),
            Err(ExplainError::InvalidAudit {
                source: ValidationError::NotACandidate { assertion: 0, field: "loser", .. }
            })
        ));
        assert!(matches!(
            parse_audit(r#"{"candidateNames": ["A", "B", "C"], "assertions": [{"type": "NEN", "winner": 0, "loser": 1, "continuing": [0, 1.5]}], "declaredWinner": 0}"#),
            Err(ExplainError::InvalidAudit {
                source: ValidationError::NotACandidate { assertion: 0, field: "continuing", .. }
            })
        ));
    }

    #[test]
    fn malformed_inputs() {
        assert!(matches!(
            parse_audit(r#"{"candidateNames": ["A", "B"], "assertions": [{"type": "NEN", "winner": 0, "loser": 1}], "declaredWinner": 0}"#),
            Err(ExplainError::InvalidAudit {
                source: ValidationError::MissingContinuing { assertion: 0 }
            })
        ));
        assert!(matches!(
            parse_audit(r#"{"candidateNames": ["A", "B"], "assertions": [], "declaredWinner": "A"}"#),
            Err(ExplainError::ParsingJson { .. })
        ));
        assert!(matches!(
            parse_audit(r#"{"metadata": {"candidates": ["A"]}, "solution": {"Err": "TimeoutCheckingWinner"}}"#),
            Err(ExplainError::Whatever { .. })
        ));
        assert!(matches!(
            read_audit(test_path("missing.json").as_str()),
            Err(ExplainError::OpeningJson { .. })
        ));
    }

    #[test]
    fn reference_comparison() {
        let mut s = settings("guide_explicit.json", OutputMode::Lazy(0));
        s.reference = Some(test_path("guide_lazy_reference.json"));
        assert!(run_explain(&s).is_ok());
        s.mode = OutputMode::Lazy(1);
        assert!(matches!(run_explain(&s), Err(ExplainError::Whatever { .. })));
    }
}
