use crate::audit::*;

use serde::{Deserialize, Serialize};
use serde_json::Value as JSValue;

#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct JsAssertion {
    #[serde(rename = "type")]
    pub kind: String,
    pub winner: JSValue,
    pub loser: JSValue,
    pub continuing: Option<Vec<JSValue>>,
    pub index: Option<usize>,
}

// Candidates are read loosely so that a bad value is reported with its assertion.
fn candidate_index(
    position: usize,
    field: &'static str,
    value: &JSValue,
) -> Result<u32, ValidationError> {
    value
        .as_u64()
        .and_then(|v| u32::try_from(v).ok())
        .ok_or_else(|| ValidationError::NotACandidate {
            assertion: position,
            field,
            value: value.to_string(),
        })
}

impl JsAssertion {
    fn to_assertion(&self, position: usize) -> Result<Assertion, ValidationError> {
        let winner = candidate_index(position, "winner", &self.winner)?;
        let loser = candidate_index(position, "loser", &self.loser)?;
        let continuing = match &self.continuing {
            Some(cs) => {
                let mut res: Vec<u32> = Vec::new();
                for c in cs.iter() {
                    res.push(candidate_index(position, "continuing", c)?);
                }
                Some(res)
            }
            None => None,
        };
        Assertion::parse(
            position,
            self.kind.as_str(),
            winner,
            loser,
            continuing.as_deref(),
            self.index,
        )
    }
}

/// The audit, as described directly by the caller.
#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct ExplicitAudit {
    #[serde(rename = "candidateNames")]
    pub candidate_names: Vec<String>,
    #[serde(rename = "numCandidates")]
    pub num_candidates: Option<u32>,
    pub assertions: Vec<JsAssertion>,
    #[serde(rename = "declaredWinner")]
    pub declared_winner: u32,
}

#[derive(PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct GeneratorMetadata {
    pub candidates: Vec<String>,
    pub contest: Option<String>,
}

#[derive(PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct AssertionWithStats {
    pub assertion: JsAssertion,
    pub difficulty: Option<f64>,
    pub margin: Option<u64>,
}

#[derive(PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct GeneratorSolution {
    pub assertions: Vec<AssertionWithStats>,
    pub winner: u32,
    pub num_candidates: u32,
    pub difficulty: Option<f64>,
    pub margin: Option<u64>,
}

#[derive(PartialEq, Debug, Clone, Serialize, Deserialize)]
pub enum GeneratorResult {
    Ok(GeneratorSolution),
    Err(JSValue),
}

/// The output of an assertion generator.
#[derive(PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct GeneratorOutput {
    pub metadata: GeneratorMetadata,
    pub solution: GeneratorResult,
}

fn to_assertions(js_assertions: &[JsAssertion]) -> ExplainResult<Vec<Assertion>> {
    let mut res: Vec<Assertion> = Vec::new();
    for (position, jsa) in js_assertions.iter().enumerate() {
        res.push(jsa.to_assertion(position).context(InvalidAuditSnafu {})?);
    }
    Ok(res)
}

impl ExplicitAudit {
    pub fn to_audit(&self) -> ExplainResult<Audit> {
        let assertions = to_assertions(&self.assertions)?;
        let names = self.candidate_names.clone();
        let res = match self.num_candidates {
            Some(n) => Audit::with_num_candidates(names, n, assertions, self.declared_winner),
            None => Audit::new(names, assertions, self.declared_winner),
        };
        res.context(InvalidAuditSnafu {})
    }
}

impl GeneratorOutput {
    pub fn to_audit(&self) -> ExplainResult<Audit> {
        let solution = match &self.solution {
            GeneratorResult::Ok(s) => s,
            GeneratorResult::Err(e) => {
                whatever!("The assertion generator did not produce assertions: {}", e)
            }
        };
        if let Some(contest) = &self.metadata.contest {
            info!("Contest: {}", contest);
        }
        let js_assertions: Vec<JsAssertion> = solution
            .assertions
            .iter()
            .map(|a| a.assertion.clone())
            .collect();
        let assertions = to_assertions(&js_assertions)?;
        Audit::with_num_candidates(
            self.metadata.candidates.clone(),
            solution.num_candidates,
            assertions,
            solution.winner,
        )
        .context(InvalidAuditSnafu {})
    }
}

/// Reads an audit in any of the supported shapes.
pub fn read_audit(path: &str) -> ExplainResult<Audit> {
    let contents = fs::read_to_string(path).context(OpeningJsonSnafu { path })?;
    parse_audit(contents.as_str())
}

pub fn parse_audit(contents: &str) -> ExplainResult<Audit> {
    let js: JSValue = serde_json::from_str(contents).context(ParsingJsonSnafu {})?;
    if js.get("solution").is_some() {
        debug!("parse_audit: reading the output of an assertion generator");
        let go: GeneratorOutput = serde_json::from_value(js).context(ParsingJsonSnafu {})?;
        go.to_audit()
    } else {
        debug!("parse_audit: reading an explicit audit");
        let ea: ExplicitAudit = serde_json::from_value(js).context(ParsingJsonSnafu {})?;
        ea.to_audit()
    }
}
