// ********* Input data structures ***********

use std::collections::HashSet;
use std::error::Error;
use std::fmt::Display;

/// The identifier of a candidate: its position in the list of candidate names.
#[derive(Eq, PartialEq, Debug, Clone, Copy, Hash, Ord, PartialOrd)]
pub struct CandidateId(pub u32);

impl Display for CandidateId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A partial elimination order, read from left to right: the first element was eliminated
/// soonest among the listed candidates, and the last element is the provisional winner.
///
/// A suffix grows by prepending the candidates that were eliminated earlier.
pub type Suffix = Vec<CandidateId>;

/// The two kinds of claims that an audit can make.
#[derive(Eq, PartialEq, Debug, Clone, Hash)]
pub enum AssertionKind {
    /// The winner is never eliminated before the loser.
    NotEliminatedBefore,
    /// If only the given candidates are still continuing, the winner is not the next one to be
    /// eliminated. The set always contains both the winner and the loser.
    NotEliminatedNext(Vec<CandidateId>),
}

/// One machine-checkable claim comparing the tallies of two candidates.
///
/// Construct it with [Assertion::neb], [Assertion::nen] or [Assertion::parse]. The structural
/// invariants are checked by [Audit::new].
#[derive(Eq, PartialEq, Debug, Clone, Hash)]
pub struct Assertion {
    pub kind: AssertionKind,
    pub winner: CandidateId,
    pub loser: CandidateId,
    /// A stable ordinal, used to attribute a pruned branch to an assertion.
    pub index: Option<usize>,
}

impl Assertion {
    pub fn neb(winner: u32, loser: u32) -> Assertion {
        Assertion {
            kind: AssertionKind::NotEliminatedBefore,
            winner: CandidateId(winner),
            loser: CandidateId(loser),
            index: None,
        }
    }

    pub fn nen(winner: u32, loser: u32, continuing: &[u32]) -> Assertion {
        Assertion {
            kind: AssertionKind::NotEliminatedNext(
                continuing.iter().map(|c| CandidateId(*c)).collect(),
            ),
            winner: CandidateId(winner),
            loser: CandidateId(loser),
            index: None,
        }
    }

    pub fn with_index(self, index: usize) -> Assertion {
        Assertion {
            index: Some(index),
            ..self
        }
    }

    /// Builds an assertion from the loosely typed fields found in audit files.
    ///
    /// `position` is the location of the assertion in its list, used for error reporting
    /// and as the default index.
    pub fn parse(
        position: usize,
        kind: &str,
        winner: u32,
        loser: u32,
        continuing: Option<&[u32]>,
        index: Option<usize>,
    ) -> Result<Assertion, ValidationError> {
        let a = match (kind, continuing) {
            ("NEB", None) => Assertion::neb(winner, loser),
            ("NEB", Some(_)) => {
                return Err(ValidationError::UnexpectedContinuing {
                    assertion: position,
                })
            }
            ("NEN", Some(cs)) => Assertion::nen(winner, loser, cs),
            ("NEN", None) => {
                return Err(ValidationError::MissingContinuing {
                    assertion: position,
                })
            }
            (x, _) => {
                return Err(ValidationError::UnknownAssertionType {
                    assertion: position,
                    kind: x.to_string(),
                })
            }
        };
        Ok(a.with_index(index.unwrap_or(position)))
    }

    /// The continuing candidates of a NEN assertion, if any.
    pub fn continuing(&self) -> Option<&[CandidateId]> {
        match &self.kind {
            AssertionKind::NotEliminatedBefore => None,
            AssertionKind::NotEliminatedNext(cs) => Some(cs.as_slice()),
        }
    }

    /// A short text for display, using the candidate names when they are known.
    pub fn describe(&self, names: &[String]) -> String {
        let name = |cid: CandidateId| -> String {
            names
                .get(cid.0 as usize)
                .cloned()
                .unwrap_or_else(|| format!("#{}", cid.0))
        };
        match &self.kind {
            AssertionKind::NotEliminatedBefore => {
                format!("{} NEB {}", name(self.winner), name(self.loser))
            }
            AssertionKind::NotEliminatedNext(continuing) => {
                let cs: Vec<String> = continuing.iter().map(|c| name(*c)).collect();
                format!(
                    "NEN: {} > {} if only {{{}}} remain",
                    name(self.winner),
                    name(self.loser),
                    cs.join(",")
                )
            }
        }
    }

    fn check(&self, position: usize, num_candidates: u32) -> Result<(), ValidationError> {
        let in_range = |field: &'static str, cid: CandidateId| {
            if cid.0 < num_candidates {
                Ok(())
            } else {
                Err(ValidationError::CandidateOutOfRange {
                    assertion: position,
                    field,
                    candidate: cid.0,
                    num_candidates,
                })
            }
        };
        in_range("winner", self.winner)?;
        in_range("loser", self.loser)?;
        if self.winner == self.loser {
            return Err(ValidationError::WinnerIsLoser {
                assertion: position,
                candidate: self.winner.0,
            });
        }
        if let Some(continuing) = self.continuing() {
            let mut seen: HashSet<CandidateId> = HashSet::new();
            for cid in continuing.iter() {
                in_range("continuing", *cid)?;
                if !seen.insert(*cid) {
                    return Err(ValidationError::DuplicateContinuing {
                        assertion: position,
                        candidate: cid.0,
                    });
                }
            }
            if continuing.len() < 2 {
                return Err(ValidationError::ContinuingTooSmall {
                    assertion: position,
                });
            }
            for (field, cid) in [("winner", self.winner), ("loser", self.loser)] {
                if !seen.contains(&cid) {
                    return Err(ValidationError::NotContinuing {
                        assertion: position,
                        field,
                        candidate: cid.0,
                    });
                }
            }
        }
        Ok(())
    }
}

/// A validated audit: the candidates, the assertions and the announced winner.
///
/// Once built, all the candidate identifiers are known to be in range.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct Audit {
    candidates: Vec<String>,
    assertions: Vec<Assertion>,
    declared_winner: CandidateId,
}

impl Audit {
    pub fn new(
        candidates: Vec<String>,
        assertions: Vec<Assertion>,
        declared_winner: u32,
    ) -> Result<Audit, ValidationError> {
        if candidates.is_empty() {
            return Err(ValidationError::NoCandidates);
        }
        let num_candidates = candidates.len() as u32;
        if declared_winner >= num_candidates {
            return Err(ValidationError::DeclaredWinnerOutOfRange {
                winner: declared_winner,
                num_candidates,
            });
        }
        for (position, a) in assertions.iter().enumerate() {
            a.check(position, num_candidates)?;
        }
        // Unnumbered assertions are numbered by position.
        let assertions = assertions
            .into_iter()
            .enumerate()
            .map(|(position, a)| match a.index {
                Some(_) => a,
                None => a.with_index(position),
            })
            .collect();
        Ok(Audit {
            candidates,
            assertions,
            declared_winner: CandidateId(declared_winner),
        })
    }

    /// Same as [Audit::new], when the number of candidates is also stated by the input.
    pub fn with_num_candidates(
        candidates: Vec<String>,
        num_candidates: u32,
        assertions: Vec<Assertion>,
        declared_winner: u32,
    ) -> Result<Audit, ValidationError> {
        if candidates.len() as u32 != num_candidates {
            return Err(ValidationError::CandidateCountMismatch {
                names: candidates.len(),
                num_candidates,
            });
        }
        Audit::new(candidates, assertions, declared_winner)
    }

    pub fn candidates(&self) -> &[String] {
        &self.candidates
    }

    pub fn num_candidates(&self) -> u32 {
        self.candidates.len() as u32
    }

    pub fn assertions(&self) -> &[Assertion] {
        &self.assertions
    }

    pub fn declared_winner(&self) -> CandidateId {
        self.declared_winner
    }

    pub fn candidate_name(&self, cid: CandidateId) -> &str {
        self.candidates
            .get(cid.0 as usize)
            .map(|s| s.as_str())
            .unwrap_or("")
    }
}

// ******** Output data structures *********

/// One node of an elimination tree. The root is the winner of all the elimination orders
/// of the tree, the children are the candidates eliminated just before.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct TreeNode {
    pub id: CandidateId,
    pub children: Vec<TreeNode>,
    /// Whether this node is on a path of the currently surviving elimination orders.
    pub valid: bool,
}

/// One step of the explanation for a given winner.
///
/// Step 0 only has the `after` trees: the initial elimination orders.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct StepRecord {
    pub step: usize,
    pub assertion: Option<Assertion>,
    pub assertion_text: Option<String>,
    /// The trees before applying the assertion, with the surviving paths marked as valid.
    pub before: Option<Vec<TreeNode>>,
    pub after: Option<Vec<TreeNode>>,
}

/// The explanation of why a candidate can (or cannot) be the winner.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct WinnerNarrative {
    pub winner: CandidateId,
    pub winner_name: String,
    pub process: Vec<StepRecord>,
    /// The first step after which no elimination order ending with this candidate survives.
    pub ruled_out_at: Option<usize>,
}

/// Errors in the structure of the input. They are detected before any other computation.
#[derive(Eq, PartialEq, Debug, Clone)]
pub enum ValidationError {
    NoCandidates,
    CandidateCountMismatch {
        names: usize,
        num_candidates: u32,
    },
    DeclaredWinnerOutOfRange {
        winner: u32,
        num_candidates: u32,
    },
    UnknownCandidateName {
        name: String,
    },
    UnknownAssertionType {
        assertion: usize,
        kind: String,
    },
    CandidateOutOfRange {
        assertion: usize,
        field: &'static str,
        candidate: u32,
        num_candidates: u32,
    },
    WinnerIsLoser {
        assertion: usize,
        candidate: u32,
    },
    MissingContinuing {
        assertion: usize,
    },
    UnexpectedContinuing {
        assertion: usize,
    },
    ContinuingTooSmall {
        assertion: usize,
    },
    DuplicateContinuing {
        assertion: usize,
        candidate: u32,
    },
    NotContinuing {
        assertion: usize,
        field: &'static str,
        candidate: u32,
    },
    /// A candidate of an assertion is not a candidate index at all.
    NotACandidate {
        assertion: usize,
        field: &'static str,
        value: String,
    },
}

impl Error for ValidationError {}

impl Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ValidationError::NoCandidates => write!(f, "no candidates provided"),
            ValidationError::CandidateCountMismatch {
                names,
                num_candidates,
            } => write!(
                f,
                "{} candidate names provided but the number of candidates is {}",
                names, num_candidates
            ),
            ValidationError::DeclaredWinnerOutOfRange {
                winner,
                num_candidates,
            } => write!(
                f,
                "declared winner {} is not in the range [0, {})",
                winner, num_candidates
            ),
            ValidationError::UnknownCandidateName { name } => {
                write!(f, "unknown candidate name {:?}", name)
            }
            ValidationError::UnknownAssertionType { assertion, kind } => write!(
                f,
                "assertion {}: unknown type {:?} (expected NEB or NEN)",
                assertion, kind
            ),
            ValidationError::CandidateOutOfRange {
                assertion,
                field,
                candidate,
                num_candidates,
            } => write!(
                f,
                "assertion {}: {} {} is not in the range [0, {})",
                assertion, field, candidate, num_candidates
            ),
            ValidationError::WinnerIsLoser {
                assertion,
                candidate,
            } => write!(
                f,
                "assertion {}: candidate {} is both the winner and the loser",
                assertion, candidate
            ),
            ValidationError::MissingContinuing { assertion } => write!(
                f,
                "assertion {}: a NEN assertion requires the continuing candidates",
                assertion
            ),
            ValidationError::UnexpectedContinuing { assertion } => write!(
                f,
                "assertion {}: a NEB assertion does not take continuing candidates",
                assertion
            ),
            ValidationError::ContinuingTooSmall { assertion } => write!(
                f,
                "assertion {}: at least two continuing candidates are required",
                assertion
            ),
            ValidationError::DuplicateContinuing {
                assertion,
                candidate,
            } => write!(
                f,
                "assertion {}: candidate {} appears twice in the continuing candidates",
                assertion, candidate
            ),
            ValidationError::NotContinuing {
                assertion,
                field,
                candidate,
            } => write!(
                f,
                "assertion {}: {} {} is not one of the continuing candidates",
                assertion, field, candidate
            ),
            ValidationError::NotACandidate {
                assertion,
                field,
                value,
            } => write!(
                f,
                "assertion {}: {} {} is not a candidate index",
                assertion, field, value
            ),
        }
    }
}

/// The assertions are well formed, but they do not establish the declared winner.
#[derive(Eq, PartialEq, Debug, Clone)]
pub enum Inconsistency {
    /// No elimination order survives all the assertions.
    Contradictory,
    /// Several candidates may still win, including the declared winner.
    Ambiguous { possible_winners: Vec<CandidateId> },
    /// The declared winner cannot win given the assertions.
    Mismatch {
        declared: CandidateId,
        possible_winners: Vec<CandidateId>,
    },
}

impl Inconsistency {
    pub fn reason(&self) -> &'static str {
        match self {
            Inconsistency::Contradictory => "contradictory",
            Inconsistency::Ambiguous { .. } => "ambiguous",
            Inconsistency::Mismatch { .. } => "mismatch",
        }
    }

    /// The winner implied by the assertions, when there is exactly one.
    pub fn inferred_winner(&self) -> Option<CandidateId> {
        match self {
            Inconsistency::Mismatch {
                possible_winners, ..
            } if possible_winners.len() == 1 => possible_winners.first().cloned(),
            _ => None,
        }
    }
}

impl Error for Inconsistency {}

impl Display for Inconsistency {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let list = |cids: &[CandidateId]| -> String {
            cids.iter()
                .map(|c| c.to_string())
                .collect::<Vec<String>>()
                .join(", ")
        };
        match self {
            Inconsistency::Contradictory => write!(
                f,
                "no elimination order survives the assertions: they are contradictory"
            ),
            Inconsistency::Ambiguous { possible_winners } => write!(
                f,
                "the assertions do not rule out all the other candidates, possible winners: {}",
                list(possible_winners)
            ),
            Inconsistency::Mismatch {
                declared,
                possible_winners,
            } => write!(
                f,
                "declared winner {} is not implied by the assertions, inferred: {}",
                declared,
                list(possible_winners)
            ),
        }
    }
}

/// Errors that prevent the computations from completing successfully.
#[derive(Eq, PartialEq, Debug, Clone)]
pub enum AuditErrors {
    Invalid(ValidationError),
    Inconsistent(Inconsistency),
    /// Enumerating all the elimination orders was requested for too many candidates.
    TooManyCandidates {
        num_candidates: u32,
        max: u32,
    },
    /// A lazy tree was addressed with a path that does not designate any of its nodes.
    NodeNotFound {
        path: Suffix,
    },
    /// A pruned node of a lazy tree cannot be expanded.
    NodePruned {
        path: Suffix,
        pruned_by: usize,
    },
}

impl Error for AuditErrors {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            AuditErrors::Invalid(e) => Some(e),
            AuditErrors::Inconsistent(e) => Some(e),
            _ => None,
        }
    }
}

impl Display for AuditErrors {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AuditErrors::Invalid(e) => write!(f, "invalid audit: {}", e),
            AuditErrors::Inconsistent(e) => write!(f, "inconsistent audit: {}", e),
            AuditErrors::TooManyCandidates {
                num_candidates,
                max,
            } => write!(
                f,
                "cannot enumerate all the elimination orders of {} candidates (at most {})",
                num_candidates, max
            ),
            AuditErrors::NodeNotFound { path } => write!(f, "node not found: {:?}", path),
            AuditErrors::NodePruned { path, pruned_by } => write!(
                f,
                "node {:?} was pruned by assertion {} and cannot be expanded",
                path, pruned_by
            ),
        }
    }
}

impl From<ValidationError> for AuditErrors {
    fn from(e: ValidationError) -> Self {
        AuditErrors::Invalid(e)
    }
}

impl From<Inconsistency> for AuditErrors {
    fn from(e: Inconsistency) -> Self {
        AuditErrors::Inconsistent(e)
    }
}

// ********* Configuration **********

/// Options for the step-by-step explanation.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct ExplainOptions {
    /// Start from all the complete elimination orders instead of the singleton suffixes.
    pub expand_fully: bool,
    /// Do not produce an explanation for the declared winner.
    pub hide_winner: bool,
    /// The largest number of candidates for which all the elimination orders are enumerated.
    /// The number of orders grows as the factorial of this number.
    pub max_exhaustive_candidates: u32,
}

impl ExplainOptions {
    pub const DEFAULT_OPTIONS: ExplainOptions = ExplainOptions {
        expand_fully: false,
        hide_winner: false,
        max_exhaustive_candidates: 8,
    };
}
