pub use crate::config::*;

/// A builder for assembling an audit from candidate names.
///
/// ```
/// pub use irv_assertions::builder::AuditBuilder;
/// # use irv_assertions::AuditErrors;
///
/// let audit = AuditBuilder::new(&["Anna", "Bob"])?
///     .neb("Anna", "Bob")?
///     .winner("Anna")?
///     .build()?;
///
/// assert_eq!(audit.assertions().len(), 1);
/// # Ok::<(), AuditErrors>(())
/// ```
pub struct AuditBuilder {
    pub(crate) _candidates: Vec<String>,
    pub(crate) _assertions: Vec<Assertion>,
    pub(crate) _winner: Option<CandidateId>,
}

impl AuditBuilder {
    pub fn new(candidates: &[&str]) -> Result<AuditBuilder, AuditErrors> {
        if candidates.is_empty() {
            return Err(AuditErrors::Invalid(ValidationError::NoCandidates));
        }
        Ok(AuditBuilder {
            _candidates: candidates.iter().map(|s| s.to_string()).collect(),
            _assertions: Vec::new(),
            _winner: None,
        })
    }

    fn lookup(&self, name: &str) -> Result<CandidateId, AuditErrors> {
        self._candidates
            .iter()
            .position(|c| c == name)
            .map(|idx| CandidateId(idx as u32))
            .ok_or_else(|| {
                AuditErrors::Invalid(ValidationError::UnknownCandidateName {
                    name: name.to_string(),
                })
            })
    }

    /// Adds the assertion: `winner` is never eliminated before `loser`.
    pub fn neb(self, winner: &str, loser: &str) -> Result<AuditBuilder, AuditErrors> {
        let w = self.lookup(winner)?;
        let l = self.lookup(loser)?;
        self.assertion(Assertion::neb(w.0, l.0))
    }

    /// Adds the assertion: `winner` is not the next eliminated when only `continuing` remain.
    pub fn nen(
        self,
        winner: &str,
        loser: &str,
        continuing: &[&str],
    ) -> Result<AuditBuilder, AuditErrors> {
        let w = self.lookup(winner)?;
        let l = self.lookup(loser)?;
        let mut cs: Vec<u32> = Vec::new();
        for c in continuing {
            cs.push(self.lookup(c)?.0);
        }
        self.assertion(Assertion::nen(w.0, l.0, &cs))
    }

    pub fn assertion(mut self, assertion: Assertion) -> Result<AuditBuilder, AuditErrors> {
        self._assertions.push(assertion);
        Ok(self)
    }

    pub fn winner(mut self, name: &str) -> Result<AuditBuilder, AuditErrors> {
        self._winner = Some(self.lookup(name)?);
        Ok(self)
    }

    /// Validates the audit. Without an explicit winner, the first candidate is the declared
    /// winner.
    pub fn build(self) -> Result<Audit, AuditErrors> {
        let winner = self._winner.unwrap_or(CandidateId(0));
        Ok(Audit::new(self._candidates, self._assertions, winner.0)?)
    }
}
