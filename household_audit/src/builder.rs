pub use crate::config::*;

/// A builder for assembling a survey without going through a spreadsheet.
///
/// ```
/// pub use household_audit::builder::Builder;
/// pub use household_audit::AuditRules;
/// # use household_audit::AuditErrors;
///
/// let mut builder = Builder::new(&AuditRules::DEFAULT_RULES)?;
///
/// builder.add_person_simple("1", "1", &["Ana", "", "Ruiz", ""])?;
/// builder.add_person_simple("1", "2", &["Tom", "", "Ruiz", ""])?;
/// assert_eq!(builder.records().len(), 2);
///
/// let report = builder.audit()?;
/// assert_eq!(report.households.multi_member.len(), 1);
///
/// # Ok::<(), AuditErrors>(())
/// ```
pub struct Builder {
    pub(crate) _rules: AuditRules,
    pub(crate) _records: Vec<PersonRecord>,
}

impl Builder {
    pub fn new(rules: &AuditRules) -> Result<Builder, AuditErrors> {
        Ok(Builder {
            _rules: rules.clone(),
            _records: Vec::new(),
        })
    }

    pub fn rules(self, rules: &AuditRules) -> Result<Builder, AuditErrors> {
        Ok(Builder {
            _rules: rules.clone(),
            _records: self._records,
        })
    }

    /// Adds a person with only its identity.
    ///
    /// names: first name, middle name, first surname and second surname. Missing trailing
    /// parts and empty strings are treated as absent.
    pub fn add_person_simple(
        &mut self,
        family_head_id: &str,
        document_id: &str,
        names: &[&str],
    ) -> Result<(), AuditErrors> {
        let part = |idx: usize| names.get(idx).cloned().unwrap_or("");
        self.add_person(&PersonRecord::new(
            family_head_id,
            document_id,
            part(0),
            part(1),
            part(2),
            part(3),
        ))
    }

    pub fn add_person(&mut self, record: &PersonRecord) -> Result<(), AuditErrors> {
        self._records.push(record.clone());
        Ok(())
    }

    pub fn records(&self) -> &[PersonRecord] {
        &self._records
    }

    /// Runs all the checks over the persons added so far.
    pub fn audit(&self) -> Result<AuditReport, AuditErrors> {
        crate::audit_records(&self._records, &self._rules)
    }
}
