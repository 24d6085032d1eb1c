use serde::{Deserialize, Serialize};
use crate::program::types::{Program, ProgramType};

/// Role-keyed membership filter for listing programs
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "role", content = "userId", rename_all = "lowercase")]
pub enum ProgramFilter {
    /// Programs created by the user (sponsor view)
    Creator(String),
    /// Programs the user has applied to (builder view)
    Builder(String),
    /// Programs the user validates
    Validator(String),
}

impl ProgramFilter {
    pub fn user_id(&self) -> &str {
        match self {
            ProgramFilter::Creator(id)
            | ProgramFilter::Builder(id)
            | ProgramFilter::Validator(id) => id,
        }
    }

    pub fn matches(&self, program: &Program) -> bool {
        match self {
            ProgramFilter::Creator(id) => &program.creator_id == id,
            ProgramFilter::Builder(id) => program
                .applications
                .iter()
                .any(|app| &app.applicant_id == id),
            ProgramFilter::Validator(id) => program.validators.iter().any(|v| v == id),
        }
    }
}

/// One page request against the program repository
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProgramQuery {
    pub filter: ProgramFilter,
    pub program_type: Option<ProgramType>,
    pub page: usize,
    pub page_size: usize,
}

impl ProgramQuery {
    pub fn new(filter: ProgramFilter, page_size: usize) -> Self {
        Self {
            filter,
            program_type: None,
            page: 0,
            page_size,
        }
    }

    pub fn with_type(mut self, program_type: ProgramType) -> Self {
        self.program_type = Some(program_type);
        self
    }

    pub fn next_page(&self) -> Self {
        Self {
            page: self.page + 1,
            ..self.clone()
        }
    }

    pub fn matches(&self, program: &Program) -> bool {
        let type_matches = match self.program_type {
            Some(wanted) => program.program_type == Some(wanted),
            None => true,
        };
        type_matches && self.filter.matches(program)
    }
}

/// A page of results; `has_more` signals another page is available
#[derive(Debug, Clone, PartialEq)]
pub struct ProgramPage {
    pub items: Vec<Program>,
    pub has_more: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn program(json: &str) -> Program {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn test_filters_match_by_role() {
        let p = program(
            r#"{"id":"p1","name":"n","status":"published","creatorId":"alice","price":"10","currency":"USDC",
                "validators":["victor"],
                "applications":[{"id":"a1","applicantId":"bob","status":"pending"}]}"#,
        );

        assert!(ProgramFilter::Creator("alice".into()).matches(&p));
        assert!(!ProgramFilter::Creator("bob".into()).matches(&p));
        assert!(ProgramFilter::Builder("bob".into()).matches(&p));
        assert!(!ProgramFilter::Builder("alice".into()).matches(&p));
        assert!(ProgramFilter::Validator("victor".into()).matches(&p));
    }

    #[test]
    fn test_query_type_narrows_results() {
        let p = program(
            r#"{"id":"p1","name":"n","status":"pending","creatorId":"alice","price":"10","currency":"USDC","programType":"funding"}"#,
        );
        let query = ProgramQuery::new(ProgramFilter::Creator("alice".into()), 10);
        assert!(query.matches(&p));
        assert!(query.clone().with_type(ProgramType::Funding).matches(&p));
        assert!(!query.with_type(ProgramType::Regular).matches(&p));
    }

    #[test]
    fn test_filter_serializes_as_tagged_union() {
        let json = serde_json::to_string(&ProgramFilter::Builder("bob".into())).unwrap();
        assert_eq!(json, r#"{"role":"builder","userId":"bob"}"#);
    }
}
