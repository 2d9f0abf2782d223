use std::collections::BTreeSet;

use crate::error::ConfigError;

pub const DEFAULT_DESIRED_FORMS: &[&str] = &[
    "f1040s1", "f1040s3", "f1040sa", "f1040sb", "f1040sc", "f1040sd", "f1040se", "1040f", "f8889",
    "f8949",
];

/// Identifiers scoring is restricted to. Never empty.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Vocabulary {
    forms: BTreeSet<String>,
}

impl Vocabulary {
    pub fn new<I, S>(forms: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let forms = forms
            .into_iter()
            .map(|form| form.as_ref().trim().to_string())
            .filter(|form| !form.is_empty())
            .collect::<BTreeSet<String>>();

        if forms.is_empty() {
            return Err(ConfigError::EmptyVocabulary);
        }

        Ok(Self { forms })
    }

    pub fn desired_forms() -> Self {
        Self {
            forms: DEFAULT_DESIRED_FORMS
                .iter()
                .map(|form| (*form).to_string())
                .collect(),
        }
    }

    pub fn contains(&self, form_id: &str) -> bool {
        self.forms.contains(form_id)
    }

    pub fn restrict(&self, forms: &BTreeSet<String>) -> BTreeSet<String> {
        forms
            .iter()
            .filter(|form| self.contains(form))
            .cloned()
            .collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.forms.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.forms.len()
    }
}
