use regex::{Regex, RegexBuilder};
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

// Schedules come before the bare "Form 1040" rule so a schedule title wins the
// primary slot on its page. The 1040 rule skips the "(Form 1040)" suffix every
// schedule title carries.
const BUILTIN_FORMS: &[(&str, &str)] = &[
    ("f1040s1", r"SCHEDULE\s+1\s+\(Form\s+1040\)"),
    ("f1040s2", r"SCHEDULE\s+2\s+\(Form\s+1040\)"),
    ("f1040s3", r"SCHEDULE\s+3\s+\(Form\s+1040\)"),
    ("f1040sa", r"SCHEDULE\s+A\s+\(Form\s+1040\)"),
    ("f1040sb", r"SCHEDULE\s+B\s+\(Form\s+1040\)"),
    ("f1040sc", r"SCHEDULE\s+C\s+\(Form\s+1040\)"),
    ("f1040sd", r"SCHEDULE\s+D\s+\(Form\s+1040\)"),
    ("f1040se", r"SCHEDULE\s+E\s+\(Form\s+1040\)"),
    ("f1040s8812", r"SCHEDULE\s+8812\s+\(Form\s+1040\)"),
    ("1040f", r"(?:^|[^(\w])Form\s+1040\b"),
    ("f8889", r"Form\s+8889\b"),
    ("f8879", r"Form\s+8879\b"),
    ("f1116", r"Form\s+1116\b"),
    ("f4952", r"Form\s+4952\b"),
    ("f8949", r"Form\s+8949\b"),
    ("f8995", r"Form\s+8995\b"),
    ("f8959", r"Form\s+8959\b"),
    ("f8960", r"Form\s+8960\b"),
    ("f8582", r"Form\s+8582\b"),
    ("f8863", r"Form\s+8863\b"),
    ("f8812", r"Form\s+8812\b"),
    ("f2441", r"Form\s+2441\b"),
];

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogFile {
    pub forms: Vec<CatalogEntry>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogEntry {
    pub id: String,
    pub patterns: Vec<RuleSpec>,
    #[serde(default = "default_case_insensitive")]
    pub case_insensitive: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RuleSpec {
    Regex(String),
    Literal(String),
}

fn default_case_insensitive() -> bool {
    true
}

#[derive(Debug, Clone)]
pub enum MatchRule {
    Regex(Regex),
    Literal { needle: String, case_insensitive: bool },
}

impl MatchRule {
    pub fn is_match(&self, text: &str) -> bool {
        match self {
            Self::Regex(regex) => regex.is_match(text),
            Self::Literal {
                needle,
                case_insensitive: true,
            } => text.to_lowercase().contains(needle.as_str()),
            Self::Literal {
                needle,
                case_insensitive: false,
            } => text.contains(needle.as_str()),
        }
    }

    fn compile(form_id: &str, spec: &RuleSpec, case_insensitive: bool) -> Result<Self, ConfigError> {
        match spec {
            RuleSpec::Regex(pattern) => RegexBuilder::new(pattern)
                .case_insensitive(case_insensitive)
                .build()
                .map(Self::Regex)
                .map_err(|error| ConfigError::InvalidPattern {
                    form_id: form_id.to_string(),
                    reason: error.to_string(),
                }),
            RuleSpec::Literal(text) => {
                if text.trim().is_empty() {
                    return Err(ConfigError::InvalidPattern {
                        form_id: form_id.to_string(),
                        reason: "literal rule is empty".to_string(),
                    });
                }
                let needle = if case_insensitive {
                    text.to_lowercase()
                } else {
                    text.clone()
                };
                Ok(Self::Literal {
                    needle,
                    case_insensitive,
                })
            }
        }
    }
}

#[derive(Debug, Clone)]
pub struct FormPattern {
    pub id: String,
    pub rules: Vec<MatchRule>,
}

impl FormPattern {
    pub fn is_match(&self, text: &str) -> bool {
        self.rules.iter().any(|rule| rule.is_match(text))
    }
}

/// Ordered, immutable set of form patterns. Built once and shared read-only
/// across every page and document.
#[derive(Debug, Clone)]
pub struct PatternCatalog {
    forms: Vec<FormPattern>,
}

impl PatternCatalog {
    pub fn builtin() -> Result<Self, ConfigError> {
        let entries = BUILTIN_FORMS
            .iter()
            .map(|(id, pattern)| CatalogEntry {
                id: (*id).to_string(),
                patterns: vec![RuleSpec::Regex((*pattern).to_string())],
                case_insensitive: true,
            })
            .collect::<Vec<_>>();
        Self::from_entries(&entries)
    }

    pub fn from_entries(entries: &[CatalogEntry]) -> Result<Self, ConfigError> {
        if entries.is_empty() {
            return Err(ConfigError::EmptyCatalog);
        }

        let mut forms = Vec::<FormPattern>::with_capacity(entries.len());
        for entry in entries {
            let id = entry.id.trim();
            if id.is_empty() {
                return Err(ConfigError::EmptyIdentifier);
            }
            if forms.iter().any(|form| form.id == id) {
                return Err(ConfigError::DuplicateIdentifier(id.to_string()));
            }
            if entry.patterns.is_empty() {
                return Err(ConfigError::EmptyRules(id.to_string()));
            }

            let rules = entry
                .patterns
                .iter()
                .map(|spec| MatchRule::compile(id, spec, entry.case_insensitive))
                .collect::<Result<Vec<_>, _>>()?;
            forms.push(FormPattern {
                id: id.to_string(),
                rules,
            });
        }

        Ok(Self { forms })
    }

    pub fn from_json_str(raw: &str) -> anyhow::Result<Self> {
        let file: CatalogFile = serde_json::from_str(raw)?;
        Ok(Self::from_entries(&file.forms)?)
    }

    pub fn forms(&self) -> &[FormPattern] {
        &self.forms
    }

    pub fn contains(&self, form_id: &str) -> bool {
        self.forms.iter().any(|form| form.id == form_id)
    }

    pub fn len(&self) -> usize {
        self.forms.len()
    }
}
