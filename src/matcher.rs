use serde::Serialize;

use crate::catalog::PatternCatalog;
use crate::segment::Region;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchPass {
    TitleZone,
    FullText,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FormDetection {
    pub form_id: String,
    pub page_index: usize,
    pub pass: MatchPass,
}

/// Identifiers whose rules match `text`, in catalog order.
pub fn match_text<'c>(catalog: &'c PatternCatalog, text: &str) -> Vec<&'c str> {
    if text.trim().is_empty() {
        return Vec::new();
    }

    catalog
        .forms()
        .iter()
        .filter(|form| form.is_match(text))
        .map(|form| form.id.as_str())
        .collect()
}

/// Title zone first; the full page text is only consulted when the title zone
/// matches nothing.
pub fn match_region(catalog: &PatternCatalog, region: &Region<'_>) -> Vec<FormDetection> {
    let (matched, pass) = match match_text(catalog, &region.title_zone) {
        matched if !matched.is_empty() => (matched, MatchPass::TitleZone),
        _ => (match_text(catalog, region.full_text), MatchPass::FullText),
    };

    matched
        .into_iter()
        .map(|form_id| FormDetection {
            form_id: form_id.to_string(),
            page_index: region.page_index,
            pass,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{CatalogEntry, RuleSpec};

    fn region<'p>(title_zone: &str, full_text: &'p str) -> Region<'p> {
        Region {
            page_index: 3,
            title_zone: title_zone.to_string(),
            full_text,
        }
    }

    #[test]
    fn title_zone_match_skips_fallback() {
        let catalog = PatternCatalog::builtin().unwrap();
        let detections = match_region(
            &catalog,
            &region("Form 8949", "Form 8949 ... see Schedule D (Form 1040)"),
        );

        assert_eq!(detections.len(), 1);
        assert_eq!(detections[0].form_id, "f8949");
        assert_eq!(detections[0].page_index, 3);
        assert_eq!(detections[0].pass, MatchPass::TitleZone);
    }

    #[test]
    fn empty_title_zone_falls_back_to_full_text() {
        let catalog = PatternCatalog::builtin().unwrap();
        let detections = match_region(
            &catalog,
            &region("", "Department of the Treasury\nForm 8889 Health Savings Accounts"),
        );

        assert_eq!(detections.len(), 1);
        assert_eq!(detections[0].form_id, "f8889");
        assert_eq!(detections[0].pass, MatchPass::FullText);
    }

    #[test]
    fn ambiguous_title_returns_every_match_in_catalog_order() {
        let catalog = PatternCatalog::from_entries(&[
            CatalogEntry {
                id: "f1040sd".to_string(),
                patterns: vec![RuleSpec::Regex(r"SCHEDULE\s+D\b".to_string())],
                case_insensitive: true,
            },
            CatalogEntry {
                id: "capital-gains".to_string(),
                patterns: vec![RuleSpec::Literal("Capital Gains and Losses".to_string())],
                case_insensitive: true,
            },
        ])
        .unwrap();
        let detections = match_region(
            &catalog,
            &region("SCHEDULE D\n(Form 1040)\nCapital Gains and Losses", ""),
        );

        let ids = detections
            .iter()
            .map(|detection| detection.form_id.as_str())
            .collect::<Vec<_>>();
        assert_eq!(ids, vec!["f1040sd", "capital-gains"]);
    }

    #[test]
    fn schedule_title_does_not_also_match_form_1040() {
        let catalog = PatternCatalog::builtin().unwrap();
        let detections = match_region(&catalog, &region("SCHEDULE 1\n(Form 1040)", ""));
        assert_eq!(detections.len(), 1);
        assert_eq!(detections[0].form_id, "f1040s1");
    }

    #[test]
    fn no_match_is_an_empty_result() {
        let catalog = PatternCatalog::builtin().unwrap();
        assert!(match_region(&catalog, &region("Statement 1", "Attachment")).is_empty());
        assert!(match_text(&catalog, "   ").is_empty());
    }
}
