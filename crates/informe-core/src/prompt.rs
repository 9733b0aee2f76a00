use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::display::DisplaySubset;
use crate::error::InformeError;
use crate::model::SourceKind;

const PROMPTS_JSON: &str = include_str!("../templates/prompts.json");

const CONTENT_SLOT: &str = "{content}";
const CONTEXT_SLOT: &str = "{context}";

/// Audience the report is written for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AnalysisLevel {
    SiteLead,
    Manager,
    Director,
    General,
}

impl AnalysisLevel {
    pub const ALL: [AnalysisLevel; 4] = [
        AnalysisLevel::SiteLead,
        AnalysisLevel::Manager,
        AnalysisLevel::Director,
        AnalysisLevel::General,
    ];

    /// Label shown to users.
    pub fn label(&self) -> &'static str {
        match self {
            AnalysisLevel::SiteLead => "Jefe de Site",
            AnalysisLevel::Manager => "Gerente",
            AnalysisLevel::Director => "Director",
            AnalysisLevel::General => "General",
        }
    }
}

impl fmt::Display for AnalysisLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AnalysisLevel::SiteLead => write!(f, "site-lead"),
            AnalysisLevel::Manager => write!(f, "manager"),
            AnalysisLevel::Director => write!(f, "director"),
            AnalysisLevel::General => write!(f, "general"),
        }
    }
}

impl FromStr for AnalysisLevel {
    type Err = InformeError;

    /// Accepts the identifier (`site-lead`) or the user-facing label (`Jefe de Site`).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        AnalysisLevel::ALL
            .into_iter()
            .find(|level| {
                level.to_string().eq_ignore_ascii_case(wanted) || level.label().eq_ignore_ascii_case(wanted)
            })
            .ok_or_else(|| {
                InformeError::TemplateInvalid(format!(
                    "unknown analysis level '{wanted}'. Available: site-lead, manager, director, general"
                ))
            })
    }
}

/// Which kind of content a template embeds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TemplateFamily {
    /// The rendered display table.
    Tabular,
    /// The single extracted text cell.
    Text,
}

impl fmt::Display for TemplateFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TemplateFamily::Tabular => write!(f, "tabular"),
            TemplateFamily::Text => write!(f, "text"),
        }
    }
}

impl TemplateFamily {
    /// `None` for the `none` kind, which has nothing to prompt with.
    pub fn for_kind(kind: SourceKind) -> Option<TemplateFamily> {
        match kind {
            SourceKind::None => None,
            k if k.is_tabular() => Some(TemplateFamily::Tabular),
            _ => Some(TemplateFamily::Text),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PromptTemplate {
    pub family: TemplateFamily,
    pub level: AnalysisLevel,
    /// Body with a `{content}` slot.
    pub text: String,
}

/// The full template table: one template per family and level, plus the
/// shared closing instructions.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PromptTable {
    pub version: String,
    /// Formatting instructions appended to every prompt.
    pub closing: String,
    /// Line with a `{context}` slot, added when the user supplies context.
    pub context: String,
    pub templates: Vec<PromptTemplate>,
}

/// Load the built-in template table.
pub fn load_templates() -> Result<PromptTable, InformeError> {
    let table: PromptTable = serde_json::from_str(PROMPTS_JSON)?;
    table.validate()?;
    Ok(table)
}

impl PromptTable {
    /// Every family/level pair must have exactly one template with a content slot.
    pub fn validate(&self) -> Result<(), InformeError> {
        for family in [TemplateFamily::Tabular, TemplateFamily::Text] {
            for level in AnalysisLevel::ALL {
                let matching: Vec<&PromptTemplate> = self
                    .templates
                    .iter()
                    .filter(|t| t.family == family && t.level == level)
                    .collect();
                match matching.as_slice() {
                    [template] if template.text.contains(CONTENT_SLOT) => {}
                    [_] => {
                        return Err(InformeError::TemplateInvalid(format!(
                            "template {family}/{level} has no {CONTENT_SLOT} slot"
                        )))
                    }
                    [] => {
                        return Err(InformeError::TemplateInvalid(format!(
                            "missing template {family}/{level}"
                        )))
                    }
                    _ => {
                        return Err(InformeError::TemplateInvalid(format!(
                            "duplicate template {family}/{level}"
                        )))
                    }
                }
            }
        }
        if !self.context.contains(CONTEXT_SLOT) {
            return Err(InformeError::TemplateInvalid(format!(
                "context line has no {CONTEXT_SLOT} slot"
            )));
        }
        Ok(())
    }

    pub fn template(&self, family: TemplateFamily, level: AnalysisLevel) -> Option<&PromptTemplate> {
        self.templates
            .iter()
            .find(|t| t.family == family && t.level == level)
    }

    /// Assemble the prompt for `display` at `level`.
    ///
    /// Tabular sources embed the rendered table; text sources embed the
    /// extracted text. Blank context is ignored.
    pub fn build(
        &self,
        display: &DisplaySubset,
        level: AnalysisLevel,
        context: Option<&str>,
    ) -> Result<String, InformeError> {
        let family = TemplateFamily::for_kind(display.source_kind()).ok_or(InformeError::NoInput)?;
        let template = self.template(family, level).ok_or_else(|| {
            InformeError::TemplateInvalid(format!("missing template {family}/{level}"))
        })?;

        let content = match family {
            TemplateFamily::Tabular => display.render(),
            TemplateFamily::Text => match display.table().text_content() {
                Some(text) => text.to_string(),
                None => display.render(),
            },
        };

        let mut prompt = template.text.replace(CONTENT_SLOT, &content);
        if let Some(context) = context.map(str::trim).filter(|c| !c.is_empty()) {
            prompt.push('\n');
            prompt.push_str(&self.context.replace(CONTEXT_SLOT, context));
        }
        prompt.push('\n');
        prompt.push_str(&self.closing);

        debug!(%family, %level, chars = prompt.len(), "assembled prompt");
        Ok(prompt)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{TabularResult, Value};
    use rust_decimal_macros::dec;

    #[test]
    fn test_builtin_templates_are_complete() {
        let table = load_templates().unwrap();
        assert_eq!(table.templates.len(), 8);
    }

    #[test]
    fn test_level_from_str() {
        assert_eq!("site-lead".parse::<AnalysisLevel>().unwrap(), AnalysisLevel::SiteLead);
        assert_eq!("Gerente".parse::<AnalysisLevel>().unwrap(), AnalysisLevel::Manager);
        assert_eq!(" DIRECTOR ".parse::<AnalysisLevel>().unwrap(), AnalysisLevel::Director);
        assert!("ceo".parse::<AnalysisLevel>().is_err());
    }

    #[test]
    fn test_tabular_prompt_embeds_table() {
        let templates = load_templates().unwrap();
        let display = DisplaySubset::new(TabularResult::from_rows(
            SourceKind::DelimitedText,
            vec!["region".into(), "ventas".into()],
            vec![vec![Value::Text("Norte".into()), Value::Number(dec!(120))]],
        ));
        let prompt = templates
            .build(&display, AnalysisLevel::Manager, Some("  "))
            .unwrap();
        assert!(prompt.contains("datos presentes en el archivo"));
        assert!(prompt.contains("0   Norte     120"));
        assert!(!prompt.contains("Contexto adicional"));
        assert!(prompt.ends_with("Subtítulo 3: [Subtítulo 3]"));
    }

    #[test]
    fn test_text_prompt_embeds_text_and_context() {
        let templates = load_templates().unwrap();
        let display = DisplaySubset::new(TabularResult::single_text(
            SourceKind::WebPage,
            "Resultados del trimestre".into(),
        ));
        let prompt = templates
            .build(&display, AnalysisLevel::General, Some("Foco en la zona norte"))
            .unwrap();
        assert!(prompt.contains("contenido del texto: Resultados del trimestre."));
        assert!(prompt.contains("Contexto adicional proporcionado por el usuario: Foco en la zona norte"));
    }

    #[test]
    fn test_none_has_no_prompt() {
        let templates = load_templates().unwrap();
        let display = DisplaySubset::new(TabularResult::none());
        assert!(matches!(
            templates.build(&display, AnalysisLevel::General, None).unwrap_err(),
            InformeError::NoInput
        ));
    }

    #[test]
    fn test_validate_rejects_missing_slot() {
        let mut table = load_templates().unwrap();
        table.templates[0].text = "sin contenido".into();
        assert!(matches!(table.validate().unwrap_err(), InformeError::TemplateInvalid(_)));
    }
}
