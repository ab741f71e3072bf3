//! Per-program data tables: search keywords, relevance rules and cast names.
//!
//! These are domain data rather than logic, so they live in
//! `config/program.yaml` and are validated on load.

use std::collections::HashSet;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::ConfigError;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProgramProfile {
    pub name: String,
    /// Search keywords, queried sequentially in this order.
    pub keywords: Vec<String>,
    pub relevance: RelevanceRules,
    pub cast: CastTables,
}

/// What normalized title + summary text must contain to be kept.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RelevanceRules {
    /// Phrases matched with any internal whitespace, e.g. `나는솔로` also
    /// matches `나는 솔로`.
    pub phrases: Vec<String>,
    /// Tokens that must appear as a standalone word.
    #[serde(default)]
    pub tokens: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CastTables {
    /// Known cast nicknames, reported whenever they appear in the text.
    #[serde(default)]
    pub roster: Vec<String>,
    /// Suffixes marking a preceding 2-4 syllable Hangul name, e.g. `씨`.
    #[serde(default)]
    pub honorifics: Vec<String>,
}

/// Load and validate the program profile from a YAML file.
///
/// # Errors
///
/// Returns `ConfigError` if the file cannot be read, parsed, or fails validation.
pub fn load_program(path: &Path) -> Result<ProgramProfile, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ProgramFileIo {
        path: path.display().to_string(),
        source: e,
    })?;

    let program: ProgramProfile = serde_yaml::from_str(&content)?;
    validate_program(&program)?;
    Ok(program)
}

fn validate_program(program: &ProgramProfile) -> Result<(), ConfigError> {
    if program.name.trim().is_empty() {
        return Err(ConfigError::Validation(
            "program name must be non-empty".to_string(),
        ));
    }

    if program.keywords.is_empty() {
        return Err(ConfigError::Validation(format!(
            "program '{}' must declare at least one keyword",
            program.name
        )));
    }

    let mut seen = HashSet::new();
    for keyword in &program.keywords {
        if keyword.trim().is_empty() {
            return Err(ConfigError::Validation(
                "keywords must be non-empty".to_string(),
            ));
        }
        if !seen.insert(keyword.as_str()) {
            return Err(ConfigError::Validation(format!(
                "duplicate keyword: '{keyword}'"
            )));
        }
    }

    if program.relevance.phrases.is_empty() && program.relevance.tokens.is_empty() {
        return Err(ConfigError::Validation(
            "relevance rules need at least one phrase or token".to_string(),
        ));
    }

    if program
        .relevance
        .phrases
        .iter()
        .chain(&program.relevance.tokens)
        .any(|p| p.trim().is_empty())
    {
        return Err(ConfigError::Validation(
            "relevance phrases and tokens must be non-empty".to_string(),
        ));
    }

    if program.cast.honorifics.iter().any(|h| h.trim().is_empty()) {
        return Err(ConfigError::Validation(
            "honorifics must be non-empty".to_string(),
        ));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> ProgramProfile {
        ProgramProfile {
            name: "나는솔로".to_string(),
            keywords: vec!["나는솔로".to_string(), "나솔".to_string()],
            relevance: RelevanceRules {
                phrases: vec!["나는솔로".to_string()],
                tokens: vec!["나솔".to_string()],
            },
            cast: CastTables {
                roster: vec!["영수".to_string()],
                honorifics: vec!["씨".to_string()],
            },
        }
    }

    #[test]
    fn validate_accepts_sample() {
        assert!(validate_program(&sample()).is_ok());
    }

    #[test]
    fn validate_rejects_duplicate_keyword() {
        let mut program = sample();
        program.keywords.push("나솔".to_string());
        let err = validate_program(&program).unwrap_err();
        assert!(err.to_string().contains("duplicate keyword"));
    }

    #[test]
    fn validate_rejects_missing_relevance_rules() {
        let mut program = sample();
        program.relevance.phrases.clear();
        program.relevance.tokens.clear();
        let err = validate_program(&program).unwrap_err();
        assert!(err.to_string().contains("at least one phrase or token"));
    }

    #[test]
    fn validate_rejects_empty_keyword_list() {
        let mut program = sample();
        program.keywords.clear();
        assert!(validate_program(&program).is_err());
    }

    #[test]
    fn load_program_from_real_file() {
        let path = Path::new(env!("CARGO_MANIFEST_DIR"))
            .join("..")
            .join("..")
            .join("config")
            .join("program.yaml");
        let program = load_program(&path).expect("program.yaml should load");
        assert_eq!(
            program.keywords,
            vec!["나는솔로", "나는 솔로", "나솔"],
            "keyword order drives search order"
        );
        assert!(program.cast.roster.contains(&"영수".to_string()));
        assert_eq!(program.cast.honorifics, vec!["씨", "님"]);
    }
}
