//! Cast-member mention extraction.

use nasol_core::CastTables;
use regex::Regex;

use crate::error::IngestError;

#[derive(Debug, Clone)]
pub struct CastExtractor {
    roster: Vec<String>,
    /// 2-4 Hangul syllables followed by an honorific, e.g. `영수 씨`.
    honorific_re: Option<Regex>,
}

impl CastExtractor {
    /// Compiles the honorific pattern from the configured tables.
    ///
    /// # Errors
    ///
    /// Returns [`IngestError::Config`] if the honorific pattern fails to compile.
    pub fn new(tables: &CastTables) -> Result<Self, IngestError> {
        let honorific_re = if tables.honorifics.is_empty() {
            None
        } else {
            let alternatives = tables
                .honorifics
                .iter()
                .map(|h| regex::escape(h.trim()))
                .collect::<Vec<_>>()
                .join("|");
            let re = Regex::new(&format!(r"([가-힣]{{2,4}})\s*(?:{alternatives})")).map_err(
                |e| {
                    IngestError::Config(nasol_core::ConfigError::Validation(format!(
                        "invalid honorific pattern: {e}"
                    )))
                },
            )?;
            Some(re)
        };

        Ok(Self {
            roster: tables.roster.clone(),
            honorific_re,
        })
    }

    /// Names mentioned in `text`, deduplicated, in order of first appearance.
    #[must_use]
    pub fn extract(&self, text: &str) -> Vec<String> {
        let mut hits: Vec<(usize, &str)> = self
            .roster
            .iter()
            .filter_map(|name| text.find(name.as_str()).map(|pos| (pos, name.as_str())))
            .collect();

        if let Some(re) = &self.honorific_re {
            hits.extend(
                re.captures_iter(text)
                    .filter_map(|c| c.get(1))
                    .map(|m| (m.start(), m.as_str())),
            );
        }

        hits.sort_by_key(|(pos, _)| *pos);

        let mut names: Vec<String> = Vec::with_capacity(hits.len());
        for (_, name) in hits {
            if !names.iter().any(|n| n == name) {
                names.push(name.to_string());
            }
        }
        names
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn extractor() -> CastExtractor {
        CastExtractor::new(&CastTables {
            roster: vec!["영수".to_string(), "옥순".to_string(), "광수".to_string()],
            honorifics: vec!["씨".to_string(), "님".to_string()],
        })
        .expect("valid tables")
    }

    #[test]
    fn finds_roster_names_in_order_of_appearance() {
        let names = extractor().extract("나는솔로 27기 옥순, 영수와 데이트");
        assert_eq!(names, vec!["옥순", "영수"]);
    }

    #[test]
    fn finds_honorific_names() {
        let names = extractor().extract("제작진은 김철수 씨와 박지민님을 만났다");
        assert_eq!(names, vec!["김철수", "박지민"]);
    }

    #[test]
    fn deduplicates_repeated_mentions() {
        let names = extractor().extract("영수 근황, 영수씨 인터뷰");
        assert_eq!(names, vec!["영수"]);
    }

    #[test]
    fn empty_tables_find_nothing() {
        let e = CastExtractor::new(&CastTables {
            roster: vec![],
            honorifics: vec![],
        })
        .unwrap();
        assert!(e.extract("영수씨 근황").is_empty());
    }
}
