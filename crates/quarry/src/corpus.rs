//! Corpus input for the indexing driver.
//!
//! Two corpus shapes feed the engine:
//!
//! - a plain stream of `(doc_id, text)` pairs, fed straight to
//!   `SearchEngine::build_index_from_docs`
//! - an enriched JSON array produced by the offline expansion jobs, where
//!   each record carries the original text, optional generated queries
//!   already folded into `text`, and an optional generated title
//!
//! For enriched records the indexed text is the title twice followed by the
//! body, so title terms outrank the same terms in running text. This is a
//! policy of the indexing driver; the core index still sees one text per
//! document.

use crate::engine::EngineError;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

/// One record of the enriched corpus file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CorpusDoc {
    #[serde(alias = "id")]
    pub doc_id: String,

    /// The document as it appears in the source corpus.
    pub original_text: String,

    /// Queries generated by the offline expansion job, if any.
    #[serde(default)]
    pub generated_queries: Vec<String>,

    /// Expanded text (original plus generated queries). Falls back to
    /// `original_text` when absent.
    #[serde(default)]
    pub text: Option<String>,

    /// Generated title, if the title job ran.
    #[serde(default)]
    pub title: Option<String>,
}

impl CorpusDoc {
    /// The text handed to both index builders.
    ///
    /// A present, non-empty title is prepended twice to boost title matches.
    pub fn indexing_text(&self) -> String {
        let body = self.text.as_deref().unwrap_or(&self.original_text);
        match self.title.as_deref() {
            Some(title) if !title.is_empty() => format!("{} {} {}", title, title, body),
            _ => body.to_string(),
        }
    }
}

/// Read an enriched corpus file (a JSON array of [`CorpusDoc`] records).
pub fn load_expanded_corpus(path: impl AsRef<Path>) -> Result<Vec<CorpusDoc>, EngineError> {
    let path = path.as_ref();
    let file = File::open(path)
        .map_err(|e| EngineError::Corpus(format!("{}: {}", path.display(), e)))?;
    serde_json::from_reader(BufReader::new(file))
        .map_err(|e| EngineError::Corpus(format!("{}: {}", path.display(), e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_indexing_text_doubles_title() {
        let doc = CorpusDoc {
            doc_id: "d1".to_string(),
            original_text: "body text".to_string(),
            generated_queries: Vec::new(),
            text: None,
            title: Some("Headline".to_string()),
        };
        assert_eq!(doc.indexing_text(), "Headline Headline body text");
    }

    #[test]
    fn test_indexing_text_prefers_expanded_text() {
        let doc = CorpusDoc {
            doc_id: "d1".to_string(),
            original_text: "original".to_string(),
            generated_queries: vec!["what is it".to_string()],
            text: Some("original what is it".to_string()),
            title: None,
        };
        assert_eq!(doc.indexing_text(), "original what is it");
    }

    #[test]
    fn test_empty_title_not_doubled() {
        let doc = CorpusDoc {
            doc_id: "d1".to_string(),
            original_text: "body".to_string(),
            generated_queries: Vec::new(),
            text: None,
            title: Some(String::new()),
        };
        assert_eq!(doc.indexing_text(), "body");
    }

    #[test]
    fn test_parse_enriched_record() {
        let json = r#"[{
            "doc_id": "wiki-7",
            "original_text": "some text",
            "generated_queries": ["q1", "q2"],
            "text": "some text q1 q2",
            "title": "Some Title"
        }, {
            "id": "wiki-8",
            "original_text": "bare record"
        }]"#;

        let docs: Vec<CorpusDoc> = serde_json::from_str(json).unwrap();
        assert_eq!(docs.len(), 2);
        assert_eq!(docs[0].doc_id, "wiki-7");
        assert_eq!(docs[0].generated_queries.len(), 2);
        assert_eq!(docs[1].doc_id, "wiki-8");
        assert!(docs[1].title.is_none());
        assert_eq!(docs[1].indexing_text(), "bare record");
    }

    #[test]
    fn test_load_missing_corpus_file() {
        let err = load_expanded_corpus("definitely/not/here.json").unwrap_err();
        assert!(matches!(err, EngineError::Corpus(_)));
    }
}
