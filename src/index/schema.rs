use crate::error::{Result, SearchError};
use tantivy::schema::{Field, IndexRecordOption, Schema as TantivySchema, TextFieldIndexing, TextOptions};
use tantivy::tokenizer::{LowerCaser, SimpleTokenizer, TextAnalyzer};

pub const ID_FIELD: &str = "_id";
pub const TEXT_FIELD: &str = "_text";
pub const TOKENIZER: &str = "simple";

/// Resolved field handles for one index.
#[derive(Debug, Clone, Copy)]
pub struct Schema {
    pub id: Field,
    pub text: Field,
}

impl Schema {
    /// Build the tantivy schema shared by every formula and job index.
    ///
    /// `_id` is a raw stored term used for upsert/delete; `_text` holds every
    /// string value of the record, lower-cased and split on non-alphanumerics.
    pub fn to_tantivy() -> TantivySchema {
        let mut builder = TantivySchema::builder();

        builder.add_text_field(
            ID_FIELD,
            tantivy::schema::STRING | tantivy::schema::STORED | tantivy::schema::FAST,
        );

        let text_indexing = TextFieldIndexing::default()
            .set_tokenizer(TOKENIZER)
            .set_index_option(IndexRecordOption::WithFreqsAndPositions);
        builder.add_text_field(
            TEXT_FIELD,
            TextOptions::default().set_indexing_options(text_indexing),
        );

        builder.build()
    }

    pub fn resolve(tantivy_schema: &TantivySchema) -> Result<Self> {
        Ok(Schema {
            id: get_field(tantivy_schema, ID_FIELD)?,
            text: get_field(tantivy_schema, TEXT_FIELD)?,
        })
    }
}

fn get_field(tantivy_schema: &TantivySchema, name: &str) -> Result<Field> {
    tantivy_schema
        .get_field(name)
        .map_err(|_| SearchError::Tantivy(format!("field {} missing from schema", name)))
}

/// The analyzer used both when indexing `_text` and when splitting query terms.
pub fn text_analyzer() -> TextAnalyzer {
    TextAnalyzer::builder(SimpleTokenizer::default())
        .filter(LowerCaser)
        .build()
}

pub fn register_tokenizers(index: &tantivy::Index) {
    index.tokenizers().register(TOKENIZER, text_analyzer());
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_schema_resolves_both_fields() {
        let tantivy_schema = Schema::to_tantivy();
        let schema = Schema::resolve(&tantivy_schema).unwrap();
        assert_ne!(schema.id, schema.text);
        assert!(tantivy_schema.get_field_entry(schema.id).is_stored());
        assert!(!tantivy_schema.get_field_entry(schema.text).is_stored());
    }

    #[test]
    fn test_analyzer_lowercases_and_splits() {
        let mut analyzer = text_analyzer();
        let mut stream = analyzer.token_stream("Test-Name Blue42");
        let mut tokens = Vec::new();
        while stream.advance() {
            tokens.push(stream.token().text.clone());
        }
        assert_eq!(tokens, vec!["test", "name", "blue42"]);
    }
}
