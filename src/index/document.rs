use crate::error::{Result, SearchError};
use crate::index::schema::Schema;
use crate::types::Record;
use serde_json::Value;
use tantivy::schema::OwnedValue;
use tantivy::TantivyDocument;

/// Collect every string value in `value`, depth first, in document order.
///
/// Keys are skipped, and so are numbers, booleans and nulls: only text is
/// matched by wildcard terms.
pub fn flatten_text(value: &Value) -> Vec<&str> {
    let mut out = Vec::new();
    collect_text(value, &mut out);
    out
}

fn collect_text<'a>(value: &'a Value, out: &mut Vec<&'a str>) {
    match value {
        Value::String(s) if !s.is_empty() => out.push(s),
        Value::Array(items) => {
            for item in items {
                collect_text(item, out);
            }
        }
        Value::Object(map) => {
            for item in map.values() {
                collect_text(item, out);
            }
        }
        _ => {}
    }
}

/// Converts records into tantivy documents and back to IDs.
pub struct DocumentConverter {
    schema: Schema,
}

impl DocumentConverter {
    pub fn new(schema: Schema) -> Self {
        DocumentConverter { schema }
    }

    /// Build the tantivy document for `record`, returning it with the number
    /// of text bytes it carries.
    pub fn to_tantivy(&self, record: &Record) -> Result<(TantivyDocument, usize)> {
        if record.id.is_empty() {
            return Err(SearchError::InvalidDocument(
                "record has an empty id".to_string(),
            ));
        }
        if !record.body.is_object() {
            return Err(SearchError::InvalidDocument(format!(
                "record {} body is not a JSON object",
                record.id
            )));
        }

        let mut doc = TantivyDocument::new();
        doc.add_text(self.schema.id, &record.id);

        let mut size = 0;
        for text in flatten_text(&record.body) {
            size += text.len();
            doc.add_text(self.schema.text, text);
        }
        Ok((doc, size))
    }

    pub fn id_of(&self, doc: &TantivyDocument) -> Result<String> {
        doc.get_first(self.schema.id)
            .and_then(|v| {
                let owned: OwnedValue = v.into();
                match owned {
                    OwnedValue::Str(s) => Some(s),
                    _ => None,
                }
            })
            .ok_or_else(|| SearchError::InvalidDocument("stored document has no _id".to_string()))
    }
}
