pub mod budget;
pub mod document;
pub mod registry;
pub mod schema;

use crate::error::{Result, SearchError};
use crate::query::wildcard::conjunctive_query;
use crate::types::{Record, RecordId};
use budget::{WriterBudget, WriterGuard};
use document::DocumentConverter;
use schema::Schema;
use std::sync::{Arc, Mutex};
use tantivy::collector::DocSetCollector;
use tantivy::{DocAddress, Index as TantivyIndex, IndexReader, IndexWriter, TantivyDocument, Term};

/// Outcome of a bulk load into a fresh index.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LoadStats {
    pub indexed: usize,
    pub skipped: usize,
}

/// Run blocking index work (writer creation, commit, reload) on tokio's
/// blocking pool.
pub(crate) async fn run_blocking<T, F>(work: F) -> Result<T>
where
    T: Send + 'static,
    F: FnOnce() -> Result<T> + Send + 'static,
{
    tokio::task::spawn_blocking(work)
        .await
        .map_err(|e| SearchError::Tantivy(format!("index task failed: {}", e)))?
}

/// One memory-only full-text index holding the records of a single tenant
/// and kind.
///
/// Readers never block: queries run against the searcher of the last
/// committed generation. Writers are serialized per index and each mutation
/// is committed and made visible before the call returns, so a query sees a
/// document either in its previous or its new state.
pub struct TenantIndex {
    inner: TantivyIndex,
    reader: IndexReader,
    schema: Schema,
    converter: DocumentConverter,
    budget: Arc<WriterBudget>,
    write_lock: Mutex<()>,
}

impl TenantIndex {
    /// Create a blank, empty index in RAM.
    pub fn create(budget: Arc<WriterBudget>) -> Result<Self> {
        let tantivy_schema = Schema::to_tantivy();
        let inner = TantivyIndex::create_in_ram(tantivy_schema.clone());
        schema::register_tokenizers(&inner);

        let reader = inner
            .reader_builder()
            .reload_policy(tantivy::ReloadPolicy::Manual)
            .try_into()?;

        let schema = Schema::resolve(&tantivy_schema)?;
        Ok(TenantIndex {
            inner,
            reader,
            schema,
            converter: DocumentConverter::new(schema),
            budget,
            write_lock: Mutex::new(()),
        })
    }

    fn writer(&self) -> Result<(WriterGuard, IndexWriter)> {
        let guard = self.budget.acquire_writer();
        let writer: IndexWriter = self
            .inner
            .writer_with_num_threads(1, self.budget.writer_heap_bytes())?;

        let mut merge_policy = tantivy::merge_policy::LogMergePolicy::default();
        merge_policy.set_del_docs_ratio_before_merge(0.3);
        writer.set_merge_policy(Box::new(merge_policy));
        Ok((guard, writer))
    }

    fn document_for(&self, record: &Record) -> Result<TantivyDocument> {
        let (doc, size) = self.converter.to_tantivy(record)?;
        self.budget.validate_document_size(size)?;
        Ok(doc)
    }

    fn commit(&self, mut writer: IndexWriter) -> Result<()> {
        writer.commit()?;
        writer.wait_merging_threads()?;
        self.reader.reload()?;
        Ok(())
    }

    /// Insert `record`, replacing any document with the same ID.
    pub fn upsert(&self, record: &Record) -> Result<()> {
        let doc = self.document_for(record)?;
        let _lock = self.write_lock.lock().unwrap_or_else(|e| e.into_inner());
        let (_guard, writer) = self.writer()?;
        writer.delete_term(Term::from_field_text(self.schema.id, &record.id));
        writer.add_document(doc)?;
        self.commit(writer)
    }

    /// Remove the document for `id`. Removing an absent ID is a no-op.
    pub fn delete(&self, id: &str) -> Result<()> {
        let _lock = self.write_lock.lock().unwrap_or_else(|e| e.into_inner());
        let (_guard, writer) = self.writer()?;
        writer.delete_term(Term::from_field_text(self.schema.id, id));
        self.commit(writer)
    }

    /// Index every record in one commit.
    ///
    /// A record that cannot be converted is logged and left out; only writer
    /// or commit failures abort the load.
    pub fn load(&self, records: Vec<Record>) -> Result<LoadStats> {
        let _lock = self.write_lock.lock().unwrap_or_else(|e| e.into_inner());
        let (_guard, writer) = self.writer()?;
        let mut stats = LoadStats::default();

        for record in &records {
            match self.document_for(record) {
                Ok(doc) => {
                    writer.delete_term(Term::from_field_text(self.schema.id, &record.id));
                    writer.add_document(doc)?;
                    stats.indexed += 1;
                }
                Err(e) => {
                    tracing::warn!(record_id = %record.id, error = %e, "[INDEX] skipping record");
                    stats.skipped += 1;
                }
            }
        }

        self.commit(writer)?;
        Ok(stats)
    }

    /// Return the IDs of documents matching every term as a substring.
    ///
    /// Terms go through the same analyzer as indexed text; a term that
    /// splits into several tokens requires all of them. No usable tokens, or
    /// a token found in no indexed term, yields an empty result.
    pub fn query(&self, terms: &[String], limit: Option<usize>) -> Result<Vec<RecordId>> {
        let mut analyzer = self.inner.tokenizer_for_field(self.schema.text)?;
        let mut tokens = Vec::new();
        for term in terms {
            let mut stream = analyzer.token_stream(term);
            while stream.advance() {
                tokens.push(stream.token().text.clone());
            }
        }

        let searcher = self.reader.searcher();
        let query = match conjunctive_query(&searcher, self.schema.text, &tokens)? {
            Some(q) => q,
            None => return Ok(Vec::new()),
        };

        let mut hits: Vec<DocAddress> = searcher
            .search(query.as_ref(), &DocSetCollector)?
            .into_iter()
            .collect();
        hits.sort();
        if let Some(limit) = limit {
            hits.truncate(limit);
        }

        hits.into_iter()
            .map(|address| {
                let doc: TantivyDocument = searcher.doc(address)?;
                self.converter.id_of(&doc)
            })
            .collect()
    }

    /// Number of live documents in the last committed generation.
    pub fn num_docs(&self) -> u64 {
        self.reader.searcher().num_docs()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::collections::HashSet;

    fn index() -> TenantIndex {
        TenantIndex::create(Arc::new(WriterBudget::default())).unwrap()
    }

    fn ids(found: Vec<RecordId>) -> HashSet<String> {
        found.into_iter().collect()
    }

    fn terms(phrase: &str) -> Vec<String> {
        crate::query::sanitizer::terms(phrase)
    }

    #[test]
    fn test_new_index_is_empty() {
        let index = index();
        assert_eq!(index.num_docs(), 0);
        assert!(index.query(&terms("anything"), None).unwrap().is_empty());
    }

    #[test]
    fn test_upsert_overwrites_same_id() {
        let index = index();
        index
            .upsert(&Record::new("a", json!({"name": "old teal"})))
            .unwrap();
        index
            .upsert(&Record::new("a", json!({"name": "new navy"})))
            .unwrap();

        assert_eq!(index.num_docs(), 1);
        assert!(index.query(&terms("teal"), None).unwrap().is_empty());
        assert_eq!(index.query(&terms("navy"), None).unwrap(), vec!["a"]);
    }

    #[test]
    fn test_delete_missing_id_is_noop() {
        let index = index();
        index.upsert(&Record::new("a", json!({"name": "x"}))).unwrap();
        index.delete("nope").unwrap();
        assert_eq!(index.num_docs(), 1);
        index.delete("a").unwrap();
        assert_eq!(index.num_docs(), 0);
    }

    #[test]
    fn test_substring_anywhere_in_token() {
        let index = index();
        index
            .upsert(&Record::new("f1", json!({"name": "testformula"})))
            .unwrap();
        for phrase in ["test", "form", "ula", "TESTFORMULA"] {
            assert_eq!(index.query(&terms(phrase), None).unwrap(), vec!["f1"], "{phrase}");
        }
        assert!(index.query(&terms("formulas"), None).unwrap().is_empty());
    }

    #[test]
    fn test_conjunctive_match() {
        let index = index();
        index
            .load(vec![
                Record::new("A", json!({"name": "red apple"})),
                Record::new("B", json!({"name": "red car"})),
            ])
            .unwrap();

        assert_eq!(ids(index.query(&terms("red apple"), None).unwrap()), ids(vec!["A".into()]));
        assert_eq!(
            ids(index.query(&terms("red"), None).unwrap()),
            ids(vec!["A".into(), "B".into()])
        );
    }

    #[test]
    fn test_terms_may_match_different_fields() {
        let index = index();
        index
            .upsert(&Record::new("j1", json!({"name": "kitchen", "city": "portland"})))
            .unwrap();
        assert_eq!(index.query(&terms("kitch port"), None).unwrap(), vec!["j1"]);
    }

    #[test]
    fn test_load_skips_bad_records() {
        let budget = Arc::new(WriterBudget::new(15_000_000, 4, 8));
        let index = TenantIndex::create(budget).unwrap();
        let stats = index
            .load(vec![
                Record::new("small", json!({"name": "tiny"})),
                Record::new("big", json!({"name": "far too long for the limit"})),
                Record::new("scalar", json!(42)),
            ])
            .unwrap();

        assert_eq!(stats, LoadStats { indexed: 1, skipped: 2 });
        assert_eq!(index.num_docs(), 1);
    }

    #[test]
    fn test_limit_truncates() {
        let index = index();
        index
            .load(
                (0..5)
                    .map(|i| Record::new(format!("r{i}"), json!({"name": "shared"})))
                    .collect(),
            )
            .unwrap();
        assert_eq!(index.query(&terms("shared"), Some(2)).unwrap().len(), 2);
        assert_eq!(index.query(&terms("shared"), None).unwrap().len(), 5);
    }

    #[test]
    fn test_very_long_terms_never_error() {
        let index = index();
        let long_word = format!("pre{}post", "z".repeat(600));
        index
            .load(vec![
                Record::new("long", json!({"notes": long_word})),
                Record::new("plain", json!({"name": "teal"})),
            ])
            .unwrap();

        let needle = "z".repeat(500);
        assert_eq!(ids(index.query(&terms(&needle), None).unwrap()), ids(vec!["long".into()]));
        assert!(index.query(&terms(&"a".repeat(1000)), None).unwrap().is_empty());
        assert!(index
            .query(&terms(&format!("teal {}", "q".repeat(20_000))), None)
            .unwrap()
            .is_empty());
    }
}
