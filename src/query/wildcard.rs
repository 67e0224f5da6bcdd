use crate::error::Result;
use std::collections::BTreeSet;
use tantivy::query::{BooleanQuery, Occur, Query, RegexQuery, TermSetQuery};
use tantivy::schema::Field;
use tantivy::{Searcher, TantivyError, Term};

/// Longest token compiled into a `.*term.*` regex.
///
/// Tantivy caps regex automata at 1000 states, which a token of a few
/// hundred characters exceeds. Longer tokens are matched by scanning the
/// term dictionary instead.
pub const MAX_PATTERN_CHARS: usize = 100;

/// Matches any indexed token that contains `term` anywhere (`*term*`).
pub struct WildcardQueryBuilder {
    field: Field,
    term: String,
}

impl WildcardQueryBuilder {
    pub fn new(field: Field, term: String) -> Self {
        WildcardQueryBuilder { field, term }
    }

    pub fn pattern(&self) -> String {
        format!(".*{}.*", regex::escape(&self.term))
    }

    pub fn uses_term_scan(&self) -> bool {
        self.term.chars().count() > MAX_PATTERN_CHARS
    }

    /// Build the clause against `searcher`'s generation.
    ///
    /// Returns `None` when the token cannot match any indexed term.
    pub fn build(self, searcher: &Searcher) -> Result<Option<Box<dyn Query>>> {
        if !self.uses_term_scan() {
            return Ok(Some(Box::new(RegexQuery::from_pattern(
                &self.pattern(),
                self.field,
            )?)));
        }

        let terms = terms_containing(searcher, self.field, &self.term)?;
        if terms.is_empty() {
            return Ok(None);
        }
        Ok(Some(Box::new(TermSetQuery::new(
            terms
                .iter()
                .map(|text| Term::from_field_text(self.field, text)),
        ))))
    }
}

/// Every distinct indexed term of `field` that contains `needle`.
fn terms_containing(searcher: &Searcher, field: Field, needle: &str) -> Result<BTreeSet<String>> {
    let mut found = BTreeSet::new();
    for segment in searcher.segment_readers() {
        let inverted = segment.inverted_index(field)?;
        let mut stream = inverted.terms().stream().map_err(TantivyError::from)?;
        while stream.advance() {
            let key = stream.key();
            if key.len() < needle.len() {
                continue;
            }
            if let Ok(text) = std::str::from_utf8(key) {
                if text.contains(needle) {
                    found.insert(text.to_string());
                }
            }
        }
    }
    Ok(found)
}

/// AND together one wildcard clause per token.
///
/// Returns `None` when nothing can match: an empty token list (no terms
/// matches nothing, rather than everything) or a token absent from every
/// indexed term.
pub fn conjunctive_query(
    searcher: &Searcher,
    field: Field,
    tokens: &[String],
) -> Result<Option<Box<dyn Query>>> {
    if tokens.is_empty() {
        return Ok(None);
    }

    let mut clauses: Vec<(Occur, Box<dyn Query>)> = Vec::with_capacity(tokens.len());
    for token in tokens {
        match WildcardQueryBuilder::new(field, token.clone()).build(searcher)? {
            Some(clause) => clauses.push((Occur::Must, clause)),
            None => return Ok(None),
        }
    }

    Ok(Some(Box::new(BooleanQuery::new(clauses))))
}
