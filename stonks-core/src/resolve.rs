//! Company-name normalization and symbol resolution.
//!
//! Free text is reduced to a lookup key, checked against a small alias
//! table, and otherwise sent to a `SymbolResolver`. The first candidate
//! that is not a share-class listing wins; resolver ranking is taken as-is.

use std::collections::BTreeMap;

use crate::data::{DataError, SymbolMatch, SymbolResolver};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ResolveError {
    #[error("symbol not found for '{query}'")]
    NoMatch { query: String },

    #[error("symbol search failed: {0}")]
    Upstream(#[from] DataError),
}

/// Outcome of resolving a company name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedSymbol {
    pub symbol: String,
    pub display_name: Option<String>,
    /// True when an alias answered without a resolver call.
    pub via_alias: bool,
}

/// Reduce free text to a lookup key.
///
/// Drops periods, commas and apostrophes, removes every case-insensitive
/// " inc", removes whitespace, then lowercases.
pub fn normalize_company_name(raw: &str) -> String {
    let stripped: String = raw
        .chars()
        .filter(|c| !matches!(c, '.' | ',' | '\'' | '\u{2019}'))
        .collect::<String>()
        .to_lowercase();
    stripped
        .replace(" inc", "")
        .chars()
        .filter(|c| !c.is_whitespace())
        .collect()
}

/// Normalize a ticker typed directly by the user.
pub fn normalize_ticker(raw: &str) -> Option<String> {
    let ticker = raw.trim().to_uppercase();
    (!ticker.is_empty()).then_some(ticker)
}

/// Resolves company names through aliases first, then a resolver.
#[derive(Debug, Clone, Default)]
pub struct NameResolver {
    aliases: BTreeMap<String, String>,
}

impl NameResolver {
    /// `aliases` maps normalized keys to tickers. Keys are re-normalized.
    pub fn new(aliases: &BTreeMap<String, String>) -> Self {
        Self {
            aliases: aliases
                .iter()
                .map(|(k, v)| (normalize_company_name(k), v.trim().to_uppercase()))
                .collect(),
        }
    }

    /// Alias lookup only; never touches the network.
    pub fn alias(&self, raw: &str) -> Option<&str> {
        self.aliases
            .get(&normalize_company_name(raw))
            .map(String::as_str)
    }

    pub fn resolve(
        &self,
        raw: &str,
        resolver: &dyn SymbolResolver,
    ) -> Result<ResolvedSymbol, ResolveError> {
        let key = normalize_company_name(raw);
        if key.is_empty() {
            return Err(ResolveError::NoMatch {
                query: raw.to_string(),
            });
        }

        if let Some(symbol) = self.aliases.get(&key) {
            tracing::debug!(query = raw, %key, symbol = %symbol, "resolved via alias");
            return Ok(ResolvedSymbol {
                symbol: symbol.clone(),
                display_name: None,
                via_alias: true,
            });
        }

        let candidates = resolver.search(raw.trim())?;
        let total = candidates.len();
        let chosen = pick_candidate(candidates).ok_or_else(|| ResolveError::NoMatch {
            query: raw.to_string(),
        })?;

        tracing::debug!(
            query = raw,
            symbol = %chosen.symbol,
            candidates = total,
            "resolved via search"
        );
        Ok(ResolvedSymbol {
            symbol: chosen.symbol,
            display_name: Some(chosen.display_name),
            via_alias: false,
        })
    }
}

/// First candidate in resolver order that is not a share-class listing.
pub fn pick_candidate(candidates: Vec<SymbolMatch>) -> Option<SymbolMatch> {
    candidates
        .into_iter()
        .find(|m| !m.is_share_class() && !m.symbol.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct FixedResolver {
        matches: Vec<SymbolMatch>,
        calls: AtomicUsize,
    }

    impl FixedResolver {
        fn new(matches: Vec<SymbolMatch>) -> Self {
            Self {
                matches,
                calls: AtomicUsize::new(0),
            }
        }
    }

    impl SymbolResolver for FixedResolver {
        fn search(&self, _query: &str) -> Result<Vec<SymbolMatch>, DataError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(self.matches.clone())
        }
    }

    fn stock_resolver() -> NameResolver {
        NameResolver::new(&crate::config::default_aliases())
    }

    #[test]
    fn normalization_strips_punctuation_inc_and_whitespace() {
        assert_eq!(normalize_company_name("Alphabet Inc."), "alphabet");
        assert_eq!(normalize_company_name("Alphabet, Inc"), "alphabet");
        assert_eq!(normalize_company_name("  Google  "), "google");
        assert_eq!(normalize_company_name("McDonald's Corp."), "mcdonaldscorp");
        assert_eq!(normalize_company_name("The Walt Disney Co"), "thewaltdisneyco");
        assert_eq!(normalize_company_name("Tesla INC"), "tesla");
    }

    #[test]
    fn alphabet_resolves_without_search() {
        let resolver = FixedResolver::new(vec![SymbolMatch::new("GOOGL", "Alphabet Inc.")]);
        let names = stock_resolver();
        for input in ["Alphabet Inc.", "Alphabet, Inc", "google"] {
            let resolved = names.resolve(input, &resolver).unwrap();
            assert_eq!(resolved.symbol, "GOOG");
            assert!(resolved.via_alias);
        }
        assert_eq!(resolver.calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn share_class_candidates_are_skipped() {
        let resolver = FixedResolver::new(vec![
            SymbolMatch::new("BRK.B", "Berkshire Hathaway Inc. Class B"),
            SymbolMatch::new("BRK-A", "Berkshire Hathaway Inc."),
        ]);
        let resolved = stock_resolver().resolve("Berkshire", &resolver).unwrap();
        assert_eq!(resolved.symbol, "BRK-A");
        assert_eq!(resolved.display_name.as_deref(), Some("Berkshire Hathaway Inc."));
    }

    #[test]
    fn only_share_classes_is_no_match() {
        let resolver = FixedResolver::new(vec![SymbolMatch::new("RDS.A", "Royal Dutch Shell A")]);
        let err = stock_resolver().resolve("Royal Dutch", &resolver).unwrap_err();
        assert!(matches!(err, ResolveError::NoMatch { .. }));
    }

    #[test]
    fn empty_search_is_no_match() {
        let resolver = FixedResolver::new(vec![]);
        let err = stock_resolver()
            .resolve("Zzqqxnonexistent", &resolver)
            .unwrap_err();
        assert!(matches!(err, ResolveError::NoMatch { .. }));
        assert_eq!(err.to_string(), "symbol not found for 'Zzqqxnonexistent'");
    }

    #[test]
    fn punctuation_only_input_skips_search() {
        let resolver = FixedResolver::new(vec![SymbolMatch::new("KO", "Coca-Cola")]);
        let err = stock_resolver().resolve(" ., ", &resolver).unwrap_err();
        assert!(matches!(err, ResolveError::NoMatch { .. }));
        assert_eq!(resolver.calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn first_eligible_candidate_wins() {
        let resolver = FixedResolver::new(vec![
            SymbolMatch::new("NKE", "NIKE, Inc."),
            SymbolMatch::new("NKE.MX", "NIKE, Inc."),
            SymbolMatch::new("NIKE", "Nike Something"),
        ]);
        let resolved = stock_resolver().resolve("Nike", &resolver).unwrap();
        assert_eq!(resolved.symbol, "NKE");
        assert!(!resolved.via_alias);
    }

    #[test]
    fn ticker_normalization() {
        assert_eq!(normalize_ticker(" ko "), Some("KO".to_string()));
        assert_eq!(normalize_ticker("   "), None);
    }

    proptest! {
        /// Keys carry no separators, punctuation or capitals, and are fixed
        /// points of normalization.
        #[test]
        fn normalized_key_is_canonical(raw in "[A-Za-z0-9 .,'&\t-]{0,40}") {
            let key = normalize_company_name(&raw);
            prop_assert!(!key.chars().any(char::is_whitespace));
            prop_assert!(!key.contains(['.', ',', '\'']));
            prop_assert!(!key.chars().any(char::is_uppercase));
            prop_assert_eq!(normalize_company_name(&key), key.clone());
        }

        /// A trailing "Inc." never changes the lookup key.
        #[test]
        fn inc_suffix_is_ignored(name in "[A-Za-z0-9&-]{1,10}( [A-Za-z0-9&-]{1,10}){0,3}") {
            let plain = normalize_company_name(&name);
            prop_assert_eq!(normalize_company_name(&format!("{name} Inc.")), plain.clone());
            prop_assert_eq!(normalize_company_name(&format!("{name}, Inc")), plain);
        }
    }
}
