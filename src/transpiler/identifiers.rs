//! Column-name resolution and the cached field and sort lists.
//!
//! A name is quoted unless it already looks like an expression (it contains a
//! quote, whitespace, a colon or a dot). Every `word§` token is a localized
//! column: the marker becomes `_<language>` and the token is quoted on its own,
//! so `title§` with language `en` resolves to `"title_en"`.

use std::sync::Arc;

use crate::cache::{FragmentCache, FragmentKind};
use crate::transpiler::traits::SqlGenerator;

/// Marks a localized column.
pub const LANGUAGE_MARKER: char = '§';

fn is_expression(name: &str) -> bool {
    name.chars()
        .any(|c| c == '"' || c == ':' || c == '.' || c.is_whitespace())
}

fn is_word_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

fn language_suffix(language: &str) -> String {
    if language.is_empty() {
        String::new()
    } else {
        format!("_{}", language)
    }
}

/// Replace each `word§` token with its quoted physical column.
/// With `alias`, a localized column is aliased back to its logical name.
pub fn replace_language(
    text: &str,
    language: &str,
    generator: &dyn SqlGenerator,
    alias: bool,
) -> String {
    let suffix = language_suffix(language);
    let mut out = String::with_capacity(text.len() + 8);
    let mut word = String::new();

    for c in text.chars() {
        if is_word_char(c) {
            word.push(c);
            continue;
        }
        if c == LANGUAGE_MARKER && !word.is_empty() {
            out.push_str(&generator.quote_identifier(&format!("{}{}", word, suffix)));
            if alias && !suffix.is_empty() {
                out.push_str(" AS ");
                out.push_str(&generator.quote_identifier(&word));
            }
            word.clear();
            continue;
        }
        out.push_str(&word);
        word.clear();
        out.push(c);
    }
    out.push_str(&word);
    out
}

/// Resolve a column name without caching.
pub fn resolve_column(name: &str, language: &str, generator: &dyn SqlGenerator) -> String {
    if name.contains(LANGUAGE_MARKER) {
        replace_language(name, language, generator, false)
    } else if is_expression(name) {
        name.to_string()
    } else {
        generator.quote_identifier(name)
    }
}

fn resolve_field(name: &str, language: &str, generator: &dyn SqlGenerator) -> String {
    if name.contains(LANGUAGE_MARKER) {
        replace_language(name, language, generator, true)
    } else if is_expression(name) {
        name.to_string()
    } else {
        generator.quote_identifier(name)
    }
}

/// Split `<field>_<asc|desc>`. A token without a direction suffix sorts ascending.
pub fn split_sort_token(token: &str) -> (&str, bool) {
    match token.rsplit_once('_') {
        Some((name, dir)) if dir.eq_ignore_ascii_case("desc") => (name, true),
        Some((name, dir)) if dir.eq_ignore_ascii_case("asc") => (name, false),
        _ => (token, false),
    }
}

/// ASCII unit separator between the tokens of a list key.
const KEY_SEPARATOR: &str = "\u{1f}";

fn cache_key(tokens: &[String]) -> String {
    tokens.join(KEY_SEPARATOR)
}

/// Cached column resolution.
pub fn column(
    cache: &FragmentCache,
    language: &str,
    name: &str,
    generator: &dyn SqlGenerator,
) -> Arc<str> {
    cache.get_or_insert_with(FragmentKind::Column, language, name, || {
        resolve_column(name, language, generator)
    })
}

/// Cached SELECT field list.
pub fn field_list(
    cache: &FragmentCache,
    language: &str,
    fields: &[String],
    generator: &dyn SqlGenerator,
) -> Arc<str> {
    cache.get_or_insert_with(FragmentKind::Fields, language, &cache_key(fields), || {
        fields
            .iter()
            .map(|f| resolve_field(f, language, generator))
            .collect::<Vec<_>>()
            .join(",")
    })
}

/// Cached ORDER BY list.
pub fn sort_list(
    cache: &FragmentCache,
    language: &str,
    sort: &[String],
    generator: &dyn SqlGenerator,
) -> Arc<str> {
    cache.get_or_insert_with(FragmentKind::Sort, language, &cache_key(sort), || {
        sort.iter()
            .map(|token| {
                let (name, desc) = split_sort_token(token);
                format!(
                    "{} {}",
                    resolve_column(name, language, generator),
                    if desc { "DESC" } else { "ASC" }
                )
            })
            .collect::<Vec<_>>()
            .join(",")
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transpiler::Dialect;

    fn oracle() -> Box<dyn SqlGenerator> {
        Dialect::Oracle.generator()
    }

    #[test]
    fn test_plain_name_is_quoted() {
        assert_eq!(resolve_column("age", "", oracle().as_ref()), "\"age\"");
    }

    #[test]
    fn test_expressions_pass_through() {
        let g = oracle();
        for name in ["u.age", "\"Age\"", "NVL(age, 0)", "a:b"] {
            assert_eq!(resolve_column(name, "", g.as_ref()), name);
        }
    }

    #[test]
    fn test_language_marker() {
        let g = oracle();
        assert_eq!(resolve_column("title§", "en", g.as_ref()), "\"title_en\"");
        assert_eq!(resolve_column("title§", "", g.as_ref()), "\"title\"");
        assert_eq!(resolve_column("p.title§", "de", g.as_ref()), "p.\"title_de\"");
    }

    #[test]
    fn test_field_alias() {
        let cache = FragmentCache::default();
        let fields = vec!["id".to_string(), "title§".to_string()];
        assert_eq!(
            &*field_list(&cache, "en", &fields, oracle().as_ref()),
            "\"id\",\"title_en\" AS \"title\""
        );
        assert_eq!(
            &*field_list(&cache, "", &fields, oracle().as_ref()),
            "\"id\",\"title\""
        );
    }

    #[test]
    fn test_sort_tokens() {
        let cache = FragmentCache::default();
        let sort = vec![
            "name_DESC".to_string(),
            "created_at_asc".to_string(),
            "title§_desc".to_string(),
            "created_at".to_string(),
        ];
        assert_eq!(
            &*sort_list(&cache, "en", &sort, oracle().as_ref()),
            "\"name\" DESC,\"created_at\" ASC,\"title_en\" DESC,\"created_at\" ASC"
        );
    }

    #[test]
    fn test_list_keys_keep_token_boundaries() {
        let cache = FragmentCache::default();
        let joined = vec!["a,b".to_string()];
        let split = vec!["a".to_string(), "b".to_string()];
        assert_eq!(&*field_list(&cache, "", &joined, oracle().as_ref()), "\"a,b\"");
        assert_eq!(&*field_list(&cache, "", &split, oracle().as_ref()), "\"a\",\"b\"");
        assert_eq!(cache.len(), 2);

        let joined = vec!["a_desc,b".to_string()];
        let split = vec!["a_desc".to_string(), "b".to_string()];
        sort_list(&cache, "", &joined, oracle().as_ref());
        assert_eq!(
            &*sort_list(&cache, "", &split, oracle().as_ref()),
            "\"a\" DESC,\"b\" ASC"
        );
    }

    #[test]
    fn test_resolution_is_cached() {
        let cache = FragmentCache::default();
        column(&cache, "", "age", oracle().as_ref());
        column(&cache, "", "age", oracle().as_ref());
        assert_eq!(cache.stats().hits, 1);
        assert_eq!(cache.len(), 1);
    }
}
