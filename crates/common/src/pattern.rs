//! Test string generation from recipes
//!
//! A recipe is a whitespace-separated list of ingredient references, each
//! optionally followed by `?` (zero or one) or `{m}` / `{m,n}` (repeat).
//! An ingredient is one of:
//!
//! - a character class such as `[a-zà-å]`,
//! - a list of codepoints and ranges such as `U+0628 U+062A-U+062C`,
//! - another recipe.
//!
//! A reference to a name that is not an ingredient stands for itself. The
//! expansion is the ordered cartesian product of the terms, first term
//! varying slowest, with duplicates and empty strings dropped.

use indexmap::{IndexMap, IndexSet};

use crate::error::{Error, Result};

/// Upper bound on the strings a single recipe may produce
pub const DEFAULT_EXPANSION_LIMIT: usize = 100_000;

/// Expands recipes into literal test strings
pub trait PatternExpander {
    fn expand(&self, recipe: &str, ingredients: &IndexMap<String, String>) -> Result<Vec<String>>;
}

/// The built-in recipe language
#[derive(Debug, Clone)]
pub struct RecipeExpander {
    limit: usize,
}

impl Default for RecipeExpander {
    fn default() -> Self {
        Self {
            limit: DEFAULT_EXPANSION_LIMIT,
        }
    }
}

impl PatternExpander for RecipeExpander {
    fn expand(&self, recipe: &str, ingredients: &IndexMap<String, String>) -> Result<Vec<String>> {
        let mut stack = Vec::new();
        let strings: IndexSet<String> = self
            .expand_recipe(recipe, ingredients, &mut stack)?
            .into_iter()
            .filter(|s| !s.is_empty())
            .collect();
        if strings.is_empty() {
            return Err(Error::EmptyExpansion(recipe.to_string()));
        }
        Ok(strings.into_iter().collect())
    }
}

impl RecipeExpander {
    pub fn with_limit(limit: usize) -> Self {
        Self { limit }
    }

    fn expand_recipe(
        &self,
        recipe: &str,
        ingredients: &IndexMap<String, String>,
        stack: &mut Vec<String>,
    ) -> Result<Vec<String>> {
        let mut acc = vec![String::new()];
        for term in recipe.split_whitespace() {
            let (name, min, max) = parse_term(recipe, term)?;
            let options = self.ingredient(recipe, name, ingredients, stack)?;
            let repeated = self.repeat(recipe, &options, min, max)?;
            acc = self.product(recipe, &acc, &repeated)?;
        }
        Ok(acc)
    }

    fn ingredient(
        &self,
        recipe: &str,
        name: &str,
        ingredients: &IndexMap<String, String>,
        stack: &mut Vec<String>,
    ) -> Result<Vec<String>> {
        let Some(definition) = ingredients.get(name) else {
            return Ok(vec![name.to_string()]);
        };
        if stack.iter().any(|n| n == name) {
            return Err(invalid(recipe, format!("ingredient {} refers to itself", name)));
        }

        let definition = definition.trim();
        if let Some(body) = definition
            .strip_prefix('[')
            .and_then(|d| d.strip_suffix(']'))
        {
            return parse_class(recipe, body);
        }
        if let Some(codepoints) = parse_codepoints(recipe, definition)? {
            return Ok(codepoints);
        }

        stack.push(name.to_string());
        let expanded = self.expand_recipe(definition, ingredients, stack);
        stack.pop();
        expanded
    }

    fn repeat(&self, recipe: &str, options: &[String], min: usize, max: usize) -> Result<Vec<String>> {
        let mut out = Vec::new();
        let mut layer = vec![String::new()];
        for count in 0..=max {
            if count >= min {
                if out.len() + layer.len() > self.limit {
                    return Err(self.too_large(recipe));
                }
                out.extend(layer.iter().cloned());
            }
            if count < max {
                layer = self.product(recipe, &layer, options)?;
            }
        }
        Ok(out)
    }

    fn product(&self, recipe: &str, left: &[String], right: &[String]) -> Result<Vec<String>> {
        match left.len().checked_mul(right.len()) {
            Some(n) if n <= self.limit => {}
            _ => return Err(self.too_large(recipe)),
        }
        let mut out = Vec::with_capacity(left.len() * right.len());
        for l in left {
            for r in right {
                out.push(format!("{}{}", l, r));
            }
        }
        Ok(out)
    }

    fn too_large(&self, recipe: &str) -> Error {
        Error::RecipeTooLarge {
            recipe: recipe.to_string(),
            limit: self.limit,
        }
    }
}

fn invalid(recipe: &str, reason: impl Into<String>) -> Error {
    Error::InvalidRecipe {
        recipe: recipe.to_string(),
        reason: reason.into(),
    }
}

/// Split a term into its ingredient name and repetition bounds.
fn parse_term<'a>(recipe: &str, term: &'a str) -> Result<(&'a str, usize, usize)> {
    let (name, min, max) = if let Some(name) = term.strip_suffix('?') {
        (name, 0, 1)
    } else if let (Some(open), true) = (term.find('{'), term.ends_with('}')) {
        let bounds = &term[open + 1..term.len() - 1];
        let number = |s: &str| -> Result<usize> {
            s.trim()
                .parse()
                .map_err(|_| invalid(recipe, format!("bad repetition in {}", term)))
        };
        let (min, max) = match bounds.split_once(',') {
            Some((lo, hi)) => (number(lo)?, number(hi)?),
            None => {
                let n = number(bounds)?;
                (n, n)
            }
        };
        (&term[..open], min, max)
    } else {
        (term, 1, 1)
    };

    if name.is_empty() {
        return Err(invalid(recipe, format!("missing ingredient in {}", term)));
    }
    if min > max {
        return Err(invalid(recipe, format!("bad repetition in {}", term)));
    }
    Ok((name, min, max))
}

/// Characters of a `[...]` class body, with `a-z` ranges and `\` escapes.
fn parse_class(recipe: &str, body: &str) -> Result<Vec<String>> {
    // Each character with whether it was escaped.
    let mut chars = Vec::new();
    let mut iter = body.chars();
    while let Some(c) = iter.next() {
        if c == '\\' {
            let escaped = iter
                .next()
                .ok_or_else(|| invalid(recipe, "dangling escape in character class"))?;
            chars.push((escaped, true));
        } else {
            chars.push((c, false));
        }
    }

    let mut out = IndexSet::new();
    let mut i = 0;
    while i < chars.len() {
        if i + 2 < chars.len() && chars[i + 1] == ('-', false) {
            let (start, end) = (chars[i].0, chars[i + 2].0);
            if start > end {
                return Err(invalid(recipe, format!("reversed range {}-{}", start, end)));
            }
            out.extend((start..=end).map(String::from));
            i += 3;
        } else {
            out.insert(chars[i].0.to_string());
            i += 1;
        }
    }
    Ok(out.into_iter().collect())
}

/// `U+XXXX` codepoints and `U+XXXX-U+YYYY` ranges. `None` if the
/// definition is not a codepoint list at all.
fn parse_codepoints(recipe: &str, definition: &str) -> Result<Option<Vec<String>>> {
    fn codepoint(token: &str) -> Option<u32> {
        let hex = token
            .strip_prefix("U+")
            .or_else(|| token.strip_prefix("u+"))?;
        u32::from_str_radix(hex, 16).ok()
    }

    let tokens: Vec<&str> = definition.split_whitespace().collect();
    let mut ranges = Vec::with_capacity(tokens.len());
    for token in &tokens {
        let range = match token.split_once('-') {
            Some((lo, hi)) => codepoint(lo).zip(codepoint(hi)),
            None => codepoint(token).map(|c| (c, c)),
        };
        match range {
            Some(r) => ranges.push(r),
            None => return Ok(None),
        }
    }
    if ranges.is_empty() {
        return Ok(None);
    }

    let mut out = IndexSet::new();
    for (lo, hi) in ranges {
        let start = char::from_u32(lo).ok_or_else(|| invalid(recipe, format!("invalid codepoint U+{:04X}", lo)))?;
        let end = char::from_u32(hi).ok_or_else(|| invalid(recipe, format!("invalid codepoint U+{:04X}", hi)))?;
        if start > end {
            return Err(invalid(recipe, format!("reversed range U+{:04X}-U+{:04X}", lo, hi)));
        }
        out.extend((start..=end).map(String::from));
    }
    Ok(Some(out.into_iter().collect()))
}
