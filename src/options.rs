use std::collections::HashMap;

/// Options parsed from the process command line.
///
/// Keys are stored exactly as given after dash stripping; a flag without a
/// parameter maps to an empty string. Lookups are exact-match only: no
/// type coercion, no default-value resolution beyond presence checks.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Options(HashMap<String, String>);

impl Options {
    /// Look up an option value by exact key
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }

    /// Check whether an option key is present
    #[must_use]
    pub fn contains(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    /// Check whether at least one of the given keys is present
    ///
    /// Example: `options.has_one_of(&["q", "quiet"])`
    #[must_use]
    pub fn has_one_of(&self, keys: &[&str]) -> bool {
        keys.iter().any(|key| self.0.contains_key(*key))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterate over key/value pairs in unspecified order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    fn insert(&mut self, token: &str) {
        let (key, value) = match token.split_once('=') {
            Some((key, value)) => (key, value),
            None => (token, ""),
        };
        self.0.insert(key.to_string(), value.to_string());
    }
}

/// Split raw process arguments into positional arguments and options.
///
/// Tokens prefixed with one or two dashes become options, split on the
/// first `=` into key and value (value empty when no `=` is present); a
/// bare `-` or `--` is treated as positional. Everything else is a
/// positional argument, input order preserved. No escaping or quoting.
#[must_use]
pub fn parse<I>(argv: I) -> (Vec<String>, Options)
where
    I: IntoIterator<Item = String>,
{
    let mut args = Vec::new();
    let mut options = Options::default();

    for token in argv {
        if let Some(rest) = token.strip_prefix("--") {
            if rest.is_empty() {
                args.push(token);
            } else {
                options.insert(rest);
            }
        } else if let Some(rest) = token.strip_prefix('-') {
            if rest.is_empty() {
                args.push(token);
            } else {
                options.insert(rest);
            }
        } else {
            args.push(token);
        }
    }

    (args, options)
}
