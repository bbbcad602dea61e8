//! Counter keys for the key/value store.

use std::fmt;

/// Key of the visit counter bumped by the greeting endpoint.
pub const VISITS_KEY: &str = "visits";

/// Name of a counter held in the key/value store.
///
/// # Examples
/// ```
/// use stats_api::domain::CounterKey;
///
/// assert_eq!(CounterKey::visits().as_ref(), "visits");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CounterKey(&'static str);

impl CounterKey {
    /// The visit counter key.
    #[must_use]
    pub const fn visits() -> Self {
        Self(VISITS_KEY)
    }
}

impl AsRef<str> for CounterKey {
    fn as_ref(&self) -> &str {
        self.0
    }
}

impl fmt::Display for CounterKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    fn visits_key_matches_constant() {
        let key = CounterKey::visits();
        assert_eq!(key.as_ref(), VISITS_KEY);
        assert_eq!(key.to_string(), VISITS_KEY);
    }
}
