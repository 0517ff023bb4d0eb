use std::{collections::BTreeMap, fmt};

pub type Map = BTreeMap<String, String>;

/// An equality-based label selector, e.g. `app=my-app`.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Selector {
    match_labels: Map,
}

#[derive(Debug, thiserror::Error)]
#[error("invalid label selector {key}={value}: {reason}")]
pub struct InvalidSelector {
    key: String,
    value: String,
    reason: &'static str,
}

// === Selector ===

impl Selector {
    pub fn equals(key: &str, value: &str) -> Result<Self, InvalidSelector> {
        Self::default().and(key, value)
    }

    pub fn and(mut self, key: &str, value: &str) -> Result<Self, InvalidSelector> {
        let invalid = |reason| InvalidSelector {
            key: key.to_string(),
            value: value.to_string(),
            reason,
        };

        let name = match key.split_once('/') {
            Some((prefix, name)) => {
                if prefix.is_empty() || prefix.len() > 253 {
                    return Err(invalid("key prefix must be 1-253 characters"));
                }
                name
            }
            None => key,
        };
        if name.is_empty() {
            return Err(invalid("key must not be empty"));
        }
        validate_value(name).map_err(invalid)?;
        validate_value(value).map_err(invalid)?;

        self.match_labels.insert(key.to_string(), value.to_string());
        Ok(self)
    }

    pub fn matches(&self, labels: Option<&Map>) -> bool {
        self.match_labels
            .iter()
            .all(|(k, v)| labels.and_then(|l| l.get(k)) == Some(v))
    }
}

impl fmt::Display for Selector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for (k, v) in &self.match_labels {
            if !first {
                f.write_str(",")?;
            }
            first = false;
            write!(f, "{k}={v}")?;
        }
        Ok(())
    }
}

fn validate_value(value: &str) -> Result<(), &'static str> {
    if value.len() > 63 {
        return Err("must be no more than 63 characters");
    }
    let alnum = |c: Option<char>| c.map_or(true, |c| c.is_ascii_alphanumeric());
    if !alnum(value.chars().next()) || !alnum(value.chars().last()) {
        return Err("must begin and end with an alphanumeric character");
    }
    if !value
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'))
    {
        return Err("may only contain alphanumerics, '-', '_' or '.'");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use maplit::btreemap;

    #[test]
    fn test_matches() {
        let labels = btreemap! {
            "app".to_string() => "foo".to_string(),
            "team".to_string() => "bar".to_string(),
        };
        for (selector, labels, matches, msg) in [
            (Selector::default(), None, true, "empty match"),
            (
                Selector::equals("app", "foo").unwrap(),
                Some(&labels),
                true,
                "sufficient label match",
            ),
            (
                Selector::equals("app", "foo")
                    .and_then(|s| s.and("team", "baz"))
                    .unwrap(),
                Some(&labels),
                false,
                "mismatched value",
            ),
            (
                Selector::equals("job-name", "foo").unwrap(),
                Some(&labels),
                false,
                "missing label",
            ),
            (
                Selector::equals("app", "foo").unwrap(),
                None,
                false,
                "unlabeled",
            ),
        ] {
            assert_eq!(selector.matches(labels), matches, "{msg}");
        }
    }

    #[test]
    fn rejects_invalid_values() {
        assert!(Selector::equals("app", "has space").is_err());
        assert!(Selector::equals("app", "-leading").is_err());
        assert!(Selector::equals("app", &"a".repeat(64)).is_err());
        assert!(Selector::equals("", "x").is_err());
        assert!(Selector::equals("app", "").is_ok());
        assert!(Selector::equals("example.com/app", "x.y_z").is_ok());
    }

    #[test]
    fn displays_as_query() {
        let selector = Selector::equals("app", "foo")
            .and_then(|s| s.and("job-name", "bar"))
            .unwrap();
        assert_eq!(selector.to_string(), "app=foo,job-name=bar");
    }
}
