use crate::error::{FixupError, FixupResult};
use crate::node::{Mapping, Node};
use serde_yaml::Value;

/// A full multi-service compose document.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ComposeDocument {
    root: Mapping,
}

impl ComposeDocument {
    /// Parse YAML text. An empty document is an empty mapping; any other non-mapping root is
    /// rejected.
    pub fn parse(raw: &str) -> FixupResult<Self> {
        if raw.trim().is_empty() {
            return Ok(Self::default());
        }

        let value: Value = serde_yaml::from_str(raw).map_err(FixupError::Parse)?;
        match Node::from_yaml(value, "")? {
            Node::Null => Ok(Self::default()),
            Node::Mapping(root) => Ok(Self { root }),
            other => Err(FixupError::shape("<root>", "a mapping", &other)),
        }
    }

    pub fn root(&self) -> &Mapping {
        &self.root
    }

    pub fn root_mut(&mut self) -> &mut Mapping {
        &mut self.root
    }

    pub fn lookup(&self, path: &[&str]) -> Option<&Node> {
        let (first, rest) = path.split_first()?;
        self.root.get(*first)?.lookup(rest)
    }

    pub fn service(&self, name: &str) -> Option<&Node> {
        self.lookup(&["services", name])
    }

    /// Names of all services, sorted.
    pub fn service_names(&self) -> Vec<&str> {
        self.root
            .get("services")
            .and_then(Node::as_mapping)
            .map(|services| services.keys().map(String::as_str).collect())
            .unwrap_or_default()
    }

    pub fn to_yaml(&self) -> FixupResult<String> {
        serde_yaml::to_string(&self.root).map_err(FixupError::Serialization)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_input_is_an_empty_document() {
        assert_eq!(ComposeDocument::parse("").unwrap(), ComposeDocument::default());
        assert_eq!(ComposeDocument::parse("  \n").unwrap(), ComposeDocument::default());
        assert_eq!(ComposeDocument::parse("~\n").unwrap(), ComposeDocument::default());
    }

    #[test]
    fn non_mapping_root_is_rejected() {
        let err = ComposeDocument::parse("- a\n- b\n").unwrap_err();
        assert!(err.is_malformed_input());
        assert!(err.to_string().contains("<root>"));
    }

    #[test]
    fn invalid_yaml_is_a_parse_error() {
        let err = ComposeDocument::parse("services: [web\n").unwrap_err();
        assert!(matches!(err, FixupError::Parse(_)));
    }

    #[test]
    fn service_names_are_sorted() {
        let doc = ComposeDocument::parse("services:\n  web: {}\n  db: {}\n  adminer: ~\n").unwrap();
        assert_eq!(doc.service_names(), vec!["adminer", "db", "web"]);
        assert!(doc.service("db").is_some());
    }
}
