use serde::{Deserialize, Serialize};
use std::fmt;

/// An installed package as recorded in the registry.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub struct Package {
    /// Directory under the install root; unique across the registry.
    pub folder_name: String,
    /// User-facing name given at install time.
    #[serde(rename = "name", default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    /// Names of the symlinks exposed on the command line.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub binaries: Vec<String>,
    /// Linked into the shared bin directory rather than the user's.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub global: bool,
}

impl Package {
    /// Case-insensitive match against the display name or the folder name.
    pub fn matches(&self, name: &str) -> bool {
        let name = name.to_lowercase();
        self.folder_name.to_lowercase() == name
            || self
                .display_name
                .as_deref()
                .is_some_and(|n| !n.is_empty() && n.to_lowercase() == name)
    }
}

impl fmt::Display for Package {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.display_name {
            Some(name) => write!(f, "{} ({})", name, self.folder_name),
            None => write!(f, "{}", self.folder_name),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_serialization_omits_defaults() {
        let pkg = Package {
            folder_name: "tool-1.0".into(),
            ..Default::default()
        };
        assert_eq!(
            serde_json::to_string(&pkg).unwrap(),
            r#"{"folderName":"tool-1.0"}"#
        );
    }

    #[test]
    fn test_serialization_full() {
        let pkg = Package {
            folder_name: "tool-1.0".into(),
            display_name: Some("Tool".into()),
            binaries: vec!["tool".into(), "toolctl".into()],
            global: true,
        };
        let json = serde_json::to_value(&pkg).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "folderName": "tool-1.0",
                "name": "Tool",
                "binaries": ["tool", "toolctl"],
                "global": true
            })
        );
    }

    #[test]
    fn test_deserialization_with_missing_fields() {
        let pkg: Package = serde_json::from_str(r#"{"folderName":"jdk-21"}"#).unwrap();
        assert_eq!(pkg.folder_name, "jdk-21");
        assert_eq!(pkg.display_name, None);
        assert!(pkg.binaries.is_empty());
        assert!(!pkg.global);
    }

    #[test]
    fn test_matches_is_case_insensitive() {
        let pkg = Package {
            folder_name: "Tool-1.0".into(),
            display_name: Some("MyTool".into()),
            ..Default::default()
        };
        assert!(pkg.matches("tool-1.0"));
        assert!(pkg.matches("TOOL-1.0"));
        assert!(pkg.matches("mytool"));
        assert!(!pkg.matches("tool"));
    }

    #[test]
    fn test_matches_empty_query_without_display_name() {
        let pkg = Package {
            folder_name: "tool".into(),
            ..Default::default()
        };
        assert!(!pkg.matches(""));

        let pkg = Package {
            folder_name: "tool".into(),
            display_name: Some(String::new()),
            ..Default::default()
        };
        assert!(!pkg.matches(""));
    }

    #[test]
    fn test_display() {
        let mut pkg = Package {
            folder_name: "tool-1.0".into(),
            ..Default::default()
        };
        assert_eq!(pkg.to_string(), "tool-1.0");
        pkg.display_name = Some("tool".into());
        assert_eq!(pkg.to_string(), "tool (tool-1.0)");
    }
}
