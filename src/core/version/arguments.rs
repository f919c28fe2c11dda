// ─── Launch Arguments ───
// Modern `arguments { game, jvm }` templates, with rule-guarded entries.

use serde::{Deserialize, Serialize};

use super::rules::{CompatibilityRule, FeatureSet};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Arguments {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub game: Vec<Argument>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub jvm: Vec<Argument>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Argument {
    Plain(String),
    Conditional {
        #[serde(default)]
        rules: Vec<CompatibilityRule>,
        value: ArgumentValue,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ArgumentValue {
    One(String),
    Many(Vec<String>),
}

impl Argument {
    /// Values contributed by this entry, empty when its rules reject the environment.
    pub fn values(&self, features: &FeatureSet) -> Vec<String> {
        match self {
            Argument::Plain(value) => vec![value.clone()],
            Argument::Conditional { rules, value } => {
                if !CompatibilityRule::applies(Some(rules.as_slice()), features) {
                    return Vec::new();
                }
                match value {
                    ArgumentValue::One(v) => vec![v.clone()],
                    ArgumentValue::Many(vs) => vs.clone(),
                }
            }
        }
    }
}

impl Arguments {
    /// Parent entries first, then the child's.
    pub fn merge(parent: Option<&Arguments>, child: Option<&Arguments>) -> Option<Arguments> {
        match (parent, child) {
            (None, None) => None,
            (Some(p), None) => Some(p.clone()),
            (None, Some(c)) => Some(c.clone()),
            (Some(p), Some(c)) => Some(Arguments {
                game: p.game.iter().chain(&c.game).cloned().collect(),
                jvm: p.jvm.iter().chain(&c.jvm).cloned().collect(),
            }),
        }
    }

    pub fn game_values(&self, features: &FeatureSet) -> Vec<String> {
        self.game.iter().flat_map(|a| a.values(features)).collect()
    }

    pub fn jvm_values(&self, features: &FeatureSet) -> Vec<String> {
        self.jvm.iter().flat_map(|a| a.values(features)).collect()
    }
}

/// JVM arguments for descriptors that predate the `arguments` block.
pub fn default_jvm_arguments() -> Vec<String> {
    vec![
        "-Djava.library.path=${natives_directory}".to_string(),
        "-cp".to_string(),
        "${classpath}".to_string(),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn conditional_entries_follow_rules() {
        let parsed: Arguments = serde_json::from_value(serde_json::json!({
            "game": [
                "--username",
                "${auth_player_name}",
                {
                    "rules": [{"action": "allow", "features": {"is_demo_user": true}}],
                    "value": "--demo"
                },
                {
                    "rules": [{"action": "allow", "features": {"has_custom_resolution": true}}],
                    "value": ["--width", "${resolution_width}"]
                }
            ]
        }))
        .unwrap();

        let plain = parsed.game_values(&FeatureSet::new());
        assert_eq!(plain, vec!["--username", "${auth_player_name}"]);

        let features = FeatureSet::from([("has_custom_resolution".to_string(), true)]);
        let sized = parsed.game_values(&features);
        assert_eq!(sized.len(), 4);
        assert_eq!(sized[2], "--width");
    }

    #[test]
    fn merge_appends_child_after_parent() {
        let parent = Arguments {
            game: vec![Argument::Plain("--parent".into())],
            jvm: vec![],
        };
        let child = Arguments {
            game: vec![Argument::Plain("--child".into())],
            jvm: vec![Argument::Plain("-Xss1M".into())],
        };

        let merged = Arguments::merge(Some(&parent), Some(&child)).unwrap();
        let features = FeatureSet::new();
        assert_eq!(merged.game_values(&features), vec!["--parent", "--child"]);
        assert_eq!(merged.jvm_values(&features), vec!["-Xss1M"]);
        assert!(Arguments::merge(None, None).is_none());
    }
}
