// ─── Compatibility Rules ───
// Evaluates `rules[]` blocks attached to libraries, arguments and versions.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompatibilityRule {
    pub action: RuleAction,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub os: Option<OsRule>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub features: Option<BTreeMap<String, bool>>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum RuleAction {
    Allow,
    Disallow,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OsRule {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub arch: Option<String>,
    /// Regular expression over the OS version. Not evaluated.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
}

/// Launcher features a rule may be conditioned on (`is_demo_user`, `has_custom_resolution`, ...).
pub type FeatureSet = BTreeMap<String, bool>;

impl CompatibilityRule {
    pub fn allow() -> Self {
        Self {
            action: RuleAction::Allow,
            os: None,
            features: None,
        }
    }

    pub fn disallow() -> Self {
        Self {
            action: RuleAction::Disallow,
            os: None,
            features: None,
        }
    }

    pub fn for_os(mut self, name: &str) -> Self {
        self.os = Some(OsRule {
            name: Some(name.to_string()),
            arch: None,
            version: None,
        });
        self
    }

    /// `Some(action)` when the rule matches the current environment, `None` otherwise.
    pub fn action_for(&self, features: &FeatureSet) -> Option<RuleAction> {
        if let Some(os) = &self.os {
            if let Some(name) = &os.name {
                if name != current_os_name() {
                    return None;
                }
            }
            if let Some(arch) = &os.arch {
                if arch != current_arch_name() {
                    return None;
                }
            }
        }

        if let Some(required) = &self.features {
            for (feature, expected) in required {
                if features.get(feature).copied().unwrap_or(false) != *expected {
                    return None;
                }
            }
        }

        Some(self.action)
    }

    /// Rules logic:
    /// - If no rules → allowed.
    /// - Process rules top-to-bottom. Start with "disallowed".
    /// - Each matching rule sets the state to its action.
    pub fn applies(rules: Option<&[CompatibilityRule]>, features: &FeatureSet) -> bool {
        let rules = match rules {
            Some(r) if !r.is_empty() => r,
            _ => return true,
        };

        let mut action = RuleAction::Disallow;
        for rule in rules {
            if let Some(a) = rule.action_for(features) {
                action = a;
            }
        }
        action == RuleAction::Allow
    }
}

/// Get the OS name for the current platform as used by version descriptors.
pub fn current_os_name() -> &'static str {
    if cfg!(target_os = "windows") {
        "windows"
    } else if cfg!(target_os = "macos") {
        "osx"
    } else {
        "linux"
    }
}

pub fn current_arch_name() -> &'static str {
    match std::env::consts::ARCH {
        "x86_64" => "x86_64",
        "x86" => "x86",
        "aarch64" => "arm64",
        "arm" => "arm32",
        other => other,
    }
}

/// Value substituted for `${arch}` in native classifiers.
pub fn native_arch_bits() -> &'static str {
    if cfg!(target_pointer_width = "64") {
        "64"
    } else {
        "32"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_rules_means_allowed() {
        assert!(CompatibilityRule::applies(None, &FeatureSet::new()));
        assert!(CompatibilityRule::applies(Some(&[][..]), &FeatureSet::new()));
    }

    #[test]
    fn allow_only_current_os() {
        let rules = vec![CompatibilityRule::allow().for_os(current_os_name())];
        assert!(CompatibilityRule::applies(Some(rules.as_slice()), &FeatureSet::new()));
    }

    #[test]
    fn allow_only_other_os() {
        let other = if current_os_name() == "windows" { "osx" } else { "windows" };
        let rules = vec![CompatibilityRule::allow().for_os(other)];
        assert!(!CompatibilityRule::applies(Some(rules.as_slice()), &FeatureSet::new()));
    }

    #[test]
    fn disallow_current_os() {
        let rules = vec![
            CompatibilityRule::allow(),
            CompatibilityRule::disallow().for_os(current_os_name()),
        ];
        assert!(!CompatibilityRule::applies(Some(rules.as_slice()), &FeatureSet::new()));
    }

    #[test]
    fn feature_rules_need_matching_features() {
        let mut rule = CompatibilityRule::allow();
        rule.features = Some(BTreeMap::from([("is_demo_user".to_string(), true)]));
        let rules = vec![rule];

        assert!(!CompatibilityRule::applies(Some(rules.as_slice()), &FeatureSet::new()));
        let features = FeatureSet::from([("is_demo_user".to_string(), true)]);
        assert!(CompatibilityRule::applies(Some(rules.as_slice()), &features));
    }
}
