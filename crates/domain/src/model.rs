use serde::Serialize;

/// One upstream model as the embedding layer sees it.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct ModelInfo {
    /// Name shown to end users and accepted by `create_bot`.
    pub display_name: &'static str,
    /// Internal code the upstream expects in bot mutations.
    pub model_code: &'static str,
    /// The upstream's own ready-made bot running this model.
    pub default_bot: &'static str,
    pub description: &'static str,
    /// Whether custom bots on this model accept a base prompt.
    pub prompt_configurable: bool,
    /// Whether the account's daily quota meters this model.
    pub usage_limited: bool,
}

const BUILTIN: &[ModelInfo] = &[
    ModelInfo {
        display_name: "lite",
        model_code: "kestrel-lite",
        default_bot: "Kestrel",
        description: "Fast general model for everyday questions",
        prompt_configurable: true,
        usage_limited: false,
    },
    ModelInfo {
        display_name: "standard",
        model_code: "kestrel",
        default_bot: "KestrelPlus",
        description: "Balanced flagship model",
        prompt_configurable: true,
        usage_limited: false,
    },
    ModelInfo {
        display_name: "reasoner",
        model_code: "albatross-r",
        default_bot: "Reasoner",
        description: "Deliberate model for multi-step problems",
        prompt_configurable: false,
        usage_limited: true,
    },
    ModelInfo {
        display_name: "creative",
        model_code: "lyrebird",
        default_bot: "Muse",
        description: "Long-form writing model",
        prompt_configurable: true,
        usage_limited: true,
    },
];

/// Read-only table of the models this deployment exposes.
#[derive(Debug, Clone, Copy)]
pub struct ModelRegistry {
    models: &'static [ModelInfo],
}

impl ModelRegistry {
    pub fn builtin() -> Self {
        Self { models: BUILTIN }
    }

    pub fn resolve(&self, display_name: &str) -> Option<&'static ModelInfo> {
        self.models.iter().find(|m| m.display_name == display_name)
    }

    pub fn list(&self) -> &'static [ModelInfo] {
        self.models
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Tests
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
