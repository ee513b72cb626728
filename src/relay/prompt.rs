use crate::config::PromptConfig;
use serde::Deserialize;

const NAME_PLACEHOLDER: &str = "{name}";

const MATERIALS_ADVISOR_TEMPLATE: &str = "\
You are the virtual assistant of Metro, an innovative app that provides information and expert advice on construction materials.

Your personality:
- Friendly, professional and helpful
- An expert in construction and building materials
- You give concise but complete answers
- You use a warm but professional tone

The user's name is {name}.

Your main functions:
1. Advise on which materials to use for different projects
2. Help with quantity calculations (cement, sand, rebar, etc.)
3. Recommend brands and quality grades
4. Give guidance on approximate budgets
5. Answer technical construction questions

If you don't know something specific, be honest and recommend consulting an engineer.";

const SUPPORT_TEMPLATE: &str = "\
You are a friendly and professional customer support assistant answering over WhatsApp.
The user's name is {name}.
Keep answers short, clear and helpful. If you cannot help, say so politely and suggest contacting a human agent.";

/// Built-in system prompt presets.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Persona {
    #[default]
    MaterialsAdvisor,
    Support,
}
impl Persona {
    pub fn template(self) -> &'static str {
        match self {
            Persona::MaterialsAdvisor => MATERIALS_ADVISOR_TEMPLATE,
            Persona::Support => SUPPORT_TEMPLATE,
        }
    }
}

#[derive(Debug, Clone)]
pub struct SystemPrompt {
    template: String,
    default_name: String,
}
impl SystemPrompt {
    pub fn new(template: impl Into<String>, default_name: impl Into<String>) -> Self {
        Self {
            template: template.into(),
            default_name: default_name.into(),
        }
    }

    pub fn from_config(config: &PromptConfig) -> Self {
        let template = config
            .template
            .clone()
            .unwrap_or_else(|| config.persona.template().to_string());

        Self::new(template, config.default_name.clone())
    }

    pub fn default_name(&self) -> &str {
        &self.default_name
    }

    /// Interpolates the display name into every `{name}` placeholder.
    pub fn render(&self, display_name: &str) -> String {
        self.template.replace(NAME_PLACEHOLDER, display_name)
    }
}
