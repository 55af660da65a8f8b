use scribe_llm::provider::ToolDefinition;

/// A tool the agent may call: name, model-facing description, and the JSON
/// schema of its arguments.
#[derive(Debug, Clone)]
pub struct ToolDef {
    pub name: &'static str,
    pub description: &'static str,
    pub schema: schemars::Schema,
}

impl ToolDef {
    /// Wire form sent to the model, with schemars bookkeeping keys removed.
    #[must_use]
    pub fn to_definition(&self) -> ToolDefinition {
        let mut parameters = self.schema.as_value().clone();
        if let Some(obj) = parameters.as_object_mut() {
            obj.remove("$schema");
            obj.remove("title");
        }
        ToolDefinition {
            name: self.name.to_owned(),
            description: self.description.to_owned(),
            parameters,
        }
    }
}

#[derive(Debug, Default)]
pub struct ToolRegistry {
    tools: Vec<ToolDef>,
}

impl ToolRegistry {
    #[must_use]
    pub fn from_definitions(tools: Vec<ToolDef>) -> Self {
        Self { tools }
    }

    #[must_use]
    pub fn find(&self, name: &str) -> Option<&ToolDef> {
        self.tools.iter().find(|t| t.name == name)
    }

    #[must_use]
    pub fn definitions(&self) -> Vec<ToolDefinition> {
        self.tools.iter().map(ToolDef::to_definition).collect()
    }
}
