use indexmap::IndexMap;

/// One renderer model the studio can be pointed at. The wizard only needs
/// two capabilities: `card` (sketch + description to card) and `edit`
/// (card + instruction to card).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelSpec {
    pub name: String,
    pub provider: String,
    pub capabilities: Vec<String>,
}

impl ModelSpec {
    pub fn supports(&self, capability: &str) -> bool {
        self.capabilities.iter().any(|item| item == capability)
    }
}

#[derive(Debug, Clone)]
pub struct ModelRegistry {
    models: IndexMap<String, ModelSpec>,
}

impl ModelRegistry {
    pub fn new(models: Option<IndexMap<String, ModelSpec>>) -> Self {
        Self {
            models: models.unwrap_or_else(default_models),
        }
    }

    pub fn get(&self, name: &str) -> Option<&ModelSpec> {
        self.models.get(name)
    }

    pub fn list(&self) -> impl Iterator<Item = &ModelSpec> {
        self.models.values()
    }

    pub fn by_capability(&self, capability: &str) -> Vec<ModelSpec> {
        self.models
            .values()
            .filter(|model| model.supports(capability))
            .cloned()
            .collect()
    }

    pub fn ensure(&self, name: &str, capability: &str) -> Option<ModelSpec> {
        let model = self.get(name)?;
        if model.supports(capability) {
            return Some(model.clone());
        }
        None
    }
}

fn default_models() -> IndexMap<String, ModelSpec> {
    let mut map = IndexMap::new();

    let mut insert = |name: &str, provider: &str, capabilities: &[&str]| {
        map.insert(
            name.to_string(),
            ModelSpec {
                name: name.to_string(),
                provider: provider.to_string(),
                capabilities: capabilities
                    .iter()
                    .map(|item| (*item).to_string())
                    .collect(),
            },
        );
    };

    // First card-capable entry doubles as the default selection.
    insert("gemini-2.5-flash-image", "gemini", &["card", "edit"]);
    insert("gemini-3-pro-image-preview", "gemini", &["card", "edit"]);
    insert("dryrun-card-1", "dryrun", &["card", "edit"]);

    map
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_registry_leads_with_the_flash_image_model() {
        let registry = ModelRegistry::new(None);
        let first = registry.by_capability("card");
        assert_eq!(first.first().map(|m| m.name.as_str()), Some("gemini-2.5-flash-image"));
        assert!(registry.ensure("dryrun-card-1", "edit").is_some());
        assert!(registry.ensure("dryrun-card-1", "text").is_none());
        assert!(registry.get("sdxl").is_none());
    }
}
