//! Tool schema translation
//!
//! Maps provider tool descriptors to model function declarations. Schemas are
//! passed through untouched; the provider is trusted to emit valid JSON Schema.

use std::collections::HashSet;

use crate::logging::Logger;
use crate::types::{FunctionDeclaration, ToolDescriptor};

/// Translate one descriptor
pub fn to_function_declaration(tool: &ToolDescriptor) -> FunctionDeclaration {
    FunctionDeclaration {
        name: tool.name.clone(),
        description: tool.description.clone(),
        parameters_schema: tool.input_schema.clone(),
        response_schema: tool.output_schema.clone(),
    }
}

/// Translate a listing, keeping the first descriptor for each name
pub fn translate_all(tools: &[ToolDescriptor], logger: &dyn Logger) -> Vec<FunctionDeclaration> {
    let mut seen = HashSet::new();
    let mut declarations = Vec::with_capacity(tools.len());

    for tool in tools {
        if !seen.insert(tool.name.as_str()) {
            logger.warn(&format!(
                "[SchemaTranslator] Duplicate tool name '{}' in listing, keeping the first",
                tool.name
            ));
            continue;
        }
        declarations.push(to_function_declaration(tool));
    }

    declarations
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logging::NoOpLogger;
    use serde_json::json;

    #[test]
    fn test_declaration_echoes_descriptor() {
        let input = json!({
            "type": "object",
            "properties": { "city": { "type": "string", "enum": ["nyc", "sf", "boston"] } },
            "required": ["city"]
        });
        let output = json!({ "type": "object", "properties": { "time": { "type": "string" } } });
        let tool = ToolDescriptor::new("cityTime", "Get the current time in a city")
            .with_input_schema(input.clone())
            .with_output_schema(output.clone());

        let declaration = to_function_declaration(&tool);

        assert_eq!(declaration.name, tool.name);
        assert_eq!(declaration.description, tool.description);
        assert_eq!(
            serde_json::to_string(&declaration.parameters_schema).unwrap(),
            serde_json::to_string(&input).unwrap()
        );
        assert_eq!(declaration.response_schema, Some(output));
    }

    #[test]
    fn test_empty_listing_yields_no_declarations() {
        assert!(translate_all(&[], &NoOpLogger).is_empty());
    }

    #[test]
    fn test_duplicate_names_keep_first() {
        let tools = vec![
            ToolDescriptor::new("cityTime", "first"),
            ToolDescriptor::new("weather", "weather"),
            ToolDescriptor::new("cityTime", "second"),
        ];

        let declarations = translate_all(&tools, &NoOpLogger);

        assert_eq!(declarations.len(), 2);
        assert_eq!(declarations[0].description, "first");
        assert_eq!(declarations[1].name, "weather");
    }
}
