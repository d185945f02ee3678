use mcp_types::Tool;
use mcp_types::ToolInputSchema;
use schemars::JsonSchema;
use schemars::r#gen::SchemaSettings;
use serde::Deserialize;
use serde::Serialize;

pub(crate) const WRITE_SLIDE_TITLE_TOOL_NAME: &str = "write-slide-title";
pub(crate) const WRITE_SLIDE_CONTENT_TOOL_NAME: &str = "write-slide-content";

#[derive(Debug, Clone, Deserialize, Serialize, JsonSchema)]
pub(crate) struct WriteSlideTitleParam {
    /// The text to write to the slide title.
    pub text: String,
}

#[derive(Debug, Clone, Deserialize, Serialize, JsonSchema)]
pub(crate) struct WriteSlideContentParam {
    /// The text to write to the slide content area.
    pub text: String,
}

pub(crate) fn write_slide_title_tool() -> Tool {
    Tool {
        name: WRITE_SLIDE_TITLE_TOOL_NAME.to_string(),
        title: Some("Write Slide Title".to_string()),
        description: Some(
            "Replace the text of the title text box in the configured presentation.".to_string(),
        ),
        input_schema: input_schema_for::<WriteSlideTitleParam>(),
        annotations: None,
    }
}

pub(crate) fn write_slide_content_tool() -> Tool {
    Tool {
        name: WRITE_SLIDE_CONTENT_TOOL_NAME.to_string(),
        title: Some("Write Slide Content".to_string()),
        description: Some(
            "Replace the text of the content text box in the configured presentation.".to_string(),
        ),
        input_schema: input_schema_for::<WriteSlideContentParam>(),
        annotations: None,
    }
}

/// Derive a tool input schema from the param struct so the two never
/// drift apart.
fn input_schema_for<T: JsonSchema>() -> ToolInputSchema {
    let schema = SchemaSettings::draft2019_09()
        .with(|settings| {
            settings.inline_subschemas = true;
            settings.option_add_null_type = false;
        })
        .into_generator()
        .into_root_schema_for::<T>();

    #[expect(clippy::expect_used)]
    let schema_value =
        serde_json::to_value(&schema).expect("generated schema serializes to JSON");
    #[expect(clippy::expect_used)]
    serde_json::from_value(schema_value).expect("generated schema is an object schema")
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn title_tool_schema_requires_text() {
        let tool = write_slide_title_tool();
        assert_eq!(tool.name, "write-slide-title");
        assert_eq!(tool.input_schema.r#type, "object");
        assert_eq!(tool.input_schema.required, Some(vec!["text".to_string()]));

        let properties = tool.input_schema.properties.unwrap();
        assert_eq!(
            properties["text"],
            json!({
                "description": "The text to write to the slide title.",
                "type": "string"
            })
        );
    }

    #[test]
    fn content_tool_schema_requires_text() {
        let tool = write_slide_content_tool();
        assert_eq!(tool.name, "write-slide-content");
        assert_eq!(tool.input_schema.required, Some(vec!["text".to_string()]));
    }
}
