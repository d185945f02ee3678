//! Wire types for the subset of the Slides API the writer touches. Field
//! names mirror the JSON representation (camelCase); everything the writer
//! does not read is left out and ignored during deserialization.

use serde::Deserialize;
use serde::Serialize;

pub const SHAPE_TYPE_TEXT_BOX: &str = "TEXT_BOX";

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Presentation {
    #[serde(default)]
    pub presentation_id: String,
    #[serde(default)]
    pub slides: Vec<Page>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Page {
    #[serde(default)]
    pub object_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page_elements: Option<Vec<PageElement>>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageElement {
    #[serde(default)]
    pub object_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transform: Option<Transform>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shape: Option<Shape>,
}

/// Affine transform placing an element on its page. Only the vertical
/// offset matters for ordering; the rest is carried through untouched.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Transform {
    #[serde(default)]
    pub scale_x: f64,
    #[serde(default)]
    pub scale_y: f64,
    #[serde(default)]
    pub translate_x: f64,
    #[serde(default)]
    pub translate_y: f64,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Shape {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shape_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<TextContent>,
}

impl Shape {
    pub fn is_text_box(&self) -> bool {
        self.shape_type.as_deref() == Some(SHAPE_TYPE_TEXT_BOX)
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TextContent {
    #[serde(default)]
    pub text_elements: Vec<TextElement>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TextElement {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text_run: Option<TextRun>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TextRun {
    #[serde(default)]
    pub content: String,
}

/// A single `batchUpdate` request, externally tagged the way the API
/// expects (`{"deleteText": {...}}`, `{"insertText": {...}}`).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Request {
    #[serde(rename_all = "camelCase")]
    DeleteText {
        object_id: String,
        text_range: TextRange,
    },
    #[serde(rename_all = "camelCase")]
    InsertText {
        object_id: String,
        text: String,
        insertion_index: u32,
    },
}

impl Request {
    /// Clear all text in a shape.
    pub fn delete_all_text(object_id: &str) -> Self {
        Request::DeleteText {
            object_id: object_id.to_string(),
            text_range: TextRange {
                range_type: "ALL".to_string(),
            },
        }
    }

    /// Insert text at the start of a shape.
    pub fn insert_text(object_id: &str, text: &str) -> Self {
        Request::InsertText {
            object_id: object_id.to_string(),
            text: text.to_string(),
            insertion_index: 0,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TextRange {
    #[serde(rename = "type")]
    pub range_type: String,
}

#[derive(Serialize)]
pub(crate) struct BatchUpdateBody {
    pub requests: Vec<Request>,
}

#[derive(Clone, Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchUpdateResponse {
    #[serde(default)]
    pub presentation_id: String,
    #[serde(default)]
    pub replies: Vec<serde_json::Value>,
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn delete_request_matches_wire_format() {
        let value = serde_json::to_value(Request::delete_all_text("shape-1")).unwrap();
        assert_eq!(
            value,
            json!({
                "deleteText": {
                    "objectId": "shape-1",
                    "textRange": { "type": "ALL" }
                }
            })
        );
    }

    #[test]
    fn insert_request_matches_wire_format() {
        let value = serde_json::to_value(Request::insert_text("shape-1", "Hello")).unwrap();
        assert_eq!(
            value,
            json!({
                "insertText": {
                    "objectId": "shape-1",
                    "text": "Hello",
                    "insertionIndex": 0
                }
            })
        );
    }

    #[test]
    fn presentation_parses_nested_elements() {
        let presentation: Presentation = serde_json::from_value(json!({
            "presentationId": "pres-1",
            "slides": [{
                "objectId": "slide-1",
                "pageElements": [{
                    "objectId": "el-1",
                    "transform": { "translateX": 10.0, "translateY": 50.0 },
                    "shape": {
                        "shapeType": "TEXT_BOX",
                        "text": { "textElements": [{ "textRun": { "content": "Title" } }] }
                    }
                }]
            }]
        }))
        .unwrap();

        assert_eq!(presentation.presentation_id, "pres-1");
        let element = &presentation.slides[0].page_elements.as_ref().unwrap()[0];
        assert!(element.shape.as_ref().unwrap().is_text_box());
        assert_eq!(element.transform.unwrap().translate_y, 50.0);
    }
}
