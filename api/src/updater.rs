//! Text replacement on resolved shapes. The Slides API has no "set text"
//! request; replacing means deleting the existing range and inserting the
//! new text.

use crate::Result;
use crate::SlidesClient;
use crate::models::Presentation;
use crate::models::Request;

/// Whether the element currently holds any text. Deleting from an empty
/// shape is a `batchUpdate` error, so callers check first.
pub fn element_has_text(presentation: &Presentation, element_id: &str) -> bool {
    presentation
        .slides
        .iter()
        .flat_map(|slide| slide.page_elements.iter().flatten())
        .filter(|element| element.object_id == element_id)
        .any(|element| {
            element
                .shape
                .as_ref()
                .and_then(|shape| shape.text.as_ref())
                .is_some_and(|text| !text.text_elements.is_empty())
        })
}

/// Replace the element's text, probing the presentation first to decide
/// whether a delete is needed. Issues the delete and insert as separate
/// `batchUpdate` calls; if the insert fails the element is left empty and
/// the error is surfaced as-is.
pub async fn replace_text(
    client: &SlidesClient,
    presentation_id: &str,
    element_id: &str,
    new_text: &str,
) -> Result<()> {
    let presentation = client.get_presentation(presentation_id, Some("slides")).await?;
    if element_has_text(&presentation, element_id) {
        client
            .batch_update(presentation_id, vec![Request::delete_all_text(element_id)])
            .await?;
    }
    client
        .batch_update(presentation_id, vec![Request::insert_text(element_id, new_text)])
        .await?;
    Ok(())
}

/// Replace the element's text in a single `batchUpdate`, without probing.
/// Suitable when the element is known to hold text already.
pub async fn overwrite_text(
    client: &SlidesClient,
    presentation_id: &str,
    element_id: &str,
    new_text: &str,
) -> Result<()> {
    client
        .batch_update(
            presentation_id,
            vec![
                Request::delete_all_text(element_id),
                Request::insert_text(element_id, new_text),
            ],
        )
        .await?;
    Ok(())
}
