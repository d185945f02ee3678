//! Locating target shapes inside a presentation. Text boxes are identified
//! by shape type and ordered by their vertical offset on the page: the
//! topmost box is the title, the one below it is the content.

use crate::Result;
use crate::SlidesError;
use crate::models::Page;
use crate::models::Presentation;

/// The two write targets on a slide, resolved by vertical position.
#[derive(Clone, Debug, PartialEq)]
pub struct TextBoxPair {
    pub title_id: String,
    pub content_id: String,
}

/// The deck-title shape: the single text box on the configured title
/// slide (1-based).
pub fn find_title_shape(presentation: &Presentation, slide_number: usize) -> Result<String> {
    let slide = slide_at(presentation, slide_number)?;
    let mut boxes = positioned_text_boxes(slide);
    match boxes.len() {
        1 => Ok(boxes.remove(0).1),
        0 => Err(SlidesError::NotFound(format!(
            "no text box found on slide {slide_number}"
        ))),
        n => Err(SlidesError::InvalidState(format!(
            "expected a single text box on slide {slide_number}, found {n}"
        ))),
    }
}

/// The title/content text-box pair on a slide (1-based). Fails with
/// `InvalidState` when fewer than two text boxes are present.
pub fn resolve_text_boxes(presentation: &Presentation, slide_number: usize) -> Result<TextBoxPair> {
    let slide = slide_at(presentation, slide_number)?;
    let boxes = positioned_text_boxes(slide);
    if boxes.len() < 2 {
        return Err(SlidesError::InvalidState(format!(
            "slide {slide_number} has {} text box(es); need a title and a content box",
            boxes.len()
        )));
    }
    Ok(TextBoxPair {
        title_id: boxes[0].1.clone(),
        content_id: boxes[1].1.clone(),
    })
}

fn slide_at(presentation: &Presentation, slide_number: usize) -> Result<&Page> {
    let not_found =
        || SlidesError::NotFound(format!("could not find slide number {slide_number}"));
    let index = slide_number.checked_sub(1).ok_or_else(not_found)?;
    let slide = presentation.slides.get(index).ok_or_else(not_found)?;
    if slide
        .page_elements
        .as_ref()
        .is_none_or(|elements| elements.is_empty())
    {
        return Err(not_found());
    }
    Ok(slide)
}

/// Text boxes with a transform, sorted by vertical offset. The sort is
/// stable, so boxes at the same offset keep their document order.
fn positioned_text_boxes(slide: &Page) -> Vec<(f64, String)> {
    let mut boxes: Vec<(f64, String)> = slide
        .page_elements
        .iter()
        .flatten()
        .filter_map(|element| {
            let shape = element.shape.as_ref()?;
            if !shape.is_text_box() {
                return None;
            }
            let transform = element.transform.as_ref()?;
            Some((transform.translate_y, element.object_id.clone()))
        })
        .collect();
    boxes.sort_by(|a, b| a.0.total_cmp(&b.0));
    boxes
}
