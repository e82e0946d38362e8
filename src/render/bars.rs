use super::canvas::{Canvas, BLACK, GREEN, LIGHT_GRAY, ORANGE, WHITE};
use super::text::TextOverlay;
use crate::player::FrameView;

const CAPTION_SIZE: f32 = 20.0;
const DROPZONE_SIZE: f32 = 16.0;
const DROPZONE_MESSAGE: &str = "Drop your files to this window!";

/// Draws one frame: spectrum bars while playing, the drop zone otherwise.
pub fn draw(canvas: &mut Canvas, view: &FrameView<'_>, text: Option<&TextOverlay>) {
    canvas.clear(BLACK);
    match *view {
        FrameView::Idle => draw_dropzone(canvas, text),
        FrameView::Playing {
            title,
            bands,
            max_height,
        } => {
            draw_bars(canvas, bands, max_height);
            if let Some(text) = text {
                let caption = format!("Now Playing: {}", title);
                text.draw(canvas, &caption, 40, 40, CAPTION_SIZE, WHITE);
            }
        }
    }
}

/// One column per band, `width / bands` wide, bottom-aligned and at most
/// `max_height` tall.
pub fn draw_bars(canvas: &mut Canvas, bands: &[f32], max_height: f32) {
    if bands.is_empty() {
        return;
    }
    let height = canvas.height() as i32;
    let column_width = (canvas.width() as usize / bands.len()) as i32;
    for (i, &value) in bands.iter().enumerate() {
        let bar = value.min(max_height).max(0.0) as i32;
        let x = i as i32 * column_width;
        let y = height - bar;
        canvas.gradient_rect_v(x, y, column_width, bar, ORANGE, GREEN);
        canvas.stroke_rect(x, y, column_width, bar, BLACK);
    }
}

fn draw_dropzone(canvas: &mut Canvas, text: Option<&TextOverlay>) {
    let (w, h) = (canvas.width() as i32, canvas.height() as i32);
    if let Some(text) = text {
        let tw = text.measure_width(DROPZONE_MESSAGE, DROPZONE_SIZE);
        let x = (w as f32 / 2.0 - tw / 2.0) as i32;
        let y = (h as f32 / 2.0 - DROPZONE_SIZE / 2.0) as i32;
        text.draw(canvas, DROPZONE_MESSAGE, x, y, DROPZONE_SIZE, WHITE);
    }
    canvas.stroke_rect(20, 20, w - 40, h - 40, LIGHT_GRAY);
}
