use ab_glyph::{FontRef, PxScale};
use detector::Detection;
use image::{Rgb, RgbImage};
use imageproc::drawing::{draw_filled_rect_mut, draw_hollow_rect_mut, draw_text_mut};
use imageproc::rect::Rect;

/// Fixed palette indexed by class id modulo its length; class ids beyond the
/// palette alias visually.
const PALETTE: [[u8; 3]; 3] = [
    [255, 0, 0],   // red
    [0, 255, 0],   // green
    [255, 255, 0], // yellow
];

const CLASS_NAMES: [&str; 3] = ["kebab", "steak", "chicken"];

const STROKE_WIDTH: i32 = 5;
const LABEL_WIDTH: u32 = 200;
const LABEL_HEIGHT: f32 = 40.0;
/// Boxes whose top edge is within this many pixels of the image top get the
/// label tag drawn at the box top instead of above it.
const LABEL_TOP_MARGIN: f32 = 20.0;
const FONT_SIZE: f32 = 32.0;
const TEXT_PADDING: i32 = 4;

pub fn class_color(class_id: u32) -> Rgb<u8> {
    Rgb(PALETTE[class_id as usize % PALETTE.len()])
}

pub fn class_name(class_id: u32) -> String {
    match CLASS_NAMES.get(class_id as usize) {
        Some(name) => (*name).to_string(),
        None => format!("class {}", class_id),
    }
}

/// Top edge of the label tag for a box with top coordinate `y0`: above the
/// box unless that would clip at the image top.
pub fn label_origin(y0: f32) -> f32 {
    if y0 > LABEL_TOP_MARGIN {
        y0 - LABEL_HEIGHT
    } else {
        y0
    }
}

/// Draws stroked boxes and filled label tags over the original image.
pub struct Renderer {
    font: FontRef<'static>,
}

impl Default for Renderer {
    fn default() -> Self {
        let font = FontRef::try_from_slice(include_bytes!("../assets/DejaVuSans.ttf"))
            .expect("embedded font is valid");
        Self { font }
    }
}

impl Renderer {
    pub fn annotate(&self, image: &mut RgbImage, detections: &[Detection]) {
        for det in detections {
            self.draw_detection(image, det);
        }
    }

    fn draw_detection(&self, image: &mut RgbImage, det: &Detection) {
        let [x, y, w, h] = det.bounding;
        let color = class_color(det.class_id);

        if w < 1.0 || h < 1.0 {
            tracing::debug!(?det.bounding, "Skipping degenerate box");
            return;
        }

        let x0 = x.round() as i32;
        let y0 = y.round() as i32;
        let bw = w.round() as u32;
        let bh = h.round() as u32;

        // 5px stroke: concentric 1px rectangles, insetting until degenerate
        for t in 0..STROKE_WIDTH {
            let (iw, ih) = (bw as i32 - 2 * t, bh as i32 - 2 * t);
            if iw < 1 || ih < 1 {
                break;
            }
            draw_hollow_rect_mut(
                image,
                Rect::at(x0 + t, y0 + t).of_size(iw as u32, ih as u32),
                color,
            );
        }

        let label_y = label_origin(y) as i32;
        draw_filled_rect_mut(
            image,
            Rect::at(x0, label_y).of_size(LABEL_WIDTH, LABEL_HEIGHT as u32),
            color,
        );

        let label = format!("{} {:.2}", class_name(det.class_id), det.probability);
        draw_text_mut(
            image,
            Rgb([0u8, 0u8, 0u8]),
            x0 + TEXT_PADDING,
            label_y + TEXT_PADDING,
            PxScale::from(FONT_SIZE),
            &self.font,
            &label,
        );
    }
}
