use ndarray::ArrayViewD;
use preprocess::ScaleRatios;
use serde::Serialize;

/// Minimum per-detection record width: `[batch, x0, y0, x1, y1, class, score]`.
const MIN_STRIDE: usize = 7;

/// One detection in original-image pixel coordinates.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Detection {
    pub class_id: u32,
    pub probability: f32,
    /// `[x, y, width, height]`
    pub bounding: [f32; 4],
}

/// Maps model-input-space coordinates back to original-image pixels.
///
/// The forward transform was pad-to-square then resize, so the inverse is a
/// per-axis multiply by pad ratio x display ratio. The two axes are tracked
/// independently: a non-square image pads only one of them.
#[derive(Debug, Clone, Copy)]
pub struct BoxTransform {
    pub pad: ScaleRatios,
    pub display: ScaleRatios,
}

impl BoxTransform {
    pub fn new(pad: ScaleRatios, display: ScaleRatios) -> Self {
        Self { pad, display }
    }

    /// Build the transform from the original image and model input sizes.
    pub fn from_dims(pad: ScaleRatios, original: (u32, u32), input: (u32, u32)) -> Self {
        Self {
            pad,
            display: ScaleRatios {
                x: original.0 as f32 / input.0 as f32,
                y: original.1 as f32 / input.1 as f32,
            },
        }
    }

    pub fn scale_x(&self) -> f32 {
        self.pad.x * self.display.x
    }

    pub fn scale_y(&self) -> f32 {
        self.pad.y * self.display.y
    }
}

/// Slice the raw model output into `Detection` records.
///
/// The output is `[rows, stride]` with one detection per row:
/// index 0 is the batch index (unused), then box corners `x0 y0 x1 y1`,
/// class id and confidence score. Corner coordinates are converted to
/// `[x, y, w, h]` and scaled to original-image pixels per axis.
pub fn parse_detections(
    output: &ArrayViewD<f32>,
    transform: &BoxTransform,
) -> anyhow::Result<Vec<Detection>> {
    if output.ndim() != 2 {
        anyhow::bail!(
            "Unexpected output rank {}: expected [rows, stride]",
            output.ndim()
        );
    }

    let stride = output.shape()[1];
    if stride < MIN_STRIDE {
        anyhow::bail!(
            "Output stride {} too small: need at least {} fields per detection",
            stride,
            MIN_STRIDE
        );
    }

    let sx = transform.scale_x();
    let sy = transform.scale_y();

    let rows = output.shape()[0];
    let mut detections = Vec::with_capacity(rows);

    for i in 0..rows {
        let x0 = output[[i, 1]];
        let y0 = output[[i, 2]];
        let x1 = output[[i, 3]];
        let y1 = output[[i, 4]];
        let class_id = output[[i, 5]] as u32;
        let score = output[[i, 6]];

        let w = x1 - x0;
        let h = y1 - y0;

        detections.push(Detection {
            class_id,
            probability: score,
            bounding: [x0 * sx, y0 * sy, w * sx, h * sy],
        });
    }

    tracing::debug!(count = detections.len(), "Parsed detections");

    Ok(detections)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::{Array, IxDyn};

    fn identity_transform() -> BoxTransform {
        BoxTransform::new(
            ScaleRatios { x: 1.0, y: 1.0 },
            ScaleRatios { x: 1.0, y: 1.0 },
        )
    }

    /// Build a [rows, stride] output array from per-detection records
    fn create_output(records: &[Vec<f32>], stride: usize) -> Array<f32, IxDyn> {
        let mut data = Vec::with_capacity(records.len() * stride);
        for r in records {
            assert_eq!(r.len(), stride);
            data.extend_from_slice(r);
        }
        Array::from_shape_vec(IxDyn(&[records.len(), stride]), data).unwrap()
    }

    #[test]
    fn test_worked_example() {
        // record [_, 10, 10, 50, 50, 1, 0.9] with unit ratios
        let output = create_output(&[vec![0.0, 10.0, 10.0, 50.0, 50.0, 1.0, 0.9]], 7);
        let detections = parse_detections(&output.view(), &identity_transform()).unwrap();

        assert_eq!(detections.len(), 1);
        assert_eq!(
            detections[0],
            Detection {
                class_id: 1,
                probability: 0.9,
                bounding: [10.0, 10.0, 40.0, 40.0],
            }
        );
    }

    #[test]
    fn test_one_detection_per_stride() {
        let records: Vec<Vec<f32>> = (0..5)
            .map(|i| {
                let base = i as f32 * 10.0;
                vec![0.0, base, base, base + 5.0, base + 5.0, i as f32, 0.5]
            })
            .collect();
        let output = create_output(&records, 7);

        let detections = parse_detections(&output.view(), &identity_transform()).unwrap();

        assert_eq!(detections.len(), 5);
        for (i, det) in detections.iter().enumerate() {
            assert_eq!(det.class_id, i as u32);
            assert_eq!(det.bounding[0], i as f32 * 10.0);
            assert_eq!(det.bounding[2], 5.0);
        }
    }

    #[test]
    fn test_wider_stride_ignores_trailing_fields() {
        // Some exports append extra per-row fields; offsets 1..=6 still hold
        let output = create_output(&[vec![0.0, 4.0, 8.0, 14.0, 28.0, 2.0, 0.75, 99.0, 99.0]], 9);
        let detections = parse_detections(&output.view(), &identity_transform()).unwrap();

        assert_eq!(detections.len(), 1);
        assert_eq!(detections[0].class_id, 2);
        assert_eq!(detections[0].probability, 0.75);
        assert_eq!(detections[0].bounding, [4.0, 8.0, 10.0, 20.0]);
    }

    #[test]
    fn test_per_axis_scaling() {
        // 800x600 original, 640x640 input: pad.y = 800/600, display = orig/input.
        // Combined scale per axis is max(w, h) / input side on both axes.
        let pad = ScaleRatios {
            x: 1.0,
            y: 800.0 / 600.0,
        };
        let transform = BoxTransform::from_dims(pad, (800, 600), (640, 640));

        let output = create_output(&[vec![0.0, 64.0, 64.0, 128.0, 128.0, 0.0, 0.9]], 7);
        let detections = parse_detections(&output.view(), &transform).unwrap();

        let sx = 1.0 * (800.0 / 640.0);
        let sy = (800.0 / 600.0) * (600.0 / 640.0);
        let det = &detections[0];
        assert!((det.bounding[0] - 64.0 * sx).abs() < 1e-4);
        assert!((det.bounding[1] - 64.0 * sy).abs() < 1e-4);
        assert!((det.bounding[2] - 64.0 * sx).abs() < 1e-4);
        assert!((det.bounding[3] - 64.0 * sy).abs() < 1e-4);
    }

    #[test]
    fn test_empty_output() {
        let output = Array::<f32, _>::zeros(IxDyn(&[0, 7]));
        let detections = parse_detections(&output.view(), &identity_transform()).unwrap();
        assert!(detections.is_empty());
    }

    #[test]
    fn test_narrow_stride_rejected() {
        let output = Array::<f32, _>::zeros(IxDyn(&[2, 6]));
        let result = parse_detections(&output.view(), &identity_transform());

        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("stride"));
    }

    #[test]
    fn test_non_matrix_output_rejected() {
        let output = Array::<f32, _>::zeros(IxDyn(&[1, 2, 7]));
        assert!(parse_detections(&output.view(), &identity_transform()).is_err());
    }
}
