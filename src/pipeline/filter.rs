use std::collections::BTreeMap;

use crate::pipeline::detector::Detection;

/// Drop boxes wider than `max_ratio` of the frame (lesions are small; wide
/// boxes are shadows, hair or a whole cheek) and degenerate boxes.
pub fn filter_boxes(detections: Vec<Detection>, frame_width: u32, max_ratio: f32) -> Vec<Detection> {
    let max_width = frame_width as f32 * max_ratio;
    detections
        .into_iter()
        .filter(|d| {
            let (w, h) = (d.bbox.width(), d.bbox.height());
            w > 0.0 && h > 0.0 && w <= max_width
        })
        .collect()
}

/// Highest confidence first; stable for equal scores, NaN last.
pub fn sort_by_confidence(detections: &mut [Detection]) {
    detections.sort_by(|a, b| match (a.confidence.is_nan(), b.confidence.is_nan()) {
        (true, true) => std::cmp::Ordering::Equal,
        (true, false) => std::cmp::Ordering::Greater,
        (false, true) => std::cmp::Ordering::Less,
        _ => b.confidence.partial_cmp(&a.confidence).unwrap_or(std::cmp::Ordering::Equal),
    });
}

pub fn translate(detections: Vec<Detection>, dx: f32, dy: f32) -> Vec<Detection> {
    detections
        .into_iter()
        .map(|mut d| {
            d.bbox = d.bbox.translate(dx, dy);
            d
        })
        .collect()
}

pub fn count_by_label(detections: &[Detection]) -> BTreeMap<String, usize> {
    let mut counts = BTreeMap::new();
    for d in detections {
        *counts.entry(d.label.clone()).or_insert(0) += 1;
    }
    counts
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::bbox::BoundingBox;

    fn det(label: &str, confidence: f32, x1: f32, x2: f32) -> Detection {
        Detection {
            label: label.to_string(),
            class_id: 0,
            confidence,
            bbox: BoundingBox::new(x1, 10.0, x2, 20.0),
        }
    }

    #[test]
    fn wide_boxes_are_dropped() {
        let dets = vec![det("papule", 0.9, 0.0, 15.0), det("papule", 0.8, 0.0, 15.1), det("nodule", 0.7, 5.0, 5.0)];
        let kept = filter_boxes(dets, 100, 0.15);
        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].confidence, 0.9);
    }

    #[test]
    fn sort_is_descending_with_nan_last() {
        let mut dets = vec![det("a", 0.3, 0.0, 1.0), det("b", f32::NAN, 0.0, 1.0), det("c", 0.9, 0.0, 1.0), det("d", 0.3, 0.0, 1.0)];
        sort_by_confidence(&mut dets);
        let labels: Vec<&str> = dets.iter().map(|d| d.label.as_str()).collect();
        assert_eq!(labels, vec!["c", "a", "d", "b"]);
    }

    #[test]
    fn counts_group_by_label() {
        let dets = vec![det("papule", 0.9, 0.0, 1.0), det("pustule", 0.8, 0.0, 1.0), det("papule", 0.7, 0.0, 1.0)];
        let counts = count_by_label(&dets);
        assert_eq!(counts.get("papule"), Some(&2));
        assert_eq!(counts.get("pustule"), Some(&1));
    }

    #[test]
    fn translate_moves_into_frame_coordinates() {
        let moved = translate(vec![det("a", 0.5, 1.0, 2.0)], 10.0, 5.0);
        assert_eq!(moved[0].bbox, BoundingBox::new(11.0, 15.0, 12.0, 25.0));
    }
}
