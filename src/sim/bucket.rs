//! Bucket scoring zones along the bottom of the field

use serde::{Deserialize, Serialize};

use super::collision::Rect;

/// Special behavior assigned to a bucket for one round
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub enum BucketKind {
    #[default]
    Normal,
    /// Value scaled by a random factor drawn once per landing
    Mystery { min: f64, max: f64 },
    /// Value scaled by a fixed factor
    Lucky { multiplier: f64 },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bucket {
    pub index: usize,
    pub value: u32,
    pub label: String,
    pub rect: Rect,
    pub kind: BucketKind,
}

impl Bucket {
    pub fn new(index: usize, value: u32, rect: Rect) -> Self {
        Self {
            index,
            value,
            label: value.to_string(),
            rect,
            kind: BucketKind::Normal,
        }
    }
}

/// Lay out equal-width buckets across the bottom of a field
pub fn layout_buckets(values: &[u32], field_width: f32, field_height: f32, height: f32) -> Vec<Bucket> {
    if values.is_empty() {
        return Vec::new();
    }
    let width = field_width / values.len() as f32;
    values
        .iter()
        .enumerate()
        .map(|(i, &value)| {
            let rect = Rect::from_xywh(i as f32 * width, field_height - height, width, height);
            Bucket::new(i, value, rect)
        })
        .collect()
}

/// Index of the highest-value bucket (first one on ties)
pub fn best_bucket(buckets: &[Bucket]) -> Option<&Bucket> {
    buckets
        .iter()
        .reduce(|best, b| if b.value > best.value { b } else { best })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_layout_covers_width() {
        let buckets = layout_buckets(&[10, 25, 50, 25, 10], 800.0, 600.0, 60.0);
        assert_eq!(buckets.len(), 5);
        assert_eq!(buckets[0].rect.min.x, 0.0);
        assert!((buckets[4].rect.max.x - 800.0).abs() < 0.001);
        assert_eq!(buckets[2].rect.min.y, 540.0);
        assert_eq!(buckets[2].label, "50");
        assert!(layout_buckets(&[], 800.0, 600.0, 60.0).is_empty());
    }

    #[test]
    fn test_best_bucket_first_on_tie() {
        let buckets = layout_buckets(&[10, 100, 50, 100], 800.0, 600.0, 60.0);
        assert_eq!(best_bucket(&buckets).map(|b| b.index), Some(1));
    }
}
