//! Facet breakdown
//!
//! Slices per-example results by the fixed metadata schema and counts, per
//! facet value, how many examples matched gold placeholders perfectly.

use serde::ser::{Serialize, SerializeMap, Serializer};

use anon_core::{ExampleMetadata, Facet};

/// Perfect-match count for one facet value
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BucketCount {
    pub value: &'static str,
    /// Examples in this bucket with F1 of exactly 1.0
    pub correct: usize,
    /// All examples in this bucket regardless of score
    pub total: usize,
}

impl BucketCount {
    /// `"correct/total"`
    pub fn ratio(&self) -> String {
        format!("{}/{}", self.correct, self.total)
    }
}

/// Breakdown table: facet -> bucket counts, in schema order
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FacetBreakdown {
    rows: Vec<(Facet, Vec<BucketCount>)>,
}

impl FacetBreakdown {
    /// Bucket counts for a facet
    pub fn buckets(&self, facet: Facet) -> &[BucketCount] {
        self.rows
            .iter()
            .find(|(f, _)| *f == facet)
            .map(|(_, buckets)| buckets.as_slice())
            .unwrap_or(&[])
    }

    pub fn bucket(&self, facet: Facet, value: &str) -> Option<&BucketCount> {
        self.buckets(facet).iter().find(|b| b.value == value)
    }

    /// `"correct/total"` for a facet value in the schema
    pub fn ratio(&self, facet: Facet, value: &str) -> Option<String> {
        self.bucket(facet, value).map(BucketCount::ratio)
    }

    /// Plain-text rendering, one facet per block
    pub fn render(&self) -> String {
        let mut out = String::new();
        for (facet, buckets) in &self.rows {
            out.push_str(&format!("{facet}:\n"));
            for bucket in buckets {
                out.push_str(&format!("  {:<20} {}\n", bucket.value, bucket.ratio()));
            }
        }
        out
    }
}

impl Serialize for FacetBreakdown {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.rows.len()))?;
        for (facet, buckets) in &self.rows {
            map.serialize_entry(facet.key(), &BucketMap(buckets))?;
        }
        map.end()
    }
}

struct BucketMap<'a>(&'a [BucketCount]);

impl Serialize for BucketMap<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for bucket in self.0 {
            map.serialize_entry(bucket.value, &bucket.ratio())?;
        }
        map.end()
    }
}

/// Count perfect matches per facet value.
///
/// An example counts toward a bucket's total when its metadata value equals
/// the bucket, and toward `correct` only when its F1 is exactly 1.0. Values
/// outside the schema are not reported; examples without the facet key are
/// left out of that facet entirely.
pub fn facet_breakdown<'a, I>(examples: I) -> FacetBreakdown
where
    I: IntoIterator<Item = (&'a ExampleMetadata, f64)>,
{
    let mut rows: Vec<(Facet, Vec<BucketCount>)> = Facet::ALL
        .iter()
        .map(|facet| {
            let buckets = facet
                .allowed_values()
                .iter()
                .map(|value| BucketCount {
                    value: *value,
                    correct: 0,
                    total: 0,
                })
                .collect();
            (*facet, buckets)
        })
        .collect();

    for (metadata, f1) in examples {
        let perfect = f1 == 1.0;
        for (facet, buckets) in rows.iter_mut() {
            let Some(value) = metadata.get(*facet) else {
                continue;
            };
            if let Some(bucket) = buckets.iter_mut().find(|b| b.value == value) {
                bucket.total += 1;
                if perfect {
                    bucket.correct += 1;
                }
            }
        }
    }

    FacetBreakdown { rows }
}

// ============================================================================
// Tests
// ============================================================================
