//! Aggregate statistics over a set of dreams.

use crate::DreamType;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Number of dreams per type.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TypeCounts {
    pub normal: u64,
    pub lucid: u64,
    pub vivid: u64,
    pub false_awakening: u64,
    pub sleep_paralysis: u64,
}

impl TypeCounts {
    pub fn increment(&mut self, dream_type: DreamType) {
        *self.slot(dream_type) += 1;
    }

    pub fn get(&self, dream_type: DreamType) -> u64 {
        match dream_type {
            DreamType::Normal => self.normal,
            DreamType::Lucid => self.lucid,
            DreamType::Vivid => self.vivid,
            DreamType::FalseAwakening => self.false_awakening,
            DreamType::SleepParalysis => self.sleep_paralysis,
        }
    }

    fn slot(&mut self, dream_type: DreamType) -> &mut u64 {
        match dream_type {
            DreamType::Normal => &mut self.normal,
            DreamType::Lucid => &mut self.lucid,
            DreamType::Vivid => &mut self.vivid,
            DreamType::FalseAwakening => &mut self.false_awakening,
            DreamType::SleepParalysis => &mut self.sleep_paralysis,
        }
    }
}

/// How often a tag was used.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TagCount {
    pub tag: String,
    pub count: u64,
}

/// Counts per type plus a tag frequency table.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DreamStats {
    pub total: u64,
    pub by_type: TypeCounts,
    /// Most used first; equal counts in alphabetical order.
    pub tags: Vec<TagCount>,
}

impl DreamStats {
    /// Aggregate `(type, tags)` pairs, one per dream.
    pub fn from_entries<'a, I>(entries: I) -> Self
    where
        I: IntoIterator<Item = (DreamType, &'a [String])>,
    {
        let mut total = 0;
        let mut by_type = TypeCounts::default();
        let mut tag_counts: HashMap<&'a str, u64> = HashMap::new();

        for (dream_type, tags) in entries {
            total += 1;
            by_type.increment(dream_type);
            for tag in tags {
                *tag_counts.entry(tag.as_str()).or_insert(0) += 1;
            }
        }

        let mut tags: Vec<TagCount> = tag_counts
            .into_iter()
            .map(|(tag, count)| TagCount {
                tag: tag.to_string(),
                count,
            })
            .collect();
        tags.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.tag.cmp(&b.tag)));

        Self {
            total,
            by_type,
            tags,
        }
    }

    /// Share of dreams with the given type, in `0.0..=1.0`.
    pub fn share(&self, dream_type: DreamType) -> f64 {
        if self.total == 0 {
            return 0.0;
        }
        self.by_type.get(dream_type) as f64 / self.total as f64
    }
}
