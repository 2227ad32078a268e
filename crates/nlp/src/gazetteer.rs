use std::collections::HashMap;
use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use regex::{Regex, RegexBuilder};
use serde::Deserialize;
use tracing::debug;

use crate::{seed, EntityLabel, EntityRecognizer, RecognizedEntity};

const PATTERN_SIZE_LIMIT: usize = 64 << 20;

#[derive(Debug, Deserialize)]
struct GazetteerEntry {
    text: String,
    label: String,
}

/// Dictionary-backed recognizer: a labelled list of surface forms compiled
/// into one case-sensitive alternation that prefers the longest name at each
/// position.
#[derive(Debug, Clone)]
pub struct GazetteerRecognizer {
    model_name: &'static str,
    pattern: Regex,
    labels: HashMap<String, EntityLabel>,
}

impl GazetteerRecognizer {
    pub fn from_jsonl(path: impl AsRef<Path>, model_name: &'static str) -> Result<Self> {
        let raw = fs::read_to_string(path.as_ref()).with_context(|| {
            format!("failed reading gazetteer at {}", path.as_ref().display())
        })?;

        let mut entries = Vec::new();
        for line in raw.lines().map(str::trim).filter(|line| !line.is_empty()) {
            let entry: GazetteerEntry =
                serde_json::from_str(line).context("invalid jsonl gazetteer line")?;
            match EntityLabel::parse(&entry.label) {
                Some(label) => entries.push((entry.text, label)),
                None => debug!(label = %entry.label, "skipping gazetteer entry with unknown label"),
            }
        }

        Self::from_entries(model_name, entries)
    }

    pub fn from_entries<I, S>(model_name: &'static str, entries: I) -> Result<Self>
    where
        I: IntoIterator<Item = (S, EntityLabel)>,
        S: AsRef<str>,
    {
        let mut labels = HashMap::new();
        for (text, label) in entries {
            let text = text.as_ref().trim();
            if !has_word_edges(text) {
                continue;
            }
            labels.entry(text.to_string()).or_insert(label);
        }

        if labels.is_empty() {
            anyhow::bail!("gazetteer produced zero usable entries");
        }

        let mut names = labels.keys().map(String::as_str).collect::<Vec<_>>();
        names.sort_by(|a, b| {
            b.chars()
                .count()
                .cmp(&a.chars().count())
                .then_with(|| a.cmp(b))
        });

        let alternation = names
            .iter()
            .map(|name| regex::escape(name))
            .collect::<Vec<_>>()
            .join("|");
        let pattern = RegexBuilder::new(&format!(r"\b(?:{})\b", alternation))
            .size_limit(PATTERN_SIZE_LIMIT)
            .build()
            .context("failed compiling gazetteer pattern")?;

        Ok(Self {
            model_name,
            pattern,
            labels,
        })
    }

    pub fn seed() -> Self {
        Self::from_entries("gazetteer-seed", seed::entries()).expect("seed gazetteer compiles")
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }
}

impl EntityRecognizer for GazetteerRecognizer {
    fn model_name(&self) -> &'static str {
        self.model_name
    }

    fn recognize(&self, text: &str) -> Vec<RecognizedEntity> {
        self.pattern
            .find_iter(text)
            .filter_map(|found| {
                let label = *self.labels.get(found.as_str())?;
                Some(RecognizedEntity {
                    text: found.as_str().to_string(),
                    label,
                    start: found.start(),
                    end: found.end(),
                })
            })
            .collect()
    }
}

/// `\b` only anchors against word characters, so names must start and end
/// with one.
fn has_word_edges(text: &str) -> bool {
    match (text.chars().next(), text.chars().last()) {
        (Some(first), Some(last)) => first.is_alphanumeric() && last.is_alphanumeric(),
        _ => false,
    }
}
