//! Read backend - Walk a page sequence through the reader cache
//!
//! Steps are a comma/space separated script:
//! `next`, `prev`, `start`, `end`, `to:N`, `+N`, `-N`.

use anyhow::{bail, Result};
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::json;
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;

use crate::backends::scan::{load_sequence, SequenceOptions};
use crate::cache::{CacheError, Direction, EntryStatus, Origin, ReaderCache, WindowPolicy};
use crate::core::model::{Meta, ReadError, ResultItem, ResultSet};
use crate::core::render::{RenderConfig, Renderer};
use crate::core::util::{hash_bytes, HashAlgorithm};
use crate::sources::SourceManager;

static STEP_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(?:(next|n)|(prev|previous|p)|(start)|(end)|to:(\d+)|([+-])(\d+))$")
        .expect("Invalid STEP_RE regex")
});

/// One navigation instruction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    Next,
    Previous,
    Start,
    End,
    To(usize),
    Offset(Direction, usize),
}

impl std::str::FromStr for Step {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let caps = STEP_RE
            .captures(s.trim())
            .ok_or_else(|| format!("Unknown step: {}", s))?;

        let number = |i: usize| -> Result<usize, String> {
            caps[i]
                .parse::<usize>()
                .map_err(|e| format!("Invalid number in step {}: {}", s, e))
        };

        if caps.get(1).is_some() {
            Ok(Step::Next)
        } else if caps.get(2).is_some() {
            Ok(Step::Previous)
        } else if caps.get(3).is_some() {
            Ok(Step::Start)
        } else if caps.get(4).is_some() {
            Ok(Step::End)
        } else if caps.get(5).is_some() {
            Ok(Step::To(number(5)?))
        } else {
            let direction = if &caps[6] == "+" {
                Direction::Forward
            } else {
                Direction::Backward
            };
            Ok(Step::Offset(direction, number(7)?))
        }
    }
}

impl std::fmt::Display for Step {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Step::Next => write!(f, "next"),
            Step::Previous => write!(f, "prev"),
            Step::Start => write!(f, "start"),
            Step::End => write!(f, "end"),
            Step::To(index) => write!(f, "to:{}", index),
            Step::Offset(Direction::Forward, n) => write!(f, "+{}", n),
            Step::Offset(Direction::Backward, n) => write!(f, "-{}", n),
        }
    }
}

/// Parse a step script
pub fn parse_steps(script: &str) -> Result<Vec<Step>> {
    let steps = script
        .split(|c: char| c == ',' || c.is_whitespace())
        .filter(|s| !s.is_empty())
        .map(|s| s.parse::<Step>().map_err(anyhow::Error::msg))
        .collect::<Result<Vec<_>>>()?;

    if steps.is_empty() {
        bail!("No steps given. Use e.g. --steps \"next,next,to:10,prev\"");
    }
    Ok(steps)
}

/// Execute one step against the cache
pub async fn apply_step(cache: &mut ReaderCache, step: Step) -> Result<bytes::Bytes, CacheError> {
    match step {
        Step::Next => cache.try_navigate_next().await,
        Step::Previous => cache.try_navigate_previous().await,
        Step::Start => cache.try_navigate(0, Origin::Start, Direction::Forward).await,
        Step::End => cache.try_navigate(0, Origin::End, Direction::Forward).await,
        Step::To(index) => cache.try_navigate_to(index).await,
        Step::Offset(direction, n) => cache.try_navigate(n, Origin::Current, direction).await,
    }
}

/// Walk the steps, producing one result item per step
pub async fn walk(cache: &mut ReaderCache, steps: &[Step], hash: HashAlgorithm) -> ResultSet {
    let mut result_set = ResultSet::new();

    for &step in steps {
        let started = Instant::now();
        let outcome = apply_step(cache, step).await;
        let elapsed_us = started.elapsed().as_micros() as u64;

        let index = (!cache.is_empty()).then(|| cache.current_index());
        let identifier = index.and_then(|i| cache.identifier(i)).map(str::to_string);
        let item = ResultItem::step(step.to_string(), index, identifier)
            .with_data(window_snapshot(cache));

        let item = match outcome {
            Ok(data) => item.with_meta(Meta {
                size: Some(data.len() as u64),
                hash: Some(hash_bytes(&data, hash)),
                elapsed_us: Some(elapsed_us),
                ..Default::default()
            }),
            Err(e) => item.with_error(ReadError::new("absent", e.to_string())),
        };
        result_set.push(item);
    }

    result_set
}

/// Loaded/loading positions plus navigation flags
fn window_snapshot(cache: &ReaderCache) -> serde_json::Value {
    let statuses = cache.statuses();
    let positions = |wanted: EntryStatus| -> Vec<usize> {
        statuses
            .iter()
            .enumerate()
            .filter(|(_, s)| **s == wanted)
            .map(|(i, _)| i)
            .collect()
    };

    json!({
        "loaded": positions(EntryStatus::Loaded),
        "loading": positions(EntryStatus::Loading),
        "resident_bytes": cache.resident_bytes(),
        "has_previous": cache.has_previous(),
        "has_next": cache.has_next(),
    })
}

/// Run the read command
pub async fn run_read(
    root: &Path,
    options: &SequenceOptions,
    script: &str,
    policy: WindowPolicy,
    hash: HashAlgorithm,
    render_config: RenderConfig,
) -> Result<()> {
    let steps = parse_steps(script)?;
    let sequence = load_sequence(root, options)?;

    let resolver = Arc::new(SourceManager::with_builtins(root));
    let mut cache = ReaderCache::with_policy(sequence.identifiers, resolver, policy);

    let result_set = walk(&mut cache, &steps, hash).await;
    cache.dispose();

    let renderer = Renderer::with_config(render_config);
    println!("{}", renderer.render(&result_set));

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sources::{memory::memory_locator, MemorySource};

    #[test]
    fn test_parse_steps() {
        let steps = parse_steps("next, prev start end to:12 +3 -2 n p").unwrap();
        assert_eq!(
            steps,
            vec![
                Step::Next,
                Step::Previous,
                Step::Start,
                Step::End,
                Step::To(12),
                Step::Offset(Direction::Forward, 3),
                Step::Offset(Direction::Backward, 2),
                Step::Next,
                Step::Previous,
            ]
        );
    }

    #[test]
    fn test_parse_steps_rejects_unknown() {
        assert!(parse_steps("next,jump").is_err());
        assert!(parse_steps(" , ").is_err());
    }

    #[test]
    fn test_step_display_round_trips() {
        for text in ["next", "prev", "start", "end", "to:7", "+2", "-4"] {
            let step: Step = text.parse().unwrap();
            assert_eq!(step.to_string(), text);
        }
    }

    #[tokio::test]
    async fn test_walk_reports_each_step() {
        let memory = MemorySource::new();
        let ids: Vec<String> = (0..4)
            .map(|i| {
                memory.insert(format!("{i}"), format!("page {i}"));
                memory_locator(&i.to_string())
            })
            .collect();
        let resolver = Arc::new(SourceManager::new().with_source(memory));
        let mut cache = ReaderCache::new(ids, resolver);

        let steps = parse_steps("next,end,next,prev").unwrap();
        let result_set = walk(&mut cache, &steps, HashAlgorithm::Xxh3).await;
        let items = result_set.items;

        assert_eq!(items.len(), 4);
        assert_eq!(items[0].index, Some(1));
        assert_eq!(items[0].meta.size, Some(6));
        assert_eq!(items[1].index, Some(3));
        assert_eq!(items[2].index, Some(3));
        assert_eq!(items[2].errors[0].code, "absent");
        assert_eq!(items[3].index, Some(2));
        assert_eq!(items[3].identifier.as_deref(), Some("mem://2"));
        assert_eq!(items[3].data.as_ref().unwrap()["has_next"], true);
    }
}
