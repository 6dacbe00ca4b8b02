//! Decoded channel storage.
use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// A single decoded value. `ts` is in microseconds, see [crate::RebaseMode].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Sample {
    pub ts: i64,
    pub value: f64,
}

/// Static description of a channel produced by a log family.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChannelSpec {
    pub name: &'static str,
    /// Samples are only kept while the session is live.
    pub gated: bool,
}

impl ChannelSpec {
    #[must_use]
    pub const fn gated(name: &'static str) -> Self {
        Self { name, gated: true }
    }

    #[must_use]
    pub const fn free(name: &'static str) -> Self {
        Self { name, gated: false }
    }
}

/// Index of a channel in its family's channel table.
pub type ChannelId = usize;

/// Key/value metadata where the first value recorded for a key is permanent.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Metadata(BTreeMap<String, String>);

impl Metadata {
    /// Record `value` for `key` unless `key` already has a value. Returns true if
    /// the value was recorded.
    pub fn set_if_absent<K, V>(&mut self, key: K, value: V) -> bool
    where
        K: Into<String>,
        V: Into<String>,
    {
        let key = key.into();
        if self.0.contains_key(&key) {
            return false;
        }
        self.0.insert(key, value.into());
        true
    }

    #[must_use]
    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }

    #[must_use]
    pub fn contains(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Append-only sink for the samples and metadata of one decode.
#[derive(Debug)]
pub struct ChannelStore {
    specs: Vec<ChannelSpec>,
    data: Vec<Vec<Sample>>,
    metadata: Metadata,
}

impl ChannelStore {
    #[must_use]
    pub fn new(specs: Vec<ChannelSpec>) -> Self {
        ChannelStore {
            data: vec![Vec::new(); specs.len()],
            specs,
            metadata: Metadata::default(),
        }
    }

    #[must_use]
    pub fn spec(&self, id: ChannelId) -> &ChannelSpec {
        &self.specs[id]
    }

    /// Append a sample. No ordering checks are made.
    ///
    /// # Panics
    /// If `id` is not an index in this store's channel table.
    pub fn append(&mut self, id: ChannelId, ts: i64, value: f64) {
        self.data[id].push(Sample { ts, value });
    }

    #[must_use]
    pub fn samples(&self, id: ChannelId) -> &[Sample] {
        &self.data[id]
    }

    #[must_use]
    pub fn metadata(&self) -> &Metadata {
        &self.metadata
    }

    pub fn metadata_mut(&mut self) -> &mut Metadata {
        &mut self.metadata
    }

    /// Hand over all channels, in table order, and the metadata.
    #[must_use]
    pub fn finish(self) -> Snapshot {
        let channels = self
            .specs
            .into_iter()
            .zip(self.data)
            .map(|(spec, samples)| Channel {
                name: spec.name.to_string(),
                samples,
            })
            .collect();
        Snapshot {
            channels,
            metadata: self.metadata,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Channel {
    pub name: String,
    pub samples: Vec<Sample>,
}

/// Immutable result of a decode.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    pub channels: Vec<Channel>,
    pub metadata: Metadata,
}

impl Snapshot {
    /// Samples for the channel named `name`.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&[Sample]> {
        self.channels
            .iter()
            .find(|c| c.name == name)
            .map(|c| c.samples.as_slice())
    }

    /// Total number of samples over all channels.
    #[must_use]
    pub fn sample_count(&self) -> usize {
        self.channels.iter().map(|c| c.samples.len()).sum()
    }
}
