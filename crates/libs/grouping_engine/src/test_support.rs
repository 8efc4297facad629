//! Shared test doubles for the match resolver and image probe, used by the
//! property and scenario tests across this crate.
#![cfg(test)]

use async_trait::async_trait;
use grouping_types::FaceInput;
use std::collections::HashMap;
use std::sync::Mutex;

use crate::image_probe::ImageProbe;
use crate::match_resolver::MatchResolver;

/// Resolves matches purely from `FaceInput::matched_face_ids`, falling back
/// to a fixed map keyed by `faceId` for tests that want the "ask the
/// recognition engine" path without caller-supplied matches.
#[derive(Default)]
pub struct StaticMatchResolver {
    fallback: HashMap<String, Vec<String>>,
}

impl StaticMatchResolver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_fallback(mut self, face_id: &str, matches: Vec<&str>) -> Self {
        self.fallback
            .insert(face_id.to_string(), matches.into_iter().map(str::to_string).collect());
        self
    }
}

#[async_trait]
impl MatchResolver for StaticMatchResolver {
    async fn resolve(&self, _user_id: &str, face: &FaceInput) -> Vec<String> {
        if let Some(matches) = &face.matched_face_ids {
            if !matches.is_empty() {
                return matches.clone();
            }
        }
        self.fallback.get(&face.face_id).cloned().unwrap_or_default()
    }
}

/// An `ImageProbe` whose reachability per URL is configured up front, for
/// deterministic tests of the "unreachable image" branch.
#[derive(Default)]
pub struct FakeImageProbe {
    unreachable: Mutex<Vec<String>>,
}

impl FakeImageProbe {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn mark_unreachable(&self, url: &str) {
        self.unreachable.lock().unwrap().push(url.to_string());
    }
}

#[async_trait]
impl ImageProbe for FakeImageProbe {
    async fn is_reachable(&self, url: &str) -> bool {
        !self.unreachable.lock().unwrap().iter().any(|u| u == url)
    }
}
