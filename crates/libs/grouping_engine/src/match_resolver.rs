use async_trait::async_trait;
use grouping_types::FaceInput;
use reqwest::Client;
use serde::Deserialize;
use tracing::warn;

/// Resolves the set of face IDs a given face matches against. Caller-supplied
/// matches always win; the recognition engine is only consulted when a face
/// arrives without them.
#[async_trait]
pub trait MatchResolver: Send + Sync {
    async fn resolve(&self, user_id: &str, face: &FaceInput) -> Vec<String>;
}

#[derive(Debug, Deserialize)]
struct SearchMatch {
    #[serde(rename = "faceId")]
    face_id: String,
    #[allow(dead_code)]
    similarity: f32,
}

/// Talks to the external face-recognition engine over HTTP. Errors are
/// swallowed into an empty match set: a face with no matches is correctly
/// handled as a singleton group, so a flaky recognition engine must never
/// fail the batch.
#[derive(Clone)]
pub struct RecognitionClient {
    http_client: Client,
    base_url: String,
    collection_prefix: String,
    similarity_threshold: f32,
    max_matches: usize,
}

impl RecognitionClient {
    #[must_use]
    pub fn new(
        http_client: Client,
        base_url: impl Into<String>,
        collection_prefix: impl Into<String>,
        similarity_threshold: f32,
        max_matches: usize,
    ) -> Self {
        Self {
            http_client,
            base_url: base_url.into(),
            collection_prefix: collection_prefix.into(),
            similarity_threshold,
            max_matches,
        }
    }

    fn collection_for(&self, user_id: &str) -> String {
        format!("{}{}", self.collection_prefix, user_id)
    }
}

#[async_trait]
impl MatchResolver for RecognitionClient {
    async fn resolve(&self, user_id: &str, face: &FaceInput) -> Vec<String> {
        if let Some(matches) = &face.matched_face_ids {
            if !matches.is_empty() {
                return matches.clone();
            }
        }

        let collection = self.collection_for(user_id);
        let url = format!("{}/collections/{}/search", self.base_url, collection);

        let response = self
            .http_client
            .get(&url)
            .query(&[
                ("faceId", face.face_id.as_str()),
                ("threshold", &self.similarity_threshold.to_string()),
                ("maxFaces", &self.max_matches.to_string()),
            ])
            .send()
            .await;

        let response = match response {
            Ok(resp) if resp.status().is_success() => resp,
            Ok(resp) => {
                warn!(status = %resp.status(), face_id = %face.face_id, "recognition engine returned an error status");
                return Vec::new();
            }
            Err(err) => {
                warn!(error = %err, face_id = %face.face_id, "recognition engine request failed");
                return Vec::new();
            }
        };

        match response.json::<Vec<SearchMatch>>().await {
            Ok(matches) => matches
                .into_iter()
                .map(|m| m.face_id)
                .filter(|id| id != &face.face_id)
                .take(self.max_matches)
                .collect(),
            Err(err) => {
                warn!(error = %err, face_id = %face.face_id, "failed to decode recognition engine response");
                Vec::new()
            }
        }
    }
}
