//! Schedule generator backed by a remote HTTP service.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use tracing::instrument;

use super::{GenerationRequest, GeneratorError, ScheduleGenerator};
use crate::models::RawShift;

/// Posts the generation request as JSON and expects a JSON array of shifts back.
pub struct RemoteGenerator {
    url: String,
    bearer_token: Option<String>,
    client: reqwest::Client,
}

impl RemoteGenerator {
    pub fn new(url: String, bearer_token: Option<String>, timeout: Duration) -> Self {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());
        Self {
            url,
            bearer_token,
            client,
        }
    }

    fn auth_headers(&self) -> Result<HeaderMap, GeneratorError> {
        let mut headers = HeaderMap::new();
        if let Some(token) = &self.bearer_token {
            let value = HeaderValue::from_str(&format!("Bearer {}", token))
                .map_err(|e| GeneratorError::Transport(format!("invalid auth header: {}", e)))?;
            headers.insert(AUTHORIZATION, value);
        }
        Ok(headers)
    }
}

#[async_trait]
impl ScheduleGenerator for RemoteGenerator {
    fn name(&self) -> &'static str {
        "remote"
    }

    #[instrument(name = "remote_generate", skip(self, request), fields(url = %self.url))]
    async fn generate(&self, request: &GenerationRequest) -> Result<Vec<RawShift>, GeneratorError> {
        let response = self
            .client
            .post(&self.url)
            .headers(self.auth_headers()?)
            .json(request)
            .send()
            .await
            .map_err(|e| GeneratorError::Transport(e.to_string()))?;

        if !response.status().is_success() {
            return Err(GeneratorError::Status(response.status().as_u16()));
        }

        let body = response
            .text()
            .await
            .map_err(|e| GeneratorError::Transport(format!("read body failed: {}", e)))?;
        parse_shift_list(&body)
    }
}

/// Parse a generator response body.
///
/// Language-model backends sometimes wrap JSON in a Markdown code fence
/// despite being told not to; the fence is stripped before parsing.
pub fn parse_shift_list(body: &str) -> Result<Vec<RawShift>, GeneratorError> {
    let trimmed = strip_code_fence(body.trim());
    if trimmed.is_empty() {
        return Err(GeneratorError::Empty);
    }
    let shifts: Vec<RawShift> =
        serde_json::from_str(trimmed).map_err(|e| GeneratorError::Malformed(e.to_string()))?;
    if shifts.is_empty() {
        return Err(GeneratorError::Empty);
    }
    Ok(shifts)
}

fn strip_code_fence(body: &str) -> &str {
    let Some(rest) = body.strip_prefix("```") else {
        return body;
    };
    // Drop the optional language tag on the opening fence line
    let rest = rest.split_once('\n').map(|(_, r)| r).unwrap_or("");
    rest.trim_end().strip_suffix("```").unwrap_or(rest).trim()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_plain_array() {
        let shifts = parse_shift_list(
            r#"[{"id":"1","day":"Thứ 2","shiftType":"Sáng","staffIds":["a","b"]}]"#,
        )
        .unwrap();
        assert_eq!(shifts.len(), 1);
        assert_eq!(shifts[0].day, "Thứ 2");
        assert_eq!(shifts[0].staff_ids, vec!["a", "b"]);
    }

    #[test]
    fn test_parse_fenced_array() {
        let body = "```json\n[{\"day\":\"Thứ 7\",\"shiftType\":\"Tối\",\"staffIds\":[]}]\n```";
        let shifts = parse_shift_list(body).unwrap();
        assert_eq!(shifts[0].shift_type, "Tối");
        assert!(shifts[0].id.is_none());
    }

    #[test]
    fn test_parse_failures() {
        assert_eq!(parse_shift_list("   "), Err(GeneratorError::Empty));
        assert_eq!(parse_shift_list("[]"), Err(GeneratorError::Empty));
        assert!(matches!(
            parse_shift_list("{\"shifts\": []}"),
            Err(GeneratorError::Malformed(_))
        ));
        assert!(matches!(
            parse_shift_list("Sorry, I cannot help"),
            Err(GeneratorError::Malformed(_))
        ));
    }

    #[tokio::test]
    async fn test_unreachable_remote_is_transport_error() {
        // Port 9 (discard) on localhost is expected to refuse connections
        let generator = RemoteGenerator::new(
            "http://127.0.0.1:9/generate".to_string(),
            None,
            Duration::from_secs(2),
        );
        let request = GenerationRequest::new(
            &[],
            &crate::scheduling::ScheduleStore::new(),
            &crate::scheduling::RequirementMatrix::default(),
        );
        let result = generator.generate(&request).await;
        assert!(matches!(
            result,
            Err(GeneratorError::Transport(_)) | Err(GeneratorError::Timeout(_))
        ));
    }
}
