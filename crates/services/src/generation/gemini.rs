use std::env;

use async_trait::async_trait;
use reqwest::Client;
use sabelo_core::model::{QuizQuestion, StudyMaterials, Syllabus, SyllabusTopic};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use url::Url;

use super::prompts;
use super::{ContentGenerator, PERFECT_SCORE_SUGGESTION, UploadedFile};
use crate::error::{AppServicesError, GenerationError};

const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";
const DEFAULT_MODEL: &str = "gemini-2.5-flash";

#[derive(Clone, Debug)]
pub struct GeminiConfig {
    pub base_url: String,
    pub api_key: String,
    pub model: String,
}

impl GeminiConfig {
    /// Read `SABELO_AI_*` variables. A missing or blank key disables
    /// generation.
    ///
    /// # Errors
    ///
    /// Returns `AppServicesError::InvalidUrl` if the base URL does not parse.
    pub fn from_env() -> Result<Option<Self>, AppServicesError> {
        let Some(api_key) = env::var("SABELO_AI_API_KEY")
            .ok()
            .filter(|key| !key.trim().is_empty())
        else {
            return Ok(None);
        };
        let base_url = env::var("SABELO_AI_BASE_URL").unwrap_or_else(|_| DEFAULT_BASE_URL.into());
        Url::parse(&base_url).map_err(|source| AppServicesError::InvalidUrl {
            name: "SABELO_AI_BASE_URL",
            raw: base_url.clone(),
            source,
        })?;
        let model = env::var("SABELO_AI_MODEL").unwrap_or_else(|_| DEFAULT_MODEL.into());
        Ok(Some(Self {
            base_url,
            api_key,
            model,
        }))
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/models/{}:generateContent",
            self.base_url.trim_end_matches('/'),
            self.model
        )
    }
}

/// `ContentGenerator` backed by the Gemini `generateContent` REST endpoint.
#[derive(Clone)]
pub struct GeminiClient {
    client: Client,
    config: Option<GeminiConfig>,
}

impl GeminiClient {
    /// # Errors
    ///
    /// Returns `AppServicesError::InvalidUrl` for a malformed base URL.
    pub fn from_env() -> Result<Self, AppServicesError> {
        Ok(Self::new(GeminiConfig::from_env()?))
    }

    #[must_use]
    pub fn new(config: Option<GeminiConfig>) -> Self {
        Self {
            client: Client::new(),
            config,
        }
    }

    #[must_use]
    pub fn enabled(&self) -> bool {
        self.config.is_some()
    }

    async fn generate(&self, parts: Vec<Part>, schema: Option<Value>) -> Result<String, GenerationError> {
        let config = self.config.as_ref().ok_or(GenerationError::Disabled)?;
        let payload = build_request(parts, schema);

        tracing::debug!(model = %config.model, "sending generateContent request");
        let response = self
            .client
            .post(config.endpoint())
            .header("x-goog-api-key", &config.api_key)
            .json(&payload)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(GenerationError::HttpStatus(response.status()));
        }

        let body: GenerateResponse = response.json().await?;
        response_text(body)
    }

    async fn generate_json<T: DeserializeOwned>(
        &self,
        parts: Vec<Part>,
        schema: Value,
    ) -> Result<T, GenerationError> {
        let text = self.generate(parts, Some(schema)).await?;
        Ok(serde_json::from_str(&text)?)
    }
}

#[async_trait]
impl ContentGenerator for GeminiClient {
    async fn generate_syllabus(&self, subject: &str) -> Result<Vec<SyllabusTopic>, GenerationError> {
        let reply: TopicsReply = self
            .generate_json(
                vec![Part::text(prompts::syllabus_prompt(subject))],
                prompts::syllabus_schema(),
            )
            .await?;
        // Validates the topic list; the subject is the caller's.
        Syllabus::new(subject, reply.topics.clone())?;
        Ok(reply.topics)
    }

    async fn generate_syllabus_from_files(
        &self,
        files: &[UploadedFile],
    ) -> Result<Syllabus, GenerationError> {
        let mut parts: Vec<Part> = files.iter().map(Part::inline).collect();
        parts.push(Part::text(prompts::FILES_SYLLABUS_PROMPT));
        let reply: FilesSyllabusReply = self
            .generate_json(parts, prompts::files_syllabus_schema())
            .await?;
        Ok(Syllabus::new(reply.subject, reply.topics)?)
    }

    async fn generate_study_materials(
        &self,
        subject: &str,
        topic_title: &str,
    ) -> Result<StudyMaterials, GenerationError> {
        let materials: StudyMaterials = self
            .generate_json(
                vec![Part::text(prompts::materials_prompt(subject, topic_title))],
                prompts::materials_schema(),
            )
            .await?;
        Ok(materials.validate()?)
    }

    async fn generate_study_suggestion(
        &self,
        subject: &str,
        topic_title: &str,
        quiz: &[QuizQuestion],
        answers: &[String],
    ) -> Result<String, GenerationError> {
        let Some(prompt) = prompts::suggestion_prompt(subject, topic_title, quiz, answers) else {
            return Ok(PERFECT_SCORE_SUGGESTION.to_string());
        };
        self.generate(vec![Part::text(prompt)], None).await
    }
}

fn build_request(parts: Vec<Part>, schema: Option<Value>) -> GenerateRequest {
    GenerateRequest {
        contents: vec![Content { parts }],
        generation_config: schema.map(|schema| GenerationConfig {
            response_mime_type: "application/json",
            response_schema: schema,
        }),
    }
}

fn response_text(body: GenerateResponse) -> Result<String, GenerationError> {
    let text: String = body
        .candidates
        .into_iter()
        .next()
        .and_then(|candidate| candidate.content)
        .map(|content| {
            content
                .parts
                .into_iter()
                .filter_map(|part| part.text)
                .collect()
        })
        .unwrap_or_default();
    let text = text.trim();
    if text.is_empty() {
        return Err(GenerationError::EmptyResponse);
    }
    Ok(text.to_string())
}

#[derive(Debug, Deserialize)]
struct TopicsReply {
    topics: Vec<SyllabusTopic>,
}

#[derive(Debug, Deserialize)]
struct FilesSyllabusReply {
    subject: String,
    topics: Vec<SyllabusTopic>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateRequest {
    contents: Vec<Content>,
    #[serde(skip_serializing_if = "Option::is_none")]
    generation_config: Option<GenerationConfig>,
}

#[derive(Debug, Serialize)]
struct Content {
    parts: Vec<Part>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct Part {
    #[serde(skip_serializing_if = "Option::is_none")]
    text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    inline_data: Option<InlineData>,
}

impl Part {
    fn text(text: impl Into<String>) -> Self {
        Self {
            text: Some(text.into()),
            inline_data: None,
        }
    }

    fn inline(file: &UploadedFile) -> Self {
        Self {
            text: None,
            inline_data: Some(InlineData {
                mime_type: file.mime_type.clone(),
                data: file.base64_data.clone(),
            }),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct InlineData {
    mime_type: String,
    data: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    response_mime_type: &'static str,
    response_schema: Value,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Debug, Deserialize)]
struct ResponsePart {
    text: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn request_carries_inline_files_and_schema() {
        let file = UploadedFile::from_bytes("image/png", b"png");
        let request = build_request(
            vec![Part::inline(&file), Part::text("analizá")],
            Some(prompts::files_syllabus_schema()),
        );
        let value = serde_json::to_value(&request).unwrap();

        let parts = &value["contents"][0]["parts"];
        assert_eq!(parts[0]["inlineData"]["mimeType"], "image/png");
        assert_eq!(parts[0]["inlineData"]["data"], file.base64_data.as_str());
        assert!(parts[0].get("text").is_none());
        assert_eq!(parts[1]["text"], "analizá");
        assert_eq!(
            value["generationConfig"]["responseMimeType"],
            "application/json"
        );
        assert_eq!(
            value["generationConfig"]["responseSchema"]["required"],
            json!(["subject", "topics"])
        );
    }

    #[test]
    fn plain_text_request_has_no_generation_config() {
        let value = serde_json::to_value(build_request(vec![Part::text("hola")], None)).unwrap();
        assert!(value.get("generationConfig").is_none());
    }

    #[test]
    fn response_text_joins_parts_of_first_candidate() {
        let body: GenerateResponse = serde_json::from_value(json!({
            "candidates": [
                {"content": {"parts": [{"text": " {\"topics\":"}, {"text": "[]} "}]}},
                {"content": {"parts": [{"text": "ignored"}]}}
            ]
        }))
        .unwrap();
        assert_eq!(response_text(body).unwrap(), "{\"topics\":[]}");
    }

    #[test]
    fn empty_candidates_are_an_empty_response() {
        let body: GenerateResponse = serde_json::from_value(json!({})).unwrap();
        assert!(matches!(
            response_text(body),
            Err(GenerationError::EmptyResponse)
        ));
    }

    #[test]
    fn endpoint_joins_base_and_model() {
        let config = GeminiConfig {
            base_url: "https://example.test/v1beta/".into(),
            api_key: "k".into(),
            model: "gemini-2.5-flash".into(),
        };
        assert_eq!(
            config.endpoint(),
            "https://example.test/v1beta/models/gemini-2.5-flash:generateContent"
        );
    }

    #[tokio::test]
    async fn disabled_client_refuses_requests() {
        let client = GeminiClient::new(None);
        assert!(!client.enabled());
        assert!(matches!(
            client.generate_syllabus("Historia").await,
            Err(GenerationError::Disabled)
        ));
    }

    #[tokio::test]
    async fn perfect_quiz_skips_the_model() {
        let client = GeminiClient::new(None);
        let quiz = vec![QuizQuestion {
            question: "q".into(),
            options: vec!["a".into(), "b".into(), "c".into(), "d".into()],
            correct_answer: "a".into(),
            explanation: "e".into(),
        }];
        let tip = client
            .generate_study_suggestion("s", "t", &quiz, &["a".to_string()])
            .await
            .unwrap();
        assert_eq!(tip, PERFECT_SCORE_SUGGESTION);
    }
}
