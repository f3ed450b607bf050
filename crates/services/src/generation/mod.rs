//! Generative content: syllabi, study materials and study tips.

mod gemini;
pub mod prompts;

use std::path::Path;

use async_trait::async_trait;
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use sabelo_core::model::{QuizQuestion, StudyMaterials, Syllabus, SyllabusTopic};

use crate::error::GenerationError;

pub use gemini::{GeminiClient, GeminiConfig};

/// Fixed tip returned without asking the model when every answer is right.
pub const PERFECT_SCORE_SUGGESTION: &str = "¡Puntaje perfecto! Dominás este tema. ¡Seguí así!";

/// A file handed to the model inline, already base64-encoded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadedFile {
    pub mime_type: String,
    pub base64_data: String,
}

impl UploadedFile {
    #[must_use]
    pub fn from_bytes(mime_type: impl Into<String>, bytes: &[u8]) -> Self {
        Self {
            mime_type: mime_type.into(),
            base64_data: STANDARD.encode(bytes),
        }
    }

    /// Read and encode a file, guessing its MIME type from the extension.
    ///
    /// # Errors
    ///
    /// Returns the I/O error if the file cannot be read.
    pub fn read(path: &Path) -> std::io::Result<Self> {
        let bytes = std::fs::read(path)?;
        Ok(Self::from_bytes(mime_for_path(path), &bytes))
    }
}

/// MIME type for the note formats the model accepts.
#[must_use]
pub fn mime_for_path(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(str::to_ascii_lowercase);
    match ext.as_deref() {
        Some("pdf") => "application/pdf",
        Some("png") => "image/png",
        Some("jpg" | "jpeg") => "image/jpeg",
        Some("webp") => "image/webp",
        Some("gif") => "image/gif",
        Some("txt" | "md") => "text/plain",
        _ => "application/octet-stream",
    }
}

/// Source of AI-generated study content.
#[async_trait]
pub trait ContentGenerator: Send + Sync {
    /// Topics for a typed subject.
    ///
    /// # Errors
    ///
    /// Returns `GenerationError` when the request fails or the reply is unusable.
    async fn generate_syllabus(&self, subject: &str) -> Result<Vec<SyllabusTopic>, GenerationError>;

    /// Subject and topics inferred from uploaded notes.
    ///
    /// # Errors
    ///
    /// Returns `GenerationError` when the request fails or the reply is unusable.
    async fn generate_syllabus_from_files(
        &self,
        files: &[UploadedFile],
    ) -> Result<Syllabus, GenerationError>;

    /// Flashcards and quiz for one topic.
    ///
    /// # Errors
    ///
    /// Returns `GenerationError` when the request fails or the reply is unusable.
    async fn generate_study_materials(
        &self,
        subject: &str,
        topic_title: &str,
    ) -> Result<StudyMaterials, GenerationError>;

    /// A short tip based on the questions answered wrong.
    ///
    /// # Errors
    ///
    /// Returns `GenerationError` when the request fails.
    async fn generate_study_suggestion(
        &self,
        subject: &str,
        topic_title: &str,
        quiz: &[QuizQuestion],
        answers: &[String],
    ) -> Result<String, GenerationError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn uploaded_file_is_base64_encoded() {
        let file = UploadedFile::from_bytes("text/plain", b"hola");
        assert_eq!(file.base64_data, "aG9sYQ==");
    }

    #[test]
    fn mime_type_follows_extension() {
        assert_eq!(mime_for_path(Path::new("apuntes.PDF")), "application/pdf");
        assert_eq!(mime_for_path(Path::new("foto.jpeg")), "image/jpeg");
        assert_eq!(mime_for_path(Path::new("sin_extension")), "application/octet-stream");
    }
}
