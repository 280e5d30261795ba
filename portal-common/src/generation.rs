//! Generation collaborator
//!
//! The content generator is an external, asynchronous dependency: given a
//! lesson topic it returns a rich-text summary and a quiz; given a free-text
//! prompt it returns a whole [`StructurePayload`]. The store never retries;
//! any failure (transport, timeout, empty or malformed payload) surfaces as a
//! single [`Error::Generation`] and nothing is merged.

use std::future::Future;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::{debug, warn};

use crate::engine::edit_lesson;
use crate::error::{Error, Result};
use crate::import::StructurePayload;
use crate::model::{Organization, Organizations, QuizQuestion};
use crate::resolver::{LessonPath, TreePath};

/// Generated material for a single lesson
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LessonContent {
    /// Rich text (HTML fragment)
    pub summary: String,
    pub quiz: Vec<QuizQuestion>,
}

/// Asynchronous content generator
#[async_trait]
pub trait ContentGenerator: Send + Sync {
    /// Generator name for logging
    fn name(&self) -> &'static str;

    /// Summary and quiz for one lesson
    async fn generate_lesson(&self, title: &str, context: &str) -> Result<LessonContent>;

    /// Phases, users and resources for a whole program
    async fn generate_structure(&self, prompt: &str) -> Result<StructurePayload>;
}

// ========================================
// Payload parsing
// ========================================

/// Assemble lesson content from raw model responses
pub fn parse_lesson_content(summary: &str, quiz_text: &str) -> Result<LessonContent> {
    if summary.trim().is_empty() {
        return Err(Error::Generation("empty summary in model response".to_string()));
    }
    Ok(LessonContent {
        summary: summary.trim().to_string(),
        quiz: parse_quiz(quiz_text)?,
    })
}

/// Parse a JSON quiz array, rejecting questions whose answer index is out of range
pub fn parse_quiz(text: &str) -> Result<Vec<QuizQuestion>> {
    let body = strip_code_fence(text);
    if body.is_empty() {
        return Err(Error::Generation("empty quiz in model response".to_string()));
    }
    let quiz: Vec<QuizQuestion> = serde_json::from_str(body)
        .map_err(|e| Error::Generation(format!("quiz does not parse: {}", e)))?;
    if let Some(bad) = quiz.iter().find(|q| !q.is_well_formed()) {
        return Err(Error::Generation(format!(
            "quiz question '{}' has no valid correct option",
            bad.id
        )));
    }
    Ok(quiz)
}

/// Parse a generated program structure
pub fn parse_structure(text: &str) -> Result<StructurePayload> {
    let body = strip_code_fence(text);
    if body.is_empty() {
        return Err(Error::Generation("empty structure in model response".to_string()));
    }
    serde_json::from_str(body).map_err(|e| Error::Generation(format!("structure does not parse: {}", e)))
}

/// Models sometimes wrap JSON in a markdown fence despite being told not to
fn strip_code_fence(text: &str) -> &str {
    let trimmed = text.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let rest = rest.strip_prefix("json").unwrap_or(rest);
    rest.strip_suffix("```").unwrap_or(rest).trim()
}

/// Run a generator call with an upper bound on its duration
pub async fn with_timeout<T, F>(limit: Duration, call: F) -> Result<T>
where
    F: Future<Output = Result<T>>,
{
    match tokio::time::timeout(limit, call).await {
        Ok(result) => result,
        Err(_) => {
            warn!("Generation call timed out after {:?}", limit);
            Err(Error::Generation(format!("timed out after {:?}", limit)))
        }
    }
}

/// Store generated summary and quiz on an existing lesson
pub fn apply_lesson_content(orgs: &[Organization], path: &LessonPath, content: LessonContent) -> Result<Organizations> {
    edit_lesson(orgs, &TreePath::Lesson(path.clone()), |lesson| {
        lesson.ai_summary = Some(content.summary);
        lesson.ai_quiz = Some(content.quiz);
        Ok(())
    })
}

// ========================================
// Offline demo generator
// ========================================

/// Canned generator used when no model API key is configured
///
/// Waits `delay` to mimic a network round trip, then returns fixed content
/// shaped like a real response.
#[derive(Debug, Clone)]
pub struct DemoGenerator {
    delay: Duration,
}

impl DemoGenerator {
    pub fn new(delay: Duration) -> Self {
        Self { delay }
    }

    /// No simulated latency
    pub fn instant() -> Self {
        Self::new(Duration::ZERO)
    }
}

impl Default for DemoGenerator {
    fn default() -> Self {
        Self::new(Duration::from_secs(2))
    }
}

#[async_trait]
impl ContentGenerator for DemoGenerator {
    fn name(&self) -> &'static str {
        "demo"
    }

    async fn generate_lesson(&self, title: &str, _context: &str) -> Result<LessonContent> {
        debug!("Demo generator: lesson content for '{}'", title);
        tokio::time::sleep(self.delay).await;
        let summary = format!(
            "<div><h2>Resumen Ejecutivo: {}</h2>\
             <h3>Puntos Clave</h3><ul>\
             <li>Diferencia entre IA discriminativa y generativa.</li>\
             <li>Estructura básica de un prompt eficiente.</li></ul>\
             <h3>Aplicación Práctica</h3><p>Redacción de correos, análisis de datos y automatización básica.</p>\
             <h4>Conclusión</h4><p>La adopción temprana define la ventaja competitiva.</p></div>",
            title
        );
        parse_lesson_content(&summary, DEMO_QUIZ)
    }

    async fn generate_structure(&self, prompt: &str) -> Result<StructurePayload> {
        debug!("Demo generator: structure for '{}'", prompt);
        tokio::time::sleep(self.delay).await;

        let topic = prompt.trim();
        let lessons: Vec<Value> = ["Fundamentos", "Casos de uso", "Taller práctico"]
            .iter()
            .enumerate()
            .map(|(i, part)| {
                json!({
                    "id": format!("gen-l{}", i + 1),
                    "title": format!("{}: {}", part, topic),
                    "description": format!("Sesión {} del programa sobre {}.", i + 1, topic),
                    "thumbnail": "",
                    "duration": "45m",
                })
            })
            .collect();
        let response = json!({
            "phases": [{
                "id": "gen-p1",
                "title": format!("Fase 1: {}", topic),
                "modules": [{
                    "id": "gen-w1",
                    "title": "Semana 1: Introducción",
                    "lessons": lessons,
                }],
            }],
        });
        parse_structure(&response.to_string())
    }
}

/// Canned quiz in the shape a model returns, fenced as models often do
const DEMO_QUIZ: &str = r#"```json
[
  {
    "id": "q1",
    "question": "¿Cuál es la función principal de un LLM?",
    "options": ["Predecir la siguiente palabra probable", "Buscar en Google", "Guardar archivos", "Editar video"],
    "correctIndex": 0
  },
  {
    "id": "q2",
    "question": "¿Qué significa \"Prompt Engineering\"?",
    "options": ["Programar en Python", "Diseñar instrucciones efectivas para la IA", "Reparar computadoras", "Ninguna de las anteriores"],
    "correctIndex": 1
  },
  {
    "id": "q3",
    "question": "¿Qué herramienta es de Google?",
    "options": ["ChatGPT", "Claude", "Gemini", "Llama"],
    "correctIndex": 2
  },
  {
    "id": "q4",
    "question": "La temperatura en un modelo afecta:",
    "options": ["La velocidad", "La creatividad/aleatoriedad", "El costo", "El color"],
    "correctIndex": 1
  },
  {
    "id": "q5",
    "question": "¿La IA Generativa puede crear imágenes?",
    "options": ["No, solo texto", "Sí, como Midjourney o DALL-E", "Solo si se le paga", "Depende del clima"],
    "correctIndex": 1
  }
]
```"#;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resolver::resolve_lesson;
    use crate::seed::demo_organizations;

    #[test]
    fn test_parse_quiz_accepts_plain_and_fenced_json() {
        let raw = r#"[{ "id": "1", "question": "q", "options": ["a", "b"], "correctIndex": 1 }]"#;
        assert_eq!(parse_quiz(raw).unwrap().len(), 1);

        let fenced = format!("```json\n{}\n```", raw);
        assert_eq!(parse_quiz(&fenced).unwrap()[0].correct_index, 1);
    }

    #[test]
    fn test_parse_quiz_rejects_empty_and_malformed() {
        assert!(matches!(parse_quiz("   "), Err(Error::Generation(_))));
        assert!(matches!(parse_quiz("{\"not\": \"an array\"}"), Err(Error::Generation(_))));
    }

    #[test]
    fn test_parse_quiz_rejects_out_of_range_answer() {
        let raw = r#"[{ "id": "1", "question": "q", "options": ["a"], "correctIndex": 3 }]"#;
        assert!(matches!(parse_quiz(raw), Err(Error::Generation(_))));
    }

    #[test]
    fn test_parse_lesson_content_requires_summary() {
        assert!(matches!(parse_lesson_content("", "[]"), Err(Error::Generation(_))));
        let content = parse_lesson_content("<p>ok</p>", "[]").unwrap();
        assert!(content.quiz.is_empty());
    }

    #[test]
    fn test_parse_structure_defaults_missing_collections() {
        let payload = parse_structure(r#"{ "phases": [{ "id": "p9", "title": "New" }] }"#).unwrap();
        assert_eq!(payload.phases.len(), 1);
        assert!(payload.phases[0].modules.is_empty());
        assert!(payload.users.is_empty());
        assert!(matches!(parse_structure(""), Err(Error::Generation(_))));
    }

    #[tokio::test]
    async fn test_demo_generator_lesson_content() {
        let generator = DemoGenerator::instant();
        let content = generator.generate_lesson("Intro", "LLMs").await.unwrap();
        assert!(content.summary.contains("Intro"));
        assert_eq!(content.quiz.len(), 5);
        assert!(content.quiz.iter().all(QuizQuestion::is_well_formed));
    }

    #[tokio::test]
    async fn test_demo_generator_structure() {
        let generator = DemoGenerator::instant();
        let payload = generator.generate_structure("Agentes de IA").await.unwrap();
        assert_eq!(payload.counts().phases, 1);
        assert_eq!(payload.counts().lessons, 3);
    }

    #[tokio::test]
    async fn test_with_timeout_expires() {
        let slow = DemoGenerator::new(Duration::from_secs(5));
        let result = with_timeout(Duration::from_millis(20), slow.generate_lesson("x", "y")).await;
        assert!(matches!(result, Err(Error::Generation(_))));
    }

    #[tokio::test]
    async fn test_with_timeout_passes_result_through() {
        let generator = DemoGenerator::instant();
        let result = with_timeout(Duration::from_secs(1), generator.generate_lesson("x", "y")).await;
        assert!(result.is_ok());
    }

    #[test]
    fn test_apply_lesson_content_sets_summary_and_quiz() {
        let orgs = demo_organizations();
        let path = LessonPath::new("c1", "p1", "w1", "l1");
        let content = LessonContent {
            summary: "<p>s</p>".to_string(),
            quiz: parse_quiz(DEMO_QUIZ).unwrap(),
        };
        let next = apply_lesson_content(&orgs, &path, content).unwrap();
        let lesson = resolve_lesson(&next, &path).unwrap();
        assert_eq!(lesson.ai_summary.as_deref(), Some("<p>s</p>"));
        assert_eq!(lesson.ai_quiz.as_ref().map(Vec::len), Some(5));
    }
}
