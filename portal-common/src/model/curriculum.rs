//! Curriculum tree types: phases, modules ("weeks") and lessons

use serde::{Deserialize, Serialize};

/// Top-level grouping of modules within an organization's curriculum
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Phase {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub modules: Vec<Module>,
}

impl Phase {
    /// Every lesson under this phase, in tree order
    pub fn lessons(&self) -> impl Iterator<Item = &Lesson> {
        self.modules.iter().flat_map(|m| m.lessons.iter())
    }
}

/// Grouping of lessons within a phase
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Module {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub lessons: Vec<Lesson>,
}

/// Multiple-choice question attached to a lesson by the generator
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuizQuestion {
    pub id: String,
    pub question: String,
    pub options: Vec<String>,
    /// Index into `options` of the correct answer
    pub correct_index: usize,
}

impl QuizQuestion {
    /// True when `correct_index` points at an existing option
    pub fn is_well_formed(&self) -> bool {
        !self.question.trim().is_empty() && self.correct_index < self.options.len()
    }
}

/// Leaf content unit
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Lesson {
    pub id: String,
    pub title: String,
    pub description: String,
    pub thumbnail: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub video_url: Option<String>,
    /// Free-form label such as "45m"
    pub duration: String,
    #[serde(default)]
    pub completed: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transcription: Option<String>,
    /// External quiz form link
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quiz_url: Option<String>,
    /// Generated rich-text summary
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ai_summary: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ai_quiz: Option<Vec<QuizQuestion>>,
}

impl Lesson {
    /// Build a lesson from caller-supplied content and an assigned id
    pub fn from_draft(id: impl Into<String>, draft: LessonDraft) -> Self {
        Self {
            id: id.into(),
            title: draft.title,
            description: draft.description,
            thumbnail: draft.thumbnail,
            video_url: draft.video_url,
            duration: draft.duration,
            completed: draft.completed,
            transcription: draft.transcription,
            quiz_url: draft.quiz_url,
            ai_summary: draft.ai_summary,
            ai_quiz: draft.ai_quiz,
        }
    }

    /// Copy of every field except the id, for in-progress edits
    pub fn to_draft(&self) -> LessonDraft {
        LessonDraft {
            title: self.title.clone(),
            description: self.description.clone(),
            thumbnail: self.thumbnail.clone(),
            video_url: self.video_url.clone(),
            duration: self.duration.clone(),
            completed: self.completed,
            transcription: self.transcription.clone(),
            quiz_url: self.quiz_url.clone(),
            ai_summary: self.ai_summary.clone(),
            ai_quiz: self.ai_quiz.clone(),
        }
    }

    /// Embeddable player URL for the video reference
    ///
    /// YouTube watch/short links are rewritten to the `/embed/<id>` form;
    /// anything else is assumed embeddable and returned as-is.
    pub fn embed_url(&self) -> Option<String> {
        let url = self.video_url.as_deref()?;
        if url.is_empty() {
            return None;
        }
        if !(url.contains("youtube.com") || url.contains("youtu.be")) {
            return Some(url.to_string());
        }
        if url.contains("/embed/") {
            return Some(url.to_string());
        }

        let video_id = match url.split_once("v=") {
            Some((_, rest)) => rest.split('&').next().unwrap_or(rest),
            None => url.rsplit('/').next().unwrap_or(url),
        };
        Some(format!("https://www.youtube.com/embed/{}", video_id))
    }
}

/// Every lesson field except the engine-assigned id
///
/// Used as the payload of `create_lesson` and as the editable draft held by
/// the selection reconciler.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LessonDraft {
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub thumbnail: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub video_url: Option<String>,
    #[serde(default)]
    pub duration: String,
    #[serde(default)]
    pub completed: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transcription: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quiz_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ai_summary: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ai_quiz: Option<Vec<QuizQuestion>>,
}

impl LessonDraft {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Default::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lesson_with_video(url: &str) -> Lesson {
        let mut draft = LessonDraft::new("Intro");
        draft.video_url = Some(url.to_string());
        Lesson::from_draft("l1", draft)
    }

    #[test]
    fn test_draft_round_trip_preserves_content() {
        let mut draft = LessonDraft::new("Prompting 101");
        draft.duration = "45m".to_string();
        draft.completed = true;

        let lesson = Lesson::from_draft("l7", draft.clone());
        assert_eq!(lesson.id, "l7");
        assert_eq!(lesson.to_draft(), draft);
    }

    #[test]
    fn test_embed_url_from_watch_link() {
        let lesson = lesson_with_video("https://www.youtube.com/watch?v=jKrj8kV8hPI&t=10");
        assert_eq!(
            lesson.embed_url().as_deref(),
            Some("https://www.youtube.com/embed/jKrj8kV8hPI")
        );
    }

    #[test]
    fn test_embed_url_from_short_link() {
        let lesson = lesson_with_video("https://youtu.be/abc123");
        assert_eq!(
            lesson.embed_url().as_deref(),
            Some("https://www.youtube.com/embed/abc123")
        );
    }

    #[test]
    fn test_embed_url_passes_through_other_hosts() {
        let lesson = lesson_with_video("https://meet.example.com/room");
        assert_eq!(lesson.embed_url().as_deref(), Some("https://meet.example.com/room"));
    }

    #[test]
    fn test_embed_url_none_without_video() {
        let lesson = Lesson::from_draft("l1", LessonDraft::new("No video"));
        assert_eq!(lesson.embed_url(), None);
    }

    #[test]
    fn test_quiz_question_well_formed() {
        let q = QuizQuestion {
            id: "q1".to_string(),
            question: "What is a LLM?".to_string(),
            options: vec!["a".to_string(), "b".to_string()],
            correct_index: 1,
        };
        assert!(q.is_well_formed());

        let bad = QuizQuestion { correct_index: 2, ..q };
        assert!(!bad.is_well_formed());
    }

    #[test]
    fn test_lesson_serializes_camel_case_and_skips_absent_options() {
        let lesson = Lesson::from_draft("l1", LessonDraft::new("Intro"));
        let json = serde_json::to_value(&lesson).unwrap();
        assert!(json.get("videoUrl").is_none());
        assert!(json.get("aiQuiz").is_none());
        assert_eq!(json["completed"], serde_json::Value::Bool(false));
    }
}
