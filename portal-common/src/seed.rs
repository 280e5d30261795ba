//! Built-in demo tenants
//!
//! Loaded when no snapshot file exists. Three organizations: `c1` with a
//! one-lesson curriculum, three students and a forum post; `c2` and `c3`
//! with a roster only.

use chrono::{DateTime, TimeZone, Utc};

use crate::model::{
    ForumPost, Lesson, LessonDraft, Module, Organization, Organizations, Phase, SkillLabels, SkillMap, User,
    UserRole,
};

fn thumbnail(seed: u32) -> String {
    format!("https://picsum.photos/seed/{}/400/225", seed)
}

fn day(year: i32, month: u32, day: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(year, month, day, 0, 0, 0)
        .single()
        .unwrap_or_default()
}

fn skills(prompting: u8, analysis: u8, tools: u8, strategy: u8) -> SkillMap {
    [
        ("prompting", prompting),
        ("analysis", analysis),
        ("tools", tools),
        ("strategy", strategy),
    ]
    .into_iter()
    .map(|(k, v)| (k.to_string(), v))
    .collect()
}

fn student(id: &str, name: &str, org: &str, progress: u8, position: &str, skill_map: SkillMap) -> User {
    User {
        id: id.to_string(),
        name: name.to_string(),
        credentials: None,
        role: UserRole::Student,
        organization_id: org.to_string(),
        avatar_url: None,
        progress: Some(progress),
        skills: Some(skill_map),
        position: Some(position.to_string()),
    }
}

fn organization(id: &str, name: &str, slug: &str, theme_color: &str, created_at: DateTime<Utc>) -> Organization {
    let mut org = Organization::new(id, name, theme_color, created_at);
    org.slug = slug.to_string();
    org
}

fn simpledata() -> Organization {
    let mut org = organization("c1", "SIMPLEDATA", "simpledata", "#6366f1", day(2025, 1, 1));
    org.skill_labels = Some(SkillLabels::from_iter([
        ("prompting", "Prompting"),
        ("analysis", "Análisis"),
        ("tools", "Herramientas"),
        ("strategy", "Estrategia"),
    ]));

    let intro = Lesson::from_draft(
        "l1",
        LessonDraft {
            description: "Conceptos básicos sobre LLMs y transformadores.".to_string(),
            thumbnail: thumbnail(101),
            video_url: Some("https://www.youtube.com/embed/jKrj8kV8hPI".to_string()),
            duration: "45m".to_string(),
            completed: true,
            transcription: Some("Bienvenidos a la clase de introducción...".to_string()),
            quiz_url: Some("https://docs.google.com/forms/u/0/".to_string()),
            ..LessonDraft::new("Intro a la IA Generativa")
        },
    );
    org.phases.push(Phase {
        id: "p1".to_string(),
        title: "Fase 1: Fundamentos y IA Aplicada".to_string(),
        modules: vec![Module {
            id: "w1".to_string(),
            title: "Semana 1: Productividad Inteligente".to_string(),
            lessons: vec![intro],
        }],
    });

    org.users = vec![
        student("u2", "Juan Escalona", "c1", 15, "DEV JUNIOR", skills(45, 60, 30, 20)),
        student("u3", "Cristobal Arias", "c1", 85, "AI LEAD", skills(90, 85, 95, 80)),
        student("u4", "Anibal Alcazar", "c1", 0, "MANAGER", skills(10, 40, 10, 70)),
    ];

    org.posts.push(ForumPost {
        id: "post1".to_string(),
        user_id: "u2".to_string(),
        user_name: "Juan Escalona".to_string(),
        user_avatar: None,
        content: "¿Alguien tiene el link de la documentación de Gemini mencionada en la clase 2?".to_string(),
        created_at: Utc
            .with_ymd_and_hms(2025, 1, 10, 10, 0, 0)
            .single()
            .unwrap_or_default(),
        likes: 2,
    });
    org
}

fn afri() -> Organization {
    let mut org = organization("c2", "AFRI", "afri", "#10b981", day(2025, 1, 2));
    org.skill_labels = Some(SkillLabels::from_iter([
        ("prompting", "Código"),
        ("analysis", "Legacy"),
        ("tools", "Migración"),
        ("strategy", "Arquitectura"),
    ]));
    let mut cto = student("u5", "Alejandro Lopez", "c2", 30, "CTO", skills(80, 99, 70, 90));
    cto.role = UserRole::Admin;
    org.users.push(cto);
    org
}

fn ada() -> Organization {
    let mut org = organization("c3", "ADA Ltda", "ada", "#a855f7", day(2025, 1, 3));
    org.users
        .push(student("u6", "Julio Sepulveda", "c3", 75, "ANALYST", skills(70, 70, 70, 70)));
    org
}

/// The demo collection: SIMPLEDATA, AFRI and ADA Ltda
pub fn demo_organizations() -> Organizations {
    vec![simpledata(), afri(), ada()]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::interchange::validate_collection;

    #[test]
    fn test_demo_collection_is_valid() {
        let orgs = demo_organizations();
        assert_eq!(orgs.len(), 3);
        validate_collection(&orgs).unwrap();
    }

    #[test]
    fn test_demo_users_point_at_their_organization() {
        for org in demo_organizations() {
            assert!(org.users.iter().all(|u| u.organization_id == org.id));
        }
    }

    #[test]
    fn test_demo_slug_may_differ_from_derived_slug() {
        let orgs = demo_organizations();
        assert_eq!(orgs[2].slug, "ada");
        assert_eq!(orgs[0].lesson_count(), 1);
        assert_eq!(orgs[0].completed_lesson_count(), 1);
    }
}
