//! Overall skill score
//!
//! A display figure blended from completion and the user's skill attributes.
//! Computed on demand, never stored.

use crate::model::User;

const COMPLETION_WEIGHT: f64 = 0.4;
const SKILL_WEIGHT: f64 = 0.6;

/// Overall score for a user
///
/// Without skills (absent or empty map) this is the stored completion
/// percentage; otherwise `round(0.4 * completion + 0.6 * mean(skills))`.
pub fn overall_score(user: &User) -> u32 {
    let progress = u32::from(user.progress.unwrap_or(0));
    let skills = match &user.skills {
        Some(skills) if !skills.is_empty() => skills,
        _ => return progress,
    };

    let average = skills.values().map(|&v| f64::from(v)).sum::<f64>() / skills.len() as f64;
    (COMPLETION_WEIGHT * f64::from(progress) + SKILL_WEIGHT * average).round() as u32
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{NewUser, SkillMap};

    fn user(progress: Option<u8>, skills: Option<SkillMap>) -> User {
        let mut new = NewUser::student("Test");
        new.progress = progress;
        new.skills = skills;
        User::from_new("u1", "c1", new)
    }

    fn skills(values: &[(&str, u8)]) -> SkillMap {
        values.iter().map(|(k, v)| (k.to_string(), *v)).collect()
    }

    #[test]
    fn test_without_skills_returns_progress() {
        assert_eq!(overall_score(&user(Some(15), None)), 15);
        assert_eq!(overall_score(&user(None, None)), 0);
    }

    #[test]
    fn test_empty_skill_map_returns_progress() {
        assert_eq!(overall_score(&user(Some(30), Some(SkillMap::new()))), 30);
    }

    #[test]
    fn test_blend_of_progress_and_skills() {
        // avg(45, 60, 30, 20) = 38.75; 0.4*15 + 0.6*38.75 = 29.25 -> 29
        let u = user(
            Some(15),
            Some(skills(&[("prompting", 45), ("analysis", 60), ("tools", 30), ("strategy", 20)])),
        );
        assert_eq!(overall_score(&u), 29);
    }

    #[test]
    fn test_blend_with_high_scores() {
        // avg(90, 85, 95, 80) = 87.5; 0.4*85 + 0.6*87.5 = 86.5 -> 87
        let u = user(
            Some(85),
            Some(skills(&[("prompting", 90), ("analysis", 85), ("tools", 95), ("strategy", 80)])),
        );
        assert_eq!(overall_score(&u), 87);
    }
}
