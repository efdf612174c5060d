//! Experience awards shared by every activity.

use crate::components::{AgentId, Aptitude, SkillKind};
use crate::context::ActivityContext;

/// Millisols of practice per experience point at average aptitude
pub const MILLISOLS_PER_POINT: f64 = 100.0;

/// Points earned for `time` millisols of practice.
///
/// Aptitude shifts the award by `(aptitude - 50)%`; being taught multiplies
/// it by `1 + teacher_bonus`.
pub fn experience_points(time: f64, aptitude: f64, teacher_bonus: Option<f64>) -> f64 {
    let mut points = time / MILLISOLS_PER_POINT;
    points += points * (aptitude - 50.0) / 100.0;
    if let Some(bonus) = teacher_bonus {
        points *= 1.0 + bonus.max(0.0);
    }
    points.max(0.0)
}

/// Bonus a teacher grants a student
pub fn teaching_bonus(teaching_level: u32, teaching_aptitude: f64) -> f64 {
    (0.2 * f64::from(teaching_level) + (teaching_aptitude - 50.0) / 100.0).max(0.0)
}

/// Award experience for each of `skills`.
pub fn award(
    time: f64,
    skills: &[SkillKind],
    aptitude: Aptitude,
    teacher: Option<&AgentId>,
    ctx: &mut dyn ActivityContext,
) {
    if skills.is_empty() || time <= 0.0 {
        return;
    }
    let bonus = teacher.map(|t| ctx.teacher_bonus(t));
    let points = experience_points(time, ctx.aptitude(aptitude), bonus);
    for &skill in skills {
        ctx.add_experience(skill, points);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_average_aptitude() {
        assert!((experience_points(100.0, 50.0, None) - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_aptitude_scales_award() {
        assert!((experience_points(100.0, 100.0, None) - 1.5).abs() < 1e-9);
        assert!((experience_points(100.0, 0.0, None) - 0.5).abs() < 1e-9);
    }

    #[test]
    fn test_teacher_multiplies_award() {
        let taught = experience_points(100.0, 50.0, Some(0.5));
        assert!((taught - 1.5).abs() < 1e-9);
    }

    #[test]
    fn test_teaching_bonus_never_negative() {
        assert_eq!(teaching_bonus(0, 0.0), 0.0);
        assert!((teaching_bonus(3, 50.0) - 0.6).abs() < 1e-9);
    }
}
