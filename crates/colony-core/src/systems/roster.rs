//! Crew roster and teaching requests.
//!
//! Colonists are advanced one at a time, so an activity can only see the
//! rest of the crew through a snapshot taken at the start of the tick.
//! Changes to another colonist's activity are queued and applied after
//! every colonist has advanced.

use std::collections::BTreeMap;

use bevy_ecs::prelude::*;
use tracing::debug;

use crate::activity::experience::teaching_bonus;
use crate::activity::Activity;
use crate::components::{
    AgentId, Aptitude, Aptitudes, Colonist, CurrentActivity, LocalPosition, Position, SkillKind,
    Skills,
};
use crate::context::TeachingRequest;

/// What the rest of the crew knows about one colonist this tick
#[derive(Debug, Clone)]
pub struct RosterEntry {
    pub position: LocalPosition,
    pub skills: Skills,
    pub teaching_aptitude: f64,
    /// Busy with an activity that a teacher may join
    pub teachable: bool,
    pub has_teacher: bool,
}

impl RosterEntry {
    /// Experience bonus this colonist grants when teaching
    pub fn teaching_bonus(&self) -> f64 {
        teaching_bonus(self.skills.level(SkillKind::Teaching), self.teaching_aptitude)
    }
}

/// Resource: per-tick snapshot of the crew, ordered by id
#[derive(Resource, Debug, Default)]
pub struct CrewRoster {
    entries: BTreeMap<AgentId, RosterEntry>,
}

impl CrewRoster {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, id: AgentId, entry: RosterEntry) {
        self.entries.insert(id, entry);
    }

    pub fn get(&self, id: &AgentId) -> Option<&RosterEntry> {
        self.entries.get(id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// First colonist, by id, who could learn `skill` from `teacher`.
    pub fn find_student(
        &self,
        teacher: &AgentId,
        skill: SkillKind,
        pending: &TeachingRequests,
    ) -> Option<AgentId> {
        let teacher_level = self.entries.get(teacher)?.skills.level(skill);
        self.entries
            .iter()
            .find(|(id, entry)| {
                *id != teacher
                    && entry.teachable
                    && !entry.has_teacher
                    && entry.skills.level(skill) < teacher_level
                    && !pending.is_assigned(id)
            })
            .map(|(id, _)| id.clone())
    }
}

/// Resource: teacher changes queued during the tick
#[derive(Resource, Debug, Default)]
pub struct TeachingRequests {
    requests: Vec<TeachingRequest>,
}

impl TeachingRequests {
    pub fn push(&mut self, request: TeachingRequest) {
        self.requests.push(request);
    }

    /// A teacher was already requested for `student` this tick
    pub fn is_assigned(&self, student: &AgentId) -> bool {
        self.requests.iter().any(|request| {
            matches!(request, TeachingRequest::Attach { .. }) && request.student() == student
        })
    }

    pub fn drain(&mut self) -> Vec<TeachingRequest> {
        std::mem::take(&mut self.requests)
    }

    pub fn is_empty(&self) -> bool {
        self.requests.is_empty()
    }
}

/// Apply one request to the student's current activity.
///
/// Returns whether the activity's teacher changed. A detach only clears the
/// teacher that asked for it, so a teacher who has already been replaced
/// cannot remove its successor.
pub fn apply_request(activity: &mut Activity, request: &TeachingRequest) -> bool {
    match request {
        TeachingRequest::Attach { teacher, .. } => {
            if !activity.accepts_teacher() {
                return false;
            }
            activity.set_teacher(Some(teacher.clone()));
            true
        }
        TeachingRequest::Detach { teacher, .. } => {
            if activity.teacher() != Some(teacher) {
                return false;
            }
            activity.set_teacher(None);
            true
        }
    }
}

/// System: snapshot the crew for this tick
pub fn build_crew_roster(
    mut roster: ResMut<CrewRoster>,
    query: Query<(&AgentId, &Position, &Skills, &Aptitudes, &CurrentActivity), With<Colonist>>,
) {
    roster.entries.clear();
    for (id, position, skills, aptitudes, current) in query.iter() {
        let activity = current.0.as_ref();
        roster.insert(
            id.clone(),
            RosterEntry {
                position: position.0,
                skills: skills.clone(),
                teaching_aptitude: aptitudes.get(Aptitude::Teaching),
                teachable: activity.is_some_and(|a| a.accepts_teacher()),
                has_teacher: activity.is_some_and(|a| a.teacher().is_some()),
            },
        );
    }
}

/// System: attach or detach teachers requested during the tick
pub fn apply_teaching_requests(
    mut requests: ResMut<TeachingRequests>,
    mut query: Query<(&AgentId, &mut CurrentActivity), With<Colonist>>,
) {
    if requests.is_empty() {
        return;
    }
    let pending = requests.drain();
    for (id, mut current) in query.iter_mut() {
        let Some(activity) = current.0.as_mut() else {
            continue;
        };
        for request in pending.iter().filter(|r| r.student() == id) {
            if apply_request(activity, request) {
                debug!(
                    student = %id,
                    teacher = %request.teacher(),
                    activity = activity.name(),
                    "Teacher changed"
                );
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SimConfig;
    use crate::sandbox::Sandbox;
    use crate::tasks::{PerformResearch, Sleep};

    fn entry(teaching: u32, science: u32, teachable: bool) -> RosterEntry {
        RosterEntry {
            position: LocalPosition::ORIGIN,
            skills: Skills::new()
                .with_level(SkillKind::Teaching, teaching)
                .with_level(SkillKind::Science, science),
            teaching_aptitude: 50.0,
            teachable,
            has_teacher: false,
        }
    }

    #[test]
    fn test_find_student_requires_lower_skill() {
        let mut roster = CrewRoster::new();
        roster.insert(AgentId::new("a"), entry(2, 3, false));
        roster.insert(AgentId::new("b"), entry(0, 3, true));
        roster.insert(AgentId::new("c"), entry(0, 1, true));

        let pending = TeachingRequests::default();
        let student = roster.find_student(&AgentId::new("a"), SkillKind::Science, &pending);
        assert_eq!(student, Some(AgentId::new("c")));
    }

    #[test]
    fn test_find_student_skips_pending() {
        let mut roster = CrewRoster::new();
        roster.insert(AgentId::new("a"), entry(2, 3, false));
        roster.insert(AgentId::new("c"), entry(0, 1, true));

        let mut pending = TeachingRequests::default();
        pending.push(TeachingRequest::Attach {
            student: AgentId::new("c"),
            teacher: AgentId::new("z"),
        });
        assert_eq!(
            roster.find_student(&AgentId::new("a"), SkillKind::Science, &pending),
            None
        );
    }

    #[test]
    fn test_teaching_bonus_from_roster() {
        let teacher = entry(3, 0, false);
        assert!((teacher.teaching_bonus() - 0.6).abs() < 1e-9);
    }

    fn research(ctx: &mut Sandbox) -> Activity {
        PerformResearch::activity(LocalPosition::ORIGIN, &SimConfig::default(), ctx)
    }

    fn attach(student: &str, teacher: &str) -> TeachingRequest {
        TeachingRequest::Attach {
            student: AgentId::new(student),
            teacher: AgentId::new(teacher),
        }
    }

    fn detach(student: &str, teacher: &str) -> TeachingRequest {
        TeachingRequest::Detach {
            student: AgentId::new(student),
            teacher: AgentId::new(teacher),
        }
    }

    #[test]
    fn test_pending_detach_does_not_count_as_assigned() {
        let mut pending = TeachingRequests::default();
        pending.push(detach("c", "a"));
        assert!(!pending.is_assigned(&AgentId::new("c")));
        pending.push(attach("c", "b"));
        assert!(pending.is_assigned(&AgentId::new("c")));
    }

    #[test]
    fn test_attach_requires_teachable_activity() {
        let mut ctx = Sandbox::new("b");
        let mut sleep = Sleep::activity(LocalPosition::ORIGIN, &SimConfig::default(), &mut ctx);
        assert!(!apply_request(&mut sleep, &attach("b", "a")));
        assert_eq!(sleep.teacher(), None);

        let mut activity = research(&mut ctx);
        assert!(apply_request(&mut activity, &attach("b", "a")));
        assert_eq!(activity.teacher(), Some(&AgentId::new("a")));
    }

    #[test]
    fn test_detach_only_clears_own_assignment() {
        let mut ctx = Sandbox::new("b");
        let mut activity = research(&mut ctx);
        apply_request(&mut activity, &attach("b", "second"));

        assert!(!apply_request(&mut activity, &detach("b", "first")));
        assert_eq!(activity.teacher(), Some(&AgentId::new("second")));

        assert!(apply_request(&mut activity, &detach("b", "second")));
        assert_eq!(activity.teacher(), None);
    }

    #[test]
    fn test_stale_detach_keeps_new_teacher_on_next_activity() {
        let mut world = World::new();
        let mut ctx = Sandbox::new("student");
        let student = world
            .spawn((
                Colonist,
                AgentId::new("student"),
                CurrentActivity(Some(research(&mut ctx))),
            ))
            .id();
        world.insert_resource(TeachingRequests::default());
        let mut schedule = Schedule::default();
        schedule.add_systems(apply_teaching_requests);

        world
            .resource_mut::<TeachingRequests>()
            .push(attach("student", "first"));
        schedule.run(&mut world);

        // The student moves on to new research and a second teacher joins it
        // in the same tick the first teacher finishes.
        world.entity_mut(student).insert(CurrentActivity(Some(research(&mut ctx))));
        {
            let mut requests = world.resource_mut::<TeachingRequests>();
            requests.push(attach("student", "second"));
            requests.push(detach("student", "first"));
        }
        schedule.run(&mut world);

        let teacher = world
            .get::<CurrentActivity>(student)
            .and_then(|current| current.0.as_ref())
            .and_then(|activity| activity.teacher().cloned());
        assert_eq!(teacher, Some(AgentId::new("second")));
        assert!(world.resource::<TeachingRequests>().is_empty());
    }
}
