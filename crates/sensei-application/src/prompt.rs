//! Prompt templates for the tutoring phases.
//!
//! Three embedded minijinja templates — start, learning, assignment — turn
//! the current phase, the unit metadata, and the assignment counts into the
//! system prompt sent with each completion request. The learning and
//! assignment templates also instruct the model about the sentinel tokens
//! it may embed; the token strings themselves come from
//! `sensei_core::marker` so this module never spells them out twice.

use minijinja::{Environment, context};
use sensei_core::error::{Result, SenseiError};
use sensei_core::marker::{ASSIGNMENT_COMPLETE, LEARNING_PHASE_COMPLETE, SUBTOPIC_COMPLETE};
use sensei_core::session::{AssignmentCounts, Phase};
use sensei_core::unit::UnitMetadata;

const START_TEMPLATE: &str = "\
You are a patient, encouraging tutor opening a brand-new lesson.
Lesson goal: {{ goal }}
{% if concepts %}Concepts to cover, in order:
{% for concept in concepts %}- {{ concept }}
{% endfor %}{% endif -%}
{% if prerequisites %}The learner is assumed to know:
{% for prereq in prerequisites %}- {{ prereq }}
{% endfor %}{% endif -%}
Greet the learner warmly, name the goal in one sentence, and introduce the
first concept with a short question to gauge where they stand. Keep it under
four sentences.";

const LEARNING_TEMPLATE: &str = "\
You are a patient, encouraging tutor in the teaching phase of a lesson.
Lesson goal: {{ goal }}
{% if concepts %}Concepts to cover:
{% for concept in concepts %}- {{ concept }}
{% endfor %}{% endif -%}
Teach one concept at a time, checking understanding with short questions
before moving on. When the learner has demonstrated understanding of every
concept, congratulate them and include the exact token {{ advance_token }}
anywhere in your reply. Never mention the token otherwise.";

const ASSIGNMENT_TEMPLATE: &str = "\
You are a patient, encouraging tutor in the practice phase of a lesson.
Lesson goal: {{ goal }}
{% if assignment_prompts %}Candidate assignments:
{% for prompt in assignment_prompts %}- {{ prompt }}
{% endfor %}{% endif -%}
Assignments completed so far: {{ completed }} of {{ total }} attempted.
Pose one assignment at a time and evaluate the learner's answer. When an
assignment is answered correctly, include the exact token {{ done_token }}
in your reply. When the learner has shown mastery of the whole subtopic,
include the exact token {{ mastered_token }}. Never mention the tokens
otherwise.";

/// Renders the per-phase system prompts.
pub struct PromptRenderer {
    env: Environment<'static>,
}

impl PromptRenderer {
    /// Builds the renderer with the embedded templates.
    pub fn new() -> Result<Self> {
        let mut env = Environment::new();
        for (name, source) in [
            ("start", START_TEMPLATE),
            ("learning", LEARNING_TEMPLATE),
            ("assignment", ASSIGNMENT_TEMPLATE),
        ] {
            env.add_template(name, source)
                .map_err(|e| SenseiError::internal(format!("bad template '{name}': {e}")))?;
        }
        Ok(Self { env })
    }

    /// Renders the opening prompt used by `start_unit`.
    pub fn render_opening(&self, metadata: &UnitMetadata) -> Result<String> {
        self.render(
            "start",
            context! {
                goal => metadata.goal,
                concepts => metadata.concepts,
                prerequisites => metadata.prerequisites,
            },
        )
    }

    /// Renders the system prompt for the current phase of a turn.
    pub fn render_phase(
        &self,
        phase: Phase,
        metadata: &UnitMetadata,
        counts: &AssignmentCounts,
    ) -> Result<String> {
        match phase {
            Phase::Learning => self.render(
                "learning",
                context! {
                    goal => metadata.goal,
                    concepts => metadata.concepts,
                    advance_token => LEARNING_PHASE_COMPLETE,
                },
            ),
            Phase::Assignment => self.render(
                "assignment",
                context! {
                    goal => metadata.goal,
                    assignment_prompts => metadata.assignment_prompts,
                    completed => counts.completed,
                    total => counts.total,
                    done_token => ASSIGNMENT_COMPLETE,
                    mastered_token => SUBTOPIC_COMPLETE,
                },
            ),
        }
    }

    fn render(&self, name: &str, ctx: minijinja::Value) -> Result<String> {
        let template = self
            .env
            .get_template(name)
            .map_err(|e| SenseiError::internal(format!("missing template '{name}': {e}")))?;
        template
            .render(ctx)
            .map_err(|e| SenseiError::internal(format!("failed to render '{name}': {e}")))
    }
}
