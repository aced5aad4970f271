use std::fmt::Write;

use shared::models::{EnergyLevel, MiniPractice, MoodTag, PracticeEnvironment, Role};

use crate::session::ChatTurn;

pub fn render_turn(turn: &ChatTurn) -> String {
    let speaker = match turn.role {
        Role::User => "you",
        Role::Assistant => "koa",
        Role::System => "system",
    };

    let mut out = format!("{speaker}> {}", turn.content);
    if let Some(practice) = &turn.mini_practice {
        out.push_str("\n\n");
        out.push_str(&render_practice(practice));
    }
    out
}

pub fn render_practice(practice: &MiniPractice) -> String {
    let mut out = format!(
        "  [{}] {} · {} energy · {}",
        practice.title,
        practice.duration,
        energy_label(practice.energy_level),
        environment_label(practice.environment),
    );

    if !practice.mood_tags.is_empty() {
        let tags = practice
            .mood_tags
            .iter()
            .map(|tag| mood_label(*tag))
            .collect::<Vec<_>>()
            .join(", ");
        let _ = write!(out, "\n  for: {tags}");
    }

    for (index, step) in practice.steps.iter().enumerate() {
        let _ = write!(out, "\n  {}. {step}", index + 1);
    }

    if let Some(note) = practice.note.as_deref().filter(|note| !note.trim().is_empty()) {
        let _ = write!(out, "\n  note: {note}");
    }

    out
}

const fn energy_label(level: EnergyLevel) -> &'static str {
    match level {
        EnergyLevel::Low => "low",
        EnergyLevel::Medium => "medium",
        EnergyLevel::High => "high",
    }
}

const fn environment_label(environment: PracticeEnvironment) -> &'static str {
    match environment {
        PracticeEnvironment::AtDesk => "at your desk",
        PracticeEnvironment::Commute => "on the commute",
        PracticeEnvironment::Bedtime => "at bedtime",
        PracticeEnvironment::Flexible => "anywhere",
    }
}

const fn mood_label(tag: MoodTag) -> &'static str {
    match tag {
        MoodTag::Stressed => "stressed",
        MoodTag::Anxious => "anxious",
        MoodTag::Tired => "tired",
        MoodTag::Sad => "sad",
        MoodTag::Restless => "restless",
        MoodTag::Overwhelmed => "overwhelmed",
        MoodTag::Unfocused => "unfocused",
        MoodTag::Lonely => "lonely",
    }
}
