//! Quest and step vocabulary with validation helpers.
//!
//! Question, answer and theme kinds are stored as `TEXT` columns guarded by
//! `CHECK` constraints; the constants here are the single source of the
//! accepted values for both the DB and API layers.

use validator::ValidateEmail;

/// Plain-text question shown to the recipient.
pub const QUESTION_TEXT: &str = "text";

/// Question whose content is an image reference.
pub const QUESTION_IMAGE: &str = "image";

/// Question whose content is an audio reference.
pub const QUESTION_SOUND: &str = "sound";

/// Question whose content is a video reference.
pub const QUESTION_VIDEO: &str = "video";

/// All valid question types.
pub const VALID_QUESTION_TYPES: &[&str] =
    &[QUESTION_TEXT, QUESTION_IMAGE, QUESTION_SOUND, QUESTION_VIDEO];

/// Free-text answer compared against the accepted answer list.
pub const ANSWER_TEXT: &str = "text";

/// All valid answer types.
pub const VALID_ANSWER_TYPES: &[&str] = &[ANSWER_TEXT];

/// All valid quest themes. A quest without a theme uses the client default.
pub const VALID_THEMES: &[&str] = &["classic", "birthday", "new_year", "halloween", "romantic"];

/// Maximum length of a quest name (mirrors `VARCHAR(255)`).
pub const MAX_NAME_LEN: usize = 255;

/// Maximum length of a recipient display name.
pub const MAX_RECIPIENT_NAME_LEN: usize = 255;

/// The step fields that validation inspects.
///
/// Implemented by the persistence layer's step input DTO so that validation can
/// live here without this crate knowing about row types.
pub trait StepDraft {
    fn sort(&self) -> i32;
    fn question_type(&self) -> &str;
    fn question_content(&self) -> Option<&str>;
    fn answer_type(&self) -> &str;
    fn accepted_answers(&self) -> &[String];
}

/// Validate a quest name: non-blank and at most [`MAX_NAME_LEN`] characters.
pub fn validate_name(name: &str) -> Result<(), String> {
    if name.trim().is_empty() {
        return Err("Quest name must not be empty".to_string());
    }
    if name.chars().count() > MAX_NAME_LEN {
        return Err(format!(
            "Quest name must be at most {MAX_NAME_LEN} characters"
        ));
    }
    Ok(())
}

/// Validate an optional theme against [`VALID_THEMES`].
pub fn validate_theme(theme: Option<&str>) -> Result<(), String> {
    match theme {
        None => Ok(()),
        Some(t) if VALID_THEMES.contains(&t) => Ok(()),
        Some(t) => Err(format!(
            "Invalid theme '{t}'. Must be one of: {}",
            VALID_THEMES.join(", ")
        )),
    }
}

/// Validate a full step list.
///
/// Every step needs a unique `sort`, a known question and answer type, content
/// for text questions, and at least one non-blank accepted answer. An empty
/// list is valid here; sending or starting such a quest is rejected later.
pub fn validate_steps<S: StepDraft>(steps: &[S]) -> Result<(), String> {
    let mut seen = std::collections::HashSet::with_capacity(steps.len());

    for step in steps {
        let sort = step.sort();
        if sort < 0 {
            return Err(format!("Step sort must be non-negative, got {sort}"));
        }
        if !seen.insert(sort) {
            return Err(format!("Duplicate step sort {sort}"));
        }

        if !VALID_QUESTION_TYPES.contains(&step.question_type()) {
            return Err(format!(
                "Invalid question type '{}'. Must be one of: {}",
                step.question_type(),
                VALID_QUESTION_TYPES.join(", ")
            ));
        }
        if !VALID_ANSWER_TYPES.contains(&step.answer_type()) {
            return Err(format!(
                "Invalid answer type '{}'. Must be one of: {}",
                step.answer_type(),
                VALID_ANSWER_TYPES.join(", ")
            ));
        }

        let has_content = step
            .question_content()
            .is_some_and(|c| !c.trim().is_empty());
        if step.question_type() == QUESTION_TEXT && !has_content {
            return Err(format!("Step {sort} has an empty question"));
        }

        if !step.accepted_answers().iter().any(|a| !a.trim().is_empty()) {
            return Err(format!("Step {sort} needs at least one accepted answer"));
        }
    }

    Ok(())
}

/// Trim and lower-case an email so one recipient has exactly one identity.
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Validate a recipient email address.
pub fn validate_email(email: &str) -> Result<(), String> {
    if email.validate_email() {
        Ok(())
    } else {
        Err(format!("invalid_email: '{email}' is not a valid email"))
    }
}

/// Validate a recipient display name.
pub fn validate_recipient_name(name: &str) -> Result<(), String> {
    if name.trim().is_empty() {
        return Err("Recipient name must not be empty".to_string());
    }
    if name.chars().count() > MAX_RECIPIENT_NAME_LEN {
        return Err(format!(
            "Recipient name must be at most {MAX_RECIPIENT_NAME_LEN} characters"
        ));
    }
    Ok(())
}
