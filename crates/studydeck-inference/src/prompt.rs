//! System instruction for flashcard generation.

use studydeck_core::DuplicateIndex;

/// Build the system instruction sent ahead of the source text.
///
/// The instruction fixes the output contract the recovery engine expects: a
/// single JSON array of `{"question", "answer"}` string objects with nothing
/// around it. Existing questions are listed so the model avoids repeating
/// them; the list is a hint only.
pub fn flashcard_system_prompt(target_count: usize, existing: &DuplicateIndex) -> String {
    let mut prompt = format!(
        "You are a helpful flashcard generator. Respond with exactly {target_count} flashcards \
         as one valid JSON array of objects, each with a string field \"question\" and a string \
         field \"answer\", like this:\n\
         [\n  {{ \"question\": \"What is ...?\", \"answer\": \"...\" }},\n  ...\n]\n"
    );

    if !existing.is_empty() {
        let listed: Vec<&str> = existing.iter().collect();
        prompt.push_str(
            "IMPORTANT: do not generate flashcards with these questions (or very similar ones), \
             as they already exist: ",
        );
        prompt.push_str(&listed.join(", "));
        prompt.push('\n');
    }

    prompt.push_str(
        "Create diverse flashcards covering different aspects of the content.\n\
         Only use alphanumeric characters, common punctuation and standard printable ASCII.\n\
         Do not include any explanation or text outside the JSON array.",
    );
    prompt
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prompt_states_target_count() {
        let prompt = flashcard_system_prompt(12, &DuplicateIndex::default());
        assert!(prompt.contains("exactly 12 flashcards"));
        assert!(prompt.contains("\"question\""));
        assert!(prompt.contains("\"answer\""));
    }

    #[test]
    fn test_prompt_omits_exclusions_when_index_empty() {
        let prompt = flashcard_system_prompt(12, &DuplicateIndex::default());
        assert!(!prompt.contains("already exist"));
    }

    #[test]
    fn test_prompt_lists_normalized_exclusions_in_order() {
        let index = DuplicateIndex::from_questions(["What is RNA?", " what is dna? "]);
        let prompt = flashcard_system_prompt(12, &index);
        assert!(prompt.contains("already exist: what is dna?, what is rna?"));
    }
}
