use std::collections::BTreeSet;

/// How a free-text chat utterance should be handled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChatIntent {
    /// An imperative edit instruction; goes to the refine pipeline.
    Edit,
    /// An informational question; goes to grounded chat.
    Question,
}

/// Imperative verbs that mark an utterance as an edit instruction.
/// Matched as whole tokens, not substrings, so "making plans" or
/// "trademark" never trip the classifier.
const EDIT_VERBS: &[&str] = &[
    "add", "change", "convert", "make", "move", "paint", "put", "remove", "repaint", "replace",
    "swap", "switch", "turn",
];

pub fn classify(text: &str) -> ChatIntent {
    let lowered = text.to_ascii_lowercase();
    let tokens = token_set(&lowered);
    if EDIT_VERBS.iter().any(|verb| tokens.contains(verb)) {
        ChatIntent::Edit
    } else {
        ChatIntent::Question
    }
}

fn token_set(text: &str) -> BTreeSet<&str> {
    text.split(|ch: char| !ch.is_ascii_alphanumeric())
        .filter(|token| !token.is_empty())
        .collect()
}

/// Optimistic acknowledgement appended when an edit instruction is
/// dispatched.
pub const EDIT_ACK: &str = "Coming right up! I'm updating your design now...";

/// Appended when a chat-dispatched refine ultimately fails, so the
/// transcript is not left showing a success-toned acknowledgement.
pub const EDIT_CORRECTION: &str =
    "Sorry, that update didn't go through. Your design is unchanged.";

/// Single generic failure message for either branch.
pub const CHAT_FAILURE: &str = "I encountered an error while processing that.";

#[cfg(test)]
mod tests {
    use super::{classify, ChatIntent};

    #[test]
    fn change_instruction_is_an_edit() {
        assert_eq!(classify("change the rug to blue"), ChatIntent::Edit);
    }

    #[test]
    fn make_instruction_is_an_edit() {
        assert_eq!(classify("Make the walls white"), ChatIntent::Edit);
    }

    #[test]
    fn shopping_question_is_informational() {
        assert_eq!(
            classify("where can I buy a sofa like this"),
            ChatIntent::Question
        );
    }

    #[test]
    fn verb_match_requires_whole_tokens() {
        assert_eq!(
            classify("what's the remainder of the budget for additions"),
            ChatIntent::Question
        );
        assert_eq!(classify("is this a trademark style?"), ChatIntent::Question);
    }

    #[test]
    fn classification_is_case_insensitive() {
        assert_eq!(classify("REMOVE the lamp"), ChatIntent::Edit);
    }
}
