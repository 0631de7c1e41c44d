pub mod play;
pub mod store;
pub mod validate;

/// Identifier assigned by the store. Signed so that any integer the user types can be looked up.
pub type QuizId = i64;

#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct QuizRecord {
    pub id: QuizId,
    pub question: String,
    pub answer: String,
}

impl QuizRecord {
    /// Answers are compared case-insensitively, ignoring surrounding whitespace.
    pub fn is_answered_by(&self, reply: &str) -> bool {
        reply.trim().to_uppercase() == self.answer.trim().to_uppercase()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewQuiz {
    pub question: String,
    pub answer: String,
}

impl NewQuiz {
    pub fn new(question: impl Into<String>, answer: impl Into<String>) -> Self {
        Self {
            question: question.into(),
            answer: answer.into(),
        }
    }
}
