//! Prompt templates for the chat-completions provider.

use super::gateway::QuestionRequest;

pub const QUESTIONS_SYSTEM_PROMPT: &str = "You are an interview coach. \
Respond with a JSON array only, no prose and no markdown fences. \
Each element must be an object with string fields \"question\" and \"answer\".";

pub const EXPLANATION_SYSTEM_PROMPT: &str = "You are an interview coach. \
Respond with a single JSON object only, no prose and no markdown fences. \
The object must have string fields \"title\" and \"explanation\".";

#[must_use]
pub fn question_answer_prompt(request: &QuestionRequest) -> String {
    format!(
        "Role: {role}\n\
         Candidate experience: {experience}\n\
         Focus topics: {topics}\n\n\
         Write {count} interview questions for this candidate. \
         For each question give a beginner-friendly answer. \
         If an answer needs a code example, put it inside the answer string.",
        role = request.role(),
        experience = request.experience(),
        topics = request.topics().join(", "),
        count = request.count(),
    )
}

#[must_use]
pub fn concept_explain_prompt(question: &str) -> String {
    format!(
        "Explain the concept behind this interview question in depth, \
         as if teaching a beginner developer. \
         Give the explanation a short, clear title.\n\n\
         Question: {question}"
    )
}
