pub mod gateway;
pub mod prompts;

pub use gateway::{
    AiConfig, AiGateway, ConceptExplanation, GeneratedQuestion, MAX_QUESTIONS_PER_REQUEST,
    QuestionRequest,
};
