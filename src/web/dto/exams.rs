use serde::{Deserialize, Serialize};

use crate::model::entity::{Answer, Exam, Question};

#[derive(Serialize, Deserialize, utoipa::ToSchema)]
pub struct QuestionWithAnswers {
    pub question: Question,
    pub answers: Vec<Answer>,
}

/// Exam together with its question tree, as shown to the exam's author.
#[derive(Serialize, Deserialize, utoipa::ToSchema)]
pub struct ExamDetailResponse {
    pub exam: Exam,
    pub questions: Vec<QuestionWithAnswers>,
}

impl ExamDetailResponse {
    pub fn from_entities(exam: Exam, questions: Vec<(Question, Vec<Answer>)>) -> Self {
        Self {
            exam,
            questions: questions
                .into_iter()
                .map(|(question, answers)| QuestionWithAnswers { question, answers })
                .collect(),
        }
    }
}
