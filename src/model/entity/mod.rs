mod user;
pub use user::{User, UserCreate, UserPatch};

mod state;
pub use state::{State, StateType};

mod course;
pub use course::{Course, CourseCreate, CoursePatch};

mod exam;
pub use exam::{Exam, ExamCreate, ExamKind, ExamPatch};

mod question;
pub use question::{Question, QuestionCreate, QuestionPatch};

mod answer;
pub use answer::{Answer, AnswerCreate, AnswerPatch};

mod session;
pub use session::ExamSession;

mod attempt;
pub use attempt::{AttemptStatus, QuestionAttempt};

mod history;
pub use history::History;

mod rubric;
pub use rubric::{Rubric, RubricCreate, RubricKind, RubricPatch};

mod indicator;
pub use indicator::{Indicator, IndicatorCreate, IndicatorPatch};

mod achievement_level;
pub use achievement_level::{
    AchievementLevel, AchievementLevelCreate, AchievementLevelPatch, LevelKind,
};
