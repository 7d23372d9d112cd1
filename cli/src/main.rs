use aula::model::entity::{
    Answer, AnswerCreate, Course, CourseCreate, Exam, ExamCreate, ExamKind, Question,
    QuestionCreate, User, UserCreate,
};
use aula::model::{CrudRepository, DatabaseError, DbConnection, ModelManager};
use aula::web::{AuthenticatedUser, UserRole};
use clap::{Parser, Subcommand};
use rust_decimal::Decimal;

#[derive(Parser, Debug)]
#[command(about = "CLI tool for seeding the exam DB", long_about = None)]
pub struct Cli {
    /// Email of the user to act as
    #[arg(long, default_value = "admin@localhost")]
    pub as_user: String,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Manage users
    User {
        #[command(subcommand)]
        action: UserCommands,
    },

    /// Manage courses
    Course {
        #[command(subcommand)]
        action: CourseCommands,
    },

    /// Manage exams
    Exam {
        #[command(subcommand)]
        action: ExamCommands,
    },

    /// Manage questions
    Question {
        #[command(subcommand)]
        action: QuestionCommands,
    },
}

/// User management
#[derive(Subcommand, Debug)]
pub enum UserCommands {
    Add {
        #[arg(long)]
        name: String,
        #[arg(long)]
        email: String,
        #[arg(long, default_value = "student")]
        role: String,
    },
}

/// Course management
#[derive(Subcommand, Debug)]
pub enum CourseCommands {
    Add {
        #[arg(long)]
        name: String,
        #[arg(long)]
        description: Option<String>,
    },
}

/// Exam management
#[derive(Subcommand, Debug)]
pub enum ExamCommands {
    Add {
        /// Course name to attach the exam to
        #[arg(long)]
        course_name: String,
        #[arg(long)]
        title: String,
        #[arg(long, default_value = "sync")]
        kind: String,
        /// Lifecycle state kind, e.g. "disponible" or "activo"
        #[arg(long, default_value = "disponible")]
        state: String,
        #[arg(long)]
        weight: Option<i32>,
    },
}

/// Question management
#[derive(Subcommand, Debug)]
pub enum QuestionCommands {
    Add {
        /// Exam title to attach the question to
        #[arg(long)]
        exam_title: String,
        #[arg(long)]
        prompt: String,
        #[arg(long)]
        points: Option<i32>,
        /// Time limit in minutes; omit for unlimited
        #[arg(long)]
        duration: Option<Decimal>,
    },
    AddAnswer {
        /// Question prompt to attach the answer to
        #[arg(long)]
        question_prompt: String,
        #[arg(long)]
        text: String,
        #[arg(long, default_value_t = false)]
        is_correct: bool,
    },
}

#[tokio::main]
async fn main() -> aula::error::AppResult<()> {
    let _ = dotenvy::dotenv();
    let args = Cli::parse();

    let db_con = DbConnection::connect(&std::env::var("DATABASE_URL").unwrap())?;
    let mm = ModelManager::new(db_con);

    // Commands run as a real user so ownership columns get a valid id.
    let acting = User::find_by_email(&mm, &AuthenticatedUser::system(), &args.as_user)
        .await?
        .unwrap_or_else(|| panic!("no user with email {}", args.as_user));
    let actor = AuthenticatedUser::new(acting.id(), acting.role());

    match args.command {
        Commands::User { action } => match action {
            UserCommands::Add { name, email, role } => {
                let user = User::create(
                    &mm,
                    &actor,
                    UserCreate {
                        name,
                        email,
                        role: UserRole::from(role.as_str()),
                    },
                )
                .await?;
                println!("User created: {:?}", user);
            }
        },

        Commands::Course { action } => match action {
            CourseCommands::Add { name, description } => {
                let course = Course::create(&mm, &actor, CourseCreate { name, description }).await?;
                println!("Course created: {:?}", course);
            }
        },

        Commands::Exam { action } => match action {
            ExamCommands::Add { course_name, title, kind, state, weight } => {
                let course_id: String = sqlx::query_scalar("SELECT id FROM courses WHERE name = $1")
                    .bind(&course_name)
                    .fetch_one(mm.executor())
                    .await
                    .map_err(DatabaseError::SqlxError)?;

                let state_id: i32 = sqlx::query_scalar("SELECT id FROM states WHERE kind = $1")
                    .bind(&state)
                    .fetch_one(mm.executor())
                    .await
                    .map_err(DatabaseError::SqlxError)?;

                let exam = Exam::create(
                    &mm,
                    &actor,
                    ExamCreate {
                        title,
                        weight,
                        starts_at: None,
                        ends_at: None,
                        kind: ExamKind::from(kind.as_str()),
                        state_id,
                        course_id,
                    },
                )
                .await?;
                println!("Exam created: {:?}", exam);
            }
        },

        Commands::Question { action } => match action {
            QuestionCommands::Add { exam_title, prompt, points, duration } => {
                let exam_id: uuid::Uuid = sqlx::query_scalar("SELECT id FROM exams WHERE title = $1")
                    .bind(&exam_title)
                    .fetch_one(mm.executor())
                    .await
                    .map_err(DatabaseError::SqlxError)?;

                let question = Question::create(
                    &mm,
                    &actor,
                    QuestionCreate {
                        exam_id,
                        prompt,
                        points,
                        duration_limit: duration,
                    },
                )
                .await?;
                println!("Question created: {:?}", question);
            }

            QuestionCommands::AddAnswer { question_prompt, text, is_correct } => {
                let question_id: uuid::Uuid =
                    sqlx::query_scalar("SELECT id FROM questions WHERE prompt = $1")
                        .bind(&question_prompt)
                        .fetch_one(mm.executor())
                        .await
                        .map_err(DatabaseError::SqlxError)?;

                let answer = Answer::create(
                    &mm,
                    &actor,
                    AnswerCreate {
                        question_id,
                        text,
                        is_correct: Some(is_correct),
                    },
                )
                .await?;
                println!("Answer created: {:?}", answer);
            }
        },
    }

    Ok(())
}
