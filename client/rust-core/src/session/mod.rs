pub mod controller;
pub mod results;
pub mod state;
pub mod timer;

pub use controller::SessionController;
pub use state::QuestionState;
pub use timer::{TimerAccumulator, MAX_QUESTION_MS};
