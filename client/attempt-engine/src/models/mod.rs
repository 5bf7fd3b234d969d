pub mod answers;
pub mod attempt;
pub mod results;
pub mod timer;

pub use answers::{AnswerValue, AnswersPayload};
pub use attempt::{
    AttemptDoc, AttemptFetch, AttemptSpec, BasicSpec, CellRef, ChoiceOption, CrosswordEntry,
    CrosswordSpec, ItemKind, QuizItem, RapidItem, RapidSpec,
};
pub use results::{FinishSummary, ResultsRoute, SaveAck};
pub use timer::{TimeExpired, TimerEvent, TimerTick};
