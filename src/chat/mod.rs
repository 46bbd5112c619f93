pub mod engine;
pub mod turn;

pub use engine::{ChatEngine, Conversation};
pub use turn::{TurnNotice, TurnOutcome, TurnRequest, TurnState};
