pub mod notation;
pub mod pgn;
pub mod position;
pub mod record;
pub mod utils;

pub use pgn::parse_pgn;
pub use position::Position;
pub use record::GameRecord;
pub use utils::GameStatus;
