mod api;
mod messages;
mod session_impl;
mod state;

pub use api::*;
pub use messages::{check_field_count, parse_move_reply, split_fields, FramingError, MatchMessage};
pub use session_impl::run_match;
pub use state::{Match, MatchError, Step};
