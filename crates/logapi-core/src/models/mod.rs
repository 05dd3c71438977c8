pub mod event;
pub mod outcome;
pub mod record;
