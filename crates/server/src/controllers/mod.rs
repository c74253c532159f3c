//! Controller-style routes

mod game_rating;

pub use game_rating::GameRatingController;
