pub mod attempts;
pub mod mastery;
pub mod practice;
pub mod sessions;
pub mod settings;
pub mod statistics;
pub mod word_lists;
