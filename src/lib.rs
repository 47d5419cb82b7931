pub mod dispatch;
pub mod env;
pub mod episode;
pub mod input;
pub mod keys;
pub mod motion;
pub mod pose;
pub mod runtime;
pub mod scheduler;
