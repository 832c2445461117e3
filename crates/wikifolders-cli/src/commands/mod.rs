pub mod clear;
pub mod edit;
pub mod html;
pub mod refresh;
pub mod show;
pub mod status;
pub mod watch;
