pub mod event;
pub mod remote;
