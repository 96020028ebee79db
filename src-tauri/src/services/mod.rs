pub mod controller;
pub mod projection;
pub mod state_machine;
pub mod uploader;
pub mod validator;
