pub mod gameplay;

mod demo;

pub(crate) use demo::run_demo_session;
