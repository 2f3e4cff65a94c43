mod common;
mod install_tests;
mod run_tests;
