mod common;

mod save_tests;
mod slug_tests;
