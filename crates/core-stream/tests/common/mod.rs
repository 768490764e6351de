pub mod fake_terminal;
