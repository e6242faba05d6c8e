//! Terminal output.
//!
//! Results go to stdout; logs and failures go to stderr.

#![allow(clippy::print_stdout, clippy::print_stderr)]

pub fn line(text: &str) {
    println!("{text}");
}

pub fn json(value: &serde_json::Value) {
    if value.is_null() {
        return;
    }
    match serde_json::to_string_pretty(value) {
        Ok(text) => println!("{text}"),
        Err(_) => println!("{value}"),
    }
}

pub fn failure(message: &str) {
    eprintln!("error: {message}");
}
