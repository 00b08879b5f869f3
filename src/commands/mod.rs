pub mod config;
mod install;
mod list;
mod remove;

pub use install::install;
pub use list::list;
pub use remove::remove;

/// `"a"`, `"a" and "b"`, `"a", "b" and "c"`
pub(crate) fn join_quoted<S: AsRef<str>>(items: &[S]) -> String {
    let quoted: Vec<String> = items
        .iter()
        .map(|s| format!("\"{}\"", s.as_ref()))
        .collect();
    match quoted.split_last() {
        None => String::new(),
        Some((last, [])) => last.clone(),
        Some((last, rest)) => format!("{} and {}", rest.join(", "), last),
    }
}
