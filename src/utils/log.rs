// src/utils/log.rs

//! Section-style log helpers.
//!
//! Everything goes through the `log` facade at INFO, so the level filter
//! configured in `env_logger` (or any other backend) applies.

const RULE_WIDTH: usize = 60;

/// Log a step in a process
pub fn step(step_num: usize, total: usize, message: &str) {
    log::info!("{}", render_step(step_num, total, message));
}

/// Log a header
pub fn header(title: &str) {
    for line in render_header(title) {
        log::info!("{}", line);
    }
}

/// Log a sub-item (indented)
pub fn sub_item(message: &str) {
    log::info!("    {}", message);
}

/// Log a summary section
pub fn summary(title: &str, items: &[(&str, String)]) {
    for line in render_summary(title, items) {
        log::info!("{}", line);
    }
}

fn render_step(step_num: usize, total: usize, message: &str) -> String {
    format!("[STEP {}/{}] {}", step_num, total, message)
}

fn render_header(title: &str) -> Vec<String> {
    let border = "═".repeat(RULE_WIDTH);
    vec![border.clone(), format!("  {}", title), border]
}

fn render_summary(title: &str, items: &[(&str, String)]) -> Vec<String> {
    let width = items.iter().map(|(key, _)| key.len()).max().unwrap_or(0);
    std::iter::once(format!("[SUMMARY] {}", title))
        .chain(
            items
                .iter()
                .map(|(key, value)| format!("    {:<width$} : {}", key, value, width = width)),
        )
        .collect()
}
