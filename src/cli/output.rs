use colored::Colorize;

use crate::quickfix::actions::{ActionKind, CodeAction};
use crate::quickfix::apply::FixOutcome;

/// 1-based line number of a byte offset.
pub fn line_of(text: &str, offset: usize) -> usize {
    text[..offset.min(text.len())].matches('\n').count() + 1
}

pub fn covers_line(text: &str, start: usize, end: usize, line: usize) -> bool {
    line_of(text, start) <= line && line <= line_of(text, end)
}

fn pointer_label(pointer: &str) -> &str {
    if pointer.is_empty() {
        "(document root)"
    } else {
        pointer
    }
}

pub fn print_actions(actions: &[CodeAction]) {
    if actions.is_empty() {
        println!("{}", "No applicable fixes.".yellow());
        return;
    }
    for (index, action) in actions.iter().enumerate() {
        let label = match action.kind {
            ActionKind::Simple => "SIMPLE".green(),
            ActionKind::Assembled => "ASSEMBLED".blue(),
            ActionKind::Bulk => "BULK".cyan(),
        };
        let preferred = if action.preferred { " *" } else { "" };
        println!(
            "  {:>2}. {:<9} {}{}",
            index + 1,
            label,
            action.title,
            preferred.bold()
        );
        for issue in &action.issues {
            println!(
                "        {} at {}",
                issue.id.dimmed(),
                pointer_label(&issue.pointer)
            );
        }
    }
}

pub fn print_outcome(outcome: &FixOutcome, remaining: usize, dry_run: bool) {
    for issue in &outcome.fixed {
        println!(
            "  {} [{}] {}",
            "FIXED".green(),
            issue.id,
            pointer_label(&issue.pointer)
        );
    }
    for (pointer, err) in &outcome.skipped {
        println!("  {} [{}] {}", "SKIP".yellow(), pointer_label(pointer), err);
    }
    if dry_run {
        println!("  {} document not modified", "DRY-RUN".cyan());
    }
    println!(
        "\n{} fixed, {} skipped, {} issue(s) remain.",
        outcome.fixed.len(),
        outcome.skipped.len(),
        remaining
    );
}
