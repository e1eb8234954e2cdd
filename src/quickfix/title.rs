/// Merge a fix title into a running list of titles, one entry per sentence.
///
/// Positional word comparison, order-sensitive, no backtracking:
/// - different first word: the title starts a new entry (lowercased lead);
/// - same first word, different last word: the remaining words join the
///   previous entry after a comma;
/// - same first and last word: the new title's unshared middle words slot
///   into the previous entry just before its trailing word.
pub fn update_title(titles: &mut Vec<String>, title: &str) {
    let Some(prev) = titles.last_mut() else {
        titles.push(title.to_string());
        return;
    };

    let parts: Vec<&str> = title.split(' ').collect();
    let prev_parts: Vec<&str> = prev.split(' ').collect();
    if parts.is_empty() || prev_parts.is_empty() {
        return;
    }

    if !eq_ci(parts[0], prev_parts[0]) {
        let mut parts: Vec<String> = parts.iter().map(|word| word.to_string()).collect();
        parts[0] = parts[0].to_lowercase();
        titles.push(parts.join(" "));
        return;
    }

    if !eq_ci(parts[parts.len() - 1], prev_parts[prev_parts.len() - 1]) {
        let rest = parts[1..].join(" ");
        prev.push_str(", ");
        prev.push_str(&rest);
        return;
    }

    // Shared lead and trail; splice in whatever the new title adds.
    let mut shared = 0;
    while shared < parts.len() - 1
        && shared < prev_parts.len() - 1
        && eq_ci(parts[shared], prev_parts[shared])
    {
        shared += 1;
    }
    let middle = &parts[shared..parts.len() - 1];
    if middle.is_empty() {
        return;
    }
    let mut merged = prev_parts[..prev_parts.len() - 1].join(" ");
    merged.push_str(", ");
    merged.push_str(&middle.join(" "));
    merged.push(' ');
    merged.push_str(prev_parts[prev_parts.len() - 1]);
    *prev = merged;
}

fn eq_ci(a: &str, b: &str) -> bool {
    a.to_lowercase() == b.to_lowercase()
}

/// The user-facing title of an assembled fix. Pluralization comes from this
/// template, not from the merge step, and substitutes at most once.
pub fn combined_title(titles: &[String]) -> String {
    titles
        .join(", ")
        .replacen("property", "properties", 1)
        .replacen("response", "responses", 1)
}

/// The user-facing title of a bulk fix.
pub fn bulk_title(title: &str, locations: usize) -> String {
    format!("Group fix: {} in {} locations", title, locations)
}
