use doclib::DocumentRecord;

const MAX_NAME_WIDTH: usize = 40;
const LINE_BUDGET: usize = 100;

/// Print records grouped by category, in first-seen category order.
pub fn print_record_table(records: &[DocumentRecord]) {
    if records.is_empty() {
        println!("No matching documents.");
        return;
    }

    let groups = group_by_category(records);
    let mut first = true;

    for (category, entries) in &groups {
        if !first {
            println!();
        }
        first = false;

        let name_width = entries
            .iter()
            .map(|r| r.file_name.chars().count())
            .max()
            .unwrap_or(0)
            .min(MAX_NAME_WIDTH);

        let url_budget = LINE_BUDGET.saturating_sub(2 + name_width + 2);

        println!("{} ({})", category_label(category), entries.len());

        for entry in entries {
            let name = truncate(&entry.file_name, name_width);
            let url = truncate(entry.source_url.as_str(), url_budget);

            println!("  {:<width$}  {}", name, url, width = name_width);
        }
    }

    println!("\n{} documents", records.len());
}

fn category_label(category: &str) -> &str {
    if category.is_empty() {
        "(uncategorized)"
    } else {
        category
    }
}

fn group_by_category(records: &[DocumentRecord]) -> Vec<(&str, Vec<&DocumentRecord>)> {
    let mut groups: Vec<(&str, Vec<&DocumentRecord>)> = Vec::new();

    for record in records {
        if let Some(group) = groups.iter_mut().find(|(c, _)| *c == record.category) {
            group.1.push(record);
        } else {
            groups.push((record.category.as_str(), vec![record]));
        }
    }

    groups
}

fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_owned()
    } else {
        let truncated: String = s.chars().take(max_len.saturating_sub(1)).collect();
        format!("{truncated}…")
    }
}
