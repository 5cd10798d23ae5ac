//! Terminal output — spinners and colored result lines.
//!
//! Uses `indicatif` for the in-flight spinner and `console` for styling.
//! [`OpProgress`] wraps one store call visually; the free functions
//! render records and capability summaries.

use console::Style;
use indicatif::{ProgressBar, ProgressStyle};

use crate::consultation::{Capabilities, ConsultationRecord};

/// Spinner shown while a store call is in flight, finished with a
/// green check or red cross.
pub struct OpProgress {
    pb: ProgressBar,
    green: Style,
    red: Style,
}

impl OpProgress {
    pub fn start(label: &str) -> Self {
        let pb = ProgressBar::new_spinner();
        pb.set_style(
            ProgressStyle::default_spinner()
                .template("{spinner:.cyan} {msg}")
                .expect("invalid template"),
        );
        pb.set_message(label.to_string());
        pb.enable_steady_tick(std::time::Duration::from_millis(100));

        Self {
            pb,
            green: Style::new().green().bold(),
            red: Style::new().red().bold(),
        }
    }

    pub fn success(&self, message: &str) {
        self.pb.finish_and_clear();
        println!("  {} {message}", self.green.apply_to("✓"));
    }

    pub fn failure(&self, message: &str) {
        self.pb.finish_and_clear();
        eprintln!("  {} {message}", self.red.apply_to("✗"));
    }
}

/// One-line summary used by `list`.
pub fn print_row(record: &ConsultationRecord) {
    let status_style = match record.status.to_string().as_str() {
        "pending" => Style::new().yellow(),
        "following" => Style::new().cyan(),
        "quoted" => Style::new().green(),
        _ => Style::new().dim(),
    };
    println!(
        "  {:>4}  {:<16} {:<10} {:<24} {}",
        record.id,
        record.consultation_no,
        status_style.apply_to(record.status),
        record.company,
        record.follower.as_deref().unwrap_or("-")
    );
}

/// Full record detail used by `show`.
pub fn print_record(record: &ConsultationRecord) {
    let bold = Style::new().bold();
    println!("{}", bold.apply_to(format!(
        "─── {} ({}) ───",
        record.consultation_no, record.status
    )));
    println!("  company:   {} / {}", record.company, record.contact);
    if let Some(sample) = &record.sample_description {
        println!("  sample:    {sample}");
    }
    if let Some(items) = &record.test_items {
        println!("  tests:     {items}");
    }
    if let Some(follower) = &record.follower {
        println!("  follower:  {follower}");
    }
    if let Some(feasibility) = record.feasibility {
        let price = record
            .estimated_price
            .map(|p| format!(" (est. {p:.2})"))
            .unwrap_or_default();
        let note = record
            .feasibility_note
            .as_deref()
            .map(|n| format!(" — {n}"))
            .unwrap_or_default();
        println!("  verdict:   {feasibility}{price}{note}");
    }
    if let Some(quotation_no) = &record.quotation_no {
        println!("  quotation: {quotation_no}");
    }
    if !record.follow_up_records.is_empty() {
        println!("  follow-ups:");
        for entry in &record.follow_up_records {
            let next = entry
                .next_action
                .as_deref()
                .map(|n| format!(" → {n}"))
                .unwrap_or_default();
            println!(
                "    {} [{}] {} ({}){next}",
                entry.date.format("%Y-%m-%d %H:%M"),
                entry.kind,
                entry.content,
                entry.operator
            );
        }
    }
}

/// Render the capability set as a compact allowed/denied line.
pub fn print_capabilities(caps: &Capabilities) {
    let on = Style::new().green();
    let off = Style::new().dim();
    let flag = |allowed: bool, name: &str| {
        if allowed {
            format!("{}", on.apply_to(name))
        } else {
            format!("{}", off.apply_to(name))
        }
    };
    println!(
        "  allowed: {} {} {} {} {}",
        flag(caps.can_edit, "edit"),
        flag(caps.can_add_follow_up, "follow-up"),
        flag(caps.can_close, "close"),
        flag(caps.can_generate_quotation, "quote"),
        flag(caps.can_delete, "delete"),
    );
}
