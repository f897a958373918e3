//! Console delivery for reminders.

use std::io::{self, Write};

use crossterm::style::Stylize;
use tasktrackr_core::{Reminder, ReminderSink, time};
use tracing::warn;

/// Prints reminders to stdout, interleaved with the menu.
pub struct ConsoleSink;

impl ReminderSink for ConsoleSink {
    fn notify(&self, reminder: &Reminder) {
        let mut out = io::stdout().lock();
        if let Err(e) = write_reminder(&mut out, reminder).and_then(|()| out.flush()) {
            warn!(error = %e, title = %reminder.title, "could not print reminder");
        }
    }
}

pub fn write_reminder(out: &mut impl Write, reminder: &Reminder) -> io::Result<()> {
    writeln!(out)?;
    writeln!(out, "{}", format!("REMINDER: {}", reminder.title).yellow())?;
    writeln!(out, "Description: {}", reminder.description)?;
    if let Some(due) = reminder.due_date {
        writeln!(out, "Due Date: {}", time::format_display(due))?;
    }
    writeln!(out, "Priority: {}", reminder.priority)?;
    writeln!(out)
}
