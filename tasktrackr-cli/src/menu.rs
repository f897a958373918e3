//! Interactive numbered menu over the shared task store.
//!
//! The store lock is only taken once input for an action has been collected,
//! so the reminder poller is never blocked behind a prompt.

use anyhow::Result;
use crossterm::style::{StyledContent, Stylize};
use std::io::{self, BufRead, Write};
use std::sync::{MutexGuard, PoisonError};

use tasktrackr_core::{Priority, SharedStore, StoreError, Task, TaskStore, time};

pub fn lock(store: &SharedStore) -> MutexGuard<'_, TaskStore> {
    store.lock().unwrap_or_else(PoisonError::into_inner)
}

enum Flow {
    Continue,
    Exit,
}

pub struct Menu<'a, R, W> {
    store: &'a SharedStore,
    input: R,
    out: W,
}

impl<'a, R: BufRead, W: Write> Menu<'a, R, W> {
    pub fn new(store: &'a SharedStore, input: R, out: W) -> Self {
        Self { store, input, out }
    }

    /// Run until the user exits or input ends.
    pub fn run(mut self) -> Result<()> {
        loop {
            self.print_menu()?;
            let Some(choice) = self.prompt("Enter your choice (1-5)")? else {
                return Ok(());
            };

            // A failed action ends that action, not the session.
            let flow = match self.dispatch(&choice) {
                Ok(flow) => flow,
                Err(e) => {
                    self.error(&format!("An error occurred: {e}"))?;
                    writeln!(self.out, "Please try again.")?;
                    Flow::Continue
                }
            };

            if let Flow::Exit = flow {
                return Ok(());
            }
        }
    }

    fn dispatch(&mut self, choice: &str) -> Result<Flow> {
        match choice {
            "1" => self.add_task(),
            "2" => self.view_tasks(),
            "3" => self.toggle_task(),
            "4" => self.delete_task(),
            "5" => {
                writeln!(self.out, "{}", "Goodbye!".yellow())?;
                Ok(Flow::Exit)
            }
            _ => {
                self.error("Invalid choice. Please try again.")?;
                Ok(Flow::Continue)
            }
        }
    }

    fn print_menu(&mut self) -> io::Result<()> {
        writeln!(self.out, "\n{}", "=== TaskTrackr ===".cyan())?;
        writeln!(self.out, "1. Add Task")?;
        writeln!(self.out, "2. View Tasks")?;
        writeln!(self.out, "3. Mark Task as Complete/Incomplete")?;
        writeln!(self.out, "4. Delete Task")?;
        writeln!(self.out, "5. Exit")?;
        writeln!(self.out, "{}", "==================".cyan())
    }

    /// Print `label: ` and read one trimmed line. `None` at end of input.
    ///
    /// Bytes that are not UTF-8 become U+FFFD instead of failing the read.
    fn prompt(&mut self, label: &str) -> io::Result<Option<String>> {
        write!(self.out, "{label}: ")?;
        self.out.flush()?;
        let mut line = Vec::new();
        if self.input.read_until(b'\n', &mut line)? == 0 {
            writeln!(self.out)?;
            return Ok(None);
        }
        Ok(Some(String::from_utf8_lossy(&line).trim().to_string()))
    }

    fn error(&mut self, msg: &str) -> io::Result<()> {
        writeln!(self.out, "{}", msg.red())
    }

    fn warn(&mut self, msg: &str) -> io::Result<()> {
        writeln!(self.out, "{}", msg.yellow())
    }

    fn success(&mut self, msg: &str) -> io::Result<()> {
        writeln!(self.out, "{}", msg.green())
    }

    /// Ask for a timestamp until one parses. Blank input is `Some(None)` when `optional`.
    fn prompt_time(&mut self, label: &str, optional: bool) -> io::Result<Option<Option<chrono::NaiveDateTime>>> {
        loop {
            let Some(raw) = self.prompt(label)? else {
                return Ok(None);
            };
            if optional && raw.is_empty() {
                return Ok(Some(None));
            }
            match time::parse_input(&raw) {
                Some(dt) => return Ok(Some(Some(dt))),
                None => self.error("Invalid date format. Please use YYYY-MM-DD HH:MM")?,
            }
        }
    }

    /// Collect a task from the prompts. `None` if input ended part way.
    fn read_task(&mut self) -> Result<Option<Task>> {
        let title = loop {
            let Some(title) = self.prompt("Enter task title")? else {
                return Ok(None);
            };
            if !title.is_empty() {
                break title;
            }
            self.error("Title cannot be empty. Please try again.")?;
        };

        let Some(description) = self.prompt("Enter task description (optional)")? else {
            return Ok(None);
        };

        let now = time::now();
        let Some(due) = self.prompt_time("Enter due date (YYYY-MM-DD HH:MM) or press Enter to skip", true)? else {
            return Ok(None);
        };
        if due.is_some_and(|d| d < now) {
            self.warn("Warning: Due date is in the past.")?;
        }

        let priority = loop {
            let Some(raw) = self.prompt("Enter priority (low/medium/high) [default: medium]")? else {
                return Ok(None);
            };
            if raw.is_empty() {
                break Priority::Medium;
            }
            match Priority::parse(&raw) {
                Some(p) => break p,
                None => self.error("Invalid priority. Please choose from: low, medium, high")?,
            }
        };

        let Some(answer) = self.prompt("Set reminder? (y/n) [default: n]")? else {
            return Ok(None);
        };
        let mut remind_at = None;
        if answer.eq_ignore_ascii_case("y") {
            let Some(Some(at)) = self.prompt_time("Enter reminder time (YYYY-MM-DD HH:MM)", false)? else {
                return Ok(None);
            };
            if at < now {
                self.warn("Warning: Reminder time is in the past.")?;
            }
            if due.is_some_and(|d| at > d) {
                self.warn("Warning: Reminder time is after due date.")?;
            }
            remind_at = Some(at);
        }

        let mut task = Task::new(&title, &description)?.with_priority(priority);
        if let Some(due) = due {
            task = task.with_due_date(due);
        }
        if let Some(at) = remind_at {
            task = task.with_reminder(at);
        }
        Ok(Some(task))
    }

    fn add_task(&mut self) -> Result<Flow> {
        let Some(task) = self.read_task()? else {
            return Ok(Flow::Exit);
        };

        let result = lock(self.store).add(task);
        match result {
            Ok(()) => self.success("Task added successfully!")?,
            Err(e) => self.error(&format!("Error adding task: {e}"))?,
        }
        Ok(Flow::Continue)
    }

    fn view_tasks(&mut self) -> Result<Flow> {
        let store = lock(self.store);
        let tasks = store.list(true);
        if tasks.is_empty() {
            writeln!(self.out, "No tasks found.")?;
        } else {
            writeln!(self.out, "\n{}", "Your Tasks:".cyan())?;
            write_tasks(&mut self.out, &tasks)?;
        }
        Ok(Flow::Continue)
    }

    /// Read a 1-based task number. Prints the reason and returns `Ok(None)` when unusable.
    fn read_task_number(&mut self, label: &str) -> Result<Option<Option<usize>>> {
        let Some(raw) = self.prompt(label)? else {
            return Ok(None);
        };
        let Ok(n) = raw.parse::<i64>() else {
            self.error("Please enter a valid number.")?;
            return Ok(Some(None));
        };
        let index = n.checked_sub(1).and_then(|i| usize::try_from(i).ok());
        if index.is_none() {
            self.error("Invalid task number.")?;
        }
        Ok(Some(index))
    }

    fn toggle_task(&mut self) -> Result<Flow> {
        if lock(self.store).is_empty() {
            writeln!(self.out, "No tasks to update.")?;
            return Ok(Flow::Continue);
        }
        let Some(number) = self.read_task_number("Enter task number to toggle completion")? else {
            return Ok(Flow::Exit);
        };
        let Some(index) = number else {
            return Ok(Flow::Continue);
        };

        let result = lock(self.store).toggle_completion(index);
        match result {
            Ok(_) => self.success("Task status updated!")?,
            Err(StoreError::IndexOutOfRange { .. }) => self.error("Invalid task number.")?,
            Err(e) => self.error(&format!("Error updating task: {e}"))?,
        }
        Ok(Flow::Continue)
    }

    fn delete_task(&mut self) -> Result<Flow> {
        if lock(self.store).is_empty() {
            writeln!(self.out, "No tasks to delete.")?;
            return Ok(Flow::Continue);
        }
        let Some(number) = self.read_task_number("Enter task number to delete")? else {
            return Ok(Flow::Exit);
        };
        let Some(index) = number else {
            return Ok(Flow::Continue);
        };

        let result = lock(self.store).remove(index);
        match result {
            Ok(_) => self.success("Task deleted successfully!")?,
            Err(StoreError::IndexOutOfRange { .. }) => self.error("Invalid task number.")?,
            Err(e) => self.error(&format!("Error removing task: {e}"))?,
        }
        Ok(Flow::Continue)
    }
}

fn priority_label(p: Priority) -> StyledContent<&'static str> {
    match p {
        Priority::Low => p.as_str().blue(),
        Priority::Medium => p.as_str().yellow(),
        Priority::High => p.as_str().red(),
    }
}

/// Numbered listing, starting at 1.
pub fn write_tasks(out: &mut impl Write, tasks: &[&Task]) -> io::Result<()> {
    for (i, task) in tasks.iter().enumerate() {
        let status = if task.is_completed() { "✓".green() } else { "✗".red() };
        writeln!(out, "\n{} {}. {}", status, i + 1, task.title())?;
        if !task.description().is_empty() {
            writeln!(out, "   Description: {}", task.description())?;
        }
        if let Some(due) = task.due_date() {
            writeln!(out, "   Due: {}", time::format_display(due))?;
        }
        writeln!(out, "   Priority: {}", priority_label(task.priority()))?;
        if let (true, Some(at)) = (task.reminder(), task.reminder_time()) {
            writeln!(out, "   Reminder: {}", time::format_display(at))?;
        }
    }
    Ok(())
}
