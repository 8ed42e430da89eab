use std::cell::{Cell, RefCell};
use std::io::{IsTerminal, stderr};
use std::time::Duration;

use indicatif::{MultiProgress, ProgressBar, ProgressDrawTarget, ProgressStyle};

use crate::config::Config;

const SAVE_BAR_TEMPLATE: &str =
    "{prefix} [{bar:40}] {pos:>5}/{len:<5} | {percent:>3}% | {elapsed_precise}<{eta_precise} | {msg}";
const SPINNER_TEMPLATE: &str = "{prefix} {spinner} {elapsed_precise} | {msg}";

fn ellipsize(input: &str, max_chars: usize) -> String {
    if input.chars().count() <= max_chars {
        return input.to_string();
    }
    let keep = max_chars.saturating_sub(3);
    let mut shortened: String = input.chars().take(keep).collect();
    shortened.push_str("...");
    shortened
}

#[cfg(test)]
thread_local! {
    static FORCE_PROGRESS_TTY: Cell<Option<bool>> = const { Cell::new(None) };
}

fn stderr_supports_progress() -> bool {
    #[cfg(test)]
    {
        if let Some(flag) = FORCE_PROGRESS_TTY.with(|cell| cell.get()) {
            return flag;
        }
    }
    stderr().is_terminal()
}

fn spinner_style() -> ProgressStyle {
    ProgressStyle::with_template(SPINNER_TEMPLATE)
        .unwrap_or_else(|_| ProgressStyle::default_spinner())
        .tick_strings(&["-", "\\", "|", "/"])
}

fn bar_style() -> ProgressStyle {
    ProgressStyle::with_template(SAVE_BAR_TEMPLATE)
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("=>-")
}

/// Terminal progress for the export: a spinner while paging runs and a bar
/// while turning a category's runs into rows.
pub struct ProgressReporter {
    multi: MultiProgress,
    paging_bar: RefCell<Option<ProgressBar>>,
    save_bar: RefCell<Option<ProgressBar>>,
    current_category: RefCell<Option<String>>,
    verbosity: u8,
    finalized: Cell<bool>,
}

impl ProgressReporter {
    pub fn maybe_new(config: &Config) -> Option<Self> {
        if config.quiet > 0 {
            return None;
        }
        if !stderr_supports_progress() {
            return None;
        }
        let multi = MultiProgress::with_draw_target(ProgressDrawTarget::stderr_with_hz(15));
        Some(Self {
            multi,
            paging_bar: RefCell::new(None),
            save_bar: RefCell::new(None),
            current_category: RefCell::new(None),
            verbosity: config.verbose,
            finalized: Cell::new(false),
        })
    }

    fn category_label(&self) -> String {
        let current = self.current_category.borrow();
        let name = current.as_deref().unwrap_or("category");
        if self.verbosity == 0 {
            ellipsize(name, 40)
        } else {
            name.to_string()
        }
    }

    /// Print above the bars without tearing them.
    pub fn println(&self, message: impl AsRef<str>) {
        let _ = self.multi.println(message.as_ref());
    }

    pub fn begin_paging(&self, category: &str) {
        self.current_category.replace(Some(category.to_string()));
        if let Some(existing) = self.paging_bar.borrow_mut().take() {
            existing.finish_and_clear();
            self.multi.remove(&existing);
        }
        let spinner = self.multi.add(ProgressBar::new_spinner());
        spinner.set_style(spinner_style());
        spinner.set_prefix("[RUNS]");
        spinner.set_message(format!("{} - requesting first page", self.category_label()));
        spinner.enable_steady_tick(Duration::from_millis(120));
        self.paging_bar.replace(Some(spinner));
    }

    pub fn page_fetched(&self, pages: usize, runs: usize) {
        if let Some(bar) = self.paging_bar.borrow().as_ref() {
            let page_noun = if pages == 1 { "page" } else { "pages" };
            bar.set_message(format!(
                "{} - {pages} {page_noun}, {runs} runs",
                self.category_label()
            ));
        }
    }

    pub fn pausing(&self, pause: Duration) {
        if let Some(bar) = self.paging_bar.borrow().as_ref() {
            bar.set_message(format!(
                "{} - rate limit pause ({}s)",
                self.category_label(),
                pause.as_secs()
            ));
        }
    }

    pub fn finish_paging(&self) {
        if let Some(bar) = self.paging_bar.borrow_mut().take() {
            bar.finish_and_clear();
            self.multi.remove(&bar);
        }
    }

    pub fn begin_saving(&self, category: &str, total: usize) {
        self.current_category.replace(Some(category.to_string()));
        if let Some(existing) = self.save_bar.borrow_mut().take() {
            existing.finish_and_clear();
            self.multi.remove(&existing);
        }
        let bar = self.multi.add(ProgressBar::new(total.max(1) as u64));
        bar.set_style(bar_style());
        bar.set_prefix("[SAVE]");
        bar.set_message(format!("Saving {}", self.category_label()));
        self.save_bar.replace(Some(bar));
    }

    pub fn advance_saving(&self, completed: usize, rows: usize) {
        if let Some(bar) = self.save_bar.borrow().as_ref() {
            bar.set_position(completed as u64);
            if self.verbosity > 0 {
                bar.set_message(format!("Saving {} | {rows} rows", self.category_label()));
            }
        }
    }

    pub fn finish_saving(&self) {
        if let Some(bar) = self.save_bar.borrow_mut().take() {
            bar.finish_and_clear();
            self.multi.remove(&bar);
        }
        self.current_category.replace(None);
    }

    pub fn finalize(&self) {
        if self.finalized.replace(true) {
            return;
        }
        self.finish_paging();
        self.finish_saving();
    }

    #[cfg(test)]
    pub(crate) fn has_paging_bar_for_tests(&self) -> bool {
        self.paging_bar.borrow().is_some()
    }

    #[cfg(test)]
    pub(crate) fn has_save_bar_for_tests(&self) -> bool {
        self.save_bar.borrow().is_some()
    }
}

#[cfg(test)]
pub(crate) fn force_progress_tty_for_tests(flag: Option<bool>) {
    FORCE_PROGRESS_TTY.with(|cell| cell.set(flag));
}

impl Drop for ProgressReporter {
    fn drop(&mut self) {
        self.finalize();
    }
}
