//! Busy indicator: a braille frame animation with a highlight sweeping across the label.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use tracing::debug;

use crate::core::component::{Controller, Node, Spacing, Styled, Text, Widget};
use crate::core::style::{Style, Theme};
use crate::runtime::context::Context;

const FRAMES: [char; 10] = ['⠋', '⠙', '⠹', '⠸', '⠼', '⠴', '⠦', '⠧', '⠇', '⠏'];
const TICK: Duration = Duration::from_millis(50);
/// Ticks the highlight spends off the end of the label before sweeping again.
const SWEEP_PAUSE: usize = 17;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Spinner {
    pub label: String,
}

impl Spinner {
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
        }
    }
}

impl Default for Spinner {
    fn default() -> Self {
        Self::new("Loading…")
    }
}

impl Widget for Spinner {
    type Controller = SpinnerController;
}

pub struct SpinnerController {
    tick: usize,
    running: Arc<AtomicBool>,
    ticker: Option<JoinHandle<()>>,
}

impl SpinnerController {
    pub fn tick(&self) -> usize {
        self.tick
    }

    pub fn advance(&mut self) {
        self.tick = self.tick.wrapping_add(1);
    }
}

/// One spinner line at animation step `tick`.
pub fn spinner_line(label: &str, tick: usize) -> String {
    let frame = FRAMES[(tick / 2) % FRAMES.len()];
    let chars: Vec<char> = label.chars().collect();
    let len = chars.len();
    let cycle = len + SWEEP_PAUSE;
    let head = (tick % cycle) as isize - 2;
    let start = head.clamp(0, len as isize) as usize;
    let end = (head + 3).clamp(0, len as isize) as usize;
    let start = start.min(end);

    let part = |from: usize, to: usize| -> String { chars[from..to].iter().collect() };
    let label = Theme::ORANGE.paint(&part(0, start))
        + &Theme::LIGHT_ORANGE.paint(&part(start, end))
        + &Theme::ORANGE.paint(&part(end, len));
    format!(
        "{} {} {}",
        Theme::ORANGE.paint(&frame.to_string()),
        label,
        Style::dim("(esc to interrupt)")
    )
}

impl Controller for SpinnerController {
    type Widget = Spinner;

    fn create(_widget: &Spinner) -> Self {
        Self {
            tick: 0,
            running: Arc::new(AtomicBool::new(true)),
            ticker: None,
        }
    }

    fn contents(&self, widget: &Spinner) -> Vec<Option<Node>> {
        vec![Some(
            Text::new(spinner_line(&widget.label, self.tick))
                .margin(Spacing::top(1))
                .into(),
        )]
    }

    fn handle_mount(&mut self, _widget: &Spinner, ctx: &mut Context<'_, Self>) {
        let handle = ctx.handle();
        let running = Arc::clone(&self.running);
        self.ticker = Some(thread::spawn(move || {
            // Parked rather than slept so unmount can wake the ticker and join at once.
            while running.load(Ordering::Relaxed) {
                thread::park_timeout(TICK);
                if !running.load(Ordering::Relaxed) || !handle.update(SpinnerController::advance) {
                    break;
                }
            }
        }));
    }

    fn handle_unmount(&mut self, _widget: &Spinner) {
        self.running.store(false, Ordering::Relaxed);
        if let Some(ticker) = self.ticker.take() {
            ticker.thread().unpark();
            if ticker.join().is_err() {
                debug!("spinner ticker panicked");
            }
        }
    }
}
