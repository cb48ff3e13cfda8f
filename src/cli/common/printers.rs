// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

/// Pretty printers for reporting information.
use std::{borrow::Cow, sync::Mutex};

const VERTICAL: char = '│';
const UP_AND_RIGHT: char = '└';
const VERTICAL_AND_RIGHT: char = '├';

lazy_static::lazy_static! {
    static ref WARNING_PRINTER: Mutex<WarningPrinter> = Mutex::new(WarningPrinter::default());
}

/// The glyph drawn before line `i_line` of block `i_block`.
fn tree_symbol(i_line: usize, num_lines: usize, i_block: usize, num_blocks: usize) -> char {
    match (i_line, i_line + 1 == num_lines, i_block + 1 == num_blocks) {
        (0, false, _) => VERTICAL_AND_RIGHT,
        (0, _, false) => VERTICAL_AND_RIGHT,
        (0, true, true) => UP_AND_RIGHT,
        _ => VERTICAL,
    }
}

/// Groups related lines of information under a bold title.
pub(crate) struct InfoPrinter {
    title: Cow<'static, str>,
    blocks: Vec<Vec<Cow<'static, str>>>,
}

impl InfoPrinter {
    pub(crate) fn new(title: Cow<'static, str>) -> Self {
        Self {
            title,
            blocks: vec![],
        }
    }

    pub(crate) fn push_line(&mut self, line: Cow<'static, str>) {
        self.blocks.push(vec![line]);
    }

    pub(crate) fn push_block(&mut self, block: Vec<Cow<'static, str>>) {
        self.blocks.push(block);
    }

    pub(crate) fn display(self) {
        log::info!("{}", console::style(self.title).bold());
        let num_blocks = self.blocks.len();
        for (i_block, block) in self.blocks.into_iter().enumerate() {
            let num_lines = block.len();
            for (i_line, line) in block.into_iter().enumerate() {
                let symbol = tree_symbol(i_line, num_lines, i_block, num_blocks);
                log::info!("{symbol} {line}");
            }
        }
        log::info!("");
    }
}

#[derive(Default)]
struct WarningPrinter {
    blocks: Vec<Vec<Cow<'static, str>>>,
}

impl WarningPrinter {
    fn display(&mut self) {
        log::debug!("Displaying warnings");
        if self.blocks.is_empty() {
            return;
        }

        log::warn!("{}", console::style("Warnings").bold());
        let num_blocks = self.blocks.len();
        for (i_block, block) in self.blocks.iter().enumerate() {
            let num_lines = block.len();
            for (i_line, line) in block.iter().enumerate() {
                let symbol = tree_symbol(i_line, num_lines, i_block, num_blocks);
                log::warn!("{symbol} {line}");
            }
        }
        log::warn!("");
        self.blocks.clear();
    }
}

/// Defer a warning until [`display_warnings`] is called.
pub(crate) trait Warn {
    fn warn(self);
}

fn push_warning(block: Vec<Cow<'static, str>>) {
    // A poisoned lock still holds usable warnings.
    let mut printer = WARNING_PRINTER.lock().unwrap_or_else(|e| e.into_inner());
    printer.blocks.push(block);
}

impl Warn for &'static str {
    fn warn(self) {
        push_warning(vec![self.into()]);
    }
}

impl Warn for String {
    fn warn(self) {
        push_warning(vec![self.into()]);
    }
}

impl Warn for Vec<Cow<'static, str>> {
    fn warn(self) {
        push_warning(self);
    }
}

/// Print out any warnings that have been collected as CLI arguments have been
/// parsed. This should only be called once before all arguments have been
/// parsed into parameters.
pub(crate) fn display_warnings() {
    WARNING_PRINTER
        .lock()
        .unwrap_or_else(|e| e.into_inner())
        .display();
}

#[cfg(test)]
pub(super) fn num_pending_warnings() -> usize {
    WARNING_PRINTER
        .lock()
        .unwrap_or_else(|e| e.into_inner())
        .blocks
        .len()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tree_symbols() {
        // A lone line is the end of the tree.
        assert_eq!(tree_symbol(0, 1, 0, 1), UP_AND_RIGHT);
        // The first line of a multi-line block branches.
        assert_eq!(tree_symbol(0, 2, 0, 1), VERTICAL_AND_RIGHT);
        assert_eq!(tree_symbol(1, 2, 0, 1), VERTICAL);
        // Earlier blocks branch.
        assert_eq!(tree_symbol(0, 1, 0, 2), VERTICAL_AND_RIGHT);
        assert_eq!(tree_symbol(0, 1, 1, 2), UP_AND_RIGHT);
    }
}
