//! Line-oriented terminal front end for the chat controller.

use crate::controller::ChatView;
use crate::render::{ProductLink, RenderedReply};
use crate::session::{ConversationRole, Turn};
use crossterm::cursor::MoveToColumn;
use crossterm::style::{Print, Stylize};
use crossterm::terminal::{Clear, ClearType};
use crossterm::queue;
use std::io::{self, IsTerminal, Write};
use std::sync::atomic::{AtomicBool, Ordering};

/// Prints the conversation to stdout.
pub struct TerminalView {
    interactive: bool,
    show_timestamps: bool,
    status_shown: AtomicBool,
}

impl TerminalView {
    pub fn new(show_timestamps: bool) -> Self {
        Self {
            interactive: io::stdout().is_terminal(),
            show_timestamps,
            status_shown: AtomicBool::new(false),
        }
    }

    /// Record the new indicator state; true when the screen needs updating.
    fn status_changed(&self, loading: bool) -> bool {
        self.status_shown.swap(loading, Ordering::AcqRel) != loading
    }

    /// Print every turn of a conversation, oldest first.
    pub fn print_history(&self, turns: &[Turn]) {
        if turns.is_empty() {
            println!("{}", "No messages yet.".dark_grey());
            return;
        }
        for turn in turns {
            let role = match turn.role() {
                ConversationRole::User => turn.role().display_name().blue().bold(),
                ConversationRole::Assistant => turn.role().display_name().green().bold(),
            };
            if self.show_timestamps {
                let stamp = turn.timestamp().format("%H:%M:%S").to_string();
                println!("{} {} {}", stamp.dark_grey(), role, turn.content());
            } else {
                println!("{} {}", role, turn.content());
            }
        }
    }

    fn write_lines(&self, lines: &[String]) {
        let mut stdout = io::stdout().lock();
        // Anything printed replaces a leftover status line.
        if self.interactive && self.status_changed(false) {
            let _ = queue!(stdout, MoveToColumn(0), Clear(ClearType::CurrentLine));
        }
        for line in lines {
            let _ = writeln!(stdout, "{line}");
        }
        let _ = stdout.flush();
    }
}

pub fn format_product(product: &ProductLink) -> String {
    match &product.price {
        Some(price) if !price.trim().is_empty() => {
            format!("  • {}  {}  {}", product.label, price.trim(), product.url)
        }
        _ => format!("  • {}  {}", product.label, product.url),
    }
}

impl ChatView for TerminalView {
    fn show_user_message(&self, content: &str) {
        // Interactive input is already on screen.
        if !self.interactive {
            self.write_lines(&[format!("{} {}", "You".blue().bold(), content)]);
        }
    }

    fn show_reply(&self, reply: &RenderedReply) {
        let mut lines = vec![format!("{} {}", "Assistant".green().bold(), reply.message)];
        lines.extend(reply.products.iter().map(|p| format_product(p).cyan().to_string()));
        lines.push(String::new());
        self.write_lines(&lines);
    }

    fn show_error(&self, message: &str) {
        self.write_lines(&[format!("{} {}", "Assistant".green().bold(), message.red())]);
    }

    fn set_loading(&self, loading: bool) {
        if !self.interactive || !self.status_changed(loading) {
            return;
        }
        let mut stdout = io::stdout().lock();
        let _ = if loading {
            queue!(stdout, Print("  … thinking".dark_grey()))
        } else {
            queue!(stdout, MoveToColumn(0), Clear(ClearType::CurrentLine))
        };
        let _ = stdout.flush();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_line_cleared_once() {
        let view = TerminalView::new(false);
        assert!(!view.status_changed(false));
        assert!(view.status_changed(true));
        assert!(!view.status_changed(true));
        assert!(view.status_changed(false));
        assert!(!view.status_changed(false));
    }

    #[test]
    fn test_format_product_with_price() {
        let link = ProductLink {
            url: "https://s.com/p/1".to_string(),
            label: "Hemp Seed Oil".to_string(),
            price: Some(" ₹499 ".to_string()),
        };
        assert_eq!(format_product(&link), "  • Hemp Seed Oil  ₹499  https://s.com/p/1");
    }

    #[test]
    fn test_format_product_without_price() {
        let link = ProductLink {
            url: "https://s.com/products/calm".to_string(),
            label: "View: Calm".to_string(),
            price: None,
        };
        assert_eq!(format_product(&link), "  • View: Calm  https://s.com/products/calm");
    }
}
