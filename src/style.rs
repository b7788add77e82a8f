use crate::age::Presence;
use crate::render::Paint;
use colored::Colorize;

/// ANSI styling for interactive terminals.
pub struct Colors;

impl Paint for Colors {
    fn header(&self, text: String) -> String {
        text.bold().to_string()
    }

    fn label(&self, text: String) -> String {
        text.bold().cyan().to_string()
    }

    fn placeholder(&self, text: String) -> String {
        text.dimmed().to_string()
    }

    fn presence(&self, presence: Presence, text: String) -> String {
        match presence {
            Presence::Online => text.green().to_string(),
            Presence::Offline => text.red().to_string(),
        }
    }

    fn authorization(&self, authorized: bool, text: String) -> String {
        if authorized {
            text.green().to_string()
        } else {
            text.yellow().to_string()
        }
    }
}

/// Picks the painter for this run. `colored` already honours `NO_COLOR`,
/// `CLICOLOR` and whether stdout is a terminal; `--no-color` forces it off.
pub fn painter(no_color: bool) -> Box<dyn Paint> {
    if no_color {
        colored::control::set_override(false);
        Box::new(crate::render::Plain)
    } else {
        Box::new(Colors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wraps_padded_text_without_changing_it() {
        colored::control::set_override(true);
        let painted = Colors.presence(Presence::Online, "Online  ".to_string());
        colored::control::unset_override();

        assert!(painted.contains("Online  "));
        assert!(painted.starts_with("\u{1b}["));
    }
}
