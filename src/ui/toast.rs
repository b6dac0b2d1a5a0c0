/// Transient notices shown over the stage
use iced::widget::{column, container, text, Column};
use iced::{Background, Border, Color, Element, Theme};
use std::time::{Duration, Instant};

use crate::Message;

/// How a notice is styled
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Level {
    Info,
    Warning,
}

#[derive(Debug, Clone)]
pub struct Toast {
    pub level: Level,
    pub message: String,
    expires_at: Instant,
}

/// Queue of live notices, oldest first
#[derive(Debug, Clone)]
pub struct Toasts {
    items: Vec<Toast>,
    lifetime: Duration,
}

impl Toasts {
    pub fn new(lifetime: Duration) -> Self {
        Self {
            items: Vec::new(),
            lifetime,
        }
    }

    pub fn push(&mut self, level: Level, message: impl Into<String>, now: Instant) {
        self.items.push(Toast {
            level,
            message: message.into(),
            expires_at: now + self.lifetime,
        });
    }

    /// Drop expired notices
    pub fn prune(&mut self, now: Instant) {
        self.items.retain(|toast| toast.expires_at > now);
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Toast> {
        self.items.iter()
    }

    pub fn view(&self) -> Element<'_, Message> {
        let list: Column<Message> = self
            .iter()
            .fold(column![].spacing(8), |col, toast| col.push(toast_card(toast)));
        list.into()
    }
}

fn toast_card(toast: &Toast) -> Element<'_, Message> {
    let accent = match toast.level {
        Level::Info => Color::from_rgb(0.23, 0.51, 0.96),
        Level::Warning => Color::from_rgb(0.98, 0.62, 0.2),
    };

    container(text(&toast.message).size(16))
        .padding([8, 14])
        .style(move |_theme: &Theme| container::Style {
            text_color: Some(Color::WHITE),
            background: Some(Background::Color(Color::from_rgba(0.1, 0.1, 0.1, 0.92))),
            border: Border {
                color: accent,
                width: 2.0,
                radius: 8.0.into(),
            },
            ..Default::default()
        })
        .into()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_toasts_expire() {
        let start = Instant::now();
        let mut toasts = Toasts::new(Duration::from_secs(3));
        toasts.push(Level::Warning, "Preset 100 × 200 already exists", start);
        toasts.push(Level::Info, "later", start + Duration::from_secs(2));

        toasts.prune(start + Duration::from_secs(1));
        assert_eq!(toasts.iter().count(), 2);

        toasts.prune(start + Duration::from_secs(3));
        let left: Vec<_> = toasts.iter().map(|t| t.message.as_str()).collect();
        assert_eq!(left, ["later"]);

        toasts.prune(start + Duration::from_secs(6));
        assert!(toasts.is_empty());
    }
}
