//! Transport-neutral replies and the texts the bot sends.

use crate::core::ConversionRequest;

pub const MENU: &str = "👋 Hi! Pick a quick conversion or enter one manually:";
pub const MANUAL_BUTTON: &str = "💬 Manual input";
pub const ASK_AMOUNT: &str = "Enter the amount to convert:";
pub const INVALID_AMOUNT: &str = "❗️ Enter a valid positive number, for example: 100";
pub const ASK_SOURCE: &str = "Choose the source currency:";
pub const INVALID_SOURCE: &str = "❗️ Enter a three-letter currency code, for example USD";
pub const ASK_DESTINATION: &str = "Choose the target currency:";
pub const INVALID_DESTINATION: &str = "❗️ Enter a three-letter currency code, for example EUR";
pub const UNAVAILABLE: &str = "❗️ Could not retrieve the rate.\nPlease try again later.";
pub const CANCELLED: &str = "❌ Operation cancelled.";
pub const FAILED: &str = "❗️ Conversion failed.";
pub const IDLE_HINT: &str = "Send /start to begin a conversion.";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InlineButton {
    pub label: String,
    pub data: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Keyboard {
    #[default]
    None,
    /// Buttons attached to the message; pressing one yields a selection.
    Inline(Vec<Vec<InlineButton>>),
    /// One-time suggestions; pressing one sends its label as text.
    Choices(Vec<Vec<String>>),
    /// Hides a previously shown choices keyboard.
    Remove,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reply {
    pub text: String,
    pub keyboard: Keyboard,
}

impl Reply {
    pub fn text(text: impl Into<String>) -> Self {
        Reply {
            text: text.into(),
            keyboard: Keyboard::None,
        }
    }

    pub fn with_keyboard(mut self, keyboard: Keyboard) -> Self {
        self.keyboard = keyboard;
        self
    }
}

/// Renders a successful conversion, rounding to two decimals.
pub fn format_conversion(request: &ConversionRequest, value: f64) -> String {
    format!(
        "{} {} = {:.2} {}",
        request.amount, request.source, value, request.destination
    )
}

/// Lays currency presets out in rows of three.
pub fn choices_keyboard(presets: &[String]) -> Keyboard {
    Keyboard::Choices(presets.chunks(3).map(|row| row.to_vec()).collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_rounds_to_two_decimals() {
        let request = ConversionRequest::parse("1", "EUR", "USD").unwrap();
        assert_eq!(format_conversion(&request, 1.0834), "1 EUR = 1.08 USD");
    }

    #[test]
    fn test_format_keeps_zero_and_negative_values() {
        let request = ConversionRequest::parse("2.5", "gbp", "usd").unwrap();
        assert_eq!(format_conversion(&request, 0.0), "2.5 GBP = 0.00 USD");
        assert_eq!(format_conversion(&request, -3.456), "2.5 GBP = -3.46 USD");
    }

    #[test]
    fn test_choices_rows_of_three() {
        let presets: Vec<String> = ["USD", "EUR", "GBP", "KZT", "RUB"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        assert_eq!(
            choices_keyboard(&presets),
            Keyboard::Choices(vec![
                vec!["USD".to_string(), "EUR".to_string(), "GBP".to_string()],
                vec!["KZT".to_string(), "RUB".to_string()],
            ])
        );
    }
}
