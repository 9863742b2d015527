//! Maps lifecycle state onto one of four mutually exclusive result panels.

use serde::Serialize;
use std::fmt;

use crate::prediction::RequestLifecycleState;

pub const PENDING_MESSAGE: &str = "Model sedang menghitung...";
pub const ERROR_TITLE: &str = "Kesalahan Prediksi";
pub const EMPTY_MESSAGE: &str = "Masukkan detail rumah untuk melihat hasil di sini.";
pub const SUCCESS_HEADING: &str = "Harga Prediksi Terbaik Kami";
pub const SUCCESS_CAPTION: &str = "Estimasi Jual:";

const RUPIAH_PREFIX: &str = "Rp\u{a0}";

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "panel", rename_all = "snake_case")]
pub enum ResultView {
    Pending {
        message: &'static str,
    },
    Error {
        title: &'static str,
        message: String,
    },
    Empty {
        message: &'static str,
    },
    Success {
        heading: &'static str,
        caption: &'static str,
        amount: f64,
        formatted: String,
    },
}

impl ResultView {
    pub fn from_state(state: &RequestLifecycleState) -> Self {
        match state {
            RequestLifecycleState::Idle => Self::Empty {
                message: EMPTY_MESSAGE,
            },
            RequestLifecycleState::Pending => Self::Pending {
                message: PENDING_MESSAGE,
            },
            RequestLifecycleState::Failed { message } => Self::Error {
                title: ERROR_TITLE,
                message: message.clone(),
            },
            RequestLifecycleState::Succeeded { result } => Self::Success {
                heading: SUCCESS_HEADING,
                caption: SUCCESS_CAPTION,
                amount: result.predicted_price,
                formatted: format_rupiah(result.predicted_price),
            },
        }
    }
}

impl fmt::Display for ResultView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Pending { message } | Self::Empty { message } => f.write_str(message),
            Self::Error { title, message } => write!(f, "{title}\n{message}"),
            Self::Success {
                heading,
                caption,
                formatted,
                ..
            } => write!(f, "{heading}\n{caption} {formatted}"),
        }
    }
}

/// `id-ID` IDR formatting without forced decimals: `Rp 850.000.000`, `Rp 1.234,5`.
///
/// Magnitudes above roughly 3.4e36 saturate the `u128` cent count and render
/// as that ceiling rather than the true amount.
pub fn format_rupiah(amount: f64) -> String {
    if !amount.is_finite() {
        return format!("{RUPIAH_PREFIX}-");
    }

    let cents = (amount.abs() * 100.0).round() as u128;
    let whole = cents / 100;
    let fraction = cents % 100;

    let digits = whole.to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (index, ch) in digits.chars().enumerate() {
        if index > 0 && (digits.len() - index) % 3 == 0 {
            grouped.push('.');
        }
        grouped.push(ch);
    }

    let sign = if amount < 0.0 && cents > 0 { "-" } else { "" };
    match fraction {
        0 => format!("{sign}{RUPIAH_PREFIX}{grouped}"),
        f if f % 10 == 0 => format!("{sign}{RUPIAH_PREFIX}{grouped},{}", f / 10),
        f => format!("{sign}{RUPIAH_PREFIX}{grouped},{f:02}"),
    }
}
