use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// Avatar palette; a trade's colour seed indexes into it modulo its length.
const SWATCHES: [&str; 20] = [
    "#FF6B6B", "#4ECDC4", "#45B7D1", "#FFA07A", "#98D8C8",
    "#F7DC6F", "#BB8FCE", "#85C1E2", "#F8B739", "#52B788",
    "#F06292", "#64B5F6", "#FFD54F", "#4DB6AC", "#E57373",
    "#9575CD", "#4FC3F7", "#FFB74D", "#81C784", "#FF8A65",
];

/// Colour for a decorative seed. Same seed, same colour, on every display.
pub fn swatch(seed: u64) -> &'static str {
    SWATCHES[(seed % SWATCHES.len() as u64) as usize]
}

// One trade as shown on the board. Never mutated after creation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TradeEvent {
    pub id: String,
    pub value: u64, // minor units (cents), always > 0
    pub side: String,
    pub timestamp: DateTime<Utc>,
    pub decorative_color_seed: u64,
}

impl TradeEvent {
    /// "+$1,234.56" style amount for the ticker row.
    pub fn display_amount(&self) -> String {
        let whole = self.value / 100;
        let cents = self.value % 100;

        let digits = whole.to_string();
        let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
        for (i, ch) in digits.chars().enumerate() {
            if i > 0 && (digits.len() - i) % 3 == 0 {
                grouped.push(',');
            }
            grouped.push(ch);
        }
        format!("+${}.{:02}", grouped, cents)
    }

    pub fn swatch(&self) -> &'static str {
        swatch(self.decorative_color_seed)
    }
}

/// A window row paired with the opacity it should be drawn at.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DisplayedTrade {
    pub event: TradeEvent,
    pub opacity: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Regime {
    Normal,
    Burst,
}

/// Pacing controller state after a tick.
///
/// `remaining_burst_ticks > 0` only ever happens while `regime == Burst`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PacingState {
    pub regime: Regime,
    pub interval_ms: u64,
    pub remaining_burst_ticks: u32,
}
